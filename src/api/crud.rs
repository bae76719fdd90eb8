//! Create, Read, Update, Delete operations
//!
//! Operations are the central type for representing record store writes and
//! reads. They can be built with the [`Op`] helper and executed with
//! [`BaseClient::execute`](crate::BaseClient::execute), or issued through
//! the convenience methods on the client.
//!
//! # Example
//!
//! ```ignore
//! use airsync::api::Op;
//! use airsync::model::Record;
//!
//! let op = Op::create("comments", Record::new().set("comment", "wah"))
//!     .typecast()
//!     .build();
//! client.execute(op).await?;
//! ```

use crate::model::Record;

/// The store's per-request limit on batched records.
pub const BATCH_LIMIT: usize = 10;

/// Options that can be applied to write operations.
#[derive(Debug, Clone, Default)]
pub struct OperationOptions {
    /// Ask the store to coerce field values to the column type
    /// (`"typecast": true` in the request body).
    pub typecast: bool,
}

impl OperationOptions {
    /// Creates new default options.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A CRUD operation that can be executed against the store.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Create a new record.
    Create {
        table: String,
        record: Record,
        options: OperationOptions,
    },

    /// Retrieve a record by id.
    Retrieve { table: String, id: String },

    /// Update a batch of existing records (PATCH merge semantics).
    Update {
        table: String,
        records: Vec<Record>,
        options: OperationOptions,
    },

    /// Delete a record.
    Delete { table: String, id: String },
}

/// Helper for building [`Operation`]s.
pub struct Op;

impl Op {
    /// Creates a new Create operation builder.
    pub fn create(table: impl Into<String>, record: Record) -> CreateBuilder {
        CreateBuilder {
            table: table.into(),
            record,
            options: OperationOptions::default(),
        }
    }

    /// Creates a new Retrieve operation.
    pub fn retrieve(table: impl Into<String>, id: impl Into<String>) -> Operation {
        Operation::Retrieve {
            table: table.into(),
            id: id.into(),
        }
    }

    /// Creates a new batch Update operation builder.
    pub fn update(table: impl Into<String>, records: Vec<Record>) -> UpdateBuilder {
        UpdateBuilder {
            table: table.into(),
            records,
            options: OperationOptions::default(),
        }
    }

    /// Creates a new Delete operation.
    pub fn delete(table: impl Into<String>, id: impl Into<String>) -> Operation {
        Operation::Delete {
            table: table.into(),
            id: id.into(),
        }
    }
}

/// Builder for Create operations.
#[derive(Debug, Clone)]
pub struct CreateBuilder {
    table: String,
    record: Record,
    options: OperationOptions,
}

impl CreateBuilder {
    /// Asks the store to coerce field values to the column type.
    pub fn typecast(mut self) -> Self {
        self.options.typecast = true;
        self
    }

    /// Builds the operation.
    pub fn build(self) -> Operation {
        Operation::Create {
            table: self.table,
            record: self.record,
            options: self.options,
        }
    }
}

impl From<CreateBuilder> for Operation {
    fn from(builder: CreateBuilder) -> Self {
        builder.build()
    }
}

/// Builder for batch Update operations.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    records: Vec<Record>,
    options: OperationOptions,
}

impl UpdateBuilder {
    /// Asks the store to coerce field values to the column type.
    pub fn typecast(mut self) -> Self {
        self.options.typecast = true;
        self
    }

    /// Builds the operation.
    pub fn build(self) -> Operation {
        Operation::Update {
            table: self.table,
            records: self.records,
            options: self.options,
        }
    }
}

impl From<UpdateBuilder> for Operation {
    fn from(builder: UpdateBuilder) -> Self {
        builder.build()
    }
}

/// Result of a delete operation.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DeleteResult {
    /// The id of the deleted record.
    pub id: String,
    /// Whether the store confirmed the deletion.
    pub deleted: bool,
}

/// Result of executing an operation.
#[derive(Debug)]
pub enum OperationResult {
    /// The created record, as the store materialized it.
    Create(Record),
    /// The retrieved record with its cache status.
    Retrieve(crate::response::Response<Record>),
    /// The updated records, as the store materialized them.
    Update(Vec<Record>),
    /// Deletion confirmation.
    Delete(DeleteResult),
}

impl OperationResult {
    /// Returns the single record if this result carries exactly one.
    pub fn record(&self) -> Option<&Record> {
        match self {
            OperationResult::Create(r) => Some(r),
            OperationResult::Retrieve(resp) => Some(resp.data()),
            OperationResult::Update(records) if records.len() == 1 => records.first(),
            _ => None,
        }
    }
}
