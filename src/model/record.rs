//! Dynamic record

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;

use super::Value;
use crate::error::FieldError;

/// A schema-less record from the store.
///
/// Field values live in a `HashMap<String, Value>` because collections carry
/// no client-side schema. The typed getters return
/// `Result<Option<T>, FieldError>` and distinguish a missing field from a
/// null one; the `*_or` accessors apply an explicit per-call-site fallback,
/// which is how display code reads these records.
///
/// # Example
///
/// ```
/// use airsync::model::Record;
///
/// let record = Record::new()
///     .set("shaer", "Mirza Ghalib")
///     .set("likes", 3i64);
///
/// assert_eq!(record.get_str("shaer").unwrap(), Some("Mirza Ghalib"));
/// assert_eq!(record.i64_or("shares", 0), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// The store-assigned record id.
    pub(crate) id: Option<String>,

    /// When the store created the record.
    pub(crate) created_time: Option<DateTime<Utc>>,

    /// The field values.
    pub(crate) fields: HashMap<String, Value>,
}

impl Record {
    /// Creates a new empty record for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new record with the given id, for batch updates.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            created_time: None,
            fields: HashMap::new(),
        }
    }

    /// Returns the record id, if set.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns when the store created this record, if known.
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_time
    }

    /// Sets the record id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Returns a mutable reference to all fields.
    pub fn fields_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.fields
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is Value::Null.
    // =========================================================================

    /// Gets a string field value.
    pub fn get_str(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "string",
                other.type_name(),
            )),
        }
    }

    /// Gets a boolean field value.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", other.type_name())),
        }
    }

    /// Gets an integer field value.
    ///
    /// Integral floats are widened, since the store's number type does not
    /// distinguish the two.
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(v @ (Value::Int(_) | Value::Float(_))) => match v.as_i64() {
                Some(n) => Ok(Some(n)),
                None => Err(FieldError::type_mismatch(field, "int", "float")),
            },
            Some(other) => Err(FieldError::type_mismatch(field, "int", other.type_name())),
        }
    }

    /// Gets a floating point field value.
    pub fn get_f64(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Float(f)) => Ok(Some(*f)),
            Some(Value::Int(n)) => Ok(Some(*n as f64)),
            Some(other) => Err(FieldError::type_mismatch(field, "float", other.type_name())),
        }
    }

    /// Gets a list-of-strings field value (multiple select, linked ids).
    pub fn get_str_list(&self, field: &str) -> Result<Option<Vec<&str>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::List(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) => out.push(s),
                        None => {
                            return Err(FieldError::type_mismatch(
                                field,
                                "list of strings",
                                item.type_name(),
                            ));
                        }
                    }
                }
                Ok(Some(out))
            }
            Some(other) => Err(FieldError::type_mismatch(field, "list", other.type_name())),
        }
    }

    // =========================================================================
    // Fallback accessors
    // =========================================================================

    /// Returns the string value of a field, or `default` when the field is
    /// absent, null, or not a string.
    pub fn str_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }

    /// Returns the integer value of a field, or `default` when the field is
    /// absent, null, or not numeric.
    pub fn i64_or(&self, field: &str, default: i64) -> i64 {
        self.fields
            .get(field)
            .and_then(Value::as_i64)
            .unwrap_or(default)
    }

    /// Returns the boolean value of a field, or `default` when the field is
    /// absent, null, or not a bool.
    pub fn bool_or(&self, field: &str, default: bool) -> bool {
        self.fields
            .get(field)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_distinguish_missing_from_null() {
        let record = Record::new().set("body", Value::Null);

        assert!(matches!(
            record.get_str("missing"),
            Err(FieldError::Missing { .. })
        ));
        assert_eq!(record.get_str("body").unwrap(), None);
    }

    #[test]
    fn fallback_accessors_never_fail() {
        let record = Record::new().set("likes", 5i64).set("title", "nazm");

        assert_eq!(record.i64_or("likes", 0), 5);
        assert_eq!(record.i64_or("shares", 0), 0);
        assert_eq!(record.str_or("title", "-"), "nazm");
        assert_eq!(record.str_or("likes", "-"), "-");
    }

    #[test]
    fn str_list_rejects_mixed_items() {
        let record = Record::new().set(
            "tags",
            Value::List(vec![Value::from("ishq"), Value::Int(1)]),
        );
        assert!(record.get_str_list("tags").is_err());
    }
}
