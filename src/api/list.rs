//! List query builder.

use crate::cache::CacheKey;

/// Sort direction for a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One sort clause of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    field: String,
    direction: SortDirection,
}

impl Sort {
    /// Sorts ascending by a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Sorts descending by a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Builder for list queries against one table.
///
/// Mirrors the store's list parameters: page size, filter formula, field
/// projection, sort clauses, and a named view. `lang` tags the query with a
/// content language; it only discriminates cache keys (the store itself has
/// no language parameter — callers bake language into the filter or field
/// selection).
///
/// # Example
///
/// ```
/// use airsync::api::{ListQuery, Sort};
///
/// let query = ListQuery::new("ghazlen")
///     .page_size(30)
///     .filter_formula("{shaer} = 'Mir Taqi Mir'")
///     .fields(&["shaer", "ghazal", "likes"])
///     .sort(Sort::desc("likes"))
///     .lang("ur");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    table: String,
    page_size: Option<usize>,
    max_records: Option<usize>,
    filter_formula: Option<String>,
    fields: Vec<String>,
    sort: Vec<Sort>,
    view: Option<String>,
    lang: Option<String>,
}

impl ListQuery {
    /// Creates a new query for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            page_size: None,
            max_records: None,
            filter_formula: None,
            fields: Vec::new(),
            sort: Vec::new(),
            view: None,
            lang: None,
        }
    }

    /// Sets the number of records per page.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Caps the total number of records the query may return.
    pub fn max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Sets the filter formula.
    pub fn filter_formula(mut self, formula: impl Into<String>) -> Self {
        self.filter_formula = Some(formula.into());
        self
    }

    /// Clears the filter formula.
    pub fn clear_filter(mut self) -> Self {
        self.filter_formula = None;
        self
    }

    /// Restricts the returned fields.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Adds a sort clause.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Queries through a named view.
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Tags the query with a content language (cache discriminator only).
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Returns the table this query targets.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the filter formula, if set.
    pub fn filter(&self) -> Option<&str> {
        self.filter_formula.as_deref()
    }

    /// Returns the query parameters in wire order, excluding the cursor.
    pub(crate) fn wire_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(size) = self.page_size {
            params.push(("pageSize".to_string(), size.to_string()));
        }
        if let Some(max) = self.max_records {
            params.push(("maxRecords".to_string(), max.to_string()));
        }
        if let Some(formula) = &self.filter_formula {
            params.push(("filterByFormula".to_string(), formula.clone()));
        }
        for field in &self.fields {
            params.push(("fields[]".to_string(), field.clone()));
        }
        for (i, sort) in self.sort.iter().enumerate() {
            params.push((format!("sort[{i}][field]"), sort.field.clone()));
            params.push((
                format!("sort[{i}][direction]"),
                sort.direction.as_str().to_string(),
            ));
        }
        if let Some(view) = &self.view {
            params.push(("view".to_string(), view.clone()));
        }
        params
    }

    /// Builds the encoded query string for one page of this query.
    pub(crate) fn query_string(&self, offset: Option<&str>) -> String {
        let mut params = self.wire_params();
        if let Some(offset) = offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Builds the cache key for one page of this query.
    pub fn cache_key(&self, base_id: &str, offset: Option<&str>) -> CacheKey {
        let mut key = CacheKey::list(base_id, &self.table).with_params(self.wire_params());
        if let Some(lang) = &self.lang {
            key = key.with_lang(lang.clone());
        }
        if let Some(offset) = offset {
            key = key.with_offset(offset);
        }
        key
    }
}
