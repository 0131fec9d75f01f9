//! Query filters and find options.

use crate::coerce::{CoercionReport, IdentifierCoercer};
use crate::error::{CoreError, CoreResult};
use docrel_codec::Value;

/// A query filter: a document mapping storage field names to a value or an
/// operator document such as `{"$in": [...]}`.
///
/// ```rust
/// use docrel_codec::Value;
/// use docrel_core::Filter;
///
/// let filter = Filter::is_in("author_id", vec![Value::from(1), Value::from(2)])
///     .and_eq("published", true);
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter(Value);

impl Filter {
    /// Creates a filter matching every document.
    #[must_use]
    pub fn new() -> Self {
        Self(Value::empty_map())
    }

    /// Creates a filter requiring `field` to equal `value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and_eq(field, value)
    }

    /// Creates a filter requiring `field` to equal one of `values`.
    #[must_use]
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new().and_in(field, values)
    }

    /// Adds an equality condition, replacing any condition on `field`.
    #[must_use]
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field, value.into());
        self
    }

    /// Adds an `$in` condition, replacing any condition on `field`.
    #[must_use]
    pub fn and_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.0
            .insert(field, Value::document([("$in", Value::Array(values))]));
        self
    }

    /// Wraps a filter document.
    ///
    /// `Null` is accepted as the empty filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `value` is neither a map nor `Null`.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Map(_) => Ok(Self(value)),
            other => Err(CoreError::invalid_argument(format!(
                "filter must be a map, found {}",
                other.kind_name()
            ))),
        }
    }

    /// Returns the filter document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the filter, returning its document.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns the condition on `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the number of top-level conditions.
    pub fn len(&self) -> usize {
        self.0.as_map().map_or(0, <[_]>::len)
    }

    /// Returns true if the filter matches every document.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrites identifier-shaped strings into object identifiers using the
    /// default heuristics.
    pub fn coerce_identifiers(&mut self) -> CoercionReport {
        self.coerce_with(&IdentifierCoercer::default())
    }

    /// Rewrites identifier-shaped strings using `coercer`.
    pub fn coerce_with(&mut self, coercer: &IdentifierCoercer) -> CoercionReport {
        coercer.coerce(&mut self.0)
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Value> for Filter {
    type Error = CoreError;

    fn try_from(value: Value) -> CoreResult<Self> {
        Self::from_value(value)
    }
}

impl From<Filter> for Value {
    fn from(filter: Filter) -> Self {
        filter.0
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Sort on a single storage field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Storage field name. Dotted paths reach into embedded documents.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

/// Options for [`Collection::read`](crate::Collection::read).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Number of matching documents to skip.
    pub skip: usize,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Result ordering. Without one, documents come back in store order.
    pub sort: Option<Sort>,
}

impl FindOptions {
    /// Creates options that return every match in store order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of documents to skip.
    #[must_use]
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of documents returned.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sorts ascending by `field`.
    #[must_use]
    pub fn sort_asc(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortOrder::Ascending)
    }

    /// Sorts descending by `field`.
    #[must_use]
    pub fn sort_desc(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortOrder::Descending)
    }

    /// Sorts by `field` in `order`.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            order,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrel_codec::ObjectId;

    #[test]
    fn in_filter_shape() {
        let filter = Filter::is_in("_id", vec![Value::Integer(1), Value::Integer(2)]);
        let expected = Value::document([(
            "_id",
            Value::document([(
                "$in",
                Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
            )]),
        )]);
        assert_eq!(filter.as_value(), &expected);
    }

    #[test]
    fn and_eq_replaces_existing_condition() {
        let filter = Filter::eq("name", "a").and_eq("name", "b").and_eq("age", 3);
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get("name"), Some(&Value::from("b")));
    }

    #[test]
    fn from_value_requires_map() {
        assert!(Filter::from_value(Value::Null).unwrap().is_empty());
        assert!(Filter::from_value(Value::empty_map()).is_ok());
        assert!(matches!(
            Filter::from_value(Value::Integer(1)),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn coerce_identifiers_on_filter() {
        let id = ObjectId::new();
        let mut filter = Filter::eq("userId", id.to_hex());

        let report = filter.coerce_identifiers();
        assert_eq!(report.coerced, 1);
        assert_eq!(filter.get("userId"), Some(&Value::ObjectId(id)));
    }

    #[test]
    fn find_options_builder() {
        let options = FindOptions::new().skip(2).limit(5).sort_desc("age");
        assert_eq!(options.skip, 2);
        assert_eq!(options.limit, Some(5));
        assert_eq!(
            options.sort,
            Some(Sort {
                field: "age".into(),
                order: SortOrder::Descending
            })
        );
    }
}
