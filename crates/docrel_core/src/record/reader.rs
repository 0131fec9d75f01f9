use crate::error::{CoreError, CoreResult};
use crate::record::RecordDescriptor;
use docrel_codec::{ObjectId, Value};

/// Typed access to the fields of a stored document.
///
/// Used by [`Record::from_document`](crate::Record::from_document)
/// implementations. Keys are storage names. Errors name the record type
/// being decoded.
#[derive(Debug, Clone, Copy)]
pub struct DocumentReader<'a> {
    type_name: &'static str,
    doc: &'a Value,
}

impl<'a> DocumentReader<'a> {
    /// Wraps a document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if `doc` is not a map.
    pub fn new(descriptor: &RecordDescriptor, doc: &'a Value) -> CoreResult<Self> {
        if doc.as_map().is_none() {
            return Err(CoreError::invalid_format(
                descriptor.type_name(),
                format!("expected map, found {}", doc.kind_name()),
            ));
        }
        Ok(Self {
            type_name: descriptor.type_name(),
            doc,
        })
    }

    /// Returns the raw value, treating `Null` as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.doc.get(key).filter(|v| !v.is_null())
    }

    fn require(&self, key: &str) -> CoreResult<&'a Value> {
        self.get(key)
            .ok_or_else(|| CoreError::invalid_format(self.type_name, format!("missing {key}")))
    }

    fn mismatch(&self, key: &str, expected: &str, found: &Value) -> CoreError {
        CoreError::invalid_format(
            self.type_name,
            format!("{key}: expected {expected}, found {}", found.kind_name()),
        )
    }

    /// Reads a required object identifier.
    pub fn object_id(&self, key: &str) -> CoreResult<ObjectId> {
        let value = self.require(key)?;
        value
            .as_object_id()
            .ok_or_else(|| self.mismatch(key, "object id", value))
    }

    /// Reads an optional object identifier.
    pub fn optional_object_id(&self, key: &str) -> CoreResult<Option<ObjectId>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_object_id()
                .map(Some)
                .ok_or_else(|| self.mismatch(key, "object id", value)),
        }
    }

    /// Reads a list of object identifiers. A missing key reads as empty.
    pub fn object_ids(&self, key: &str) -> CoreResult<Vec<ObjectId>> {
        self.list(key, "object id", Value::as_object_id)
    }

    /// Reads a text value. A missing key reads as the empty string.
    pub fn text(&self, key: &str) -> CoreResult<String> {
        Ok(self.optional_text(key)?.unwrap_or_default())
    }

    /// Reads an optional text value.
    pub fn optional_text(&self, key: &str) -> CoreResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_text()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.mismatch(key, "text", value)),
        }
    }

    /// Reads a list of text values. A missing key reads as empty.
    pub fn texts(&self, key: &str) -> CoreResult<Vec<String>> {
        self.list(key, "text", |v| v.as_text().map(str::to_string))
    }

    /// Reads an integer. A missing key reads as zero.
    pub fn integer(&self, key: &str) -> CoreResult<i64> {
        match self.get(key) {
            None => Ok(0),
            Some(value) => value
                .as_integer()
                .ok_or_else(|| self.mismatch(key, "integer", value)),
        }
    }

    /// Reads a boolean. A missing key reads as false.
    pub fn boolean(&self, key: &str) -> CoreResult<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| self.mismatch(key, "bool", value)),
        }
    }

    fn list<T>(
        &self,
        key: &str,
        expected: &str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> CoreResult<Vec<T>> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.mismatch(key, "array", value))?;
        items
            .iter()
            .map(|item| convert(item).ok_or_else(|| self.mismatch(key, expected, item)))
            .collect()
    }
}
