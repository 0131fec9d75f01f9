//! Configuration for the identifier coercion pass and the in-memory store.

use docrel_codec::OBJECT_ID_HEX_LEN;

/// Key-name heuristics used by [`IdentifierCoercer`](crate::IdentifierCoercer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionConfig {
    /// Keys that are identifiers when matched exactly.
    pub exact_keys: Vec<String>,

    /// Case-sensitive suffixes that mark a key as identifier-shaped.
    pub suffixes: Vec<String>,

    /// Byte length a text value must have to be considered for parsing.
    pub candidate_len: usize,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            exact_keys: vec!["_id".into(), "id".into()],
            suffixes: ["_id", "Id", "ID", "_ids", "Ids", "IDs"]
                .into_iter()
                .map(String::from)
                .collect(),
            candidate_len: OBJECT_ID_HEX_LEN,
        }
    }
}

impl CoercionConfig {
    /// Creates a configuration with the default heuristics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key that is an identifier when matched exactly.
    #[must_use]
    pub fn with_exact_key(mut self, key: impl Into<String>) -> Self {
        self.exact_keys.push(key.into());
        self
    }

    /// Adds an identifier suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffixes.push(suffix.into());
        self
    }

    /// Replaces the suffix list.
    #[must_use]
    pub fn suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if `key` looks like it holds an identifier.
    pub fn key_looks_like_id(&self, key: &str) -> bool {
        self.exact_keys.iter().any(|k| k == key)
            || self.suffixes.iter().any(|s| key.ends_with(s.as_str()))
    }
}

/// Behaviour switches for [`MemoryCollection`](crate::MemoryCollection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStoreConfig {
    /// Whether `create` rejects a record whose identifier already exists.
    pub reject_duplicate_ids: bool,

    /// Limit applied to reads that do not set one.
    pub default_read_limit: Option<usize>,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            reject_duplicate_ids: true,
            default_read_limit: None,
        }
    }
}

impl MemoryStoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether duplicate identifiers are rejected on create.
    #[must_use]
    pub const fn reject_duplicate_ids(mut self, value: bool) -> Self {
        self.reject_duplicate_ids = value;
        self
    }

    /// Sets the limit applied to reads without an explicit limit.
    #[must_use]
    pub const fn default_read_limit(mut self, limit: Option<usize>) -> Self {
        self.default_read_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_heuristics() {
        let config = CoercionConfig::default();
        for key in ["_id", "id", "userId", "user_id", "ownerID", "tagIds", "tagIDs", "tag_ids"] {
            assert!(config.key_looks_like_id(key), "{key} should look like an id");
        }
        for key in ["name", "paid", "identity", "Identifier", "userid", "ID_card"] {
            assert!(!config.key_looks_like_id(key), "{key} should not look like an id");
        }
        assert_eq!(config.candidate_len, 24);
    }

    #[test]
    fn builder_pattern() {
        let config = CoercionConfig::new()
            .suffixes(["Ref"])
            .with_exact_key("pk");

        assert!(config.key_looks_like_id("ownerRef"));
        assert!(config.key_looks_like_id("pk"));
        assert!(!config.key_looks_like_id("userId"));
    }

    #[test]
    fn memory_store_defaults() {
        let config = MemoryStoreConfig::default();
        assert!(config.reject_duplicate_ids);
        assert_eq!(config.default_read_limit, None);

        let config = MemoryStoreConfig::new()
            .reject_duplicate_ids(false)
            .default_read_limit(Some(10));
        assert!(!config.reject_duplicate_ids);
        assert_eq!(config.default_read_limit, Some(10));
    }
}
