//! Identifier coercion for filter documents.
//!
//! Filters built from user input carry identifiers as hex text. The store
//! compares identifiers by type, so those strings are rewritten into
//! [`ObjectId`] values before the filter is used. Which strings qualify is
//! decided from key names alone; see [`CoercionConfig`].

use crate::config::CoercionConfig;
use docrel_codec::{CodecError, ObjectId, Value};
use tracing::debug;

/// A candidate string that failed to parse as an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionIssue {
    /// Keys from the filter root down to the value.
    pub path: Vec<String>,
    /// The text left in place.
    pub value: String,
    /// Why parsing failed.
    pub error: CodecError,
}

/// Outcome of a coercion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionReport {
    /// Number of strings rewritten into identifiers.
    pub coerced: usize,
    /// Candidates that were left unchanged.
    pub issues: Vec<CoercionIssue>,
}

impl CoercionReport {
    /// Returns true if every candidate was rewritten.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Rewrites identifier-shaped strings in a filter document.
#[derive(Debug, Clone, Default)]
pub struct IdentifierCoercer {
    config: CoercionConfig,
}

impl IdentifierCoercer {
    /// Creates a coercer with the given heuristics.
    #[must_use]
    pub fn new(config: CoercionConfig) -> Self {
        Self { config }
    }

    /// Returns the heuristics in use.
    pub fn config(&self) -> &CoercionConfig {
        &self.config
    }

    /// Coerces `filter` in place.
    ///
    /// A text value is a candidate when its own key or any enclosing key
    /// looks like an identifier and it has the candidate length. Anything
    /// other than a map is left alone. Running the pass twice changes
    /// nothing the second time.
    pub fn coerce(&self, filter: &mut Value) -> CoercionReport {
        let mut report = CoercionReport::default();
        if let Value::Map(pairs) = filter {
            let mut path = Vec::new();
            self.coerce_map(pairs, &mut path, &mut report);
        }
        report
    }

    fn coerce_map(
        &self,
        pairs: &mut [(Value, Value)],
        path: &mut Vec<String>,
        report: &mut CoercionReport,
    ) {
        for (key, value) in pairs.iter_mut() {
            let Some(key) = key.as_text() else {
                continue;
            };
            path.push(key.to_string());
            self.coerce_value(value, path, report);
            path.pop();
        }
    }

    fn coerce_value(&self, value: &mut Value, path: &mut Vec<String>, report: &mut CoercionReport) {
        match value {
            Value::Map(pairs) => self.coerce_map(pairs, path, report),
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.coerce_value(item, path, report);
                }
            }
            Value::Text(_) => self.coerce_text(value, path, report),
            _ => {}
        }
    }

    fn coerce_text(&self, value: &mut Value, path: &[String], report: &mut CoercionReport) {
        let Value::Text(text) = value else {
            return;
        };
        if text.len() != self.config.candidate_len {
            return;
        }
        if !path.iter().any(|key| self.config.key_looks_like_id(key)) {
            return;
        }

        match ObjectId::parse_str(text) {
            Ok(id) => {
                *value = Value::ObjectId(id);
                report.coerced += 1;
            }
            Err(error) => {
                debug!(path = %path.join("."), value = %text, %error, "identifier candidate left as text");
                report.issues.push(CoercionIssue {
                    path: path.to_vec(),
                    value: text.clone(),
                    error,
                });
            }
        }
    }
}

/// Coerces `filter` in place with the default heuristics.
pub fn coerce_identifiers(filter: &mut Value) -> CoercionReport {
    IdentifierCoercer::default().coerce(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "5f1b2c3d4e5f60718293a4b5";

    fn oid() -> ObjectId {
        ObjectId::parse_str(HEX).unwrap()
    }

    #[test]
    fn coerces_id_suffixed_key() {
        let mut filter = Value::document([("userId", Value::from(HEX))]);
        let report = coerce_identifiers(&mut filter);

        assert_eq!(report.coerced, 1);
        assert!(report.is_clean());
        assert_eq!(filter.get("userId"), Some(&Value::ObjectId(oid())));
    }

    #[test]
    fn short_strings_untouched() {
        let mut filter = Value::document([("userId", Value::from("short"))]);
        let report = coerce_identifiers(&mut filter);

        assert_eq!(report, CoercionReport::default());
        assert_eq!(filter.get("userId"), Some(&Value::from("short")));
    }

    #[test]
    fn nested_under_plain_key() {
        let mut filter = Value::document([("owner", Value::document([("id", Value::from(HEX))]))]);
        coerce_identifiers(&mut filter);

        let owner = filter.get("owner").unwrap();
        assert_eq!(owner.get("id"), Some(&Value::ObjectId(oid())));
    }

    #[test]
    fn operator_documents_inherit_ancestor() {
        let mut filter = Value::document([(
            "author_id",
            Value::document([(
                "$in",
                Value::Array(vec![Value::from(HEX), Value::from("x")]),
            )]),
        )]);
        let report = coerce_identifiers(&mut filter);

        assert_eq!(report.coerced, 1);
        let list = filter.get("author_id").unwrap().get("$in").unwrap();
        assert_eq!(
            list,
            &Value::Array(vec![Value::ObjectId(oid()), Value::from("x")])
        );
    }

    #[test]
    fn ancestors_accumulate() {
        let mut filter = Value::document([(
            "ownerIds",
            Value::document([("$elemMatch", Value::document([("$eq", Value::from(HEX))]))]),
        )]);
        let report = coerce_identifiers(&mut filter);
        assert_eq!(report.coerced, 1);
    }

    #[test]
    fn arrays_of_documents() {
        let mut filter = Value::document([(
            "$or",
            Value::Array(vec![
                Value::document([("_id", Value::from(HEX))]),
                Value::document([("name", Value::from(HEX))]),
            ]),
        )]);
        let report = coerce_identifiers(&mut filter);

        assert_eq!(report.coerced, 1);
        let branches = filter.get("$or").unwrap().as_array().unwrap();
        assert_eq!(branches[0].get("_id"), Some(&Value::ObjectId(oid())));
        assert_eq!(branches[1].get("name"), Some(&Value::from(HEX)));
    }

    #[test]
    fn unrelated_keys_untouched() {
        let mut filter = Value::document([("title", Value::from(HEX))]);
        let report = coerce_identifiers(&mut filter);

        assert_eq!(report.coerced, 0);
        assert_eq!(filter.get("title"), Some(&Value::from(HEX)));
    }

    #[test]
    fn bad_hex_is_reported_and_kept() {
        let bad = "zzzzzzzzzzzzzzzzzzzzzzzz";
        let mut filter = Value::document([("user_id", Value::from(bad))]);
        let report = coerce_identifiers(&mut filter);

        assert_eq!(report.coerced, 0);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].path, vec!["user_id".to_string()]);
        assert_eq!(report.issues[0].value, bad);
        assert!(matches!(report.issues[0].error, CodecError::InvalidObjectId { .. }));
        assert_eq!(filter.get("user_id"), Some(&Value::from(bad)));
    }

    #[test]
    fn candidate_length_counts_bytes() {
        let wide = "\u{e9}".repeat(24);
        let mut filter = Value::document([("user_id", Value::from(wide.as_str()))]);
        assert!(coerce_identifiers(&mut filter).is_clean());
        assert_eq!(filter.get("user_id"), Some(&Value::from(wide.as_str())));

        let narrow = "\u{e9}".repeat(12);
        let mut filter = Value::document([("user_id", Value::from(narrow.as_str()))]);
        let report = coerce_identifiers(&mut filter);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].value, narrow);
    }

    #[test]
    fn non_map_is_noop() {
        let mut value = Value::from(HEX);
        assert_eq!(coerce_identifiers(&mut value), CoercionReport::default());
        assert_eq!(value, Value::from(HEX));

        let mut null = Value::Null;
        assert_eq!(coerce_identifiers(&mut null), CoercionReport::default());
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut filter = Value::document([
            ("_id", Value::from(HEX)),
            ("tagIDs", Value::Array(vec![Value::from(HEX)])),
        ]);
        let first = coerce_identifiers(&mut filter);
        assert_eq!(first.coerced, 2);

        let snapshot = filter.clone();
        let second = coerce_identifiers(&mut filter);
        assert_eq!(second.coerced, 0);
        assert_eq!(filter, snapshot);
    }

    #[test]
    fn custom_suffixes() {
        let coercer = IdentifierCoercer::new(CoercionConfig::new().suffixes(["Ref"]));
        let mut filter = Value::document([
            ("ownerRef", Value::from(HEX)),
            ("userId", Value::from(HEX)),
        ]);
        let report = coercer.coerce(&mut filter);

        assert_eq!(report.coerced, 1);
        assert_eq!(filter.get("ownerRef"), Some(&Value::ObjectId(oid())));
        assert_eq!(filter.get("userId"), Some(&Value::from(HEX)));
    }
}
