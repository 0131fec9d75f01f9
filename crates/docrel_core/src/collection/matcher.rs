//! Filter evaluation for the in-memory store.

use crate::error::{StoreError, StoreResult};
use docrel_codec::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(Value),
    Ne(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Field {
        path: Vec<String>,
        conditions: Vec<Condition>,
    },
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
}

/// A compiled filter document.
///
/// Top-level clauses are AND-ed. A plain value means equality, an operator
/// document (`$eq`, `$ne`, `$in`, `$nin`) applies each operator, and
/// `$and`/`$or` combine nested filters. An array-valued field matches when
/// the array itself or any element satisfies the condition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Matcher {
    clauses: Vec<Clause>,
}

impl Matcher {
    pub(crate) fn compile(filter: &Value) -> StoreResult<Self> {
        let pairs = match filter {
            Value::Null => return Ok(Self { clauses: Vec::new() }),
            Value::Map(pairs) => pairs,
            other => {
                return Err(StoreError::invalid_filter(format!(
                    "expected map, found {}",
                    other.kind_name()
                )))
            }
        };

        let mut clauses = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = key
                .as_text()
                .ok_or_else(|| StoreError::invalid_filter("filter keys must be text"))?;
            let clause = match key {
                "$and" => Clause::And(compile_list(key, value)?),
                "$or" => Clause::Or(compile_list(key, value)?),
                op if op.starts_with('$') => {
                    return Err(StoreError::invalid_filter(format!(
                        "unsupported top-level operator {op}"
                    )))
                }
                field => Clause::Field {
                    path: field.split('.').map(str::to_string).collect(),
                    conditions: compile_conditions(field, value)?,
                },
            };
            clauses.push(clause);
        }
        Ok(Self { clauses })
    }

    pub(crate) fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Field { path, conditions } => {
                let actual = lookup(doc, path);
                conditions.iter().all(|c| condition_holds(c, actual))
            }
            Clause::And(all) => all.iter().all(|m| m.matches(doc)),
            Clause::Or(any) => any.iter().any(|m| m.matches(doc)),
        })
    }
}

fn compile_list(op: &str, value: &Value) -> StoreResult<Vec<Matcher>> {
    let items = value
        .as_array()
        .ok_or_else(|| StoreError::invalid_filter(format!("{op} expects an array")))?;
    if items.is_empty() {
        return Err(StoreError::invalid_filter(format!("{op} expects a non-empty array")));
    }
    items.iter().map(Matcher::compile).collect()
}

fn compile_conditions(field: &str, value: &Value) -> StoreResult<Vec<Condition>> {
    let Some(pairs) = value.as_map() else {
        return Ok(vec![Condition::Eq(value.clone())]);
    };

    let operators = pairs
        .iter()
        .filter(|(k, _)| k.as_text().is_some_and(|k| k.starts_with('$')))
        .count();
    if operators == 0 {
        return Ok(vec![Condition::Eq(value.clone())]);
    }
    if operators != pairs.len() {
        return Err(StoreError::invalid_filter(format!(
            "{field}: operators mixed with plain keys"
        )));
    }

    pairs
        .iter()
        .map(|(op, operand)| match op.as_text().unwrap_or_default() {
            "$eq" => Ok(Condition::Eq(operand.clone())),
            "$ne" => Ok(Condition::Ne(operand.clone())),
            "$in" => Ok(Condition::In(operand_list(field, "$in", operand)?)),
            "$nin" => Ok(Condition::Nin(operand_list(field, "$nin", operand)?)),
            other => Err(StoreError::invalid_filter(format!(
                "{field}: unsupported operator {other}"
            ))),
        })
        .collect()
}

fn operand_list(field: &str, op: &str, operand: &Value) -> StoreResult<Vec<Value>> {
    operand
        .as_array()
        .map(<[Value]>::to_vec)
        .ok_or_else(|| StoreError::invalid_filter(format!("{field}: {op} expects an array")))
}

/// Follows a dotted path through embedded documents.
pub(crate) fn lookup<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |current, key| current.get(key))
}

fn equals(actual: Option<&Value>, target: &Value) -> bool {
    match actual {
        None => target.is_null(),
        Some(value) if value == target => true,
        Some(Value::Array(items)) => items.iter().any(|item| item == target),
        Some(_) => false,
    }
}

fn condition_holds(condition: &Condition, actual: Option<&Value>) -> bool {
    match condition {
        Condition::Eq(target) => equals(actual, target),
        Condition::Ne(target) => !equals(actual, target),
        Condition::In(targets) => targets.iter().any(|t| equals(actual, t)),
        Condition::Nin(targets) => !targets.iter().any(|t| equals(actual, t)),
    }
}

/// Orders values for sorting: integers numerically, text lexically, and
/// anything else by canonical encoding. Missing values sort first.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Integer(x)), Some(Value::Integer(y))) => x.cmp(y),
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.cmp_canonical(y),
    }
}
