//! Translation of finder conditions into REDCap filter logic.
//!
//! A condition is a single `{field: value}` pair. Filtering by the
//! pseudo-field `id` does not produce filter logic at all: REDCap can export
//! an explicit list of record ids, so the lookup becomes an id fetch.

use crate::{Error, Result};
use serde_json::Value as JsonValue;
use std::fmt;

/// Comparison operator applied to a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    /// Any operator REDCap filter logic is not built for here.
    Other(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Other(op) => op,
        }
    }

    fn is_ordered(&self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte
        )
    }
}

impl From<&str> for Operator {
    fn from(op: &str) -> Self {
        match op {
            "=" => Operator::Eq,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            other => Operator::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `{field: value}` pair.
///
/// # Examples
///
/// ```
/// use redcap::filter::Condition;
/// use serde_json::json;
///
/// let condition = Condition::try_from(json!({"age": 5})).unwrap();
/// assert_eq!(condition.field(), "age");
///
/// assert!(Condition::try_from(json!({"a": 1, "b": 2})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: String,
    value: JsonValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Builds a condition from key/value pairs, requiring exactly one.
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        let mut pairs = pairs.into_iter();
        match (pairs.next(), pairs.next()) {
            (Some((field, value)), None) => Ok(Self::new(field, value)),
            (None, _) => Err(Error::InvalidCondition(
                "condition must have one key/value pair, got none".to_string(),
            )),
            (Some(_), Some(_)) => Err(Error::InvalidCondition(format!(
                "condition must have one key/value pair, got {}",
                2 + pairs.count()
            ))),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &JsonValue {
        &self.value
    }
}

impl TryFrom<JsonValue> for Condition {
    type Error = Error;

    fn try_from(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Self::from_pairs(map),
            other => Err(Error::InvalidCondition(format!(
                "condition must be a map, got {}",
                other
            ))),
        }
    }
}

/// How a condition is resolved against the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Export exactly these record ids.
    Ids(Vec<String>),
    /// Export the rows matching this `filterLogic` expression.
    Filter(String),
    /// Nothing to fetch; the result set is empty.
    Empty,
}

/// Translates a condition and operator into a [`Lookup`].
///
/// * `id` must map to an array of integers and yields [`Lookup::Ids`].
/// * `=` yields `[field] = 'value'`.
/// * `>`, `<`, `>=`, `<=` need a numeric value and yield `[field] op value`.
/// * Any other operator yields [`Lookup::Empty`] without an error.
///
/// # Examples
///
/// ```
/// use redcap::filter::{comparison, Condition, Lookup, Operator};
///
/// let lookup = comparison(&Condition::new("age", 5), &Operator::Gt).unwrap();
/// assert_eq!(lookup, Lookup::Filter("[age] > 5".to_string()));
/// ```
pub fn comparison(condition: &Condition, operator: &Operator) -> Result<Lookup> {
    let field = condition.field();
    let value = condition.value();

    if field == "id" {
        return record_ids(value).map(Lookup::Ids);
    }

    if *operator == Operator::Eq {
        return Ok(Lookup::Filter(format!(
            "[{}] = '{}'",
            field,
            literal(value)
        )));
    }

    if operator.is_ordered() {
        return match value {
            JsonValue::Number(n) => Ok(Lookup::Filter(format!("[{}] {} {}", field, operator, n))),
            other => Err(Error::InvalidCondition(format!(
                "`{}` comparison on [{}] needs an integer or float, got {}",
                operator, field, other
            ))),
        };
    }

    tracing::debug!(operator = %operator, field = %field, "Unknown comparison operator");
    Ok(Lookup::Empty)
}

fn record_ids(value: &JsonValue) -> Result<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        Error::InvalidCondition(format!(
            "searching by id needs an array of integers, got {}",
            value
        ))
    })?;

    items
        .iter()
        .map(|item| match item.as_i64() {
            Some(id) => Ok(id.to_string()),
            None => Err(Error::InvalidCondition(format!(
                "record id {} is not an integer",
                item
            ))),
        })
        .collect()
}

// Strings go in bare; everything else in its JSON form.
fn literal(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
