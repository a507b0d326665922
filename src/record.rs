//! Schema-less REDCap rows.
//!
//! A REDCap project defines its columns at runtime, so a row is an ordered
//! map from field name to a scalar [`Value`] rather than a fixed struct.

use crate::payload::RECORD_ID;
use crate::{Client, Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a REDCap row.
///
/// Flat JSON exports from REDCap carry every value as a string; numbers
/// appear when rows are built locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string payload of a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the value as an integer the lenient way record ids need.
    ///
    /// Strings contribute their leading integer (`"12"` is 12, `"7abc"` is 7,
    /// `"abc"` is 0), floats are truncated and null is 0. Values beyond the
    /// `i64` range saturate at `i64::MAX` / `i64::MIN`.
    ///
    /// # Examples
    ///
    /// ```
    /// use redcap::Value;
    ///
    /// assert_eq!(Value::from("42").to_integer(), 42);
    /// assert_eq!(Value::from(" -3x").to_integer(), -3);
    /// assert_eq!(Value::from("n/a").to_integer(), 0);
    /// assert_eq!(Value::Float(2.9).to_integer(), 2);
    /// ```
    pub fn to_integer(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Integer(i) => *i,
            Value::Float(f) => *f as i64,
            Value::String(s) => leading_integer(s),
        }
    }
}

fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return 0;
    }
    // Only overflow can fail here; saturate so ordering survives.
    match (digits.parse::<i64>(), negative) {
        (Ok(magnitude), true) => -magnitude,
        (Ok(magnitude), false) => magnitude,
        (Err(_), true) => i64::MIN,
        (Err(_), false) => i64::MAX,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One row of a REDCap project.
///
/// Records compare by content. A record without `record_id` has not been
/// saved yet; [`Record::save`] assigns one.
///
/// # Examples
///
/// ```
/// use redcap::{Record, Value};
///
/// let mut patient = Record::new();
/// patient.set("first_name", "Ada");
/// patient.set("age", 36);
///
/// assert!(patient.id().is_none());
/// assert_eq!(patient.get("age"), Some(&Value::Integer(36)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `record_id` of a persisted record. Null counts as absent.
    pub fn record_id(&self) -> Option<&Value> {
        self.fields.get(RECORD_ID).filter(|v| !v.is_null())
    }

    /// Alias for [`Record::record_id`].
    pub fn id(&self) -> Option<&Value> {
        self.record_id()
    }

    /// Writes this record through `client`.
    ///
    /// A record with a `record_id` is updated and the result is `true` when
    /// REDCap reports exactly one row written. A record without one is given
    /// `max_id + 1`, created, and the result is `true` when REDCap echoes that
    /// id back.
    pub async fn save(&mut self, client: &Client) -> Result<bool> {
        if self.record_id().is_some() {
            return client.update(std::slice::from_ref(self)).await;
        }

        let max_id = client.max_id().await?;
        let next_id = max_id
            .checked_add(1)
            .ok_or(Error::RecordIdOverflow { max_id })?
            .to_string();
        self.set(RECORD_ID, next_id.as_str());
        let ids = client.create(std::slice::from_ref(self)).await?;

        let created = ids.first().map(|id| *id == next_id).unwrap_or(false);
        if !created {
            tracing::warn!(
                record_id = %next_id,
                returned = ?ids,
                "REDCap did not confirm the created record id"
            );
        }
        Ok(created)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
