//! ActiveRecord-style queries over a project's records.

use crate::filter::{self, Condition, Lookup, Operator};
use crate::metadata::FieldMetadata;
use crate::payload::RECORD_ID;
use crate::record::{Record, Value};
use crate::{Client, Error, RecordQuery, Result};
use serde_json::Value as JsonValue;

/// Finder methods bound to one client.
///
/// Conditions are single-pair JSON maps such as `json!({"age": 18})`. The
/// pseudo-field `id` takes an array of record ids.
///
/// # Examples
///
/// ```no_run
/// use redcap::{Client, Configuration};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), redcap::Error> {
/// let client = Client::builder()
///     .configuration(Configuration::new("https://redcap.example.com/api/", "TOKEN"))
///     .build()?;
/// let patients = client.finder();
///
/// let smiths = patients.where_eq(json!({"last_name": "Smith"})).await?;
/// let first_two = patients.where_eq(json!({"id": [1, 2]})).await?;
/// let adults = patients.gte(json!({"age": 18})).await?;
/// println!("{} {} {}", smiths.len(), first_two.len(), adults.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Finder {
    client: Client,
}

impl Finder {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn metadata(&self) -> Result<Vec<FieldMetadata>> {
        self.client.metadata().await
    }

    pub async fn fields(&self) -> Result<Vec<String>> {
        self.client.fields().await
    }

    /// Fetches one record by integer id.
    ///
    /// Returns `Ok(None)` without a request when `id` is not an integer, and
    /// when REDCap has no such record.
    pub async fn find(&self, id: impl Into<JsonValue>) -> Result<Option<Record>> {
        let id: JsonValue = id.into();
        let Some(id) = id.as_i64() else {
            return Ok(None);
        };
        let rows = self.client.records(&RecordQuery::new().records([id])).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn all(&self) -> Result<Vec<Record>> {
        self.client.records(&RecordQuery::new()).await
    }

    /// Returns every record id as an integer.
    pub async fn ids(&self) -> Result<Vec<i64>> {
        let rows = self
            .client
            .records(&RecordQuery::new().fields([RECORD_ID]))
            .await?;
        Ok(rows
            .iter()
            .map(|r| r.record_id().map(Value::to_integer).unwrap_or(0))
            .collect())
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.ids().await?.len())
    }

    /// Returns one field's value for every record.
    ///
    /// An empty field name returns an empty list without a request.
    pub async fn pluck(&self, field: &str) -> Result<Vec<Value>> {
        if field.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .records(&RecordQuery::new().fields([field]))
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| r.get(field).cloned().unwrap_or_default())
            .collect())
    }

    /// Fetches every record limited to `fields` (plus `record_id`).
    pub async fn select<I, S>(&self, fields: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.client.records(&RecordQuery::new().fields(fields)).await
    }

    /// Records whose field equals the value.
    pub async fn where_eq(&self, condition: JsonValue) -> Result<Vec<Record>> {
        self.compare(&Condition::try_from(condition)?, &Operator::Eq)
            .await
    }

    pub async fn gt(&self, condition: JsonValue) -> Result<Vec<Record>> {
        self.compare(&Condition::try_from(condition)?, &Operator::Gt)
            .await
    }

    pub async fn lt(&self, condition: JsonValue) -> Result<Vec<Record>> {
        self.compare(&Condition::try_from(condition)?, &Operator::Lt)
            .await
    }

    pub async fn gte(&self, condition: JsonValue) -> Result<Vec<Record>> {
        self.compare(&Condition::try_from(condition)?, &Operator::Gte)
            .await
    }

    pub async fn lte(&self, condition: JsonValue) -> Result<Vec<Record>> {
        self.compare(&Condition::try_from(condition)?, &Operator::Lte)
            .await
    }

    /// Runs a condition with any operator.
    ///
    /// Operators other than `=`, `>`, `<`, `>=` and `<=` match nothing and
    /// send no request.
    pub async fn compare(&self, condition: &Condition, operator: &Operator) -> Result<Vec<Record>> {
        match filter::comparison(condition, operator)? {
            Lookup::Ids(ids) => self.client.records(&RecordQuery::new().records(ids)).await,
            Lookup::Filter(logic) => {
                self.client
                    .records(&RecordQuery::new().filter(logic))
                    .await
            }
            Lookup::Empty => Ok(Vec::new()),
        }
    }

    pub fn find_or_create_by(&self, _condition: JsonValue) -> Result<Record> {
        Err(Error::Unsupported("find_or_create_by"))
    }

    pub fn having(&self, _condition: JsonValue) -> Result<Vec<Record>> {
        Err(Error::Unsupported("having"))
    }

    pub fn group(&self, _field: &str) -> Result<Vec<Record>> {
        Err(Error::Unsupported("group"))
    }

    pub fn order(&self, _condition: JsonValue) -> Result<Vec<Record>> {
        Err(Error::Unsupported("order"))
    }

    pub fn where_not(&self, _condition: JsonValue) -> Result<Vec<Record>> {
        Err(Error::Unsupported("where_not"))
    }
}

impl Client {
    /// Returns a [`Finder`] sharing this client.
    pub fn finder(&self) -> Finder {
        Finder::new(self.clone())
    }
}
