//! REDCap API client.
//!
//! The [`Client`] type exposes the project, metadata, record and survey
//! operations. Use [`ClientBuilder`] to configure and create clients.

use crate::{
    config::{self, Configuration},
    metadata::FieldMetadata,
    payload::{self, Content, ReturnContent, RECORD_ID},
    record::Record,
    transport::Transport,
    Error, Result,
};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Shared, mutable configuration read by a client on every call.
pub type SharedConfiguration = Arc<RwLock<Configuration>>;

/// Parameters of a record export.
///
/// # Examples
///
/// ```
/// use redcap::RecordQuery;
///
/// let query = RecordQuery::new()
///     .fields(["first_name", "age"])
///     .filter("[age] > 18");
/// assert_eq!(query.field_names(), &["first_name", "age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    records: Vec<String>,
    fields: Vec<String>,
    filter: Option<String>,
}

impl RecordQuery {
    /// An export of every field of every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the export to these record ids.
    pub fn records<I, S>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.records = records.into_iter().map(|r| r.to_string()).collect();
        self
    }

    /// Restricts the export to these fields. `record_id` is always added.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sends `filter` as REDCap filter logic.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn record_ids(&self) -> &[String] {
        &self.records
    }

    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    pub fn filter_logic(&self) -> Option<&str> {
        self.filter.as_deref()
    }
}

/// A client for one REDCap project.
///
/// Cloning is cheap and clones share the configuration, the log flag and
/// the response cache. Every operation sends exactly one request and waits
/// for the whole response.
///
/// # Examples
///
/// ```no_run
/// use redcap::{Client, Configuration, RecordQuery};
///
/// # async fn example() -> Result<(), redcap::Error> {
/// let client = Client::builder()
///     .configuration(Configuration::new("https://redcap.example.com/api/", "TOKEN"))
///     .build()?;
///
/// let adults = client
///     .records(&RecordQuery::new().fields(["age"]).filter("[age] >= 18"))
///     .await?;
/// println!("{} adults, next id {}", adults.len(), client.max_id().await? + 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    configuration: SharedConfiguration,
    transport: Transport,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns a snapshot of the current configuration.
    pub fn configuration(&self) -> Configuration {
        self.inner
            .configuration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutates the configuration in place and returns the result.
    ///
    /// Clients sharing this configuration see the change on their next call.
    pub fn configure<F>(&self, f: F) -> Configuration
    where
        F: FnOnce(&mut Configuration),
    {
        let mut config = self
            .inner
            .configuration
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut config);
        config.clone()
    }

    pub fn log_enabled(&self) -> bool {
        self.inner.transport.log_enabled()
    }

    /// Logs request payloads and response bodies at debug level.
    pub fn set_log(&self, enabled: bool) {
        self.inner.transport.set_log(enabled);
    }

    pub fn cache_enabled(&self) -> bool {
        self.inner.transport.cache_enabled()
    }

    /// Drops all memoized responses.
    pub fn flush_cache(&self) -> usize {
        self.inner.transport.flush_cache()
    }

    /// Exports the project settings.
    pub async fn project(&self) -> Result<JsonValue> {
        let config = self.configuration();
        let payload = payload::build(&config, Content::Project, &[], &[], None);
        self.inner.transport.post(config.host(), &payload).await
    }

    /// Exports the data dictionary.
    pub async fn metadata(&self) -> Result<Vec<FieldMetadata>> {
        let config = self.configuration();
        let payload = payload::build(&config, Content::Metadata, &[], &[], None);
        let response = self.inner.transport.post(config.host(), &payload).await?;
        decode(response)
    }

    /// Returns every field name in data dictionary order.
    pub async fn fields(&self) -> Result<Vec<String>> {
        Ok(self
            .metadata()
            .await?
            .into_iter()
            .map(|m| m.field_name)
            .collect())
    }

    /// Exports records.
    pub async fn records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let config = self.configuration();
        let payload = payload::build(
            &config,
            Content::Record,
            &query.records,
            &query.fields,
            query.filter.as_deref(),
        );
        let response = self.inner.transport.post(config.host(), &payload).await?;
        decode(response)
    }

    /// Returns the largest numeric `record_id`, or 0 for an empty project.
    pub async fn max_id(&self) -> Result<i64> {
        let rows = self
            .records(&RecordQuery::new().fields([RECORD_ID]))
            .await?;
        Ok(rows
            .iter()
            .filter_map(Record::record_id)
            .map(|id| id.to_integer())
            .max()
            .unwrap_or(0))
    }

    /// Imports new records and returns the ids REDCap assigned.
    pub async fn create(&self, data: &[Record]) -> Result<Vec<String>> {
        let config = self.configuration();
        let payload = payload::build_import(&config, data, ReturnContent::Ids)?;
        self.flush_before_write();

        match self.inner.transport.post_uncached(config.host(), &payload).await? {
            JsonValue::Array(ids) => Ok(ids.into_iter().map(id_string).collect()),
            other => Err(unexpected(other, "expected an array of record ids")),
        }
    }

    /// Imports existing records. Returns `true` when exactly one row was written.
    pub async fn update(&self, data: &[Record]) -> Result<bool> {
        let config = self.configuration();
        let payload = payload::build_import(&config, data, ReturnContent::Count)?;
        self.flush_before_write();

        let response = self
            .inner
            .transport
            .post_uncached(config.host(), &payload)
            .await?;
        let count = match response.get("count") {
            Some(JsonValue::Number(n)) => n.as_i64(),
            Some(JsonValue::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        match count {
            Some(count) => Ok(count == 1),
            None => Err(unexpected(response, "expected a count of written rows")),
        }
    }

    /// Returns the survey URL of `instrument` for one record.
    pub async fn survey_link(
        &self,
        record_id: impl fmt::Display,
        instrument: &str,
    ) -> Result<String> {
        let config = self.configuration();
        let payload = payload::build_record(
            &config,
            Content::SurveyLink,
            &record_id.to_string(),
            instrument,
        );
        let body = self.inner.transport.post_raw(config.host(), &payload).await?;
        Ok(body.trim().to_string())
    }

    fn flush_before_write(&self) {
        if self.cache_enabled() {
            let flushed = self.flush_cache();
            tracing::debug!(entries = flushed, "Flushed response cache before write");
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("configuration", &self.configuration())
            .field("transport", &self.inner.transport)
            .finish()
    }
}

fn decode<T: DeserializeOwned>(value: JsonValue) -> Result<T> {
    let raw_response = value.to_string();
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, raw_response = %raw_response, "Unexpected response shape");
        Error::DeserializationFailed {
            raw_response,
            serde_error: e.to_string(),
            status: StatusCode::OK,
        }
    })
}

fn unexpected(value: JsonValue, expected: &str) -> Error {
    Error::DeserializationFailed {
        raw_response: value.to_string(),
        serde_error: expected.to_string(),
        status: StatusCode::OK,
    }
}

fn id_string(id: JsonValue) -> String {
    match id {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use redcap::{ClientBuilder, Configuration};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), redcap::Error> {
/// let client = ClientBuilder::new()
///     .configuration(Configuration::new("https://redcap.example.com/api/", "TOKEN"))
///     .cache(true)
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    configuration: Option<SharedConfiguration>,
    cache: bool,
    log: bool,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with caching and logging off.
    pub fn new() -> Self {
        Self {
            configuration: None,
            cache: false,
            log: false,
            timeout: None,
        }
    }

    /// Reads the configuration and the cache toggle from the environment.
    pub fn from_env() -> Self {
        Self::new()
            .configuration(Configuration::from_env())
            .cache(config::cache_enabled_from_env())
    }

    /// Uses a configuration owned by this client.
    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(Arc::new(RwLock::new(configuration)));
        self
    }

    /// Uses a configuration shared with other clients or a [`crate::Redcap`] context.
    pub fn shared_configuration(mut self, configuration: SharedConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Memoizes identical JSON requests for the lifetime of the client.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    pub fn log(mut self, enabled: bool) -> Self {
        self.log = enabled;
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// Without a configuration the host and token come from the environment.
    /// Neither is validated here.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<Client> {
        let configuration = self
            .configuration
            .unwrap_or_else(|| Arc::new(RwLock::new(Configuration::from_env())));

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let transport = Transport::new(http_client, self.cache).with_timeout(self.timeout);
        transport.set_log(self.log);

        Ok(Client {
            inner: Arc::new(ClientInner {
                configuration,
                transport,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
