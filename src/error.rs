//! Error types for REDCap API calls.
//!
//! Transport and parse failures keep the raw response body so a rejected
//! request can be diagnosed from the error alone. Usage errors are raised
//! before any request leaves the process.

use http::{HeaderMap, StatusCode};

/// The main error type for REDCap API calls.
///
/// # Examples
///
/// ```no_run
/// use redcap::{Client, Configuration, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .configuration(Configuration::new("https://redcap.example.com/api/", "TOKEN"))
///     .build()?;
///
/// match client.project().await {
///     Ok(project) => println!("Project: {}", project),
///     Err(Error::HttpError { status, raw_response, .. }) => {
///         eprintln!("REDCap rejected the request ({}): {}", status, raw_response);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be parsed as the expected JSON.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw response body as a string
    /// * `serde_error` - The error message from serde
    /// * `status` - The HTTP status code of the response
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// REDCap answered with a non-2xx HTTP status code.
    ///
    /// REDCap reports bad tokens, unknown fields and malformed filter logic
    /// this way, with an `{"error": "..."}` body.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// The HTTP client could not be constructed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Record data could not be encoded as JSON for an import.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The configured host is not a valid URL.
    ///
    /// An unset or blank host surfaces here, at call time.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A finder condition was malformed.
    ///
    /// Raised for conditions with other than exactly one key, a non-array
    /// value when filtering by `id`, or a non-numeric value for an ordered
    /// comparison.
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// The next record id would not fit in an `i64`.
    ///
    /// Raised by [`crate::Record::save`] when the project's highest
    /// `record_id` is already `i64::MAX`. Nothing is sent.
    #[error("No record id after {max_id} fits in an i64")]
    RecordIdOverflow {
        /// The highest record id in the project
        max_id: i64,
    },

    /// The finder operation exists for API parity but has no implementation.
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns `true` for programmer errors caught before any request was sent.
    ///
    /// # Examples
    ///
    /// ```
    /// use redcap::Error;
    ///
    /// assert!(Error::InvalidCondition("two keys".to_string()).is_usage_error());
    /// assert!(Error::Unsupported("having").is_usage_error());
    /// assert!(!Error::ConfigurationError("tls".to_string()).is_usage_error());
    /// ```
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Error::InvalidCondition(_) | Error::Unsupported(_))
    }
}

/// A specialized `Result` type for REDCap API calls.
pub type Result<T> = std::result::Result<T, Error>;
