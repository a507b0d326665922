//! # redcap - A typed client for the REDCap API
//!
//! REDCap exposes a single API endpoint per server. Every call is a
//! form-encoded POST carrying the project token, the response format and a
//! `content` parameter naming the operation. This crate builds those
//! payloads, sends them with `reqwest`, and reads the responses back into
//! typed values and schema-less [`Record`] rows.
//!
//! ## Quick Start
//!
//! ```no_run
//! use redcap::{ConfigOptions, Record, Redcap};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), redcap::Error> {
//!     let redcap = Redcap::new(
//!         ConfigOptions::new()
//!             .host("https://redcap.example.com/api/")
//!             .token("ABCD1234"),
//!     );
//!     let client = redcap.client()?;
//!     let patients = redcap.records()?;
//!
//!     // Finder-style queries
//!     let adults = patients.gte(json!({"age": 18})).await?;
//!     println!("{} adult patients", adults.len());
//!
//!     // New records get max_id + 1
//!     let mut patient = Record::new();
//!     patient.set("first_name", "Ada");
//!     patient.set("age", "36");
//!     let created = patient.save(&client).await?;
//!     println!("Created {:?}: {}", patient.id(), created);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! With no explicit options, the host and token come from `REDCAP_HOST` and
//! `REDCAP_TOKEN`. Setting `REDCAP_CACHE=ON` memoizes identical read
//! requests for the lifetime of a client; the cache is flushed before
//! every import.
//!
//! ## Error Handling
//!
//! Network failures, non-2xx responses and unparseable bodies are returned
//! as they happened, without retries. Malformed finder conditions fail with
//! [`Error::InvalidCondition`] before anything is sent:
//!
//! ```
//! use redcap::filter::Condition;
//! use serde_json::json;
//!
//! let err = Condition::try_from(json!({"a": 1, "b": 2})).unwrap_err();
//! assert!(err.is_usage_error());
//! ```
//!
//! ## Logging
//!
//! Requests and responses are traced with `tracing`. Calling
//! [`Client::set_log`] adds the full payload (token redacted) and response
//! body at debug level.

mod client;
pub mod config;
mod context;
mod error;
pub mod filter;
mod finder;
pub mod metadata;
pub mod payload;
mod record;
pub mod transport;

pub use client::{Client, ClientBuilder, RecordQuery, SharedConfiguration};
pub use config::{ConfigOptions, Configuration, Format};
pub use context::Redcap;
pub use error::{Error, Result};
pub use finder::Finder;
pub use metadata::FieldMetadata;
pub use record::{Record, Value};
