//! A shared REDCap context: one configuration, one lazily built client.

use crate::client::SharedConfiguration;
use crate::config::{self, ConfigOptions, Configuration};
use crate::{Client, Finder, Result};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Configuration plus the client built from it, passed explicitly to the
/// code that talks to REDCap.
///
/// Clones share state. The client is created on first use and reads the
/// configuration at call time, so the last configuration set wins for every
/// holder of the context.
///
/// # Examples
///
/// ```
/// use redcap::{ConfigOptions, Redcap};
///
/// let redcap = Redcap::new(
///     ConfigOptions::new()
///         .host("https://redcap.example.com/api/")
///         .token("ABCD1234"),
/// );
///
/// let config = redcap.configure(|c| c.set_token("EFGH5678"));
/// assert_eq!(config.token(), "EFGH5678");
/// assert_eq!(redcap.configuration().host(), "https://redcap.example.com/api/");
/// ```
#[derive(Clone)]
pub struct Redcap {
    configuration: SharedConfiguration,
    cache: bool,
    client: Arc<OnceLock<Client>>,
}

impl Redcap {
    /// Creates a context from options; empty options read the environment.
    ///
    /// The response cache follows `REDCAP_CACHE`.
    pub fn new(options: ConfigOptions) -> Self {
        Self::with_configuration(Configuration::from_options(options))
    }

    /// Creates a context from `REDCAP_HOST` and `REDCAP_TOKEN`.
    pub fn from_env() -> Self {
        Self::with_configuration(Configuration::from_env())
    }

    pub fn with_configuration(configuration: Configuration) -> Self {
        Self {
            configuration: Arc::new(RwLock::new(configuration)),
            cache: config::cache_enabled_from_env(),
            client: Arc::new(OnceLock::new()),
        }
    }

    /// Turns response memoization on or off for the client built later.
    ///
    /// Has no effect once the client exists.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Returns a snapshot of the current configuration.
    pub fn configuration(&self) -> Configuration {
        self.configuration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutates the configuration in place and returns the result.
    pub fn configure<F>(&self, f: F) -> Configuration
    where
        F: FnOnce(&mut Configuration),
    {
        let mut config = self
            .configuration
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut config);
        config.clone()
    }

    /// Replaces the configuration.
    pub fn set_configuration(&self, configuration: Configuration) {
        *self
            .configuration
            .write()
            .unwrap_or_else(PoisonError::into_inner) = configuration;
    }

    /// Returns the shared client, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn client(&self) -> Result<Client> {
        if let Some(client) = self.client.get() {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .shared_configuration(self.configuration.clone())
            .cache(self.cache)
            .build()?;
        tracing::debug!(cache = self.cache, "Created shared REDCap client");
        // A concurrent first call may have won; either client is equivalent.
        Ok(self.client.get_or_init(|| client).clone())
    }

    /// Returns a [`Finder`] over the shared client.
    pub fn records(&self) -> Result<Finder> {
        Ok(self.client()?.finder())
    }
}

impl std::fmt::Debug for Redcap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redcap")
            .field("configuration", &self.configuration())
            .field("cache", &self.cache)
            .field("client_built", &self.client.get().is_some())
            .finish()
    }
}
