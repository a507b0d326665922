//! Connection settings for a REDCap project.

use std::fmt;

/// Environment variable holding the API endpoint URL.
pub const HOST_ENV: &str = "REDCAP_HOST";

/// Environment variable holding the project API token.
pub const TOKEN_ENV: &str = "REDCAP_TOKEN";

/// Environment variable that turns response memoization on when set to `ON`.
pub const CACHE_ENV: &str = "REDCAP_CACHE";

/// Response format requested from REDCap.
///
/// Only [`Format::Json`] works with the typed client operations, which all
/// parse JSON except [`crate::Client::survey_link`]. With `Csv` or `Xml`
/// those operations fail with [`crate::Error::DeserializationFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Json,
    Csv,
    Xml,
}

impl Format {
    /// The value sent in the `format` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host, token and format for one REDCap project.
///
/// Nothing is validated when values are set. A blank host or token is only
/// noticed when a request is made.
///
/// # Examples
///
/// ```
/// use redcap::{Configuration, Format};
///
/// let config = Configuration::new("https://redcap.example.com/api/", "ABCD1234");
/// assert_eq!(config.host(), "https://redcap.example.com/api/");
/// assert_eq!(config.format(), Format::Json);
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Configuration {
    host: String,
    token: String,
    format: Format,
}

impl Configuration {
    /// Creates a configuration with the default JSON format.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            format: Format::default(),
        }
    }

    /// Reads `REDCAP_HOST` and `REDCAP_TOKEN`.
    ///
    /// Unset variables become empty strings.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(HOST_ENV).unwrap_or_default(),
            std::env::var(TOKEN_ENV).unwrap_or_default(),
        )
    }

    /// Builds a configuration from an option set.
    ///
    /// When every option is absent the host and token come from the
    /// environment instead.
    pub fn from_options(options: ConfigOptions) -> Self {
        if options.is_empty() {
            return Self::from_env();
        }
        Self {
            host: options.host.unwrap_or_default(),
            token: options.token.unwrap_or_default(),
            format: options.format.unwrap_or_default(),
        }
    }

    /// Sets the response format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }
}

// The token is a credential; keep it out of logs and panic messages.
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("host", &self.host)
            .field("token", &"[REDACTED]")
            .field("format", &self.format)
            .finish()
    }
}

/// Optional overrides accepted by [`Configuration::from_options`] and
/// [`crate::Redcap::new`].
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub host: Option<String>,
    pub token: Option<String>,
    pub format: Option<Format>,
}

impl ConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Returns `true` when no option is set.
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.token.is_none() && self.format.is_none()
    }
}

/// Returns `true` when `REDCAP_CACHE` is set to `ON`.
pub fn cache_enabled_from_env() -> bool {
    std::env::var(CACHE_ENV).map(|v| v == "ON").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_env(host: &str, token: &str) {
        std::env::set_var(HOST_ENV, host);
        std::env::set_var(TOKEN_ENV, token);
    }

    fn clear_env() {
        std::env::remove_var(HOST_ENV);
        std::env::remove_var(TOKEN_ENV);
        std::env::remove_var(CACHE_ENV);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_host_and_token() {
        set_env("https://redcap.example.com", "abcd1234");
        let config = Configuration::from_env();
        clear_env();

        assert_eq!(config.host(), "https://redcap.example.com");
        assert_eq!(config.token(), "abcd1234");
        assert_eq!(config.format(), Format::Json);
    }

    #[test]
    #[serial]
    fn test_from_env_missing_variables_are_empty() {
        clear_env();
        let config = Configuration::from_env();
        assert_eq!(config.host(), "");
        assert_eq!(config.token(), "");
    }

    #[test]
    #[serial]
    fn test_empty_options_fall_back_to_env() {
        set_env("https://env.example.com", "envtoken");
        let config = Configuration::from_options(ConfigOptions::new());
        clear_env();

        assert_eq!(config.host(), "https://env.example.com");
        assert_eq!(config.token(), "envtoken");
    }

    #[test]
    #[serial]
    fn test_explicit_options_ignore_env() {
        set_env("https://env.example.com", "envtoken");
        let config = Configuration::from_options(
            ConfigOptions::new()
                .host("http://www.yahoo.com")
                .token("5678"),
        );
        clear_env();

        assert_eq!(config.host(), "http://www.yahoo.com");
        assert_eq!(config.token(), "5678");
        assert_eq!(config.format(), Format::Json);
    }

    #[test]
    #[serial]
    fn test_cache_toggle() {
        clear_env();
        assert!(!cache_enabled_from_env());
        std::env::set_var(CACHE_ENV, "ON");
        assert!(cache_enabled_from_env());
        std::env::set_var(CACHE_ENV, "on");
        assert!(!cache_enabled_from_env());
        clear_env();
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Configuration::new("https://x.test", "SECRET");
        let debug = format!("{:?}", config);
        assert!(debug.contains("https://x.test"));
        assert!(!debug.contains("SECRET"));
    }

    #[test]
    fn test_format_wire_names() {
        assert_eq!(Format::Json.as_str(), "json");
        assert_eq!(Format::Csv.to_string(), "csv");
        assert_eq!(Format::Xml.as_str(), "xml");
    }
}
