//! Client configuration.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{CybsiError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration of a [`CybsiClient`](crate::CybsiClient).
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use cybsi::Config;
///
/// # fn example() -> cybsi::Result<()> {
/// let config = Config::new("https://cybsi.example.com/api", "api-key")?
///     .with_ssl_verify(false)
///     .with_timeout(Duration::from_secs(30));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Config {
    pub(crate) api_url: Url,
    pub(crate) api_key: String,
    pub(crate) ssl_verify: bool,
    pub(crate) timeout: Duration,
    pub(crate) embed_object_url: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url.as_str())
            .field("ssl_verify", &self.ssl_verify)
            .field("timeout", &self.timeout)
            .field("embed_object_url", &self.embed_object_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Create a configuration with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid.
    pub fn new(api_url: &str, api_key: &str) -> Result<Self> {
        // Relative request paths must join under the API prefix.
        let api_url = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };

        Ok(Self {
            api_url: Url::parse(&api_url)?,
            api_key: api_key.to_string(),
            ssl_verify: true,
            timeout: DEFAULT_TIMEOUT,
            embed_object_url: false,
        })
    }

    /// Create a configuration from environment variables.
    ///
    /// Reads `CYBSI_API_URL`, `CYBSI_API_KEY` and the optional
    /// `CYBSI_SSL_VERIFY` (`false` or `0` disables certificate checks).
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is not set.
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("CYBSI_API_URL").map_err(|_| {
            CybsiError::ConfigMissing("CYBSI_API_URL environment variable not set".to_string())
        })?;
        let api_key = env::var("CYBSI_API_KEY").map_err(|_| {
            CybsiError::ConfigMissing("CYBSI_API_KEY environment variable not set".to_string())
        })?;

        let ssl_verify = env::var("CYBSI_SSL_VERIFY")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Self::new(&api_url, &api_key)?.with_ssl_verify(ssl_verify))
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub fn with_ssl_verify(mut self, ssl_verify: bool) -> Self {
        self.ssl_verify = ssl_verify;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask the API to embed resource URLs into returned references.
    #[must_use]
    pub fn with_embed_object_url(mut self, embed: bool) -> Self {
        self.embed_object_url = embed;
        self
    }

    /// Base API URL, always ending with `/`.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Whether TLS certificates are verified.
    pub fn ssl_verify(&self) -> bool {
        self.ssl_verify
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trailing_slash() {
        let c1 = Config::new("https://cybsi.local/api", "key").unwrap();
        let c2 = Config::new("https://cybsi.local/api/", "key").unwrap();
        assert_eq!(c1.api_url().as_str(), c2.api_url().as_str());
        assert_eq!(c1.api_url().join("replists").unwrap().path(), "/api/replists");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = Config::new("https://cybsi.local/api", "secret-key").unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("api_url"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::new("https://cybsi.local/api", "key").unwrap();
        assert!(config.ssl_verify());
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(!config.embed_object_url);
    }

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(" FALSE "));
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            Config::new("not a url", "key"),
            Err(CybsiError::UrlError(_))
        ));
    }
}
