//! Client configuration and endpoint resolution.

use reqwest::header::HeaderValue;
use url::Url;

use crate::error::Error;

/// API version segment used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v2";

/// Content type attached to JSON request bodies and metadata parts.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// User agent sent when the caller does not override it.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Mutable configuration shared by every request a [`Client`] builds.
///
/// Holds the base origin, the API version segment spliced into every request
/// path, and the user-agent string. The owning [`Client`] guards this value
/// with a lock, so an in-flight dispatch and a concurrent setter never race.
///
/// [`Client`]: crate::Client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    api_version: String,
    user_agent: String,
}

impl ClientConfig {
    /// Creates a configuration with the default version tag and user agent.
    ///
    /// `base_url` should end with a trailing slash if it carries a path
    /// component; resolution follows RFC 3986 relative-reference semantics.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Returns the base origin.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the current API version segment.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Returns the configured user-agent string. Empty disables the header.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Replaces the base origin. Takes effect on the next request.
    pub fn set_base_url(&mut self, base_url: Url) {
        self.base_url = base_url;
    }

    /// Replaces the API version segment. Takes effect on the next request.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidApiVersion`] if `version` starts with `/`
    /// (reserved for absolute-path overrides). On error the configuration is
    /// left untouched.
    pub fn set_api_version(&mut self, version: &str) -> Result<(), Error> {
        if version.starts_with('/') {
            return Err(Error::InvalidApiVersion(version.to_string()));
        }
        self.api_version = version.to_string();
        Ok(())
    }

    /// Replaces the user-agent string. An empty string disables the header.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::InvalidHeader`] if `user_agent` is not a legal HTTP
    /// header value. On error the configuration is left untouched.
    pub fn set_user_agent(&mut self, user_agent: &str) -> Result<(), Error> {
        if !user_agent.is_empty() && HeaderValue::from_str(user_agent).is_err() {
            return Err(Error::InvalidHeader("User-Agent"));
        }
        self.user_agent = user_agent.to_string();
        Ok(())
    }

    /// Resolves a relative resource path into an absolute request URL:
    /// `<origin>/<version>/<relative_path>`.
    ///
    /// Pure function of the current configuration; relative paths should be
    /// given without a leading slash.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::MalformedUrl`] if the joined URL cannot be parsed.
    pub fn resolve(&self, relative_path: &str) -> Result<Url, Error> {
        let reference = format!("{}/{}", self.api_version, relative_path);
        Ok(self.base_url.join(&reference)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new(Url::parse("https://chat.example.com/").unwrap())
    }

    #[test]
    fn resolve_joins_origin_version_and_path() {
        let url = config().resolve("room/42/message").unwrap();
        assert_eq!(url.as_str(), "https://chat.example.com/v2/room/42/message");
    }

    #[test]
    fn resolve_is_deterministic_and_distinct_per_path() {
        let config = config();
        let a1 = config.resolve("room").unwrap();
        let a2 = config.resolve("room").unwrap();
        let b = config.resolve("user").unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }

    #[test]
    fn resolve_uses_current_version() {
        let mut config = config();
        config.set_api_version("v3").unwrap();
        let url = config.resolve("room").unwrap();
        assert_eq!(url.as_str(), "https://chat.example.com/v3/room");
    }

    #[test]
    fn invalid_version_leaves_config_unchanged() {
        let mut config = config();
        let before = config.clone();

        let err = config.set_api_version("/v3").unwrap_err();

        assert!(matches!(err, Error::InvalidApiVersion(_)));
        assert_eq!(config, before);
    }

    #[test]
    fn invalid_user_agent_leaves_config_unchanged() {
        let mut config = config();
        let before = config.clone();

        let err = config.set_user_agent("bad\nagent").unwrap_err();

        assert!(matches!(err, Error::InvalidHeader("User-Agent")));
        assert_eq!(config, before);
    }

    #[test]
    fn empty_user_agent_is_allowed() {
        let mut config = config();
        config.set_user_agent("").unwrap();
        assert_eq!(config.user_agent(), "");
    }

    #[test]
    fn base_url_swap_takes_effect() {
        let mut config = config();
        config.set_base_url(Url::parse("https://other.example.com/").unwrap());
        let url = config.resolve("room").unwrap();
        assert_eq!(url.as_str(), "https://other.example.com/v2/room");
    }
}
