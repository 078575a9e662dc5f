//! HTTP methods understood by the chat-service API.

use strum::{Display, EnumIter, EnumString};

/// The HTTP verbs the remote chat-service API accepts.
///
/// ## Examples
///
/// ```rust
/// use chat_api::RestMethod;
///
/// let method = RestMethod::Get;
/// assert!(!method.has_body());
/// assert!(method.is_idempotent());
///
/// // Parse from string
/// let parsed: RestMethod = "POST".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Post);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RestMethod {
    /// HTTP GET - Retrieve a resource.
    Get,
    /// HTTP POST - Create a resource or trigger an action.
    Post,
    /// HTTP PUT - Replace a resource entirely.
    Put,
    /// HTTP DELETE - Remove a resource.
    Delete,
}

impl RestMethod {
    /// Returns `true` if this method typically carries a request body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    /// Returns `true` if this method is idempotent.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Post)
    }

    /// Converts to the equivalent `reqwest::Method`.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}
