//! Query-string flattening for list-style endpoints.

use serde::Serialize;

use crate::error::Error;

/// Optional pagination parameters accepted by list endpoints.
///
/// Fields left as `None` are omitted from the query string entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    /// Starting index of the requested page.
    #[serde(rename = "start-index", skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,

    /// Maximum number of results per page.
    #[serde(rename = "max-results", skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Appends `options`, flattened to a canonical query string, to `path`.
///
/// `None` short-circuits to the bare path unchanged, as does an options value
/// that serializes to nothing. Callers apply this before handing the path to
/// the request builder; the builder itself never adds query parameters.
///
/// ## Examples
///
/// ```rust
/// use chat_api::{with_query, ListOptions};
///
/// let options = ListOptions { start_index: Some(30), max_results: Some(10) };
/// let path = with_query("room", Some(&options)).unwrap();
/// assert_eq!(path, "room?start-index=30&max-results=10");
///
/// let bare = with_query("room", None::<&ListOptions>).unwrap();
/// assert_eq!(bare, "room");
/// ```
///
/// ## Errors
///
/// Returns [`Error::QueryEncoding`] if `options` cannot be represented as a
/// query string.
pub fn with_query<Q: Serialize>(path: &str, options: Option<&Q>) -> Result<String, Error> {
    let Some(options) = options else {
        return Ok(path.to_string());
    };

    let query = serde_urlencoded::to_string(options).map_err(Error::QueryEncoding)?;
    if query.is_empty() {
        return Ok(path.to_string());
    }

    Ok(format!("{path}?{query}"))
}
