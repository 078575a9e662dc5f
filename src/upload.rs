//! Related-multipart encoding for file uploads.
//!
//! The chat API's share-file endpoints take a `multipart/related` body: an
//! optional JSON `metadata` part (the message accompanying the file) followed
//! by exactly one `file` part carrying the raw bytes.

use std::fmt;
use std::io::Read;

use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use crate::config::CONTENT_TYPE_JSON;
use crate::error::Error;

const DISPOSITION_METADATA: &str = r#"attachment; name="metadata""#;

/// Everything needed to build one upload request: the byte stream, its
/// declared length, the media type, the target filename and optional JSON
/// metadata.
///
/// The stream is consumed exactly once, fully, while the request body is
/// encoded.
///
/// ## Examples
///
/// ```rust,ignore
/// use chat_api::UploadSpec;
///
/// let file = std::fs::File::open("notes.txt")?;
/// let size = file.metadata()?.len();
/// let upload = UploadSpec::new("text/plain", "notes.txt")
///     .reader(file, size)
///     .metadata(&serde_json::json!({ "message": "meeting notes" }))?;
/// let request = client.build_upload("room/42/share/file", upload)?;
/// ```
pub struct UploadSpec {
    reader: Option<Box<dyn Read + Send>>,
    size: u64,
    media_type: String,
    filename: String,
    metadata: Option<serde_json::Value>,
}

impl fmt::Debug for UploadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSpec")
            .field("has_reader", &self.reader.is_some())
            .field("size", &self.size)
            .field("media_type", &self.media_type)
            .field("filename", &self.filename)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl UploadSpec {
    /// Creates a spec with no byte stream attached yet.
    pub fn new(media_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            reader: None,
            size: 0,
            media_type: media_type.into(),
            filename: filename.into(),
            metadata: None,
        }
    }

    /// Attaches the byte stream and its declared length.
    ///
    /// The length is a capacity hint; the stream is drained to its actual
    /// end regardless.
    pub fn reader(mut self, reader: impl Read + Send + 'static, size: u64) -> Self {
        self.reader = Some(Box::new(reader));
        self.size = size;
        self
    }

    /// Attaches JSON metadata, encoded into its own part ahead of the file.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Encoding`] if `metadata` cannot be represented as
    /// JSON.
    pub fn metadata<M: Serialize>(mut self, metadata: &M) -> Result<Self, Error> {
        self.metadata = Some(serde_json::to_value(metadata).map_err(Error::Encoding)?);
        Ok(self)
    }

    /// Encodes the multipart body, returning it together with the request's
    /// `Content-Type` value (which carries the generated boundary).
    ///
    /// ## Errors
    ///
    /// - [`Error::MissingReader`] if no byte stream was attached.
    /// - [`Error::Io`] if the stream cannot be fully drained.
    /// - [`Error::Encoding`] if the metadata cannot be serialized.
    pub(crate) fn encode(mut self) -> Result<(Bytes, String), Error> {
        let mut reader = self.reader.take().ok_or(Error::MissingReader)?;
        let metadata = match &self.metadata {
            Some(metadata) => Some(serde_json::to_vec(metadata).map_err(Error::Encoding)?),
            None => None,
        };

        let boundary = random_boundary();
        let mut body = Vec::with_capacity(self.size as usize + 512);

        if let Some(metadata) = metadata {
            append_part_header(&mut body, &boundary, CONTENT_TYPE_JSON, DISPOSITION_METADATA);
            body.extend_from_slice(&metadata);
            body.extend_from_slice(b"\r\n");
        }

        let disposition = format!(
            r#"attachment; name="file"; filename="{}""#,
            self.filename
        );
        append_part_header(&mut body, &boundary, &self.media_type, &disposition);
        reader.read_to_end(&mut body)?;

        body.extend_from_slice(b"\r\n--");
        body.extend_from_slice(boundary.as_bytes());
        body.extend_from_slice(b"--\r\n");

        let content_type = format!("multipart/related; boundary={boundary}");
        Ok((Bytes::from(body), content_type))
    }
}

fn append_part_header(body: &mut Vec<u8>, boundary: &str, content_type: &str, disposition: &str) {
    body.extend_from_slice(b"--");
    body.extend_from_slice(boundary.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(b"Content-Type: ");
    body.extend_from_slice(content_type.as_bytes());
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(b"Content-Disposition: ");
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"\r\n\r\n");
}

fn random_boundary() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn spec_with_file(bytes: &'static [u8]) -> UploadSpec {
        UploadSpec::new("text/plain", "notes.txt").reader(Cursor::new(bytes), bytes.len() as u64)
    }

    fn boundary_of(content_type: &str) -> &str {
        content_type
            .strip_prefix("multipart/related; boundary=")
            .expect("content type should carry the boundary")
    }

    #[test]
    fn file_only_upload_has_a_single_part() {
        let (body, content_type) = spec_with_file(b"hello").encode().unwrap();
        let boundary = boundary_of(&content_type).to_string();
        let body = String::from_utf8(body.to_vec()).unwrap();

        let expected = format!(
            "--{boundary}\r\n\
             Content-Type: text/plain\r\n\
             Content-Disposition: attachment; name=\"file\"; filename=\"notes.txt\"\r\n\
             \r\n\
             hello\r\n\
             --{boundary}--\r\n"
        );
        assert_eq!(body, expected);
    }

    #[test]
    fn metadata_part_precedes_the_file_part() {
        let spec = spec_with_file(b"hello")
            .metadata(&serde_json::json!({ "message": "hi" }))
            .unwrap();
        let (body, content_type) = spec.encode().unwrap();
        let boundary = boundary_of(&content_type).to_string();
        let body = String::from_utf8(body.to_vec()).unwrap();

        let metadata_at = body
            .find(r#"attachment; name="metadata""#)
            .expect("metadata disposition present");
        let file_at = body
            .find(r#"attachment; name="file"; filename="notes.txt""#)
            .expect("file disposition present");
        assert!(metadata_at < file_at);
        assert!(body.contains("Content-Type: application/json; charset=UTF-8"));
        assert!(body.contains(r#"{"message":"hi"}"#));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn top_level_content_type_is_related_multipart_only() {
        let (_, content_type) = spec_with_file(b"x").encode().unwrap();
        assert!(content_type.starts_with("multipart/related; boundary="));
        assert!(!content_type.contains("json"));
    }

    #[test]
    fn boundaries_differ_between_encodes() {
        let (_, first) = spec_with_file(b"x").encode().unwrap();
        let (_, second) = spec_with_file(b"x").encode().unwrap();
        assert_ne!(boundary_of(&first), boundary_of(&second));
    }

    #[test]
    fn missing_reader_is_rejected() {
        let err = UploadSpec::new("text/plain", "notes.txt").encode().unwrap_err();
        assert!(matches!(err, Error::MissingReader));
    }

    #[test]
    fn failing_reader_surfaces_io_error() {
        struct BrokenReader;
        impl Read for BrokenReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream died"))
            }
        }

        let err = UploadSpec::new("application/octet-stream", "blob.bin")
            .reader(BrokenReader, 16)
            .encode()
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
