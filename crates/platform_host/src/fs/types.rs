//! Virtual file-system data types shared across host contracts and the desktop runtime.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";
/// MIME type assumed when a data envelope does not name one.
pub const DEFAULT_CONTENT_MIME: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Virtual file-system node kind.
pub enum FsNodeKind {
    /// File node carrying content.
    File,
    /// Folder node carrying children.
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
/// Opaque file payload.
///
/// Text is stored verbatim. Uploaded or binary content is stored as a
/// `data:<mime>;base64,<payload>` envelope. Nothing beyond that mode tag is interpreted.
pub struct FileContent(String);

impl FileContent {
    /// Wraps plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Builds a base64 data envelope for `bytes`.
    pub fn encoded(mime: &str, bytes: &[u8]) -> Self {
        let mime = if mime.trim().is_empty() {
            DEFAULT_CONTENT_MIME
        } else {
            mime.trim()
        };
        Self(format!(
            "{DATA_URL_PREFIX}{mime}{BASE64_MARKER},{}",
            STANDARD.encode(bytes)
        ))
    }

    /// Returns the stored string exactly as persisted.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the content uses the data envelope.
    pub fn is_encoded(&self) -> bool {
        self.0.starts_with(DATA_URL_PREFIX)
    }

    /// Returns the envelope MIME type, or `None` for plain text.
    pub fn mime_type(&self) -> Option<&str> {
        let (header, _) = self.envelope()?;
        let mime = header.split(';').next().unwrap_or_default();
        Some(if mime.is_empty() {
            DEFAULT_CONTENT_MIME
        } else {
            mime
        })
    }

    /// Decodes the raw bytes of the content.
    ///
    /// # Errors
    ///
    /// Returns an error when an envelope is malformed or its base64 payload is invalid.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, String> {
        if !self.is_encoded() {
            return Ok(self.0.as_bytes().to_vec());
        }
        let (header, payload) = self
            .envelope()
            .ok_or_else(|| "data envelope is missing its payload separator".to_string())?;
        if header.ends_with(BASE64_MARKER) {
            STANDARD
                .decode(payload.trim())
                .map_err(|err| format!("invalid base64 payload: {err}"))
        } else {
            Ok(payload.as_bytes().to_vec())
        }
    }

    /// Decodes the content as UTF-8 text, unwrapping the data envelope when present.
    ///
    /// # Errors
    ///
    /// Returns an error when decoding fails or the bytes are not UTF-8.
    pub fn decode_text(&self) -> Result<String, String> {
        if !self.is_encoded() {
            return Ok(self.0.clone());
        }
        let bytes = self.decode_bytes()?;
        String::from_utf8(bytes).map_err(|err| format!("content is not UTF-8 text: {err}"))
    }

    /// Returns new content holding `text`, preserving this content's envelope and MIME type.
    pub fn with_text(&self, text: &str) -> Self {
        match self.mime_type() {
            Some(mime) => Self::encoded(mime, text.as_bytes()),
            None => Self::text(text),
        }
    }

    fn envelope(&self) -> Option<(&str, &str)> {
        self.0.strip_prefix(DATA_URL_PREFIX)?.split_once(',')
    }
}

impl From<&str> for FileContent {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for FileContent {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}
