//! Base64 image payloads passed between providers, tools and clients.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single image, held as a standard base64 string (no `data:` prefix).
///
/// The vendor API returns images base64-encoded and the HTTP client expects
/// them that way, so the encoded form is the canonical one; bytes are only
/// materialized when an image has to be uploaded again (edits).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Wrap an already-encoded base64 string.
    ///
    /// Surrounding whitespace is trimmed; the content is not validated until
    /// [`ImageData::decode`] is called.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        let encoded: String = encoded.into();
        Self(encoded.trim().to_string())
    }

    /// Encode raw image bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(BASE64.encode(bytes))
    }

    pub fn as_base64(&self) -> &str {
        &self.0
    }

    pub fn into_base64(self) -> String {
        self.0
    }

    /// Decode to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.0.as_bytes())
            .map_err(|e| Error::ImageData(format!("invalid base64: {e}")))
    }

    /// Render as a `data:` URL suitable for vision inputs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type(), self.0)
    }

    /// Best-effort media type sniffed from the base64 prefix of the
    /// magic bytes. Falls back to PNG, which is what the image endpoints
    /// return by default.
    pub fn media_type(&self) -> &'static str {
        if self.0.starts_with("/9j/") {
            "image/jpeg"
        } else if self.0.starts_with("UklGR") {
            "image/webp"
        } else if self.0.starts_with("R0lGOD") {
            "image/gif"
        } else {
            "image/png"
        }
    }

    /// Length of the encoded payload, used for log fields.
    pub fn encoded_len(&self) -> usize {
        self.0.len()
    }
}

// Images can be megabytes of base64; keep them out of debug output.
impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageData({} base64 chars)", self.0.len())
    }
}
