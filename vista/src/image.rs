//! Uploaded image payloads.
//!
//! An [`ImagePayload`] is the raw bytes of one uploaded file together with the
//! name it was uploaded under. Only the file types the picker accepts (JPEG
//! and PNG, by extension) can be turned into a payload; the bytes themselves
//! are never decoded or inspected.
//!
//! # Example
//!
//! ```rust,ignore
//! use vista::image::ImagePayload;
//!
//! let image = ImagePayload::from_upload("cat.png", bytes)?;
//! let url = image.data_uri();
//! ```

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix of the data URI embedded in the request.
///
/// The MIME type is fixed regardless of the uploaded format; the completion
/// service sniffs the actual encoding.
pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Image encodings the file picker accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG (`.jpg`, `.jpeg`).
    Jpeg,
    /// PNG (`.png`).
    Png,
}

impl ImageFormat {
    /// Extensions accepted by the file picker, without the dot.
    pub const ACCEPTED_EXTENSIONS: [&'static str; 3] = ["jpg", "png", "jpeg"];

    /// Get the MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Detect format from the extension of a file name.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// The bytes of one uploaded image.
///
/// Cloning is cheap: the bytes are reference counted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    name: String,
    format: ImageFormat,
    bytes: Bytes,
}

impl ImagePayload {
    /// Accepts an upload if its file name has a recognized image extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedImage`] for any other file type.
    pub fn from_upload(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        let format =
            ImageFormat::from_file_name(&name).ok_or_else(|| Error::unsupported_image(&name))?;
        Ok(Self {
            name,
            format,
            bytes: bytes.into(),
        })
    }

    /// Reads an image from disk, applying the same type filter as uploads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedImage`] for unrecognized extensions and
    /// [`Error::Io`] if the file cannot be read.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if ImageFormat::from_file_name(&name).is_none() {
            return Err(Error::unsupported_image(name));
        }
        let bytes = tokio::fs::read(path).await?;
        Self::from_upload(name, bytes)
    }

    /// File name used as the preview caption.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format detected from the file name.
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Raw uploaded bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-byte upload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard base64 encoding of the bytes.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Data URI embedding the image in a request field.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("{DATA_URI_PREFIX}{}", self.to_base64())
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}
