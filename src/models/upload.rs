use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

use crate::error::Result;

/// An image picked by the user, kept in memory for the caption and
/// generation calls.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub file_name: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let media_type = media_type_for_path(path);

        log::debug!(
            "Loaded {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            media_type
        );

        Ok(Self {
            bytes,
            media_type: media_type.to_string(),
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        })
    }

    /// Base64 of the raw bytes, without any `data:` prefix.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn file_name_or_default(&self) -> &str {
        self.file_name.as_deref().unwrap_or("upload")
    }
}

pub fn media_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
