//! Photo uploads for collection points.
//!
//! Photos are not stored anywhere yet. [`InlineUploader`] turns each file
//! into a `data:` URL so callers get a usable URL without an image store.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest accepted photo, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// An attached photo.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    /// Decode a base64 payload as sent by the front end.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidEncoding` if `data` is not valid base64.
    pub fn from_base64(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: &str,
    ) -> Result<Self, UploadError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| UploadError::InvalidEncoding(e.to_string()))?;
        Ok(Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        })
    }
}

/// Errors from image uploads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("empty image: {0}")]
    Empty(String),

    #[error("not an image: {0}")]
    UnsupportedType(String),

    #[error("image too large: {0}")]
    TooLarge(String),

    #[error("invalid image encoding: {0}")]
    InvalidEncoding(String),
}

/// Stores a photo and returns the URL it can be fetched from.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload_image(&self, file: &ImageFile) -> Result<String, UploadError>;
}

/// Uploader that stores nothing and answers with an inline `data:` URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineUploader;

#[async_trait]
impl ImageUploader for InlineUploader {
    async fn upload_image(&self, file: &ImageFile) -> Result<String, UploadError> {
        check(file)?;
        Ok(format!(
            "data:{};base64,{}",
            file.content_type,
            STANDARD.encode(&file.bytes)
        ))
    }
}

/// Checks shared by every uploader.
///
/// # Errors
///
/// Rejects empty files, non-image content types and files over
/// [`MAX_IMAGE_BYTES`].
pub fn check(file: &ImageFile) -> Result<(), UploadError> {
    if file.bytes.is_empty() {
        return Err(UploadError::Empty(file.file_name.clone()));
    }
    if !file.content_type.starts_with("image/") {
        return Err(UploadError::UnsupportedType(file.content_type.clone()));
    }
    if file.bytes.len() > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge(file.file_name.clone()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png() -> ImageFile {
        ImageFile {
            file_name: "fachada.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn test_inline_uploader_returns_data_url() {
        let url = InlineUploader.upload_image(&png()).await.unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn test_inline_uploader_rejects_non_images() {
        let file = ImageFile {
            content_type: "application/pdf".to_string(),
            ..png()
        };
        assert_eq!(
            InlineUploader.upload_image(&file).await.unwrap_err(),
            UploadError::UnsupportedType("application/pdf".to_string())
        );
    }

    #[test]
    fn test_from_base64() {
        let file = ImageFile::from_base64("a.png", "image/png", "iVBORw==").unwrap();
        assert_eq!(file.bytes, png().bytes);
        assert!(matches!(
            ImageFile::from_base64("a.png", "image/png", "%%%"),
            Err(UploadError::InvalidEncoding(_))
        ));
    }
}
