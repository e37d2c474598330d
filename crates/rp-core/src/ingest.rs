//! Item ingestion contract
//!
//! The presentation layer decodes user input (typed text, a picked file) and
//! hands it over here before anything reaches the state machine. Only image
//! payloads within [`MAX_IMAGE_BYTES`] are accepted.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::MAX_IMAGE_BYTES;
use crate::item::ImageRef;

/// Ingestion rejections
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Not an image payload: {0}")]
    NotAnImage(String),

    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Image payload is empty")]
    EmptyPayload,

    #[error("Item needs text or an image")]
    EmptyItem,
}

/// Raw image bytes as picked by the user
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Check mime type and size against the ingestion contract
    pub fn validate(&self) -> Result<(), IngestError> {
        if !self.mime_type.starts_with("image/") {
            return Err(IngestError::NotAnImage(self.mime_type.clone()));
        }
        if self.bytes.is_empty() {
            return Err(IngestError::EmptyPayload);
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(IngestError::TooLarge {
                size: self.bytes.len(),
                limit: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }

    /// Validate and encode as a data URI reference
    pub fn into_image_ref(self) -> Result<ImageRef, IngestError> {
        self.validate()?;
        let uri = format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes));
        log::debug!(
            "[Ingest] Accepted {} image ({} bytes)",
            self.mime_type,
            self.bytes.len()
        );
        Ok(ImageRef::from_uri(uri))
    }
}

/// User-entered content for one item
#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    pub text: String,
    pub image: Option<ImagePayload>,
}

/// Draft that passed ingestion and can be merged into an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedItem {
    pub text: String,
    pub image: Option<ImageRef>,
}

impl ItemDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, payload: ImagePayload) -> Self {
        self.image = Some(payload);
        self
    }

    /// Validate the draft. Text is trimmed; an image is checked and encoded.
    pub fn ingest(self) -> Result<IngestedItem, IngestError> {
        let text = self.text.trim().to_string();
        let image = self.image.map(ImagePayload::into_image_ref).transpose()?;

        if text.is_empty() && image.is_none() {
            return Err(IngestError::EmptyItem);
        }

        Ok(IngestedItem { text, image })
    }
}
