//! Item and slot data model

use serde::{Deserialize, Serialize};

/// Reference to a decoded image payload.
///
/// Stored as a `data:<mime>;base64,<payload>` URI so a snapshot can carry it
/// verbatim. Construct through [`crate::ImagePayload::into_image_ref`] to get a
/// validated value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap an existing URI without validation (snapshot restore path)
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_uri(&self) -> &str {
        &self.0
    }

    /// Size of the reference in bytes, as it counts against snapshot caps
    pub fn byte_len(&self) -> usize {
        self.0.len()
    }

    /// Mime type declared in the data URI, if any
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let end = rest.find(&[';', ','][..])?;
        Some(&rest[..end])
    }
}

/// A candidate draw outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Position within the owning slot
    pub id: usize,
    /// Display text (may be empty when an image is present)
    #[serde(default)]
    pub text: String,
    /// Optional image
    #[serde(default)]
    pub image: Option<ImageRef>,
}

impl Item {
    /// Blank item: no text, no image
    pub fn blank(id: usize) -> Self {
        Self {
            id,
            text: String::new(),
            image: None,
        }
    }

    pub fn with_text(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            image: None,
        }
    }

    /// An item is usable in a draw once it has text or an image
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty() || self.image.is_some()
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty() && self.image.is_none()
    }

    /// Short label for logs
    pub fn label(&self) -> &str {
        if self.text.trim().is_empty() {
            if self.image.is_some() { "<image>" } else { "<blank>" }
        } else {
            &self.text
        }
    }
}

/// One independent draw lane (reel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Stable 0-based index
    pub id: usize,
    /// Number of items; always equals `items.len()`
    pub item_count: usize,
    pub items: Vec<Item>,
}

impl Slot {
    /// Freshly created slot with no items yet
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            item_count: 0,
            items: Vec::new(),
        }
    }

    /// Slot holding `count` blank items.
    ///
    /// This is also how an item count change is applied: previous items are
    /// discarded, never resized in place.
    pub fn with_blank_items(id: usize, count: usize) -> Self {
        Self {
            id,
            item_count: count,
            items: (0..count).map(Item::blank).collect(),
        }
    }

    pub fn item(&self, item_id: usize) -> Option<&Item> {
        self.items.get(item_id)
    }

    /// First item that is not yet usable in a draw
    pub fn first_invalid_item(&self) -> Option<usize> {
        self.items.iter().position(|item| !item.is_valid())
    }

    pub fn is_complete(&self) -> bool {
        self.item_count >= 1 && self.first_invalid_item().is_none()
    }
}
