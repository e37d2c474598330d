//! Builds a session from command-line slot specs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rp_core::{ImagePayload, ItemDraft};
use rp_slot_lab::{DrawRng, ReelTimer, SlotMachine};
use rp_state::{Intent, ItemPatch, Session};

use crate::cli::{ItemSpec, SlotSpec};

/// Mime type guessed from the file extension
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

/// Read and validate one item
pub fn ingest_item(item: &ItemSpec) -> Result<ItemPatch> {
    let mut draft = ItemDraft::text(item.text.clone());
    if let Some(path) = &item.image {
        let mime = image_mime(path).unwrap_or("application/octet-stream");
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
        draft = draft.with_image(ImagePayload::new(mime, bytes));
    }
    let ingested = draft
        .ingest()
        .with_context(|| format!("Item '{}' rejected", item.text))?;
    Ok(ingested.into())
}

/// Replace the current session with `title` and `slots`.
///
/// Without slots the session stops at slot count selection.
pub fn configure<R, T>(
    machine: &SlotMachine<R, T>,
    title: &str,
    slots: &[SlotSpec],
) -> Result<Session>
where
    R: DrawRng + 'static,
    T: ReelTimer,
{
    machine.reset()?;
    let mut session = machine.dispatch(Intent::set_title(title))?;
    if slots.is_empty() {
        return Ok(session);
    }

    machine.dispatch(Intent::SetSlotCount { count: slots.len() })?;
    for (slot_id, slot) in slots.iter().enumerate() {
        machine.dispatch(Intent::SetSlotItemCount {
            slot_id,
            count: slot.items.len(),
        })?;
    }

    machine.dispatch(Intent::BeginInput)?;
    for (slot_id, slot) in slots.iter().enumerate() {
        for (item_id, item) in slot.items.iter().enumerate() {
            let patch = ingest_item(item)?;
            session = machine.dispatch(Intent::UpdateItem {
                slot_id,
                item_id,
                patch,
            })?;
        }
    }

    if let Some((slot_id, item_id)) = session.first_incomplete_item() {
        bail!("Slot {} item {} has no content", slot_id + 1, item_id + 1);
    }
    Ok(machine.dispatch(Intent::Complete)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_slot_lab::MachineConfig;
    use rp_state::{Phase, SessionStore};
    use std::path::PathBuf;

    fn machine() -> SlotMachine {
        SlotMachine::from_config(SessionStore::new(), MachineConfig::default())
    }

    fn slot(s: &str) -> SlotSpec {
        s.parse().unwrap()
    }

    #[test]
    fn test_configure_reaches_ready() {
        let machine = machine();
        let session = configure(&machine, "Lunch Picker", &[slot("A,B"), slot("C,D")]).unwrap();

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.slot_count(), 2);
        assert_eq!(session.slots()[1].items[0].text, "C");
    }

    #[test]
    fn test_configure_title_only() {
        let session = configure(&machine(), "Trip", &[]).unwrap();
        assert_eq!(session.phase(), Phase::CountSetup);
    }

    #[test]
    fn test_configure_with_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.gif");
        fs::write(&path, b"GIF89a").unwrap();

        let spec = SlotSpec {
            items: vec![ItemSpec {
                text: "Dot".into(),
                image: Some(path),
            }],
        };
        let session = configure(&machine(), "Pics", &[spec]).unwrap();
        let image = session.slots()[0].items[0].image.as_ref().unwrap();
        assert_eq!(image.mime_type(), Some("image/gif"));
    }

    #[test]
    fn test_non_image_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let item = ItemSpec {
            text: "Notes".into(),
            image: Some(path),
        };
        assert!(ingest_item(&item).is_err());
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let item = ItemSpec {
            text: "Ghost".into(),
            image: Some(PathBuf::from("/nonexistent/ghost.png")),
        };
        assert!(ingest_item(&item).is_err());
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(image_mime(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("a.txt")), None);
        assert_eq!(image_mime(Path::new("noext")), None);
    }
}
