use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::{
    brush::surface::Mask,
    composite::masked::composite,
    foundation::error::{MaskeditError, MaskeditResult},
    model::provider::{EditProvider, EditRequest, sniff_mime},
    raster::image::RasterImage,
};

/// Maximum number of retained history entries; oldest are evicted first.
pub const HISTORY_CAPACITY: usize = 10;

// Appended to the prompt when a mask is present, mirroring the restriction
// the compositor enforces pixel-side.
const MASKED_EDIT_SUFFIX: &str = " (Focus the changes ONLY on the area highlighted \
by the mask. The rest of the image must remain identical.)";

/// An encoded source image plus its MIME type.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Encoded image bytes as uploaded.
    pub bytes: Vec<u8>,
    /// MIME type (sniffed at load time unless supplied).
    pub mime_type: String,
}

/// A saved edit: original/result pair, the prompt that produced it, and the
/// mask used, if any.
#[derive(Clone)]
pub struct HistoryEntry {
    /// Session-unique, monotonically increasing id.
    pub id: u64,
    /// The source image at edit time.
    pub original: SourceImage,
    /// The final composited result, PNG-encoded.
    pub result_png: Vec<u8>,
    /// The prompt as typed (without the mask suffix).
    pub prompt: String,
    /// The mask applied, when the edit was region-restricted.
    pub mask: Option<Mask>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// The outcome of a successful edit.
#[derive(Debug)]
pub struct EditOutcome {
    /// The final image at the original's resolution.
    pub image: RasterImage,
    /// The same image, PNG-encoded.
    pub png: Vec<u8>,
    /// Whether a mask restricted this edit.
    pub masked: bool,
}

/// Top-level edit state machine: source image, current mask, bounded edit
/// history, and an at-most-one-in-flight busy flag.
///
/// All failure paths leave prior state (source, mask, history) untouched;
/// only the pending result is discarded.
pub struct EditSession<P: EditProvider> {
    provider: P,
    source: Option<SourceImage>,
    result_png: Option<Vec<u8>>,
    mask: Option<Mask>,
    history: VecDeque<HistoryEntry>,
    busy: bool,
    next_id: u64,
}

impl<P: EditProvider> EditSession<P> {
    /// Create an empty session driving the given provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            source: None,
            result_png: None,
            mask: None,
            history: VecDeque::new(),
            busy: false,
            next_id: 1,
        }
    }

    /// Load a new source image, validating that it decodes.
    ///
    /// Clears the current result and mask: a mask painted over a previous
    /// image must never be applied to a new one.
    pub fn load_source(&mut self, bytes: Vec<u8>, mime_type: Option<&str>) -> MaskeditResult<()> {
        RasterImage::decode(&bytes)?;
        let mime_type = mime_type
            .map(str::to_string)
            .or_else(|| sniff_mime(&bytes).map(str::to_string))
            .unwrap_or_else(|| "image/png".to_string());
        let source = SourceImage { bytes, mime_type };
        debug!(mime = %source.mime_type, "source image loaded");
        self.source = Some(source);
        self.result_png = None;
        self.mask = None;
        Ok(())
    }

    /// Attach a mask exported by the capture surface.
    pub fn set_mask(&mut self, mask: Mask) {
        self.mask = Some(mask);
    }

    /// Drop the current mask ("no mask" state).
    pub fn clear_mask(&mut self) {
        self.mask = None;
    }

    /// The current source image, if any.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// The most recent result, PNG-encoded, if any.
    pub fn result_png(&self) -> Option<&[u8]> {
        self.result_png.as_deref()
    }

    /// The current mask, if any.
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    /// Past edits, newest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// True while an edit is in flight; callers disable their trigger on it.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Run one edit: send the source and prompt to the provider, composite
    /// the result through the current mask when one is set, and record a
    /// history entry.
    pub async fn render(&mut self, prompt: &str) -> MaskeditResult<EditOutcome> {
        if self.busy {
            return Err(MaskeditError::validation("an edit is already in flight"));
        }
        if prompt.trim().is_empty() {
            return Err(MaskeditError::validation("prompt must be non-empty"));
        }
        let Some(source) = self.source.clone() else {
            return Err(MaskeditError::validation("no source image loaded"));
        };

        self.busy = true;
        let outcome = self.render_once(&source, prompt).await;
        self.busy = false;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "edit failed");
                return Err(e);
            }
        };

        let entry = HistoryEntry {
            id: self.next_id,
            original: source,
            result_png: outcome.png.clone(),
            prompt: prompt.to_string(),
            mask: self.mask.clone(),
            timestamp_ms: unix_millis(),
        };
        self.next_id += 1;
        self.history.push_front(entry);
        self.history.truncate(HISTORY_CAPACITY);
        self.result_png = Some(outcome.png.clone());

        Ok(outcome)
    }

    /// Restore a past edit as the active original/result pair.
    ///
    /// The current mask is dropped: it was painted over a different image.
    /// Returns the restored entry (its prompt included) for display.
    pub fn select_history(&mut self, id: u64) -> MaskeditResult<HistoryEntry> {
        let entry = self
            .history
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| MaskeditError::validation(format!("no history entry with id {id}")))?;
        self.source = Some(entry.original.clone());
        self.result_png = Some(entry.result_png.clone());
        self.mask = None;
        Ok(entry)
    }

    /// Drop source, result, and mask. History is kept.
    pub fn reset(&mut self) {
        self.source = None;
        self.result_png = None;
        self.mask = None;
    }

    async fn render_once(&self, source: &SourceImage, prompt: &str) -> MaskeditResult<EditOutcome> {
        let enriched = match &self.mask {
            Some(_) => format!("{prompt}{MASKED_EDIT_SUFFIX}"),
            None => prompt.to_string(),
        };

        let request = EditRequest::new(source.bytes.clone(), enriched)?
            .with_mime_type(&source.mime_type);

        debug!(provider = self.provider.name(), masked = self.mask.is_some(), "requesting edit");
        let edited = self.provider.edit(&request).await?;

        let image = match &self.mask {
            Some(mask) => composite(&source.bytes, &edited.bytes, mask.png_bytes())?,
            None => RasterImage::decode(&edited.bytes)?,
        };
        let png = image.encode_png()?;

        Ok(EditOutcome {
            image,
            png,
            masked: self.mask.is_some(),
        })
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/studio/session.rs"]
mod tests;
