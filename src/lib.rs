//! Maskedit is a mask-guided AI image-editing pipeline.
//!
//! A user paints a freehand region over a source image, describes the desired
//! change in natural language, and an external generative image model produces
//! a full-frame edit. Maskedit guarantees the edit is spatially confined: the
//! model output is composited back into the original through the painted
//! mask's alpha coverage, so unpainted pixels stay byte-identical to the
//! source.
//!
//! # Pipeline overview
//!
//! 1. **Capture**: [`BrushSurface`] records pointer gestures as round-capped
//!    strokes in an off-screen bitmap and exports the coverage as a [`Mask`]
//! 2. **Edit**: an [`EditProvider`] (e.g. [`GeminiEditor`]) turns the source
//!    image and prompt into a full-frame edited image
//! 3. **Composite**: [`composite`] blends original and edited per pixel,
//!    weighted by mask coverage, at the original's resolution
//! 4. **Session**: [`EditSession`] orchestrates the above, keeps a bounded
//!    edit history, and guarantees stale masks never touch a new image
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Explicit configuration**: providers are built from constructor inputs
//!   only; the library never reads ambient environment state.
//! - **No partial output**: any decode or model failure aborts the edit and
//!   leaves prior session state untouched.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod brush;
mod composite;
mod foundation;
mod model;
mod raster;
mod studio;

pub use kurbo::Point;

pub use brush::stroke::BrushStroke;
pub use brush::surface::{BrushSurface, MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH, Mask};
pub use composite::masked::{composite, composite_images};
pub use foundation::error::{MaskeditError, MaskeditResult};
pub use model::gemini::{AspectRatioHint, GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use model::provider::{EditProvider, EditRequest, EditedImage, sniff_mime};
pub use raster::image::RasterImage;
pub use studio::session::{
    EditOutcome, EditSession, HISTORY_CAPACITY, HistoryEntry, SourceImage,
};
