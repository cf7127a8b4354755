use kurbo::Point;
use tracing::debug;
use vello_cpu::kurbo::Shape as _;

use crate::{
    composite::masked::over_in_place,
    foundation::error::{MaskeditError, MaskeditResult},
    raster::image::{RasterImage, unpremultiply_rgba8_in_place},
};

/// Smallest allowed brush diameter, in surface pixels.
pub const MIN_BRUSH_WIDTH: f32 = 10.0;
/// Largest allowed brush diameter, in surface pixels.
pub const MAX_BRUSH_WIDTH: f32 = 150.0;

// The paint color is arbitrary: downstream compositing reads only the
// coverage/alpha channel.
const MASK_PAINT: [u8; 3] = [168, 85, 247];

/// An exported paint mask: PNG bytes at the capture surface's dimensions.
#[derive(Clone, Debug)]
pub struct Mask {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl Mask {
    /// Wrap already-encoded PNG bytes, validating that they decode.
    pub fn from_png(png: Vec<u8>) -> MaskeditResult<Self> {
        let img = RasterImage::decode(&png)?;
        Ok(Self {
            png,
            width: img.width(),
            height: img.height(),
        })
    }

    /// The encoded PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Mask width in pixels (surface resolution, not source resolution).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels (surface resolution, not source resolution).
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Off-screen paint surface capturing a freehand region selection.
///
/// Strokes are rendered round-capped and round-joined at full opacity into a
/// persistent bitmap; [`BrushSurface::end_stroke`] exports the accumulated
/// coverage as a [`Mask`]. The surface must be re-[`configure`]d whenever the
/// displayed source image changes or the on-screen surface is resized, which
/// discards all painted content.
///
/// [`configure`]: BrushSurface::configure
pub struct BrushSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    brush_width: f32,
    active: bool,
    last_point: Option<Point>,
}

impl BrushSurface {
    /// Create a surface with an empty backing bitmap of the given dimensions.
    pub fn new(width: u32, height: u32) -> MaskeditResult<Self> {
        let (w, h) = surface_dims(width, height)?;
        Ok(Self {
            width: w,
            height: h,
            pixmap: vello_cpu::Pixmap::new(w, h),
            brush_width: 40.0,
            active: false,
            last_point: None,
        })
    }

    /// (Re)initialize the backing bitmap, wiping any painted content.
    pub fn configure(&mut self, width: u32, height: u32) -> MaskeditResult<()> {
        let (w, h) = surface_dims(width, height)?;
        self.width = w;
        self.height = h;
        self.pixmap = vello_cpu::Pixmap::new(w, h);
        self.last_point = None;
        debug!(width, height, "brush surface configured");
        Ok(())
    }

    /// Surface dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// Enable or disable painting. While inactive, stroke calls are no-ops.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether painting is currently enabled.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Set the brush diameter, clamped to [`MIN_BRUSH_WIDTH`]..=[`MAX_BRUSH_WIDTH`].
    ///
    /// Fails while a stroke is in progress: the width is mutable between
    /// strokes only.
    pub fn set_brush_width(&mut self, width: f32) -> MaskeditResult<()> {
        if self.last_point.is_some() {
            return Err(MaskeditError::validation(
                "brush width cannot change mid-stroke",
            ));
        }
        self.brush_width = width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
        Ok(())
    }

    /// Current brush diameter in pixels.
    pub fn brush_width(&self) -> f32 {
        self.brush_width
    }

    /// Start a stroke at a surface-local point, painting a dot of brush
    /// diameter there (a tap must leave a mark). No-op while inactive.
    pub fn begin_stroke(&mut self, point: Point) {
        if !self.active {
            return;
        }
        self.last_point = Some(point);
        let radius = f64::from(self.brush_width) / 2.0;
        let dot = vello_cpu::kurbo::Circle::new(to_cpu_point(point), radius);
        self.render(|ctx| {
            ctx.fill_path(&dot.to_path(0.1));
        });
    }

    /// Extend the in-progress stroke with a round-capped segment from the
    /// last recorded point. No-op while inactive or with no stroke begun.
    pub fn extend_stroke(&mut self, point: Point) {
        if !self.active {
            return;
        }
        let Some(last) = self.last_point else {
            return;
        };
        self.last_point = Some(point);

        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(to_cpu_point(last));
        path.line_to(to_cpu_point(point));
        let stroke = vello_cpu::kurbo::Stroke::new(f64::from(self.brush_width))
            .with_caps(vello_cpu::kurbo::Cap::Round)
            .with_join(vello_cpu::kurbo::Join::Round);
        self.render(|ctx| {
            ctx.set_stroke(stroke);
            ctx.stroke_path(&path);
        });
    }

    /// Finalize the in-progress stroke and export the accumulated coverage.
    ///
    /// Returns `Ok(None)` ("no mask") when the bitmap has no painted pixel.
    /// Pointer-cancel (the pointer leaving the surface) is the same call:
    /// finalize and export whatever was painted.
    pub fn end_stroke(&mut self) -> MaskeditResult<Option<Mask>> {
        self.last_point = None;
        if !self.has_content() {
            return Ok(None);
        }
        self.export().map(Some)
    }

    /// Wipe the backing bitmap. Any previously exported mask is superseded.
    pub fn clear(&mut self) {
        self.pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.last_point = None;
    }

    /// True when any pixel of the backing bitmap is non-transparent.
    pub fn has_content(&self) -> bool {
        self.pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .any(|px| px[3] != 0)
    }

    // `render_to_pixmap` replaces the target's contents, so each paint op is
    // rasterized into a scratch bitmap and composited over the accumulated
    // coverage of earlier dots and segments.
    fn render(&mut self, draw: impl FnOnce(&mut vello_cpu::RenderContext)) {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            MASK_PAINT[0],
            MASK_PAINT[1],
            MASK_PAINT[2],
            255,
        ));
        draw(&mut ctx);
        ctx.flush();
        let mut scratch = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut scratch);
        over_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
        );
    }

    fn export(&self) -> MaskeditResult<Mask> {
        let mut rgba8 = self.pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut rgba8);
        let img = RasterImage::from_rgba8(u32::from(self.width), u32::from(self.height), rgba8)?;
        let png = img.encode_png()?;
        debug!(width = self.width, height = self.height, "mask exported");
        Ok(Mask {
            png,
            width: u32::from(self.width),
            height: u32::from(self.height),
        })
    }
}

fn surface_dims(width: u32, height: u32) -> MaskeditResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(MaskeditError::validation(
            "surface dimensions must be nonzero",
        ));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| MaskeditError::validation("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| MaskeditError::validation("surface height exceeds u16"))?;
    Ok((w, h))
}

fn to_cpu_point(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

#[cfg(test)]
#[path = "../../tests/unit/brush/surface.rs"]
mod tests;
