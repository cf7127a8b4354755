use kurbo::Point;

use crate::{
    brush::surface::{BrushSurface, Mask},
    foundation::error::{MaskeditError, MaskeditResult},
};

/// An ordered sequence of surface-local points painted at one brush width.
///
/// A full mask session is the union of all strokes painted since the surface
/// was last configured or cleared.
#[derive(Clone, Debug)]
pub struct BrushStroke {
    points: Vec<Point>,
    width: f32,
}

impl BrushStroke {
    /// Build a stroke from at least one point. A single point is a tap.
    pub fn new(points: Vec<Point>, width: f32) -> MaskeditResult<Self> {
        if points.is_empty() {
            return Err(MaskeditError::validation("stroke needs at least one point"));
        }
        Ok(Self { points, width })
    }

    /// The stroke's points, in painting order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Brush diameter for this stroke, in pixels.
    pub fn width(&self) -> f32 {
        self.width
    }
}

impl BrushSurface {
    /// Replay a recorded stroke as one begin/extend.../end gesture.
    ///
    /// The surface must be active; the brush width is taken from the stroke.
    pub fn paint_stroke(&mut self, stroke: &BrushStroke) -> MaskeditResult<Option<Mask>> {
        self.set_brush_width(stroke.width())?;
        let mut points = stroke.points().iter();
        if let Some(first) = points.next() {
            self.begin_stroke(*first);
        }
        for p in points {
            self.extend_stroke(*p);
        }
        self.end_stroke()
    }
}
