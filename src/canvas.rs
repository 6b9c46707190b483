//! The 2D painting seam.
//!
//! Everything the engine draws goes through [`Canvas2d`], a deliberately small
//! subset of the HTML canvas 2D context. Three implementations exist:
//!
//! - [`RecordingCanvas`] - records calls as [`DrawCall`] values (tests, spies)
//! - [`PixelCanvas`](crate::PixelCanvas) - CPU rasterizer used by the native host
//! - `WebCanvas` - a browser `CanvasRenderingContext2d` (wasm32 only)
//!
//! Coordinates are CSS pixels. Implementations map them to backing-store
//! pixels through the uniform scale set by [`Canvas2d::set_scale`].

use glam::Vec2;

use crate::error::PaintError;
use crate::theme::Rgba;

/// Axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle from the origin covering `width x height`.
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// One straight line segment of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub from: Vec2,
    pub to: Vec2,
}

impl Segment {
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self { from, to }
    }
}

/// A color stop at `offset` in `0..=1` along a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

/// A two-stop radial gradient filling the disc `center`/`radius`.
///
/// Equivalent to `createRadialGradient(x, y, 0, x, y, r)` with stops at 0 and
/// 1, followed by `arc(x, y, r)` + `fill()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub radius: f32,
    pub stops: [ColorStop; 2],
}

impl RadialGradient {
    /// Build a gradient, rejecting NaN/infinite geometry and negative radii
    /// the same way a browser canvas throws on them.
    pub fn new(center: Vec2, radius: f32, inner: Rgba, outer: Rgba) -> Result<Self, PaintError> {
        if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
            return Err(PaintError::NonFiniteGeometry);
        }
        Ok(Self {
            center,
            radius,
            stops: [
                ColorStop {
                    offset: 0.0,
                    color: inner,
                },
                ColorStop {
                    offset: 1.0,
                    color: outer,
                },
            ],
        })
    }

    /// Premultiplied color at normalized distance `t` from the center.
    pub fn color_at(&self, t: f32) -> [f32; 4] {
        let [inner, outer] = &self.stops;
        let span = outer.offset - inner.offset;
        let local = if span <= f32::EPSILON {
            1.0
        } else {
            (t - inner.offset) / span
        };
        Rgba::mix_premultiplied(&inner.color, &outer.color, local)
    }
}

/// Minimal 2D drawing surface.
pub trait Canvas2d {
    /// Resize the backing store to `width x height` device pixels.
    ///
    /// Like assigning `canvas.width`, this clears the surface and resets the
    /// transform to identity.
    fn resize_backing(&mut self, width: u32, height: u32);

    /// Replace the transform with a uniform scale.
    fn set_scale(&mut self, scale: f32);

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    /// Reset pixels in `rect` to fully transparent.
    fn clear_rect(&mut self, rect: Rect);

    /// Stroke every segment as one path with one color.
    fn stroke_path(&mut self, segments: &[Segment], color: Rgba, width: f32);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.stroke_path(&[Segment::new(from, to)], color, width);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Fill the gradient's disc. May fail on geometry the backend rejects.
    fn fill_radial_gradient(&mut self, gradient: &RadialGradient) -> Result<(), PaintError>;
}

/// A recorded paint call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    ResizeBacking { width: u32, height: u32 },
    SetScale(f32),
    FillRect { rect: Rect, color: Rgba },
    ClearRect(Rect),
    StrokePath {
        segments: Vec<Segment>,
        color: Rgba,
        width: f32,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    FillRadialGradient(RadialGradient),
}

/// A [`Canvas2d`] that records calls instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    calls: Vec<DrawCall>,
    backing: (u32, u32),
    scale: f32,
    reject_gradients: bool,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            ..Default::default()
        }
    }

    /// Make every gradient fill fail, as a browser does with bad geometry.
    pub fn reject_gradients(mut self, reject: bool) -> Self {
        self.reject_gradients = reject;
        self
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Drain the recorded calls.
    pub fn take(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Current backing-store size in device pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Calls that put pixels on the surface (everything but resize/scale).
    pub fn paint_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| !matches!(c, DrawCall::ResizeBacking { .. } | DrawCall::SetScale(_)))
            .count()
    }

    pub fn circles(&self) -> impl Iterator<Item = (Vec2, f32, Rgba)> + '_ {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::FillCircle {
                center,
                radius,
                color,
            } => Some((*center, *radius, *color)),
            _ => None,
        })
    }

    pub fn gradients(&self) -> impl Iterator<Item = &RadialGradient> + '_ {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::FillRadialGradient(g) => Some(g),
            _ => None,
        })
    }

    /// Single-segment strokes, i.e. connection lines.
    pub fn lines(&self) -> impl Iterator<Item = (Segment, Rgba)> + '_ {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::StrokePath {
                segments, color, ..
            } if segments.len() == 1 => Some((segments[0], *color)),
            _ => None,
        })
    }
}

impl Canvas2d for RecordingCanvas {
    fn resize_backing(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
        self.scale = 1.0;
        self.calls.push(DrawCall::ResizeBacking { width, height });
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.calls.push(DrawCall::SetScale(scale));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.calls.push(DrawCall::FillRect { rect, color });
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.calls.push(DrawCall::ClearRect(rect));
    }

    fn stroke_path(&mut self, segments: &[Segment], color: Rgba, width: f32) {
        self.calls.push(DrawCall::StrokePath {
            segments: segments.to_vec(),
            color,
            width,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.calls.push(DrawCall::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient) -> Result<(), PaintError> {
        if self.reject_gradients {
            return Err(PaintError::Backend("gradient rejected".into()));
        }
        self.calls.push(DrawCall::FillRadialGradient(*gradient));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_rejects_non_finite() {
        let ok = RadialGradient::new(Vec2::new(1.0, 2.0), 10.0, Rgba::WHITE, Rgba::TRANSPARENT);
        assert!(ok.is_ok());

        let nan = RadialGradient::new(Vec2::new(f32::NAN, 0.0), 10.0, Rgba::WHITE, Rgba::TRANSPARENT);
        assert_eq!(nan, Err(PaintError::NonFiniteGeometry));

        let inf = RadialGradient::new(Vec2::ZERO, f32::INFINITY, Rgba::WHITE, Rgba::TRANSPARENT);
        assert_eq!(inf, Err(PaintError::NonFiniteGeometry));
    }

    #[test]
    fn test_gradient_color_at_ends() {
        let g = RadialGradient::new(Vec2::ZERO, 10.0, Rgba::rgba(255, 0, 0, 0.5), Rgba::TRANSPARENT)
            .unwrap();
        let center = g.color_at(0.0);
        assert!((center[0] - 0.5).abs() < 1e-6);
        assert!((center[3] - 0.5).abs() < 1e-6);
        assert_eq!(g.color_at(1.0), [0.0, 0.0, 0.0, 0.0]);
        assert!((g.color_at(0.5)[3] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_recording_tracks_backing_and_scale() {
        let mut canvas = RecordingCanvas::new();
        canvas.resize_backing(200, 100);
        canvas.set_scale(2.0);
        assert_eq!(canvas.backing_size(), (200, 100));
        assert_eq!(canvas.scale(), 2.0);
        assert_eq!(canvas.paint_count(), 0);

        canvas.stroke_line(Vec2::ZERO, Vec2::ONE, Rgba::WHITE, 1.0);
        canvas.fill_circle(Vec2::ONE, 2.0, Rgba::WHITE);
        assert_eq!(canvas.paint_count(), 2);
        assert_eq!(canvas.lines().count(), 1);
        assert_eq!(canvas.circles().count(), 1);
    }

    #[test]
    fn test_rejecting_canvas_fails_gradients() {
        let mut canvas = RecordingCanvas::new().reject_gradients(true);
        let g = RadialGradient::new(Vec2::ZERO, 1.0, Rgba::WHITE, Rgba::TRANSPARENT).unwrap();
        assert!(canvas.fill_radial_gradient(&g).is_err());
        assert_eq!(canvas.paint_count(), 0);
    }
}
