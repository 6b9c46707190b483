//! CPU rasterizer behind the native host.
//!
//! [`PixelCanvas`] implements [`Canvas2d`] over a premultiplied RGBA float
//! buffer. Shapes are antialiased by analytic coverage and composited
//! source-over, which is close enough to a browser 2D context for a soft
//! decorative background. The finished frame is handed to the GPU presenter
//! or written out as a PNG.

use std::path::Path;

use glam::Vec2;
use image::{ImageFormat, RgbaImage};

use crate::canvas::{Canvas2d, RadialGradient, Rect, Segment};
use crate::error::{PaintError, SnapshotError};
use crate::theme::Rgba;

/// Device-pixel box touched by a draw, `x0..x1` by `y0..y1`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Span {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

impl Span {
    fn covering(min: Vec2, max: Vec2, width: u32, height: u32) -> Option<Self> {
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(height);
        (x0 < x1 && y0 < y1).then_some(Self { x0, x1, y0, y1 })
    }

    fn union(self, other: Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            x1: self.x1.max(other.x1),
            y0: self.y0.min(other.y0),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A software 2D canvas.
#[derive(Clone, Debug)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    scale: f32,
    /// Premultiplied RGBA, row-major.
    pixels: Vec<[f32; 4]>,
    /// Per-pixel stroke coverage, so a path's overlapping segments blend once.
    coverage: Vec<f32>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            scale: 1.0,
            pixels: vec![[0.0; 4]; len],
            coverage: vec![0.0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Straight-alpha RGBA8 of one device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(unpremultiply(self.pixels[self.index(x, y)]))
    }

    /// The whole frame as straight-alpha RGBA8 rows.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&p| unpremultiply(p)).collect()
    }

    /// The whole frame as premultiplied RGBA8 rows, for GPU upload.
    pub fn to_premultiplied_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    pub fn to_image(&self) -> Result<RgbaImage, SnapshotError> {
        if self.is_empty() {
            return Err(SnapshotError::Empty);
        }
        RgbaImage::from_raw(self.width, self.height, self.to_rgba8()).ok_or(SnapshotError::Empty)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.to_image()?.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn to_device(&self, p: Vec2) -> Vec2 {
        p * self.scale
    }

    /// Source-over of premultiplied `src` at `coverage`.
    #[inline]
    fn blend(&mut self, x: u32, y: u32, src: [f32; 4], coverage: f32) {
        let i = self.index(x, y);
        let dst = &mut self.pixels[i];
        let keep = 1.0 - src[3] * coverage;
        for c in 0..4 {
            dst[c] = src[c] * coverage + dst[c] * keep;
        }
    }

    /// Fill a device-space disc, asking `shade` for the color at each
    /// normalized distance from the center.
    fn fill_disc(&mut self, center: Vec2, radius: f32, shade: impl Fn(f32) -> [f32; 4]) {
        if radius <= 0.0 {
            return;
        }
        let reach = Vec2::splat(radius + 1.0);
        let Some(span) = Span::covering(center - reach, center + reach, self.width, self.height)
        else {
            return;
        };

        for y in span.y0..span.y1 {
            for x in span.x0..span.x1 {
                let d = (Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center).length();
                let coverage = (radius - d + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let color = shade((d / radius).min(1.0));
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Accumulate one segment's coverage into the scratch buffer.
    fn cover_segment(&mut self, from: Vec2, to: Vec2, half_width: f32) -> Option<Span> {
        let pad = Vec2::splat(half_width + 1.0);
        let span = Span::covering(from.min(to) - pad, from.max(to) + pad, self.width, self.height)?;

        let dir = to - from;
        let len_sq = dir.length_squared();
        for y in span.y0..span.y1 {
            for x in span.x0..span.x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let t = if len_sq > 0.0 {
                    ((p - from).dot(dir) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let d = (p - (from + dir * t)).length();
                let coverage = (half_width + 0.5 - d).clamp(0.0, 1.0);
                let i = self.index(x, y);
                if coverage > self.coverage[i] {
                    self.coverage[i] = coverage;
                }
            }
        }
        Some(span)
    }
}

impl Canvas2d for PixelCanvas {
    fn resize_backing(&mut self, width: u32, height: u32) {
        *self = PixelCanvas::new(width, height);
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let min = self.to_device(Vec2::new(rect.x, rect.y));
        let max = self.to_device(Vec2::new(rect.x + rect.width, rect.y + rect.height));
        let Some(span) = Span::covering(min, max, self.width, self.height) else {
            return;
        };
        let src = color.premultiplied();

        for y in span.y0..span.y1 {
            let cy = overlap(y as f32, min.y, max.y);
            for x in span.x0..span.x1 {
                let coverage = overlap(x as f32, min.x, max.x) * cy;
                if coverage > 0.0 {
                    self.blend(x, y, src, coverage);
                }
            }
        }
    }

    fn clear_rect(&mut self, rect: Rect) {
        let min = self.to_device(Vec2::new(rect.x, rect.y));
        let max = self.to_device(Vec2::new(rect.x + rect.width, rect.y + rect.height));
        let Some(span) = Span::covering(min, max, self.width, self.height) else {
            return;
        };
        for y in span.y0..span.y1 {
            for x in span.x0..span.x1 {
                let i = self.index(x, y);
                self.pixels[i] = [0.0; 4];
            }
        }
    }

    fn stroke_path(&mut self, segments: &[Segment], color: Rgba, width: f32) {
        let half_width = (width * self.scale * 0.5).max(0.5);
        let mut touched: Option<Span> = None;
        for segment in segments {
            let from = self.to_device(segment.from);
            let to = self.to_device(segment.to);
            if let Some(span) = self.cover_segment(from, to, half_width) {
                touched = Some(touched.map_or(span, |t| t.union(span)));
            }
        }

        let Some(span) = touched else {
            return;
        };
        let src = color.premultiplied();
        for y in span.y0..span.y1 {
            for x in span.x0..span.x1 {
                let i = self.index(x, y);
                let coverage = std::mem::take(&mut self.coverage[i]);
                if coverage > 0.0 {
                    self.blend(x, y, src, coverage);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if !center.is_finite() || !radius.is_finite() {
            return;
        }
        let src = color.premultiplied();
        let center = self.to_device(center);
        self.fill_disc(center, radius * self.scale, |_| src);
    }

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient) -> Result<(), PaintError> {
        if !gradient.center.is_finite() || !gradient.radius.is_finite() || gradient.radius < 0.0 {
            return Err(PaintError::NonFiniteGeometry);
        }
        let center = self.to_device(gradient.center);
        let gradient = *gradient;
        self.fill_disc(center, gradient.radius * self.scale, |t| gradient.color_at(t));
        Ok(())
    }
}

/// Length of `[px, px + 1]` inside `[lo, hi]`.
#[inline]
fn overlap(px: f32, lo: f32, hi: f32) -> f32 {
    ((px + 1.0).min(hi) - px.max(lo)).clamp(0.0, 1.0)
}

fn unpremultiply(p: [f32; 4]) -> [u8; 4] {
    let a = p[3].clamp(0.0, 1.0);
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let channel = |c: f32| ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(p[0]), channel(p[1]), channel(p[2]), (a * 255.0).round() as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_opaque() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.fill_rect(Rect::sized(4.0, 4.0), Rgba::WHITE);
        assert_eq!(canvas.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(3, 3), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn test_scale_maps_css_to_device() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.set_scale(2.0);
        canvas.fill_rect(Rect::sized(2.0, 2.0), Rgba::rgb(255, 0, 0));
        assert_eq!(canvas.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(4, 4), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_resize_clears_and_resets_scale() {
        let mut canvas = PixelCanvas::new(2, 2);
        canvas.set_scale(3.0);
        canvas.fill_rect(Rect::sized(2.0, 2.0), Rgba::WHITE);
        canvas.resize_backing(3, 1);
        assert_eq!(canvas.scale(), 1.0);
        assert_eq!((canvas.width(), canvas.height()), (3, 1));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_clear_rect_makes_transparent() {
        let mut canvas = PixelCanvas::new(2, 1);
        canvas.fill_rect(Rect::sized(2.0, 1.0), Rgba::WHITE);
        canvas.clear_rect(Rect::sized(1.0, 1.0));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(1, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_source_over_blend() {
        let mut canvas = PixelCanvas::new(1, 1);
        canvas.fill_rect(Rect::sized(1.0, 1.0), Rgba::WHITE);
        canvas.fill_rect(Rect::sized(1.0, 1.0), Rgba::rgba(0, 0, 0, 0.5));
        assert_eq!(canvas.pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn test_circle_covers_center_not_corner() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.fill_circle(Vec2::new(5.0, 5.0), 3.0, Rgba::WHITE);
        assert_eq!(canvas.pixel(5, 5).map(|p| p[3]), Some(255));
        assert_eq!(canvas.pixel(0, 0).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_crossing_path_blends_once() {
        let mut canvas = PixelCanvas::new(10, 10);
        let color = Rgba::rgba(255, 255, 255, 0.5);
        canvas.stroke_path(
            &[
                Segment::new(Vec2::new(5.5, 0.0), Vec2::new(5.5, 10.0)),
                Segment::new(Vec2::new(0.0, 5.5), Vec2::new(10.0, 5.5)),
            ],
            color,
            1.0,
        );
        let crossing = canvas.pixel(5, 5).unwrap()[3];
        let arm = canvas.pixel(5, 1).unwrap()[3];
        assert_eq!(crossing, arm);
    }

    #[test]
    fn test_gradient_fades_outward() {
        let mut canvas = PixelCanvas::new(21, 21);
        let g = RadialGradient::new(Vec2::new(10.5, 10.5), 10.0, Rgba::WHITE, Rgba::TRANSPARENT)
            .unwrap();
        canvas.fill_radial_gradient(&g).unwrap();
        let center = canvas.pixel(10, 10).unwrap()[3];
        let mid = canvas.pixel(15, 10).unwrap()[3];
        assert!(center > mid);
        assert_eq!(canvas.pixel(0, 0).unwrap()[3], 0);
    }

    #[test]
    fn test_gradient_rejects_nan() {
        let mut canvas = PixelCanvas::new(4, 4);
        let mut g =
            RadialGradient::new(Vec2::ZERO, 1.0, Rgba::WHITE, Rgba::TRANSPARENT).unwrap();
        g.center.x = f32::NAN;
        assert_eq!(canvas.fill_radial_gradient(&g), Err(PaintError::NonFiniteGeometry));
    }

    #[test]
    fn test_empty_snapshot_errors() {
        let canvas = PixelCanvas::new(0, 0);
        assert!(matches!(canvas.to_image(), Err(SnapshotError::Empty)));
    }
}
