//! The computation-free background for constrained devices.
//!
//! Instead of a frame loop, the fallback is two large blurred blobs animated
//! by CSS keyframes plus a faint dot grid. Web hosts inject the markup from
//! [`StaticFallback::to_html`]; hosts without CSS paint the resting frame once
//! with [`StaticFallback::paint`].

use glam::Vec2;

use crate::canvas::{Canvas2d, RadialGradient, Rect};
use crate::theme::{Rgba, Theme};
use crate::viewport::ViewportState;

/// Which corner a blob is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopRight,
    BottomLeft,
}

impl Corner {
    fn css(self) -> &'static str {
        match self {
            Corner::TopRight => "top:0;right:0",
            Corner::BottomLeft => "bottom:0;left:0",
        }
    }
}

/// A blurred circle drifting back and forth on a CSS animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
    pub corner: Corner,
    pub diameter: f32,
    pub color: Rgba,
    /// Keyframes name.
    pub animation: &'static str,
    pub duration_s: f32,
    /// Offset at the animation midpoint.
    pub drift: Vec2,
}

impl Blob {
    /// Center of the blob at rest in a `width x height` container.
    pub fn center(&self, width: f32, height: f32) -> Vec2 {
        let r = self.diameter * 0.5;
        match self.corner {
            Corner::TopRight => Vec2::new(width - r, r),
            Corner::BottomLeft => Vec2::new(r, height - r),
        }
    }
}

/// The layer under the blobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BaseLayer {
    Transparent,
    /// Diagonal top-left to bottom-right gradient through three colors.
    Gradient([Rgba; 3]),
}

/// Tiled radial dots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotGrid {
    pub dot_radius: f32,
    pub pitch: f32,
    pub opacity: f32,
    pub color: Rgba,
}

/// Full description of the static background for one theme.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticFallback {
    pub theme: Theme,
    pub base: BaseLayer,
    pub blobs: [Blob; 2],
    pub blur: f32,
    pub dots: DotGrid,
}

impl StaticFallback {
    pub fn for_theme(theme: Theme) -> Self {
        let dark = theme == Theme::Dark;
        let (primary, secondary) = if dark {
            (Rgba::rgba(139, 92, 246, 0.1), Rgba::rgba(59, 130, 246, 0.1))
        } else {
            (Rgba::rgba(221, 214, 254, 0.2), Rgba::rgba(191, 219, 254, 0.2))
        };

        Self {
            theme,
            base: if dark {
                BaseLayer::Transparent
            } else {
                BaseLayer::Gradient([
                    Rgba::rgb(0xf9, 0xfa, 0xfb),
                    Rgba::WHITE,
                    Rgba::rgb(0xf3, 0xf4, 0xf6),
                ])
            },
            blobs: [
                Blob {
                    corner: Corner::TopRight,
                    diameter: 300.0,
                    color: primary,
                    animation: "float-slow",
                    duration_s: 8.0,
                    drift: Vec2::new(20.0, 20.0),
                },
                Blob {
                    corner: Corner::BottomLeft,
                    diameter: 250.0,
                    color: secondary,
                    animation: "float-reverse",
                    duration_s: 10.0,
                    drift: Vec2::new(-20.0, 10.0),
                },
            ],
            blur: 80.0,
            dots: DotGrid {
                dot_radius: 1.0,
                pitch: 30.0,
                opacity: 0.03,
                color: if dark {
                    Rgba::WHITE
                } else {
                    Rgba::rgb(0x7c, 0x3a, 0xed)
                },
            },
        }
    }

    /// `@keyframes` rules for both blobs.
    pub fn to_css(&self) -> String {
        self.blobs
            .iter()
            .map(|blob| {
                format!(
                    "@keyframes {} {{ 0%, 100% {{ transform: translate(0, 0); }} \
                     50% {{ transform: translate({}px, {}px); }} }}\n",
                    blob.animation, blob.drift.x, blob.drift.y
                )
            })
            .collect()
    }

    /// Self-contained markup: a positioned wrapper holding the keyframes,
    /// base layer, blobs and dot grid.
    pub fn to_html(&self) -> String {
        let mut html = String::from(
            "<div class=\"ambient-fallback\" style=\"position:absolute;inset:0;width:100%;\
             height:100%;pointer-events:none;z-index:0;overflow:hidden\">",
        );
        html.push_str(&format!("<style>{}</style>", self.to_css()));

        let base = match self.base {
            BaseLayer::Transparent => "transparent".to_string(),
            BaseLayer::Gradient([from, via, to]) => format!(
                "linear-gradient(to bottom right, {}, {}, {})",
                from.to_css(),
                via.to_css(),
                to.to_css()
            ),
        };
        html.push_str(&format!(
            "<div style=\"position:absolute;inset:0;background:{base}\"></div>"
        ));

        for blob in &self.blobs {
            html.push_str(&format!(
                "<div style=\"position:absolute;{};width:{d}px;height:{d}px;border-radius:9999px;\
                 filter:blur({}px);background:{};animation:{} {}s ease-in-out infinite\"></div>",
                blob.corner.css(),
                self.blur,
                blob.color.to_css(),
                blob.animation,
                blob.duration_s,
                d = blob.diameter,
            ));
        }

        html.push_str(&format!(
            "<div style=\"position:absolute;inset:0;opacity:{};background-image:radial-gradient({} {r}px, \
             transparent {r}px);background-size:{p}px {p}px\"></div>",
            self.dots.opacity,
            self.dots.color.to_css(),
            r = self.dots.dot_radius,
            p = self.dots.pitch,
        ));
        html.push_str("</div>");
        html
    }

    /// Paint the resting frame once.
    ///
    /// The gradient base is approximated by its first stop and each blurred
    /// blob by a radial gradient that reaches transparency `blur` px past
    /// the blob's edge.
    pub fn paint<C: Canvas2d + ?Sized>(&self, canvas: &mut C, width: f32, height: f32, dpr: f32) {
        ViewportState { width, height, dpr }.apply(canvas);
        let full = Rect::sized(width, height);

        match self.base {
            BaseLayer::Transparent => canvas.clear_rect(full),
            BaseLayer::Gradient([from, ..]) => canvas.fill_rect(full, from),
        }

        for blob in &self.blobs {
            let painted = RadialGradient::new(
                blob.center(width, height),
                blob.diameter * 0.5 + self.blur,
                blob.color,
                blob.color.with_alpha(0.0),
            )
            .and_then(|gradient| canvas.fill_radial_gradient(&gradient));
            if let Err(err) = painted {
                tracing::trace!(%err, "fallback blob skipped");
            }
        }

        let dot = self.dots.color.scale_alpha(self.dots.opacity);
        let pitch = self.dots.pitch;
        let mut y = pitch * 0.5;
        while y < height {
            let mut x = pitch * 0.5;
            while x < width {
                canvas.fill_circle(Vec2::new(x, y), self.dots.dot_radius, dot);
                x += pitch;
            }
            y += pitch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCall, RecordingCanvas};

    #[test]
    fn test_light_palette() {
        let f = StaticFallback::for_theme(Theme::Light);
        assert!(matches!(f.base, BaseLayer::Gradient(_)));
        assert_eq!(f.blobs[0].color, Rgba::rgba(221, 214, 254, 0.2));
        assert_eq!(f.dots.color, Rgba::rgb(0x7c, 0x3a, 0xed));
    }

    #[test]
    fn test_dark_palette() {
        let f = StaticFallback::for_theme(Theme::Dark);
        assert_eq!(f.base, BaseLayer::Transparent);
        assert_eq!(f.blobs[1].color, Rgba::rgba(59, 130, 246, 0.1));
        assert_eq!(f.dots.color, Rgba::WHITE);
    }

    #[test]
    fn test_css_keyframes() {
        let css = StaticFallback::for_theme(Theme::Light).to_css();
        assert!(css.contains("@keyframes float-slow"));
        assert!(css.contains("translate(20px, 20px)"));
        assert!(css.contains("@keyframes float-reverse"));
        assert!(css.contains("translate(-20px, 10px)"));
    }

    #[test]
    fn test_html_markup() {
        let html = StaticFallback::for_theme(Theme::Light).to_html();
        assert!(html.contains("linear-gradient(to bottom right, #f9fafb, #ffffff, #f3f4f6)"));
        assert!(html.contains("width:300px;height:300px"));
        assert!(html.contains("float-reverse 10s ease-in-out infinite"));
        assert!(html.contains("filter:blur(80px)"));
        assert!(html.contains("radial-gradient(#7c3aed 1px, transparent 1px)"));
        assert!(html.contains("background-size:30px 30px"));
        assert!(html.ends_with("</div>"));
    }

    #[test]
    fn test_html_embeds_keyframes_once() {
        let f = StaticFallback::for_theme(Theme::Dark);
        let css = f.to_css();
        assert_eq!(css.lines().count(), 2);
        assert!(css.ends_with("}\n"));

        let html = f.to_html();
        assert_eq!(html.matches(&format!("<style>{css}</style>")).count(), 1);
        assert!(html.contains("background:transparent"));
        assert_eq!(html.matches("border-radius:9999px").count(), 2);
    }

    #[test]
    fn test_blob_centers() {
        let f = StaticFallback::for_theme(Theme::Dark);
        assert_eq!(f.blobs[0].center(400.0, 800.0), Vec2::new(250.0, 150.0));
        assert_eq!(f.blobs[1].center(400.0, 800.0), Vec2::new(125.0, 675.0));
    }

    #[test]
    fn test_paint_once() {
        let f = StaticFallback::for_theme(Theme::Dark);
        let mut canvas = RecordingCanvas::new();
        f.paint(&mut canvas, 300.0, 600.0, 2.0);

        assert_eq!(canvas.backing_size(), (600, 1200));
        assert_eq!(canvas.calls()[2], DrawCall::ClearRect(Rect::sized(300.0, 600.0)));
        assert_eq!(canvas.gradients().count(), 2);
        assert_eq!(canvas.circles().count(), 10 * 20);
    }
}
