use egui::{pos2, vec2, Pos2, Rect, Vec2};

use crate::annotation::BoxAnnot;

/// Mapping between image-pixel space and the display surface.
///
/// The image is fit inside the surface and centered; this is the single
/// source of truth for every coordinate conversion, recomputed whenever the
/// surface is resized or another image is opened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layout {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Layout {
    pub fn compute(surface: Vec2, image_size: (u32, u32)) -> Self {
        let iw = image_size.0.max(1) as f32;
        let ih = image_size.1.max(1) as f32;
        // scale stays strictly positive even for a collapsed surface
        let scale = (surface.x / iw).min(surface.y / ih).max(1e-6);
        Self {
            scale,
            offset_x: (surface.x - iw * scale) / 2.0,
            offset_y: (surface.y - ih * scale) / 2.0,
        }
    }

    /// Display-space rectangle of an image-space box.
    pub fn to_display(&self, b: &BoxAnnot) -> Rect {
        Rect::from_min_size(
            pos2(
                self.offset_x + b.x as f32 * self.scale,
                self.offset_y + b.y as f32 * self.scale,
            ),
            vec2(b.width as f32 * self.scale, b.height as f32 * self.scale),
        )
    }

    /// Nearest image pixel under a display-space point. Only an approximate
    /// inverse of `to_display` because of the rounding.
    pub fn to_image(&self, p: Pos2) -> (i32, i32) {
        (
            ((p.x - self.offset_x) / self.scale).round() as i32,
            ((p.y - self.offset_y) / self.scale).round() as i32,
        )
    }
}
