use egui::{vec2, Color32, FontId, Painter, Rect, Shape, Stroke, StrokeKind, Vec2};

use crate::annotation::{label_name, BoxAnnot, Label};
use crate::editor::Overlay;
use crate::hit::{Corner, HANDLE_HALF};
use crate::layout::Layout;

pub const SELECTED_COLOR: Color32 = Color32::from_rgb(0x29, 0xcc, 0xb1);
pub const UNSELECTED_COLOR: Color32 = Color32::from_rgb(0x5b, 0x8c, 0xff);

const LABEL_FONT: f32 = 12.0;
const PILL_HEIGHT: f32 = 18.0;

/// Committed pass: every box stroked with its selection emphasis, plus the
/// four fixed-size corner handles regardless of box size.
pub fn draw_committed(
    painter: &Painter,
    origin: Vec2,
    layout: &Layout,
    boxes: &[BoxAnnot],
    selection: &std::collections::BTreeSet<usize>,
) {
    for (i, b) in boxes.iter().enumerate() {
        let r = layout.to_display(b).translate(origin);
        // a box mid-resize can have inverted extents; stroke the sorted rect
        let rect = Rect::from_two_pos(r.min, r.max);
        let selected = selection.contains(&i);
        let color = if selected { SELECTED_COLOR } else { UNSELECTED_COLOR };
        let width: f32 = if selected { 3.0 } else { 2.0 };
        painter.rect_stroke(rect, 0.0, Stroke::new(width, color), StrokeKind::Middle);
        for (_, cp) in Corner::positions(&rect) {
            painter.rect_filled(
                Rect::from_center_size(cp, Vec2::splat(HANDLE_HALF * 2.0)),
                0.0,
                color,
            );
        }
    }
}

/// Overlay pass: exactly one of dashed draw preview, hover label, or
/// crosshair readout. The painter targets its own foreground layer, so the
/// frame starts from a clean surface.
#[allow(clippy::too_many_arguments)]
pub fn draw_overlay(
    painter: &Painter,
    origin: Vec2,
    surface: Vec2,
    layout: &Layout,
    image_size: (u32, u32),
    overlay: Overlay,
    boxes: &[BoxAnnot],
    labels: &[Label],
) {
    match overlay {
        Overlay::None => {}
        Overlay::Preview { from, to } => {
            let rect = Rect::from_two_pos(from + origin, to + origin);
            let stroke = Stroke::new(2.0, SELECTED_COLOR);
            let corners = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
            ];
            for i in 0..4 {
                let seg = [corners[i], corners[(i + 1) % 4]];
                painter.extend(Shape::dashed_line(&seg, stroke, 6.0, 4.0));
            }
        }
        Overlay::HoverLabel { index } => {
            let Some(b) = boxes.get(index) else { return };
            let rect = layout.to_display(b);
            let name = label_name(labels, b.class_id);
            let galley =
                painter.layout_no_wrap(name, FontId::proportional(LABEL_FONT), Color32::WHITE);
            let pad = 6.0;
            let tw = galley.size().x + pad * 2.0;
            // pill above the box's top-left corner, clamped to the surface
            let bx = rect.min.x.min(surface.x - tw).max(0.0);
            let by = (rect.min.y - PILL_HEIGHT - 6.0).max(0.0);
            let bg = Rect::from_min_size(
                egui::pos2(bx, by) + origin,
                vec2(tw, PILL_HEIGHT),
            );
            painter.rect_filled(bg, 0.0, Color32::from_black_alpha(191));
            painter.galley(
                bg.min + vec2(pad, (PILL_HEIGHT - galley.size().y) / 2.0),
                galley,
                Color32::WHITE,
            );
        }
        Overlay::Crosshair { at } => {
            let stroke = Stroke::new(1.0, Color32::from_white_alpha(128));
            painter.line_segment(
                [
                    egui::pos2(at.x, 0.0) + origin,
                    egui::pos2(at.x, surface.y) + origin,
                ],
                stroke,
            );
            painter.line_segment(
                [
                    egui::pos2(0.0, at.y) + origin,
                    egui::pos2(surface.x, at.y) + origin,
                ],
                stroke,
            );

            let (ix, iy) = layout.to_image(at);
            let galley = painter.layout_no_wrap(
                format!("({ix}, {iy})"),
                FontId::proportional(LABEL_FONT),
                Color32::WHITE,
            );
            let pad = 4.0;
            let margin = 8.0;
            let tw = galley.size().x + pad * 2.0;
            // readout pinned to the bottom-right of the displayed image area
            let right = layout.offset_x + image_size.0.max(1) as f32 * layout.scale;
            let bottom = layout.offset_y + image_size.1.max(1) as f32 * layout.scale;
            let bx = (right - tw - margin)
                .max(0.0)
                .min(surface.x - tw - margin);
            let by = (bottom - PILL_HEIGHT - margin)
                .max(0.0)
                .min(surface.y - PILL_HEIGHT - margin);
            let bg = Rect::from_min_size(egui::pos2(bx, by) + origin, vec2(tw, PILL_HEIGHT));
            painter.rect_filled(bg, 0.0, Color32::from_black_alpha(179));
            painter.galley(
                bg.min + vec2(pad, (PILL_HEIGHT - galley.size().y) / 2.0),
                galley,
                Color32::WHITE,
            );
        }
    }
}
