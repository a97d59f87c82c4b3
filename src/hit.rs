use egui::{CursorIcon, Pos2, Rect};

use crate::annotation::BoxAnnot;
use crate::layout::Layout;

/// Drawn half-size of a corner handle square, in display pixels.
pub const HANDLE_HALF: f32 = 6.0;
/// Half-width of the square zone that grabs a corner handle. Display pixels,
/// independent of zoom.
pub const HANDLE_GRAB: f32 = HANDLE_HALF * 2.0;
/// Half-width of the band around each box edge that reads as "on edge".
pub const EDGE_BAND: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn positions(rect: &Rect) -> [(Corner, Pos2); 4] {
        [
            (Corner::TopLeft, rect.left_top()),
            (Corner::TopRight, rect.right_top()),
            (Corner::BottomLeft, rect.left_bottom()),
            (Corner::BottomRight, rect.right_bottom()),
        ]
    }

    pub fn cursor(self) -> CursorIcon {
        match self {
            Corner::TopLeft | Corner::BottomRight => CursorIcon::ResizeNwSe,
            Corner::TopRight | Corner::BottomLeft => CursorIcon::ResizeNeSw,
        }
    }
}

/// What the pointer is over: a box body, one of its corner handles, or its
/// edge band. `None` means empty canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub index: usize,
    pub corner: Option<Corner>,
    pub on_edge: bool,
}

/// Classify a display-space point against the box list.
///
/// The topmost containing box wins (last drawn is topmost), then within that
/// box corner handles take priority over the edge band, which only refines
/// the cursor hint.
pub fn classify(p: Pos2, boxes: &[BoxAnnot], layout: &Layout) -> Option<Hit> {
    let index = topmost_at(p, boxes, layout)?;
    let rect = layout.to_display(&boxes[index]);
    if let Some(corner) = corner_at(&rect, p) {
        return Some(Hit {
            index,
            corner: Some(corner),
            on_edge: false,
        });
    }
    Some(Hit {
        index,
        corner: None,
        on_edge: edge_at(&rect, p),
    })
}

fn topmost_at(p: Pos2, boxes: &[BoxAnnot], layout: &Layout) -> Option<usize> {
    for (i, b) in boxes.iter().enumerate().rev() {
        let r = layout.to_display(b);
        if p.x >= r.min.x && p.x <= r.max.x && p.y >= r.min.y && p.y <= r.max.y {
            return Some(i);
        }
    }
    None
}

fn corner_at(rect: &Rect, p: Pos2) -> Option<Corner> {
    Corner::positions(rect)
        .into_iter()
        .find(|(_, cp)| (p.x - cp.x).abs() <= HANDLE_GRAB && (p.y - cp.y).abs() <= HANDLE_GRAB)
        .map(|(corner, _)| corner)
}

fn edge_at(rect: &Rect, p: Pos2) -> bool {
    let t = EDGE_BAND;
    let on_x = p.x >= rect.min.x - t && p.x <= rect.max.x + t;
    let on_y = p.y >= rect.min.y - t && p.y <= rect.max.y + t;
    if !on_x || !on_y {
        return false;
    }
    (p.x - rect.min.x).abs() <= t
        || (p.x - rect.max.x).abs() <= t
        || (p.y - rect.min.y).abs() <= t
        || (p.y - rect.max.y).abs() <= t
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn ident_layout() -> Layout {
        Layout::compute(vec2(800.0, 600.0), (800, 600))
    }

    fn boxed(x: i32, y: i32, w: i32, h: i32) -> BoxAnnot {
        BoxAnnot {
            class_id: 0,
            x,
            y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn topmost_box_wins_on_overlap() {
        let layout = ident_layout();
        let boxes = vec![boxed(100, 100, 200, 200), boxed(150, 150, 200, 200)];
        let hit = classify(pos2(200.0, 200.0), &boxes, &layout).unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn corner_beats_edge_and_body() {
        let layout = ident_layout();
        let boxes = vec![boxed(100, 100, 100, 100)];
        // bottom-right corner zone also lies inside the bottom edge band
        let hit = classify(pos2(195.0, 195.0), &boxes, &layout).unwrap();
        assert_eq!(hit.corner, Some(Corner::BottomRight));
        assert!(!hit.on_edge);
    }

    #[test]
    fn corner_beats_other_boxes_edge_band_regardless_of_z_order() {
        let layout = ident_layout();
        // box 1 sits above box 0 in z-order; its left edge band overhangs
        // box 0's bottom-right corner without containing the point
        let boxes = vec![boxed(100, 100, 50, 50), boxed(152, 100, 50, 50)];
        let hit = classify(pos2(149.0, 149.0), &boxes, &layout).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.corner, Some(Corner::BottomRight));
    }

    #[test]
    fn edge_band_reported_for_cursor_hint() {
        let layout = ident_layout();
        let boxes = vec![boxed(100, 100, 200, 200)];
        let hit = classify(pos2(102.0, 200.0), &boxes, &layout).unwrap();
        assert_eq!(hit.corner, None);
        assert!(hit.on_edge);
    }

    #[test]
    fn body_hit_is_neither_corner_nor_edge() {
        let layout = ident_layout();
        let boxes = vec![boxed(100, 100, 200, 200)];
        let hit = classify(pos2(200.0, 200.0), &boxes, &layout).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.corner, None);
        assert!(!hit.on_edge);
    }

    #[test]
    fn empty_canvas_reports_nothing() {
        let layout = ident_layout();
        let boxes = vec![boxed(100, 100, 50, 50)];
        assert_eq!(classify(pos2(400.0, 400.0), &boxes, &layout), None);
    }

    #[test]
    fn grab_zone_is_fixed_in_display_pixels() {
        // at half scale the grab zone still spans 12 display px
        let layout = Layout::compute(vec2(400.0, 300.0), (800, 600));
        assert_eq!(layout.scale, 0.5);
        let boxes = vec![boxed(200, 200, 200, 200)];
        // display corner at (100+offset, 100+offset); 10 px away still grabs
        let r = layout.to_display(&boxes[0]);
        let p = pos2(r.min.x + 10.0, r.min.y + 10.0);
        let hit = classify(p, &boxes, &layout).unwrap();
        assert_eq!(hit.corner, Some(Corner::TopLeft));
    }
}
