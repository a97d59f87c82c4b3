use std::collections::BTreeSet;

use egui::Pos2;

use crate::annotation::BoxAnnot;
use crate::hit::{classify, Corner, Hit};
use crate::layout::Layout;

/// Smallest draw span kept at commit, in image pixels. Anything under this
/// is an accidental click, not a box.
pub const MIN_DRAW_EXTENT: i32 = 2;

/// In-progress pointer gesture. At most one session is live at a time;
/// move/resize keep pre-drag snapshots so every frame is recomputed from the
/// drag origin instead of accumulating rounded deltas.
#[derive(Clone, Debug)]
enum DragSession {
    Draw {
        anchor: Pos2,
    },
    Move {
        anchor: Pos2,
        snapshot: Vec<(usize, BoxAnnot)>,
    },
    Resize {
        anchor: Pos2,
        index: usize,
        corner: Corner,
        snapshot: BoxAnnot,
    },
}

/// What the overlay surface shows this frame. The variants are mutually
/// exclusive; the surface is cleared before each repaint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlay {
    None,
    /// Dashed rectangle between the draw anchor and the pointer.
    Preview { from: Pos2, to: Pos2 },
    /// Class name of the hovered box.
    HoverLabel { index: usize },
    /// Crosshair plus image-space coordinate readout on empty canvas.
    Crosshair { at: Pos2 },
}

/// A gesture just mutated the box list; the caller hands the updated list to
/// the persistence collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commit {
    Draw,
    Move,
    Resize,
    Delete,
}

/// Box store and interaction state for the currently open image.
pub struct Editor {
    pub boxes: Vec<BoxAnnot>,
    pub selection: BTreeSet<usize>,
    pub active_class: i32,
    session: Option<DragSession>,
    hover: Option<Hit>,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            boxes: Vec::new(),
            selection: BTreeSet::new(),
            active_class: 0,
            session: None,
            hover: None,
        }
    }

    /// Replace the box list wholesale for a newly opened image. Discards any
    /// live drag session before the new list is visible so a stale gesture
    /// can never touch the wrong image's boxes.
    pub fn open_image(&mut self, boxes: Vec<BoxAnnot>) {
        self.session = None;
        self.hover = None;
        self.selection.clear();
        self.boxes = boxes;
    }

    pub fn hover(&self) -> Option<Hit> {
        self.hover
    }

    pub fn dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn pointer_down(&mut self, p: Pos2, layout: &Layout, extend: bool) {
        if self.session.is_some() {
            // a second button press mid-gesture is not a supported input
            return;
        }
        match classify(p, &self.boxes, layout) {
            Some(Hit {
                index,
                corner: Some(corner),
                ..
            }) => {
                self.selection = BTreeSet::from([index]);
                self.session = Some(DragSession::Resize {
                    anchor: p,
                    index,
                    corner,
                    snapshot: self.boxes[index],
                });
            }
            Some(Hit { index, .. }) => {
                // edge vs body only changes the cursor hint; both start a move
                if extend {
                    self.selection.insert(index);
                } else if !self.selection.contains(&index) {
                    self.selection = BTreeSet::from([index]);
                }
                let snapshot = self
                    .selection
                    .iter()
                    .map(|&i| (i, self.boxes[i]))
                    .collect();
                self.session = Some(DragSession::Move { anchor: p, snapshot });
            }
            None => {
                self.session = Some(DragSession::Draw { anchor: p });
            }
        }
    }

    pub fn pointer_move(&mut self, p: Pos2, layout: &Layout) {
        self.hover = classify(p, &self.boxes, layout);
        match &self.session {
            Some(DragSession::Move { anchor, snapshot }) => {
                let dx = (p.x - anchor.x) / layout.scale;
                let dy = (p.y - anchor.y) / layout.scale;
                for &(i, snap) in snapshot {
                    if let Some(b) = self.boxes.get_mut(i) {
                        b.x = (snap.x as f32 + dx).round() as i32;
                        b.y = (snap.y as f32 + dy).round() as i32;
                    }
                }
            }
            Some(DragSession::Resize {
                anchor,
                index,
                corner,
                snapshot,
            }) => {
                let dx = (p.x - anchor.x) / layout.scale;
                let dy = (p.y - anchor.y) / layout.scale;
                let resized = resize_from(*snapshot, *corner, dx, dy);
                if let Some(b) = self.boxes.get_mut(*index) {
                    *b = resized;
                }
            }
            Some(DragSession::Draw { .. }) | None => {}
        }
    }

    /// Commit the live gesture. Returns what was committed, if anything, so
    /// the caller can trigger persistence.
    pub fn pointer_up(&mut self, p: Pos2, layout: &Layout) -> Option<Commit> {
        match self.session.take()? {
            DragSession::Draw { anchor } => {
                let b = BoxAnnot::from_corners(
                    self.active_class,
                    layout.to_image(anchor),
                    layout.to_image(p),
                );
                if b.width < MIN_DRAW_EXTENT || b.height < MIN_DRAW_EXTENT {
                    return None;
                }
                self.boxes.push(b);
                self.selection = BTreeSet::from([self.boxes.len() - 1]);
                Some(Commit::Draw)
            }
            DragSession::Move { .. } => Some(Commit::Move),
            DragSession::Resize { index, .. } => {
                // extents may have gone negative mid-drag; fold them now
                if let Some(b) = self.boxes.get_mut(index) {
                    *b = b.normalized();
                }
                Some(Commit::Resize)
            }
        }
    }

    /// Pointer left the surface without a release: discard the session and
    /// restore snapshotted geometry, leaving the store as it was at
    /// pointer-down.
    pub fn pointer_leave(&mut self) {
        self.hover = None;
        match self.session.take() {
            Some(DragSession::Move { snapshot, .. }) => {
                for (i, snap) in snapshot {
                    if let Some(b) = self.boxes.get_mut(i) {
                        *b = snap;
                    }
                }
            }
            Some(DragSession::Resize {
                index, snapshot, ..
            }) => {
                if let Some(b) = self.boxes.get_mut(index) {
                    *b = snapshot;
                }
            }
            Some(DragSession::Draw { .. }) | None => {}
        }
    }

    pub fn delete_box(&mut self, index: usize) -> Option<Commit> {
        if index >= self.boxes.len() {
            return None;
        }
        self.session = None;
        self.boxes.remove(index);
        self.selection.clear();
        self.hover = None;
        Some(Commit::Delete)
    }

    pub fn select_only(&mut self, index: usize) {
        if index < self.boxes.len() {
            self.selection = BTreeSet::from([index]);
        }
    }

    /// Decide this frame's overlay content. Exactly one thing is shown:
    /// the draw preview while drawing, the hovered box's label, or the
    /// crosshair readout over empty canvas. Move/resize gestures show none.
    pub fn overlay(&self, pointer: Option<Pos2>) -> Overlay {
        let Some(p) = pointer else {
            return Overlay::None;
        };
        match &self.session {
            Some(DragSession::Draw { anchor }) => Overlay::Preview {
                from: *anchor,
                to: p,
            },
            Some(_) => Overlay::None,
            None => match self.hover {
                Some(hit) => Overlay::HoverLabel { index: hit.index },
                None => Overlay::Crosshair { at: p },
            },
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

/// New geometry for a corner drag: each corner adjusts its two adjacent
/// edges; the opposite corner stays put. Width/height are not clamped here.
fn resize_from(snap: BoxAnnot, corner: Corner, dx: f32, dy: f32) -> BoxAnnot {
    let (sx, sy, sw, sh) = (
        snap.x as f32,
        snap.y as f32,
        snap.width as f32,
        snap.height as f32,
    );
    let mut b = snap;
    match corner {
        Corner::TopLeft => {
            b.x = (sx + dx).round() as i32;
            b.y = (sy + dy).round() as i32;
            b.width = (sw - dx).round() as i32;
            b.height = (sh - dy).round() as i32;
        }
        Corner::TopRight => {
            b.y = (sy + dy).round() as i32;
            b.width = (sw + dx).round() as i32;
            b.height = (sh - dy).round() as i32;
        }
        Corner::BottomLeft => {
            b.x = (sx + dx).round() as i32;
            b.width = (sw - dx).round() as i32;
            b.height = (sh + dy).round() as i32;
        }
        Corner::BottomRight => {
            b.width = (sw + dx).round() as i32;
            b.height = (sh + dy).round() as i32;
        }
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn layout_400() -> Layout {
        // 800x600 image on a 400x400 surface: scale 0.5, offsets (0, 50)
        Layout::compute(vec2(400.0, 400.0), (800, 600))
    }

    fn disp(l: &Layout, x: i32, y: i32) -> Pos2 {
        pos2(
            l.offset_x + x as f32 * l.scale,
            l.offset_y + y as f32 * l.scale,
        )
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
    fn draw_commits_normalized_box_with_active_class() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.active_class = 5;

        ed.pointer_down(pos2(50.0, 100.0), &layout, false);
        ed.pointer_move(pos2(150.0, 150.0), &layout);
        let commit = ed.pointer_up(pos2(150.0, 150.0), &layout);

        assert_eq!(commit, Some(Commit::Draw));
        assert_eq!(ed.boxes, vec![BoxAnnot {
            class_id: 5,
            x: 100,
            y: 100,
            width: 200,
            height: 100,
        }]);
        assert_eq!(ed.selection, BTreeSet::from([0]));
    }

    #[test]
    fn tiny_draw_is_discarded() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.pointer_down(pos2(50.0, 100.0), &layout, false);
        let commit = ed.pointer_up(pos2(50.4, 100.4), &layout);
        assert_eq!(commit, None);
        assert!(ed.boxes.is_empty());
        assert!(ed.selection.is_empty());
    }

    #[test]
    fn draw_preview_is_shown_while_dragging() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.pointer_down(pos2(50.0, 100.0), &layout, false);
        ed.pointer_move(pos2(90.0, 130.0), &layout);
        assert_eq!(
            ed.overlay(Some(pos2(90.0, 130.0))),
            Overlay::Preview {
                from: pos2(50.0, 100.0),
                to: pos2(90.0, 130.0),
            }
        );
        // no store mutation before commit
        assert!(ed.boxes.is_empty());
    }

    #[test]
    fn body_press_single_selects_and_moves() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 200, 100), boxed(600, 400, 100, 100)]);

        ed.pointer_down(disp(&layout, 200, 150), &layout, false);
        assert_eq!(ed.selection, BTreeSet::from([0]));

        // drag 40 display px right, 20 down => 80, 40 image px
        ed.pointer_move(pos2(disp(&layout, 200, 150).x + 40.0, disp(&layout, 200, 150).y + 20.0), &layout);
        assert_eq!(ed.boxes[0], boxed(180, 140, 200, 100));
        assert_eq!(ed.boxes[1], boxed(600, 400, 100, 100));
        assert_eq!(ed.pointer_up(pos2(0.0, 0.0), &layout), Some(Commit::Move));
    }

    #[test]
    fn multi_selection_moves_together_and_preserves_offsets() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![
            boxed(100, 100, 100, 100),
            boxed(300, 200, 100, 100),
            boxed(600, 400, 100, 100),
        ]);

        // grow the selection with modifier-clicks on box centers, in place
        ed.pointer_down(disp(&layout, 150, 150), &layout, false);
        ed.pointer_up(disp(&layout, 150, 150), &layout);
        ed.pointer_down(disp(&layout, 350, 250), &layout, true);
        assert_eq!(ed.selection, BTreeSet::from([0, 1]));

        // still inside the second box: the whole selection moves
        let start = disp(&layout, 350, 250);
        ed.pointer_move(pos2(start.x + 15.0, start.y + 5.0), &layout);
        assert_eq!(ed.boxes[0], boxed(130, 110, 100, 100));
        assert_eq!(ed.boxes[1], boxed(330, 210, 100, 100));
        assert_eq!(ed.boxes[2], boxed(600, 400, 100, 100));
    }

    #[test]
    fn press_on_already_selected_box_keeps_selection() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 100, 100), boxed(300, 200, 100, 100)]);
        ed.pointer_down(disp(&layout, 150, 150), &layout, false);
        ed.pointer_up(disp(&layout, 150, 150), &layout);
        ed.pointer_down(disp(&layout, 350, 250), &layout, true);
        ed.pointer_up(disp(&layout, 350, 250), &layout);

        // plain press on a member of the multi-selection keeps all of it
        ed.pointer_down(disp(&layout, 150, 150), &layout, false);
        assert_eq!(ed.selection, BTreeSet::from([0, 1]));
    }

    #[test]
    fn corner_press_starts_resize_and_commit_normalizes() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 100, 100)]);

        // bottom-right corner, then drag far past the top-left corner
        ed.pointer_down(disp(&layout, 200, 200), &layout, false);
        assert_eq!(ed.selection, BTreeSet::from([0]));
        ed.pointer_move(disp(&layout, 40, 60), &layout);
        // transiently negative extents are kept during the drag
        assert_eq!(ed.boxes[0], boxed(100, 100, -60, -40));

        assert_eq!(
            ed.pointer_up(disp(&layout, 40, 60), &layout),
            Some(Commit::Resize)
        );
        assert_eq!(ed.boxes[0], boxed(40, 60, 60, 40));
    }

    #[test]
    fn top_left_resize_moves_origin_and_extent_oppositely() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 100, 100)]);

        ed.pointer_down(disp(&layout, 100, 100), &layout, false);
        ed.pointer_move(disp(&layout, 80, 90), &layout);
        assert_eq!(ed.boxes[0], boxed(80, 90, 120, 110));
        ed.pointer_up(disp(&layout, 80, 90), &layout);
        assert_eq!(ed.boxes[0], boxed(80, 90, 120, 110));
    }

    #[test]
    fn leave_mid_move_rolls_back() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 100, 100)]);
        let start = disp(&layout, 150, 150);
        ed.pointer_down(start, &layout, false);
        ed.pointer_move(pos2(start.x + 30.0, start.y + 30.0), &layout);
        assert_ne!(ed.boxes[0], boxed(100, 100, 100, 100));

        ed.pointer_leave();
        assert_eq!(ed.boxes[0], boxed(100, 100, 100, 100));
        // session is gone: a later release commits nothing
        assert_eq!(ed.pointer_up(start, &layout), None);
    }

    #[test]
    fn leave_mid_draw_discards_preview() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.pointer_down(pos2(50.0, 100.0), &layout, false);
        ed.pointer_leave();
        assert_eq!(ed.overlay(Some(pos2(60.0, 110.0))), Overlay::Crosshair {
            at: pos2(60.0, 110.0)
        });
        assert_eq!(ed.pointer_up(pos2(150.0, 150.0), &layout), None);
        assert!(ed.boxes.is_empty());
    }

    #[test]
    fn second_press_mid_session_is_ignored() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 100, 100)]);
        ed.pointer_down(disp(&layout, 150, 150), &layout, false);
        // a second press lands on empty canvas; the move session survives
        ed.pointer_down(pos2(390.0, 390.0), &layout, false);
        assert_eq!(
            ed.pointer_up(disp(&layout, 150, 150), &layout),
            Some(Commit::Move)
        );
    }

    #[test]
    fn delete_shifts_later_indices_and_clears_selection() {
        let mut ed = Editor::new();
        let (a, b, c) = (boxed(0, 0, 10, 10), boxed(20, 0, 10, 10), boxed(40, 0, 10, 10));
        ed.open_image(vec![a, b, c]);
        ed.select_only(2);

        assert_eq!(ed.delete_box(0), Some(Commit::Delete));
        assert_eq!(ed.boxes, vec![b, c]);
        assert!(ed.selection.is_empty());
        assert_eq!(ed.delete_box(5), None);
    }

    #[test]
    fn open_image_cancels_session_and_selection() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 100, 100)]);
        ed.pointer_down(disp(&layout, 150, 150), &layout, false);

        ed.open_image(vec![boxed(0, 0, 10, 10)]);
        assert!(ed.selection.is_empty());
        assert!(!ed.dragging());
        // the release belongs to the discarded session of the old image
        assert_eq!(ed.pointer_up(disp(&layout, 200, 200), &layout), None);
        assert_eq!(ed.boxes, vec![boxed(0, 0, 10, 10)]);
    }

    #[test]
    fn overlay_label_on_hover_and_crosshair_on_empty() {
        let layout = layout_400();
        let mut ed = Editor::new();
        ed.open_image(vec![boxed(100, 100, 200, 100)]);

        let over_box = disp(&layout, 200, 150);
        ed.pointer_move(over_box, &layout);
        assert_eq!(ed.overlay(Some(over_box)), Overlay::HoverLabel { index: 0 });

        let empty = pos2(390.0, 390.0);
        ed.pointer_move(empty, &layout);
        assert_eq!(ed.overlay(Some(empty)), Overlay::Crosshair { at: empty });
        assert_eq!(ed.overlay(None), Overlay::None);
    }
}
