use std::path::PathBuf;

use eframe::egui;
use egui::{pos2, vec2, Color32, CursorIcon, Rect, Sense, Stroke, StrokeKind};

use crate::annotation::{label_name, thumb_boxes, Label};
use crate::editor::Editor;
use crate::export;
use crate::layout::Layout;
use crate::render;
use crate::store::{AnnotationStore, FsStore, ImageEntry};

/// Checkerboard stand-in for images that fail to decode.
fn placeholder_image() -> egui::ColorImage {
    let (w, h) = (64usize, 64usize);
    let mut img = egui::ColorImage::new([w, h], Color32::BLACK);
    for y in 0..h {
        for x in 0..w {
            let v = if (x / 8 + y / 8) % 2 == 0 { 60 } else { 110 };
            img.pixels[y * w + x] = Color32::from_gray(v);
        }
    }
    img
}

pub struct BoxesApp {
    store: Option<FsStore>,
    images: Vec<ImageEntry>,
    current: Option<usize>,
    editor: Editor,
    labels: Vec<Label>,

    texture: Option<egui::TextureHandle>,
    pending_texture: Option<egui::ColorImage>,
    image_size: (u32, u32),

    new_label: String,
    status: String,
    pointer_inside: bool,
}

impl BoxesApp {
    pub fn new(initial_dir: Option<PathBuf>) -> Self {
        let mut app = Self {
            store: None,
            images: Vec::new(),
            current: None,
            editor: Editor::new(),
            labels: Vec::new(),
            texture: None,
            pending_texture: None,
            image_size: (0, 0),
            new_label: String::new(),
            status: String::new(),
            pointer_inside: false,
        };
        if let Some(dir) = initial_dir {
            app.open_dir(dir);
        }
        app
    }

    fn open_dir(&mut self, dir: PathBuf) {
        let store = FsStore::new(dir);
        self.labels = store.load_labels();
        self.editor.active_class = self.labels.first().map(|l| l.id).unwrap_or(0);
        self.store = Some(store);
        self.current = None;
        self.texture = None;
        self.refresh_images();
        if !self.images.is_empty() {
            self.open_image_at(0);
        }
    }

    fn refresh_images(&mut self) {
        self.images = match self.store.as_ref().map(|s| s.list_images()) {
            Some(Ok(entries)) => entries,
            Some(Err(err)) => {
                log::warn!("failed to list images: {err}");
                Vec::new()
            }
            None => Vec::new(),
        };
    }

    fn open_image_at(&mut self, idx: usize) {
        let (id, path) = match self.images.get(idx) {
            Some(e) => (e.id.clone(), e.path.clone()),
            None => return,
        };
        let (color_image, size) = match image::open(&path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let size = (rgba.width(), rgba.height());
                let dims = [size.0 as usize, size.1 as usize];
                let pixels = rgba.as_flat_samples();
                (
                    egui::ColorImage::from_rgba_unmultiplied(dims, pixels.as_slice()),
                    size,
                )
            }
            Err(err) => {
                log::warn!("failed to decode {}: {err}", path.display());
                let img = placeholder_image();
                let size = (img.width() as u32, img.height() as u32);
                (img, size)
            }
        };
        self.image_size = size;
        self.pending_texture = Some(color_image);
        self.texture = None;

        // the stale drag session (if any) dies before the new list lands
        let boxes = match &self.store {
            Some(store) => store.load_boxes(&id),
            None => Vec::new(),
        };
        self.editor.open_image(boxes);
        self.current = Some(idx);
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(img) = self.pending_texture.take() {
            self.texture = Some(ctx.load_texture("image", img, egui::TextureOptions::LINEAR));
        }
    }

    /// Persist the current box list and refresh the image's thumb boxes.
    fn commit_current(&mut self) {
        let Some(idx) = self.current else { return };
        let Some(id) = self.images.get(idx).map(|e| e.id.clone()) else {
            return;
        };
        if let Some(store) = &self.store {
            store.save_boxes(&id, &self.editor.boxes, self.image_size);
        }
        self.images[idx].thumb_boxes = thumb_boxes(&self.editor.boxes, self.image_size);
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open folder…").clicked() {
                if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                    self.open_dir(dir);
                }
            }
            if ui.button("Refresh").clicked() {
                self.refresh_images();
            }
            ui.separator();

            ui.label("Label:");
            let mut picked: Option<i32> = None;
            egui::ComboBox::from_id_salt("active-label")
                .selected_text(label_name(&self.labels, self.editor.active_class))
                .show_ui(ui, |ui| {
                    for l in &self.labels {
                        if ui
                            .selectable_label(l.id == self.editor.active_class, l.name.as_str())
                            .clicked()
                        {
                            picked = Some(l.id);
                        }
                    }
                });
            if let Some(id) = picked {
                self.editor.active_class = id;
            }

            ui.text_edit_singleline(&mut self.new_label);
            if ui.button("Add label").clicked() && !self.new_label.trim().is_empty() {
                let result = self.store.as_ref().map(|s| s.add_label(&self.new_label));
                match result {
                    Some(Ok(label)) => {
                        if !self.labels.iter().any(|l| l.id == label.id) {
                            self.labels.push(label.clone());
                        }
                        self.editor.active_class = label.id;
                        self.new_label.clear();
                    }
                    Some(Err(err)) => log::warn!("failed to add label: {err}"),
                    None => {}
                }
            }
            ui.separator();

            if ui.button("Export YOLO").clicked() {
                match self.store.as_ref().map(|s| export::export_yolo(s, &self.labels)) {
                    Some(Ok(path)) => self.status = format!("Exported to {}", path.display()),
                    Some(Err(err)) => {
                        log::warn!("export failed: {err}");
                        self.status = "Export failed".into();
                    }
                    None => {}
                }
            }
            ui.separator();
            ui.label(&self.status);
        });
    }

    fn images_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Images");
        let mut clicked: Option<usize> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (i, entry) in self.images.iter().enumerate() {
                let width = ui.available_width().max(60.0);
                let (resp, painter) =
                    ui.allocate_painter(vec2(width, 64.0), Sense::click());
                painter.rect_filled(resp.rect, 2.0, Color32::from_gray(35));
                for tb in &entry.thumb_boxes {
                    let r = Rect::from_min_size(
                        pos2(
                            resp.rect.min.x + tb.x * resp.rect.width(),
                            resp.rect.min.y + tb.y * resp.rect.height(),
                        ),
                        vec2(tb.width * resp.rect.width(), tb.height * resp.rect.height()),
                    );
                    painter.rect_stroke(
                        r,
                        0.0,
                        Stroke::new(1.0, render::SELECTED_COLOR),
                        StrokeKind::Middle,
                    );
                }
                if self.current == Some(i) {
                    painter.rect_stroke(
                        resp.rect,
                        2.0,
                        Stroke::new(1.5, render::UNSELECTED_COLOR),
                        StrokeKind::Middle,
                    );
                }
                if resp.clicked() {
                    clicked = Some(i);
                }
                ui.small(entry.id.as_str());
                ui.add_space(4.0);
            }
        });
        if let Some(i) = clicked {
            self.open_image_at(i);
        }
    }

    fn boxes_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Boxes");
        let mut focus: Option<usize> = None;
        let mut delete: Option<usize> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (i, b) in self.editor.boxes.iter().enumerate() {
                ui.horizontal(|ui| {
                    let text = format!(
                        "#{i} {} | {},{} {}x{}",
                        label_name(&self.labels, b.class_id),
                        b.x,
                        b.y,
                        b.width,
                        b.height
                    );
                    if ui
                        .selectable_label(self.editor.selection.contains(&i), text)
                        .clicked()
                    {
                        focus = Some(i);
                    }
                    if ui.small_button("Delete").clicked() {
                        delete = Some(i);
                    }
                });
            }
        });
        if let Some(i) = focus {
            self.editor.select_only(i);
        }
        if let Some(i) = delete {
            if self.editor.delete_box(i).is_some() {
                self.commit_current();
            }
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let canvas_rect = response.rect;
        painter.rect_filled(canvas_rect, 0.0, Color32::from_gray(40));

        if self.current.is_none() {
            painter.text(
                canvas_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open a folder of images to start annotating",
                egui::FontId::proportional(14.0),
                Color32::from_gray(140),
            );
            return;
        }

        let layout = Layout::compute(canvas_rect.size(), self.image_size);
        let origin = canvas_rect.min.to_vec2();

        if let Some(tex) = &self.texture {
            let img_rect = Rect::from_min_size(
                canvas_rect.min + vec2(layout.offset_x, layout.offset_y),
                vec2(
                    self.image_size.0 as f32 * layout.scale,
                    self.image_size.1 as f32 * layout.scale,
                ),
            );
            painter.image(
                tex.id(),
                img_rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // pointer events, translated into surface space
        let pointer_global = ctx.input(|i| i.pointer.latest_pos());
        let inside = pointer_global.map_or(false, |p| canvas_rect.contains(p));
        let surface_pos = pointer_global.map(|p| (p - canvas_rect.min).to_pos2());

        if inside {
            let pressed = ctx.input(|i| i.pointer.primary_pressed());
            let released = ctx.input(|i| i.pointer.primary_released());
            let extend = ctx.input(|i| i.modifiers.ctrl || i.modifiers.command);
            if let Some(p) = surface_pos {
                if pressed {
                    self.editor.pointer_down(p, &layout, extend);
                }
                self.editor.pointer_move(p, &layout);
                if released && self.editor.pointer_up(p, &layout).is_some() {
                    self.commit_current();
                }
            }

            let icon = match self.editor.hover() {
                Some(hit) => match hit.corner {
                    Some(corner) => corner.cursor(),
                    None => CursorIcon::Move,
                },
                None => CursorIcon::Crosshair,
            };
            ctx.set_cursor_icon(icon);
        } else if self.pointer_inside {
            // left the surface without a release: the session is discarded
            self.editor.pointer_leave();
        }
        self.pointer_inside = inside;

        render::draw_committed(
            &painter,
            origin,
            &layout,
            &self.editor.boxes,
            &self.editor.selection,
        );

        // transient feedback goes on its own foreground layer
        let overlay_painter = egui::Painter::new(
            ctx.clone(),
            egui::LayerId::new(egui::Order::Foreground, egui::Id::new("overlay-surface")),
            canvas_rect,
        );
        let overlay = self.editor.overlay(if inside { surface_pos } else { None });
        render::draw_overlay(
            &overlay_painter,
            origin,
            canvas_rect.size(),
            &layout,
            self.image_size,
            overlay,
            &self.editor.boxes,
            &self.labels,
        );
    }
}

impl eframe::App for BoxesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::SidePanel::left("images")
            .default_width(160.0)
            .show(ctx, |ui| self.images_panel(ui));
        egui::SidePanel::right("boxes")
            .default_width(230.0)
            .show(ctx, |ui| self.boxes_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui, ctx));
    }
}
