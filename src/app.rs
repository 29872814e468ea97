use eframe::egui;
use hotspot_edit::{
    load_image, Args, ControlEvent, HotspotResult, JsonFileStore, PointerEvent, RasterSurface,
    Session, ShapeKind, Surface,
};

// ── App ─────────────────────────────────────────────────────────────────────

pub struct HotspotApp {
    session: Session<RasterSurface, JsonFileStore>,
    texture: Option<egui::TextureHandle>,
}

impl HotspotApp {
    pub fn new(args: &Args) -> HotspotResult<Self> {
        let surface = RasterSurface::new(args.canvas_width, args.canvas_height)?;
        let store = JsonFileStore::new(&args.store);
        let mut session = Session::new(surface, store);
        session.handle_control(ControlEvent::SelectShape(args.shape));
        session.set_opacity(args.opacity());
        if let Some(path) = &args.image {
            session.begin_load(load_image(path));
        }

        Ok(Self {
            session,
            texture: None,
        })
    }

    /// Upload the surface to the GPU when it changed since the last frame.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let dirty = self.session.surface_mut().take_dirty();
        if !dirty && self.texture.is_some() {
            return;
        }
        let pixmap = self.session.surface().pixmap();
        let size = [pixmap.width() as usize, pixmap.height() as usize];
        let color_image = egui::ColorImage::from_rgba_premultiplied(size, pixmap.data());
        match &mut self.texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("canvas", color_image, egui::TextureOptions::LINEAR));
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open image…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "bmp", "webp"])
                    .pick_file()
                {
                    self.session.begin_load(load_image(path));
                }
            }
            ui.separator();

            if ui.button("Add hotspot").clicked() {
                self.session.handle_control(ControlEvent::AddHotspot);
            }

            let mut kind = self.session.selected_kind();
            egui::ComboBox::from_label("Shape")
                .selected_text(kind.label())
                .show_ui(ui, |ui| {
                    for option in ShapeKind::ALL {
                        ui.selectable_value(&mut kind, option, option.label());
                    }
                });
            if kind != self.session.selected_kind() {
                self.session.handle_control(ControlEvent::SelectShape(kind));
            }
            ui.separator();

            let affordances = self.session.affordances();
            if ui
                .add_enabled(affordances.can_undo, egui::Button::new("Undo"))
                .clicked()
            {
                self.session.handle_control(ControlEvent::Undo);
            }
            if ui
                .add_enabled(affordances.can_redo, egui::Button::new("Redo"))
                .clicked()
            {
                self.session.handle_control(ControlEvent::Redo);
            }
            ui.separator();

            let mut percent = (self.session.opacity() * 100.0).round();
            if ui
                .add(egui::Slider::new(&mut percent, 0.0..=100.0).text("Opacity"))
                .changed()
            {
                self.session.handle_control(ControlEvent::SetOpacity(percent));
            }

            if self.session.is_loading() {
                ui.separator();
                ui.spinner();
            } else if self.session.drawing_enabled() {
                ui.separator();
                ui.label("Drag on the image to place the hotspot");
            }
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        // Keep the surface's aspect ratio inside the available area. The
        // displayed size differs from the pixel size; the session corrects
        // for that when mapping pointer positions.
        let surface_size = self.session.surface().size();
        let fit = (response.rect.width() / surface_size.x).min(response.rect.height() / surface_size.y);
        let canvas_rect = egui::Rect::from_center_size(response.rect.center(), surface_size * fit);

        // egui reports the drag once the pointer has left its click radius;
        // the gesture starts where the button went down.
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(position) = ui
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos())
            {
                self.session.handle_pointer(PointerEvent::Down {
                    position,
                    bounds: canvas_rect,
                });
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(position) = response.interact_pointer_pos() {
                self.session.handle_pointer(PointerEvent::Move {
                    position,
                    bounds: canvas_rect,
                });
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            if let Some(position) = response
                .interact_pointer_pos()
                .or(ui.ctx().input(|i| i.pointer.latest_pos()))
            {
                self.session.handle_pointer(PointerEvent::Up {
                    position,
                    bounds: canvas_rect,
                });
            }
        }

        self.sync_texture(ui.ctx());

        painter.rect_filled(response.rect, 0.0, egui::Color32::from_gray(40));
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                canvas_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        if !self.session.has_image() && !self.session.is_loading() {
            painter.text(
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open an image to start",
                egui::FontId::proportional(18.0),
                egui::Color32::from_gray(160),
            );
        }
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for HotspotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }
}

impl HotspotApp {
    fn ui(&mut self, ctx: &egui::Context) {
        self.session.poll_load();
        if self.session.is_loading() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));
    }
}
