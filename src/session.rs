//! The editing session: owns the drawing surface, the active shape list and
//! its history, and turns pointer gestures and toolbar events into shapes.

use egui::{Pos2, Rect};

use crate::error::{HotspotError, HotspotResult};
use crate::geometry::{client_to_canvas, Placement};
use crate::history::History;
use crate::loader::{DecodedImage, PendingImage};
use crate::render::{render_scene, Style};
use crate::shape::{Shape, ShapeKind};
use crate::store::ShapeStore;
use crate::surface::Surface;

/// Pointer input on the canvas. `position` is in layout coordinates and
/// `bounds` is where the canvas is displayed in those same coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { position: Pos2, bounds: Rect },
    Move { position: Pos2, bounds: Rect },
    Up { position: Pos2, bounds: Rect },
}

/// Toolbar input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlEvent {
    AddHotspot,
    SelectShape(ShapeKind),
    /// Slider value, 0 to 100.
    SetOpacity(f32),
    Undo,
    Redo,
}

/// Which history buttons should be enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affordances {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    /// "Add hotspot" was pressed; the next pointer press starts a shape.
    Armed,
    Drawing { start: Pos2 },
}

pub struct Session<S, T> {
    surface: S,
    store: T,
    image: Option<DecodedImage>,
    pending: Option<PendingImage>,
    placement: Option<Placement>,
    history: History,
    shapes: Vec<Shape>,
    gesture: Gesture,
    selected: ShapeKind,
    opacity: f32,
}

impl<S: Surface, T: ShapeStore> Session<S, T> {
    pub fn new(surface: S, store: T) -> Self {
        Self {
            surface,
            store,
            image: None,
            pending: None,
            placement: None,
            history: History::new(),
            shapes: Vec::new(),
            gesture: Gesture::Idle,
            selected: ShapeKind::default(),
            opacity: 1.0,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn selected_kind(&self) -> ShapeKind {
        self.selected
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// True from "Add hotspot" until the shape is committed.
    pub fn drawing_enabled(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    pub fn gesture_in_progress(&self) -> bool {
        matches!(self.gesture, Gesture::Drawing { .. })
    }

    pub fn affordances(&self) -> Affordances {
        Affordances {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    // ── Image ───────────────────────────────────────────────────────────────

    /// Track a background decode, replacing any earlier one.
    pub fn begin_load(&mut self, pending: PendingImage) {
        log::info!("loading {}", pending.path().display());
        self.pending = Some(pending);
    }

    /// Install the tracked image if its decode finished. Returns whether a new
    /// image was installed.
    pub fn poll_load(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let Some(result) = pending.try_take() else {
            return false;
        };
        let path = pending.path().to_path_buf();
        self.pending = None;
        match result {
            Ok(image) => {
                log::info!(
                    "loaded {} ({}x{})",
                    path.display(),
                    image.width(),
                    image.height()
                );
                self.set_image(image);
                true
            }
            Err(err) => {
                log::error!("could not load {}: {err}", path.display());
                false
            }
        }
    }

    pub fn set_image(&mut self, image: DecodedImage) {
        self.image = Some(image);
        self.repaint(None);
    }

    // ── Events ──────────────────────────────────────────────────────────────

    pub fn handle_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::AddHotspot => self.enable_drawing(),
            ControlEvent::SelectShape(kind) => self.selected = kind,
            ControlEvent::SetOpacity(percent) => self.set_opacity(percent / 100.0),
            ControlEvent::Undo => self.undo(),
            ControlEvent::Redo => self.redo(),
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, bounds } => self.start_drawing(position, bounds),
            PointerEvent::Move { position, bounds } => self.draw(position, bounds),
            PointerEvent::Up { position, bounds } => self.stop_drawing(position, bounds),
        }
    }

    pub fn enable_drawing(&mut self) {
        if self.gesture == Gesture::Idle {
            self.gesture = Gesture::Armed;
        }
    }

    /// Set the fill opacity (clamped to `[0, 1]`) and repaint.
    pub fn set_opacity(&mut self, opacity: f32) {
        if opacity.is_nan() {
            return;
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        self.repaint(None);
    }

    pub fn undo(&mut self) {
        match self.history.undo() {
            Some(snapshot) => {
                self.shapes = snapshot.to_vec();
                log::info!("undo: {} shape(s)", self.shapes.len());
                self.repaint(None);
                self.persist();
            }
            None => log::debug!("undo ignored: {}", HotspotError::HistoryBoundary),
        }
    }

    pub fn redo(&mut self) {
        match self.history.redo() {
            Some(snapshot) => {
                self.shapes = snapshot.to_vec();
                log::info!("redo: {} shape(s)", self.shapes.len());
                self.repaint(None);
                self.persist();
            }
            None => log::debug!("redo ignored: {}", HotspotError::HistoryBoundary),
        }
    }

    fn start_drawing(&mut self, position: Pos2, bounds: Rect) {
        if !self.drawing_enabled() {
            return;
        }
        match self.image_point(position, bounds) {
            Ok(start) => {
                log::debug!("gesture started at {start:?}");
                self.gesture = Gesture::Drawing { start };
            }
            Err(err) => log::debug!("pointer down ignored: {err}"),
        }
    }

    fn draw(&mut self, position: Pos2, bounds: Rect) {
        let Gesture::Drawing { start } = self.gesture else {
            return;
        };
        match self.image_point(position, bounds) {
            Ok(end) => {
                let provisional =
                    Shape::from_gesture(self.selected, start, end, self.shapes.len() + 1);
                self.repaint(Some(&provisional));
            }
            Err(err) => log::debug!("pointer move ignored: {err}"),
        }
    }

    fn stop_drawing(&mut self, position: Pos2, bounds: Rect) {
        let Gesture::Drawing { start } = self.gesture else {
            return;
        };
        let end = match self.image_point(position, bounds) {
            Ok(end) => end,
            Err(err) => {
                // The gesture is lost; wait for a fresh press.
                log::warn!("gesture dropped: {err}");
                self.gesture = Gesture::Armed;
                self.repaint(None);
                return;
            }
        };

        let shape = Shape::from_gesture(self.selected, start, end, self.shapes.len() + 1);
        let mut next = self.shapes.clone();
        next.push(shape);
        self.shapes = self.history.commit(next).to_vec();
        log::info!("added {} #{}", shape.kind, self.shapes.len());

        self.gesture = Gesture::Idle;
        self.repaint(None);
        self.persist();
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn image_point(&self, position: Pos2, bounds: Rect) -> HotspotResult<Pos2> {
        let placement = self.placement.ok_or(HotspotError::NoActiveImage)?;
        let canvas = client_to_canvas(position, bounds, self.surface.size())?;
        Ok(placement.screen_to_image(canvas))
    }

    /// Redraw the image, the committed shapes and `provisional`.
    fn repaint(&mut self, provisional: Option<&Shape>) {
        let Some(image) = self.image.as_ref() else {
            log::debug!("repaint skipped: {}", HotspotError::NoActiveImage);
            return;
        };
        let style = Style::with_opacity(self.opacity);
        match render_scene(&mut self.surface, image, &self.shapes, provisional, &style) {
            Ok(placement) => self.placement = Some(placement),
            Err(err) => {
                log::warn!("repaint skipped: {err}");
                self.placement = None;
            }
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.shapes) {
            Ok(()) => {
                log::info!("shapes saved: {}", self.shapes.len());
                for shape in &self.shapes {
                    log::debug!("{shape:?}");
                }
            }
            Err(err) => log::error!("failed to save shapes: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::surface::RasterSurface;
    use egui::{pos2, vec2};

    fn session() -> Session<RasterSurface, MemoryStore> {
        let mut session = Session::new(RasterSurface::new(400, 300).unwrap(), MemoryStore::new());
        session.set_image(DecodedImage::from_rgba(image::RgbaImage::new(800, 300)));
        session
    }

    fn bounds() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(400.0, 300.0))
    }

    fn gesture(session: &mut Session<RasterSurface, MemoryStore>, from: Pos2, to: Pos2) {
        session.handle_control(ControlEvent::AddHotspot);
        session.handle_pointer(PointerEvent::Down {
            position: from,
            bounds: bounds(),
        });
        session.handle_pointer(PointerEvent::Move {
            position: to,
            bounds: bounds(),
        });
        session.handle_pointer(PointerEvent::Up {
            position: to,
            bounds: bounds(),
        });
    }

    #[test]
    fn gestures_are_ignored_until_armed() {
        let mut session = session();
        session.handle_pointer(PointerEvent::Down {
            position: pos2(100.0, 100.0),
            bounds: bounds(),
        });
        assert!(!session.gesture_in_progress());
        session.handle_pointer(PointerEvent::Up {
            position: pos2(200.0, 150.0),
            bounds: bounds(),
        });
        assert!(session.shapes().is_empty());
        assert!(session.store().saves().is_empty());
    }

    #[test]
    fn gesture_commits_in_image_space() {
        let mut session = session();
        gesture(&mut session, pos2(100.0, 100.0), pos2(200.0, 150.0));

        let shape = session.shapes()[0];
        assert!((shape.start() - pos2(200.0, 50.0)).length() < 1e-3);
        assert!((shape.end() - pos2(400.0, 150.0)).length() < 1e-3);
        assert_eq!(shape.index, 1);
        assert!(!session.drawing_enabled());
        assert!(!session.gesture_in_progress());
        assert_eq!(session.store().saves().len(), 1);
    }

    #[test]
    fn move_does_not_commit_or_persist() {
        let mut session = session();
        session.handle_control(ControlEvent::AddHotspot);
        session.handle_pointer(PointerEvent::Down {
            position: pos2(100.0, 100.0),
            bounds: bounds(),
        });
        session.handle_pointer(PointerEvent::Move {
            position: pos2(200.0, 150.0),
            bounds: bounds(),
        });
        assert!(session.gesture_in_progress());
        assert!(session.shapes().is_empty());
        assert_eq!(session.history().pointer(), 0);
        assert!(session.store().saves().is_empty());
    }

    #[test]
    fn no_image_means_no_gesture() {
        let mut session = Session::new(RasterSurface::new(400, 300).unwrap(), MemoryStore::new());
        session.handle_control(ControlEvent::AddHotspot);
        session.handle_pointer(PointerEvent::Down {
            position: pos2(10.0, 10.0),
            bounds: bounds(),
        });
        assert!(session.drawing_enabled());
        assert!(!session.gesture_in_progress());
        assert!(session.placement().is_none());
    }

    #[test]
    fn unmappable_release_drops_the_gesture() {
        let mut session = session();
        session.handle_control(ControlEvent::AddHotspot);
        session.handle_pointer(PointerEvent::Down {
            position: pos2(100.0, 100.0),
            bounds: bounds(),
        });
        session.handle_pointer(PointerEvent::Up {
            position: pos2(200.0, 150.0),
            bounds: Rect::from_min_size(Pos2::ZERO, vec2(0.0, 300.0)),
        });
        assert!(!session.gesture_in_progress());
        assert!(session.drawing_enabled());

        // A later release without a new press commits nothing.
        session.handle_pointer(PointerEvent::Up {
            position: pos2(200.0, 150.0),
            bounds: bounds(),
        });
        assert!(session.shapes().is_empty());
        assert!(session.store().saves().is_empty());

        // Still armed: the next full gesture lands.
        session.handle_pointer(PointerEvent::Down {
            position: pos2(100.0, 100.0),
            bounds: bounds(),
        });
        session.handle_pointer(PointerEvent::Up {
            position: pos2(200.0, 150.0),
            bounds: bounds(),
        });
        assert_eq!(session.shapes().len(), 1);
    }

    #[test]
    fn selected_kind_is_used_for_new_shapes() {
        let mut session = session();
        session.handle_control(ControlEvent::SelectShape(ShapeKind::Circle));
        gesture(&mut session, pos2(100.0, 100.0), pos2(200.0, 150.0));
        assert_eq!(session.shapes()[0].kind, ShapeKind::Circle);
    }

    #[test]
    fn opacity_maps_percent_and_clamps() {
        let mut session = session();
        session.handle_control(ControlEvent::SetOpacity(40.0));
        assert!((session.opacity() - 0.4).abs() < 1e-6);
        session.handle_control(ControlEvent::SetOpacity(250.0));
        assert_eq!(session.opacity(), 1.0);
        assert_eq!(session.history().pointer(), 0);
    }

    #[test]
    fn undo_at_start_is_a_no_op() {
        let mut session = session();
        session.handle_control(ControlEvent::Undo);
        assert!(session.store().saves().is_empty());
        assert_eq!(session.affordances(), Affordances::default());
    }

    #[test]
    fn affordances_follow_history() {
        let mut session = session();
        gesture(&mut session, pos2(100.0, 100.0), pos2(200.0, 150.0));
        assert_eq!(
            session.affordances(),
            Affordances {
                can_undo: true,
                can_redo: false
            }
        );
        session.handle_control(ControlEvent::Undo);
        assert_eq!(
            session.affordances(),
            Affordances {
                can_undo: false,
                can_redo: true
            }
        );
        assert!(session.shapes().is_empty());
        assert_eq!(session.store().last(), Some(&[][..]));
    }
}
