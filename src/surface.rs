//! 2D drawing surface used by the renderer.
//!
//! [`Surface`] is a small canvas-style API: fills, strokes, text and images,
//! with a global alpha and a clip region that can be pushed and popped with
//! [`Surface::save`] / [`Surface::restore`]. [`RasterSurface`] implements it
//! on a tiny-skia [`Pixmap`], keeping the clip as a [`Mask`].

use std::sync::OnceLock;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use egui::{Pos2, Rect, Vec2};
use image::Rgba;
use tiny_skia::{
    Color, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, PixmapRef,
    Stroke, Transform,
};

use crate::error::{HotspotError, HotspotResult};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

/// Pixel height of handle labels.
pub const TEXT_SIZE: f32 = 10.0;

/// A closed outline (or a single segment) in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum PathShape {
    Rect(Rect),
    Circle { center: Pos2, radius: f32 },
    Polygon(Vec<Pos2>),
    Segment(Pos2, Pos2),
}

impl PathShape {
    /// Rectangle spanned from `origin` by a possibly negative `size`.
    pub fn signed_rect(origin: Pos2, size: Vec2) -> Self {
        PathShape::Rect(Rect::from_two_pos(origin, origin + size))
    }

    /// The outline as a tiny-skia path. `None` when there is nothing to
    /// trace (empty rectangle, zero radius, fewer than two points).
    fn to_path(&self) -> Option<tiny_skia::Path> {
        match self {
            PathShape::Rect(rect) => {
                tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y)
                    .map(PathBuilder::from_rect)
            }
            PathShape::Circle { center, radius } => {
                PathBuilder::from_circle(center.x, center.y, *radius)
            }
            PathShape::Polygon(points) => {
                let (first, rest) = points.split_first()?;
                let mut pb = PathBuilder::new();
                pb.move_to(first.x, first.y);
                for p in rest {
                    pb.line_to(p.x, p.y);
                }
                pb.close();
                pb.finish()
            }
            PathShape::Segment(a, b) => {
                let mut pb = PathBuilder::new();
                pb.move_to(a.x, a.y);
                pb.line_to(b.x, b.y);
                pb.finish()
            }
        }
    }
}

pub trait Surface {
    /// Size of the surface in pixels.
    fn size(&self) -> Vec2;

    /// Push the current alpha and clip region.
    fn save(&mut self);

    /// Pop the alpha and clip region pushed by the matching [`Surface::save`].
    fn restore(&mut self);

    /// Multiplier applied to the alpha of everything drawn afterwards.
    fn set_alpha(&mut self, alpha: f32);

    /// Intersect the clip region with the area enclosed by `path`.
    fn clip(&mut self, path: &PathShape);

    /// Reset every pixel to transparent, ignoring alpha and clip.
    fn clear(&mut self);

    /// Draw `image` stretched over `dest`.
    fn draw_image(&mut self, image: PixmapRef<'_>, dest: Rect);

    fn fill(&mut self, path: &PathShape, color: Rgba<u8>);

    fn stroke(&mut self, path: &PathShape, color: Rgba<u8>, width: f32);

    /// Draw `text` centred on `center`.
    fn fill_text(&mut self, text: &str, center: Pos2, color: Rgba<u8>);

    /// Run `f` between a save and the matching restore.
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized,
    {
        self.save();
        let result = f(self);
        self.restore();
        result
    }
}

#[derive(Clone)]
struct DrawState {
    alpha: f32,
    /// Intersection of every clip since the last reset. `None` is unclipped.
    mask: Option<Mask>,
    clips: usize,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            mask: None,
            clips: 0,
        }
    }
}

/// The proportional face egui ships with, used for handle labels.
fn label_font() -> Option<&'static FontArc> {
    static FONT: OnceLock<Option<FontArc>> = OnceLock::new();
    FONT.get_or_init(|| {
        let fonts = egui::FontDefinitions::default();
        let name = fonts.families.get(&egui::FontFamily::Proportional)?.first()?;
        let data = fonts.font_data.get(name)?;
        match FontArc::try_from_vec(data.font.to_vec()) {
            Ok(font) => Some(font),
            Err(err) => {
                log::warn!("label font {name} unusable: {err}");
                None
            }
        }
    })
    .as_ref()
}

/// Surface drawing into a premultiplied RGBA pixmap. Shapes are drawn
/// without anti-aliasing so hotspot edges stay on whole pixels; text is
/// anti-aliased.
#[derive(Clone)]
pub struct RasterSurface {
    pixmap: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
    dirty: bool,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> HotspotResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(HotspotError::DegenerateGeometry {
            what: "surface",
            width: width as f32,
            height: height as f32,
        })?;
        Ok(Self {
            pixmap,
            state: DrawState::default(),
            stack: Vec::new(),
            dirty: true,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha colour of one pixel, transparent outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        self.pixmap
            .pixel(x, y)
            .map(|p| {
                let c = p.demultiply();
                Rgba([c.red(), c.green(), c.blue(), c.alpha()])
            })
            .unwrap_or(TRANSPARENT)
    }

    pub fn alpha(&self) -> f32 {
        self.state.alpha
    }

    pub fn clip_depth(&self) -> usize {
        self.state.clips
    }

    pub fn saved_depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns whether anything was drawn since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn paint(&self, color: Rgba<u8>) -> Paint<'static> {
        let [r, g, b, a] = color.0;
        let mut color = Color::from_rgba8(r, g, b, a);
        color.set_alpha(color.alpha() * self.state.alpha);
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = false;
        paint
    }

    /// Coverage mask of `text` centred on `center`, already limited by the
    /// current clip.
    fn text_mask(&self, font: &FontArc, text: &str, center: Pos2) -> Option<Mask> {
        let scaled = font.as_scaled(PxScale::from(TEXT_SIZE));
        let mut caret = 0.0;
        let mut outlines = Vec::new();
        for c in text.chars() {
            let mut glyph = scaled.scaled_glyph(c);
            glyph.position = point(caret, 0.0);
            caret += scaled.h_advance(glyph.id);
            outlines.extend(font.outline_glyph(glyph));
        }

        // Centre the ink, not the advance box, snapped to whole pixels.
        let mut ink = outlines.first()?.px_bounds();
        for outlined in &outlines[1..] {
            let b = outlined.px_bounds();
            ink.min.x = ink.min.x.min(b.min.x);
            ink.min.y = ink.min.y.min(b.min.y);
            ink.max.x = ink.max.x.max(b.max.x);
            ink.max.y = ink.max.y.max(b.max.y);
        }
        let dx = (center.x - (ink.min.x + ink.max.x) / 2.0).round() as i64;
        let dy = (center.y - (ink.min.y + ink.max.y) / 2.0).round() as i64;

        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let mut mask = Mask::new(w, h)?;
        let data = mask.data_mut();
        for outlined in &outlines {
            let b = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = b.min.x as i64 + gx as i64 + dx;
                let y = b.min.y as i64 + gy as i64 + dy;
                if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
                    return;
                }
                let cell = &mut data[(y * w as i64 + x) as usize];
                *cell = (*cell).max((coverage.clamp(0.0, 1.0) * 255.0).round() as u8);
            });
        }

        if let Some(clip) = &self.state.mask {
            for (cell, limit) in data.iter_mut().zip(clip.data()) {
                *cell = ((*cell as u16 * *limit as u16 + 127) / 255) as u8;
            }
        }
        Some(mask)
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.pixmap.width() as f32, self.pixmap.height() as f32)
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        } else {
            log::warn!("restore() without matching save()");
        }
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
    }

    fn clip(&mut self, path: &PathShape) {
        self.state.clips += 1;
        let outline = path.to_path();
        let mask = match self.state.mask.take() {
            Some(mut mask) => {
                match &outline {
                    Some(outline) => {
                        mask.intersect_path(outline, FillRule::Winding, false, Transform::identity())
                    }
                    None => mask.data_mut().fill(0),
                }
                Some(mask)
            }
            None => Mask::new(self.pixmap.width(), self.pixmap.height()).map(|mut mask| {
                if let Some(outline) = &outline {
                    mask.fill_path(outline, FillRule::Winding, false, Transform::identity());
                }
                mask
            }),
        };
        self.state.mask = mask;
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
        self.dirty = true;
    }

    fn draw_image(&mut self, image: PixmapRef<'_>, dest: Rect) {
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        let transform = Transform::from_row(
            dest.width() / image.width() as f32,
            0.0,
            0.0,
            dest.height() / image.height() as f32,
            dest.min.x,
            dest.min.y,
        );
        let paint = PixmapPaint {
            opacity: self.state.alpha,
            quality: FilterQuality::Nearest,
            ..Default::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, image, &paint, transform, self.state.mask.as_ref());
        self.dirty = true;
    }

    fn fill(&mut self, path: &PathShape, color: Rgba<u8>) {
        let Some(outline) = path.to_path() else {
            return;
        };
        let paint = self.paint(color);
        self.pixmap.fill_path(
            &outline,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            self.state.mask.as_ref(),
        );
        self.dirty = true;
    }

    fn stroke(&mut self, path: &PathShape, color: Rgba<u8>, width: f32) {
        let Some(outline) = path.to_path() else {
            return;
        };
        let paint = self.paint(color);
        let stroke = Stroke {
            width: width.max(0.0),
            ..Default::default()
        };
        self.pixmap.stroke_path(
            &outline,
            &paint,
            &stroke,
            Transform::identity(),
            self.state.mask.as_ref(),
        );
        self.dirty = true;
    }

    fn fill_text(&mut self, text: &str, center: Pos2, color: Rgba<u8>) {
        let Some(font) = label_font() else {
            return;
        };
        let Some(mask) = self.text_mask(font, text, center) else {
            return;
        };
        let Some(area) = tiny_skia::Rect::from_xywh(
            0.0,
            0.0,
            self.pixmap.width() as f32,
            self.pixmap.height() as f32,
        ) else {
            return;
        };
        let paint = self.paint(color);
        self.pixmap
            .fill_rect(area, &paint, Transform::identity(), Some(&mask));
        self.dirty = true;
    }
}
