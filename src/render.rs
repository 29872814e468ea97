use egui::{Pos2, Vec2};
use image::Rgba;

use crate::error::HotspotResult;
use crate::geometry::{compute_placement, Placement};
use crate::loader::DecodedImage;
use crate::shape::{Shape, ShapeKind};
use crate::surface::{PathShape, Surface, BLACK, RED, WHITE, YELLOW};

/// Distance between the guide lines of the fill pattern.
pub const LINE_SPACING: f32 = 10.0;
pub const LINE_WIDTH: f32 = 2.0;
/// Radius of the numbered handle, in canvas pixels whatever the image scale.
pub const HANDLE_RADIUS: f32 = 7.0;

/// Colours and fill opacity for one repaint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub opacity: f32,
    pub stroke: Rgba<u8>,
    pub fill: Rgba<u8>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            stroke: RED,
            fill: YELLOW,
        }
    }
}

impl Style {
    pub fn with_opacity(opacity: f32) -> Self {
        Self {
            opacity,
            ..Self::default()
        }
    }
}

fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Translucent fill plus horizontal guide lines, confined to the rectangle
/// spanned from `origin` by `size`. The lines start on `origin.y` and step
/// towards the far edge.
fn draw_pattern<S: Surface>(surface: &mut S, origin: Pos2, size: Vec2, style: &Style) {
    let area = PathShape::signed_rect(origin, size);
    surface.scoped(|s| {
        s.clip(&area);
        s.set_alpha(style.opacity);
        s.fill(&area, style.fill);
        s.set_alpha(1.0);

        let step = if size.y < 0.0 { -LINE_SPACING } else { LINE_SPACING };
        let count = (size.y.abs() / LINE_SPACING).floor() as usize;
        for i in 0..=count {
            let y = origin.y + step * i as f32;
            let line = PathShape::Segment(Pos2::new(origin.x, y), Pos2::new(origin.x + size.x, y));
            s.stroke(&line, style.stroke, LINE_WIDTH);
        }
    });
}

/// Fill pattern for a disc: each guide line spans the chord at its height.
fn draw_disc_pattern<S: Surface>(surface: &mut S, center: Pos2, radius: f32, style: &Style) {
    let disc = PathShape::Circle { center, radius };
    surface.scoped(|s| {
        s.clip(&disc);
        s.set_alpha(style.opacity);
        s.fill(&disc, style.fill);
        s.set_alpha(1.0);

        let mut y = center.y - radius;
        while y <= center.y + radius {
            let radicand = radius * radius - (y - center.y).powi(2);
            if radicand >= 0.0 {
                let dx = radicand.sqrt();
                let line = PathShape::Segment(Pos2::new(center.x - dx, y), Pos2::new(center.x + dx, y));
                s.stroke(&line, style.stroke, LINE_WIDTH);
            }
            y += LINE_SPACING;
        }
    });
}

fn draw_handle<S: Surface>(surface: &mut S, at: Pos2, index: usize) {
    let marker = PathShape::Circle {
        center: at,
        radius: HANDLE_RADIUS,
    };
    surface.scoped(|s| {
        s.set_alpha(1.0);
        s.fill(&marker, WHITE);
        s.stroke(&marker, BLACK, 1.0);
        s.fill_text(&index.to_string(), at, BLACK);
    });
}

/// Draw one shape (outline, fill pattern and numbered handle). Alpha and clip
/// are back to what they were on return.
pub fn render_shape<S: Surface>(surface: &mut S, shape: &Shape, placement: &Placement, style: &Style) {
    let origin = placement.image_to_screen(shape.start());
    let size = placement.image_to_screen(shape.end()) - origin;

    surface.scoped(|s| match shape.kind {
        ShapeKind::Rectangle => {
            s.stroke(&PathShape::signed_rect(origin, size), style.stroke, LINE_WIDTH);
            draw_pattern(s, origin, size, style);
        }
        ShapeKind::Square => {
            let side = size.x.abs().min(size.y.abs());
            let signed = Vec2::new(side * sign(size.x), side * sign(size.y));
            s.stroke(&PathShape::signed_rect(origin, signed), style.stroke, LINE_WIDTH);
            draw_pattern(s, origin, signed, style);
        }
        ShapeKind::Circle => {
            let radius = size.x.abs().min(size.y.abs()) / 2.0;
            let center = origin + size / 2.0;
            s.stroke(&PathShape::Circle { center, radius }, style.stroke, LINE_WIDTH);
            draw_disc_pattern(s, center, radius, style);
        }
        ShapeKind::Triangle => {
            let outline = PathShape::Polygon(vec![
                Pos2::new(origin.x, origin.y + size.y),
                Pos2::new(origin.x + size.x / 2.0, origin.y),
                origin + size,
            ]);
            s.stroke(&outline, style.stroke, LINE_WIDTH);
            s.scoped(|s| {
                s.clip(&outline);
                draw_pattern(s, origin, size, style);
            });
        }
    });

    draw_handle(surface, origin, shape.index);
}

/// Full repaint: the image in its letterbox, every committed shape in order,
/// then the shape being drawn, if any. Returns the placement used.
pub fn render_scene<S: Surface>(
    surface: &mut S,
    image: &DecodedImage,
    shapes: &[Shape],
    provisional: Option<&Shape>,
    style: &Style,
) -> HotspotResult<Placement> {
    let placement = compute_placement(image.size(), surface.size())?;

    surface.clear();
    if let Some(pixels) = image.pixmap() {
        surface.draw_image(pixels, placement.image_rect());
    }
    for shape in shapes.iter().chain(provisional) {
        render_shape(surface, shape, &placement, style);
    }
    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RasterSurface, TRANSPARENT};
    use egui::pos2;

    fn identity() -> Placement {
        Placement {
            offset: Vec2::ZERO,
            scale: 1.0,
            draw_size: Vec2::new(100.0, 100.0),
        }
    }

    fn render(kind: ShapeKind, start: Pos2, end: Pos2, opacity: f32) -> RasterSurface {
        let mut surface = RasterSurface::new(100, 100).unwrap();
        let shape = Shape::from_gesture(kind, start, end, 1);
        render_shape(&mut surface, &shape, &identity(), &Style::with_opacity(opacity));
        surface
    }

    fn is_yellowish(p: Rgba<u8>) -> bool {
        p[0] > 200 && p[1] > 200 && p[2] < 50
    }

    /// Whether any pixel within `reach` of `at` is mostly black.
    fn has_ink(surface: &RasterSurface, at: (u32, u32), reach: u32) -> bool {
        (at.1 - reach..=at.1 + reach)
            .flat_map(|y| (at.0 - reach..=at.0 + reach).map(move |x| (x, y)))
            .any(|(x, y)| surface.pixel(x, y)[0] < 160)
    }

    #[test]
    fn rectangle_has_fill_and_guide_lines() {
        let surface = render(ShapeKind::Rectangle, pos2(20.0, 20.0), pos2(80.0, 60.0), 1.0);
        // Between two guide lines.
        assert!(is_yellowish(surface.pixel(50, 25)));
        // On the guide line at y = 40.
        assert_eq!(surface.pixel(50, 40), RED);
        assert_eq!(surface.pixel(50, 39), RED);
        // Outside the rectangle.
        assert_eq!(surface.pixel(50, 70), TRANSPARENT);
        assert_eq!(surface.pixel(90, 40), TRANSPARENT);
    }

    #[test]
    fn guide_lines_stay_inside_the_rectangle() {
        let surface = render(ShapeKind::Rectangle, pos2(20.0, 20.0), pos2(80.0, 60.0), 0.0);
        // Guide line at y = 30 stops at the right edge and its stroke does not
        // leak outside (the outline is only 1px wide outside the edge).
        assert_eq!(surface.pixel(82, 30), TRANSPARENT);
    }

    #[test]
    fn rectangle_drawn_upwards_still_gets_guide_lines() {
        let surface = render(ShapeKind::Rectangle, pos2(20.0, 60.0), pos2(80.0, 20.0), 1.0);
        assert_eq!(surface.pixel(50, 40), RED);
        assert!(is_yellowish(surface.pixel(50, 45)));
    }

    #[test]
    fn square_uses_the_smaller_extent_with_drag_signs() {
        // width 40, height -60: the square spans x 20..60, y 30..70.
        let surface = render(ShapeKind::Square, pos2(20.0, 70.0), pos2(60.0, 10.0), 1.0);
        assert!(is_yellowish(surface.pixel(40, 45)));
        assert_eq!(surface.pixel(40, 25), TRANSPARENT);
    }

    #[test]
    fn circle_pattern_is_clipped_to_the_disc() {
        let surface = render(ShapeKind::Circle, pos2(20.0, 20.0), pos2(80.0, 80.0), 1.0);
        assert!(is_yellowish(surface.pixel(50, 45)));
        // Corner of the bounding box lies outside the disc.
        assert_eq!(surface.pixel(26, 75), TRANSPARENT);
        // Guide line through the centre.
        assert_eq!(surface.pixel(60, 50), RED);
    }

    #[test]
    fn triangle_pattern_is_clipped_to_the_triangle() {
        let surface = render(ShapeKind::Triangle, pos2(20.0, 20.0), pos2(80.0, 80.0), 1.0);
        assert!(is_yellowish(surface.pixel(50, 65)));
        // Top corners of the bounding box are outside the triangle.
        assert_eq!(surface.pixel(75, 25), TRANSPARENT);
        assert_eq!(surface.pixel(28, 32), TRANSPARENT);
    }

    #[test]
    fn handle_is_drawn_at_the_start_point() {
        let surface = render(ShapeKind::Rectangle, pos2(20.0, 20.0), pos2(80.0, 60.0), 1.0);
        // Inside the handle disc but away from the digit.
        assert_eq!(surface.pixel(24, 21), WHITE);
        assert_eq!(surface.pixel(20, 25), WHITE);
        // The digit "1" sits on the start point.
        assert!(has_ink(&surface, (20, 20), 2));
    }

    #[test]
    fn opacity_only_affects_the_fill() {
        let surface = render(ShapeKind::Rectangle, pos2(20.0, 20.0), pos2(80.0, 60.0), 0.0);
        assert_eq!(surface.pixel(50, 25), TRANSPARENT);
        assert_eq!(surface.pixel(50, 40), RED);
    }

    #[test]
    fn render_leaves_no_state_behind() {
        let mut surface = RasterSurface::new(100, 100).unwrap();
        for kind in ShapeKind::ALL {
            let shape = Shape::from_gesture(kind, pos2(10.0, 10.0), pos2(90.0, 90.0), 3);
            render_shape(&mut surface, &shape, &identity(), &Style::with_opacity(0.3));
            assert_eq!(surface.alpha(), 1.0);
            assert_eq!(surface.clip_depth(), 0);
            assert_eq!(surface.saved_depth(), 0);
        }
    }

    #[test]
    fn scene_letterboxes_the_image() {
        let mut pixels = image::RgbaImage::new(800, 300);
        for p in pixels.pixels_mut() {
            *p = Rgba([0, 0, 255, 255]);
        }
        let image = DecodedImage::from_rgba(pixels);
        let mut surface = RasterSurface::new(400, 300).unwrap();
        let placement = render_scene(&mut surface, &image, &[], None, &Style::default()).unwrap();
        assert!((placement.offset.y - 75.0).abs() < 1e-3);
        assert_eq!(surface.pixel(200, 10), TRANSPARENT);
        assert_eq!(surface.pixel(200, 150), Rgba([0, 0, 255, 255]));
        assert_eq!(surface.pixel(200, 290), TRANSPARENT);
    }

    #[test]
    fn scene_skips_degenerate_images() {
        let image = DecodedImage::from_rgba(image::RgbaImage::new(0, 0));
        let mut surface = RasterSurface::new(40, 30).unwrap();
        assert!(render_scene(&mut surface, &image, &[], None, &Style::default()).is_err());
    }
}
