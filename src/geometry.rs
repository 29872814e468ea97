use egui::{Pos2, Rect, Vec2};

use crate::error::{HotspotError, HotspotResult};

/// How a decoded image is letterboxed onto the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Top-left corner of the drawn image, in canvas pixels.
    pub offset: Vec2,
    /// Canvas pixels per image pixel.
    pub scale: f32,
    /// Size of the drawn image, in canvas pixels.
    pub draw_size: Vec2,
}

impl Placement {
    /// Canvas-pixel rectangle covered by the image.
    pub fn image_rect(&self) -> Rect {
        Rect::from_min_size(self.offset.to_pos2(), self.draw_size)
    }

    /// Convert canvas-pixel coords to image-space
    pub fn screen_to_image(&self, screen_pos: Pos2) -> Pos2 {
        ((screen_pos - self.offset).to_vec2() / self.scale).to_pos2()
    }

    /// Convert image-space coords to canvas-pixel coords
    pub fn image_to_screen(&self, img_pos: Pos2) -> Pos2 {
        (img_pos.to_vec2() * self.scale + self.offset).to_pos2()
    }
}

fn check_extent(what: &'static str, size: Vec2) -> HotspotResult<()> {
    if size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0 {
        Ok(())
    } else {
        Err(HotspotError::DegenerateGeometry {
            what,
            width: size.x,
            height: size.y,
        })
    }
}

/// Fit an image into the canvas keeping its aspect ratio. The image fills
/// the canvas along one axis and is centred along the other.
pub fn compute_placement(image_size: Vec2, canvas_size: Vec2) -> HotspotResult<Placement> {
    check_extent("image", image_size)?;
    check_extent("canvas", canvas_size)?;

    let image_aspect = image_size.x / image_size.y;
    let canvas_aspect = canvas_size.x / canvas_size.y;

    let (draw_size, offset) = if image_aspect > canvas_aspect {
        let draw_height = canvas_size.x / image_aspect;
        (
            Vec2::new(canvas_size.x, draw_height),
            Vec2::new(0.0, ((canvas_size.y - draw_height) / 2.0).max(0.0)),
        )
    } else {
        let draw_width = canvas_size.y * image_aspect;
        (
            Vec2::new(draw_width, canvas_size.y),
            Vec2::new(((canvas_size.x - draw_width) / 2.0).max(0.0), 0.0),
        )
    };

    Ok(Placement {
        offset,
        scale: draw_size.x / image_size.x,
        draw_size,
    })
}

/// Map a pointer position in layout coordinates onto the canvas pixel grid.
/// `bounds` is where the canvas is displayed; its size may differ from the
/// canvas' pixel size.
pub fn client_to_canvas(client: Pos2, bounds: Rect, canvas_size: Vec2) -> HotspotResult<Pos2> {
    check_extent("canvas layout box", bounds.size())?;
    let ratio = canvas_size / bounds.size();
    Ok(((client - bounds.min) * ratio).to_pos2())
}
