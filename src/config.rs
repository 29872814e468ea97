use std::path::PathBuf;

use clap::Parser;

use crate::shape::ShapeKind;
use crate::store::JsonFileStore;

/// Draw numbered hotspots over an image.
#[derive(Parser, Debug, Clone)]
#[command(name = "hotspot-edit", version, about)]
pub struct Args {
    /// Image to open on start-up.
    pub image: Option<PathBuf>,

    /// JSON file receiving the shape list after every change.
    #[arg(long, value_name = "FILE", default_value = JsonFileStore::DEFAULT_FILE)]
    pub store: PathBuf,

    /// Width of the drawing surface in pixels.
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
    pub canvas_width: u32,

    /// Height of the drawing surface in pixels.
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub canvas_height: u32,

    /// Fill opacity, in percent.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub opacity: u8,

    /// Shape drawn by the next hotspot gesture.
    #[arg(long, value_enum, default_value_t = ShapeKind::Rectangle)]
    pub shape: ShapeKind,
}

impl Args {
    /// Opacity as a fraction in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        f32::from(self.opacity) / 100.0
    }
}
