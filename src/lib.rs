#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod loader;
pub mod render;
pub mod session;
pub mod shape;
pub mod store;
pub mod surface;

pub use config::Args;
pub use error::{HotspotError, HotspotResult};
pub use geometry::{compute_placement, Placement};
pub use history::History;
pub use loader::{load_image, DecodedImage, LoadError, PendingImage};
pub use render::{render_scene, render_shape, Style};
pub use session::{Affordances, ControlEvent, PointerEvent, Session};
pub use shape::{Shape, ShapeKind};
pub use store::{JsonFileStore, MemoryStore, ShapeStore, StoreError};
pub use surface::{PathShape, RasterSurface, Surface};
