use thiserror::Error;

/// Conditions the editor core runs into. None of them reach the user as a
/// failure: the session logs them and skips the affected frame or event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HotspotError {
    /// A canvas, image or layout box with a zero or non-finite extent.
    #[error("degenerate geometry: {what} is {width}x{height}")]
    DegenerateGeometry {
        what: &'static str,
        width: f32,
        height: f32,
    },

    #[error("no image is loaded")]
    NoActiveImage,

    #[error("history boundary reached")]
    HistoryBoundary,
}

pub type HotspotResult<T> = Result<T, HotspotError>;
