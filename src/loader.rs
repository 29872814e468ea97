use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use egui::Vec2;
use futures::channel::oneshot;
use image::RgbaImage;
use thiserror::Error;
use tiny_skia::{ColorU8, Pixmap, PixmapRef};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image decoder stopped before finishing")]
    Cancelled,
}

/// A decoded raster, converted to premultiplied pixels ready to be drawn.
#[derive(Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    /// `None` for an empty image.
    pixmap: Option<Pixmap>,
}

impl DecodedImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        let pixmap = Pixmap::new(width, height).map(|mut pixmap| {
            for (dst, src) in pixmap.pixels_mut().iter_mut().zip(pixels.pixels()) {
                let [r, g, b, a] = src.0;
                *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
            }
            pixmap
        });
        Self {
            width,
            height,
            pixmap,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn pixmap(&self) -> Option<PixmapRef<'_>> {
        self.pixmap.as_ref().map(|pixmap| pixmap.as_ref())
    }
}

/// An image being decoded on a worker thread.
///
/// Poll it without blocking with [`PendingImage::try_take`], or `.await` it.
pub struct PendingImage {
    path: PathBuf,
    receiver: oneshot::Receiver<Result<DecodedImage, LoadError>>,
}

impl PendingImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The decode result if it has arrived.
    pub fn try_take(&mut self) -> Option<Result<DecodedImage, LoadError>> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(LoadError::Cancelled)),
        }
    }
}

impl Future for PendingImage {
    type Output = Result<DecodedImage, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(LoadError::Cancelled)))
    }
}

/// Start decoding the image at `path` in the background.
pub fn load_image(path: impl Into<PathBuf>) -> PendingImage {
    let path = path.into();
    let (sender, receiver) = oneshot::channel();
    let worker_path = path.clone();
    std::thread::spawn(move || {
        log::debug!("decoding {}", worker_path.display());
        let result = image::open(&worker_path)
            .map(|img| DecodedImage::from_rgba(img.to_rgba8()))
            .map_err(LoadError::from);
        // The receiver is gone when a newer image replaced this one.
        let _ = sender.send(result);
    });
    PendingImage { path, receiver }
}
