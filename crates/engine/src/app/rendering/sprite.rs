use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

use crate::app::entity::{CallbackError, Entity, Rect, Vec2};
use crate::app::loading::LoadDone;

use super::Surface;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to open sprite {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode sprite {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SpriteImage {
    pub fn from_path(path: &Path) -> Result<Self, SpriteError> {
        let reader = ImageReader::open(path).map_err(|source| SpriteError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| SpriteError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let image = decoded.to_rgba8();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }
}

/// Image-backed entity. Nothing is drawn until `load` has decoded the file.
#[derive(Debug)]
pub struct Sprite {
    pub position: Vec2,
    path: PathBuf,
    image: Option<SpriteImage>,
}

impl Sprite {
    pub fn new(path: impl Into<PathBuf>, position: Vec2) -> Self {
        Self {
            position,
            path: path.into(),
            image: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn image(&self) -> Option<&SpriteImage> {
        self.image.as_ref()
    }

    /// Bounds at the current position; zero-sized before the image is loaded.
    pub fn bounds(&self) -> Rect {
        match &self.image {
            Some(image) => {
                Rect::from_position(self.position, image.width as f32, image.height as f32)
            }
            None => Rect::from_position(self.position, 0.0, 0.0),
        }
    }
}

impl Entity for Sprite {
    fn draw(&self, surface: &mut Surface) -> Result<(), CallbackError> {
        if let Some(image) = &self.image {
            surface.blit_rgba(
                self.position.x.round() as i32,
                self.position.y.round() as i32,
                image.width,
                image.height,
                &image.rgba,
            );
        }
        Ok(())
    }

    fn load(&mut self, done: LoadDone) {
        match SpriteImage::from_path(&self.path) {
            Ok(image) => {
                debug!(
                    path = %self.path.display(),
                    width = image.width,
                    height = image.height,
                    "sprite_loaded"
                );
                self.image = Some(image);
            }
            Err(error) => {
                warn!(error = %error, "sprite_load_failed");
            }
        }
        done();
    }

    fn debug_name(&self) -> &str {
        "sprite"
    }
}
