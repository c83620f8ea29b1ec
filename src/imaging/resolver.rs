//! Turns a [`BackgroundSpec`] into an opaque canvas of a given size.

use std::path::Path;

use image::imageops::FilterType;
use image::{ImageReader, Rgba, RgbaImage};

use super::compositor::blend_channel;
use crate::config::BackgroundFit;
use crate::models::background::BackgroundSpec;
use crate::models::session::Rgb;
use crate::{AppError, Result};

/// Produces fully opaque backgrounds matching the cutout size.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundResolver {
    fit: BackgroundFit,
}

impl BackgroundResolver {
    /// Create a resolver using the given fitting strategy for image backgrounds.
    #[must_use]
    pub fn new(fit: BackgroundFit) -> Self {
        Self { fit }
    }

    /// Render `spec` as a `width` x `height` opaque RGBA image.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BackgroundLoad` if a referenced image is missing,
    /// unreadable, or not a supported format.
    pub fn resolve(&self, spec: &BackgroundSpec, width: u32, height: u32) -> Result<RgbaImage> {
        match spec {
            BackgroundSpec::SolidColor { color } => Ok(solid(*color, width, height)),
            BackgroundSpec::Default => Ok(solid(Rgb::WHITE, width, height)),
            BackgroundSpec::TemplateImage { path } | BackgroundSpec::UserImage { path } => {
                self.load(path, width, height)
            }
        }
    }

    fn load(&self, path: &Path, width: u32, height: u32) -> Result<RgbaImage> {
        let load_error = |err: &dyn std::fmt::Display| {
            AppError::BackgroundLoad(format!("{}: {err}", path.display()))
        };
        // The decoder is chosen from the content, not the file extension.
        let source = ImageReader::open(path)
            .and_then(ImageReader::with_guessed_format)
            .map_err(|err| load_error(&err))?
            .decode()
            .map_err(|err| load_error(&err))?;

        let fitted = match self.fit {
            BackgroundFit::Stretch => source.resize_exact(width, height, FilterType::Triangle),
            BackgroundFit::Cover => source.resize_to_fill(width, height, FilterType::Triangle),
        };

        let mut canvas = fitted.to_rgba8();
        flatten_onto_white(&mut canvas);
        Ok(canvas)
    }
}

fn solid(color: Rgb, width: u32, height: u32) -> RgbaImage {
    let [r, g, b] = color.channels();
    RgbaImage::from_pixel(width, height, Rgba([r, g, b, u8::MAX]))
}

/// Remove transparency by compositing each pixel over white.
fn flatten_onto_white(canvas: &mut RgbaImage) {
    for pixel in canvas.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if a == u8::MAX {
            continue;
        }
        *pixel = Rgba([
            blend_channel(r, u8::MAX, a),
            blend_channel(g, u8::MAX, a),
            blend_channel(b, u8::MAX, a),
            u8::MAX,
        ]);
    }
}
