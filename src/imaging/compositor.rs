//! Cutout + background compositing pipeline.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use super::cutout::CutoutService;
use super::resolver::BackgroundResolver;
use crate::models::background::CompositeRequest;
use crate::{AppError, Result};

/// Encoded result of a composite request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeOutput {
    /// Opaque RGB PNG.
    pub png: Bytes,
    /// Width in pixels, equal to the cutout width.
    pub width: u32,
    /// Height in pixels, equal to the cutout height.
    pub height: u32,
}

/// Runs cutout, background resolution, blending, and encoding.
pub struct Compositor {
    cutout: Arc<dyn CutoutService>,
    resolver: BackgroundResolver,
}

impl Compositor {
    /// Create a compositor over a cutout service and resolver.
    #[must_use]
    pub fn new(cutout: Arc<dyn CutoutService>, resolver: BackgroundResolver) -> Self {
        Self { cutout, resolver }
    }

    /// Produce the final image for `request`.
    ///
    /// Blocking; call from the blocking thread pool. Any failure aborts the
    /// whole request and no partial image is returned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cutout` if background removal fails or yields an
    /// empty image, `AppError::BackgroundLoad` if the background cannot be
    /// loaded, and `AppError::Encode` if PNG encoding fails.
    pub fn composite(&self, request: &CompositeRequest) -> Result<CompositeOutput> {
        let subject = self.cutout.cutout(&request.subject)?;
        let (width, height) = subject.dimensions();
        if width == 0 || height == 0 {
            return Err(AppError::Cutout("cutout has no pixels".into()));
        }

        let mut canvas = self.resolver.resolve(&request.background, width, height)?;
        alpha_over(&mut canvas, &subject);
        let png = encode_png(canvas)?;

        debug!(width, height, bytes = png.len(), "composite encoded");
        Ok(CompositeOutput { png, width, height })
    }
}

/// Paint `subject` over `background` in place with the "over" operator.
///
/// Both images must have the same dimensions; `background` is assumed
/// opaque and stays opaque.
pub fn alpha_over(background: &mut RgbaImage, subject: &RgbaImage) {
    for (bg, fg) in background.pixels_mut().zip(subject.pixels()) {
        let [fr, fg_g, fb, alpha] = fg.0;
        let [br, bg_g, bb, _] = bg.0;
        *bg = Rgba([
            blend_channel(fr, br, alpha),
            blend_channel(fg_g, bg_g, alpha),
            blend_channel(fb, bb, alpha),
            u8::MAX,
        ]);
    }
}

/// `alpha * fg + (1 - alpha) * bg` on 8-bit channels, rounded to nearest.
#[must_use]
pub fn blend_channel(fg: u8, bg: u8, alpha: u8) -> u8 {
    let alpha = u16::from(alpha);
    let mixed = u16::from(fg) * alpha + u16::from(bg) * (255 - alpha);
    u8::try_from((mixed + 127) / 255).unwrap_or(u8::MAX)
}

fn encode_png(canvas: RgbaImage) -> Result<Bytes> {
    let opaque = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    opaque
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|err| AppError::Encode(format!("png encoding failed: {err}")))?;
    Ok(Bytes::from(buffer.into_inner()))
}
