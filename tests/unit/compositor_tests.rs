//! Compositing pipeline with a stub cutout service.

use std::sync::Arc;

use backdrop_bot::imaging::compositor::{alpha_over, blend_channel, Compositor};
use backdrop_bot::imaging::cutout::CutoutService;
use backdrop_bot::imaging::resolver::BackgroundResolver;
use backdrop_bot::models::background::{BackgroundSpec, CompositeRequest};
use backdrop_bot::models::session::Rgb;
use backdrop_bot::{AppError, Result};
use bytes::Bytes;
use image::{ColorType, Rgba, RgbaImage};

/// Returns a fixed cutout regardless of input.
struct FixedCutout(RgbaImage);

impl CutoutService for FixedCutout {
    fn cutout(&self, _photo: &[u8]) -> Result<RgbaImage> {
        Ok(self.0.clone())
    }
}

struct FailingCutout;

impl CutoutService for FailingCutout {
    fn cutout(&self, _photo: &[u8]) -> Result<RgbaImage> {
        Err(AppError::Cutout("model unavailable".into()))
    }
}

/// Left column opaque yellow subject, right column fully transparent.
fn subject() -> RgbaImage {
    RgbaImage::from_fn(2, 3, |x, _| {
        if x == 0 {
            Rgba([255, 255, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn compositor(cutout: impl CutoutService + 'static) -> Compositor {
    Compositor::new(Arc::new(cutout), BackgroundResolver::default())
}

fn request(background: BackgroundSpec) -> CompositeRequest {
    CompositeRequest {
        subject: Bytes::from_static(b"raw photo"),
        background,
    }
}

#[test]
fn output_is_opaque_rgb_with_cutout_dimensions() {
    let compositor = compositor(FixedCutout(subject()));
    let output = compositor
        .composite(&request(BackgroundSpec::SolidColor {
            color: Rgb(0, 0, 255),
        }))
        .expect("composite");

    assert_eq!((output.width, output.height), (2, 3));
    let decoded = image::load_from_memory(&output.png).expect("decode png");
    assert_eq!(decoded.color(), ColorType::Rgb8);
    assert_eq!((decoded.width(), decoded.height()), (2, 3));

    let rgb = decoded.to_rgb8();
    for y in 0..3 {
        assert_eq!(rgb.get_pixel(0, y).0, [255, 255, 0], "subject shows through");
        assert_eq!(rgb.get_pixel(1, y).0, [0, 0, 255], "background fills the rest");
    }
}

#[test]
fn fully_transparent_cutout_yields_background() {
    let compositor = compositor(FixedCutout(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 0]))));
    let output = compositor
        .composite(&request(BackgroundSpec::Default))
        .expect("composite");

    let rgb = image::load_from_memory(&output.png).expect("decode").to_rgb8();
    assert!(rgb.pixels().all(|p| p.0 == [255, 255, 255]));
}

#[test]
fn compositing_is_deterministic() {
    let compositor = compositor(FixedCutout(subject()));
    let req = request(BackgroundSpec::SolidColor {
        color: Rgb(12, 34, 56),
    });

    let first = compositor.composite(&req).expect("first");
    let second = compositor.composite(&req).expect("second");

    assert_eq!(first.png, second.png);
}

#[test]
fn cutout_failure_propagates() {
    let compositor = compositor(FailingCutout);
    let result = compositor.composite(&request(BackgroundSpec::Default));
    assert!(matches!(result, Err(AppError::Cutout(_))));
}

#[test]
fn empty_cutout_is_rejected() {
    let compositor = compositor(FixedCutout(RgbaImage::new(0, 0)));
    let result = compositor.composite(&request(BackgroundSpec::Default));
    assert!(matches!(result, Err(AppError::Cutout(_))));
}

#[test]
fn missing_background_aborts_request() {
    let temp = tempfile::tempdir().expect("tempdir");
    let compositor = compositor(FixedCutout(subject()));
    let result = compositor.composite(&request(BackgroundSpec::TemplateImage {
        path: temp.path().join("gone.jpg"),
    }));
    assert!(matches!(result, Err(AppError::BackgroundLoad(_))));
}

#[test]
fn half_alpha_blends_channels() {
    let mut background = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
    let subject = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 128]));

    alpha_over(&mut background, &subject);

    assert_eq!(background.get_pixel(0, 0).0, [128, 128, 128, 255]);
}

#[test]
fn blend_channel_rounds() {
    assert_eq!(blend_channel(100, 200, 255), 100);
    assert_eq!(blend_channel(100, 200, 0), 200);
    // (100 * 64 + 200 * 191 + 127) / 255 = 175
    assert_eq!(blend_channel(100, 200, 64), 175);
}
