//! Prototype screenshots.
//!
//! Screenshots are best-effort: a [`ScreenshotService`] failure never aborts a
//! report, the compiler just leaves the image out.

use thiserror::Error;

const EMBED_SUBDOMAIN: &str = "embed.";
const EMBED_HOST_QUERY: &str = "&embed-host=share";
const SCALING_QUERY: &str = "&scaling=scale-down&content-scaling=fixed";

/// Errors produced while capturing a screenshot.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture request could not be sent or its body not read.
    #[error("screenshot request failed")]
    Http(#[from] reqwest::Error),
    /// The capture service answered with a non-success status.
    #[error("screenshot service answered with status {0}")]
    Status(u16),
    /// The service returned bytes that are not a decodable image.
    #[error("screenshot is not a valid image")]
    Decode(#[from] image::ImageError),
    /// The decoded image has no pixels.
    #[error("screenshot is empty")]
    Empty,
    /// No capture service is configured.
    #[error("screenshot capture is disabled")]
    Disabled,
}

/// Captures a rendered prototype frame.
pub trait ScreenshotService {
    /// Returns the encoded image of the page at `url`.
    fn capture(&self, url: &str) -> Result<Vec<u8>, CaptureError>;
}

/// A service that never captures anything, used for offline exports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoScreenshots;

impl ScreenshotService for NoScreenshots {
    fn capture(&self, _url: &str) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Disabled)
    }
}

/// Turns an embed-only prototype URL into its shareable form by dropping the
/// `embed.` subdomain marker and the `embed-host` query parameter.
pub fn sanitize_prototype_url(url: &str) -> String {
    url.replacen(EMBED_SUBDOMAIN, "", 1)
        .replacen(EMBED_HOST_QUERY, "", 1)
}

/// Sanitized URL with the scaling parameters that make the whole frame fit the
/// capture viewport.
pub fn scaled_prototype_url(url: &str) -> String {
    let mut cleaned = sanitize_prototype_url(url);
    cleaned.push_str(SCALING_QUERY);
    cleaned
}

/// Size in millimetres of an image of `width_px` × `height_px` scaled to fit
/// inside `max_width_mm` × `max_height_mm` without distortion.
pub fn fit_within(
    width_px: u32,
    height_px: u32,
    max_width_mm: f64,
    max_height_mm: f64,
) -> Option<(f64, f64)> {
    if width_px == 0 || height_px == 0 {
        return None;
    }
    let width = f64::from(width_px);
    let height = f64::from(height_px);
    let scale = (max_width_mm / width).min(max_height_mm / height);
    Some((width * scale, height * scale))
}
