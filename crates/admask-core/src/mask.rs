//! Geometric redaction of the Aadhaar number and its display formatting.

use image::{DynamicImage, Rgb};

use crate::detect::BBox;

/// Default fraction of the matched box width covered by the final black
/// rectangle.
pub const MASK_RATIO: f32 = 0.65;

/// Display placeholder when fewer than 12 digits were recognized.
pub const MASKED_PLACEHOLDER: &str = "XXXX XXXX XXXX";

/// Sentinel value for the AADHAR_NUMBER field when nothing was found.
pub const NOT_DETECTED: &str = "Not detected";

/// Return a copy of `image` with the leading `mask_ratio` of the box width
/// blacked out across the full box height. At the default ratio the trailing
/// ~35% (expected to hold the last four digits) stays visible. The input
/// buffer is never mutated.
pub fn mask_region(image: &DynamicImage, bbox: &BBox, mask_ratio: f32) -> DynamicImage {
    let mut out = image.to_rgb8();
    let (x, y, w, h) = bbox.to_pixel_rect(out.width(), out.height());

    let mask_width = (w as f32 * mask_ratio) as u32;

    for py in y..y + h {
        for px in x..x + mask_width.min(w) {
            out.put_pixel(px, py, Rgb([0, 0, 0]));
        }
    }

    DynamicImage::ImageRgb8(out)
}

/// Return a copy of `crop` with everything but the trailing `keep_ratio`
/// of its width zeroed out.
///
/// This is the coarse pre-redaction applied before OCR on the fallback
/// path, distinct from [`mask_region`]: the recognizer must never see the
/// leading digits.
pub fn redact_leading(crop: &DynamicImage, keep_ratio: f32) -> DynamicImage {
    let mut out = crop.to_rgb8();
    let (w, h) = (out.width(), out.height());

    let keep_width = (w as f32 * keep_ratio) as u32;
    let blank_until = w.saturating_sub(keep_width);

    for y in 0..h {
        for x in 0..blank_until {
            out.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }

    DynamicImage::ImageRgb8(out)
}

/// Format the recognized Aadhaar text for display with only the last four
/// digits visible.
///
/// Strips all non-digits first; anything shorter than 12 digits yields the
/// fixed placeholder. Total and idempotent.
pub fn format_masked_display(raw_text: &str) -> String {
    let digits: String = raw_text.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() >= 12 {
        format!("XXXX XXXX {}", &digits[digits.len() - 4..])
    } else {
        MASKED_PLACEHOLDER.to_string()
    }
}
