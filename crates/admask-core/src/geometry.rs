//! Lossless image rotation and resizing helpers.
//!
//! `rotate` expands the output canvas to the bounding box of the rotated
//! content instead of cropping, filling uncovered area with white. Multiples
//! of 90 degrees take the exact axis-swapping path so the primary search
//! angles never resample pixels.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, imageops::FilterType};

/// White canvas fill for area uncovered by the rotated content.
const CANVAS_FILL: Rgb<u8> = Rgb([255, 255, 255]);

/// Rotate an image counter-clockwise about its center without cropping.
///
/// The output canvas grows to the bounding box of the fully rotated
/// content; uncovered area is filled with white. An angle of 0 (mod 360)
/// returns a plain copy.
pub fn rotate(image: &DynamicImage, angle_degrees: f32) -> DynamicImage {
    let angle = angle_degrees.rem_euclid(360.0);

    if angle == 0.0 {
        return image.clone();
    }

    // Exact paths for the cardinal angles. Counter-clockwise 90 is the
    // image crate's rotate270 (which is defined clockwise).
    if angle == 90.0 {
        return image.rotate270();
    }
    if angle == 180.0 {
        return image.rotate180();
    }
    if angle == 270.0 {
        return image.rotate90();
    }

    let (w, h) = (image.width(), image.height());
    let theta = (angle as f64).to_radians();
    let (sin, cos) = theta.sin_cos();

    let new_w = (h as f64 * sin.abs() + w as f64 * cos.abs()).ceil() as u32;
    let new_h = (h as f64 * cos.abs() + w as f64 * sin.abs()).ceil() as u32;

    let src = image.to_rgb8();
    let mut out = RgbImage::from_pixel(new_w, new_h, CANVAS_FILL);

    let cx = (w as f64 - 1.0) / 2.0;
    let cy = (h as f64 - 1.0) / 2.0;
    let ncx = (new_w as f64 - 1.0) / 2.0;
    let ncy = (new_h as f64 - 1.0) / 2.0;

    // Inverse mapping: for every destination pixel, sample the source
    // pixel it came from (nearest neighbour).
    for y in 0..new_h {
        for x in 0..new_w {
            let dx = x as f64 - ncx;
            let dy = y as f64 - ncy;

            let sx = dx * cos - dy * sin + cx;
            let sy = dx * sin + dy * cos + cy;

            let sxi = sx.round();
            let syi = sy.round();

            if sxi >= 0.0 && syi >= 0.0 && (sxi as u32) < w && (syi as u32) < h {
                out.put_pixel(x, y, *src.get_pixel(sxi as u32, syi as u32));
            }
        }
    }

    DynamicImage::ImageRgb8(out)
}

/// Rotate an image back to its original orientation.
///
/// Inverse of [`rotate`] using the negated angle, with the same canvas
/// expansion rule. An angle of 0 is a no-op returning the input unchanged.
pub fn rotate_back(image: &DynamicImage, angle_degrees: f32) -> DynamicImage {
    if angle_degrees == 0.0 {
        return image.clone();
    }
    rotate(image, -angle_degrees)
}

/// Resize an image to a fixed square working resolution.
pub fn resize_square(image: &DynamicImage, size: u32) -> DynamicImage {
    image.resize_exact(size, size, FilterType::Triangle)
}
