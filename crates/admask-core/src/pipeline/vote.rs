//! Coarse 4-way orientation fallback chosen by raw detection count.

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::config::DetectionConfig;
use crate::detect::ObjectDetector;
use crate::geometry;

/// Pick the card orientation that yields the most detections.
///
/// Tries exactly four orientations in fixed order: unrotated, 90°
/// clockwise, 180°, 270° counter-clockwise. Each is resized to the square
/// working resolution and scored by the raw number of boxes the detector
/// returns — no text validation. Strictly-higher counts win, so ties keep
/// the earliest orientation.
///
/// Returns the chosen working-resolution image and the angle used. The
/// angle is informational only; the image is not rotated back.
pub fn best_orientation<D: ObjectDetector>(
    detector: &D,
    image: &DynamicImage,
    config: &DetectionConfig,
) -> (DynamicImage, i32) {
    let orientations: [(&str, DynamicImage, i32); 4] = [
        ("original", image.clone(), 0),
        ("90° cw", image.rotate90(), 90),
        ("180°", image.rotate180(), 180),
        ("270° ccw", image.rotate270(), 270),
    ];

    let size = config.working_resolution;

    let mut best_count = 0usize;
    let mut best: Option<(DynamicImage, i32)> = None;

    for (name, oriented, angle) in orientations {
        let resized = geometry::resize_square(&oriented, size);

        let count = match detector.detect(&resized, config.fallback_confidence) {
            Ok(detections) => detections.len(),
            Err(e) => {
                warn!("Detector failed at orientation {}: {}", name, e);
                0
            }
        };

        debug!("Orientation {}: {} detections", name, count);

        if best.is_none() || count > best_count {
            best_count = count;
            best = Some((resized, angle));
        }
    }

    // The loop always ran at least the first orientation.
    let (chosen, angle) = best.unwrap_or_else(|| {
        (geometry::resize_square(image, size), 0)
    });

    info!("Best orientation: {}° with {} detections", angle, best_count);
    (chosen, angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::StubDetector;
    use image::GenericImageView;

    #[test]
    fn test_vote_selects_highest_count() {
        // Box counts [2, 5, 1, 0] for orientations [0°, 90°, 180°, 270°].
        let detector = StubDetector::with_counts([2, 5, 1, 0]);
        let image = DynamicImage::new_rgb8(100, 50);

        let (chosen, angle) = best_orientation(&detector, &image, &DetectionConfig::default());

        assert_eq!(angle, 90);
        assert_eq!(chosen.width(), 640);
        assert_eq!(chosen.height(), 640);
    }

    #[test]
    fn test_vote_ties_keep_earliest_orientation() {
        let detector = StubDetector::with_counts([3, 3, 3, 3]);
        let image = DynamicImage::new_rgb8(100, 50);

        let (_, angle) = best_orientation(&detector, &image, &DetectionConfig::default());
        assert_eq!(angle, 0);
    }

    #[test]
    fn test_vote_with_no_detections_keeps_original() {
        let detector = StubDetector::with_counts([0, 0, 0, 0]);
        let image = DynamicImage::new_rgb8(100, 50);

        let (chosen, angle) = best_orientation(&detector, &image, &DetectionConfig::default());
        assert_eq!(angle, 0);
        assert_eq!((chosen.width(), chosen.height()), (640, 640));
    }
}
