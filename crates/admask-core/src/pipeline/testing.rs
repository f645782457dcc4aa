//! Deterministic detector and recognizer stand-ins shared by pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use image::DynamicImage;

use crate::detect::{BBox, Detection, ObjectDetector};
use crate::error::{DetectError, OcrError};
use crate::recognize::{LayoutMode, TextRecognizer};

enum Responses {
    /// Same detections for every call.
    Fixed(Vec<Detection>),
    /// Detections keyed by the rotation angle of the call.
    ByAngle(HashMap<i32, Vec<Detection>>),
    /// Dummy detection counts for the four orientation-vote calls.
    Counts([usize; 4]),
}

/// Scripted detector.
///
/// The rotation angle of a call is not observable from the image itself, so
/// the stub replays the fixed call schedule the pipeline uses: the four
/// cardinal angles first, then the non-cardinal 15-degree steps in ascending
/// order. The orientation vote happens to probe the cardinal prefix of the
/// same schedule, so [`StubDetector::with_counts`] reuses it.
pub(crate) struct StubDetector {
    responses: Responses,
    calls: Mutex<usize>,
    seen: Mutex<Vec<i32>>,
}

impl StubDetector {
    fn schedule() -> Vec<i32> {
        let mut angles = vec![0, 90, 180, 270];
        angles.extend((15..360).step_by(15).filter(|a| a % 90 != 0));
        angles
    }

    /// Return the same detections on every call.
    pub(crate) fn fixed(detections: Vec<Detection>) -> Self {
        Self {
            responses: Responses::Fixed(detections),
            calls: Mutex::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Return detections only at the given rotation angles.
    pub(crate) fn at_angles(responses: Vec<(i32, Vec<Detection>)>) -> Self {
        Self {
            responses: Responses::ByAngle(responses.into_iter().collect()),
            calls: Mutex::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Return `counts[i]` dummy detections for the i-th orientation call.
    pub(crate) fn with_counts(counts: [usize; 4]) -> Self {
        Self {
            responses: Responses::Counts(counts),
            calls: Mutex::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Rotation angles of the calls made so far, in order.
    pub(crate) fn angles_seen(&self) -> Vec<i32> {
        self.seen.lock().unwrap().clone()
    }
}

impl ObjectDetector for StubDetector {
    fn detect(
        &self,
        _image: &DynamicImage,
        confidence_floor: f32,
    ) -> Result<Vec<Detection>, DetectError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            let index = *calls;
            *calls += 1;
            index
        };

        let angle = Self::schedule().get(index).copied().unwrap_or(-1);
        self.seen.lock().unwrap().push(angle);

        let detections = match &self.responses {
            Responses::Fixed(detections) => detections.clone(),
            Responses::ByAngle(map) => map.get(&angle).cloned().unwrap_or_default(),
            Responses::Counts(counts) => {
                let n = counts.get(index).copied().unwrap_or(0);
                (0..n)
                    .map(|i| Detection {
                        label: "AADHAR_NUMBER".to_string(),
                        confidence: 0.9,
                        bbox: BBox::new(10.0, 10.0 + 30.0 * i as f32, 50.0, 30.0 + 30.0 * i as f32),
                    })
                    .collect()
            }
        };

        Ok(detections
            .into_iter()
            .filter(|d| d.confidence >= confidence_floor)
            .collect())
    }
}

enum Script {
    Fixed(String),
    Sequence(Vec<String>),
    Failing,
}

/// Scripted recognizer that records the layout modes it was called with.
pub(crate) struct EchoRecognizer {
    script: Script,
    cursor: Mutex<usize>,
    modes: Mutex<Vec<LayoutMode>>,
}

impl EchoRecognizer {
    /// Return the same text on every call.
    pub(crate) fn new(text: &str) -> Self {
        Self {
            script: Script::Fixed(text.to_string()),
            cursor: Mutex::new(0),
            modes: Mutex::new(Vec::new()),
        }
    }

    /// Return the given texts in call order, then empty strings.
    pub(crate) fn sequence(texts: Vec<String>) -> Self {
        Self {
            script: Script::Sequence(texts),
            cursor: Mutex::new(0),
            modes: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call.
    pub(crate) fn failing() -> Self {
        Self {
            script: Script::Failing,
            cursor: Mutex::new(0),
            modes: Mutex::new(Vec::new()),
        }
    }

    /// Layout modes of the calls made so far, in order.
    pub(crate) fn modes_seen(&self) -> Vec<LayoutMode> {
        self.modes.lock().unwrap().clone()
    }
}

impl TextRecognizer for EchoRecognizer {
    fn recognize(&self, _region: &DynamicImage, mode: LayoutMode) -> Result<String, OcrError> {
        self.modes.lock().unwrap().push(mode);

        match &self.script {
            Script::Fixed(text) => Ok(text.clone()),
            Script::Sequence(texts) => {
                let mut cursor = self.cursor.lock().unwrap();
                let text = texts.get(*cursor).cloned().unwrap_or_default();
                *cursor += 1;
                Ok(text)
            }
            Script::Failing => Err(OcrError::Recognition("scripted failure".to_string())),
        }
    }
}
