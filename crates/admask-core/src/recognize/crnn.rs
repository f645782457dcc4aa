//! CRNN text recognizer with CTC greedy decoding.

use std::path::Path;

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use ndarray::{Array4, ArrayD};
use tracing::{debug, trace};

use admask_inference::InferenceBackend;

use crate::error::OcrError;

use super::{LayoutMode, TextRecognizer};

/// Text recognizer running a CRNN recognition model.
///
/// Single-line mode feeds the whole crop through the model. Block mode
/// first segments the crop into text lines by horizontal ink projection and
/// recognizes each line separately, joining the results with newlines.
pub struct CrnnRecognizer<B: InferenceBackend> {
    backend: B,
    dictionary: Vec<char>,
    target_height: u32,
    max_width: u32,
}

impl<B: InferenceBackend> CrnnRecognizer<B> {
    /// Create a new recognizer with the given backend and dictionary.
    pub fn new(backend: B, dictionary: Vec<char>) -> Self {
        Self {
            backend,
            dictionary,
            target_height: 48,
            max_width: 320,
        }
    }

    /// Load a dictionary file with one character per line.
    ///
    /// Index 0 is reserved for the CTC blank token.
    pub fn load_dictionary(path: &Path) -> Result<Vec<char>, OcrError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OcrError::ModelLoad(format!("failed to load dictionary: {}", e)))?;

        let mut chars: Vec<char> = vec![' ']; // Blank token
        for line in content.lines() {
            if let Some(c) = line.chars().next() {
                chars.push(c);
            }
        }

        debug!("Loaded dictionary with {} characters", chars.len());
        Ok(chars)
    }

    /// Default dictionary for Aadhaar card text: digits first, then Latin
    /// letters and the punctuation the card layouts use.
    pub fn default_dictionary() -> Vec<char> {
        let mut chars = vec![' ']; // Blank token for CTC

        for c in '0'..='9' {
            chars.push(c);
        }
        for c in 'A'..='Z' {
            chars.push(c);
        }
        for c in 'a'..='z' {
            chars.push(c);
        }

        chars.extend(['/', '-', ':', '.', ',', ' ']);

        chars
    }

    fn recognize_line(&self, line: &DynamicImage) -> Result<String, OcrError> {
        let tensor = self.preprocess_line(line)?;

        let input_name = self
            .backend
            .input_names()
            .first()
            .cloned()
            .unwrap_or_else(|| "x".to_string());

        let outputs = self
            .backend
            .run(&[(&input_name, tensor.into_dyn())])
            .map_err(|e| OcrError::Recognition(e.to_string()))?;

        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::Recognition("no output from model".to_string()))?
            .1;

        self.decode_ctc(&output)
    }

    /// Resize a line crop to the model height and build a normalized NCHW
    /// tensor, padding to the model's fixed width.
    fn preprocess_line(&self, image: &DynamicImage) -> Result<Array4<f32>, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::Preprocessing("empty crop".to_string()));
        }

        let aspect_ratio = width as f32 / height as f32;
        let target_width = ((self.target_height as f32 * aspect_ratio) as u32)
            .clamp(1, self.max_width);

        let resized = image.resize_exact(target_width, self.target_height, FilterType::Lanczos3);
        let rgb = resized.to_rgb8();

        let mut tensor = Array4::<f32>::zeros((
            1,
            3,
            self.target_height as usize,
            self.max_width as usize,
        ));

        for y in 0..self.target_height {
            for x in 0..target_width {
                let pixel = rgb.get_pixel(x, y);
                for c in 0..3 {
                    let value = pixel[c] as f32 / 255.0;
                    tensor[[0, c, y as usize, x as usize]] = (value - 0.5) / 0.5;
                }
            }
        }

        Ok(tensor)
    }

    /// CTC greedy decode: argmax per timestep, drop blanks and repeats.
    fn decode_ctc(&self, output: &ArrayD<f32>) -> Result<String, OcrError> {
        let shape = output.shape();
        if shape.len() < 3 {
            return Err(OcrError::Recognition(format!(
                "invalid output shape: {:?}",
                shape
            )));
        }

        let seq_len = shape[1];
        let num_classes = shape[2];

        let mut text = String::new();
        let mut prev_idx = 0usize;

        for t in 0..seq_len {
            let mut max_idx = 0;
            let mut max_val = f32::NEG_INFINITY;

            for c in 0..num_classes {
                let val = output[[0, t, c]];
                if val > max_val {
                    max_val = val;
                    max_idx = c;
                }
            }

            // Blank token is index 0; CTC collapses repeats.
            if max_idx != 0 && max_idx != prev_idx {
                if let Some(&c) = self.dictionary.get(max_idx) {
                    text.push(c);
                }
            }

            prev_idx = max_idx;
        }

        trace!("Recognized line: '{}'", text);
        Ok(text)
    }

    /// Split a block crop into text lines by horizontal ink projection.
    ///
    /// Rows whose dark-pixel count stays below the noise floor separate
    /// consecutive lines. Falls back to the whole crop when no line
    /// boundary is found.
    fn segment_lines(&self, image: &DynamicImage) -> Vec<DynamicImage> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if height == 0 || width == 0 {
            return vec![image.clone()];
        }

        let noise_floor = (width / 50).max(1);

        let mut lines: Vec<(u32, u32)> = Vec::new();
        let mut current_start: Option<u32> = None;

        for y in 0..height {
            let ink = (0..width).filter(|&x| gray.get_pixel(x, y)[0] < 128).count() as u32;

            if ink >= noise_floor {
                if current_start.is_none() {
                    current_start = Some(y);
                }
            } else if let Some(start) = current_start.take() {
                if y - start >= 3 {
                    lines.push((start, y));
                }
            }
        }
        if let Some(start) = current_start {
            if height - start >= 3 {
                lines.push((start, height));
            }
        }

        if lines.len() <= 1 {
            return vec![image.clone()];
        }

        lines
            .into_iter()
            .map(|(start, end)| image.crop_imm(0, start, width, end - start))
            .collect()
    }
}

impl<B: InferenceBackend> TextRecognizer for CrnnRecognizer<B> {
    fn recognize(&self, region: &DynamicImage, mode: LayoutMode) -> Result<String, OcrError> {
        match mode {
            LayoutMode::SingleLine => self.recognize_line(region),
            LayoutMode::Block => {
                let lines = self.segment_lines(region);
                let mut texts = Vec::with_capacity(lines.len());
                for line in &lines {
                    texts.push(self.recognize_line(line)?);
                }
                Ok(texts.join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    struct NoopBackend {
        names: Vec<String>,
    }

    impl InferenceBackend for NoopBackend {
        fn run(
            &self,
            _inputs: &[(&str, ArrayD<f32>)],
        ) -> admask_inference::Result<Vec<(String, ArrayD<f32>)>> {
            Ok(vec![(
                "out".to_string(),
                ndarray::Array3::<f32>::zeros((1, 4, 3)).into_dyn(),
            )])
        }

        fn input_names(&self) -> &[String] {
            &self.names
        }

        fn output_names(&self) -> &[String] {
            &self.names
        }
    }

    fn recognizer() -> CrnnRecognizer<NoopBackend> {
        CrnnRecognizer::new(
            NoopBackend { names: vec!["x".to_string()] },
            CrnnRecognizer::<NoopBackend>::default_dictionary(),
        )
    }

    #[test]
    fn test_default_dictionary_has_digits_first() {
        let dict = CrnnRecognizer::<NoopBackend>::default_dictionary();

        // Blank token at index 0, digits immediately after.
        assert_eq!(dict[0], ' ');
        assert_eq!(dict[1], '0');
        assert_eq!(dict[10], '9');
        assert!(dict.contains(&'/'));
        assert!(dict.contains(&'-'));
    }

    #[test]
    fn test_decode_ctc_collapses_repeats_and_blanks() {
        let rec = recognizer();

        // Argmax indices per timestep: 1, 1, blank, 2 -> chars '0', '1'.
        let mut out = ndarray::Array3::<f32>::zeros((1, 4, 12));
        out[[0, 0, 1]] = 5.0;
        out[[0, 1, 1]] = 5.0;
        out[[0, 2, 0]] = 5.0;
        out[[0, 3, 2]] = 5.0;

        let text = rec.decode_ctc(&out.into_dyn()).unwrap();
        assert_eq!(text, "01");
    }

    #[test]
    fn test_segment_lines_splits_two_bands() {
        // White canvas with two separated black bands.
        let mut img = RgbImage::from_pixel(100, 60, Rgb([255, 255, 255]));
        for y in 10..20 {
            for x in 0..100 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        for y in 40..50 {
            for x in 0..100 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        let rec = recognizer();
        let lines = rec.segment_lines(&DynamicImage::ImageRgb8(img));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].height(), 10);
        assert_eq!(lines[1].height(), 10);
    }

    #[test]
    fn test_segment_lines_falls_back_to_whole_crop() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 20, Rgb([255, 255, 255])));
        let rec = recognizer();
        let lines = rec.segment_lines(&img);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].dimensions(), (50, 20));
    }
}
