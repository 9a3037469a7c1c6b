//! # OCR Tests Module
//!
//! Image decoding, format validation, candidate collection through the
//! recognizer seam, and loading recognized text from disk.

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::io::{Cursor, Write};

    use image::{DynamicImage, ImageOutputFormat};
    use label_scan::config::AnalyzerConfig;
    use label_scan::errors::AnalysisError;
    use label_scan::ocr::{
        decode_image, is_supported_image_format, recognize_candidates, GrayscalePreprocessor,
        ImageVariant, TextRecognizer,
    };
    use label_scan::pipeline::{load_text_candidates, LabelAnalyzer};
    use tempfile::{tempdir, NamedTempFile};

    /// Recognizer returning canned text; fails on the attempts it is told to
    struct ScriptedRecognizer {
        text: String,
        failing: Vec<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedRecognizer {
        fn new(text: &str, failing: Vec<&'static str>) -> Self {
            Self {
                text: text.to_string(),
                failing,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn attempts(&self) -> Vec<String> {
            vec!["psm6".to_string(), "psm4".to_string(), "psm3".to_string()]
        }

        fn recognize(&self, variant: &ImageVariant, attempt: &str) -> Result<String, AnalysisError> {
            self.calls
                .borrow_mut()
                .push(format!("{}/{}", variant.name, attempt));
            if self.failing.iter().any(|failing| *failing == attempt) {
                return Err(AnalysisError::Recognition(format!("{attempt} crashed")));
            }
            Ok(self.text.clone())
        }
    }

    fn encode(image: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_invalid_bytes_are_decode_errors() {
        let result = decode_image(b"this is not an image at all");
        assert!(matches!(result, Err(AnalysisError::ImageDecode(_))));
        assert!(!is_supported_image_format(b"this is not an image at all"));
    }

    #[test]
    fn test_png_round_trip_is_supported() {
        let png = encode(&DynamicImage::new_rgb8(16, 8), ImageOutputFormat::Png);

        assert!(is_supported_image_format(&png));
        let image = decode_image(&png).unwrap();
        assert_eq!((image.width(), image.height()), (16, 8));
    }

    #[test]
    fn test_each_attempt_runs_once_and_failures_are_skipped() {
        let image = DynamicImage::new_rgb8(8, 8);
        let recognizer = ScriptedRecognizer::new("Energy 100 kcal", vec!["psm4"]);

        let candidates = recognize_candidates(&image, &GrayscalePreprocessor, &recognizer);

        let origins: Vec<&str> = candidates.iter().map(|c| c.origin.as_str()).collect();
        assert_eq!(origins, vec!["grayscale/psm6", "grayscale/psm3"]);
        assert_eq!(
            *recognizer.calls.borrow(),
            vec!["grayscale/psm6", "grayscale/psm4", "grayscale/psm3"]
        );
    }

    #[test]
    fn test_analyze_image_with_recognizer() {
        let analyzer = LabelAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let png = encode(&DynamicImage::new_rgb8(8, 8), ImageOutputFormat::Png);
        let recognizer = ScriptedRecognizer::new("Sodium 510 mg\nContains: Milk", vec![]);

        let report = analyzer
            .analyze_image(&png, &GrayscalePreprocessor, &recognizer)
            .unwrap();
        assert_eq!(report.allergens, vec!["milk"]);
    }

    #[test]
    fn test_analyze_image_rejects_unsupported_format() {
        let analyzer = LabelAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let gif = encode(&DynamicImage::new_rgba8(8, 8), ImageOutputFormat::Gif);
        let recognizer = ScriptedRecognizer::new("", vec![]);

        let result = analyzer.analyze_image(&gif, &GrayscalePreprocessor, &recognizer);
        assert!(matches!(result, Err(AnalysisError::UnsupportedFormat(_))));
        assert!(recognizer.calls.borrow().is_empty());
    }

    #[test]
    fn test_analyze_image_rejects_garbage() {
        let analyzer = LabelAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let recognizer = ScriptedRecognizer::new("", vec![]);

        let result = analyzer.analyze_image(b"garbage", &GrayscalePreprocessor, &recognizer);
        assert!(matches!(result, Err(AnalysisError::ImageDecode(_))));
    }

    #[test]
    fn test_load_single_text_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Protein 6.7 g").unwrap();

        let candidates = load_text_candidates(file.path()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "Protein 6.7 g");
    }

    #[test]
    fn test_load_candidate_directory_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_psm4.txt"), "second").unwrap();
        fs::write(dir.path().join("a_psm6.txt"), "first").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let candidates = load_text_candidates(dir.path()).unwrap();
        let origins: Vec<&str> = candidates.iter().map(|c| c.origin.as_str()).collect();
        assert_eq!(origins, vec!["a_psm6.txt", "b_psm4.txt"]);
        assert_eq!(candidates[0].text, "first");
    }

    #[test]
    fn test_load_text_with_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1_psm6.txt");
        fs::write(&path, b"Sodium 510 mg\n\xffnergie 553 kcal").unwrap();

        let candidates = load_text_candidates(&path).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].text.starts_with("Sodium 510 mg"));
        assert!(candidates[0].text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_missing_text_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load_text_candidates(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}
