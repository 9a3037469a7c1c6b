//! # OCR Collaborator Module
//!
//! Image decoding plus the two seams the analyzer uses to get text out of a
//! label photo: an [`ImagePreprocessor`] producing named filtered variants,
//! and a [`TextRecognizer`] turning one variant into plain text.
//!
//! Each variant is recognized once per attempt the recognizer declares. A
//! failed attempt is logged and skipped, never retried; the candidate
//! selector picks the best text afterwards.
//!
//! With the `tesseract` feature enabled, [`TesseractRecognizer`] runs
//! Tesseract through `leptess` with page segmentation modes 6, 4 and 3.

use image::{DynamicImage, ImageFormat};
use log::{debug, info, warn};

use crate::errors::AnalysisError;
use crate::model::RawTextCandidate;

/// Minimum header length needed for format detection
const FORMAT_SNIFF_BYTES: usize = 8;

/// Decode raw bytes into an image
///
/// # Examples
///
/// ```rust
/// use label_scan::errors::AnalysisError;
/// use label_scan::ocr::decode_image;
///
/// let result = decode_image(b"definitely not an image");
/// assert!(matches!(result, Err(AnalysisError::ImageDecode(_))));
/// ```
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, AnalysisError> {
    let image = image::load_from_memory(bytes)?;
    debug!("Decoded image {}x{}", image.width(), image.height());
    Ok(image)
}

/// Whether the bytes look like a format Tesseract accepts (PNG, JPEG, BMP, TIFF)
pub fn is_supported_image_format(bytes: &[u8]) -> bool {
    if bytes.len() < FORMAT_SNIFF_BYTES {
        debug!(
            "Could not read enough bytes to determine image format (got {}, need at least {})",
            bytes.len(),
            FORMAT_SNIFF_BYTES
        );
        return false;
    }

    match image::guess_format(bytes) {
        Ok(format) => {
            let supported = matches!(
                format,
                ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Tiff
            );
            debug!("Detected image format {:?} (supported: {})", format, supported);
            supported
        }
        Err(e) => {
            debug!("Could not determine image format: {}", e);
            false
        }
    }
}

/// One filtered version of the input image
#[derive(Debug, Clone)]
pub struct ImageVariant {
    /// Filter name, used in candidate origins ("grayscale", "otsu", ...)
    pub name: String,
    pub image: DynamicImage,
}

impl ImageVariant {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

/// Produces the filtered variants that get recognized
pub trait ImagePreprocessor {
    fn variants(&self, image: &DynamicImage) -> Vec<ImageVariant>;
}

/// Built-in preprocessor yielding a single grayscale variant
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscalePreprocessor;

impl ImagePreprocessor for GrayscalePreprocessor {
    fn variants(&self, image: &DynamicImage) -> Vec<ImageVariant> {
        vec![ImageVariant::new("grayscale", image.grayscale())]
    }
}

/// Turns one image variant into plain text
pub trait TextRecognizer {
    /// Attempt names, each run once per variant (e.g. "psm6")
    fn attempts(&self) -> Vec<String>;

    fn recognize(&self, variant: &ImageVariant, attempt: &str) -> Result<String, AnalysisError>;
}

/// Run every attempt on every variant once and collect the outputs
///
/// Failed attempts are skipped with a warning. Each candidate is tagged
/// `"<variant>/<attempt>"`.
pub fn recognize_candidates(
    image: &DynamicImage,
    preprocessor: &dyn ImagePreprocessor,
    recognizer: &dyn TextRecognizer,
) -> Vec<RawTextCandidate> {
    let attempts = recognizer.attempts();
    let mut candidates = Vec::new();

    for variant in preprocessor.variants(image) {
        for attempt in &attempts {
            let origin = format!("{}/{}", variant.name, attempt);
            match recognizer.recognize(&variant, attempt) {
                Ok(text) => {
                    debug!("Recognized {} characters from {}", text.len(), origin);
                    candidates.push(RawTextCandidate::new(text, origin));
                }
                Err(e) => warn!("Recognition attempt {} failed: {}", origin, e),
            }
        }
    }

    info!("Collected {} text candidates", candidates.len());
    candidates
}

#[cfg(feature = "tesseract")]
pub use self::tesseract::TesseractRecognizer;

#[cfg(feature = "tesseract")]
mod tesseract {
    use std::io::Cursor;

    use image::ImageOutputFormat;
    use leptess::{LepTess, Variable};
    use log::trace;

    use super::{ImageVariant, TextRecognizer};
    use crate::errors::AnalysisError;

    /// Page segmentation modes tried per variant: block, column, automatic
    const PAGE_SEGMENTATION_MODES: &[&str] = &["6", "4", "3"];

    /// Tesseract recognizer; a fresh engine is initialised per attempt
    #[derive(Debug, Clone)]
    pub struct TesseractRecognizer {
        data_path: Option<String>,
        language: String,
    }

    impl Default for TesseractRecognizer {
        fn default() -> Self {
            Self::new(None, "eng")
        }
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<&str>, language: &str) -> Self {
            Self {
                data_path: data_path.map(str::to_string),
                language: language.to_string(),
            }
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn attempts(&self) -> Vec<String> {
            PAGE_SEGMENTATION_MODES
                .iter()
                .map(|mode| format!("psm{mode}"))
                .collect()
        }

        fn recognize(&self, variant: &ImageVariant, attempt: &str) -> Result<String, AnalysisError> {
            let mode = attempt.trim_start_matches("psm");

            let mut png = Vec::new();
            variant
                .image
                .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;

            let mut tess = LepTess::new(self.data_path.as_deref(), &self.language).map_err(|e| {
                AnalysisError::Recognition(format!("Failed to initialize Tesseract OCR: {e}"))
            })?;
            tess.set_variable(Variable::TesseditPagesegMode, mode)
                .map_err(|e| AnalysisError::Recognition(format!("Invalid page segmentation mode {mode}: {e}")))?;
            tess.set_image_from_mem(&png)
                .map_err(|e| AnalysisError::Recognition(format!("Failed to load image for OCR: {e}")))?;

            let text = tess
                .get_utf8_text()
                .map_err(|e| AnalysisError::Recognition(format!("Failed to extract text: {e}")))?;

            // Drop blank lines, keep line structure for the extractors
            let cleaned = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            trace!("Tesseract psm {} output: {:?}", mode, cleaned);

            Ok(cleaned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_is_unsupported() {
        assert!(!is_supported_image_format(b"\x89PNG"));
        assert!(!is_supported_image_format(b""));
    }

    #[test]
    fn test_png_header_is_supported() {
        let header = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert!(is_supported_image_format(header));
    }

    #[test]
    fn test_gif_header_is_unsupported() {
        assert!(!is_supported_image_format(b"GIF89a\x01\0\x01\0\0\0"));
    }

    #[test]
    fn test_grayscale_variant() {
        let image = DynamicImage::new_rgb8(4, 4);
        let variants = GrayscalePreprocessor.variants(&image);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].name, "grayscale");
        assert_eq!(variants[0].image.width(), 4);
    }
}
