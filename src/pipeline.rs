//! # Label Analysis Pipeline
//!
//! [`LabelAnalyzer`] owns one instance of every component, built once from an
//! [`AnalyzerConfig`], and runs the full flow for one label:
//!
//! 1. pick the best of the recognized text candidates
//! 2. extract nutrition, ingredients, allergens and metadata from that text
//! 3. score the result and generate recommendations
//! 4. assemble the boundary [`LabelReport`]
//!
//! The analyzer holds no mutable state, so one instance can be shared across
//! threads and used for any number of independent requests.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::allergens::AllergenDetector;
use crate::candidate_selector::CandidateSelector;
use crate::config::AnalyzerConfig;
use crate::errors::AnalysisError;
use crate::ingredients::IngredientExtractor;
use crate::metadata::MetadataExtractor;
use crate::model::{ExtractedLabel, LabelReport, RawTextCandidate};
use crate::nutrition::NutritionExtractor;
use crate::ocr::{self, ImagePreprocessor, TextRecognizer};
use crate::recommendations::RecommendationGenerator;
use crate::scoring::SafetyScorer;

const CANDIDATE_EXTENSION: &str = "txt";

pub struct LabelAnalyzer {
    config: AnalyzerConfig,
    selector: CandidateSelector,
    nutrition: NutritionExtractor,
    ingredients: IngredientExtractor,
    allergens: AllergenDetector,
    metadata: MetadataExtractor,
    scorer: SafetyScorer,
    recommendations: RecommendationGenerator,
}

impl LabelAnalyzer {
    /// Build every component; loads the selector dictionary if one is configured
    ///
    /// The scorer always follows `config.profile`, whatever profile the
    /// scoring section names.
    pub fn new(mut config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        config.scoring.profile = config.profile;
        config.scoring.validate()?;

        let selector = match &config.dictionary_path {
            Some(path) => CandidateSelector::from_word_list(path)?,
            None => CandidateSelector::new(),
        };

        let analyzer = Self {
            selector,
            nutrition: NutritionExtractor::with_config(config.extraction.clone())?,
            ingredients: IngredientExtractor::new()?,
            allergens: AllergenDetector::new(config.profile)?,
            metadata: MetadataExtractor::new()?,
            scorer: SafetyScorer::new(config.scoring.clone()),
            recommendations: RecommendationGenerator::new(),
            config,
        };

        info!("Label analyzer ready (profile {:?})", analyzer.config.profile);
        Ok(analyzer)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Run every extractor over one text
    pub fn extract_label(&self, raw_text: &str) -> ExtractedLabel {
        ExtractedLabel {
            nutrition: self.nutrition.extract(raw_text),
            ingredients: self.ingredients.extract(raw_text),
            allergens: self.allergens.detect(raw_text),
            metadata: self.metadata.extract(raw_text),
        }
    }

    /// Analyze one already-selected text
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::config::AnalyzerConfig;
    /// use label_scan::pipeline::LabelAnalyzer;
    ///
    /// let analyzer = LabelAnalyzer::new(AnalyzerConfig::default())?;
    /// let report = analyzer.analyze_text("Sodium 510 mg\nContains: Milk");
    ///
    /// assert_eq!(report.nutrition_facts.amount(label_scan::model::NutrientKey::Sodium), Some(510.0));
    /// assert_eq!(report.allergens, vec!["milk"]);
    /// # Ok::<(), label_scan::errors::AnalysisError>(())
    /// ```
    pub fn analyze_text(&self, raw_text: &str) -> LabelReport {
        let label = self.extract_label(raw_text);

        let mut assessment = self.scorer.assess(&label);
        assessment.recommendations = self.recommendations.generate(&label);

        info!(
            "Analyzed label: {} nutrients, {} ingredients, {} allergens",
            label.nutrition.len(),
            label.ingredients.len(),
            label.allergens.len()
        );
        LabelReport::assemble(raw_text, label, assessment)
    }

    /// Select the best candidate and analyze it; no candidates means empty text
    pub fn analyze_candidates(&self, candidates: &[RawTextCandidate]) -> LabelReport {
        let text = self.selector.select_text(candidates);
        self.analyze_text(&text)
    }

    /// Decode, preprocess and recognize an image, then analyze the best text
    pub fn analyze_image(
        &self,
        bytes: &[u8],
        preprocessor: &dyn ImagePreprocessor,
        recognizer: &dyn TextRecognizer,
    ) -> Result<LabelReport, AnalysisError> {
        let image = ocr::decode_image(bytes)?;
        if !ocr::is_supported_image_format(bytes) {
            let format = image::guess_format(bytes)
                .map(|f| format!("{f:?}"))
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(AnalysisError::UnsupportedFormat(format));
        }

        let candidates = ocr::recognize_candidates(&image, preprocessor, recognizer);
        Ok(self.analyze_candidates(&candidates))
    }
}

/// Load recognized text from disk
///
/// A file is a single candidate. A directory supplies every `*.txt` file in
/// it, in file name order, as candidates for the same label.
pub fn load_text_candidates(path: &Path) -> Result<Vec<RawTextCandidate>, AnalysisError> {
    if !path.is_dir() {
        return Ok(vec![read_candidate(path)?]);
    }

    let mut files = fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|file| {
        file.is_file()
            && file
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CANDIDATE_EXTENSION))
    });
    files.sort();

    debug!("Loading {} candidate files from {}", files.len(), path.display());
    files.iter().map(|file| read_candidate(file)).collect()
}

fn read_candidate(path: &Path) -> Result<RawTextCandidate, AnalysisError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let origin = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(RawTextCandidate::new(text, origin))
}
