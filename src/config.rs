//! # Analyzer Configuration Module
//!
//! This module defines the configuration structures for label analysis:
//! the named profile, the empirical distances used by the nutrition
//! extractor, and the score bounds used by the safety scorer.

use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AnalysisError;

// Constants for extraction tuning
pub const DEFAULT_LABEL_VALUE_GAP: usize = 12;
pub const DEFAULT_PROXIMITY_WINDOW: usize = 40;
pub const DEFAULT_SODIUM_CORRECTION_DISTANCE: usize = 60;
pub const DEFAULT_SODIUM_ALERT_THRESHOLD: f64 = 1500.0;
pub const DEFAULT_SODIUM_PLAUSIBLE_BAND: RangeInclusive<u32> = 50..=2000;

// Environment variable names read by `AnalyzerConfig::from_env`
pub const ENV_PROFILE: &str = "LABEL_SCAN_PROFILE";
pub const ENV_PROXIMITY_WINDOW: &str = "LABEL_SCAN_PROXIMITY_WINDOW";
pub const ENV_SODIUM_DISTANCE: &str = "LABEL_SCAN_SODIUM_DISTANCE";
pub const ENV_LABEL_GAP: &str = "LABEL_SCAN_LABEL_GAP";
pub const ENV_DICTIONARY: &str = "LABEL_SCAN_DICTIONARY";

/// Named analysis profile, selected once when the analyzer is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Consumer-facing scoring: narrow bounds, whole-text allergen scan
    #[default]
    Lenient,
    /// Regulatory-style scoring: full range, allergens only from "contains" labels
    Strict,
}

impl FromStr for Profile {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(Profile::Lenient),
            "strict" => Ok(Profile::Strict),
            other => Err(AnalysisError::Config(format!(
                "unknown profile '{other}' (expected 'lenient' or 'strict')"
            ))),
        }
    }
}

/// Tunable distances and thresholds for nutrition extraction
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Maximum characters allowed between a nutrient label and its value
    pub label_value_gap: usize,
    /// Characters inspected before a numeric token during proximity fallback
    pub proximity_window: usize,
    /// Maximum distance between a sodium keyword and a replacement value
    pub sodium_correction_distance: usize,
    /// Sodium values above this (mg) trigger the plausibility correction
    pub sodium_alert_threshold: f64,
    /// Replacement sodium values must fall in this band (mg)
    pub sodium_plausible_band: RangeInclusive<u32>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            label_value_gap: DEFAULT_LABEL_VALUE_GAP,
            proximity_window: DEFAULT_PROXIMITY_WINDOW,
            sodium_correction_distance: DEFAULT_SODIUM_CORRECTION_DISTANCE,
            sodium_alert_threshold: DEFAULT_SODIUM_ALERT_THRESHOLD,
            sodium_plausible_band: DEFAULT_SODIUM_PLAUSIBLE_BAND,
        }
    }
}

/// Score bounds and short-circuit values for the safety scorer
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Which rule set the scorer applies
    pub profile: Profile,
    /// Score reported when no nutrition facts were detected; `None` leaves it absent
    pub missing_nutrition_score: Option<i32>,
    /// Lowest score ever reported
    pub floor: i32,
    /// Highest score ever reported
    pub ceiling: i32,
    /// Score for a single recognised whole-food ingredient
    pub whole_food_score: i32,
}

impl ScoringConfig {
    pub fn lenient() -> Self {
        Self {
            profile: Profile::Lenient,
            missing_nutrition_score: Some(60),
            floor: 40,
            ceiling: 95,
            whole_food_score: 90,
        }
    }

    pub fn strict() -> Self {
        Self {
            profile: Profile::Strict,
            missing_nutrition_score: None,
            floor: 0,
            ceiling: 100,
            whole_food_score: 90,
        }
    }

    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Lenient => Self::lenient(),
            Profile::Strict => Self::strict(),
        }
    }

    /// Reject bounds that leave no score to report
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.floor > self.ceiling {
            return Err(AnalysisError::Config(format!(
                "score floor {} is above ceiling {}",
                self.floor, self.ceiling
            )));
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::lenient()
    }
}

/// Top-level configuration for a `LabelAnalyzer`
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Selected profile; drives allergen strictness and scoring rules
    pub profile: Profile,
    /// Nutrition extraction tuning
    pub extraction: ExtractionConfig,
    /// Safety scorer bounds
    pub scoring: ScoringConfig,
    /// Optional word list (one word per line) used by the candidate selector
    pub dictionary_path: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

impl AnalyzerConfig {
    /// Default configuration for the given profile
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            extraction: ExtractionConfig::default(),
            scoring: ScoringConfig::for_profile(profile),
            dictionary_path: None,
        }
    }

    /// Build a configuration from `LABEL_SCAN_*` environment variables
    ///
    /// Unset variables keep their defaults. Malformed values are rejected
    /// with `AnalysisError::Config`.
    pub fn from_env() -> Result<Self, AnalysisError> {
        let profile = match env::var(ENV_PROFILE) {
            Ok(value) => value.parse()?,
            Err(_) => Profile::default(),
        };

        let mut config = Self::for_profile(profile);

        if let Some(window) = read_usize(ENV_PROXIMITY_WINDOW)? {
            config.extraction.proximity_window = window;
        }
        if let Some(distance) = read_usize(ENV_SODIUM_DISTANCE)? {
            config.extraction.sodium_correction_distance = distance;
        }
        if let Some(gap) = read_usize(ENV_LABEL_GAP)? {
            config.extraction.label_value_gap = gap;
        }
        if let Ok(path) = env::var(ENV_DICTIONARY) {
            if !path.trim().is_empty() {
                config.dictionary_path = Some(PathBuf::from(path));
            }
        }

        Ok(config)
    }
}

fn read_usize(name: &str) -> Result<Option<usize>, AnalysisError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| AnalysisError::Config(format!("{name} must be a positive integer, got '{value}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parsing() {
        assert_eq!("lenient".parse::<Profile>().unwrap(), Profile::Lenient);
        assert_eq!(" STRICT ".parse::<Profile>().unwrap(), Profile::Strict);
        assert!("loose".parse::<Profile>().is_err());
    }

    #[test]
    fn test_scoring_profiles() {
        let lenient = ScoringConfig::lenient();
        assert_eq!(lenient.missing_nutrition_score, Some(60));
        assert_eq!((lenient.floor, lenient.ceiling), (40, 95));

        let strict = ScoringConfig::strict();
        assert_eq!(strict.missing_nutrition_score, None);
        assert_eq!((strict.floor, strict.ceiling), (0, 100));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(ScoringConfig::lenient().validate().is_ok());
        assert!(ScoringConfig::strict().validate().is_ok());

        let inverted = ScoringConfig {
            floor: 80,
            ceiling: 20,
            ..ScoringConfig::lenient()
        };
        assert!(matches!(inverted.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_analyzer_config_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.profile, Profile::Lenient);
        assert_eq!(config.extraction.label_value_gap, 12);
        assert_eq!(config.extraction.proximity_window, 40);
        assert_eq!(config.extraction.sodium_correction_distance, 60);
        assert_eq!(config.extraction.sodium_plausible_band, 50..=2000);
        assert!(config.dictionary_path.is_none());
    }
}
