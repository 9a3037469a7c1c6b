//! # Nutrition Extraction Module
//!
//! Turns recognized label text into `NutritionFacts`.
//!
//! ## Strategy
//!
//! 1. Label patterns: a nutrient label followed, within a short gap, by a number
//!    and an optional unit (`"Sodium 510 mg"`, `"Energy (kcal) 553"`)
//! 2. Unit normalization: sodium reported in grams becomes milligrams
//! 3. Decimal recovery: values outside the nutrient's sanity range are divided
//!    by 10, then 100, and kept at low confidence when that lands in range
//! 4. Rejection of implausible trans fat, added sugar and protein values
//! 5. Proximity fallback for nutrients whose label was mangled by OCR
//! 6. Sodium plausibility correction
//! 7. The derived `sugar` display field

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::{debug, info, trace, warn};
use regex::Regex;

use crate::config::ExtractionConfig;
use crate::model::{NutrientKey, NutritionFacts};
use crate::numeric::{parse_number, round2, Confidence, NumericValue, Unit};

/// Plausible per-100g (or per serving) bounds for a nutrient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanityRange {
    pub min: f64,
    pub max: f64,
}

impl SanityRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

lazy_static! {
    static ref SANITY_RANGES: HashMap<NutrientKey, SanityRange> = {
        let mut map = HashMap::new();
        map.insert(NutrientKey::Protein, SanityRange::new(0.0, 30.0));
        map.insert(NutrientKey::Carbohydrate, SanityRange::new(0.0, 100.0));
        map.insert(NutrientKey::TotalFat, SanityRange::new(0.0, 100.0));
        map.insert(NutrientKey::SaturatedFat, SanityRange::new(0.0, 100.0));
        map.insert(NutrientKey::TransFat, SanityRange::new(0.0, 100.0));
        map.insert(NutrientKey::DietaryFiber, SanityRange::new(0.0, 15.0));
        map.insert(NutrientKey::AddedSugar, SanityRange::new(0.0, 100.0));
        map.insert(NutrientKey::TotalSugar, SanityRange::new(0.0, 100.0));
        map.insert(NutrientKey::Cholesterol, SanityRange::new(0.0, 300.0));
        map.insert(NutrientKey::Sodium, SanityRange::new(0.0, 5000.0));
        map.insert(NutrientKey::Iron, SanityRange::new(0.0, 20.0));
        map.insert(NutrientKey::Calcium, SanityRange::new(0.0, 150.0));
        map
    };
}

/// Label regex fragment and accepted unit tokens per nutrient
const LABEL_PATTERNS: &[(NutrientKey, &str, &str)] = &[
    (NutrientKey::Energy, r"(?:energy|ener|calories)", "kcal|cal"),
    (NutrientKey::Protein, r"(?:protein|prt)", "g"),
    (NutrientKey::Carbohydrate, r"carbohydrates?", "g"),
    (NutrientKey::TotalFat, r"(?:total\s+fat|totalfat|fat\s*total)", "g"),
    (NutrientKey::SaturatedFat, r"saturated[^a-z]{0,5}fat", "g"),
    (NutrientKey::TransFat, r"trans[^a-z]{0,5}fat", "g"),
    (NutrientKey::Sodium, r"sodium", "mg|g"),
    (NutrientKey::AddedSugar, r"added\s*sugars?", "g"),
    (NutrientKey::TotalSugar, r"total\s*sugars?", "g"),
    (NutrientKey::DietaryFiber, r"(?:dietary\s+)?fib(?:re|er)", "g"),
    (NutrientKey::Cholesterol, r"cholesterol", "mg|g"),
    (NutrientKey::Iron, r"iron", "mg"),
    (NutrientKey::Calcium, r"calcium", "mg"),
];

/// Spellings seen in front of a value when the label itself is mangled
const PROXIMITY_SYNONYMS: &[(NutrientKey, &[&str])] = &[
    (NutrientKey::Energy, &["energy", "calories"]),
    (NutrientKey::Protein, &["protein", "prot"]),
    (NutrientKey::Carbohydrate, &["carbohydrate", "carbo"]),
    (
        NutrientKey::TotalFat,
        &["total f", "totalf", "total fat", "total: f", "total:fat", "total:f", "total f:"],
    ),
    (
        NutrientKey::SaturatedFat,
        &["saturated", "soturated", "soturated fat", "satruated"],
    ),
    (NutrientKey::TransFat, &["trans fat", "transf", "trans fat o", "transfat"]),
    (NutrientKey::Sodium, &["sodium", "sec", "sot", "sod", "na", "salt"]),
    (NutrientKey::AddedSugar, &["added sugar", "added sas", "assad sas", "added sac"]),
    (NutrientKey::TotalSugar, &["total sugar", "total s", "total: sugar"]),
    (NutrientKey::DietaryFiber, &["fibre", "fiber"]),
    (NutrientKey::Cholesterol, &["cholesterol", "cholest"]),
    (NutrientKey::Iron, &["iron"]),
    (NutrientKey::Calcium, &["calcium"]),
];

const NUMERIC_TOKEN_PATTERN: &str = r"([0-9][0-9,.]{0,8})\s*(mg|g|kcal|cal)?";
const SODIUM_KEYWORD_PATTERN: &str = r"sodium|sec|salt|\bna\b|sod";
const SODIUM_TOKEN_PATTERN: &str = r"([0-9]{2,4})\s*(mg|m)?";

/// Sanity range for a nutrient, if it has one
pub fn sanity_range(key: NutrientKey) -> Option<SanityRange> {
    SANITY_RANGES.get(&key).copied()
}

/// Reinsert a decimal point OCR dropped, using the nutrient's sanity range
///
/// Returns the (possibly corrected) amount and how much to trust it.
/// Sodium is only flagged, never divided: its implausible values are
/// handled by the plausibility correction instead.
///
/// # Examples
///
/// ```rust
/// use label_scan::model::NutrientKey;
/// use label_scan::numeric::Confidence;
/// use label_scan::nutrition::recover_decimal;
///
/// let (amount, confidence) = recover_decimal(NutrientKey::Carbohydrate, 5269.0);
/// assert!((amount - 52.69).abs() < 1e-9);
/// assert_eq!(confidence, Confidence::Low);
/// ```
pub fn recover_decimal(key: NutrientKey, amount: f64) -> (f64, Confidence) {
    let Some(range) = sanity_range(key) else {
        return (amount, Confidence::High);
    };

    if range.contains(amount) {
        return (amount, Confidence::High);
    }

    if key == NutrientKey::Sodium {
        warn!("Sodium value {} mg outside sanity range, flagged", amount);
        return (amount, Confidence::Low);
    }

    for divisor in [10.0, 100.0] {
        let candidate = amount / divisor;
        if range.contains(candidate) {
            debug!(
                "Recovered decimal for {}: {} -> {} (/{})",
                key, amount, candidate, divisor
            );
            return (candidate, Confidence::Low);
        }
    }

    warn!(
        "Value {} for {} outside sanity range [{}, {}], kept and flagged",
        amount, key, range.min, range.max
    );
    (amount, Confidence::Low)
}

/// Values that are discarded outright, after unit correction and recovery
fn is_implausible(key: NutrientKey, amount: f64) -> bool {
    match key {
        NutrientKey::TransFat => amount > 10.0,
        NutrientKey::AddedSugar => amount > 100.0,
        NutrientKey::Protein => amount > 500.0,
        _ => false,
    }
}

/// Start of the window of at most `width` bytes ending at `end`, on a char boundary
fn window_start(text: &str, end: usize, width: usize) -> usize {
    let mut start = end.saturating_sub(width);
    while start < end && !text.is_char_boundary(start) {
        start += 1;
    }
    start
}

/// Whether `synonym` starts a word somewhere in `text[start..end]`
///
/// "na" counts in "na 120 mg" but not inside "nutritional".
fn mentions_at_word_start(text: &str, start: usize, end: usize, synonym: &str) -> bool {
    text[start..end].match_indices(synonym).any(|(offset, _)| {
        text[..start + offset]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// A number found anywhere in the text, with the unit written after it
#[derive(Debug, Clone)]
struct NumericToken {
    start: usize,
    token: String,
    unit: Unit,
}

/// Nutrition extractor with precompiled label patterns
pub struct NutritionExtractor {
    labels: Vec<(NutrientKey, Regex)>,
    numeric_token: Regex,
    sodium_keyword: Regex,
    sodium_token: Regex,
    config: ExtractionConfig,
}

impl NutritionExtractor {
    /// Create an extractor with default distances
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_config(ExtractionConfig::default())
    }

    /// Create an extractor with custom distances
    ///
    /// All patterns are compiled here, once per extractor.
    pub fn with_config(config: ExtractionConfig) -> Result<Self, regex::Error> {
        let labels = LABEL_PATTERNS
            .iter()
            .map(|(key, label, units)| {
                let pattern = format!(
                    r"\b{label}\b[^\d\n]{{0,{gap}}}([0-9][0-9,.]{{0,8}})\s*({units})?",
                    gap = config.label_value_gap
                );
                Regex::new(&pattern).map(|regex| (*key, regex))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Compiled {} nutrient label patterns (gap={}, window={})",
            labels.len(),
            config.label_value_gap,
            config.proximity_window
        );

        Ok(Self {
            labels,
            numeric_token: Regex::new(NUMERIC_TOKEN_PATTERN)?,
            sodium_keyword: Regex::new(SODIUM_KEYWORD_PATTERN)?,
            sodium_token: Regex::new(SODIUM_TOKEN_PATTERN)?,
            config,
        })
    }

    /// Extract nutrition facts from raw recognized text
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::model::NutrientKey;
    /// use label_scan::nutrition::NutritionExtractor;
    ///
    /// let extractor = NutritionExtractor::new()?;
    /// let facts = extractor.extract("Protein 6.7 g\nSodium 510 mg");
    ///
    /// assert_eq!(facts.amount(NutrientKey::Protein), Some(6.7));
    /// assert_eq!(facts.amount(NutrientKey::Sodium), Some(510.0));
    /// # Ok::<(), regex::Error>(())
    /// ```
    pub fn extract(&self, raw_text: &str) -> NutritionFacts {
        let text = raw_text.to_lowercase();
        let mut facts = NutritionFacts::new();

        self.match_labels(&text, &mut facts);

        // Only labels that were clearly present make the fallback trustworthy
        if !facts.is_empty() {
            self.fill_by_proximity(&text, &mut facts);
        }

        self.correct_sodium(&text, &mut facts);
        facts.derive_sugar();

        info!("Extracted {} nutrition facts", facts.len());
        facts
    }

    /// Apply unit normalization, decimal recovery and rejection to one value
    ///
    /// Returns `None` when the written unit cannot belong to the nutrient
    /// (an energy figure offered as sodium) or the value is implausible.
    pub fn normalize_value(&self, key: NutrientKey, amount: f64, unit: Unit) -> Option<NumericValue> {
        if !key.accepts_unit(unit) {
            debug!("Unit '{}' does not fit {}, skipping value {}", unit.as_str(), key, amount);
            return None;
        }

        let mut unit = if unit.is_none() { key.default_unit() } else { unit };
        let mut amount = amount;

        if key == NutrientKey::Sodium && unit == Unit::G {
            amount *= 1000.0;
            unit = Unit::Mg;
        }

        let (amount, confidence) = recover_decimal(key, amount);

        if is_implausible(key, amount) {
            debug!("Discarding implausible {} value {}", key, amount);
            return None;
        }

        Some(NumericValue::new(round2(amount), unit).with_confidence(confidence))
    }

    fn match_labels(&self, text: &str, facts: &mut NutritionFacts) {
        for (key, pattern) in &self.labels {
            let Some(captures) = pattern.captures(text) else {
                continue;
            };
            let Some(token) = captures.get(1) else {
                continue;
            };
            trace!("Label match for {}: '{}'", key, &captures[0]);

            let Some((amount, detected_unit)) = parse_number(token.as_str()) else {
                debug!("Could not parse value '{}' for {}", token.as_str(), key);
                continue;
            };

            let unit = match captures.get(2) {
                Some(unit_token) => Unit::from_token(unit_token.as_str()),
                None => detected_unit,
            };

            if let Some(value) = self.normalize_value(*key, amount, unit) {
                debug!("{} = {} {}", key, value.amount, value.unit.as_str());
                facts.insert(*key, value);
            }
        }
    }

    fn numeric_tokens(&self, text: &str) -> Vec<NumericToken> {
        self.numeric_token
            .captures_iter(text)
            .filter_map(|captures| {
                let token = captures.get(1)?;
                Some(NumericToken {
                    start: token.start(),
                    token: token.as_str().to_string(),
                    unit: captures
                        .get(2)
                        .map(|u| Unit::from_token(u.as_str()))
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    fn fill_by_proximity(&self, text: &str, facts: &mut NutritionFacts) {
        let tokens = self.numeric_tokens(text);

        for (key, synonyms) in PROXIMITY_SYNONYMS {
            if facts.contains(*key) {
                continue;
            }

            for token in &tokens {
                let start = window_start(text, token.start, self.config.proximity_window);
                if !synonyms
                    .iter()
                    .any(|synonym| mentions_at_word_start(text, start, token.start, synonym))
                {
                    continue;
                }

                let Some((amount, detected_unit)) = parse_number(&token.token) else {
                    continue;
                };
                let unit = if token.unit.is_none() { detected_unit } else { token.unit };

                if let Some(value) = self.normalize_value(*key, amount, unit) {
                    debug!(
                        "Proximity fallback assigned {} = {} from '{}'",
                        key, value.amount, token.token
                    );
                    facts.insert(*key, value);
                    break;
                }
            }
        }
    }

    fn correct_sodium(&self, text: &str, facts: &mut NutritionFacts) {
        let Some(current) = facts.get(NutrientKey::Sodium).copied() else {
            return;
        };
        if current.amount <= self.config.sodium_alert_threshold {
            return;
        }

        let keywords: Vec<usize> = self.sodium_keyword.find_iter(text).map(|m| m.start()).collect();
        if keywords.is_empty() {
            return;
        }

        let mut best: Option<(usize, u32)> = None;
        for captures in self.sodium_token.captures_iter(text) {
            let Some(digits) = captures.get(1) else {
                continue;
            };
            let Ok(value) = digits.as_str().parse::<u32>() else {
                continue;
            };
            if !self.config.sodium_plausible_band.contains(&value) {
                continue;
            }

            let start = digits.start();
            let Some(distance) = keywords.iter().map(|k| start.abs_diff(*k)).min() else {
                continue;
            };
            if distance <= self.config.sodium_correction_distance
                && best.map_or(true, |(best_distance, _)| distance < best_distance)
            {
                best = Some((distance, value));
            }
        }

        if let Some((distance, value)) = best {
            info!(
                "Corrected implausible sodium {} mg -> {} mg (keyword distance {})",
                current.amount, value, distance
            );
            facts.insert(
                NutrientKey::Sodium,
                NumericValue::new(f64::from(value), Unit::Mg).with_confidence(Confidence::Low),
            );
        }
    }
}
