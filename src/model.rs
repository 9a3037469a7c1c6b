//! # Label Data Model
//!
//! This module defines the structures produced by one label analysis:
//! nutrition facts, ingredients, allergens, package metadata, the safety
//! assessment, and the boundary record (`LabelReport`) handed back to callers.
//!
//! Every value is created fresh for one analysis call and is never shared
//! between calls.
//!
//! ## Usage
//!
//! ```rust
//! use label_scan::model::{NutrientKey, NutritionFacts};
//! use label_scan::numeric::{NumericValue, Unit};
//!
//! let mut facts = NutritionFacts::new();
//! facts.insert(NutrientKey::Sodium, NumericValue::new(510.0, Unit::Mg));
//!
//! assert_eq!(facts.amount(NutrientKey::Sodium), Some(510.0));
//! assert!(facts.get(NutrientKey::Protein).is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::numeric::{Confidence, NumericValue, Unit};

/// One raw text produced by a recognition attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTextCandidate {
    /// The recognized text, unmodified
    pub text: String,
    /// Which preprocessing variant and attempt produced it (e.g. "otsu/psm6")
    pub origin: String,
}

impl RawTextCandidate {
    pub fn new(text: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: origin.into(),
        }
    }
}

/// Fixed vocabulary of nutrients the extractor looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientKey {
    Energy,
    Protein,
    Carbohydrate,
    TotalFat,
    SaturatedFat,
    TransFat,
    Sodium,
    AddedSugar,
    TotalSugar,
    DietaryFiber,
    Cholesterol,
    Iron,
    Calcium,
}

impl NutrientKey {
    pub const ALL: [NutrientKey; 13] = [
        NutrientKey::Energy,
        NutrientKey::Protein,
        NutrientKey::Carbohydrate,
        NutrientKey::TotalFat,
        NutrientKey::SaturatedFat,
        NutrientKey::TransFat,
        NutrientKey::Sodium,
        NutrientKey::AddedSugar,
        NutrientKey::TotalSugar,
        NutrientKey::DietaryFiber,
        NutrientKey::Cholesterol,
        NutrientKey::Iron,
        NutrientKey::Calcium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientKey::Energy => "energy",
            NutrientKey::Protein => "protein",
            NutrientKey::Carbohydrate => "carbohydrate",
            NutrientKey::TotalFat => "total_fat",
            NutrientKey::SaturatedFat => "saturated_fat",
            NutrientKey::TransFat => "trans_fat",
            NutrientKey::Sodium => "sodium",
            NutrientKey::AddedSugar => "added_sugar",
            NutrientKey::TotalSugar => "total_sugar",
            NutrientKey::DietaryFiber => "dietary_fiber",
            NutrientKey::Cholesterol => "cholesterol",
            NutrientKey::Iron => "iron",
            NutrientKey::Calcium => "calcium",
        }
    }

    /// Unit assumed when the label shows none
    pub fn default_unit(&self) -> Unit {
        match self {
            NutrientKey::Energy => Unit::Kcal,
            NutrientKey::Sodium
            | NutrientKey::Cholesterol
            | NutrientKey::Iron
            | NutrientKey::Calcium => Unit::Mg,
            _ => Unit::G,
        }
    }

    /// Whether a value written with `unit` can belong to this nutrient
    ///
    /// Energy takes kcal/cal, every other nutrient g/mg; a missing unit fits both.
    pub fn accepts_unit(&self, unit: Unit) -> bool {
        match (self, unit) {
            (_, Unit::None) => true,
            (NutrientKey::Energy, Unit::Kcal | Unit::Cal) => true,
            (NutrientKey::Energy, _) => false,
            (_, Unit::G | Unit::Mg) => true,
            _ => false,
        }
    }
}

impl fmt::Display for NutrientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nutrient values detected on a label
///
/// A missing key means "not detected", never zero. The `sugar` entry is a
/// display field derived from added or total sugar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    #[serde(flatten)]
    values: BTreeMap<NutrientKey, NumericValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sugar: Option<NumericValue>,
}

impl NutritionFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: NutrientKey, value: NumericValue) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: NutrientKey) -> Option<&NumericValue> {
        self.values.get(&key)
    }

    pub fn amount(&self, key: NutrientKey) -> Option<f64> {
        self.values.get(&key).map(|v| v.amount)
    }

    pub fn contains(&self, key: NutrientKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Number of detected nutrients, not counting the derived sugar field
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NutrientKey, &NumericValue)> {
        self.values.iter()
    }

    /// The derived sugar display value
    pub fn sugar(&self) -> Option<&NumericValue> {
        self.sugar.as_ref()
    }

    /// Derive the sugar display field: added sugar, else total sugar
    pub fn derive_sugar(&mut self) {
        self.sugar = self
            .get(NutrientKey::AddedSugar)
            .or_else(|| self.get(NutrientKey::TotalSugar))
            .copied();
    }
}

/// One ingredient as found on the label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Cleaned token before spelling normalization
    pub raw_token: String,
    /// Normalized, title-cased name
    pub normalized_name: String,
}

impl Ingredient {
    pub fn new(raw_token: &str, normalized_name: &str) -> Self {
        Self {
            raw_token: raw_token.to_string(),
            normalized_name: normalized_name.to_string(),
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized_name)
    }
}

/// Canonical allergen names in detection order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllergenSet {
    names: Vec<String>,
}

impl AllergenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an allergen; returns false if it was already present
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.clone()
    }
}

/// Regulatory license number printed on the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub number: Option<String>,
    pub valid: bool,
    pub status: String,
}

impl LicenseInfo {
    pub fn detected(number: &str) -> Self {
        Self {
            number: Some(number.to_string()),
            valid: true,
            status: "FSSAI license detected".to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            number: None,
            valid: false,
            status: "Not Found".to_string(),
        }
    }
}

impl Default for LicenseInfo {
    fn default() -> Self {
        Self::not_found()
    }
}

/// Optional package details; any field may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub serving_size: Option<String>,
    pub manufacturer: Option<String>,
    pub best_before: Option<String>,
    pub country: Option<String>,
    pub license: LicenseInfo,
}

/// Letter grade derived from the safety score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: i32) -> Grade {
        if score >= 80 {
            Grade::A
        } else if score >= 60 {
            Grade::B
        } else if score >= 40 {
            Grade::C
        } else {
            Grade::D
        }
    }
}

/// One score deduction with its reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub reason: String,
    pub magnitude: i32,
}

impl Penalty {
    pub fn new(reason: impl Into<String>, magnitude: i32) -> Self {
        Self {
            reason: reason.into(),
            magnitude,
        }
    }
}

/// Output of the safety scorer and recommendation generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyAssessment {
    /// Clamped score, absent when the profile has no missing-nutrition baseline
    pub score: Option<i32>,
    pub grade: Option<Grade>,
    pub penalties: Vec<Penalty>,
    pub recommendations: Vec<String>,
}

/// Everything the extractors found in one text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedLabel {
    pub nutrition: NutritionFacts,
    pub ingredients: Vec<Ingredient>,
    pub allergens: AllergenSet,
    pub metadata: PackageMetadata,
}

impl ExtractedLabel {
    /// Lower-cased ingredient names joined by spaces, used for keyword rules
    pub fn ingredient_text(&self) -> String {
        self.ingredients
            .iter()
            .map(|i| i.normalized_name.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Boundary record returned to callers, with fixed field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelReport {
    pub raw_text: String,
    pub nutrition_facts: NutritionFacts,
    pub ingredients: Vec<String>,
    pub allergens: Vec<String>,
    pub serving_size: Option<String>,
    pub manufacturer: Option<String>,
    pub best_before: Option<String>,
    pub country: Option<String>,
    pub fssai: LicenseInfo,
    pub safety_score: Option<i32>,
    pub grade: Option<Grade>,
    pub penalties: Vec<Penalty>,
    pub recommendations: Vec<String>,
}

impl LabelReport {
    pub fn assemble(raw_text: &str, label: ExtractedLabel, assessment: SafetyAssessment) -> Self {
        let ExtractedLabel {
            nutrition,
            ingredients,
            allergens,
            metadata,
        } = label;

        Self {
            raw_text: raw_text.to_string(),
            nutrition_facts: nutrition,
            ingredients: ingredients.into_iter().map(|i| i.normalized_name).collect(),
            allergens: allergens.to_vec(),
            serving_size: metadata.serving_size,
            manufacturer: metadata.manufacturer,
            best_before: metadata.best_before,
            country: metadata.country,
            fssai: metadata.license,
            safety_score: assessment.score,
            grade: assessment.grade,
            penalties: assessment.penalties,
            recommendations: assessment.recommendations,
        }
    }
}
