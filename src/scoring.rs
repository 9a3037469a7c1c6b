//! # Safety Scoring Module
//!
//! Rule-based 0–100 safety score computed from extracted nutrition facts,
//! ingredients and allergens. The rule set and the score bounds come from the
//! configured [`Profile`]:
//!
//! - **Lenient**: missing nutrition reports a fixed baseline; penalties for
//!   partial nutrition, oil, high fat, high or hidden sodium, long ingredient
//!   lists; bounds [40, 95].
//! - **Strict**: missing nutrition leaves the score absent; penalties for
//!   sugar, fat, sodium, ultra-processing markers and allergens; bounds [0, 100].
//!
//! A single recognised whole-food ingredient short-circuits to a high score
//! in both profiles.

use log::{debug, info};

use crate::config::{Profile, ScoringConfig};
use crate::model::{ExtractedLabel, Grade, NutrientKey, Penalty, SafetyAssessment};

const BASELINE_SCORE: i32 = 100;

const WHOLE_FOODS: &[&str] = &["dates", "rice", "wheat", "oats"];
const ULTRA_PROCESSED_KEYWORDS: &[&str] = &["emulsifier", "artificial", "preservative"];

const MIN_NUTRITION_KEYS: usize = 4;
const MAX_SIMPLE_INGREDIENTS: usize = 3;
const HIGH_FAT_G: f64 = 30.0;
const MODERATE_FAT_G: f64 = 5.0;
const HIGH_SODIUM_MG: f64 = 400.0;
const HIGH_SUGAR_G: f64 = 10.0;
const ALLERGEN_PENALTY: i32 = 5;

/// Scores an extracted label under one profile
#[derive(Debug, Clone, Default)]
pub struct SafetyScorer {
    config: ScoringConfig,
}

impl SafetyScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score, grade and penalties for one label; recommendations are left empty
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::config::ScoringConfig;
    /// use label_scan::model::ExtractedLabel;
    /// use label_scan::scoring::SafetyScorer;
    ///
    /// let scorer = SafetyScorer::new(ScoringConfig::lenient());
    /// let assessment = scorer.assess(&ExtractedLabel::default());
    ///
    /// assert_eq!(assessment.score, Some(60));
    /// assert!(assessment.penalties.is_empty());
    /// ```
    pub fn assess(&self, label: &ExtractedLabel) -> SafetyAssessment {
        if label.nutrition.is_empty() {
            debug!("No nutrition facts; using missing-nutrition baseline");
            return self.finish(self.config.missing_nutrition_score, Vec::new());
        }

        if is_whole_food(label) {
            debug!("Single whole-food ingredient; short-circuit score");
            return self.finish(Some(self.config.whole_food_score), Vec::new());
        }

        let penalties = match self.config.profile {
            Profile::Lenient => lenient_penalties(label),
            Profile::Strict => strict_penalties(label),
        };
        let raw = BASELINE_SCORE - penalties.iter().map(|p| p.magnitude).sum::<i32>();

        self.finish(Some(raw), penalties)
    }

    fn finish(&self, raw: Option<i32>, penalties: Vec<Penalty>) -> SafetyAssessment {
        // Ceiling wins over an inverted floor; `LabelAnalyzer` rejects such configs
        let score = raw.map(|s| s.max(self.config.floor).min(self.config.ceiling));
        if let Some(score) = score {
            info!(
                "Safety score {} ({} penalties, raw {:?})",
                score,
                penalties.len(),
                raw
            );
        }

        SafetyAssessment {
            score,
            grade: score.map(Grade::from_score),
            penalties,
            recommendations: Vec::new(),
        }
    }
}

fn is_whole_food(label: &ExtractedLabel) -> bool {
    match label.ingredients.as_slice() {
        [only] => {
            let name = only.normalized_name.to_lowercase();
            WHOLE_FOODS.contains(&name.as_str())
        }
        _ => false,
    }
}

fn lenient_penalties(label: &ExtractedLabel) -> Vec<Penalty> {
    let nutrition = &label.nutrition;
    let ingredient_text = label.ingredient_text();
    let has_oil = ingredient_text.contains("oil");
    let mut penalties = Vec::new();

    if nutrition.len() < MIN_NUTRITION_KEYS {
        penalties.push(Penalty::new(
            format!("Partial nutrition information ({} nutrients)", nutrition.len()),
            15,
        ));
    }

    if has_oil {
        penalties.push(Penalty::new("Contains added oil", 20));
    }

    if let Some(fat) = nutrition.amount(NutrientKey::TotalFat).filter(|f| *f > HIGH_FAT_G) {
        penalties.push(Penalty::new(format!("High fat ({fat}g)"), 15));
    }

    match nutrition.amount(NutrientKey::Sodium) {
        None if has_oil => {
            penalties.push(Penalty::new("Sodium not declared for processed food", 10));
        }
        Some(sodium) if sodium > HIGH_SODIUM_MG => {
            penalties.push(Penalty::new(format!("High sodium ({sodium}mg)"), 10));
        }
        _ => {}
    }

    if label.ingredients.len() > MAX_SIMPLE_INGREDIENTS {
        penalties.push(Penalty::new(
            format!("Many ingredients ({})", label.ingredients.len()),
            5,
        ));
    }

    penalties
}

fn strict_penalties(label: &ExtractedLabel) -> Vec<Penalty> {
    let nutrition = &label.nutrition;
    let mut penalties = Vec::new();

    if let Some(sugar) = nutrition.sugar().map(|v| v.amount).filter(|s| *s > HIGH_SUGAR_G) {
        penalties.push(Penalty::new(format!("High sugar ({sugar}g)"), 15));
    }

    if let Some(fat) = nutrition
        .amount(NutrientKey::TotalFat)
        .filter(|f| *f > MODERATE_FAT_G)
    {
        let magnitude = if fat > HIGH_FAT_G { 10 } else { 5 };
        penalties.push(Penalty::new(format!("High fat ({fat}g)"), magnitude));
    }

    if let Some(sodium) = nutrition
        .amount(NutrientKey::Sodium)
        .filter(|s| *s > HIGH_SODIUM_MG)
    {
        penalties.push(Penalty::new(format!("High sodium ({sodium}mg)"), 10));
    }

    let ingredient_text = label.ingredient_text();
    if ULTRA_PROCESSED_KEYWORDS
        .iter()
        .any(|keyword| ingredient_text.contains(keyword))
    {
        penalties.push(Penalty::new("Ultra-processed", 10));
    }

    if !label.allergens.is_empty() {
        penalties.push(Penalty::new(
            format!("Contains allergens ({})", label.allergens.len()),
            ALLERGEN_PENALTY * label.allergens.len() as i32,
        ));
    }

    penalties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ingredient, NumericValue, NutritionFacts};

    fn label_with(nutrients: &[(NutrientKey, f64)], ingredients: &[&str]) -> ExtractedLabel {
        let mut nutrition = NutritionFacts::new();
        for (key, amount) in nutrients {
            nutrition.insert(*key, NumericValue::new(*amount, key.default_unit()));
        }
        nutrition.derive_sugar();

        ExtractedLabel {
            nutrition,
            ingredients: ingredients.iter().map(|name| Ingredient::new(name, name)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_whole_food_short_circuit() {
        let label = label_with(&[(NutrientKey::Energy, 340.0)], &["Oats"]);
        for config in [ScoringConfig::lenient(), ScoringConfig::strict()] {
            let assessment = SafetyScorer::new(config).assess(&label);
            assert_eq!(assessment.score, Some(90));
            assert_eq!(assessment.grade, Some(Grade::A));
        }
    }

    #[test]
    fn test_inverted_bounds_do_not_panic() {
        let config = ScoringConfig {
            floor: 100,
            ceiling: 0,
            ..ScoringConfig::strict()
        };
        let label = label_with(&[(NutrientKey::Energy, 340.0)], &["Oats"]);
        assert_eq!(SafetyScorer::new(config).assess(&label).score, Some(0));
    }

    #[test]
    fn test_strict_missing_nutrition_is_absent() {
        let assessment = SafetyScorer::new(ScoringConfig::strict()).assess(&ExtractedLabel::default());
        assert_eq!(assessment.score, None);
        assert_eq!(assessment.grade, None);
    }

    #[test]
    fn test_lenient_sodium_missing_with_oil() {
        let label = label_with(
            &[
                (NutrientKey::Energy, 500.0),
                (NutrientKey::Protein, 5.0),
                (NutrientKey::Carbohydrate, 50.0),
                (NutrientKey::TotalFat, 10.0),
            ],
            &["Potato", "Palm Oil"],
        );
        let assessment = SafetyScorer::new(ScoringConfig::lenient()).assess(&label);
        // oil -20, hidden sodium -10
        assert_eq!(assessment.score, Some(70));
        assert_eq!(assessment.penalties.len(), 2);
    }

    #[test]
    fn test_strict_fat_tiers() {
        let scorer = SafetyScorer::new(ScoringConfig::strict());

        let moderate = label_with(&[(NutrientKey::TotalFat, 12.0)], &[]);
        assert_eq!(scorer.assess(&moderate).score, Some(95));

        let high = label_with(&[(NutrientKey::TotalFat, 31.0)], &[]);
        assert_eq!(scorer.assess(&high).score, Some(90));
    }

    #[test]
    fn test_strict_allergen_penalty_scales() {
        let mut label = label_with(&[(NutrientKey::Energy, 100.0)], &[]);
        label.allergens.insert("milk");
        label.allergens.insert("soy");
        label.allergens.insert("wheat");

        let assessment = SafetyScorer::new(ScoringConfig::strict()).assess(&label);
        assert_eq!(assessment.score, Some(85));
        assert_eq!(assessment.penalties[0].magnitude, 15);
    }
}
