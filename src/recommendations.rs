//! Advisory messages derived from extracted label data, independent of the score.

use log::debug;

use crate::model::{ExtractedLabel, NutrientKey};

pub const HIGH_FAT_MESSAGE: &str = "High fat content; consume in moderation.";
pub const HIDDEN_SODIUM_MESSAGE: &str = "Sodium content unavailable; likely high for processed foods.";
pub const HIGH_SODIUM_MESSAGE: &str =
    "High sodium content; not recommended for people with hypertension.";
pub const HIGH_SUGAR_MESSAGE: &str = "High added sugar; limit consumption to reduce diabetes risk.";
pub const ULTRA_PROCESSED_MESSAGE: &str = "Ultra-processed food; frequent consumption is not advised.";
pub const SINGLE_INGREDIENT_MESSAGE: &str =
    "Single-ingredient food; generally safe when consumed in moderation.";
pub const NO_RISK_MESSAGE: &str = "No major health risks detected when consumed in moderation.";

const HIGH_FAT_G: f64 = 30.0;
const HIGH_SODIUM_MG: f64 = 400.0;
const HIGH_ADDED_SUGAR_G: f64 = 10.0;
const MAX_SIMPLE_INGREDIENTS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Rule messages in fixed order; never empty
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::model::ExtractedLabel;
    /// use label_scan::recommendations::{RecommendationGenerator, NO_RISK_MESSAGE};
    ///
    /// let generator = RecommendationGenerator::new();
    /// assert_eq!(generator.generate(&ExtractedLabel::default()), vec![NO_RISK_MESSAGE]);
    /// ```
    pub fn generate(&self, label: &ExtractedLabel) -> Vec<String> {
        let nutrition = &label.nutrition;
        let ingredient_text = label.ingredient_text();
        let has_oil = ingredient_text.contains("oil");
        let mut messages: Vec<&str> = Vec::new();

        if nutrition
            .amount(NutrientKey::TotalFat)
            .is_some_and(|fat| fat > HIGH_FAT_G)
        {
            messages.push(HIGH_FAT_MESSAGE);
        }

        match nutrition.amount(NutrientKey::Sodium) {
            None if has_oil => messages.push(HIDDEN_SODIUM_MESSAGE),
            Some(sodium) if sodium > HIGH_SODIUM_MG => messages.push(HIGH_SODIUM_MESSAGE),
            _ => {}
        }

        if nutrition
            .amount(NutrientKey::AddedSugar)
            .is_some_and(|sugar| sugar > HIGH_ADDED_SUGAR_G)
        {
            messages.push(HIGH_SUGAR_MESSAGE);
        }

        if has_oil && label.ingredients.len() > MAX_SIMPLE_INGREDIENTS {
            messages.push(ULTRA_PROCESSED_MESSAGE);
        }

        if label.ingredients.len() == 1 {
            messages.push(SINGLE_INGREDIENT_MESSAGE);
        }

        if messages.is_empty() {
            messages.push(NO_RISK_MESSAGE);
        }

        debug!("Generated {} recommendations", messages.len());
        messages.into_iter().map(String::from).collect()
    }
}
