//! # Ingredient Extraction Module
//!
//! Finds the ingredient list on a label and turns it into clean, title-cased
//! ingredient names.
//!
//! ## Features
//!
//! - Boundary detection from an "Ingredients:" label, with a fallback to the
//!   first long comma-separated line that mentions a common ingredient
//! - Truncation at the first unrelated label section (nutrition table, price,
//!   license, packaging details, web addresses)
//! - Per-token cleanup of run-on sentences and marketing text
//! - Whole-word spelling normalization of common OCR misreads
//!   ("lodised" -> "iodised", "oill" -> "oil")
//! - A salt guarantee: salt is re-discovered if cleanup dropped it

use std::cmp::Reverse;

use log::{debug, info, trace};
use regex::{NoExpand, Regex};

use crate::model::Ingredient;

const LABEL_PATTERN: &str = r"ingredients?\s*[:\-]?\s*(.+)";
const TOKEN_SPLIT_PATTERN: &str = r"[,;\n()]";
const WHITESPACE_RUN_PATTERN: &str = r"\s{2,}";
const SALT_PATTERN: &str =
    r"([a-z]{0,15}\s*(?:lodised|lodized|iodised|iodized|iodise|iodize)?\s*salt)\b";

/// Markers of the label sections that follow an ingredient list, applied in order
const STOP_PATTERNS: &[&str] = &[
    r"nutrition",
    r"nutritional",
    r"mrp",
    r"fssai",
    r"net\s*qty",
    r"pack",
    r"unit\s*sale",
    r"mfd",
    r"use\s*by",
    r"approx",
    r"flavour",
    r"facebook",
    r"www",
];

/// Words that make an unlabeled line look like an ingredient list
const COMMON_INGREDIENT_KEYWORDS: &[&str] = &["salt", "sugar", "oil", "flour", "wheat", "milk"];

/// Common misreads and their canonical spelling
const SPELLING_FIXES: &[(&str, &str)] = &[
    ("vegetanle", "vegetable"),
    ("vegetable oill", "vegetable oil"),
    ("oi", "oil"),
    ("oill", "oil"),
    ("palmolein oi", "palmolein oil"),
    ("lodised", "iodised"),
    ("lodized", "iodised"),
    ("iodized", "iodised"),
    ("iodise", "iodised"),
    ("iodise salt", "iodised salt"),
    ("lodised salt", "iodised salt"),
    ("lodized salt", "iodised salt"),
];

const MIN_TOKEN_LENGTH: usize = 2;
const MAX_TOKEN_LENGTH: usize = 60;
const MIN_FALLBACK_LINE_LENGTH: usize = 20;

/// Title-case every whitespace-separated word
///
/// # Examples
///
/// ```rust
/// use label_scan::ingredients::capitalize_words;
///
/// assert_eq!(capitalize_words("edible  vegetable oil"), "Edible Vegetable Oil");
/// ```
pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ingredient extractor with precompiled patterns and spelling table
pub struct IngredientExtractor {
    label: Regex,
    stops: Vec<Regex>,
    token_split: Regex,
    whitespace_run: Regex,
    salt: Regex,
    /// Longest misspelling first, so "lodised salt" wins over "lodised"
    fixes: Vec<(Regex, &'static str)>,
}

impl IngredientExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let stops = STOP_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let mut table: Vec<(&'static str, &'static str)> = SPELLING_FIXES.to_vec();
        table.sort_by_key(|(wrong, _)| Reverse(wrong.len()));
        let fixes = table
            .into_iter()
            .map(|(wrong, right)| {
                Regex::new(&format!(r"\b{}\b", regex::escape(wrong))).map(|regex| (regex, right))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            label: Regex::new(LABEL_PATTERN)?,
            stops,
            token_split: Regex::new(TOKEN_SPLIT_PATTERN)?,
            whitespace_run: Regex::new(WHITESPACE_RUN_PATTERN)?,
            salt: Regex::new(SALT_PATTERN)?,
            fixes,
        })
    }

    /// Extract the ordered ingredient list from raw recognized text
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::ingredients::IngredientExtractor;
    ///
    /// let extractor = IngredientExtractor::new()?;
    /// let ingredients = extractor.extract("Ingredients: Sugar, Salt, Oil. Nutrition Facts: Energy 100kcal");
    /// let names: Vec<_> = ingredients.iter().map(|i| i.normalized_name.as_str()).collect();
    ///
    /// assert_eq!(names, vec!["Sugar", "Salt", "Oil"]);
    /// # Ok::<(), regex::Error>(())
    /// ```
    pub fn extract(&self, raw_text: &str) -> Vec<Ingredient> {
        let text = raw_text.to_lowercase();

        let Some(source) = self.locate(&text) else {
            debug!("No ingredient section found");
            return Vec::new();
        };
        trace!("Ingredient section: '{}'", source);

        let truncated = self.truncate(source);
        let mut ingredients = self.tokenize(truncated);
        self.ensure_salt(source, &mut ingredients);

        info!("Extracted {} ingredients", ingredients.len());
        ingredients
    }

    /// Spelling normalization; lower-cases, and is idempotent
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::ingredients::IngredientExtractor;
    ///
    /// let extractor = IngredientExtractor::new()?;
    /// let once = extractor.normalize("lodised salt");
    /// assert_eq!(once, "iodised salt");
    /// assert_eq!(extractor.normalize(&once), "iodised salt");
    /// # Ok::<(), regex::Error>(())
    /// ```
    pub fn normalize(&self, text: &str) -> String {
        let mut normalized = text.trim().to_lowercase();
        for (pattern, replacement) in &self.fixes {
            if pattern.is_match(&normalized) {
                normalized = pattern
                    .replace_all(&normalized, NoExpand(*replacement))
                    .into_owned();
            }
        }
        normalized.trim().to_string()
    }

    /// Text after the ingredient label, or the first line that looks like a list
    fn locate<'t>(&self, text: &'t str) -> Option<&'t str> {
        if let Some(captures) = self.label.captures(text) {
            return captures.get(1).map(|m| m.as_str());
        }

        text.lines().map(str::trim).find(|line| {
            line.chars().count() > MIN_FALLBACK_LINE_LENGTH
                && line.matches(',').count() >= 2
                && COMMON_INGREDIENT_KEYWORDS
                    .iter()
                    .any(|keyword| line.contains(keyword))
        })
    }

    /// Cut the section at each stop marker in turn
    fn truncate<'t>(&self, source: &'t str) -> &'t str {
        let mut remainder = source;
        for stop in &self.stops {
            if let Some(m) = stop.find(remainder) {
                trace!("Truncating ingredients at '{}'", m.as_str());
                remainder = &remainder[..m.start()];
            }
        }
        remainder
    }

    fn tokenize(&self, section: &str) -> Vec<Ingredient> {
        self.token_split
            .split(section)
            .filter_map(|piece| self.clean_token(piece))
            .map(|token| {
                let name = capitalize_words(&self.normalize(&token));
                Ingredient::new(&token, &name)
            })
            .collect()
    }

    /// Drop trailing sentences and marketing text; `None` if the rest is not a plausible name
    fn clean_token(&self, piece: &str) -> Option<String> {
        let piece = piece.trim();
        if piece.is_empty() {
            return None;
        }

        let piece = piece.split('.').next().unwrap_or_default().trim();
        let piece = self
            .whitespace_run
            .split(piece)
            .next()
            .unwrap_or_default()
            .trim();

        let length = piece.chars().count();
        if length > MIN_TOKEN_LENGTH && length < MAX_TOKEN_LENGTH {
            Some(piece.to_string())
        } else {
            trace!("Discarding ingredient token '{}'", piece);
            None
        }
    }

    fn ensure_salt(&self, source: &str, ingredients: &mut Vec<Ingredient>) {
        if ingredients
            .iter()
            .any(|i| i.normalized_name.to_lowercase().contains("salt"))
        {
            return;
        }

        let Some(m) = self.salt.find(source) else {
            return;
        };
        let token = m.as_str().trim();
        let name = capitalize_words(&self.normalize(token));
        if !ingredients.iter().any(|i| i.normalized_name == name) {
            debug!("Recovered salt ingredient '{}'", name);
            ingredients.push(Ingredient::new(token, &name));
        }
    }
}
