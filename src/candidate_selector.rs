//! # Text Candidate Selection Module
//!
//! One label photo is recognized several times (different filters, different
//! page segmentation modes). This module scores every resulting text and
//! keeps the one that looks most like a food label.
//!
//! The score is a weighted sum of three word fractions:
//!
//! - words containing a nutrition or ingredient keyword (weight 0.5)
//! - words found in a general dictionary (weight 0.3, neutral 0.5 without one)
//! - words containing a digit (weight 0.2)

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::errors::AnalysisError;
use crate::model::RawTextCandidate;

const NUTRITION_KEYWORDS: &[&str] = &[
    "energy", "protein", "carbohydrate", "fat", "sodium", "sugar", "fiber", "calcium", "iron",
    "vitamin", "calories", "kcal", "kj", "serving", "cholesterol", "saturated", "trans", "dietary",
];

const INGREDIENT_KEYWORDS: &[&str] = &["ingredients", "contains", "allergen", "may contain"];

const KEYWORD_WEIGHT: f64 = 0.5;
const DICTIONARY_WEIGHT: f64 = 0.3;
const DIGIT_WEIGHT: f64 = 0.2;
const NEUTRAL_DICTIONARY_SCORE: f64 = 0.5;

/// Picks the best of several recognition outputs for one image
#[derive(Debug, Clone, Default)]
pub struct CandidateSelector {
    dictionary: Option<HashSet<String>>,
}

impl CandidateSelector {
    /// Selector without a dictionary; the dictionary term scores a flat 0.5
    pub fn new() -> Self {
        Self { dictionary: None }
    }

    /// Selector using the given lower-case word set
    pub fn with_dictionary(words: HashSet<String>) -> Self {
        info!("Candidate selector using dictionary of {} words", words.len());
        Self {
            dictionary: Some(words),
        }
    }

    /// Load a word list with one word per line
    pub fn from_word_list(path: &Path) -> Result<Self, AnalysisError> {
        let content = fs::read_to_string(path)?;
        let words = content
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect::<HashSet<_>>();
        Ok(Self::with_dictionary(words))
    }

    pub fn has_dictionary(&self) -> bool {
        self.dictionary.is_some()
    }

    /// Quality score of one text; empty or whitespace-only text scores 0
    pub fn score(&self, text: &str) -> f64 {
        let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return 0.0;
        }
        let total = words.len() as f64;

        let keyword_hits = (0..words.len())
            .filter(|&index| {
                NUTRITION_KEYWORDS
                    .iter()
                    .chain(INGREDIENT_KEYWORDS)
                    .any(|keyword| starts_keyword(&words[index..], keyword))
            })
            .count();

        let dictionary_score = match &self.dictionary {
            Some(dictionary) => {
                words.iter().filter(|word| dictionary.contains(*word)).count() as f64 / total
            }
            None => NEUTRAL_DICTIONARY_SCORE,
        };

        let digit_hits = words
            .iter()
            .filter(|word| word.chars().any(|c| c.is_ascii_digit()))
            .count();

        (keyword_hits as f64 / total) * KEYWORD_WEIGHT
            + dictionary_score * DICTIONARY_WEIGHT
            + (digit_hits as f64 / total) * DIGIT_WEIGHT
    }

    /// Highest-scoring candidate; ties go to the earliest one
    pub fn select<'a>(&self, candidates: &'a [RawTextCandidate]) -> Option<&'a RawTextCandidate> {
        let mut best: Option<(&RawTextCandidate, f64)> = None;

        for candidate in candidates {
            let score = self.score(&candidate.text);
            debug!("Candidate '{}' scored {:.3}", candidate.origin, score);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        if let Some((candidate, score)) = best {
            info!(
                "Selected candidate '{}' of {} (score {:.3})",
                candidate.origin,
                candidates.len(),
                score
            );
        }
        best.map(|(candidate, _)| candidate)
    }

    /// Text of the best candidate, or an empty string when there are none
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::candidate_selector::CandidateSelector;
    /// use label_scan::model::RawTextCandidate;
    ///
    /// let selector = CandidateSelector::new();
    /// let candidates = vec![
    ///     RawTextCandidate::new("~~ |l ,, ;", "otsu/psm6"),
    ///     RawTextCandidate::new("Energy 553 kcal Protein 6.7 g", "contrast/psm4"),
    /// ];
    ///
    /// assert_eq!(selector.select_text(&candidates), "Energy 553 kcal Protein 6.7 g");
    /// assert_eq!(selector.select_text(&[]), "");
    /// ```
    pub fn select_text(&self, candidates: &[RawTextCandidate]) -> String {
        self.select(candidates)
            .map(|candidate| candidate.text.clone())
            .unwrap_or_default()
    }
}

/// Whether `words` begins with `keyword`, one keyword word per text word
///
/// "may contain" is counted once, on the word "may".
fn starts_keyword(words: &[String], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split_whitespace().collect();
    words.len() >= parts.len()
        && parts
            .iter()
            .zip(words)
            .all(|(part, word)| word.contains(*part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_scores_zero() {
        let selector = CandidateSelector::new();
        assert_eq!(selector.score(""), 0.0);
        assert_eq!(selector.score("   \n "), 0.0);
    }

    #[test]
    fn test_score_components_without_dictionary() {
        let selector = CandidateSelector::new();
        // 2 of 4 words are keywords, 2 of 4 contain digits
        let score = selector.score("Protein 6.7g Sodium 510mg");
        let expected = 0.5 * 0.5 + 0.5 * 0.3 + 0.5 * 0.2;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_may_contain_phrase_counts() {
        let selector = CandidateSelector::new();
        let phrase = selector.score("May contain nuts");
        let expected = (1.0 / 3.0) * 0.5 + 0.5 * 0.3;
        assert!((phrase - expected).abs() < 1e-9);
        assert!(phrase > selector.score("May have nuts"));
    }

    #[test]
    fn test_dictionary_changes_score() {
        let words = ["potato", "salt"].iter().map(|w| w.to_string()).collect();
        let selector = CandidateSelector::with_dictionary(words);
        assert!(selector.has_dictionary());
        // no keywords, no digits, every word in the dictionary
        let score = selector.score("Potato salt");
        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_ties_resolve_to_first_candidate() {
        let selector = CandidateSelector::new();
        let candidates = vec![
            RawTextCandidate::new("sugar 10", "first"),
            RawTextCandidate::new("salt 20", "second"),
            RawTextCandidate::new("sugar 10", "third"),
        ];
        // "salt" is not a keyword, so the first candidate wins outright
        assert_eq!(selector.select(&candidates).unwrap().origin, "first");

        let identical = vec![
            RawTextCandidate::new("sodium 5", "a"),
            RawTextCandidate::new("sodium 5", "b"),
        ];
        assert_eq!(selector.select(&identical).unwrap().origin, "a");
    }

    #[test]
    fn test_no_candidates() {
        let selector = CandidateSelector::new();
        assert!(selector.select(&[]).is_none());
        assert_eq!(selector.select_text(&[]), "");
    }
}
