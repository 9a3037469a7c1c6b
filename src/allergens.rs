//! # Allergen Detection Module
//!
//! Whole-word, case-insensitive keyword scan for common allergens. Results are
//! reported once each, in vocabulary order.
//!
//! The lenient scan reads the whole label. The strict scan only reads what
//! follows a "contains" or "allergen information" label, which avoids picking
//! up words from marketing copy ("wheat-free!").

use log::{debug, trace};
use regex::Regex;

use crate::config::Profile;
use crate::model::AllergenSet;

const ALLERGEN_VOCABULARY: &[&str] = &[
    "milk", "egg", "peanut", "tree nut", "soy", "wheat", "fish", "shellfish", "sesame", "gluten",
];

/// Nut varieties only recognised by the strict scan
const NUT_VARIETIES: &[&str] = &["cashew", "almond"];

const DECLARATION_LABEL_PATTERN: &str = r"(?i)(?:\bcontains?\b|allergen\s+information)\s*[:=]?\s*([^\n]*)";

pub struct AllergenDetector {
    keywords: Vec<(&'static str, Regex)>,
    declaration: Regex,
    strict: bool,
}

impl AllergenDetector {
    /// Detector matching the scan mode of the given profile
    pub fn new(profile: Profile) -> Result<Self, regex::Error> {
        let strict = profile == Profile::Strict;
        let extra: &[&'static str] = if strict { NUT_VARIETIES } else { &[] };

        let keywords = ALLERGEN_VOCABULARY
            .iter()
            .chain(extra)
            .map(|name| {
                let words = name
                    .split_whitespace()
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+");
                Regex::new(&format!(r"(?i)\b{words}s?\b")).map(|regex| (*name, regex))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            keywords,
            declaration: Regex::new(DECLARATION_LABEL_PATTERN)?,
            strict,
        })
    }

    /// Detect allergens in raw recognized text
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::allergens::AllergenDetector;
    /// use label_scan::config::Profile;
    ///
    /// let detector = AllergenDetector::new(Profile::Lenient)?;
    /// let found = detector.detect("Contains milk and Milk again, wheat");
    ///
    /// assert_eq!(found.to_vec(), vec!["milk", "wheat"]);
    /// # Ok::<(), regex::Error>(())
    /// ```
    pub fn detect(&self, raw_text: &str) -> AllergenSet {
        if self.strict {
            let declared = self.declared_sections(raw_text);
            trace!("Allergen declaration sections: {:?}", declared);
            self.scan(&declared.join("\n"))
        } else {
            self.scan(raw_text)
        }
    }

    fn scan(&self, text: &str) -> AllergenSet {
        let mut found = AllergenSet::new();
        for (name, pattern) in &self.keywords {
            if pattern.is_match(text) {
                found.insert(name);
            }
        }
        debug!("Detected {} allergens", found.len());
        found
    }

    /// Rest of the line after each "contains" / "allergen information" label
    fn declared_sections<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.declaration
            .captures_iter(text)
            .filter_map(|captures| captures.get(1).map(|m| m.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_scan_reads_whole_text() {
        let detector = AllergenDetector::new(Profile::Lenient).unwrap();
        let found = detector.detect("Wheat flour, sesame seeds\nMay contain traces of peanuts");
        assert_eq!(found.to_vec(), vec!["peanut", "wheat", "sesame"]);
    }

    #[test]
    fn test_whole_word_matching() {
        let detector = AllergenDetector::new(Profile::Lenient).unwrap();
        // "buckwheat" and "eggplant" are not allergens
        assert!(detector.detect("buckwheat, eggplant").is_empty());
        assert_eq!(detector.detect("EGGS").to_vec(), vec!["egg"]);
        assert_eq!(detector.detect("tree  nuts").to_vec(), vec!["tree nut"]);
    }

    #[test]
    fn test_strict_scan_only_reads_declarations() {
        let detector = AllergenDetector::new(Profile::Strict).unwrap();
        let text = "Ingredients: wheat flour, milk solids\nAllergen information: contains cashew";
        assert_eq!(detector.detect(text).to_vec(), vec!["cashew"]);
    }

    #[test]
    fn test_strict_scan_ignores_container() {
        let detector = AllergenDetector::new(Profile::Strict).unwrap();
        assert!(detector
            .detect("Store in an airtight container. Milk chocolate")
            .is_empty());
        assert_eq!(
            detector.detect("Store in a container\nContains: soy").to_vec(),
            vec!["soy"]
        );
    }

    #[test]
    fn test_strict_scan_without_declaration() {
        let detector = AllergenDetector::new(Profile::Strict).unwrap();
        assert!(detector.detect("Ingredients: wheat flour, milk solids").is_empty());
    }

    #[test]
    fn test_nut_varieties_only_in_strict() {
        let lenient = AllergenDetector::new(Profile::Lenient).unwrap();
        assert!(lenient.detect("Contains: almonds").is_empty());

        let strict = AllergenDetector::new(Profile::Strict).unwrap();
        assert_eq!(strict.detect("Contains: almonds").to_vec(), vec!["almond"]);
    }
}
