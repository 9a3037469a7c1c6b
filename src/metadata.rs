//! # Package Metadata Extraction Module
//!
//! Independent single-pass rules for the smaller label fields: serving size,
//! manufacturer, best-before, country of origin and the food license number.
//! Every rule is optional; a miss leaves the field absent.

use log::{debug, trace};
use regex::Regex;

use crate::model::{LicenseInfo, PackageMetadata};

const SERVING_PATTERN: &str = r"(?i)\bper\s+(\d+)\s*(?:g|gm|gms|grams?)\b";
const BEST_BEFORE_PATTERN: &str = r"(?i)best\s+before[ \t]*[:=]?[ \t]*([^\n]+)";
const COUNTRY_PATTERN: &str = r"(?i)country\s+of\s+origin\s*[:=]?\s*([a-z]+)";
const MARKETING_SUFFIX_PATTERN: &str = r"(?is)\s*\b(?:keep|finest|selection|premium|middle|eastern).*";
const BRAND_SUFFIX_PATTERN: &str = r"(?i)\b(?:foods|ltd|pvt|company|inc)\b";
const LICENSE_DIGITS_PATTERN: &str = r"[0-9]{13,14}";

/// Tried in order; the first plausible name wins
const MANUFACTURER_PATTERNS: &[&str] = &[
    r"(?i)(?:imported|packed)\b[^\n]*?\bby\s*[:=\-]?\s*([a-z][a-z\s&.]*?(?:foods|company|ltd|pvt|inc)\b[^\n,]*)",
    r"(?im)^\s*([a-z][a-z \t&.]*\b(?:foods|ltd|pvt)\b[^\n,]*)",
];

/// "per N g" values that are OCR misreads of "per 100 g"
const CONFUSABLE_SERVINGS: &[&str] = &["10", "100", "1006", "1000", "1"];

const LICENSE_KEYWORDS: &[&str] = &["fssai", "lic"];
const MIN_MANUFACTURER_LENGTH: usize = 5;

pub struct MetadataExtractor {
    serving: Regex,
    manufacturer: Vec<Regex>,
    marketing_suffix: Regex,
    brand_suffix: Regex,
    best_before: Regex,
    country: Regex,
    license_digits: Regex,
}

impl MetadataExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            serving: Regex::new(SERVING_PATTERN)?,
            manufacturer: MANUFACTURER_PATTERNS
                .iter()
                .map(|pattern| Regex::new(pattern))
                .collect::<Result<Vec<_>, _>>()?,
            marketing_suffix: Regex::new(MARKETING_SUFFIX_PATTERN)?,
            brand_suffix: Regex::new(BRAND_SUFFIX_PATTERN)?,
            best_before: Regex::new(BEST_BEFORE_PATTERN)?,
            country: Regex::new(COUNTRY_PATTERN)?,
            license_digits: Regex::new(LICENSE_DIGITS_PATTERN)?,
        })
    }

    /// Extract every metadata field from raw recognized text
    pub fn extract(&self, raw_text: &str) -> PackageMetadata {
        let metadata = PackageMetadata {
            serving_size: self.serving_size(raw_text),
            manufacturer: self.manufacturer(raw_text),
            best_before: self.best_before(raw_text),
            country: self.country(raw_text),
            license: self.detect_license(raw_text),
        };
        debug!("Extracted metadata: {:?}", metadata);
        metadata
    }

    pub fn serving_size(&self, text: &str) -> Option<String> {
        let captures = self.serving.captures(text)?;
        let digits = captures.get(1)?.as_str();
        if CONFUSABLE_SERVINGS.contains(&digits) {
            Some("per 100 g".to_string())
        } else {
            Some(format!("per {digits} g"))
        }
    }

    pub fn manufacturer(&self, text: &str) -> Option<String> {
        for pattern in &self.manufacturer {
            let Some(name) = pattern.captures(text).and_then(|c| c.get(1)) else {
                continue;
            };
            trace!("Manufacturer candidate: '{}'", name.as_str());

            let trimmed = self.marketing_suffix.replace(name.as_str(), "");
            let trimmed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");

            if self.brand_suffix.is_match(&trimmed)
                && trimmed.chars().count() > MIN_MANUFACTURER_LENGTH
            {
                return Some(trimmed);
            }
        }
        None
    }

    pub fn best_before(&self, text: &str) -> Option<String> {
        let value = self.best_before.captures(text)?.get(1)?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn country(&self, text: &str) -> Option<String> {
        Some(self.country.captures(text)?.get(1)?.as_str().to_string())
    }

    /// Find a 13–14 digit license number near a "fssai" or "lic" keyword
    ///
    /// The text is lower-cased and stripped to letters and digits first, so
    /// numbers broken up by spaces or punctuation are still found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use label_scan::metadata::MetadataExtractor;
    ///
    /// let extractor = MetadataExtractor::new()?;
    /// let license = extractor.detect_license("FSSAI Lic. No. 100 1234 5678 901");
    ///
    /// assert!(license.valid);
    /// assert_eq!(license.number.as_deref(), Some("10012345678901"));
    /// # Ok::<(), regex::Error>(())
    /// ```
    pub fn detect_license(&self, text: &str) -> LicenseInfo {
        let compact: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        let Some(keyword_pos) = LICENSE_KEYWORDS
            .iter()
            .filter_map(|keyword| compact.find(keyword))
            .min()
        else {
            return LicenseInfo::not_found();
        };

        let number = self
            .license_digits
            .find(&compact[keyword_pos..])
            .or_else(|| self.license_digits.find(&compact));

        match number {
            Some(m) => {
                debug!("License number detected: {}", m.as_str());
                LicenseInfo::detected(m.as_str())
            }
            None => LicenseInfo::not_found(),
        }
    }
}
