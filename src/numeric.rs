//! # Numeric Token Parser
//!
//! Parses one raw numeric token recovered by OCR (e.g. `"510mg"`, `"5,269"`,
//! `"1,234,567"`) into an amount and the unit suffix attached to it.
//!
//! Recognition output is lossy: commas stand in for decimal points, units are
//! glued to the digits and stray letters survive. Parsing never fails loudly;
//! a token that cannot be read yields `None` and the caller treats the field
//! as absent.

use log::trace;
use serde::{Deserialize, Serialize};

/// Unit attached to a nutrition value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    None,
    G,
    Mg,
    Kcal,
    Cal,
}

impl Unit {
    /// Map a unit token captured next to a value (`"mg"`, `"g"`, `"kcal"`, `"cal"`)
    pub fn from_token(token: &str) -> Unit {
        match token.trim().to_lowercase().as_str() {
            "g" => Unit::G,
            "mg" => Unit::Mg,
            "kcal" => Unit::Kcal,
            "cal" => Unit::Cal,
            _ => Unit::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::G => "g",
            Unit::Mg => "mg",
            Unit::Kcal => "kcal",
            Unit::Cal => "cal",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Unit::None
    }
}

/// How much the extractor trusts a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Read as printed
    #[default]
    High,
    /// Decimal point reinserted, or value outside its sanity range
    Low,
}

/// A parsed nutrition amount with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericValue {
    pub amount: f64,
    pub unit: Unit,
    pub confidence: Confidence,
}

impl NumericValue {
    pub fn new(amount: f64, unit: Unit) -> Self {
        Self {
            amount,
            unit,
            confidence: Confidence::High,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::Low
    }
}

/// Round to two decimal places, the precision values are stored with
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a raw numeric token into `(amount, unit)`
///
/// Characters outside `[0-9.,kgm]` are dropped first. A trailing `mg` or `g`
/// becomes the unit. More than one comma means thousands separators; a
/// single comma with no dot is a decimal point.
///
/// # Examples
///
/// ```rust
/// use label_scan::numeric::{parse_number, Unit};
///
/// assert_eq!(parse_number("510mg"), Some((510.0, Unit::Mg)));
/// assert_eq!(parse_number("5,269"), Some((5.269, Unit::None)));
/// assert_eq!(parse_number("kcal"), None);
/// ```
pub fn parse_number(token: &str) -> Option<(f64, Unit)> {
    let mut s: String = token
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | 'k' | 'g' | 'm'))
        .collect();

    let unit = if s.ends_with("mg") {
        s.truncate(s.len() - 2);
        Unit::Mg
    } else if s.ends_with('g') {
        s.truncate(s.len() - 1);
        Unit::G
    } else {
        Unit::None
    };

    let comma_count = s.matches(',').count();
    if comma_count > 1 {
        s = s.replace(',', "");
    } else if comma_count == 1 && !s.contains('.') {
        s = s.replace(',', ".");
    }

    if let Ok(amount) = s.parse::<f64>() {
        trace!("Parsed numeric token '{}' -> {} {:?}", token, amount, unit);
        return Some((amount, unit));
    }

    let digits: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        trace!("Numeric token '{}' has no digits", token);
        return None;
    }

    match digits.parse::<f64>() {
        Ok(amount) => {
            trace!("Parsed numeric token '{}' after cleanup -> {} {:?}", token, amount, unit);
            Some((amount, unit))
        }
        Err(_) => {
            trace!("Could not parse numeric token '{}'", token);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_suffix_detection() {
        assert_eq!(parse_number("510mg"), Some((510.0, Unit::Mg)));
        assert_eq!(parse_number("12.5g"), Some((12.5, Unit::G)));
        assert_eq!(parse_number("12.5 G"), Some((12.5, Unit::G)));
        assert_eq!(parse_number("553"), Some((553.0, Unit::None)));
    }

    #[test]
    fn test_single_comma_is_decimal_point() {
        assert_eq!(parse_number("5,269"), Some((5.269, Unit::None)));
        assert_eq!(parse_number("0,5g"), Some((0.5, Unit::G)));
    }

    #[test]
    fn test_multiple_commas_are_thousands_separators() {
        assert_eq!(parse_number("1,234,567"), Some((1234567.0, Unit::None)));
    }

    #[test]
    fn test_comma_with_dot_falls_back_to_digits() {
        // "1,234.5" fails the first parse; stripping the comma recovers it
        assert_eq!(parse_number("1,234.5"), Some((1234.5, Unit::None)));
    }

    #[test]
    fn test_stray_characters_are_ignored() {
        assert_eq!(parse_number("~45%"), Some((45.0, Unit::None)));
        assert_eq!(parse_number("(7.1)"), Some((7.1, Unit::None)));
    }

    #[test]
    fn test_unparseable_tokens() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("kcal"), None);
        assert_eq!(parse_number("mg"), None);
        assert_eq!(parse_number("1.2.3"), None);
    }

    #[test]
    fn test_unit_from_token() {
        assert_eq!(Unit::from_token("MG"), Unit::Mg);
        assert_eq!(Unit::from_token(" kcal"), Unit::Kcal);
        assert_eq!(Unit::from_token("oz"), Unit::None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(52.6949), 52.69);
        assert_eq!(round2(5269.0 / 100.0), 52.69);
    }
}
