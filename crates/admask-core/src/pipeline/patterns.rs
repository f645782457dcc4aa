//! Regex patterns for Aadhaar number validation and field cleanup.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// 12-digit Aadhaar number, run together or as three 4-digit groups
    /// with optional single-space separators.
    pub static ref AADHAAR_NUMBER: Regex = Regex::new(r"\d{4}\s?\d{4}\s?\d{4}").unwrap();

    /// Date of birth as printed on the card: DD-MM-YYYY or DD/MM/YYYY.
    pub static ref DATE_OF_BIRTH: Regex =
        Regex::new(r"\b\d{2}[-/]\d{2}[-/]\d{4}\b").unwrap();

    /// Punctuation replaced by spaces during field cleanup.
    pub static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s]").unwrap();
}

/// Check whether OCR output contains a valid 12-digit Aadhaar number.
///
/// Whitespace is stripped first so the regex sees the digit runs the way
/// the card prints them, regardless of OCR spacing.
pub fn contains_aadhaar_number(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    AADHAAR_NUMBER.is_match(&compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aadhaar_number_grouping_variants() {
        assert!(contains_aadhaar_number("1234 5678 9012"));
        assert!(contains_aadhaar_number("123456789012"));
        assert!(contains_aadhaar_number("Aadhaar: 1234 5678 9012"));
        // OCR inserting odd whitespace still validates.
        assert!(contains_aadhaar_number("12 34 5678\n9012"));
    }

    #[test]
    fn test_aadhaar_number_rejects_short_runs() {
        assert!(!contains_aadhaar_number(""));
        assert!(!contains_aadhaar_number("1234 5678"));
        assert!(!contains_aadhaar_number("GOVERNMENT OF INDIA"));
        assert!(!contains_aadhaar_number("12345678901"));
    }

    #[test]
    fn test_date_of_birth_pattern() {
        assert!(DATE_OF_BIRTH.is_match("01/01/1990"));
        assert!(DATE_OF_BIRTH.is_match("DOB: 15-08-1987"));
        assert!(!DATE_OF_BIRTH.is_match("1990/01/01"));
        assert!(!DATE_OF_BIRTH.is_match("1/1/1990"));
    }
}
