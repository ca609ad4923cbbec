//! Healthcare code format validation
//!
//! NPI, ICD-10, CPT, and claim service-date formats. These are pure format
//! checks shared by the rules engine operators and the code validator;
//! payer-specific semantics live in `domain_validation`.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static ICD10_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-TV-Z][0-9]{2}(\.[A-Za-z0-9]{1,4})?$").expect("valid pattern"));

static CPT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}([A-Za-z0-9]{2})?$").expect("valid pattern"));

static CPT_MODIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{2}$").expect("valid pattern"));

/// Validates a National Provider Identifier
///
/// An NPI is exactly 10 digits whose Luhn checksum, computed over the
/// number prefixed with the "80840" healthcare industry identifier, is
/// divisible by 10.
pub fn is_valid_npi(value: &str) -> bool {
    if value.len() != 10 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let prefixed = format!("80840{value}");
    luhn_sum(&prefixed) % 10 == 0
}

fn luhn_sum(digits: &str) -> u32 {
    digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = (b - b'0') as u32;
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum()
}

/// Validates an ICD-10 diagnosis code
///
/// One letter from A-T or V-Z, two digits, then optionally a dot and one
/// to four alphanumerics (e.g., "M54.5").
pub fn is_valid_icd10(value: &str) -> bool {
    ICD10_PATTERN.is_match(value)
}

/// Validates a CPT procedure code: five digits with an optional
/// two-character modifier suffix (e.g., "99213" or "9921325")
pub fn is_valid_cpt(value: &str) -> bool {
    CPT_PATTERN.is_match(value)
}

/// Validates a standalone two-character CPT modifier
pub fn is_valid_cpt_modifier(value: &str) -> bool {
    CPT_MODIFIER_PATTERN.is_match(value)
}

/// Parses a claim date in any of the accepted formats:
/// YYYY-MM-DD, MM/DD/YYYY, or YYYYMMDD
pub fn parse_service_date(value: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Validates a claim service date: must parse in an accepted format and
/// must not be in the future
pub fn is_valid_service_date(value: &str) -> bool {
    match parse_service_date(value) {
        Some(date) => date <= Utc::now().date_naive(),
        None => false,
    }
}
