//! Condition operator evaluation
//!
//! All operators are total: a missing field, malformed number, or invalid
//! regex makes the condition evaluate false (true for the negated and
//! emptiness operators where absence satisfies them), never an error.

use regex::RegexBuilder;
use serde_json::Value;
use tracing::debug;

use domain_claims::codes;

use crate::rule::ConditionOperator;

/// Evaluates one operator against a resolved field value
pub fn evaluate(
    operator: ConditionOperator,
    actual: Option<&str>,
    expected: &Value,
    case_sensitive: bool,
) -> bool {
    use ConditionOperator::*;

    // Absence handling first: emptiness operators test it directly, negated
    // operators are satisfied by it, everything else cannot match.
    let actual = match actual {
        Some(v) => v,
        None => {
            return matches!(operator, IsEmpty | NotEquals | NotContains | NotInList);
        }
    };

    match operator {
        Equals => compare_strings(actual, expected, case_sensitive),
        NotEquals => !compare_strings(actual, expected, case_sensitive),
        // Substring operators always fold case; the flag only affects
        // equals/not_equals and regex
        Contains => fold_case(actual, false).contains(&expected_string(expected, false)),
        NotContains => !fold_case(actual, false).contains(&expected_string(expected, false)),
        StartsWith => fold_case(actual, false).starts_with(&expected_string(expected, false)),
        EndsWith => fold_case(actual, false).ends_with(&expected_string(expected, false)),
        GreaterThan => compare_numbers(actual, expected, |a, b| a > b),
        GreaterThanOrEqual => compare_numbers(actual, expected, |a, b| a >= b),
        LessThan => compare_numbers(actual, expected, |a, b| a < b),
        LessThanOrEqual => compare_numbers(actual, expected, |a, b| a <= b),
        InList => in_list(actual, expected),
        NotInList => !in_list(actual, expected),
        Regex => regex_matches(actual, expected, case_sensitive),
        IsEmpty => actual.is_empty(),
        IsNotEmpty => !actual.is_empty(),
        IsValidNpi => codes::is_valid_npi(actual),
        IsValidDate => codes::is_valid_service_date(actual),
        IsValidIcd10 => codes::is_valid_icd10(actual),
        IsValidCpt => codes::is_valid_cpt(actual),
    }
}

fn fold_case(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}

/// Renders the comparison value as a string the way the rule author sees it
fn expected_string(expected: &Value, case_sensitive: bool) -> String {
    let raw = match expected {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    };
    fold_case(&raw, case_sensitive)
}

fn compare_strings(actual: &str, expected: &Value, case_sensitive: bool) -> bool {
    fold_case(actual, case_sensitive) == expected_string(expected, case_sensitive)
}

fn compare_numbers(actual: &str, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    let lhs = match actual.trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => return false,
    };
    let rhs = match expected {
        Value::Number(n) => match n.as_f64() {
            Some(v) => v,
            None => return false,
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return false,
        },
        _ => return false,
    };
    cmp(lhs, rhs)
}

/// Exact membership: list items never fold case
fn in_list(actual: &str, expected: &Value) -> bool {
    let Some(items) = expected.as_array() else {
        return false;
    };
    items.iter().any(|item| expected_string(item, true) == actual)
}

fn regex_matches(actual: &str, expected: &Value, case_sensitive: bool) -> bool {
    let Some(pattern) = expected.as_str() else {
        return false;
    };
    match RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(re) => re.is_match(actual),
        Err(e) => {
            debug!(pattern, error = %e, "invalid rule regex; condition evaluates false");
            false
        }
    }
}
