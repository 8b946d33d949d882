// File: src/validators.rs
// Purpose: Value checks behind the built-in rule methods

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use url::Url;

// HTML5 email pattern
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

// Optional sign, optional thousands separators, optional fraction
static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:-?\d+|-?\d{1,3}(?:,\d{3})+)?(?:\.\d+)?$").unwrap()
});

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Absolute http, https or ftp URL with a host
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https" | "ftp")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// ISO dates, US `MM/DD/YYYY`, or RFC 3339 timestamps
pub fn is_valid_date(value: &str) -> bool {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(value, "%m/%d/%Y").is_ok()
        || NaiveDate::parse_from_str(value, "%Y/%m/%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

pub fn is_digits(value: &str) -> bool {
    DIGITS_REGEX.is_match(value)
}

pub fn is_number(value: &str) -> bool {
    !value.is_empty() && NUMBER_REGEX.is_match(value)
}

/// Numeric reading used by min/max/range; thousands separators are dropped
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Luhn check over 13-19 digits; spaces and dashes are ignored
pub fn is_credit_card(value: &str) -> bool {
    if value.chars().any(|c| !(c.is_ascii_digit() || c == ' ' || c == '-')) {
        return false;
    }
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                *d
            }
        })
        .sum();
    sum % 10 == 0
}

/// The pattern must match the entire value. An invalid pattern fails the value.
pub fn matches_whole(pattern: &str, value: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re
            .find(value)
            .is_some_and(|m| m.start() == 0 && m.end() == value.len()),
        Err(e) => {
            warn!(pattern, "invalid regex pattern: {}", e);
            false
        }
    }
}

/// Case-insensitive suffix check against `png|jpg` or `.png,.jpg` style lists
pub fn has_extension(value: &str, list: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    list.split(['|', ','])
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// Characters outside `[A-Za-z0-9_]`
pub fn count_non_alphanumeric(value: &str) -> usize {
    value
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        .count()
}
