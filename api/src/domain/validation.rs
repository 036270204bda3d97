use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const NAME_MAX: usize = 150;
pub const CODE_MAX: usize = 20;
pub const DESCRIPTION_MAX: usize = 2000;
pub const EMAIL_MAX: usize = 254;
pub const PHONE_MAX: usize = 30;
pub const MIN_YEAR: i32 = 1990;
pub const MAX_YEAR: i32 = 2100;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+()\-\s]+$").expect("valid regex"));

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.0.entry(field).or_insert(message);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn require_text(&mut self, field: &str, value: &str, max: usize) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.add(field, "This field is required");
        } else if trimmed.chars().count() > max {
            self.add(field, format!("Must be at most {} characters", max));
        }
    }

    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.trim().chars().count() > max {
                self.add(field, format!("Must be at most {} characters", max));
            }
        }
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if v.len() > EMAIL_MAX || !EMAIL_RE.is_match(v) {
                self.add(field, "Enter a valid email address");
            }
        }
    }

    pub fn require_email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        } else {
            self.optional_email(field, Some(value));
        }
    }

    pub fn optional_phone(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if v.len() > PHONE_MAX || !PHONE_RE.is_match(v) {
                self.add(field, "Enter a valid phone number");
            }
        }
    }

    pub fn year_range(&mut self, start: i32, end: i32) {
        for (field, year) in [("start_year", start), ("end_year", end)] {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                self.add(
                    field,
                    format!("Year must be between {} and {}", MIN_YEAR, MAX_YEAR),
                );
            }
        }
        if start > end {
            self.add("end_year", "End year must not be before the start year");
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Field-level checks that need no database access.
pub trait Validate {
    fn validate(&self) -> FieldErrors;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.add("name", "first");
        errors.add("name", "second");
        assert_eq!(errors.get("name"), Some("first"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn required_text_rejects_blank_and_long_values() {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "   ", NAME_MAX);
        errors.require_text("code", &"x".repeat(CODE_MAX + 1), CODE_MAX);
        errors.require_text("ok", "Antioquia", NAME_MAX);
        assert!(errors.contains("name"));
        assert!(errors.contains("code"));
        assert!(!errors.contains("ok"));
    }

    #[test]
    fn email_and_phone_formats() {
        let mut errors = FieldErrors::new();
        errors.optional_email("a", Some("alcaldia@example.gov.co"));
        errors.optional_email("b", Some("not-an-email"));
        errors.optional_email("c", None);
        errors.optional_phone("d", Some("+57 (604) 385-5555"));
        errors.optional_phone("e", Some("call me"));
        assert!(!errors.contains("a"));
        assert!(errors.contains("b"));
        assert!(!errors.contains("c"));
        assert!(!errors.contains("d"));
        assert!(errors.contains("e"));
    }

    #[test]
    fn year_range_checks_bounds_and_order() {
        let mut errors = FieldErrors::new();
        errors.year_range(2024, 2027);
        assert!(errors.is_empty());

        errors.year_range(2028, 2024);
        assert_eq!(
            errors.get("end_year"),
            Some("End year must not be before the start year")
        );

        let mut errors = FieldErrors::new();
        errors.year_range(1800, 2024);
        assert!(errors.contains("start_year"));
    }

    #[test]
    fn merge_keeps_existing_messages() {
        let mut a = FieldErrors::single("name", "taken");
        let mut b = FieldErrors::single("name", "other");
        b.add("code", "bad");
        a.merge(b);
        assert_eq!(a.get("name"), Some("taken"));
        assert_eq!(a.get("code"), Some("bad"));
        assert_eq!(a.to_string(), "code: bad; name: taken");
    }
}
