//! Validation of the requester's basic information.
//!
//! Validation never fails: every problem is reported back in a structured
//! result so the requester can fix all of them in one round-trip.

use crate::clock::{Clock, SystemClock};
use crate::request::BasicInfo;
use serde::{Deserialize, Serialize};

/// Minimum trimmed length, in characters, of each basic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRules {
    pub min_name: usize,
    pub min_role: usize,
    pub min_department: usize,
    pub min_timeline: usize,
}

impl Default for FieldRules {
    fn default() -> Self {
        Self {
            min_name: 2,
            min_role: 2,
            min_department: 2,
            min_timeline: 3,
        }
    }
}

/// Outcome of a validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ValidationReport")]
pub enum ValidationResult {
    Valid(BasicInfo),
    Invalid(Vec<String>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn errors(&self) -> &[String] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid(errors) => errors,
        }
    }

    pub fn data(&self) -> Option<&BasicInfo> {
        match self {
            Self::Valid(info) => Some(info),
            Self::Invalid(_) => None,
        }
    }
}

/// Wire shape: `{valid, errors}` or `{valid, data}`
#[derive(Serialize)]
struct ValidationReport {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<BasicInfo>,
}

impl From<ValidationResult> for ValidationReport {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid(info) => Self {
                valid: true,
                errors: None,
                data: Some(info),
            },
            ValidationResult::Invalid(errors) => Self {
                valid: false,
                errors: Some(errors),
                data: None,
            },
        }
    }
}

/// Checks the four basic fields against a set of [`FieldRules`].
#[derive(Debug, Clone)]
pub struct Validator<C = SystemClock> {
    rules: FieldRules,
    clock: C,
}

impl Validator<SystemClock> {
    pub fn new(rules: FieldRules) -> Self {
        Self::with_clock(rules, SystemClock)
    }
}

impl Default for Validator<SystemClock> {
    fn default() -> Self {
        Self::new(FieldRules::default())
    }
}

impl<C: Clock> Validator<C> {
    pub fn with_clock(rules: FieldRules, clock: C) -> Self {
        Self { rules, clock }
    }

    /// Validate and trim the basic fields.
    ///
    /// Violations are listed in field order: name, role, department, timeline.
    pub fn validate(
        &self,
        name: &str,
        role: &str,
        department: &str,
        timeline: &str,
    ) -> ValidationResult {
        tracing::info!(tool = "validate_basic_info", "validating basic info");

        let mut errors = Vec::new();

        if too_short(name, self.rules.min_name) {
            errors.push(format!(
                "Name must be at least {} characters long",
                self.rules.min_name
            ));
        }
        if too_short(role, self.rules.min_role) {
            errors.push("Role must be specified".to_string());
        }
        if too_short(department, self.rules.min_department) {
            errors.push("Department must be specified".to_string());
        }
        if too_short(timeline, self.rules.min_timeline) {
            errors.push("Timeline must be specified".to_string());
        }

        if !errors.is_empty() {
            tracing::debug!(violations = errors.len(), "basic info rejected");
            return ValidationResult::Invalid(errors);
        }

        ValidationResult::Valid(BasicInfo {
            name: name.trim().to_string(),
            role: role.trim().to_string(),
            department: department.trim().to_string(),
            timeline: timeline.trim().to_string(),
            collected_at: self.clock.now(),
        })
    }
}

/// Validate with the default rules and the system clock
pub fn validate_basic_info(
    name: &str,
    role: &str,
    department: &str,
    timeline: &str,
) -> ValidationResult {
    Validator::default().validate(name, role, department, timeline)
}

fn too_short(value: &str, min: usize) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.chars().count() < min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{DateTime, Local, TimeZone};

    #[test]
    fn exact_minimum_after_trim_passes() {
        let result = validate_basic_info(" Jo ", "VP", "Sales", "ASAP");
        let info = result.data().expect("should be valid");
        assert_eq!(info.name, "Jo");
    }

    #[test]
    fn single_short_field_reports_one_error() {
        let result = validate_basic_info("J", "VP", "Sales", "ASAP");
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].starts_with("Name"));
    }

    #[test]
    fn all_empty_reports_every_field_in_order() {
        let result = validate_basic_info("", "", "", "");
        assert_eq!(
            result.errors(),
            [
                "Name must be at least 2 characters long",
                "Role must be specified",
                "Department must be specified",
                "Timeline must be specified",
            ]
        );
    }

    #[test]
    fn whitespace_only_is_rejected() {
        let result = validate_basic_info("   ", "\t", "Sales", "  next month ");
        assert_eq!(result.errors().len(), 2);
    }

    #[test]
    fn valid_input_is_trimmed_and_timestamped() {
        let result = validate_basic_info("Ann ", " Analyst", "Finance", "next week");
        let info = result.data().expect("should be valid");
        assert_eq!(info.name, "Ann");
        assert_eq!(info.role, "Analyst");
        assert_eq!(info.department, "Finance");
        assert_eq!(info.timeline, "next week");

        let json = serde_json::to_value(&result).unwrap();
        let stamp = json["data"]["collected_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn repeated_calls_agree_apart_from_a_non_decreasing_timestamp() {
        let first = validate_basic_info("Ann", "Analyst", "Finance", "next week");
        let second = validate_basic_info("Ann", "Analyst", "Finance", "next week");

        let (a, b) = (first.data().unwrap(), second.data().unwrap());
        assert_eq!(
            (&a.name, &a.role, &a.department, &a.timeline),
            (&b.name, &b.role, &b.department, &b.timeline)
        );
        assert!(b.collected_at >= a.collected_at);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let result = validate_basic_info("Zoë", "CFO", "Ö", "Q3 close");
        assert_eq!(result.errors(), ["Department must be specified"]);
    }

    #[test]
    fn custom_rules_change_thresholds_and_message() {
        let rules = FieldRules {
            min_name: 4,
            ..FieldRules::default()
        };
        let at = Local.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap();
        let validator = Validator::with_clock(rules, FixedClock(at));

        let result = validator.validate("Ann", "Analyst", "Finance", "soon");
        assert_eq!(result.errors(), ["Name must be at least 4 characters long"]);

        let result = validator.validate("Anna", "Analyst", "Finance", "soon");
        assert_eq!(result.data().unwrap().collected_at, at);
    }

    #[test]
    fn invalid_result_serializes_without_data() {
        let json = serde_json::to_value(validate_basic_info("J", "VP", "Sales", "ASAP")).unwrap();
        assert_eq!(json["valid"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    }
}
