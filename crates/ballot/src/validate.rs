//! Value checks that can disqualify a candidate

use serde::{Deserialize, Serialize};
use vetting_core::LocaleId;
use vetting_resolver::INHERITANCE_MARKER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found in a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Finding {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Checks candidate values. A value with an error-level finding is shown but
/// never counted toward the outcome.
pub trait ValueValidator: Send + Sync {
    fn check(&self, locale: &LocaleId, path: &str, value: &str) -> Vec<Finding>;

    fn disqualifies(&self, locale: &LocaleId, path: &str, value: &str) -> bool {
        self.check(locale, path, value).iter().any(Finding::is_error)
    }
}

/// Structural checks that apply to every path
#[derive(Debug, Clone)]
pub struct BasicValidator {
    max_length: usize,
}

impl BasicValidator {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl ValueValidator for BasicValidator {
    fn check(&self, _locale: &LocaleId, _path: &str, value: &str) -> Vec<Finding> {
        if value == INHERITANCE_MARKER {
            return Vec::new();
        }
        let mut findings = Vec::new();
        if value.is_empty() {
            findings.push(Finding::error("empty-value", "value is empty"));
        } else if value.trim() != value {
            findings.push(Finding::warning(
                "surrounding-whitespace",
                "value has leading or trailing whitespace",
            ));
        }
        let units = value.encode_utf16().count();
        if units > self.max_length {
            findings.push(Finding::error(
                "too-long",
                format!("value has {} code units, limit is {}", units, self.max_length),
            ));
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_validator() {
        let validator = BasicValidator::new(5);
        let fr = LocaleId::new("fr").unwrap();
        let path = "//ldml/x";

        assert!(validator.check(&fr, path, "oc").is_empty());
        assert!(validator.disqualifies(&fr, path, ""));
        assert!(validator.disqualifies(&fr, path, "toolong"));

        let findings = validator.check(&fr, path, " oc");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(!validator.disqualifies(&fr, path, " oc"));

        assert!(validator.check(&fr, path, INHERITANCE_MARKER).is_empty());
    }
}
