//! Validation report produced by the deck validator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Stable check identifier, e.g. `slide_count`.
    pub name: String,
    pub passed: bool,
    /// Human-readable explanation of the outcome.
    pub detail: String,
}

/// Ordered list of check results for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check outcome.
    pub fn push(&mut self, name: &str, passed: bool, detail: impl Into<String>) {
        self.checks.push(CheckResult {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        });
    }

    /// True only if every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Checks that did not pass.
    pub fn failures(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    /// Look up a check by name.
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(70))?;
        writeln!(f, "HyFlux PowerPoint Validation Report")?;
        writeln!(f, "{}", "=".repeat(70))?;
        for check in &self.checks {
            let mark = if check.passed { "PASS" } else { "FAIL" };
            writeln!(f, "[{}] {:<14} {}", mark, check.name, check.detail)?;
        }
        writeln!(f, "{}", "=".repeat(70))?;
        let failed = self.failures().len();
        if failed == 0 {
            write!(f, "Status: PASSED - all {} checks OK", self.checks.len())
        } else {
            write!(f, "Status: FAILED - {} of {} checks failed", failed, self.checks.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_requires_every_check() {
        let mut report = ValidationReport::new();
        assert!(report.passed());

        report.push("slide_count", true, "2 slides");
        report.push("fonts", false, "Arial found");
        assert!(!report.passed());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.get("fonts").unwrap().detail, "Arial found");
        assert!(report.get("images").is_none());
    }

    #[test]
    fn test_display_lists_checks_in_order() {
        let mut report = ValidationReport::new();
        report.push("slide_count", true, "2 slides");
        report.push("fonts", false, "Arial found");

        let text = report.to_string();
        let count_pos = text.find("slide_count").unwrap();
        let fonts_pos = text.find("fonts").unwrap();
        assert!(count_pos < fonts_pos);
        assert!(text.contains("[FAIL] fonts"));
        assert!(text.ends_with("Status: FAILED - 1 of 2 checks failed"));
    }
}
