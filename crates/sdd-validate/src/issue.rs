//! The `Issue` type every validator reports into (spec.md §4.2).

use sdd_utils::error::{IssueSeverity, IssueSummary};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub severity: IssueSeverity,
    pub code: &'static str,
    pub location: String,
    pub message: String,
    pub auto_fixable: bool,
}

impl Issue {
    #[must_use]
    pub fn error(code: &'static str, location: impl Into<String>, message: impl Into<String>) -> Self {
        Issue {
            severity: IssueSeverity::Error,
            code,
            location: location.into(),
            message: message.into(),
            auto_fixable: false,
        }
    }

    #[must_use]
    pub fn warning(code: &'static str, location: impl Into<String>, message: impl Into<String>) -> Self {
        Issue {
            severity: IssueSeverity::Warning,
            code,
            location: location.into(),
            message: message.into(),
            auto_fixable: false,
        }
    }

    #[must_use]
    pub fn info(code: &'static str, location: impl Into<String>, message: impl Into<String>) -> Self {
        Issue {
            severity: IssueSeverity::Info,
            code,
            location: location.into(),
            message: message.into(),
            auto_fixable: false,
        }
    }

    #[must_use]
    pub fn fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }

    #[must_use]
    pub fn to_summary(&self) -> IssueSummary {
        IssueSummary {
            severity: self.severity,
            code: self.code.to_string(),
            location: self.location.clone(),
            message: self.message.clone(),
        }
    }
}

#[must_use]
pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == IssueSeverity::Error)
}
