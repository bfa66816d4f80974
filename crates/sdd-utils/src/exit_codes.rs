//! Exit code mapping for the `sdd` CLI (spec.md §6.1).
//!
//! Every command exits `0` on success, `1` on validation/user error, `2` on
//! internal error.

use crate::error::SddError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const USER_ERROR: ExitCode = ExitCode(1);
    pub const INTERNAL: ExitCode = ExitCode(2);

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

/// Map an [`SddError`] to its exit code per the §7 propagation policy.
#[must_use]
pub fn error_to_exit_code(error: &SddError) -> ExitCode {
    match error {
        SddError::UserError(_)
        | SddError::ValidationFailed { .. }
        | SddError::NotFound(_)
        | SddError::DependencyBlocked { .. }
        | SddError::CycleDetected { .. }
        | SddError::LockContention { .. }
        | SddError::MalformedSpec { .. }
        | SddError::ExternalToolNotFound(_)
        | SddError::ConsultationFailed { .. } => ExitCode::USER_ERROR,
        SddError::IoError { .. } | SddError::Internal(_) => ExitCode::INTERNAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_exit_one() {
        let err = SddError::NotFound("x".into());
        assert_eq!(error_to_exit_code(&err), ExitCode::USER_ERROR);
    }

    #[test]
    fn internal_errors_exit_two() {
        let err = SddError::Internal("bug".into());
        assert_eq!(error_to_exit_code(&err), ExitCode::INTERNAL);
    }
}
