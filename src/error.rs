//! Process-level error type for the `soh` binary.
//!
//! Every fatal error carries the exit code it maps to:
//!
//! - 2: usage or data-contract violations (bad flags, missing columns,
//!   unreadable or unwritable files)
//! - 3: no usable data left after conditioning
//! - 4: internal numerical failures (non-finite predictions, noise
//!   distribution construction)
//!
//! Fit convergence failure is deliberately not an `AppError`; the fitter
//! absorbs it into `FitOutcome::Fallback` so a run still produces a report.

/// Exit code for usage and data-contract violations.
pub const EXIT_CONTRACT: u8 = 2;
/// Exit code for an empty conditioned dataset.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for internal numerical failures.
pub const EXIT_INTERNAL: u8 = 4;

#[derive(Debug, Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    /// Usage or data-contract violation (exit 2).
    pub fn contract(message: impl Into<String>) -> Self {
        Self {
            exit_code: EXIT_CONTRACT,
            message: message.into(),
        }
    }

    /// No usable data (exit 3).
    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            exit_code: EXIT_NO_DATA,
            message: message.into(),
        }
    }

    /// Internal numerical failure (exit 4).
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            exit_code: EXIT_INTERNAL,
            message: message.into(),
        }
    }

    /// The process exit code this error maps to.
    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_map_to_exit_codes() {
        assert_eq!(AppError::contract("bad flag").exit_code(), 2);
        assert_eq!(AppError::no_data("empty").exit_code(), 3);
        assert_eq!(AppError::internal("nan").exit_code(), 4);
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = AppError::contract("Missing required column: `capacity`");
        assert_eq!(err.to_string(), "Missing required column: `capacity`");
    }
}
