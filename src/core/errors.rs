/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use nix::errno::Errno;
use std::fmt;
use thiserror::Error;

/// Harness operation result
pub type HarnessResult<T> = Result<T, HarnessError>;

/// A failed OS call, rendered in the console failure-line format:
/// `<function>(<param>) failed. errno: <code> (<description>)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsFailure {
    pub function: &'static str,
    pub param: Option<String>,
    pub errno: Errno,
}

impl OsFailure {
    pub fn new(function: &'static str, param: Option<&str>, errno: Errno) -> Self {
        Self {
            function,
            param: param.map(str::to_owned),
            errno,
        }
    }
}

impl fmt::Display for OsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Some(param) => write!(f, "{}({}) failed.", self.function, param)?,
            None => write!(f, "{} failed.", self.function)?,
        }
        write!(f, " errno: {} ({})", self.errno as i32, self.errno.desc())
    }
}

impl std::error::Error for OsFailure {}

/// Harness errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum HarnessError {
    #[error(transparent)]
    #[diagnostic(
        code(harness::os_call_failed),
        help("The errno value names the reason the call was rejected by the OS.")
    )]
    Os(#[from] OsFailure),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(harness::invalid_config),
        help("Check the SEMTESTER_* environment variables.")
    )]
    Config(String),
}

impl HarnessError {
    /// Shorthand for an OS call failure
    pub fn os(function: &'static str, param: Option<&str>, errno: Errno) -> Self {
        HarnessError::Os(OsFailure::new(function, param, errno))
    }

    /// The errno behind this error, if it came from an OS call
    pub fn errno(&self) -> Option<Errno> {
        match self {
            HarnessError::Os(failure) => Some(failure.errno),
            HarnessError::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failure_line_with_param() {
        let err = HarnessError::os("sigaction", Some("SIGKILL"), Errno::EINVAL);
        assert_eq!(
            err.to_string(),
            format!(
                "sigaction(SIGKILL) failed. errno: {} ({})",
                Errno::EINVAL as i32,
                Errno::EINVAL.desc()
            )
        );
    }

    #[test]
    fn test_failure_line_without_param() {
        let err = HarnessError::os("sem_unlink", None, Errno::ENOENT);
        assert!(err.to_string().starts_with("sem_unlink failed. errno: 2 ("));
        assert_eq!(err.errno(), Some(Errno::ENOENT));
    }

    #[test]
    fn test_config_error_has_no_errno() {
        let err = HarnessError::Config("bad".into());
        assert_eq!(err.errno(), None);
        assert_eq!(err.to_string(), "Invalid configuration: bad");
    }
}
