use std::fmt;
use std::time::Duration;

/// Errors raised while declaring, executing or reporting benchmarks.
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// Bad parameter declarations, duplicate names or baseline misconfiguration.
    Configuration(String),
    /// The reference dataset has no entry for `key`.
    Lookup { key: u32 },
    /// A concurrent iteration did not finish within the configured limit.
    Timeout { case: String, after: Duration },
    /// A case produced output that differs from the baseline for the same binding.
    Divergence { case: String, binding: String },
    /// The async runtime could not be built or a spawned task failed.
    Runtime(String),
}

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    pub fn config(message: impl Into<String>) -> Self {
        HarnessError::Configuration(message.into())
    }

    /// Fatal errors abort the whole run; the rest only exclude the affected cell.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::Configuration(_) | HarnessError::Runtime(_))
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Configuration(message) => write!(f, "configuration error: {}", message),
            HarnessError::Lookup { key } => write!(f, "lookup error: no reference entry for key {}", key),
            HarnessError::Timeout { case, after } => {
                write!(f, "timeout: case '{}' exceeded {:?} per iteration", case, after)
            }
            HarnessError::Divergence { case, binding } => write!(
                f,
                "divergence: case '{}' produced output different from the baseline under {}",
                case, binding
            ),
            HarnessError::Runtime(message) => write!(f, "runtime error: {}", message),
        }
    }
}

impl std::error::Error for HarnessError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(HarnessError::config("x").is_fatal());
        assert!(HarnessError::Runtime("x".into()).is_fatal());
        assert!(!HarnessError::Lookup { key: 3 }.is_fatal());
        assert!(
            !HarnessError::Timeout {
                case: "c".into(),
                after: Duration::from_millis(5),
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_lookup_display_names_key() {
        let err = HarnessError::Lookup { key: 42 };
        assert_eq!(err.to_string(), "lookup error: no reference entry for key 42");
    }
}
