use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};

pub const DEFAULT_WARMUP_ITERATIONS: u32 = 3;
pub const DEFAULT_MEASURED_ITERATIONS: u32 = 10;
/// Upper bound for both warmup and measured iterations.
pub const MAX_ITERATIONS: u32 = 1_000_000;

/// Knobs that shape how every cell is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Iterations run and discarded before measuring.
    pub warmup_iterations: u32,
    /// Iterations that produce measurements. Must be at least one.
    pub measured_iterations: u32,
    /// Upper bound for one concurrent iteration.
    pub iteration_timeout: Option<Duration>,
    /// Drive concurrent cases on a current-thread runtime.
    pub single_thread: bool,
    /// Compare each case's output with the baseline's for the same binding.
    pub verify_outputs: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            measured_iterations: DEFAULT_MEASURED_ITERATIONS,
            iteration_timeout: None,
            single_thread: false,
            verify_outputs: true,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> HarnessResult<()> {
        if self.measured_iterations == 0 {
            return Err(HarnessError::config("measured iterations must be at least 1"));
        }
        if self.measured_iterations > MAX_ITERATIONS || self.warmup_iterations > MAX_ITERATIONS {
            return Err(HarnessError::config(format!(
                "iterations must not exceed {}",
                MAX_ITERATIONS
            )));
        }
        if self.iteration_timeout.is_some_and(|limit| limit.is_zero()) {
            return Err(HarnessError::config("iteration timeout must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HarnessConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_iterations_and_zero_timeout() {
        let no_iterations = HarnessConfig {
            measured_iterations: 0,
            ..Default::default()
        };
        assert!(matches!(no_iterations.validate(), Err(HarnessError::Configuration(_))));

        let zero_timeout = HarnessConfig {
            iteration_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(zero_timeout.validate(), Err(HarnessError::Configuration(_))));
    }

    #[test]
    fn test_rejects_oversized_iteration_counts() {
        let too_many = HarnessConfig {
            measured_iterations: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(too_many.validate(), Err(HarnessError::Configuration(_))));

        let long_warmup = HarnessConfig {
            warmup_iterations: MAX_ITERATIONS + 1,
            ..Default::default()
        };
        assert!(long_warmup.validate().is_err());

        let at_limit = HarnessConfig {
            warmup_iterations: MAX_ITERATIONS,
            measured_iterations: MAX_ITERATIONS,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }
}
