//! Run settings assembled from the optional TOML file and command-line flags.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use mapbench_core::{HarnessConfig, HarnessError, OutputFormat, weather::DEFAULT_DAYS};
use serde::Deserialize;

use crate::CliArgs;

/// Contents of a `--config` file. Every key is optional.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileSettings {
    pub(crate) warmup: Option<u32>,
    pub(crate) iterations: Option<u32>,
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) single_thread: Option<bool>,
    pub(crate) verify_outputs: Option<bool>,
    pub(crate) days: Option<Vec<u64>>,
    pub(crate) cases: Option<Vec<String>>,
    pub(crate) format: Option<OutputFormat>,
}

impl FileSettings {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| HarnessError::config(format!("read config {}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub(crate) fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    pub(crate) harness: HarnessConfig,
    pub(crate) days: Vec<u64>,
    pub(crate) cases: Vec<String>,
    pub(crate) format: OutputFormat,
}

impl Settings {
    /// Flags win over file values, file values win over built-in defaults.
    pub(crate) fn resolve(args: &CliArgs, file: FileSettings) -> Self {
        let defaults = HarnessConfig::default();
        let timeout_ms = args.timeout_ms.or(file.timeout_ms);
        let harness = HarnessConfig {
            warmup_iterations: args.warmup.or(file.warmup).unwrap_or(defaults.warmup_iterations),
            measured_iterations: args
                .iterations
                .or(file.iterations)
                .unwrap_or(defaults.measured_iterations),
            iteration_timeout: timeout_ms.map(Duration::from_millis),
            single_thread: args.single_thread || file.single_thread.unwrap_or(defaults.single_thread),
            verify_outputs: file.verify_outputs.unwrap_or(defaults.verify_outputs),
        };

        let days = if !args.days.is_empty() {
            args.days.clone()
        } else {
            file.days.unwrap_or_else(|| DEFAULT_DAYS.to_vec())
        };
        let cases = if !args.cases.is_empty() {
            args.cases.clone()
        } else {
            file.cases.unwrap_or_default()
        };
        let format = args.format.map(OutputFormat::from).or(file.format).unwrap_or_default();

        Self {
            harness,
            days,
            cases,
            format,
        }
    }
}
