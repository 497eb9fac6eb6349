//! Aggregates measurements into per-cell statistics relative to the baseline.

mod render;


pub use render::OutputFormat;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::case::{CaseInfo, ExecutionMode, single_baseline};
use crate::error::{HarnessError, HarnessResult};
use crate::executor::Measurement;
use crate::params::Binding;

/// Summary of one (binding, case) cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub binding: String,
    pub case: String,
    pub mode: ExecutionMode,
    pub baseline: bool,
    pub samples: usize,
    pub mean_ns: f64,
    pub min_ns: u64,
    pub max_ns: u64,
    pub mean_alloc_bytes: f64,
    /// Mean time divided by the baseline's mean time; `None` when the baseline cell failed.
    pub time_ratio: Option<f64>,
    pub alloc_ratio: Option<f64>,
}

/// A cell dropped from the table because its run failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedCell {
    pub binding: String,
    pub case: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub baseline: String,
    pub rows: Vec<ReportRow>,
    pub excluded: Vec<ExcludedCell>,
}

impl Report {
    pub fn has_exclusions(&self) -> bool {
        !self.excluded.is_empty()
    }

    pub fn row(&self, binding: &str, case: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.binding == binding && row.case == case)
    }
}

struct CellStats {
    samples: usize,
    mean_ns: f64,
    min_ns: u64,
    max_ns: u64,
    mean_alloc_bytes: f64,
}

impl CellStats {
    fn from_measurements(measurements: &[&Measurement]) -> Option<Self> {
        if measurements.is_empty() {
            return None;
        }
        let nanos: Vec<u64> = measurements
            .iter()
            .map(|m| u64::try_from(m.elapsed.as_nanos()).unwrap_or(u64::MAX))
            .collect();
        let count = measurements.len() as f64;
        let total_ns: f64 = nanos.iter().map(|&ns| ns as f64).sum();
        let total_alloc: f64 = measurements.iter().map(|m| m.allocated_bytes as f64).sum();
        Some(Self {
            samples: measurements.len(),
            mean_ns: total_ns / count,
            min_ns: nanos.iter().copied().min().unwrap_or(0),
            max_ns: nanos.iter().copied().max().unwrap_or(0),
            mean_alloc_bytes: total_alloc / count,
        })
    }
}

fn ratio(value: f64, baseline: f64) -> Option<f64> {
    if baseline > 0.0 {
        Some(value / baseline)
    } else if value == 0.0 {
        Some(1.0)
    } else {
        None
    }
}

/// Collects measurements and failures for a grid, then compiles a [`Report`].
#[derive(Debug)]
pub struct Reporter {
    cases: Vec<CaseInfo>,
    bindings: Vec<Binding>,
    measurements: Vec<Measurement>,
    failures: Vec<(Binding, String, HarnessError)>,
}

impl Reporter {
    pub fn new(cases: Vec<CaseInfo>, bindings: Vec<Binding>) -> Self {
        Self {
            cases,
            bindings,
            measurements: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    pub fn extend<I: IntoIterator<Item = Measurement>>(&mut self, measurements: I) {
        self.measurements.extend(measurements);
    }

    /// Marks a cell as excluded; the error is listed under the table.
    pub fn record_failure(&mut self, binding: &Binding, case: &str, error: HarnessError) {
        self.failures.push((binding.clone(), case.to_string(), error));
    }

    fn has_failed(&self, binding: &Binding, case: &str) -> bool {
        self.failures.iter().any(|(b, c, _)| b == binding && c == case)
    }

    pub fn compile(&self) -> HarnessResult<Report> {
        let baseline = single_baseline(&self.cases)?;

        let mut cells: FxHashMap<(&Binding, &str), Vec<&Measurement>> = FxHashMap::default();
        for measurement in &self.measurements {
            cells
                .entry((&measurement.binding, measurement.case.as_str()))
                .or_default()
                .push(measurement);
        }

        let mut rows = Vec::new();
        for binding in &self.bindings {
            let stats_for = |case: &str| {
                cells
                    .get(&(binding, case))
                    .and_then(|ms| CellStats::from_measurements(ms))
            };
            let baseline_stats = stats_for(baseline);
            let label = binding.to_string();

            for case in &self.cases {
                if self.has_failed(binding, &case.name) {
                    continue;
                }
                let Some(stats) = stats_for(&case.name) else {
                    continue;
                };
                let (time_ratio, alloc_ratio) = match &baseline_stats {
                    Some(base) => (
                        ratio(stats.mean_ns, base.mean_ns),
                        ratio(stats.mean_alloc_bytes, base.mean_alloc_bytes),
                    ),
                    None if self.has_failed(binding, baseline) => (None, None),
                    None => {
                        return Err(HarnessError::config(format!(
                            "baseline '{}' has no measurements under {} but '{}' does",
                            baseline, label, case.name
                        )));
                    }
                };
                rows.push(ReportRow {
                    binding: label.clone(),
                    case: case.name.clone(),
                    mode: case.mode,
                    baseline: case.baseline,
                    samples: stats.samples,
                    mean_ns: stats.mean_ns,
                    min_ns: stats.min_ns,
                    max_ns: stats.max_ns,
                    mean_alloc_bytes: stats.mean_alloc_bytes,
                    time_ratio,
                    alloc_ratio,
                });
            }
        }

        let excluded = self
            .failures
            .iter()
            .map(|(binding, case, error)| ExcludedCell {
                binding: binding.to_string(),
                case: case.clone(),
                error: error.to_string(),
            })
            .collect();

        Ok(Report {
            baseline: baseline.to_string(),
            rows,
            excluded,
        })
    }
}
