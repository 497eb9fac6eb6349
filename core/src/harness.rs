//! Driver loop: every binding of the grid, every case of the suite.

use std::sync::Arc;

use tracing::{info, warn};

use crate::case::Suite;
use crate::config::HarnessConfig;
use crate::dataset::ReferenceDataset;
use crate::error::{HarnessError, HarnessResult};
use crate::executor::{CellRun, Executor};
use crate::params::ParameterSet;
use crate::report::{Report, Reporter};
use crate::rt::Runtime;

pub struct Harness<O> {
    suite: Suite<O>,
    params: ParameterSet,
    dataset: Arc<ReferenceDataset>,
    config: HarnessConfig,
}

impl<O> Harness<O>
where
    O: PartialEq + Send + 'static,
{
    /// Validates everything that can be checked before measuring, so
    /// configuration errors never surface halfway through a run.
    pub fn new(
        suite: Suite<O>,
        params: ParameterSet,
        dataset: Arc<ReferenceDataset>,
        config: HarnessConfig,
    ) -> HarnessResult<Self> {
        config.validate()?;
        if suite.is_empty() {
            return Err(HarnessError::config("no benchmark cases selected"));
        }
        suite.baseline()?;
        Ok(Self {
            suite,
            params,
            dataset,
            config,
        })
    }

    pub fn suite(&self) -> &Suite<O> {
        &self.suite
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs the whole grid. Lookup errors, timeouts and output divergence
    /// exclude the affected cell; configuration and runtime errors abort.
    pub fn run(&self, runtime: &Runtime) -> HarnessResult<Report> {
        let executor = Executor::new(runtime, Arc::clone(&self.dataset), &self.config)?;
        let bindings = self.params.bindings();
        let baseline = self.suite.baseline()?.name().to_string();
        let mut reporter = Reporter::new(self.suite.infos(), bindings.clone());

        for binding in &bindings {
            info!(binding = %binding, cases = self.suite.len(), "measuring binding");

            let mut cells: Vec<(&str, CellRun<O>)> = Vec::with_capacity(self.suite.len());
            for case in self.suite.cases() {
                match executor.run(case, binding) {
                    Ok(cell) => cells.push((case.name(), cell)),
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        warn!(case = case.name(), binding = %binding, error = %err, "excluding cell");
                        reporter.record_failure(binding, case.name(), err);
                    }
                }
            }

            let reference = if self.config.verify_outputs {
                cells.iter().position(|(name, _)| *name == baseline)
            } else {
                None
            };

            let mut diverged = Vec::new();
            if let Some(reference) = reference {
                for (idx, (name, cell)) in cells.iter().enumerate() {
                    if idx != reference && cell.output != cells[reference].1.output {
                        diverged.push(idx);
                        let err = HarnessError::Divergence {
                            case: name.to_string(),
                            binding: binding.to_string(),
                        };
                        warn!(case = *name, binding = %binding, "output differs from baseline");
                        reporter.record_failure(binding, name, err);
                    }
                }
            }

            for (idx, (_, cell)) in cells.into_iter().enumerate() {
                if !diverged.contains(&idx) {
                    reporter.extend(cell.measurements);
                }
            }
        }

        reporter.compile()
    }
}
