//! Runs one case under one binding and records a measurement per iteration.

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::alloc::AllocSnapshot;
use crate::case::{BenchmarkCase, CaseBody, SyncCaseFn};
use crate::config::HarnessConfig;
use crate::dataset::ReferenceDataset;
use crate::error::{HarnessError, HarnessResult};
use crate::params::Binding;
use crate::rt::Runtime;

/// One timed iteration of one case under one binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub case: String,
    pub binding: Binding,
    pub iteration: u32,
    pub elapsed: Duration,
    pub allocated_bytes: u64,
}

/// Measurements of one cell plus the output of its last measured iteration.
#[derive(Debug)]
pub struct CellRun<O> {
    pub measurements: Vec<Measurement>,
    pub output: O,
}

enum Pending<'a, O> {
    Sync(&'a SyncCaseFn<O>),
    Async(BoxFuture<'static, HarnessResult<O>>),
}

pub struct Executor<'rt> {
    runtime: &'rt Runtime,
    dataset: Arc<ReferenceDataset>,
    warmup_iterations: u32,
    measured_iterations: u32,
    iteration_timeout: Option<Duration>,
}

impl<'rt> Executor<'rt> {
    pub fn new(runtime: &'rt Runtime, dataset: Arc<ReferenceDataset>, config: &HarnessConfig) -> HarnessResult<Self> {
        config.validate()?;
        Ok(Self {
            runtime,
            dataset,
            warmup_iterations: config.warmup_iterations,
            measured_iterations: config.measured_iterations,
            iteration_timeout: config.iteration_timeout,
        })
    }

    /// Warmup iterations are run and dropped; any error in either phase
    /// aborts the cell and is returned unchanged.
    pub fn run<O>(&self, case: &BenchmarkCase<O>, binding: &Binding) -> HarnessResult<CellRun<O>>
    where
        O: Send + 'static,
    {
        debug!(case = case.name(), binding = %binding, mode = %case.mode(), "running cell");

        for _ in 0..self.warmup_iterations {
            let pending = self.prepare(case, binding);
            drop(black_box(self.drive(case, binding, pending)?));
        }

        let mut measurements = Vec::with_capacity(self.measured_iterations as usize);
        let mut last: Option<O> = None;
        for iteration in 0..self.measured_iterations {
            // Release the previous output first so its frees never overlap a sample.
            drop(last.take());
            let pending = self.prepare(case, binding);

            let before = AllocSnapshot::take();
            let start = Instant::now();
            let output = self.drive(case, binding, pending)?;
            let elapsed = start.elapsed();
            let after = AllocSnapshot::take();

            let allocated_bytes = after.allocated_since(&before);
            trace!(case = case.name(), iteration, ?elapsed, allocated_bytes, "iteration");
            measurements.push(Measurement {
                case: case.name().to_string(),
                binding: binding.clone(),
                iteration,
                elapsed,
                allocated_bytes,
            });
            last = Some(black_box(output));
        }

        let output = last.ok_or_else(|| HarnessError::config("measured iterations must be at least 1"))?;
        Ok(CellRun { measurements, output })
    }

    // Builds the future outside the timed window so boxing it is not charged to the case.
    fn prepare<'c, O: 'static>(&self, case: &'c BenchmarkCase<O>, binding: &Binding) -> Pending<'c, O> {
        match case.body() {
            CaseBody::Sync(f) => Pending::Sync(f.as_ref()),
            CaseBody::Async(f) => Pending::Async(f(binding.clone(), Arc::clone(&self.dataset))),
        }
    }

    fn drive<O: 'static>(
        &self,
        case: &BenchmarkCase<O>,
        binding: &Binding,
        pending: Pending<'_, O>,
    ) -> HarnessResult<O> {
        match pending {
            Pending::Sync(f) => f(binding, self.dataset.as_ref()),
            Pending::Async(future) => match self.iteration_timeout {
                Some(limit) => self
                    .runtime
                    .block_on(async { tokio::time::timeout(limit, future).await })
                    .map_err(|_| HarnessError::Timeout {
                        case: case.name().to_string(),
                        after: limit,
                    })?,
                None => self.runtime.block_on(future),
            },
        }
    }
}
