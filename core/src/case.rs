//! Benchmark case registration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::dataset::ReferenceDataset;
use crate::error::{HarnessError, HarnessResult};
use crate::params::Binding;

/// How a case drives its lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Resolves lookups up front, then maps synchronously on the driver thread.
    Sequential,
    /// Spawns work onto the async runtime and joins it before the iteration ends.
    Concurrent,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Concurrent => write!(f, "concurrent"),
        }
    }
}

pub type SyncCaseFn<O> = dyn Fn(&Binding, &ReferenceDataset) -> HarnessResult<O> + Send + Sync;
pub type AsyncCaseFn<O> = dyn Fn(Binding, Arc<ReferenceDataset>) -> BoxFuture<'static, HarnessResult<O>> + Send + Sync;

pub enum CaseBody<O> {
    Sync(Arc<SyncCaseFn<O>>),
    Async(Arc<AsyncCaseFn<O>>),
}

impl<O> Clone for CaseBody<O> {
    fn clone(&self) -> Self {
        match self {
            CaseBody::Sync(f) => CaseBody::Sync(Arc::clone(f)),
            CaseBody::Async(f) => CaseBody::Async(Arc::clone(f)),
        }
    }
}

/// A named variant of the benchmarked transformation.
pub struct BenchmarkCase<O> {
    name: String,
    baseline: bool,
    body: CaseBody<O>,
}

impl<O> Clone for BenchmarkCase<O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            baseline: self.baseline,
            body: self.body.clone(),
        }
    }
}

impl<O> fmt::Debug for BenchmarkCase<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkCase")
            .field("name", &self.name)
            .field("baseline", &self.baseline)
            .field("mode", &self.mode())
            .finish()
    }
}

impl<O: Send + 'static> BenchmarkCase<O> {
    pub fn sequential<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Binding, &ReferenceDataset) -> HarnessResult<O> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            baseline: false,
            body: CaseBody::Sync(Arc::new(body)),
        }
    }

    pub fn concurrent<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Binding, Arc<ReferenceDataset>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HarnessResult<O>> + Send + 'static,
    {
        Self {
            name: name.into(),
            baseline: false,
            body: CaseBody::Async(Arc::new(move |binding: Binding, dataset: Arc<ReferenceDataset>| {
                body(binding, dataset).boxed()
            })),
        }
    }
}

impl<O> BenchmarkCase<O> {
    /// Marks this case as the one every other case is compared against.
    pub fn baseline(mut self) -> Self {
        self.baseline = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_baseline(&self) -> bool {
        self.baseline
    }

    pub fn mode(&self) -> ExecutionMode {
        match self.body {
            CaseBody::Sync(_) => ExecutionMode::Sequential,
            CaseBody::Async(_) => ExecutionMode::Concurrent,
        }
    }

    pub fn body(&self) -> &CaseBody<O> {
        &self.body
    }

    pub fn info(&self) -> CaseInfo {
        CaseInfo {
            name: self.name.clone(),
            baseline: self.baseline,
            mode: self.mode(),
        }
    }
}

/// Case metadata without the callable, as consumed by the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseInfo {
    pub name: String,
    pub baseline: bool,
    pub mode: ExecutionMode,
}

/// Returns the name of the single baseline case.
pub fn single_baseline<'a, I>(cases: I) -> HarnessResult<&'a str>
where
    I: IntoIterator<Item = &'a CaseInfo>,
{
    let baselines: Vec<&str> = cases
        .into_iter()
        .filter(|case| case.baseline)
        .map(|case| case.name.as_str())
        .collect();
    match baselines.as_slice() {
        [name] => Ok(*name),
        [] => Err(HarnessError::config("no case is marked as baseline")),
        many => Err(HarnessError::config(format!(
            "exactly one baseline is required, found {}: {}",
            many.len(),
            many.join(", ")
        ))),
    }
}

/// Ordered registry of benchmark cases.
pub struct Suite<O> {
    cases: Vec<BenchmarkCase<O>>,
}

impl<O> fmt::Debug for Suite<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.cases.iter().map(|case| case.name.as_str())).finish()
    }
}

impl<O> Default for Suite<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Suite<O> {
    pub fn new() -> Self {
        Self { cases: Vec::new() }
    }

    pub fn register(&mut self, case: BenchmarkCase<O>) -> HarnessResult<()> {
        if case.name.trim().is_empty() {
            return Err(HarnessError::config("case name must not be empty"));
        }
        if self.cases.iter().any(|existing| existing.name == case.name) {
            return Err(HarnessError::config(format!("case '{}' is registered twice", case.name)));
        }
        self.cases.push(case);
        Ok(())
    }

    pub fn cases(&self) -> &[BenchmarkCase<O>] {
        &self.cases
    }

    pub fn infos(&self) -> Vec<CaseInfo> {
        self.cases.iter().map(BenchmarkCase::info).collect()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn baseline(&self) -> HarnessResult<&BenchmarkCase<O>> {
        let infos = self.infos();
        let name = single_baseline(&infos)?;
        self.cases
            .iter()
            .find(|case| case.name == name)
            .ok_or_else(|| HarnessError::config(format!("baseline case '{}' vanished", name)))
    }

    /// Narrows the suite to the named cases, keeping registration order.
    /// An empty selection keeps every case.
    pub fn select(&self, names: &[String]) -> HarnessResult<Suite<O>> {
        if names.is_empty() {
            return Ok(Suite {
                cases: self.cases.clone(),
            });
        }
        if let Some(unknown) = names.iter().find(|name| !self.cases.iter().any(|c| &c.name == *name)) {
            let known: Vec<&str> = self.cases.iter().map(|c| c.name.as_str()).collect();
            return Err(HarnessError::config(format!(
                "unknown case '{}' (registered: {})",
                unknown,
                known.join(", ")
            )));
        }
        Ok(Suite {
            cases: self
                .cases
                .iter()
                .filter(|case| names.contains(&case.name))
                .cloned()
                .collect(),
        })
    }
}
