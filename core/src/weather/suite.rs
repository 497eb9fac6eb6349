use std::sync::Arc;

use super::{MappedWeather, Workload, map_concurrently, map_sequentially};
use crate::case::{BenchmarkCase, Suite};
use crate::dataset::ReferenceDataset;
use crate::error::HarnessResult;
use crate::params::{Binding, ParameterSet};

pub const NUMBER_OF_DAYS: &str = "NumberOfDays";
pub const DEFAULT_DAYS: [u64; 3] = [10, 25, 100];

pub const CONCURRENT_CASE: &str = "concurrent_mapper";
pub const SEQUENTIAL_CASE: &str = "sequential_mapper";

pub fn day_parameters(days: &[u64]) -> HarnessResult<ParameterSet> {
    ParameterSet::single(NUMBER_OF_DAYS, days.to_vec())
}

/// Registers the concurrent mapper (baseline) and the sequential mapper.
/// Both generate their readings inside the iteration, so generation cost is
/// charged equally to each.
pub fn weather_suite(workload: Workload) -> HarnessResult<Suite<Vec<MappedWeather>>> {
    let workload = Arc::new(workload);
    let mut suite = Suite::new();

    let concurrent_workload = Arc::clone(&workload);
    suite.register(
        BenchmarkCase::concurrent(CONCURRENT_CASE, move |binding: Binding, dataset: Arc<ReferenceDataset>| {
            let workload = Arc::clone(&concurrent_workload);
            async move {
                let days = binding.require(NUMBER_OF_DAYS)?;
                map_concurrently(workload.readings(days), dataset).await
            }
        })
        .baseline(),
    )?;

    suite.register(BenchmarkCase::sequential(
        SEQUENTIAL_CASE,
        move |binding: &Binding, dataset: &ReferenceDataset| {
            let days = binding.require(NUMBER_OF_DAYS)?;
            map_sequentially(&workload.readings(days), dataset)
        },
    ))?;

    Ok(suite)
}
