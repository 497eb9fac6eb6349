pub mod alloc;
pub mod case;
pub mod config;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod harness;
pub mod params;
pub mod report;
pub mod rt;
pub mod weather;

#[cfg(test)]
mod harness_test;

pub use case::{BenchmarkCase, ExecutionMode, Suite};
pub use config::HarnessConfig;
pub use dataset::ReferenceDataset;
pub use error::{HarnessError, HarnessResult};
pub use harness::Harness;
pub use params::{Binding, ParamDecl, ParameterSet};
pub use report::{OutputFormat, Report, Reporter};

// Unit tests measure allocations, so their binary counts them too.
#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: alloc::CountingAllocator = alloc::CountingAllocator;
