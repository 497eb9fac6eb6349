//! Async runtime used to drive concurrent benchmark cases.

mod runtime;

#[cfg(test)]
mod runtime_test;

pub use runtime::{Runtime, RuntimeStats, join_ordered};
