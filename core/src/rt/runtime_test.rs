//! Tests for runtime construction and ordered fan-in

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::error::HarnessError;
use crate::rt::{Runtime, join_ordered};

static TEST_RUNTIME: Lazy<Runtime> = Lazy::new(|| Runtime::new_multi_thread().expect("multi-thread runtime"));

#[test]
fn test_join_ordered_restores_input_order() {
    let completed = Arc::new(AtomicUsize::new(0));
    let results = TEST_RUNTIME.block_on(async {
        let handles = (0..32usize)
            .map(|i| {
                let completed = completed.clone();
                tokio::spawn(async move {
                    // Later indices yield fewer times, so they tend to finish first.
                    for _ in 0..(32 - i) {
                        tokio::task::yield_now().await;
                    }
                    let position = completed.fetch_add(1, Ordering::SeqCst);
                    Ok((i, position))
                })
            })
            .collect();
        join_ordered(handles).await
    });

    let results = results.expect("all tasks succeed");
    let indices: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (0..32).collect::<Vec<_>>());
    assert_eq!(completed.load(Ordering::SeqCst), 32);
}

#[test]
fn test_join_ordered_surfaces_task_error() {
    let result = TEST_RUNTIME.block_on(async {
        let handles = (0..8u32)
            .map(|key| {
                tokio::spawn(async move {
                    if key == 5 {
                        Err(HarnessError::Lookup { key })
                    } else {
                        Ok(key)
                    }
                })
            })
            .collect();
        join_ordered(handles).await
    });
    assert_eq!(result, Err(HarnessError::Lookup { key: 5 }));
}

#[test]
fn test_join_ordered_maps_panics_to_runtime_error() {
    let result = TEST_RUNTIME.block_on(async {
        let handles: Vec<tokio::task::JoinHandle<crate::error::HarnessResult<u32>>> =
            vec![tokio::spawn(async {
                let missing: Option<u32> = None;
                Ok(missing.expect("boom"))
            })];
        join_ordered(handles).await
    });
    assert!(matches!(result, Err(HarnessError::Runtime(_))));
}

#[test]
fn test_dropping_join_aborts_pending_tasks() {
    let finished = Arc::new(AtomicUsize::new(0));
    TEST_RUNTIME.block_on(async {
        let handles: Vec<tokio::task::JoinHandle<crate::error::HarnessResult<()>>> = (0..4)
            .map(|_| {
                let finished = finished.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();
        let joined = tokio::time::timeout(Duration::from_millis(10), join_ordered(handles)).await;
        assert!(joined.is_err());
        tokio::time::sleep(Duration::from_millis(300)).await;
    });
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}

#[test]
fn test_join_ordered_empty_input() {
    let result: Vec<u8> = TEST_RUNTIME.block_on(join_ordered(Vec::new())).expect("empty join");
    assert!(result.is_empty());
}

#[test]
fn test_runtime_flavors() {
    let current = Runtime::new_current_thread().expect("current-thread runtime");
    assert!(!current.stats().is_multi_threaded);
    assert_eq!(current.block_on(async { 7 }), 7);

    let forced = Runtime::for_config(true).expect("forced single thread");
    assert!(!forced.stats().is_multi_threaded);

    assert!(TEST_RUNTIME.stats().is_multi_threaded);
}
