//! MetricsAggregator behaviour under concurrent recording.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tron_gateway::analytics::DEFAULT_WINDOW_CAPACITY;
use tron_gateway::{Capability, MetricsAggregator, SystemStatus};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_records_are_all_counted() {
    let metrics = Arc::new(MetricsAggregator::new());
    let mut tasks = JoinSet::new();

    for worker in 0..8u64 {
        let metrics = Arc::clone(&metrics);
        tasks.spawn(async move {
            for i in 0..250u64 {
                let capability = Capability::ALL[(worker + i) as usize % Capability::COUNT];
                // every 10th call fails
                metrics.record(capability, Duration::from_millis(i % 7), i % 10 != 0);
                if i % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 2000);
    assert_eq!(snapshot.error_count, 8 * 25);
    assert_eq!(snapshot.capability_usage.values().sum::<u64>(), 2000);
    assert!((snapshot.error_rate - 10.0).abs() < 1e-9);
    assert_eq!(snapshot.system_status, SystemStatus::Degraded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn window_keeps_only_the_latest_samples() {
    let metrics = Arc::new(MetricsAggregator::new());
    let mut tasks = JoinSet::new();

    for _ in 0..4 {
        let metrics = Arc::clone(&metrics);
        tasks.spawn(async move {
            for _ in 0..400 {
                metrics.record(Capability::TextGeneration, Duration::from_millis(3), true);
            }
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 1600);
    assert_eq!(snapshot.response_time_samples, DEFAULT_WINDOW_CAPACITY);
    assert!((snapshot.performance_metrics.average_response_time - 0.003).abs() < 1e-9);
}

#[test]
fn window_evicts_oldest_first() {
    let metrics = MetricsAggregator::with_window_capacity(3);
    for ms in [100, 200, 300, 400, 500] {
        metrics.record(Capability::WebResearch, Duration::from_millis(ms), true);
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.response_times, vec![0.3, 0.4, 0.5]);
    assert!((snapshot.performance_metrics.average_response_time - 0.4).abs() < 1e-9);
    // the window bounds averages, not totals
    assert_eq!(snapshot.total_requests, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn snapshots_stay_coherent_under_load() {
    let metrics = Arc::new(MetricsAggregator::new());
    let mut writers = JoinSet::new();

    for _ in 0..4 {
        let metrics = Arc::clone(&metrics);
        writers.spawn(async move {
            for i in 0..500u32 {
                metrics.record(Capability::CodeExecution, Duration::from_micros(500), i % 2 == 0);
                // interleave with the reader
                if i % 20 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        });
    }

    let reader = {
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            let mut last_total = 0;
            for _ in 0..200 {
                let snapshot = metrics.snapshot();
                assert!(snapshot.error_count <= snapshot.total_requests);
                assert!(snapshot.total_requests >= last_total);
                assert_eq!(snapshot.usage(Capability::CodeExecution), snapshot.total_requests);
                assert!(snapshot.error_rate <= 100.0);
                last_total = snapshot.total_requests;
                tokio::task::yield_now().await;
            }
        })
    };

    while let Some(joined) = writers.join_next().await {
        joined.unwrap();
    }
    reader.await.unwrap();

    assert_eq!(metrics.snapshot().total_requests, 2000);
}

#[tokio::test]
async fn dropped_guards_record_failures() {
    let metrics = Arc::new(MetricsAggregator::new());

    let handle = {
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            let _guard = metrics.begin(Capability::BrowserControl);
            tokio::time::sleep(Duration::from_secs(3600)).await;
        })
    };
    tokio::task::yield_now().await;
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.error_count, 1);
    assert_eq!(snapshot.usage(Capability::BrowserControl), 1);
}

#[test]
fn fresh_aggregator_reports_zeroes() {
    let snapshot = MetricsAggregator::new().snapshot();

    assert_eq!(snapshot.system_status, SystemStatus::Operational);
    assert_eq!(snapshot.total_requests, 0);
    assert_eq!(snapshot.error_rate, 0.0);
    assert_eq!(snapshot.performance_metrics.average_response_time, 0.0);
    assert_eq!(snapshot.performance_metrics.requests_per_minute, 0.0);
    assert_eq!(snapshot.capability_usage.len(), Capability::COUNT);

    let flat = snapshot.flatten();
    assert_eq!(flat.len(), 5 + Capability::COUNT);
    assert_eq!(flat["tron_ai_total_requests"], 0.0);
    assert_eq!(flat["tron_ai_capability_workflow_automation_usage"], 0.0);
}
