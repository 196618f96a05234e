//! Telemetry for the DOM projection pipeline.
//!
//! Lightweight atomic counters + latency aggregates so the CLI can surface
//! basic stage timings without depending on an external metrics backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static FUSE_TOTAL: AtomicU64 = AtomicU64::new(0);
static FUSE_LAT_NS: AtomicU64 = AtomicU64::new(0);
static FUSE_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static SIMPLIFY_TOTAL: AtomicU64 = AtomicU64::new(0);
static SIMPLIFY_LAT_NS: AtomicU64 = AtomicU64::new(0);
static SIMPLIFY_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static SERIALIZE_TOTAL: AtomicU64 = AtomicU64::new(0);
static SERIALIZE_LAT_NS: AtomicU64 = AtomicU64::new(0);
static SERIALIZE_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static SELECTOR_MAP_SIZE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricCounter {
    pub total: u64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub fuse: MetricCounter,
    pub simplify: MetricCounter,
    pub serialize: MetricCounter,
    pub last_selector_map_size: u64,
}

pub fn record_fuse(duration: Duration) {
    FUSE_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&FUSE_LAT_NS, &FUSE_LAT_SAMPLES, duration);
}

pub fn record_simplify(duration: Duration) {
    SIMPLIFY_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&SIMPLIFY_LAT_NS, &SIMPLIFY_LAT_SAMPLES, duration);
}

pub fn record_serialize(duration: Duration, selector_map_size: usize) {
    SERIALIZE_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&SERIALIZE_LAT_NS, &SERIALIZE_LAT_SAMPLES, duration);
    SELECTOR_MAP_SIZE.store(selector_map_size as u64, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    MetricSnapshot {
        fuse: make_counter(
            FUSE_TOTAL.load(Ordering::Relaxed),
            FUSE_LAT_NS.load(Ordering::Relaxed),
            FUSE_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        simplify: make_counter(
            SIMPLIFY_TOTAL.load(Ordering::Relaxed),
            SIMPLIFY_LAT_NS.load(Ordering::Relaxed),
            SIMPLIFY_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        serialize: make_counter(
            SERIALIZE_TOTAL.load(Ordering::Relaxed),
            SERIALIZE_LAT_NS.load(Ordering::Relaxed),
            SERIALIZE_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        last_selector_map_size: SELECTOR_MAP_SIZE.load(Ordering::Relaxed),
    }
}

fn make_counter(total: u64, nanos: u64, samples: u64) -> MetricCounter {
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (nanos as f64 / samples as f64) / 1_000_000.0
    };
    MetricCounter { total, avg_ms }
}

fn record_latency(total_ns: &AtomicU64, samples: &AtomicU64, duration: Duration) {
    let nanos = duration_to_nanos(duration);
    total_ns.fetch_add(nanos, Ordering::Relaxed);
    samples.fetch_add(1, Ordering::Relaxed);
}

fn duration_to_nanos(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}
