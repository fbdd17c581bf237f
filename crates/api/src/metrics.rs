use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
    graph_builds: AtomicUsize,
    cache_hits: AtomicUsize,
    subgraph_requests: AtomicUsize,
    retrieval_requests: AtomicUsize,

    // Timing (in microseconds)
    total_build_time_us: AtomicU64,
    total_subgraph_time_us: AtomicU64,
    total_retrieval_time_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            graph_builds: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            subgraph_requests: AtomicUsize::new(0),
            retrieval_requests: AtomicUsize::new(0),
            total_build_time_us: AtomicU64::new(0),
            total_subgraph_time_us: AtomicU64::new(0),
            total_retrieval_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_build(&self, duration: Duration) {
        self.graph_builds.fetch_add(1, Ordering::Relaxed);
        self.total_build_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_subgraph(&self, duration: Duration) {
        self.subgraph_requests.fetch_add(1, Ordering::Relaxed);
        self.total_subgraph_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_retrieval(&self, duration: Duration) {
        self.retrieval_requests.fetch_add(1, Ordering::Relaxed);
        self.total_retrieval_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            graph_builds: self.graph_builds.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            avg_build_time_ms: avg_time_ms(&self.total_build_time_us, &self.graph_builds),
            avg_subgraph_time_ms: avg_time_ms(
                &self.total_subgraph_time_us,
                &self.subgraph_requests,
            ),
            avg_retrieval_time_ms: avg_time_ms(
                &self.total_retrieval_time_us,
                &self.retrieval_requests,
            ),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub graph_builds: usize,
    pub cache_hits: usize,
    pub avg_build_time_ms: f64,
    pub avg_subgraph_time_ms: f64,
    pub avg_retrieval_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
