//! Health statistics for the census service.
//!
//! This module provides types for tracking snapshot generation performance,
//! vanished processes and report requests across all transports.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Duration, Instant, SystemTime};

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns `(last, avg, max, min, count)`.
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe window of recent report request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only last 10 minutes of timestamps
            if let Some(cutoff) = now.checked_sub(Duration::from_secs(600)) {
                while guard.front().is_some_and(|&t| t < cutoff) {
                    guard.pop_front();
                }
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            match Instant::now().checked_sub(Duration::from_secs(60)) {
                Some(cutoff) => guard.iter().filter(|&&t| t >= cutoff).count() as u64,
                None => guard.len() as u64,
            }
        } else {
            0
        }
    }
}

/// Counters shared by the snapshot provider and all transports.
pub struct HealthStats {
    // Snapshot generation
    pub snapshots_generated: AtomicU64,
    pub snapshot_failures: AtomicU64,
    /// Outcome of the most recent generation; false until one fails.
    pub last_snapshot_failed: AtomicBool,
    pub omitted_processes: AtomicU64,
    pub processes_per_snapshot: Stat,
    pub snapshot_duration_ms: Stat,

    // Report delivery
    pub socket_reports_served: AtomicU64,
    pub http_reports_served: AtomicU64,
    pub report_requests: RequestTimestamps,

    // Timing
    pub start_time: Instant,
    pub last_snapshot_time: StdRwLock<Option<SystemTime>>,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            snapshots_generated: AtomicU64::new(0),
            snapshot_failures: AtomicU64::new(0),
            last_snapshot_failed: AtomicBool::new(false),
            omitted_processes: AtomicU64::new(0),
            processes_per_snapshot: Stat::default(),
            snapshot_duration_ms: Stat::default(),
            socket_reports_served: AtomicU64::new(0),
            http_reports_served: AtomicU64::new(0),
            report_requests: RequestTimestamps::default(),
            start_time: Instant::now(),
            last_snapshot_time: StdRwLock::new(None),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_snapshot(&self, processes: u64, omitted: u64, duration_ms: f64) {
        self.snapshots_generated.fetch_add(1, Ordering::Relaxed);
        self.last_snapshot_failed.store(false, Ordering::Relaxed);
        self.omitted_processes.fetch_add(omitted, Ordering::Relaxed);
        self.processes_per_snapshot.add_sample(processes as f64);
        self.snapshot_duration_ms.add_sample(duration_ms);
        if let Ok(mut guard) = self.last_snapshot_time.write() {
            *guard = Some(SystemTime::now());
        }
    }

    pub fn record_snapshot_failure(&self) {
        self.snapshot_failures.fetch_add(1, Ordering::Relaxed);
        self.last_snapshot_failed.store(true, Ordering::Relaxed);
    }

    pub fn record_socket_report(&self) {
        self.socket_reports_served.fetch_add(1, Ordering::Relaxed);
        self.report_requests.record();
    }

    pub fn record_http_report(&self) {
        self.http_reports_served.fetch_add(1, Ordering::Relaxed);
        self.report_requests.record();
    }

    pub fn get_success_rate(&self) -> f64 {
        let success = self.snapshots_generated.load(Ordering::Relaxed);
        let failure = self.snapshot_failures.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_last_snapshot_time_str(&self) -> String {
        const SECS_PER_DAY: u64 = 86400;
        const SECS_PER_HOUR: u64 = 3600;
        const SECS_PER_MINUTE: u64 = 60;

        let last = match self.last_snapshot_time.read() {
            Ok(guard) => *guard,
            Err(_) => None,
        };
        match last.and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok()) {
            Some(since_epoch) => {
                let secs = since_epoch.as_secs();
                format!(
                    "{:02}:{:02}:{:02} UTC",
                    (secs % SECS_PER_DAY) / SECS_PER_HOUR,
                    (secs % SECS_PER_HOUR) / SECS_PER_MINUTE,
                    secs % SECS_PER_MINUTE
                )
            }
            None => "N/A".to_string(),
        }
    }

    /// Renders all statistics as a plain-text table.
    pub fn render_table(&self) -> String {
        let (pc_cur, pc_avg, pc_max, pc_min, _) = self.processes_per_snapshot.snapshot();
        let (sd_cur, sd_avg, sd_max, sd_min, _) = self.snapshot_duration_ms.snapshot();

        let mut out = String::new();
        writeln!(
            out,
            "{:28} | {:>10} | {:>10} | {:>10} | {:>10}",
            "Metric", "Current", "Average", "Max", "Min"
        )
        .ok();
        writeln!(out, "{}", "-".repeat(80)).ok();
        writeln!(
            out,
            "{:28} | {:>10.0} | {:>10.1} | {:>10.0} | {:>10.0}",
            "processes per snapshot", pc_cur, pc_avg, pc_max, pc_min
        )
        .ok();
        writeln!(
            out,
            "{:28} | {:>10.2} | {:>10.2} | {:>10.2} | {:>10.2}",
            "snapshot duration (ms)", sd_cur, sd_avg, sd_max, sd_min
        )
        .ok();
        writeln!(out).ok();

        let counters = [
            (
                "snapshots generated",
                self.snapshots_generated.load(Ordering::Relaxed),
            ),
            (
                "snapshot failures",
                self.snapshot_failures.load(Ordering::Relaxed),
            ),
            (
                "omitted processes",
                self.omitted_processes.load(Ordering::Relaxed),
            ),
            (
                "socket reports served",
                self.socket_reports_served.load(Ordering::Relaxed),
            ),
            (
                "http reports served",
                self.http_reports_served.load(Ordering::Relaxed),
            ),
            (
                "requests last minute",
                self.report_requests.count_last_minute(),
            ),
        ];
        for (name, value) in counters {
            writeln!(out, "{:28} | {:>10}", name, value).ok();
        }

        writeln!(out).ok();
        writeln!(out, "{:28} | {:>9.1}%", "success rate", self.get_success_rate()).ok();
        writeln!(
            out,
            "{:28} | {:>10}",
            "last snapshot",
            self.get_last_snapshot_time_str()
        )
        .ok();
        out
    }
}
