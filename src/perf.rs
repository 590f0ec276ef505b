//! Performance counters and OS load sampling
//!
//! Process CPU time comes from `getrusage(RUSAGE_SELF)`, system-wide load
//! from the aggregate `cpu` line of `/proc/stat`.

use std::time::Duration;

use log::error;
use nix::sys::resource::{getrusage, UsageWho};
use nix::sys::time::TimeVal;

const PROC_STAT_PATH: &str = "/proc/stat";

/// Metrics of the last render-loop run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfData {
    pub frames_rendered: u32,
    /// Wall-clock seconds spent in the loop
    pub total_time_elapsed: f64,
    pub fps: f64,
    /// This process's CPU time as % of wall time
    pub cpu_usage: f64,
    /// Non-idle % across all processes and CPUs
    pub total_load: f64,
}

impl PerfData {
    /// Fill derived fields from raw counters.
    ///
    /// Zero frames or zero elapsed time yield 0 instead of inf/NaN.
    pub fn finish(&mut self, elapsed: f64, cpu_seconds: f64, total_load: f64) {
        self.total_time_elapsed = elapsed;
        self.total_load = total_load;
        self.fps = if self.frames_rendered > 0 && elapsed > 0.0 {
            self.frames_rendered as f64 / elapsed
        } else {
            0.0
        };
        self.cpu_usage = if elapsed > 0.0 {
            100.0 * cpu_seconds / elapsed
        } else {
            0.0
        };
    }
}

fn timeval_to_duration(tv: TimeVal) -> Duration {
    Duration::from_secs(tv.tv_sec().max(0) as u64)
        + Duration::from_micros(tv.tv_usec().max(0) as u64)
}

/// User + system CPU time consumed so far by this process
pub fn process_cpu_time() -> Duration {
    match getrusage(UsageWho::RUSAGE_SELF) {
        Ok(usage) => timeval_to_duration(usage.user_time()) + timeval_to_duration(usage.system_time()),
        Err(e) => {
            error!("getrusage failed: {}", e);
            Duration::ZERO
        }
    }
}

/// Aggregate CPU time-in-state counters (jiffies)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuTimes {
    /// Parse the first (`cpu`) line of `/proc/stat` content
    pub fn parse(stat: &str) -> Option<Self> {
        let line = stat.lines().next()?;
        let mut fields = line.split_whitespace();
        if !fields.next()?.starts_with("cpu") {
            return None;
        }
        let mut next = || fields.next()?.parse::<u64>().ok();
        Some(Self {
            user: next()?,
            nice: next()?,
            system: next()?,
            idle: next()?,
        })
    }

    /// Current counters, `None` when `/proc/stat` is unreadable
    pub fn sample() -> Option<Self> {
        let parsed = std::fs::read_to_string(PROC_STAT_PATH)
            .ok()
            .and_then(|s| Self::parse(&s));
        if parsed.is_none() {
            error!("Failed to read {}", PROC_STAT_PATH);
        }
        parsed
    }

    /// Non-idle percentage between two samples (0 when nothing elapsed).
    ///
    /// A counter that went backwards (idle under NO_HZ, CPU hotplug)
    /// contributes 0.
    pub fn load_percent(start: &CpuTimes, end: &CpuTimes) -> f64 {
        let busy = end.user.saturating_sub(start.user) as f64
            + end.nice.saturating_sub(start.nice) as f64
            + end.system.saturating_sub(start.system) as f64;
        let idle = end.idle.saturating_sub(start.idle) as f64;
        let total = busy + idle;
        if total == 0.0 {
            return 0.0;
        }
        busy * 100.0 / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const STAT: &str = "cpu  4705 150 1120 16250 520 0 30 0 0 0\ncpu0 2000 70 500 8000 200 0 10 0 0 0\n";

    #[test]
    fn test_parse_proc_stat() {
        let t = CpuTimes::parse(STAT).unwrap();
        assert_eq!(
            t,
            CpuTimes {
                user: 4705,
                nice: 150,
                system: 1120,
                idle: 16250
            }
        );
        assert!(CpuTimes::parse("intr 1 2 3 4").is_none());
        assert!(CpuTimes::parse("cpu 1 2").is_none());
        assert!(CpuTimes::parse("").is_none());
    }

    #[test]
    fn test_load_percent() {
        let a = CpuTimes { user: 100, nice: 0, system: 50, idle: 850 };
        let b = CpuTimes { user: 160, nice: 10, system: 80, idle: 1000 };
        // busy = 60 + 10 + 30 = 100, idle = 150
        assert_relative_eq!(CpuTimes::load_percent(&a, &b), 40.0);
        assert_eq!(CpuTimes::load_percent(&a, &a), 0.0);
    }

    #[test]
    fn test_load_percent_idle_going_backwards() {
        let a = CpuTimes { user: 100, nice: 0, system: 50, idle: 1000 };
        let b = CpuTimes { user: 160, nice: 10, system: 80, idle: 999 };
        assert_relative_eq!(CpuTimes::load_percent(&a, &b), 100.0);

        // Every counter behind the start sample
        assert_eq!(CpuTimes::load_percent(&b, &a), 0.0);
    }

    #[test]
    fn test_finish_guards_zero_frames() {
        let mut perf = PerfData::default();
        perf.finish(1.0, 0.5, 10.0);
        assert_eq!(perf.fps, 0.0);
        assert_relative_eq!(perf.cpu_usage, 50.0);

        perf.frames_rendered = 120;
        perf.finish(2.0, 0.5, 10.0);
        assert_relative_eq!(perf.fps, 60.0);
        assert_relative_eq!(perf.cpu_usage, 25.0);
        assert_relative_eq!(perf.total_load, 10.0);
    }

    #[test]
    fn test_process_cpu_time_is_monotonic() {
        let a = process_cpu_time();
        let mut x = 0u64;
        for i in 0..200_000u64 {
            x = x.wrapping_add(i * i);
        }
        std::hint::black_box(x);
        assert!(process_cpu_time() >= a);
    }
}
