//! Monotonic timer used by the render loop

use std::time::Instant;

/// Start/stop stopwatch on the monotonic clock.
///
/// `elapsed()` reads the running time while started, or the frozen span
/// between start and stop once stopped. An unstarted timer reads zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct Timer {
    start: Option<Instant>,
    stop: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start = Some(Instant::now());
        self.stop = None;
    }

    pub fn stop(&mut self) {
        if self.start.is_some() {
            self.stop = Some(Instant::now());
        }
    }

    /// Elapsed seconds
    pub fn elapsed(&self) -> f64 {
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => stop.duration_since(start).as_secs_f64(),
            (Some(start), None) => start.elapsed().as_secs_f64(),
            _ => 0.0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.start.is_some() && self.stop.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unstarted_timer_reads_zero() {
        let timer = Timer::new();
        assert_eq!(timer.elapsed(), 0.0);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stopped_timer_is_frozen() {
        let mut timer = Timer::new();
        timer.start();
        std::thread::sleep(Duration::from_millis(5));
        timer.stop();
        let first = timer.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert!(first >= 0.005);
        assert_eq!(first, timer.elapsed());
    }
}
