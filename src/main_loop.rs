//! Timed render loop
//!
//! Drives a caller-supplied draw closure, measures wall-clock time, process
//! CPU time and system-wide load around the loop, then reports the derived
//! metrics to a [`ResultSink`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use crate::constants::{RESULT_CPU_ALL, RESULT_CPU_PROCESS, RESULT_FRAMERATE, RESULT_FRAMES};
use crate::error::GleshError;
use crate::perf::{self, CpuTimes, PerfData};
use crate::report::{Measurement, ResultSink};
use crate::timing::Timer;

/// Shared stop flag for untimed runs (set from a signal handler or another thread)
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How long the loop runs
#[derive(Debug, Clone, Default)]
pub struct LoopOptions {
    /// Zero runs until `cancel` is signalled
    pub duration: Duration,
    pub cancel: Option<CancelToken>,
}

impl LoopOptions {
    pub fn timed(duration: Duration) -> Self {
        Self {
            duration,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Per-frame timing handed to the draw closure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Zero-based frame index
    pub frame: u32,
    /// Seconds since the previous frame started (0 for the first frame)
    pub time_step: f64,
    /// Seconds since the loop started
    pub elapsed: f64,
}

/// What the loop needs from a rendering context
pub trait LoopTarget {
    fn perf_data_mut(&mut self) -> &mut PerfData;

    /// One windowing event-pump step (untimed runs only)
    fn pump_events(&mut self) -> anyhow::Result<()>;

    /// Triangles in the current scene, for the run summary
    fn triangle_count(&self) -> u32;
}

/// Run `draw` until the duration elapses or the run is cancelled.
///
/// A frame that starts before the duration is reached is still drawn; the
/// loop stops after it. Metrics are recorded in the target's `PerfData` and
/// reported to `sink` whenever at least the loop itself completed, including
/// a zero-frame run (which then returns `NoFramesRendered`).
pub fn execute_main_loop<T, F>(
    target: &mut T,
    sink: &mut dyn ResultSink,
    options: &LoopOptions,
    mut draw: F,
) -> Result<(), GleshError>
where
    T: LoopTarget + ?Sized,
    F: FnMut(&mut T, &FrameInfo) -> anyhow::Result<()>,
{
    let load_start = CpuTimes::sample();
    let cpu_start = perf::process_cpu_time();

    let timed = !options.duration.is_zero();
    let runtime = options.duration.as_secs_f64();

    let mut timer = Timer::new();
    let mut frames: u32 = 0;
    let mut prev_time = 0.0;
    target.perf_data_mut().frames_rendered = 0;
    timer.start();

    while !options.is_cancelled() {
        let cur_time = timer.elapsed();
        let frame = FrameInfo {
            frame: frames,
            time_step: cur_time - prev_time,
            elapsed: cur_time,
        };
        prev_time = cur_time;

        if let Err(source) = draw(target, &frame) {
            error!("Failed to draw frame {}: {:#}", frames, source);
            target.perf_data_mut().frames_rendered = frames;
            return Err(GleshError::DrawFailed {
                frame: frames,
                source,
            });
        }
        frames += 1;

        if timed {
            if cur_time >= runtime {
                break;
            }
        } else if let Err(e) = target.pump_events() {
            error!("Event dispatch failed, stopping: {:#}", e);
            break;
        }
    }

    timer.stop();
    let elapsed = timer.elapsed();
    let cpu_seconds = perf::process_cpu_time()
        .saturating_sub(cpu_start)
        .as_secs_f64();
    let total_load = match (load_start, CpuTimes::sample()) {
        (Some(start), Some(end)) => CpuTimes::load_percent(&start, &end),
        _ => 0.0,
    };

    let triangles = target.triangle_count();
    let perf = target.perf_data_mut();
    perf.frames_rendered = frames;
    perf.finish(elapsed, cpu_seconds, total_load);
    let perf = *perf;

    info!(
        "{} frames in {:.2} s ({:.2} fps), {} triangles/frame, CPU {:.1}% (process) {:.1}% (all)",
        perf.frames_rendered,
        perf.total_time_elapsed,
        perf.fps,
        triangles,
        perf.cpu_usage,
        perf.total_load
    );

    report_perf(sink, &perf);

    if frames == 0 {
        return Err(GleshError::NoFramesRendered);
    }
    Ok(())
}

fn report_perf(sink: &mut dyn ResultSink, perf: &PerfData) {
    sink.report(&Measurement::new(RESULT_FRAMERATE, perf.fps, "1/s"));
    sink.report(&Measurement::new(RESULT_CPU_PROCESS, perf.cpu_usage, "%"));
    sink.report(&Measurement::new(RESULT_CPU_ALL, perf.total_load, "%"));
    sink.report(&Measurement::new(
        RESULT_FRAMES,
        perf.frames_rendered as f64,
        "frames",
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use anyhow::bail;

    #[derive(Default)]
    struct FakeTarget {
        perf: PerfData,
        pumps: u32,
        triangles: u32,
    }

    impl LoopTarget for FakeTarget {
        fn perf_data_mut(&mut self) -> &mut PerfData {
            &mut self.perf
        }

        fn pump_events(&mut self) -> anyhow::Result<()> {
            self.pumps += 1;
            Ok(())
        }

        fn triangle_count(&self) -> u32 {
            self.triangles
        }
    }

    #[test]
    fn test_timed_run_lasts_at_least_duration() {
        let mut target = FakeTarget::default();
        let mut sink = MemorySink::new();
        let options = LoopOptions::timed(Duration::from_millis(200));

        let mut steps = Vec::new();
        execute_main_loop(&mut target, &mut sink, &options, |_, info| {
            steps.push(info.time_step);
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        })
        .unwrap();

        assert!(target.perf.total_time_elapsed >= 0.2);
        assert!(target.perf.frames_rendered >= 1);
        assert_eq!(target.perf.frames_rendered as usize, steps.len());
        assert!(target.perf.fps > 0.0);
        assert!(steps.iter().all(|s| *s >= 0.0));
        // Timed runs never pump events
        assert_eq!(target.pumps, 0);
    }

    #[test]
    fn test_draw_failure_stops_loop() {
        let mut target = FakeTarget::default();
        let mut sink = MemorySink::new();
        let options = LoopOptions::timed(Duration::from_secs(60));

        let err = execute_main_loop(&mut target, &mut sink, &options, |_, info| {
            if info.frame == 2 {
                bail!("shader gone");
            }
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, GleshError::DrawFailed { frame: 2, .. }));
        assert_eq!(target.perf.frames_rendered, 2);
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_untimed_run_stops_on_cancel() {
        let mut target = FakeTarget {
            triangles: 12,
            ..Default::default()
        };
        let mut sink = MemorySink::new();
        let cancel = CancelToken::new();
        let options = LoopOptions::default().with_cancel(cancel.clone());

        execute_main_loop(&mut target, &mut sink, &options, |_, info| {
            if info.frame == 9 {
                cancel.cancel();
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(target.perf.frames_rendered, 10);
        assert_eq!(target.pumps, 10);
        assert_eq!(sink.value(RESULT_FRAMES), Some(10.0));
    }

    #[test]
    fn test_cancel_before_first_frame() {
        let mut target = FakeTarget::default();
        let mut sink = MemorySink::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let options = LoopOptions::timed(Duration::from_secs(1)).with_cancel(cancel);

        let err = execute_main_loop(&mut target, &mut sink, &options, |_, _| {
            panic!("draw must not run")
        })
        .unwrap_err();

        assert!(matches!(err, GleshError::NoFramesRendered));
        assert_eq!(target.perf.fps, 0.0);
        assert_eq!(sink.value(RESULT_FRAMERATE), Some(0.0));
    }

    #[test]
    fn test_reports_all_metrics() {
        let mut target = FakeTarget::default();
        let mut sink = MemorySink::new();
        let options = LoopOptions::timed(Duration::from_millis(20));

        execute_main_loop(&mut target, &mut sink, &options, |_, _| Ok(())).unwrap();

        let names: Vec<&str> = sink.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![RESULT_FRAMERATE, RESULT_CPU_PROCESS, RESULT_CPU_ALL, RESULT_FRAMES]
        );
        let units: Vec<&str> = sink.records.iter().map(|r| r.unit.as_str()).collect();
        assert_eq!(units, vec!["1/s", "%", "%", "frames"]);
        assert!(sink.records.iter().all(|r| r.flag == 0));
        assert_eq!(
            sink.value(RESULT_FRAMES),
            Some(target.perf.frames_rendered as f64)
        );
    }
}
