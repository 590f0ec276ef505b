//! glesh - GLES2 benchmarking helper for embedded Linux
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        Benchmark program (draw fn)       │
//! ├──────────────────────────────────────────┤
//! │  Render loop  →  PerfData  →  ResultSink │
//! │       ↓                                  │
//! │  RenderingContext (pools, EGL, GL)       │
//! │       ↓                                  │
//! │  WindowSystem: Wayland | fbdev           │
//! └──────────────────────────────────────────┘
//! ```

pub mod bitmap;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod main_loop;
pub mod matrix;
pub mod perf;
pub mod pool;
pub mod report;
pub mod timing;
pub mod ws;

pub use context::RenderingContext;
pub use error::GleshError;
pub use main_loop::{execute_main_loop, CancelToken, FrameInfo, LoopOptions, LoopTarget};
pub use matrix::Matrix;
pub use perf::PerfData;
pub use report::{LogSink, Measurement, MemorySink, ResultSink};
pub use ws::{Backend, NativeWindow, WindowSystem};
