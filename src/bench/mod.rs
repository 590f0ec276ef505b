//! Benchmark programs
//!
//! Each benchmark sets up its scene on a fresh context, hands a draw closure
//! to the render loop and releases its GL objects afterwards.

mod simple_tri;
mod textured_sphere;

use anyhow::Result;
use khronos_egl as egl;

use glesh::{LoopOptions, RenderingContext, ResultSink};

pub type RunFn = fn(&mut RenderingContext, &mut dyn ResultSink, &LoopOptions) -> Result<()>;

pub struct Benchmark {
    pub name: &'static str,
    pub description: &'static str,
    /// EGL config request; `None` uses the library default
    pub config_attribs: Option<&'static [egl::Int]>,
    pub run: RunFn,
}

pub const BENCHMARKS: &[Benchmark] = &[
    Benchmark {
        name: "simple_tri",
        description: "Rotating flat-shaded triangle",
        config_attribs: None,
        run: simple_tri::run,
    },
    Benchmark {
        name: "textured_sphere",
        description: "Rotating sphere with a generated RGB565 texture, depth tested",
        config_attribs: Some(&textured_sphere::CONFIG_ATTRIBS),
        run: textured_sphere::run,
    },
];

pub fn find(name: &str) -> Option<&'static Benchmark> {
    BENCHMARKS.iter().find(|b| b.name == name)
}
