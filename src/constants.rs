//! Global constants for glesh
//!
//! Pool capacities and lookup-table sizes shared by the context and helpers.

// ============================================================================
// Pool Capacities
// ============================================================================

/// Maximum number of objects a context can hold
pub const MAX_OBJECTS: usize = 256;

/// Maximum number of textures a context can hold (also the texture-id pool size)
pub const MAX_TEXTURES: usize = 32;

/// Maximum number of EGL configs tried during context creation
pub const MAX_EGL_CONFIGS: usize = 20;

// ============================================================================
// Defaults
// ============================================================================

/// Color depth used when the caller passes 0
pub const DEFAULT_DEPTH: u32 = 32;

/// Number of samples in the cos/sin lookup table (one full turn)
pub const COS_SIN_TABLE_SIZE: usize = 4096;

// ============================================================================
// Result Names
// ============================================================================

pub const RESULT_FRAMERATE: &str = "framerate";
pub const RESULT_CPU_PROCESS: &str = "cpu_use_test_process";
pub const RESULT_CPU_ALL: &str = "cpu_use_all_processes";
pub const RESULT_FRAMES: &str = "frames_rendered";
