//! Procedural geometry
//!
//! This module provides:
//! - `Object`: a drawable mesh owning its vertex/normal/texcoord/index buffers
//! - Generators for sphere, cube, plane, triangle strip and quad strip
//! - A precomputed cos/sin table for callers animating around a circle

pub mod object;
pub mod shapes;
pub mod trig;

pub use object::{Object, TextureHandle};
pub use shapes::{cube, plane, rectangle_strip, sphere, triangle_strip};
pub use trig::TrigTable;
