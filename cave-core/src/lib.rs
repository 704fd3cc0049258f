//! Procedural 2-D cave generation.
//!
//! Main components:
//! - [`graph`]: branching node graph grown from the origin.
//! - [`segment`]: directed graph edges and the arena owning their meshes.
//! - [`mesh`]: ribbon meshes laid along each segment.
//! - [`overlap`]: point-in-mesh queries across segments.
//! - [`hull`]: outer and inner boundary tracing over the ribbon meshes.
//! - [`tessellate`]: triangulation of the traced hulls into layers.
//! - [`phases`]: the generation pipeline, one function per phase.
//! - [`session`]: a seeded generation pass and the [`Cave`] it yields.
//! - [`config`]: tunables, validation and RON loading.
//! - [`curve`]: keyframed Hermite curves used by the config and meshes.
//! - [`geometry`]: small vector helpers.
//! - [`types`]: shared ids.

pub mod config;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod hull;
pub mod mesh;
pub mod overlap;
pub mod phases;
pub mod segment;
pub mod session;
pub mod tessellate;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use config::{CaveConfig, ConfigError};
pub use error::GenerationError;
pub use session::{Cave, GenerationReport, GenerationSession, generate, generate_with_retry};
