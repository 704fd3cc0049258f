use thiserror::Error;

use crate::{config::ConfigError, hull::TraceError, tessellate::TessellationError};

/// Fatal failure of one generation pass.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("outer hull did not close for seed {seed}: {source}")]
    OuterHullOpen {
        seed: u64,
        #[source]
        source: TraceError,
    },
    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

impl GenerationError {
    /// Whether another seed might succeed.
    pub fn is_seed_dependent(&self) -> bool {
        !matches!(self, GenerationError::Config(_))
    }
}
