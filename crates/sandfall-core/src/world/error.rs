//! World construction errors

use thiserror::Error;

/// Reasons a world cannot be built from a configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("chunk grid must be at least 1x1, got {chunks_x}x{chunks_y}")]
    EmptyChunkGrid { chunks_x: u32, chunks_y: u32 },

    #[error("chunk dimensions must be non-zero, got {width}x{height}")]
    EmptyChunk { width: u32, height: u32 },

    #[error("world of {width}x{height} cells exceeds the addressable range")]
    TooLarge { width: u64, height: u64 },

    #[error("chunk grid of {count} chunks exceeds the addressable range")]
    TooManyChunks { count: u64 },

    #[error("scaffolding chain limits must be non-zero (vertical {vertical}, horizontal {horizontal})")]
    InvalidChainLimits { vertical: u32, horizontal: u32 },

    #[error("max_resolve_rounds must be at least 1")]
    NoResolveRounds,
}
