//! Core errors (renderer-agnostic).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("Window size must be non-zero, got {width}x{height}")]
    ZeroWindowSize { width: u32, height: u32 },

    #[error("Camera step must be finite and positive, got {0}")]
    InvalidStep(f32),

    #[error("MSAA sample count must be 1 or 4, got {0}")]
    InvalidSampleCount(u32),

    #[error("Grid needs at least one slice and a positive spacing (slices={slices}, spacing={spacing})")]
    InvalidGrid { slices: u32, spacing: f32 },
}

pub type CoreResult<T> = Result<T, CoreError>;
