use thiserror::Error;

/// Errors raised while constructing an [`Inpainter`](crate::inpaint::engine::Inpainter).
///
/// Iteration itself never fails; running out of hole pixels is the normal
/// terminal state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InpaintError {
    #[error("image {width}x{height} is too large to allocate working buffers")]
    Allocation { width: u32, height: u32 },

    #[error("source is {source_width}x{source_height} but mask is {mask_width}x{mask_height}")]
    DimensionMismatch {
        source_width: u32,
        source_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("{which} buffer holds {len} pixels, which does not fit a {width}x{height} image")]
    BufferLength {
        which: &'static str,
        width: u32,
        height: u32,
        len: usize,
    },

    #[error("patch size {patch_size} is invalid for a {width}x{height} image")]
    InvalidPatchSize {
        patch_size: u32,
        width: u32,
        height: u32,
    },
}

/// Errors raised while loading an [`InpaintConfig`](crate::config::InpaintConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("patch size must be at least 1")]
    InvalidPatchSize,
}
