//! Projection-window geometry for two-speaker voice activity.
//!
//! A projection window discretizes the near future into a fixed number of
//! bins per speaker. This crate provides the window geometry (bin boundary
//! times at a frame rate), the combinatorial pattern generators used to
//! describe future-activity hypotheses, and the codebook that maps a
//! two-channel binary window onto a single class index.

mod codebook;
mod config;
pub mod patterns;

pub use codebook::{ClassIndex, Codebook};
pub use config::ProjectionConfig;
pub use patterns::{ChannelPattern, DirectionalPatterns, WindowPattern};

/// Maximum number of bins per channel. Class indices are enumerated over
/// `2^(2 * n_bins)` joint patterns, so 8 bins already means 65536 classes.
pub const MAX_BINS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("bin times must not be empty")]
    EmptyBinTimes,
    #[error("bin time {0} is not positive")]
    NonPositiveBinTime(f64),
    #[error("frame rate must be positive")]
    ZeroFrameRate,
    #[error("bin time {0} is shorter than one frame")]
    BinTooShort(f64),
    #[error("{0} bins exceed the supported maximum of {MAX_BINS}")]
    TooManyBins(usize),
    #[error("window shape mismatch: expected (2, {expected}), got ({rows}, {cols})")]
    WindowShape {
        expected: usize,
        rows: usize,
        cols: usize,
    },
    #[error("activity value {0} is not binary")]
    NonBinaryValue(f32),
    #[error("class index {index} out of range for {n_classes} classes")]
    ClassRange { index: usize, n_classes: usize },
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
