//! Projection window configuration.

use serde::{Deserialize, Serialize};

use crate::{Codebook, ProjectionError, Result, MAX_BINS};

/// Geometry of the projection window: bin boundary times and the frame
/// rate used to convert them into per-bin frame counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Duration of each future bin in seconds, in window order.
    pub bin_times: Vec<f64>,
    /// Decoder frame rate in Hz.
    pub frame_hz: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            bin_times: vec![0.2, 0.4, 0.6, 0.8],
            frame_hz: 50,
        }
    }
}

impl ProjectionConfig {
    pub fn new(bin_times: Vec<f64>, frame_hz: usize) -> Self {
        Self { bin_times, frame_hz }
    }

    /// Number of bins per channel.
    pub fn n_bins(&self) -> usize {
        self.bin_times.len()
    }

    /// Convert bin times into frame counts at the configured frame rate.
    pub fn bin_frames(&self) -> Result<Vec<usize>> {
        if self.bin_times.is_empty() {
            return Err(ProjectionError::EmptyBinTimes);
        }
        if self.frame_hz == 0 {
            return Err(ProjectionError::ZeroFrameRate);
        }
        if self.bin_times.len() > MAX_BINS {
            return Err(ProjectionError::TooManyBins(self.bin_times.len()));
        }
        let mut frames = Vec::with_capacity(self.bin_times.len());
        for &t in &self.bin_times {
            if t <= 0.0 {
                return Err(ProjectionError::NonPositiveBinTime(t));
            }
            let f = (t * self.frame_hz as f64) as usize;
            if f == 0 {
                return Err(ProjectionError::BinTooShort(t));
            }
            frames.push(f);
        }
        Ok(frames)
    }

    /// Build the codebook for this geometry.
    pub fn codebook(&self) -> Result<Codebook> {
        Codebook::new(self.bin_frames()?)
    }
}
