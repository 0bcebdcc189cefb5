//! Codebook mapping joint activity windows to class indices.

use ndarray::{Array2, ArrayView2, ArrayView3};

use crate::patterns::WindowPattern;
use crate::{ProjectionError, Result, MAX_BINS};

/// Index of a joint future-activity class in `[0, 2^(2 * n_bins))`.
pub type ClassIndex = usize;

/// Bijection between two-channel binary activity windows and class indices.
///
/// Channel A occupies the high `n_bins` bits of the index and channel B the
/// low `n_bins` bits; within a channel the leftmost bin is most significant.
/// Encode and decode are exact inverses over the whole class space.
#[derive(Debug, Clone)]
pub struct Codebook {
    bin_frames: Vec<usize>,
    n_bins: usize,
    n_classes: usize,
}

impl Codebook {
    pub fn new(bin_frames: Vec<usize>) -> Result<Self> {
        if bin_frames.is_empty() {
            return Err(ProjectionError::EmptyBinTimes);
        }
        if bin_frames.len() > MAX_BINS {
            return Err(ProjectionError::TooManyBins(bin_frames.len()));
        }
        let n_bins = bin_frames.len();
        Ok(Self {
            bin_frames,
            n_bins,
            n_classes: 1 << (2 * n_bins),
        })
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Frame count of each bin, in window order.
    pub fn bin_frames(&self) -> &[usize] {
        &self.bin_frames
    }

    /// Total projection horizon in frames.
    pub fn horizon(&self) -> usize {
        self.bin_frames.iter().sum()
    }

    /// Encode a joint bit pattern.
    pub fn encode_pattern(&self, window: WindowPattern) -> ClassIndex {
        ((window.a as ClassIndex) << self.n_bins) | window.b as ClassIndex
    }

    /// Decode a class index back into its joint bit pattern.
    pub fn decode(&self, index: ClassIndex) -> Result<WindowPattern> {
        if index >= self.n_classes {
            return Err(ProjectionError::ClassRange {
                index,
                n_classes: self.n_classes,
            });
        }
        let mask = (1 << self.n_bins) - 1;
        Ok(WindowPattern::new(
            ((index >> self.n_bins) & mask) as u8,
            (index & mask) as u8,
        ))
    }

    /// Encode a `(2, n_bins)` binary activity window.
    pub fn encode(&self, window: ArrayView2<f32>) -> Result<ClassIndex> {
        let (rows, cols) = window.dim();
        if rows != 2 || cols != self.n_bins {
            return Err(ProjectionError::WindowShape {
                expected: self.n_bins,
                rows,
                cols,
            });
        }
        let mut pattern = WindowPattern::new(0, 0);
        for (channel, bits) in [&mut pattern.a, &mut pattern.b].into_iter().enumerate() {
            for bin in 0..self.n_bins {
                let v = window[[channel, bin]];
                if v != 0.0 && v != 1.0 {
                    return Err(ProjectionError::NonBinaryValue(v));
                }
                if v == 1.0 {
                    *bits |= 1 << (self.n_bins - 1 - bin);
                }
            }
        }
        Ok(self.encode_pattern(pattern))
    }

    /// Encode a batch of `(N, 2, n_bins)` windows.
    pub fn encode_batch(&self, windows: ArrayView3<f32>) -> Result<Vec<ClassIndex>> {
        let (n, rows, cols) = windows.dim();
        if rows != 2 || cols != self.n_bins {
            return Err(ProjectionError::WindowShape {
                expected: self.n_bins,
                rows,
                cols,
            });
        }
        let mut indices = Vec::with_capacity(n);
        for window in windows.outer_iter() {
            indices.push(self.encode(window)?);
        }
        Ok(indices)
    }

    /// Decode a class index into a `(2, n_bins)` binary matrix.
    pub fn to_window(&self, index: ClassIndex) -> Result<Array2<f32>> {
        let pattern = self.decode(index)?;
        let mut window = Array2::zeros((2, self.n_bins));
        for (channel, bits) in [pattern.a, pattern.b].into_iter().enumerate() {
            for bin in 0..self.n_bins {
                if bits & (1 << (self.n_bins - 1 - bin)) != 0 {
                    window[[channel, bin]] = 1.0;
                }
            }
        }
        Ok(window)
    }
}
