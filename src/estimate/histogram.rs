//! Seed intensity histograms for the regional term

use crate::error::{Result, SegmentationError};
use crate::volume::VoxelIndex;
use ndarray::Array3;

/// Probabilities below this value are clamped before taking the logarithm
pub const PROBABILITY_FLOOR: f64 = 1e-10;

/// 1-D frequency histogram of seed intensities
///
/// Bin edges span a fixed intensity range (normally the global range of the
/// volume) so that every voxel of the volume falls into some bin.
#[derive(Debug, Clone)]
pub struct IntensityHistogram {
    /// Lower edge of the first bin
    min: f64,

    /// Upper edge of the last bin
    max: f64,

    /// Sample count per bin
    counts: Vec<u32>,

    /// Total number of samples
    total: u32,
}

impl IntensityHistogram {
    /// Create an empty histogram over `[min, max]`
    pub fn new(range: (f64, f64), bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(SegmentationError::Configuration(
                "number of histogram bins must be > 0".to_string(),
            ));
        }

        let (min, max) = range;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(SegmentationError::Configuration(format!(
                "invalid histogram range [{}, {}]",
                min, max
            )));
        }

        Ok(Self {
            min,
            max,
            counts: vec![0; bins],
            total: 0,
        })
    }

    /// Build a histogram from the intensities at the given seed voxels
    pub fn from_seeds(
        intensities: &Array3<f64>,
        seeds: &[VoxelIndex],
        range: (f64, f64),
        bins: usize,
    ) -> Result<Self> {
        if seeds.is_empty() {
            return Err(SegmentationError::InsufficientSeeds(
                "cannot build an intensity histogram from an empty seed set".to_string(),
            ));
        }

        let mut histogram = Self::new(range, bins)?;
        for seed in seeds {
            let value = intensities.get(seed.as_pattern()).ok_or_else(|| {
                SegmentationError::InsufficientSeeds(format!("seed {} is outside the volume", seed))
            })?;
            histogram.add_sample(*value);
        }

        Ok(histogram)
    }

    /// Record one intensity sample
    pub fn add_sample(&mut self, value: f64) {
        let bin = self.bin_of(value);
        self.counts[bin] += 1;
        self.total += 1;
    }

    /// Bin containing `value`; out-of-range values land in the edge bins
    pub fn bin_of(&self, value: f64) -> usize {
        let bins = self.counts.len();
        let width = self.max - self.min;
        if width <= 0.0 || value.is_nan() || value <= self.min {
            return 0;
        }

        let position = (value - self.min) / width * bins as f64;
        (position.floor() as usize).min(bins - 1)
    }

    /// Normalized frequency of the bin containing `value`
    pub fn probability(&self, value: f64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.counts[self.bin_of(value)] as f64 / self.total as f64
    }

    /// Natural log of the probability, floored at `PROBABILITY_FLOOR`
    pub fn log_probability(&self, value: f64) -> f64 {
        self.probability(value).max(PROBABILITY_FLOOR).ln()
    }

    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    pub fn sample_count(&self) -> u32 {
        self.total
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}
