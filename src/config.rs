//! Configuration management for graph-cut segmentation

use crate::error::{Result, SegmentationError};
use serde::{Deserialize, Serialize};

/// Regional (t-link) term used for voxels that are not seeds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RegionTerm {
    /// No regional cost; only seeds are tied to the terminals
    None,

    /// Hard assignment: intensities strictly above the threshold go to foreground
    Threshold { threshold: f64 },

    /// Negative log-likelihood under the seed intensity histograms
    Histogram,
}

/// Preferred intensity transition across the object boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryDirection {
    #[default]
    None,
    BrightToDark,
    DarkToBright,
}

/// Voxel neighborhood used for n-links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Face neighbors
    #[default]
    Six,
    /// Face and edge neighbors
    Eighteen,
    /// Face, edge and corner neighbors
    TwentySix,
}

/// Statistic reducing neighbor differences to a noise estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseStatistic {
    #[default]
    MeanAbsoluteDifference,
    MedianAbsoluteDifference,
}

/// How the boundary-term sigma is obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigmaPolicy {
    /// User-supplied value, must be strictly positive
    Fixed(f64),

    /// Estimated from the volume
    Estimate(NoiseStatistic),
}

impl Default for SigmaPolicy {
    fn default() -> Self {
        SigmaPolicy::Estimate(NoiseStatistic::default())
    }
}

/// Parameters of one segmentation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Weight of the regional term relative to the boundary term
    pub lambda: f64,

    /// Noise scale of the boundary term
    pub sigma: SigmaPolicy,

    /// Number of bins of the foreground and background histograms
    pub histogram_bins: usize,

    /// Regional term for non-seed voxels
    pub region_term: RegionTerm,

    /// Directional boundary preference
    pub boundary_direction: BoundaryDirection,

    /// Neighborhood for n-links
    pub connectivity: Connectivity,

    /// Physical voxel size along x, y and z
    pub spacing: [f64; 3],
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            sigma: SigmaPolicy::default(),
            histogram_bins: 10,
            region_term: RegionTerm::Histogram,
            boundary_direction: BoundaryDirection::None,
            connectivity: Connectivity::Six,
            spacing: [1.0, 1.0, 1.0],
        }
    }
}

impl SegmentationConfig {
    /// Create a new configuration with custom values and unit spacing
    pub fn new(
        lambda: f64,
        sigma: SigmaPolicy,
        histogram_bins: usize,
        region_term: RegionTerm,
        boundary_direction: BoundaryDirection,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            lambda,
            sigma,
            histogram_bins,
            region_term,
            boundary_direction,
            connectivity,
            spacing: [1.0, 1.0, 1.0],
        }
    }

    /// Reject parameter combinations the energy terms cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(SegmentationError::Configuration(format!(
                "lambda must be finite and non-negative, got {}",
                self.lambda
            )));
        }

        if let SigmaPolicy::Fixed(sigma) = self.sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(SegmentationError::Configuration(format!(
                    "sigma must be finite and strictly positive, got {}",
                    sigma
                )));
            }
        }

        if self.histogram_bins == 0 {
            return Err(SegmentationError::Configuration(
                "number of histogram bins must be > 0".to_string(),
            ));
        }

        if let RegionTerm::Threshold { threshold } = self.region_term {
            if threshold.is_nan() {
                return Err(SegmentationError::Configuration(
                    "region threshold must be a number".to_string(),
                ));
            }
        }

        if self.spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(SegmentationError::Configuration(format!(
                "voxel spacing must be strictly positive, got {:?}",
                self.spacing
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SegmentationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.region_term, RegionTerm::Histogram);
        assert_eq!(config.sigma, SigmaPolicy::Estimate(NoiseStatistic::MeanAbsoluteDifference));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut config = SegmentationConfig::default();
        config.lambda = -0.5;
        assert!(matches!(config.validate(), Err(SegmentationError::Configuration(_))));

        let mut config = SegmentationConfig::default();
        config.sigma = SigmaPolicy::Fixed(0.0);
        assert!(matches!(config.validate(), Err(SegmentationError::Configuration(_))));

        let mut config = SegmentationConfig::default();
        config.histogram_bins = 0;
        assert!(matches!(config.validate(), Err(SegmentationError::Configuration(_))));

        let mut config = SegmentationConfig::default();
        config.region_term = RegionTerm::Threshold { threshold: f64::NAN };
        assert!(matches!(config.validate(), Err(SegmentationError::Configuration(_))));

        let mut config = SegmentationConfig::default();
        config.spacing = [1.0, 0.0, 1.0];
        assert!(matches!(config.validate(), Err(SegmentationError::Configuration(_))));
    }

    #[test]
    fn test_json_config() {
        let json = r#"{
            "lambda": 2.5,
            "sigma": { "fixed": 12.0 },
            "region_term": { "mode": "threshold", "threshold": 80.0 },
            "boundary_direction": "bright_to_dark",
            "connectivity": "twenty_six"
        }"#;
        let config: SegmentationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.lambda, 2.5);
        assert_eq!(config.sigma, SigmaPolicy::Fixed(12.0));
        assert_eq!(config.region_term, RegionTerm::Threshold { threshold: 80.0 });
        assert_eq!(config.boundary_direction, BoundaryDirection::BrightToDark);
        assert_eq!(config.connectivity, Connectivity::TwentySix);
        // Unspecified fields fall back to defaults
        assert_eq!(config.histogram_bins, 10);
        assert_eq!(config.spacing, [1.0, 1.0, 1.0]);
    }
}
