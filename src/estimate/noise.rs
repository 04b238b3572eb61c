//! Noise estimation for the boundary term

use crate::config::{NoiseStatistic, SigmaPolicy};
use crate::error::{Result, SegmentationError};
use ndarray::Array3;
use rayon::prelude::*;
use statrs::statistics::{Data, Median, Statistics};

/// Smallest sigma the boundary term is ever evaluated with
pub const MIN_SIGMA: f64 = 1e-6;

/// Resolve the sigma used for this request
pub fn resolve_sigma(intensities: &Array3<f64>, policy: SigmaPolicy) -> Result<f64> {
    match policy {
        SigmaPolicy::Fixed(sigma) => {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(SegmentationError::Configuration(format!(
                    "sigma must be finite and strictly positive, got {}",
                    sigma
                )));
            }
            log::debug!("Using fixed sigma {}", sigma);
            Ok(sigma)
        }
        SigmaPolicy::Estimate(statistic) => Ok(estimate_sigma(intensities, statistic)),
    }
}

/// Estimate the typical intensity variation between neighboring voxels
///
/// Absolute differences are taken between each voxel and its forward face
/// neighbors. Degenerate estimates (uniform or empty volume) are raised to
/// `MIN_SIGMA`.
pub fn estimate_sigma(intensities: &Array3<f64>, statistic: NoiseStatistic) -> f64 {
    let differences = neighbor_differences(intensities);

    let estimate = if differences.is_empty() {
        0.0
    } else {
        match statistic {
            NoiseStatistic::MeanAbsoluteDifference => differences.iter().mean(),
            NoiseStatistic::MedianAbsoluteDifference => Data::new(differences.clone()).median(),
        }
    };

    if !estimate.is_finite() || estimate < MIN_SIGMA {
        log::warn!(
            "Degenerate noise estimate {} over {} neighbor pairs, using sigma = {}",
            estimate,
            differences.len(),
            MIN_SIGMA
        );
        return MIN_SIGMA;
    }

    log::info!(
        "Estimated sigma {:.4} from {} neighbor pairs ({:?})",
        estimate,
        differences.len(),
        statistic
    );
    estimate
}

/// Absolute differences to the +x, +y and +z neighbor of every voxel
fn neighbor_differences(intensities: &Array3<f64>) -> Vec<f64> {
    let (nx, ny, nz) = intensities.dim();

    (0..nx)
        .into_par_iter()
        .flat_map_iter(|x| {
            let mut local = Vec::with_capacity(ny * nz * 3);
            for y in 0..ny {
                for z in 0..nz {
                    let center = intensities[(x, y, z)];
                    if x + 1 < nx {
                        local.push((center - intensities[(x + 1, y, z)]).abs());
                    }
                    if y + 1 < ny {
                        local.push((center - intensities[(x, y + 1, z)]).abs());
                    }
                    if z + 1 < nz {
                        local.push((center - intensities[(x, y, z + 1)]).abs());
                    }
                }
            }
            local
        })
        .collect()
}
