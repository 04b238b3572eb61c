//! Boundary and regional energy terms

use crate::config::BoundaryDirection;
use crate::estimate::IntensityHistogram;

/// Capacity of the directed n-link p -> q
///
/// Cutting p -> q puts p in the foreground and q in the background. With a
/// directional policy the preferred transition keeps the exponential boundary
/// weight while the opposite one costs the full `1 / distance`.
pub fn boundary_weight(
    from: f64,
    to: f64,
    sigma: f64,
    distance: f64,
    direction: BoundaryDirection,
) -> f64 {
    let difference = from - to;
    let similarity = (-(difference * difference) / (2.0 * sigma * sigma)).exp();

    let weight = match direction {
        BoundaryDirection::None => similarity,
        BoundaryDirection::BrightToDark => {
            if from > to {
                similarity
            } else {
                1.0
            }
        }
        BoundaryDirection::DarkToBright => {
            if from < to {
                similarity
            } else {
                1.0
            }
        }
    };

    weight / distance
}

/// Regional term evaluated for every non-seed voxel
#[derive(Debug, Clone)]
pub enum RegionalModel {
    /// Zero regional cost
    Neutral,

    /// Hard assignment by intensity threshold
    Threshold { threshold: f64 },

    /// Negative log-likelihood under the seed histograms
    Histogram {
        foreground: IntensityHistogram,
        background: IntensityHistogram,
    },
}

impl RegionalModel {
    /// Terminal capacities (source -> voxel, voxel -> sink) for one voxel
    ///
    /// `hard` is the capacity no cut through n-links can outweigh.
    pub fn terminal_weights(&self, intensity: f64, lambda: f64, hard: f64) -> (f64, f64) {
        match self {
            RegionalModel::Neutral => (0.0, 0.0),
            RegionalModel::Threshold { threshold } => {
                if intensity > *threshold {
                    (hard, 0.0)
                } else {
                    (0.0, hard)
                }
            }
            RegionalModel::Histogram {
                foreground,
                background,
            } => {
                // Linking to the source costs what labelling the voxel background would
                let to_source = -lambda * background.log_probability(intensity);
                let to_sink = -lambda * foreground.log_probability(intensity);
                (to_source, to_sink)
            }
        }
    }
}
