//! Intensity statistics estimated once per segmentation request

pub mod histogram;
pub mod noise;

pub use histogram::IntensityHistogram;
pub use noise::{estimate_sigma, resolve_sigma, MIN_SIGMA};
