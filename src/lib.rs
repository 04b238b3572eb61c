//! Interactive binary segmentation of 3D scalar volumes by minimum s-t cuts

pub mod config;
pub mod error;
pub mod estimate;
pub mod graph;
pub mod report;
pub mod segment;
pub mod volume;

pub use config::{BoundaryDirection, Connectivity, NoiseStatistic, RegionTerm, SegmentationConfig, SigmaPolicy};
pub use error::{Result, SegmentationError};
pub use segment::{segment, GraphCut3D, LabelVolume, Segmentation, BACKGROUND, FOREGROUND};
pub use volume::{Intensity, VoxelIndex};
