//! Graph-cut segmentation of scalar volumes

pub mod energy;
pub mod labels;
pub mod neighborhood;
pub mod pipeline;
pub mod segmenter;

pub use labels::{LabelVolume, BACKGROUND, FOREGROUND};
pub use pipeline::{segment, segment_with_solver, CutStatistics, Segmentation};
pub use segmenter::GraphCut3D;
