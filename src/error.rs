//! Error types for segmentation requests

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, SegmentationError>;

/// Failures surfaced by a segmentation request
///
/// Every variant is raised before or while the graph is built (or by the
/// solver itself); no label volume is produced when one is returned.
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Insufficient seed data: {0}")]
    InsufficientSeeds(String),

    #[error("Graph construction error: {0}")]
    GraphConstruction(String),

    #[error("Min-cut solver error: {0}")]
    Solver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
