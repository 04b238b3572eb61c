//! Stateful segmentation driver

use crate::config::{BoundaryDirection, Connectivity, RegionTerm, SegmentationConfig, SigmaPolicy};
use crate::error::{Result, SegmentationError};
use crate::segment::labels::LabelVolume;
use crate::segment::pipeline::{segment, CutStatistics};
use crate::volume::{Intensity, VoxelIndex};
use ndarray::Array3;

/// Holds the image, the user's seeds, the parameters and the last result
///
/// Every call to `perform_segmentation` builds and cuts a fresh graph; no
/// flow is reused between calls.
#[derive(Debug, Clone)]
pub struct GraphCut3D<T: Intensity> {
    image: Option<Array3<T>>,
    sources: Vec<VoxelIndex>,
    sinks: Vec<VoxelIndex>,
    config: SegmentationConfig,
    mask: Option<LabelVolume>,
    statistics: Option<CutStatistics>,
}

impl<T: Intensity> Default for GraphCut3D<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Intensity> GraphCut3D<T> {
    pub fn new() -> Self {
        Self::with_config(SegmentationConfig::default())
    }

    pub fn with_config(config: SegmentationConfig) -> Self {
        Self {
            image: None,
            sources: Vec::new(),
            sinks: Vec::new(),
            config,
            mask: None,
            statistics: None,
        }
    }

    /// Set the image to segment; drops any previous result
    pub fn set_image(&mut self, image: Array3<T>) {
        self.image = Some(image);
        self.clear_result();
    }

    pub fn image(&self) -> Option<&Array3<T>> {
        self.image.as_ref()
    }

    pub fn set_sources(&mut self, sources: Vec<VoxelIndex>) {
        self.sources = sources;
    }

    /// Foreground seeds
    pub fn sources(&self) -> &[VoxelIndex] {
        &self.sources
    }

    pub fn set_sinks(&mut self, sinks: Vec<VoxelIndex>) {
        self.sinks = sinks;
    }

    /// Background seeds
    pub fn sinks(&self) -> &[VoxelIndex] {
        &self.sinks
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SegmentationConfig) {
        self.config = config;
    }

    /// Weight of the regional term relative to the boundary term
    pub fn set_lambda(&mut self, lambda: f64) {
        self.config.lambda = lambda;
    }

    pub fn set_sigma(&mut self, sigma: SigmaPolicy) {
        self.config.sigma = sigma;
    }

    pub fn set_number_of_histogram_bins(&mut self, bins: usize) {
        self.config.histogram_bins = bins;
    }

    pub fn set_region_term(&mut self, region_term: RegionTerm) {
        self.config.region_term = region_term;
    }

    pub fn set_boundary_direction(&mut self, direction: BoundaryDirection) {
        self.config.boundary_direction = direction;
    }

    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        self.config.connectivity = connectivity;
    }

    pub fn set_spacing(&mut self, spacing: [f64; 3]) {
        self.config.spacing = spacing;
    }

    /// Build and cut the graph for the current image, seeds and parameters
    ///
    /// On failure the previous mask is discarded as well, so `segment_mask`
    /// never returns a result that does not match the current state.
    pub fn perform_segmentation(&mut self) -> Result<&LabelVolume> {
        self.clear_result();

        let image = self.image.as_ref().ok_or_else(|| {
            SegmentationError::Configuration("no image set before segmentation".to_string())
        })?;

        let segmentation = segment(image.view(), &self.sources, &self.sinks, &self.config)?;
        self.statistics = Some(segmentation.statistics);
        Ok(self.mask.insert(segmentation.labels))
    }

    /// Output of the last successful segmentation
    pub fn segment_mask(&self) -> Option<&LabelVolume> {
        self.mask.as_ref()
    }

    pub fn statistics(&self) -> Option<&CutStatistics> {
        self.statistics.as_ref()
    }

    fn clear_result(&mut self) {
        self.mask = None;
        self.statistics = None;
    }
}
