//! Mapping the cut back onto a label volume

use crate::error::{Result, SegmentationError};
use crate::graph::MinCut;
use crate::volume::VoxelIndex;
use ndarray::{Array3, Zip};

/// Label of voxels on the source side of the cut
pub const FOREGROUND: u8 = 255;

/// Label of voxels on the sink side of the cut
pub const BACKGROUND: u8 = 0;

/// Binary segmentation result with the shape of the input volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVolume {
    labels: Array3<u8>,
}

impl LabelVolume {
    pub fn dim(&self) -> (usize, usize, usize) {
        self.labels.dim()
    }

    pub fn label(&self, index: VoxelIndex) -> Option<u8> {
        self.labels.get(index.as_pattern()).copied()
    }

    pub fn is_foreground(&self, index: VoxelIndex) -> bool {
        self.label(index) == Some(FOREGROUND)
    }

    pub fn foreground_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == FOREGROUND).count()
    }

    pub fn background_count(&self) -> usize {
        self.labels.len() - self.foreground_count()
    }

    pub fn as_array(&self) -> &Array3<u8> {
        &self.labels
    }

    pub fn into_array(self) -> Array3<u8> {
        self.labels
    }
}

/// Write the partition into a label volume through the node-index volume
///
/// The partition must cover every voxel node and keep the seeds on their side;
/// anything else means the solver produced an inconsistent answer.
pub fn write_labels(
    node_index: &Array3<u32>,
    cut: &MinCut,
    sources: &[VoxelIndex],
    sinks: &[VoxelIndex],
) -> Result<LabelVolume> {
    if cut.source_side.len() != node_index.len() {
        return Err(SegmentationError::Solver(format!(
            "partition covers {} nodes but the volume has {} voxels",
            cut.source_side.len(),
            node_index.len()
        )));
    }

    let mut labels = Array3::from_elem(node_index.dim(), BACKGROUND);
    Zip::from(&mut labels).and(node_index).for_each(|label, &node| {
        if cut.is_source_side(node as usize) {
            *label = FOREGROUND;
        }
    });

    let labels = LabelVolume { labels };

    if let Some(seed) = sources.iter().find(|s| !labels.is_foreground(**s)) {
        return Err(SegmentationError::Solver(format!(
            "source seed {} ended on the sink side",
            seed
        )));
    }
    if let Some(seed) = sinks.iter().find(|s| labels.label(**s) != Some(BACKGROUND)) {
        return Err(SegmentationError::Solver(format!(
            "sink seed {} ended on the source side",
            seed
        )));
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_index(dims: (usize, usize, usize)) -> Array3<u32> {
        let n = dims.0 * dims.1 * dims.2;
        Array3::from_shape_vec(dims, (0..n as u32).collect()).unwrap()
    }

    #[test]
    fn test_labels_follow_partition() {
        let index = node_index((2, 1, 2));
        let cut = MinCut {
            max_flow: 1.0,
            source_side: vec![true, false, false, true],
        };
        let labels = write_labels(&index, &cut, &[VoxelIndex::new(0, 0, 0)], &[VoxelIndex::new(1, 0, 0)]).unwrap();

        assert_eq!(labels.dim(), (2, 1, 2));
        assert_eq!(labels.label(VoxelIndex::new(0, 0, 0)), Some(FOREGROUND));
        assert_eq!(labels.label(VoxelIndex::new(0, 0, 1)), Some(BACKGROUND));
        assert_eq!(labels.label(VoxelIndex::new(1, 0, 1)), Some(FOREGROUND));
        assert_eq!(labels.foreground_count(), 2);
        assert_eq!(labels.background_count(), 2);
    }

    #[test]
    fn test_wrong_partition_length_is_rejected() {
        let index = node_index((2, 2, 2));
        let cut = MinCut {
            max_flow: 0.0,
            source_side: vec![true; 3],
        };
        assert!(matches!(
            write_labels(&index, &cut, &[], &[]),
            Err(SegmentationError::Solver(_))
        ));
    }

    #[test]
    fn test_misplaced_seed_is_rejected() {
        let index = node_index((1, 1, 2));
        let cut = MinCut {
            max_flow: 0.0,
            source_side: vec![false, true],
        };
        let result = write_labels(&index, &cut, &[VoxelIndex::new(0, 0, 0)], &[]);
        assert!(matches!(result, Err(SegmentationError::Solver(_))));
    }
}
