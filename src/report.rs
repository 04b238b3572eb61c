//! Segmentation summaries and their persistence

use crate::error::Result;
use crate::segment::{LabelVolume, Segmentation, FOREGROUND};
use petgraph::unionfind::UnionFind;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Summary of one segmentation run
#[derive(Debug, Clone, Serialize)]
pub struct SegmentationSummary {
    pub dimensions: [usize; 3],
    pub voxel_count: usize,
    pub foreground_voxels: usize,
    pub background_voxels: usize,
    pub foreground_fraction: f64,

    /// Face-connected foreground components
    pub foreground_components: usize,

    pub sigma: f64,
    pub max_flow: f64,
    pub hard_capacity: f64,
    pub node_count: usize,
    pub arc_count: usize,
}

impl SegmentationSummary {
    pub fn from_segmentation(segmentation: &Segmentation) -> Self {
        let labels = &segmentation.labels;
        let (nx, ny, nz) = labels.dim();
        let voxel_count = nx * ny * nz;
        let foreground_voxels = labels.foreground_count();
        let stats = &segmentation.statistics;

        Self {
            dimensions: [nx, ny, nz],
            voxel_count,
            foreground_voxels,
            background_voxels: voxel_count - foreground_voxels,
            foreground_fraction: if voxel_count == 0 {
                0.0
            } else {
                foreground_voxels as f64 / voxel_count as f64
            },
            foreground_components: count_foreground_components(labels),
            sigma: stats.sigma,
            max_flow: stats.max_flow,
            hard_capacity: stats.hard_capacity,
            node_count: stats.node_count,
            arc_count: stats.arc_count,
        }
    }
}

/// Number of 6-connected foreground components
pub fn count_foreground_components(labels: &LabelVolume) -> usize {
    let mask = labels.as_array();
    let (nx, ny, nz) = mask.dim();
    let linear = |x: usize, y: usize, z: usize| (x * ny + y) * nz + z;

    let mut sets = UnionFind::<usize>::new(nx * ny * nz);
    for ((x, y, z), &label) in mask.indexed_iter() {
        if label != FOREGROUND {
            continue;
        }
        if x + 1 < nx && mask[(x + 1, y, z)] == FOREGROUND {
            sets.union(linear(x, y, z), linear(x + 1, y, z));
        }
        if y + 1 < ny && mask[(x, y + 1, z)] == FOREGROUND {
            sets.union(linear(x, y, z), linear(x, y + 1, z));
        }
        if z + 1 < nz && mask[(x, y, z + 1)] == FOREGROUND {
            sets.union(linear(x, y, z), linear(x, y, z + 1));
        }
    }

    let roots: HashSet<usize> = mask
        .indexed_iter()
        .filter(|(_, &label)| label == FOREGROUND)
        .map(|((x, y, z), _)| sets.find(linear(x, y, z)))
        .collect();

    roots.len()
}

/// Save the summary as `summary.json` in the specified directory
pub fn save_summary(summary: &SegmentationSummary, output_dir: &Path) -> Result<()> {
    log::info!("Saving segmentation summary to {}", output_dir.display());

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    let path = output_dir.join("summary.json");
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(summary)?.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RegionTerm, SegmentationConfig, SigmaPolicy};
    use crate::segment::segment;
    use crate::volume::VoxelIndex;
    use ndarray::Array3;

    fn two_blobs() -> Segmentation {
        // Two bright cubes separated by a dark gap along x
        let volume = Array3::from_shape_fn((7, 2, 2), |(x, _, _)| if x == 3 { 0u8 } else { 200 });
        let config = SegmentationConfig {
            sigma: SigmaPolicy::Fixed(10.0),
            region_term: RegionTerm::Threshold { threshold: 100.0 },
            ..SegmentationConfig::default()
        };
        segment(
            volume.view(),
            &[VoxelIndex::new(0, 0, 0)],
            &[VoxelIndex::new(3, 0, 0)],
            &config,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let segmentation = two_blobs();
        let summary = SegmentationSummary::from_segmentation(&segmentation);

        assert_eq!(summary.dimensions, [7, 2, 2]);
        assert_eq!(summary.voxel_count, 28);
        assert_eq!(summary.foreground_voxels, 24);
        assert_eq!(summary.background_voxels, 4);
        assert_eq!(summary.foreground_components, 2);
        assert_eq!(summary.node_count, 30);
    }

    #[test]
    fn test_save_summary_writes_json() {
        let summary = SegmentationSummary::from_segmentation(&two_blobs());
        let dir = std::env::temp_dir().join(format!("volume-graphcut-report-{}", std::process::id()));

        save_summary(&summary, &dir).unwrap();
        let text = fs::read_to_string(dir.join("summary.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["foreground_voxels"], 24);
        assert_eq!(value["foreground_components"], 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
