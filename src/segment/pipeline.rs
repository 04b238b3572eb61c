//! Graph construction and the segmentation driver

use crate::config::{RegionTerm, SegmentationConfig};
use crate::error::{Result, SegmentationError};
use crate::estimate::{resolve_sigma, IntensityHistogram};
use crate::graph::{DinicSolver, FlowNetwork, MinCutSolver, NetworkBuilder};
use crate::segment::energy::{boundary_weight, RegionalModel};
use crate::segment::labels::{write_labels, LabelVolume};
use crate::segment::neighborhood::{forward_offsets, neighbor, offset_distance};
use crate::volume::{intensity_range, to_intensities, Intensity, VoxelIndex};
use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// A directed pair of arcs between two neighboring voxels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NLink {
    pub from: u32,
    pub to: u32,
    /// Capacity from -> to
    pub forward: f64,
    /// Capacity to -> from
    pub backward: f64,
}

/// Numbers describing one finished cut
#[derive(Debug, Clone, Serialize)]
pub struct CutStatistics {
    /// Sigma the boundary term was evaluated with
    pub sigma: f64,

    /// Capacity of the minimum cut
    pub max_flow: f64,

    /// Capacity of seed and threshold links
    pub hard_capacity: f64,

    /// Graph nodes, terminals included
    pub node_count: usize,

    /// Stored arcs, reverse arcs included
    pub arc_count: usize,
}

/// Result of a segmentation request
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub labels: LabelVolume,
    pub statistics: CutStatistics,
}

/// The network together with what is needed to read its cut back
pub struct VolumeGraph {
    /// Voxel -> node id, in raster order
    pub node_index: Array3<u32>,

    pub network: FlowNetwork,

    pub sigma: f64,

    pub hard_capacity: f64,
}

/// Segment `volume` with the default solver
pub fn segment<T: Intensity>(
    volume: ArrayView3<'_, T>,
    sources: &[VoxelIndex],
    sinks: &[VoxelIndex],
    config: &SegmentationConfig,
) -> Result<Segmentation> {
    segment_with_solver(volume, sources, sinks, config, &DinicSolver)
}

/// Segment `volume` with a caller-provided min-cut solver
pub fn segment_with_solver<T: Intensity, S: MinCutSolver + ?Sized>(
    volume: ArrayView3<'_, T>,
    sources: &[VoxelIndex],
    sinks: &[VoxelIndex],
    config: &SegmentationConfig,
    solver: &S,
) -> Result<Segmentation> {
    log::info!(
        "Segmenting {:?} volume with {} sources and {} sinks",
        volume.dim(),
        sources.len(),
        sinks.len()
    );

    let VolumeGraph {
        node_index,
        mut network,
        sigma,
        hard_capacity,
    } = build_graph(volume, sources, sinks, config)?;

    let node_count = network.node_count;
    let arc_count = network.arc_count();
    log::debug!("Network memory usage: {} bytes", network.memory_usage());

    let cut = solver.min_cut(&mut network)?;
    drop(network);

    let labels = write_labels(&node_index, &cut, sources, sinks)?;
    log::info!(
        "Segmentation complete: {} foreground and {} background voxels",
        labels.foreground_count(),
        labels.background_count()
    );

    Ok(Segmentation {
        labels,
        statistics: CutStatistics {
            sigma,
            max_flow: cut.max_flow,
            hard_capacity,
            node_count,
            arc_count,
        },
    })
}

/// Check the seed sets against the volume shape
pub fn validate_seeds(
    sources: &[VoxelIndex],
    sinks: &[VoxelIndex],
    dims: (usize, usize, usize),
) -> Result<()> {
    if sources.is_empty() {
        return Err(SegmentationError::InsufficientSeeds(
            "no source (foreground) seeds".to_string(),
        ));
    }
    if sinks.is_empty() {
        return Err(SegmentationError::InsufficientSeeds(
            "no sink (background) seeds".to_string(),
        ));
    }

    if let Some(seed) = sources.iter().chain(sinks).find(|s| !s.is_within(dims)) {
        return Err(SegmentationError::InsufficientSeeds(format!(
            "seed {} is outside the volume of shape {:?}",
            seed, dims
        )));
    }

    let source_set: HashSet<&VoxelIndex> = sources.iter().collect();
    if let Some(seed) = sinks.iter().find(|s| source_set.contains(s)) {
        return Err(SegmentationError::GraphConstruction(format!(
            "voxel {} is marked both as source and as sink",
            seed
        )));
    }

    Ok(())
}

/// Build the flow network for one request
pub fn build_graph<T: Intensity>(
    volume: ArrayView3<'_, T>,
    sources: &[VoxelIndex],
    sinks: &[VoxelIndex],
    config: &SegmentationConfig,
) -> Result<VolumeGraph> {
    config.validate()?;

    let dims = volume.dim();
    let voxel_count = dims.0 * dims.1 * dims.2;
    if voxel_count == 0 {
        return Err(SegmentationError::GraphConstruction(format!(
            "volume of shape {:?} has no voxels",
            dims
        )));
    }
    validate_seeds(sources, sinks, dims)?;

    let intensities = to_intensities(volume);
    let sigma = resolve_sigma(&intensities, config.sigma)?;
    let regional = regional_model(&intensities, sources, sinks, config)?;

    let mut builder = NetworkBuilder::with_capacity(voxel_count, 0)?;

    // Node allocation in raster order
    let node_index = Array3::from_shape_fn(dims, |(x, y, z)| VoxelIndex::new(x, y, z).linear(dims) as u32);

    let links = compute_nlinks(&intensities, &node_index, sigma, config);
    log::info!("Computed {} n-links with sigma {:.4}", links.len(), sigma);

    // Seeds must outweigh everything that could be saved by relabelling them
    let mut incident = vec![0.0f64; voxel_count];
    for link in &links {
        let weight = link.forward + link.backward;
        incident[link.from as usize] += weight;
        incident[link.to as usize] += weight;
    }
    let hard_capacity = 1.0 + incident.iter().copied().fold(0.0, f64::max);
    drop(incident);

    for link in &links {
        builder.add_edge(link.from, link.to, link.forward, link.backward);
    }
    drop(links);

    // 0 = free voxel, 1 = source seed, 2 = sink seed
    let mut seed_marks = vec![0u8; voxel_count];
    for seed in sources {
        seed_marks[node_index[seed.as_pattern()] as usize] = 1;
    }
    for seed in sinks {
        seed_marks[node_index[seed.as_pattern()] as usize] = 2;
    }

    for (position, &intensity) in intensities.indexed_iter() {
        let node = node_index[position];
        let (to_source, to_sink) = match seed_marks[node as usize] {
            1 => (hard_capacity, 0.0),
            2 => (0.0, hard_capacity),
            _ => regional.terminal_weights(intensity, config.lambda, hard_capacity),
        };
        if to_source != 0.0 || to_sink != 0.0 {
            builder.add_terminal_weights(node, to_source, to_sink);
        }
    }

    let network = builder.build()?;
    log::info!(
        "Built graph with {} nodes and {} arcs (hard capacity {:.4})",
        network.node_count,
        network.arc_count(),
        hard_capacity
    );

    Ok(VolumeGraph {
        node_index,
        network,
        sigma,
        hard_capacity,
    })
}

/// Pick the regional term for non-seed voxels
fn regional_model(
    intensities: &Array3<f64>,
    sources: &[VoxelIndex],
    sinks: &[VoxelIndex],
    config: &SegmentationConfig,
) -> Result<RegionalModel> {
    match config.region_term {
        RegionTerm::None => Ok(RegionalModel::Neutral),
        RegionTerm::Threshold { threshold } => Ok(RegionalModel::Threshold { threshold }),
        RegionTerm::Histogram => {
            let range = intensity_range(intensities).ok_or_else(|| {
                SegmentationError::GraphConstruction("volume has no voxels".to_string())
            })?;
            let foreground =
                IntensityHistogram::from_seeds(intensities, sources, range, config.histogram_bins)?;
            let background =
                IntensityHistogram::from_seeds(intensities, sinks, range, config.histogram_bins)?;
            log::debug!(
                "Histograms over [{}, {}]: foreground {:?}, background {:?}",
                range.0,
                range.1,
                foreground.counts(),
                background.counts()
            );
            Ok(RegionalModel::Histogram {
                foreground,
                background,
            })
        }
    }
}

/// Boundary-term arc pairs for every voxel and each forward neighbor
///
/// Slabs along x are processed in parallel; the result keeps raster order.
pub fn compute_nlinks(
    intensities: &Array3<f64>,
    node_index: &Array3<u32>,
    sigma: f64,
    config: &SegmentationConfig,
) -> Vec<NLink> {
    let dims = intensities.dim();
    let offsets = forward_offsets(config.connectivity);
    let distances: Vec<f64> = offsets
        .iter()
        .map(|offset| offset_distance(offset, &config.spacing))
        .collect();
    let direction = config.boundary_direction;

    (0..dims.0)
        .into_par_iter()
        .flat_map_iter(|x| {
            let mut local = Vec::with_capacity(dims.1 * dims.2 * offsets.len());
            for y in 0..dims.1 {
                for z in 0..dims.2 {
                    let p = (x, y, z);
                    let ip = intensities[p];
                    for (offset, &distance) in offsets.iter().zip(&distances) {
                        if let Some(q) = neighbor(p, offset, dims) {
                            let iq = intensities[q];
                            local.push(NLink {
                                from: node_index[p],
                                to: node_index[q],
                                forward: boundary_weight(ip, iq, sigma, distance, direction),
                                backward: boundary_weight(iq, ip, sigma, distance, direction),
                            });
                        }
                    }
                }
            }
            local
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryDirection, Connectivity, SigmaPolicy};

    fn config_with(direction: BoundaryDirection) -> SegmentationConfig {
        SegmentationConfig {
            sigma: SigmaPolicy::Fixed(10.0),
            boundary_direction: direction,
            ..SegmentationConfig::default()
        }
    }

    #[test]
    fn test_nlink_counts_per_connectivity() {
        let intensities = Array3::from_elem((3, 3, 3), 1.0);
        let node_index = Array3::from_shape_fn((3, 3, 3), |(x, y, z)| VoxelIndex::new(x, y, z).linear((3, 3, 3)) as u32);

        let mut config = config_with(BoundaryDirection::None);
        assert_eq!(compute_nlinks(&intensities, &node_index, 1.0, &config).len(), 54);

        config.connectivity = Connectivity::Eighteen;
        // 54 face pairs + 3 planes * 3 layers * 2 diagonals * 4 squares = 126
        assert_eq!(compute_nlinks(&intensities, &node_index, 1.0, &config).len(), 126);

        config.connectivity = Connectivity::TwentySix;
        // plus 4 space diagonals in each of the 8 unit cubes
        assert_eq!(compute_nlinks(&intensities, &node_index, 1.0, &config).len(), 158);
    }

    #[test]
    fn test_nlinks_are_symmetric_without_direction() {
        let intensities = Array3::from_shape_fn((4, 3, 2), |(x, y, z)| (x * 30 + y * 7 + z) as f64);
        let node_index = Array3::from_shape_fn((4, 3, 2), |(x, y, z)| VoxelIndex::new(x, y, z).linear((4, 3, 2)) as u32);
        let links = compute_nlinks(&intensities, &node_index, 10.0, &config_with(BoundaryDirection::None));

        assert!(!links.is_empty());
        for link in &links {
            assert_eq!(link.forward, link.backward);
        }
    }

    #[test]
    fn test_nlinks_asymmetric_bright_to_dark() {
        let intensities = Array3::from_shape_fn((2, 1, 1), |(x, _, _)| if x == 0 { 200.0 } else { 20.0 });
        let node_index = Array3::from_shape_vec((2, 1, 1), vec![0u32, 1]).unwrap();
        let links = compute_nlinks(&intensities, &node_index, 10.0, &config_with(BoundaryDirection::BrightToDark));

        assert_eq!(links.len(), 1);
        let link = links[0];
        assert_eq!((link.from, link.to), (0, 1));
        assert_ne!(link.forward, link.backward);
        assert!(link.forward < link.backward);
    }

    #[test]
    fn test_seed_links_are_hard() {
        let volume = Array3::from_shape_fn((3, 1, 1), |(x, _, _)| x as u8 * 10);
        let sources = vec![VoxelIndex::new(0, 0, 0)];
        let sinks = vec![VoxelIndex::new(2, 0, 0)];
        let mut config = config_with(BoundaryDirection::None);
        config.region_term = RegionTerm::None;

        let graph = build_graph(volume.view(), &sources, &sinks, &config).unwrap();
        let network = &graph.network;

        // Each voxel touches at most two unit-bounded n-link pairs
        assert!(graph.hard_capacity > 1.0 && graph.hard_capacity <= 5.0);
        assert_eq!(network.residual(network.source(), 0), graph.hard_capacity);
        assert_eq!(network.residual(2, network.sink()), graph.hard_capacity);
        assert_eq!(network.residual(network.source(), 1), 0.0);
        assert_eq!(network.residual(1, network.sink()), 0.0);
    }

    #[test]
    fn test_seed_validation() {
        let dims = (2, 2, 2);
        let a = VoxelIndex::new(0, 0, 0);
        let b = VoxelIndex::new(1, 1, 1);

        assert!(validate_seeds(&[a], &[b], dims).is_ok());
        assert!(matches!(
            validate_seeds(&[], &[b], dims),
            Err(SegmentationError::InsufficientSeeds(_))
        ));
        assert!(matches!(
            validate_seeds(&[a], &[], dims),
            Err(SegmentationError::InsufficientSeeds(_))
        ));
        assert!(matches!(
            validate_seeds(&[a], &[VoxelIndex::new(2, 0, 0)], dims),
            Err(SegmentationError::InsufficientSeeds(_))
        ));
        assert!(matches!(
            validate_seeds(&[a, b], &[b], dims),
            Err(SegmentationError::GraphConstruction(_))
        ));
    }

    #[test]
    fn test_empty_volume_is_rejected() {
        let volume = Array3::<f32>::zeros((0, 4, 4));
        let result = build_graph(
            volume.view(),
            &[VoxelIndex::new(0, 0, 0)],
            &[VoxelIndex::new(0, 1, 0)],
            &SegmentationConfig::default(),
        );
        assert!(matches!(result, Err(SegmentationError::GraphConstruction(_))));
    }
}
