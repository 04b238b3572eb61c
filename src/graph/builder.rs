//! Flow network construction

use crate::error::{Result, SegmentationError};
use crate::graph::FlowNetwork;

/// Builder collecting n-links and terminal weights before compressing them
/// into a `FlowNetwork`
pub struct NetworkBuilder {
    /// Number of voxel nodes
    voxel_count: usize,

    /// Neighbor edges as (from, to, capacity from->to, capacity to->from)
    edges: Vec<(u32, u32, f64, f64)>,

    /// Accumulated source -> node capacities
    source_weights: Vec<f64>,

    /// Accumulated node -> sink capacities
    sink_weights: Vec<f64>,
}

impl NetworkBuilder {
    /// Create a builder for `voxel_count` nodes with room for `edge_capacity` edge pairs
    pub fn with_capacity(voxel_count: usize, edge_capacity: usize) -> Result<Self> {
        if voxel_count == 0 {
            return Err(SegmentationError::GraphConstruction(
                "cannot build a graph without voxels".to_string(),
            ));
        }
        if voxel_count > u32::MAX as usize - 2 {
            return Err(SegmentationError::GraphConstruction(format!(
                "{} voxels exceed the node id range",
                voxel_count
            )));
        }

        Ok(Self {
            voxel_count,
            edges: Vec::with_capacity(edge_capacity),
            source_weights: vec![0.0; voxel_count],
            sink_weights: vec![0.0; voxel_count],
        })
    }

    pub fn voxel_count(&self) -> usize {
        self.voxel_count
    }

    /// Add a pair of directed arcs between two voxel nodes
    pub fn add_edge(&mut self, from: u32, to: u32, capacity: f64, reverse_capacity: f64) {
        self.edges.push((from, to, capacity, reverse_capacity));
    }

    /// Add terminal weights to a voxel node; repeated calls accumulate
    pub fn add_terminal_weights(&mut self, node: u32, to_source: f64, to_sink: f64) {
        self.source_weights[node as usize] += to_source;
        self.sink_weights[node as usize] += to_sink;
    }

    /// Build the compressed residual network
    pub fn build(self) -> Result<FlowNetwork> {
        let voxel_count = self.voxel_count;
        let node_count = voxel_count + 2;
        let source = voxel_count;
        let sink = voxel_count + 1;

        for &(from, to, capacity, reverse_capacity) in &self.edges {
            if from as usize >= voxel_count || to as usize >= voxel_count || from == to {
                return Err(SegmentationError::GraphConstruction(format!(
                    "invalid edge {} -> {}",
                    from, to
                )));
            }
            if capacity.is_nan() || reverse_capacity.is_nan() {
                return Err(SegmentationError::GraphConstruction(format!(
                    "edge {} -> {} has an undefined capacity",
                    from, to
                )));
            }
        }

        // Both terminal weights of a node can be lowered by their minimum
        // without changing the minimum cut; that amount is flow already pushed
        let mut preflow = 0.0;
        let mut terminal_links: Vec<(usize, f64, f64)> = Vec::new();
        for node in 0..voxel_count {
            let to_source = self.source_weights[node];
            let to_sink = self.sink_weights[node];
            if to_source.is_nan() || to_sink.is_nan() {
                return Err(SegmentationError::GraphConstruction(format!(
                    "node {} has an undefined terminal weight",
                    node
                )));
            }

            let shared = to_source.min(to_sink).max(0.0);
            preflow += shared;
            let to_source = to_source - shared;
            let to_sink = to_sink - shared;
            if to_source != 0.0 || to_sink != 0.0 {
                terminal_links.push((node, to_source, to_sink));
            }
        }

        // Count arcs per node: every edge pair and terminal link puts one arc on each endpoint
        let mut degrees = vec![0usize; node_count];
        for &(from, to, _, _) in &self.edges {
            degrees[from as usize] += 1;
            degrees[to as usize] += 1;
        }
        for &(node, to_source, to_sink) in &terminal_links {
            if to_source != 0.0 {
                degrees[node] += 1;
                degrees[source] += 1;
            }
            if to_sink != 0.0 {
                degrees[node] += 1;
                degrees[sink] += 1;
            }
        }

        // Create offsets array
        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        let mut offset = 0;
        for &degree in &degrees {
            offset += degree;
            offsets.push(offset);
        }

        let arc_count = offset;
        log::debug!(
            "Compressing network with {} nodes, {} edge pairs and {} terminal links into {} arcs",
            node_count,
            self.edges.len(),
            terminal_links.len(),
            arc_count
        );

        let mut heads = vec![0u32; arc_count];
        let mut reverse = vec![0usize; arc_count];
        let mut capacity = vec![0.0f64; arc_count];

        // Current insertion positions
        let mut cursor: Vec<usize> = offsets[..node_count].to_vec();

        let mut insert_pair = |u: usize, v: usize, cap_uv: f64, cap_vu: f64| {
            let a = cursor[u];
            let b = cursor[v];
            cursor[u] += 1;
            cursor[v] += 1;

            heads[a] = v as u32;
            capacity[a] = cap_uv;
            reverse[a] = b;

            heads[b] = u as u32;
            capacity[b] = cap_vu;
            reverse[b] = a;
        };

        for &(from, to, cap, reverse_cap) in &self.edges {
            insert_pair(from as usize, to as usize, cap, reverse_cap);
        }
        for &(node, to_source, to_sink) in &terminal_links {
            if to_source != 0.0 {
                insert_pair(source, node, to_source, 0.0);
            }
            if to_sink != 0.0 {
                insert_pair(node, sink, to_sink, 0.0);
            }
        }

        Ok(FlowNetwork {
            node_count,
            offsets,
            heads,
            reverse,
            capacity,
            preflow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_pairs_reverse_arcs() {
        let mut builder = NetworkBuilder::with_capacity(3, 2).unwrap();
        builder.add_edge(0, 1, 2.0, 3.0);
        builder.add_edge(1, 2, 4.0, 4.0);
        builder.add_terminal_weights(0, 5.0, 0.0);
        builder.add_terminal_weights(2, 0.0, 6.0);
        let network = builder.build().unwrap();

        assert_eq!(network.node_count, 5);
        assert_eq!(network.source(), 3);
        assert_eq!(network.sink(), 4);
        // 2 edge pairs + 2 terminal links, two arcs each
        assert_eq!(network.arc_count(), 8);

        for arc in 0..network.arc_count() {
            let rev = network.reverse[arc];
            assert_eq!(network.reverse[rev], arc);
            assert_eq!(network.tail(arc), network.heads[rev] as usize);
        }

        assert_eq!(network.residual(0, 1), 2.0);
        assert_eq!(network.residual(1, 0), 3.0);
        assert_eq!(network.residual(3, 0), 5.0);
        assert_eq!(network.residual(0, 3), 0.0);
        assert_eq!(network.residual(2, 4), 6.0);
        assert!(network.validate().is_ok());
    }

    #[test]
    fn test_shared_terminal_weight_becomes_preflow() {
        let mut builder = NetworkBuilder::with_capacity(2, 1).unwrap();
        builder.add_edge(0, 1, 1.0, 1.0);
        builder.add_terminal_weights(0, 5.0, 2.0);
        builder.add_terminal_weights(1, 1.0, 1.0);
        let network = builder.build().unwrap();

        assert_eq!(network.preflow, 3.0);
        assert_eq!(network.residual(2, 0), 3.0);
        assert_eq!(network.residual(0, 3), 0.0);
        // Node 1 is fully balanced and gets no terminal arcs
        assert_eq!(network.residual(2, 1), 0.0);
        assert_eq!(network.residual(1, 3), 0.0);
    }

    #[test]
    fn test_rejects_empty_and_invalid_edges() {
        assert!(matches!(
            NetworkBuilder::with_capacity(0, 0),
            Err(SegmentationError::GraphConstruction(_))
        ));

        let mut builder = NetworkBuilder::with_capacity(2, 1).unwrap();
        builder.add_edge(0, 5, 1.0, 1.0);
        assert!(matches!(builder.build(), Err(SegmentationError::GraphConstruction(_))));

        let mut builder = NetworkBuilder::with_capacity(2, 1).unwrap();
        builder.add_edge(0, 1, f64::NAN, 1.0);
        assert!(matches!(builder.build(), Err(SegmentationError::GraphConstruction(_))));
    }
}
