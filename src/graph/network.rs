//! Compressed residual flow network

use crate::error::{Result, SegmentationError};
use std::mem;

/// Residual capacities at or below this value count as saturated
pub const RESIDUAL_EPSILON: f64 = 1e-12;

/// Compressed sparse representation of a directed flow network with two terminals
///
/// Every arc is stored next to its reverse arc index so residual capacity can
/// be pushed back along it. Nodes `0..voxel_count` are voxels, followed by
/// the source and the sink terminal.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    /// Number of nodes including the two terminals
    pub node_count: usize,

    /// Offset array: offsets[i] to offsets[i+1] is the arc range of node i
    pub offsets: Vec<usize>,

    /// Arc array: head node of each arc
    pub heads: Vec<u32>,

    /// Index of the paired arc running in the opposite direction
    pub reverse: Vec<usize>,

    /// Residual capacity of each arc
    pub capacity: Vec<f64>,

    /// Flow already routed through terminal links during construction
    pub preflow: f64,
}

impl FlowNetwork {
    /// Number of non-terminal nodes
    pub fn voxel_count(&self) -> usize {
        self.node_count - 2
    }

    /// Source terminal id
    pub fn source(&self) -> usize {
        self.node_count - 2
    }

    /// Sink terminal id
    pub fn sink(&self) -> usize {
        self.node_count - 1
    }

    /// Total number of stored arcs (reverse arcs included)
    pub fn arc_count(&self) -> usize {
        self.heads.len()
    }

    /// Arc index range of a node
    #[inline]
    pub fn arcs(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node]..self.offsets[node + 1]
    }

    /// Tail node of an arc (the head of its reverse)
    #[inline]
    pub fn tail(&self, arc: usize) -> usize {
        self.heads[self.reverse[arc]] as usize
    }

    /// Residual capacity from `from` to `to`, summed over parallel arcs
    pub fn residual(&self, from: usize, to: usize) -> f64 {
        self.arcs(from)
            .filter(|&arc| self.heads[arc] as usize == to)
            .map(|arc| self.capacity[arc])
            .sum()
    }

    /// Check the structural and numeric invariants the solver relies on
    pub fn validate(&self) -> Result<()> {
        if self.node_count < 2 || self.offsets.len() != self.node_count + 1 {
            return Err(SegmentationError::Solver(format!(
                "malformed network: {} nodes with {} offsets",
                self.node_count,
                self.offsets.len()
            )));
        }

        let arcs = self.heads.len();
        if self.reverse.len() != arcs || self.capacity.len() != arcs || self.offsets[self.node_count] != arcs {
            return Err(SegmentationError::Solver(
                "malformed network: arc arrays differ in length".to_string(),
            ));
        }

        if let Some(arc) = self.capacity.iter().position(|c| c.is_nan() || *c < 0.0) {
            return Err(SegmentationError::Solver(format!(
                "arc {} -> {} has invalid capacity {}",
                self.tail(arc),
                self.heads[arc],
                self.capacity[arc]
            )));
        }

        if self.arcs(self.source()).is_empty() {
            return Err(SegmentationError::Solver(
                "source terminal is not connected to any node".to_string(),
            ));
        }
        if self.arcs(self.sink()).is_empty() {
            return Err(SegmentationError::Solver(
                "sink terminal is not connected to any node".to_string(),
            ));
        }

        Ok(())
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        let base = mem::size_of::<Self>();
        let offsets = self.offsets.capacity() * mem::size_of::<usize>();
        let heads = self.heads.capacity() * mem::size_of::<u32>();
        let reverse = self.reverse.capacity() * mem::size_of::<usize>();
        let capacity = self.capacity.capacity() * mem::size_of::<f64>();

        base + offsets + heads + reverse + capacity
    }
}
