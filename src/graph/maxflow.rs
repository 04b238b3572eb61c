//! Minimum s-t cut over a flow network

use crate::error::{Result, SegmentationError};
use crate::graph::network::{FlowNetwork, RESIDUAL_EPSILON};
use std::collections::VecDeque;

/// Partition produced by a minimum cut
#[derive(Debug, Clone)]
pub struct MinCut {
    /// Value of the maximum flow, equal to the capacity of the cut
    pub max_flow: f64,

    /// For every non-terminal node, whether it ends on the source side
    pub source_side: Vec<bool>,
}

impl MinCut {
    pub fn is_source_side(&self, node: usize) -> bool {
        self.source_side[node]
    }

    pub fn source_side_count(&self) -> usize {
        self.source_side.iter().filter(|&&s| s).count()
    }
}

/// A max-flow / min-cut algorithm
pub trait MinCutSolver {
    /// Compute a minimum cut, consuming the residual capacities of `network`
    fn min_cut(&self, network: &mut FlowNetwork) -> Result<MinCut>;
}

/// Dinic's algorithm: blocking flows on BFS level graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct DinicSolver;

impl MinCutSolver for DinicSolver {
    fn min_cut(&self, network: &mut FlowNetwork) -> Result<MinCut> {
        network.validate()?;

        let source = network.source();
        let sink = network.sink();
        let mut level = vec![-1i64; network.node_count];
        let mut current = vec![0usize; network.node_count];
        let mut flow = 0.0;
        let mut phases = 0usize;

        while build_levels(network, source, sink, &mut level) {
            current.copy_from_slice(&network.offsets[..network.node_count]);
            let pushed = blocking_flow(network, source, sink, &level, &mut current);
            flow += pushed;
            phases += 1;
            log::debug!("Phase {}: pushed {:.6} (total {:.6})", phases, pushed, flow);

            if pushed <= 0.0 {
                break;
            }
        }

        if !flow.is_finite() {
            return Err(SegmentationError::Solver(format!("flow diverged to {}", flow)));
        }

        // Source side: nodes still reachable from the source in the residual network
        let reachable = reachable_from(network, source);
        if reachable[sink] {
            return Err(SegmentationError::Solver(
                "sink is still reachable after the flow computation".to_string(),
            ));
        }

        let max_flow = flow + network.preflow;
        log::info!("Max flow {:.6} after {} phases", max_flow, phases);

        let mut source_side = reachable;
        source_side.truncate(network.voxel_count());

        Ok(MinCut {
            max_flow,
            source_side,
        })
    }
}

/// Breadth-first distance labels from the source; true if the sink is reachable
fn build_levels(network: &FlowNetwork, source: usize, sink: usize, level: &mut [i64]) -> bool {
    level.iter_mut().for_each(|l| *l = -1);
    level[source] = 0;

    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        for arc in network.arcs(node) {
            let head = network.heads[arc] as usize;
            if level[head] < 0 && network.capacity[arc] > RESIDUAL_EPSILON {
                level[head] = level[node] + 1;
                queue.push_back(head);
            }
        }
    }

    level[sink] >= 0
}

/// Saturate every shortest augmenting path of the current level graph
///
/// Iterative depth-first search keeping the path as a stack of arcs, so long
/// paths through large volumes cannot overflow the call stack.
fn blocking_flow(
    network: &mut FlowNetwork,
    source: usize,
    sink: usize,
    level: &[i64],
    current: &mut [usize],
) -> f64 {
    let mut total = 0.0;
    let mut path: Vec<usize> = Vec::new();
    let mut node = source;

    loop {
        if node == sink {
            let bottleneck = path
                .iter()
                .map(|&arc| network.capacity[arc])
                .fold(f64::INFINITY, f64::min);

            for &arc in &path {
                network.capacity[arc] -= bottleneck;
                let rev = network.reverse[arc];
                network.capacity[rev] += bottleneck;
            }
            total += bottleneck;

            // Retreat to the tail of the first saturated arc
            let saturated = path
                .iter()
                .position(|&arc| network.capacity[arc] <= RESIDUAL_EPSILON)
                .unwrap_or(0);
            path.truncate(saturated);
            node = match path.last() {
                Some(&arc) => network.heads[arc] as usize,
                None => source,
            };
            continue;
        }

        let end = network.offsets[node + 1];
        let mut advanced = false;
        while current[node] < end {
            let arc = current[node];
            let head = network.heads[arc] as usize;
            if network.capacity[arc] > RESIDUAL_EPSILON && level[head] == level[node] + 1 {
                path.push(arc);
                node = head;
                advanced = true;
                break;
            }
            current[node] += 1;
        }

        if !advanced {
            // Dead end: drop the arc leading here and move on from its tail
            match path.pop() {
                Some(arc) => {
                    node = network.tail(arc);
                    current[node] += 1;
                }
                None => break,
            }
        }
    }

    total
}

/// Nodes reachable from `start` over arcs with residual capacity
fn reachable_from(network: &FlowNetwork, start: usize) -> Vec<bool> {
    let mut visited = vec![false; network.node_count];
    let mut stack = vec![start];
    visited[start] = true;

    while let Some(node) = stack.pop() {
        for arc in network.arcs(node) {
            let head = network.heads[arc] as usize;
            if !visited[head] && network.capacity[arc] > RESIDUAL_EPSILON {
                visited[head] = true;
                stack.push(head);
            }
        }
    }

    visited
}
