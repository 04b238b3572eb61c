//! Flow network representation and min-cut solver module

pub mod network;
pub mod builder;
pub mod maxflow;

pub use network::FlowNetwork;
pub use builder::NetworkBuilder;
pub use maxflow::{DinicSolver, MinCut, MinCutSolver};
