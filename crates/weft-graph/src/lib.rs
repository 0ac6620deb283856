//! Weft Graph
//!
//! This crate provides the in-memory task-graph model for weft pipelines.
//! A graph is made of three node kinds connected by directed edges:
//!
//! - dataset nodes reference data that already exists,
//! - action nodes describe a parameterized transform,
//! - output nodes name the destination of a transform and are materialized
//!   once a run succeeds.
//!
//! Action nodes carry derived context (their upstream sources and their
//! destination). That context is owned by [`project`], which rebuilds it from
//! the current edges every time it runs.

mod edge;
mod error;
mod graph;
mod node;
mod projector;
mod topology;

pub use edge::Edge;
pub use error::GraphError;
pub use graph::Graph;
pub use node::{
  ActionNode, ActionType, DatasetNode, DestinationRef, Node, NodeKind, OutputNode, SourceRef,
  node_id,
};
pub use projector::project;
pub use topology::Topology;
