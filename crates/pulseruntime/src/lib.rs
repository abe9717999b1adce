//! Graph runtime
//!
//! This crate provides the node registry, the graph that owns nodes and links,
//! pulse execution, the generic reflected node and the blueprint codec.

mod config;
mod executor;
mod graph;
mod reflected;
mod registry;
pub mod serializer;

pub use config::GraphConfig;
pub use executor::PulseReport;
pub use graph::{Graph, NodeProcessor};
pub use reflected::ReflectedNode;
pub use registry::{FnNodeFactory, NodeFactory, NodeMetadata, NodeRegistry};
pub use serializer::LoadReport;
