//! netgraph - clustered 3D layout for network topologies
//!
//! Turns a flat list of hosts and connections into a hierarchical radial
//! layout: hosts are grouped by configurable rule tables into layers,
//! categories and clusters, and every cluster gets a position and an
//! enclosing shell.
//!
//! ## Quick Start
//!
//! ```rust
//! use netgraph::{build_clustered_graph_model, Host, PartialGraphConfigs, Snapshot};
//!
//! let snapshot = Snapshot {
//!     hosts: vec![
//!         Host::new("e01core--gwr1", "GWR"),
//!         Host::new("e01edge--er1", "EDGE_ROUTER"),
//!     ],
//!     connections: vec![("e01core--gwr1".into(), "e01edge--er1".into())],
//! };
//! let model = build_clustered_graph_model(&snapshot, &PartialGraphConfigs::default()).unwrap();
//! assert_eq!(model.edges.len(), 1);
//! assert_eq!(model.edge_vertices.len(), 6);
//! ```

pub mod error;
pub mod graph;

pub use error::{ConfigError, GraphError};
pub use graph::{
    build_clustered_graph_model, ClassificationRules, ClusteredGraphModel, GraphDataLoader,
    GraphModelBuilder, Host, LayoutConfig, LayoutEngine, PartialGraphConfigs, Snapshot,
};
