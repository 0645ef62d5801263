//! Clustered network graph pipeline
//!
//! Classifies the hosts of a topology snapshot into layers, categories and
//! clusters, then lays them out in 3D as a renderable model that can be
//! serialized to JSON and consumed by visualization clients.

pub mod category_matcher;
pub mod classification;
pub mod config;
pub mod hostname;
pub mod layout;
pub mod model;
pub mod source;
pub mod types;

pub use category_matcher::{CategoryMatcher, FALLBACK_CATEGORY_ID};
pub use classification::{build_cluster_key, build_edges, ClassificationRules};
pub use config::{
    CategoryDefine, CategoryMatch, CategoryScope, HostTypeRule, LayerDefine, NetworkGraphConfigs,
    PartialGraphConfigs,
};
pub use hostname::parse_hostname;
pub use layout::{ring_point, LayoutConfig, LayoutEngine, LayoutResult};
pub use model::{build_clustered_graph_model, GraphModelBuilder};
pub use source::{GraphDataLoader, JsonFileSource, LoadState, SampleTopologySource, SnapshotSource};
pub use types::*;
