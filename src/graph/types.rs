//! Graph types for network topology visualization
//!
//! These types define the input snapshot, the per-host classification
//! record, and the renderable model that is serialized to JSON and consumed
//! by 3D rendering clients.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Hostname = String;
pub type HostType = String;
pub type LayerId = String;
pub type CategoryId = String;

/// A host record as delivered by the data source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub hostname: Hostname,
    /// Optional type hint; regex resolution wins when a rule matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_type: Option<HostType>,
}

impl Host {
    pub fn new(hostname: impl Into<String>, host_type: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            host_type: Some(host_type.into()),
        }
    }

    pub fn untyped(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            host_type: None,
        }
    }
}

/// Point-to-point connection between two hostnames
pub type Connection = (Hostname, Hostname);

/// Full snapshot handed to the core in one piece
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// Tokens extracted from a hostname
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedHostname {
    pub raw: Hostname,
    pub prefecture_code: String,
    pub building_code: String,
    pub unit_code: String,
}

/// Classification result for one host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostWithMeta {
    pub hostname: Hostname,
    pub host_type: HostType,
    pub parsed: ParsedHostname,
    pub layer_id: LayerId,
    pub layer_order: i32,
    pub category_id: CategoryId,
    pub category_order: i32,
    /// `global::<category>`, `prefecture::<pref>` or `building::<pref>/<building>`
    pub cluster_key: String,
}

/// Visual boundary enclosing one cluster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterShell {
    pub id: String,
    pub label: String,
    pub center: [f64; 3],
    pub radius: f64,
    pub color: String,
    pub opacity: f64,
}

/// Denormalized metadata attached to each rendered node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNodeData {
    pub host_type: HostType,
    pub category_id: CategoryId,
    pub cluster_key: String,
    pub layer_id: LayerId,
    pub prefecture_code: String,
    pub building_code: String,
}

/// A renderable node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub fill: String,
    pub data: GraphNodeData,
}

/// A renderable edge between two known hosts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Placed host position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl NodePosition {
    pub fn new(id: impl Into<String>, point: [f64; 3]) -> Self {
        Self {
            id: id.into(),
            x: point[0],
            y: point[1],
            z: point[2],
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Hostname → position, ordered by hostname
pub type PositionMap = BTreeMap<String, NodePosition>;

/// The complete renderable structure produced from one snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusteredGraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub positions_by_id: PositionMap,
    /// Two 3D points per edge, flattened
    pub edge_vertices: Vec<f32>,
    pub shells: Vec<ClusterShell>,
}

impl ClusteredGraphModel {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn position(&self, hostname: &str) -> Option<&NodePosition> {
        self.positions_by_id.get(hostname)
    }

    pub fn shell(&self, id: &str) -> Option<&ClusterShell> {
        self.shells.iter().find(|shell| shell.id == id)
    }
}
