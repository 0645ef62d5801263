//! Clustered graph model assembly
//!
//! Ties classification, edge filtering and layout together into the single
//! renderable structure clients consume.

use std::collections::HashSet;

use super::category_matcher::FALLBACK_COLOR;
use super::classification::{build_edges, ClassificationRules};
use super::config::PartialGraphConfigs;
use super::layout::{LayoutConfig, LayoutEngine};
use super::types::{
    ClusteredGraphModel, GraphEdge, GraphNode, GraphNodeData, HostWithMeta, PositionMap, Snapshot,
};
use crate::error::ConfigError;

/// Builds [`ClusteredGraphModel`]s from snapshots using one compiled rule set
#[derive(Debug, Clone, Default)]
pub struct GraphModelBuilder {
    rules: ClassificationRules,
    engine: LayoutEngine,
}

impl GraphModelBuilder {
    pub fn new(rules: ClassificationRules, layout: LayoutConfig) -> Self {
        Self {
            rules,
            engine: LayoutEngine::with_config(layout),
        }
    }

    /// Compile rule tables, filling omitted sections with defaults
    pub fn from_configs(configs: &PartialGraphConfigs) -> Result<Self, ConfigError> {
        let rules = ClassificationRules::compile(&configs.merged())?;
        Ok(Self::new(rules, configs.layout_config()))
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Classify, connect and lay out one snapshot
    pub fn build(&self, snapshot: &Snapshot) -> ClusteredGraphModel {
        let hosts = self.rules.classify_hosts(&snapshot.hosts);

        let known: HashSet<&str> = hosts.iter().map(|h| h.hostname.as_str()).collect();
        let edges = build_edges(&snapshot.connections, &known);

        let layout = self.engine.layout(&hosts, self.rules.categories().categories());
        let nodes = hosts.iter().map(|host| self.node_for(host)).collect();
        let edge_vertices = edge_vertices(&edges, &layout.positions_by_id);

        tracing::info!(
            hosts = hosts.len(),
            edges = edges.len(),
            shells = layout.shells.len(),
            dropped_connections = snapshot.connections.len() - edges.len(),
            "built clustered graph model"
        );

        ClusteredGraphModel {
            nodes,
            edges,
            positions_by_id: layout.positions_by_id,
            edge_vertices,
            shells: layout.shells,
        }
    }

    fn node_for(&self, host: &HostWithMeta) -> GraphNode {
        let fill = self
            .rules
            .categories()
            .get(&host.category_id)
            .map(|category| category.color.clone())
            .unwrap_or_else(|| FALLBACK_COLOR.to_string());

        GraphNode {
            id: host.hostname.clone(),
            label: host.hostname.clone(),
            fill,
            data: GraphNodeData {
                host_type: host.host_type.clone(),
                category_id: host.category_id.clone(),
                cluster_key: host.cluster_key.clone(),
                layer_id: host.layer_id.clone(),
                prefecture_code: host.parsed.prefecture_code.clone(),
                building_code: host.parsed.building_code.clone(),
            },
        }
    }
}

/// Flatten edge endpoints into `[sx, sy, sz, tx, ty, tz, ...]`
///
/// Edges with an unplaced endpoint are skipped.
pub fn edge_vertices(edges: &[GraphEdge], positions: &PositionMap) -> Vec<f32> {
    let mut vertices = Vec::with_capacity(edges.len() * 6);

    for edge in edges {
        let (Some(source), Some(target)) =
            (positions.get(&edge.source), positions.get(&edge.target))
        else {
            continue;
        };
        for value in [source.x, source.y, source.z, target.x, target.y, target.z] {
            vertices.push(value as f32);
        }
    }

    vertices
}

/// One-shot convenience: compile `configs` and build the model for `snapshot`
pub fn build_clustered_graph_model(
    snapshot: &Snapshot,
    configs: &PartialGraphConfigs,
) -> crate::error::Result<ClusteredGraphModel> {
    let builder = GraphModelBuilder::from_configs(configs)?;
    Ok(builder.build(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{Host, NodePosition};

    fn snapshot() -> Snapshot {
        Snapshot {
            hosts: vec![
                Host::new("e01core--gwr1", "GWR"),
                Host::new("e01edge--er1", "EDGE_ROUTER"),
                Host::untyped("printer"),
            ],
            connections: vec![
                ("e01core--gwr1".to_string(), "e01edge--er1".to_string()),
                ("e01core--gwr1".to_string(), "ghost".to_string()),
                ("e01edge--er1".to_string(), "printer".to_string()),
            ],
        }
    }

    #[test]
    fn test_build_fills_every_part() {
        let model = GraphModelBuilder::default().build(&snapshot());

        assert_eq!(model.nodes.len(), 3);
        assert_eq!(model.positions_by_id.len(), 3);
        assert_eq!(model.edges.len(), 2);
        assert_eq!(model.edges[1].id, "edge-1");
        assert_eq!(model.edge_vertices.len(), 12);
        assert_eq!(model.shells.len(), 2);
    }

    #[test]
    fn test_node_fill_uses_category_color() {
        let model = GraphModelBuilder::default().build(&snapshot());
        let fill = |id: &str| model.nodes.iter().find(|n| n.id == id).unwrap().fill.clone();

        assert_eq!(fill("e01core--gwr1"), "#7B8FEA");
        assert_eq!(fill("e01edge--er1"), "#4DB6AC");
        assert_eq!(fill("printer"), FALLBACK_COLOR);
    }

    #[test]
    fn test_node_data_is_denormalized() {
        let model = GraphModelBuilder::default().build(&snapshot());
        let node = model.nodes.iter().find(|n| n.id == "e01edge--er1").unwrap();

        assert_eq!(node.label, "e01edge--er1");
        assert_eq!(node.data.host_type, "EDGE_ROUTER");
        assert_eq!(node.data.category_id, "prefecture-edges");
        assert_eq!(node.data.cluster_key, "prefecture::e01");
        assert_eq!(node.data.layer_id, "prefecture-edge");
        assert_eq!(node.data.prefecture_code, "e01");
        assert_eq!(node.data.building_code, "edge");
    }

    #[test]
    fn test_edge_vertices_skip_unplaced_endpoints() {
        let mut positions = PositionMap::new();
        positions.insert("a".to_string(), NodePosition::new("a", [1.0, 2.0, 3.0]));
        positions.insert("b".to_string(), NodePosition::new("b", [4.0, 5.0, 6.0]));

        let edge = |id: &str, source: &str, target: &str| GraphEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };
        let edges = vec![edge("edge-0", "a", "b"), edge("edge-1", "a", "missing")];

        assert_eq!(
            edge_vertices(&edges, &positions),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_empty_snapshot_builds_empty_model() {
        let model = GraphModelBuilder::default().build(&Snapshot::default());
        assert!(model.is_empty());
        assert!(model.edges.is_empty());
        assert!(model.shells.is_empty());
        assert!(model.edge_vertices.is_empty());
    }

    #[test]
    fn test_invalid_config_surfaces_error() {
        let configs = PartialGraphConfigs::load_from_str(
            "hostTypeConfig:\n  - type: BROKEN\n    regexp: '(unclosed'\n",
        )
        .unwrap();
        let err = build_clustered_graph_model(&snapshot(), &configs).unwrap_err();
        assert!(err.to_string().contains("hostType:BROKEN"), "{err}");
    }

    #[test]
    fn test_duplicate_category_ids_fail_to_compile() {
        let mut categories = crate::graph::config::default_category_config();
        let mut shadow = categories[1].clone();
        shadow.scope = crate::graph::config::CategoryScope::Building;
        categories.push(shadow);
        let configs = PartialGraphConfigs {
            category_config: Some(categories),
            ..PartialGraphConfigs::default()
        };

        let err = GraphModelBuilder::from_configs(&configs).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCategory(ref id) if id == "prefecture-edges"));
    }
}
