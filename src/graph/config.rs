//! Rule table configuration
//!
//! Host-type rules, layer definitions and category definitions are ordered
//! declarative tables. Order is part of the contract: every table is
//! evaluated first-match-wins in declaration order.
//!
//! Tables can be built in code (see the `default_*` functions) or loaded
//! from YAML, e.g. `config/network-graph.yaml`. Patterns are plain regex
//! strings; use an inline `(?i)` flag for case-insensitive matching.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::layout::LayoutConfig;
use super::types::{CategoryId, HostType, LayerId};
use crate::error::ConfigError;

/// Ordered regex rule mapping hostnames to a host type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostTypeRule {
    #[serde(rename = "type")]
    pub host_type: HostType,
    pub regexp: String,
}

impl HostTypeRule {
    pub fn new(host_type: &str, regexp: &str) -> Self {
        Self {
            host_type: host_type.to_string(),
            regexp: regexp.to_string(),
        }
    }
}

/// Groups host types into an ordered layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayerDefine {
    pub id: LayerId,
    pub order: i32,
    #[serde(default)]
    pub host_types: Vec<HostType>,
}

/// How broadly a category's cluster key is shared
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryScope {
    /// One cluster per category
    #[default]
    Global,
    /// One cluster per prefecture code
    Prefecture,
    /// One cluster per prefecture/building pair
    Building,
}

/// Predicate over a host's type, layer and parsed hostname
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMatch {
    /// When omitted, the category-level `hostTypes` alias applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_types: Option<Vec<HostType>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_host_types: Vec<HostType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layer_ids: Vec<LayerId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_layer_ids: Vec<LayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname_regexp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture_regexp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_regexp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_regexp: Option<String>,
}

/// Visual/logical grouping rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefine {
    pub id: CategoryId,
    pub label: String,
    pub order: i32,
    /// Convenience alias for `match.hostTypes`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_types: Option<Vec<HostType>>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_rule: Option<CategoryMatch>,
    #[serde(default)]
    pub scope: CategoryScope,
    pub color: String,
    pub cluster_ring_radius: f64,
    pub local_ring_radius: f64,
    pub local_ring_step: f64,
}

/// Complete set of rule tables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkGraphConfigs {
    pub host_type_config: Vec<HostTypeRule>,
    pub layer_config: Vec<LayerDefine>,
    pub category_config: Vec<CategoryDefine>,
}

impl Default for NetworkGraphConfigs {
    fn default() -> Self {
        Self {
            host_type_config: default_host_type_config(),
            layer_config: default_layer_config(),
            category_config: default_category_config(),
        }
    }
}

impl NetworkGraphConfigs {
    /// Render the tables as YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Rule tables where any section may be omitted
///
/// Omitted sections fall back to the built-in defaults when merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartialGraphConfigs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_type_config: Option<Vec<HostTypeRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_config: Option<Vec<LayerDefine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_config: Option<Vec<CategoryDefine>>,
    /// Overrides for layout constants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutConfig>,
}

impl PartialGraphConfigs {
    /// Load from a YAML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::load_from_str(&content)
    }

    /// Load from a YAML string
    pub fn load_from_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Fill omitted sections with the built-in defaults
    pub fn merged(&self) -> NetworkGraphConfigs {
        NetworkGraphConfigs {
            host_type_config: self
                .host_type_config
                .clone()
                .unwrap_or_else(default_host_type_config),
            layer_config: self.layer_config.clone().unwrap_or_else(default_layer_config),
            category_config: self
                .category_config
                .clone()
                .unwrap_or_else(default_category_config),
        }
    }

    pub fn layout_config(&self) -> LayoutConfig {
        self.layout.clone().unwrap_or_default()
    }
}

impl From<NetworkGraphConfigs> for PartialGraphConfigs {
    fn from(configs: NetworkGraphConfigs) -> Self {
        Self {
            host_type_config: Some(configs.host_type_config),
            layer_config: Some(configs.layer_config),
            category_config: Some(configs.category_config),
            layout: None,
        }
    }
}

// =============================================================================
// BUILT-IN DEFAULTS
// =============================================================================

pub fn default_host_type_config() -> Vec<HostTypeRule> {
    vec![
        HostTypeRule::new("GWR", r"(?i)-+gwr\d+$"),
        HostTypeRule::new("CORE_ROUTER", r"(?i)-+(core|cr|corert)\d+$"),
        HostTypeRule::new("EDGE_ROUTER", r"(?i)-+(edge|er)\d+$"),
        HostTypeRule::new("BUILDING_CORE_SW", r"(?i)-+(bcsw|coresw|csw)\d+$"),
        HostTypeRule::new("BUILDING_DISTRIBUTION_SW", r"(?i)-+(bdsw|distsw|dsw)\d+$"),
        HostTypeRule::new("BUILDING_ACCESS_SW", r"(?i)-+(basw|accsw|asw)\d+$"),
    ]
}

pub fn default_layer_config() -> Vec<LayerDefine> {
    let layer = |id: &str, order: i32, host_types: &[&str]| LayerDefine {
        id: id.to_string(),
        order,
        host_types: host_types.iter().map(|t| t.to_string()).collect(),
    };

    vec![
        layer("upper-layer", 0, &["GWR", "CORE_ROUTER"]),
        layer("prefecture-edge", 1, &["EDGE_ROUTER"]),
        layer("building-core", 2, &["BUILDING_CORE_SW"]),
        layer("building-distribution", 3, &["BUILDING_DISTRIBUTION_SW"]),
        layer("building-access", 4, &["BUILDING_ACCESS_SW"]),
    ]
}

pub fn default_category_config() -> Vec<CategoryDefine> {
    vec![
        CategoryDefine {
            id: "core-network".to_string(),
            label: "Core network".to_string(),
            order: 0,
            host_types: None,
            match_rule: Some(CategoryMatch {
                host_types: Some(vec!["GWR".to_string(), "CORE_ROUTER".to_string()]),
                ..CategoryMatch::default()
            }),
            scope: CategoryScope::Global,
            color: "#7B8FEA".to_string(),
            cluster_ring_radius: 0.0,
            local_ring_radius: 180.0,
            local_ring_step: 40.0,
        },
        CategoryDefine {
            id: "prefecture-edges".to_string(),
            label: "Prefecture".to_string(),
            order: 1,
            host_types: None,
            match_rule: Some(CategoryMatch {
                host_types: Some(vec!["EDGE_ROUTER".to_string()]),
                prefecture_regexp: Some(r"(?i)^(e|w)\d{2}$".to_string()),
                ..CategoryMatch::default()
            }),
            scope: CategoryScope::Prefecture,
            color: "#4DB6AC".to_string(),
            cluster_ring_radius: 1300.0,
            local_ring_radius: 190.0,
            local_ring_step: 35.0,
        },
        CategoryDefine {
            id: "building-switches".to_string(),
            label: "Building".to_string(),
            order: 2,
            host_types: None,
            match_rule: Some(CategoryMatch {
                layer_ids: vec![
                    "building-core".to_string(),
                    "building-distribution".to_string(),
                    "building-access".to_string(),
                ],
                ..CategoryMatch::default()
            }),
            scope: CategoryScope::Building,
            color: "#8AB4F8".to_string(),
            cluster_ring_radius: 530.0,
            local_ring_radius: 120.0,
            local_ring_step: 55.0,
        },
    ]
}
