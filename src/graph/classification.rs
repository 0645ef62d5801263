//! Host classification pipeline
//!
//! Each host is resolved, in order, to a host type (regex rules), a parsed
//! hostname, a layer, a category and finally a cluster key. Every step has a
//! fallback, so classification never fails.
//!
//! ```text
//! hostname ──► type rules ──► layer table ──► category table ──► cluster key
//!    │                                              ▲
//!    └──────────► hostname parser ──────────────────┘
//! ```

use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::category_matcher::{CategoryMatcher, CategoryTarget, FALLBACK_CATEGORY_ID};
use super::config::{CategoryDefine, CategoryScope, LayerDefine, NetworkGraphConfigs};
use super::hostname::parse_hostname;
use super::types::{Connection, GraphEdge, Host, HostType, HostWithMeta};
use crate::error::ConfigError;

pub const UNKNOWN_HOST_TYPE: &str = "UNKNOWN";
pub const UNCLASSIFIED_LAYER_ID: &str = "unclassified-layer";
pub const UNCLASSIFIED_LAYER_ORDER: i32 = 999;

/// Hint value data sources use for "no type"
const PLACEHOLDER_HINT: &str = "-";

/// A host-type rule with its pattern compiled
#[derive(Debug, Clone)]
struct CompiledHostTypeRule {
    host_type: HostType,
    regex: Regex,
}

/// Compiled rule tables, ready to classify hosts
///
/// Compiling once keeps classification itself infallible; the only
/// failure mode (a malformed pattern) surfaces here.
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    host_type_rules: Vec<CompiledHostTypeRule>,
    layers: Vec<LayerDefine>,
    categories: CategoryMatcher,
}

impl ClassificationRules {
    pub fn compile(configs: &NetworkGraphConfigs) -> Result<Self, ConfigError> {
        let host_type_rules = configs
            .host_type_config
            .iter()
            .map(|rule| {
                Regex::new(&rule.regexp)
                    .map(|regex| CompiledHostTypeRule {
                        host_type: rule.host_type.clone(),
                        regex,
                    })
                    .map_err(|e| {
                        ConfigError::invalid_pattern(
                            &format!("hostType:{}", rule.host_type),
                            &rule.regexp,
                            e,
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            host_type_rules,
            layers: configs.layer_config.clone(),
            categories: CategoryMatcher::compile(&configs.category_config)?,
        })
    }

    pub fn categories(&self) -> &CategoryMatcher {
        &self.categories
    }

    /// Resolve the host type from ordered regex rules, then the hint
    pub fn resolve_host_type(&self, hostname: &str, hint: Option<&str>) -> HostType {
        if let Some(rule) = self
            .host_type_rules
            .iter()
            .find(|rule| rule.regex.is_match(hostname))
        {
            return rule.host_type.clone();
        }

        match hint {
            Some(hint) if !hint.is_empty() && hint != PLACEHOLDER_HINT => hint.to_string(),
            _ => UNKNOWN_HOST_TYPE.to_string(),
        }
    }

    /// First layer containing the host type, or a synthetic unclassified layer
    pub fn find_layer(&self, host_type: &str) -> LayerDefine {
        self.layers
            .iter()
            .find(|layer| layer.host_types.iter().any(|t| t == host_type))
            .cloned()
            .unwrap_or_else(|| LayerDefine {
                id: UNCLASSIFIED_LAYER_ID.to_string(),
                order: UNCLASSIFIED_LAYER_ORDER,
                host_types: vec![host_type.to_string()],
            })
    }

    /// Classify a single host
    pub fn classify(&self, host: &Host) -> HostWithMeta {
        let host_type = self.resolve_host_type(&host.hostname, host.host_type.as_deref());
        let parsed = parse_hostname(&host.hostname);
        let layer = self.find_layer(&host_type);
        let category = self.categories.find_category_for_host(&CategoryTarget {
            hostname: &host.hostname,
            host_type: &host_type,
            parsed: &parsed,
            layer_id: &layer.id,
        });

        let cluster_key =
            build_cluster_key(&category, &parsed.prefecture_code, &parsed.building_code);

        HostWithMeta {
            hostname: host.hostname.clone(),
            host_type,
            parsed,
            layer_id: layer.id,
            layer_order: layer.order,
            category_id: category.id,
            category_order: category.order,
            cluster_key,
        }
    }

    /// Deduplicate by hostname and classify every host
    ///
    /// A repeated hostname keeps the position of its first occurrence and
    /// the content of its last.
    pub fn classify_hosts(&self, hosts: &[Host]) -> Vec<HostWithMeta> {
        let deduped = dedupe_hosts(hosts);
        let classified: Vec<HostWithMeta> =
            deduped.iter().map(|host| self.classify(host)).collect();

        tracing::debug!(
            input = hosts.len(),
            unique = classified.len(),
            unclassified = classified
                .iter()
                .filter(|h| h.category_id == FALLBACK_CATEGORY_ID)
                .count(),
            "classified hosts"
        );

        classified
    }
}

impl Default for ClassificationRules {
    /// Rules compiled from the built-in tables
    fn default() -> Self {
        Self::compile(&NetworkGraphConfigs::default()).expect("built-in rule tables are valid")
    }
}

/// Cluster key from category scope and parsed tokens
pub fn build_cluster_key(
    category: &CategoryDefine,
    prefecture_code: &str,
    building_code: &str,
) -> String {
    match category.scope {
        CategoryScope::Prefecture => format!("prefecture::{}", prefecture_code),
        CategoryScope::Building => format!("building::{}/{}", prefecture_code, building_code),
        CategoryScope::Global => format!("global::{}", category.id),
    }
}

fn dedupe_hosts(hosts: &[Host]) -> Vec<&Host> {
    let mut slot_by_name: HashMap<&str, usize> = HashMap::new();
    let mut deduped: Vec<&Host> = Vec::with_capacity(hosts.len());

    for host in hosts {
        match slot_by_name.get(host.hostname.as_str()) {
            Some(&slot) => deduped[slot] = host,
            None => {
                slot_by_name.insert(&host.hostname, deduped.len());
                deduped.push(host);
            }
        }
    }

    deduped
}

/// Keep connections whose endpoints are both known, numbering them in order
pub fn build_edges(connections: &[Connection], known_hosts: &HashSet<&str>) -> Vec<GraphEdge> {
    connections
        .iter()
        .filter(|(source, target)| {
            known_hosts.contains(source.as_str()) && known_hosts.contains(target.as_str())
        })
        .enumerate()
        .map(|(index, (source, target))| GraphEdge {
            id: format!("edge-{}", index),
            source: source.clone(),
            target: target.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::config::HostTypeRule;

    #[test]
    fn test_resolve_host_type_rules_before_hint() {
        let rules = ClassificationRules::default();
        assert_eq!(rules.resolve_host_type("e01core--gwr1", Some("EDGE_ROUTER")), "GWR");
        assert_eq!(rules.resolve_host_type("E01CORE--CR7", None), "CORE_ROUTER");
        assert_eq!(rules.resolve_host_type("e01a01--accsw3", None), "BUILDING_ACCESS_SW");
    }

    #[test]
    fn test_resolve_host_type_falls_back_to_hint_then_unknown() {
        let rules = ClassificationRules::default();
        assert_eq!(rules.resolve_host_type("printer", Some("PRINTER")), "PRINTER");
        assert_eq!(rules.resolve_host_type("printer", Some("-")), UNKNOWN_HOST_TYPE);
        assert_eq!(rules.resolve_host_type("printer", Some("")), UNKNOWN_HOST_TYPE);
        assert_eq!(rules.resolve_host_type("printer", None), UNKNOWN_HOST_TYPE);
    }

    #[test]
    fn test_rule_order_is_respected() {
        let configs = NetworkGraphConfigs {
            host_type_config: vec![
                HostTypeRule::new("FIRST", "sw"),
                HostTypeRule::new("SECOND", r"asw\d+$"),
            ],
            ..NetworkGraphConfigs::default()
        };
        let rules = ClassificationRules::compile(&configs).unwrap();
        assert_eq!(rules.resolve_host_type("e01a01--asw1", None), "FIRST");
    }

    #[test]
    fn test_invalid_host_type_pattern() {
        let configs = NetworkGraphConfigs {
            host_type_config: vec![HostTypeRule::new("BROKEN", "(gwr")],
            ..NetworkGraphConfigs::default()
        };
        let err = ClassificationRules::compile(&configs).unwrap_err();
        assert!(err.to_string().contains("hostType:BROKEN"));
    }

    #[test]
    fn test_find_layer_and_fallback() {
        let rules = ClassificationRules::default();
        let layer = rules.find_layer("EDGE_ROUTER");
        assert_eq!(layer.id, "prefecture-edge");
        assert_eq!(layer.order, 1);

        let fallback = rules.find_layer("TOASTER");
        assert_eq!(fallback.id, UNCLASSIFIED_LAYER_ID);
        assert_eq!(fallback.order, UNCLASSIFIED_LAYER_ORDER);
        assert_eq!(fallback.host_types, vec!["TOASTER"]);
    }

    #[test]
    fn test_classify_cluster_keys_by_scope() {
        let rules = ClassificationRules::default();

        let core = rules.classify(&Host::new("e01core--gwr1", "GWR"));
        assert_eq!(core.category_id, "core-network");
        assert_eq!(core.cluster_key, "global::core-network");
        assert_eq!(core.layer_id, "upper-layer");

        let edge = rules.classify(&Host::new("e01edge--er1", "EDGE_ROUTER"));
        assert_eq!(edge.category_id, "prefecture-edges");
        assert_eq!(edge.cluster_key, "prefecture::e01");

        let switch = rules.classify(&Host::untyped("w03b10--dsw1"));
        assert_eq!(switch.host_type, "BUILDING_DISTRIBUTION_SW");
        assert_eq!(switch.category_id, "building-switches");
        assert_eq!(switch.cluster_key, "building::w03/b10");
        assert_eq!(switch.layer_order, 3);
    }

    #[test]
    fn test_unmatched_host_is_fully_classified() {
        let rules = ClassificationRules::default();
        let odd = rules.classify(&Host::untyped("mystery-box"));
        assert_eq!(odd.host_type, UNKNOWN_HOST_TYPE);
        assert_eq!(odd.layer_id, UNCLASSIFIED_LAYER_ID);
        assert_eq!(odd.category_id, FALLBACK_CATEGORY_ID);
        assert_eq!(odd.category_order, 999);
        assert_eq!(odd.cluster_key, format!("global::{}", FALLBACK_CATEGORY_ID));
    }

    #[test]
    fn test_dedupe_keeps_first_position_last_content() {
        let rules = ClassificationRules::default();
        let hosts = vec![
            Host::new("printer", "PRINTER"),
            Host::new("e01core--gwr1", "GWR"),
            Host::new("printer", "SCANNER"),
        ];
        let classified = rules.classify_hosts(&hosts);
        assert_eq!(classified.len(), 2);
        assert_eq!(classified[0].hostname, "printer");
        assert_eq!(classified[0].host_type, "SCANNER");
        assert_eq!(classified[1].hostname, "e01core--gwr1");
    }

    #[test]
    fn test_classification_is_idempotent() {
        let rules = ClassificationRules::default();
        let hosts = vec![
            Host::new("e01core--gwr1", "GWR"),
            Host::new("e02edge--er3", "EDGE_ROUTER"),
            Host::untyped("e02a01--asw2"),
            Host::untyped("junk"),
        ];
        assert_eq!(rules.classify_hosts(&hosts), rules.classify_hosts(&hosts));
    }

    #[test]
    fn test_build_edges_filters_and_numbers() {
        let known: HashSet<&str> = ["a", "b", "c"].into_iter().collect();
        let connections = vec![
            ("a".to_string(), "b".to_string()),
            ("a".to_string(), "ghost".to_string()),
            ("ghost".to_string(), "c".to_string()),
            ("b".to_string(), "c".to_string()),
        ];
        let edges = build_edges(&connections, &known);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].id, "edge-0");
        assert_eq!((edges[0].source.as_str(), edges[0].target.as_str()), ("a", "b"));
        assert_eq!(edges[1].id, "edge-1");
        assert_eq!((edges[1].source.as_str(), edges[1].target.as_str()), ("b", "c"));
    }
}
