//! Hierarchical radial layout engine for clustered network graphs
//!
//! Converts classified hosts into 3D positions and enclosing cluster shells.
//! The engine is a pure function of its inputs: every call starts from empty
//! local state and iterates only sorted structures, so identical input
//! always yields identical output.
//!
//! ## Algorithm
//!
//! 1. Sort categories by `order`, ties by id; categories sharing an order
//!    form a tier and each takes an angular slot in it
//! 2. Group each category's hosts into clusters by cluster key (sorted)
//! 3. Size each cluster's shell from its layer diversity
//! 4. Pick a ring radius large enough that the clusters on it cannot overlap;
//!    prefecture clusters count the building ring nested below them, and
//!    later slots of a tier are pushed outside the earlier ones
//! 5. Place cluster centers on the ring, sinking by category order
//! 6. Re-root building clusters around their parent prefecture cluster
//! 7. Place hosts on one ring per layer around the cluster center
//! 8. Put anything left over on a fallback ring and warn about it
//!
//! ```text
//!   y
//!   ▲      (core)                 order 0 ── global cluster
//!   │   ○    ○    ○    ○          order 1 ── prefecture clusters
//!   │  ∘∘∘  ∘∘∘  ∘∘∘  ∘∘∘         building clusters, below their prefecture
//!   └──────────────────────► x/z
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::f64::consts::{PI, TAU};

use super::config::{CategoryDefine, CategoryScope};
use super::types::{ClusterShell, HostWithMeta, NodePosition, PositionMap};

/// Layout constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Height of order-0 categories
    pub top_level_y: f64,
    /// Vertical drop per category order
    pub category_y_step: f64,
    /// Vertical offset of building clusters relative to their prefecture
    pub building_offset_y: f64,
    /// Minimum clearance between clusters on a tier ring
    pub cluster_gap: f64,
    /// Minimum clearance between buildings under one prefecture
    pub building_cluster_gap: f64,
    /// Lower bound for the cluster size used when packing rings
    pub min_packing_radius: f64,
    /// Constant added to every shell radius
    pub shell_padding: f64,
    /// Extra shell radius per layer beyond the first
    pub layer_shell_padding: f64,
    /// Vertical spacing between layer rings inside a cluster
    pub layer_spacing_y: f64,
    /// Radius of the ring used for hosts no cluster placed
    pub fallback_ring_radius: f64,
    /// Fallback ring height, in category steps below the top level
    pub fallback_depth: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            top_level_y: 1000.0,
            category_y_step: 700.0,
            building_offset_y: -550.0,
            cluster_gap: 120.0,
            building_cluster_gap: 100.0,
            min_packing_radius: 120.0,
            shell_padding: 80.0,
            layer_shell_padding: 10.0,
            layer_spacing_y: 90.0,
            fallback_ring_radius: 300.0,
            fallback_depth: 3.0,
        }
    }
}

/// Point `index` of `total` evenly spaced on a horizontal ring.
///
/// Rings with a single member collapse to the ring center.
pub fn ring_point(index: usize, total: usize, radius: f64, y: f64, phase: f64) -> [f64; 3] {
    if total <= 1 {
        return [0.0, y, 0.0];
    }

    let angle = phase + TAU * index as f64 / total as f64;
    [angle.cos() * radius, y, angle.sin() * radius]
}

/// Hosts sharing one cluster key
#[derive(Debug, Clone)]
pub struct ClusterInfo<'a> {
    pub key: String,
    pub hosts: Vec<&'a HostWithMeta>,
    /// Distinct layer orders among the hosts (at least 1)
    pub layer_count: usize,
    pub shell_radius: f64,
    /// Emitted shell radius, including per-layer padding
    pub outer_radius: f64,
    /// Size reserved when packing the cluster on a ring; covers the shell
    /// and, for prefecture clusters, the buildings nested below it
    pub packing_radius: f64,
}

impl<'a> ClusterInfo<'a> {
    fn new(
        key: String,
        hosts: Vec<&'a HostWithMeta>,
        category: &CategoryDefine,
        config: &LayoutConfig,
    ) -> Self {
        let layer_count = hosts
            .iter()
            .map(|host| host.layer_order)
            .collect::<HashSet<_>>()
            .len()
            .max(1);
        let shell_radius = category.local_ring_radius
            + layer_count as f64 * category.local_ring_step
            + config.shell_padding;
        let outer_radius = shell_radius + (layer_count - 1) as f64 * config.layer_shell_padding;

        Self {
            key,
            hosts,
            layer_count,
            shell_radius,
            outer_radius,
            packing_radius: outer_radius.max(config.min_packing_radius),
        }
    }

    /// Prefecture code shared by every host of the cluster
    fn prefecture_code(&self) -> Option<&str> {
        self.hosts.first().map(|host| host.parsed.prefecture_code.as_str())
    }
}

/// Group a category's hosts by cluster key, keys in lexicographic order
pub fn create_cluster_infos<'a>(
    category_hosts: &[&'a HostWithMeta],
    category: &CategoryDefine,
    config: &LayoutConfig,
) -> Vec<ClusterInfo<'a>> {
    let mut clusters: BTreeMap<&str, Vec<&'a HostWithMeta>> = BTreeMap::new();
    for &host in category_hosts {
        clusters.entry(host.cluster_key.as_str()).or_default().push(host);
    }

    clusters
        .into_iter()
        .map(|(key, hosts)| ClusterInfo::new(key.to_string(), hosts, category, config))
        .collect()
}

fn max_packing_radius(clusters: &[ClusterInfo<'_>], config: &LayoutConfig) -> f64 {
    clusters
        .iter()
        .map(|cluster| cluster.packing_radius)
        .fold(config.min_packing_radius, f64::max)
}

/// Smallest ring radius at which `clusters`, evenly spaced, keep `gap`
/// between their shells; never below `configured_radius`.
///
/// Uses the chord between neighbouring slots, which is the binding
/// constraint; the circumference bound `n * spacing / 2π` alone lets
/// neighbours overlap for small `n`.
pub fn resolve_adaptive_ring_radius(
    clusters: &[ClusterInfo<'_>],
    configured_radius: f64,
    gap: f64,
    config: &LayoutConfig,
) -> f64 {
    if clusters.len() <= 1 {
        return configured_radius;
    }

    let spacing = 2.0 * max_packing_radius(clusters, config) + gap;
    let required = spacing / (2.0 * (PI / clusters.len() as f64).sin());
    configured_radius.max(required)
}

/// A category with hosts, ready to be placed on its tier
struct CategoryPlan<'a> {
    category: &'a CategoryDefine,
    clusters: Vec<ClusterInfo<'a>>,
}

/// Result of a layout pass
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub positions_by_id: PositionMap,
    pub shells: Vec<ClusterShell>,
    /// Hosts that no cluster placed and that sit on the fallback ring
    pub fallback_hosts: Vec<String>,
}

/// Radial layout engine
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    fn category_y(&self, order: i32) -> f64 {
        self.config.top_level_y - order as f64 * self.config.category_y_step
    }

    /// Compute positions for every host and one shell per cluster
    pub fn layout<'c>(
        &self,
        hosts: &[HostWithMeta],
        categories: impl IntoIterator<Item = &'c CategoryDefine>,
    ) -> LayoutResult {
        let mut result = LayoutResult::default();
        let mut prefecture_centers: HashMap<String, [f64; 3]> = HashMap::new();

        let categories: Vec<&CategoryDefine> = categories.into_iter().collect();
        let mut tiers = self.plan_tiers(hosts, &categories);
        self.reserve_building_footprints(&mut tiers);

        for (order, plans) in &tiers {
            let slot_count = plans.len();
            let y = self.category_y(*order);
            let mut previous_outer = 0.0;

            for (slot, plan) in plans.iter().enumerate() {
                let category = plan.category;
                let phase = TAU * slot as f64 / slot_count as f64;
                let max_size = max_packing_radius(&plan.clusters, &self.config);
                let adaptive = resolve_adaptive_ring_radius(
                    &plan.clusters,
                    category.cluster_ring_radius,
                    self.config.cluster_gap,
                    &self.config,
                );
                let ring_radius = if slot == 0 {
                    adaptive
                } else {
                    adaptive.max(previous_outer + max_size + self.config.cluster_gap)
                };
                previous_outer = ring_radius + max_size;

                let siblings_by_prefecture = group_by_prefecture(&plan.clusters);

                for (index, cluster) in plan.clusters.iter().enumerate() {
                    let mut center = if plan.clusters.len() == 1 && slot_count > 1 {
                        // keep a lone cluster off the tier axis so tier siblings stay apart
                        [phase.cos() * ring_radius, y, phase.sin() * ring_radius]
                    } else {
                        ring_point(index, plan.clusters.len(), ring_radius, y, phase)
                    };

                    match category.scope {
                        CategoryScope::Prefecture => {
                            if let Some(code) = cluster.prefecture_code() {
                                prefecture_centers.insert(code.to_string(), center);
                            }
                        }
                        CategoryScope::Building => {
                            center = self.nest_under_prefecture(
                                cluster,
                                center,
                                &plan.clusters,
                                &siblings_by_prefecture,
                                category,
                                phase,
                                &prefecture_centers,
                            );
                        }
                        CategoryScope::Global => {}
                    }

                    let positions = &mut result.positions_by_id;
                    self.place_cluster_nodes(cluster, center, category, positions);

                    result.shells.push(ClusterShell {
                        id: format!("{}:{}", category.id, cluster.key),
                        label: format!("{} / {}", category.label, cluster.key),
                        center,
                        radius: cluster.outer_radius,
                        color: category.color.clone(),
                        opacity: match category.scope {
                            CategoryScope::Global => 0.12,
                            _ => 0.07,
                        },
                    });
                }
            }
        }

        self.place_fallback_hosts(hosts, &mut result);

        tracing::debug!(
            hosts = hosts.len(),
            shells = result.shells.len(),
            fallback = result.fallback_hosts.len(),
            "layout complete"
        );

        result
    }

    /// Build the per-order tiers: categories with hosts, sorted by (order, id)
    fn plan_tiers<'a>(
        &self,
        hosts: &'a [HostWithMeta],
        categories: &[&'a CategoryDefine],
    ) -> BTreeMap<i32, Vec<CategoryPlan<'a>>> {
        let mut sorted: Vec<&'a CategoryDefine> = categories.to_vec();
        sorted.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

        let mut hosts_by_category: HashMap<&str, Vec<&HostWithMeta>> = HashMap::new();
        for host in hosts {
            hosts_by_category
                .entry(host.category_id.as_str())
                .or_default()
                .push(host);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut tiers: BTreeMap<i32, Vec<CategoryPlan<'a>>> = BTreeMap::new();

        for category in sorted {
            if !seen.insert(category.id.as_str()) {
                tracing::debug!(category = %category.id, "duplicate category id ignored by layout");
                continue;
            }
            let Some(category_hosts) = hosts_by_category.get(category.id.as_str()) else {
                continue;
            };

            tiers.entry(category.order).or_default().push(CategoryPlan {
                category,
                clusters: create_cluster_infos(category_hosts, category, &self.config),
            });
        }

        tiers
    }

    /// Grow each prefecture cluster's packing size to cover the building
    /// ring nested under it, so buildings of neighbouring prefectures stay
    /// apart as well as the prefecture shells themselves.
    fn reserve_building_footprints(&self, tiers: &mut BTreeMap<i32, Vec<CategoryPlan<'_>>>) {
        let mut footprints: HashMap<String, f64> = HashMap::new();

        for plan in tiers.values().flatten() {
            if plan.category.scope != CategoryScope::Building {
                continue;
            }
            for (code, indices) in group_by_prefecture(&plan.clusters) {
                let siblings: Vec<ClusterInfo<'_>> =
                    indices.iter().map(|&i| plan.clusters[i].clone()).collect();
                let ring = if siblings.len() > 1 {
                    resolve_adaptive_ring_radius(
                        &siblings,
                        plan.category.cluster_ring_radius,
                        self.config.building_cluster_gap,
                        &self.config,
                    )
                } else {
                    0.0
                };
                let footprint = ring + max_packing_radius(&siblings, &self.config);

                let entry = footprints.entry(code.to_string()).or_insert(0.0);
                *entry = entry.max(footprint);
            }
        }

        for plan in tiers.values_mut().flatten() {
            if plan.category.scope != CategoryScope::Prefecture {
                continue;
            }
            for cluster in &mut plan.clusters {
                let footprint = cluster
                    .prefecture_code()
                    .and_then(|code| footprints.get(code))
                    .copied();
                if let Some(footprint) = footprint {
                    cluster.packing_radius = cluster.packing_radius.max(footprint);
                }
            }
        }
    }

    /// Re-center a building cluster on a ring around its parent prefecture
    ///
    /// Siblings are the category's clusters under the same prefecture. A
    /// cluster whose prefecture has no center yet keeps `raw_center`.
    #[allow(clippy::too_many_arguments)]
    fn nest_under_prefecture(
        &self,
        cluster: &ClusterInfo<'_>,
        raw_center: [f64; 3],
        clusters: &[ClusterInfo<'_>],
        siblings_by_prefecture: &BTreeMap<&str, Vec<usize>>,
        category: &CategoryDefine,
        phase: f64,
        prefecture_centers: &HashMap<String, [f64; 3]>,
    ) -> [f64; 3] {
        let Some(code) = cluster.prefecture_code() else {
            return raw_center;
        };
        let Some(parent) = prefecture_centers.get(code) else {
            tracing::debug!(cluster = %cluster.key, "no parent prefecture center");
            return raw_center;
        };

        let sibling_indices = siblings_by_prefecture.get(code).cloned().unwrap_or_default();
        let siblings: Vec<ClusterInfo<'_>> =
            sibling_indices.iter().map(|&i| clusters[i].clone()).collect();
        let sibling_index = siblings
            .iter()
            .position(|sibling| sibling.key == cluster.key)
            .unwrap_or(0);

        let radius = resolve_adaptive_ring_radius(
            &siblings,
            category.cluster_ring_radius,
            self.config.building_cluster_gap,
            &self.config,
        );
        let offset = ring_point(sibling_index, siblings.len(), radius, 0.0, phase);

        [
            parent[0] + offset[0],
            parent[1] + self.config.building_offset_y,
            parent[2] + offset[2],
        ]
    }

    /// Place hosts on one ring per layer, stacked around the cluster center
    fn place_cluster_nodes(
        &self,
        cluster: &ClusterInfo<'_>,
        center: [f64; 3],
        category: &CategoryDefine,
        positions: &mut PositionMap,
    ) {
        let mut buckets: BTreeMap<i32, Vec<&HostWithMeta>> = BTreeMap::new();
        for &host in &cluster.hosts {
            buckets.entry(host.layer_order).or_default().push(host);
        }

        let bucket_count = buckets.len();
        for (layer_index, bucket) in buckets.values().enumerate() {
            let radius = category.local_ring_radius + layer_index as f64 * category.local_ring_step;
            let y_offset = (layer_index as f64 - (bucket_count as f64 - 1.0) / 2.0)
                * self.config.layer_spacing_y;

            for (node_index, host) in bucket.iter().enumerate() {
                let [x, y, z] = ring_point(node_index, bucket.len(), radius, y_offset, 0.0);
                let point = [center[0] + x, center[1] + y, center[2] + z];
                positions.insert(
                    host.hostname.clone(),
                    NodePosition::new(host.hostname.as_str(), point),
                );
            }
        }
    }

    /// Put every host the clusters missed on a low fallback ring
    fn place_fallback_hosts(&self, hosts: &[HostWithMeta], result: &mut LayoutResult) {
        let y = self.config.top_level_y - self.config.fallback_depth * self.config.category_y_step;

        for (index, host) in hosts.iter().enumerate() {
            if result.positions_by_id.contains_key(&host.hostname) {
                continue;
            }

            tracing::warn!(
                host = %host.hostname,
                category = %host.category_id,
                cluster = %host.cluster_key,
                "host not placed by any cluster; using fallback ring"
            );

            let point = ring_point(index, hosts.len(), self.config.fallback_ring_radius, y, 0.0);
            result
                .positions_by_id
                .insert(host.hostname.clone(), NodePosition::new(host.hostname.as_str(), point));
            result.fallback_hosts.push(host.hostname.clone());
        }
    }
}

fn group_by_prefecture<'a>(clusters: &'a [ClusterInfo<'_>]) -> BTreeMap<&'a str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, cluster) in clusters.iter().enumerate() {
        if let Some(code) = cluster.prefecture_code() {
            groups.entry(code).or_default().push(index);
        }
    }
    groups
}
