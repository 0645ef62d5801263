//! Property tests for the clustered layout

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

use netgraph::graph::{
    build_clustered_graph_model, ClusterShell, ClusteredGraphModel, Host, LayoutConfig,
    PartialGraphConfigs, Snapshot,
};

const EPS: f64 = 1e-6;

fn build(snapshot: &Snapshot) -> ClusteredGraphModel {
    build_clustered_graph_model(snapshot, &PartialGraphConfigs::default()).unwrap()
}

fn arb_hostname() -> impl Strategy<Value = String> {
    let prefecture = prop::sample::select(vec![
        "e01", "e02", "e03", "e05", "w03", "w04", "w06", "w07", "x99",
    ]);
    let building = prop::sample::select(vec!["a01", "a02", "b10", "core", "edge"]);
    let unit = prop::sample::select(vec![
        "gwr1", "cr2", "er1", "er2", "csw1", "dsw1", "asw1", "asw2", "ups1",
    ]);
    (prefecture, building, unit).prop_map(|(p, b, u)| format!("{p}{b}--{u}"))
}

fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    prop::collection::vec(arb_hostname(), 0..80).prop_flat_map(|names| {
        let pool: Vec<String> = names
            .iter()
            .cloned()
            .chain(["ghost".to_string(), "nowhere".to_string()])
            .collect();
        let connections = prop::collection::vec(
            (prop::sample::select(pool.clone()), prop::sample::select(pool)),
            0..30,
        );
        (Just(names), connections).prop_map(|(names, connections)| Snapshot {
            hosts: names.into_iter().map(Host::untyped).collect(),
            connections,
        })
    })
}

fn distance(a: &ClusterShell, b: &ClusterShell) -> f64 {
    let [ax, ay, az] = a.center;
    let [bx, by, bz] = b.center;
    ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt()
}

fn assert_apart(shells: &[&ClusterShell], gap: f64) -> Result<(), TestCaseError> {
    for (i, a) in shells.iter().enumerate() {
        for b in shells.iter().skip(i + 1) {
            prop_assert!(
                distance(a, b) + EPS >= a.radius + b.radius + gap,
                "{} overlaps {}",
                a.id,
                b.id
            );
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn layout_is_deterministic(snapshot in arb_snapshot()) {
        prop_assert_eq!(build(&snapshot), build(&snapshot));
    }

    /// Repeating the host list changes nothing
    #[test]
    fn duplicate_hosts_are_idempotent(snapshot in arb_snapshot()) {
        let mut doubled = snapshot.clone();
        doubled.hosts.extend(snapshot.hosts.iter().cloned());
        prop_assert_eq!(build(&snapshot), build(&doubled));
    }

    #[test]
    fn every_host_gets_a_node_and_position(snapshot in arb_snapshot()) {
        let model = build(&snapshot);
        let unique: HashSet<&str> = snapshot.hosts.iter().map(|h| h.hostname.as_str()).collect();

        prop_assert_eq!(model.nodes.len(), unique.len());
        prop_assert_eq!(model.positions_by_id.len(), unique.len());
        for name in unique {
            prop_assert!(model.position(name).is_some());
        }
    }

    #[test]
    fn edges_only_join_known_hosts(snapshot in arb_snapshot()) {
        let model = build(&snapshot);
        let known: HashSet<&str> = snapshot.hosts.iter().map(|h| h.hostname.as_str()).collect();
        let expected = snapshot
            .connections
            .iter()
            .filter(|(s, t)| known.contains(s.as_str()) && known.contains(t.as_str()))
            .count();

        prop_assert_eq!(model.edges.len(), expected);
        prop_assert_eq!(model.edge_vertices.len(), expected * 6);
        for (index, edge) in model.edges.iter().enumerate() {
            prop_assert_eq!(&edge.id, &format!("edge-{index}"));
            prop_assert!(known.contains(edge.source.as_str()));
            prop_assert!(known.contains(edge.target.as_str()));
        }
    }

    #[test]
    fn prefecture_clusters_do_not_overlap(snapshot in arb_snapshot()) {
        let model = build(&snapshot);
        let prefectures: Vec<&ClusterShell> = model
            .shells
            .iter()
            .filter(|s| s.id.starts_with("prefecture-edges:"))
            .collect();
        assert_apart(&prefectures, LayoutConfig::default().cluster_gap)?;
    }

    #[test]
    fn sibling_buildings_do_not_overlap(snapshot in arb_snapshot()) {
        let model = build(&snapshot);
        let mut by_prefecture: BTreeMap<String, Vec<&ClusterShell>> = BTreeMap::new();
        for shell in &model.shells {
            if let Some(rest) = shell.id.strip_prefix("building-switches:building::") {
                let prefecture = rest.split('/').next().unwrap_or_default().to_string();
                by_prefecture.entry(prefecture).or_default().push(shell);
            }
        }

        for siblings in by_prefecture.values() {
            assert_apart(siblings, LayoutConfig::default().building_cluster_gap)?;
        }
    }

    /// Buildings nested under different prefectures keep clear of each other
    #[test]
    fn nested_buildings_do_not_overlap(snapshot in arb_snapshot()) {
        let model = build(&snapshot);
        let nested: Vec<&ClusterShell> = model
            .shells
            .iter()
            .filter(|shell| {
                shell
                    .id
                    .strip_prefix("building-switches:building::")
                    .and_then(|rest| rest.split('/').next())
                    .is_some_and(|code| {
                        model.shell(&format!("prefecture-edges:prefecture::{code}")).is_some()
                    })
            })
            .collect();

        assert_apart(&nested, LayoutConfig::default().building_cluster_gap)?;
    }
}
