//! Snapshot sources and the graph data loader
//!
//! A source delivers one complete [`Snapshot`] per fetch. The loader owns a
//! source and a model builder and rebuilds the whole model on every load.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use super::model::GraphModelBuilder;
use super::types::{ClusteredGraphModel, Connection, Host, Snapshot};
use crate::error::GraphError;

/// Anything that can produce a topology snapshot
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot>;
}

// ── SampleTopologySource ──

const SAMPLE_PREFECTURES: [&str; 4] = ["e01", "e02", "w03", "w04"];
const SAMPLE_BUILDINGS: [&str; 4] = ["a01", "a02", "b10", "c20"];

/// Built-in demo topology: a core, four prefectures, four buildings each
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleTopologySource;

impl SampleTopologySource {
    pub fn snapshot() -> Snapshot {
        let mut hosts = vec![
            Host::new("e01core--gwr1", "GWR"),
            Host::new("w03core--gwr2", "GWR"),
            Host::new("e01core--cr1", "CORE_ROUTER"),
        ];
        let mut connections: Vec<Connection> = Vec::new();
        let mut link =
            |from: &str, to: &str| connections.push((from.to_string(), to.to_string()));

        for (p, pref) in SAMPLE_PREFECTURES.iter().enumerate() {
            let er1 = format!("{pref}edge--er{}", 2 * p + 1);
            let er2 = format!("{pref}edge--er{}", 2 * p + 2);
            hosts.push(Host::new(er1.as_str(), "EDGE_ROUTER"));
            hosts.push(Host::new(er2.as_str(), "EDGE_ROUTER"));
            link("e01core--gwr1", &er1);
            link("w03core--gwr2", &er2);
            link("e01core--cr1", &er1);

            for building in SAMPLE_BUILDINGS {
                let csw = format!("{pref}{building}--csw1");
                let dsw = format!("{pref}{building}--dsw1");
                let asw1 = format!("{pref}{building}--asw1");
                let asw2 = format!("{pref}{building}--asw2");

                hosts.push(Host::new(csw.as_str(), "BUILDING_CORE_SW"));
                hosts.push(Host::new(dsw.as_str(), "BUILDING_DISTRIBUTION_SW"));
                hosts.push(Host::new(asw1.as_str(), "BUILDING_ACCESS_SW"));
                hosts.push(Host::new(asw2.as_str(), "BUILDING_ACCESS_SW"));

                link(&er1, &csw);
                link(&er2, &csw);
                link(&csw, &dsw);
                link(&dsw, &asw1);
                link(&dsw, &asw2);
            }
        }

        Snapshot { hosts, connections }
    }
}

#[async_trait]
impl SnapshotSource for SampleTopologySource {
    async fn fetch(&self) -> Result<Snapshot> {
        Ok(Self::snapshot())
    }
}

// ── JsonFileSource ──

/// Reads a snapshot from a JSON file on every fetch
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for JsonFileSource {
    async fn fetch(&self) -> Result<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| GraphError::SnapshotIo {
                path: self.path.display().to_string(),
                source,
            })?;

        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(GraphError::from)
            .with_context(|| format!("snapshot file {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            hosts = snapshot.hosts.len(),
            connections = snapshot.connections.len(),
            "read snapshot file"
        );

        Ok(snapshot)
    }
}

// ── GraphDataLoader ──

/// Observable state of the loader
#[derive(Debug, Clone, Default)]
pub struct LoadState {
    pub error: Option<String>,
    pub model: ClusteredGraphModel,
    /// Incremented on every reload
    pub generation: u64,
}

/// Fetches snapshots and keeps the latest model
pub struct GraphDataLoader {
    source: Box<dyn SnapshotSource>,
    builder: GraphModelBuilder,
    state: LoadState,
}

impl GraphDataLoader {
    pub fn new(source: impl SnapshotSource + 'static, builder: GraphModelBuilder) -> Self {
        Self {
            source: Box::new(source),
            builder,
            state: LoadState::default(),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn model(&self) -> &ClusteredGraphModel {
        &self.state.model
    }

    /// Fetch once and rebuild the model
    ///
    /// On failure the model is cleared and the error message recorded.
    pub async fn load(&mut self) -> &LoadState {
        match self.source.fetch().await {
            Ok(snapshot) => {
                self.state.model = self.builder.build(&snapshot);
                self.state.error = None;
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "snapshot fetch failed");
                self.state.model = ClusteredGraphModel::default();
                self.state.error = Some(format!("{e:#}"));
            }
        }
        &self.state
    }

    /// Bump the generation and load again
    pub async fn reload(&mut self) -> &LoadState {
        self.state.generation += 1;
        tracing::info!(generation = self.state.generation, "reloading graph data");
        self.load().await
    }
}
