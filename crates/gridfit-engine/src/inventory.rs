//! Inventory reader — pulls nodes and pods from the cluster object store.
//!
//! The reader is the engine's only suspension point: listing nodes and pods
//! awaits the [`InventorySource`]. Everything downstream (snapshot build,
//! solve) is pure in-memory computation.
//!
//! Admissibility rules:
//! - a node must be ready, carry a non-empty value for every level label,
//!   and match every key/value of the flavor's node-label filter;
//! - a pod holds capacity only while it is bound to a host and not in a
//!   terminal phase; pods on hosts outside the admissible set are dropped.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tracing::debug;

use gridfit_core::{FlavorSpec, NodeRecord, PodRecord, ResourceVec};

use crate::error::{InventoryError, SnapshotError};
use crate::snapshot::Snapshot;

/// The cluster object store seam.
///
/// Implementations enumerate the current node and pod inventory. The engine
/// treats every listing as a fresh point-in-time view; nothing is cached
/// between snapshot calls.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn list_nodes(&self) -> anyhow::Result<Vec<NodeRecord>>;
    async fn list_pods(&self) -> anyhow::Result<Vec<PodRecord>>;
}

/// A fixed in-memory inventory.
///
/// Stands in for a live object store in tests and single-shot evaluations.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    nodes: Vec<NodeRecord>,
    pods: Vec<PodRecord>,
}

impl StaticInventory {
    pub fn new(nodes: Vec<NodeRecord>, pods: Vec<PodRecord>) -> Self {
        Self { nodes, pods }
    }
}

#[async_trait]
impl InventorySource for StaticInventory {
    async fn list_nodes(&self) -> anyhow::Result<Vec<NodeRecord>> {
        Ok(self.nodes.clone())
    }

    async fn list_pods(&self) -> anyhow::Result<Vec<PodRecord>> {
        Ok(self.pods.clone())
    }
}

/// Reads inventory for one topology flavor and builds snapshots from it.
pub struct InventoryReader<S> {
    source: S,
    spec: FlavorSpec,
}

impl<S: InventorySource> InventoryReader<S> {
    pub fn new(source: S, spec: FlavorSpec) -> Self {
        Self { source, spec }
    }

    pub fn spec(&self) -> &FlavorSpec {
        &self.spec
    }

    /// Build a topology snapshot from the current inventory.
    ///
    /// An inventory that filters down to zero admissible nodes still builds
    /// an (empty) snapshot; the solver reports the emptiness against the
    /// level the caller actually asked for.
    pub async fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
        let nodes = self
            .source
            .list_nodes()
            .await
            .map_err(InventoryError::ListNodes)?;
        let pods = self
            .source
            .list_pods()
            .await
            .map_err(InventoryError::ListPods)?;

        let total = nodes.len();
        let admissible = admissible_nodes(&self.spec, nodes);
        let mut seen = BTreeSet::new();
        for node in &admissible {
            if !seen.insert(node.name.as_str()) {
                return Err(SnapshotError::DuplicateNode(node.name.clone()));
            }
        }
        debug!(
            flavor = %self.spec.name,
            admitted = admissible.len(),
            skipped = total - admissible.len(),
            "filtered node inventory"
        );

        let usage = usage_by_host(&pods);
        Ok(Snapshot::build(self.spec.clone(), &admissible, &usage))
    }
}

/// Keep the nodes this flavor may schedule onto.
fn admissible_nodes(spec: &FlavorSpec, nodes: Vec<NodeRecord>) -> Vec<NodeRecord> {
    nodes
        .into_iter()
        .filter(|node| {
            if !node.is_ready() {
                debug!(node = %node.name, "skipping node: not ready");
                return false;
            }
            if let Some(level) = spec
                .levels
                .iter()
                .find(|level| node.label(level).is_none_or(str::is_empty))
            {
                debug!(node = %node.name, %level, "skipping node: missing level label");
                return false;
            }
            let filter_ok = spec
                .node_label_filter
                .iter()
                .all(|(key, value)| node.label(key) == Some(value.as_str()));
            if !filter_ok {
                debug!(node = %node.name, "skipping node: label filter mismatch");
            }
            filter_ok
        })
        .collect()
}

/// Sum the requests of capacity-consuming pods, keyed by host name.
fn usage_by_host(pods: &[PodRecord]) -> BTreeMap<String, ResourceVec> {
    let mut usage: BTreeMap<String, ResourceVec> = BTreeMap::new();
    for pod in pods.iter().filter(|pod| pod.consumes_capacity()) {
        let host = pod.node_name.as_deref().unwrap_or_default();
        usage
            .entry(host.to_string())
            .or_default()
            .add_assign(&pod.requests);
    }
    usage
}
