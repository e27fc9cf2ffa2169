//! Inventory records consumed by the fit engine.
//!
//! `NodeRecord` and `PodRecord` are point-in-time views supplied by the
//! cluster object store. They are immutable for the duration of a snapshot
//! build; the engine never writes them back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resources::ResourceVec;

/// Condition kind gating node health. Readiness is the sole health gate;
/// network-unavailable and other tainted states are not examined.
pub const NODE_READY: &str = "Ready";

// ── Node ──────────────────────────────────────────────────────────

/// A reported node condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCondition {
    pub kind: String,
    pub status: bool,
}

impl NodeCondition {
    pub fn ready(status: bool) -> Self {
        Self {
            kind: NODE_READY.to_string(),
            status,
        }
    }
}

/// Point-in-time view of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    /// Topology and scheduling labels.
    pub labels: BTreeMap<String, String>,
    /// Allocatable capacity reported by the node.
    pub allocatable: ResourceVec,
    pub conditions: Vec<NodeCondition>,
}

impl NodeRecord {
    /// A node is ready iff a `Ready` condition is present with true status.
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.kind == NODE_READY && c.status)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

// ── Pod ───────────────────────────────────────────────────────────

/// Pod lifecycle phase as reported by the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Terminal pods no longer hold capacity on their host.
    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

/// Point-in-time view of a pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRecord {
    pub name: String,
    /// Host the pod is bound to; `None` means unscheduled.
    pub node_name: Option<String>,
    pub phase: PodPhase,
    /// The pod's effective request: containers already summed by the
    /// collaborator that produced this record.
    pub requests: ResourceVec,
}

impl PodRecord {
    /// A pod consumes capacity iff it is bound to a host and not terminal.
    pub fn consumes_capacity(&self) -> bool {
        self.node_name.is_some() && !self.phase.is_terminal()
    }
}
