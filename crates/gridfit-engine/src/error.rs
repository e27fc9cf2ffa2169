//! Structural error types for snapshot construction.
//!
//! These cover the cases where the topology as described cannot be realized
//! at all (object store I/O failures during inventory listing). Demand that
//! merely does not fit is *not* an error — the solver reports it as an
//! [`UnfitReason`](crate::solver::UnfitReason) value.

use thiserror::Error;

/// Errors reading inventory from the cluster object store.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to list nodes: {0}")]
    ListNodes(#[source] anyhow::Error),

    #[error("failed to list pods: {0}")]
    ListPods(#[source] anyhow::Error),
}

/// Errors building a topology snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// The store listed the same node name twice; free capacity would be
    /// double-counted.
    #[error("node listed more than once: {0}")]
    DuplicateNode(String),
}
