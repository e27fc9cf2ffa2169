//! gridfit-engine — topology-aware fit engine.
//!
//! Given a hierarchical description of a compute fleet and a group of
//! identical pods with a per-pod resource demand, the engine decides which
//! leaf hosts the pods should run on: it packs the requested count into the
//! smallest, most tightly grouped region of the topology that still has
//! enough free capacity, honoring a "required" or "preferred" grouping
//! constraint at a named topology level.
//!
//! # Components
//!
//! - **`inventory`** — Pulls nodes and pods from the cluster object store,
//!   filters out non-ready nodes and non-consuming pods, and aggregates pod
//!   usage per host.
//! - **`snapshot`** — Builds the capacity-annotated topology tree: one
//!   domain per distinct label-value tuple per level, free capacity netted
//!   out at the leaves and rolled up to the root.
//! - **`solver`** — `Snapshot::find_topology_assignment`: the packing
//!   search with layered tie-breaks (fewest enclosing groups first, then
//!   deterministic ordering), and the request/assignment/reason types of
//!   the external contract.
//!
//! Snapshots are built on demand, immutable once built, and discarded after
//! each assignment call; solver annotations live in a per-call overlay, so
//! one snapshot is safely shareable across parallel solves.

pub mod error;
pub mod inventory;
pub mod snapshot;
pub mod solver;

pub use error::{InventoryError, SnapshotError};
pub use inventory::{InventoryReader, InventorySource, StaticInventory};
pub use snapshot::Snapshot;
pub use solver::{
    Assignment, AssignmentRequest, DomainAssignment, Grouping, UnfitReason,
};
