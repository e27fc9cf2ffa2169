//! gridfit-core — shared data model for the GridFit fit engine.
//!
//! Defines the resource arithmetic (open-ended name → quantity vectors with
//! saturating componentwise operations), the node and pod inventory records
//! the engine consumes, and the topology flavor configuration (ordered level
//! keys plus an optional node-label filter).
//!
//! The engine itself lives in `gridfit-engine`; this crate carries only the
//! types both sides of that boundary agree on.

pub mod config;
pub mod resources;
pub mod types;

pub use config::{FlavorSpec, FlavorSpecError};
pub use resources::{ResourceName, ResourceVec};
pub use types::{NodeCondition, NodeRecord, PodPhase, PodRecord};
