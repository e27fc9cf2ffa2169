//! Fit solver — packs a pod group into the tightest topology region.
//!
//! `Snapshot::find_topology_assignment` answers: on which leaves should
//! `count` identical pods of demand `per_pod` run, so that they stay inside
//! a single domain at the requested level (or as close to that as the
//! `preferred` relaxation allows), using as few groups as possible at every
//! level below it?
//!
//! The search runs in two phases over a per-call capacity overlay:
//!
//! 1. **Level selection** — pick the level whose best domain fits the whole
//!    group. `required` pins that level; `preferred` ascends toward the
//!    root until something fits; no constraint starts at the root.
//! 2. **Descent** — level by level, divide each selected domain's share
//!    among its own children by filling them in capacity order (ties by
//!    label tuple), then recurse into each chosen child with exactly the
//!    share it was given. Selected leaves are emitted larger counts first,
//!    label order among equals.
//!
//! Capacity is counted in whole pods from the leaves up; an internal
//! domain's capacity is the sum of its children's pod counts, so a demand
//! that only fits co-located on one host is never satisfied by fragments
//! spread across siblings.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gridfit_core::ResourceVec;

use crate::snapshot::{DomainId, Snapshot};

// ── Request / response ────────────────────────────────────────────

/// Grouping constraint of an assignment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// Every pod must land within a single domain at the named level.
    Required(String),
    /// Try the single-domain fit at the named level, then widen toward the
    /// root until the group fits.
    Preferred(String),
    /// No grouping constraint; the whole fleet is the search root.
    Unconstrained,
}

/// A request to place `count` identical pods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub grouping: Grouping,
    /// Demand of a single pod.
    pub per_pod: ResourceVec,
    /// Number of pods; must be at least 1.
    pub count: u32,
}

/// Where the pods go: per-leaf counts, ordered as selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The flavor's level keys; every domain entry has one value per key.
    pub levels: Vec<String>,
    pub domains: Vec<DomainAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAssignment {
    pub count: u32,
    pub values: Vec<String>,
}

/// Why no assignment was produced.
///
/// This is a normal return value, not a failure: the caller treats it as
/// "try later or with a different flavor". The `Display` strings are part
/// of the external contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnfitReason {
    /// The requested level yields no domains (unknown level key, or the
    /// filtered inventory has no admissible leaf).
    NoDomainsAtLevel { level: String },
    /// No single leaf accepts even one pod of this demand.
    FitsNone { flavor: String, count: u32 },
    /// Usable capacity covers only `fit` of the requested pods.
    FitsOnly { flavor: String, fit: u32, count: u32 },
}

impl fmt::Display for UnfitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnfitReason::NoDomainsAtLevel { level } => {
                write!(f, "no topology domains at level: {level}")
            }
            UnfitReason::FitsNone { flavor, count } => {
                write!(f, "topology \"{flavor}\" doesn't allow to fit any of {count} pod(s)")
            }
            UnfitReason::FitsOnly { flavor, fit, count } => {
                write!(
                    f,
                    "topology \"{flavor}\" allows to fit only {fit} out of {count} pod(s)"
                )
            }
        }
    }
}

// ── Solve ─────────────────────────────────────────────────────────

impl Snapshot {
    /// Compute a topology assignment for `request`.
    ///
    /// Deterministic: identical snapshot and request produce an identical
    /// assignment, including domain order. The snapshot itself is not
    /// touched; all solve state lives in a per-call overlay, so concurrent
    /// solves may share one snapshot.
    pub fn find_topology_assignment(
        &self,
        request: &AssignmentRequest,
    ) -> Result<Assignment, UnfitReason> {
        debug_assert!(request.count >= 1, "pod count must be at least 1");

        let (start_level, required) = self.start_level(&request.grouping)?;
        let capacity = self.fill_in_counts(&request.per_pod);
        let (fit_level, root) =
            self.find_fit_level(&capacity, start_level, required, request.count)?;
        debug!(
            flavor = %self.flavor(),
            fit_level,
            count = request.count,
            "search root selected"
        );

        let selected = self.descend(&capacity, fit_level, root, request.count);
        Ok(Assignment {
            levels: self.levels().to_vec(),
            domains: selected
                .into_iter()
                .map(|(id, count)| DomainAssignment {
                    count,
                    values: self.domain(id).values.clone(),
                })
                .collect(),
        })
    }

    /// Resolve the grouping to the arena level where the search starts.
    fn start_level(&self, grouping: &Grouping) -> Result<(usize, bool), UnfitReason> {
        let resolve = |key: &str| {
            self.arena_level(key).ok_or_else(|| UnfitReason::NoDomainsAtLevel {
                level: key.to_string(),
            })
        };
        match grouping {
            Grouping::Required(key) => Ok((resolve(key)?, true)),
            Grouping::Preferred(key) => Ok((resolve(key)?, false)),
            Grouping::Unconstrained => {
                if self.is_empty() {
                    return Err(UnfitReason::NoDomainsAtLevel {
                        level: self.level_key(self.leaf_level()).to_string(),
                    });
                }
                Ok((0, false))
            }
        }
    }

    /// Per-call capacity overlay: how many pods of this demand each domain
    /// supports, counted in whole pods from the leaves up.
    fn fill_in_counts(&self, per_pod: &ResourceVec) -> Vec<u32> {
        let mut capacity = vec![0u32; self.domain_count()];
        for level in (0..=self.leaf_level()).rev() {
            for &id in self.domains_at(level) {
                let domain = self.domain(id);
                capacity[id] = if level == self.leaf_level() {
                    domain.free.fits_count(per_pod)
                } else {
                    domain
                        .children
                        .iter()
                        .fold(0u32, |sum, &child| sum.saturating_add(capacity[child]))
                };
            }
        }
        capacity
    }

    /// Find the level whose best domain fits the whole group, ascending
    /// from `level` toward the root when the grouping allows it.
    fn find_fit_level(
        &self,
        capacity: &[u32],
        mut level: usize,
        required: bool,
        count: u32,
    ) -> Result<(usize, DomainId), UnfitReason> {
        loop {
            let Some(best) = self.best_domain(level, capacity) else {
                return Err(UnfitReason::NoDomainsAtLevel {
                    level: self.level_key(level).to_string(),
                });
            };
            if capacity[best] >= count {
                return Ok((level, best));
            }
            if required || level == 0 {
                return Err(self.not_fit(capacity[best], count));
            }
            level -= 1;
        }
    }

    /// Highest-capacity domain at a level, ties broken by label tuple.
    fn best_domain(&self, level: usize, capacity: &[u32]) -> Option<DomainId> {
        self.domains_at(level)
            .iter()
            .copied()
            .min_by(|&a, &b| self.candidate_order(capacity, a, b))
    }

    /// Capacity descending, then label-value tuple ascending.
    fn candidate_order(
        &self,
        capacity: &[u32],
        a: DomainId,
        b: DomainId,
    ) -> std::cmp::Ordering {
        capacity[b]
            .cmp(&capacity[a])
            .then_with(|| self.domain(a).values.cmp(&self.domain(b).values))
    }

    /// Walk from the fit level down to the leaves. Each selected domain's
    /// share is divided among that domain's own children along the ordered
    /// pool; the recursion then carries each child's share, never the
    /// global count, so a partially-used sibling cannot draft capacity a
    /// fully-committed one already owns.
    fn descend(
        &self,
        capacity: &[u32],
        fit_level: usize,
        root: DomainId,
        count: u32,
    ) -> Vec<(DomainId, u32)> {
        let mut selected = vec![(root, count)];
        for _ in fit_level..self.leaf_level() {
            let mut next = Vec::new();
            for &(parent, share) in &selected {
                let mut pool = self.domain(parent).children.clone();
                pool.sort_by(|&a, &b| self.candidate_order(capacity, a, b));
                next.extend(distribute(&pool, capacity, share));
            }
            selected = next;
        }
        // Emission order: larger counts first, label order among equals.
        selected.sort_by(|&(a, count_a), &(b, count_b)| {
            count_b
                .cmp(&count_a)
                .then_with(|| self.domain(a).values.cmp(&self.domain(b).values))
        });
        selected
    }

    fn not_fit(&self, fit: u32, count: u32) -> UnfitReason {
        warn!(
            flavor = %self.flavor(),
            fit,
            count,
            "demand exceeds grouped capacity"
        );
        if fit == 0 {
            UnfitReason::FitsNone {
                flavor: self.flavor().to_string(),
                count,
            }
        } else {
            UnfitReason::FitsOnly {
                flavor: self.flavor().to_string(),
                fit,
                count,
            }
        }
    }
}

/// Assign `min(capacity, remaining)` along the ordered pool until the whole
/// count is covered. The caller guarantees the pool's total capacity is at
/// least `count`.
fn distribute(pool: &[DomainId], capacity: &[u32], count: u32) -> Vec<(DomainId, u32)> {
    let mut selected = Vec::new();
    let mut remaining = count;
    for &id in pool {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(capacity[id]);
        if take == 0 {
            continue;
        }
        selected.push((id, take));
        remaining -= take;
    }
    debug_assert_eq!(remaining, 0, "fit level guarantees coverage");
    selected
}
