//! Resource names, quantities, and componentwise vector arithmetic.
//!
//! Capacity and demand are open-ended mappings from resource name to a
//! nonnegative integer quantity: CPU in milli-units, memory in bytes, and
//! anything else in whatever unit the inventory reports. All arithmetic
//! saturates, so free capacity never goes negative.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a schedulable resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A mapping from resource name to quantity.
///
/// Keys are stored sorted, so iteration order (and everything derived from
/// it) is deterministic. Absent entries read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVec(BTreeMap<ResourceName, u64>);

impl ResourceVec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<ResourceName>, quantity: u64) -> Self {
        self.set(name.into(), quantity);
        self
    }

    pub fn get(&self, name: &ResourceName) -> u64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn set(&mut self, name: ResourceName, quantity: u64) {
        self.0.insert(name, quantity);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, u64)> {
        self.0.iter().map(|(name, quantity)| (name, *quantity))
    }

    /// Componentwise saturating addition.
    pub fn add_assign(&mut self, other: &ResourceVec) {
        for (name, quantity) in other.iter() {
            let entry = self.0.entry(name.clone()).or_insert(0);
            *entry = entry.saturating_add(quantity);
        }
    }

    /// Componentwise subtraction, floored at zero.
    pub fn saturating_sub_assign(&mut self, other: &ResourceVec) {
        for (name, quantity) in other.iter() {
            let entry = self.0.entry(name.clone()).or_insert(0);
            *entry = entry.saturating_sub(quantity);
        }
    }

    /// True iff `demand[r] <= self[r]` for every resource mentioned in
    /// `demand`. Resources only present on `self` are ignored.
    pub fn covers(&self, demand: &ResourceVec) -> bool {
        demand.iter().all(|(name, wanted)| self.get(name) >= wanted)
    }

    /// How many units of `demand` fit into this capacity: the minimum of
    /// `self[r] / demand[r]` over the resources `demand` actually asks for.
    ///
    /// A demanded resource absent from `self` yields zero. A demand with no
    /// positive entries is unconstrained and yields `u32::MAX`.
    pub fn fits_count(&self, demand: &ResourceVec) -> u32 {
        let mut count = u32::MAX;
        for (name, wanted) in demand.iter() {
            if wanted == 0 {
                continue;
            }
            let fits = (self.get(name) / wanted).min(u64::from(u32::MAX)) as u32;
            count = count.min(fits);
        }
        count
    }
}

impl FromIterator<(ResourceName, u64)> for ResourceVec {
    fn from_iter<I: IntoIterator<Item = (ResourceName, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(entries: &[(&str, u64)]) -> ResourceVec {
        entries
            .iter()
            .map(|(name, quantity)| (ResourceName::from(*name), *quantity))
            .collect()
    }

    #[test]
    fn absent_entries_read_as_zero() {
        let v = vec_of(&[("cpu", 1000)]);
        assert_eq!(v.get(&"memory".into()), 0);
    }

    #[test]
    fn add_is_componentwise() {
        let mut v = vec_of(&[("cpu", 1000), ("memory", 100)]);
        v.add_assign(&vec_of(&[("cpu", 500), ("example.com/gpu", 2)]));

        assert_eq!(v.get(&"cpu".into()), 1500);
        assert_eq!(v.get(&"memory".into()), 100);
        assert_eq!(v.get(&"example.com/gpu".into()), 2);
    }

    #[test]
    fn sub_floors_at_zero() {
        let mut v = vec_of(&[("cpu", 1000)]);
        v.saturating_sub_assign(&vec_of(&[("cpu", 1500), ("memory", 64)]));

        assert_eq!(v.get(&"cpu".into()), 0);
        assert_eq!(v.get(&"memory".into()), 0);
    }

    #[test]
    fn covers_checks_only_demanded_resources() {
        let capacity = vec_of(&[("cpu", 1000), ("memory", 1024)]);

        assert!(capacity.covers(&vec_of(&[("cpu", 1000)])));
        assert!(!capacity.covers(&vec_of(&[("cpu", 1001)])));
        assert!(!capacity.covers(&vec_of(&[("example.com/gpu", 1)])));
        assert!(capacity.covers(&ResourceVec::new()));
    }

    #[test]
    fn fits_count_takes_minimum_across_resources() {
        let capacity = vec_of(&[("cpu", 2500), ("memory", 4096)]);
        let demand = vec_of(&[("cpu", 1000), ("memory", 1024)]);

        assert_eq!(capacity.fits_count(&demand), 2);
    }

    #[test]
    fn fits_count_missing_resource_is_zero() {
        let capacity = vec_of(&[("cpu", 2000)]);
        let demand = vec_of(&[("example.com/gpu", 1)]);

        assert_eq!(capacity.fits_count(&demand), 0);
    }

    #[test]
    fn fits_count_empty_demand_is_unbounded() {
        let capacity = vec_of(&[("cpu", 1)]);
        assert_eq!(capacity.fits_count(&ResourceVec::new()), u32::MAX);
    }

    #[test]
    fn fits_count_ignores_zero_quantity_demands() {
        let capacity = vec_of(&[("cpu", 2000)]);
        let demand = vec_of(&[("cpu", 1000), ("memory", 0)]);

        assert_eq!(capacity.fits_count(&demand), 2);
    }

    #[test]
    fn serializes_as_plain_map() {
        let v = vec_of(&[("cpu", 600), ("memory", 1024)]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"cpu":600,"memory":1024}"#);
    }
}
