//! Topology snapshot — a capacity-annotated tree of domains.
//!
//! A domain is a maximal group of nodes sharing the same label values up to
//! some level. Domains are arena-allocated and addressed by index; parent
//! and child links are indices, and the arena is discarded with the
//! snapshot. Level 0 holds a single synthetic root spanning the whole
//! fleet; level `n` (the flavor's finest level) holds the leaves.
//!
//! Free capacity is netted out at the leaves (allocatable minus the usage
//! of capacity-consuming pods, floored at zero) and rolled up as plain sums
//! on the way to the root.

use std::collections::BTreeMap;

use tracing::debug;

use gridfit_core::{FlavorSpec, NodeRecord, ResourceVec};

pub(crate) type DomainId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Domain {
    /// 0 = root, `levels.len()` = leaf.
    pub level: usize,
    /// Label values identifying this domain, one per level above the root.
    pub values: Vec<String>,
    pub parent: Option<DomainId>,
    pub children: Vec<DomainId>,
    /// Leaf: allocatable minus consuming-pod usage. Internal: sum of the
    /// children's `free`.
    pub free: ResourceVec,
}

/// An immutable, capacity-annotated view of the fleet for one flavor.
#[derive(Debug, Clone)]
pub struct Snapshot {
    spec: FlavorSpec,
    domains: Vec<Domain>,
    /// Domain ids per level, index 0 = root, ordered by label-value tuple.
    per_level: Vec<Vec<DomainId>>,
}

impl Snapshot {
    /// Build the tree from admissible nodes and per-host pod usage.
    ///
    /// Nodes sharing the same full label-value tuple collapse into one leaf
    /// whose free capacity is the sum over its members. Hosts present in
    /// `usage_by_host` but absent from `nodes` contribute nothing.
    pub fn build(
        spec: FlavorSpec,
        nodes: &[NodeRecord],
        usage_by_host: &BTreeMap<String, ResourceVec>,
    ) -> Snapshot {
        let depth = spec.levels.len();
        debug_assert!(depth > 0, "flavor must declare at least one level");
        let mut domains = vec![Domain {
            level: 0,
            values: Vec::new(),
            parent: None,
            children: Vec::new(),
            free: ResourceVec::new(),
        }];
        let mut per_level: Vec<Vec<DomainId>> = vec![Vec::new(); depth + 1];
        per_level[0].push(0);

        // Group nodes by full tuple; the BTreeMap fixes the leaf order.
        let mut leaves: BTreeMap<Vec<String>, ResourceVec> = BTreeMap::new();
        for node in nodes {
            let Some(tuple) = full_tuple(&spec, node) else {
                continue;
            };
            let mut free = node.allocatable.clone();
            if let Some(used) = usage_by_host.get(&node.name) {
                free.saturating_sub_assign(used);
            }
            leaves.entry(tuple).or_default().add_assign(&free);
        }

        let mut by_tuple: BTreeMap<Vec<String>, DomainId> = BTreeMap::new();
        for (tuple, free) in &leaves {
            let mut parent = 0;
            for level in 1..=depth {
                let prefix = tuple[..level].to_vec();
                let id = *by_tuple.entry(prefix.clone()).or_insert_with(|| {
                    let id = domains.len();
                    domains.push(Domain {
                        level,
                        values: prefix,
                        parent: Some(parent),
                        children: Vec::new(),
                        free: ResourceVec::new(),
                    });
                    domains[parent].children.push(id);
                    per_level[level].push(id);
                    id
                });
                parent = id;
            }
            domains[parent].free = free.clone();
        }

        // Roll leaf capacity up to the root.
        for level in (0..depth).rev() {
            for i in 0..per_level[level].len() {
                let id = per_level[level][i];
                let mut sum = ResourceVec::new();
                for &child in &domains[id].children {
                    sum.add_assign(&domains[child].free);
                }
                domains[id].free = sum;
            }
        }

        debug!(
            flavor = %spec.name,
            leaves = per_level[depth].len(),
            domains = domains.len() - 1,
            "topology snapshot built"
        );

        Snapshot {
            spec,
            domains,
            per_level,
        }
    }

    pub fn flavor(&self) -> &str {
        &self.spec.name
    }

    /// The flavor's level keys, coarse to fine.
    pub fn levels(&self) -> &[String] {
        &self.spec.levels
    }

    /// True iff the filtered inventory produced no leaves.
    pub fn is_empty(&self) -> bool {
        self.per_level[self.leaf_level()].is_empty()
    }

    /// Free capacity of the domain with exactly these label values, if one
    /// exists at any level.
    pub fn free_at(&self, values: &[String]) -> Option<&ResourceVec> {
        self.domains
            .iter()
            .find(|domain| domain.values == values)
            .map(|domain| &domain.free)
    }

    pub(crate) fn domain(&self, id: DomainId) -> &Domain {
        &self.domains[id]
    }

    pub(crate) fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub(crate) fn domains_at(&self, level: usize) -> &[DomainId] {
        &self.per_level[level]
    }

    /// Arena depth of the leaves; equals the number of flavor levels.
    pub(crate) fn leaf_level(&self) -> usize {
        self.per_level.len() - 1
    }

    /// Label key of an arena level (level 0 is the synthetic root and has
    /// no key).
    pub(crate) fn level_key(&self, level: usize) -> &str {
        &self.spec.levels[level - 1]
    }

    /// Arena level of a flavor level key.
    pub(crate) fn arena_level(&self, key: &str) -> Option<usize> {
        self.spec.level_index(key).map(|idx| idx + 1)
    }
}

fn full_tuple(spec: &FlavorSpec, node: &NodeRecord) -> Option<Vec<String>> {
    spec.levels
        .iter()
        .map(|level| node.label(level).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridfit_core::NodeCondition;

    const BLOCK: &str = "example.com/block";
    const RACK: &str = "example.com/rack";
    const HOST: &str = "kubernetes.io/hostname";

    fn spec() -> FlavorSpec {
        FlavorSpec::new(
            "default",
            vec![BLOCK.to_string(), RACK.to_string(), HOST.to_string()],
        )
    }

    fn node(block: &str, rack: &str, host: &str, cpu_m: u64) -> NodeRecord {
        NodeRecord {
            name: host.to_string(),
            labels: [
                (BLOCK.to_string(), block.to_string()),
                (RACK.to_string(), rack.to_string()),
                (HOST.to_string(), host.to_string()),
            ]
            .into_iter()
            .collect(),
            allocatable: ResourceVec::new().with("cpu", cpu_m),
            conditions: vec![NodeCondition::ready(true)],
        }
    }

    fn values(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn internal_domains_are_deduplicated_per_tuple() {
        let nodes = vec![
            node("b1", "r1", "x1", 1000),
            node("b1", "r1", "x2", 1000),
            node("b1", "r2", "x3", 1000),
        ];
        let snapshot = Snapshot::build(spec(), &nodes, &BTreeMap::new());

        assert_eq!(snapshot.domains_at(1).len(), 1); // b1
        assert_eq!(snapshot.domains_at(2).len(), 2); // r1, r2
        assert_eq!(snapshot.domains_at(3).len(), 3);
    }

    #[test]
    fn free_rolls_up_as_sums() {
        let nodes = vec![
            node("b1", "r1", "x1", 1000),
            node("b1", "r1", "x2", 500),
            node("b1", "r2", "x3", 2000),
        ];
        let snapshot = Snapshot::build(spec(), &nodes, &BTreeMap::new());

        let cpu = "cpu".into();
        assert_eq!(snapshot.free_at(&values(&["b1", "r1"])).unwrap().get(&cpu), 1500);
        assert_eq!(snapshot.free_at(&values(&["b1"])).unwrap().get(&cpu), 3500);
        assert_eq!(snapshot.domain(0).free.get(&cpu), 3500);
    }

    #[test]
    fn leaf_free_nets_out_host_usage() {
        let nodes = vec![node("b1", "r1", "x1", 1000)];
        let usage = [("x1".to_string(), ResourceVec::new().with("cpu", 600))]
            .into_iter()
            .collect();
        let snapshot = Snapshot::build(spec(), &nodes, &usage);

        let free = snapshot.free_at(&values(&["b1", "r1", "x1"])).unwrap();
        assert_eq!(free.get(&"cpu".into()), 400);
    }

    #[test]
    fn leaf_free_floors_at_zero() {
        let nodes = vec![node("b1", "r1", "x1", 1000)];
        let usage = [("x1".to_string(), ResourceVec::new().with("cpu", 2500))]
            .into_iter()
            .collect();
        let snapshot = Snapshot::build(spec(), &nodes, &usage);

        let free = snapshot.free_at(&values(&["b1", "r1", "x1"])).unwrap();
        assert_eq!(free.get(&"cpu".into()), 0);
    }

    #[test]
    fn usage_on_unknown_hosts_is_discarded() {
        let nodes = vec![node("b1", "r1", "x1", 1000)];
        let usage = [("gone".to_string(), ResourceVec::new().with("cpu", 600))]
            .into_iter()
            .collect();
        let snapshot = Snapshot::build(spec(), &nodes, &usage);

        let free = snapshot.free_at(&values(&["b1", "r1", "x1"])).unwrap();
        assert_eq!(free.get(&"cpu".into()), 1000);
    }

    #[test]
    fn nodes_sharing_a_tuple_collapse_into_one_leaf() {
        let two_level = FlavorSpec::new(
            "default",
            vec![BLOCK.to_string(), RACK.to_string()],
        );
        let nodes = vec![
            node("b1", "r1", "x1", 1000),
            node("b1", "r1", "x2", 1000),
        ];
        let snapshot = Snapshot::build(two_level, &nodes, &BTreeMap::new());

        assert_eq!(snapshot.domains_at(2).len(), 1);
        let free = snapshot.free_at(&values(&["b1", "r1"])).unwrap();
        assert_eq!(free.get(&"cpu".into()), 2000);
    }

    #[test]
    fn per_level_lists_are_tuple_ordered() {
        let nodes = vec![
            node("b2", "r1", "x5", 1000),
            node("b1", "r2", "x3", 1000),
            node("b1", "r1", "x1", 1000),
        ];
        let snapshot = Snapshot::build(spec(), &nodes, &BTreeMap::new());

        let racks: Vec<&[String]> = snapshot
            .domains_at(2)
            .iter()
            .map(|&id| snapshot.domain(id).values.as_slice())
            .collect();
        assert_eq!(
            racks,
            vec![
                values(&["b1", "r1"]).as_slice(),
                values(&["b1", "r2"]).as_slice(),
                values(&["b2", "r1"]).as_slice(),
            ]
        );
    }

    #[test]
    fn empty_inventory_is_an_empty_snapshot() {
        let snapshot = Snapshot::build(spec(), &[], &BTreeMap::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.domains_at(0).len(), 1);
    }

    #[test]
    fn parent_values_are_a_prefix_of_child_values() {
        let nodes = vec![node("b1", "r1", "x1", 1000)];
        let snapshot = Snapshot::build(spec(), &nodes, &BTreeMap::new());

        for level in 1..=snapshot.leaf_level() {
            for &id in snapshot.domains_at(level) {
                let domain = snapshot.domain(id);
                let parent = snapshot.domain(domain.parent.unwrap());
                assert_eq!(parent.values[..], domain.values[..domain.values.len() - 1]);
            }
        }
    }
}
