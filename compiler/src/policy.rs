// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Registry of the named policy objects (route-maps, prefix-lists, community-lists)
//! built during one compilation. Entries upserted under an existing name extend
//! that object, in the order they are given.

use ordermap::OrderMap;
use tracing::debug;

use vrouter::bgp::GlobalBgp;
use vrouter::policy::{
    CommunityList, CommunityListSeq, PrefixList, PrefixListSeq, RouteMap, RouteMapSeq,
};
use vrouter::{GlobalRouting, Operation};

use crate::addressing::IpFamily;
use crate::errors::{CompileError, CompileResult};

/// A sequence entry of a named policy object
pub trait Sequenced {
    fn seq(&self) -> u32;
}

/// A named policy object made of sequence entries
pub trait NamedObject {
    type Entry: Sequenced;
    const KIND: &'static str;
    fn with_name(name: &str) -> Self;
    fn entries_mut(&mut self) -> &mut Vec<Self::Entry>;
}

impl Sequenced for RouteMapSeq {
    fn seq(&self) -> u32 {
        self.num
    }
}
impl Sequenced for PrefixListSeq {
    fn seq(&self) -> u32 {
        self.num
    }
}
impl Sequenced for CommunityListSeq {
    fn seq(&self) -> u32 {
        self.num
    }
}

impl NamedObject for RouteMap {
    type Entry = RouteMapSeq;
    const KIND: &'static str = "route-map";
    fn with_name(name: &str) -> Self {
        RouteMap::new(name)
    }
    fn entries_mut(&mut self) -> &mut Vec<RouteMapSeq> {
        &mut self.seqs
    }
}
impl NamedObject for PrefixList {
    type Entry = PrefixListSeq;
    const KIND: &'static str = "prefix-list";
    fn with_name(name: &str) -> Self {
        PrefixList::new(name)
    }
    fn entries_mut(&mut self) -> &mut Vec<PrefixListSeq> {
        &mut self.seqs
    }
}
impl NamedObject for CommunityList {
    type Entry = CommunityListSeq;
    const KIND: &'static str = "community-list";
    fn with_name(name: &str) -> Self {
        CommunityList::new(name)
    }
    fn entries_mut(&mut self) -> &mut Vec<CommunityListSeq> {
        &mut self.seqs
    }
}

/// Find or create object `name` and append `entries` to it. A sequence number
/// already present in the object is an intent conflict.
fn upsert<O: NamedObject>(
    objects: &mut OrderMap<String, O>,
    name: &str,
    entries: impl IntoIterator<Item = O::Entry>,
) -> CompileResult<()> {
    let object = objects
        .entry(name.to_owned())
        .or_insert_with(|| O::with_name(name));
    let current = object.entries_mut();
    for entry in entries {
        let seq = entry.seq();
        if current.iter().any(|e| e.seq() == seq) {
            return Err(CompileError::DuplicateSequence {
                object: format!("{} {name}", O::KIND),
                seq,
            }
            .logged());
        }
        current.push(entry);
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct PolicyRegistry {
    route_maps: OrderMap<String, RouteMap>,
    prefix_lists_v4: OrderMap<String, PrefixList>,
    prefix_lists_v6: OrderMap<String, PrefixList>,
    community_lists: OrderMap<String, CommunityList>,
}

impl PolicyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    pub fn upsert_route_map(
        &mut self,
        name: &str,
        seqs: impl IntoIterator<Item = RouteMapSeq>,
    ) -> CompileResult<()> {
        upsert(&mut self.route_maps, name, seqs)
    }
    pub fn upsert_prefix_list(
        &mut self,
        family: IpFamily,
        name: &str,
        seqs: impl IntoIterator<Item = PrefixListSeq>,
    ) -> CompileResult<()> {
        match family {
            IpFamily::V4 => upsert(&mut self.prefix_lists_v4, name, seqs),
            IpFamily::V6 => upsert(&mut self.prefix_lists_v6, name, seqs),
        }
    }
    pub fn upsert_community_list(
        &mut self,
        name: &str,
        seqs: impl IntoIterator<Item = CommunityListSeq>,
    ) -> CompileResult<()> {
        upsert(&mut self.community_lists, name, seqs)
    }

    #[must_use]
    pub fn route_map(&self, name: &str) -> Option<&RouteMap> {
        self.route_maps.get(name)
    }
    #[must_use]
    pub fn prefix_list(&self, family: IpFamily, name: &str) -> Option<&PrefixList> {
        match family {
            IpFamily::V4 => self.prefix_lists_v4.get(name),
            IpFamily::V6 => self.prefix_lists_v6.get(name),
        }
    }
    #[must_use]
    pub fn community_list(&self, name: &str) -> Option<&CommunityList> {
        self.community_lists.get(name)
    }

    /// The device-wide routing block holding all the objects, in creation order
    #[must_use]
    pub fn into_global_routing(self) -> GlobalRouting {
        debug!(
            "Global policies: {} route-maps, {} prefix-lists, {} community-lists",
            self.route_maps.len(),
            self.prefix_lists_v4.len() + self.prefix_lists_v6.len(),
            self.community_lists.len()
        );
        GlobalRouting {
            operation: Some(Operation::Replace),
            route_maps: self.route_maps.into_values().collect(),
            prefix_lists_v4: self.prefix_lists_v4.into_values().collect(),
            prefix_lists_v6: self.prefix_lists_v6.into_values().collect(),
            bgp: Some(GlobalBgp {
                community_lists: self.community_lists.into_values().collect(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vrouter::policy::MatchingPolicy;

    #[test]
    fn test_upsert_merges_by_name() {
        let mut registry = PolicyRegistry::new();
        registry
            .upsert_route_map("rm_m2m_import", [RouteMapSeq::permit(10)])
            .unwrap();
        registry
            .upsert_route_map("rm_s2s_import", [RouteMapSeq::permit(10)])
            .unwrap();
        registry
            .upsert_route_map("rm_m2m_import", [RouteMapSeq::permit(12), RouteMapSeq::deny(11)])
            .unwrap();

        let rmap = registry.route_map("rm_m2m_import").unwrap();
        let nums: Vec<u32> = rmap.seqs.iter().map(|s| s.num).collect();
        assert_eq!(nums, vec![10, 12, 11]);

        let global = registry.into_global_routing();
        assert_eq!(global.operation, Some(Operation::Replace));
        let names: Vec<&str> = global.route_maps.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rm_m2m_import", "rm_s2s_import"]);
    }

    #[test]
    fn test_prefix_lists_are_per_family() {
        let mut registry = PolicyRegistry::new();
        let seq = PrefixListSeq::new(5, MatchingPolicy::Permit);
        registry
            .upsert_prefix_list(IpFamily::V4, "ANY", [seq.clone()])
            .unwrap();
        registry
            .upsert_prefix_list(IpFamily::V6, "ANY", [seq])
            .unwrap();
        assert!(registry.prefix_list(IpFamily::V4, "ANY").is_some());
        assert!(registry.prefix_list(IpFamily::V6, "ANY").is_some());
        assert!(registry.prefix_list(IpFamily::V6, "DEFAULT").is_none());
    }

    #[test]
    fn test_duplicate_sequence() {
        let mut registry = PolicyRegistry::new();
        let seq = CommunityListSeq::new(5, MatchingPolicy::Permit, vec!["65169:200".into()]);
        registry
            .upsert_community_list("cm-received-fabric", [seq.clone()])
            .unwrap();
        assert_eq!(
            registry.upsert_community_list("cm-received-fabric", [seq]),
            Err(CompileError::DuplicateSequence {
                object: "community-list cm-received-fabric".to_string(),
                seq: 5
            })
        );
        assert_eq!(registry.community_list("cm-received-fabric").unwrap().seqs.len(), 1);
    }
}
