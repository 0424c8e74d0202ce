// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Canonical ordering of a configuration tree.
//!
//! The device does not care about the order of most collections, but a
//! structural comparison does. Canonicalizing orders every collection by its
//! natural key (names, sequence numbers, priorities, addresses) so that two
//! trees describing the same configuration compare equal and serialize to the
//! same bytes. Values are never modified: a sequence keeps its number, only its
//! position changes.

use crate::bgp::{
    AddressFamily, Bgp, Evpn, EvpnExport, EvpnImport, GlobalBgp, Neighbor, NeighborAf,
    NeighborEvpn, NeighborUnicast, Unicast,
};
use crate::interfaces::{Bridge, Interfaces, IpAddressList, Loopback, Physical, Vxlan};
use crate::namespace::{Namespace, VRouter, Vrf};
use crate::policy::{CommunityList, PrefixList, RouteMap, SetCommunity};
use crate::routing::{GlobalRouting, PolicyBasedRouting, Routing, StaticRoute, StaticRouting};

pub trait Canonicalize {
    /// Recursively sort all the collections of self
    fn canonicalize(&mut self);
}

impl<T: Canonicalize> Canonicalize for Option<T> {
    fn canonicalize(&mut self) {
        if let Some(inner) = self {
            inner.canonicalize();
        }
    }
}

impl<T: Canonicalize> Canonicalize for Vec<T> {
    fn canonicalize(&mut self) {
        self.iter_mut().for_each(Canonicalize::canonicalize);
    }
}

/* ===== policy objects ===== */

impl Canonicalize for RouteMap {
    fn canonicalize(&mut self) {
        self.seqs.sort_by_key(|seq| seq.num);
        for set in self.seqs.iter_mut().filter_map(|seq| seq.set.as_mut()) {
            if let Some(SetCommunity::Add(attrs) | SetCommunity::ReplaceBy(attrs)) =
                set.community.as_mut()
            {
                attrs.sort();
            }
        }
    }
}

impl Canonicalize for PrefixList {
    fn canonicalize(&mut self) {
        self.seqs.sort_by_key(|seq| seq.num);
    }
}

impl Canonicalize for CommunityList {
    fn canonicalize(&mut self) {
        self.seqs.sort_by_key(|seq| seq.num);
        for seq in &mut self.seqs {
            seq.communities.sort();
        }
    }
}

impl Canonicalize for GlobalBgp {
    fn canonicalize(&mut self) {
        self.community_lists.sort_by(|a, b| a.name.cmp(&b.name));
        self.community_lists.canonicalize();
    }
}

impl Canonicalize for GlobalRouting {
    fn canonicalize(&mut self) {
        self.route_maps.sort_by(|a, b| a.name.cmp(&b.name));
        self.prefix_lists_v4.sort_by(|a, b| a.name.cmp(&b.name));
        self.prefix_lists_v6.sort_by(|a, b| a.name.cmp(&b.name));
        self.route_maps.canonicalize();
        self.prefix_lists_v4.canonicalize();
        self.prefix_lists_v6.canonicalize();
        self.bgp.canonicalize();
    }
}

/* ===== interfaces ===== */

impl Canonicalize for IpAddressList {
    fn canonicalize(&mut self) {
        self.addresses.sort_by(|a, b| a.ip.cmp(&b.ip));
    }
}

impl Canonicalize for Physical {
    fn canonicalize(&mut self) {
        self.ipv4.canonicalize();
        self.ipv6.canonicalize();
    }
}

impl Canonicalize for Bridge {
    fn canonicalize(&mut self) {
        self.slaves.sort_by(|a, b| a.slave.cmp(&b.slave));
        self.ipv4.canonicalize();
        self.ipv6.canonicalize();
    }
}

impl Canonicalize for Vxlan {
    fn canonicalize(&mut self) {
        self.ipv4.canonicalize();
        self.ipv6.canonicalize();
    }
}

impl Canonicalize for Loopback {
    fn canonicalize(&mut self) {
        self.ipv4.canonicalize();
        self.ipv6.canonicalize();
    }
}

impl Canonicalize for Interfaces {
    fn canonicalize(&mut self) {
        self.physicals.sort_by(|a, b| a.name.cmp(&b.name));
        self.bridges.sort_by(|a, b| a.name.cmp(&b.name));
        self.vxlans.sort_by(|a, b| a.name.cmp(&b.name));
        self.vlans.sort_by(|a, b| a.name.cmp(&b.name));
        self.loopbacks.sort_by(|a, b| a.name.cmp(&b.name));
        self.gres.sort_by(|a, b| a.name.cmp(&b.name));
        self.gretaps.sort_by(|a, b| a.gre.name.cmp(&b.gre.name));
        self.infras.sort_by(|a, b| a.name.cmp(&b.name));
        self.physicals.canonicalize();
        self.bridges.canonicalize();
        self.vxlans.canonicalize();
        self.loopbacks.canonicalize();
    }
}

/* ===== routing ===== */

impl Canonicalize for StaticRoute {
    fn canonicalize(&mut self) {
        self.next_hops.sort();
    }
}

impl Canonicalize for StaticRouting {
    fn canonicalize(&mut self) {
        self.ipv4.canonicalize();
        self.ipv6.canonicalize();
        // same destination: next hops are the second key
        for routes in [&mut self.ipv4, &mut self.ipv6] {
            routes.sort_by(|a, b| {
                (&a.destination, &a.next_hops).cmp(&(&b.destination, &b.next_hops))
            });
        }
    }
}

impl Canonicalize for PolicyBasedRouting {
    fn canonicalize(&mut self) {
        self.ipv4.sort_by_key(|rule| rule.priority);
        self.ipv6.sort_by_key(|rule| rule.priority);
    }
}

/* ===== bgp ===== */

impl Canonicalize for NeighborUnicast {
    fn canonicalize(&mut self) {
        self.route_maps
            .sort_by(|a, b| a.route_map_name.cmp(&b.route_map_name));
        self.prefix_lists
            .sort_by(|a, b| a.prefix_list_name.cmp(&b.prefix_list_name));
    }
}

impl Canonicalize for NeighborEvpn {
    fn canonicalize(&mut self) {
        self.route_maps
            .sort_by(|a, b| a.route_map_name.cmp(&b.route_map_name));
    }
}

impl Canonicalize for NeighborAf {
    fn canonicalize(&mut self) {
        self.ipv4_unicast.canonicalize();
        self.ipv6_unicast.canonicalize();
        self.l2vpn_evpn.canonicalize();
    }
}

impl Canonicalize for Neighbor {
    fn canonicalize(&mut self) {
        self.address_family.canonicalize();
    }
}

impl Canonicalize for Unicast {
    fn canonicalize(&mut self) {
        self.networks.sort_by(|a, b| a.ip_prefix.cmp(&b.ip_prefix));
        self.redistribute.sort_by_key(|redist| redist.protocol);
        if let Some(imports) = &mut self.vrf_import {
            imports.vrfs.sort();
            imports.route_maps.sort();
        }
    }
}

impl Canonicalize for EvpnExport {
    fn canonicalize(&mut self) {
        self.route_targets.sort();
    }
}

impl Canonicalize for EvpnImport {
    fn canonicalize(&mut self) {
        self.route_targets.sort();
    }
}

impl Canonicalize for Evpn {
    fn canonicalize(&mut self) {
        self.vnis.sort_by_key(|vni| vni.vni);
        for vni in &mut self.vnis {
            vni.export.canonicalize();
            vni.import.canonicalize();
        }
        self.export.canonicalize();
        self.import.canonicalize();
    }
}

impl Canonicalize for AddressFamily {
    fn canonicalize(&mut self) {
        self.ipv4_unicast.canonicalize();
        self.ipv6_unicast.canonicalize();
        self.l2vpn_evpn.canonicalize();
    }
}

impl Canonicalize for Bgp {
    fn canonicalize(&mut self) {
        self.neighbor_groups.sort_by(|a, b| a.name.cmp(&b.name));
        self.neighbors
            .sort_by(|a, b| a.neighbor_address.cmp(&b.neighbor_address));
        self.unnumbered_neighbors
            .sort_by(|a, b| a.interface.cmp(&b.interface));
        for group in &mut self.neighbor_groups {
            group.neighbor.canonicalize();
        }
        for neigh in &mut self.neighbors {
            neigh.neighbor.canonicalize();
        }
        for neigh in &mut self.unnumbered_neighbors {
            neigh.neighbor.canonicalize();
        }
        self.address_family.canonicalize();
        if let Some(listen) = &mut self.listen {
            listen.ranges.sort_by(|a, b| a.address.cmp(&b.address));
        }
    }
}

impl Canonicalize for Routing {
    fn canonicalize(&mut self) {
        self.statics.canonicalize();
        self.pbr.canonicalize();
        self.bgp.canonicalize();
    }
}

/* ===== tree ===== */

impl Canonicalize for Vrf {
    fn canonicalize(&mut self) {
        self.interfaces.canonicalize();
        self.routing.canonicalize();
    }
}

impl Canonicalize for Namespace {
    fn canonicalize(&mut self) {
        self.vrfs.sort_by(|a, b| a.name.cmp(&b.name));
        self.vrfs.canonicalize();
        self.routing.canonicalize();
        self.interfaces.canonicalize();
    }
}

impl Canonicalize for VRouter {
    fn canonicalize(&mut self) {
        self.namespaces.sort_by(|a, b| a.name.cmp(&b.name));
        self.namespaces.canonicalize();
        self.routing.canonicalize();
    }
}

impl VRouter {
    #[must_use]
    pub fn canonicalized(mut self) -> Self {
        self.canonicalize();
        self
    }
    /// Tell if two trees describe the same configuration, regardless of the
    /// order of their collections.
    #[must_use]
    pub fn canonical_eq(&self, other: &VRouter) -> bool {
        self.clone().canonicalized() == other.clone().canonicalized()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use crate::bgp::{Direction, NeighborIp, NeighborRouteMap};
    use crate::interfaces::BridgeSlave;
    use crate::policy::{RouteMapSeq, RouteMapSet};
    use crate::routing::NextHop;
    use pretty_assertions::assert_eq;

    fn rmap(name: &str, nums: &[u32]) -> RouteMap {
        RouteMap {
            name: name.to_string(),
            seqs: nums.iter().map(|n| RouteMapSeq::permit(*n)).collect(),
        }
    }

    fn tree(rmaps: Vec<RouteMap>, vrfs: &[&str]) -> VRouter {
        let mut ns = Namespace::new("hbn");
        for name in vrfs {
            ns.vrfs.push(Vrf {
                name: (*name).to_string(),
                ..Default::default()
            });
        }
        VRouter {
            namespaces: vec![ns],
            routing: Some(GlobalRouting {
                route_maps: rmaps,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_route_map_seqs_sorted_and_kept() {
        let mut rmap = rmap("rm_m2m_import", &[65535, 10, 2, 11, 1]);
        rmap.canonicalize();
        let nums: Vec<u32> = rmap.seqs.iter().map(|s| s.num).collect();
        assert_eq!(nums, vec![1, 2, 10, 11, 65535]);
    }

    #[test]
    fn test_set_community_attrs_sorted() {
        let mut rmap = RouteMap::new("rm_x");
        rmap.seqs.push(RouteMapSeq::permit(10).set_set(RouteMapSet {
            community: Some(SetCommunity::Add(vec![
                "65169:300".to_string(),
                "65169:200".to_string(),
            ])),
            ..Default::default()
        }));
        rmap.canonicalize();
        let set = rmap.seqs[0].set.as_ref().unwrap();
        assert_eq!(
            set.community,
            Some(SetCommunity::Add(vec![
                "65169:200".to_string(),
                "65169:300".to_string()
            ]))
        );
    }

    #[test]
    fn test_ipv6_addresses_sorted() {
        let mut br = Bridge {
            name: "l2.501".to_string(),
            slaves: vec![
                BridgeSlave {
                    slave: "vx.4000002".to_string(),
                    ..Default::default()
                },
                BridgeSlave {
                    slave: "vlan.501".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut v6 = IpAddressList::default();
        v6.push("fd94::2/64");
        v6.push("fd94::1/64");
        br.ipv6 = Some(v6);
        br.canonicalize();
        let ips: Vec<&str> = br
            .ipv6
            .as_ref()
            .unwrap()
            .addresses
            .iter()
            .map(|a| a.ip.as_str())
            .collect();
        assert_eq!(ips, vec!["fd94::1/64", "fd94::2/64"]);
        assert_eq!(br.slaves[0].slave, "vlan.501");
    }

    #[test]
    fn test_neighbor_route_maps_sorted() {
        let mut bgp = Bgp::default();
        let mut neigh = NeighborIp {
            neighbor_address: "192.0.2.2".to_string(),
            ..Default::default()
        };
        neigh.neighbor.af_mut().ipv4_unicast = Some(NeighborUnicast {
            route_maps: vec![
                NeighborRouteMap::new("TAG-FABRIC-IN", Direction::In),
                NeighborRouteMap::new("DENY-TAG-FABRIC-OUT", Direction::Out),
            ],
            ..Default::default()
        });
        bgp.neighbors.push(neigh);
        bgp.neighbors.push(NeighborIp {
            neighbor_address: "192.0.2.1".to_string(),
            ..Default::default()
        });
        bgp.canonicalize();
        assert_eq!(bgp.neighbors[0].neighbor_address, "192.0.2.1");
        let af = bgp.neighbors[1].neighbor.address_family.as_ref().unwrap();
        let ucast = af.ipv4_unicast.as_ref().unwrap();
        assert_eq!(ucast.route_maps[0].route_map_name, "DENY-TAG-FABRIC-OUT");
    }

    #[test]
    fn test_static_routes_sorted_by_next_hop() {
        let via = |nh: &str| StaticRoute::new("0.0.0.0/0", NextHop::new(nh));
        let mut statics = StaticRouting {
            ipv4: vec![
                via("10.250.4.2"),
                StaticRoute::new("10.9.0.0/16", NextHop::blackhole()),
                via("10.250.4.1"),
            ],
            ipv6: vec![],
        };
        statics.canonicalize();
        let order: Vec<(&str, &str)> = statics
            .ipv4
            .iter()
            .map(|r| (r.destination.as_str(), r.next_hops[0].next_hop.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("0.0.0.0/0", "10.250.4.1"),
                ("0.0.0.0/0", "10.250.4.2"),
                ("10.9.0.0/16", "blackhole"),
            ]
        );
    }

    #[test]
    fn test_canonical_eq_ignores_order() {
        let a = tree(vec![rmap("b", &[20, 10]), rmap("a", &[5])], &["m2m", "cluster"]);
        let b = tree(vec![rmap("a", &[5]), rmap("b", &[10, 20])], &["cluster", "m2m"]);
        assert_ne!(a, b);
        assert!(a.canonical_eq(&b));
        assert_eq!(a.clone().canonicalized(), b.clone().canonicalized());
        assert_eq!(
            a.canonicalized().to_yaml().unwrap(),
            b.canonicalized().to_yaml().unwrap()
        );
    }

    #[test]
    fn test_canonical_eq_detects_changes() {
        let a = tree(vec![rmap("a", &[5])], &["m2m"]);
        let b = tree(vec![rmap("a", &[6])], &["m2m"]);
        assert!(!a.canonical_eq(&b));
    }
}
