// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device configuration model: BGP

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::policy::CommunityList;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Connected,
    Static,
    Kernel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultipathRelax {
    AsSet,
    NoAsSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Bfd,
}

/// Device-wide BGP objects
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalBgp {
    #[serde(rename = "community-list", default, skip_serializing_if = "Vec::is_empty")]
    pub community_lists: Vec<CommunityList>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborRange {
    pub address: String,
    pub neighbor_group: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Listen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "neighbor-range", default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<NeighborRange>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BestpathAsPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confederation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multipath_relax: Option<MultipathRelax>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bestpath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_path: Option<BestpathAsPath>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Network {
    pub ip_prefix: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Redistribute {
    pub protocol: Protocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map: Option<String>,
}

/// VRF route leaking
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfImport {
    #[serde(rename = "l3vrf", default, skip_serializing_if = "Vec::is_empty")]
    pub vrfs: Vec<String>,
    #[serde(rename = "route-map", default, skip_serializing_if = "Vec::is_empty")]
    pub route_maps: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Unicast {
    #[serde(rename = "network", default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,
    #[serde(rename = "redistribute", default, skip_serializing_if = "Vec::is_empty")]
    pub redistribute: Vec<Redistribute>,
    #[serde(rename = "l3vrf-import", default, skip_serializing_if = "Option::is_none")]
    pub vrf_import: Option<VrfImport>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvpnExport {
    #[serde(rename = "route-target", default, skip_serializing_if = "Vec::is_empty")]
    pub route_targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_distinguisher: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvpnImport {
    #[serde(rename = "route-target", default, skip_serializing_if = "Vec::is_empty")]
    pub route_targets: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdvertiseUnicast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Advertisement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_unicast: Option<AdvertiseUnicast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_unicast: Option<AdvertiseUnicast>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvpnVni {
    pub vni: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<EvpnExport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<EvpnImport>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Evpn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_all_vni: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertisement: Option<Advertisement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<EvpnExport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<EvpnImport>,
    #[serde(rename = "vni", default, skip_serializing_if = "Vec::is_empty")]
    pub vnis: Vec<EvpnVni>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddressFamily {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_unicast: Option<Unicast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_unicast: Option<Unicast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2vpn_evpn: Option<Evpn>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborRouteMap {
    pub route_map_name: String,
    pub route_direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborPrefixList {
    pub prefix_list_name: String,
    pub update_direction: Direction,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MaximumPrefix {
    pub maximum: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_only: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborUnicast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowas_in: Option<u8>,
    #[serde(rename = "route-map", default, skip_serializing_if = "Vec::is_empty")]
    pub route_maps: Vec<NeighborRouteMap>,
    #[serde(rename = "prefix-list", default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_lists: Vec<NeighborPrefixList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_prefix: Option<MaximumPrefix>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborEvpn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowas_in: Option<u8>,
    #[serde(rename = "route-map", default, skip_serializing_if = "Vec::is_empty")]
    pub route_maps: Vec<NeighborRouteMap>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborAf {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_unicast: Option<NeighborUnicast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_unicast: Option<NeighborUnicast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2vpn_evpn: Option<NeighborEvpn>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalAs {
    pub as_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_prepend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_as: Option<bool>,
}

/// Timers, in seconds
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Timers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertisement_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_retry: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepalive_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_time: Option<u32>,
}

/// Session settings shared by all kinds of neighbors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Neighbor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_first_as: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_as: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_as: Option<LocalAs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timers: Option<Timers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_family: Option<NeighborAf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_multihop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_security_hops: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Track>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborGroup {
    pub name: String,
    #[serde(flatten)]
    pub neighbor: Neighbor,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborIp {
    pub neighbor_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbor_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(flatten)]
    pub neighbor: Neighbor,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborIf {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbor_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_only: Option<bool>,
    #[serde(flatten)]
    pub neighbor: Neighbor,
}

/// A BGP instance, in the default namespace or in a VRF
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bgp {
    #[serde(rename = "as", default)]
    pub asn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_id: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_duplicates: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebgp_requires_policy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l3vni: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<Listen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_family: Option<AddressFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bestpath: Option<Bestpath>,
    #[serde(rename = "neighbor-group", default, skip_serializing_if = "Vec::is_empty")]
    pub neighbor_groups: Vec<NeighborGroup>,
    #[serde(rename = "neighbor", default, skip_serializing_if = "Vec::is_empty")]
    pub neighbors: Vec<NeighborIp>,
    #[serde(rename = "unnumbered-neighbor", default, skip_serializing_if = "Vec::is_empty")]
    pub unnumbered_neighbors: Vec<NeighborIf>,
}

/* ===== impls: Builders ===== */
impl Redistribute {
    #[must_use]
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            route_map: None,
        }
    }
}

impl Unicast {
    /// Unicast AF of a VRF: redistribute connected and static routes and
    /// import other VRFs through the given route-map
    #[must_use]
    pub fn vrf_default(import_rmap: &str) -> Self {
        Self {
            networks: vec![],
            redistribute: vec![
                Redistribute::new(Protocol::Connected),
                Redistribute::new(Protocol::Static),
            ],
            vrf_import: Some(VrfImport {
                vrfs: vec![],
                route_maps: vec![import_rmap.to_owned()],
            }),
        }
    }
    pub fn add_imported_vrf(&mut self, vrf: &str) {
        self.vrf_import
            .get_or_insert_with(VrfImport::default)
            .vrfs
            .push(vrf.to_owned());
    }
    pub fn set_redistribute_route_map(&mut self, protocol: Protocol, rmap: Option<&str>) {
        for redist in self.redistribute.iter_mut().filter(|r| r.protocol == protocol) {
            redist.route_map = rmap.map(str::to_owned);
        }
    }
}

impl Advertisement {
    /// Advertise both unicast families through the same route-map
    #[must_use]
    pub fn with_route_map(rmap: &str) -> Self {
        Self {
            ipv4_unicast: Some(AdvertiseUnicast {
                route_map: Some(rmap.to_owned()),
            }),
            ipv6_unicast: Some(AdvertiseUnicast {
                route_map: Some(rmap.to_owned()),
            }),
        }
    }
}

impl EvpnExport {
    #[must_use]
    pub fn new(route_targets: Vec<String>) -> Self {
        Self {
            route_targets,
            route_distinguisher: None,
        }
    }
}

impl EvpnImport {
    #[must_use]
    pub fn new(route_targets: Vec<String>) -> Self {
        Self { route_targets }
    }
}

impl NeighborRouteMap {
    #[must_use]
    pub fn new(name: &str, direction: Direction) -> Self {
        Self {
            route_map_name: name.to_owned(),
            route_direction: direction,
        }
    }
}

impl NeighborPrefixList {
    #[must_use]
    pub fn new(name: &str, direction: Direction) -> Self {
        Self {
            prefix_list_name: name.to_owned(),
            update_direction: direction,
        }
    }
}

impl Neighbor {
    pub fn af_mut(&mut self) -> &mut NeighborAf {
        self.address_family.get_or_insert_with(NeighborAf::default)
    }
}

impl Bgp {
    pub fn af_mut(&mut self) -> &mut AddressFamily {
        self.address_family.get_or_insert_with(AddressFamily::default)
    }
    /// Unicast address families that are configured
    pub fn unicast_mut(&mut self) -> impl Iterator<Item = &mut Unicast> {
        self.address_family
            .iter_mut()
            .flat_map(|af| [af.ipv4_unicast.as_mut(), af.ipv6_unicast.as_mut()])
            .flatten()
    }
    #[must_use]
    pub fn neighbor(&self, address: &str) -> Option<&NeighborIp> {
        self.neighbors.iter().find(|n| n.neighbor_address == address)
    }
    #[must_use]
    pub fn unnumbered_neighbor(&self, interface: &str) -> Option<&NeighborIf> {
        self.unnumbered_neighbors.iter().find(|n| n.interface == interface)
    }
    #[must_use]
    pub fn neighbor_group(&self, name: &str) -> Option<&NeighborGroup> {
        self.neighbor_groups.iter().find(|n| n.name == name)
    }
}
