// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Per-node network intent

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::errors::IntentError;
use crate::filter::Filter;

/// Anycast gateway (integrated routing and bridging) of a layer-2 segment
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Irb {
    pub vrf: Option<String>,
    pub mac_address: Option<String>,
    pub ip_addresses: Vec<String>,
}

/// A layer-2 segment: a VLAN on the trunk stretched over a VXLAN VNI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer2 {
    pub vni: u32,
    pub vlan: u16,
    pub mtu: u32,
    #[serde(default)]
    pub route_target: Option<String>,
    #[serde(default)]
    pub irb: Option<Irb>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressFamily {
    pub import_filter: Option<Filter>,
    pub export_filter: Option<Filter>,
    pub max_prefixes: Option<u32>,
}

/// A BGP peer declared in a VRF. A peer is either a single address or a range
/// of addresses from which sessions are accepted (dynamic neighbors).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BgpPeer {
    pub address: Option<String>,
    pub listen_range: Option<String>,
    #[serde(rename = "remoteASN")]
    pub remote_asn: u32,
    pub ipv4: Option<AddressFamily>,
    pub ipv6: Option<AddressFamily>,
    /// seconds
    pub hold_time: Option<u32>,
    /// seconds
    pub keepalive_time: Option<u32>,
    pub multihop: Option<u8>,
}

impl BgpPeer {
    /// The string identifying the peer: its address or its listen range.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.address.as_deref().or(self.listen_range.as_deref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextHop {
    pub address: Option<String>,
    pub vrf: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRoute {
    pub prefix: String,
    #[serde(default)]
    pub next_hop: Option<NextHop>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrafficMatch {
    pub src_prefix: Option<String>,
    pub dst_prefix: Option<String>,
}

/// Source/destination based redirection of traffic entering from the trunk
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyRoute {
    pub traffic_match: TrafficMatch,
    pub next_hop: NextHop,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VrfImport {
    #[serde(rename = "fromVRF")]
    pub from_vrf: String,
    pub filter: Filter,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Redistribute {
    pub connected: Option<Filter>,
    #[serde(rename = "static")]
    pub static_: Option<Filter>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Loopback {
    pub ip_addresses: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreLayer {
    Layer2,
    #[default]
    Layer3,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreTunnel {
    #[serde(default)]
    pub layer: GreLayer,
    #[serde(default)]
    pub source_address: Option<String>,
    pub destination_address: String,
    #[serde(default)]
    pub encapsulation_key: Option<u32>,
}

/// Everything a VRF may declare, regardless of its kind
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vrf {
    pub loopbacks: BTreeMap<String, Loopback>,
    #[serde(rename = "greTunnels")]
    pub gre_tunnels: BTreeMap<String, GreTunnel>,
    pub bgp_peers: Vec<BgpPeer>,
    #[serde(rename = "vrfImports")]
    pub vrf_imports: Vec<VrfImport>,
    pub static_routes: Vec<StaticRoute>,
    pub policy_routes: Vec<PolicyRoute>,
    pub redistribute: Option<Redistribute>,
}

/// A VRF stretched over the fabric with EVPN type-5 routes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricVrf {
    #[serde(flatten)]
    pub vrf: Vrf,
    pub vni: u32,
    #[serde(default)]
    pub evpn_import_route_targets: Vec<String>,
    #[serde(default)]
    pub evpn_export_route_targets: Vec<String>,
    #[serde(default)]
    pub evpn_export_filter: Option<Filter>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeIntent {
    pub layer2s: Vec<Layer2>,
    #[serde(rename = "fabricVRFs")]
    pub fabric_vrfs: BTreeMap<String, FabricVrf>,
    #[serde(rename = "localVRFs")]
    pub local_vrfs: BTreeMap<String, Vrf>,
    #[serde(rename = "clusterVRF")]
    pub cluster_vrf: Option<Vrf>,
}

impl NodeIntent {
    pub fn from_yaml(yaml: &str) -> Result<Self, IntentError> {
        let intent: NodeIntent = serde_yaml_ng::from_str(yaml)?;
        debug!(
            "Loaded node intent: {} layer2s, {} fabric VRFs, {} local VRFs",
            intent.layer2s.len(),
            intent.fabric_vrfs.len(),
            intent.local_vrfs.len()
        );
        Ok(intent)
    }

    /// Tell if a VRF is declared, either as fabric or as local VRF.
    #[must_use]
    pub fn declares_vrf(&self, name: &str) -> bool {
        self.fabric_vrfs.contains_key(name) || self.local_vrfs.contains_key(name)
    }
}
