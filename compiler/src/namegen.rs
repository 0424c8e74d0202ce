// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Deterministic naming of the objects the compiler creates. Identical inputs
//! always yield identical names, which is what makes the named policy objects
//! merge across call sites and recompilations.

use sha2::{Digest, Sha256};
use std::fmt::Write;

pub const BRIDGE_PREFIX: &str = "br.";
pub const VXLAN_PREFIX: &str = "vx.";
pub const L2_SVI_PREFIX: &str = "l2.";
pub const VLAN_PREFIX: &str = "vlan.";
pub const UNDERLAY_INTERFACE: &str = "dum.underlay";
pub const MAX_VRF_NAME_LEN: usize = 12;

/* well-known policy objects */
pub const PL_EXPORT_BASE: &str = "pl_export_base";
pub const PL_LINK_LOCAL: &str = "pl_link_local";
pub const PL_ANY: &str = "ANY";
pub const PL_DEFAULT: &str = "DEFAULT";
pub const CM_RECEIVED_FABRIC: &str = "cm-received-fabric";
pub const RM_TAG_FABRIC_IN: &str = "TAG-FABRIC-IN";
pub const RM_DENY_TAG_FABRIC_OUT: &str = "DENY-TAG-FABRIC-OUT";
pub const RM_EXPORT_LOCAL: &str = "rm_export_local";

/// Number of hex characters kept from the digest
const HASH_LEN: usize = 8;

/// Short stable identifier of a string: the first 8 hex characters of its sha256.
/// Collisions between distinct inputs are not detected.
#[must_use]
pub fn hash(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    let mut out = String::with_capacity(HASH_LEN);
    for byte in digest.iter().take(HASH_LEN / 2) {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[must_use]
pub fn bridge(vrf: &str) -> String {
    format!("{BRIDGE_PREFIX}{vrf}")
}
#[must_use]
pub fn vrf_vxlan(vrf: &str) -> String {
    format!("{VXLAN_PREFIX}{vrf}")
}
#[must_use]
pub fn l2_bridge(vlan: u16) -> String {
    format!("{L2_SVI_PREFIX}{vlan}")
}
#[must_use]
pub fn l2_vxlan(vni: u32) -> String {
    format!("{VXLAN_PREFIX}{vni}")
}
#[must_use]
pub fn vlan(vlan: u16) -> String {
    format!("{VLAN_PREFIX}{vlan}")
}

/// Route-map compiled from the filter named `name`
#[must_use]
pub fn route_map(name: &str) -> String {
    format!("rm_{name}")
}
#[must_use]
pub fn filter_prefix_list(name: &str, index: usize) -> String {
    format!("pl_{name}_{index}")
}
#[must_use]
pub fn filter_community_list(name: &str, index: usize) -> String {
    format!("cm_{name}_{index}")
}
#[must_use]
pub fn filter_remove_community_list(name: &str, index: usize) -> String {
    format!("cm_remove_{name}_{index}")
}

/// The import route-map of a VRF, chaining the per-source route-maps
#[must_use]
pub fn import_route_map(vrf: &str) -> String {
    route_map(&format!("{vrf}_import"))
}
/// Filter name of the routes imported into `vrf` from `from`
#[must_use]
pub fn import_filter(vrf: &str, from: &str) -> String {
    format!("{vrf}_import_{from}")
}
#[must_use]
pub fn export_filter(vrf: &str) -> String {
    format!("{vrf}_export")
}
#[must_use]
pub fn redistribute_connected_filter(vrf: &str) -> String {
    format!("{vrf}_redist_connected")
}
#[must_use]
pub fn redistribute_static_filter(vrf: &str) -> String {
    format!("{vrf}_redist_static")
}

/// Direction of a peer filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterDirection {
    In,
    Out,
}

/// Filter name of a peer, scoped by VRF: `<vrf>_<hash>-ipv<4|6>-<in|out>`
#[must_use]
pub fn peer_filter(vrf: &str, peer: &str, ipv6: bool, direction: FilterDirection) -> String {
    let family = if ipv6 { "ipv6" } else { "ipv4" };
    let direction = match direction {
        FilterDirection::In => "in",
        FilterDirection::Out => "out",
    };
    format!("{vrf}_{peer}-{family}-{direction}")
}
