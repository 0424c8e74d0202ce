// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device configuration model: interfaces

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressList {
    #[serde(rename = "address", default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<IpAddress>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ethernet {
    pub mac_address: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressGenMode {
    NoLinkLocal,
    Eui64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptDad {
    Never,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArpAccept {
    Never,
    Always,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkStackV4 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp_accept_gratuitous: Option<ArpAccept>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkStackV6 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_generation_mode: Option<AddressGenMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_duplicate_address_detection: Option<AcceptDad>,
}

/// Neighbor table base reachable times, in milliseconds
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NeighborStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_base_reachable_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_base_reachable_time: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<NetworkStackV4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<NetworkStackV6>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbor: Option<NeighborStack>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Physical {
    pub name: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpAddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpAddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_stack: Option<NetworkStack>,
}

/// A port enslaved to a bridge, referenced by interface name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeSlave {
    pub slave: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbor_suppress: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hairpin: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bridge {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<Ethernet>,
    #[serde(rename = "link-interface", default, skip_serializing_if = "Vec::is_empty")]
    pub slaves: Vec<BridgeSlave>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpAddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpAddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_stack: Option<NetworkStack>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vxlan {
    pub name: String,
    pub vni: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    /// UDP destination port
    #[serde(rename = "dst", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<Ethernet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpAddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpAddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_stack: Option<NetworkStack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_interface: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vlan {
    pub name: String,
    pub vlan_id: u16,
    pub link_interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_stack: Option<NetworkStack>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loopback {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpAddressList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpAddressList>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Gre {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    /// Key used for both directions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_both: Option<u32>,
}

/// Ethernet over GRE
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreTap {
    #[serde(flatten)]
    pub gre: Gre,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infrastructure {
    pub name: String,
}

/// The interface set of a namespace or of a VRF
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interfaces {
    #[serde(rename = "physical", default, skip_serializing_if = "Vec::is_empty")]
    pub physicals: Vec<Physical>,
    #[serde(rename = "bridge", default, skip_serializing_if = "Vec::is_empty")]
    pub bridges: Vec<Bridge>,
    #[serde(rename = "vxlan", default, skip_serializing_if = "Vec::is_empty")]
    pub vxlans: Vec<Vxlan>,
    #[serde(rename = "vlan", default, skip_serializing_if = "Vec::is_empty")]
    pub vlans: Vec<Vlan>,
    #[serde(rename = "loopback", default, skip_serializing_if = "Vec::is_empty")]
    pub loopbacks: Vec<Loopback>,
    #[serde(rename = "gre", default, skip_serializing_if = "Vec::is_empty")]
    pub gres: Vec<Gre>,
    #[serde(rename = "gretap", default, skip_serializing_if = "Vec::is_empty")]
    pub gretaps: Vec<GreTap>,
    #[serde(rename = "infrastructure", default, skip_serializing_if = "Vec::is_empty")]
    pub infras: Vec<Infrastructure>,
}

impl IpAddress {
    #[must_use]
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.to_owned(),
            peer: None,
        }
    }
}

impl IpAddressList {
    pub fn push(&mut self, ip: &str) {
        self.addresses.push(IpAddress::new(ip));
    }
    /// `None` when there is no address, so that empty lists are not rendered
    #[must_use]
    pub fn into_option(self) -> Option<Self> {
        if self.addresses.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl NetworkStack {
    /// Stack with IPv6 link-local address generation disabled
    #[must_use]
    pub fn no_link_local() -> Self {
        Self {
            ipv6: Some(NetworkStackV6 {
                address_generation_mode: Some(AddressGenMode::NoLinkLocal),
                accept_duplicate_address_detection: None,
            }),
            ..Default::default()
        }
    }
    pub fn ipv6_mut(&mut self) -> &mut NetworkStackV6 {
        self.ipv6.get_or_insert_with(NetworkStackV6::default)
    }
}

impl Interfaces {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
    #[must_use]
    pub fn has_infrastructure(&self, name: &str) -> bool {
        self.infras.iter().any(|infra| infra.name == name)
    }
    #[must_use]
    pub fn bridge(&self, name: &str) -> Option<&Bridge> {
        self.bridges.iter().find(|br| br.name == name)
    }
    #[must_use]
    pub fn vxlan(&self, name: &str) -> Option<&Vxlan> {
        self.vxlans.iter().find(|vx| vx.name == name)
    }
    #[must_use]
    pub fn vlan(&self, name: &str) -> Option<&Vlan> {
        self.vlans.iter().find(|vlan| vlan.name == name)
    }
}
