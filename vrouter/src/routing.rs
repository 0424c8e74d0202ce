// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device configuration model: routing blocks, static routes and policy-based routing

use serde::{Deserialize, Serialize};

use crate::bgp::{Bgp, GlobalBgp};
use crate::policy::{PrefixList, RouteMap};

/// How a block is applied on top of the existing device configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Merge,
    Replace,
    Create,
    Delete,
    Remove,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NextHop {
    pub next_hop: String,
    #[serde(rename = "nexthop-l3vrf", default, skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub destination: String,
    #[serde(rename = "next-hop", default)]
    pub next_hops: Vec<NextHop>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRouting {
    #[serde(rename = "ipv4-route", default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4: Vec<StaticRoute>,
    #[serde(rename = "ipv6-route", default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6: Vec<StaticRoute>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    /// table-id of the routing table to look the packet up in
    pub lookup: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Rule {
    pub priority: u32,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<RuleMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyBasedRouting {
    #[serde(rename = "ipv4-rule", default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4: Vec<Rule>,
    #[serde(rename = "ipv6-rule", default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6: Vec<Rule>,
}

/// Routing block of a namespace or of a VRF
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Routing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
    pub statics: Option<StaticRouting>,
    #[serde(rename = "policy-based-routing", default, skip_serializing_if = "Option::is_none")]
    pub pbr: Option<PolicyBasedRouting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgp: Option<Bgp>,
}

/// Device-wide routing block: named policy objects shared by all VRFs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalRouting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(rename = "route-map", default, skip_serializing_if = "Vec::is_empty")]
    pub route_maps: Vec<RouteMap>,
    #[serde(rename = "ipv4-prefix-list", default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_lists_v4: Vec<PrefixList>,
    #[serde(rename = "ipv6-prefix-list", default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_lists_v6: Vec<PrefixList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgp: Option<GlobalBgp>,
}

impl NextHop {
    #[must_use]
    pub fn new(next_hop: &str) -> Self {
        Self {
            next_hop: next_hop.to_owned(),
            vrf: None,
        }
    }
    #[must_use]
    pub fn blackhole() -> Self {
        Self::new("blackhole")
    }
}

impl StaticRoute {
    #[must_use]
    pub fn new(destination: &str, next_hop: NextHop) -> Self {
        Self {
            destination: destination.to_owned(),
            next_hops: vec![next_hop],
        }
    }
}

impl Routing {
    /// An empty block replacing whatever the device had
    #[must_use]
    pub fn replace() -> Self {
        Self {
            operation: Some(Operation::Replace),
            ..Default::default()
        }
    }
    pub fn bgp_mut(&mut self) -> &mut Bgp {
        self.bgp.get_or_insert_with(Bgp::default)
    }
    pub fn statics_mut(&mut self) -> &mut StaticRouting {
        self.statics.get_or_insert_with(StaticRouting::default)
    }
    pub fn pbr_mut(&mut self) -> &mut PolicyBasedRouting {
        self.pbr.get_or_insert_with(PolicyBasedRouting::default)
    }
}

impl GlobalRouting {
    #[must_use]
    pub fn route_map(&self, name: &str) -> Option<&RouteMap> {
        self.route_maps.iter().find(|rmap| rmap.name == name)
    }
    #[must_use]
    pub fn prefix_list_v4(&self, name: &str) -> Option<&PrefixList> {
        self.prefix_lists_v4.iter().find(|plist| plist.name == name)
    }
    #[must_use]
    pub fn prefix_list_v6(&self, name: &str) -> Option<&PrefixList> {
        self.prefix_lists_v6.iter().find(|plist| plist.name == name)
    }
}
