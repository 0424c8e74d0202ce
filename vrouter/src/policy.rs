// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device configuration model: route maps, prefix lists and community lists.
//! These objects are global to the device and are referenced by name from the
//! per-VRF BGP configurations.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingPolicy {
    #[default]
    Permit,
    Deny,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrefixListSeq {
    pub num: u32,
    pub policy: MatchingPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixList {
    pub name: String,
    #[serde(rename = "seq", default, skip_serializing_if = "Vec::is_empty")]
    pub seqs: Vec<PrefixListSeq>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityListSeq {
    #[serde(rename = "priority")]
    pub num: u32,
    pub policy: MatchingPolicy,
    #[serde(rename = "community", default, skip_serializing_if = "Vec::is_empty")]
    pub communities: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityList {
    pub name: String,
    #[serde(rename = "policy", default, skip_serializing_if = "Vec::is_empty")]
    pub seqs: Vec<CommunityListSeq>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatchCommunity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatchAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_len: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteMapMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<MatchCommunity>,
    #[serde(rename = "ip", default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<MatchAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<MatchAddress>,
    #[serde(rename = "source-l3vrf", default, skip_serializing_if = "Option::is_none")]
    pub source_vrf: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetCommunity {
    None,
    ReplaceBy(Vec<String>),
    Add(Vec<String>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetIpv4 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_next_hop: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteMapSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<SetIpv4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_preference: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<SetCommunity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comm_list_delete: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMatch {
    Next,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteMapSeq {
    pub num: u32,
    pub policy: MatchingPolicy,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<RouteMapMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<RouteMapSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_match: Option<OnMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMap {
    pub name: String,
    #[serde(rename = "seq", default, skip_serializing_if = "Vec::is_empty")]
    pub seqs: Vec<RouteMapSeq>,
}

/* Impl basic ops */
impl PrefixListSeq {
    #[must_use]
    pub fn new(num: u32, policy: MatchingPolicy) -> Self {
        Self {
            num,
            policy,
            ..Default::default()
        }
    }
    #[must_use]
    pub fn set_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_owned());
        self
    }
    #[must_use]
    pub fn set_ge(mut self, ge: Option<u8>) -> Self {
        self.ge = ge;
        self
    }
    #[must_use]
    pub fn set_le(mut self, le: Option<u8>) -> Self {
        self.le = le;
        self
    }
}

impl CommunityListSeq {
    #[must_use]
    pub fn new(num: u32, policy: MatchingPolicy, communities: Vec<String>) -> Self {
        Self {
            num,
            policy,
            communities,
        }
    }
}

impl RouteMapMatch {
    #[must_use]
    pub fn community(id: &str) -> Self {
        Self {
            community: Some(MatchCommunity {
                id: id.to_owned(),
                exact_match: None,
            }),
            ..Default::default()
        }
    }
    #[must_use]
    pub fn ipv4_prefix_list(name: &str) -> Self {
        Self::default().set_ipv4_prefix_list(name)
    }
    #[must_use]
    pub fn ipv6_prefix_list(name: &str) -> Self {
        Self::default().set_ipv6_prefix_list(name)
    }
    #[must_use]
    pub fn source_vrf(vrf: &str) -> Self {
        Self::default().set_source_vrf(vrf)
    }
    #[must_use]
    pub fn set_ipv4_prefix_list(mut self, name: &str) -> Self {
        self.ipv4 = Some(MatchAddress {
            prefix_list: Some(name.to_owned()),
            ..Default::default()
        });
        self
    }
    #[must_use]
    pub fn set_ipv6_prefix_list(mut self, name: &str) -> Self {
        self.ipv6 = Some(MatchAddress {
            prefix_list: Some(name.to_owned()),
            ..Default::default()
        });
        self
    }
    #[must_use]
    pub fn set_source_vrf(mut self, vrf: &str) -> Self {
        self.source_vrf = Some(vrf.to_owned());
        self
    }
}

impl RouteMapSeq {
    #[must_use]
    pub fn new(num: u32, policy: MatchingPolicy) -> Self {
        Self {
            num,
            policy,
            ..Default::default()
        }
    }
    #[must_use]
    pub fn permit(num: u32) -> Self {
        Self::new(num, MatchingPolicy::Permit)
    }
    #[must_use]
    pub fn deny(num: u32) -> Self {
        Self::new(num, MatchingPolicy::Deny)
    }
    #[must_use]
    pub fn set_match(mut self, matches: RouteMapMatch) -> Self {
        self.matches = Some(matches);
        self
    }
    #[must_use]
    pub fn set_set(mut self, set: RouteMapSet) -> Self {
        self.set = Some(set);
        self
    }
    #[must_use]
    pub fn set_on_match_next(mut self) -> Self {
        self.on_match = Some(OnMatch::Next);
        self
    }
    #[must_use]
    pub fn set_call(mut self, rmap: &str) -> Self {
        self.call = Some(rmap.to_owned());
        self
    }
}

impl RouteMap {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            seqs: vec![],
        }
    }
    /// Look up a sequence by number
    #[must_use]
    pub fn seq(&self, num: u32) -> Option<&RouteMapSeq> {
        self.seqs.iter().find(|seq| seq.num == num)
    }
}

impl PrefixList {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            seqs: vec![],
        }
    }
}

impl CommunityList {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            seqs: vec![],
        }
    }
}
