// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Declarative route filters: an ordered list of match/action items and a default action.
//! Filters are attached to peers, VRF imports, redistribution and EVPN export and get
//! compiled into route-maps.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Accept,
    #[default]
    Reject,
    /// Permit and continue evaluating the following entries
    Next,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModifyRoute {
    pub add_communities: Vec<String>,
    /// Add the communities to the existing ones instead of replacing them
    pub additive_communities: bool,
    pub remove_communities: Vec<String>,
    pub remove_all_communities: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub modify_route: Option<ModifyRoute>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixMatcher {
    pub prefix: String,
    #[serde(default)]
    pub ge: Option<u8>,
    #[serde(default)]
    pub le: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMatcher {
    pub community: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Matcher {
    pub prefix: Option<PrefixMatcher>,
    pub bgp_community: Option<CommunityMatcher>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterItem {
    #[serde(default)]
    pub matcher: Matcher,
    pub action: Action,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default)]
    pub items: Vec<FilterItem>,
    pub default_action: Action,
}

impl Action {
    #[must_use]
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            modify_route: None,
        }
    }
    #[must_use]
    pub fn accept() -> Self {
        Self::new(ActionKind::Accept)
    }
    #[must_use]
    pub fn reject() -> Self {
        Self::new(ActionKind::Reject)
    }
    #[must_use]
    pub fn set_modify_route(mut self, modify: ModifyRoute) -> Self {
        self.modify_route = Some(modify);
        self
    }
}

impl Matcher {
    #[must_use]
    pub fn prefix(prefix: &str, ge: Option<u8>, le: Option<u8>) -> Self {
        Self {
            prefix: Some(PrefixMatcher {
                prefix: prefix.to_owned(),
                ge,
                le,
            }),
            bgp_community: None,
        }
    }
    #[must_use]
    pub fn community(community: &str) -> Self {
        Self {
            prefix: None,
            bgp_community: Some(CommunityMatcher {
                community: community.to_owned(),
            }),
        }
    }
}

impl Filter {
    #[must_use]
    pub fn new(default_action: Action) -> Self {
        Self {
            items: vec![],
            default_action,
        }
    }
    #[must_use]
    pub fn add_item(mut self, matcher: Matcher, action: Action) -> Self {
        self.items.push(FilterItem { matcher, action });
        self
    }
}
