// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Compilation of declarative filters into route-maps

use intent::{ActionKind, Filter, FilterItem, ModifyRoute};
use vrouter::policy::{
    CommunityListSeq, MatchingPolicy, PrefixListSeq, RouteMapMatch, RouteMapSeq, RouteMapSet,
    SetCommunity,
};

use crate::addressing::IpFamily;
use crate::errors::{CompileError, CompileResult};
use crate::namegen;
use crate::policy::PolicyRegistry;

/// Sequence number of single-entry prefix-lists and community-lists
pub const DEFAULT_LIST_SEQ: u32 = 5;
/// Sequence number of the first filter item
const FIRST_ITEM_SEQ: u32 = 10;

fn policy_of(kind: ActionKind) -> MatchingPolicy {
    match kind {
        ActionKind::Accept | ActionKind::Next => MatchingPolicy::Permit,
        ActionKind::Reject => MatchingPolicy::Deny,
    }
}

pub(crate) fn item_seq(index: usize) -> CompileResult<u32> {
    u32::try_from(index)
        .ok()
        .and_then(|index| index.checked_add(FIRST_ITEM_SEQ))
        .ok_or_else(|| CompileError::invalid(format!("too many filter items ({index})")))
}

/// The set clause of a modify-route. Only one clause is emitted: added or
/// replacing communities first, then removed communities, then removal of all.
fn set_clause(
    policies: &mut PolicyRegistry,
    name: &str,
    index: usize,
    modify: &ModifyRoute,
) -> CompileResult<Option<RouteMapSet>> {
    let set = if !modify.add_communities.is_empty() {
        let communities = modify.add_communities.clone();
        RouteMapSet {
            community: Some(if modify.additive_communities {
                SetCommunity::Add(communities)
            } else {
                SetCommunity::ReplaceBy(communities)
            }),
            ..Default::default()
        }
    } else if !modify.remove_communities.is_empty() {
        let clist = namegen::filter_remove_community_list(name, index);
        policies.upsert_community_list(
            &clist,
            [CommunityListSeq::new(
                DEFAULT_LIST_SEQ,
                MatchingPolicy::Permit,
                modify.remove_communities.clone(),
            )],
        )?;
        RouteMapSet {
            comm_list_delete: Some(clist),
            ..Default::default()
        }
    } else if modify.remove_all_communities {
        RouteMapSet {
            community: Some(SetCommunity::None),
            ..Default::default()
        }
    } else {
        return Ok(None);
    };
    Ok(Some(set))
}

fn compile_item(
    policies: &mut PolicyRegistry,
    name: &str,
    index: usize,
    item: &FilterItem,
) -> CompileResult<RouteMapSeq> {
    let mut seq = RouteMapSeq::new(item_seq(index)?, policy_of(item.action.kind));
    let mut matches = RouteMapMatch::default();

    if let Some(prefix) = &item.matcher.prefix {
        let plist = namegen::filter_prefix_list(name, index);
        let family = IpFamily::of(&prefix.prefix)?;
        let entry = PrefixListSeq::new(DEFAULT_LIST_SEQ, MatchingPolicy::Permit)
            .set_address(&prefix.prefix)
            .set_ge(prefix.ge)
            .set_le(prefix.le);
        policies.upsert_prefix_list(family, &plist, [entry])?;
        matches = match family {
            IpFamily::V4 => matches.set_ipv4_prefix_list(&plist),
            IpFamily::V6 => matches.set_ipv6_prefix_list(&plist),
        };
    }
    if let Some(community) = &item.matcher.bgp_community {
        let clist = namegen::filter_community_list(name, index);
        policies.upsert_community_list(
            &clist,
            [CommunityListSeq::new(
                DEFAULT_LIST_SEQ,
                MatchingPolicy::Permit,
                vec![community.community.clone()],
            )],
        )?;
        matches.community = RouteMapMatch::community(&clist).community;
    }
    if matches != RouteMapMatch::default() {
        seq = seq.set_match(matches);
    }
    let set = match &item.action.modify_route {
        Some(modify) => set_clause(policies, name, index, modify)?,
        None => None,
    };
    if let Some(set) = set {
        seq = seq.set_set(set);
    }
    if item.action.kind == ActionKind::Next {
        seq = seq.set_on_match_next();
    }
    Ok(seq)
}

/// Compile `filter` into route-map `rm_<name>`: one sequence per item, numbered
/// from 10, then the default action. Returns the route-map name.
pub fn compile_filter(
    policies: &mut PolicyRegistry,
    name: &str,
    filter: &Filter,
) -> CompileResult<String> {
    let mut seqs = Vec::with_capacity(filter.items.len() + 1);
    for (index, item) in filter.items.iter().enumerate() {
        seqs.push(compile_item(policies, name, index, item)?);
    }
    seqs.push(RouteMapSeq::new(
        item_seq(filter.items.len())?,
        policy_of(filter.default_action.kind),
    ));
    let rmap = namegen::route_map(name);
    policies.upsert_route_map(&rmap, seqs)?;
    Ok(rmap)
}
