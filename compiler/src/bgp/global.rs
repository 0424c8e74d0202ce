// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device-wide policy objects and the BGP instance of the default VRF

use tracing::debug;

use intent::{Layer2, NodeIntent};
use vrouter::bgp::{
    AddressFamily, Bestpath, BestpathAsPath, Evpn, EvpnExport, EvpnImport, EvpnVni,
    MultipathRelax, Network, Unicast,
};
use vrouter::policy::{
    CommunityListSeq, MatchingPolicy, PrefixListSeq, RouteMapMatch, RouteMapSeq, RouteMapSet,
    SetCommunity, SetIpv4,
};

use crate::addressing::IpFamily;
use crate::errors::CompileResult;
use crate::filter::DEFAULT_LIST_SEQ;
use crate::namegen::{
    self, CM_RECEIVED_FABRIC, PL_ANY, PL_DEFAULT, PL_EXPORT_BASE, PL_LINK_LOCAL,
    RM_DENY_TAG_FABRIC_OUT, RM_EXPORT_LOCAL, RM_TAG_FABRIC_IN,
};
use crate::pipeline::CompileContext;
use crate::policy::PolicyRegistry;

use super::neighbor;

/// Community tagging the routes learnt from the fabric
const FABRIC_COMMUNITY: &str = "65169:200";
const FABRIC_LOCAL_PREF: u32 = 100;
/// Local preference of the routes leaked into the cluster VRF
const CLUSTER_IMPORT_LOCAL_PREF: u32 = 50;

const LINK_LOCAL_V4: &str = "169.254.0.0/16";
const LINK_LOCAL_V6: &str = "fd00:7:caa5::/48";

/// One entry per export CIDR, numbered per family from the default list sequence
fn export_base_lists(policies: &mut PolicyRegistry, cidrs: &[String]) -> CompileResult<()> {
    let mut next_v4 = DEFAULT_LIST_SEQ;
    let mut next_v6 = DEFAULT_LIST_SEQ;
    for cidr in cidrs {
        let family = IpFamily::of(cidr)?;
        let next = match family {
            IpFamily::V4 => &mut next_v4,
            IpFamily::V6 => &mut next_v6,
        };
        let entry = PrefixListSeq::new(*next, MatchingPolicy::Permit)
            .set_address(cidr)
            .set_le(Some(family.max_prefix_len()));
        policies.upsert_prefix_list(family, PL_EXPORT_BASE, [entry])?;
        *next += 1;
    }
    Ok(())
}

fn well_known_lists(policies: &mut PolicyRegistry) -> CompileResult<()> {
    let permit = || PrefixListSeq::new(DEFAULT_LIST_SEQ, MatchingPolicy::Permit);
    policies.upsert_prefix_list(
        IpFamily::V4,
        PL_LINK_LOCAL,
        [permit().set_address(LINK_LOCAL_V4).set_le(Some(32))],
    )?;
    policies.upsert_prefix_list(
        IpFamily::V6,
        PL_LINK_LOCAL,
        [permit().set_address(LINK_LOCAL_V6).set_le(Some(128))],
    )?;
    policies.upsert_prefix_list(IpFamily::V4, PL_ANY, [permit()])?;
    policies.upsert_prefix_list(IpFamily::V6, PL_ANY, [permit()])?;
    policies.upsert_prefix_list(IpFamily::V4, PL_DEFAULT, [permit().set_address("0.0.0.0/0")])?;
    policies.upsert_prefix_list(IpFamily::V6, PL_DEFAULT, [permit().set_address("::/0")])?;
    policies.upsert_community_list(
        CM_RECEIVED_FABRIC,
        [CommunityListSeq::new(
            DEFAULT_LIST_SEQ,
            MatchingPolicy::Permit,
            vec![FABRIC_COMMUNITY.to_owned()],
        )],
    )
}

fn fabric_route_maps(policies: &mut PolicyRegistry) -> CompileResult<()> {
    policies.upsert_route_map(
        RM_TAG_FABRIC_IN,
        [RouteMapSeq::permit(10).set_set(RouteMapSet {
            community: Some(SetCommunity::Add(vec![FABRIC_COMMUNITY.to_owned()])),
            local_preference: Some(FABRIC_LOCAL_PREF),
            ..Default::default()
        })],
    )?;
    policies.upsert_route_map(
        RM_DENY_TAG_FABRIC_OUT,
        [
            RouteMapSeq::deny(10).set_match(RouteMapMatch::community(CM_RECEIVED_FABRIC)),
            RouteMapSeq::permit(20),
        ],
    )?;
    policies.upsert_route_map(
        RM_EXPORT_LOCAL,
        [
            RouteMapSeq::deny(10).set_match(RouteMapMatch::community(CM_RECEIVED_FABRIC)),
            RouteMapSeq::deny(11).set_match(RouteMapMatch::ipv4_prefix_list(PL_LINK_LOCAL)),
            RouteMapSeq::deny(12).set_match(RouteMapMatch::ipv6_prefix_list(PL_LINK_LOCAL)),
            RouteMapSeq::permit(20),
        ],
    )
}

/// Route leaking between the reserved VRFs: the cluster VRF takes everything from
/// the management VRF but its default routes, the management VRF only takes the
/// export CIDRs from the cluster VRF.
fn reserved_import_route_maps(
    policies: &mut PolicyRegistry,
    cluster: &str,
    management: &str,
) -> CompileResult<()> {
    policies.upsert_route_map(
        &namegen::import_route_map(cluster),
        [
            RouteMapSeq::permit(1)
                .set_match(RouteMapMatch::ipv4_prefix_list(PL_ANY))
                .set_set(RouteMapSet {
                    ipv4: Some(SetIpv4 {
                        vpn_next_hop: Some("0.0.0.0".to_owned()),
                    }),
                    ..Default::default()
                })
                .set_on_match_next(),
            RouteMapSeq::permit(2)
                .set_set(RouteMapSet {
                    local_preference: Some(CLUSTER_IMPORT_LOCAL_PREF),
                    ..Default::default()
                })
                .set_on_match_next(),
            RouteMapSeq::deny(65533).set_match(
                RouteMapMatch::ipv4_prefix_list(PL_DEFAULT).set_source_vrf(management),
            ),
            RouteMapSeq::deny(65534).set_match(
                RouteMapMatch::ipv6_prefix_list(PL_DEFAULT).set_source_vrf(management),
            ),
            RouteMapSeq::permit(65535).set_match(RouteMapMatch::source_vrf(management)),
        ],
    )?;
    policies.upsert_route_map(
        &namegen::import_route_map(management),
        [
            RouteMapSeq::permit(2).set_match(
                RouteMapMatch::ipv4_prefix_list(PL_EXPORT_BASE).set_source_vrf(cluster),
            ),
            RouteMapSeq::permit(3).set_match(
                RouteMapMatch::ipv6_prefix_list(PL_EXPORT_BASE).set_source_vrf(cluster),
            ),
        ],
    )
}

pub(crate) fn generate_global_policies(ctx: &mut CompileContext) -> CompileResult<()> {
    let base = ctx.base;
    let policies = &mut ctx.policies;
    export_base_lists(policies, &base.export_cidrs)?;
    well_known_lists(policies)?;
    fabric_route_maps(policies)?;
    reserved_import_route_maps(policies, &base.cluster_vrf.name, &base.management_vrf.name)
}

/// EVPN VNI of a layer-2 segment, for segments that declare a route target
fn segment_vni(l2: &Layer2) -> Option<EvpnVni> {
    let rt = l2.route_target.as_deref().filter(|rt| !rt.is_empty())?;
    Some(EvpnVni {
        vni: l2.vni,
        export: Some(EvpnExport::new(vec![rt.to_owned()])),
        import: Some(EvpnImport::new(vec![rt.to_owned()])),
    })
}

fn segment_vnis(intent: &NodeIntent) -> Vec<EvpnVni> {
    intent.layer2s.iter().filter_map(segment_vni).collect()
}

pub(crate) fn generate_default_bgp(ctx: &mut CompileContext) -> CompileResult<()> {
    let base = ctx.base;
    let vnis = segment_vnis(ctx.intent);
    debug!(
        "Default BGP instance: AS {}, {} underlay neighbors, {} layer-2 VNIs",
        base.local_asn,
        base.underlay_neighbors.len(),
        vnis.len()
    );

    let bgp = ctx.ns.routing_mut().bgp_mut();
    bgp.asn = base.local_asn.to_string();
    bgp.router_id = Some(base.vtep_loopback_ip);
    bgp.suppress_duplicates = Some(false);
    bgp.ebgp_requires_policy = Some(false);
    bgp.bestpath = Some(Bestpath {
        as_path: Some(BestpathAsPath {
            multipath_relax: Some(MultipathRelax::NoAsSet),
            ..Default::default()
        }),
    });
    bgp.address_family = Some(AddressFamily {
        ipv4_unicast: Some(Unicast {
            networks: vec![Network {
                ip_prefix: format!("{}/32", base.vtep_loopback_ip),
            }],
            ..Default::default()
        }),
        ipv6_unicast: None,
        l2vpn_evpn: Some(Evpn {
            advertise_all_vni: Some(true),
            vnis,
            ..Default::default()
        }),
    });
    for conf in &base.underlay_neighbors {
        neighbor::add_base_neighbor(bgp, conf, true);
    }
    Ok(())
}
