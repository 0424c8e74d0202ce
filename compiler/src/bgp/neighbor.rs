// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! BGP sessions: node-wide neighbors of the base configuration and peers declared
//! by the intent of a VRF.

use tracing::{debug, warn};

use intent::{AddressFamily as PeerFamily, BaseNeighbor, BgpPeer};
use vrouter::bgp::{
    Bgp, Direction, LocalAs, MaximumPrefix, Neighbor, NeighborEvpn, NeighborGroup, NeighborIf,
    NeighborIp, NeighborPrefixList, NeighborRange, NeighborRouteMap, NeighborUnicast, Timers,
    Track,
};

use crate::addressing::IpFamily;
use crate::errors::{CompileError, CompileResult};
use crate::filter::compile_filter;
use crate::namegen::{self, FilterDirection, PL_ANY, RM_DENY_TAG_FABRIC_OUT, RM_TAG_FABRIC_IN};
use crate::policy::PolicyRegistry;

/// allowas-in of the IPv4 unicast family of base neighbors
const ALLOWAS_IN: u8 = 3;

fn fabric_route_maps() -> Vec<NeighborRouteMap> {
    vec![
        NeighborRouteMap::new(RM_TAG_FABRIC_IN, Direction::In),
        NeighborRouteMap::new(RM_DENY_TAG_FABRIC_OUT, Direction::Out),
    ]
}

fn base_unicast(underlay: bool, allowas_in: Option<u8>) -> NeighborUnicast {
    let mut unicast = NeighborUnicast {
        allowas_in,
        ..Default::default()
    };
    if underlay {
        unicast.route_maps = fabric_route_maps();
    } else {
        unicast
            .prefix_lists
            .push(NeighborPrefixList::new(PL_ANY, Direction::In));
    }
    unicast
}

/// Add a neighbor of the base configuration to `bgp`. Underlay sessions are tracked
/// with BFD and tag the routes they learn as received from the fabric. A neighbor
/// with neither address nor interface is skipped.
pub(crate) fn add_base_neighbor(bgp: &mut Bgp, conf: &BaseNeighbor, underlay: bool) {
    let mut neighbor = Neighbor {
        enforce_first_as: Some(true),
        remote_as: Some(conf.remote_asn.clone()),
        local_as: conf.local_asn.as_ref().map(|as_number| LocalAs {
            as_number: as_number.clone(),
            no_prepend: Some(true),
            replace_as: Some(true),
        }),
        timers: Some(Timers {
            keepalive_interval: Some(conf.keepalive_time),
            hold_time: Some(conf.hold_time),
            ..Default::default()
        }),
        track: underlay.then_some(Track::Bfd),
        ..Default::default()
    };
    if let Some(source) = &conf.update_source {
        neighbor.update_source = Some(source.clone());
        neighbor.enforce_multihop = Some(true);
    }
    if conf.ipv4 {
        neighbor.af_mut().ipv4_unicast = Some(base_unicast(underlay, Some(ALLOWAS_IN)));
    }
    if conf.ipv6 {
        neighbor.af_mut().ipv6_unicast = Some(base_unicast(underlay, None));
    }
    if conf.evpn {
        neighbor.af_mut().l2vpn_evpn = Some(NeighborEvpn {
            route_maps: if underlay { fabric_route_maps() } else { vec![] },
            ..Default::default()
        });
    }

    match (&conf.ip, &conf.interface) {
        (Some(ip), _) => bgp.neighbors.push(NeighborIp {
            neighbor_address: ip.clone(),
            neighbor,
            ..Default::default()
        }),
        (None, Some(interface)) => bgp.unnumbered_neighbors.push(NeighborIf {
            interface: interface.clone(),
            ipv6_only: Some(false),
            neighbor,
            ..Default::default()
        }),
        (None, None) => {
            warn!(
                "Skipping base neighbor with remote AS {}: no address nor interface",
                conf.remote_asn
            );
        }
    }
}

fn peer_unicast(
    policies: &mut PolicyRegistry,
    vrf: &str,
    peer: &str,
    ipv6: bool,
    conf: &PeerFamily,
) -> CompileResult<NeighborUnicast> {
    let mut unicast = NeighborUnicast::default();
    if let Some(filter) = &conf.import_filter {
        let name = namegen::peer_filter(vrf, peer, ipv6, FilterDirection::In);
        let rmap = compile_filter(policies, &name, filter)?;
        unicast
            .route_maps
            .push(NeighborRouteMap::new(&rmap, Direction::In));
    }
    if let Some(filter) = &conf.export_filter {
        let name = namegen::peer_filter(vrf, peer, ipv6, FilterDirection::Out);
        let rmap = compile_filter(policies, &name, filter)?;
        unicast
            .route_maps
            .push(NeighborRouteMap::new(&rmap, Direction::Out));
    }
    unicast.maximum_prefix = conf.max_prefixes.map(|maximum| MaximumPrefix {
        maximum,
        ..Default::default()
    });
    Ok(unicast)
}

/// Add a peer declared in the intent of `vrf` to its BGP instance. A peer with an
/// address is a plain neighbor; a peer with a listen range becomes a neighbor group
/// named after the hash of the range, accepting dynamic sessions from it.
pub(crate) fn add_peer(
    policies: &mut PolicyRegistry,
    bgp: &mut Bgp,
    vrf: &str,
    peer: &BgpPeer,
) -> CompileResult<()> {
    let Some(identity) = peer.identity() else {
        return Err(CompileError::invalid(format!(
            "BGP peer of VRF {vrf} with remote AS {} has neither address nor listen range",
            peer.remote_asn
        )));
    };
    IpFamily::of(identity)?;
    let name = namegen::hash(identity);
    debug!("Adding BGP peer {identity} ({name}) to VRF {vrf}");

    let mut neighbor = Neighbor {
        enforce_first_as: Some(true),
        remote_as: Some(peer.remote_asn.to_string()),
        ttl_security_hops: peer.multihop,
        ..Default::default()
    };
    if peer.keepalive_time.is_some() || peer.hold_time.is_some() {
        neighbor.timers = Some(Timers {
            keepalive_interval: peer.keepalive_time,
            hold_time: peer.hold_time,
            ..Default::default()
        });
    }
    if let Some(conf) = &peer.ipv4 {
        neighbor.af_mut().ipv4_unicast = Some(peer_unicast(policies, vrf, &name, false, conf)?);
    }
    if let Some(conf) = &peer.ipv6 {
        neighbor.af_mut().ipv6_unicast = Some(peer_unicast(policies, vrf, &name, true, conf)?);
    }

    match (&peer.address, &peer.listen_range) {
        (Some(address), _) => bgp.neighbors.push(NeighborIp {
            neighbor_address: address.clone(),
            neighbor,
            ..Default::default()
        }),
        (None, Some(range)) => {
            bgp.neighbor_groups.push(NeighborGroup {
                name: name.clone(),
                neighbor,
            });
            bgp.listen
                .get_or_insert_with(Default::default)
                .ranges
                .push(NeighborRange {
                    address: range.clone(),
                    neighbor_group: name,
                });
        }
        (None, None) => {}
    }
    Ok(())
}
