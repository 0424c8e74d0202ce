// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Layer-2 stage: one bridge, VXLAN and trunk VLAN per segment, with the optional
//! anycast gateway on the bridge.

use tracing::debug;

use intent::Layer2;
use vrouter::interfaces::{
    AcceptDad, ArpAccept, Bridge, NeighborStack, NetworkStack, NetworkStackV4,
};

use crate::addressing::normalize_mac;
use crate::errors::{CompileError, CompileResult};
use crate::factory::{self, ip_lists};
use crate::namegen;
use crate::pipeline::CompileContext;

/// Neighbor handling of a segment bridge
fn set_bridge_stack(bridge: &mut Bridge, reachable_time_ms: u32) {
    let stack = bridge
        .network_stack
        .get_or_insert_with(NetworkStack::default);
    stack.ipv6_mut().accept_duplicate_address_detection = Some(AcceptDad::Never);
    stack.ipv4 = Some(NetworkStackV4 {
        arp_accept_gratuitous: Some(ArpAccept::Always),
    });
    stack.neighbor = Some(NeighborStack {
        ipv4_base_reachable_time: Some(reachable_time_ms),
        ipv6_base_reachable_time: Some(reachable_time_ms),
    });
}

fn generate_segment(ctx: &mut CompileContext, l2: &Layer2) -> CompileResult<()> {
    let (vrf, mac, ips) = match &l2.irb {
        Some(irb) => (
            irb.vrf.as_deref(),
            irb.mac_address.as_deref(),
            irb.ip_addresses.as_slice(),
        ),
        None => (None, None, &[][..]),
    };
    if let Some(vrf) = vrf.filter(|vrf| ctx.ns.vrf(vrf).is_none()) {
        return Err(CompileError::vrf_not_found(vrf, &ctx.ns.name));
    }
    let gateway = !ips.is_empty();
    if gateway && mac.is_none() {
        return Err(CompileError::invalid(format!(
            "anycast gateway of VLAN {} has no MAC address",
            l2.vlan
        )));
    }
    if gateway && vrf.is_none() {
        return Err(CompileError::invalid(format!(
            "anycast gateway of VLAN {} has no VRF",
            l2.vlan
        )));
    }
    let mac = mac.map(normalize_mac).transpose()?;
    debug!(
        "Building layer-2 segment VLAN {} VNI {} (gateway: {gateway})",
        l2.vlan, l2.vni
    );

    let neigh_suppress = ctx.options.neigh_suppression && gateway;
    let (vxlan, vxlan_slave) = ctx.factory.vxlan(
        &namegen::l2_vxlan(l2.vni),
        l2.vni,
        l2.mtu,
        false,
        neigh_suppress,
    );
    let (vlan, vlan_slave) = ctx.factory.vlan(l2.vlan, l2.mtu);

    let mut bridge = ctx.factory.bridge(
        &namegen::l2_bridge(l2.vlan),
        mac.as_deref(),
        l2.mtu,
        false,
        gateway,
    );
    bridge.slaves = vec![vxlan_slave, vlan_slave];
    set_bridge_stack(&mut bridge, ctx.options.base_reachable_time_ms);
    if gateway {
        let (ipv4, ipv6) = ip_lists(ips)?;
        bridge.ipv4 = ipv4;
        bridge.ipv6 = ipv6;
    }

    factory::add_vxlan(&mut ctx.ns.interfaces, vxlan);
    factory::add_vlan(&mut ctx.ns.interfaces, vlan);
    let intfs = match vrf {
        Some(vrf) => {
            let ns_name = ctx.ns.name.clone();
            &mut ctx
                .ns
                .vrf_mut(vrf)
                .ok_or_else(|| CompileError::vrf_not_found(vrf, &ns_name))?
                .interfaces
        }
        None => &mut ctx.ns.interfaces,
    };
    factory::add_bridge(intfs, bridge);
    Ok(())
}

pub(crate) fn generate(ctx: &mut CompileContext) -> CompileResult<()> {
    let intent = ctx.intent;
    for l2 in &intent.layer2s {
        generate_segment(ctx, l2)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use intent::{BaseConfig, Irb, NodeIntent};
    use pretty_assertions::assert_eq;
    use vrouter::Namespace;

    use crate::options::{CompileOptions, CompileOptionsBuilder};
    use crate::tables::ObservedTables;

    const BASE: &str = r#"
vtepLoopbackIP: 10.50.0.10
trunkInterfaceName: hbn
managementVRF: { name: mgmt, vni: 20, evpnRouteTarget: "64497:20" }
clusterVRF: { name: cluster, vni: 30, evpnRouteTarget: "64497:30" }
localASN: 64497
"#;

    fn segment(irb: Option<Irb>) -> Layer2 {
        Layer2 {
            vni: 4_000_002,
            vlan: 501,
            mtu: 1500,
            route_target: None,
            irb,
        }
    }

    fn gateway(vrf: Option<&str>, mac: Option<&str>) -> Irb {
        Irb {
            vrf: vrf.map(str::to_owned),
            mac_address: mac.map(str::to_owned),
            ip_addresses: vec![
                "10.250.0.1/24".to_string(),
                "fd94:685b:30cf:501::1/64".to_string(),
            ],
        }
    }

    fn run_with(l2: Layer2, options: &CompileOptions) -> CompileResult<Namespace> {
        let base = BaseConfig::from_yaml(BASE).unwrap();
        let intent = NodeIntent {
            layer2s: vec![l2],
            ..Default::default()
        };
        let observed = ObservedTables::new();
        let mut ctx = CompileContext::new(&base, &intent, options, &observed, "hbn");
        factory::create_vrf(&mut ctx.ns, "m2m", 50);
        generate(&mut ctx)?;
        Ok(ctx.ns)
    }

    fn run(l2: Layer2) -> CompileResult<Namespace> {
        run_with(l2, &CompileOptions::default())
    }

    #[test]
    fn test_plain_segment() {
        let ns = run(segment(None)).unwrap();
        let bridge = ns.interfaces.bridge("l2.501").unwrap();
        assert!(bridge.ethernet.is_none());
        assert!(bridge.ipv4.is_none());
        let slaves: Vec<&str> = bridge.slaves.iter().map(|s| s.slave.as_str()).collect();
        assert_eq!(slaves, vec!["vx.4000002", "vlan.501"]);
        assert_eq!(bridge.slaves[0].neighbor_suppress, Some(false));
        assert_eq!(bridge.slaves[0].hairpin, Some(false));
        assert_eq!(ns.interfaces.vxlan("vx.4000002").unwrap().mtu, Some(1500));
        assert_eq!(ns.interfaces.vlan("vlan.501").unwrap().link_interface, "hbn");

        // transit bridges get the same neighbor handling as gateways
        let stack = bridge.network_stack.as_ref().unwrap();
        assert_eq!(
            stack.ipv6.as_ref().unwrap().accept_duplicate_address_detection,
            Some(AcceptDad::Never)
        );
        assert_eq!(
            stack.ipv4.as_ref().unwrap().arp_accept_gratuitous,
            Some(ArpAccept::Always)
        );
        let neighbor = stack.neighbor.as_ref().unwrap();
        assert_eq!(neighbor.ipv4_base_reachable_time, Some(30_000));
        assert_eq!(neighbor.ipv6_base_reachable_time, Some(30_000));
    }

    #[test]
    fn test_anycast_gateway() {
        let ns = run(segment(Some(gateway(Some("m2m"), Some("1A:EE:CF:2F:A7:A8"))))).unwrap();
        assert!(ns.interfaces.bridge("l2.501").is_none());
        let bridge = ns.vrf("m2m").unwrap().interfaces.bridge("l2.501").unwrap();
        assert_eq!(bridge.ethernet.as_ref().unwrap().mac_address, "1a:ee:cf:2f:a7:a8");
        assert_eq!(bridge.ipv4.as_ref().unwrap().addresses[0].ip, "10.250.0.1/24");
        assert_eq!(
            bridge.ipv6.as_ref().unwrap().addresses[0].ip,
            "fd94:685b:30cf:501::1/64"
        );
        let stack = bridge.network_stack.as_ref().unwrap();
        assert_eq!(
            stack.ipv6.as_ref().unwrap().accept_duplicate_address_detection,
            Some(AcceptDad::Never)
        );
        assert_eq!(
            stack.ipv4.as_ref().unwrap().arp_accept_gratuitous,
            Some(ArpAccept::Always)
        );
        assert_eq!(
            stack.neighbor.as_ref().unwrap().ipv4_base_reachable_time,
            Some(30_000)
        );
        assert_eq!(bridge.slaves[0].neighbor_suppress, Some(true));
        // the VXLAN and VLAN stay in the namespace
        assert!(ns.interfaces.vxlan("vx.4000002").is_some());
        assert!(ns.interfaces.vlan("vlan.501").is_some());
    }

    #[test]
    fn test_neigh_suppression_disabled() {
        let options = CompileOptionsBuilder::default()
            .neigh_suppression(false)
            .build()
            .unwrap();
        let l2 = segment(Some(gateway(Some("m2m"), Some("1a:ee:cf:2f:a7:a8"))));
        let ns = run_with(l2, &options).unwrap();
        let bridge = ns.vrf("m2m").unwrap().interfaces.bridge("l2.501").unwrap();
        assert_eq!(bridge.slaves[0].neighbor_suppress, Some(false));
    }

    #[test]
    fn test_anycast_without_mac() {
        let res = run(segment(Some(gateway(Some("m2m"), None))));
        assert!(matches!(res, Err(CompileError::InvalidSpec(_))));
    }

    #[test]
    fn test_anycast_without_vrf() {
        let res = run(segment(Some(gateway(None, Some("1a:ee:cf:2f:a7:a8")))));
        assert!(matches!(res, Err(CompileError::InvalidSpec(_))));
    }

    #[test]
    fn test_unknown_vrf() {
        let res = run(segment(Some(gateway(Some("b2b"), Some("1a:ee:cf:2f:a7:a8")))));
        assert_eq!(
            res.unwrap_err(),
            CompileError::VrfNotFound {
                vrf: "b2b".to_string(),
                namespace: "hbn".to_string()
            }
        );
    }

    #[test]
    fn test_bad_mac() {
        let res = run(segment(Some(gateway(Some("m2m"), Some("not-a-mac")))));
        assert!(matches!(res, Err(CompileError::InvalidSpec(_))));
    }
}
