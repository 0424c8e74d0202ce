// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Layer-3 stage: VRF table ids, VRF objects, their VNI bridge and VXLAN, loopbacks
//! and GRE tunnels.

use tracing::debug;

use intent::{GreLayer, GreTunnel, Vrf as VrfIntent};
use vrouter::Namespace;
use vrouter::interfaces::{Gre, GreTap, Interfaces, Loopback};

use crate::errors::{CompileError, CompileResult};
use crate::factory::{self, DEFAULT_MTU, Factory, ip_lists};
use crate::namegen::{self, MAX_VRF_NAME_LEN};
use crate::pipeline::CompileContext;
use crate::tables::TableIdPool;

const GRE_MTU: u32 = 1500;

/// A VRF to create
struct VrfPlan<'a> {
    name: &'a str,
    vni: Option<u32>,
    conf: Option<&'a VrfIntent>,
}

fn check_name(name: &str) -> CompileResult<()> {
    if name.len() > MAX_VRF_NAME_LEN {
        return Err(CompileError::NameTooLong {
            name: name.to_owned(),
            max: MAX_VRF_NAME_LEN,
        }
        .logged());
    }
    Ok(())
}

fn add_gre_tunnel(intfs: &mut Interfaces, name: &str, conf: &GreTunnel) {
    let gre = Gre {
        name: name.to_owned(),
        mtu: Some(GRE_MTU),
        local: conf.source_address.clone(),
        remote: Some(conf.destination_address.clone()),
        key_both: conf.encapsulation_key,
    };
    match conf.layer {
        GreLayer::Layer2 => intfs.gretaps.push(GreTap { gre }),
        GreLayer::Layer3 => intfs.gres.push(gre),
    }
}

fn add_loopback(intfs: &mut Interfaces, name: &str, addrs: &[String]) -> CompileResult<()> {
    let (ipv4, ipv6) = ip_lists(addrs)?;
    intfs.loopbacks.push(Loopback {
        name: name.to_owned(),
        ipv4,
        ipv6,
    });
    Ok(())
}

fn build_vrf(
    factory: &Factory,
    ns: &mut Namespace,
    plan: &VrfPlan,
    table_id: u32,
) -> CompileResult<()> {
    check_name(plan.name)?;
    debug!("Building VRF {} with table {table_id}", plan.name);

    let bridge = plan.vni.map(|vni| {
        let (vxlan, slave) =
            factory.vxlan(&namegen::vrf_vxlan(plan.name), vni, DEFAULT_MTU, true, false);
        factory::add_vxlan(&mut ns.interfaces, vxlan);
        let mut bridge =
            factory.bridge(&namegen::bridge(plan.name), None, DEFAULT_MTU, true, false);
        bridge.slaves.push(slave);
        bridge
    });

    let vrf = factory::create_vrf(ns, plan.name, table_id);
    if let Some(bridge) = bridge {
        factory::add_bridge(&mut vrf.interfaces, bridge);
    }
    if let Some(conf) = plan.conf {
        for (name, gre) in &conf.gre_tunnels {
            add_gre_tunnel(&mut vrf.interfaces, name, gre);
        }
        for (name, lo) in &conf.loopbacks {
            add_loopback(&mut vrf.interfaces, name, &lo.ip_addresses)?;
        }
    }
    Ok(())
}

fn reserved_table(pool: &TableIdPool, vrf: &str) -> CompileResult<u32> {
    pool.lookup(vrf)
        .ok_or_else(|| CompileError::MissingReservedTable(vrf.to_owned()).logged())
}

pub(crate) fn generate(ctx: &mut CompileContext) -> CompileResult<()> {
    let base = ctx.base;
    let intent = ctx.intent;

    let mut pool = TableIdPool::new(ctx.options.vrf_tables.clone(), ctx.observed);
    pool.retain(|vrf| base.is_reserved_vrf(vrf) || intent.declares_vrf(vrf));

    if let Some(name) = intent
        .fabric_vrfs
        .keys()
        .find(|name| intent.local_vrfs.contains_key(*name))
    {
        return Err(CompileError::invalid(format!(
            "VRF {name} is declared both as fabric and as local VRF"
        )));
    }

    // reserved VRFs are pre-provisioned on the device
    let cluster = VrfPlan {
        name: &base.cluster_vrf.name,
        vni: None,
        conf: intent.cluster_vrf.as_ref(),
    };
    let management = VrfPlan {
        name: &base.management_vrf.name,
        vni: None,
        conf: intent.fabric_vrfs.get(&base.management_vrf.name).map(|f| &f.vrf),
    };
    let mut plans = vec![
        (reserved_table(&pool, cluster.name)?, cluster),
        (reserved_table(&pool, management.name)?, management),
    ];

    let mut declared: Vec<VrfPlan> = intent
        .fabric_vrfs
        .iter()
        .map(|(name, fabric)| VrfPlan {
            name,
            vni: Some(fabric.vni),
            conf: Some(&fabric.vrf),
        })
        .chain(intent.local_vrfs.iter().map(|(name, conf)| VrfPlan {
            name,
            vni: None,
            conf: Some(conf),
        }))
        .filter(|plan| !base.is_reserved_vrf(plan.name))
        .collect();
    declared.sort_by(|a, b| a.name.cmp(b.name));

    for plan in &declared {
        check_name(plan.name)?;
    }
    for plan in declared {
        let table_id = pool.allocate(plan.name)?;
        plans.push((table_id, plan));
    }

    for (table_id, plan) in &plans {
        build_vrf(&ctx.factory, &mut ctx.ns, plan, *table_id)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use intent::{BaseConfig, FabricVrf, NodeIntent};
    use pretty_assertions::assert_eq;
    use vrouter::interfaces::AddressGenMode;

    use crate::options::CompileOptions;
    use crate::tables::ObservedTables;

    const BASE: &str = r#"
vtepLoopbackIP: 10.50.0.10
trunkInterfaceName: hbn
managementVRF: { name: mgmt, vni: 20, evpnRouteTarget: "64497:20" }
clusterVRF: { name: cluster, vni: 30, evpnRouteTarget: "64497:30" }
localASN: 64497
"#;

    fn observed() -> ObservedTables {
        ObservedTables::new()
            .set_table("cluster", 10)
            .set_table("mgmt", 11)
            .set_table("s2s", 50)
    }

    fn run(intent: &NodeIntent, observed: &ObservedTables) -> CompileResult<Namespace> {
        let base = BaseConfig::from_yaml(BASE).unwrap();
        let options = CompileOptions::default();
        let mut ctx = CompileContext::new(&base, intent, &options, observed, "hbn");
        generate(&mut ctx)?;
        Ok(ctx.ns)
    }

    fn fabric(vni: u32) -> FabricVrf {
        FabricVrf {
            vni,
            ..Default::default()
        }
    }

    #[test]
    fn test_vrfs_and_tables() {
        let mut intent = NodeIntent::default();
        intent.fabric_vrfs.insert("m2m".to_string(), fabric(2_002_026));
        intent.fabric_vrfs.insert("b2b".to_string(), fabric(2_002_027));
        intent.local_vrfs.insert("s2s".to_string(), VrfIntent::default());
        let ns = run(&intent, &observed()).unwrap();

        assert_eq!(ns.vrf("cluster").unwrap().table_id, 10);
        assert_eq!(ns.vrf("mgmt").unwrap().table_id, 11);
        // observed table kept, new ones allocated in name order
        assert_eq!(ns.vrf("s2s").unwrap().table_id, 50);
        assert_eq!(ns.vrf("b2b").unwrap().table_id, 51);
        assert_eq!(ns.vrf("m2m").unwrap().table_id, 52);

        let m2m = ns.vrf("m2m").unwrap();
        let bridge = m2m.interfaces.bridge("br.m2m").unwrap();
        assert_eq!(bridge.mtu, Some(9000));
        assert_eq!(bridge.ethernet.as_ref().unwrap().mac_address, "02:54:0a:32:00:0a");
        assert_eq!(
            bridge.network_stack.as_ref().unwrap().ipv6.as_ref().unwrap().address_generation_mode,
            Some(AddressGenMode::NoLinkLocal)
        );
        assert_eq!(bridge.slaves[0].slave, "vx.m2m");
        assert_eq!(bridge.slaves[0].hairpin, Some(true));
        assert_eq!(bridge.slaves[0].neighbor_suppress, Some(false));
        let vxlan = ns.interfaces.vxlan("vx.m2m").unwrap();
        assert_eq!(vxlan.vni, 2_002_026);

        // no VNI wiring for local and reserved VRFs
        assert!(ns.vrf("s2s").unwrap().interfaces.bridges.is_empty());
        assert!(ns.interfaces.vxlan("vx.cluster").is_none());
        assert!(ns.interfaces.vxlan("vx.s2s").is_none());
    }

    #[test]
    fn test_loopbacks_and_tunnels() {
        let intent = NodeIntent::from_yaml(
            r"
localVRFs:
  s2s:
    loopbacks:
      lo.s2s: { ipAddresses: [10.9.9.9/32, 'fd00:9::9/128'] }
    greTunnels:
      gre0: { destinationAddress: 192.0.2.77, encapsulationKey: 7 }
      tap0: { layer: Layer2, sourceAddress: 10.9.9.9, destinationAddress: 192.0.2.78 }
",
        )
        .unwrap();
        let ns = run(&intent, &observed()).unwrap();
        let intfs = &ns.vrf("s2s").unwrap().interfaces;
        let lo = &intfs.loopbacks[0];
        assert_eq!(lo.name, "lo.s2s");
        assert_eq!(lo.ipv4.as_ref().unwrap().addresses[0].ip, "10.9.9.9/32");
        assert_eq!(lo.ipv6.as_ref().unwrap().addresses[0].ip, "fd00:9::9/128");
        assert_eq!(intfs.gres[0].name, "gre0");
        assert_eq!(intfs.gres[0].mtu, Some(1500));
        assert_eq!(intfs.gres[0].key_both, Some(7));
        assert_eq!(intfs.gretaps[0].gre.local.as_deref(), Some("10.9.9.9"));
        assert_eq!(intfs.gretaps[0].gre.remote.as_deref(), Some("192.0.2.78"));
    }

    #[test]
    fn test_name_too_long() {
        let mut intent = NodeIntent::default();
        intent
            .local_vrfs
            .insert("abcdefghijklm".to_string(), VrfIntent::default());
        assert_eq!(
            run(&intent, &observed()).unwrap_err(),
            CompileError::NameTooLong {
                name: "abcdefghijklm".to_string(),
                max: 12
            }
        );
    }

    #[test]
    fn test_missing_reserved_table() {
        let observed = ObservedTables::new().set_table("cluster", 10);
        assert_eq!(
            run(&NodeIntent::default(), &observed).unwrap_err(),
            CompileError::MissingReservedTable("mgmt".to_string())
        );
    }

    #[test]
    fn test_declared_twice() {
        let mut intent = NodeIntent::default();
        intent.fabric_vrfs.insert("m2m".to_string(), fabric(1));
        intent.local_vrfs.insert("m2m".to_string(), VrfIntent::default());
        assert!(matches!(
            run(&intent, &observed()),
            Err(CompileError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_too_many_vrfs() {
        let mut intent = NodeIntent::default();
        for i in 0..31 {
            intent.local_vrfs.insert(format!("v{i:02}"), VrfIntent::default());
        }
        assert_eq!(
            run(&intent, &ObservedTables::new().set_table("cluster", 10).set_table("mgmt", 11))
                .unwrap_err(),
            CompileError::NoFreeTable { start: 50, end: 80 }
        );
    }
}
