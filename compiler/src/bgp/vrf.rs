// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! BGP instances of the reserved, fabric and local VRFs, with their static routes,
//! VRF imports and policy-based routing rules.

use tracing::debug;

use intent::{
    BaseConfig, BaseVrf, FabricVrf, PolicyRoute, Redistribute, StaticRoute as StaticIntent,
    Vrf as VrfIntent, VrfImport,
};
use vrouter::Namespace;
use vrouter::bgp::{
    AddressFamily, Advertisement, Bgp, Evpn, EvpnExport, EvpnImport, Protocol, Unicast,
};
use vrouter::namespace::Vrf;
use vrouter::policy::{RouteMapMatch, RouteMapSeq};
use vrouter::routing::{NextHop, Rule, RuleAction, RuleMatch, StaticRoute};

use crate::addressing::IpFamily;
use crate::errors::{CompileError, CompileResult};
use crate::filter::{compile_filter, item_seq};
use crate::namegen::{self, RM_EXPORT_LOCAL};
use crate::pipeline::CompileContext;
use crate::policy::PolicyRegistry;

use super::neighbor;

type FamilyRoute = (IpFamily, StaticRoute);

/// A VRF instance: redistributes connected and static routes, imports other VRFs
/// through its import route-map.
fn vrf_instance(base: &BaseConfig, vrf: &str, l3vni: Option<u32>) -> Bgp {
    let import_rmap = namegen::import_route_map(vrf);
    Bgp {
        asn: base.local_asn.to_string(),
        router_id: Some(base.vtep_loopback_ip),
        suppress_duplicates: Some(false),
        l3vni,
        address_family: Some(AddressFamily {
            ipv4_unicast: Some(Unicast::vrf_default(&import_rmap)),
            ipv6_unicast: Some(Unicast::vrf_default(&import_rmap)),
            l2vpn_evpn: None,
        }),
        ..Default::default()
    }
}

fn evpn(advertise_rmap: &str, export: Vec<String>, import: Vec<String>) -> Evpn {
    Evpn {
        advertisement: Some(Advertisement::with_route_map(advertise_rmap)),
        export: Some(EvpnExport::new(export)),
        import: Some(EvpnImport::new(import)),
        ..Default::default()
    }
}

/// EVPN of a reserved VRF: its single route target both ways
fn reserved_evpn(conf: &BaseVrf) -> Evpn {
    let rts = vec![conf.evpn_route_target.clone()];
    evpn(RM_EXPORT_LOCAL, rts.clone(), rts)
}

fn lookup_vrf<'a>(ns: &'a mut Namespace, name: &str) -> CompileResult<&'a mut Vrf> {
    let Namespace {
        name: ns_name,
        vrfs,
        ..
    } = ns;
    vrfs.iter_mut()
        .find(|vrf| vrf.name == name)
        .ok_or_else(|| CompileError::vrf_not_found(name, ns_name))
}

fn check_imports(ns: &Namespace, imports: &[VrfImport]) -> CompileResult<()> {
    match imports.iter().find(|imp| ns.vrf(&imp.from_vrf).is_none()) {
        Some(imp) => Err(CompileError::vrf_not_found(&imp.from_vrf, &ns.name)),
        None => Ok(()),
    }
}

fn convert_static_route(route: &StaticIntent) -> CompileResult<FamilyRoute> {
    let family = IpFamily::of(&route.prefix)?;
    let next_hop = match &route.next_hop {
        Some(nh) => match (&nh.vrf, &nh.address) {
            (Some(vrf), _) => NextHop {
                next_hop: vrf.clone(),
                vrf: Some(vrf.clone()),
            },
            (None, Some(address)) => NextHop::new(address),
            (None, None) => NextHop::blackhole(),
        },
        None => NextHop::blackhole(),
    };
    Ok((family, StaticRoute::new(&route.prefix, next_hop)))
}

fn add_static_routes(vrf: &mut Vrf, routes: impl IntoIterator<Item = FamilyRoute>) {
    let statics = vrf.routing_mut().statics_mut();
    for (family, route) in routes {
        match family {
            IpFamily::V4 => statics.ipv4.push(route),
            IpFamily::V6 => statics.ipv6.push(route),
        }
    }
}

fn apply_redistribute(
    policies: &mut PolicyRegistry,
    vrf: &str,
    bgp: &mut Bgp,
    conf: &Redistribute,
) -> CompileResult<()> {
    let connected = conf
        .connected
        .as_ref()
        .map(|f| compile_filter(policies, &namegen::redistribute_connected_filter(vrf), f))
        .transpose()?;
    let statics = conf
        .static_
        .as_ref()
        .map(|f| compile_filter(policies, &namegen::redistribute_static_filter(vrf), f))
        .transpose()?;
    for unicast in bgp.unicast_mut() {
        unicast.set_redistribute_route_map(Protocol::Connected, connected.as_deref());
        unicast.set_redistribute_route_map(Protocol::Static, statics.as_deref());
    }
    Ok(())
}

/// Chain the filter of each import into the import route-map of `vrf`
fn apply_imports(
    policies: &mut PolicyRegistry,
    vrf: &str,
    bgp: &mut Bgp,
    imports: &[VrfImport],
) -> CompileResult<()> {
    let import_rmap = namegen::import_route_map(vrf);
    for (index, import) in imports.iter().enumerate() {
        let filter = namegen::import_filter(vrf, &import.from_vrf);
        policies.upsert_route_map(
            &import_rmap,
            [RouteMapSeq::permit(item_seq(index)?)
                .set_match(RouteMapMatch::source_vrf(&import.from_vrf))
                .set_call(&namegen::route_map(&filter))],
        )?;
        compile_filter(policies, &filter, &import.filter)?;
        for unicast in bgp.unicast_mut() {
            unicast.add_imported_vrf(&import.from_vrf);
        }
    }
    Ok(())
}

/// Apply the intent of a VRF to its instance. Returns the static routes to install.
fn apply_vrf_intent(
    policies: &mut PolicyRegistry,
    vrf: &str,
    bgp: &mut Bgp,
    conf: &VrfIntent,
    with_peers: bool,
) -> CompileResult<Vec<FamilyRoute>> {
    if let Some(redistribute) = &conf.redistribute {
        apply_redistribute(policies, vrf, bgp, redistribute)?;
    }
    let routes = conf
        .static_routes
        .iter()
        .map(convert_static_route)
        .collect::<CompileResult<Vec<_>>>()?;
    apply_imports(policies, vrf, bgp, &conf.vrf_imports)?;
    if with_peers {
        for peer in &conf.bgp_peers {
            neighbor::add_peer(policies, bgp, vrf, peer)?;
        }
    }
    Ok(routes)
}

fn install(
    ns: &mut Namespace,
    name: &str,
    bgp: Bgp,
    routes: Vec<FamilyRoute>,
) -> CompileResult<()> {
    let vrf = lookup_vrf(ns, name)?;
    vrf.routing_mut().bgp = Some(bgp);
    add_static_routes(vrf, routes);
    Ok(())
}

fn non_empty(s: Option<&String>) -> Option<&str> {
    s.map(String::as_str).filter(|s| !s.is_empty())
}

/// Policy-based routing rules steering matching traffic into the table of the
/// next-hop VRF. Priorities follow the declaration order, from 1.
fn policy_rules(
    ns: &Namespace,
    trunk: &str,
    routes: &[PolicyRoute],
) -> CompileResult<Vec<(IpFamily, Rule)>> {
    let mut rules = Vec::with_capacity(routes.len());
    for (index, route) in routes.iter().enumerate() {
        let source = non_empty(route.traffic_match.src_prefix.as_ref());
        let destination = non_empty(route.traffic_match.dst_prefix.as_ref());
        let Some(selector) = source.or(destination) else {
            return Err(CompileError::invalid("policy route without prefix match"));
        };
        let Some(nh_vrf) = non_empty(route.next_hop.vrf.as_ref()) else {
            return Err(CompileError::invalid("policy route without next-hop VRF"));
        };
        let table = ns
            .vrf(nh_vrf)
            .ok_or_else(|| CompileError::vrf_not_found(nh_vrf, &ns.name))?
            .table_id;
        let priority = u32::try_from(index + 1)
            .map_err(|_| CompileError::invalid("too many policy routes"))?;
        let family = IpFamily::of(selector)?;
        let rule = Rule {
            priority,
            matches: Some(RuleMatch {
                inbound_interface: (family == IpFamily::V4).then(|| trunk.to_owned()),
                source: source.map(str::to_owned),
                destination: destination.map(str::to_owned),
            }),
            action: Some(RuleAction { lookup: table }),
        };
        rules.push((family, rule));
    }
    Ok(rules)
}

pub(crate) fn generate_management_bgp(ctx: &mut CompileContext) -> CompileResult<()> {
    let base = ctx.base;
    let name = base.management_vrf.name.as_str();
    let conf = ctx.intent.fabric_vrfs.get(name).map(|fabric| &fabric.vrf);
    if let Some(conf) = conf {
        check_imports(&ctx.ns, &conf.vrf_imports)?;
    }
    debug!("Management VRF {name} instance with VNI {}", base.management_vrf.vni);

    let mut bgp = vrf_instance(base, name, Some(base.management_vrf.vni));
    for unicast in bgp.unicast_mut() {
        unicast.add_imported_vrf(&base.cluster_vrf.name);
    }
    bgp.af_mut().l2vpn_evpn = Some(reserved_evpn(&base.management_vrf));
    // sessions of the management VRF are not configured from the intent
    let routes = match conf {
        Some(conf) => apply_vrf_intent(&mut ctx.policies, name, &mut bgp, conf, false)?,
        None => vec![],
    };
    install(&mut ctx.ns, name, bgp, routes)
}

pub(crate) fn generate_cluster_bgp(ctx: &mut CompileContext) -> CompileResult<()> {
    let base = ctx.base;
    let name = base.cluster_vrf.name.as_str();
    let conf = ctx.intent.cluster_vrf.as_ref();
    let rules = match conf {
        Some(conf) => {
            check_imports(&ctx.ns, &conf.vrf_imports)?;
            policy_rules(&ctx.ns, &base.trunk_interface_name, &conf.policy_routes)?
        }
        None => vec![],
    };
    debug!("Cluster VRF {name} instance with VNI {}", base.cluster_vrf.vni);

    let mut bgp = vrf_instance(base, name, Some(base.cluster_vrf.vni));
    for unicast in bgp.unicast_mut() {
        unicast.add_imported_vrf(&base.management_vrf.name);
    }
    bgp.af_mut().l2vpn_evpn = Some(reserved_evpn(&base.cluster_vrf));

    let mut routes = Vec::new();
    for cidr in &base.export_cidrs {
        routes.push((IpFamily::of(cidr)?, StaticRoute::new(cidr, NextHop::blackhole())));
    }
    for neigh in &base.cluster_neighbors {
        if let Some(ip) = &neigh.ip {
            let family = IpFamily::of(ip)?;
            let host = format!("{ip}/{}", family.max_prefix_len());
            routes.push((
                family,
                StaticRoute::new(&host, NextHop::new(&base.trunk_interface_name)),
            ));
        }
        neighbor::add_base_neighbor(&mut bgp, neigh, false);
    }
    if let Some(conf) = conf {
        routes.extend(apply_vrf_intent(&mut ctx.policies, name, &mut bgp, conf, true)?);
    }
    install(&mut ctx.ns, name, bgp, routes)?;

    let pbr = ctx.ns.routing_mut().pbr_mut();
    for (family, rule) in rules {
        match family {
            IpFamily::V4 => pbr.ipv4.push(rule),
            IpFamily::V6 => pbr.ipv6.push(rule),
        }
    }
    Ok(())
}

fn generate_fabric_vrf(
    ctx: &mut CompileContext,
    name: &str,
    conf: &FabricVrf,
) -> CompileResult<()> {
    check_imports(&ctx.ns, &conf.vrf.vrf_imports)?;
    debug!("Fabric VRF {name} instance with VNI {}", conf.vni);

    let mut bgp = vrf_instance(ctx.base, name, Some(conf.vni));
    let advertise = match &conf.evpn_export_filter {
        Some(filter) => compile_filter(&mut ctx.policies, &namegen::export_filter(name), filter)?,
        None => RM_EXPORT_LOCAL.to_owned(),
    };
    bgp.af_mut().l2vpn_evpn = Some(evpn(
        &advertise,
        conf.evpn_export_route_targets.clone(),
        conf.evpn_import_route_targets.clone(),
    ));
    let routes = apply_vrf_intent(&mut ctx.policies, name, &mut bgp, &conf.vrf, true)?;
    install(&mut ctx.ns, name, bgp, routes)
}

pub(crate) fn generate_fabric_bgp(ctx: &mut CompileContext) -> CompileResult<()> {
    let base = ctx.base;
    let intent = ctx.intent;
    for (name, conf) in &intent.fabric_vrfs {
        if base.is_reserved_vrf(name) {
            continue;
        }
        generate_fabric_vrf(ctx, name, conf)?;
    }
    Ok(())
}

pub(crate) fn generate_local_bgp(ctx: &mut CompileContext) -> CompileResult<()> {
    let base = ctx.base;
    let intent = ctx.intent;
    for (name, conf) in &intent.local_vrfs {
        if base.is_reserved_vrf(name) {
            continue;
        }
        check_imports(&ctx.ns, &conf.vrf_imports)?;
        debug!("Local VRF {name} instance");
        let mut bgp = vrf_instance(base, name, None);
        let routes = apply_vrf_intent(&mut ctx.policies, name, &mut bgp, conf, true)?;
        install(&mut ctx.ns, name, bgp, routes)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use intent::NodeIntent;
    use pretty_assertions::assert_eq;
    use vrouter::VRouter;

    use crate::layer3;
    use crate::options::CompileOptions;
    use crate::tables::ObservedTables;

    const BASE: &str = r#"
vtepLoopbackIP: 10.50.0.10
trunkInterfaceName: hbn
exportCIDRs: [10.250.0.0/16, "fd94:685b:30cf::/48"]
managementVRF: { name: mgmt, vni: 20, evpnRouteTarget: "64497:20" }
clusterVRF: { name: cluster, vni: 30, evpnRouteTarget: "64497:30" }
localASN: 64497
clusterNeighbors:
  - { ip: 10.250.0.2, remoteASN: "64510", keepaliveTime: 3, holdTime: 9, ipv4: true }
  - { ip: "fd94:685b:30cf::2", remoteASN: "64510", keepaliveTime: 3, holdTime: 9, ipv6: true }
"#;

    fn compile(intent: &str) -> CompileResult<(VRouter, PolicyRegistry)> {
        let base = BaseConfig::from_yaml(BASE).unwrap();
        let intent = NodeIntent::from_yaml(intent).unwrap();
        let options = CompileOptions::default();
        let observed = ObservedTables::new()
            .set_table("cluster", 10)
            .set_table("mgmt", 11);
        let mut ctx = CompileContext::new(&base, &intent, &options, &observed, "hbn");
        layer3::generate(&mut ctx)?;
        generate_management_bgp(&mut ctx)?;
        generate_cluster_bgp(&mut ctx)?;
        generate_fabric_bgp(&mut ctx)?;
        generate_local_bgp(&mut ctx)?;
        let policies = std::mem::take(&mut ctx.policies);
        Ok((ctx.finish(), policies))
    }

    fn bgp<'a>(tree: &'a VRouter, vrf: &str) -> &'a Bgp {
        tree.namespaces[0]
            .vrf(vrf)
            .unwrap()
            .routing
            .as_ref()
            .unwrap()
            .bgp
            .as_ref()
            .unwrap()
    }

    #[test]
    fn test_reserved_vrfs() {
        let (tree, _) = compile("{}").unwrap();
        let mgmt = bgp(&tree, "mgmt");
        assert_eq!(mgmt.l3vni, Some(20));
        let v4 = mgmt.address_family.as_ref().unwrap().ipv4_unicast.as_ref().unwrap();
        let import = v4.vrf_import.as_ref().unwrap();
        assert_eq!(import.vrfs, vec!["cluster"]);
        assert_eq!(import.route_maps, vec!["rm_mgmt_import"]);
        let evpn = mgmt.address_family.as_ref().unwrap().l2vpn_evpn.as_ref().unwrap();
        assert_eq!(evpn.export.as_ref().unwrap().route_targets, vec!["64497:20"]);

        let cluster = tree.namespaces[0].vrf("cluster").unwrap();
        let statics = cluster.routing.as_ref().unwrap().statics.as_ref().unwrap();
        let v4: Vec<&str> = statics.ipv4.iter().map(|r| r.destination.as_str()).collect();
        assert_eq!(v4, vec!["10.250.0.0/16", "10.250.0.2/32"]);
        assert_eq!(statics.ipv4[0].next_hops[0].next_hop, "blackhole");
        assert_eq!(statics.ipv4[1].next_hops[0].next_hop, "hbn");
        assert_eq!(statics.ipv6[1].destination, "fd94:685b:30cf::2/128");
        let cluster = bgp(&tree, "cluster");
        assert!(cluster.neighbor("10.250.0.2").is_some());
        assert!(cluster.neighbor("fd94:685b:30cf::2").is_some());
    }

    #[test]
    fn test_fabric_vrf() {
        let (tree, policies) = compile(
            r#"
fabricVRFs:
  m2m:
    vni: 2002026
    evpnImportRouteTargets: ["65188:2026"]
    evpnExportRouteTargets: ["65188:2027"]
    evpnExportFilter:
      items:
        - matcher: { prefix: { prefix: 10.250.0.0/16, le: 32 } }
          action: { type: accept }
      defaultAction: { type: reject }
    redistribute:
      connected:
        defaultAction: { type: accept }
    staticRoutes:
      - prefix: 0.0.0.0/0
        nextHop: { address: 10.250.4.1 }
      - prefix: "::/0"
        nextHop: { vrf: cluster }
    vrfImports:
      - fromVRF: cluster
        filter:
          defaultAction: { type: accept }
"#,
        )
        .unwrap();
        let m2m = bgp(&tree, "m2m");
        assert_eq!(m2m.l3vni, Some(2_002_026));
        let af = m2m.address_family.as_ref().unwrap();
        let evpn = af.l2vpn_evpn.as_ref().unwrap();
        let advertised = evpn.advertisement.as_ref().unwrap();
        assert_eq!(
            advertised.ipv4_unicast.as_ref().unwrap().route_map.as_deref(),
            Some("rm_m2m_export")
        );
        assert_eq!(evpn.import.as_ref().unwrap().route_targets, vec!["65188:2026"]);
        assert_eq!(evpn.export.as_ref().unwrap().route_targets, vec!["65188:2027"]);

        let v6 = af.ipv6_unicast.as_ref().unwrap();
        let connected = v6
            .redistribute
            .iter()
            .find(|r| r.protocol == Protocol::Connected)
            .unwrap();
        assert_eq!(connected.route_map.as_deref(), Some("rm_m2m_redist_connected"));
        assert_eq!(v6.vrf_import.as_ref().unwrap().vrfs, vec!["cluster"]);

        let import = policies.route_map("rm_m2m_import").unwrap();
        assert_eq!(import.seqs[0].num, 10);
        assert_eq!(import.seqs[0].call.as_deref(), Some("rm_m2m_import_cluster"));
        assert!(policies.route_map("rm_m2m_import_cluster").is_some());

        let vrf = tree.namespaces[0].vrf("m2m").unwrap();
        let statics = vrf.routing.as_ref().unwrap().statics.as_ref().unwrap();
        assert_eq!(statics.ipv4[0].next_hops[0].next_hop, "10.250.4.1");
        assert_eq!(statics.ipv6[0].next_hops[0].vrf.as_deref(), Some("cluster"));
    }

    #[test]
    fn test_local_vrf_has_no_evpn() {
        let (tree, _) = compile(
            r"
localVRFs:
  s2s:
    staticRoutes:
      - prefix: 10.9.0.0/16
",
        )
        .unwrap();
        let s2s = bgp(&tree, "s2s");
        assert!(s2s.l3vni.is_none());
        assert!(s2s.address_family.as_ref().unwrap().l2vpn_evpn.is_none());
        let vrf = tree.namespaces[0].vrf("s2s").unwrap();
        let statics = vrf.routing.as_ref().unwrap().statics.as_ref().unwrap();
        assert_eq!(statics.ipv4[0].next_hops[0].next_hop, "blackhole");
    }

    #[test]
    fn test_policy_routes() {
        let (tree, _) = compile(
            r"
localVRFs:
  s2s: {}
clusterVRF:
  policyRoutes:
    - trafficMatch: { srcPrefix: 10.250.1.0/24 }
      nextHop: { vrf: s2s }
    - trafficMatch: { dstPrefix: 'fd94:685b:30cf:1::/64' }
      nextHop: { vrf: s2s }
",
        )
        .unwrap();
        let pbr = tree.namespaces[0]
            .routing
            .as_ref()
            .unwrap()
            .pbr
            .as_ref()
            .unwrap();
        let v4 = &pbr.ipv4[0];
        assert_eq!(v4.priority, 1);
        assert_eq!(v4.action.as_ref().unwrap().lookup, 50);
        let matches = v4.matches.as_ref().unwrap();
        assert_eq!(matches.inbound_interface.as_deref(), Some("hbn"));
        assert_eq!(matches.source.as_deref(), Some("10.250.1.0/24"));
        let v6 = &pbr.ipv6[0];
        assert_eq!(v6.priority, 2);
        assert!(v6.matches.as_ref().unwrap().inbound_interface.is_none());
    }

    #[test]
    fn test_policy_route_errors() {
        let res = compile(
            r"
clusterVRF:
  policyRoutes:
    - trafficMatch: {}
      nextHop: { vrf: mgmt }
",
        );
        assert!(matches!(res, Err(CompileError::InvalidSpec(_))));

        let res = compile(
            r"
clusterVRF:
  policyRoutes:
    - trafficMatch: { srcPrefix: 10.250.1.0/24 }
      nextHop: { vrf: nope }
",
        );
        assert!(matches!(res, Err(CompileError::VrfNotFound { .. })));
    }

    #[test]
    fn test_missing_import_source() {
        let res = compile(
            r"
localVRFs:
  s2s:
    vrfImports:
      - fromVRF: b2b
        filter:
          defaultAction: { type: accept }
",
        );
        assert_eq!(
            res.err(),
            Some(CompileError::VrfNotFound {
                vrf: "b2b".to_string(),
                namespace: "hbn".to_string()
            })
        );
    }
}
