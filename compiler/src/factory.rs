// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Object factory: builds the interface and VRF objects of the device tree and
//! splices them into their interface set.

use intent::BaseConfig;
use vrouter::Namespace;
use vrouter::interfaces::{
    Bridge, BridgeSlave, Ethernet, Interfaces, IpAddressList, NetworkStack, Vlan, Vxlan,
};
use vrouter::namespace::Vrf;
use vrouter::routing::{Routing, StaticRouting};

use crate::addressing::{IpFamily, underlay_mac};
use crate::errors::CompileResult;
use crate::namegen;

pub const VXLAN_PORT: u16 = 4789;
pub const DEFAULT_MTU: u32 = 9000;

/// Node-wide parameters the factory stamps on the objects it builds
#[derive(Clone, Debug)]
pub struct Factory {
    loopback: String,
    underlay_mac: String,
    trunk: String,
}

impl Factory {
    #[must_use]
    pub fn new(base: &BaseConfig) -> Self {
        Self {
            loopback: base.vtep_loopback_ip.to_string(),
            underlay_mac: underlay_mac(base.vtep_loopback_ip),
            trunk: base.trunk_interface_name.clone(),
        }
    }
    #[must_use]
    pub fn underlay_mac(&self) -> &str {
        &self.underlay_mac
    }

    /// Build a bridge. Without an explicit MAC, `underlay_rmac` gives it the underlay
    /// router MAC. Unless `assign_eui` is set, no link-local address is generated.
    #[must_use]
    pub fn bridge(
        &self,
        name: &str,
        mac: Option<&str>,
        mtu: u32,
        underlay_rmac: bool,
        assign_eui: bool,
    ) -> Bridge {
        let mac = match mac {
            Some(mac) => Some(mac.to_owned()),
            None if underlay_rmac => Some(self.underlay_mac.clone()),
            None => None,
        };
        Bridge {
            name: name.to_owned(),
            mtu: Some(mtu),
            ethernet: mac.map(|mac_address| Ethernet { mac_address }),
            network_stack: (!assign_eui).then(NetworkStack::no_link_local),
            ..Default::default()
        }
    }

    /// Build a VXLAN over the underlay and the bridge slave that enslaves it
    #[must_use]
    pub fn vxlan(
        &self,
        name: &str,
        vni: u32,
        mtu: u32,
        hairpin: bool,
        neigh_suppress: bool,
    ) -> (Vxlan, BridgeSlave) {
        let vxlan = Vxlan {
            name: name.to_owned(),
            vni,
            mtu: Some(mtu),
            port: Some(VXLAN_PORT),
            local: Some(self.loopback.clone()),
            learning: Some(false),
            ethernet: Some(Ethernet {
                mac_address: self.underlay_mac.clone(),
            }),
            network_stack: Some(NetworkStack::no_link_local()),
            link_interface: Some(namegen::UNDERLAY_INTERFACE.to_owned()),
            ..Default::default()
        };
        let slave = BridgeSlave {
            slave: name.to_owned(),
            learning: Some(false),
            neighbor_suppress: Some(neigh_suppress),
            hairpin: Some(hairpin),
        };
        (vxlan, slave)
    }

    /// Build the VLAN sub-interface of the trunk and the bridge slave that enslaves it
    #[must_use]
    pub fn vlan(&self, vlan_id: u16, mtu: u32) -> (Vlan, BridgeSlave) {
        let vlan = Vlan {
            name: namegen::vlan(vlan_id),
            vlan_id,
            link_interface: self.trunk.clone(),
            mtu: Some(mtu),
            network_stack: Some(NetworkStack::no_link_local()),
        };
        let slave = BridgeSlave {
            slave: vlan.name.clone(),
            ..Default::default()
        };
        (vlan, slave)
    }
}

/// Append a VRF to the namespace. Its routing block replaces the device's one.
pub fn create_vrf<'a>(ns: &'a mut Namespace, name: &str, table_id: u32) -> &'a mut Vrf {
    let idx = ns.vrfs.len();
    ns.vrfs.push(Vrf {
        name: name.to_owned(),
        table_id,
        routing: Some(Routing {
            statics: Some(StaticRouting::default()),
            bgp: Some(vrouter::bgp::Bgp::default()),
            ..Routing::replace()
        }),
        interfaces: Interfaces::default(),
    });
    &mut ns.vrfs[idx]
}

pub fn add_bridge(intfs: &mut Interfaces, bridge: Bridge) -> &mut Bridge {
    let idx = intfs.bridges.len();
    intfs.bridges.push(bridge);
    &mut intfs.bridges[idx]
}

pub fn add_vxlan(intfs: &mut Interfaces, vxlan: Vxlan) -> &mut Vxlan {
    let idx = intfs.vxlans.len();
    intfs.vxlans.push(vxlan);
    &mut intfs.vxlans[idx]
}

pub fn add_vlan(intfs: &mut Interfaces, vlan: Vlan) -> &mut Vlan {
    let idx = intfs.vlans.len();
    intfs.vlans.push(vlan);
    &mut intfs.vlans[idx]
}

/// Bucket addresses by family. Empty lists come back as `None`.
pub fn ip_lists(
    addrs: &[String],
) -> CompileResult<(Option<IpAddressList>, Option<IpAddressList>)> {
    let mut ipv4 = IpAddressList::default();
    let mut ipv6 = IpAddressList::default();
    for addr in addrs {
        match IpFamily::of(addr)? {
            IpFamily::V4 => ipv4.push(addr),
            IpFamily::V6 => ipv6.push(addr),
        }
    }
    Ok((ipv4.into_option(), ipv6.into_option()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;
    use vrouter::Operation;
    use vrouter::interfaces::AddressGenMode;

    fn factory() -> Factory {
        Factory {
            loopback: Ipv4Addr::new(10, 50, 0, 10).to_string(),
            underlay_mac: underlay_mac(Ipv4Addr::new(10, 50, 0, 10)),
            trunk: "hbn".to_string(),
        }
    }

    #[test]
    fn test_bridge() {
        let factory = factory();
        let br = factory.bridge("br.m2m", None, DEFAULT_MTU, true, false);
        assert_eq!(br.mtu, Some(9000));
        assert_eq!(br.ethernet.unwrap().mac_address, "02:54:0a:32:00:0a");
        let stack = br.network_stack.unwrap();
        assert_eq!(
            stack.ipv6.unwrap().address_generation_mode,
            Some(AddressGenMode::NoLinkLocal)
        );

        let br = factory.bridge("l2.501", Some("1a:ee:cf:2f:a7:a8"), 1500, false, true);
        assert_eq!(br.ethernet.unwrap().mac_address, "1a:ee:cf:2f:a7:a8");
        assert!(br.network_stack.is_none());

        let br = factory.bridge("l2.502", None, 1500, false, true);
        assert!(br.ethernet.is_none());
    }

    #[test]
    fn test_vxlan_and_vlan() {
        let factory = factory();
        let (vxlan, slave) = factory.vxlan("vx.4000002", 4_000_002, 1500, false, true);
        assert_eq!(vxlan.port, Some(4789));
        assert_eq!(vxlan.local.as_deref(), Some("10.50.0.10"));
        assert_eq!(vxlan.link_interface.as_deref(), Some("dum.underlay"));
        assert_eq!(vxlan.learning, Some(false));
        assert_eq!(slave.slave, "vx.4000002");
        assert_eq!(slave.neighbor_suppress, Some(true));
        assert_eq!(slave.hairpin, Some(false));

        let (vlan, slave) = factory.vlan(501, 1500);
        assert_eq!(vlan.name, "vlan.501");
        assert_eq!(vlan.link_interface, "hbn");
        assert_eq!(
            slave,
            BridgeSlave {
                slave: "vlan.501".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_create_vrf() {
        let mut ns = Namespace::new("hbn");
        let vrf = create_vrf(&mut ns, "m2m", 50);
        vrf.interfaces.bridges.push(Bridge::default());
        let routing = vrf.routing.as_ref().unwrap();
        assert_eq!(routing.operation, Some(Operation::Replace));
        assert!(routing.bgp.is_some());
        assert!(routing.statics.is_some());
        assert_eq!(ns.vrf("m2m").unwrap().interfaces.bridges.len(), 1);
    }

    #[test]
    fn test_ip_lists() {
        let addrs = vec![
            "10.250.0.1/24".to_string(),
            "fd94:685b:30cf:501::1/64".to_string(),
            "10.250.1.1/24".to_string(),
        ];
        let (v4, v6) = ip_lists(&addrs).unwrap();
        assert_eq!(v4.unwrap().addresses.len(), 2);
        assert_eq!(v6.unwrap().addresses[0].ip, "fd94:685b:30cf:501::1/64");

        let (v4, v6) = ip_lists(&[]).unwrap();
        assert!(v4.is_none() && v6.is_none());
        assert!(ip_lists(&["bogus".to_string()]).is_err());
    }
}
