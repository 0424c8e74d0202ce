// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Address family classification and MAC address derivation

use ipnet::IpNet;
use mac_address::MacAddress;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::errors::{CompileError, CompileResult};

/// Prefix of the MAC addresses derived from the VTEP loopback
const MAC_PREFIX: [u8; 2] = [0x02, 0x54];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Classify an address literal, with or without prefix length
    pub fn of(addr: &str) -> CompileResult<Self> {
        let ip = match IpNet::from_str(addr) {
            Ok(net) => net.addr(),
            Err(_) => IpAddr::from_str(addr).map_err(|_| {
                CompileError::invalid(format!("'{addr}' is not an IP address or prefix"))
            })?,
        };
        Ok(match ip {
            IpAddr::V4(_) => IpFamily::V4,
            IpAddr::V6(_) => IpFamily::V6,
        })
    }

    /// Length of a host prefix
    #[must_use]
    pub fn max_prefix_len(self) -> u8 {
        match self {
            IpFamily::V4 => 32,
            IpFamily::V6 => 128,
        }
    }
}

/// The MAC address used on the underlay side of bridges and VXLANs: a locally
/// administered prefix followed by the four bytes of the VTEP loopback.
#[must_use]
pub fn underlay_mac(loopback: Ipv4Addr) -> String {
    let [a, b, c, d] = loopback.octets();
    let mac = MacAddress::new([MAC_PREFIX[0], MAC_PREFIX[1], a, b, c, d]);
    mac.to_string().to_lowercase()
}

/// Validate a MAC address given in the intent and normalize its notation
pub fn normalize_mac(mac: &str) -> CompileResult<String> {
    MacAddress::from_str(mac)
        .map(|mac| mac.to_string().to_lowercase())
        .map_err(|e| CompileError::invalid(format!("bad MAC address '{mac}': {e}")))
}
