// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Base (site) configuration: the node-independent parameters of the fabric

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, error};

use crate::errors::IntentError;

/// One of the two reserved VRFs (management and cluster) that are pre-provisioned on
/// every device and whose VNI and route target are fixed per site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseVrf {
    pub name: String,
    pub vni: u32,
    pub evpn_route_target: String,
}

/// A BGP neighbor of the base configuration: either an underlay peer (spine)
/// or a cluster neighbor. Exactly one of `ip` or `interface` is expected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseNeighbor {
    pub ip: Option<String>,
    pub interface: Option<String>,
    pub update_source: Option<String>,
    #[serde(rename = "remoteASN")]
    pub remote_asn: String,
    #[serde(rename = "localASN")]
    pub local_asn: Option<String>,
    pub keepalive_time: u32,
    pub hold_time: u32,
    pub bfd_min_timer: Option<u32>,
    pub ipv4: bool,
    pub ipv6: bool,
    pub evpn: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseConfig {
    #[serde(rename = "vtepLoopbackIP")]
    pub vtep_loopback_ip: Ipv4Addr,
    pub trunk_interface_name: String,
    #[serde(rename = "exportCIDRs", default)]
    pub export_cidrs: Vec<String>,
    #[serde(rename = "managementVRF")]
    pub management_vrf: BaseVrf,
    #[serde(rename = "clusterVRF")]
    pub cluster_vrf: BaseVrf,
    #[serde(rename = "localASN")]
    pub local_asn: u32,
    #[serde(default)]
    pub underlay_neighbors: Vec<BaseNeighbor>,
    #[serde(default)]
    pub cluster_neighbors: Vec<BaseNeighbor>,
}

impl BaseConfig {
    /// Parse and validate a base config from its YAML representation.
    pub fn from_yaml(yaml: &str) -> Result<Self, IntentError> {
        let config: BaseConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a base config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IntentError> {
        let path = path.as_ref();
        debug!("Loading base config from {}", path.display());
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| IntentError::Io(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<(), IntentError> {
        if self.trunk_interface_name.is_empty() {
            let msg = "trunk interface name is empty".to_string();
            error!("{msg}");
            return Err(IntentError::InvalidBaseConfig(msg));
        }
        if self.management_vrf.name == self.cluster_vrf.name {
            let msg = format!(
                "management and cluster VRFs share the name '{}'",
                self.cluster_vrf.name
            );
            error!("{msg}");
            return Err(IntentError::InvalidBaseConfig(msg));
        }
        Ok(())
    }

    /// Tell if a VRF name is one of the two reserved VRFs.
    #[must_use]
    pub fn is_reserved_vrf(&self, name: &str) -> bool {
        name == self.management_vrf.name || name == self.cluster_vrf.name
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // valid in tests
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE: &str = r#"
vtepLoopbackIP: 10.50.0.10
trunkInterfaceName: hbn
exportCIDRs: ["10.100.0.0/24", "fdcb:f93c:3a3e::/64"]
managementVRF: { name: mgmt, vni: 20, evpnRouteTarget: "64497:20" }
clusterVRF: { name: cluster, vni: 30, evpnRouteTarget: "64497:30" }
localASN: 64497
underlayNeighbors:
  - interface: ens3
    remoteASN: "65500"
    localASN: "65501"
    keepaliveTime: 30
    holdTime: 90
    ipv4: true
clusterNeighbors:
  - ip: 10.100.0.10
    updateSource: 169.254.100.100
    remoteASN: "65170"
    keepaliveTime: 30
    holdTime: 90
    ipv4: true
"#;

    #[test]
    fn test_base_config_from_yaml() {
        let base = BaseConfig::from_yaml(BASE).unwrap();
        assert_eq!(base.vtep_loopback_ip, Ipv4Addr::new(10, 50, 0, 10));
        assert_eq!(base.trunk_interface_name, "hbn");
        assert_eq!(base.export_cidrs.len(), 2);
        assert_eq!(base.cluster_vrf.evpn_route_target, "64497:30");
        assert_eq!(base.underlay_neighbors[0].interface.as_deref(), Some("ens3"));
        assert_eq!(base.underlay_neighbors[0].local_asn.as_deref(), Some("65501"));
        assert!(!base.underlay_neighbors[0].evpn);
        assert_eq!(
            base.cluster_neighbors[0].update_source.as_deref(),
            Some("169.254.100.100")
        );
        assert!(base.is_reserved_vrf("mgmt"));
        assert!(base.is_reserved_vrf("cluster"));
        assert!(!base.is_reserved_vrf("m2m"));
    }

    #[test]
    fn test_base_config_rejects_ipv6_loopback() {
        let yaml = BASE.replace("10.50.0.10", "fd00::10");
        assert!(matches!(
            BaseConfig::from_yaml(&yaml),
            Err(IntentError::Yaml(_))
        ));
    }

    #[test]
    fn test_base_config_rejects_shared_reserved_names() {
        let yaml = BASE.replace("name: mgmt", "name: cluster");
        assert!(matches!(
            BaseConfig::from_yaml(&yaml),
            Err(IntentError::InvalidBaseConfig(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = BaseConfig::load("/nonexistent/base.yaml").unwrap_err();
        assert!(matches!(err, IntentError::Io(..)));
        assert!(err.to_string().starts_with("Failed to read '/nonexistent/base.yaml': "));
    }
}
