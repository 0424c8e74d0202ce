// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device configuration model: the root of the tree, namespaces and VRFs

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::interfaces::Interfaces;
use crate::routing::{GlobalRouting, Routing};

/// A VRF (l3vrf) living inside a namespace
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vrf {
    pub name: String,
    #[serde(default)]
    pub table_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
    #[serde(rename = "interface", default, skip_serializing_if = "Interfaces::is_empty")]
    pub interfaces: Interfaces,
}

/// A network namespace. The work namespace holds the fabric VRFs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
    #[serde(rename = "interface", default, skip_serializing_if = "Interfaces::is_empty")]
    pub interfaces: Interfaces,
    #[serde(rename = "l3vrf", default, skip_serializing_if = "Vec::is_empty")]
    pub vrfs: Vec<Vrf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VRouter {
    #[serde(rename = "vrf", default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<Namespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<GlobalRouting>,
}

impl Vrf {
    pub fn routing_mut(&mut self) -> &mut Routing {
        self.routing.get_or_insert_with(Routing::default)
    }
}

impl Namespace {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }
    #[must_use]
    pub fn vrf(&self, name: &str) -> Option<&Vrf> {
        self.vrfs.iter().find(|vrf| vrf.name == name)
    }
    pub fn vrf_mut(&mut self, name: &str) -> Option<&mut Vrf> {
        self.vrfs.iter_mut().find(|vrf| vrf.name == name)
    }
    pub fn routing_mut(&mut self) -> &mut Routing {
        self.routing.get_or_insert_with(Routing::default)
    }
    /// Tell if the interface is an infrastructure interface of this namespace,
    /// directly or in one of its VRFs.
    #[must_use]
    pub fn has_infrastructure(&self, name: &str) -> bool {
        self.interfaces.has_infrastructure(name)
            || self
                .vrfs
                .iter()
                .any(|vrf| vrf.interfaces.has_infrastructure(name))
    }
}

impl VRouter {
    /// Load a tree, typically the configuration observed on a device
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(yaml)
    }
    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }
    pub fn namespace_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.namespaces.iter_mut().find(|ns| ns.name == name)
    }
    /// Find the namespace the fabric lives in: the one owning the trunk interface
    #[must_use]
    pub fn find_work_namespace(&self, trunk: &str) -> Option<&str> {
        let found = self
            .namespaces
            .iter()
            .find(|ns| ns.has_infrastructure(trunk))
            .map(|ns| ns.name.as_str());
        debug!("Work namespace for trunk {trunk}: {found:?}");
        found
    }
}
