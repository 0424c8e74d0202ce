// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! BGP stages: the global policy objects, the instance of the default VRF and the
//! instances of the reserved, fabric and local VRFs.

mod global;
mod neighbor;
mod vrf;

pub(crate) use global::{generate_default_bgp, generate_global_policies};
pub(crate) use vrf::{
    generate_cluster_bgp, generate_fabric_bgp, generate_local_bgp, generate_management_bgp,
};
