// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The ordered compilation stages and the state they share

use std::fmt::Display;
use tracing::debug;

use intent::{BaseConfig, NodeIntent};
use vrouter::bgp::Bgp;
use vrouter::{Namespace, Routing, VRouter};

use crate::errors::CompileResult;
use crate::factory::Factory;
use crate::options::CompileOptions;
use crate::policy::PolicyRegistry;
use crate::tables::ObservedTables;
use crate::{bgp, layer2, layer3};

/// State of one compilation: inputs, the work namespace being built and the
/// registry of the named policy objects.
pub(crate) struct CompileContext<'a> {
    pub(crate) base: &'a BaseConfig,
    pub(crate) intent: &'a NodeIntent,
    pub(crate) options: &'a CompileOptions,
    pub(crate) observed: &'a ObservedTables,
    pub(crate) factory: Factory,
    pub(crate) ns: Namespace,
    pub(crate) policies: PolicyRegistry,
}

impl<'a> CompileContext<'a> {
    pub(crate) fn new(
        base: &'a BaseConfig,
        intent: &'a NodeIntent,
        options: &'a CompileOptions,
        observed: &'a ObservedTables,
        work_ns: &str,
    ) -> Self {
        let mut ns = Namespace::new(work_ns);
        ns.routing = Some(Routing {
            bgp: Some(Bgp::default()),
            ..Routing::replace()
        });
        Self {
            base,
            intent,
            options,
            observed,
            factory: Factory::new(base),
            ns,
            policies: PolicyRegistry::new(),
        }
    }

    /// The tree built by the stages
    pub(crate) fn finish(self) -> VRouter {
        VRouter {
            namespaces: vec![self.ns],
            routing: Some(self.policies.into_global_routing()),
        }
    }
}

/// Compilation stages. VRF objects and table ids must exist before any stage
/// refers to a VRF, and the global policy objects before the BGP instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Layer3,
    Layer2,
    GlobalPolicy,
    DefaultBgp,
    ManagementBgp,
    ClusterBgp,
    FabricBgp,
    LocalBgp,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Layer3,
        Stage::Layer2,
        Stage::GlobalPolicy,
        Stage::DefaultBgp,
        Stage::ManagementBgp,
        Stage::ClusterBgp,
        Stage::FabricBgp,
        Stage::LocalBgp,
    ];

    pub(crate) fn run(self, ctx: &mut CompileContext) -> CompileResult<()> {
        debug!("Running stage {self}...");
        match self {
            Stage::Layer3 => layer3::generate(ctx),
            Stage::Layer2 => layer2::generate(ctx),
            Stage::GlobalPolicy => bgp::generate_global_policies(ctx),
            Stage::DefaultBgp => bgp::generate_default_bgp(ctx),
            Stage::ManagementBgp => bgp::generate_management_bgp(ctx),
            Stage::ClusterBgp => bgp::generate_cluster_bgp(ctx),
            Stage::FabricBgp => bgp::generate_fabric_bgp(ctx),
            Stage::LocalBgp => bgp::generate_local_bgp(ctx),
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Layer3 => "layer-3",
            Stage::Layer2 => "layer-2",
            Stage::GlobalPolicy => "global-policy",
            Stage::DefaultBgp => "default-bgp",
            Stage::ManagementBgp => "management-bgp",
            Stage::ClusterBgp => "cluster-bgp",
            Stage::FabricBgp => "fabric-bgp",
            Stage::LocalBgp => "local-bgp",
        };
        write!(f, "{name}")
    }
}

/// An ordered list of stages
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            stages: Stage::ALL.to_vec(),
        }
    }
}

impl Pipeline {
    /// The stages up to and including `last`
    #[must_use]
    pub fn until(last: Stage) -> Self {
        Self {
            stages: Stage::ALL.into_iter().take_while(|s| *s <= last).collect(),
        }
    }
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
    /// Run the stages in order, stopping at the first failure
    pub(crate) fn run(&self, ctx: &mut CompileContext) -> CompileResult<()> {
        for stage in &self.stages {
            stage.run(ctx)?;
        }
        Ok(())
    }
}
