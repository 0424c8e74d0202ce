// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Compiler of the network intent of a node into the configuration tree of its vrouter.
//!
//! The compilation is a pure function of the base configuration, the node intent and
//! the VRF table ids observed on the device. It either produces a complete, canonical
//! tree for the work namespace (the one owning the trunk interface) or fails: no
//! partial tree is ever returned.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod addressing;
mod bgp;
pub mod errors;
pub mod factory;
pub mod filter;
mod layer2;
mod layer3;
pub mod namegen;
pub mod options;
pub mod pipeline;
pub mod policy;
pub mod tables;

use tracing::{info, instrument};

use intent::{BaseConfig, NodeIntent};
use vrouter::{Canonicalize, VRouter};

pub use errors::{CompileError, CompileResult}; // re-export
pub use options::{CompileOptions, CompileOptionsBuilder}; // re-export
pub use pipeline::{Pipeline, Stage}; // re-export

use pipeline::CompileContext;
use tables::ObservedTables;

/// Inputs of one compilation
#[derive(Clone, Copy, Debug)]
pub struct CompileInput<'a> {
    pub base: &'a BaseConfig,
    pub intent: &'a NodeIntent,
    /// device tree, as last observed
    pub observed: &'a VRouter,
}

impl<'a> CompileInput<'a> {
    #[must_use]
    pub fn new(base: &'a BaseConfig, intent: &'a NodeIntent, observed: &'a VRouter) -> Self {
        Self {
            base,
            intent,
            observed,
        }
    }
}

/// Compile the intent of a node with all the stages
pub fn compile(input: &CompileInput, options: &CompileOptions) -> CompileResult<VRouter> {
    compile_with(input, options, &Pipeline::default())
}

/// Compile the intent of a node with the given stages
#[instrument(level = "debug", skip_all)]
pub fn compile_with(
    input: &CompileInput,
    options: &CompileOptions,
    pipeline: &Pipeline,
) -> CompileResult<VRouter> {
    let base = input.base;
    base.validate()
        .map_err(|e| CompileError::invalid(e.to_string()))?;

    let trunk = &base.trunk_interface_name;
    let work_ns = input.observed.find_work_namespace(trunk).ok_or_else(|| {
        CompileError::NamespaceNotFound(format!("no namespace owns trunk interface {trunk}"))
            .logged()
    })?;
    let observed = ObservedTables::from_vrouter(input.observed, work_ns)?;

    let mut ctx = CompileContext::new(base, input.intent, options, &observed, work_ns);
    pipeline.run(&mut ctx)?;
    let mut tree = ctx.finish();
    tree.canonicalize();
    info!("Compiled configuration of namespace {work_ns}");
    Ok(tree)
}
