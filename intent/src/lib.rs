// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Input models for the vrouter configuration compiler. The base (site) configuration
//! is loaded once by the caller and is the same for every node. The node intent is the
//! per-node declaration of VRFs, layer-2 segments, peers and policies, as produced by
//! the reconciler. Both are plain data: validating them is the compiler's job.

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
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]

pub mod base;
pub mod errors;
pub mod filter;
pub mod node;

pub use base::{BaseConfig, BaseNeighbor, BaseVrf}; // re-export
pub use errors::IntentError; // re-export
pub use filter::{
    Action, ActionKind, CommunityMatcher, Filter, FilterItem, Matcher, ModifyRoute, PrefixMatcher,
}; // re-export
pub use node::{
    AddressFamily, BgpPeer, FabricVrf, GreLayer, GreTunnel, Irb, Layer2, Loopback, NextHop,
    NodeIntent, PolicyRoute, Redistribute, StaticRoute, TrafficMatch, Vrf, VrfImport,
}; // re-export
