// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The configuration tree of a vrouter device. The same model is used for the
//! configuration we compile and for the configuration observed on the device, so
//! that both can be compared once canonicalized.

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

pub mod bgp;
pub mod canonical;
pub mod interfaces;
pub mod namespace;
pub mod policy;
pub mod routing;

pub use canonical::Canonicalize; // re-export
pub use namespace::{Namespace, VRouter, Vrf}; // re-export
pub use routing::{GlobalRouting, Operation, Routing}; // re-export
