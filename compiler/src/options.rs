// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Compiler tunables

use derive_builder::Builder;
use std::ops::Range;

/// First VRF table id handed out to fabric and local VRFs
pub const VRF_TABLE_START: u32 = 50;
/// End (excluded) of the VRF table id range
pub const VRF_TABLE_END: u32 = 80;
/// Default neighbor table base reachable time, in milliseconds
pub const DEFAULT_BASE_REACHABLE_TIME: u32 = 30_000;

#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct CompileOptions {
    /// Enable neighbor suppression on the VXLANs of segments that have an anycast gateway
    pub neigh_suppression: bool,
    /// Base reachable time set on the neighbor tables of layer-2 bridges
    pub base_reachable_time_ms: u32,
    /// Table ids available to fabric and local VRFs
    pub vrf_tables: Range<u32>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            neigh_suppression: true,
            base_reachable_time_ms: DEFAULT_BASE_REACHABLE_TIME,
            vrf_tables: VRF_TABLE_START..VRF_TABLE_END,
        }
    }
}

impl CompileOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(range) = self.vrf_tables.as_ref().filter(|range| range.is_empty()) {
            return Err(format!("empty VRF table range {range:?}"));
        }
        if self.base_reachable_time_ms == Some(0) {
            return Err("base reachable time must not be zero".to_string());
        }
        Ok(())
    }
}
