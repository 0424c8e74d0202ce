// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! VRF table-id assignment. Table ids observed on the device are kept for as long
//! as their VRF is declared, so that a VRF keeps its table across reconciliations.

use multi_index_map::MultiIndexMap;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, info, warn};

use vrouter::VRouter;

use crate::errors::{CompileError, CompileResult};

/// Snapshot of the VRF table ids of the work namespace, as configured on the device
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObservedTables {
    tables: BTreeMap<String, u32>,
}

impl ObservedTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Extract the table ids of the VRFs of namespace `work_ns` of an observed tree
    pub fn from_vrouter(tree: &VRouter, work_ns: &str) -> CompileResult<Self> {
        let ns = tree
            .namespace(work_ns)
            .ok_or_else(|| CompileError::NamespaceNotFound(work_ns.to_owned()).logged())?;
        let tables = ns
            .vrfs
            .iter()
            .map(|vrf| (vrf.name.clone(), vrf.table_id))
            .collect::<BTreeMap<_, _>>();
        debug!("Observed {} VRF tables in namespace {work_ns}", tables.len());
        Ok(Self { tables })
    }
    #[must_use]
    pub fn set_table(mut self, vrf: &str, table_id: u32) -> Self {
        self.tables.insert(vrf.to_owned(), table_id);
        self
    }
    #[must_use]
    pub fn table(&self, vrf: &str) -> Option<u32> {
        self.tables.get(vrf).copied()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.tables.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, MultiIndexMap)]
#[multi_index_derive(Clone, Debug, Default)]
pub struct TableAssignment {
    #[multi_index(hashed_unique)]
    pub vrf: String,
    #[multi_index(ordered_unique)]
    pub table_id: u32,
}

/// The table ids in use and the range new ones are allocated from. Both the
/// VRF names and the table ids of the assignments are unique.
#[derive(Clone, Debug)]
pub struct TableIdPool {
    range: Range<u32>,
    assignments: MultiIndexTableAssignmentMap,
}

impl TableIdPool {
    /// Seed a pool with observed assignments. Reserved VRFs may have table ids out of
    /// `range`: they are kept and looked up, but never allocated.
    #[must_use]
    pub fn new(range: Range<u32>, observed: &ObservedTables) -> Self {
        let mut pool = Self {
            range,
            assignments: MultiIndexTableAssignmentMap::default(),
        };
        for (vrf, table_id) in observed.iter() {
            if pool.assignments.get_by_table_id(&table_id).is_some() {
                warn!("Observed VRF {vrf} shares table {table_id} with another VRF, ignoring it");
                continue;
            }
            pool.assignments.insert(TableAssignment {
                vrf: vrf.to_owned(),
                table_id,
            });
        }
        pool
    }

    /// Drop the assignments of the VRFs for which `keep` is false, freeing their table
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        let stale: Vec<String> = self
            .assignments
            .iter_by_table_id()
            .map(|assignment| assignment.vrf.clone())
            .filter(|vrf| !keep(vrf))
            .collect();
        for vrf in stale {
            if let Some(gone) = self.assignments.remove_by_vrf(&vrf) {
                debug!("Dropping stale table {} of VRF {vrf}", gone.table_id);
            }
        }
    }

    #[must_use]
    pub fn lookup(&self, vrf: &str) -> Option<u32> {
        self.assignments
            .get_by_vrf(&vrf.to_owned())
            .map(|assignment| assignment.table_id)
    }

    /// Get the table of a VRF, allocating the lowest free one in range if it has none
    pub fn allocate(&mut self, vrf: &str) -> CompileResult<u32> {
        if let Some(table_id) = self.lookup(vrf) {
            return Ok(table_id);
        }
        let Some(table_id) = self
            .range
            .clone()
            .find(|id| self.assignments.get_by_table_id(id).is_none())
        else {
            return Err(CompileError::NoFreeTable {
                start: self.range.start,
                end: self.range.end,
            }
            .logged());
        };
        info!("Allocated table {table_id} to VRF {vrf}");
        self.assignments.insert(TableAssignment {
            vrf: vrf.to_owned(),
            table_id,
        });
        Ok(table_id)
    }

    /// Assignments sorted by table id
    pub fn assignments(&self) -> impl Iterator<Item = (&str, u32)> {
        self.assignments
            .iter_by_table_id()
            .map(|assignment| (assignment.vrf.as_str(), assignment.table_id))
    }
}
