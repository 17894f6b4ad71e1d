use std::collections::HashSet;

use crate::error::{DispenserError, DispenserResult};
use crate::territory::{AssignmentRecord, Stats, Territory, TerritoryId};

/// Catalog plus assignment bookkeeping.
///
/// Not synchronized; [`crate::Dispenser`] puts it behind a lock. Timestamps
/// are passed in so the state stays deterministic under test.
#[derive(Debug, Clone, Default)]
pub struct AllocatorState {
    catalog: Vec<Territory>,
    assigned_ids: HashSet<TerritoryId>,
    assignments: Vec<AssignmentRecord>,
    last_assigned_at: u64,
}

impl AllocatorState {
    pub fn new(catalog: Vec<Territory>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn list(&self) -> &[Territory] {
        &self.catalog
    }

    pub fn stats(&self) -> Stats {
        let active = self.catalog.iter().filter(|t| t.active).count();
        Stats::compute(active, self.assigned_ids.len())
    }

    pub fn get_by_id(&self, id: TerritoryId) -> Option<&Territory> {
        self.catalog.iter().find(|t| t.id == id)
    }

    pub fn is_assigned(&self, id: TerritoryId) -> bool {
        self.assigned_ids.contains(&id)
    }

    pub fn assignments(&self) -> &[AssignmentRecord] {
        &self.assignments
    }

    /// First active, unassigned territory in catalog order.
    pub fn assign_next(&mut self, now_ms: u64) -> Option<Territory> {
        let next = self
            .catalog
            .iter()
            .find(|t| t.active && !self.assigned_ids.contains(&t.id))?
            .clone();
        self.record(next.id, now_ms);
        Some(next)
    }

    /// Capacity check and assignment as one step.
    pub fn claim(&mut self, now_ms: u64) -> DispenserResult<Territory> {
        if self.stats().remaining == 0 {
            return Err(DispenserError::Exhausted);
        }
        self.assign_next(now_ms)
            .ok_or(DispenserError::NoEligibleTerritory)
    }

    /// Assigns `id` whether or not it is active. Already-assigned ids are
    /// refused so no territory carries two live assignment records.
    pub fn assign_specific(
        &mut self,
        id: TerritoryId,
        now_ms: u64,
    ) -> DispenserResult<AssignmentRecord> {
        if self.get_by_id(id).is_none() {
            return Err(DispenserError::NotFound(id));
        }
        if self.assigned_ids.contains(&id) {
            return Err(DispenserError::AlreadyAssigned(id));
        }
        Ok(self.record(id, now_ms))
    }

    /// Returns the new `active` value.
    pub fn toggle_active(&mut self, id: TerritoryId) -> DispenserResult<bool> {
        let territory = self
            .catalog
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DispenserError::NotFound(id))?;
        territory.active = !territory.active;
        Ok(territory.active)
    }

    /// Returns how many assignments were cleared.
    pub fn reset(&mut self) -> usize {
        let cleared = self.assignments.len();
        self.assigned_ids.clear();
        self.assignments.clear();
        cleared
    }

    fn record(&mut self, id: TerritoryId, now_ms: u64) -> AssignmentRecord {
        // Wall clocks can step backwards; assignment times must not.
        let assigned_at = now_ms.max(self.last_assigned_at);
        self.last_assigned_at = assigned_at;
        self.assigned_ids.insert(id);
        let record = AssignmentRecord {
            territory_id: id,
            assigned_at,
        };
        self.assignments.push(record);
        record
    }
}
