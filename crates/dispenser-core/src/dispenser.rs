use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::allocator::AllocatorState;
use crate::catalog::CatalogSource;
use crate::clock::{Clock, SystemClock};
use crate::error::DispenserResult;
use crate::territory::{AssignmentRecord, Stats, Territory, TerritoryId};

/// Shared handle to one allocator.
///
/// The catalog is read from its source on first use, exactly once. Every
/// mutation holds the write lock for its whole read-then-write sequence, so
/// concurrent callers never receive the same territory. Reads share the
/// read lock and always see a fully applied state.
#[derive(Clone)]
pub struct Dispenser {
    inner: Arc<DispenserInner>,
}

struct DispenserInner {
    source: Box<dyn CatalogSource>,
    clock: Arc<dyn Clock>,
    state: OnceLock<RwLock<AllocatorState>>,
}

impl std::fmt::Debug for Dispenser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispenser")
            .field("source", &self.inner.source.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Dispenser {
    pub fn new(source: impl CatalogSource + 'static) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: impl CatalogSource + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(DispenserInner {
                source: Box::new(source),
                clock,
                state: OnceLock::new(),
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.state.get().is_some()
    }

    /// Forces the catalog load. Later calls are no-ops.
    pub fn preload(&self) {
        let _ = self.state();
    }

    fn state(&self) -> &RwLock<AllocatorState> {
        self.inner.state.get_or_init(|| {
            let origin = self.inner.source.describe();
            match self.inner.source.load() {
                Ok(catalog) => {
                    tracing::info!(source = %origin, territories = catalog.len(), "loaded territory catalog");
                    RwLock::new(AllocatorState::new(catalog))
                }
                Err(err) => {
                    tracing::error!(source = %origin, error = %err, "failed to load territories; continuing with empty catalog");
                    RwLock::new(AllocatorState::default())
                }
            }
        })
    }

    pub fn list(&self) -> Vec<Territory> {
        self.state().read().list().to_vec()
    }

    pub fn stats(&self) -> Stats {
        self.state().read().stats()
    }

    pub fn get_by_id(&self, id: TerritoryId) -> Option<Territory> {
        self.state().read().get_by_id(id).cloned()
    }

    pub fn assignments(&self) -> Vec<AssignmentRecord> {
        self.state().read().assignments().to_vec()
    }

    pub fn assign_next(&self) -> Option<Territory> {
        let now_ms = self.inner.clock.now_ms();
        let assigned = self.state().write().assign_next(now_ms);
        match &assigned {
            Some(t) => tracing::info!(territory_id = t.id, "territory assigned"),
            None => tracing::debug!("no territory available"),
        }
        assigned
    }

    /// Checks capacity and assigns under one lock acquisition.
    pub fn claim(&self) -> DispenserResult<Territory> {
        let now_ms = self.inner.clock.now_ms();
        let outcome = self.state().write().claim(now_ms);
        match &outcome {
            Ok(t) => tracing::info!(territory_id = t.id, "territory claimed"),
            Err(err) => tracing::info!(error = %err, "claim refused"),
        }
        outcome
    }

    pub fn assign_specific(&self, id: TerritoryId) -> DispenserResult<AssignmentRecord> {
        let now_ms = self.inner.clock.now_ms();
        let outcome = self.state().write().assign_specific(id, now_ms);
        match &outcome {
            Ok(_) => tracing::info!(territory_id = id, "territory assigned manually"),
            Err(err) => tracing::warn!(territory_id = id, error = %err, "manual assignment refused"),
        }
        outcome
    }

    pub fn toggle_active(&self, id: TerritoryId) -> DispenserResult<bool> {
        let outcome = self.state().write().toggle_active(id);
        match &outcome {
            Ok(active) => tracing::info!(territory_id = id, active, "territory toggled"),
            Err(err) => tracing::warn!(territory_id = id, error = %err, "toggle refused"),
        }
        outcome
    }

    pub fn reset(&self) -> usize {
        let cleared = self.state().write().reset();
        tracing::info!(cleared, "assignments reset");
        cleared
    }
}
