//! Curve Registry
//!
//! Index of every curve the engine manages: primary map from id to the
//! per-curve cell handle, a unique owner index (one curve per owner), and
//! per-state id lists maintained on every transition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use lib_types::{CurveId, Timestamp};

use crate::config::EngineConfig;
use crate::curve::CurveCell;
use crate::types::{CurveError, CurveResult, CurveState, Owner};

/// Shared handle to one curve's lockable state
pub type CellHandle = Arc<Mutex<CurveCell>>;

/// All curves, keyed by id with an exclusive owner index
#[derive(Debug, Default)]
pub struct CurveRegistry {
    /// Primary map
    cells: HashMap<CurveId, CellHandle>,

    /// Owner -> curve; ownership is 1:1
    owner_index: HashMap<Owner, CurveId>,

    /// Per-state id lists
    active: Vec<CurveId>,
    frozen: Vec<CurveId>,
    launched: Vec<CurveId>,

    /// Lifetime counters
    total_created: u64,
    total_frozen: u64,
    total_launched: u64,
}

impl CurveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and index a curve for an owner
    ///
    /// Fails with `DuplicateCurve` when the owner already has one, launched
    /// curves included (the record is history, the ownership slot stays
    /// taken).
    pub fn create(
        &mut self,
        owner: Owner,
        config: EngineConfig,
        created_at: Timestamp,
    ) -> CurveResult<CellHandle> {
        if self.owner_index.contains_key(&owner) {
            return Err(CurveError::DuplicateCurve);
        }

        let cell = CurveCell::new(owner, config, created_at);
        let id = cell.curve.id;
        let handle = Arc::new(Mutex::new(cell));

        self.cells.insert(id, Arc::clone(&handle));
        self.owner_index.insert(owner, id);
        self.active.push(id);
        self.total_created += 1;

        tracing::info!(curve = %id, owner = %owner, "curve created");
        Ok(handle)
    }

    pub fn get(&self, id: &CurveId) -> Option<CellHandle> {
        self.cells.get(id).map(Arc::clone)
    }

    pub fn get_by_owner(&self, owner: &Owner) -> Option<CellHandle> {
        self.owner_index.get(owner).and_then(|id| self.get(id))
    }

    pub fn contains(&self, id: &CurveId) -> bool {
        self.cells.contains_key(id)
    }

    /// Move a curve between state lists after a committed transition
    ///
    /// The cell itself is the source of truth for state; this only maintains
    /// the listing indexes and counters.
    pub fn update_state(&mut self, id: &CurveId, from: CurveState, to: CurveState) {
        match from {
            CurveState::Active => self.active.retain(|c| c != id),
            CurveState::Frozen => self.frozen.retain(|c| c != id),
            CurveState::Launched => self.launched.retain(|c| c != id),
        }
        match to {
            CurveState::Active => self.active.push(*id),
            CurveState::Frozen => {
                self.frozen.push(*id);
                self.total_frozen += 1;
            }
            CurveState::Launched => {
                self.launched.push(*id);
                self.total_launched += 1;
            }
        }
    }

    /// Curve ids currently in the given state
    pub fn ids_by_state(&self, state: CurveState) -> Vec<CurveId> {
        match state {
            CurveState::Active => self.active.clone(),
            CurveState::Frozen => self.frozen.clone(),
            CurveState::Launched => self.launched.clone(),
        }
    }

    pub fn count_by_state(&self, state: CurveState) -> usize {
        match state {
            CurveState::Active => self.active.len(),
            CurveState::Frozen => self.frozen.len(),
            CurveState::Launched => self.launched.len(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.cells.len()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_created: self.total_created,
            active: self.active.len() as u64,
            frozen: self.frozen.len() as u64,
            launched: self.launched.len() as u64,
            total_frozen: self.total_frozen,
            total_launched: self.total_launched,
        }
    }
}

/// Registry-wide counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_created: u64,
    pub active: u64,
    pub frozen: u64,
    pub launched: u64,
    pub total_frozen: u64,
    pub total_launched: u64,
}

// ============================================================================
// TESTS
// ============================================================================
