//! Authoritative tower state management utilities.

use pirate_defence_core::{GridTile, ShotState, TowerId, TowerSnapshot, UnitId};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Tile occupied by the tower.
    pub(crate) tile: GridTile,
    /// Current firing state.
    pub(crate) shot: ShotState,
}

impl TowerState {
    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            tile: self.tile,
            shot: self.shot,
        }
    }

    pub(crate) fn targets(&self, unit: UnitId) -> bool {
        matches!(self.shot, ShotState::InFlight(projectile) if projectile.target == unit)
    }
}

/// Registry that stores towers in placement order and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: Vec<TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Appends a freshly armed tower on the provided tile.
    pub(crate) fn insert(&mut self, tile: GridTile) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        self.entries.push(TowerState {
            id,
            tile,
            shot: ShotState::Ready,
        });
        id
    }

    /// Removes the tower standing on the provided tile.
    pub(crate) fn remove_at(&mut self, tile: GridTile) -> Option<TowerState> {
        let index = self.entries.iter().position(|tower| tower.tile == tile)?;
        Some(self.entries.remove(index))
    }

    pub(crate) fn is_occupied(&self, tile: GridTile) -> bool {
        self.entries.iter().any(|tower| tower.tile == tile)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.iter_mut().find(|tower| tower.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
