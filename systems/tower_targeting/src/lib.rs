#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use glam::Vec2;
use pirate_defence_core::{TowerTarget, TowerView, UnitId, UnitView, TOWER_RANGE};

/// Tower targeting system that reuses a scratch buffer to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    unit_workspace: Vec<UnitCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes targets for every ready tower.
    ///
    /// Each ready tower picks the visible pirate closest to its center on the
    /// ground plane; ties keep the pirate that comes first in roster order.
    /// Towers whose closest pirate is beyond range stay ready. The output
    /// buffer is cleared before populating it with the latest assignments.
    pub fn handle(&mut self, towers: &TowerView, units: &UnitView, out: &mut Vec<TowerTarget>) {
        out.clear();

        self.prepare_unit_workspace(units);
        if self.unit_workspace.is_empty() {
            return;
        }

        for tower in towers.iter().filter(|tower| tower.is_ready()) {
            let center = tower.tile.center();
            let mut best: Option<(UnitId, f32)> = None;
            for candidate in &self.unit_workspace {
                let distance = center.distance(candidate.ground);
                if best.map_or(true, |(_, closest)| distance < closest) {
                    best = Some((candidate.id, distance));
                }
            }

            if let Some((unit, distance)) = best {
                if distance <= TOWER_RANGE {
                    out.push(TowerTarget {
                        tower: tower.id,
                        unit,
                    });
                }
            }
        }
    }

    fn prepare_unit_workspace(&mut self, units: &UnitView) {
        self.unit_workspace.clear();
        for unit in units.iter() {
            if !unit.visible || unit.marked {
                continue;
            }
            if let Some(position) = unit.position() {
                self.unit_workspace.push(UnitCandidate {
                    id: unit.id,
                    ground: Vec2::new(position.x, position.z),
                });
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct UnitCandidate {
    id: UnitId,
    ground: Vec2,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use glam::Vec3;
    use pirate_defence_core::{
        GridTile, ShotState, TowerId, TowerSnapshot, Transform, UnitPose, UnitSnapshot,
    };

    use super::*;

    fn unit(id: u32, position: Vec3, visible: bool) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            spawn_at: Duration::ZERO,
            life: 5,
            visible,
            marked: false,
            pose: Some(UnitPose {
                segment: 0,
                position,
                limbs: [Transform::IDENTITY; 4],
            }),
        }
    }

    fn tower(id: u32, tile: GridTile) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            tile,
            shot: ShotState::Ready,
        }
    }

    #[test]
    fn ties_prefer_the_lowest_roster_entry() {
        let towers = TowerView::from_snapshots(vec![tower(0, GridTile::new(0, 4))]);
        let units = UnitView::from_snapshots(vec![
            unit(3, Vec3::new(2.0, 0.0, 14.0), true),
            unit(1, Vec3::new(2.0, 0.0, 22.0), true),
        ]);
        let mut targeting = TowerTargeting::new();
        let mut out = Vec::new();
        targeting.handle(&towers, &units, &mut out);
        assert_eq!(
            out,
            vec![TowerTarget {
                tower: TowerId::new(0),
                unit: UnitId::new(3),
            }]
        );
    }

    #[test]
    fn hidden_units_are_ignored() {
        let towers = TowerView::from_snapshots(vec![tower(0, GridTile::new(0, 4))]);
        let units = UnitView::from_snapshots(vec![unit(0, Vec3::new(2.0, 0.0, 18.0), false)]);
        let mut targeting = TowerTargeting::new();
        let mut out = vec![TowerTarget {
            tower: TowerId::new(9),
            unit: UnitId::new(9),
        }];
        targeting.handle(&towers, &units, &mut out);
        assert!(out.is_empty());
    }
}
