#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that fires projectiles from targeting data and flies them to impact.

use std::time::Duration;

use glam::Vec3;
use pirate_defence_core::{
    Command, ShotGuidance, ShotState, TowerTarget, TowerView, UnitView, AIM_OFFSET,
    IMPACT_RADIUS, PROJECTILE_SPEED,
};

/// Tower combat system that queues firing commands and advances projectiles.
#[derive(Debug, Default)]
pub struct TowerCombat {
    guidance: ShotGuidance,
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system steering projectiles with the provided guidance.
    #[must_use]
    pub fn new(guidance: ShotGuidance) -> Self {
        Self {
            guidance,
            scratch: Vec::new(),
        }
    }

    /// Guidance mode applied to projectiles in flight.
    #[must_use]
    pub fn guidance(&self) -> ShotGuidance {
        self.guidance
    }

    /// Emits `Command::FireProjectile` entries for towers that locked onto a pirate.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() {
            return;
        }

        self.scratch.clear();
        for target in tower_targets {
            let ready = towers
                .iter()
                .any(|tower| tower.id == target.tower && tower.is_ready());
            if ready {
                self.scratch.push(Command::FireProjectile {
                    tower: target.tower,
                    target: target.unit,
                });
            }
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    /// Advances every in-flight projectile and resolves impacts and misses.
    ///
    /// Projectiles travel from the tower muzzle at constant speed. A projectile
    /// that comes within the impact radius of its target's aim point hits; a
    /// locked projectile that flies past the aim point without hitting misses.
    pub fn advance(
        &mut self,
        clock: Duration,
        towers: &TowerView,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        for tower in towers.iter() {
            let ShotState::InFlight(projectile) = tower.shot else {
                continue;
            };
            let Some(aim) = units
                .get(projectile.target)
                .and_then(|unit| unit.position())
                .map(|position| position + Vec3::new(0.0, AIM_OFFSET, 0.0))
            else {
                debug_assert!(false, "tower {:?} targets a unit without a pose", tower.id);
                continue;
            };

            let muzzle = tower.muzzle();
            let range = muzzle.distance(aim);
            let mut travelled =
                clock.saturating_sub(projectile.fired_at).as_secs_f32() * PROJECTILE_SPEED;
            let direction = match self.guidance {
                ShotGuidance::Locked => projectile.direction,
                ShotGuidance::Tracking => {
                    // A homing shot cannot fly past its target.
                    travelled = travelled.min(range);
                    (aim - muzzle).normalize_or_zero()
                }
            };
            let position = muzzle + direction * travelled;

            if position.distance(aim) < IMPACT_RADIUS {
                out.push(Command::ResolveImpact { tower: tower.id });
            } else if travelled > range + IMPACT_RADIUS {
                out.push(Command::DiscardProjectile { tower: tower.id });
            } else {
                out.push(Command::AdvanceProjectile {
                    tower: tower.id,
                    position,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pirate_defence_core::{
        GridTile, ProjectileSnapshot, TowerId, TowerSnapshot, Transform, UnitId, UnitPose,
        UnitSnapshot,
    };

    #[test]
    fn firing_skips_busy_or_missing_towers() {
        let mut system = TowerCombat::default();
        let towers = TowerView::from_snapshots(vec![
            ready_tower(2),
            busy_tower(3, Vec3::ZERO),
            ready_tower(5),
        ]);
        let targets = vec![target(2, 4), target(3, 9), target(5, 1), target(42, 3)];
        let mut out = Vec::new();

        system.handle(&towers, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    tower: TowerId::new(2),
                    target: UnitId::new(4),
                },
                Command::FireProjectile {
                    tower: TowerId::new(5),
                    target: UnitId::new(1),
                },
            ],
        );
    }

    #[test]
    fn locked_projectile_overshooting_a_fleeing_target_misses() {
        let mut system = TowerCombat::new(ShotGuidance::Locked);
        // Fired straight up; the target sits far to the side of that line.
        let towers = TowerView::from_snapshots(vec![busy_tower(0, Vec3::Y)]);
        let units = UnitView::from_snapshots(vec![unit(0, Vec3::new(8.0, -2.35, 18.0))]);
        let mut out = Vec::new();

        system.advance(Duration::from_secs(3), &towers, &units, &mut out);

        assert_eq!(out, vec![Command::DiscardProjectile { tower: TowerId::new(0) }]);
    }

    #[test]
    fn tracking_projectile_homes_in_on_the_target() {
        let mut system = TowerCombat::new(ShotGuidance::Tracking);
        let towers = TowerView::from_snapshots(vec![busy_tower(0, Vec3::Y)]);
        let units = UnitView::from_snapshots(vec![unit(0, Vec3::new(8.0, -2.35, 18.0))]);
        let mut out = Vec::new();

        system.advance(Duration::from_millis(700), &towers, &units, &mut out);

        assert_eq!(out, vec![Command::ResolveImpact { tower: TowerId::new(0) }]);
    }

    fn ready_tower(id: u32) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            tile: GridTile::new(0, 4),
            shot: ShotState::Ready,
        }
    }

    fn busy_tower(id: u32, direction: Vec3) -> TowerSnapshot {
        let mut tower = ready_tower(id);
        tower.shot = ShotState::InFlight(ProjectileSnapshot {
            target: UnitId::new(0),
            fired_at: Duration::ZERO,
            direction,
            position: tower.muzzle(),
        });
        tower
    }

    fn unit(id: u32, position: Vec3) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            spawn_at: Duration::ZERO,
            life: 5,
            visible: true,
            marked: false,
            pose: Some(UnitPose {
                segment: 0,
                position,
                limbs: [Transform::IDENTITY; 4],
            }),
        }
    }

    fn target(tower: u32, unit: u32) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            unit: UnitId::new(unit),
        }
    }
}
