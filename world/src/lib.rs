#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Pirate Defence.

pub mod path;
mod towers;
mod treasures;

use std::time::Duration;

use glam::Vec3;
use pirate_defence_core::{
    Command, Event, GridTile, PlacementError, ProjectileSnapshot, RemovalCause, RemovalError,
    SelectionHighlight, ShotState, TowerId, TreasureId, UnitId, UnitPose, UnitSnapshot,
    AIM_OFFSET, BASE_UNIT_LIFE, SELECTION_LIMIT, STARTING_REMOVALS, STARTING_TOWERS, WAVE_SIZE,
    WAVE_SLOT_SPACING, WELCOME_BANNER,
};
use tracing::{debug, info, trace};

use towers::TowerRegistry;
use treasures::Treasure;

/// Represents the authoritative Pirate Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    clock: Duration,
    units: Vec<Unit>,
    next_unit_id: UnitId,
    towers: TowerRegistry,
    treasures: Vec<Treasure>,
    selection: GridTile,
    highlight: SelectionHighlight,
    available_towers: u32,
    removal_tokens: u32,
    board_empty: bool,
    game_over: bool,
}

impl World {
    /// Creates a new Pirate Defence world with the default tower allowance.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allowance(STARTING_TOWERS, STARTING_REMOVALS)
    }

    /// Creates a new world granting the provided number of towers and removal tokens up front.
    #[must_use]
    pub fn with_allowance(available_towers: u32, removal_tokens: u32) -> Self {
        Self {
            banner: WELCOME_BANNER,
            clock: Duration::ZERO,
            units: Vec::new(),
            next_unit_id: UnitId::new(0),
            towers: TowerRegistry::new(),
            treasures: treasures::initial_treasures(),
            selection: GridTile::new(0, 0),
            highlight: SelectionHighlight::Select,
            available_towers,
            removal_tokens,
            board_empty: true,
            game_over: false,
        }
    }

    fn unit_mut(&mut self, unit: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|candidate| candidate.id == unit)
    }

    fn unit(&self, unit: UnitId) -> Option<&Unit> {
        self.units.iter().find(|candidate| candidate.id == unit)
    }

    fn allocate_unit_id(&mut self) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        id
    }

    fn spawn_wave(&mut self, slots: [u8; WAVE_SIZE], bonus_life: i32, out_events: &mut Vec<Event>) {
        debug_assert!(
            is_slot_permutation(&slots),
            "wave slots must be a permutation of 0..{WAVE_SIZE}: {slots:?}"
        );

        let life = BASE_UNIT_LIFE + bonus_life;
        let mut spawned = Vec::with_capacity(WAVE_SIZE);
        for slot in slots {
            let id = self.allocate_unit_id();
            let spawn_at = self.clock + WAVE_SLOT_SPACING * u32::from(slot);
            self.units.push(Unit::new(id, spawn_at, life));
            spawned.push(id);
        }

        // Every wave hides the whole roster until the next pose pass.
        for unit in &mut self.units {
            unit.visible = false;
        }

        info!(life, roster = self.units.len(), "pirate wave spawned");
        out_events.push(Event::WaveSpawned {
            units: spawned,
            life,
        });
    }

    fn check_placement(&self, tile: GridTile) -> Result<(), PlacementError> {
        if self.available_towers == 0 {
            return Err(PlacementError::NoTowersAvailable);
        }
        if !path::is_eligible(tile) {
            return Err(PlacementError::NotEligible);
        }
        if path::is_on_path(tile) {
            return Err(PlacementError::OnPath);
        }
        if self.towers.is_occupied(tile) {
            return Err(PlacementError::Occupied);
        }
        Ok(())
    }

    fn check_removal(&self, tile: GridTile) -> Result<(), RemovalError> {
        if self.removal_tokens == 0 {
            return Err(RemovalError::NoRemovalTokens);
        }
        if !self.towers.is_occupied(tile) {
            return Err(RemovalError::NoTowerAtTile);
        }
        Ok(())
    }

    fn capture_treasure(&mut self, unit: UnitId, treasure: TreasureId, out_events: &mut Vec<Event>) {
        let Some(index) = self
            .treasures
            .iter()
            .position(|candidate| candidate.id == treasure)
        else {
            debug_assert!(false, "capture references missing treasure {treasure:?}");
            return;
        };

        if let Some(pirate) = self.unit_mut(unit) {
            pirate.mark(RemovalCause::Arrived);
        }

        let coins_left = self.treasures[index].loot();
        info!(treasure = treasure.get(), coins_left, "treasure looted");
        out_events.push(Event::TreasureLooted {
            treasure,
            coins_left,
        });

        if coins_left <= 0 {
            let _ = self.treasures.remove(index);
            info!(treasure = treasure.get(), "treasure destroyed");
            out_events.push(Event::TreasureDestroyed { treasure });
            if self.treasures.is_empty() {
                self.declare_game_over(out_events);
            }
        }
    }

    fn declare_game_over(&mut self, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        info!(clock = ?self.clock, "game over");
        out_events.push(Event::GameOver);
    }

    fn fire(&mut self, tower: TowerId, target: UnitId, out_events: &mut Vec<Event>) {
        let clock = self.clock;
        let Some(aim) = self
            .unit(target)
            .and_then(Unit::position)
            .map(|position| position + Vec3::new(0.0, AIM_OFFSET, 0.0))
        else {
            return;
        };
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if !matches!(state.shot, ShotState::Ready) {
            return;
        }

        let muzzle = state.snapshot().muzzle();
        state.shot = ShotState::InFlight(ProjectileSnapshot {
            target,
            fired_at: clock,
            direction: (aim - muzzle).normalize_or_zero(),
            position: muzzle,
        });
        debug!(tower = tower.get(), target = target.get(), "tower fired");
        out_events.push(Event::ProjectileFired { tower, target });
    }

    fn resolve_impact(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        let ShotState::InFlight(projectile) = state.shot else {
            return;
        };
        state.shot = ShotState::Ready;

        let Some(unit) = self.unit_mut(projectile.target) else {
            debug_assert!(false, "tower {tower:?} targets vanished unit");
            return;
        };
        unit.life -= 1;
        let remaining_life = unit.life;
        if remaining_life <= 0 {
            unit.mark(RemovalCause::Slain);
        }
        debug!(
            tower = tower.get(),
            unit = projectile.target.get(),
            remaining_life,
            "projectile hit"
        );
        out_events.push(Event::UnitHit {
            tower,
            unit: projectile.target,
            remaining_life,
        });
    }

    fn remove_marked_units(&mut self, out_events: &mut Vec<Event>) {
        for index in (0..self.units.len()).rev() {
            let Some(cause) = self.units[index].marked else {
                continue;
            };
            let unit = self.units.remove(index);

            for tower in self.towers.iter_mut() {
                if tower.targets(unit.id) {
                    tower.shot = ShotState::Ready;
                    out_events.push(Event::TargetLost {
                        tower: tower.id,
                        unit: unit.id,
                    });
                }
            }

            debug!(unit = unit.id.get(), ?cause, "unit removed");
            out_events.push(Event::UnitRemoved {
                unit: unit.id,
                cause,
            });
        }

        debug_assert!(
            self.towers.iter().all(|tower| match tower.shot {
                ShotState::Ready => true,
                ShotState::InFlight(projectile) => self.unit(projectile.target).is_some(),
            }),
            "tower target outlived its unit"
        );
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            if world.units.is_empty() {
                world.board_empty = true;
            }
            trace!(clock = ?world.clock, units = world.units.len(), "tick");
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnWave { slots, bonus_life } => {
            world.spawn_wave(slots, bonus_life, out_events);
        }
        Command::GrantTower => {
            world.available_towers = world.available_towers.saturating_add(1);
            out_events.push(Event::TowerGranted {
                available: world.available_towers,
            });
        }
        Command::GrantRemoval => {
            world.removal_tokens = world.removal_tokens.saturating_add(1);
            out_events.push(Event::RemovalGranted {
                remaining: world.removal_tokens,
            });
        }
        Command::MoveSelection { step } => {
            let stepped = world.selection.stepped(step);
            world.selection = GridTile::new(
                stepped.column().clamp(0, SELECTION_LIMIT),
                stepped.row().clamp(0, SELECTION_LIMIT),
            );
            world.highlight = SelectionHighlight::Select;
            out_events.push(Event::SelectionMoved {
                tile: world.selection,
            });
        }
        Command::PlaceTower { tile } => match world.check_placement(tile) {
            Ok(()) => {
                let tower = world.towers.insert(tile);
                world.available_towers -= 1;
                world.highlight = SelectionHighlight::Valid;
                debug!(tower = tower.get(), ?tile, "tower placed");
                out_events.push(Event::TowerPlaced { tower, tile });
            }
            Err(reason) => {
                world.highlight = SelectionHighlight::Blocked;
                debug!(?tile, %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { tile, reason });
            }
        },
        Command::RemoveTower { tile } => {
            match world.check_removal(tile).and_then(|()| {
                world
                    .towers
                    .remove_at(tile)
                    .ok_or(RemovalError::NoTowerAtTile)
            }) {
                Ok(removed) => {
                    world.available_towers = world.available_towers.saturating_add(1);
                    world.removal_tokens -= 1;
                    world.highlight = SelectionHighlight::Valid;
                    debug!(tower = removed.id.get(), ?tile, "tower removed");
                    out_events.push(Event::TowerRemoved {
                        tower: removed.id,
                        tile,
                    });
                }
                Err(reason) => {
                    world.highlight = SelectionHighlight::Blocked;
                    debug!(?tile, %reason, "tower removal rejected");
                    out_events.push(Event::TowerRemovalRejected { tile, reason });
                }
            }
        }
        Command::PoseUnit { unit, pose } => {
            if let Some(pirate) = world.unit_mut(unit) {
                pirate.pose = Some(pose);
                pirate.visible = true;
                world.board_empty = false;
            }
        }
        Command::CaptureTreasure { unit, treasure } => {
            world.capture_treasure(unit, treasure, out_events);
        }
        Command::DeclareGameOver => world.declare_game_over(out_events),
        Command::FireProjectile { tower, target } => world.fire(tower, target, out_events),
        Command::AdvanceProjectile { tower, position } => {
            if let Some(state) = world.towers.get_mut(tower) {
                if let ShotState::InFlight(projectile) = &mut state.shot {
                    projectile.position = position;
                }
            }
        }
        Command::ResolveImpact { tower } => world.resolve_impact(tower, out_events),
        Command::DiscardProjectile { tower } => {
            if let Some(state) = world.towers.get_mut(tower) {
                if !matches!(state.shot, ShotState::Ready) {
                    state.shot = ShotState::Ready;
                    debug!(tower = tower.get(), "projectile missed");
                    out_events.push(Event::ProjectileMissed { tower });
                }
            }
        }
        Command::RemoveMarkedUnits => world.remove_marked_units(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use pirate_defence_core::{
        GridTile, SelectionHighlight, TowerView, TreasureView, UnitView,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Simulation time accumulated from every tick so far.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Captures a read-only view of the pirates in roster order.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(super::Unit::snapshot).collect())
    }

    /// Captures a read-only view of the towers in placement order.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures a read-only view of the chests that still exist.
    #[must_use]
    pub fn treasure_view(world: &World) -> TreasureView {
        TreasureView::from_snapshots(
            world
                .treasures
                .iter()
                .map(|treasure| treasure.snapshot())
                .collect(),
        )
    }

    /// Number of towers currently standing.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.len()
    }

    /// Tile currently selected by the cursor.
    #[must_use]
    pub fn selection(world: &World) -> GridTile {
        world.selection
    }

    /// Highlight reflecting the outcome of the last selection action.
    #[must_use]
    pub fn highlight(world: &World) -> SelectionHighlight {
        world.highlight
    }

    /// Towers the player may still build.
    #[must_use]
    pub fn available_towers(world: &World) -> u32 {
        world.available_towers
    }

    /// Removal tokens the player may still spend.
    #[must_use]
    pub fn removal_tokens(world: &World) -> u32 {
        world.removal_tokens
    }

    /// Reports whether no pirate has been on the board since the last empty tick.
    #[must_use]
    pub fn is_board_empty(world: &World) -> bool {
        world.board_empty
    }

    /// Reports whether the terminal game-over condition was raised.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }
}

#[derive(Clone, Debug)]
struct Unit {
    id: UnitId,
    spawn_at: Duration,
    life: i32,
    visible: bool,
    marked: Option<RemovalCause>,
    pose: Option<UnitPose>,
}

impl Unit {
    fn new(id: UnitId, spawn_at: Duration, life: i32) -> Self {
        Self {
            id,
            spawn_at,
            life,
            visible: false,
            marked: None,
            pose: None,
        }
    }

    fn position(&self) -> Option<Vec3> {
        self.pose.map(|pose| pose.position)
    }

    fn mark(&mut self, cause: RemovalCause) {
        if self.marked.is_none() {
            self.marked = Some(cause);
        }
    }

    fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            spawn_at: self.spawn_at,
            life: self.life,
            visible: self.visible,
            marked: self.marked.is_some(),
            pose: self.pose,
        }
    }
}

fn is_slot_permutation(slots: &[u8; WAVE_SIZE]) -> bool {
    let mut seen = [false; WAVE_SIZE];
    for &slot in slots {
        match seen.get_mut(usize::from(slot)) {
            Some(flag) if !*flag => *flag = true,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pirate_defence_core::{
        CursorMove, Transform, TREASURE_COINS, TREASURE_LOOT,
    };

    fn pose_at(position: Vec3) -> UnitPose {
        UnitPose {
            segment: 0,
            position,
            limbs: [Transform::IDENTITY; 4],
        }
    }

    fn spawn(world: &mut World, bonus_life: i32) -> Vec<UnitId> {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnWave {
                slots: [0, 1, 2, 3, 4],
                bonus_life,
            },
            &mut events,
        );
        match events.pop() {
            Some(Event::WaveSpawned { units, .. }) => units,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn wave_appends_five_hidden_units_with_staggered_spawns() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(3),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnWave {
                slots: [3, 0, 4, 1, 2],
                bonus_life: 2,
            },
            &mut events,
        );

        let units = query::unit_view(&world).into_vec();
        assert_eq!(units.len(), WAVE_SIZE);
        let offsets: Vec<u64> = units
            .iter()
            .map(|unit| (unit.spawn_at - Duration::from_secs(3)).as_millis() as u64)
            .collect();
        assert_eq!(offsets, vec![1500, 0, 2000, 500, 1000]);
        assert!(units.iter().all(|unit| unit.life == 7 && !unit.visible));
    }

    #[test]
    fn new_wave_hides_previously_visible_units() {
        let mut world = World::new();
        let mut events = Vec::new();
        let first = spawn(&mut world, 0);
        apply(
            &mut world,
            Command::PoseUnit {
                unit: first[0],
                pose: pose_at(Vec3::ZERO),
            },
            &mut events,
        );
        assert!(query::unit_view(&world).get(first[0]).map_or(false, |u| u.visible));
        assert!(!query::is_board_empty(&world));

        let _ = spawn(&mut world, 2);
        assert!(query::unit_view(&world).iter().all(|unit| !unit.visible));
    }

    #[test]
    fn placement_rejections_follow_documented_order() {
        let mut world = World::with_allowance(0, 0);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                tile: GridTile::new(0, 0),
            },
            &mut events,
        );
        assert_eq!(
            events.pop(),
            Some(Event::TowerPlacementRejected {
                tile: GridTile::new(0, 0),
                reason: PlacementError::NoTowersAvailable,
            })
        );

        apply(&mut world, Command::GrantTower, &mut events);
        apply(
            &mut world,
            Command::PlaceTower {
                tile: GridTile::new(0, 0),
            },
            &mut events,
        );
        assert_eq!(
            events.pop(),
            Some(Event::TowerPlacementRejected {
                tile: GridTile::new(0, 0),
                reason: PlacementError::NotEligible,
            })
        );
        assert_eq!(query::highlight(&world), SelectionHighlight::Blocked);
        assert_eq!(query::available_towers(&world), 1);
    }

    #[test]
    fn removal_refunds_tower_and_consumes_token() {
        let mut world = World::with_allowance(1, 0);
        let mut events = Vec::new();
        let tile = GridTile::new(0, 4);
        apply(&mut world, Command::PlaceTower { tile }, &mut events);
        assert_eq!(query::available_towers(&world), 0);

        apply(&mut world, Command::RemoveTower { tile }, &mut events);
        assert_eq!(
            events.pop(),
            Some(Event::TowerRemovalRejected {
                tile,
                reason: RemovalError::NoRemovalTokens,
            })
        );

        apply(&mut world, Command::GrantRemoval, &mut events);
        apply(&mut world, Command::RemoveTower { tile }, &mut events);
        assert_eq!(query::tower_count(&world), 0);
        assert_eq!(query::available_towers(&world), 1);
        assert_eq!(query::removal_tokens(&world), 0);
        assert_eq!(query::highlight(&world), SelectionHighlight::Valid);
    }

    #[test]
    fn selection_is_clamped_to_board() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveSelection {
                step: CursorMove::Backward,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::MoveSelection {
                step: CursorMove::Right,
            },
            &mut events,
        );
        assert_eq!(query::selection(&world), GridTile::new(0, 0));

        for _ in 0..15 {
            apply(
                &mut world,
                Command::MoveSelection {
                    step: CursorMove::Left,
                },
                &mut events,
            );
        }
        assert_eq!(query::selection(&world), GridTile::new(SELECTION_LIMIT, 0));
    }

    #[test]
    fn removing_targeted_unit_rearms_tower() {
        let mut world = World::new();
        let mut events = Vec::new();
        let tile = GridTile::new(0, 4);
        apply(&mut world, Command::PlaceTower { tile }, &mut events);
        let units = spawn(&mut world, -4);
        apply(
            &mut world,
            Command::PoseUnit {
                unit: units[0],
                pose: pose_at(Vec3::new(2.0, -2.35, 14.0)),
            },
            &mut events,
        );
        let tower = query::tower_view(&world).into_vec()[0].id;
        apply(
            &mut world,
            Command::FireProjectile {
                tower,
                target: units[0],
            },
            &mut events,
        );
        assert_eq!(query::tower_view(&world).into_vec()[0].target(), Some(units[0]));

        if let Some(unit) = world.unit_mut(units[0]) {
            unit.mark(RemovalCause::Slain);
        }
        events.clear();
        apply(&mut world, Command::RemoveMarkedUnits, &mut events);

        let snapshot = query::tower_view(&world).into_vec()[0];
        assert!(snapshot.is_ready());
        assert!(events.contains(&Event::TargetLost {
            tower,
            unit: units[0],
        }));
        assert_eq!(query::unit_view(&world).len(), WAVE_SIZE - 1);
    }

    #[test]
    fn impact_kills_single_life_unit() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                tile: GridTile::new(0, 4),
            },
            &mut events,
        );
        let units = spawn(&mut world, -4);
        apply(
            &mut world,
            Command::PoseUnit {
                unit: units[2],
                pose: pose_at(Vec3::new(2.0, -2.35, 14.0)),
            },
            &mut events,
        );
        let tower = query::tower_view(&world).into_vec()[0].id;
        apply(
            &mut world,
            Command::FireProjectile {
                tower,
                target: units[2],
            },
            &mut events,
        );
        apply(&mut world, Command::ResolveImpact { tower }, &mut events);
        assert!(events.contains(&Event::UnitHit {
            tower,
            unit: units[2],
            remaining_life: 0,
        }));
        apply(&mut world, Command::RemoveMarkedUnits, &mut events);
        assert!(query::unit_view(&world).get(units[2]).is_none());
        assert!(events.contains(&Event::UnitRemoved {
            unit: units[2],
            cause: RemovalCause::Slain,
        }));
    }

    #[test]
    fn last_treasure_capture_ends_the_game() {
        let mut world = World::new();
        let mut events = Vec::new();
        let units = spawn(&mut world, 0);
        world.treasures.truncate(1);
        world.treasures[0].coins = TREASURE_LOOT;

        apply(
            &mut world,
            Command::CaptureTreasure {
                unit: units[0],
                treasure: TreasureId::new(0),
            },
            &mut events,
        );
        assert!(query::treasure_view(&world).is_empty());
        assert!(query::is_game_over(&world));
        assert!(events.contains(&Event::GameOver));
        assert!(query::unit_view(&world).get(units[0]).map_or(false, |u| u.marked));
    }

    #[test]
    fn capture_with_coins_left_keeps_chest() {
        let mut world = World::new();
        let mut events = Vec::new();
        let units = spawn(&mut world, 0);
        apply(
            &mut world,
            Command::CaptureTreasure {
                unit: units[1],
                treasure: TreasureId::new(2),
            },
            &mut events,
        );
        assert_eq!(
            events.pop(),
            Some(Event::TreasureLooted {
                treasure: TreasureId::new(2),
                coins_left: TREASURE_COINS - TREASURE_LOOT,
            })
        );
        assert_eq!(query::treasure_view(&world).into_vec().len(), 3);
        assert!(!query::is_game_over(&world));
    }

    #[test]
    fn slot_permutation_check_rejects_duplicates() {
        assert!(is_slot_permutation(&[4, 3, 2, 1, 0]));
        assert!(!is_slot_permutation(&[0, 0, 1, 2, 3]));
        assert!(!is_slot_permutation(&[0, 1, 2, 3, 5]));
    }
}
