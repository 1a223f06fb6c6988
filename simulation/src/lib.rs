#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-stepped Pirate Defence simulation.
//!
//! [`Simulation`] owns the authoritative world and the pure systems, and
//! advances them in a fixed order every frame: clock tick, pirate motion and
//! arrivals, removal sweep, tower targeting, firing, projectile flight and a
//! final removal sweep. Adapters drive it through a handful of operations and
//! read the world back through [`pirate_defence_world::query`].

use std::time::Duration;

use pirate_defence_core::{
    Command, CursorMove, Event, PlacementError, RemovalError, ShotGuidance, TowerId,
    TowerTarget, STARTING_REMOVALS, STARTING_TOWERS,
};
use pirate_defence_system_builder::{Builder, BuilderInput};
use pirate_defence_system_movement::Movement;
use pirate_defence_system_spawning::Spawning;
use pirate_defence_system_tower_combat::TowerCombat;
use pirate_defence_system_tower_targeting::TowerTargeting;
use pirate_defence_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

const DEFAULT_SEED: u64 = 0x0070_1a7e_5eed;

/// Tunable parameters of a simulation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed of the generator that shuffles wave spawn slots.
    pub seed: u64,
    /// Towers the player may build before any grants.
    pub starting_towers: u32,
    /// Removal tokens the player holds before any grants.
    pub starting_removals: u32,
    /// How projectiles steer after leaving the muzzle.
    pub guidance: ShotGuidance,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            starting_towers: STARTING_TOWERS,
            starting_removals: STARTING_REMOVALS,
            guidance: ShotGuidance::Locked,
        }
    }
}

/// Authoritative world plus the systems that advance it.
#[derive(Debug)]
pub struct Simulation<R = ChaCha8Rng> {
    world: World,
    spawning: Spawning<R>,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    builder: Builder,
    targets: Vec<TowerTarget>,
    log: Vec<Event>,
}

impl Simulation<ChaCha8Rng> {
    /// Creates a simulation whose wave slots are shuffled by a generator seeded from `config`.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(config.seed))
    }
}

impl Default for Simulation<ChaCha8Rng> {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl<R: Rng> Simulation<R> {
    /// Creates a simulation drawing wave slots from the provided generator.
    #[must_use]
    pub fn with_rng(config: SimulationConfig, rng: R) -> Self {
        info!(
            towers = config.starting_towers,
            removals = config.starting_removals,
            guidance = ?config.guidance,
            "simulation created"
        );
        Self {
            world: World::with_allowance(config.starting_towers, config.starting_removals),
            spawning: Spawning::new(rng),
            movement: Movement::default(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(config.guidance),
            builder: Builder::new(),
            targets: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Read-only access to the authoritative world for queries and rendering.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Advances the simulation by one frame of `dt`.
    pub fn update(&mut self, dt: Duration) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        self.movement.handle(
            &events,
            query::clock(&self.world),
            &query::unit_view(&self.world),
            &query::treasure_view(&self.world),
            &mut commands,
        );
        commands.push(Command::RemoveMarkedUnits);
        self.execute(commands, &mut events);

        if !query::is_board_empty(&self.world) {
            let mut commands = Vec::new();
            self.targeting.handle(
                &query::tower_view(&self.world),
                &query::unit_view(&self.world),
                &mut self.targets,
            );
            self.combat
                .handle(&query::tower_view(&self.world), &self.targets, &mut commands);
            self.execute(commands, &mut events);

            let mut commands = Vec::new();
            self.combat.advance(
                query::clock(&self.world),
                &query::tower_view(&self.world),
                &query::unit_view(&self.world),
                &mut commands,
            );
            commands.push(Command::RemoveMarkedUnits);
            self.execute(commands, &mut events);
        }

        trace!(
            clock = ?query::clock(&self.world),
            events = events.len(),
            "frame complete"
        );
        self.log.append(&mut events);
    }

    /// Appends one wave of five pirates carrying `bonus_life` extra life each.
    pub fn add_pirate_wave(&mut self, bonus_life: i32) {
        let mut commands = Vec::new();
        self.spawning.spawn_wave(bonus_life, &mut commands);
        let _ = self.run(commands);
    }

    /// Grants the player one additional tower.
    pub fn give_tower(&mut self) {
        let _ = self.run(vec![Command::GrantTower]);
    }

    /// Grants the player one additional removal token.
    pub fn add_removal(&mut self) {
        let _ = self.run(vec![Command::GrantRemoval]);
    }

    /// Moves the selection cursor by one tile.
    pub fn move_selection(&mut self, step: CursorMove) {
        let _ = self.act(BuilderInput::step(step));
    }

    /// Builds a tower on the selected tile.
    ///
    /// # Errors
    ///
    /// Returns the reason the world rejected the placement; the selection
    /// highlight turns red and nothing else changes.
    pub fn place_tower(&mut self) -> Result<TowerId, PlacementError> {
        let events = self.act(BuilderInput::place());
        let outcome = events.iter().find_map(|event| match event {
            Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
            Event::TowerPlacementRejected { reason, .. } => Some(Err(*reason)),
            _ => None,
        });
        debug_assert!(outcome.is_some(), "placement produced no outcome");
        outcome.unwrap_or(Err(PlacementError::NotEligible))
    }

    /// Removes the tower standing on the selected tile.
    ///
    /// # Errors
    ///
    /// Returns the reason the world rejected the removal; the selection
    /// highlight turns red and nothing else changes.
    pub fn remove_tower(&mut self) -> Result<TowerId, RemovalError> {
        let events = self.act(BuilderInput::remove());
        let outcome = events.iter().find_map(|event| match event {
            Event::TowerRemoved { tower, .. } => Some(Ok(*tower)),
            Event::TowerRemovalRejected { reason, .. } => Some(Err(*reason)),
            _ => None,
        });
        debug_assert!(outcome.is_some(), "removal produced no outcome");
        outcome.unwrap_or(Err(RemovalError::NoTowerAtTile))
    }

    /// Reports whether no pirate has been on the board since the last empty tick.
    #[must_use]
    pub fn is_board_empty(&self) -> bool {
        query::is_board_empty(&self.world)
    }

    /// Reports whether every chest is gone.
    #[must_use]
    pub fn game_over(&self) -> bool {
        query::is_game_over(&self.world)
    }

    /// Takes every event produced since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.log)
    }

    fn act(&mut self, input: BuilderInput) -> Vec<Event> {
        let mut commands = Vec::new();
        self.builder
            .handle(query::selection(&self.world), input, &mut commands);
        self.run(commands)
    }

    fn run(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        self.execute(commands, &mut events);
        self.log.extend(events.iter().cloned());
        events
    }

    fn execute(&mut self, commands: Vec<Command>, events: &mut Vec<Event>) {
        for command in commands {
            world::apply(&mut self.world, command, events);
        }
    }
}
