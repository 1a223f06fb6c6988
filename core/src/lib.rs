#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pirate Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Callers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! actually happened. Systems read immutable views of the world and respond
//! exclusively with new command batches.

use std::time::Duration;

use glam::{Mat3, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Pirate Defence.";

/// Side length of one grid tile measured in world units.
pub const TILE_LENGTH: f32 = 4.0;

/// Uniform scale applied to every pirate and treasure mesh.
pub const MODEL_SCALE: f32 = 0.09;

/// Height at which pirates walk.
pub const UNIT_HEIGHT: f32 = -2.35;

/// Height at which treasure chests rest.
pub const TREASURE_HEIGHT: f32 = -2.48;

/// Number of pirates created by a single wave.
pub const WAVE_SIZE: usize = 5;

/// Delay between consecutive spawn slots within a wave.
pub const WAVE_SLOT_SPACING: Duration = Duration::from_millis(500);

/// Life every pirate starts with before the wave bonus is added.
pub const BASE_UNIT_LIFE: i32 = 5;

/// Planar distance within which a ready tower locks onto a pirate.
pub const TOWER_RANGE: f32 = 2.0 * TILE_LENGTH;

/// Distance a projectile covers per second of flight.
pub const PROJECTILE_SPEED: f32 = 9.0;

/// Distance from the aim point at which a projectile counts as a hit.
pub const IMPACT_RADIUS: f32 = 1.0 * 0.1 + 12.870_75 * MODEL_SCALE;

/// Height of the cannon muzzle on top of a tower.
pub const MUZZLE_HEIGHT: f32 = 9.5626 * 0.4 - 2.47;

/// Vertical offset between a pirate's feet and the point towers aim at.
pub const AIM_OFFSET: f32 = 1.0;

/// Coins held by every treasure chest when the session starts.
pub const TREASURE_COINS: i32 = 100;

/// Coins removed from a chest each time a pirate reaches it.
pub const TREASURE_LOOT: i32 = 10;

/// Distance from a chest at which an arriving pirate loots it.
pub const CAPTURE_RADIUS: f32 = (12.870_75 + 12.0284) * MODEL_SCALE;

/// Towers available to the player before any grants.
pub const STARTING_TOWERS: u32 = 3;

/// Removal tokens available to the player before any grants.
pub const STARTING_REMOVALS: u32 = 0;

/// Largest column or row the selection cursor may reach.
pub const SELECTION_LIMIT: i32 = 9;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Appends one wave of pirates to the roster.
    SpawnWave {
        /// Spawn slot assigned to each pirate, in creation order.
        slots: [u8; WAVE_SIZE],
        /// Extra life granted to every pirate of the wave.
        bonus_life: i32,
    },
    /// Grants the player one additional tower.
    GrantTower,
    /// Grants the player one additional removal token.
    GrantRemoval,
    /// Moves the selection cursor by a single tile.
    MoveSelection {
        /// Direction of the cursor step.
        step: CursorMove,
    },
    /// Requests placement of a tower on the provided tile.
    PlaceTower {
        /// Tile that should receive the tower.
        tile: GridTile,
    },
    /// Requests removal of the tower standing on the provided tile.
    RemoveTower {
        /// Tile whose tower should be removed.
        tile: GridTile,
    },
    /// Records the pose computed for a pirate on the current frame.
    PoseUnit {
        /// Pirate that was posed.
        unit: UnitId,
        /// Pose computed by the movement system.
        pose: UnitPose,
    },
    /// Reports that a pirate reached a treasure chest on the final leg.
    CaptureTreasure {
        /// Pirate that reached the chest.
        unit: UnitId,
        /// Chest being looted.
        treasure: TreasureId,
    },
    /// Raises the terminal game-over condition.
    DeclareGameOver,
    /// Requests that a ready tower fire at the provided pirate.
    FireProjectile {
        /// Tower that fires.
        tower: TowerId,
        /// Pirate the tower locked onto.
        target: UnitId,
    },
    /// Moves an in-flight projectile to a new position.
    AdvanceProjectile {
        /// Tower owning the projectile.
        tower: TowerId,
        /// World position of the projectile after this frame.
        position: Vec3,
    },
    /// Resolves a projectile impact against its locked target.
    ResolveImpact {
        /// Tower owning the projectile.
        tower: TowerId,
    },
    /// Discards a projectile that overshot its target without hitting it.
    DiscardProjectile {
        /// Tower owning the projectile.
        tower: TowerId,
    },
    /// Removes every pirate marked as slain or arrived during this frame.
    RemoveMarkedUnits,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a wave of pirates joined the roster.
    WaveSpawned {
        /// Identifiers assigned to the new pirates in creation order.
        units: Vec<UnitId>,
        /// Life every pirate of the wave starts with.
        life: i32,
    },
    /// Confirms that a pirate left the roster.
    UnitRemoved {
        /// Identifier of the pirate that was removed.
        unit: UnitId,
        /// Reason the pirate was removed.
        cause: RemovalCause,
    },
    /// Confirms that the player received another tower.
    TowerGranted {
        /// Towers available after the grant.
        available: u32,
    },
    /// Confirms that the player received another removal token.
    RemovalGranted {
        /// Removal tokens available after the grant.
        remaining: u32,
    },
    /// Confirms that the selection cursor moved.
    SelectionMoved {
        /// Tile selected after the move.
        tile: GridTile,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Tile the tower occupies.
        tile: GridTile,
    },
    /// Confirms that a tower was removed.
    TowerRemoved {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Tile the tower occupied.
        tile: GridTile,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Tile provided in the placement request.
        tile: GridTile,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Tile provided in the removal request.
        tile: GridTile,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that a tower fired at a pirate.
    ProjectileFired {
        /// Tower that fired.
        tower: TowerId,
        /// Pirate the tower locked onto.
        target: UnitId,
    },
    /// Confirms that a projectile struck its target.
    UnitHit {
        /// Tower whose projectile hit.
        tower: TowerId,
        /// Pirate that was hit.
        unit: UnitId,
        /// Life left after the hit.
        remaining_life: i32,
    },
    /// Reports that a projectile flew past its target.
    ProjectileMissed {
        /// Tower whose projectile missed.
        tower: TowerId,
    },
    /// Reports that a tower lost its target because the pirate left the roster.
    TargetLost {
        /// Tower that was re-armed.
        tower: TowerId,
        /// Pirate that disappeared.
        unit: UnitId,
    },
    /// Confirms that a pirate looted coins from a chest.
    TreasureLooted {
        /// Chest that was looted.
        treasure: TreasureId,
        /// Coins left in the chest.
        coins_left: i32,
    },
    /// Confirms that a chest ran out of coins and vanished.
    TreasureDestroyed {
        /// Chest that vanished.
        treasure: TreasureId,
    },
    /// Announces the terminal game-over condition.
    GameOver,
}

/// Reason a pirate left the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Tower fire reduced the pirate's life to zero.
    Slain,
    /// The pirate reached a treasure chest.
    Arrived,
}

/// Unique identifier assigned to a pirate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new pirate identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a treasure chest, equal to its anchor slot around the path end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreasureId(u8);

impl TreasureId {
    /// Creates a new chest identifier for the provided anchor slot.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the anchor slot of the chest.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
///
/// Coordinates are signed because the path leaves the board through row -1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridTile {
    column: i32,
    row: i32,
}

impl GridTile {
    /// Creates a new grid tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the tile, mapped onto the world x axis.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the tile, mapped onto the world z axis.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// World-space (x, z) coordinates of the tile's minimum corner.
    #[must_use]
    pub fn corner(self) -> Vec2 {
        Vec2::new(
            self.column as f32 * TILE_LENGTH,
            self.row as f32 * TILE_LENGTH,
        )
    }

    /// World-space (x, z) coordinates of the tile's center.
    #[must_use]
    pub fn center(self) -> Vec2 {
        self.corner() + Vec2::splat(TILE_LENGTH / 2.0)
    }

    /// Returns the neighbouring tile in the provided cursor direction.
    #[must_use]
    pub const fn stepped(self, step: CursorMove) -> Self {
        match step {
            CursorMove::Forward => Self::new(self.column, self.row + 1),
            CursorMove::Backward => Self::new(self.column, self.row - 1),
            CursorMove::Left => Self::new(self.column + 1, self.row),
            CursorMove::Right => Self::new(self.column - 1, self.row),
        }
    }
}

/// Directional steps available to the selection cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorMove {
    /// Movement toward increasing rows.
    Forward,
    /// Movement toward decreasing rows.
    Backward,
    /// Movement toward increasing columns.
    Left,
    /// Movement toward decreasing columns.
    Right,
}

/// Three-state indicator driven by the outcome of the last selection action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionHighlight {
    /// Neutral highlight shown while browsing tiles.
    #[default]
    Select,
    /// The last placement or removal succeeded.
    Valid,
    /// The last placement or removal was rejected.
    Blocked,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The player has no towers left to build.
    #[error("no towers are available to place")]
    NoTowersAvailable,
    /// The tile is not part of the buildable tile set.
    #[error("tile is not eligible for tower placement")]
    NotEligible,
    /// The tile lies on the pirate path.
    #[error("tile lies on the pirate path")]
    OnPath,
    /// Another tower already stands on the tile.
    #[error("tile is already occupied by a tower")]
    Occupied,
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RemovalError {
    /// The player has no removal tokens left.
    #[error("no removal tokens remain")]
    NoRemovalTokens,
    /// No tower stands on the tile.
    #[error("no tower stands on the selected tile")]
    NoTowerAtTile,
}

/// How projectiles steer after leaving the muzzle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotGuidance {
    /// Direction is fixed when the tower locks on; the shot may overshoot.
    #[default]
    Locked,
    /// Direction is re-derived from the muzzle toward the target every frame.
    Tracking,
}

/// Mesh parts that compose a pirate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Limb {
    /// Torso and head.
    Body,
    /// Swinging right arm.
    RightArm,
    /// Left foot.
    LeftFoot,
    /// Right foot.
    RightFoot,
}

impl Limb {
    /// Every limb in drawing order.
    pub const ALL: [Limb; 4] = [Limb::Body, Limb::RightArm, Limb::LeftFoot, Limb::RightFoot];

    /// Position of the limb within [`Limb::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Body => 0,
            Self::RightArm => 1,
            Self::LeftFoot => 2,
            Self::RightFoot => 3,
        }
    }
}

/// Model matrix paired with the matrix used to transform its normals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Object-to-world matrix.
    pub model: Mat4,
    /// Transpose of the inverse of the model's linear part.
    pub normal: Mat4,
}

impl Transform {
    /// Identity transform used before a pirate is first posed.
    pub const IDENTITY: Self = Self {
        model: Mat4::IDENTITY,
        normal: Mat4::IDENTITY,
    };

    /// Builds a transform and derives its normal matrix from the model matrix.
    #[must_use]
    pub fn from_model(model: Mat4) -> Self {
        Self {
            model,
            normal: normal_matrix(model),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Computes the transpose of the inverse of the 3x3 linear part of `model`.
///
/// Required because model matrices carry non-unit scale.
#[must_use]
pub fn normal_matrix(model: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(model).inverse().transpose())
}

/// Pose of a pirate computed for a single frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitPose {
    /// Path segment the pirate walks along.
    pub segment: u32,
    /// World position used for targeting and arrival checks.
    pub position: Vec3,
    /// Per-limb transforms indexed by [`Limb::index`].
    pub limbs: [Transform; 4],
}

impl UnitPose {
    /// Transform of the requested limb.
    #[must_use]
    pub const fn limb(&self, limb: Limb) -> &Transform {
        &self.limbs[limb.index()]
    }
}

/// Immutable representation of a single pirate's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the pirate.
    pub id: UnitId,
    /// Simulation time at which the pirate starts walking.
    pub spawn_at: Duration,
    /// Remaining life.
    pub life: i32,
    /// Indicates whether renderers should draw the pirate.
    pub visible: bool,
    /// Indicates whether the pirate is scheduled for removal this frame.
    pub marked: bool,
    /// Latest pose, if the pirate has spawned since it was created.
    pub pose: Option<UnitPose>,
}

impl UnitSnapshot {
    /// Latest world position, if the pirate has been posed.
    #[must_use]
    pub fn position(&self) -> Option<Vec3> {
        self.pose.map(|pose| pose.position)
    }
}

/// Read-only snapshot describing all pirates in roster order.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new view from snapshots that are already in roster order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<UnitSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the provided pirate.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == unit)
    }

    /// Number of pirates in the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Projectile carried by a tower between lock-on and impact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Pirate the projectile was fired at.
    pub target: UnitId,
    /// Simulation time at which the tower fired.
    pub fired_at: Duration,
    /// Unit direction chosen when the tower locked on.
    pub direction: Vec3,
    /// Latest world position of the projectile.
    pub position: Vec3,
}

/// Firing state of a tower.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ShotState {
    /// The tower may lock onto a new target.
    #[default]
    Ready,
    /// A projectile is in flight; the tower waits for it to resolve.
    InFlight(ProjectileSnapshot),
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Tile the tower stands on.
    pub tile: GridTile,
    /// Current firing state.
    pub shot: ShotState,
}

impl TowerSnapshot {
    /// Reports whether the tower may fire this frame.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.shot, ShotState::Ready)
    }

    /// Pirate the tower is currently shooting at, if any.
    #[must_use]
    pub const fn target(&self) -> Option<UnitId> {
        match self.shot {
            ShotState::Ready => None,
            ShotState::InFlight(projectile) => Some(projectile.target),
        }
    }

    /// Simulation time of the last shot still in flight, if any.
    #[must_use]
    pub const fn last_shot(&self) -> Option<Duration> {
        match self.shot {
            ShotState::Ready => None,
            ShotState::InFlight(projectile) => Some(projectile.fired_at),
        }
    }

    /// World position of the cannon muzzle on top of the tower.
    #[must_use]
    pub fn muzzle(&self) -> Vec3 {
        let center = self.tile.center();
        Vec3::new(center.x, MUZZLE_HEIGHT, center.y)
    }
}

/// Read-only snapshot describing all towers in placement order.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from snapshots that are already in placement order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<TowerSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Assignment of a ready tower to the pirate it should fire at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TowerTarget {
    /// Tower that locked on.
    pub tower: TowerId,
    /// Pirate selected as the target.
    pub unit: UnitId,
}

/// Immutable representation of a treasure chest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreasureSnapshot {
    /// Identifier of the chest.
    pub id: TreasureId,
    /// World position of the chest.
    pub position: Vec3,
    /// Coins left in the chest.
    pub coins: i32,
    /// Yaw of the chest mesh in degrees.
    pub heading_degrees: f32,
}

/// Read-only snapshot describing every chest that still exists.
#[derive(Clone, Debug, Default)]
pub struct TreasureView {
    snapshots: Vec<TreasureSnapshot>,
}

impl TreasureView {
    /// Creates a new chest view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<TreasureSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the chests that still exist.
    pub fn iter(&self) -> impl Iterator<Item = &TreasureSnapshot> {
        self.snapshots.iter()
    }

    /// Reports whether every chest has been destroyed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TreasureSnapshot> {
        self.snapshots
    }
}
