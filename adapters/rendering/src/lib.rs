#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Pirate Defence adapters.
//!
//! The simulation never draws. Adapters capture a [`Scene`] from world
//! queries after each update and hand it to [`submit_scene`], which emits one
//! [`DrawCall`] per drawable instance into a [`DrawSink`]. Every call carries
//! a model matrix and the matching normal matrix.

use anyhow::{Context, Result as AnyResult};
use glam::{Mat4, Quat, Vec3};
use pirate_defence_core::{
    GridTile, Limb, SelectionHighlight, ShotState, Transform, TowerView, TreasureView, UnitView,
    MODEL_SCALE, TREASURE_HEIGHT,
};

/// Height of the terrain slab.
const TERRAIN_HEIGHT: f32 = -2.5;
/// Height of road tiles, slightly above the terrain.
const ROAD_HEIGHT: f32 = -2.49;
/// Height of tower bases.
const TOWER_HEIGHT: f32 = -2.47;
/// Uniform scale of the cannonball mesh.
const CANNONBALL_SCALE: f32 = 0.1;
/// Uniform scale of the tower mesh.
const TOWER_SCALE: f32 = 0.4;
/// Offset recentring the tower mesh on its tile.
const TOWER_MESH_OFFSET: Vec3 = Vec3::new(2.6035, 0.0626, 2.6373);
/// Offset recentring the chest mesh on its anchor.
const TREASURE_MESH_OFFSET: Vec3 = Vec3::new(0.1760, -0.0226, 8.0619);

/// RGBA color used to tint a draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Translucent tint of the selection plane for the provided highlight.
    #[must_use]
    pub const fn for_highlight(highlight: SelectionHighlight) -> Self {
        let base = match highlight {
            SelectionHighlight::Select => Self::from_rgb_u8(255, 255, 204),
            SelectionHighlight::Valid => Self::from_rgb_u8(64, 200, 96),
            SelectionHighlight::Blocked => Self::from_rgb_u8(220, 48, 48),
        };
        Self::new(base.red, base.green, base.blue, 0.6)
    }
}

/// Mesh an adapter binds before drawing an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Ground slab under the whole board.
    Terrain,
    /// One tile of the pirate route.
    Road,
    /// Treasure chest.
    Treasure,
    /// Projectile in flight.
    Cannonball,
    /// Player-built tower.
    Tower,
    /// Pirate torso and head.
    PirateBody,
    /// Pirate sword arm.
    PirateArm,
    /// Either pirate foot.
    PirateFoot,
    /// Translucent plane over the selected tile.
    SelectionPlane,
}

impl MeshKind {
    /// Mesh drawn for the provided pirate limb.
    #[must_use]
    pub const fn for_limb(limb: Limb) -> Self {
        match limb {
            Limb::Body => Self::PirateBody,
            Limb::RightArm => Self::PirateArm,
            Limb::LeftFoot | Limb::RightFoot => Self::PirateFoot,
        }
    }
}

/// Single instance submitted for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    /// Mesh to draw.
    pub kind: MeshKind,
    /// Model and normal matrices of the instance.
    pub transform: Transform,
    /// Optional tint overriding the mesh texture.
    pub tint: Option<Color>,
}

impl DrawCall {
    /// Creates an untinted draw call, deriving the normal matrix from `model`.
    #[must_use]
    pub fn new(kind: MeshKind, model: Mat4) -> Self {
        Self::with_transform(kind, Transform::from_model(model))
    }

    /// Creates an untinted draw call from a precomputed transform.
    #[must_use]
    pub const fn with_transform(kind: MeshKind, transform: Transform) -> Self {
        Self {
            kind,
            transform,
            tint: None,
        }
    }

    /// Returns the call tinted with `color`.
    #[must_use]
    pub fn tinted(mut self, color: Color) -> Self {
        self.tint = Some(color);
        self
    }
}

/// Destination of draw calls, implemented by graphics backends.
pub trait DrawSink {
    /// Accepts one instance for drawing.
    ///
    /// # Errors
    ///
    /// Backends report failures such as a missing mesh binding.
    fn submit(&mut self, call: DrawCall) -> AnyResult<()>;
}

/// Read-only state captured after an update for a single frame of drawing.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Tiles of the pirate route.
    pub road: Vec<GridTile>,
    /// Pirates in roster order.
    pub units: UnitView,
    /// Towers in placement order.
    pub towers: TowerView,
    /// Chests that still exist.
    pub treasures: TreasureView,
    /// Tile under the selection cursor.
    pub selection: GridTile,
    /// Outcome of the last selection action.
    pub highlight: SelectionHighlight,
}

/// Submits every drawable instance of `scene` to `sink`.
///
/// Order is terrain, road, chests, cannonballs, towers, pirates and finally
/// the selection plane, which is translucent and must come last.
///
/// # Errors
///
/// Stops at and returns the first error reported by the sink.
pub fn submit_scene<S>(scene: &Scene, sink: &mut S) -> AnyResult<()>
where
    S: DrawSink + ?Sized,
{
    sink.submit(DrawCall::new(MeshKind::Terrain, terrain_model()))
        .context("failed to submit terrain")?;

    for tile in &scene.road {
        sink.submit(DrawCall::new(MeshKind::Road, road_model(*tile)))
            .with_context(|| format!("failed to submit road tile {tile:?}"))?;
    }

    for treasure in scene.treasures.iter() {
        let model = treasure_model(treasure.position, treasure.heading_degrees);
        sink.submit(DrawCall::new(MeshKind::Treasure, model))
            .with_context(|| format!("failed to submit treasure {:?}", treasure.id))?;
    }

    for tower in scene.towers.iter() {
        if let ShotState::InFlight(projectile) = tower.shot {
            let model = Mat4::from_translation(projectile.position)
                * Mat4::from_scale(Vec3::splat(CANNONBALL_SCALE));
            sink.submit(DrawCall::new(MeshKind::Cannonball, model))
                .with_context(|| format!("failed to submit cannonball of {:?}", tower.id))?;
        }
    }

    for tower in scene.towers.iter() {
        sink.submit(DrawCall::new(MeshKind::Tower, tower_model(tower.tile)))
            .with_context(|| format!("failed to submit tower {:?}", tower.id))?;
    }

    for unit in scene.units.iter().filter(|unit| unit.visible) {
        let Some(pose) = unit.pose else {
            continue;
        };
        for limb in Limb::ALL {
            let call = DrawCall::with_transform(MeshKind::for_limb(limb), *pose.limb(limb));
            sink.submit(call)
                .with_context(|| format!("failed to submit {limb:?} of {:?}", unit.id))?;
        }
    }

    let plane = DrawCall::new(MeshKind::SelectionPlane, selection_model(scene.selection))
        .tinted(Color::for_highlight(scene.highlight));
    sink.submit(plane).context("failed to submit selection plane")
}

fn terrain_model() -> Mat4 {
    Mat4::from_scale(Vec3::new(20.0, 1.0, 20.0))
        * Mat4::from_translation(Vec3::new(1.0, TERRAIN_HEIGHT, 1.0))
}

fn road_model(tile: GridTile) -> Mat4 {
    let corner = tile.corner();
    Mat4::from_scale(Vec3::new(2.0, 1.0, 2.0))
        * Mat4::from_translation(Vec3::new(
            corner.x / 2.0 + 1.0,
            ROAD_HEIGHT,
            corner.y / 2.0 + 1.0,
        ))
}

fn treasure_model(position: Vec3, heading_degrees: f32) -> Mat4 {
    Mat4::from_translation(position)
        * Mat4::from_scale(Vec3::splat(MODEL_SCALE))
        * Mat4::from_quat(Quat::from_rotation_y(heading_degrees.to_radians()))
        * Mat4::from_translation(TREASURE_MESH_OFFSET)
}

fn tower_model(tile: GridTile) -> Mat4 {
    let corner = tile.corner();
    Mat4::from_translation(Vec3::new(corner.x + 1.0, TOWER_HEIGHT, corner.y + 1.0))
        * Mat4::from_scale(Vec3::splat(TOWER_SCALE))
        * Mat4::from_translation(TOWER_MESH_OFFSET)
}

fn selection_model(tile: GridTile) -> Mat4 {
    let corner = tile.corner();
    Mat4::from_translation(Vec3::new(corner.x, 0.0, corner.y))
        * Mat4::from_scale(Vec3::new(2.0, 1.0, 2.0))
        * Mat4::from_translation(Vec3::new(1.0, TREASURE_HEIGHT, 1.0))
}

/// Sink that keeps every submitted call, used by headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    calls: Vec<DrawCall>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far, in submission order.
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Number of recorded calls drawing `kind`.
    #[must_use]
    pub fn count(&self, kind: MeshKind) -> usize {
        self.calls.iter().filter(|call| call.kind == kind).count()
    }

    /// Forgets every recorded call, keeping the allocation for the next frame.
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DrawSink for RecordingSink {
    fn submit(&mut self, call: DrawCall) -> AnyResult<()> {
        self.calls.push(call);
        Ok(())
    }
}
