#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that walks pirates along the fixed route,
//! animates their limbs and detects arrivals at the treasure chests.

use std::{f32::consts::PI, time::Duration};

use glam::{Mat4, Vec2, Vec3};
use pirate_defence_core::{
    Command, Event, Limb, Transform, TreasureSnapshot, TreasureView, UnitPose, UnitView,
    CAPTURE_RADIUS, MODEL_SCALE, TREASURE_LOOT, UNIT_HEIGHT,
};
use pirate_defence_world::path;

/// Angular frequency of the walk cycle in radians per second.
const STRIDE_FREQUENCY: f32 = 5.0;
/// Amplitude of the foot swing relative to the arm swing.
const FOOT_SWING: f32 = 0.8;

/// Pure system that reacts to clock ticks by posing every spawned pirate.
#[derive(Debug, Default)]
pub struct Movement {
    treasures: Vec<TreasureSnapshot>,
}

impl Movement {
    /// Consumes world events and immutable views to emit pose and arrival commands.
    ///
    /// Several pirates may reach the chests during one frame, so the system
    /// tracks the coins it has already claimed in a scratch copy of the chests.
    pub fn handle(
        &mut self,
        events: &[Event],
        clock: Duration,
        unit_view: &UnitView,
        treasure_view: &TreasureView,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        self.treasures.clear();
        self.treasures.extend(treasure_view.iter().copied());
        let time = clock.as_secs_f32();

        for unit in unit_view.iter() {
            if unit.marked {
                continue;
            }
            let Some(elapsed) = clock.checked_sub(unit.spawn_at) else {
                continue;
            };

            let progress = SegmentProgress::from_elapsed(elapsed);
            let recipe = recipe_for(progress.segment);
            let position = recipe.position(progress);

            let mut arriving = false;
            if recipe.arrival {
                match self.nearest_treasure(position) {
                    None => out.push(Command::DeclareGameOver),
                    Some((index, distance)) if distance <= CAPTURE_RADIUS => {
                        arriving = true;
                        let treasure = self.treasures[index].id;
                        self.treasures[index].coins -= TREASURE_LOOT;
                        if self.treasures[index].coins <= 0 {
                            let _ = self.treasures.remove(index);
                        }
                        out.push(Command::PoseUnit {
                            unit: unit.id,
                            pose: recipe.pose(progress, time, false),
                        });
                        out.push(Command::CaptureTreasure {
                            unit: unit.id,
                            treasure,
                        });
                    }
                    Some(_) => {}
                }
            }

            if !arriving {
                out.push(Command::PoseUnit {
                    unit: unit.id,
                    pose: recipe.pose(progress, time, true),
                });
            }
        }
    }

    fn nearest_treasure(&self, position: Vec3) -> Option<(usize, f32)> {
        let mut nearest: Option<(usize, f32)> = None;
        for (index, treasure) in self.treasures.iter().enumerate() {
            let distance = position.distance(treasure.position);
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((index, distance));
            }
        }
        nearest
    }
}

/// Computes the pose of a pirate that has been walking for `elapsed` at simulation time `time`.
#[must_use]
pub fn pose_for(elapsed: Duration, time: f32) -> UnitPose {
    let progress = SegmentProgress::from_elapsed(elapsed);
    recipe_for(progress.segment).pose(progress, time, true)
}

/// Reports whether the segment belongs to the final leg, where arrivals are detected.
#[must_use]
pub fn is_final_leg(segment: u32) -> bool {
    usize::try_from(segment).map_or(false, |segment| path::FINAL_LEG.contains(&segment))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SegmentProgress {
    segment: usize,
    fraction: f32,
}

impl SegmentProgress {
    fn from_elapsed(elapsed: Duration) -> Self {
        Self {
            segment: usize::try_from(elapsed.as_secs()).unwrap_or(usize::MAX),
            fraction: elapsed.subsec_nanos() as f32 / 1_000_000_000.0,
        }
    }
}

/// Direction a pirate faces while walking a segment; selects limb offsets and heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Facing {
    PositiveZ,
    PositiveX,
    NegativeZ,
    NegativeX,
}

impl Facing {
    fn heading(self) -> f32 {
        match self {
            Self::PositiveZ => 0.0,
            Self::PositiveX => 90.0_f32.to_radians(),
            Self::NegativeZ => PI,
            Self::NegativeX => -90.0_f32.to_radians(),
        }
    }

    /// Offset of the limb from the torso in model units.
    fn limb_offset(self, limb: Limb) -> Vec3 {
        let offset = match (self, limb) {
            (_, Limb::Body) => Vec3::ZERO,
            (Self::PositiveZ, Limb::RightArm) => Vec3::new(-4.5, 12.0, 0.0),
            (Self::PositiveZ, Limb::LeftFoot) => Vec3::new(4.0, 0.0, 2.0),
            (Self::PositiveZ, Limb::RightFoot) => Vec3::new(-4.0, 0.0, 2.0),
            (Self::PositiveX, Limb::RightArm) => Vec3::new(0.0, 12.0, 4.5),
            (Self::PositiveX, Limb::LeftFoot) => Vec3::new(2.0, 0.0, -4.0),
            (Self::PositiveX, Limb::RightFoot) => Vec3::new(2.0, 0.0, 4.0),
            (Self::NegativeZ, Limb::RightArm) => Vec3::new(4.5, 12.0, 0.0),
            (Self::NegativeZ, Limb::LeftFoot) => Vec3::new(-4.0, 0.0, -2.0),
            (Self::NegativeZ, Limb::RightFoot) => Vec3::new(4.0, 0.0, -2.0),
            (Self::NegativeX, Limb::RightArm) => Vec3::new(0.0, 12.0, -4.5),
            (Self::NegativeX, Limb::LeftFoot) => Vec3::new(-2.0, 0.0, 4.0),
            (Self::NegativeX, Limb::RightFoot) => Vec3::new(-2.0, 0.0, -4.0),
        };
        offset * MODEL_SCALE
    }
}

/// Quarter turn performed while walking around a corner.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Turn {
    pivot: Vec3,
    degrees: f32,
}

/// Geometric recipe describing how a pirate walks one path segment.
///
/// `start` is relative to the segment's waypoint and `end` to the following
/// waypoint, or to the same waypoint on the final leg. Offsets are (x, z).
#[derive(Clone, Copy, Debug, PartialEq)]
struct SegmentRecipe {
    start: Vec2,
    end: Vec2,
    end_on_next: bool,
    turn: Option<Turn>,
    facing: Facing,
    arrival: bool,
}

const fn straight(start: Vec2, facing: Facing) -> SegmentRecipe {
    SegmentRecipe {
        start,
        end: start,
        end_on_next: true,
        turn: None,
        facing,
        arrival: false,
    }
}

const fn corner(start: Vec2, end: Vec2, pivot: Vec3, degrees: f32, facing: Facing) -> SegmentRecipe {
    SegmentRecipe {
        start,
        end,
        end_on_next: true,
        turn: Some(Turn { pivot, degrees }),
        facing,
        arrival: false,
    }
}

const WALK_POSITIVE_Z: SegmentRecipe = straight(Vec2::new(2.0, 0.0), Facing::PositiveZ);
const TURN_INTO_POSITIVE_X: SegmentRecipe = corner(
    Vec2::new(2.0, 0.0),
    Vec2::new(0.0, 2.0),
    Vec3::new(-2.0, 0.0, 0.0),
    90.0,
    Facing::PositiveZ,
);
const TURN_INTO_POSITIVE_Z: SegmentRecipe = corner(
    Vec2::new(0.0, 2.0),
    Vec2::new(2.0, 0.0),
    Vec3::new(0.0, 0.0, -2.0),
    -90.0,
    Facing::PositiveX,
);
const WALK_POSITIVE_X: SegmentRecipe = straight(Vec2::new(0.0, 2.0), Facing::PositiveX);
const TURN_INTO_NEGATIVE_Z: SegmentRecipe = corner(
    Vec2::new(0.0, 2.0),
    Vec2::new(2.0, 4.0),
    Vec3::new(0.0, 0.0, 2.0),
    90.0,
    Facing::PositiveX,
);
const WALK_NEGATIVE_Z: SegmentRecipe = straight(Vec2::new(2.0, 4.0), Facing::NegativeZ);
const TURN_FROM_NEGATIVE_Z_INTO_POSITIVE_X: SegmentRecipe = corner(
    Vec2::new(2.0, 4.0),
    Vec2::new(0.0, 2.0),
    Vec3::new(-2.0, 0.0, 0.0),
    -90.0,
    Facing::NegativeZ,
);
const TURN_INTO_NEGATIVE_X: SegmentRecipe = corner(
    Vec2::new(2.0, 4.0),
    Vec2::new(4.0, 2.0),
    Vec3::new(2.0, 0.0, 0.0),
    90.0,
    Facing::NegativeZ,
);
const WALK_NEGATIVE_X: SegmentRecipe = straight(Vec2::new(4.0, 2.0), Facing::NegativeX);
const TURN_FROM_NEGATIVE_X_INTO_NEGATIVE_Z: SegmentRecipe = corner(
    Vec2::new(4.0, 2.0),
    Vec2::new(2.0, 4.0),
    Vec3::new(0.0, 0.0, 2.0),
    -90.0,
    Facing::NegativeX,
);
const FINAL_LEG: SegmentRecipe = SegmentRecipe {
    start: Vec2::new(2.0, 4.0),
    end: Vec2::new(2.0, 0.0),
    end_on_next: false,
    turn: None,
    facing: Facing::NegativeZ,
    arrival: true,
};

/// Recipes keyed by segment index; anything unlisted walks straight along +z.
const RECIPES: [SegmentRecipe; path::PATH.len()] = [
    WALK_POSITIVE_Z,
    WALK_POSITIVE_Z,
    WALK_POSITIVE_Z,
    TURN_INTO_POSITIVE_X,
    TURN_INTO_POSITIVE_Z,
    WALK_POSITIVE_Z,
    WALK_POSITIVE_Z,
    WALK_POSITIVE_Z,
    TURN_INTO_POSITIVE_X,
    TURN_INTO_POSITIVE_Z,
    TURN_INTO_POSITIVE_X,
    WALK_POSITIVE_X,
    WALK_POSITIVE_X,
    WALK_POSITIVE_X,
    TURN_INTO_NEGATIVE_Z,
    WALK_NEGATIVE_Z,
    TURN_FROM_NEGATIVE_Z_INTO_POSITIVE_X,
    TURN_INTO_NEGATIVE_Z,
    WALK_NEGATIVE_Z,
    WALK_NEGATIVE_Z,
    TURN_FROM_NEGATIVE_Z_INTO_POSITIVE_X,
    WALK_POSITIVE_X,
    TURN_INTO_NEGATIVE_Z,
    WALK_NEGATIVE_Z,
    TURN_INTO_NEGATIVE_X,
    WALK_NEGATIVE_X,
    WALK_NEGATIVE_X,
    TURN_FROM_NEGATIVE_X_INTO_NEGATIVE_Z,
    FINAL_LEG,
    FINAL_LEG,
];

fn recipe_for(segment: usize) -> &'static SegmentRecipe {
    RECIPES.get(segment).unwrap_or(&WALK_POSITIVE_Z)
}

impl SegmentRecipe {
    fn endpoints(&self, segment: usize) -> (Vec3, Vec3) {
        let from = path::waypoint_corner(segment) + self.start;
        let to_waypoint = if self.end_on_next {
            segment.saturating_add(1)
        } else {
            segment
        };
        let to = path::waypoint_corner(to_waypoint) + self.end;
        (ground(from), ground(to))
    }

    fn position(&self, progress: SegmentProgress) -> Vec3 {
        let (from, to) = self.endpoints(progress.segment);
        from.lerp(to, progress.fraction)
    }

    fn pose(&self, progress: SegmentProgress, time: f32, walk_cycle: bool) -> UnitPose {
        let (from, _) = self.endpoints(progress.segment);
        let position = self.position(progress);
        let anchor = if self.turn.is_some() { from } else { position };
        let heading = Mat4::from_rotation_y(self.facing.heading());

        let mut limbs = [Transform::IDENTITY; 4];
        for limb in Limb::ALL {
            let offset = self.facing.limb_offset(limb);
            let mut model = Mat4::from_translation(anchor + offset);
            if let Some(turn) = self.turn {
                let pivot = turn.pivot + offset;
                model = model
                    * Mat4::from_translation(-pivot)
                    * Mat4::from_rotation_y(turn.degrees.to_radians() * progress.fraction)
                    * Mat4::from_translation(pivot);
            }
            model *= heading;
            if walk_cycle {
                model *= stride(limb, time);
            }
            limbs[limb.index()] = Transform::from_model(model);
        }

        UnitPose {
            segment: u32::try_from(progress.segment).unwrap_or(u32::MAX),
            position,
            limbs,
        }
    }
}

/// Walk-cycle overlay applied in the limb's local frame, including the mesh scale.
fn stride(limb: Limb, time: f32) -> Mat4 {
    let swing = (time * STRIDE_FREQUENCY).sin();
    let about_face = Mat4::from_rotation_y(PI);
    let scale = Mat4::from_scale(Vec3::splat(MODEL_SCALE));
    let ankle = Vec3::new(0.0, 6.0 * MODEL_SCALE, 0.0);
    match limb {
        Limb::Body => about_face * scale,
        Limb::RightArm => {
            Mat4::from_rotation_x(swing)
                * Mat4::from_translation(Vec3::new(0.0, -3.0 * MODEL_SCALE, 0.0))
                * about_face
                * scale
        }
        Limb::LeftFoot | Limb::RightFoot => {
            let phase = if limb == Limb::LeftFoot {
                -FOOT_SWING
            } else {
                FOOT_SWING
            };
            about_face
                * Mat4::from_translation(ankle)
                * Mat4::from_rotation_x(phase * swing)
                * Mat4::from_translation(-ankle)
                * scale
        }
    }
}

fn ground(point: Vec2) -> Vec3 {
    Vec3::new(point.x, UNIT_HEIGHT, point.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(segment: usize, fraction: f32) -> SegmentProgress {
        SegmentProgress { segment, fraction }
    }

    #[test]
    fn elapsed_time_splits_into_segment_and_fraction() {
        let split = SegmentProgress::from_elapsed(Duration::from_millis(3_250));
        assert_eq!(split.segment, 3);
        assert!((split.fraction - 0.25).abs() < 1e-6);
    }

    #[test]
    fn first_segment_walks_between_first_two_waypoints() {
        let recipe = recipe_for(0);
        let start = recipe.position(progress(0, 0.0));
        let middle = recipe.position(progress(0, 0.5));
        assert_eq!(start, Vec3::new(2.0, UNIT_HEIGHT, 0.0));
        assert_eq!(middle, Vec3::new(2.0, UNIT_HEIGHT, 2.0));
    }

    #[test]
    fn turn_segments_keep_the_anchor_at_the_corner() {
        let recipe = recipe_for(3);
        assert!(recipe.turn.is_some());
        let pose = recipe.pose(progress(3, 0.5), 0.0, false);
        let body = pose.limb(Limb::Body).model;
        let (from, to) = recipe.endpoints(3);
        assert_eq!(from, Vec3::new(2.0, UNIT_HEIGHT, 12.0));
        assert_eq!(to, Vec3::new(4.0, UNIT_HEIGHT, 14.0));
        assert_eq!(pose.position, from.lerp(to, 0.5));

        let expected = Mat4::from_translation(from)
            * Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))
            * Mat4::from_rotation_y(45.0_f32.to_radians())
            * Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0));
        assert!(body.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn every_table_segment_moves_less_than_one_tile_diagonal() {
        for segment in 0..path::PATH.len() {
            let (from, to) = recipe_for(segment).endpoints(segment);
            assert!(
                from.distance(to) <= 4.0 + 1e-4,
                "segment {segment} jumps {}",
                from.distance(to)
            );
        }
    }

    #[test]
    fn segments_past_the_table_idle_at_the_terminal_waypoint() {
        let terminal = path::terminal_corner();
        let position = recipe_for(40).position(progress(40, 0.7));
        assert_eq!(position, Vec3::new(terminal.x + 2.0, UNIT_HEIGHT, terminal.y));
        assert!(!is_final_leg(40));
        assert!(is_final_leg(28) && is_final_leg(29));
    }

    #[test]
    fn only_final_leg_recipes_detect_arrivals() {
        for segment in 0..path::PATH.len() {
            assert_eq!(
                recipe_for(segment).arrival,
                path::FINAL_LEG.contains(&segment),
                "segment {segment}"
            );
        }
    }

    #[test]
    fn walk_cycle_scales_every_limb() {
        let pose = pose_for(Duration::from_millis(500), 1.3);
        for limb in Limb::ALL {
            let model = pose.limb(limb).model;
            let scale = model.transform_vector3(Vec3::X).length();
            assert!((scale - MODEL_SCALE).abs() < 1e-5, "{limb:?} scale {scale}");
        }
    }

    #[test]
    fn normal_matrices_match_model_matrices() {
        let pose = pose_for(Duration::from_millis(14_400), 2.0);
        for limb in Limb::ALL {
            let transform = pose.limb(limb);
            let expected = pirate_defence_core::normal_matrix(transform.model);
            assert!(transform.normal.abs_diff_eq(expected, 1e-4));
        }
    }
}
