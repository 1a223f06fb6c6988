//! Treasure chests guarding the end of the pirate route.

use glam::{Vec2, Vec3};
use pirate_defence_core::{
    TreasureId, TreasureSnapshot, TREASURE_COINS, TREASURE_HEIGHT, TREASURE_LOOT,
};

use crate::path;

/// Anchor offsets relative to the terminal waypoint corner and chest headings.
const ANCHORS: [(Vec2, f32); 3] = [
    (Vec2::new(2.05, 0.579_95), 0.0),
    (Vec2::new(0.579_95, 2.7), 90.0),
    (Vec2::new(3.415, 2.7), -90.0),
];

#[derive(Clone, Debug)]
pub(crate) struct Treasure {
    pub(crate) id: TreasureId,
    pub(crate) position: Vec3,
    pub(crate) heading_degrees: f32,
    pub(crate) coins: i32,
}

impl Treasure {
    /// Removes one pirate's share of coins and reports what is left.
    pub(crate) fn loot(&mut self) -> i32 {
        self.coins -= TREASURE_LOOT;
        self.coins
    }

    pub(crate) fn snapshot(&self) -> TreasureSnapshot {
        TreasureSnapshot {
            id: self.id,
            position: self.position,
            coins: self.coins,
            heading_degrees: self.heading_degrees,
        }
    }
}

/// Creates the three chests around the terminal waypoint.
pub(crate) fn initial_treasures() -> Vec<Treasure> {
    let corner = path::terminal_corner();
    ANCHORS
        .iter()
        .zip(0u8..)
        .map(|(&(offset, heading_degrees), slot)| {
            let ground = corner + offset;
            Treasure {
                id: TreasureId::new(slot),
                position: Vec3::new(ground.x, TREASURE_HEIGHT, ground.y),
                heading_degrees,
                coins: TREASURE_COINS,
            }
        })
        .collect()
}
