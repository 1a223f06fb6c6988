//! Fixed pirate route and the tiles that may host towers.

use glam::Vec2;
use pirate_defence_core::GridTile;

/// Waypoints of the pirate route in walking order.
pub const PATH: [GridTile; 30] = [
    GridTile::new(0, 0),
    GridTile::new(0, 1),
    GridTile::new(0, 2),
    GridTile::new(0, 3),
    GridTile::new(1, 3),
    GridTile::new(1, 4),
    GridTile::new(1, 5),
    GridTile::new(1, 6),
    GridTile::new(1, 7),
    GridTile::new(2, 7),
    GridTile::new(2, 8),
    GridTile::new(3, 8),
    GridTile::new(4, 8),
    GridTile::new(5, 8),
    GridTile::new(6, 8),
    GridTile::new(6, 7),
    GridTile::new(6, 6),
    GridTile::new(7, 6),
    GridTile::new(7, 5),
    GridTile::new(7, 4),
    GridTile::new(7, 3),
    GridTile::new(8, 3),
    GridTile::new(9, 3),
    GridTile::new(9, 2),
    GridTile::new(9, 1),
    GridTile::new(8, 1),
    GridTile::new(7, 1),
    GridTile::new(6, 1),
    GridTile::new(6, 0),
    GridTile::new(6, -1),
];

/// Tiles on which the player may build towers.
pub const ELIGIBLE_TILES: [GridTile; 38] = [
    GridTile::new(0, 4),
    GridTile::new(0, 5),
    GridTile::new(0, 6),
    GridTile::new(0, 7),
    GridTile::new(1, 0),
    GridTile::new(1, 1),
    GridTile::new(1, 2),
    GridTile::new(1, 8),
    GridTile::new(2, 3),
    GridTile::new(2, 4),
    GridTile::new(2, 5),
    GridTile::new(2, 6),
    GridTile::new(2, 9),
    GridTile::new(3, 7),
    GridTile::new(3, 9),
    GridTile::new(4, 7),
    GridTile::new(4, 9),
    GridTile::new(5, 0),
    GridTile::new(5, 1),
    GridTile::new(5, 6),
    GridTile::new(5, 7),
    GridTile::new(5, 9),
    GridTile::new(6, 2),
    GridTile::new(6, 3),
    GridTile::new(6, 4),
    GridTile::new(6, 5),
    GridTile::new(6, 9),
    GridTile::new(7, 0),
    GridTile::new(7, 2),
    GridTile::new(7, 7),
    GridTile::new(7, 8),
    GridTile::new(8, 0),
    GridTile::new(8, 2),
    GridTile::new(8, 4),
    GridTile::new(8, 5),
    GridTile::new(8, 6),
    GridTile::new(9, 0),
    GridTile::new(9, 4),
];

/// Returns the waypoint at `index`, clamped to the terminal waypoint.
#[must_use]
pub fn waypoint(index: usize) -> GridTile {
    PATH[index.min(PATH.len() - 1)]
}

/// World-space (x, z) corner of the waypoint at `index`, clamped like [`waypoint`].
#[must_use]
pub fn waypoint_corner(index: usize) -> Vec2 {
    waypoint(index).corner()
}

/// World-space (x, z) corner of the terminal waypoint, around which chests are anchored.
#[must_use]
pub fn terminal_corner() -> Vec2 {
    waypoint_corner(PATH.len() - 1)
}

/// Reports whether the tile lies on the pirate route.
#[must_use]
pub fn is_on_path(tile: GridTile) -> bool {
    PATH.contains(&tile)
}

/// Reports whether the tile belongs to the buildable tile set.
#[must_use]
pub fn is_eligible(tile: GridTile) -> bool {
    ELIGIBLE_TILES.contains(&tile)
}

/// Segments forming the final leg, on which pirates may reach the chests.
pub const FINAL_LEG: [usize; 2] = [PATH.len() - 2, PATH.len() - 1];
