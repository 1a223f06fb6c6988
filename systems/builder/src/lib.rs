#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that translates selection input into tower placement and removal commands.

use pirate_defence_core::{Command, CursorMove, GridTile};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub place_action: bool,
    /// Indicates whether the player requested tower removal on this frame.
    pub remove_action: bool,
    /// Cursor step requested on this frame, if any.
    pub cursor_step: Option<CursorMove>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        place_action: bool,
        remove_action: bool,
        cursor_step: Option<CursorMove>,
    ) -> Self {
        Self {
            place_action,
            remove_action,
            cursor_step,
        }
    }

    /// Input that only places a tower on the selected tile.
    #[must_use]
    pub const fn place() -> Self {
        Self::new(true, false, None)
    }

    /// Input that only removes the tower on the selected tile.
    #[must_use]
    pub const fn remove() -> Self {
        Self::new(false, true, None)
    }

    /// Input that only moves the cursor by one tile.
    #[must_use]
    pub const fn step(step: CursorMove) -> Self {
        Self::new(false, false, Some(step))
    }
}

/// System that acts on whatever tile the selection cursor currently rests on.
#[derive(Debug, Clone, Default)]
pub struct Builder;

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emits commands for the frame's input.
    ///
    /// Placement and removal act on `selection` as it was before this frame's
    /// cursor step, which is applied last.
    pub fn handle(&mut self, selection: GridTile, input: BuilderInput, out: &mut Vec<Command>) {
        if input.place_action {
            out.push(Command::PlaceTower { tile: selection });
        }

        if input.remove_action {
            out.push(Command::RemoveTower { tile: selection });
        }

        if let Some(step) = input.cursor_step {
            out.push(Command::MoveSelection { step });
        }
    }
}
