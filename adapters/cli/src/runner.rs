//! Headless session loop: cadence decisions, scripted builds, simulation
//! updates and draw submission into a recording sink.

use std::{collections::VecDeque, fmt, time::Duration};

use anyhow::{Context, Result};
use pirate_defence_core::{CursorMove, Event, GridTile, RemovalCause};
use pirate_defence_rendering::{submit_scene, RecordingSink, Scene};
use pirate_defence_simulation::Simulation;
use pirate_defence_system_cadence::{Cadence, Directive};
use pirate_defence_world::{path, query, World};
use tracing::{debug, info, warn};

use crate::session::Settings;

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Ending {
    Victory,
    Defeat,
    TimeLimit,
}

/// Summary of a finished session.
#[derive(Clone, Debug)]
pub(crate) struct Report {
    banner: &'static str,
    ending: Ending,
    elapsed: Duration,
    frames: u64,
    waves: u32,
    slain: usize,
    arrived: usize,
    towers_built: usize,
    shots: usize,
    draw_calls: usize,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ending = match self.ending {
            Ending::Victory => "victory",
            Ending::Defeat => "defeat",
            Ending::TimeLimit => "time limit",
        };
        writeln!(f, "{}", self.banner)?;
        writeln!(
            f,
            "session ended in {ending} after {:.1}s ({} frames)",
            self.elapsed.as_secs_f32(),
            self.frames
        )?;
        writeln!(
            f,
            "waves: {}, pirates slain: {}, pirates arrived: {}",
            self.waves, self.slain, self.arrived
        )?;
        write!(
            f,
            "towers built: {}, shots fired: {}, draw calls last frame: {}",
            self.towers_built, self.shots, self.draw_calls
        )
    }
}

/// Runs one session to completion.
pub(crate) fn run(settings: &Settings) -> Result<Report> {
    let mut simulation = Simulation::new(settings.simulation);
    let mut cadence = Cadence::new(settings.cadence);
    let mut pending: VecDeque<GridTile> = settings.build.iter().copied().collect();
    let mut sink = RecordingSink::new();
    let mut report = Report {
        banner: query::welcome_banner(simulation.world()),
        ending: Ending::TimeLimit,
        elapsed: Duration::ZERO,
        frames: 0,
        waves: 0,
        slain: 0,
        arrived: 0,
        towers_built: 0,
        shots: 0,
        draw_calls: 0,
    };

    info!(
        frame = ?settings.frame,
        time_limit = ?settings.time_limit,
        builds = pending.len(),
        "session started"
    );
    loop {
        if simulation.game_over() {
            report.ending = Ending::Defeat;
            break;
        }
        if report.elapsed >= settings.time_limit {
            break;
        }

        match cadence.plan(settings.frame, simulation.is_board_empty()) {
            Directive::Victory => {
                report.ending = Ending::Victory;
                break;
            }
            Directive::Continue {
                wave_bonus,
                grant_tower,
                grant_removal,
            } => {
                if let Some(bonus) = wave_bonus {
                    simulation.add_pirate_wave(bonus);
                }
                if grant_tower {
                    simulation.give_tower();
                }
                if grant_removal {
                    simulation.add_removal();
                }
            }
        }

        build_pending(&mut simulation, &mut pending);
        simulation.update(settings.frame);
        report.elapsed += settings.frame;
        report.frames += 1;
        tally(&mut report, simulation.drain_events());

        sink.clear();
        submit_scene(&capture(simulation.world()), &mut sink)
            .with_context(|| format!("failed to draw frame {}", report.frames))?;
        report.draw_calls = sink.calls().len();
    }

    report.waves = cadence.waves_spawned();
    info!(ending = ?report.ending, elapsed = ?report.elapsed, "session finished");
    Ok(report)
}

fn build_pending(simulation: &mut Simulation, pending: &mut VecDeque<GridTile>) {
    while let Some(&tile) = pending.front() {
        if query::available_towers(simulation.world()) == 0 {
            return;
        }
        steer(simulation, tile);
        match simulation.place_tower() {
            Ok(tower) => debug!(tower = tower.get(), ?tile, "build order placed"),
            Err(reason) => warn!(?tile, %reason, "build order skipped"),
        }
        let _ = pending.pop_front();
    }
}

fn steer(simulation: &mut Simulation, tile: GridTile) {
    loop {
        let current = query::selection(simulation.world());
        let step = if current.column() < tile.column() {
            CursorMove::Left
        } else if current.column() > tile.column() {
            CursorMove::Right
        } else if current.row() < tile.row() {
            CursorMove::Forward
        } else if current.row() > tile.row() {
            CursorMove::Backward
        } else {
            return;
        };
        simulation.move_selection(step);
    }
}

fn tally(report: &mut Report, events: Vec<Event>) {
    for event in events {
        match event {
            Event::UnitRemoved {
                cause: RemovalCause::Slain,
                ..
            } => report.slain += 1,
            Event::UnitRemoved {
                cause: RemovalCause::Arrived,
                ..
            } => report.arrived += 1,
            Event::TowerPlaced { .. } => report.towers_built += 1,
            Event::ProjectileFired { .. } => report.shots += 1,
            _ => {}
        }
    }
}

fn capture(world: &World) -> Scene {
    Scene {
        road: path::PATH.to_vec(),
        units: query::unit_view(world),
        towers: query::tower_view(world),
        treasures: query::treasure_view(world),
        selection: query::selection(world),
        highlight: query::highlight(world),
    }
}
