//! Session settings merged from an optional TOML file and command-line flags.

use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, ensure, Context, Result};
use pirate_defence_core::{GridTile, ShotGuidance, SELECTION_LIMIT};
use pirate_defence_simulation::SimulationConfig;
use pirate_defence_system_cadence::Config as CadenceConfig;
use serde::Deserialize;

use crate::Args;

const DEFAULT_FRAME_MS: u64 = 16;
const DEFAULT_MAX_SECONDS: u64 = 600;

/// Contents of a session file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionFile {
    simulation: SimulationConfig,
    cadence: CadenceFile,
    frame_ms: Option<u64>,
    max_seconds: Option<u64>,
    build: Vec<[i32; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CadenceFile {
    wave_interval_ms: u64,
    tower_interval_ms: u64,
    removal_interval_ms: u64,
    total_waves: u32,
    bonus_per_wave: i32,
}

impl Default for CadenceFile {
    fn default() -> Self {
        Self {
            wave_interval_ms: 2_000,
            tower_interval_ms: 10_000,
            removal_interval_ms: 7_000,
            total_waves: 12,
            bonus_per_wave: 2,
        }
    }
}

impl CadenceFile {
    fn config(&self) -> CadenceConfig {
        CadenceConfig::new(
            Duration::from_millis(self.wave_interval_ms),
            Duration::from_millis(self.tower_interval_ms),
            Duration::from_millis(self.removal_interval_ms),
            self.total_waves,
            self.bonus_per_wave,
        )
    }
}

/// Fully resolved parameters of one headless session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) simulation: SimulationConfig,
    pub(crate) cadence: CadenceConfig,
    pub(crate) frame: Duration,
    pub(crate) time_limit: Duration,
    pub(crate) build: Vec<GridTile>,
}

impl Settings {
    /// Loads the session file named by `args`, if any, and applies the flags over it.
    pub(crate) fn resolve(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => load(path)?,
            None => SessionFile::default(),
        };

        let mut simulation = file.simulation;
        if let Some(seed) = args.seed {
            simulation.seed = seed;
        }
        if args.tracking {
            simulation.guidance = ShotGuidance::Tracking;
        }

        let frame_ms = args.frame_ms.or(file.frame_ms).unwrap_or(DEFAULT_FRAME_MS);
        ensure!(frame_ms > 0, "frame duration must be positive");
        let max_seconds = args
            .max_seconds
            .or(file.max_seconds)
            .unwrap_or(DEFAULT_MAX_SECONDS);
        ensure!(max_seconds > 0, "time limit must be positive");

        let build = if args.build.is_empty() {
            file.build
                .iter()
                .map(|[column, row]| checked_tile(*column, *row))
                .collect::<Result<Vec<_>>>()
                .context("invalid build order in session file")?
        } else {
            args.build
                .iter()
                .map(|text| parse_tile(text))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            simulation,
            cadence: file.cadence.config(),
            frame: Duration::from_millis(frame_ms),
            time_limit: Duration::from_secs(max_seconds),
            build,
        })
    }
}

fn load(path: &Path) -> Result<SessionFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse session file {}", path.display()))
}

fn parse(text: &str) -> Result<SessionFile> {
    Ok(toml::from_str(text)?)
}

fn parse_tile(text: &str) -> Result<GridTile> {
    let (column, row) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("build tile `{text}` must look like COLUMN,ROW"))?;
    let column = column
        .trim()
        .parse()
        .with_context(|| format!("invalid column in build tile `{text}`"))?;
    let row = row
        .trim()
        .parse()
        .with_context(|| format!("invalid row in build tile `{text}`"))?;
    checked_tile(column, row)
}

fn checked_tile(column: i32, row: i32) -> Result<GridTile> {
    let range = 0..=SELECTION_LIMIT;
    ensure!(
        range.contains(&column) && range.contains(&row),
        "build tile ({column}, {row}) lies outside the 0..={SELECTION_LIMIT} board"
    );
    Ok(GridTile::new(column, row))
}
