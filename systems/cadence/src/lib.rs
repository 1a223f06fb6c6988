#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session director deciding when waves arrive, when resources are granted
//! and when a session has been won.

use std::time::Duration;

/// Configuration parameters required to construct the cadence system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    wave_interval: Duration,
    tower_interval: Duration,
    removal_interval: Duration,
    total_waves: u32,
    bonus_per_wave: i32,
}

impl Config {
    /// Creates a new configuration using the provided cadence.
    #[must_use]
    pub const fn new(
        wave_interval: Duration,
        tower_interval: Duration,
        removal_interval: Duration,
        total_waves: u32,
        bonus_per_wave: i32,
    ) -> Self {
        Self {
            wave_interval,
            tower_interval,
            removal_interval,
            total_waves,
            bonus_per_wave,
        }
    }

    /// Minimum time between two waves.
    #[must_use]
    pub const fn wave_interval(&self) -> Duration {
        self.wave_interval
    }

    /// Number of waves in a session.
    #[must_use]
    pub const fn total_waves(&self) -> u32 {
        self.total_waves
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(2),
            Duration::from_secs(10),
            Duration::from_secs(7),
            12,
            2,
        )
    }
}

/// Work the caller should perform for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Keep simulating this frame.
    Continue {
        /// Life bonus of a wave to spawn before updating, if one is due.
        wave_bonus: Option<i32>,
        /// Grant the player one tower before updating.
        grant_tower: bool,
        /// Grant the player one removal token before updating.
        grant_removal: bool,
    },
    /// Every wave was spawned and the board is clear; stop without updating.
    Victory,
}

/// Stateful director that mirrors the session loop's timers.
#[derive(Debug)]
pub struct Cadence {
    config: Config,
    elapsed: Duration,
    last_wave: Option<Duration>,
    last_tower: Duration,
    last_removal: Duration,
    next_wave: u32,
}

impl Cadence {
    /// Creates a new director using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            elapsed: Duration::ZERO,
            last_wave: None,
            last_tower: Duration::ZERO,
            last_removal: Duration::ZERO,
            next_wave: 1,
        }
    }

    /// Number of waves requested so far.
    #[must_use]
    pub fn waves_spawned(&self) -> u32 {
        self.next_wave - 1
    }

    /// Reports whether every configured wave has been requested.
    #[must_use]
    pub fn all_waves_spawned(&self) -> bool {
        self.next_wave > self.config.total_waves
    }

    /// Advances the director's clock and decides what the frame should do.
    ///
    /// `board_empty` must reflect the simulation state before this frame's update.
    pub fn plan(&mut self, dt: Duration, board_empty: bool) -> Directive {
        self.elapsed = self.elapsed.saturating_add(dt);

        let mut wave_bonus = None;
        if !self.all_waves_spawned() {
            let due = self.last_wave.map_or(true, |last| {
                self.elapsed.saturating_sub(last) > self.config.wave_interval
            });
            if due {
                wave_bonus = Some(self.config.bonus_per_wave * self.next_wave as i32);
                self.last_wave = Some(self.elapsed);
                self.next_wave += 1;
            }
        }

        // A wave requested this frame has not reached the board yet.
        if wave_bonus.is_none() && self.all_waves_spawned() && board_empty {
            return Directive::Victory;
        }

        let grant_tower = self.elapsed.saturating_sub(self.last_tower) > self.config.tower_interval;
        if grant_tower {
            self.last_tower = self.elapsed;
        }
        let grant_removal =
            self.elapsed.saturating_sub(self.last_removal) > self.config.removal_interval;
        if grant_removal {
            self.last_removal = self.elapsed;
        }

        Directive::Continue {
            wave_bonus,
            grant_tower,
            grant_removal,
        }
    }
}
