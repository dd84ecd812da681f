use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::record::{self, RunRecord};
use crate::round::{RoundState, SimulationRound};
use crate::schedule::RotationSchedule;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperimentStatus {
    Running,
    /// The round with this index finished during the last step and its
    /// successor, if any, has already started.
    RoundCompleted { round: usize },
    Halted,
}

/// Drives a fixed budget of rounds, assigning strategies from a rotation
/// schedule and collecting one `RunRecord` per round.
#[derive(Debug)]
pub struct ExperimentScheduler {
    config: SimulationConfig,
    schedule: RotationSchedule,
    rounds_remaining: usize,
    records: Vec<RunRecord>,
    active: Option<SimulationRound>,
    rng: StdRng,
}

impl ExperimentScheduler {
    /// Three-way Closest / RandomTarget / Ambush rotation over
    /// `total_rounds`. The first round starts immediately.
    pub fn new(config: SimulationConfig, total_rounds: usize, seed: u64) -> Result<Self> {
        Self::with_schedule(config, RotationSchedule::three_way(total_rounds), seed)
    }

    pub fn with_schedule(
        config: SimulationConfig,
        schedule: RotationSchedule,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        info!(rounds = schedule.total_rounds(), seed, "experiment started");
        let mut experiment = Self {
            config,
            rounds_remaining: schedule.total_rounds(),
            schedule,
            records: Vec::new(),
            active: None,
            rng: StdRng::seed_from_u64(seed),
        };
        experiment.launch_next()?;
        Ok(experiment)
    }

    /// Like `new`, seeded from the platform entropy source.
    pub fn from_entropy(config: SimulationConfig, total_rounds: usize) -> Result<Self> {
        let seed = getrandom::u64().map_err(|err| SimError::Entropy(err.to_string()))?;
        Self::new(config, total_rounds, seed)
    }

    /// Advances the active round by one tick, rolling over to the next round
    /// when it finishes.
    pub fn step(&mut self, dt_ms: f64) -> Result<ExperimentStatus> {
        let round = self.active.as_mut().ok_or(SimError::ExperimentHalted)?;
        let index = round.index();
        if round.step(dt_ms)? != RoundState::Finished {
            return Ok(ExperimentStatus::Running);
        }

        self.settle()?;
        if self.is_halted() {
            Ok(ExperimentStatus::Halted)
        } else {
            Ok(ExperimentStatus::RoundCompleted { round: index })
        }
    }

    /// Steps with a fixed frame delta until the experiment halts or
    /// `max_ticks` is spent. Returns whether it halted.
    pub fn run_to_completion(&mut self, dt_ms: f64, max_ticks: usize) -> Result<bool> {
        for _ in 0..max_ticks {
            if self.is_halted() {
                break;
            }
            self.step(dt_ms)?;
        }
        Ok(self.is_halted())
    }

    /// Takes new settings from the host. Tuning factors reach the active
    /// round immediately; counts and timing apply from the next round. The
    /// canvas size stays whatever `set_bounds` last stored.
    pub fn apply_settings(&mut self, mut config: SimulationConfig) -> Result<()> {
        config.canvas_width = self.config.canvas_width;
        config.canvas_height = self.config.canvas_height;
        if let Err(err) = config.validate() {
            warn!(error = %err, "settings rejected");
            return Err(err.into());
        }
        if let Some(round) = self.active.as_mut() {
            round.retune(&config);
        }
        self.config = config;
        Ok(())
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<()> {
        let mut config = self.config.clone();
        config.canvas_width = width;
        config.canvas_height = height;
        if let Err(err) = config.validate() {
            warn!(error = %err, width, height, "canvas size rejected");
            return Err(err.into());
        }
        if let Some(round) = self.active.as_mut() {
            round.set_bounds(width, height);
        }
        self.config = config;
        Ok(())
    }

    /// Discards all records and runs the full budget again.
    pub fn restart(&mut self) -> Result<()> {
        self.records.clear();
        self.active = None;
        self.rounds_remaining = self.schedule.total_rounds();
        info!(rounds = self.rounds_remaining, "experiment restarted");
        self.launch_next()
    }

    /// Finalized records. Fails while rounds are still pending so callers
    /// never see a partial experiment.
    pub fn records(&self) -> Result<&[RunRecord]> {
        if !self.is_halted() {
            return Err(SimError::RecordsUnavailable);
        }
        Ok(&self.records)
    }

    pub fn take_records(&mut self) -> Result<Vec<RunRecord>> {
        if !self.is_halted() {
            return Err(SimError::RecordsUnavailable);
        }
        Ok(std::mem::take(&mut self.records))
    }

    pub fn export_json(&self) -> Result<String> {
        record::to_json(self.records()?)
    }

    pub fn active_round(&self) -> Option<&SimulationRound> {
        self.active.as_ref()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn schedule(&self) -> &RotationSchedule {
        &self.schedule
    }

    pub fn rounds_remaining(&self) -> usize {
        self.rounds_remaining
    }

    pub fn rounds_completed(&self) -> usize {
        self.schedule.total_rounds() - self.rounds_remaining
    }

    pub fn is_halted(&self) -> bool {
        self.rounds_remaining == 0
    }

    /// Starts the next round and settles any that finish on start.
    fn launch_next(&mut self) -> Result<()> {
        if self.rounds_remaining == 0 {
            info!(records = self.records.len(), "experiment halted");
            return Ok(());
        }
        self.active = Some(self.spawn_round()?);
        self.settle()
    }

    /// Finalizes every finished round, launching successors until one is
    /// still running or the budget is spent.
    fn settle(&mut self) -> Result<()> {
        while let Some(round) = self.active.take() {
            if round.state() != RoundState::Finished {
                self.active = Some(round);
                return Ok(());
            }

            self.records.push(round.finalize()?);
            self.rounds_remaining -= 1;
            if self.rounds_remaining == 0 {
                info!(records = self.records.len(), "experiment halted");
                return Ok(());
            }
            self.active = Some(self.spawn_round()?);
        }
        Ok(())
    }

    fn spawn_round(&mut self) -> Result<SimulationRound> {
        let index = self.rounds_completed();
        let mut config = self.config.clone();
        if let Some(strategy) = self.schedule.strategy_for(index) {
            config.strategy = strategy;
        }
        let mut round = SimulationRound::new(index, config, self.rng.gen())?;
        round.start()?;
        Ok(round)
    }
}
