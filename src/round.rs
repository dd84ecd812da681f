use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::agent::Agent;
use crate::capture::{self, CaptureEvent};
use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::flock::Flock;
use crate::predator::Predator;
use crate::record::RunRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    Active,
    Finished,
}

/// Logical round clock, advanced only by the frame deltas the host passes
/// to `step`.
#[derive(Clone, Copy, Debug, Default)]
struct RoundClock {
    elapsed_ms: f64,
    delay_ms: f64,
}

impl RoundClock {
    fn pursuing(&self) -> bool {
        self.elapsed_ms >= self.delay_ms
    }

    /// Milliseconds since pursuit began; zero during the delay window.
    fn pursuit_ms(&self) -> u64 {
        (self.elapsed_ms - self.delay_ms).max(0.0).floor() as u64
    }
}

/// One simulation instance, from agent placement to its termination
/// condition. A finished round is terminal; build a new one to continue.
#[derive(Debug)]
pub struct SimulationRound {
    index: usize,
    config: SimulationConfig,
    state: RoundState,
    flock: Flock,
    predators: Vec<Predator>,
    predator_positions: Vec<Vec2>,
    clock: RoundClock,
    threshold: usize,
    captures: Vec<CaptureEvent>,
    traveled_distance: f64,
    timed_out: bool,
}

impl SimulationRound {
    /// Validates `config` and places boids at random and predators at the
    /// canvas center, using an RNG private to this round.
    pub fn new(index: usize, config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let flock = Flock::spawn(&mut rng, &config);
        let predators = (0..config.predator_count)
            .map(|_| Predator::spawn(&mut rng, &config, flock.len()))
            .collect();
        Ok(Self::assemble(index, config, flock, predators))
    }

    /// Builds a round around caller-placed agents.
    pub fn with_agents(
        index: usize,
        config: SimulationConfig,
        boids: Vec<Agent>,
        predators: Vec<Predator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(index, config, Flock::new(boids), predators))
    }

    fn assemble(
        index: usize,
        config: SimulationConfig,
        flock: Flock,
        predators: Vec<Predator>,
    ) -> Self {
        let threshold = config.termination.threshold(flock.len());
        Self {
            index,
            clock: RoundClock {
                elapsed_ms: 0.0,
                delay_ms: config.pursuit_delay_ms,
            },
            predator_positions: Vec::with_capacity(predators.len()),
            config,
            state: RoundState::Idle,
            flock,
            predators,
            threshold,
            captures: Vec::new(),
            traveled_distance: 0.0,
            timed_out: false,
        }
    }

    pub fn start(&mut self) -> Result<RoundState> {
        match self.state {
            RoundState::Idle => {}
            RoundState::Active => return Ok(self.state),
            RoundState::Finished => return Err(SimError::RoundFinished),
        }

        self.state = RoundState::Active;
        info!(
            round = self.index,
            strategy = self.config.strategy.id(),
            boids = self.flock.len(),
            predators = self.predators.len(),
            "round started"
        );
        self.check_termination();
        Ok(self.state)
    }

    /// Advances one tick: boids, then predators, then captures, then the
    /// termination check.
    pub fn step(&mut self, dt_ms: f64) -> Result<RoundState> {
        match self.state {
            RoundState::Idle => return Err(SimError::RoundNotStarted),
            RoundState::Finished => return Err(SimError::RoundFinished),
            RoundState::Active => {}
        }
        if !dt_ms.is_finite() || dt_ms < 0.0 {
            return Err(SimError::InvalidTick(dt_ms));
        }

        self.clock.elapsed_ms += dt_ms;
        self.sync_predator_positions();
        self.flock.step(&self.predator_positions, &self.config);

        if self.clock.pursuing() {
            for predator in &mut self.predators {
                let covered = predator.advance(self.flock.boids(), &self.config);
                self.traveled_distance += covered as f64;
            }
            self.sync_predator_positions();
            capture::resolve_captures(
                &mut self.flock,
                &self.predator_positions,
                self.config.capture_radius,
                self.clock.pursuit_ms(),
                &mut self.captures,
            );
        }

        self.check_termination();
        Ok(self.state)
    }

    /// The record for this round. Only available once it has finished.
    pub fn finalize(&self) -> Result<RunRecord> {
        if self.state != RoundState::Finished {
            return Err(SimError::RoundInProgress);
        }

        Ok(RunRecord {
            round: self.index,
            config: self.config.clone(),
            captures: self.captures.clone(),
            total_elapsed_ms: self.clock.pursuit_ms(),
            traveled_distance: self.traveled_distance,
            remaining_boids: self.flock.len(),
            timed_out: self.timed_out,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn boids(&self) -> &[Agent] {
        self.flock.boids()
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn predators(&self) -> &[Predator] {
        &self.predators
    }

    pub fn captures(&self) -> &[CaptureEvent] {
        &self.captures
    }

    pub fn traveled_distance(&self) -> f64 {
        self.traveled_distance
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms
    }

    pub fn is_pursuing(&self) -> bool {
        self.state == RoundState::Active && self.clock.pursuing()
    }

    /// Applies tuning factors mid-round; counts and strategy are kept.
    pub(crate) fn retune(&mut self, config: &SimulationConfig) {
        self.config.retune_from(config);
    }

    pub(crate) fn set_bounds(&mut self, width: f32, height: f32) {
        self.config.canvas_width = width;
        self.config.canvas_height = height;
    }

    fn sync_predator_positions(&mut self) {
        self.predator_positions.clear();
        self.predator_positions
            .extend(self.predators.iter().map(Predator::position));
    }

    fn check_termination(&mut self) {
        if self.state != RoundState::Active {
            return;
        }

        if self.flock.len() <= self.threshold {
            self.finish();
            return;
        }

        if let Some(limit) = self.config.max_round_ms {
            if self.clock.pursuing() && self.clock.pursuit_ms() as f64 >= limit {
                self.timed_out = true;
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.state = RoundState::Finished;
        info!(
            round = self.index,
            strategy = self.config.strategy.id(),
            captures = self.captures.len(),
            elapsed_ms = self.clock.pursuit_ms(),
            traveled_distance = self.traveled_distance,
            timed_out = self.timed_out,
            "round finished"
        );
    }
}
