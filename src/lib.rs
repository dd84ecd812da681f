use wasm_bindgen::prelude::*;

pub mod agent;
pub mod capture;
pub mod config;
pub mod error;
pub mod experiment;
pub mod flock;
pub mod math;
pub mod predator;
pub mod record;
pub mod round;
pub mod schedule;

pub use agent::{Agent, Trail};
pub use capture::CaptureEvent;
pub use config::{AlignmentMode, AmbushMode, SimulationConfig, StrategyKind, Termination};
pub use error::SimError;
pub use experiment::{ExperimentScheduler, ExperimentStatus};
pub use flock::Flock;
pub use predator::{Predator, Pursuit};
pub use record::{ExportRow, RunRecord, EXPORT_HEADERS};
pub use round::{RoundState, SimulationRound};
pub use schedule::RotationSchedule;

/// Host-facing handle. The page's animation frame calls `step` once per
/// frame and redraws from the agent buffers; the settings panel feeds
/// `apply_settings_json`; the export button reads `records_json`.
#[wasm_bindgen]
pub struct Sim {
    experiment: ExperimentScheduler,
}

#[wasm_bindgen]
impl Sim {
    /// A `seed` of zero draws one from the platform entropy source.
    #[wasm_bindgen(constructor)]
    pub fn new(
        count: usize,
        rounds: usize,
        seed: u32,
        width: f32,
        height: f32,
    ) -> Result<Sim, JsError> {
        let config = SimulationConfig {
            boid_count: count,
            canvas_width: width,
            canvas_height: height,
            ..SimulationConfig::default()
        };
        let experiment = if seed == 0 {
            ExperimentScheduler::from_entropy(config, rounds)?
        } else {
            ExperimentScheduler::new(config, rounds, u64::from(seed))?
        };
        Ok(Sim { experiment })
    }

    /// Advances one frame of `dt` milliseconds. Returns false once the
    /// experiment has halted.
    pub fn step(&mut self, dt: f64) -> Result<bool, JsError> {
        let status = self.experiment.step(dt)?;
        Ok(status != ExperimentStatus::Halted)
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), JsError> {
        self.experiment.set_bounds(width, height)?;
        Ok(())
    }

    pub fn apply_settings_json(&mut self, json: &str) -> Result<(), JsError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        self.experiment.apply_settings(config)?;
        Ok(())
    }

    pub fn restart(&mut self) -> Result<(), JsError> {
        self.experiment.restart()?;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.round().map_or(0, |round| round.boids().len())
    }

    pub fn captures(&self) -> usize {
        self.round().map_or(0, |round| round.captures().len())
    }

    pub fn rounds_remaining(&self) -> usize {
        self.experiment.rounds_remaining()
    }

    pub fn strategy(&self) -> String {
        self.round()
            .map_or("", |round| round.config().strategy.id())
            .to_string()
    }

    /// `[x, y, heading]` per live boid.
    pub fn boid_buffer(&self) -> Vec<f32> {
        self.round()
            .map(|round| agent_buffer(round.boids().iter()))
            .unwrap_or_default()
    }

    /// `[x, y, heading]` per predator.
    pub fn predator_buffer(&self) -> Vec<f32> {
        self.round()
            .map(|round| agent_buffer(round.predators().iter().map(|p| &p.body)))
            .unwrap_or_default()
    }

    /// Flattened `[x, y]` trail samples of one boid, oldest first.
    pub fn boid_trail(&self, index: usize) -> Vec<f32> {
        self.round()
            .and_then(|round| round.boids().get(index))
            .map(trail_buffer)
            .unwrap_or_default()
    }

    /// Flattened `[x, y]` trail samples of one predator, oldest first.
    pub fn predator_trail(&self, index: usize) -> Vec<f32> {
        self.round()
            .and_then(|round| round.predators().get(index))
            .map(|predator| trail_buffer(&predator.body))
            .unwrap_or_default()
    }

    pub fn records_json(&self) -> Result<String, JsError> {
        Ok(self.experiment.export_json()?)
    }

    /// Exports and clears the collected records.
    pub fn take_records_json(&mut self) -> Result<String, JsError> {
        let records = self.experiment.take_records()?;
        Ok(record::to_json(&records)?)
    }
}

impl Sim {
    pub fn experiment(&self) -> &ExperimentScheduler {
        &self.experiment
    }

    fn round(&self) -> Option<&SimulationRound> {
        self.experiment.active_round()
    }
}

fn agent_buffer<'a>(agents: impl Iterator<Item = &'a Agent>) -> Vec<f32> {
    agents
        .flat_map(|agent| [agent.position.x, agent.position.y, agent.heading()])
        .collect()
}

fn trail_buffer(agent: &Agent) -> Vec<f32> {
    agent.trail.iter().flat_map(|p| [p.x, p.y]).collect()
}
