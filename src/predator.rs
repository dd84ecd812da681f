use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::agent::{self, Agent};
use crate::config::{AmbushMode, SimulationConfig, StrategyKind};
use crate::math;

/// Fraction of the vector toward the target added to predator velocity.
pub const CHASE_FACTOR: f32 = 0.05;

/// Pursuit behavior of a predator, selected once per round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pursuit {
    /// Steer toward the nearest boid, re-evaluated every tick.
    Closest,
    /// Steer toward whichever boid occupies `slot`. The slot is fixed for
    /// the round and is not re-rolled when its boid is captured.
    RandomTarget { slot: usize },
    /// Steer toward the nearest boid only while it is inside the predator
    /// visual range.
    Ambush,
}

impl Pursuit {
    pub fn for_round<R: Rng>(config: &SimulationConfig, boid_count: usize, rng: &mut R) -> Self {
        match config.strategy {
            StrategyKind::Closest => Self::Closest,
            StrategyKind::RandomTarget => {
                let slot = if boid_count == 0 {
                    0
                } else {
                    rng.gen_range(0..boid_count)
                };
                debug!(slot, boid_count, "random target slot selected");
                Self::RandomTarget { slot }
            }
            StrategyKind::Ambush => Self::Ambush,
        }
    }

    pub fn kind(self) -> StrategyKind {
        match self {
            Self::Closest => StrategyKind::Closest,
            Self::RandomTarget { .. } => StrategyKind::RandomTarget,
            Self::Ambush => StrategyKind::Ambush,
        }
    }

    /// Velocity delta for `predator` this tick. Zero when there is nothing
    /// to chase.
    pub fn pursue(self, predator: &Agent, boids: &[Agent], config: &SimulationConfig) -> Vec2 {
        match self {
            Self::Closest => closest_boid(predator.position, boids)
                .map(|(index, _)| chase(predator.position, boids[index].position))
                .unwrap_or(Vec2::ZERO),
            // A vacated slot (index past the end after captures) is a no-op.
            Self::RandomTarget { slot } => boids
                .get(slot)
                .map(|target| chase(predator.position, target.position))
                .unwrap_or(Vec2::ZERO),
            Self::Ambush => match closest_boid(predator.position, boids) {
                Some((index, dist)) if dist < config.visual_range_predator => {
                    chase(predator.position, boids[index].position)
                }
                _ => match config.ambush_mode {
                    AmbushMode::Hold => Vec2::ZERO,
                    AmbushMode::Halt => -predator.velocity,
                },
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct Predator {
    pub body: Agent,
    pub pursuit: Pursuit,
}

impl Predator {
    pub fn new(body: Agent, pursuit: Pursuit) -> Self {
        Self { body, pursuit }
    }

    /// Places a predator at the canvas center with a random velocity.
    pub fn spawn<R: Rng>(rng: &mut R, config: &SimulationConfig, boid_count: usize) -> Self {
        let center = Vec2::new(config.canvas_width * 0.5, config.canvas_height * 0.5);
        let body = Agent::new(center, agent::random_velocity(rng));
        Self::new(body, Pursuit::for_round(config, boid_count, rng))
    }

    pub fn strategy(&self) -> StrategyKind {
        self.pursuit.kind()
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Applies the pursuit delta then the shared bounds, clamp and
    /// integration tail. Returns the distance covered this tick.
    pub fn advance(&mut self, boids: &[Agent], config: &SimulationConfig) -> f32 {
        let delta = self.pursuit.pursue(&self.body, boids, config);
        self.body.velocity += delta;
        self.body.finish_tick(config, config.predator_speed_limit());
        self.body.speed()
    }
}

/// Index and distance of the boid nearest to `position`. Ties go to the
/// earliest boid.
pub fn closest_boid(position: Vec2, boids: &[Agent]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, boid) in boids.iter().enumerate() {
        let dist = math::distance(position, boid.position);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((index, dist)),
        }
    }
    best
}

fn chase(from: Vec2, to: Vec2) -> Vec2 {
    (to - from) * CHASE_FACTOR
}
