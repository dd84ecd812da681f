use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;

use crate::config::SimulationConfig;
use crate::math;

pub const TRAIL_CAPACITY: usize = 50;
pub const BOUNDS_MARGIN: f32 = 50.0;
pub const TURN_FACTOR: f32 = 5.0;
const INITIAL_SPEED_SPREAD: f32 = 5.0;

/// Recent positions of an agent, oldest first.
#[derive(Clone, Debug, Default)]
pub struct Trail {
    samples: VecDeque<Vec2>,
}

impl Trail {
    pub fn push(&mut self, sample: Vec2) {
        if self.samples.len() == TRAIL_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec2> {
        self.samples.iter()
    }
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub position: Vec2,
    pub velocity: Vec2,
    pub trail: Trail,
}

impl Agent {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            trail: Trail::default(),
        }
    }

    pub fn spawn_random<R: Rng>(rng: &mut R, width: f32, height: f32) -> Self {
        Self::new(
            Vec2::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)),
            random_velocity(rng),
        )
    }

    pub fn heading(&self) -> f32 {
        math::heading(self.velocity)
    }

    pub fn speed(&self) -> f32 {
        math::speed(self.velocity)
    }

    /// Bounds nudge, speed clamp, then integration and trail update. Shared
    /// by boids and predators as the tail of every per-tick update.
    pub fn finish_tick(&mut self, config: &SimulationConfig, speed_limit: f32) {
        self.velocity = bounds_nudge(
            self.position,
            self.velocity,
            config.canvas_width,
            config.canvas_height,
        );
        self.velocity = math::limit_magnitude(self.velocity, speed_limit);
        self.integrate();
    }

    fn integrate(&mut self) {
        self.position += self.velocity;
        self.trail.push(self.position);
    }
}

/// Inward velocity impulse for agents inside the edge margin. Agents may
/// still cross the margin for a tick; this is a nudge, not a clamp.
pub fn bounds_nudge(position: Vec2, velocity: Vec2, width: f32, height: f32) -> Vec2 {
    let mut velocity = velocity;
    if position.x < BOUNDS_MARGIN {
        velocity.x += TURN_FACTOR;
    }
    if position.x > width - BOUNDS_MARGIN {
        velocity.x -= TURN_FACTOR;
    }
    if position.y < BOUNDS_MARGIN {
        velocity.y += TURN_FACTOR;
    }
    if position.y > height - BOUNDS_MARGIN {
        velocity.y -= TURN_FACTOR;
    }
    velocity
}

pub(crate) fn random_velocity<R: Rng>(rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen_range(-INITIAL_SPEED_SPREAD..INITIAL_SPEED_SPREAD),
        rng.gen_range(-INITIAL_SPEED_SPREAD..INITIAL_SPEED_SPREAD),
    )
}
