use glam::Vec2;
use rand::Rng;

use crate::agent::Agent;
use crate::config::{AlignmentMode, SimulationConfig};
use crate::math::{self, EPSILON};

/// Fraction of the summed away-vector applied for separation and predator
/// avoidance.
pub const AVOID_FACTOR: f32 = 0.05;

struct Neighborhood {
    count: usize,
    position_sum: Vec2,
    velocity_sum: Vec2,
    crowding: Vec2,
}

impl Neighborhood {
    fn average_position(&self) -> Option<Vec2> {
        (self.count > 0).then(|| self.position_sum / self.count as f32)
    }

    fn average_velocity(&self) -> Option<Vec2> {
        (self.count > 0).then(|| self.velocity_sum / self.count as f32)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Flock {
    boids: Vec<Agent>,
    steered: Vec<Vec2>,
}

impl Flock {
    pub fn new(boids: Vec<Agent>) -> Self {
        Self {
            steered: Vec::with_capacity(boids.len()),
            boids,
        }
    }

    pub fn spawn<R: Rng>(rng: &mut R, config: &SimulationConfig) -> Self {
        let boids = (0..config.boid_count)
            .map(|_| Agent::spawn_random(rng, config.canvas_width, config.canvas_height))
            .collect();
        Self::new(boids)
    }

    pub fn boids(&self) -> &[Agent] {
        &self.boids
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    /// Advances every boid by one tick. All velocities are computed from the
    /// pre-tick snapshot before any position moves, so no boid sees a
    /// neighbor that has already advanced this tick.
    pub fn step(&mut self, predators: &[Vec2], config: &SimulationConfig) {
        self.steered.clear();
        for i in 0..self.boids.len() {
            let velocity = self.steer(i, predators, config);
            self.steered.push(velocity);
        }

        for (boid, velocity) in self.boids.iter_mut().zip(self.steered.iter()) {
            boid.velocity = *velocity;
            boid.finish_tick(config, config.speed_limit);
        }
    }

    /// Mean alignment score in `0..=1` over boids that have at least one
    /// neighbor with a non-degenerate velocity.
    pub fn polarization(&self, config: &SimulationConfig) -> Option<f32> {
        let mut total = 0.0;
        let mut scored = 0usize;
        for (i, boid) in self.boids.iter().enumerate() {
            let Some(average) = self.neighborhood(i, config).average_velocity() else {
                continue;
            };
            if let Some(cos) = math::cosine_similarity(boid.velocity, average) {
                total += (cos + 1.0) * 0.5;
                scored += 1;
            }
        }
        (scored > 0).then(|| total / scored as f32)
    }

    /// Drops every boid whose flag is set, preserving the order of the rest.
    pub(crate) fn remove_flagged(&mut self, flagged: &[bool]) {
        debug_assert_eq!(flagged.len(), self.boids.len());
        let mut index = 0;
        self.boids.retain(|_| {
            let keep = !flagged[index];
            index += 1;
            keep
        });
    }

    fn neighborhood(&self, i: usize, config: &SimulationConfig) -> Neighborhood {
        let position = self.boids[i].position;
        let mut hood = Neighborhood {
            count: 0,
            position_sum: Vec2::ZERO,
            velocity_sum: Vec2::ZERO,
            crowding: Vec2::ZERO,
        };

        for (j, other) in self.boids.iter().enumerate() {
            if j == i {
                continue;
            }
            let dist = math::distance(position, other.position);
            if dist < config.visual_range_boid {
                hood.count += 1;
                hood.position_sum += other.position;
                hood.velocity_sum += other.velocity;
            }
            if dist < config.min_separation {
                hood.crowding += position - other.position;
            }
        }

        hood
    }

    /// Cohesion, separation, predator avoidance and alignment, in that order.
    /// Bounds and the speed clamp are applied when the result is committed.
    fn steer(&self, i: usize, predators: &[Vec2], config: &SimulationConfig) -> Vec2 {
        let boid = &self.boids[i];
        let hood = self.neighborhood(i, config);
        let mut velocity = boid.velocity;

        if let Some(center) = hood.average_position() {
            velocity += (center - boid.position) * config.centering_factor;
        }

        velocity += hood.crowding * AVOID_FACTOR;

        let mut flee = Vec2::ZERO;
        for predator in predators {
            if math::distance(boid.position, *predator) < config.visual_range_boid {
                flee += boid.position - *predator;
            }
        }
        velocity += flee * AVOID_FACTOR;

        if let Some(average) = hood.average_velocity() {
            velocity = match config.alignment {
                AlignmentMode::Simple => {
                    velocity + (average - velocity) * config.matching_factor
                }
                AlignmentMode::Polarization { target } => {
                    align_towards(velocity, average, target)
                }
            };
        }

        velocity
    }
}

/// Blend factor the polarization controller applies this tick: zero once
/// the alignment score `(cos + 1) / 2` reaches `target`, otherwise growing
/// with the shortfall and capped at one.
pub fn alignment_correction(velocity: Vec2, neighborhood_velocity: Vec2, target: f32) -> f32 {
    let Some(cos) = math::cosine_similarity(velocity, neighborhood_velocity) else {
        return 0.0;
    };
    let score = (cos + 1.0) * 0.5;
    if score >= target {
        return 0.0;
    }

    ((target - score) / (1.0 - target).max(EPSILON)).min(1.0)
}

/// Rotates `velocity` toward the direction of `neighborhood_velocity`
/// while keeping its speed.
pub fn align_towards(velocity: Vec2, neighborhood_velocity: Vec2, target: f32) -> Vec2 {
    let factor = alignment_correction(velocity, neighborhood_velocity, target);
    if factor <= 0.0 {
        return velocity;
    }

    let blended = velocity
        .normalize_or_zero()
        .lerp(neighborhood_velocity.normalize_or_zero(), factor);
    if blended.length_squared() <= EPSILON {
        return velocity;
    }

    math::normalize_to_magnitude(blended, velocity.length())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::TRAIL_CAPACITY;

    fn open_config() -> SimulationConfig {
        SimulationConfig {
            canvas_width: 10_000.0,
            canvas_height: 10_000.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn empty_flock_step_is_noop() {
        let mut flock = Flock::default();
        flock.step(&[Vec2::new(1.0, 1.0)], &open_config());
        assert!(flock.is_empty());
        assert_eq!(flock.polarization(&open_config()), None);
    }

    #[test]
    fn lone_boid_only_moves_by_its_velocity() {
        let mut flock = Flock::new(vec![Agent::new(
            Vec2::new(5_000.0, 5_000.0),
            Vec2::new(2.0, -1.0),
        )]);
        flock.step(&[], &open_config());
        let boid = &flock.boids()[0];
        assert_eq!(boid.velocity, Vec2::new(2.0, -1.0));
        assert_eq!(boid.position, Vec2::new(5_002.0, 4_999.0));
    }

    #[test]
    fn velocities_are_computed_from_pre_tick_snapshot() {
        let config = SimulationConfig {
            centering_factor: 0.0,
            min_separation: 0.0,
            matching_factor: 1.0,
            ..open_config()
        };
        let mut flock = Flock::new(vec![
            Agent::new(Vec2::new(5_000.0, 5_000.0), Vec2::new(1.0, 0.0)),
            Agent::new(Vec2::new(5_010.0, 5_000.0), Vec2::new(0.0, 1.0)),
        ]);
        flock.step(&[], &config);
        // Full matching swaps the velocities only if each boid read the
        // other's old value.
        assert_eq!(flock.boids()[0].velocity, Vec2::new(0.0, 1.0));
        assert_eq!(flock.boids()[1].velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn separation_pushes_close_boids_apart() {
        let config = SimulationConfig {
            centering_factor: 0.0,
            matching_factor: 0.0,
            ..open_config()
        };
        let mut flock = Flock::new(vec![
            Agent::new(Vec2::new(5_000.0, 5_000.0), Vec2::ZERO),
            Agent::new(Vec2::new(5_010.0, 5_000.0), Vec2::ZERO),
        ]);
        flock.step(&[], &config);
        assert!((flock.boids()[0].velocity.x + 0.5).abs() < 1.0e-5);
        assert!((flock.boids()[1].velocity.x - 0.5).abs() < 1.0e-5);
    }

    #[test]
    fn boids_flee_visible_predators() {
        let config = SimulationConfig {
            centering_factor: 0.0,
            matching_factor: 0.0,
            ..open_config()
        };
        let mut flock = Flock::new(vec![Agent::new(Vec2::new(5_000.0, 5_000.0), Vec2::ZERO)]);
        flock.step(
            &[Vec2::new(5_000.0, 5_040.0), Vec2::new(0.0, 0.0)],
            &config,
        );
        assert!((flock.boids()[0].velocity - Vec2::new(0.0, -2.0)).length() < 1.0e-5);
    }

    #[test]
    fn speed_and_trail_stay_bounded() {
        let config = SimulationConfig {
            canvas_width: 400.0,
            canvas_height: 300.0,
            ..SimulationConfig::default()
        };
        let boids = (0..20)
            .map(|i| {
                Agent::new(
                    Vec2::new(10.0 + i as f32 * 17.0, 5.0 + i as f32 * 13.0),
                    Vec2::new(40.0 - i as f32 * 4.0, 25.0),
                )
            })
            .collect();
        let mut flock = Flock::new(boids);
        for _ in 0..120 {
            flock.step(&[Vec2::new(200.0, 150.0)], &config);
            for boid in flock.boids() {
                assert!(boid.speed() <= config.speed_limit + 1.0e-3);
                assert!(boid.trail.len() <= TRAIL_CAPACITY);
            }
        }
    }

    #[test]
    fn correction_is_zero_at_or_above_target() {
        assert_eq!(alignment_correction(Vec2::X, Vec2::X * 3.0, 0.96), 0.0);
        assert_eq!(alignment_correction(Vec2::X, Vec2::ZERO, 0.96), 0.0);
        assert_eq!(alignment_correction(Vec2::ZERO, Vec2::X, 0.96), 0.0);
        let partial = alignment_correction(Vec2::X, Vec2::new(1.0, 0.25), 0.99);
        assert!(partial > 0.0 && partial < 1.0);
        assert_eq!(alignment_correction(Vec2::X, Vec2::Y, 0.96), 1.0);
    }

    #[test]
    fn polarization_alignment_preserves_speed() {
        let v = Vec2::new(3.0, 4.0);
        let aligned = align_towards(v, Vec2::new(-1.0, 0.2), 0.96);
        assert!((aligned.length() - 5.0).abs() < 1.0e-4);
        assert_ne!(aligned, v);
        // Exactly opposed directions blend to nothing and are left alone.
        assert_eq!(align_towards(Vec2::X, -Vec2::X * 2.0, 1.0 / 3.0), Vec2::X);
    }

    fn mean_pairwise_cosine(boids: &[Agent]) -> f32 {
        let mut sum = 0.0;
        let mut pairs = 0;
        for (i, a) in boids.iter().enumerate() {
            for b in &boids[i + 1..] {
                sum += math::cosine_similarity(a.velocity, b.velocity).unwrap();
                pairs += 1;
            }
        }
        sum / pairs as f32
    }

    #[test]
    fn polarization_controller_converges_on_target() {
        let target = 0.96;
        let config = SimulationConfig {
            centering_factor: 0.0,
            min_separation: 0.0,
            visual_range_boid: 10_000.0,
            alignment: AlignmentMode::Polarization { target },
            ..open_config()
        };
        let boids = (0..12)
            .map(|i| {
                let angle = i as f32 * 0.25;
                Agent::new(
                    Vec2::new(5_000.0 + i as f32 * 3.0, 5_000.0 - i as f32 * 2.0),
                    Vec2::from_angle(angle) * 3.0,
                )
            })
            .collect();
        let mut flock = Flock::new(boids);
        let before = flock.polarization(&config).unwrap();
        assert!(before < target);

        for _ in 0..60 {
            flock.step(&[], &config);
        }

        let after = flock.polarization(&config).unwrap();
        assert!(after >= target, "polarization {after}");
        let cosine = mean_pairwise_cosine(flock.boids());
        assert!(cosine >= target, "mean pairwise cosine {cosine}");
        for boid in flock.boids() {
            assert!((boid.speed() - 3.0).abs() < 1.0e-3);
        }
    }
}
