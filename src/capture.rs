use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flock::Flock;
use crate::math;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub elapsed_ms: u64,
}

/// Removes every boid strictly inside `radius` of any predator and appends
/// one event per removed boid. Run once per tick after all agents have
/// moved. Returns the number of boids captured.
pub fn resolve_captures(
    flock: &mut Flock,
    predators: &[Vec2],
    radius: f32,
    elapsed_ms: u64,
    log: &mut Vec<CaptureEvent>,
) -> usize {
    if flock.is_empty() || predators.is_empty() {
        return 0;
    }

    let captured: Vec<bool> = flock
        .boids()
        .iter()
        .map(|boid| {
            predators
                .iter()
                .any(|predator| math::distance(boid.position, *predator) < radius)
        })
        .collect();
    let count = captured.iter().filter(|hit| **hit).count();
    if count == 0 {
        return 0;
    }

    log.extend(std::iter::repeat(CaptureEvent { elapsed_ms }).take(count));
    flock.remove_flagged(&captured);
    debug!(count, elapsed_ms, remaining = flock.len(), "boids captured");
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;

    fn flock_at(points: &[(f32, f32)]) -> Flock {
        Flock::new(
            points
                .iter()
                .map(|(x, y)| Agent::new(Vec2::new(*x, *y), Vec2::ZERO))
                .collect(),
        )
    }

    #[test]
    fn captures_boid_inside_radius() {
        let mut flock = flock_at(&[(103.0, 100.0)]);
        let mut log = Vec::new();
        let count = resolve_captures(&mut flock, &[Vec2::new(100.0, 100.0)], 5.0, 42, &mut log);
        assert_eq!(count, 1);
        assert!(flock.is_empty());
        assert_eq!(log, vec![CaptureEvent { elapsed_ms: 42 }]);
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let mut flock = flock_at(&[(105.0, 100.0), (200.0, 200.0)]);
        let mut log = Vec::new();
        let count = resolve_captures(&mut flock, &[Vec2::new(100.0, 100.0)], 5.0, 0, &mut log);
        assert_eq!(count, 0);
        assert_eq!(flock.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn boid_near_two_predators_is_captured_once() {
        let mut flock = flock_at(&[(100.0, 100.0), (300.0, 300.0), (400.0, 401.0)]);
        let predators = [Vec2::new(101.0, 100.0), Vec2::new(99.0, 100.0), Vec2::new(400.0, 400.0)];
        let mut log = Vec::new();
        let count = resolve_captures(&mut flock, &predators, 5.0, 7, &mut log);
        assert_eq!(count, 2);
        assert_eq!(log.len(), 2);
        assert_eq!(flock.len(), 1);
        assert_eq!(flock.boids()[0].position, Vec2::new(300.0, 300.0));
    }
}
