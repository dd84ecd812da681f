use glam::Vec2;

pub const EPSILON: f32 = 1.0e-6;

pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

pub fn speed(velocity: Vec2) -> f32 {
    velocity.length()
}

/// Heading angle in radians, as used by renderers to orient agents.
pub fn heading(velocity: Vec2) -> f32 {
    velocity.y.atan2(velocity.x)
}

pub fn normalize_to_magnitude(v: Vec2, magnitude: f32) -> Vec2 {
    let mag_sq = v.length_squared();
    if mag_sq <= EPSILON {
        return Vec2::ZERO;
    }

    v * (magnitude / mag_sq.sqrt())
}

/// Rescales `v` to exactly `max_magnitude` when it is longer, preserving
/// direction. Shorter vectors pass through untouched.
pub fn limit_magnitude(v: Vec2, max_magnitude: f32) -> Vec2 {
    let speed = v.length();
    if speed > max_magnitude {
        v / speed * max_magnitude
    } else {
        v
    }
}

/// Cosine of the angle between `a` and `b`, or `None` if either is
/// degenerate.
pub fn cosine_similarity(a: Vec2, b: Vec2) -> Option<f32> {
    let denom = a.length() * b.length();
    if denom <= EPSILON {
        return None;
    }

    Some((a.dot(b) / denom).clamp(-1.0, 1.0))
}
