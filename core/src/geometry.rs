//! Planar geometry helpers shared by both simulation loops.
//!
//! Only IEEE-exact operations (add, multiply, divide, square root) are used
//! here. Angles go through [`sin_cos`], a polynomial evaluation, because the
//! platform `sin`/`cos` are not guaranteed to agree bit-for-bit across hosts.

pub use glam::Vec2;

const TAU: f32 = std::f32::consts::TAU;
const PI: f32 = std::f32::consts::PI;
const HALF_PI: f32 = std::f32::consts::FRAC_PI_2;

/// Returns the earliest parameter `t` in `[0, 1]` at which the segment
/// `start -> end` enters the circle, if it does at all.
///
/// A segment that starts inside the circle reports `t = 0`. Degenerate
/// segments fall back to a point-in-circle test.
#[must_use]
pub fn segment_circle_entry(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let radius_sq = radius * radius;
    let from_center = start - center;
    if from_center.length_squared() <= radius_sq {
        return Some(0.0);
    }

    let direction = end - start;
    let a = direction.length_squared();
    if a <= f32::EPSILON {
        return None;
    }

    let b = 2.0 * from_center.dot(direction);
    let c = from_center.length_squared() - radius_sq;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if (0.0..=1.0).contains(&t) {
        Some(t)
    } else {
        None
    }
}

/// Shortest distance between `point` and the segment `start -> end`.
#[must_use]
pub fn point_segment_distance(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Wraps an angle into `[-PI, PI)`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle % TAU;
    if wrapped >= PI {
        wrapped -= TAU;
    } else if wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Host-independent sine and cosine of `angle`.
#[must_use]
pub fn sin_cos(angle: f32) -> (f32, f32) {
    let wrapped = wrap_angle(angle);
    (sine_reduced(wrapped), sine_reduced(wrap_angle(wrapped + HALF_PI)))
}

/// Unit vector pointing along `angle` radians.
#[must_use]
pub fn unit_from_angle(angle: f32) -> Vec2 {
    let (sin, cos) = sin_cos(angle);
    Vec2::new(cos, sin)
}

/// Rotates `current` toward `desired` by at most `max_turn` radians.
///
/// Both inputs are treated as directions; the returned vector keeps the length
/// of `current`.
#[must_use]
pub fn steer_toward(current: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    let speed = current.length();
    if speed <= f32::EPSILON || desired.length_squared() <= f32::EPSILON {
        return current;
    }

    let heading = current / speed;
    let wanted = desired.normalize_or_zero();
    let cross = heading.perp_dot(wanted);
    let dot = heading.dot(wanted).clamp(-1.0, 1.0);

    // Small-step rotation: the angle between headings is bounded by max_turn,
    // so rotate by the clamped amount using the host-independent sin/cos.
    let angle_between = angle_from_cos(dot);
    let turn = angle_between.min(max_turn.max(0.0));
    let signed = if cross < 0.0 { -turn } else { turn };
    let (sin, cos) = sin_cos(signed);
    Vec2::new(
        heading.x * cos - heading.y * sin,
        heading.x * sin + heading.y * cos,
    ) * speed
}

/// Rotates `vector` by `angle` radians.
#[must_use]
pub fn rotate(vector: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = sin_cos(angle);
    Vec2::new(vector.x * cos - vector.y * sin, vector.x * sin + vector.y * cos)
}

/// Clamps `point` into the axis-aligned rectangle `[0, size]`.
#[must_use]
pub fn clamp_to_bounds(point: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(point.x.clamp(0.0, size.x), point.y.clamp(0.0, size.y))
}

fn sine_reduced(angle: f32) -> f32 {
    // Fold into [-PI/2, PI/2] where the Taylor series converges quickly.
    let folded = if angle > HALF_PI {
        PI - angle
    } else if angle < -HALF_PI {
        -PI - angle
    } else {
        angle
    };
    let x = folded;
    let x2 = x * x;
    x * (1.0
        - x2 / 6.0
            * (1.0 - x2 / 20.0 * (1.0 - x2 / 42.0 * (1.0 - x2 / 72.0 * (1.0 - x2 / 110.0)))))
}

fn angle_from_cos(cos: f32) -> f32 {
    // acos via bisection keeps the result independent of the host libm.
    let mut low = 0.0_f32;
    let mut high = PI;
    for _ in 0..24 {
        let mid = (low + high) * 0.5;
        let (_, mid_cos) = sin_cos(mid);
        if mid_cos > cos {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn sin_cos_matches_known_angles() {
        let (sin, cos) = sin_cos(0.0);
        assert!(close(sin, 0.0) && close(cos, 1.0));
        let (sin, cos) = sin_cos(HALF_PI);
        assert!(close(sin, 1.0) && close(cos, 0.0));
        let (sin, cos) = sin_cos(PI);
        assert!(close(sin, 0.0) && close(cos, -1.0));
        let (sin, cos) = sin_cos(-HALF_PI + TAU * 3.0);
        assert!(close(sin, -1.0) && close(cos, 0.0));
    }

    #[test]
    fn segment_entering_circle_reports_entry_parameter() {
        let hit = segment_circle_entry(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 0.0),
            1.0,
        )
        .expect("segment crosses circle");
        assert!(close(hit, 0.4));
    }

    #[test]
    fn fast_segment_does_not_tunnel_through_small_circle() {
        let hit = segment_circle_entry(
            Vec2::new(0.0, 0.0),
            Vec2::new(1_000.0, 0.0),
            Vec2::new(500.0, 0.5),
            1.0,
        );
        assert!(hit.is_some());
    }

    #[test]
    fn segment_missing_circle_reports_none() {
        assert!(segment_circle_entry(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 3.0),
            1.0,
        )
        .is_none());
        assert!(segment_circle_entry(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(5.0, 0.0),
            1.0,
        )
        .is_none());
    }

    #[test]
    fn point_segment_distance_clamps_to_endpoints() {
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(10.0, 0.0);
        assert!(close(point_segment_distance(Vec2::new(5.0, 4.0), start, end), 4.0));
        assert!(close(point_segment_distance(Vec2::new(13.0, 4.0), start, end), 5.0));
    }

    #[test]
    fn steering_is_bounded_by_turn_rate() {
        let current = Vec2::new(10.0, 0.0);
        let steered = steer_toward(current, Vec2::new(0.0, 1.0), 0.1);
        assert!(close(steered.length(), 10.0));
        let turned = angle_from_cos(steered.normalize().dot(Vec2::X));
        assert!(close(turned, 0.1));
        assert!(steered.y > 0.0);
    }

    #[test]
    fn steering_reaches_target_when_within_turn_rate() {
        let steered = steer_toward(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.05), 1.0);
        let expected = Vec2::new(1.0, 0.05).normalize();
        assert!(close(steered.x, expected.x) && close(steered.y, expected.y));
    }
}
