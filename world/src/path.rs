//! Lane geometry: the polyline hostiles follow and the slots placed beside it.

use kernel_defence_core::{geometry::Vec2, ConfigError};
use serde::{Deserialize, Serialize};

/// Waypoints of the built-in serpentine lane.
const DEFAULT_WAYPOINTS: [(f32, f32); 8] = [
    (400.0, -20.0),
    (400.0, 200.0),
    (100.0, 200.0),
    (100.0, 500.0),
    (700.0, 500.0),
    (700.0, 800.0),
    (400.0, 800.0),
    (400.0, 1_220.0),
];

/// Waypoints of the built-in lane as vectors.
pub(crate) fn default_waypoints() -> Vec<Vec2> {
    DEFAULT_WAYPOINTS
        .iter()
        .map(|&(x, y)| Vec2::new(x, y))
        .collect()
}

/// Perpendicular distance between the lane centreline and a slot.
const SLOT_OFFSET: f32 = 50.0;

/// Extra room around the lane bounds before projectiles are culled.
const BOUNDS_MARGIN: f32 = 200.0;

/// Polyline from the spawn point to the objective, with cumulative lengths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LanePath {
    points: Vec<Vec2>,
    cumulative: Vec<f32>,
}

impl LanePath {
    /// Builds the lane, dropping repeated waypoints.
    pub(crate) fn new(waypoints: &[Vec2]) -> Result<Self, ConfigError> {
        let mut points: Vec<Vec2> = Vec::with_capacity(waypoints.len());
        for &point in waypoints {
            if !point.is_finite() {
                return Err(ConfigError::DegenerateLane);
            }
            if points
                .last()
                .map_or(true, |last| last.distance_squared(point) > f32::EPSILON)
            {
                points.push(point);
            }
        }

        if points.len() < 2 {
            return Err(ConfigError::DegenerateLane);
        }

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0_f32;
        cumulative.push(total);
        for pair in points.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }

        Ok(Self { points, cumulative })
    }

    /// Total lane length.
    pub(crate) fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position at `progress` units along the lane, clamped to its ends.
    pub(crate) fn point_at(&self, progress: f32) -> Vec2 {
        let (index, local) = self.locate(progress);
        let start = self.points[index];
        let end = self.points[index + 1];
        let span = self.cumulative[index + 1] - self.cumulative[index];
        if span <= f32::EPSILON {
            return start;
        }
        start + (end - start) * (local / span)
    }

    /// Unit direction of travel at `progress`.
    pub(crate) fn direction_at(&self, progress: f32) -> Vec2 {
        let (index, _) = self.locate(progress);
        (self.points[index + 1] - self.points[index]).normalize_or_zero()
    }

    /// Axis-aligned bounds of the lane, widened by a culling margin.
    pub(crate) fn culling_bounds(&self) -> (Vec2, Vec2) {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for point in &self.points {
            min = min.min(*point);
            max = max.max(*point);
        }
        (min - Vec2::splat(BOUNDS_MARGIN), max + Vec2::splat(BOUNDS_MARGIN))
    }

    /// Positions of `count` slots spread evenly along the lane, alternating sides.
    pub(crate) fn slot_positions(&self, count: u32) -> Vec<Vec2> {
        let length = self.length();
        (0..count)
            .map(|index| {
                let progress = (index as f32 + 0.5) * length / count as f32;
                let direction = self.direction_at(progress);
                let side = if index % 2 == 0 { 1.0 } else { -1.0 };
                self.point_at(progress) + direction.perp() * SLOT_OFFSET * side
            })
            .collect()
    }

    fn locate(&self, progress: f32) -> (usize, f32) {
        let clamped = progress.clamp(0.0, self.length());
        let segments = self.points.len() - 1;
        let index = self
            .cumulative
            .partition_point(|&start| start <= clamped)
            .saturating_sub(1)
            .min(segments - 1);
        (index, clamped - self.cumulative[index])
    }
}
