//! Great-circle paths between two points on a sphere.
//!
//! A path is an ordered list of surface points. The first point is the projected
//! start, the last is the projected end, and everything in between is sampled in
//! equal angular steps around the arc.

use crate::config::PathConfig;
use crate::geometry::{
    angular_distance, project_to_surface, rotation_axis_between, slerp_on_sphere,
    surface_error,
};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Ordered surface points. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<DVec3>,
}

impl Path {
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<DVec3> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<DVec3> {
        self.points.last().copied()
    }

    /// Sum of chord lengths between consecutive points.
    pub fn length(&self) -> f64 {
        path_length(&self.points)
    }
}

impl From<Vec<DVec3>> for Path {
    fn from(points: Vec<DVec3>) -> Self {
        Self { points }
    }
}

/// Sum of straight-line distances between consecutive points.
pub fn path_length(points: &[DVec3]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    config: PathConfig,
}

impl PathFinder {
    pub fn new(config: PathConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Shortest surface route from `start` to `end` on the sphere at `center`.
    /// Neither endpoint has to be on the surface; both are projected first.
    pub fn find_path(&self, start: DVec3, end: DVec3, center: DVec3, radius: f64) -> Path {
        let start_surface = project_to_surface(start, center, radius);
        let end_surface = project_to_surface(end, center, radius);

        let dir_a = (start_surface - center) / radius;
        let dir_b = (end_surface - center) / radius;
        let angle = angular_distance(dir_a, dir_b);

        if angle < self.config.min_arc_angle {
            return Path::from(vec![start_surface, end_surface]);
        }

        let base = self.config.segment_count.max(1);
        let scaled = (base as f64 * angle / PI).ceil() as usize;
        let segments = base.max(scaled);

        let axis = rotation_axis_between(dir_a, dir_b);
        let tolerance = self.config.surface_tolerance;

        let mut points = Vec::with_capacity(segments + 1);
        points.push(start_surface);
        for i in 1..segments {
            let t = i as f64 / segments as f64;
            let dir = slerp_on_sphere(dir_a, dir_b, axis, t, angle);
            let mut point = center + dir * radius;

            let drift = surface_error(point, center, radius);
            if drift > tolerance {
                tracing::warn!(
                    "Path point {} drifted {:.4} off radius {}, re-projecting",
                    i,
                    drift,
                    radius
                );
                point = project_to_surface(point, center, radius);
            }
            points.push(point);
        }
        points.push(end_surface);

        Path::from(points)
    }
}
