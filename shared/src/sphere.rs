use crate::geometry;
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Golden angle in radians: PI * (3 - sqrt(5)) ≈ 2.39996...
/// Pre-computed since sqrt is not const fn.
const GOLDEN_ANGLE: f64 = 2.399963229728653;

/// Handle to a sphere owned by the world layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SphereId(pub u32);

/// A rotating planet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sphere {
    pub id: SphereId,
    pub center: DVec3,
    radius: f64,
    /// Cumulative rotation, kept unit length.
    pub orientation: DQuat,
    /// Gravity magnitude at the surface (units/s²).
    pub surface_gravity: f64,
    /// Coupled visual layer (e.g. a water shell) that copies `orientation`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_orientation: Option<DQuat>,
}

impl Sphere {
    pub fn new(id: SphereId, center: DVec3, radius: f64, surface_gravity: f64) -> Result<Self, String> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(format!("sphere radius must be finite and > 0 (got {})", radius));
        }
        if !center.is_finite() {
            return Err("sphere center must be finite".to_string());
        }
        if !surface_gravity.is_finite() || surface_gravity < 0.0 {
            return Err("surface_gravity must be finite and >= 0".to_string());
        }
        Ok(Self {
            id,
            center,
            radius,
            orientation: DQuat::IDENTITY,
            surface_gravity,
            shell_orientation: None,
        })
    }

    /// Attach a coupled shell layer that follows every rotation.
    pub fn with_shell(mut self) -> Self {
        self.shell_orientation = Some(self.orientation);
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Closest surface point to `p`.
    pub fn project(&self, p: DVec3) -> DVec3 {
        geometry::project_to_surface(p, self.center, self.radius)
    }

    /// Outward unit normal through `p`.
    pub fn normal_at(&self, p: DVec3) -> DVec3 {
        geometry::surface_normal(p, self.center)
    }

    pub fn surface_error(&self, p: DVec3) -> f64 {
        geometry::surface_error(p, self.center, self.radius)
    }
}

/// Generate M evenly-distributed points on a unit sphere using Fibonacci spiral.
pub fn fibonacci_sphere(m: usize) -> Vec<DVec3> {
    let mut points = Vec::with_capacity(m);

    for i in 0..m {
        let y = 1.0 - (2.0 * (i as f64 + 0.5)) / m as f64;
        let r = (1.0 - y * y).sqrt();
        let phi = i as f64 * GOLDEN_ANGLE;

        points.push(geometry::normalize_or_up(DVec3::new(phi.cos() * r, y, phi.sin() * r)));
    }

    points
}
