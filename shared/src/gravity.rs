//! Surface gravity and containment.
//!
//! Keeps dynamic bodies at or just above their sphere's surface: inverse-square
//! pull outside, push-out when penetrating, and a reset for anything that has
//! escaped too far.

use crate::body::{BodyId, BodyRegistry};
use crate::config::GravityConfig;
use crate::geometry::surface_normal;
use crate::sphere::Sphere;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Recovered anomaly, reported for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContainmentEvent {
    /// Body was beyond the allowed distance and was put back on the surface.
    Overrun { body: BodyId, distance: f64 },
    /// Body speed exceeded the limit and was rescaled.
    VelocityClamped { body: BodyId, speed: f64 },
}

/// Accumulate gravity and containment forces for every awake dynamic body
/// resting on `sphere`. Call before integration.
pub fn apply_gravity_and_containment(
    sphere: &Sphere,
    bodies: &mut BodyRegistry,
    config: &GravityConfig,
    dt: f64,
) -> Vec<ContainmentEvent> {
    let mut events = Vec::new();
    let radius = sphere.radius();
    let g = sphere.surface_gravity;
    let max_distance = radius * config.max_distance_factor;

    for body in bodies.dynamic_on(sphere.id) {
        if body.sleeping {
            continue;
        }

        let offset = body.position - sphere.center;
        let distance = offset.length();
        let normal = surface_normal(body.position, sphere.center);

        if !distance.is_finite() || distance > max_distance {
            let recovered = sphere.center + normal * (radius + config.respawn_height);
            tracing::warn!(
                "Body {:?} overran sphere {:?} at distance {:.2}, repositioning",
                body.id,
                sphere.id,
                distance
            );
            events.push(ContainmentEvent::Overrun {
                body: body.id,
                distance,
            });
            body.position = recovered;
            body.velocity = DVec3::ZERO;
            body.force = DVec3::ZERO;
            body.wake();
            continue;
        }

        if distance < radius {
            let depth = radius - distance;
            let push = g * body.mass * (1.0 + config.penetration_force_scale * depth);
            body.apply_force(normal * push);
            if depth > config.impulse_depth_threshold {
                body.apply_impulse(normal * (depth * body.mass * config.impulse_scale));
            }
        } else {
            let falloff = radius / distance;
            let pull = g * falloff * falloff * body.mass;
            body.apply_force(-normal * pull);

            if distance < radius * config.settle_band {
                let inward_speed = -body.velocity.dot(normal);
                if inward_speed > 0.0 {
                    // never more than what would stop the inward motion this step
                    let mut damping = inward_speed * config.inward_damping * body.mass;
                    if dt > 0.0 {
                        damping = damping.min(inward_speed * body.mass / dt);
                    }
                    body.apply_force(normal * damping);
                }
            }
        }

        let speed = body.velocity.length();
        if speed > config.max_velocity {
            body.velocity *= config.max_velocity / speed;
            events.push(ContainmentEvent::VelocityClamped {
                body: body.id,
                speed,
            });
        }
    }

    events
}
