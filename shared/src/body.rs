use crate::sphere::SphereId;
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Speed² below which a body counts as resting.
const REST_SPEED_SQ: f64 = 1e-4;

/// Seconds a body must rest before it is put to sleep.
const SLEEP_DELAY: f64 = 0.5;

/// Handle to a body in a `BodyRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyKind {
    /// Subject to gravity, containment and rotation propagation.
    Dynamic,
    /// Fixed geometry such as the planet's own surface.
    Static,
}

/// A player or prop resting on a sphere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub id: BodyId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub orientation: DQuat,
    pub mass: f64,
    pub kind: BodyKind,
    /// Sphere this body rests on. Lookup only, never ownership.
    pub owner: Option<SphereId>,
    /// Force accumulated for the next integration step.
    #[serde(skip)]
    pub force: DVec3,
    pub sleeping: bool,
    #[serde(skip)]
    rest_time: f64,
}

impl Body {
    pub fn new(id: BodyId, position: DVec3, kind: BodyKind) -> Self {
        Self {
            id,
            position,
            velocity: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            mass: 1.0,
            kind,
            owner: None,
            force: DVec3::ZERO,
            sleeping: false,
            rest_time: 0.0,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn wake(&mut self) {
        self.sleeping = false;
        self.rest_time = 0.0;
    }

    pub fn apply_force(&mut self, force: DVec3) {
        self.force += force;
    }

    /// Instantaneous change of momentum applied at the center of mass.
    pub fn apply_impulse(&mut self, impulse: DVec3) {
        if self.mass > 0.0 {
            self.velocity += impulse / self.mass;
        }
        self.wake();
    }

    /// Semi-implicit Euler step. Consumes the accumulated force.
    pub fn integrate(&mut self, dt: f64) {
        let force = std::mem::take(&mut self.force);
        if !self.is_dynamic() || self.sleeping || dt <= 0.0 {
            return;
        }

        if self.mass > 0.0 {
            self.velocity += force / self.mass * dt;
        }
        self.position += self.velocity * dt;

        if self.velocity.length_squared() < REST_SPEED_SQ {
            self.rest_time += dt;
            if self.rest_time >= SLEEP_DELAY {
                self.sleeping = true;
                self.velocity = DVec3::ZERO;
            }
        } else {
            self.rest_time = 0.0;
        }
    }
}

/// Owns every body; spheres and controllers refer to bodies by `BodyId`.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    bodies: HashMap<BodyId, Body>,
    next_id: u32,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new body and return its handle.
    /// Ids wrap around after `u32::MAX` but never reuse one that is still live.
    pub fn spawn(&mut self, position: DVec3, kind: BodyKind, owner: Option<SphereId>) -> BodyId {
        let mut candidate = self.next_id.max(1);
        while self.bodies.contains_key(&BodyId(candidate)) {
            candidate = candidate.wrapping_add(1).max(1);
        }
        let id = BodyId(candidate);
        self.next_id = candidate.wrapping_add(1);

        let mut body = Body::new(id, position, kind);
        body.owner = owner;
        self.bodies.insert(id, body);
        id
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        self.bodies.remove(&id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.values_mut()
    }

    /// Dynamic bodies resting on `sphere`.
    pub fn dynamic_on(&mut self, sphere: SphereId) -> impl Iterator<Item = &mut Body> {
        self.bodies
            .values_mut()
            .filter(move |b| b.is_dynamic() && b.owner == Some(sphere))
    }

    /// Integrate every body by `dt`.
    pub fn integrate_all(&mut self, dt: f64) {
        for body in self.bodies.values_mut() {
            body.integrate(dt);
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
