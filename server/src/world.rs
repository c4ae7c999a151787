//! The simulation world: spheres, bodies and the controllers that move them.
//!
//! `tick` runs the frame in a fixed order: gravity and containment, integration,
//! path following, then sphere rotation.

use glam::DVec3;
use planet_shared::body::{Body, BodyId, BodyKind, BodyRegistry};
use planet_shared::config::NavigationConfig;
use planet_shared::geometry::{align_up_to, normalize_or_up, unit_from_samples};
use planet_shared::gravity::{apply_gravity_and_containment, ContainmentEvent};
use planet_shared::movement::{MovementController, MovementHooks, MovementStatus};
use planet_shared::path::{Path, PathFinder};
use planet_shared::protocol::{BodyWire, SphereWire, WorldSnapshot, PROTOCOL_VERSION};
use planet_shared::rotation::{any_attached_rotation_in_progress, RotationController};
use planet_shared::sphere::{Sphere, SphereId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Arrived { body: BodyId, position: DVec3 },
    Containment { sphere: SphereId, event: ContainmentEvent },
}

pub struct World {
    spheres: BTreeMap<SphereId, Sphere>,
    rotations: BTreeMap<SphereId, RotationController>,
    bodies: BodyRegistry,
    /// One controller per body currently following a path.
    movements: BTreeMap<BodyId, MovementController>,
    path_finder: PathFinder,
    config: NavigationConfig,
    rng: ChaCha8Rng,
    next_sphere_id: u32,
    tick: u64,
}

impl World {
    pub fn new(config: NavigationConfig, seed: u64) -> Self {
        Self {
            spheres: BTreeMap::new(),
            rotations: BTreeMap::new(),
            bodies: BodyRegistry::new(),
            movements: BTreeMap::new(),
            path_finder: PathFinder::new(config.path),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_sphere_id: 1,
            tick: 0,
        }
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    // === Spheres ===

    /// Add a sphere along with its rotation state.
    pub fn add_sphere(
        &mut self,
        center: DVec3,
        radius: f64,
        surface_gravity: f64,
    ) -> Result<SphereId, String> {
        let id = SphereId(self.next_sphere_id);
        let sphere = Sphere::new(id, center, radius, surface_gravity)?.with_shell();
        self.next_sphere_id += 1;

        self.spheres.insert(id, sphere);
        self.rotations
            .insert(id, RotationController::new(id, self.config.rotation));
        tracing::info!("Sphere {:?} added: radius {}, gravity {}", id, radius, surface_gravity);
        Ok(id)
    }

    pub fn sphere(&self, id: SphereId) -> Option<&Sphere> {
        self.spheres.get(&id)
    }

    pub fn spheres(&self) -> impl Iterator<Item = &Sphere> {
        self.spheres.values()
    }

    pub fn rotation(&self, id: SphereId) -> Option<&RotationController> {
        self.rotations.get(&id)
    }

    /// Uniformly random point on the surface of `sphere`.
    pub fn random_surface_point(&mut self, sphere: SphereId) -> Option<DVec3> {
        let sphere = self.spheres.get(&sphere)?;
        let dir = unit_from_samples(self.rng.gen::<f64>(), self.rng.gen::<f64>());
        Some(sphere.center + dir * sphere.radius())
    }

    // === Bodies ===

    /// Place a body on the surface of `sphere` along `direction` from its center,
    /// upright. Dynamic bodies are carried by the sphere's rotation.
    pub fn spawn_body(
        &mut self,
        sphere: SphereId,
        direction: DVec3,
        kind: BodyKind,
        mass: f64,
    ) -> Option<BodyId> {
        if !mass.is_finite() || mass <= 0.0 {
            tracing::warn!("Rejected body spawn: mass {} must be > 0", mass);
            return None;
        }
        let Some(planet) = self.spheres.get(&sphere) else {
            tracing::warn!("Rejected body spawn: sphere {:?} does not exist", sphere);
            return None;
        };

        let normal = normalize_or_up(direction);
        let position = planet.center + normal * planet.radius();
        let id = self.bodies.spawn(position, kind, Some(sphere));
        if let Some(body) = self.bodies.get_mut(id) {
            body.mass = mass;
            body.orientation = align_up_to(normal);
        }

        if kind == BodyKind::Dynamic {
            if let Some(rotation) = self.rotations.get_mut(&sphere) {
                rotation.attach(id);
            }
        }
        tracing::info!("Body {:?} spawned on sphere {:?} ({:?})", id, sphere, kind);
        Some(id)
    }

    /// Remove a body, cancelling its movement and detaching it from rotation.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let body = self.bodies.remove(id)?;
        self.movements.remove(&id);
        for rotation in self.rotations.values_mut() {
            rotation.detach(id);
        }
        Some(body)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &BodyRegistry {
        &self.bodies
    }

    // === Navigation ===

    /// Send `body` along the shortest surface route to `target` on its own sphere.
    /// Any journey already in progress for the body is cancelled first.
    pub fn navigate(&mut self, body: BodyId, target: DVec3) -> bool {
        self.navigate_with_hooks(body, target, MovementHooks::default())
    }

    pub fn navigate_with_hooks(&mut self, body: BodyId, target: DVec3, hooks: MovementHooks) -> bool {
        if !target.is_finite() {
            tracing::warn!("Rejected navigation for body {:?}: target not finite", body);
            return false;
        }
        let Some(start) = self.bodies.get(body) else {
            tracing::warn!("Rejected navigation: body {:?} does not exist", body);
            return false;
        };
        let Some(sphere) = start.owner.and_then(|id| self.spheres.get(&id)) else {
            tracing::warn!("Rejected navigation: body {:?} has no sphere", body);
            return false;
        };

        let path = self
            .path_finder
            .find_path(start.position, target, sphere.center, sphere.radius());

        let movement_config = self.config.movement;
        let controller = self
            .movements
            .entry(body)
            .or_insert_with(|| MovementController::new(movement_config));
        let started = controller.start_movement(path, body, sphere, &mut self.bodies, hooks);
        if !controller.is_moving() {
            self.movements.remove(&body);
        }
        started
    }

    /// Cancel the body's journey. Returns false if it was not moving.
    pub fn stop(&mut self, body: BodyId) -> bool {
        match self.movements.remove(&body) {
            Some(mut controller) => {
                controller.stop_movement();
                true
            }
            None => false,
        }
    }

    pub fn is_moving(&self, body: BodyId) -> bool {
        self.movements.contains_key(&body)
    }

    pub fn active_path(&self, body: BodyId) -> Option<&Path> {
        self.movements.get(&body).and_then(|c| c.path())
    }

    // === Rotation ===

    pub fn begin_drag(&mut self, sphere: SphereId) -> bool {
        match self.rotations.get_mut(&sphere) {
            Some(rotation) => {
                rotation.set_dragging(true);
                true
            }
            None => false,
        }
    }

    /// Rotate `sphere` by a pointer drag. Ignored unless a drag has begun.
    pub fn drag(
        &mut self,
        sphere: SphereId,
        screen_dx: f64,
        screen_dy: f64,
        camera_up: DVec3,
        camera_right: DVec3,
    ) -> bool {
        let (Some(rotation), Some(planet)) =
            (self.rotations.get_mut(&sphere), self.spheres.get_mut(&sphere))
        else {
            return false;
        };
        rotation.apply_drag_delta(
            screen_dx,
            screen_dy,
            camera_up,
            camera_right,
            planet,
            &mut self.bodies,
        );
        true
    }

    pub fn end_drag(&mut self, sphere: SphereId) -> bool {
        match self.rotations.get_mut(&sphere) {
            Some(rotation) => {
                rotation.set_dragging(false);
                true
            }
            None => false,
        }
    }

    /// Drop drag and momentum on every sphere.
    pub fn reset_drag_state(&mut self) {
        for rotation in self.rotations.values_mut() {
            rotation.reset_drag_state();
        }
    }

    /// True while any sphere is being dragged.
    pub fn any_rotation_in_progress(&self) -> bool {
        let controllers: Vec<&RotationController> = self.rotations.values().collect();
        any_attached_rotation_in_progress(&controllers)
    }

    // === Frame ===

    pub fn tick(&mut self, dt: f64) -> Vec<WorldEvent> {
        let mut events = Vec::new();

        for sphere in self.spheres.values() {
            for event in apply_gravity_and_containment(sphere, &mut self.bodies, &self.config.gravity, dt) {
                events.push(WorldEvent::Containment {
                    sphere: sphere.id,
                    event,
                });
            }
        }

        self.bodies.integrate_all(dt);

        let spheres = &self.spheres;
        let bodies = &mut self.bodies;
        self.movements.retain(|body, controller| {
            let Some(sphere) = controller.sphere().and_then(|id| spheres.get(&id)) else {
                controller.stop_movement();
                return false;
            };
            match controller.update(dt, bodies, sphere) {
                MovementStatus::Moving { .. } => true,
                MovementStatus::Arrived { position } => {
                    events.push(WorldEvent::Arrived {
                        body: *body,
                        position,
                    });
                    false
                }
                MovementStatus::Idle => false,
            }
        });

        for (id, rotation) in self.rotations.iter_mut() {
            if let Some(sphere) = self.spheres.get_mut(id) {
                rotation.update(dt, sphere, &mut self.bodies);
            }
        }

        // arrivals snap to the path end, then ride this frame's rotation step
        for event in events.iter_mut() {
            if let WorldEvent::Arrived { body, position } = event {
                if let Some(arrived) = self.bodies.get(*body) {
                    *position = arrived.position;
                }
            }
        }

        self.tick += 1;
        events
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mut bodies: Vec<&Body> = self.bodies.iter().collect();
        bodies.sort_by_key(|b| b.id);

        WorldSnapshot {
            protocol_version: PROTOCOL_VERSION,
            tick: self.tick,
            spheres: self
                .spheres
                .values()
                .map(|s| {
                    let dragging = self.rotations.get(&s.id).is_some_and(|r| r.is_dragging());
                    SphereWire::from_sphere(s, dragging)
                })
                .collect(),
            bodies: bodies
                .into_iter()
                .map(|b| BodyWire::from_body(b, self.is_moving(b.id)))
                .collect(),
        }
    }
}
