use crate::config::ServerConfig;
use crate::wanderer::WandererManager;
use crate::world::{World, WorldEvent};
use glam::DVec3;
use planet_shared::body::{BodyId, BodyKind};
use planet_shared::gravity::ContainmentEvent;
use planet_shared::protocol::{PathWire, WorldSnapshot};
use planet_shared::sphere::{fibonacci_sphere, SphereId};

/// What one tick produced, for the game loop to broadcast.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub arrivals: Vec<(BodyId, DVec3)>,
    /// Routes planned by wanderers this tick.
    pub paths: Vec<PathWire>,
    pub containment: Vec<ContainmentEvent>,
}

/// Central simulation state owned by the game loop task.
pub struct SimState {
    pub world: World,
    /// The sphere bodies are spawned on and drags apply to.
    pub planet: SphereId,
    pub wanderers: WandererManager,
}

impl SimState {
    pub fn new(config: &ServerConfig) -> Result<Self, String> {
        let mut world = World::new(config.navigation, config.rng_seed);
        let planet = world.add_sphere(DVec3::ZERO, config.sphere_radius, config.surface_gravity)?;

        let mut state = Self {
            world,
            planet,
            wanderers: WandererManager::new(),
        };
        // spread evenly so wanderers don't start on top of each other
        for direction in fibonacci_sphere(config.wanderer_count) {
            state.add_wanderer_at(direction);
        }
        Ok(state)
    }

    /// Spawn a dynamic body on the planet along `direction`.
    pub fn spawn_body(&mut self, direction: DVec3) -> Option<BodyId> {
        self.world
            .spawn_body(self.planet, direction, BodyKind::Dynamic, 1.0)
    }

    pub fn add_wanderer_at(&mut self, direction: DVec3) -> Option<BodyId> {
        let body = self.spawn_body(direction)?;
        self.wanderers.add(body, self.world.rng());
        Some(body)
    }

    /// Remove a body along with its journey and any wanderer driving it.
    pub fn remove_body(&mut self, body: BodyId) -> bool {
        self.wanderers.remove(body);
        self.world.remove_body(body).is_some()
    }

    /// Start a journey and return the planned route.
    pub fn navigate(&mut self, body: BodyId, target: DVec3) -> Option<PathWire> {
        if !self.world.navigate(body, target) {
            return None;
        }
        self.wanderers.on_departure(body);
        self.world
            .active_path(body)
            .map(|path| PathWire::from_path(body, path))
    }

    pub fn stop(&mut self, body: BodyId) -> bool {
        let stopped = self.world.stop(body);
        if stopped {
            self.wanderers.on_arrival(body, self.world.rng());
        }
        stopped
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> TickOutput {
        let mut output = TickOutput::default();

        for event in self.world.tick(dt) {
            match event {
                WorldEvent::Arrived { body, position } => {
                    self.wanderers.on_arrival(body, self.world.rng());
                    output.arrivals.push((body, position));
                }
                WorldEvent::Containment { event, .. } => output.containment.push(event),
            }
        }

        for body in self.wanderers.tick(dt, self.world.rng()) {
            let target = self.world.random_surface_point(self.planet);
            match target.and_then(|t| self.navigate(body, t)) {
                Some(path) => output.paths.push(path),
                None => self.wanderers.on_arrival(body, self.world.rng()),
            }
        }

        output
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state(wanderers: usize) -> SimState {
        let config = ServerConfig {
            rng_seed: 12345,
            wanderer_count: wanderers,
            ..Default::default()
        };
        SimState::new(&config).unwrap()
    }

    #[test]
    fn wanderers_are_spawned_on_the_planet() {
        let state = test_state(5);
        assert_eq!(state.wanderers.count(), 5);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.bodies.len(), 5);
        for body in &snapshot.bodies {
            assert_eq!(body.sphere, Some(state.planet.0));
        }
    }

    #[test]
    fn removed_wanderer_stops_planning() {
        let mut state = test_state(2);
        let body = state.snapshot().bodies[0].id;
        let body = BodyId(body);
        assert!(state.remove_body(body));
        assert!(!state.wanderers.is_wanderer(body));
        assert_eq!(state.wanderers.count(), 1);
        assert!(!state.remove_body(body));

        for _ in 0..60 * 30 {
            let out = state.tick(1.0 / 60.0);
            assert!(out.paths.iter().all(|p| p.body != body.0));
        }
        assert!(state.world.body(body).is_none());
    }

    #[test]
    fn invalid_radius_fails_construction() {
        let config = ServerConfig {
            sphere_radius: -1.0,
            ..Default::default()
        };
        assert!(SimState::new(&config).is_err());
    }

    #[test]
    fn wanderers_plan_and_complete_journeys() {
        let mut state = test_state(3);
        let mut planned = 0;
        let mut arrived = 0;
        for _ in 0..60 * 60 {
            let out = state.tick(1.0 / 60.0);
            planned += out.paths.len();
            arrived += out.arrivals.len();
        }
        assert!(planned >= 3, "only {} journeys planned", planned);
        assert!(arrived >= 1, "no wanderer arrived");
    }

    #[test]
    fn navigate_returns_path_from_current_position() {
        let mut state = test_state(0);
        let body = state.spawn_body(DVec3::Z).unwrap();
        let path = state.navigate(body, DVec3::X * 15.0).unwrap();
        assert_eq!(path.body, body.0);
        assert_eq!(path.points.first(), Some(&[0.0, 0.0, 15.0]));
        assert_eq!(path.points.last(), Some(&[15.0, 0.0, 0.0]));
        assert!(state.stop(body));
        assert!(!state.stop(body));
    }

    #[test]
    fn navigate_unknown_body_is_none() {
        let mut state = test_state(0);
        assert!(state.navigate(BodyId(999), DVec3::X).is_none());
    }

    #[test]
    fn same_seed_same_outcome() {
        let mut a = test_state(4);
        let mut b = test_state(4);
        for _ in 0..600 {
            a.tick(1.0 / 60.0);
            b.tick(1.0 / 60.0);
        }
        let sa = serde_json::to_string(&a.snapshot()).unwrap();
        let sb = serde_json::to_string(&b.snapshot()).unwrap();
        assert_eq!(sa, sb);
    }
}
