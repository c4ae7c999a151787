//! Autonomous bodies that roam the planet surface.
//!
//! Wanderers are lightweight state machines that:
//! - Rest for a temper-dependent delay
//! - Ask to travel somewhere once rested, via `tick()`
//! - Go back to resting when told they arrived via `on_arrival()`

use planet_shared::body::BodyId;
use rand::Rng;

/// Chance per second that an erratic wanderer changes its mind mid-journey.
const ERRATIC_REROUTE_PER_SEC: f64 = 0.15;

/// Temper affects how long a wanderer rests between journeys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WandererTemper {
    /// Barely stops (0.2-1.0s rest)
    Restless,
    /// Takes its time (2.0-6.0s rest)
    Leisurely,
    /// Unpredictable rests (0.1-8.0s), may re-route while travelling
    Erratic,
}

impl WandererTemper {
    /// Rest range for this temper (min, max) in seconds
    fn rest_range(&self) -> (f64, f64) {
        match self {
            WandererTemper::Restless => (0.2, 1.0),
            WandererTemper::Leisurely => (2.0, 6.0),
            WandererTemper::Erratic => (0.1, 8.0),
        }
    }

    fn random_rest(&self, rng: &mut impl Rng) -> f64 {
        let (min, max) = self.rest_range();
        min + rng.gen::<f64>() * (max - min)
    }

    /// Select a random temper
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => WandererTemper::Restless,
            1 => WandererTemper::Leisurely,
            _ => WandererTemper::Erratic,
        }
    }
}

#[derive(Debug)]
pub struct Wanderer {
    pub body: BodyId,
    pub temper: WandererTemper,
    /// Seconds left before the next journey. None while travelling.
    rest: Option<f64>,
}

impl Wanderer {
    pub fn new(body: BodyId, temper: WandererTemper, rng: &mut impl Rng) -> Self {
        Self {
            body,
            temper,
            rest: Some(temper.random_rest(rng)),
        }
    }

    pub fn is_travelling(&self) -> bool {
        self.rest.is_none()
    }

    /// Tick the wanderer. Returns true if it wants a new destination.
    pub fn tick(&mut self, dt: f64, rng: &mut impl Rng) -> bool {
        match self.rest.as_mut() {
            Some(rest) => {
                *rest -= dt;
                if *rest <= 0.0 {
                    self.rest = None;
                    return true;
                }
                false
            }
            None => {
                self.temper == WandererTemper::Erratic
                    && rng.gen::<f64>() < ERRATIC_REROUTE_PER_SEC * dt
            }
        }
    }

    /// Journey finished (or could not start): rest before the next one.
    pub fn on_arrival(&mut self, rng: &mut impl Rng) {
        self.rest = Some(self.temper.random_rest(rng));
    }

    /// Journey started from outside the wanderer's own schedule.
    pub fn on_departure(&mut self) {
        self.rest = None;
    }
}

/// Manages all wanderers
#[derive(Debug, Default)]
pub struct WandererManager {
    /// List of wanderers (public for testing)
    pub wanderers: Vec<Wanderer>,
}

impl WandererManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wanderer driving the given body
    pub fn add(&mut self, body: BodyId, rng: &mut impl Rng) {
        let temper = WandererTemper::random(rng);
        tracing::info!("Wanderer {:?} created with {:?} temper", body, temper);
        self.wanderers.push(Wanderer::new(body, temper, rng));
    }

    pub fn remove(&mut self, body: BodyId) {
        self.wanderers.retain(|w| w.body != body);
    }

    pub fn is_wanderer(&self, body: BodyId) -> bool {
        self.wanderers.iter().any(|w| w.body == body)
    }

    /// Route an arrival to the wanderer driving `body`, if any.
    pub fn on_arrival(&mut self, body: BodyId, rng: &mut impl Rng) {
        if let Some(w) = self.wanderers.iter_mut().find(|w| w.body == body) {
            w.on_arrival(rng);
        }
    }

    pub fn on_departure(&mut self, body: BodyId) {
        if let Some(w) = self.wanderers.iter_mut().find(|w| w.body == body) {
            w.on_departure();
        }
    }

    /// Tick all wanderers. Returns the bodies that want a new destination.
    pub fn tick(&mut self, dt: f64, rng: &mut impl Rng) -> Vec<BodyId> {
        self.wanderers
            .iter_mut()
            .filter_map(|w| w.tick(dt, rng).then_some(w.body))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.wanderers.len()
    }

    pub fn travelling_count(&self) -> usize {
        self.wanderers.iter().filter(|w| w.is_travelling()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn wanderer_requests_destination_after_rest() {
        let mut rng = test_rng();
        let mut w = Wanderer::new(BodyId(1), WandererTemper::Restless, &mut rng);
        assert!(!w.is_travelling());

        let mut requested = false;
        for _ in 0..20 {
            if w.tick(0.1, &mut rng) {
                requested = true;
                break;
            }
        }
        assert!(requested, "Restless wanderer should leave within 2 seconds");
        assert!(w.is_travelling());
    }

    #[test]
    fn leisurely_wanderer_rests_at_least_two_seconds() {
        let mut rng = test_rng();
        let mut w = Wanderer::new(BodyId(1), WandererTemper::Leisurely, &mut rng);
        for _ in 0..19 {
            assert!(!w.tick(0.1, &mut rng));
        }
    }

    #[test]
    fn calm_wanderer_waits_while_travelling() {
        let mut rng = test_rng();
        for temper in [WandererTemper::Restless, WandererTemper::Leisurely] {
            let mut w = Wanderer::new(BodyId(1), temper, &mut rng);
            w.on_departure();
            for _ in 0..1000 {
                assert!(!w.tick(0.1, &mut rng));
            }
        }
    }

    #[test]
    fn erratic_wanderer_sometimes_reroutes() {
        let mut rng = test_rng();
        let mut w = Wanderer::new(BodyId(1), WandererTemper::Erratic, &mut rng);
        w.on_departure();
        let reroutes = (0..10_000).filter(|_| w.tick(0.1, &mut rng)).count();
        // expected around 150
        assert!(reroutes > 50 && reroutes < 300, "got {} reroutes", reroutes);
    }

    #[test]
    fn arrival_starts_a_new_rest() {
        let mut rng = test_rng();
        let mut w = Wanderer::new(BodyId(1), WandererTemper::Restless, &mut rng);
        w.on_departure();
        w.on_arrival(&mut rng);
        assert!(!w.is_travelling());
        assert!(!w.tick(0.1, &mut rng));
    }

    #[test]
    fn manager_tick_returns_ready_bodies() {
        let mut rng = test_rng();
        let mut manager = WandererManager::new();
        manager.wanderers.push(Wanderer::new(BodyId(1), WandererTemper::Restless, &mut rng));
        manager.wanderers.push(Wanderer::new(BodyId(2), WandererTemper::Leisurely, &mut rng));

        let mut ready = Vec::new();
        for _ in 0..15 {
            ready.extend(manager.tick(0.1, &mut rng));
        }
        assert_eq!(ready, vec![BodyId(1)]);
        assert_eq!(manager.travelling_count(), 1);

        manager.on_arrival(BodyId(1), &mut rng);
        assert_eq!(manager.travelling_count(), 0);
    }

    #[test]
    fn remove_and_lookup() {
        let mut rng = test_rng();
        let mut manager = WandererManager::new();
        manager.add(BodyId(5), &mut rng);
        manager.add(BodyId(6), &mut rng);
        assert!(manager.is_wanderer(BodyId(5)));

        manager.remove(BodyId(5));
        manager.remove(BodyId(99));
        assert!(!manager.is_wanderer(BodyId(5)));
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn arrival_for_unknown_body_is_ignored() {
        let mut rng = test_rng();
        let mut manager = WandererManager::new();
        manager.on_arrival(BodyId(3), &mut rng);
        manager.on_departure(BodyId(3));
        assert_eq!(manager.count(), 0);
    }
}
