//! Path-following movement along a precomputed surface path.
//!
//! A controller is either idle or driving exactly one body along one path.
//! Each frame it advances a distance along the path using a trapezoidal speed
//! profile, then re-projects the position onto the sphere as it is *now*, so a
//! rotation of the planet between frames never leaves the body off the surface.

use crate::body::{BodyId, BodyRegistry};
use crate::config::MovementConfig;
use crate::geometry::align_up_to;
use crate::path::Path;
use crate::sphere::{Sphere, SphereId};
use glam::DVec3;
use std::collections::VecDeque;
use std::fmt;

type StartHook = Box<dyn FnMut(BodyId) + Send>;
type ProgressHook = Box<dyn FnMut(BodyId, f64, DVec3) + Send>;
type CompleteHook = Box<dyn FnMut(BodyId, DVec3) + Send>;

/// Optional callbacks for one movement session.
#[derive(Default)]
pub struct MovementHooks {
    pub on_start: Option<StartHook>,
    /// Receives progress in [0, 1] and the new position.
    pub on_progress: Option<ProgressHook>,
    /// Receives the final position. Never called for a cancelled session.
    pub on_complete: Option<CompleteHook>,
}

impl MovementHooks {
    pub fn on_start(mut self, f: impl FnMut(BodyId) + Send + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(BodyId, f64, DVec3) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnMut(BodyId, DVec3) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for MovementHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementHooks")
            .field("on_start", &self.on_start.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Result of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementStatus {
    Idle,
    Moving { progress: f64 },
    Arrived { position: DVec3 },
}

/// Fixed-capacity history of recent positions, oldest first.
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: VecDeque<DVec3>,
    capacity: usize,
}

impl TrailBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, point: DVec3) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &DVec3> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Instantaneous speed for a journey of `total_length` after `elapsed` seconds.
///
/// Linear ramp up over `acceleration_time`, linear ramp down over the last
/// `deceleration_time` of the estimated travel time, floored at
/// `min_speed_factor * base_speed` so the tail never stalls.
pub fn speed_at(config: &MovementConfig, elapsed: f64, total_length: f64) -> f64 {
    let base = config.base_speed;
    let mut factor = 1.0;

    if config.acceleration_time > 0.0 && elapsed < config.acceleration_time {
        factor *= (elapsed / config.acceleration_time).max(0.0);
    }

    let remaining_time = estimated_duration(config, total_length) - elapsed;
    if config.deceleration_time > 0.0 && remaining_time < config.deceleration_time {
        factor *= (remaining_time / config.deceleration_time).clamp(0.0, 1.0);
    }

    (base * factor).max(base * config.min_speed_factor)
}

/// Expected seconds to cover `total_length` with the configured ramps.
pub fn estimated_duration(config: &MovementConfig, total_length: f64) -> f64 {
    total_length / config.base_speed + (config.acceleration_time + config.deceleration_time) / 2.0
}

struct MovementSession {
    path: Path,
    body: BodyId,
    sphere: SphereId,
    elapsed: f64,
    distance_traveled: f64,
    total_length: f64,
    segment_lengths: Vec<f64>,
    hooks: MovementHooks,
}

impl MovementSession {
    /// Point at `distance` along the path, linearly interpolated within its segment.
    fn point_at(&self, distance: f64) -> DVec3 {
        let points = self.path.points();
        let mut walked = 0.0;
        for (i, len) in self.segment_lengths.iter().enumerate() {
            if walked + len >= distance {
                let t = if *len > 0.0 {
                    ((distance - walked) / len).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                return points[i].lerp(points[i + 1], t);
            }
            walked += len;
        }
        points[points.len() - 1]
    }
}

/// Drives at most one body along a path at a time.
pub struct MovementController {
    config: MovementConfig,
    session: Option<MovementSession>,
    trail: TrailBuffer,
}

impl MovementController {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            session: None,
            trail: TrailBuffer::new(config.trail_capacity),
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn is_moving(&self) -> bool {
        self.session.is_some()
    }

    /// Body driven by the active session.
    pub fn body(&self) -> Option<BodyId> {
        self.session.as_ref().map(|s| s.body)
    }

    /// Sphere the active session follows.
    pub fn sphere(&self) -> Option<SphereId> {
        self.session.as_ref().map(|s| s.sphere)
    }

    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| &s.path)
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    /// Begin following `path` with `body` on `sphere`.
    ///
    /// Returns false (without touching any state) for a path with fewer than two
    /// points or a body that is not in `bodies`. An active session is cancelled first.
    pub fn start_movement(
        &mut self,
        path: Path,
        body: BodyId,
        sphere: &Sphere,
        bodies: &mut BodyRegistry,
        mut hooks: MovementHooks,
    ) -> bool {
        if path.len() < 2 {
            tracing::warn!("Rejected movement for body {:?}: path has {} points", body, path.len());
            return false;
        }
        let Some(target) = bodies.get_mut(body) else {
            tracing::warn!("Rejected movement: body {:?} does not exist", body);
            return false;
        };

        if self.session.is_some() {
            tracing::debug!("Cancelling active movement before starting a new one");
            self.stop_movement();
        }

        target.wake();
        self.trail.clear();

        let segment_lengths: Vec<f64> = path
            .points()
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .collect();
        let total_length: f64 = segment_lengths.iter().sum();

        tracing::info!(
            "Body {:?} starting movement: {} points, {:.2} units",
            body,
            path.len(),
            total_length
        );

        if let Some(on_start) = hooks.on_start.as_mut() {
            on_start(body);
        }

        self.session = Some(MovementSession {
            path,
            body,
            sphere: sphere.id,
            elapsed: 0.0,
            distance_traveled: 0.0,
            total_length,
            segment_lengths,
            hooks,
        });
        true
    }

    /// Cancel the active session. The body stays where it is; no completion hook fires.
    pub fn stop_movement(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(
                "Body {:?} movement stopped at {:.2}/{:.2}",
                session.body,
                session.distance_traveled,
                session.total_length
            );
        }
        self.trail.clear();
    }

    /// Advance the active session by `dt` seconds.
    ///
    /// `sphere` is the current state of the sphere the session follows; the body is
    /// re-projected onto it every frame.
    pub fn update(&mut self, dt: f64, bodies: &mut BodyRegistry, sphere: &Sphere) -> MovementStatus {
        let Some(session) = self.session.as_mut() else {
            return MovementStatus::Idle;
        };

        if bodies.get(session.body).is_none() {
            tracing::warn!("Body {:?} vanished mid-movement, cancelling", session.body);
            self.stop_movement();
            return MovementStatus::Idle;
        }

        session.elapsed += dt.max(0.0);
        let speed = speed_at(&self.config, session.elapsed, session.total_length);
        session.distance_traveled =
            (session.distance_traveled + speed * dt.max(0.0)).min(session.total_length);

        let remaining = session.total_length - session.distance_traveled;
        if remaining < self.config.arrival_threshold {
            return self.complete(bodies, sphere);
        }

        let raw = session.point_at(session.distance_traveled);
        let position = sphere.project(raw);
        let body_id = session.body;

        if let Some(body) = bodies.get_mut(body_id) {
            body.position = position;
            body.velocity = DVec3::ZERO;
            body.orientation = align_up_to(sphere.normal_at(position));
            body.wake();
        }
        self.trail.push(position);

        let progress = session.distance_traveled / session.total_length;
        if let Some(on_progress) = session.hooks.on_progress.as_mut() {
            on_progress(body_id, progress, position);
        }

        MovementStatus::Moving { progress }
    }

    fn complete(&mut self, bodies: &mut BodyRegistry, sphere: &Sphere) -> MovementStatus {
        let Some(mut session) = self.session.take() else {
            return MovementStatus::Idle;
        };

        let position = session.path.last().unwrap_or_default();
        if let Some(body) = bodies.get_mut(session.body) {
            body.position = position;
            body.velocity = DVec3::ZERO;
            body.orientation = align_up_to(sphere.normal_at(position));
            body.wake();
        }
        self.trail.push(position);

        tracing::info!(
            "Body {:?} arrived after {:.2}s ({:.2} units)",
            session.body,
            session.elapsed,
            session.total_length
        );

        if let Some(on_complete) = session.hooks.on_complete.as_mut() {
            on_complete(session.body, position);
        }

        MovementStatus::Arrived { position }
    }
}
