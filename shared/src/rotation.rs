//! Drag-to-rotate for a single sphere, with inertia after release.
//!
//! Every rotation increment, whether from the pointer or from coasting, goes
//! through `apply_rotation`, which turns the sphere and carries each attached
//! dynamic body with it as if bolted to the surface.

use crate::body::{BodyId, BodyRegistry};
use crate::config::RotationConfig;
use crate::geometry::rotate_about;
use crate::sphere::{Sphere, SphereId};
use glam::{DQuat, DVec3};

#[derive(Debug, Clone)]
pub struct RotationController {
    sphere: SphereId,
    config: RotationConfig,
    /// Axis scaled by angular speed (rad/s).
    angular_velocity: DVec3,
    dragging: bool,
    /// Scaled-axis rotation applied by drag events since the last update.
    frame_rotation: DVec3,
    attached: Vec<BodyId>,
}

impl RotationController {
    pub fn new(sphere: SphereId, config: RotationConfig) -> Self {
        Self {
            sphere,
            config,
            angular_velocity: DVec3::ZERO,
            dragging: false,
            frame_rotation: DVec3::ZERO,
            attached: Vec::new(),
        }
    }

    pub fn sphere(&self) -> SphereId {
        self.sphere
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn angular_velocity(&self) -> DVec3 {
        self.angular_velocity
    }

    /// Released but still spinning down.
    pub fn is_coasting(&self) -> bool {
        !self.dragging && self.angular_velocity != DVec3::ZERO
    }

    pub fn attached(&self) -> &[BodyId] {
        &self.attached
    }

    /// Replace the set of bodies carried by this sphere's rotation.
    pub fn set_attached_bodies(&mut self, bodies: impl IntoIterator<Item = BodyId>) {
        self.attached.clear();
        for id in bodies {
            self.attach(id);
        }
    }

    pub fn attach(&mut self, body: BodyId) {
        if !self.attached.contains(&body) {
            self.attached.push(body);
        }
    }

    pub fn detach(&mut self, body: BodyId) {
        self.attached.retain(|b| *b != body);
    }

    /// Grab or release the sphere.
    ///
    /// Grabbing stops any coasting spin. Releasing keeps `release_factor` of the
    /// estimated velocity as momentum.
    pub fn set_dragging(&mut self, dragging: bool) {
        if dragging == self.dragging {
            return;
        }
        self.dragging = dragging;
        self.frame_rotation = DVec3::ZERO;
        if dragging {
            self.angular_velocity = DVec3::ZERO;
        } else {
            self.angular_velocity *= self.config.release_factor;
            tracing::debug!(
                "Sphere {:?} released at {:.3} rad/s",
                self.sphere,
                self.angular_velocity.length()
            );
        }
    }

    /// Rotate by a pointer drag given in screen pixels.
    ///
    /// Horizontal motion turns about the camera's up vector, vertical motion about
    /// its right vector, so the drag feels the same whatever the sphere's current
    /// orientation. Ignored unless dragging.
    pub fn apply_drag_delta(
        &mut self,
        screen_dx: f64,
        screen_dy: f64,
        camera_up: DVec3,
        camera_right: DVec3,
        sphere: &mut Sphere,
        bodies: &mut BodyRegistry,
    ) {
        if !self.dragging || !screen_dx.is_finite() || !screen_dy.is_finite() {
            return;
        }

        let up = camera_up.normalize_or_zero();
        let right = camera_right.normalize_or_zero();
        let yaw = up * (screen_dx * self.config.drag_sensitivity);
        let pitch = right * (screen_dy * self.config.drag_sensitivity);
        if yaw == DVec3::ZERO && pitch == DVec3::ZERO {
            return;
        }

        let delta = DQuat::from_scaled_axis(yaw) * DQuat::from_scaled_axis(pitch);
        self.frame_rotation += yaw + pitch;
        self.apply_rotation(delta, sphere, bodies);
    }

    /// Per-frame step.
    ///
    /// While dragging this only samples angular velocity from the drag applied since
    /// the previous frame. Otherwise it damps and applies the coasting spin.
    pub fn update(&mut self, dt: f64, sphere: &mut Sphere, bodies: &mut BodyRegistry) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }

        if self.dragging {
            let sample = std::mem::take(&mut self.frame_rotation) / dt;
            let s = self.config.velocity_smoothing;
            self.angular_velocity = self.angular_velocity * (1.0 - s) + sample * s;
            self.angular_velocity = self
                .angular_velocity
                .clamp_length_max(self.config.max_angular_speed);
            return;
        }

        if self.angular_velocity == DVec3::ZERO {
            return;
        }

        // faster spins decay harder
        let speed = self.angular_velocity.length();
        let rate = self.config.base_damping * (1.0 + self.config.progressive_damping * speed);
        self.angular_velocity *= (-rate * dt).exp();

        if self.angular_velocity.length_squared() < self.config.stop_threshold_sq {
            self.angular_velocity = DVec3::ZERO;
            return;
        }

        let delta = DQuat::from_scaled_axis(self.angular_velocity * dt);
        self.apply_rotation(delta, sphere, bodies);
    }

    /// Drop any drag and momentum immediately (e.g. when input focus is lost).
    pub fn reset_drag_state(&mut self) {
        self.dragging = false;
        self.angular_velocity = DVec3::ZERO;
        self.frame_rotation = DVec3::ZERO;
    }

    /// Rotate the sphere by `delta` and carry every attached dynamic body with it.
    pub fn apply_rotation(&self, delta: DQuat, sphere: &mut Sphere, bodies: &mut BodyRegistry) {
        sphere.orientation = (delta * sphere.orientation).normalize();
        if let Some(shell) = sphere.shell_orientation.as_mut() {
            *shell = sphere.orientation;
        }

        for id in &self.attached {
            let Some(body) = bodies.get_mut(*id) else {
                continue;
            };
            if !body.is_dynamic() {
                continue;
            }
            body.position = rotate_about(body.position, sphere.center, delta);
            body.orientation = (delta * body.orientation).normalize();
            body.wake();
        }
    }
}

/// True while any of the given spheres is being dragged.
pub fn any_attached_rotation_in_progress(controllers: &[&RotationController]) -> bool {
    controllers.iter().any(|c| c.is_dragging())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyKind;

    const DT: f64 = 1.0 / 60.0;

    fn setup() -> (RotationController, Sphere, BodyRegistry) {
        let sphere = Sphere::new(SphereId(1), DVec3::new(2.0, -1.0, 3.0), 15.0, 9.81)
            .unwrap()
            .with_shell();
        let controller = RotationController::new(sphere.id, RotationConfig::default());
        (controller, sphere, BodyRegistry::new())
    }

    fn assert_vec_close(actual: DVec3, expected: DVec3) {
        assert!(
            (actual - expected).length() < 1e-9,
            "Expected {:?} to be close to {:?}",
            actual,
            expected
        );
    }

    // --- apply_rotation ---

    #[test]
    fn rotation_carries_attached_body_rigidly() {
        let (mut rc, mut sphere, mut bodies) = setup();
        let start = sphere.center + DVec3::new(0.0, 15.0, 0.0);
        let id = bodies.spawn(start, BodyKind::Dynamic, Some(sphere.id));
        let tilt = DQuat::from_axis_angle(DVec3::Z, 0.2);
        bodies.get_mut(id).unwrap().orientation = tilt;
        rc.set_attached_bodies([id]);

        let q = DQuat::from_axis_angle(DVec3::new(1.0, 1.0, 0.0).normalize(), 0.7);
        rc.apply_rotation(q, &mut sphere, &mut bodies);

        let body = bodies.get(id).unwrap();
        assert_vec_close(body.position, sphere.center + q * (start - sphere.center));
        assert!(body.orientation.abs_diff_eq(q * tilt, 1e-9));
        assert!(sphere.orientation.abs_diff_eq(q, 1e-9));
        assert_eq!(sphere.shell_orientation, Some(sphere.orientation));
    }

    #[test]
    fn rotation_wakes_sleeping_body() {
        let (mut rc, mut sphere, mut bodies) = setup();
        let id = bodies.spawn(sphere.center + DVec3::X * 15.0, BodyKind::Dynamic, Some(sphere.id));
        bodies.get_mut(id).unwrap().sleeping = true;
        rc.attach(id);

        rc.apply_rotation(DQuat::from_axis_angle(DVec3::Y, 0.1), &mut sphere, &mut bodies);
        assert!(!bodies.get(id).unwrap().sleeping);
    }

    #[test]
    fn static_and_unattached_bodies_stay_put() {
        let (mut rc, mut sphere, mut bodies) = setup();
        let fixed = bodies.spawn(sphere.center + DVec3::X * 15.0, BodyKind::Static, Some(sphere.id));
        let loose = bodies.spawn(sphere.center + DVec3::Z * 15.0, BodyKind::Dynamic, Some(sphere.id));
        rc.attach(fixed);

        rc.apply_rotation(DQuat::from_axis_angle(DVec3::Y, 1.0), &mut sphere, &mut bodies);
        assert_eq!(bodies.get(fixed).unwrap().position, sphere.center + DVec3::X * 15.0);
        assert_eq!(bodies.get(loose).unwrap().position, sphere.center + DVec3::Z * 15.0);
    }

    #[test]
    fn stale_attached_handle_is_skipped() {
        let (mut rc, mut sphere, mut bodies) = setup();
        rc.attach(BodyId(42));
        rc.apply_rotation(DQuat::from_axis_angle(DVec3::Y, 1.0), &mut sphere, &mut bodies);
        assert!(sphere.orientation.is_normalized());
    }

    #[test]
    fn many_small_rotations_do_not_drift() {
        let (mut rc, mut sphere, mut bodies) = setup();
        let id = bodies.spawn(sphere.center + DVec3::Y * 15.0, BodyKind::Dynamic, Some(sphere.id));
        rc.attach(id);
        let q = DQuat::from_axis_angle(DVec3::new(0.3, 0.9, 0.1).normalize(), 0.013);
        for _ in 0..10_000 {
            rc.apply_rotation(q, &mut sphere, &mut bodies);
        }
        let body = bodies.get(id).unwrap();
        assert!(sphere.surface_error(body.position) < 1e-6);
        assert!(sphere.orientation.is_normalized());
        assert!(body.orientation.is_normalized());
    }

    // --- drag ---

    #[test]
    fn drag_ignored_when_not_dragging() {
        let (mut rc, mut sphere, mut bodies) = setup();
        rc.apply_drag_delta(50.0, 0.0, DVec3::Y, DVec3::X, &mut sphere, &mut bodies);
        assert_eq!(sphere.orientation, DQuat::IDENTITY);
    }

    #[test]
    fn horizontal_drag_turns_about_camera_up() {
        let (mut rc, mut sphere, mut bodies) = setup();
        rc.set_dragging(true);
        rc.apply_drag_delta(100.0, 0.0, DVec3::Y, DVec3::X, &mut sphere, &mut bodies);

        let (axis, angle) = sphere.orientation.to_axis_angle();
        assert_vec_close(axis, DVec3::Y);
        assert!((angle - 100.0 * RotationConfig::default().drag_sensitivity).abs() < 1e-9);
    }

    #[test]
    fn vertical_drag_uses_camera_right_not_sphere_axes() {
        let (mut rc, mut sphere, mut bodies) = setup();
        let initial = DQuat::from_axis_angle(DVec3::X, 1.0);
        sphere.orientation = initial;
        rc.set_dragging(true);
        let right = DVec3::new(0.0, 0.0, 1.0);
        rc.apply_drag_delta(0.0, 40.0, DVec3::Y, right, &mut sphere, &mut bodies);

        let delta = sphere.orientation * initial.inverse();
        let (axis, _) = delta.to_axis_angle();
        assert_vec_close(axis, right);
    }

    #[test]
    fn drag_velocity_is_smoothed_and_clamped() {
        let (mut rc, mut sphere, mut bodies) = setup();
        rc.set_dragging(true);

        rc.apply_drag_delta(10.0, 0.0, DVec3::Y, DVec3::X, &mut sphere, &mut bodies);
        rc.update(DT, &mut sphere, &mut bodies);
        let instant = 10.0 * RotationConfig::default().drag_sensitivity / DT;
        let expected = (instant * 0.3).min(RotationConfig::default().max_angular_speed);
        assert!((rc.angular_velocity().length() - expected).abs() < 1e-9);

        for _ in 0..20 {
            rc.apply_drag_delta(10_000.0, 0.0, DVec3::Y, DVec3::X, &mut sphere, &mut bodies);
            rc.update(DT, &mut sphere, &mut bodies);
        }
        assert!(rc.angular_velocity().length() <= RotationConfig::default().max_angular_speed + 1e-12);
    }

    #[test]
    fn no_damping_while_dragging_without_motion() {
        let (mut rc, mut sphere, mut bodies) = setup();
        rc.set_dragging(true);
        rc.update(DT, &mut sphere, &mut bodies);
        assert_eq!(sphere.orientation, DQuat::IDENTITY);
    }

    #[test]
    fn release_halves_velocity() {
        let (mut rc, mut sphere, mut bodies) = setup();
        rc.set_dragging(true);
        rc.apply_drag_delta(20.0, 0.0, DVec3::Y, DVec3::X, &mut sphere, &mut bodies);
        rc.update(DT, &mut sphere, &mut bodies);
        let before = rc.angular_velocity();

        rc.set_dragging(false);
        assert_vec_close(rc.angular_velocity(), before * 0.5);
        assert!(rc.is_coasting());
    }

    // --- coasting ---

    #[test]
    fn damping_strictly_decreases_to_exact_zero() {
        let (mut rc, mut sphere, mut bodies) = setup();
        rc.set_dragging(true);
        for _ in 0..10 {
            rc.apply_drag_delta(30.0, -12.0, DVec3::Y, DVec3::X, &mut sphere, &mut bodies);
            rc.update(DT, &mut sphere, &mut bodies);
        }
        rc.set_dragging(false);

        let axis = rc.angular_velocity().normalize();
        let mut previous = rc.angular_velocity().length();
        assert!(previous > 0.0);

        let mut frames = 0;
        while rc.angular_velocity() != DVec3::ZERO {
            rc.update(DT, &mut sphere, &mut bodies);
            let w = rc.angular_velocity();
            let speed = w.length();
            assert!(speed < previous, "speed {} did not drop below {}", speed, previous);
            if speed > 0.0 {
                assert!(w.normalize().dot(axis) > 0.999, "velocity flipped direction");
            }
            previous = speed;
            frames += 1;
            assert!(frames < 10_000, "never came to rest");
        }
        assert!(!rc.is_coasting());
    }

    #[test]
    fn fast_spin_decays_proportionally_faster() {
        let config = RotationConfig::default();
        let mut slow = RotationController::new(SphereId(1), config);
        let mut fast = RotationController::new(SphereId(1), config);
        slow.angular_velocity = DVec3::Y * 0.5;
        fast.angular_velocity = DVec3::Y * 3.0;

        let (_, mut sphere, mut bodies) = setup();
        slow.update(DT, &mut sphere, &mut bodies);
        fast.update(DT, &mut sphere, &mut bodies);

        let slow_ratio = slow.angular_velocity().length() / 0.5;
        let fast_ratio = fast.angular_velocity().length() / 3.0;
        assert!(fast_ratio < slow_ratio);
    }

    #[test]
    fn coasting_moves_attached_bodies() {
        let (mut rc, mut sphere, mut bodies) = setup();
        let start = sphere.center + DVec3::X * 15.0;
        let id = bodies.spawn(start, BodyKind::Dynamic, Some(sphere.id));
        rc.attach(id);
        rc.angular_velocity = DVec3::Y * 1.0;

        rc.update(DT, &mut sphere, &mut bodies);
        let body = bodies.get(id).unwrap();
        assert!((body.position - start).length() > 1e-3);
        assert!(sphere.surface_error(body.position) < 1e-9);
    }

    // --- reset / aggregate ---

    #[test]
    fn reset_mid_drag_clears_everything() {
        let (mut rc, mut sphere, mut bodies) = setup();
        let mut other = RotationController::new(SphereId(2), RotationConfig::default());
        rc.set_dragging(true);
        rc.apply_drag_delta(30.0, 5.0, DVec3::Y, DVec3::X, &mut sphere, &mut bodies);
        rc.update(DT, &mut sphere, &mut bodies);
        assert!(any_attached_rotation_in_progress(&[&rc, &other]));

        rc.reset_drag_state();
        assert!(!rc.is_dragging());
        assert_eq!(rc.angular_velocity(), DVec3::ZERO);
        assert!(!any_attached_rotation_in_progress(&[&rc, &other]));

        other.set_dragging(true);
        assert!(any_attached_rotation_in_progress(&[&rc, &other]));
    }

    #[test]
    fn set_attached_bodies_replaces_and_dedups() {
        let (mut rc, _, _) = setup();
        rc.set_attached_bodies([BodyId(1), BodyId(2), BodyId(1)]);
        assert_eq!(rc.attached(), &[BodyId(1), BodyId(2)]);
        rc.set_attached_bodies([BodyId(3)]);
        assert_eq!(rc.attached(), &[BodyId(3)]);
        rc.detach(BodyId(3));
        assert!(rc.attached().is_empty());
    }
}
