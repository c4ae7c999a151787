/// Geodesic path sampling
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathConfig {
    pub segment_count: usize,
    /// Max allowed distance of a sampled point from the sphere radius
    pub surface_tolerance: f64,
    /// Arcs shorter than this (radians) become a straight 2-point path
    pub min_arc_angle: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            segment_count: 32,
            surface_tolerance: 0.01,
            min_arc_angle: 0.01,
        }
    }
}

impl PathConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.segment_count == 0 {
            return Err("segment_count must be >= 1".to_string());
        }
        if !self.surface_tolerance.is_finite() || self.surface_tolerance <= 0.0 {
            return Err("surface_tolerance must be finite and > 0".to_string());
        }
        if !self.min_arc_angle.is_finite() || self.min_arc_angle < 0.0 {
            return Err("min_arc_angle must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

/// Path-following speed profile
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovementConfig {
    /// Cruise speed (units/s)
    pub base_speed: f64,
    /// Ramp-up window at the start (seconds)
    pub acceleration_time: f64,
    /// Ramp-down window at the end (seconds)
    pub deceleration_time: f64,
    /// Speed never drops below this fraction of base_speed
    pub min_speed_factor: f64,
    /// Remaining distance at which the body snaps to the final point
    pub arrival_threshold: f64,
    pub trail_capacity: usize,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            acceleration_time: 0.5,
            deceleration_time: 0.8,
            min_speed_factor: 0.1,
            arrival_threshold: 0.01,
            trail_capacity: 20,
        }
    }
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_speed.is_finite() || self.base_speed <= 0.0 {
            return Err("base_speed must be finite and > 0".to_string());
        }
        if !self.acceleration_time.is_finite() || self.acceleration_time < 0.0 {
            return Err("acceleration_time must be finite and >= 0".to_string());
        }
        if !self.deceleration_time.is_finite() || self.deceleration_time < 0.0 {
            return Err("deceleration_time must be finite and >= 0".to_string());
        }
        if !(self.min_speed_factor > 0.0 && self.min_speed_factor <= 1.0) {
            return Err("min_speed_factor must be in (0, 1]".to_string());
        }
        if !self.arrival_threshold.is_finite() || self.arrival_threshold <= 0.0 {
            return Err("arrival_threshold must be finite and > 0".to_string());
        }
        Ok(())
    }
}

/// Drag-to-rotate and coasting
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotationConfig {
    /// Radians of rotation per pixel of pointer drag
    pub drag_sensitivity: f64,
    /// Blend weight of the newest velocity sample
    pub velocity_smoothing: f64,
    /// rad/s
    pub max_angular_speed: f64,
    /// Velocity kept when the pointer is released
    pub release_factor: f64,
    /// Damping rate (1/s) for a slow spin
    pub base_damping: f64,
    /// Extra damping per rad/s of current speed
    pub progressive_damping: f64,
    /// Angular speed² at which coasting stops
    pub stop_threshold_sq: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.005,
            velocity_smoothing: 0.3,
            max_angular_speed: 3.0,
            release_factor: 0.5,
            base_damping: 2.0,
            progressive_damping: 1.5,
            stop_threshold_sq: 1e-5,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.drag_sensitivity.is_finite() || self.drag_sensitivity <= 0.0 {
            return Err("drag_sensitivity must be finite and > 0".to_string());
        }
        if !(self.velocity_smoothing > 0.0 && self.velocity_smoothing <= 1.0) {
            return Err("velocity_smoothing must be in (0, 1]".to_string());
        }
        if !self.max_angular_speed.is_finite() || self.max_angular_speed <= 0.0 {
            return Err("max_angular_speed must be finite and > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.release_factor) {
            return Err("release_factor must be in [0, 1]".to_string());
        }
        if !self.base_damping.is_finite() || self.base_damping <= 0.0 {
            return Err("base_damping must be finite and > 0".to_string());
        }
        if !self.progressive_damping.is_finite() || self.progressive_damping < 0.0 {
            return Err("progressive_damping must be finite and >= 0".to_string());
        }
        if !self.stop_threshold_sq.is_finite() || self.stop_threshold_sq <= 0.0 {
            return Err("stop_threshold_sq must be finite and > 0".to_string());
        }
        Ok(())
    }
}

/// Surface gravity and containment
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GravityConfig {
    /// Push-out force grows by this factor per unit of penetration
    pub penetration_force_scale: f64,
    /// Penetration depth above which a corrective impulse is added
    pub impulse_depth_threshold: f64,
    pub impulse_scale: f64,
    /// Inward-velocity damping applies below radius * settle_band
    pub settle_band: f64,
    /// Damping rate (1/s) against inward velocity
    pub inward_damping: f64,
    /// Bodies beyond radius * max_distance_factor are recovered
    pub max_distance_factor: f64,
    /// Height above the surface a recovered body is placed at
    pub respawn_height: f64,
    pub max_velocity: f64,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            penetration_force_scale: 2.0,
            impulse_depth_threshold: 0.1,
            impulse_scale: 0.5,
            settle_band: 1.2,
            inward_damping: 4.0,
            max_distance_factor: 3.0,
            respawn_height: 0.5,
            max_velocity: 30.0,
        }
    }
}

impl GravityConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.penetration_force_scale.is_finite() || self.penetration_force_scale < 0.0 {
            return Err("penetration_force_scale must be finite and >= 0".to_string());
        }
        if !self.impulse_depth_threshold.is_finite() || self.impulse_depth_threshold < 0.0 {
            return Err("impulse_depth_threshold must be finite and >= 0".to_string());
        }
        if !self.settle_band.is_finite() || self.settle_band < 1.0 {
            return Err("settle_band must be finite and >= 1".to_string());
        }
        if !self.max_distance_factor.is_finite() || self.max_distance_factor <= self.settle_band {
            return Err("max_distance_factor must be finite and > settle_band".to_string());
        }
        if !self.respawn_height.is_finite() || self.respawn_height < 0.0 {
            return Err("respawn_height must be finite and >= 0".to_string());
        }
        if !self.max_velocity.is_finite() || self.max_velocity <= 0.0 {
            return Err("max_velocity must be finite and > 0".to_string());
        }
        Ok(())
    }
}

/// Everything the navigation core needs, grouped for loading as one document.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationConfig {
    pub path: PathConfig,
    pub movement: MovementConfig,
    pub rotation: RotationConfig,
    pub gravity: GravityConfig,
}

impl NavigationConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.path.validate()?;
        self.movement.validate()?;
        self.rotation.validate()?;
        self.gravity.validate()
    }
}
