use planet_shared::config::NavigationConfig;
use std::path::Path;

/// Environment variable naming an optional JSON config overlay.
pub const CONFIG_ENV: &str = "PLANET_CONFIG";

/// Server configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub tick_rate_hz: u32,
    pub broadcast_rate_hz: u32,
    pub rng_seed: u64,
    /// Autonomous bodies spawned at startup
    pub wanderer_count: usize,
    pub sphere_radius: f64,
    /// units/s² at the surface
    pub surface_gravity: f64,
    pub navigation: NavigationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            broadcast_rate_hz: 15,
            rng_seed: 42,
            wanderer_count: 4,
            sphere_radius: 15.0,
            surface_gravity: 9.81,
            navigation: NavigationConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validate configuration values. Returns an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be > 0".to_string());
        }
        if self.broadcast_rate_hz == 0 {
            return Err("broadcast_rate_hz must be > 0".to_string());
        }
        if self.broadcast_rate_hz > self.tick_rate_hz {
            return Err(format!(
                "broadcast_rate_hz ({}) must be <= tick_rate_hz ({})",
                self.broadcast_rate_hz, self.tick_rate_hz
            ));
        }
        if !self.sphere_radius.is_finite() || self.sphere_radius <= 0.0 {
            return Err("sphere_radius must be finite and > 0".to_string());
        }
        if !self.surface_gravity.is_finite() || self.surface_gravity < 0.0 {
            return Err("surface_gravity must be finite and >= 0".to_string());
        }
        self.navigation.validate()
    }

    /// Defaults overlaid with the JSON file at `path`. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        serde_json::from_str(&text).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Load from `PLANET_CONFIG` if set, otherwise defaults. Validates either way.
    pub fn load() -> Result<Self, String> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                tracing::info!("Loading config from {}", path);
                Self::from_json_file(path)?
            }
            Err(_) => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_tick_rate_rejected() {
        let config = ServerConfig {
            tick_rate_hz: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn broadcast_faster_than_tick_rejected() {
        let config = ServerConfig {
            tick_rate_hz: 30,
            broadcast_rate_hz: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_navigation_section_rejected() {
        let mut config = ServerConfig::default();
        config.navigation.movement.base_speed = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_overlays_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"wandererCount":12,"sphereRadius":40.0}"#).unwrap();
        assert_eq!(config.wanderer_count, 12);
        assert_eq!(config.sphere_radius, 40.0);
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.navigation.path.segment_count, 32);
    }

    #[test]
    fn nested_navigation_field_overlays_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"navigation":{"movement":{"baseSpeed":9.0}}}"#).unwrap();
        assert_eq!(config.navigation.movement.base_speed, 9.0);
        assert_eq!(config.navigation.movement.trail_capacity, 20);
        assert_eq!(config.tick_rate_hz, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = ServerConfig::from_json_file("/nonexistent/planet.json").unwrap_err();
        assert!(err.contains("failed to read"));
    }
}
