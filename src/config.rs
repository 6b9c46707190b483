//! Engine tuning constants.
//!
//! Every number the background's behavior depends on lives in
//! [`EngineConfig`]. The defaults reproduce the stock look; a JSON file can
//! override any subset of fields.
//!
//! ```ignore
//! let config = EngineConfig::load("background.json")?;
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityPolicy;
use crate::error::ConfigError;

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spatial grid cell size. Must be at least `link_distance` and
    /// `pointer_radius` so a 3x3 neighborhood covers every candidate.
    pub cell_size: f32,
    /// Particles closer than this are joined by a line.
    pub link_distance: f32,
    /// Line opacity at zero distance; falls off linearly to 0 at `link_distance`.
    pub link_alpha: f32,
    pub link_width: f32,
    /// Pointer repulsion radius.
    pub pointer_radius: f32,
    /// Displacement per frame at zero distance from the pointer.
    pub pointer_force: f32,
    /// Opacity gained per frame while a particle fades in.
    pub fade_step: f32,
    /// Frames arriving sooner than this after the last executed one are skipped.
    pub min_frame_interval_ms: f64,
    /// Minimum spacing between accepted pointer samples.
    pub pointer_throttle_ms: f64,
    /// Resizes smaller than this on both axes are ignored.
    pub resize_threshold: f32,
    /// Viewport area (CSS px²) per seeded particle.
    pub area_per_particle: f32,
    /// Particle cap below `wide_breakpoint`.
    pub max_particles_narrow: usize,
    /// Particle cap at or above `wide_breakpoint`.
    pub max_particles_wide: usize,
    pub wide_breakpoint: f32,
    /// Spacing of the decorative reference grid.
    pub grid_pitch: f32,
    /// How far past each viewport edge an aurora may drift before bouncing.
    pub aurora_padding: f32,
    /// Viewports this wide or narrower are classified as mobile.
    pub mobile_max_width: f32,
    pub capability_policy: CapabilityPolicy,
    /// Stop requesting frames while the host reports the surface hidden.
    pub pause_when_hidden: bool,
    /// Fixed RNG seed for reproducible layouts. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cell_size: 150.0,
            link_distance: 150.0,
            link_alpha: 0.4,
            link_width: 1.0,
            pointer_radius: 150.0,
            pointer_force: 1.5,
            fade_step: 0.01,
            min_frame_interval_ms: 12.0,
            pointer_throttle_ms: 16.0,
            resize_threshold: 20.0,
            area_per_particle: 12_000.0,
            max_particles_narrow: 40,
            max_particles_wide: 60,
            wide_breakpoint: 1280.0,
            grid_pitch: 40.0,
            aurora_padding: 200.0,
            mobile_max_width: 768.0,
            capability_policy: CapabilityPolicy::Reactive,
            pause_when_hidden: false,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Read and validate a JSON config file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON config string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_capability_policy(mut self, policy: CapabilityPolicy) -> Self {
        self.capability_policy = policy;
        self
    }

    pub fn with_pause_when_hidden(mut self, pause: bool) -> Self {
        self.pause_when_hidden = pause;
        self
    }

    /// Check ranges and the grid-coverage contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("cell_size", self.cell_size),
            ("link_distance", self.link_distance),
            ("link_width", self.link_width),
            ("pointer_radius", self.pointer_radius),
            ("fade_step", self.fade_step),
            ("area_per_particle", self.area_per_particle),
            ("grid_pitch", self.grid_pitch),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("must be a positive number, got {value}")));
            }
        }

        let non_negative = [
            ("link_alpha", self.link_alpha),
            ("pointer_force", self.pointer_force),
            ("resize_threshold", self.resize_threshold),
            ("wide_breakpoint", self.wide_breakpoint),
            ("aurora_padding", self.aurora_padding),
            ("mobile_max_width", self.mobile_max_width),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("must be zero or positive, got {value}")));
            }
        }

        if self.link_alpha > 1.0 {
            return Err(invalid("link_alpha", "must not exceed 1.0".into()));
        }
        for (field, value) in [
            ("min_frame_interval_ms", self.min_frame_interval_ms),
            ("pointer_throttle_ms", self.pointer_throttle_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("must be zero or positive, got {value}")));
            }
        }

        if self.cell_size < self.link_distance {
            return Err(invalid(
                "cell_size",
                format!(
                    "{} is smaller than link_distance {}; neighbor queries would miss links",
                    self.cell_size, self.link_distance
                ),
            ));
        }
        if self.cell_size < self.pointer_radius {
            return Err(invalid(
                "cell_size",
                format!(
                    "{} is smaller than pointer_radius {}",
                    self.cell_size, self.pointer_radius
                ),
            ));
        }
        Ok(())
    }

    /// Particle cap for a viewport of the given CSS width.
    pub fn max_particles_for(&self, width: f32) -> usize {
        if width < self.wide_breakpoint {
            self.max_particles_narrow
        } else {
            self.max_particles_wide
        }
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "pointer_force": 3.0, "seed": 7 }"#).unwrap();
        assert_eq!(config.pointer_force, 3.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.cell_size, 150.0);
        assert_eq!(config.capability_policy, CapabilityPolicy::Reactive);
    }

    #[test]
    fn test_json_round_trip() {
        let config = EngineConfig::default()
            .with_seed(42)
            .with_capability_policy(CapabilityPolicy::Once)
            .with_pause_when_hidden(true);
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_cell_smaller_than_link_rejected() {
        let config = EngineConfig {
            cell_size: 100.0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "cell_size"),
            other => panic!("expected invalid cell_size, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let config = EngineConfig {
            pointer_radius: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            min_frame_interval_ms: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_json_is_parse_error() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_max_particles_for_width() {
        let config = EngineConfig::default();
        assert_eq!(config.max_particles_for(1279.0), 40);
        assert_eq!(config.max_particles_for(1280.0), 60);
    }
}
