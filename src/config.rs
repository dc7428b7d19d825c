//! Engine configuration.
//!
//! Every tunable of the effect lives here. Configs are built in code with the
//! `with_*` chain or loaded from a TOML file; missing keys fall back to the
//! defaults, so a file only needs the values it changes.
//!
//! ```toml
//! [spawn]
//! branches = 7
//! spawn_interval = 0.6
//!
//! [render]
//! plane_size = 2.0
//!
//! [textures]
//! dir = "assets/creations"
//! count = 12
//! ```

use crate::error::{ConfigError, MandalaError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Spawn cadence and per-plane animation tunables.
///
/// The radius curve is the one piece of real design here: per frame a plane's
/// radius moves by
///
/// ```text
/// radius_growth_rate * (passed * radius_decay_rate) - (passed * radius_decay_shape)^2
/// ```
///
/// which is a small outward drift while `passed` is small and an accelerating
/// collapse afterwards. The constants are tuning, the shape is the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Planes per burst, evenly spaced around the circle.
    pub branches: u32,
    /// Seconds between bursts.
    pub spawn_interval: f32,
    /// Radius every plane starts at.
    pub start_radius: f32,
    /// Scale of a plane sitting at `start_radius`.
    pub base_scale: f32,
    /// Opacity before the first update.
    pub base_opacity: f32,
    /// Weight of the linear growth term.
    pub radius_growth_rate: f32,
    /// Time factor inside the linear growth term.
    pub radius_decay_rate: f32,
    /// Time factor inside the quadratic collapse term.
    pub radius_decay_shape: f32,
    /// Opacity ceiling.
    pub max_opacity: f32,
    /// Opacity gained per second of age.
    pub opacity_ramp_rate: f32,
    /// Planes at or below this radius are retired.
    pub removal_threshold: f32,
    /// Fire one burst on the very first frame instead of waiting a full interval.
    pub initial_burst: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            branches: 5,
            spawn_interval: 0.8,
            start_radius: 15.0,
            base_scale: 3.0,
            base_opacity: 0.5,
            radius_growth_rate: 0.23,
            radius_decay_rate: 0.09,
            radius_decay_shape: 0.1,
            max_opacity: 0.7,
            opacity_ramp_rate: 0.2,
            removal_threshold: 1.5,
            initial_burst: false,
        }
    }
}

impl SpawnConfig {
    /// Create a config with the default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of planes per burst.
    pub fn with_branches(mut self, branches: u32) -> Self {
        self.branches = branches;
        self
    }

    /// Set the seconds between bursts.
    pub fn with_spawn_interval(mut self, seconds: f32) -> Self {
        self.spawn_interval = seconds;
        self
    }

    /// Set the starting radius of every plane.
    pub fn with_start_radius(mut self, radius: f32) -> Self {
        self.start_radius = radius;
        self
    }

    /// Set the scale at the starting radius.
    pub fn with_base_scale(mut self, scale: f32) -> Self {
        self.base_scale = scale;
        self
    }

    /// Set the opacity before the first update.
    pub fn with_base_opacity(mut self, opacity: f32) -> Self {
        self.base_opacity = opacity;
        self
    }

    /// Set the three constants of the radius curve.
    pub fn with_radius_curve(mut self, growth_rate: f32, decay_rate: f32, decay_shape: f32) -> Self {
        self.radius_growth_rate = growth_rate;
        self.radius_decay_rate = decay_rate;
        self.radius_decay_shape = decay_shape;
        self
    }

    /// Set the opacity ramp (per second) and ceiling.
    pub fn with_opacity_ramp(mut self, ramp_rate: f32, max_opacity: f32) -> Self {
        self.opacity_ramp_rate = ramp_rate;
        self.max_opacity = max_opacity;
        self
    }

    /// Set the radius at or below which planes are retired.
    pub fn with_removal_threshold(mut self, threshold: f32) -> Self {
        self.removal_threshold = threshold;
        self
    }

    /// Fire a burst on the first frame.
    pub fn with_initial_burst(mut self, enabled: bool) -> Self {
        self.initial_burst = enabled;
        self
    }

    /// Reject configurations the per-frame math is not total over.
    ///
    /// A non-positive interval would spawn every frame without bound, and a
    /// non-positive collapse term would let planes drift outward forever.
    pub fn validate(&self) -> Result<(), MandalaError> {
        let fields = [
            ("spawn_interval", self.spawn_interval),
            ("start_radius", self.start_radius),
            ("base_scale", self.base_scale),
            ("base_opacity", self.base_opacity),
            ("radius_growth_rate", self.radius_growth_rate),
            ("radius_decay_rate", self.radius_decay_rate),
            ("radius_decay_shape", self.radius_decay_shape),
            ("max_opacity", self.max_opacity),
            ("opacity_ramp_rate", self.opacity_ramp_rate),
            ("removal_threshold", self.removal_threshold),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(MandalaError::InvalidConfig(format!("{name} must be finite, got {value}")));
        }
        if self.spawn_interval <= 0.0 {
            return Err(MandalaError::InvalidConfig(format!(
                "spawn_interval must be positive, got {}",
                self.spawn_interval
            )));
        }
        if self.start_radius <= 0.0 {
            return Err(MandalaError::InvalidConfig(format!(
                "start_radius must be positive, got {}",
                self.start_radius
            )));
        }
        if self.branches == 0 {
            return Err(MandalaError::InvalidConfig("branches must be at least 1".into()));
        }
        if self.radius_decay_shape <= 0.0 {
            return Err(MandalaError::InvalidConfig(format!(
                "radius_decay_shape must be positive, got {}",
                self.radius_decay_shape
            )));
        }
        // Opacity must ramp up from zero and never fall
        if self.opacity_ramp_rate < 0.0 {
            return Err(MandalaError::InvalidConfig(format!(
                "opacity_ramp_rate must not be negative, got {}",
                self.opacity_ramp_rate
            )));
        }
        if self.max_opacity < 0.0 {
            return Err(MandalaError::InvalidConfig(format!(
                "max_opacity must not be negative, got {}",
                self.max_opacity
            )));
        }
        Ok(())
    }

    /// Radius change applied on a frame where the plane is `passed` seconds old.
    #[inline]
    pub fn radius_step(&self, passed: f32) -> f32 {
        let collapse = passed * self.radius_decay_shape;
        self.radius_growth_rate * (passed * self.radius_decay_rate) - collapse * collapse
    }

    /// Opacity of a plane `passed` seconds old.
    #[inline]
    pub fn opacity_at(&self, passed: f32) -> f32 {
        (passed * self.opacity_ramp_rate).min(self.max_opacity)
    }

    /// Scale of a plane currently at `radius`.
    #[inline]
    pub fn scale_for(&self, radius: f32) -> f32 {
        let t = radius / self.start_radius;
        self.base_scale * t * t
    }

    /// Age after which [`radius_step`](Self::radius_step) is negative.
    ///
    /// Past this point every update moves the plane inward by a growing amount.
    pub fn decay_crossover(&self) -> f32 {
        let shape = self.radius_decay_shape * self.radius_decay_shape;
        self.radius_growth_rate * self.radius_decay_rate / shape
    }

    /// Angle of arm `index` within a burst, in radians.
    #[inline]
    pub fn arm_angle(&self, index: u32) -> f32 {
        (index as f32 / self.branches as f32) * std::f32::consts::TAU
    }
}

/// Scene and camera settings used by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Edge length of the unit plane before per-plane scaling.
    pub plane_size: f32,
    /// Height of the flower below the orbit target.
    pub plane_height: f32,
    /// Texels with alpha below this are discarded.
    pub alpha_cutoff: f32,
    /// Background colour (linear RGB).
    pub clear_color: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Initial distance of the camera from the orbit target.
    pub camera_distance: f32,
    /// Fraction of orbit velocity removed each frame.
    pub damping: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            plane_size: 1.5,
            plane_height: -5.0,
            alpha_cutoff: 0.1,
            clear_color: [0.0, 0.0, 0.0],
            fov_degrees: 75.0,
            near: 0.01,
            far: 1000.0,
            camera_distance: 20.0,
            damping: 0.05,
        }
    }
}

/// Where the image pool comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSourceConfig {
    /// Directory holding `1.<ext>` through `<count>.<ext>`.
    pub dir: PathBuf,
    /// Number of numbered images to load. `0` loads every image in `dir`.
    pub count: u32,
    /// File extension of the numbered images.
    pub extension: String,
}

impl Default for TextureSourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("creations"),
            count: 24,
            extension: "png".into(),
        }
    }
}

/// Full configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MandalaConfig {
    /// Spawn and lifecycle tuning.
    pub spawn: SpawnConfig,
    /// Scene and camera.
    pub render: RenderConfig,
    /// Image pool.
    pub textures: TextureSourceConfig,
}

impl MandalaConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Write this config to disk as pretty TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(SpawnConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = SpawnConfig::new().with_spawn_interval(0.0).validate().unwrap_err();
        assert!(matches!(err, MandalaError::InvalidConfig(_)));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let err = SpawnConfig::new().with_start_radius(-1.0).validate().unwrap_err();
        assert!(matches!(err, MandalaError::InvalidConfig(msg) if msg.contains("start_radius")));
    }

    #[test]
    fn test_nan_rejected() {
        let cfg = SpawnConfig::new().with_opacity_ramp(f32::NAN, 0.7);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_branches_rejected() {
        assert!(SpawnConfig::new().with_branches(0).validate().is_err());
    }

    #[test]
    fn test_flat_collapse_rejected() {
        let cfg = SpawnConfig::new().with_radius_curve(0.23, 0.09, 0.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_negative_opacity_ramp_rejected() {
        let err = SpawnConfig::new().with_opacity_ramp(-0.2, 0.7).validate().unwrap_err();
        assert!(matches!(err, MandalaError::InvalidConfig(msg) if msg.contains("opacity_ramp_rate")));

        let err = SpawnConfig::new().with_opacity_ramp(0.2, -0.1).validate().unwrap_err();
        assert!(matches!(err, MandalaError::InvalidConfig(msg) if msg.contains("max_opacity")));

        // A zero ramp keeps planes invisible but never lets opacity fall
        assert!(SpawnConfig::new().with_opacity_ramp(0.0, 0.7).validate().is_ok());
    }

    #[test]
    fn test_radius_step_shape() {
        let cfg = SpawnConfig::default();
        assert_eq!(cfg.radius_step(0.0), 0.0);
        // Small outward drift early on
        assert!(cfg.radius_step(0.5) > 0.0);
        // Inward after the crossover, and faster the older the plane
        let crossover = cfg.decay_crossover();
        assert!((crossover - 2.07).abs() < 1e-3);
        assert!(cfg.radius_step(crossover + 0.5) < 0.0);
        assert!(cfg.radius_step(crossover + 2.0) < cfg.radius_step(crossover + 1.0));
    }

    #[test]
    fn test_opacity_saturates() {
        let cfg = SpawnConfig::default();
        assert_eq!(cfg.opacity_at(0.0), 0.0);
        assert!((cfg.opacity_at(1.0) - 0.2).abs() < 1e-6);
        assert_eq!(cfg.opacity_at(10.0), 0.7);
    }

    #[test]
    fn test_scale_is_quadratic() {
        let cfg = SpawnConfig::default();
        assert_eq!(cfg.scale_for(15.0), 3.0);
        assert!((cfg.scale_for(7.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_arm_angles() {
        let cfg = SpawnConfig::new().with_branches(4);
        assert_eq!(cfg.arm_angle(0), 0.0);
        assert!((cfg.arm_angle(1) - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((cfg.arm_angle(3) - 3.0 * std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = MandalaConfig::from_toml_str(
            r#"
            [spawn]
            branches = 7

            [textures]
            count = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.spawn.branches, 7);
        assert_eq!(cfg.spawn.spawn_interval, 0.8);
        assert_eq!(cfg.textures.count, 3);
        assert_eq!(cfg.textures.extension, "png");
        assert_eq!(cfg.render, RenderConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut cfg = MandalaConfig::default();
        cfg.spawn.initial_burst = true;
        cfg.render.clear_color = [0.1, 0.2, 0.3];
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(MandalaConfig::from_toml_str(&text).unwrap(), cfg);
    }

    fn temp_config_path(name: &str) -> PathBuf {
        let id = std::process::id();
        std::env::temp_dir().join(format!("mandala_{name}_{id}.toml"))
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_config_path("round_trip");
        let mut cfg = MandalaConfig::default();
        cfg.spawn.branches = 9;
        cfg.render.plane_size = 2.5;
        cfg.textures.count = 0;

        cfg.save(&path).unwrap();
        let loaded = MandalaConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_missing_file() {
        let path = temp_config_path("missing");
        std::fs::remove_file(&path).ok();
        let err = MandalaConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_bad_toml() {
        let err = MandalaConfig::from_toml_str("[spawn]\nbranches = \"five\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
