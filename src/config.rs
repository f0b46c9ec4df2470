//! Configuration for the Seeker core.
//!
//! Everything is loaded from one TOML file. Every section falls back to its
//! defaults, so an empty file is a valid configuration.
//!
//! ```toml
//! [robot]
//! wheel_radius = 0.033
//! axle_length = 0.160
//!
//! [mapping]
//! confirm_threshold = 5
//!
//! [navigation]
//! mline_tolerance = 0.05
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::Path;

/// Differential drive geometry and actuator limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Wheel radius, metres
    pub wheel_radius: f64,
    /// Distance between the wheels, metres
    pub axle_length: f64,
    /// Wheel angular speed limit, rad/s
    pub max_wheel_speed: f64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig {
            wheel_radius: 0.033,
            axle_length: 0.160,
            max_wheel_speed: 6.28,
        }
    }
}

/// Range sensor description (used by the simulator and for defaults)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarConfig {
    pub beams: usize,
    /// Field of view, radians. `2*pi` means a full circle.
    pub fov: f64,
    pub min_range: f64,
    pub max_range: f64,
}

impl Default for LidarConfig {
    fn default() -> Self {
        LidarConfig {
            beams: 360,
            fov: TAU,
            min_range: 0.12,
            max_range: 3.5,
        }
    }
}

/// Odometry integration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Flip the sign of the heading sensor before it overrides theta
    pub invert_heading: bool,
    /// Encoder wrap period in radians, if the encoders roll over
    pub encoder_wrap: Option<f64>,
}

impl Default for PoseConfig {
    fn default() -> Self {
        PoseConfig {
            invert_heading: false,
            encoder_wrap: None,
        }
    }
}

/// Wheel-slip detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlipConfig {
    pub enabled: bool,
    /// Returns shorter than this count as "blocked", metres
    pub short_range: f64,
    /// Minimum fraction of valid returns that must be short
    pub short_fraction: f64,
    /// Minimum angular span covered by the short returns, radians
    pub min_span: f64,
    /// Mean absolute scan change below which the scan counts as unchanged, metres
    pub max_scan_change: f64,
    /// Wheel travel above which the wheels count as moving, metres
    pub min_wheel_travel: f64,
    /// Consecutive suspect cycles before the guard activates
    pub debounce_cycles: u32,
}

impl Default for SlipConfig {
    fn default() -> Self {
        SlipConfig {
            enabled: true,
            short_range: 0.12,
            short_fraction: 0.25,
            min_span: FRAC_PI_2,
            max_scan_change: 0.005,
            min_wheel_travel: 0.002,
            debounce_cycles: 3,
        }
    }
}

/// Scan-to-map pose correction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanMatchConfig {
    pub enabled: bool,
    /// Run every `interval` ticks
    pub interval: u32,
    /// Known cells required before matching starts
    pub min_known_cells: usize,
    /// |log-odds| at which a cell counts as known
    pub known_log_odds: f64,
    /// Use every `stride`-th return
    pub stride: usize,
    /// Candidate translation step, metres
    pub step_xy: f64,
    /// Candidate rotation step, radians
    pub step_theta: f64,
    /// Best score must exceed this
    pub min_score: f64,
    /// Translational corrections at or above this are rejected, metres
    pub max_correction: f64,
    /// Fraction of the accepted offset applied to the odometry pose
    pub blend: f64,
}

impl Default for ScanMatchConfig {
    fn default() -> Self {
        ScanMatchConfig {
            enabled: true,
            interval: 5,
            min_known_cells: 50,
            known_log_odds: 0.5,
            stride: 4,
            step_xy: 0.05,
            step_theta: 3.0_f64.to_radians(),
            min_score: 0.5,
            max_correction: 0.10,
            blend: 0.15,
        }
    }
}

/// Occupancy grid parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Side length of the square mapped region, metres
    pub size_m: f64,
    pub cells_per_meter: f64,
    pub log_odds_min: f64,
    pub log_odds_max: f64,
    /// Added to cells a beam passes through (negative)
    pub log_odds_free: f64,
    /// Added to confirmed hit cells (positive)
    pub log_odds_occupied: f64,
    /// Cells at or above this are never cleared by a passing beam
    pub strong_occupied: f64,
    /// Hits needed before a cell accumulates occupied evidence
    pub confirm_threshold: u16,
    /// Log-odds above which a confirmed cell reports as occupied
    pub occupied_log_odds: f64,
    /// Global per-update decay factor
    pub decay: f64,
    /// Extra decay for positive cells below `weak_band`
    pub weak_decay: f64,
    /// Extra decay for cells in [weak_band, strong_occupied)
    pub medium_decay: f64,
    pub weak_band: f64,
    /// Radius around the robot cleared every update, metres
    pub footprint_radius: f64,
    pub footprint_free: f64,
    /// Returns at or beyond this fraction of max range carry no hit
    pub no_hit_fraction: f64,
    /// Returns at or below this are ignored, metres
    pub min_valid_range: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            size_m: 20.0,
            cells_per_meter: 10.0,
            log_odds_min: -8.0,
            log_odds_max: 8.0,
            log_odds_free: -0.7,
            log_odds_occupied: 0.6,
            strong_occupied: 2.0,
            confirm_threshold: 3,
            occupied_log_odds: 0.4,
            decay: 0.9997,
            weak_decay: 0.995,
            medium_decay: 0.999,
            weak_band: 1.0,
            footprint_radius: 0.12,
            footprint_free: -0.2,
            no_hit_fraction: 0.98,
            min_valid_range: 0.05,
        }
    }
}

/// Bug2 navigation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub goal_tolerance: f64,
    pub obstacle_distance: f64,
    pub clearance_distance: f64,
    pub mline_tolerance: f64,
    /// Polar controller gains
    pub k_rho: f64,
    pub k_alpha: f64,
    pub k_beta: f64,
    /// Desired side range while wall following, metres
    pub wall_standoff: f64,
    /// Proportional gain on the standoff error, (rad/s)/m
    pub k_wall: f64,
    /// Wheel speed while wall following, rad/s
    pub wall_base_speed: f64,
    /// Wheel speed of the in-place escape turn, rad/s
    pub wall_turn_speed: f64,
    /// Front range below which the wall follower turns in place, metres
    pub front_min_distance: f64,
    /// Half width of the front cone used for `front_min_distance`, radians
    pub front_half_angle: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            goal_tolerance: 0.20,
            obstacle_distance: 0.25,
            clearance_distance: 0.35,
            mline_tolerance: 0.08,
            k_rho: 0.5,
            k_alpha: 1.5,
            k_beta: -0.3,
            wall_standoff: 0.15,
            k_wall: 12.0,
            wall_base_speed: 2.0,
            wall_turn_speed: 2.0,
            front_min_distance: 0.2,
            front_half_angle: 20.0_f64.to_radians(),
        }
    }
}

/// Complete core configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub robot: RobotConfig,
    pub lidar: LidarConfig,
    pub pose: PoseConfig,
    pub slip: SlipConfig,
    pub scan_match: ScanMatchConfig,
    pub mapping: MappingConfig,
    pub navigation: NavigationConfig,
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, "must be positive"))
    }
}

fn unit_factor(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, "must be in (0, 1]"))
    }
}

impl CoreConfig {
    /// Load and validate a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("robot.wheel_radius", self.robot.wheel_radius)?;
        positive("robot.axle_length", self.robot.axle_length)?;
        positive("robot.max_wheel_speed", self.robot.max_wheel_speed)?;

        if self.lidar.beams < 3 {
            return Err(ConfigError::invalid("lidar.beams", "need at least 3 beams"));
        }
        if !(self.lidar.fov > 0.0 && self.lidar.fov <= TAU) {
            return Err(ConfigError::invalid("lidar.fov", "must be in (0, 2*pi]"));
        }
        if self.lidar.max_range <= self.lidar.min_range {
            return Err(ConfigError::invalid("lidar.max_range", "must exceed min_range"));
        }

        if let Some(period) = self.pose.encoder_wrap {
            positive("pose.encoder_wrap", period)?;
        }

        if self.slip.debounce_cycles == 0 {
            return Err(ConfigError::invalid("slip.debounce_cycles", "must be at least 1"));
        }

        if self.scan_match.interval == 0 {
            return Err(ConfigError::invalid("scan_match.interval", "must be at least 1"));
        }
        if self.scan_match.stride == 0 {
            return Err(ConfigError::invalid("scan_match.stride", "must be at least 1"));
        }
        unit_factor("scan_match.blend", self.scan_match.blend)?;

        self.mapping.validate()?;
        self.navigation.validate()?;
        Ok(())
    }
}

impl MappingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mapping.size_m", self.size_m)?;
        positive("mapping.cells_per_meter", self.cells_per_meter)?;
        if self.log_odds_min >= 0.0 || self.log_odds_max <= 0.0 {
            return Err(ConfigError::invalid(
                "mapping.log_odds_min",
                "clamp bounds must straddle zero",
            ));
        }
        if self.log_odds_free >= 0.0 {
            return Err(ConfigError::invalid("mapping.log_odds_free", "must be negative"));
        }
        if self.footprint_free > 0.0 {
            return Err(ConfigError::invalid("mapping.footprint_free", "must not be positive"));
        }
        positive("mapping.log_odds_occupied", self.log_odds_occupied)?;
        if self.confirm_threshold == 0 {
            return Err(ConfigError::invalid("mapping.confirm_threshold", "must be at least 1"));
        }
        unit_factor("mapping.decay", self.decay)?;
        unit_factor("mapping.weak_decay", self.weak_decay)?;
        unit_factor("mapping.medium_decay", self.medium_decay)?;
        unit_factor("mapping.no_hit_fraction", self.no_hit_fraction)?;
        if self.weak_band > self.strong_occupied {
            return Err(ConfigError::invalid(
                "mapping.weak_band",
                "must not exceed strong_occupied",
            ));
        }
        Ok(())
    }
}

impl NavigationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("navigation.goal_tolerance", self.goal_tolerance)?;
        positive("navigation.obstacle_distance", self.obstacle_distance)?;
        positive("navigation.mline_tolerance", self.mline_tolerance)?;
        positive("navigation.k_rho", self.k_rho)?;
        positive("navigation.wall_standoff", self.wall_standoff)?;
        positive("navigation.wall_base_speed", self.wall_base_speed)?;
        positive("navigation.front_min_distance", self.front_min_distance)?;
        if self.clearance_distance <= self.obstacle_distance {
            return Err(ConfigError::invalid(
                "navigation.clearance_distance",
                "must exceed obstacle_distance",
            ));
        }
        Ok(())
    }
}
