//! Game configuration
//!
//! Defaults are the tuned values; any file only needs to name what it
//! overrides. Validation rejects bad values instead of clamping them.

use std::path::Path;

use drive_engine::config::{require_positive, require_range, Config, ConfigError};
use drive_engine::foundation::math::{Vec2, Vec3};
use drive_engine::physics::ImpactResponse;
use serde::{Deserialize, Serialize};

use crate::components::SpawnPose;

/// Game configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Vehicle handling
    pub vehicle: VehicleConfig,

    /// Restitution per collider class
    pub collision: ImpactResponse,

    /// Camera rig
    pub camera: CameraConfig,

    /// Mission rules and levels
    pub mission: MissionConfig,

    /// Parking lot layout
    pub lot: LotConfig,
}

impl Config for GameConfig {}

impl GameConfig {
    /// Load `path` if it exists, otherwise fall back to the defaults
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = Self::load_from_file(path)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vehicle.validate()?;
        validate_response(&self.collision)?;
        self.camera.validate()?;
        self.mission.validate()?;
        self.lot.validate()
    }
}

fn validate_response(response: &ImpactResponse) -> Result<(), ConfigError> {
    require_range("collision.wall", response.wall, 0.0, 1.0)?;
    require_range("collision.obstacle", response.obstacle, 0.0, 1.0)?;
    require_range("collision.dummy_car", response.dummy_car, 0.0, 1.0)?;
    require_range("collision.stop_threshold", response.stop_threshold, 0.0, f32::MAX)
}

/// Piecewise torque factor over the speed ratio `|speed| / max_speed`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorqueCurve {
    /// Ratio below which the launch factor applies
    pub launch_ratio: f32,
    /// Ratio at which the falloff factor takes over
    pub falloff_ratio: f32,
    /// Factor while launching
    pub launch: f32,
    /// Factor in the mid range
    pub peak: f32,
    /// Factor near top speed
    pub falloff: f32,
}

impl Default for TorqueCurve {
    fn default() -> Self {
        Self {
            launch_ratio: 0.15,
            falloff_ratio: 0.7,
            launch: 0.5,
            peak: 1.0,
            falloff: 0.3,
        }
    }
}

impl TorqueCurve {
    /// A curve with the same factor everywhere
    pub fn flat(factor: f32) -> Self {
        Self {
            launch: factor,
            peak: factor,
            falloff: factor,
            ..Self::default()
        }
    }

    /// Factor for a speed ratio
    pub fn factor(&self, ratio: f32) -> f32 {
        if ratio < self.launch_ratio {
            self.launch
        } else if ratio < self.falloff_ratio {
            self.peak
        } else {
            self.falloff
        }
    }
}

/// Vehicle handling
///
/// Speeds and accelerations are in world units per nominal tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Forward speed limit
    pub max_speed: f32,
    /// Reverse speed limit (positive)
    pub max_reverse_speed: f32,
    /// Speed gained per tick at a torque factor of 1
    pub acceleration: f32,
    /// Speed shed per tick when braking against the direction of travel
    pub brake_force: f32,
    /// Coasting decay per tick
    pub friction: f32,
    /// Speeds below this snap to zero
    pub stop_threshold: f32,
    /// Handbrake decay per tick
    pub handbrake_decay: f32,
    /// Stationary ticks required before a fresh launch
    pub gear_shift_delay: u32,
    /// Steering lock in radians
    pub max_steer_angle: f32,
    /// Steering low-pass factor per tick
    pub steer_blend: f32,
    /// Axle distance
    pub wheel_base: f32,
    /// Multiplier on the bicycle-model yaw rate
    pub yaw_damping: f32,
    /// Ticks per second the per-tick values are tuned for
    pub tick_rate: f32,
    /// Collision box half size
    pub half_extents: Vec3,
    /// Torque factor curve
    pub torque: TorqueCurve,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: 0.12,
            max_reverse_speed: 0.06,
            acceleration: 0.002,
            brake_force: 0.004,
            friction: 0.98,
            stop_threshold: 0.001,
            handbrake_decay: 0.85,
            gear_shift_delay: 10,
            max_steer_angle: 0.6,
            steer_blend: 0.1,
            wheel_base: 2.6,
            yaw_damping: 0.6,
            tick_rate: 60.0,
            half_extents: Vec3::new(0.9, 0.75, 2.1),
            torque: TorqueCurve::default(),
        }
    }
}

impl VehicleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("vehicle.max_speed", self.max_speed)?;
        require_positive("vehicle.max_reverse_speed", self.max_reverse_speed)?;
        require_positive("vehicle.acceleration", self.acceleration)?;
        require_positive("vehicle.brake_force", self.brake_force)?;
        require_range("vehicle.friction", self.friction, 0.0, 1.0)?;
        require_positive("vehicle.stop_threshold", self.stop_threshold)?;
        require_range("vehicle.handbrake_decay", self.handbrake_decay, 0.0, 1.0)?;
        require_range("vehicle.max_steer_angle", self.max_steer_angle, 0.0, 1.5)?;
        require_blend("vehicle.steer_blend", self.steer_blend)?;
        require_positive("vehicle.wheel_base", self.wheel_base)?;
        require_positive("vehicle.yaw_damping", self.yaw_damping)?;
        require_positive("vehicle.tick_rate", self.tick_rate)?;
        for (axis, value) in ["x", "y", "z"].iter().zip(self.half_extents.iter()) {
            require_positive(&format!("vehicle.half_extents.{axis}"), *value)?;
        }
        for (name, value) in [
            ("launch", self.torque.launch),
            ("peak", self.torque.peak),
            ("falloff", self.torque.falloff),
        ] {
            require_positive(&format!("vehicle.torque.{name}"), value)?;
        }
        let TorqueCurve { launch_ratio, falloff_ratio, .. } = self.torque;
        if !launch_ratio.is_finite() || !falloff_ratio.is_finite() || launch_ratio > falloff_ratio {
            return Err(ConfigError::invalid(
                "vehicle.torque.launch_ratio",
                "must not exceed falloff_ratio",
            ));
        }
        Ok(())
    }
}

fn require_blend(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be within (0, 1], got {value}")))
    }
}

/// Camera rig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Chase-mode lerp factor per tick
    pub chase_smoothing: f32,
    /// Mirror camera offset in vehicle space
    pub mirror_offset: Vec3,
    /// Mirror camera look-at point in vehicle space
    pub mirror_look_at: Vec3,
    /// Main camera vertical field of view
    pub fov_degrees: f32,
    /// Mirror camera vertical field of view
    pub mirror_fov_degrees: f32,
    /// Main viewport aspect ratio
    pub aspect: f32,
    /// Mirror viewport aspect ratio
    pub mirror_aspect: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            chase_smoothing: 0.1,
            mirror_offset: Vec3::new(0.0, 2.2, 1.5),
            mirror_look_at: Vec3::new(0.0, 1.0, -20.0),
            fov_degrees: 75.0,
            mirror_fov_degrees: 50.0,
            aspect: 16.0 / 9.0,
            mirror_aspect: 3.0,
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_blend("camera.chase_smoothing", self.chase_smoothing)?;
        require_range("camera.fov_degrees", self.fov_degrees, 1.0, 179.0)?;
        require_range("camera.mirror_fov_degrees", self.mirror_fov_degrees, 1.0, 179.0)?;
        require_positive("camera.aspect", self.aspect)?;
        require_positive("camera.mirror_aspect", self.mirror_aspect)
    }
}

/// One mission level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Slot index to park in
    pub target_slot: usize,
    /// Probability each other slot holds a parked car
    pub density: f64,
    /// Time limit, if the level has one
    pub time_limit_secs: Option<u32>,
    /// Instruction prompt title
    pub title: String,
    /// Instruction prompt body
    pub instructions: String,
    /// Prompt shown when the level is completed
    pub completion: String,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            target_slot: 0,
            density: 0.0,
            time_limit_secs: None,
            title: String::from("Mission"),
            instructions: String::from("Park in the marked slot."),
            completion: String::from("Parked!"),
        }
    }
}

/// Mission rules and levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Max XZ distance from the slot centre
    pub zone_radius: f32,
    /// Max absolute speed that counts as stopped
    pub stopped_threshold: f32,
    /// Max angle between vehicle forward and slot outward direction
    pub facing_tolerance: f32,
    /// How long the parked pose must be held
    pub required_dwell_ms: u64,
    /// Levels, played in order and then looped
    pub levels: Vec<LevelConfig>,
    /// Seed for obstacle placement; `None` draws one from the OS
    pub seed: Option<u64>,
    /// First prompt of a session
    pub tutorial_title: String,
    /// First prompt body
    pub tutorial_body: String,
    /// Prompt title when the timer runs out
    pub timeout_title: String,
    /// Prompt body when the timer runs out
    pub timeout_body: String,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            zone_radius: 1.5,
            stopped_threshold: 0.005,
            facing_tolerance: 0.8,
            required_dwell_ms: 3000,
            levels: vec![
                LevelConfig {
                    target_slot: 5,
                    density: 0.4,
                    time_limit_secs: None,
                    title: String::from("Mission 1"),
                    instructions: String::from(
                        "Reverse into the marked slot so you face out, then hold still for 3 seconds.",
                    ),
                    completion: String::from("Mission 1 complete. Perfect parking!"),
                },
                LevelConfig {
                    target_slot: 55,
                    density: 0.7,
                    time_limit_secs: Some(60),
                    title: String::from("Mission 2"),
                    instructions: String::from(
                        "Park in the new location before time runs out!",
                    ),
                    completion: String::from("Congratulations! All missions complete."),
                },
            ],
            seed: None,
            tutorial_title: String::from("How to play"),
            tutorial_body: String::from(
                "W/S or arrows drive, A/D steer, Space brakes. C cycles the camera, \
                 hold Shift or Ctrl to look sideways, R respawns.",
            ),
            timeout_title: String::from("Time's up"),
            timeout_body: String::from("Time's up! Try the mission again."),
        }
    }
}

impl MissionConfig {
    /// Check thresholds and every level
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("mission.zone_radius", self.zone_radius)?;
        require_positive("mission.stopped_threshold", self.stopped_threshold)?;
        require_range("mission.facing_tolerance", self.facing_tolerance, 0.0, std::f32::consts::PI)?;
        if self.required_dwell_ms == 0 {
            return Err(ConfigError::invalid("mission.required_dwell_ms", "must be > 0"));
        }
        if self.levels.is_empty() {
            return Err(ConfigError::invalid("mission.levels", "at least one level is required"));
        }
        for (index, level) in self.levels.iter().enumerate() {
            let number = index + 1;
            if !(level.density.is_finite() && (0.0..=1.0).contains(&level.density)) {
                return Err(ConfigError::invalid(
                    format!("mission.levels[{number}].density"),
                    format!("must be within [0, 1], got {}", level.density),
                ));
            }
            if level.time_limit_secs == Some(0) {
                return Err(ConfigError::invalid(
                    format!("mission.levels[{number}].time_limit_secs"),
                    "must be > 0 when set",
                ));
            }
        }
        Ok(())
    }
}

/// One row of slots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowConfig {
    /// Row centre line
    pub z: f32,
    /// Outward heading of every slot in the row
    pub outward_yaw: f32,
}

/// A static box obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropConfig {
    /// Box centre
    pub center: Vec3,
    /// Box half size
    pub half_extents: Vec3,
    /// Rotation about +Y
    pub yaw: f32,
}

/// Parking lot layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotConfig {
    /// Slot rows, in slot-index order
    pub rows: Vec<RowConfig>,
    /// Slots per row
    pub slots_per_row: usize,
    /// Slot width along the row
    pub slot_width: f32,
    /// Slot depth across the row
    pub slot_depth: f32,
    /// Gap between neighbouring slots
    pub slot_gap: f32,
    /// Half size of the drivable rectangle (X, Z)
    pub playable_half_extents: Vec2,
    /// Border ring offset and wall thickness
    pub cell_size: f32,
    /// Border wall half height
    pub wall_half_height: f32,
    /// Dummy car box half size
    pub dummy_half_extents: Vec3,
    /// Static obstacles
    pub props: Vec<PropConfig>,
    /// Vehicle spawn pose
    pub spawn: SpawnPose,
}

impl Default for LotConfig {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            rows: vec![
                RowConfig { z: -24.0, outward_yaw: PI },
                RowConfig { z: -17.5, outward_yaw: 0.0 },
                RowConfig { z: 17.5, outward_yaw: PI },
                RowConfig { z: 24.0, outward_yaw: 0.0 },
            ],
            slots_per_row: 15,
            slot_width: 3.5,
            slot_depth: 6.5,
            slot_gap: 0.5,
            playable_half_extents: Vec2::new(38.0, 36.0),
            cell_size: 4.0,
            wall_half_height: 1.5,
            dummy_half_extents: Vec3::new(0.9, 0.75, 2.1),
            props: vec![
                PropConfig {
                    center: Vec3::new(0.0, 1.0, 9.0),
                    half_extents: Vec3::new(1.0, 1.0, 1.0),
                    yaw: 0.0,
                },
                PropConfig {
                    center: Vec3::new(0.0, 1.0, -9.0),
                    half_extents: Vec3::new(1.0, 1.0, 1.0),
                    yaw: 0.0,
                },
            ],
            spawn: SpawnPose::default(),
        }
    }
}

impl LotConfig {
    /// Total number of slots
    pub fn slot_count(&self) -> usize {
        self.rows.len() * self.slots_per_row
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_count() == 0 {
            return Err(ConfigError::invalid("lot.rows", "the lot needs at least one slot"));
        }
        require_positive("lot.slot_width", self.slot_width)?;
        require_positive("lot.slot_depth", self.slot_depth)?;
        require_range("lot.slot_gap", self.slot_gap, 0.0, f32::MAX)?;
        if self.dummy_half_extents.x * 2.0 > self.slot_width || self.dummy_half_extents.z * 2.0 > self.slot_depth {
            return Err(ConfigError::invalid(
                "lot.dummy_half_extents",
                format!(
                    "a {}x{} car does not fit a {}x{} slot",
                    self.dummy_half_extents.x * 2.0,
                    self.dummy_half_extents.z * 2.0,
                    self.slot_width,
                    self.slot_depth
                ),
            ));
        }
        require_positive("lot.playable_half_extents.x", self.playable_half_extents.x)?;
        require_positive("lot.playable_half_extents.y", self.playable_half_extents.y)?;
        require_positive("lot.cell_size", self.cell_size)?;
        require_positive("lot.wall_half_height", self.wall_half_height)?;
        if !self.spawn.position.iter().all(|v| v.is_finite()) || !self.spawn.yaw.is_finite() {
            return Err(ConfigError::invalid("lot.spawn", "must be finite"));
        }
        Ok(())
    }
}
