//! Follow camera rig
//!
//! One main camera with five viewpoints and an always-on rear-view mirror.
//! Every viewpoint is an offset and a look-at point in vehicle space, mapped
//! into the world through the vehicle transform each tick.

use drive_engine::foundation::math::{utils, Transform, Vec3};
use drive_engine::input::ControlState;
use drive_engine::render::Camera;

use crate::config::CameraConfig;

/// Main camera viewpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMode {
    /// Close behind the vehicle
    ChaseNear,
    /// Further behind and higher
    ChaseFar,
    /// Driver's seat
    FirstPerson,
    /// Looking in from the left
    LeftSide,
    /// Looking in from the right
    RightSide,
}

/// How the camera moves onto its target pose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Exponential smoothing towards the target position
    Smoothed,
    /// Jump straight to the target
    Instant,
}

/// Look-at point of a viewpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookAt {
    /// The vehicle origin
    Vehicle,
    /// A fixed point in vehicle space
    Local(Vec3),
}

/// Per-mode viewpoint definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProfile {
    /// Camera position in vehicle space
    pub offset: Vec3,
    /// Where the camera aims
    pub look_at: LookAt,
    /// Movement policy
    pub blend: Blend,
}

impl CameraMode {
    /// Primary modes in cycling order
    pub const PRIMARY: [Self; 3] = [Self::ChaseNear, Self::ChaseFar, Self::FirstPerson];

    /// Viewpoint for this mode
    pub fn profile(self) -> CameraProfile {
        match self {
            Self::ChaseNear => CameraProfile {
                offset: Vec3::new(0.0, 2.5, -5.0),
                look_at: LookAt::Vehicle,
                blend: Blend::Smoothed,
            },
            Self::ChaseFar => CameraProfile {
                offset: Vec3::new(0.0, 5.0, -10.0),
                look_at: LookAt::Vehicle,
                blend: Blend::Smoothed,
            },
            Self::FirstPerson => CameraProfile {
                offset: Vec3::new(0.0, 1.1, 0.3),
                look_at: LookAt::Local(Vec3::new(0.0, 1.0, 20.0)),
                blend: Blend::Instant,
            },
            Self::LeftSide => CameraProfile {
                offset: Vec3::new(-6.0, 2.0, 0.0),
                look_at: LookAt::Vehicle,
                blend: Blend::Instant,
            },
            Self::RightSide => CameraProfile {
                offset: Vec3::new(6.0, 2.0, 0.0),
                look_at: LookAt::Vehicle,
                blend: Blend::Instant,
            },
        }
    }

    /// Next primary mode, wrapping; side views cycle back to the first
    #[must_use]
    pub fn next_primary(self) -> Self {
        match self {
            Self::ChaseNear => Self::ChaseFar,
            Self::ChaseFar => Self::FirstPerson,
            Self::FirstPerson | Self::LeftSide | Self::RightSide => Self::ChaseNear,
        }
    }
}

/// Main and mirror cameras that follow the vehicle
#[derive(Debug, Clone)]
pub struct CameraRig {
    config: CameraConfig,
    primary_mode: CameraMode,
    active_mode: CameraMode,
    main: Camera,
    mirror: Camera,
    cycle_held: bool,
    placed: bool,
}

impl CameraRig {
    /// Create a rig in the near chase mode
    pub fn new(config: CameraConfig) -> Self {
        let main = Camera::perspective(Vec3::zeros(), config.fov_degrees, config.aspect, 0.1, 1000.0);
        let mirror = Camera::perspective(
            Vec3::zeros(),
            config.mirror_fov_degrees,
            config.mirror_aspect,
            0.1,
            1000.0,
        )
        .into_mirrored();

        Self {
            config,
            primary_mode: CameraMode::ChaseNear,
            active_mode: CameraMode::ChaseNear,
            main,
            mirror,
            cycle_held: false,
            placed: false,
        }
    }

    /// Mode chosen by cycling
    pub fn primary_mode(&self) -> CameraMode {
        self.primary_mode
    }

    /// Mode used for the latest update
    pub fn active_mode(&self) -> CameraMode {
        self.active_mode
    }

    /// Main camera
    pub fn main_camera(&self) -> &Camera {
        &self.main
    }

    /// Rear-view mirror camera
    pub fn mirror_camera(&self) -> &Camera {
        &self.mirror
    }

    /// Drop smoothing history so the next update snaps into place
    pub fn snap_next(&mut self) {
        self.placed = false;
    }

    /// Apply mode controls, then place both cameras around `vehicle`
    pub fn update(&mut self, controls: &ControlState, vehicle: &Transform) {
        if controls.cycle_camera_mode && !self.cycle_held {
            self.primary_mode = self.primary_mode.next_primary();
            log::debug!("Camera mode cycled to {:?}", self.primary_mode);
        }
        self.cycle_held = controls.cycle_camera_mode;

        self.active_mode = if controls.hold_left_view {
            CameraMode::LeftSide
        } else if controls.hold_right_view {
            CameraMode::RightSide
        } else {
            self.primary_mode
        };

        let profile = self.active_mode.profile();
        let target_position = vehicle.transform_point(profile.offset);
        let look_at = match profile.look_at {
            LookAt::Vehicle => vehicle.position,
            LookAt::Local(point) => vehicle.transform_point(point),
        };

        let position = match profile.blend {
            Blend::Smoothed if self.placed => utils::lerp_vec3(
                &self.main.position,
                &target_position,
                self.config.chase_smoothing,
            ),
            _ => target_position,
        };
        self.main.set_pose(position, look_at);
        self.placed = true;

        self.mirror.set_pose(
            vehicle.transform_point(self.config.mirror_offset),
            vehicle.transform_point(self.config.mirror_look_at),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cycle() -> ControlState {
        ControlState {
            cycle_camera_mode: true,
            ..ControlState::default()
        }
    }

    #[test]
    fn test_profiles_cover_every_mode() {
        for mode in [
            CameraMode::ChaseNear,
            CameraMode::ChaseFar,
            CameraMode::FirstPerson,
            CameraMode::LeftSide,
            CameraMode::RightSide,
        ] {
            let profile = mode.profile();
            let chase = CameraMode::PRIMARY[..2].contains(&mode);
            assert_eq!(profile.blend == Blend::Smoothed, chase, "{mode:?}");
        }
    }

    #[test]
    fn test_cycle_wraps_on_rising_edge_only() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let vehicle = Transform::identity();

        rig.update(&cycle(), &vehicle);
        assert_eq!(rig.primary_mode(), CameraMode::ChaseFar);
        rig.update(&cycle(), &vehicle);
        assert_eq!(rig.primary_mode(), CameraMode::ChaseFar);

        rig.update(&ControlState::default(), &vehicle);
        rig.update(&cycle(), &vehicle);
        rig.update(&ControlState::default(), &vehicle);
        rig.update(&cycle(), &vehicle);
        assert_eq!(rig.primary_mode(), CameraMode::ChaseNear);
    }

    #[test]
    fn test_side_view_overrides_while_held() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let vehicle = Transform::identity();
        let held = ControlState {
            hold_left_view: true,
            hold_right_view: true,
            ..ControlState::default()
        };

        rig.update(&held, &vehicle);
        assert_eq!(rig.active_mode(), CameraMode::LeftSide);
        assert_relative_eq!(rig.main_camera().position, Vec3::new(-6.0, 2.0, 0.0));
        assert_eq!(rig.primary_mode(), CameraMode::ChaseNear);

        rig.update(&ControlState::default(), &vehicle);
        assert_eq!(rig.active_mode(), CameraMode::ChaseNear);
    }

    #[test]
    fn test_chase_camera_snaps_first_then_smooths() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let controls = ControlState::default();

        rig.update(&controls, &Transform::identity());
        assert_relative_eq!(rig.main_camera().position, Vec3::new(0.0, 2.5, -5.0));

        let moved = Transform::from_position(Vec3::new(0.0, 0.0, 10.0));
        rig.update(&controls, &moved);
        assert_relative_eq!(rig.main_camera().position, Vec3::new(0.0, 2.5, -4.0), epsilon = 1e-5);
        assert_relative_eq!(rig.main_camera().target, moved.position);
    }

    #[test]
    fn test_first_person_follows_heading_instantly() {
        let mut rig = CameraRig::new(CameraConfig::default());
        rig.update(&ControlState::default(), &Transform::identity());
        rig.update(&cycle(), &Transform::identity());
        rig.update(&ControlState::default(), &Transform::identity());
        rig.update(&cycle(), &Transform::identity());
        assert_eq!(rig.active_mode(), CameraMode::FirstPerson);

        let facing_east = Transform::from_yaw(Vec3::new(3.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2);
        rig.update(&ControlState::default(), &facing_east);
        assert_relative_eq!(rig.main_camera().position, Vec3::new(3.3, 1.1, 0.0), epsilon = 1e-5);
        assert_relative_eq!(rig.main_camera().target, Vec3::new(23.0, 1.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_mirror_looks_backwards_and_is_flipped() {
        let mut rig = CameraRig::new(CameraConfig::default());
        rig.update(&ControlState::default(), &Transform::identity());

        let mirror = rig.mirror_camera();
        assert!(mirror.mirrored);
        assert!(mirror.view_direction().z < 0.0);
        assert!(rig.main_camera().get_projection_matrix()[(0, 0)] > 0.0);
        assert!(mirror.get_projection_matrix()[(0, 0)] < 0.0);

        let held = ControlState {
            hold_right_view: true,
            ..ControlState::default()
        };
        let before = mirror.clone();
        rig.update(&held, &Transform::identity());
        assert_eq!(rig.mirror_camera().position, before.position);
    }
}
