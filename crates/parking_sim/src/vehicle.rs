//! Vehicle dynamics
//!
//! Arcade longitudinal model with a piecewise torque curve, plus
//! bicycle-model steering. Speed is in world units per nominal tick; the
//! per-tick displacement is scaled by `dt * tick_rate` so a slow frame still
//! covers the right distance.

use bitflags::bitflags;
use drive_engine::foundation::math::{constants, forward_from_yaw, Transform, Vec3};
use drive_engine::input::ControlState;
use drive_engine::physics::{KinematicBody, OrientedBox};

use crate::components::{SpawnPose, VehicleState};
use crate::config::VehicleConfig;

/// Longest frame, in nominal ticks, integrated in one step
const MAX_STEP_TICKS: f32 = 4.0;

bitflags! {
    /// Visual state derived from one tick of input
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VehicleSignals: u8 {
        /// Brake lights on
        const BRAKING = 1 << 0;
        /// Reverse lights on
        const REVERSING = 1 << 1;
    }
}

/// Driver input for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DriveInput {
    /// Accelerate forwards
    pub throttle: bool,
    /// Brake, or reverse once stopped
    pub brake: bool,
    /// Steer left
    pub steer_left: bool,
    /// Steer right
    pub steer_right: bool,
    /// Strong decay regardless of other pedals
    pub handbrake: bool,
}

impl From<&ControlState> for DriveInput {
    fn from(controls: &ControlState) -> Self {
        Self {
            throttle: controls.forward,
            brake: controls.backward,
            steer_left: controls.steer_left,
            steer_right: controls.steer_right,
            handbrake: controls.brake,
        }
    }
}

/// Result of one update
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleOutput {
    /// New world transform
    pub transform: Transform,
    /// New signed speed
    pub speed: f32,
    /// Brake and reverse light state
    pub signals: VehicleSignals,
}

/// Pose captured before an update, for collision rollback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    position: Vec3,
    heading_yaw: f32,
}

/// The player's vehicle
#[derive(Debug, Clone)]
pub struct VehicleDynamics {
    config: VehicleConfig,
    state: VehicleState,
    signals: VehicleSignals,
}

impl VehicleDynamics {
    /// Spawn a vehicle at rest on `spawn`
    pub fn new(config: VehicleConfig, spawn: &SpawnPose) -> Self {
        let mut vehicle = Self {
            config,
            state: VehicleState {
                position: spawn.position,
                heading_yaw: spawn.yaw,
                speed: 0.0,
                steering_angle: 0.0,
                stopped_frame_count: 0,
            },
            signals: VehicleSignals::empty(),
        };
        vehicle.reset_to(spawn);
        vehicle
    }

    /// Put the vehicle back on `spawn`, stopped and with straight wheels
    ///
    /// The stopped counter starts saturated so the first launch is not gated.
    pub fn reset_to(&mut self, spawn: &SpawnPose) {
        self.state.position = spawn.position;
        self.state.heading_yaw = wrap_angle(spawn.yaw);
        self.state.speed = 0.0;
        self.state.steering_angle = 0.0;
        self.state.stopped_frame_count = self.config.gear_shift_delay.saturating_add(1);
        self.signals = VehicleSignals::empty();
    }

    /// Current state
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Handling parameters
    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Signed speed
    pub fn speed(&self) -> f32 {
        self.state.speed
    }

    /// World transform
    pub fn transform(&self) -> Transform {
        self.state.transform()
    }

    /// Signals from the latest update
    pub fn signals(&self) -> VehicleSignals {
        self.signals
    }

    /// Advance one tick
    pub fn update(&mut self, input: &DriveInput, dt: f32) -> VehicleOutput {
        let step = if dt.is_finite() {
            (dt * self.config.tick_rate).clamp(0.0, MAX_STEP_TICKS)
        } else {
            0.0
        };

        let braking = self.integrate_speed(input);
        self.integrate_steering(input, step);

        let mut signals = VehicleSignals::empty();
        signals.set(VehicleSignals::BRAKING, braking);
        signals.set(VehicleSignals::REVERSING, self.state.speed < 0.0);
        self.signals = signals;

        log::trace!(
            "Vehicle speed {:.4} yaw {:.3} steer {:.3}",
            self.state.speed,
            self.state.heading_yaw,
            self.state.steering_angle
        );

        VehicleOutput {
            transform: self.transform(),
            speed: self.state.speed,
            signals,
        }
    }

    /// Longitudinal model; returns whether the vehicle is visibly braking
    fn integrate_speed(&mut self, input: &DriveInput) -> bool {
        let config = &self.config;
        let speed = self.state.speed;
        let can_launch = self.state.stopped_frame_count > config.gear_shift_delay;
        let ratio = speed.abs() / config.max_speed;
        let thrust = config.acceleration * config.torque.factor(ratio);

        // Throttle and brake together cancel out, as if neither were held.
        let throttle = input.throttle && !input.brake;
        let reverse = input.brake && !input.throttle;

        let (mut new_speed, braking) = if input.handbrake {
            (speed * config.handbrake_decay, speed != 0.0)
        } else if throttle {
            if speed < 0.0 {
                ((speed + config.brake_force).min(0.0), true)
            } else if speed > 0.0 || can_launch {
                (speed + thrust, false)
            } else {
                (speed, false)
            }
        } else if reverse {
            if speed > 0.0 {
                ((speed - config.brake_force).max(0.0), true)
            } else if speed < 0.0 || can_launch {
                (speed - thrust, false)
            } else {
                (speed, false)
            }
        } else {
            (speed * config.friction, false)
        };

        if (input.handbrake || !(throttle || reverse)) && new_speed.abs() < config.stop_threshold {
            new_speed = 0.0;
        }

        self.state.speed = new_speed.clamp(-config.max_reverse_speed, config.max_speed);
        self.state.stopped_frame_count = if self.state.speed == 0.0 {
            self.state.stopped_frame_count.saturating_add(1)
        } else {
            0
        };

        braking
    }

    /// Bicycle-model steering and position integration
    fn integrate_steering(&mut self, input: &DriveInput, step: f32) {
        let config = &self.config;
        let target = match (input.steer_left, input.steer_right) {
            (true, false) => config.max_steer_angle,
            (false, true) => -config.max_steer_angle,
            _ => 0.0,
        };
        self.state.steering_angle += (target - self.state.steering_angle) * config.steer_blend;

        let speed = self.state.speed;
        if speed == 0.0 {
            return;
        }

        let yaw_rate = speed * self.state.steering_angle.tan() / config.wheel_base * config.yaw_damping;
        self.state.heading_yaw = wrap_angle(self.state.heading_yaw + yaw_rate * step);
        self.state.position += forward_from_yaw(self.state.heading_yaw) * (speed * step);
    }
}

impl KinematicBody for VehicleDynamics {
    type Snapshot = VehicleSnapshot;

    fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            position: self.state.position,
            heading_yaw: self.state.heading_yaw,
        }
    }

    fn restore(&mut self, snapshot: &VehicleSnapshot) {
        self.state.position = snapshot.position;
        self.state.heading_yaw = snapshot.heading_yaw;
    }

    fn bounds(&self) -> OrientedBox {
        let half = self.config.half_extents;
        OrientedBox::from_yaw(
            self.state.position + Vec3::new(0.0, half.y, 0.0),
            half,
            self.state.heading_yaw,
        )
    }

    fn rebound(&mut self, restitution: f32, stop_threshold: f32) {
        let mut speed = -self.state.speed * restitution;
        if speed.abs() < stop_threshold {
            speed = 0.0;
        }
        self.state.speed = speed.clamp(-self.config.max_reverse_speed, self.config.max_speed);
        self.signals.set(VehicleSignals::REVERSING, self.state.speed < 0.0);
        if self.state.speed == 0.0 {
            self.state.stopped_frame_count = self.state.stopped_frame_count.max(1);
        } else {
            self.state.stopped_frame_count = 0;
        }
    }
}

/// Wrap an angle into `(-PI, PI]`
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + constants::PI).rem_euclid(constants::TAU) - constants::PI;
    if wrapped <= -constants::PI {
        wrapped + constants::TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TorqueCurve;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn origin() -> SpawnPose {
        SpawnPose {
            position: Vec3::zeros(),
            yaw: 0.0,
        }
    }

    fn flat_vehicle() -> VehicleDynamics {
        let config = VehicleConfig {
            torque: TorqueCurve::flat(1.0),
            ..VehicleConfig::default()
        };
        VehicleDynamics::new(config, &origin())
    }

    fn throttle() -> DriveInput {
        DriveInput {
            throttle: true,
            ..DriveInput::default()
        }
    }

    fn reverse() -> DriveInput {
        DriveInput {
            brake: true,
            ..DriveInput::default()
        }
    }

    #[test]
    fn test_accelerates_to_max_then_coasts_to_exact_zero() {
        let mut vehicle = flat_vehicle();
        let mut reached_max_at = None;
        for tick in 1..=100 {
            let out = vehicle.update(&throttle(), DT);
            if reached_max_at.is_none() && (out.speed - 0.12).abs() < 1e-6 {
                reached_max_at = Some(tick);
            }
        }
        let reached = reached_max_at.unwrap();
        assert!((58..=62).contains(&reached), "reached max at {reached}");
        assert_relative_eq!(vehicle.speed(), 0.12);

        let mut previous = vehicle.speed();
        let mut ticks = 0;
        while vehicle.speed() != 0.0 {
            vehicle.update(&DriveInput::default(), DT);
            let speed = vehicle.speed();
            if speed != 0.0 {
                assert_relative_eq!(speed, previous * 0.98, epsilon = 1e-7);
                assert!(speed >= 0.001);
            }
            previous = speed;
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(vehicle.speed(), 0.0);
    }

    #[test]
    fn test_torque_curve_shapes_launch() {
        let mut vehicle = VehicleDynamics::new(VehicleConfig::default(), &origin());
        vehicle.update(&throttle(), DT);
        assert_relative_eq!(vehicle.speed(), 0.001);

        let mut ticks = 1;
        while vehicle.speed() < 0.12 - 1e-6 && ticks < 500 {
            vehicle.update(&throttle(), DT);
            ticks += 1;
        }
        // Softer launch and falloff make the climb slower than a flat curve.
        assert!(ticks > 90, "took {ticks} ticks");
    }

    #[test]
    fn test_speed_stays_within_limits_for_any_input() {
        let mut vehicle = VehicleDynamics::new(VehicleConfig::default(), &origin());
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..5_000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let input = DriveInput {
                throttle: seed & 1 != 0,
                brake: seed & 2 != 0,
                steer_left: seed & 4 != 0,
                steer_right: seed & 8 != 0,
                handbrake: seed & 48 == 48,
            };
            let out = vehicle.update(&input, DT);
            assert!(out.speed <= 0.12 && out.speed >= -0.06, "speed {}", out.speed);
        }
    }

    #[test]
    fn test_throttle_while_reversing_brakes_to_zero_first() {
        let mut vehicle = flat_vehicle();
        for _ in 0..40 {
            vehicle.update(&reverse(), DT);
        }
        assert_relative_eq!(vehicle.speed(), -0.06);

        let out = vehicle.update(&throttle(), DT);
        assert_relative_eq!(out.speed, -0.056, epsilon = 1e-6);
        assert!(out.signals.contains(VehicleSignals::BRAKING | VehicleSignals::REVERSING));

        for _ in 0..20 {
            vehicle.update(&throttle(), DT);
        }
        assert!(vehicle.speed() >= 0.0);
    }

    #[test]
    fn test_fresh_launch_waits_for_gear_shift_delay() {
        let mut vehicle = flat_vehicle();
        for _ in 0..10 {
            vehicle.update(&throttle(), DT);
        }
        // Brake down to exactly zero.
        let mut ticks = 0;
        while vehicle.speed() > 0.0 {
            vehicle.update(&reverse(), DT);
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(vehicle.state().stopped_frame_count, 1);

        // Still held: gated for the delay, then reverses.
        for _ in 0..10 {
            let out = vehicle.update(&reverse(), DT);
            assert_eq!(out.speed, 0.0);
        }
        let out = vehicle.update(&reverse(), DT);
        assert!(out.speed < 0.0);
        assert!(out.signals.contains(VehicleSignals::REVERSING));
        assert!(!out.signals.contains(VehicleSignals::BRAKING));
    }

    #[test]
    fn test_handbrake_decays_and_snaps() {
        let mut vehicle = flat_vehicle();
        for _ in 0..60 {
            vehicle.update(&throttle(), DT);
        }
        let before = vehicle.speed();
        let handbrake = DriveInput {
            throttle: true,
            handbrake: true,
            ..DriveInput::default()
        };
        let out = vehicle.update(&handbrake, DT);
        assert_relative_eq!(out.speed, before * 0.85, epsilon = 1e-7);
        assert!(out.signals.contains(VehicleSignals::BRAKING));

        for _ in 0..60 {
            vehicle.update(&handbrake, DT);
        }
        assert_eq!(vehicle.speed(), 0.0);
        assert!(!vehicle.signals().contains(VehicleSignals::BRAKING));
    }

    #[test]
    fn test_no_turning_at_rest() {
        let mut vehicle = flat_vehicle();
        let steer = DriveInput {
            steer_left: true,
            ..DriveInput::default()
        };
        for _ in 0..30 {
            vehicle.update(&steer, DT);
        }
        assert_eq!(vehicle.state().heading_yaw, 0.0);
        assert!(vehicle.state().steering_angle > 0.0);
    }

    #[test]
    fn test_steering_is_smoothed_and_turns_left() {
        let mut vehicle = flat_vehicle();
        let input = DriveInput {
            throttle: true,
            steer_left: true,
            ..DriveInput::default()
        };
        vehicle.update(&input, DT);
        assert_relative_eq!(vehicle.state().steering_angle, 0.06, epsilon = 1e-6);

        for _ in 0..120 {
            vehicle.update(&input, DT);
        }
        assert!(vehicle.state().heading_yaw > 0.0);
        assert!(vehicle.state().position.x > 0.0);
        assert!(vehicle.state().steering_angle <= 0.6);
    }

    #[test]
    fn test_displacement_scales_with_frame_time() {
        let mut fast = flat_vehicle();
        let mut slow = flat_vehicle();
        fast.update(&throttle(), DT);
        slow.update(&throttle(), DT * 2.0);
        assert_relative_eq!(slow.state().position.z, fast.state().position.z * 2.0, epsilon = 1e-7);

        let mut stalled = flat_vehicle();
        stalled.update(&throttle(), f32::NAN);
        assert_eq!(stalled.state().position, Vec3::zeros());
    }

    #[test]
    fn test_bounds_sit_on_the_ground() {
        let vehicle = flat_vehicle();
        let bounds = vehicle.bounds();
        assert_relative_eq!(bounds.center, Vec3::new(0.0, 0.75, 0.0));
        assert_relative_eq!(bounds.half_extents, Vec3::new(0.9, 0.75, 2.1));
    }

    #[test]
    fn test_snapshot_restore_is_exact() {
        let mut vehicle = flat_vehicle();
        for _ in 0..30 {
            vehicle.update(&throttle(), DT);
        }
        let snapshot = vehicle.snapshot();
        let expected = vehicle.state().clone();
        vehicle.update(&throttle(), DT);
        vehicle.restore(&snapshot);
        assert_eq!(vehicle.state().position, expected.position);
        assert_eq!(vehicle.state().heading_yaw, expected.heading_yaw);
    }

    #[test]
    fn test_reset_clears_motion() {
        let mut vehicle = flat_vehicle();
        let input = DriveInput {
            throttle: true,
            steer_right: true,
            ..DriveInput::default()
        };
        for _ in 0..50 {
            vehicle.update(&input, DT);
        }
        let spawn = SpawnPose {
            position: Vec3::new(5.0, 0.0, 5.0),
            yaw: 1.0,
        };
        vehicle.reset_to(&spawn);
        assert_eq!(vehicle.state().position, spawn.position);
        assert_eq!(vehicle.speed(), 0.0);
        assert_eq!(vehicle.state().steering_angle, 0.0);
        assert_relative_eq!(vehicle.transform().yaw(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(constants::TAU + 0.5), 0.5, epsilon = 1e-6);
        assert_relative_eq!(wrap_angle(-constants::PI), constants::PI, epsilon = 1e-6);
    }
}
