//! Game data model and the ports the simulation talks to

use drive_engine::foundation::math::{forward_from_yaw, utils, Transform, Vec2, Vec3};
use drive_engine::physics::{ObstacleEntry, OrientedBox};
use serde::{Deserialize, Serialize};

/// Physical state of the player's vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Ground-contact origin in world space
    pub position: Vec3,

    /// Heading around +Y; zero faces +Z
    pub heading_yaw: f32,

    /// Signed speed, positive forwards
    pub speed: f32,

    /// Front wheel angle, positive steers left
    pub steering_angle: f32,

    /// Consecutive ticks spent at exactly zero speed
    pub stopped_frame_count: u32,
}

impl VehicleState {
    /// World transform of the vehicle
    pub fn transform(&self) -> Transform {
        Transform::from_yaw(self.position, self.heading_yaw)
    }

    /// Unit forward direction on the ground plane
    pub fn forward_xz(&self) -> Vec2 {
        utils::xz(&forward_from_yaw(self.heading_yaw))
    }
}

/// Where and how the vehicle (re)appears
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPose {
    /// Spawn position
    pub position: Vec3,
    /// Spawn heading
    pub yaw: f32,
}

impl Default for SpawnPose {
    /// Lot entrance on the east side, facing west into the lot
    fn default() -> Self {
        Self {
            position: Vec3::new(34.0, 0.0, 0.0),
            yaw: -std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Read-only view of one parking slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkingSlot {
    /// Slot centre on the ground
    pub world_position: Vec3,
    /// Heading a correctly parked car faces (towards the aisle)
    pub outward_yaw: f32,
}

impl ParkingSlot {
    /// Outward direction on the ground plane
    pub fn outward_xz(&self) -> Vec2 {
        utils::xz(&forward_from_yaw(self.outward_yaw))
    }
}

/// Dynamic obstacles, owned outside the core
pub trait ObstacleProvider {
    /// Snapshot of obstacle entries for this tick
    fn list_active(&self) -> &[ObstacleEntry];

    /// Place a dummy car in `slot`; occupied or unknown slots are left alone
    fn spawn(&mut self, slot: usize);

    /// Remove whatever dummy car occupies `slot`
    fn despawn(&mut self, slot: usize);
}

/// Static border walls
pub trait BorderProvider {
    /// Border boxes; constant for the session
    fn list(&self) -> Vec<OrientedBox>;
}

/// Parking slots
pub trait SlotProvider {
    /// Number of slots
    fn slot_count(&self) -> usize;

    /// Slot `index`, if it exists
    fn slot(&self, index: usize) -> Option<ParkingSlot>;

    /// Mark the target slot, or clear the marker with `None`
    fn mark_target(&mut self, index: Option<usize>);
}

/// Everything the simulation needs from the parking lot
pub trait ParkingRegistry: ObstacleProvider + BorderProvider + SlotProvider {}

impl<T: ObstacleProvider + BorderProvider + SlotProvider> ParkingRegistry for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_spawn_faces_west() {
        let spawn = SpawnPose::default();
        let forward = forward_from_yaw(spawn.yaw);
        assert_relative_eq!(forward, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_slot_outward_direction() {
        let slot = ParkingSlot {
            world_position: Vec3::zeros(),
            outward_yaw: std::f32::consts::PI,
        };
        assert_relative_eq!(slot.outward_xz(), Vec2::new(0.0, -1.0), epsilon = 1e-6);
    }
}
