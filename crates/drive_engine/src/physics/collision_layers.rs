//! Collision layer system for filtering collision detection
//!
//! Every static or dynamic collider belongs to exactly one class. The class
//! decides which layer bit it sits on and which restitution the vehicle
//! rebounds with.

use bitflags::bitflags;

use super::collision::OrientedBox;

bitflags! {
    /// Collision layer bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Lot borders and fences
        const WALL = 1 << 0;
        /// Static props such as pillars and barriers
        const OBSTACLE = 1 << 1;
        /// Parked cars spawned into slots
        const DUMMY_CAR = 1 << 2;
    }
}

/// What kind of thing a collider represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColliderClass {
    /// Border wall
    Wall,
    /// Static obstacle
    Obstacle,
    /// Dummy parked car
    DummyCar,
}

impl ColliderClass {
    /// Layer bit for this class
    pub fn layer(self) -> CollisionLayers {
        match self {
            Self::Wall => CollisionLayers::WALL,
            Self::Obstacle => CollisionLayers::OBSTACLE,
            Self::DummyCar => CollisionLayers::DUMMY_CAR,
        }
    }
}

/// A static collider, e.g. one border wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Class used for filtering and restitution
    pub class: ColliderClass,
    /// World-space bounds
    pub bounds: OrientedBox,
}

impl Collider {
    /// Create a collider
    pub fn new(class: ColliderClass, bounds: OrientedBox) -> Self {
        Self { class, bounds }
    }
}

/// One entry of an externally owned obstacle list
///
/// `bounds` is optional because the owner may hand over entries whose
/// geometry has not been built yet; those are skipped for the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleEntry {
    /// Class used for filtering and restitution
    pub class: ColliderClass,
    /// World-space bounds, if known
    pub bounds: Option<OrientedBox>,
    /// Dead entries are ignored
    pub alive: bool,
}

impl ObstacleEntry {
    /// Create a live entry with known bounds
    pub fn live(class: ColliderClass, bounds: OrientedBox) -> Self {
        Self {
            class,
            bounds: Some(bounds),
            alive: true,
        }
    }
}
