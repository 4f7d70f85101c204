//! Physics module for collision detection and response
//!
//! Provides oriented-box narrow-phase tests, collider classification and a
//! rollback-based collision world for a single kinematic body.

pub mod collision;
pub mod collision_layers;
pub mod collision_world;

pub use collision::OrientedBox;
pub use collision_layers::{Collider, ColliderClass, CollisionLayers, ObstacleEntry};
pub use collision_world::{CollisionWorld, Contact, ContactSource, ImpactResponse, KinematicBody};
