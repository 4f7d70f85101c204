//! Narrow-phase collision geometry
//!
//! # Key Types
//!
//! - [`OrientedBox`] - Yaw-rotated world-space box with a separating-axis test
//!
//! Obstacle counts in a parking lot are small, so there is no broad phase;
//! callers scan their colliders linearly.

pub mod oriented_box;

pub use oriented_box::OrientedBox;
