//! # Drive Engine
//!
//! Game-agnostic building blocks for small vehicle simulations.
//!
//! ## Features
//!
//! - **Oriented-box collision**: separating-axis intersection and a
//!   rollback-based collision world
//! - **Camera math**: look-at views and mirrored projections
//! - **Cancellable timers**: generational handles that never fire once cancelled
//! - **Configuration**: TOML/RON backed config files with validation errors
//! - **Narrow host interfaces**: audio cues, user prompts, HUD hooks and key input
//!
//! ## Quick Start
//!
//! ```rust
//! use drive_engine::prelude::*;
//!
//! let a = OrientedBox::from_yaw(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), 0.0);
//! let b = OrientedBox::from_yaw(Vec3::new(10.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 0.0);
//! assert!(!a.intersects(&b));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod events;
pub mod physics;
pub mod render;
pub mod input;
pub mod audio;
pub mod ui;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        audio::{AudioCue, AudioSink, CueRecorder, NullAudio},
        config::{Config, ConfigError},
        events::{TimerHandle, TimerQueue},
        foundation::{
            math::{Vec3, Mat3, Mat4, Quat, Transform},
            time::{Clock, FrameTimer, ManualClock, SystemClock},
        },
        input::{ControlState, InputManager, KeyCode},
        physics::{
            Collider, ColliderClass, CollisionLayers, CollisionWorld, Contact, ContactSource,
            ImpactResponse, KinematicBody, ObstacleEntry, OrientedBox,
        },
        render::Camera,
        ui::{AckToken, HudSink, HudSnapshot, NullHud, PromptLog, UserPrompt},
    };
}
