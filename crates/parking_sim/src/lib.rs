//! # Parking Sim
//!
//! Headless core of a parking exercise: drive a car around a lot, reverse
//! into the marked slot and hold still long enough to pass the level.
//!
//! Rendering, sound and dialogs belong to the host. The simulation talks to
//! them through the narrow traits in `drive_engine` ([`AudioSink`],
//! [`UserPrompt`], [`HudSink`]) and through the provider traits in
//! [`components`].
//!
//! [`AudioSink`]: drive_engine::audio::AudioSink
//! [`UserPrompt`]: drive_engine::ui::UserPrompt
//! [`HudSink`]: drive_engine::ui::HudSink

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod camera_rig;
pub mod components;
pub mod config;
pub mod mission;
pub mod parking_lot;
pub mod simulation;
pub mod vehicle;

pub use simulation::{Simulation, SimulationHosts, TickReport};
