//! Mission controller
//!
//! Runs the level loop: tutorial, instructions, driving, dwelling in the
//! target slot, then a completion or time-out prompt. Phase changes that
//! wait on the player are gated by an [`AckToken`]; the host hands the token
//! back through [`MissionController::acknowledge`] when the prompt closes.
//!
//! The level timer is a recurring one-second [`TimerQueue`] entry polled from
//! [`MissionController::check`], so it shares the frame loop's thread.

use drive_engine::config::ConfigError;
use drive_engine::events::{TimerHandle, TimerQueue};
use drive_engine::foundation::math::utils;
use drive_engine::ui::{AckToken, HudSink, UserPrompt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::components::{ParkingRegistry, SpawnPose};
use crate::config::{LevelConfig, MissionConfig};
use crate::vehicle::VehicleDynamics;

const TIMER_PERIOD_MS: u64 = 1_000;

/// Mission setup errors
#[derive(Error, Debug)]
pub enum MissionError {
    /// Rejected configuration value
    #[error("Invalid mission configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A level targets a slot the lot does not have
    #[error("Level {level} targets slot {slot}, but the lot has {slot_count} slots")]
    TargetOutOfRange {
        /// 1-based level
        level: usize,
        /// Requested slot
        slot: usize,
        /// Slots available
        slot_count: usize,
    },

    /// No levels configured
    #[error("At least one level is required")]
    NoLevels,

    /// Level number outside the configured list
    #[error("Unknown level {0}")]
    UnknownLevel(usize),
}

/// Where the mission is; levels are 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionPhase {
    /// Waiting for the tutorial prompt to be dismissed
    AwaitingTutorial,
    /// Level set up, instructions on screen
    Instructing(usize),
    /// Driving
    Active(usize),
    /// Parked correctly, dwell clock running
    Dwelling(usize),
    /// Level won, completion prompt on screen
    Completed(usize),
    /// Timer ran out, retry prompt on screen
    TimedOut(usize),
}

impl MissionPhase {
    /// Level the phase belongs to
    pub fn level(self) -> Option<usize> {
        match self {
            Self::AwaitingTutorial => None,
            Self::Instructing(level)
            | Self::Active(level)
            | Self::Dwelling(level)
            | Self::Completed(level)
            | Self::TimedOut(level) => Some(level),
        }
    }
}

/// Level outcome reported by [`MissionController::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionEvent {
    /// Dwell held long enough
    Completed(usize),
    /// Timer reached zero
    TimedOut(usize),
}

/// Target marker state, for slot highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFeedback {
    /// Not in the slot
    #[default]
    Idle,
    /// In the slot but facing the wrong way
    WrongHeading,
    /// Parked correctly
    Holding,
}

/// Collaborators the controller touches during a call
pub struct MissionContext<'a> {
    /// Player vehicle, if it has spawned
    pub vehicle: Option<&'a mut VehicleDynamics>,
    /// Slots and dummy cars
    pub registry: &'a mut dyn ParkingRegistry,
    /// Modal prompts
    pub prompt: &'a mut dyn UserPrompt,
    /// HUD text
    pub hud: &'a mut dyn HudSink,
}

/// Level, dwell and timer state machine
#[derive(Debug)]
pub struct MissionController {
    config: MissionConfig,
    spawn: SpawnPose,
    phase: MissionPhase,
    dwell_start_ms: Option<u64>,
    remaining_secs: Option<u32>,
    timers: TimerQueue<()>,
    timer: Option<TimerHandle>,
    pending_ack: Option<AckToken>,
    next_token: AckToken,
    feedback: TargetFeedback,
    rng: StdRng,
}

impl MissionController {
    /// Validate `config` against a lot with `slot_count` slots
    pub fn new(config: MissionConfig, spawn: SpawnPose, slot_count: usize) -> Result<Self, MissionError> {
        if config.levels.is_empty() {
            return Err(MissionError::NoLevels);
        }
        config.validate()?;
        for (index, level) in config.levels.iter().enumerate() {
            if level.target_slot >= slot_count {
                return Err(MissionError::TargetOutOfRange {
                    level: index + 1,
                    slot: level.target_slot,
                    slot_count,
                });
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            spawn,
            phase: MissionPhase::AwaitingTutorial,
            dwell_start_ms: None,
            remaining_secs: None,
            timers: TimerQueue::new(),
            timer: None,
            pending_ack: None,
            next_token: AckToken(1),
            feedback: TargetFeedback::Idle,
            rng,
        })
    }

    /// Current phase
    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    /// When the current dwell started
    pub fn dwell_start_ms(&self) -> Option<u64> {
        self.dwell_start_ms
    }

    /// Seconds left on the level timer
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_secs
    }

    /// Whether a level timer is scheduled
    pub fn timer_active(&self) -> bool {
        self.timer.is_some_and(|handle| self.timers.is_active(handle))
    }

    /// Number of scheduled timers
    pub fn scheduled_timers(&self) -> usize {
        self.timers.active_count()
    }

    /// Token the current prompt expects
    pub fn pending_ack(&self) -> Option<AckToken> {
        self.pending_ack
    }

    /// Target marker state from the latest check
    pub fn feedback(&self) -> TargetFeedback {
        self.feedback
    }

    /// Mission rules
    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// Show the tutorial prompt; does nothing once the tutorial is past
    pub fn open_tutorial(&mut self, prompt: &mut dyn UserPrompt) {
        if self.phase != MissionPhase::AwaitingTutorial || self.pending_ack.is_some() {
            return;
        }
        let title = self.config.tutorial_title.clone();
        let body = self.config.tutorial_body.clone();
        self.show(prompt, &title, &body);
    }

    /// Advance past the prompt `token` was issued for
    ///
    /// Returns false for a token that is not the current one.
    pub fn acknowledge(&mut self, token: AckToken, now_ms: u64, ctx: &mut MissionContext<'_>) -> bool {
        if self.pending_ack != Some(token) {
            log::debug!("Ignoring stale acknowledgement {token:?}");
            return false;
        }
        self.pending_ack = None;

        match self.phase {
            MissionPhase::AwaitingTutorial => self.enter_level(1, ctx),
            MissionPhase::Instructing(level) => self.activate(level, now_ms, ctx.hud),
            MissionPhase::Completed(level) => self.enter_level(self.next_level(level), ctx),
            MissionPhase::TimedOut(level) => self.enter_level(level, ctx),
            MissionPhase::Active(_) | MissionPhase::Dwelling(_) => {}
        }
        true
    }

    /// Abandon the current level and set up `level` from scratch
    pub fn jump_to_level(&mut self, level: usize, ctx: &mut MissionContext<'_>) -> Result<(), MissionError> {
        if level == 0 || level > self.config.levels.len() {
            return Err(MissionError::UnknownLevel(level));
        }
        self.enter_level(level, ctx);
        Ok(())
    }

    /// Start the level timer, replacing any running one
    pub fn start_timer(&mut self, seconds: u32, now_ms: u64, hud: &mut dyn HudSink) {
        if let Some(handle) = self.timer.take() {
            self.timers.cancel(handle);
        }
        self.timers.update_time(now_ms);
        self.timer = Some(self.timers.start(TIMER_PERIOD_MS, ()));
        self.remaining_secs = Some(seconds);
        hud.timer_text(Some(seconds));
    }

    /// Cancel the level timer and hide it
    pub fn stop_timer(&mut self, hud: &mut dyn HudSink) {
        if let Some(handle) = self.timer.take() {
            self.timers.cancel(handle);
        }
        self.remaining_secs = None;
        hud.timer_text(None);
    }

    /// Discard dwell progress, e.g. after the vehicle was moved by hand
    pub fn reset_dwell(&mut self, hud: &mut dyn HudSink) {
        self.clear_dwell(hud);
        if let MissionPhase::Dwelling(level) = self.phase {
            self.phase = MissionPhase::Active(level);
        }
    }

    /// Per-tick update: run due timer fires, then the parking check
    pub fn check(&mut self, now_ms: u64, ctx: &mut MissionContext<'_>) -> Option<MissionEvent> {
        self.timers.update_time(now_ms);
        while let Some((handle, ())) = self.timers.pop_due() {
            if self.timer != Some(handle) {
                self.timers.cancel(handle);
                continue;
            }
            if let Some(event) = self.on_timer_fire(ctx) {
                return Some(event);
            }
        }

        let level = match self.phase {
            MissionPhase::Active(level) | MissionPhase::Dwelling(level) => level,
            _ => return None,
        };
        // A tick without a vehicle or target can't count towards the dwell.
        if self.evaluate(level, ctx) != Some(true) {
            if self.dwell_start_ms.take().is_some() {
                log::debug!("Dwell interrupted");
                ctx.hud.dwell_countdown(None);
            }
            self.phase = MissionPhase::Active(level);
            return None;
        }

        let start = *self.dwell_start_ms.get_or_insert(now_ms);
        if self.phase == MissionPhase::Active(level) {
            log::debug!("Dwell started at {start} ms");
            self.phase = MissionPhase::Dwelling(level);
        }

        let elapsed = now_ms.saturating_sub(start);
        let required = self.config.required_dwell_ms;
        if elapsed >= required {
            self.conclude(MissionEvent::Completed(level), ctx);
            return Some(MissionEvent::Completed(level));
        }

        let left_secs = (required - elapsed).div_ceil(1_000);
        ctx.hud.dwell_countdown(Some(u32::try_from(left_secs).unwrap_or(u32::MAX)));
        None
    }

    /// Parking predicate for the current tick; `None` while an input is missing
    fn evaluate(&mut self, level: usize, ctx: &MissionContext<'_>) -> Option<bool> {
        let vehicle = ctx.vehicle.as_deref()?;
        let slot = ctx.registry.slot(self.level_config(level).target_slot)?;
        let state = vehicle.state();

        let distance = (utils::xz(&state.position) - utils::xz(&slot.world_position)).norm();
        let in_zone = distance < self.config.zone_radius;
        let stopped = state.speed.abs() < self.config.stopped_threshold;
        let facing = utils::angle_between(&state.forward_xz(), &slot.outward_xz()) < self.config.facing_tolerance;

        self.feedback = match (in_zone, facing, stopped) {
            (true, true, true) => TargetFeedback::Holding,
            (true, false, _) => TargetFeedback::WrongHeading,
            _ => TargetFeedback::Idle,
        };
        Some(in_zone && stopped && facing)
    }

    fn on_timer_fire(&mut self, ctx: &mut MissionContext<'_>) -> Option<MissionEvent> {
        let remaining = self.remaining_secs.unwrap_or(0).saturating_sub(1);
        self.remaining_secs = Some(remaining);
        ctx.hud.timer_text(Some(remaining));
        if remaining > 0 {
            return None;
        }

        match self.phase.level() {
            Some(level) => {
                self.conclude(MissionEvent::TimedOut(level), ctx);
                Some(MissionEvent::TimedOut(level))
            }
            None => {
                self.stop_timer(ctx.hud);
                None
            }
        }
    }

    /// Shared exit path for both outcomes
    fn conclude(&mut self, outcome: MissionEvent, ctx: &mut MissionContext<'_>) {
        self.stop_timer(ctx.hud);
        self.clear_dwell(ctx.hud);
        if let Some(vehicle) = ctx.vehicle.as_deref_mut() {
            vehicle.reset_to(&self.spawn);
        }

        let (title, body) = match outcome {
            MissionEvent::Completed(level) => {
                log::info!("Level {level} completed");
                self.phase = MissionPhase::Completed(level);
                let config = self.level_config(level);
                (config.title.clone(), config.completion.clone())
            }
            MissionEvent::TimedOut(level) => {
                log::info!("Level {level} timed out");
                self.phase = MissionPhase::TimedOut(level);
                (self.config.timeout_title.clone(), self.config.timeout_body.clone())
            }
        };
        self.show(ctx.prompt, &title, &body);
    }

    /// Reset and populate the lot for `level`, then show its instructions
    fn enter_level(&mut self, level: usize, ctx: &mut MissionContext<'_>) {
        self.stop_timer(ctx.hud);
        self.clear_dwell(ctx.hud);
        if let Some(vehicle) = ctx.vehicle.as_deref_mut() {
            vehicle.reset_to(&self.spawn);
        }

        let level_config = self.level_config(level);
        let target_slot = level_config.target_slot;
        let density = level_config.density;
        let title = level_config.title.clone();
        let instructions = level_config.instructions.clone();

        let registry = &mut *ctx.registry;
        let slot_count = registry.slot_count();
        for slot in 0..slot_count {
            registry.despawn(slot);
        }
        registry.mark_target(Some(target_slot));

        let mut parked = 0;
        for slot in (0..slot_count).filter(|slot| *slot != target_slot) {
            if self.rng.gen_bool(density) {
                registry.spawn(slot);
                parked += 1;
            }
        }
        log::info!("Level {level} set up - target slot {target_slot}, {parked} parked cars");

        self.phase = MissionPhase::Instructing(level);
        self.show(ctx.prompt, &title, &instructions);
    }

    fn activate(&mut self, level: usize, now_ms: u64, hud: &mut dyn HudSink) {
        self.phase = MissionPhase::Active(level);
        self.feedback = TargetFeedback::Idle;
        if let Some(seconds) = self.level_config(level).time_limit_secs {
            self.start_timer(seconds, now_ms, hud);
        }
        log::info!("Level {level} started");
    }

    fn clear_dwell(&mut self, hud: &mut dyn HudSink) {
        self.dwell_start_ms = None;
        self.feedback = TargetFeedback::Idle;
        hud.dwell_countdown(None);
    }

    fn show(&mut self, prompt: &mut dyn UserPrompt, title: &str, body: &str) {
        let token = self.next_token;
        self.next_token = token.next();
        self.pending_ack = Some(token);
        prompt.show(title, body, token);
    }

    fn next_level(&self, level: usize) -> usize {
        level % self.config.levels.len() + 1
    }

    fn level_config(&self, level: usize) -> &LevelConfig {
        let count = self.config.levels.len();
        &self.config.levels[level.saturating_sub(1) % count]
    }
}
