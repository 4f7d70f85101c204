//! Scripted headless run
//!
//! Drives the default lot for a few simulated minutes with a fixed key
//! script, acknowledging every prompt as soon as it appears.
//!
//! ```text
//! parking_sim [CONFIG]            run with CONFIG (.toml or .ron), or defaults
//! parking_sim --dump-config PATH  write the default config to PATH
//! ```

use drive_engine::audio::{AudioCue, CueRecorder};
use drive_engine::config::{Config, ConfigError};
use drive_engine::foundation::logging;
use drive_engine::foundation::time::{FrameTimer, ManualClock};
use drive_engine::input::{InputManager, KeyCode};
use drive_engine::ui::{HudSnapshot, PromptLog};
use parking_sim::components::{SlotProvider, SpawnPose};
use parking_sim::config::GameConfig;
use parking_sim::mission::{MissionError, MissionEvent, MissionPhase};
use parking_sim::{Simulation, SimulationHosts};

/// Failures that end a run
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Setup error: {0}")]
    Mission(#[from] MissionError),
}

const FRAMES: u64 = 60 * 180;
const DEFAULT_CONFIG: &str = "parking_sim.toml";

/// Key presses and releases, by frame
const SCRIPT: &[(u64, KeyCode, bool)] = &[
    (30, KeyCode::W, true),
    (150, KeyCode::A, true),
    (240, KeyCode::A, false),
    (300, KeyCode::C, true),
    (301, KeyCode::C, false),
    (420, KeyCode::W, false),
    (420, KeyCode::Space, true),
    (500, KeyCode::Space, false),
    (520, KeyCode::S, true),
    (640, KeyCode::S, false),
    (660, KeyCode::Shift, true),
    (720, KeyCode::Shift, false),
    (780, KeyCode::R, true),
    (782, KeyCode::R, false),
];

fn main() {
    logging::init();
    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), RunError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [flag, path] = args.as_slice() {
        if flag == "--dump-config" {
            GameConfig::default().save_to_file(path)?;
            log::info!("Wrote default config to {path}");
            return Ok(());
        }
    }
    let config_path = args.first().map_or(DEFAULT_CONFIG, String::as_str);
    let config = GameConfig::load_or_default(config_path)?;

    let clock = ManualClock::new(0);
    let audio = CueRecorder::new();
    let prompts = PromptLog::new();
    let hud = HudSnapshot::new();
    let hosts = SimulationHosts::new(Box::new(clock.clone()))
        .with_audio(Box::new(audio.clone()))
        .with_prompt(Box::new(prompts.clone()))
        .with_hud(Box::new(hud.clone()));

    let mut sim = Simulation::with_lot(config, hosts)?;
    sim.spawn_vehicle();
    sim.start();

    let mut input = InputManager::new();
    let mut timer = FrameTimer::fixed(60.0);
    let mut completed = 0_u32;
    let mut timed_out = 0_u32;
    let mut parked_for = None;

    while timer.frame_count() < FRAMES {
        let frame = timer.frame_count();
        for (_, key, pressed) in SCRIPT.iter().filter(|(at, _, _)| *at == frame) {
            input.handle_key_input(*key, *pressed);
        }

        if let Some(pending) = sim.mission().pending_ack() {
            if prompts.last().is_some_and(|p| p.ack == pending) {
                sim.acknowledge(pending);
            }
        }

        // Once the scripted drive is over, drop the car into the target slot
        // of each level to exercise the dwell check.
        if frame > 900 {
            if let MissionPhase::Active(level) = sim.mission().phase() {
                if parked_for != Some(level) {
                    park_in_target(&mut sim, level);
                    parked_for = Some(level);
                }
            }
        }

        let dt = timer.tick();
        clock.advance(timer.delta_ms());
        let report = sim.tick(&input.snapshot(), dt);

        match report.mission {
            Some(MissionEvent::Completed(level)) => {
                completed += 1;
                parked_for = None;
                log::info!("Frame {frame}: level {level} completed");
            }
            Some(MissionEvent::TimedOut(level)) => {
                timed_out += 1;
                parked_for = None;
                log::info!("Frame {frame}: level {level} timed out");
            }
            None => {}
        }
        if let Some(contact) = report.contact.filter(|c| c.first_contact) {
            log::info!("Frame {frame}: hit {:?}", contact.class);
        }
    }

    log::info!(
        "Run finished after {} frames - {completed} completed, {timed_out} timed out, {} crashes, {} prompts, final phase {:?}, timer {:?}",
        timer.frame_count(),
        audio.count(AudioCue::Crash),
        prompts.len(),
        sim.mission().phase(),
        hud.timer(),
    );
    let camera = sim.camera();
    log::debug!("Camera mode {:?} at {:?}", camera.active_mode(), camera.main_camera().position);
    Ok(())
}

fn park_in_target(sim: &mut Simulation, level: usize) {
    let Some(target) = sim.lot().target() else {
        return;
    };
    let Some(slot) = sim.lot().slot(target) else {
        return;
    };
    sim.place_vehicle(&SpawnPose {
        position: slot.world_position,
        yaw: slot.outward_yaw,
    });
    log::info!("Level {level}: placed vehicle in slot {target}");
}
