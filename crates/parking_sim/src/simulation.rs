//! Frame loop
//!
//! One [`Simulation::tick`] per rendered frame runs, in order: input
//! sampling, vehicle integration, collision rollback, camera placement and
//! the mission check. Nothing in a tick blocks.

use drive_engine::audio::{AudioSink, NullAudio};
use drive_engine::foundation::time::Clock;
use drive_engine::input::ControlState;
use drive_engine::physics::{Collider, ColliderClass, CollisionWorld, Contact, KinematicBody};
use drive_engine::ui::{AckToken, HudSink, NullHud, UserPrompt};

use crate::camera_rig::CameraRig;
use crate::components::{ParkingRegistry, SpawnPose};
use crate::config::GameConfig;
use crate::mission::{MissionContext, MissionController, MissionError, MissionEvent, MissionPhase};
use crate::parking_lot::ParkingLot;
use crate::vehicle::{DriveInput, VehicleDynamics, VehicleOutput, VehicleSignals};

/// Prompt that drops everything; acknowledgements must come from elsewhere
struct SilentPrompt;

impl UserPrompt for SilentPrompt {
    fn show(&mut self, title: &str, _body: &str, ack: AckToken) {
        log::debug!("Prompt {ack:?} '{title}' has no host");
    }
}

/// Host-side implementations of the simulation's outputs and time source
pub struct SimulationHosts {
    audio: Box<dyn AudioSink>,
    prompt: Box<dyn UserPrompt>,
    hud: Box<dyn HudSink>,
    clock: Box<dyn Clock>,
}

impl SimulationHosts {
    /// Silent hosts around `clock`
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            audio: Box::new(NullAudio),
            prompt: Box::new(SilentPrompt),
            hud: Box::new(NullHud),
            clock,
        }
    }

    /// Send audio cues to `audio`
    #[must_use]
    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    /// Show prompts through `prompt`
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn UserPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Push HUD text to `hud`
    #[must_use]
    pub fn with_hud(mut self, hud: Box<dyn HudSink>) -> Self {
        self.hud = hud;
        self
    }
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Vehicle state after collision resolution
    pub vehicle: Option<VehicleOutput>,
    /// Collision this tick
    pub contact: Option<Contact>,
    /// Level outcome this tick
    pub mission: Option<MissionEvent>,
    /// Mission phase after the tick
    pub phase: MissionPhase,
}

/// The whole parking exercise
pub struct Simulation<L: ParkingRegistry = ParkingLot> {
    config: GameConfig,
    spawn: SpawnPose,
    lot: L,
    vehicle: Option<VehicleDynamics>,
    collision: CollisionWorld,
    camera: CameraRig,
    mission: MissionController,
    hosts: SimulationHosts,
    braking: bool,
    respawn_held: bool,
}

impl Simulation<ParkingLot> {
    /// Build the default lot from `config` and wrap it in a simulation
    pub fn with_lot(config: GameConfig, hosts: SimulationHosts) -> Result<Self, MissionError> {
        let lot = ParkingLot::new(&config.lot);
        Self::new(config, lot, hosts)
    }
}

impl<L: ParkingRegistry> Simulation<L> {
    /// Validate `config` and set up collision against `lot`'s borders
    ///
    /// The vehicle is not spawned yet; see [`Simulation::spawn_vehicle`].
    pub fn new(config: GameConfig, lot: L, hosts: SimulationHosts) -> Result<Self, MissionError> {
        config.validate()?;
        let spawn = config.lot.spawn;
        let mission = MissionController::new(config.mission.clone(), spawn, lot.slot_count())?;

        let mut collision = CollisionWorld::new(config.collision);
        collision.set_borders(
            lot.list()
                .into_iter()
                .map(|bounds| Collider::new(ColliderClass::Wall, bounds))
                .collect(),
        );

        log::info!("Simulation ready - {} slots, {} levels", lot.slot_count(), config.mission.levels.len());

        Ok(Self {
            camera: CameraRig::new(config.camera.clone()),
            config,
            spawn,
            lot,
            vehicle: None,
            collision,
            mission,
            hosts,
            braking: false,
            respawn_held: false,
        })
    }

    /// Show the tutorial prompt
    pub fn start(&mut self) {
        self.mission.open_tutorial(self.hosts.prompt.as_mut());
    }

    /// Put the player's vehicle on the spawn pose; no-op if it already exists
    pub fn spawn_vehicle(&mut self) {
        if self.vehicle.is_some() {
            return;
        }
        self.vehicle = Some(VehicleDynamics::new(self.config.vehicle.clone(), &self.spawn));
        self.after_teleport();
        log::info!("Vehicle spawned at {:?}", self.spawn.position);
    }

    /// Move the vehicle back to the spawn pose
    pub fn respawn(&mut self) {
        let spawn = self.spawn;
        self.place_vehicle(&spawn);
        log::info!("Vehicle respawned");
    }

    /// Teleport the vehicle to `pose`, at rest, dropping any dwell progress
    pub fn place_vehicle(&mut self, pose: &SpawnPose) {
        let Some(vehicle) = self.vehicle.as_mut() else {
            return;
        };
        vehicle.reset_to(pose);
        self.mission.reset_dwell(self.hosts.hud.as_mut());
        self.after_teleport();
    }

    /// Pass a prompt acknowledgement on to the mission
    pub fn acknowledge(&mut self, token: AckToken) -> bool {
        let now = self.hosts.clock.now_ms();
        let mut ctx = mission_context(&mut self.vehicle, &mut self.lot, &mut self.hosts);
        let accepted = self.mission.acknowledge(token, now, &mut ctx);
        if accepted {
            self.after_teleport();
        }
        accepted
    }

    /// Restart at `level`
    pub fn jump_to_level(&mut self, level: usize) -> Result<(), MissionError> {
        let mut ctx = mission_context(&mut self.vehicle, &mut self.lot, &mut self.hosts);
        self.mission.jump_to_level(level, &mut ctx)?;
        self.after_teleport();
        Ok(())
    }

    /// Advance one frame
    pub fn tick(&mut self, controls: &ControlState, dt: f32) -> TickReport {
        let now = self.hosts.clock.now_ms();

        let respawn = controls.respawn && !self.respawn_held;
        self.respawn_held = controls.respawn;
        if respawn {
            self.respawn();
        }

        let input = DriveInput::from(controls);
        let mut contact = None;
        let mut vehicle_output = None;

        if let Some(vehicle) = self.vehicle.as_mut() {
            let before = vehicle.snapshot();
            vehicle.update(&input, dt);
            contact = self.collision.resolve(vehicle, &before, self.lot.list_active());

            let audio = self.hosts.audio.as_mut();
            if contact.is_some_and(|c| c.first_contact) {
                audio.play_crash();
            }
            let signals = vehicle.signals();
            let braking = signals.contains(VehicleSignals::BRAKING);
            if braking != self.braking {
                if braking {
                    audio.play_brake();
                } else {
                    audio.stop_brake();
                }
                self.braking = braking;
            }
            audio.update_engine(vehicle.speed(), vehicle.config().max_speed);

            let transform = vehicle.transform();
            self.camera.update(controls, &transform);
            vehicle_output = Some(VehicleOutput {
                transform,
                speed: vehicle.speed(),
                signals,
            });
        }

        let mut ctx = mission_context(&mut self.vehicle, &mut self.lot, &mut self.hosts);
        let mission = self.mission.check(now, &mut ctx);
        if mission.is_some() {
            self.after_teleport();
        }

        TickReport {
            vehicle: vehicle_output,
            contact,
            mission,
            phase: self.mission.phase(),
        }
    }

    /// Game configuration
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Player vehicle, once spawned
    pub fn vehicle(&self) -> Option<&VehicleDynamics> {
        self.vehicle.as_ref()
    }

    /// Parking lot
    pub fn lot(&self) -> &L {
        &self.lot
    }

    /// Camera rig
    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    /// Mission state
    pub fn mission(&self) -> &MissionController {
        &self.mission
    }

    /// Collision world
    pub fn collision(&self) -> &CollisionWorld {
        &self.collision
    }

    /// Clear per-pose history after the vehicle jumped
    fn after_teleport(&mut self) {
        self.collision.reset_contact();
        self.camera.snap_next();
    }
}

fn mission_context<'a, L: ParkingRegistry + 'a>(
    vehicle: &'a mut Option<VehicleDynamics>,
    lot: &'a mut L,
    hosts: &'a mut SimulationHosts,
) -> MissionContext<'a> {
    MissionContext {
        vehicle: vehicle.as_mut(),
        registry: lot,
        prompt: hosts.prompt.as_mut(),
        hud: hosts.hud.as_mut(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::SlotProvider;
    use crate::config::LevelConfig;
    use drive_engine::audio::{AudioCue, CueRecorder};
    use drive_engine::foundation::math::{constants, Vec3};
    use drive_engine::foundation::time::ManualClock;
    use drive_engine::ui::{HudSnapshot, PromptLog};

    const DT: f32 = 1.0 / 60.0;
    const DT_MS: u64 = 17;

    struct Rig {
        sim: Simulation,
        clock: ManualClock,
        audio: CueRecorder,
        prompts: PromptLog,
        hud: HudSnapshot,
    }

    fn rig(config: GameConfig) -> Rig {
        let clock = ManualClock::new(0);
        let audio = CueRecorder::new();
        let prompts = PromptLog::new();
        let hud = HudSnapshot::new();
        let hosts = SimulationHosts::new(Box::new(clock.clone()))
            .with_audio(Box::new(audio.clone()))
            .with_prompt(Box::new(prompts.clone()))
            .with_hud(Box::new(hud.clone()));
        let mut sim = Simulation::with_lot(config, hosts).unwrap();
        sim.spawn_vehicle();
        Rig {
            sim,
            clock,
            audio,
            prompts,
            hud,
        }
    }

    fn seeded() -> GameConfig {
        let mut config = GameConfig::default();
        config.mission.seed = Some(3);
        config
    }

    fn forward() -> ControlState {
        ControlState {
            forward: true,
            ..ControlState::default()
        }
    }

    impl Rig {
        fn step(&mut self, controls: &ControlState) -> TickReport {
            self.clock.advance(DT_MS);
            self.sim.tick(controls, DT)
        }

        fn ack_last(&mut self) {
            let token = self.prompts.last().unwrap().ack;
            assert!(self.sim.acknowledge(token));
        }
    }

    #[test]
    fn test_rejects_target_outside_lot() {
        let mut config = GameConfig::default();
        config.mission.levels.push(LevelConfig {
            target_slot: 200,
            ..LevelConfig::default()
        });
        let hosts = SimulationHosts::new(Box::new(ManualClock::new(0)));
        assert!(matches!(
            Simulation::with_lot(config, hosts),
            Err(MissionError::TargetOutOfRange { level: 3, .. })
        ));
    }

    #[test]
    fn test_tick_without_vehicle_is_quiet() {
        let hosts = SimulationHosts::new(Box::new(ManualClock::new(0)));
        let mut sim = Simulation::with_lot(seeded(), hosts).unwrap();
        let report = sim.tick(&forward(), DT);
        assert!(report.vehicle.is_none());
        assert!(report.contact.is_none());
        assert_eq!(report.phase, MissionPhase::AwaitingTutorial);
    }

    #[test]
    fn test_borders_are_walls() {
        let rig = rig(seeded());
        let borders = rig.sim.collision().borders();
        assert_eq!(borders.len(), 4);
        assert!(borders.iter().all(|b| b.class == ColliderClass::Wall));
    }

    #[test]
    fn test_pillar_stops_the_vehicle_without_penetration() {
        let mut config = seeded();
        config.lot.spawn = SpawnPose {
            position: Vec3::new(0.0, 0.0, 14.0),
            yaw: constants::PI,
        };
        let mut rig = rig(config);

        let mut hits = Vec::new();
        for _ in 0..300 {
            let report = rig.step(&forward());
            if let Some(contact) = report.contact {
                hits.push(contact);
            }
            let z = rig.sim.vehicle().unwrap().state().position.z;
            assert!(z > 12.0, "vehicle reached z = {z}");
        }

        assert!(!hits.is_empty());
        assert!(hits.iter().all(|c| c.class == ColliderClass::Obstacle));
        assert!(hits[0].first_contact);
        let first_contacts = hits.iter().filter(|c| c.first_contact).count();
        assert_eq!(rig.audio.count(AudioCue::Crash), first_contacts);
    }

    #[test]
    fn test_blocked_tick_restores_pose_while_steering() {
        let mut config = seeded();
        config.lot.spawn = SpawnPose {
            position: Vec3::new(0.0, 0.0, 14.0),
            yaw: constants::PI,
        };
        let mut rig = rig(config);

        let mut blocked = 0;
        for i in 0..300 {
            let controls = ControlState {
                forward: true,
                steer_left: (i / 10) % 2 == 0,
                steer_right: (i / 10) % 2 == 1,
                ..ControlState::default()
            };
            let before = rig.sim.vehicle().unwrap().state().clone();
            let report = rig.step(&controls);
            if report.contact.is_none() {
                continue;
            }
            blocked += 1;
            let after = rig.sim.vehicle().unwrap().state();
            assert!(after.steering_angle.abs() > 0.0);
            assert_eq!(after.position, before.position);
            assert_eq!(after.heading_yaw, before.heading_yaw);
        }
        assert!(blocked > 0);
    }

    #[test]
    fn test_brake_cue_is_edge_triggered() {
        let mut rig = rig(seeded());
        for _ in 0..40 {
            rig.step(&forward());
        }
        assert!(rig.audio.cues().is_empty());
        assert!(rig.audio.last_pitch().unwrap() > 0.8);

        let backward = ControlState {
            backward: true,
            ..ControlState::default()
        };
        for _ in 0..40 {
            rig.step(&backward);
        }
        assert_eq!(rig.audio.cues(), vec![AudioCue::BrakeStart, AudioCue::BrakeStop]);
    }

    #[test]
    fn test_respawn_fires_once_per_press() {
        let mut rig = rig(seeded());
        for _ in 0..60 {
            rig.step(&forward());
        }
        let spawn = rig.sim.config().lot.spawn;
        assert_ne!(rig.sim.vehicle().unwrap().state().position, spawn.position);

        let respawn = ControlState {
            respawn: true,
            ..ControlState::default()
        };
        rig.step(&respawn);
        assert_eq!(rig.sim.vehicle().unwrap().state().position, spawn.position);
        assert_eq!(rig.sim.vehicle().unwrap().speed(), 0.0);

        let both = ControlState {
            respawn: true,
            forward: true,
            ..ControlState::default()
        };
        for _ in 0..30 {
            rig.step(&both);
        }
        assert_ne!(rig.sim.vehicle().unwrap().state().position, spawn.position);
    }

    #[test]
    fn test_parking_completes_level_one() {
        let mut rig = rig(seeded());
        rig.sim.start();
        assert_eq!(rig.prompts.len(), 1);
        rig.ack_last();
        rig.ack_last();
        assert_eq!(rig.sim.mission().phase(), MissionPhase::Active(1));
        assert!(!rig.sim.lot().is_occupied(5));

        let slot = rig.sim.lot().slot(5).unwrap();
        rig.sim.place_vehicle(&SpawnPose {
            position: slot.world_position,
            yaw: slot.outward_yaw,
        });

        let started = rig.clock.now_ms() + DT_MS;
        let mut completed_at = None;
        for _ in 0..400 {
            let report = rig.step(&ControlState::default());
            assert!(report.contact.is_none());
            if report.mission == Some(MissionEvent::Completed(1)) {
                completed_at = Some(rig.clock.now_ms());
                break;
            }
        }

        let completed_at = completed_at.unwrap();
        assert!(completed_at - started >= 3_000);
        assert!(completed_at - started < 3_000 + DT_MS);
        assert_eq!(rig.hud.dwell(), None);
        assert_eq!(rig.sim.vehicle().unwrap().state().position, rig.sim.config().lot.spawn.position);

        rig.ack_last();
        assert_eq!(rig.sim.mission().phase(), MissionPhase::Instructing(2));
        rig.ack_last();
        assert_eq!(rig.hud.timer(), Some(60));
    }
}
