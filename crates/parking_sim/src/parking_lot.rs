//! In-memory parking lot
//!
//! Slots are laid out in rows; each row is centred on the X axis. Dummy cars
//! sit in slots on request, props stay put, and the border ring is built once
//! from the playable area.

use drive_engine::foundation::math::{Vec2, Vec3};
use drive_engine::physics::{ColliderClass, ObstacleEntry, OrientedBox};

use crate::components::{BorderProvider, ObstacleProvider, ParkingSlot, SlotProvider, SpawnPose};
use crate::config::LotConfig;

/// Slots, parked dummy cars, props and the border walls
#[derive(Debug, Clone)]
pub struct ParkingLot {
    slots: Vec<ParkingSlot>,
    dummies: Vec<Option<OrientedBox>>,
    props: Vec<OrientedBox>,
    borders: Vec<OrientedBox>,
    dummy_half_extents: Vec3,
    target: Option<usize>,
    spawn: SpawnPose,
    active: Vec<ObstacleEntry>,
}

impl ParkingLot {
    /// Build the lot described by `config`
    pub fn new(config: &LotConfig) -> Self {
        let mut slots = Vec::with_capacity(config.slot_count());
        let pitch = config.slot_width + config.slot_gap;
        #[allow(clippy::cast_precision_loss)]
        let first = -(config.slots_per_row.saturating_sub(1) as f32) * pitch / 2.0;
        for row in &config.rows {
            for i in 0..config.slots_per_row {
                #[allow(clippy::cast_precision_loss)]
                let x = first + i as f32 * pitch;
                slots.push(ParkingSlot {
                    world_position: Vec3::new(x, 0.0, row.z),
                    outward_yaw: row.outward_yaw,
                });
            }
        }

        let props = config
            .props
            .iter()
            .map(|prop| OrientedBox::from_yaw(prop.center, prop.half_extents, prop.yaw))
            .collect::<Vec<_>>();

        let borders = border_ring(config.playable_half_extents, config.cell_size, config.wall_half_height);

        log::info!(
            "Parking lot built - {} slots, {} props, {} border walls",
            slots.len(),
            props.len(),
            borders.len()
        );

        let mut lot = Self {
            dummies: vec![None; slots.len()],
            slots,
            props,
            borders,
            dummy_half_extents: config.dummy_half_extents,
            target: None,
            spawn: config.spawn,
            active: Vec::new(),
        };
        lot.rebuild_active();
        lot
    }

    /// Where the player's vehicle appears
    pub fn spawn_pose(&self) -> SpawnPose {
        self.spawn
    }

    /// Currently marked target slot
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Whether a dummy car sits in `slot`
    pub fn is_occupied(&self, slot: usize) -> bool {
        self.dummies.get(slot).is_some_and(Option::is_some)
    }

    /// Number of parked dummy cars
    pub fn occupied_count(&self) -> usize {
        self.dummies.iter().filter(|d| d.is_some()).count()
    }

    fn rebuild_active(&mut self) {
        self.active = self
            .props
            .iter()
            .map(|prop| ObstacleEntry::live(ColliderClass::Obstacle, *prop))
            .chain(
                self.dummies
                    .iter()
                    .flatten()
                    .map(|dummy| ObstacleEntry::live(ColliderClass::DummyCar, *dummy)),
            )
            .collect();
    }
}

/// Four walls whose inner faces sit one cell outside the playable area
fn border_ring(playable: Vec2, cell: f32, half_height: f32) -> Vec<OrientedBox> {
    let half_thickness = cell / 2.0;
    let inner_x = playable.x + cell;
    let inner_z = playable.y + cell;
    let span_x = inner_x + cell;
    let span_z = inner_z + cell;
    let centre_x = inner_x + half_thickness;
    let centre_z = inner_z + half_thickness;

    vec![
        OrientedBox::axis_aligned(
            Vec3::new(0.0, half_height, centre_z),
            Vec3::new(span_x, half_height, half_thickness),
        ),
        OrientedBox::axis_aligned(
            Vec3::new(0.0, half_height, -centre_z),
            Vec3::new(span_x, half_height, half_thickness),
        ),
        OrientedBox::axis_aligned(
            Vec3::new(centre_x, half_height, 0.0),
            Vec3::new(half_thickness, half_height, span_z),
        ),
        OrientedBox::axis_aligned(
            Vec3::new(-centre_x, half_height, 0.0),
            Vec3::new(half_thickness, half_height, span_z),
        ),
    ]
}

impl ObstacleProvider for ParkingLot {
    fn list_active(&self) -> &[ObstacleEntry] {
        &self.active
    }

    fn spawn(&mut self, slot: usize) {
        let Some(place) = self.slots.get(slot).copied() else {
            log::warn!("Ignoring spawn for unknown slot {slot}");
            return;
        };
        if self.target == Some(slot) || self.dummies[slot].is_some() {
            return;
        }
        let center = place.world_position + Vec3::new(0.0, self.dummy_half_extents.y, 0.0);
        self.dummies[slot] = Some(OrientedBox::from_yaw(center, self.dummy_half_extents, place.outward_yaw));
        self.rebuild_active();
    }

    fn despawn(&mut self, slot: usize) {
        if let Some(dummy) = self.dummies.get_mut(slot) {
            if dummy.take().is_some() {
                self.rebuild_active();
            }
        }
    }
}

impl BorderProvider for ParkingLot {
    fn list(&self) -> Vec<OrientedBox> {
        self.borders.clone()
    }
}

impl SlotProvider for ParkingLot {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, index: usize) -> Option<ParkingSlot> {
        self.slots.get(index).copied()
    }

    fn mark_target(&mut self, index: Option<usize>) {
        self.target = index.filter(|i| *i < self.slots.len());
        if let Some(target) = self.target {
            self.despawn(target);
        }
        log::debug!("Target slot marked: {:?}", self.target);
    }
}
