//! Rollback collision resolution for a single kinematic body
//!
//! Boxes are tested at the body's new pose rather than swept. On any hit the
//! pose is restored from the snapshot taken before the body was integrated
//! and the body rebounds with the restitution of whatever it hit.

use serde::{Deserialize, Serialize};

use super::collision::OrientedBox;
use super::collision_layers::{Collider, ColliderClass, CollisionLayers, ObstacleEntry};

/// A body the collision world can roll back
pub trait KinematicBody {
    /// Saved pose
    type Snapshot;

    /// Capture the current pose
    fn snapshot(&self) -> Self::Snapshot;

    /// Restore a pose captured by [`KinematicBody::snapshot`], exactly
    fn restore(&mut self, snapshot: &Self::Snapshot);

    /// World-space bounds at the current pose
    fn bounds(&self) -> OrientedBox;

    /// Reverse and scale the body's speed, zeroing it below `stop_threshold`
    fn rebound(&mut self, restitution: f32, stop_threshold: f32);
}

/// Restitution per collider class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactResponse {
    /// Border walls
    pub wall: f32,
    /// Static obstacles
    pub obstacle: f32,
    /// Parked dummy cars
    pub dummy_car: f32,
    /// Rebound speeds below this snap to zero
    pub stop_threshold: f32,
}

impl Default for ImpactResponse {
    fn default() -> Self {
        Self {
            wall: 0.3,
            obstacle: 0.5,
            dummy_car: 0.4,
            stop_threshold: 0.001,
        }
    }
}

impl ImpactResponse {
    /// Restitution for `class`
    pub fn restitution(&self, class: ColliderClass) -> f32 {
        match class {
            ColliderClass::Wall => self.wall,
            ColliderClass::Obstacle => self.obstacle,
            ColliderClass::DummyCar => self.dummy_car,
        }
    }
}

/// Where a contact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSource {
    /// Index into the obstacle list passed to [`CollisionWorld::resolve`]
    Obstacle(usize),
    /// Index into the world's border list
    Border(usize),
}

/// Result of a tick that hit something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// Class of the collider that was hit
    pub class: ColliderClass,
    /// Which collider was hit
    pub source: ContactSource,
    /// True only on the first tick of a run of consecutive contacts
    pub first_contact: bool,
}

/// Static borders plus the per-tick resolve pass
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    borders: Vec<Collider>,
    mask: CollisionLayers,
    response: ImpactResponse,
    in_contact: bool,
}

impl CollisionWorld {
    /// Create a world with no borders that collides with every class
    pub fn new(response: ImpactResponse) -> Self {
        Self {
            borders: Vec::new(),
            mask: CollisionLayers::all(),
            response,
            in_contact: false,
        }
    }

    /// Replace the static border colliders
    pub fn set_borders(&mut self, borders: Vec<Collider>) {
        log::debug!("Collision world holds {} border colliders", borders.len());
        self.borders = borders;
    }

    /// Border colliders
    pub fn borders(&self) -> &[Collider] {
        &self.borders
    }

    /// Restrict which classes the body reacts to
    pub fn set_mask(&mut self, mask: CollisionLayers) {
        self.mask = mask;
    }

    /// Restitution table
    pub fn response(&self) -> &ImpactResponse {
        &self.response
    }

    /// Whether the previous resolve ended in contact
    pub fn in_contact(&self) -> bool {
        self.in_contact
    }

    /// Forget the contact run, e.g. after the body was teleported
    pub fn reset_contact(&mut self) {
        self.in_contact = false;
    }

    /// Test `body` at its new pose and roll it back to `before` on a hit
    ///
    /// Live obstacles are scanned before the borders; the first hit wins.
    /// Entries without bounds, or with malformed bounds, are logged and
    /// skipped for this tick.
    pub fn resolve<B: KinematicBody>(
        &mut self,
        body: &mut B,
        before: &B::Snapshot,
        obstacles: &[ObstacleEntry],
    ) -> Option<Contact> {
        let hit = self.first_hit(&body.bounds(), obstacles);

        let Some((class, source)) = hit else {
            self.in_contact = false;
            return None;
        };

        body.restore(before);
        body.rebound(self.response.restitution(class), self.response.stop_threshold);

        let first_contact = !self.in_contact;
        self.in_contact = true;
        if first_contact {
            log::debug!("Collision with {class:?} ({source:?})");
        }

        Some(Contact {
            class,
            source,
            first_contact,
        })
    }

    fn first_hit(
        &self,
        bounds: &OrientedBox,
        obstacles: &[ObstacleEntry],
    ) -> Option<(ColliderClass, ContactSource)> {
        for (index, entry) in obstacles.iter().enumerate() {
            if !entry.alive || !self.mask.contains(entry.class.layer()) {
                continue;
            }
            let Some(other) = entry.bounds.filter(OrientedBox::is_well_formed) else {
                log::warn!("Skipping malformed obstacle entry {index} ({:?})", entry.class);
                continue;
            };
            if bounds.intersects(&other) {
                return Some((entry.class, ContactSource::Obstacle(index)));
            }
        }

        self.borders
            .iter()
            .enumerate()
            .filter(|(_, border)| self.mask.contains(border.class.layer()))
            .find(|(_, border)| bounds.intersects(&border.bounds))
            .map(|(index, border)| (border.class, ContactSource::Border(index)))
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(ImpactResponse::default())
    }
}
