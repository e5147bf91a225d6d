//! Collision interpretation: loot pickup and velocity-weighted hull damage.
//!
//! Rapier reports contacts after the step, when the bodies have already
//! bounced.  Impact speed is therefore taken from [`VelocitySnapshot`], which
//! is rebuilt from every body's `Velocity` immediately before the step.
//!
//! Only pairs involving the rocket matter.  A loot partner is collected and
//! never hurts; anything else is run through [`DamageModel`].  References to
//! entities that have already gone (loot collected earlier in the same batch,
//! bodies despawned last frame) are skipped.

use crate::config::GameplayConfig;
use crate::loot::{Loot, LootCounter};
use crate::rocket::{FuelTank, Hull, Rocket, RocketDestroyed};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::collections::{HashMap, HashSet};

/// Mass used by the damage model, mirrored from the collider's mass property.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BodyMass(pub f32);

/// Pre-step linear velocity of every dynamic body, keyed by entity.
#[derive(Resource, Debug, Default, Clone)]
pub struct VelocitySnapshot {
    velocities: HashMap<Entity, Vec2>,
}

impl VelocitySnapshot {
    pub fn get(&self, entity: Entity) -> Option<Vec2> {
        self.velocities.get(&entity).copied()
    }

    pub fn insert(&mut self, entity: Entity, velocity: Vec2) {
        self.velocities.insert(entity, velocity);
    }

    pub fn len(&self) -> usize {
        self.velocities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.velocities.is_empty()
    }

    pub fn clear(&mut self) {
        self.velocities.clear();
    }
}

/// Mass- and speed-weighted damage thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageModel {
    pub min_mass: f32,
    pub max_mass: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub max_damage: u32,
}

impl DamageModel {
    /// Whole damage points for an impact, or 0 below either threshold.
    ///
    /// ```text
    /// mass_ratio  = clamp01((mass - min_mass) / (max_mass - min_mass))
    /// speed_mult  = clamp((speed - min_speed) / (max_speed - min_speed), 0.2, 1)
    /// base        = floor(mass_ratio * max_damage) + 1
    /// damage      = clamp(floor(base * speed_mult), 1, max_damage)
    /// ```
    pub fn damage(&self, mass: f32, speed: f32) -> u32 {
        if !(mass >= self.min_mass && speed >= self.min_speed) {
            return 0;
        }
        let mass_ratio = ((mass - self.min_mass) / (self.max_mass - self.min_mass)).clamp(0.0, 1.0);
        let speed_mult =
            ((speed - self.min_speed) / (self.max_speed - self.min_speed)).clamp(0.2, 1.0);
        let base = (mass_ratio * self.max_damage as f32).floor() + 1.0;
        let raw = (base * speed_mult).floor() as u32;
        raw.clamp(1, self.max_damage.max(1))
    }
}

// ── Systems ──────────────────────────────────────────────────────────────────

/// Rebuild the snapshot from scratch; runs right before Rapier syncs and steps.
pub fn snapshot_velocities_system(
    bodies: Query<(Entity, &Velocity)>,
    mut snapshot: ResMut<VelocitySnapshot>,
) {
    snapshot.clear();
    for (entity, velocity) in bodies.iter() {
        snapshot.insert(entity, velocity.linvel);
    }
}

/// Resolve this frame's `CollisionEvent::Started` pairs against the rocket.
#[allow(clippy::too_many_arguments)]
pub fn resolve_collisions_system(
    mut commands: Commands,
    mut collision_events: MessageReader<CollisionEvent>,
    time: Res<Time>,
    config: Res<GameplayConfig>,
    snapshot: Res<VelocitySnapshot>,
    mut rockets: Query<(Entity, &mut Hull, &mut FuelTank), With<Rocket>>,
    loot: Query<&Loot>,
    masses: Query<&BodyMass>,
    mut counter: ResMut<LootCounter>,
    mut destroyed: MessageWriter<RocketDestroyed>,
) {
    let Ok((rocket, mut hull, mut tank)) = rockets.single_mut() else {
        collision_events.clear();
        return;
    };
    let now = time.elapsed_secs_f64();
    let model = config.damage_model();
    let mut collected: HashSet<Entity> = HashSet::new();

    for event in collision_events.read() {
        let (e1, e2) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2),
            CollisionEvent::Stopped(..) => continue,
        };
        let other = if e1 == rocket {
            e2
        } else if e2 == rocket {
            e1
        } else {
            continue;
        };

        if let Ok(item) = loot.get(other) {
            if collected.insert(other) {
                commands.entity(other).despawn();
                counter.record(item.value);
                tank.refuel(item.value * config.loot_refuel_per_value);
                debug!("Collected loot {other:?} worth {}", item.value);
            }
            continue;
        }

        let (Some(v_other), Some(v_rocket), Ok(mass)) = (
            snapshot.get(other),
            snapshot.get(rocket),
            masses.get(other),
        ) else {
            debug!("Skipping collision with stale body {other:?}");
            continue;
        };

        let speed = (v_other - v_rocket).length();
        let amount = model.damage(mass.0, speed);
        if amount == 0 {
            continue;
        }
        let health = hull.damage(amount as f32, now, config.damage_flash_secs);
        debug!("Rocket hit by {other:?}: {amount} damage at {speed:.1} u/s, health {health}");

        if hull.take_destruction_report() {
            info!("Rocket destroyed");
            destroyed.write(RocketDestroyed { rocket });
        }
    }
}
