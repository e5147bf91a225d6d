//! Collectible loot crystals and the pickup counter.
//!
//! Loot is one-shot: touching it with the rocket despawns the body for good
//! (see [`crate::collision::resolve_collisions_system`]) and bumps
//! [`LootCounter`].  Nothing respawns.

use crate::asteroid::random_velocity;
use crate::collision::BodyMass;
use crate::config::GameplayConfig;
use crate::gameplay::LevelEntity;
use crate::outline::{build_body, BodyOutline, ProceduralOutlines, VisualOutline, LOOT_OUTLINE_ID};
use crate::placement::{place, SpawnConstraint, SpawnTally};
use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Loot {
    pub scale: f32,
    /// Scale-derived worth; also drives how much fuel a pickup restores.
    pub value: f32,
}

/// Pickups made this level, read by the HUD.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct LootCounter {
    pub count: u32,
    pub total_value: f32,
}

impl LootCounter {
    pub fn record(&mut self, value: f32) {
        self.count += 1;
        self.total_value += value;
    }
}

/// Loot touches asteroids and the rocket, never other loot.
pub fn loot_groups() -> CollisionGroups {
    CollisionGroups::new(Group::GROUP_3, Group::GROUP_1 | Group::GROUP_2)
}

pub fn spawn_loot(
    commands: &mut Commands,
    body: &BodyOutline,
    scale: f32,
    position: Vec2,
    velocity: Velocity,
    config: &GameplayConfig,
) -> Entity {
    let mass = body.mass(config.loot_density);
    commands
        .spawn((
            (
                Loot {
                    scale,
                    value: scale * config.loot_value_per_scale,
                },
                LevelEntity,
                BodyMass(mass),
                VisualOutline::from(body),
                Transform::from_translation(position.extend(0.2)),
                Visibility::default(),
            ),
            (
                RigidBody::Dynamic,
                body.collider(),
                ColliderMassProperties::Mass(mass),
                Friction::coefficient(0.5),
                Restitution::coefficient(0.3),
                velocity,
                loot_groups(),
                ActiveEvents::COLLISION_EVENTS,
            ),
        ))
        .id()
}

pub fn populate_loot(
    commands: &mut Commands,
    outlines: &ProceduralOutlines,
    config: &GameplayConfig,
    constraint: &SpawnConstraint,
    rng: &mut impl Rng,
) -> SpawnTally {
    let mut tally = SpawnTally::default();
    for _ in 0..config.loot_count {
        let scale = config.loot_scales.choose(rng).copied().unwrap_or(0.5);
        let body = match build_body(outlines, LOOT_OUTLINE_ID, config.loot_outline_step, scale) {
            Ok(body) => body,
            Err(e) => {
                warn!("Skipping loot at scale {scale}: {e}");
                tally.malformed += 1;
                continue;
            }
        };
        let Some(position) = place(rng, config.map_size, constraint, body.bounding_radius) else {
            tally.rejected += 1;
            continue;
        };
        let velocity = random_velocity(
            rng,
            config.loot_initial_velocity_range,
            config.loot_initial_angvel_range,
        );
        spawn_loot(commands, &body, scale, position, velocity, config);
        tally.spawned += 1;
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_tracks_count_and_value() {
        let mut counter = LootCounter::default();
        counter.record(3.0);
        counter.record(6.0);
        assert_eq!(counter.count, 2);
        assert_eq!(counter.total_value, 9.0);
    }

    #[test]
    fn loot_and_rocket_groups_meet() {
        let loot = loot_groups();
        assert!(loot.filters.contains(Group::GROUP_2));
        assert!(!loot.filters.contains(Group::GROUP_3));
    }

    #[test]
    fn spawned_loot_value_scales() {
        let mut world = World::new();
        let config = GameplayConfig::default();
        let body = build_body(&ProceduralOutlines::default(), LOOT_OUTLINE_ID, 10.0, 0.4).unwrap();

        let e = spawn_loot(
            &mut world.commands(),
            &body,
            0.4,
            Vec2::new(100.0, 100.0),
            Velocity::zero(),
            &config,
        );
        world.flush();

        let loot = world.get::<Loot>(e).unwrap();
        assert!((loot.value - 0.4 * config.loot_value_per_scale).abs() < 1e-5);
        let mass = world.get::<BodyMass>(e).unwrap();
        assert!((mass.0 - body.area * config.loot_density).abs() < 1e-5);
    }
}
