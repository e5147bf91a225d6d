//! Asteroid spawning.
//!
//! Asteroids are indestructible obstacles: a scale drawn from the weighted
//! table, one of the library outlines, mass from area and density, and a gentle
//! initial drift and spin.  Their per-frame "update" is Rapier writing the body
//! pose back into the shared `Transform`; nothing else runs on them.

use crate::collision::BodyMass;
use crate::config::GameplayConfig;
use crate::gameplay::LevelEntity;
use crate::outline::{build_body, BodyOutline, ProceduralOutlines, VisualOutline};
use crate::placement::{place, SpawnConstraint, SpawnTally};
use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Asteroid {
    /// Uniform scale applied to the library outline; fixed for life.
    pub scale: f32,
}

/// Asteroids collide with everything.
pub fn asteroid_groups() -> CollisionGroups {
    CollisionGroups::new(
        Group::GROUP_1,
        Group::GROUP_1 | Group::GROUP_2 | Group::GROUP_3,
    )
}

pub fn spawn_asteroid(
    commands: &mut Commands,
    body: &BodyOutline,
    scale: f32,
    position: Vec2,
    velocity: Velocity,
    config: &GameplayConfig,
) -> Entity {
    let mass = body.mass(config.asteroid_density);
    commands
        .spawn((
            (
                Asteroid { scale },
                LevelEntity,
                BodyMass(mass),
                VisualOutline::from(body),
                Transform::from_translation(position.extend(0.1)),
                Visibility::default(),
            ),
            (
                RigidBody::Dynamic,
                body.collider(),
                ColliderMassProperties::Mass(mass),
                Friction::coefficient(config.asteroid_friction),
                Restitution::coefficient(0.1),
                velocity,
                Damping {
                    linear_damping: 0.0,
                    angular_damping: 0.0,
                },
                asteroid_groups(),
                ActiveEvents::COLLISION_EVENTS,
            ),
        ))
        .id()
}

/// Make `config.asteroid_count` spawn attempts.  Each attempt draws a scale, an
/// outline and one candidate position; failures are counted, not retried.
pub fn populate_asteroids(
    commands: &mut Commands,
    outlines: &ProceduralOutlines,
    config: &GameplayConfig,
    constraint: &SpawnConstraint,
    rng: &mut impl Rng,
) -> SpawnTally {
    let mut tally = SpawnTally::default();
    for _ in 0..config.asteroid_count {
        let scale = config.asteroid_base_scale
            * config.asteroid_scales.choose(rng).copied().unwrap_or(1.0);
        let Some(id) = outlines.asteroid_ids().choose(rng) else {
            tally.malformed += 1;
            continue;
        };
        let body = match build_body(outlines, id, config.asteroid_outline_step, scale) {
            Ok(body) => body,
            Err(e) => {
                warn!("Skipping asteroid '{id}' at scale {scale}: {e}");
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
            config.asteroid_initial_velocity_range,
            config.asteroid_initial_angvel_range,
        );
        spawn_asteroid(commands, &body, scale, position, velocity, config);
        tally.spawned += 1;
    }
    tally
}

/// Uniform drift in `(-linear, linear)` per axis and spin in `(-angular, angular)`.
pub fn random_velocity(rng: &mut impl Rng, linear: f32, angular: f32) -> Velocity {
    let mut draw = |range: f32| {
        if range > 0.0 {
            rng.gen_range(-range..range)
        } else {
            0.0
        }
    };
    Velocity {
        linvel: Vec2::new(draw(linear), draw(linear)),
        angvel: draw(angular),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_velocity_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let v = random_velocity(&mut rng, 60.0, 1.0);
            assert!(v.linvel.x.abs() < 60.0 && v.linvel.y.abs() < 60.0);
            assert!(v.angvel.abs() < 1.0);
        }
        let still = random_velocity(&mut rng, 0.0, 0.0);
        assert_eq!(still.linvel, Vec2::ZERO);
        assert_eq!(still.angvel, 0.0);
    }

    #[test]
    fn asteroid_groups_accept_rocket_and_loot() {
        let g = asteroid_groups();
        assert!(g.filters.contains(Group::GROUP_2));
        assert!(g.filters.contains(Group::GROUP_3));
    }

    #[test]
    fn populate_counts_every_attempt() {
        let mut world = World::new();
        let config = GameplayConfig {
            asteroid_count: 40,
            ..Default::default()
        };
        let outlines = ProceduralOutlines::default();
        let zone = SpawnConstraint::new(config.start_position(), config.safe_zone_radius);
        let mut rng = StdRng::seed_from_u64(3);

        let tally = populate_asteroids(&mut world.commands(), &outlines, &config, &zone, &mut rng);
        world.flush();

        assert_eq!(tally.attempts(), 40);
        assert_eq!(tally.malformed, 0);
        let spawned = world
            .query_filtered::<Entity, With<Asteroid>>()
            .iter(&world)
            .count();
        assert_eq!(spawned, tally.spawned);
    }
}
