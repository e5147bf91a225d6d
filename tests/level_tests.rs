//! Headless tests for the level lifecycle and collision outcomes.
//!
//! These run [`GameplayPlugin`] on [`MinimalPlugins`] without Rapier: bodies
//! never move and collision events are written by hand, so every frame is
//! deterministic.
//!
//! Covered scenarios:
//! 1. `Start` builds the level: rocket at the start point, tallies add up.
//! 2. Nothing large spawns inside the safe zone.
//! 3. Two contacts with the same loot in one frame collect it once.
//! 4. An impact uses the pre-step velocity snapshot and flashes the hull.
//! 5. A fatal impact reports destruction exactly once.
//! 6. `Teardown` removes every level body; a later `Start` is ignored.
//! 7. A teleport reaches `GlobalTransform` in the frame it is requested.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::transform::TransformPlugin;
use bevy_rapier2d::prelude::*;
use bevy_rapier2d::rapier::geometry::CollisionEventFlags;
use salvage::asteroid::Asteroid;
use salvage::collision::BodyMass;
use salvage::config::GameplayConfig;
use salvage::gameplay::{
    GameplayPlugin, HudReadout, LevelCommand, LevelEntity, LevelReport, LevelSeed, LevelState,
};
use salvage::loot::{Loot, LootCounter};
use salvage::rocket::{FuelTank, Hull, HullTint, Rocket, RocketDestroyed, TeleportRocket};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Resource, Default)]
struct DestroyedCount(usize);

fn count_destroyed(mut reader: MessageReader<RocketDestroyed>, mut count: ResMut<DestroyedCount>) {
    count.0 += reader.read().count();
}

fn test_config() -> GameplayConfig {
    GameplayConfig {
        asteroid_count: 40,
        loot_count: 20,
        ..Default::default()
    }
}

/// A seeded level that has already processed `Start`.
fn running_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, TransformPlugin));
    app.insert_resource(test_config());
    app.insert_resource(LevelSeed(Some(7)));
    app.add_plugins(GameplayPlugin);
    app.init_resource::<DestroyedCount>();
    app.add_systems(Last, count_destroyed);

    app.world_mut().write_message(LevelCommand::Start);
    app.update(); // command read, transition queued
    app.update(); // OnEnter(Running) builds the level
    app
}

fn state(app: &App) -> LevelState {
    *app.world().resource::<State<LevelState>>().get()
}

fn rocket(app: &mut App) -> Entity {
    app.world_mut()
        .query_filtered::<Entity, With<Rocket>>()
        .single(app.world())
        .expect("level has one rocket")
}

fn first<T: Component>(app: &mut App) -> Entity {
    app.world_mut()
        .query_filtered::<Entity, With<T>>()
        .iter(app.world())
        .next()
        .expect("seeded level spawns at least one")
}

fn touch(app: &mut App, a: Entity, b: Entity) {
    app.world_mut()
        .write_message(CollisionEvent::Started(a, b, CollisionEventFlags::empty()));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn start_builds_the_level() {
    let mut app = running_app();
    assert_eq!(state(&app), LevelState::Running);

    let config = test_config();
    let rocket = rocket(&mut app);
    let t = app.world().get::<Transform>(rocket).unwrap();
    assert_eq!(t.translation.truncate(), config.start_position());
    let tank = app.world().get::<FuelTank>(rocket).unwrap();
    assert_eq!(tank.fuel, config.fuel_capacity);

    let report = app.world().resource::<LevelReport>().clone();
    assert_eq!(report.rocket, Some(rocket));
    assert_eq!(report.asteroids.attempts(), config.asteroid_count);
    assert_eq!(report.loot.attempts(), config.loot_count);
    assert_eq!(report.asteroids.malformed, 0);

    let asteroids = app
        .world_mut()
        .query_filtered::<Entity, With<Asteroid>>()
        .iter(app.world())
        .count();
    let loot = app
        .world_mut()
        .query_filtered::<Entity, With<Loot>>()
        .iter(app.world())
        .count();
    assert_eq!(asteroids, report.asteroids.spawned);
    assert_eq!(loot, report.loot.spawned);

    let hud = *app.world().resource::<HudReadout>();
    assert_eq!(hud.fuel(), config.fuel_capacity);
    assert_eq!(hud.health(), config.rocket_max_health);
}

#[test]
fn safe_zone_stays_clear_of_asteroids() {
    let mut app = running_app();
    let config = test_config();
    let start = config.start_position();
    let mut query = app
        .world_mut()
        .query_filtered::<&Transform, With<Asteroid>>();
    for t in query.iter(app.world()) {
        assert!(
            t.translation.truncate().distance(start) > config.safe_zone_radius,
            "asteroid at {:?} inside the safe zone",
            t.translation
        );
    }
}

#[test]
fn loot_is_collected_once_per_contact_burst() {
    let mut app = running_app();
    let rocket = rocket(&mut app);
    let loot = first::<Loot>(&mut app);
    let value = app.world().get::<Loot>(loot).unwrap().value;

    touch(&mut app, rocket, loot);
    touch(&mut app, loot, rocket);
    app.update();

    let counter = *app.world().resource::<LootCounter>();
    assert_eq!(counter.count, 1);
    assert_eq!(counter.total_value, value);
    assert!(app.world().get_entity(loot).is_err(), "loot despawned");

    // A late contact with the vanished body is ignored.
    touch(&mut app, rocket, loot);
    app.update();
    assert_eq!(app.world().resource::<LootCounter>().count, 1);
    assert_eq!(
        app.world().get::<Hull>(rocket).unwrap().health,
        test_config().rocket_max_health
    );
    assert_eq!(app.world().resource::<HudReadout>().loot_count(), 1);
}

#[test]
fn impact_damage_uses_snapshot_speed() {
    let mut app = running_app();
    let config = test_config();
    let rocket = rocket(&mut app);
    let rock = first::<Asteroid>(&mut app);
    app.world_mut().entity_mut(rock).insert((
        BodyMass(config.max_damage_mass),
        Velocity::linear(Vec2::new(config.max_damage_speed, 0.0)),
    ));

    touch(&mut app, rock, rocket);
    app.update();

    let hull = app.world().get::<Hull>(rocket).unwrap();
    assert_eq!(
        hull.health,
        config.rocket_max_health - config.max_damage as f32
    );
    assert_eq!(hull.tint(), HullTint::Damaged);
    assert_eq!(app.world().resource::<DestroyedCount>().0, 0);
}

#[test]
fn slow_touch_does_no_damage() {
    let mut app = running_app();
    let config = test_config();
    let rocket = rocket(&mut app);
    let rock = first::<Asteroid>(&mut app);
    app.world_mut()
        .entity_mut(rock)
        .insert(Velocity::linear(Vec2::new(config.min_damage_speed * 0.5, 0.0)));

    touch(&mut app, rock, rocket);
    app.update();

    let hull = app.world().get::<Hull>(rocket).unwrap();
    assert_eq!(hull.health, config.rocket_max_health);
    assert_eq!(hull.tint(), HullTint::Idle);
}

#[test]
fn destruction_is_reported_once() {
    let mut app = running_app();
    let config = test_config();
    let rocket = rocket(&mut app);
    let rock = first::<Asteroid>(&mut app);
    app.world_mut().entity_mut(rock).insert((
        BodyMass(config.max_damage_mass),
        Velocity::linear(Vec2::new(config.max_damage_speed, 0.0)),
    ));
    app.world_mut().get_mut::<Hull>(rocket).unwrap().health = 5.0;

    touch(&mut app, rock, rocket);
    app.update();
    touch(&mut app, rocket, rock);
    app.update();

    let hull = app.world().get::<Hull>(rocket).unwrap();
    assert_eq!(hull.health, 0.0);
    assert!(hull.is_destroyed());
    assert_eq!(app.world().resource::<DestroyedCount>().0, 1);
}

#[test]
fn teleport_is_visible_the_same_frame() {
    let mut app = running_app();
    let rocket = rocket(&mut app);
    let target = Vec2::new(1234.0, 987.0);

    app.world_mut()
        .write_message(TeleportRocket { position: target });
    app.update();

    let global = app.world().get::<GlobalTransform>(rocket).unwrap();
    assert_eq!(global.translation().truncate(), target);
}

#[test]
fn teardown_removes_level_and_is_final() {
    let mut app = running_app();

    app.world_mut().write_message(LevelCommand::Teardown);
    app.update();
    app.update();
    assert_eq!(state(&app), LevelState::TornDown);
    let remaining = app
        .world_mut()
        .query_filtered::<Entity, With<LevelEntity>>()
        .iter(app.world())
        .count();
    assert_eq!(remaining, 0);

    app.world_mut().write_message(LevelCommand::Start);
    app.update();
    app.update();
    assert_eq!(state(&app), LevelState::TornDown);
    let rockets = app
        .world_mut()
        .query_filtered::<Entity, With<Rocket>>()
        .iter(app.world())
        .count();
    assert_eq!(rockets, 0);
}
