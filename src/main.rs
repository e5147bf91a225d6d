use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;
use salvage::config::{load_gameplay_config, GameplayConfig};
use salvage::gameplay::{GameplayPlugin, LevelCommand, LevelSeed};
use salvage::input::{apply_thruster_commands_system, keyboard_thruster_system};
use salvage::rendering::RenderingPlugin;
use salvage::rocket::RocketDestroyed;
use std::env;

/// Space has no gravity.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

fn start_level(mut requests: MessageWriter<LevelCommand>) {
    requests.write(LevelCommand::Start);
}

/// A wrecked rocket ends the level.
fn end_level_on_destruction(
    mut destroyed: MessageReader<RocketDestroyed>,
    mut requests: MessageWriter<LevelCommand>,
) {
    if let Some(event) = destroyed.read().last() {
        warn!("Rocket {:?} destroyed", event.rocket);
        requests.write(LevelCommand::Teardown);
    }
}

fn main() {
    // SALVAGE_SEED pins level generation for reproducible runs.
    let seed = env::var("SALVAGE_SEED")
        .ok()
        .and_then(|s| s.parse::<u64>().ok());

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Salvage".into(),
                resolution: WindowResolution::new(1200, 680),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(GameplayConfig::default())
        .insert_resource(LevelSeed(seed))
        // One world unit per pixel keeps force and mass values in the same scale
        // as the outline coordinates.
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
        .add_plugins((GameplayPlugin, RenderingPlugin))
        .add_systems(
            Startup,
            (
                load_gameplay_config,
                start_level.after(load_gameplay_config),
                setup_physics_config,
            ),
        )
        .add_systems(
            Update,
            (
                keyboard_thruster_system.before(apply_thruster_commands_system),
                end_level_on_destruction,
            ),
        )
        .run();
}
