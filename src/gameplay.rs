//! Gameplay manager: level lifecycle and per-frame ordering.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──Start──▶ Running ──Teardown──▶ TornDown
//! ```
//!
//! Transitions are requested with [`LevelCommand`] messages.  Anything else
//! (a second `Start`, `Start` after teardown) is logged and ignored; a torn
//! down level never runs again.
//!
//! ## Frame order (PostUpdate, only while `Running`)
//!
//! | Set            | Runs                                               |
//! |----------------|----------------------------------------------------|
//! | `Snapshot`     | before Rapier syncs: record pre-step velocities    |
//! | *(Rapier)*     | sync, step, writeback; collision events written    |
//! | `Resolve`      | loot pickup and hull damage                        |
//! | `Entities`     | rocket thrust, brake, fuel, flash, exhaust         |
//! | `Effects`      | particle pool ageing and render sync               |
//! | `Presentation` | camera focus and HUD readout                       |
//!
//! All sets after Rapier also finish before transform propagation, so a
//! teleport or camera move is visible in the same frame's `GlobalTransform`.
//!
//! Asteroids and loot need no update of their own: Rapier's writeback moves
//! the `Transform` their visuals hang off.

use crate::asteroid::populate_asteroids;
use crate::collision::{resolve_collisions_system, snapshot_velocities_system, VelocitySnapshot};
use crate::config::GameplayConfig;
use crate::input::{apply_thruster_commands_system, InputPolicy, ThrusterCommand};
use crate::loot::{populate_loot, LootCounter};
use crate::outline::ProceduralOutlines;
use crate::particles::{
    particle_pool_update_system, register_particle_entities_system,
    sync_particle_transforms_system, ParticlePool,
};
use crate::placement::{SpawnConstraint, SpawnTally};
use crate::rocket::{
    rocket_update_system, spawn_rocket, teleport_rocket_system, FuelTank, Hull, Rocket,
    RocketDestroyed, TeleportRocket,
};
use bevy::prelude::*;
use bevy::transform::TransformSystems;
use bevy_rapier2d::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── State & messages ─────────────────────────────────────────────────────────

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LevelState {
    #[default]
    Uninitialized,
    Running,
    TornDown,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelCommand {
    Start,
    Teardown,
}

impl LevelState {
    /// The state `command` leads to, or `None` if it is not allowed from here.
    pub fn transition(self, command: LevelCommand) -> Option<LevelState> {
        match (self, command) {
            (LevelState::Uninitialized, LevelCommand::Start) => Some(LevelState::Running),
            (LevelState::Running, LevelCommand::Teardown) => Some(LevelState::TornDown),
            _ => None,
        }
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameplaySet {
    Snapshot,
    Resolve,
    Entities,
    Effects,
    Presentation,
}

// ── Components & resources ───────────────────────────────────────────────────

/// Everything despawned on teardown.
#[derive(Component, Debug, Clone, Copy)]
pub struct LevelEntity;

/// Fixed seed for level generation; `None` draws from the OS.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct LevelSeed(pub Option<u64>);

/// What the last level build produced.
#[derive(Resource, Debug, Default, Clone)]
pub struct LevelReport {
    pub rocket: Option<Entity>,
    pub asteroids: SpawnTally,
    pub loot: SpawnTally,
}

/// Point the host camera should look at; eases toward the rocket each frame.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct CameraFocus {
    pub position: Vec2,
}

/// Read-only values for the host HUD, refreshed every frame.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct HudReadout {
    fuel: f32,
    fuel_capacity: f32,
    health: f32,
    loot_count: u32,
    loot_value: f32,
}

impl HudReadout {
    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    pub fn fuel_capacity(&self) -> f32 {
        self.fuel_capacity
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn loot_count(&self) -> u32 {
        self.loot_count
    }

    pub fn loot_value(&self) -> f32 {
        self.loot_value
    }
}

// ── Plugin ───────────────────────────────────────────────────────────────────

pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<LevelState>()
            .add_message::<LevelCommand>()
            .add_message::<ThrusterCommand>()
            .add_message::<TeleportRocket>()
            .add_message::<RocketDestroyed>()
            .add_message::<CollisionEvent>()
            .init_resource::<GameplayConfig>()
            .init_resource::<ProceduralOutlines>()
            .init_resource::<VelocitySnapshot>()
            .init_resource::<ParticlePool>()
            .init_resource::<LootCounter>()
            .init_resource::<LevelReport>()
            .init_resource::<LevelSeed>()
            .init_resource::<CameraFocus>()
            .init_resource::<HudReadout>()
            .init_resource::<InputPolicy>()
            .configure_sets(
                PostUpdate,
                (
                    GameplaySet::Snapshot.before(PhysicsSet::SyncBackend),
                    (
                        GameplaySet::Resolve,
                        GameplaySet::Entities,
                        GameplaySet::Effects,
                        GameplaySet::Presentation,
                    )
                        .chain()
                        .after(PhysicsSet::Writeback)
                        .before(TransformSystems::Propagate),
                )
                    .run_if(in_state(LevelState::Running)),
            )
            .add_systems(
                Update,
                (
                    level_command_system,
                    apply_thruster_commands_system.run_if(in_state(LevelState::Running)),
                ),
            )
            .add_systems(OnEnter(LevelState::Running), init_level)
            .add_systems(OnEnter(LevelState::TornDown), destroy_level)
            .add_systems(
                PostUpdate,
                (
                    snapshot_velocities_system.in_set(GameplaySet::Snapshot),
                    resolve_collisions_system.in_set(GameplaySet::Resolve),
                    (teleport_rocket_system, rocket_update_system)
                        .chain()
                        .in_set(GameplaySet::Entities),
                    (
                        particle_pool_update_system,
                        register_particle_entities_system,
                        sync_particle_transforms_system,
                    )
                        .chain()
                        .in_set(GameplaySet::Effects),
                    (camera_follow_system, hud_readout_system).in_set(GameplaySet::Presentation),
                ),
            );
    }
}

// ── Systems ──────────────────────────────────────────────────────────────────

pub fn level_command_system(
    mut requests: MessageReader<LevelCommand>,
    state: Res<State<LevelState>>,
    mut next: ResMut<NextState<LevelState>>,
) {
    let mut current = *state.get();
    for command in requests.read() {
        match current.transition(*command) {
            Some(target) => {
                info!("Level {current:?} -> {target:?}");
                next.set(target);
                current = target;
            }
            None => warn!("Ignoring {command:?} while level is {current:?}"),
        }
    }
}

/// Build the level: rocket at the start point, then asteroids and loot outside
/// the safe zone.  A rocket that cannot be built aborts the level.
#[allow(clippy::too_many_arguments)]
pub fn init_level(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameplayConfig>,
    outlines: Res<ProceduralOutlines>,
    seed: Res<LevelSeed>,
    mut pool: ResMut<ParticlePool>,
    mut counter: ResMut<LootCounter>,
    mut report: ResMut<LevelReport>,
    mut focus: ResMut<CameraFocus>,
    mut next: ResMut<NextState<LevelState>>,
) {
    for entity in pool.clear() {
        commands.entity(entity).despawn();
    }
    *pool = ParticlePool::new(config.particle_pool_capacity);
    *counter = LootCounter::default();

    let start = config.start_position();
    let rocket = match spawn_rocket(
        &mut commands,
        outlines.as_ref(),
        &config,
        start,
        time.elapsed_secs_f64(),
    ) {
        Ok(rocket) => rocket,
        Err(e) => {
            error!("Level start aborted, rocket could not be built: {e}");
            next.set(LevelState::TornDown);
            return;
        }
    };
    focus.position = start;

    let mut rng = match seed.0 {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let zone = SpawnConstraint::new(start, config.safe_zone_radius);
    let asteroids = populate_asteroids(&mut commands, &outlines, &config, &zone, &mut rng);
    let loot = populate_loot(&mut commands, &outlines, &config, &zone, &mut rng);

    info!(
        "Level ready: {} asteroids ({} rejected, {} malformed), {} loot ({} rejected, {} malformed)",
        asteroids.spawned,
        asteroids.rejected,
        asteroids.malformed,
        loot.spawned,
        loot.rejected,
        loot.malformed
    );
    *report = LevelReport {
        rocket: Some(rocket),
        asteroids,
        loot,
    };
}

/// Despawn every level body and all pooled particle visuals.
pub fn destroy_level(
    mut commands: Commands,
    level: Query<Entity, With<LevelEntity>>,
    mut pool: ResMut<ParticlePool>,
    mut snapshot: ResMut<VelocitySnapshot>,
) {
    let mut removed = 0;
    for entity in level.iter() {
        commands.entity(entity).despawn();
        removed += 1;
    }
    let live = pool.active_count();
    for entity in pool.clear() {
        commands.entity(entity).despawn();
    }
    snapshot.clear();
    info!("Level torn down ({removed} bodies, {live} live particles removed)");
}

pub fn camera_follow_system(
    config: Res<GameplayConfig>,
    rockets: Query<&Transform, With<Rocket>>,
    mut focus: ResMut<CameraFocus>,
) {
    let Ok(transform) = rockets.single() else {
        return;
    };
    let target = transform.translation.truncate();
    focus.position = focus.position.lerp(target, config.camera_follow_ratio);
}

pub fn hud_readout_system(
    rockets: Query<(&FuelTank, &Hull), With<Rocket>>,
    counter: Res<LootCounter>,
    mut hud: ResMut<HudReadout>,
) {
    if let Ok((tank, hull)) = rockets.single() {
        hud.fuel = tank.fuel;
        hud.fuel_capacity = tank.capacity;
        hud.health = hull.health;
    }
    hud.loot_count = counter.count;
    hud.loot_value = counter.total_value;
}
