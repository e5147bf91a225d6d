//! Runtime gameplay configuration loaded from `assets/gameplay.toml`.
//!
//! [`GameplayConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_gameplay_config`] reads
//! `assets/gameplay.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! A file that parses but fails [`GameplayConfig::validate`] is rejected as a
//! whole; the simulation keeps running on defaults.

use crate::collision::DamageModel;
use crate::constants::*;
use crate::error::{GameError, GameResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Path of the optional override file, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/gameplay.toml";

/// Runtime-tunable gameplay configuration.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    // ── Map ──────────────────────────────────────────────────────────────────
    pub map_size: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub safe_zone_radius: f32,

    // ── Asteroids ────────────────────────────────────────────────────────────
    pub asteroid_count: usize,
    pub asteroid_base_scale: f32,
    pub asteroid_scales: Vec<f32>,
    pub asteroid_density: f32,
    pub asteroid_outline_step: f32,
    pub asteroid_initial_velocity_range: f32,
    pub asteroid_initial_angvel_range: f32,
    pub asteroid_friction: f32,

    // ── Loot ─────────────────────────────────────────────────────────────────
    pub loot_count: usize,
    pub loot_scales: Vec<f32>,
    pub loot_density: f32,
    pub loot_outline_step: f32,
    pub loot_value_per_scale: f32,
    pub loot_refuel_per_value: f32,
    pub loot_initial_velocity_range: f32,
    pub loot_initial_angvel_range: f32,

    // ── Rocket ───────────────────────────────────────────────────────────────
    pub fuel_capacity: f32,
    pub rocket_outline_step: f32,
    pub fuel_tick_secs: f64,
    pub fuel_rate_main: f32,
    pub fuel_rate_side: f32,
    pub fuel_rate_brake: f32,
    pub rocket_max_health: f32,
    pub rocket_mass: f32,
    pub main_thrust_force: f32,
    pub side_thrust_force: f32,
    pub side_thruster_offset: f32,
    pub brake_linear_step: f32,
    pub brake_angular_step: f32,
    pub rocket_linear_damping: f32,
    pub rocket_angular_damping: f32,
    pub damage_flash_secs: f64,

    // ── Collision damage ─────────────────────────────────────────────────────
    pub min_damage_mass: f32,
    pub max_damage_mass: f32,
    pub min_damage_speed: f32,
    pub max_damage_speed: f32,
    pub max_damage: u32,

    // ── Particles ────────────────────────────────────────────────────────────
    pub particle_pool_capacity: usize,
    pub particle_tick_secs: f64,
    pub particle_lifespan: f32,
    pub particle_velocity_decay: f32,
    pub emitter_cooldown_secs: f64,
    pub exhaust_speed: f32,
    pub particle_base_scale: f32,

    // ── Camera ───────────────────────────────────────────────────────────────
    pub camera_follow_ratio: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            // Map
            map_size: MAP_SIZE,
            start_x: START_X,
            start_y: START_Y,
            safe_zone_radius: SAFE_ZONE_RADIUS,
            // Asteroids
            asteroid_count: ASTEROID_COUNT,
            asteroid_base_scale: ASTEROID_BASE_SCALE,
            asteroid_scales: ASTEROID_SCALES.to_vec(),
            asteroid_density: ASTEROID_DENSITY,
            asteroid_outline_step: ASTEROID_OUTLINE_STEP,
            asteroid_initial_velocity_range: ASTEROID_INITIAL_VELOCITY_RANGE,
            asteroid_initial_angvel_range: ASTEROID_INITIAL_ANGVEL_RANGE,
            asteroid_friction: ASTEROID_FRICTION,
            // Loot
            loot_count: LOOT_COUNT,
            loot_scales: LOOT_SCALES.to_vec(),
            loot_density: LOOT_DENSITY,
            loot_outline_step: LOOT_OUTLINE_STEP,
            loot_value_per_scale: LOOT_VALUE_PER_SCALE,
            loot_refuel_per_value: LOOT_REFUEL_PER_VALUE,
            loot_initial_velocity_range: LOOT_INITIAL_VELOCITY_RANGE,
            loot_initial_angvel_range: LOOT_INITIAL_ANGVEL_RANGE,
            // Rocket
            fuel_capacity: ROCKET_FUEL_CAPACITY,
            rocket_outline_step: ROCKET_OUTLINE_STEP,
            fuel_tick_secs: FUEL_TICK_SECS,
            fuel_rate_main: FUEL_RATE_MAIN,
            fuel_rate_side: FUEL_RATE_SIDE,
            fuel_rate_brake: FUEL_RATE_BRAKE,
            rocket_max_health: ROCKET_MAX_HEALTH,
            rocket_mass: ROCKET_MASS,
            main_thrust_force: MAIN_THRUST_FORCE,
            side_thrust_force: SIDE_THRUST_FORCE,
            side_thruster_offset: SIDE_THRUSTER_OFFSET,
            brake_linear_step: BRAKE_LINEAR_STEP,
            brake_angular_step: BRAKE_ANGULAR_STEP,
            rocket_linear_damping: ROCKET_LINEAR_DAMPING,
            rocket_angular_damping: ROCKET_ANGULAR_DAMPING,
            damage_flash_secs: DAMAGE_FLASH_SECS,
            // Collision damage
            min_damage_mass: MIN_DAMAGE_MASS,
            max_damage_mass: MAX_DAMAGE_MASS,
            min_damage_speed: MIN_DAMAGE_SPEED,
            max_damage_speed: MAX_DAMAGE_SPEED,
            max_damage: MAX_DAMAGE,
            // Particles
            particle_pool_capacity: PARTICLE_POOL_CAPACITY,
            particle_tick_secs: PARTICLE_TICK_SECS,
            particle_lifespan: PARTICLE_LIFESPAN,
            particle_velocity_decay: PARTICLE_VELOCITY_DECAY,
            emitter_cooldown_secs: EMITTER_COOLDOWN_SECS,
            exhaust_speed: EXHAUST_SPEED,
            particle_base_scale: PARTICLE_BASE_SCALE,
            // Camera
            camera_follow_ratio: CAMERA_FOLLOW_RATIO,
        }
    }
}

impl GameplayConfig {
    /// Rocket spawn point and safe-zone centre.
    pub fn start_position(&self) -> Vec2 {
        Vec2::new(self.start_x, self.start_y)
    }

    /// Damage thresholds as a standalone model for the resolver.
    pub fn damage_model(&self) -> DamageModel {
        DamageModel {
            min_mass: self.min_damage_mass,
            max_mass: self.max_damage_mass,
            min_speed: self.min_damage_speed,
            max_speed: self.max_damage_speed,
            max_damage: self.max_damage,
        }
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> GameResult<()> {
        fn check(ok: bool, field: &'static str, reason: &'static str) -> GameResult<()> {
            if ok {
                Ok(())
            } else {
                Err(GameError::InvalidConfig { field, reason })
            }
        }

        check(self.map_size > 0.0, "map_size", "must be positive")?;
        check(
            self.safe_zone_radius >= 0.0,
            "safe_zone_radius",
            "must not be negative",
        )?;
        check(
            !self.asteroid_scales.is_empty(),
            "asteroid_scales",
            "must list at least one scale",
        )?;
        check(
            self.asteroid_scales.iter().all(|s| *s > 0.0),
            "asteroid_scales",
            "every scale must be positive",
        )?;
        check(
            !self.loot_scales.is_empty(),
            "loot_scales",
            "must list at least one scale",
        )?;
        check(
            self.loot_scales.iter().all(|s| *s > 0.0),
            "loot_scales",
            "every scale must be positive",
        )?;
        check(
            self.asteroid_outline_step > 0.0,
            "asteroid_outline_step",
            "must be positive",
        )?;
        check(
            self.loot_outline_step > 0.0,
            "loot_outline_step",
            "must be positive",
        )?;
        check(
            self.rocket_outline_step > 0.0,
            "rocket_outline_step",
            "must be positive",
        )?;
        check(self.fuel_capacity > 0.0, "fuel_capacity", "must be positive")?;
        check(self.fuel_tick_secs > 0.0, "fuel_tick_secs", "must be positive")?;
        check(self.rocket_mass > 0.0, "rocket_mass", "must be positive")?;
        check(
            self.rocket_max_health > 0.0,
            "rocket_max_health",
            "must be positive",
        )?;
        check(
            self.max_damage_mass > self.min_damage_mass,
            "max_damage_mass",
            "must exceed min_damage_mass",
        )?;
        check(
            self.max_damage_speed > self.min_damage_speed,
            "max_damage_speed",
            "must exceed min_damage_speed",
        )?;
        check(self.max_damage >= 1, "max_damage", "must be at least 1")?;
        check(
            self.particle_pool_capacity >= 1,
            "particle_pool_capacity",
            "must be at least 1",
        )?;
        check(
            self.particle_tick_secs > 0.0,
            "particle_tick_secs",
            "must be positive",
        )?;
        check(
            self.particle_lifespan > 0.0,
            "particle_lifespan",
            "must be positive",
        )?;
        check(
            (0.0..=1.0).contains(&self.particle_velocity_decay),
            "particle_velocity_decay",
            "must be within [0, 1]",
        )?;
        check(
            self.camera_follow_ratio > 0.0 && self.camera_follow_ratio <= 1.0,
            "camera_follow_ratio",
            "must be within (0, 1]",
        )
    }

    /// Parse a TOML document on top of the defaults and validate the result.
    pub fn from_toml_str(contents: &str) -> GameResult<Self> {
        let loaded =
            toml::from_str::<GameplayConfig>(contents).map_err(|e| GameError::ConfigParse {
                reason: e.to_string(),
            })?;
        loaded.validate()?;
        Ok(loaded)
    }
}

/// Startup system: attempt to load `assets/gameplay.toml` and overwrite the
/// `GameplayConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse and validation errors
/// are logged but do not abort the game.
pub fn load_gameplay_config(mut config: ResMut<GameplayConfig>) {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match GameplayConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded gameplay config from {CONFIG_PATH}");
            }
            Err(e) => {
                warn!("Failed to load {CONFIG_PATH}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {CONFIG_PATH} found; using compiled defaults");
        }
    }
}
