//! Centralised gameplay constants.
//!
//! Every tunable value lives here so it can be found and reasoned about in one
//! place.  [`crate::config::GameplayConfig::default`] is built entirely from
//! these values; `assets/gameplay.toml` overrides them at runtime.
//!
//! ## Units
//!
//! Distances are world units (one unit = one pixel at zoom 1).  Velocities are
//! units per **second**, matching Rapier.  Times are seconds.

// ── Map ───────────────────────────────────────────────────────────────────────

/// Side length of the square play field.  Entities spawn in `[0, MAP_SIZE)` on each axis.
pub const MAP_SIZE: f32 = 5000.0;

/// Rocket start position (centre of the map).
pub const START_X: f32 = 2500.0;
pub const START_Y: f32 = 2500.0;

/// Radius around the start position kept clear of asteroids and loot.
///
/// Measured from the start point to the nearest edge of the entity's bounding
/// circle, so a large asteroid needs a larger centre distance to be accepted.
pub const SAFE_ZONE_RADIUS: f32 = 300.0;

// ── Asteroids ─────────────────────────────────────────────────────────────────

/// Number of asteroid spawn *attempts* at level build.  Rejected placements are
/// not retried, so the live count is usually a little lower.
pub const ASTEROID_COUNT: usize = 300;

/// Multiplier applied to every entry of [`ASTEROID_SCALES`].
pub const ASTEROID_BASE_SCALE: f32 = 0.1;

/// Weighted scale table: one entry is drawn uniformly per asteroid, so repeated
/// entries make small rocks common and the `15.0` giant rare.
pub const ASTEROID_SCALES: [f32; 16] = [
    0.5, 0.5, 0.5, 0.5, 0.5, 3.0, 4.0, 3.0, 1.0, 2.0, 4.0, 5.0, 5.0, 6.0, 7.0, 15.0,
];

/// Mass per square world unit.  A rock of scale 1.5 (radius ≈ 375) weighs a few hundred.
pub const ASTEROID_DENSITY: f32 = 0.001;

/// Arc-length spacing used when sampling asteroid outlines.
pub const ASTEROID_OUTLINE_STEP: f32 = 100.0;

/// Number of distinct procedural asteroid outlines in the built-in library.
pub const ASTEROID_OUTLINE_VARIANTS: usize = 21;

/// Nominal radius of an unscaled asteroid outline.
pub const ASTEROID_OUTLINE_RADIUS: f32 = 250.0;

/// Seed for the built-in procedural outline library.
pub const OUTLINE_SEED: u64 = 0x5A1_7A6E;

/// Initial linear speed range per axis (u/s) for freshly spawned asteroids.
pub const ASTEROID_INITIAL_VELOCITY_RANGE: f32 = 60.0;

/// Initial angular speed upper bound (rad/s).
pub const ASTEROID_INITIAL_ANGVEL_RANGE: f32 = 1.0;

/// Contact friction for asteroids.
pub const ASTEROID_FRICTION: f32 = 1.0;

// ── Loot ──────────────────────────────────────────────────────────────────────

/// Number of loot spawn attempts at level build.
pub const LOOT_COUNT: usize = 50;

/// Scale table for loot crystals (drawn uniformly).
pub const LOOT_SCALES: [f32; 4] = [0.3, 0.4, 0.5, 0.6];

pub const LOOT_DENSITY: f32 = 0.001;

/// Loot outlines are small; sample them finely.
pub const LOOT_OUTLINE_STEP: f32 = 10.0;

/// Nominal radius of the unscaled loot outline.
pub const LOOT_OUTLINE_RADIUS: f32 = 40.0;

/// Loot value per unit of scale: a scale-0.5 crystal is worth 5.
pub const LOOT_VALUE_PER_SCALE: f32 = 10.0;

/// Fuel restored per unit of loot value on pickup.
pub const LOOT_REFUEL_PER_VALUE: f32 = 10.0;

pub const LOOT_INITIAL_VELOCITY_RANGE: f32 = 30.0;
pub const LOOT_INITIAL_ANGVEL_RANGE: f32 = 0.5;

// ── Rocket ────────────────────────────────────────────────────────────────────

pub const ROCKET_FUEL_CAPACITY: f32 = 1000.0;

/// Arc-length spacing used when sampling the rocket hull outline.
pub const ROCKET_OUTLINE_STEP: f32 = 4.0;

/// Fuel is billed once per this many seconds of simulated time.
pub const FUEL_TICK_SECS: f64 = 0.1;

/// Fuel consumed per tick by each thruster while active.
pub const FUEL_RATE_MAIN: f32 = 2.0;
pub const FUEL_RATE_SIDE: f32 = 1.0;
pub const FUEL_RATE_BRAKE: f32 = 1.0;

pub const ROCKET_MAX_HEALTH: f32 = 100.0;

pub const ROCKET_MASS: f32 = 1.0;

/// Forward force of the main engine (units·mass/s²).
pub const MAIN_THRUST_FORCE: f32 = 240.0;

/// Lateral force of each side thruster, applied at [`SIDE_THRUSTER_OFFSET`].
pub const SIDE_THRUST_FORCE: f32 = 40.0;

/// Distance from the centre of mass to the rear thruster cluster (local −Y).
pub const SIDE_THRUSTER_OFFSET: f32 = 24.0;

/// Linear speed removed per frame while braking (u/s).
pub const BRAKE_LINEAR_STEP: f32 = 4.0;

/// Angular speed removed per frame while braking (rad/s).
pub const BRAKE_ANGULAR_STEP: f32 = 0.05;

pub const ROCKET_LINEAR_DAMPING: f32 = 0.0;
pub const ROCKET_ANGULAR_DAMPING: f32 = 0.5;

/// How long the hull stays in the damage colour after a hit.
pub const DAMAGE_FLASH_SECS: f64 = 0.2;

// ── Collision damage ──────────────────────────────────────────────────────────

/// Bodies lighter than this never hurt the rocket.
pub const MIN_DAMAGE_MASS: f32 = 0.2;

/// Bodies at or above this mass deal the full mass component of damage.
pub const MAX_DAMAGE_MASS: f32 = 1000.0;

/// Impact speed (u/s) below which contacts are harmless (0.4 u/tick at 60 Hz).
pub const MIN_DAMAGE_SPEED: f32 = 24.0;

/// Impact speed (u/s) at which the speed multiplier saturates (10 u/tick at 60 Hz).
pub const MAX_DAMAGE_SPEED: f32 = 600.0;

pub const MAX_DAMAGE: u32 = 10;

// ── Particles ─────────────────────────────────────────────────────────────────

/// Hard upper bound on pooled smoke particles.
pub const PARTICLE_POOL_CAPACITY: usize = 200;

/// Life is decremented by one every this many seconds.
pub const PARTICLE_TICK_SECS: f64 = 0.05;

/// Default starting life in ticks (20 × 50 ms = 1 s).
pub const PARTICLE_LIFESPAN: f32 = 20.0;

/// Geometric velocity decay applied once per life tick.
pub const PARTICLE_VELOCITY_DECAY: f32 = 0.9;

/// Minimum seconds between two particles from the same thruster.
pub const EMITTER_COOLDOWN_SECS: f64 = 0.03;

/// Exhaust speed relative to the rocket (u/s).
pub const EXHAUST_SPEED: f32 = 120.0;

pub const PARTICLE_BASE_SCALE: f32 = 1.0;

// ── Camera ────────────────────────────────────────────────────────────────────

/// Fraction of the remaining distance the camera closes each frame.
pub const CAMERA_FOLLOW_RATIO: f32 = 0.1;
