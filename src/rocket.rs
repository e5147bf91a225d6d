//! The player's rocket: thrusters, fuel, hull integrity and exhaust.
//!
//! ## Per-frame update
//!
//! [`rocket_update_system`] runs once per frame after collisions have been
//! resolved.  It
//!
//! 1. derives the forward and lateral axes from the current rotation,
//! 2. overwrites `ExternalForce` with the sum of active thrusters and applies
//!    the brake directly to `Velocity`,
//! 3. bills fuel on a fixed interval measured in simulated time,
//! 4. lets an expired damage flash fall back to the idle tint, and
//! 5. emits exhaust smoke from each firing nozzle through the particle pool.
//!
//! With an empty tank the thrusters are dead: no force, no fuel, no smoke.
//!
//! Thruster flags are independent.  Whether braking cancels the other
//! thrusters is an input-layer policy (see [`crate::input::InputPolicy`]).

use crate::collision::BodyMass;
use crate::config::GameplayConfig;
use crate::error::GameResult;
use crate::gameplay::LevelEntity;
use crate::outline::{build_body, OutlineSource, VisualOutline, ROCKET_OUTLINE_ID};
use crate::particles::{EmitterCooldown, ParticlePool, ParticleSpawn};
use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

// ── Components ───────────────────────────────────────────────────────────────

#[derive(Component, Debug, Clone, Copy)]
pub struct Rocket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Thruster {
    Main,
    Left,
    Right,
    Brake,
}

impl Thruster {
    pub const ALL: [Thruster; 4] = [
        Thruster::Main,
        Thruster::Left,
        Thruster::Right,
        Thruster::Brake,
    ];

    fn index(self) -> usize {
        match self {
            Thruster::Main => 0,
            Thruster::Left => 1,
            Thruster::Right => 2,
            Thruster::Brake => 3,
        }
    }

    /// Nozzle position and exhaust direction in the rocket's local frame (+Y forward).
    fn nozzle(self, offset: f32) -> (Vec2, Vec2) {
        match self {
            Thruster::Main => (Vec2::new(0.0, -offset), Vec2::NEG_Y),
            Thruster::Left => (Vec2::new(0.0, -offset), Vec2::NEG_X),
            Thruster::Right => (Vec2::new(0.0, -offset), Vec2::X),
            Thruster::Brake => (Vec2::new(0.0, offset), Vec2::Y),
        }
    }
}

/// Independent on/off flag per thruster.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Thrusters {
    active: [bool; 4],
}

impl Thrusters {
    pub fn set(&mut self, thruster: Thruster, on: bool) {
        self.active[thruster.index()] = on;
    }

    pub fn is_active(&self, thruster: Thruster) -> bool {
        self.active[thruster.index()]
    }

    pub fn any_active(&self) -> bool {
        self.active.iter().any(|a| *a)
    }

    pub fn active(&self) -> impl Iterator<Item = Thruster> + '_ {
        Thruster::ALL
            .into_iter()
            .filter(move |t| self.is_active(*t))
    }
}

/// Fuel reservoir billed in whole ticks of simulated time.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct FuelTank {
    pub fuel: f32,
    pub capacity: f32,
    epoch: f64,
    ticks_billed: u64,
}

impl FuelTank {
    pub fn new(capacity: f32, now: f64) -> Self {
        Self {
            fuel: capacity,
            capacity,
            epoch: now,
            ticks_billed: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fuel <= 0.0
    }

    /// Timestamp of the most recent billing tick.
    pub fn last_tick(&self, tick: f64) -> f64 {
        self.epoch + self.ticks_billed as f64 * tick
    }

    /// Bill every tick that has elapsed up to `now` at `per_tick`; returns the
    /// amount burned.  Fuel never drops below zero.
    pub fn consume(&mut self, now: f64, tick: f64, per_tick: f32) -> f32 {
        let due = ((now - self.epoch) / tick + 1e-6).floor().max(0.0) as u64;
        let mut burned = 0.0;
        while self.ticks_billed < due {
            self.ticks_billed += 1;
            let take = per_tick.min(self.fuel).max(0.0);
            self.fuel -= take;
            burned += take;
        }
        burned
    }

    pub fn refuel(&mut self, amount: f32) {
        self.fuel = (self.fuel + amount.max(0.0)).min(self.capacity);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HullTint {
    Idle,
    Damaged,
}

/// Health plus the non-stacking damage flash.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Hull {
    pub health: f32,
    pub max_health: f32,
    flash_until: Option<f64>,
    destroyed_reported: bool,
}

impl Hull {
    pub fn new(max_health: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            flash_until: None,
            destroyed_reported: false,
        }
    }

    /// Subtract `amount`, clamp to `[0, max_health]` and restart the flash.
    pub fn damage(&mut self, amount: f32, now: f64, flash_secs: f64) -> f32 {
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        self.flash_until = Some(now + flash_secs);
        self.health
    }

    pub fn update_flash(&mut self, now: f64) {
        if self.flash_until.is_some_and(|until| now >= until) {
            self.flash_until = None;
        }
    }

    pub fn tint(&self) -> HullTint {
        if self.flash_until.is_some() {
            HullTint::Damaged
        } else {
            HullTint::Idle
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// `true` exactly once, the first time this is called on a destroyed hull.
    pub fn take_destruction_report(&mut self) -> bool {
        if self.is_destroyed() && !self.destroyed_reported {
            self.destroyed_reported = true;
            true
        } else {
            false
        }
    }
}

/// One cooldown gate per thruster nozzle.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ThrusterEmitters {
    gates: [EmitterCooldown; 4],
}

impl ThrusterEmitters {
    pub fn try_fire(&mut self, thruster: Thruster, now: f64, cooldown: f64) -> bool {
        self.gates[thruster.index()].try_fire(now, cooldown)
    }
}

// ── Messages ─────────────────────────────────────────────────────────────────

/// Written once when the rocket's health first reaches zero.
#[derive(Message, Debug, Clone, Copy)]
pub struct RocketDestroyed {
    pub rocket: Entity,
}

/// Host request to move the rocket without interpolation.
#[derive(Message, Debug, Clone, Copy)]
pub struct TeleportRocket {
    pub position: Vec2,
}

// ── Pure helpers ─────────────────────────────────────────────────────────────

/// Net force and torque of the active thrusters at heading `angle` (radians, CCW from +Y).
///
/// Side thrusters push laterally at the rear nozzle, so they both turn and
/// slightly translate the hull.  The brake contributes no force.
pub fn thrust_output(angle: f32, thrusters: &Thrusters, config: &GameplayConfig) -> (Vec2, f32) {
    let rot = Vec2::from_angle(angle);
    let forward = rot.rotate(Vec2::Y);
    let right = rot.rotate(Vec2::X);
    let rear = -forward * config.side_thruster_offset;

    let mut force = Vec2::ZERO;
    let mut torque = 0.0;
    if thrusters.is_active(Thruster::Main) {
        force += forward * config.main_thrust_force;
    }
    for (thruster, dir) in [(Thruster::Left, right), (Thruster::Right, -right)] {
        if thrusters.is_active(thruster) {
            let push = dir * config.side_thrust_force;
            force += push;
            torque += rear.perp_dot(push);
        }
    }
    (force, torque)
}

/// Fuel billed per tick for the active thruster set.
pub fn burn_rate(thrusters: &Thrusters, config: &GameplayConfig) -> f32 {
    thrusters
        .active()
        .map(|t| match t {
            Thruster::Main => config.fuel_rate_main,
            Thruster::Left | Thruster::Right => config.fuel_rate_side,
            Thruster::Brake => config.fuel_rate_brake,
        })
        .sum()
}

/// Step linear and angular speed toward zero by fixed decrements.
pub fn apply_brake(velocity: &mut Velocity, linear_step: f32, angular_step: f32) {
    let speed = velocity.linvel.length();
    velocity.linvel = if speed <= linear_step {
        Vec2::ZERO
    } else {
        velocity.linvel * ((speed - linear_step) / speed)
    };
    let spin = velocity.angvel.abs();
    velocity.angvel = if spin <= angular_step {
        0.0
    } else {
        velocity.angvel.signum() * (spin - angular_step)
    };
}

/// Teleport: the body and its visual share this transform.
pub fn set_position(transform: &mut Transform, position: Vec2) {
    transform.translation.x = position.x;
    transform.translation.y = position.y;
}

// ── Spawning ─────────────────────────────────────────────────────────────────

/// Build the rocket hull from the outline source and spawn it at `position`.
pub fn spawn_rocket<S: OutlineSource + ?Sized>(
    commands: &mut Commands,
    source: &S,
    config: &GameplayConfig,
    position: Vec2,
    now: f64,
) -> GameResult<Entity> {
    let body = build_body(source, ROCKET_OUTLINE_ID, config.rocket_outline_step, 1.0)?;
    let mut transform = Transform::from_translation(Vec3::new(0.0, 0.0, 0.5));
    set_position(&mut transform, position);

    let entity = commands
        .spawn((
            (
                Rocket,
                LevelEntity,
                Thrusters::default(),
                FuelTank::new(config.fuel_capacity, now),
                Hull::new(config.rocket_max_health),
                ThrusterEmitters::default(),
                BodyMass(config.rocket_mass),
                VisualOutline::from(&body),
                transform,
                Visibility::default(),
            ),
            (
                RigidBody::Dynamic,
                body.collider(),
                ColliderMassProperties::Mass(config.rocket_mass),
                Velocity::zero(),
                ExternalForce::default(),
                Damping {
                    linear_damping: config.rocket_linear_damping,
                    angular_damping: config.rocket_angular_damping,
                },
                Friction::coefficient(0.3),
                Restitution::coefficient(0.2),
                CollisionGroups::new(Group::GROUP_2, Group::GROUP_1 | Group::GROUP_3),
                ActiveEvents::COLLISION_EVENTS,
                Sleeping::disabled(),
            ),
        ))
        .id();
    Ok(entity)
}

// ── Systems ──────────────────────────────────────────────────────────────────

pub fn rocket_update_system(
    time: Res<Time>,
    config: Res<GameplayConfig>,
    mut pool: ResMut<ParticlePool>,
    mut rockets: Query<
        (
            &Transform,
            &Thrusters,
            &mut FuelTank,
            &mut Hull,
            &mut ThrusterEmitters,
            &mut ExternalForce,
            &mut Velocity,
        ),
        With<Rocket>,
    >,
) {
    let now = time.elapsed_secs_f64();
    for (transform, thrusters, mut tank, mut hull, mut emitters, mut ext, mut velocity) in
        rockets.iter_mut()
    {
        let angle = transform.rotation.to_euler(EulerRot::ZYX).0;
        let powered = !tank.is_empty();

        if powered {
            let (force, torque) = thrust_output(angle, thrusters, &config);
            ext.force = force;
            ext.torque = torque;
            if thrusters.is_active(Thruster::Brake) {
                apply_brake(
                    &mut velocity,
                    config.brake_linear_step,
                    config.brake_angular_step,
                );
            }
        } else {
            ext.force = Vec2::ZERO;
            ext.torque = 0.0;
        }

        let rate = if powered { burn_rate(thrusters, &config) } else { 0.0 };
        tank.consume(now, config.fuel_tick_secs, rate);

        hull.update_flash(now);

        if !powered || !thrusters.any_active() {
            continue;
        }
        let rot = Vec2::from_angle(angle);
        let origin = transform.translation.truncate();
        for thruster in thrusters.active() {
            if !emitters.try_fire(thruster, now, config.emitter_cooldown_secs) {
                continue;
            }
            let (local_pos, local_dir) = thruster.nozzle(config.side_thruster_offset);
            pool.spawn(
                ParticleSpawn {
                    position: origin + rot.rotate(local_pos),
                    velocity: velocity.linvel + rot.rotate(local_dir) * config.exhaust_speed,
                    base_scale: config.particle_base_scale,
                    lifespan: config.particle_lifespan,
                },
                now,
            );
        }
    }
}

pub fn teleport_rocket_system(
    mut requests: MessageReader<TeleportRocket>,
    mut rockets: Query<&mut Transform, With<Rocket>>,
) {
    for request in requests.read() {
        if let Ok(mut transform) = rockets.single_mut() {
            set_position(&mut transform, request.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn cfg() -> GameplayConfig {
        GameplayConfig::default()
    }

    #[test]
    fn main_thruster_burns_ten_fuel_in_half_a_second() {
        let mut tank = FuelTank::new(1000.0, 0.0);
        let mut thrusters = Thrusters::default();
        thrusters.set(Thruster::Main, true);
        let rate = burn_rate(&thrusters, &cfg());
        // 30 frames at 60 Hz.
        for frame in 1..=30 {
            tank.consume(frame as f64 / 60.0, 0.1, rate);
        }
        assert_eq!(tank.fuel, 990.0);
    }

    #[test]
    fn fuel_never_goes_negative() {
        let mut tank = FuelTank::new(3.0, 0.0);
        let burned = tank.consume(10.0, 0.1, 2.0);
        assert_eq!(tank.fuel, 0.0);
        assert_eq!(burned, 3.0);
        assert!(tank.is_empty());
    }

    #[test]
    fn refuel_is_capped() {
        let mut tank = FuelTank::new(100.0, 0.0);
        tank.consume(1.0, 0.1, 5.0);
        assert_eq!(tank.fuel, 50.0);
        tank.refuel(80.0);
        assert_eq!(tank.fuel, 100.0);
    }

    #[test]
    fn idle_ticks_still_advance_the_clock() {
        let mut tank = FuelTank::new(100.0, 0.0);
        tank.consume(0.35, 0.1, 0.0);
        assert!((tank.last_tick(0.1) - 0.3).abs() < 1e-9);
        // Turning the engine on later does not back-bill idle time.
        tank.consume(0.4, 0.1, 2.0);
        assert_eq!(tank.fuel, 98.0);
    }

    #[test]
    fn burn_rate_sums_active_thrusters() {
        let mut t = Thrusters::default();
        assert_eq!(burn_rate(&t, &cfg()), 0.0);
        t.set(Thruster::Main, true);
        t.set(Thruster::Left, true);
        t.set(Thruster::Brake, true);
        assert_eq!(burn_rate(&t, &cfg()), 4.0);
    }

    #[test]
    fn damage_clamps_at_zero() {
        let mut hull = Hull::new(100.0);
        assert_eq!(hull.damage(30.0, 0.0, 0.2), 70.0);
        assert_eq!(hull.damage(500.0, 0.1, 0.2), 0.0);
        assert!(hull.is_destroyed());
        assert!(hull.take_destruction_report());
        assert!(!hull.take_destruction_report());
    }

    #[test]
    fn negative_damage_cannot_overheal() {
        let mut hull = Hull::new(100.0);
        hull.damage(-40.0, 0.0, 0.2);
        assert_eq!(hull.health, 100.0);
    }

    #[test]
    fn second_hit_restarts_flash() {
        let mut hull = Hull::new(100.0);
        hull.damage(1.0, 0.0, 0.2);
        hull.damage(1.0, 0.15, 0.2);
        hull.update_flash(0.25);
        assert_eq!(hull.tint(), HullTint::Damaged);
        hull.update_flash(0.36);
        assert_eq!(hull.tint(), HullTint::Idle);
    }

    #[test]
    fn main_thrust_follows_heading() {
        let mut t = Thrusters::default();
        t.set(Thruster::Main, true);
        let (f, torque) = thrust_output(0.0, &t, &cfg());
        assert!((f - Vec2::new(0.0, cfg().main_thrust_force)).length() < 1e-3);
        assert_eq!(torque, 0.0);

        let (f, _) = thrust_output(FRAC_PI_2, &t, &cfg());
        assert!((f.normalize() - Vec2::NEG_X).length() < 1e-4);
    }

    #[test]
    fn side_thrusters_turn_in_opposite_directions() {
        let mut left = Thrusters::default();
        left.set(Thruster::Left, true);
        let mut right = Thrusters::default();
        right.set(Thruster::Right, true);
        let (_, tl) = thrust_output(0.3, &left, &cfg());
        let (_, tr) = thrust_output(0.3, &right, &cfg());
        let expected = cfg().side_thrust_force * cfg().side_thruster_offset;
        assert!((tl - expected).abs() < 1e-2);
        assert!((tr + expected).abs() < 1e-2);
    }

    #[test]
    fn brake_steps_toward_zero() {
        let mut v = Velocity {
            linvel: Vec2::new(30.0, 40.0),
            angvel: -0.12,
        };
        apply_brake(&mut v, 4.0, 0.05);
        assert!((v.linvel.length() - 46.0).abs() < 1e-4);
        assert!((v.angvel + 0.07).abs() < 1e-6);
        apply_brake(&mut v, 100.0, 1.0);
        assert_eq!(v.linvel, Vec2::ZERO);
        assert_eq!(v.angvel, 0.0);
    }

    #[test]
    fn empty_tank_produces_no_force_or_smoke() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(cfg());
        app.insert_resource(ParticlePool::new(16));
        app.add_systems(Update, rocket_update_system);

        let mut thrusters = Thrusters::default();
        thrusters.set(Thruster::Main, true);
        let mut tank = FuelTank::new(10.0, 0.0);
        tank.fuel = 0.0;
        let rocket = app
            .world_mut()
            .spawn((
                Rocket,
                Transform::default(),
                thrusters,
                tank,
                Hull::new(100.0),
                ThrusterEmitters::default(),
                ExternalForce {
                    force: Vec2::new(5.0, 5.0),
                    torque: 1.0,
                },
                Velocity::zero(),
            ))
            .id();

        app.update();

        let ext = app.world().get::<ExternalForce>(rocket).unwrap();
        assert_eq!(ext.force, Vec2::ZERO);
        assert_eq!(ext.torque, 0.0);
        assert_eq!(app.world().resource::<ParticlePool>().total_count(), 0);
    }

    #[test]
    fn firing_thruster_pushes_and_emits_exhaust() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(cfg());
        app.insert_resource(ParticlePool::new(16));
        app.add_systems(Update, rocket_update_system);

        let mut thrusters = Thrusters::default();
        thrusters.set(Thruster::Main, true);
        let rocket = app
            .world_mut()
            .spawn((
                Rocket,
                Transform::default(),
                thrusters,
                FuelTank::new(1000.0, 0.0),
                Hull::new(100.0),
                ThrusterEmitters::default(),
                ExternalForce::default(),
                Velocity::zero(),
            ))
            .id();

        app.update();

        let ext = app.world().get::<ExternalForce>(rocket).unwrap();
        assert!(ext.force.y > 0.0);
        let pool = app.world().resource::<ParticlePool>();
        assert_eq!(pool.active_count(), 1);
        let smoke = pool.get(0).unwrap();
        assert!(smoke.position.y < 0.0, "main exhaust leaves from the tail");
        assert!(smoke.velocity.y < 0.0);
    }

    #[test]
    fn teleport_moves_the_rocket() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<TeleportRocket>();
        app.add_systems(Update, teleport_rocket_system);
        let rocket = app
            .world_mut()
            .spawn((Rocket, Transform::from_xyz(1.0, 2.0, 0.5)))
            .id();

        app.world_mut().write_message(TeleportRocket {
            position: Vec2::new(2500.0, 2500.0),
        });
        app.update();

        let t = app.world().get::<Transform>(rocket).unwrap();
        assert_eq!(t.translation, Vec3::new(2500.0, 2500.0, 0.5));
    }
}
