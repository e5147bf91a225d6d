//! Bounded, recyclable smoke particle pool.
//!
//! ## Design
//!
//! The simulation state of every particle lives in the [`ParticlePool`]
//! resource as plain data, so spawning, ageing and eviction can be tested
//! without a world.  Each slot is paired with one render entity carrying a
//! [`PooledParticle`] index; that entity is created the first time its slot is
//! used and is only ever hidden, never despawned, until the level is torn down.
//!
//! | System                              | Purpose                                      |
//! |-------------------------------------|----------------------------------------------|
//! | `particle_pool_update_system`       | Age, move and retire particles               |
//! | `register_particle_entities_system` | Create render entities for new slots         |
//! | `sync_particle_transforms_system`   | Copy position, scale and visibility to ECS   |
//!
//! Life is counted in whole ticks on a fixed interval tracked per particle, so
//! frame rate does not change how long smoke lingers.

use crate::config::GameplayConfig;
use bevy::prelude::*;

// ── Plain state ──────────────────────────────────────────────────────────────

/// Parameters for one [`ParticlePool::spawn`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpawn {
    pub position: Vec2,
    pub velocity: Vec2,
    pub base_scale: f32,
    /// Starting life in ticks.
    pub lifespan: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmokeParticle {
    pub alive: bool,
    pub position: Vec2,
    /// World-space velocity (units/s), decayed once per life tick.
    pub velocity: Vec2,
    pub scale: f32,
    pub remaining_life: f32,
    pub starting_life: f32,
    /// Simulated time of the last life tick (s).
    pub last_tick: f64,
}

impl SmokeParticle {
    fn dormant() -> Self {
        Self {
            alive: false,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            scale: 0.0,
            remaining_life: 0.0,
            starting_life: 1.0,
            last_tick: 0.0,
        }
    }

    fn respawn(&mut self, request: &ParticleSpawn, now: f64) {
        let life = request.lifespan.max(1.0);
        self.alive = true;
        self.position = request.position;
        self.velocity = request.velocity;
        self.scale = request.base_scale;
        self.remaining_life = life;
        self.starting_life = life;
        self.last_tick = now;
    }

    /// Fade factor in `[0, 1]`; zero once retired.
    pub fn opacity(&self) -> f32 {
        if !self.alive {
            return 0.0;
        }
        (self.remaining_life / self.starting_life).clamp(0.0, 1.0)
    }

    fn advance(&mut self, now: f64, dt: f32, tick: f64, decay: f32) {
        if !self.alive {
            return;
        }
        self.position += self.velocity * dt;
        while now - self.last_tick >= tick {
            self.last_tick += tick;
            self.remaining_life -= 1.0;
            self.velocity *= decay;
            if self.remaining_life <= 0.0 {
                self.remaining_life = 0.0;
                self.alive = false;
                break;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolSlot {
    pub particle: SmokeParticle,
    /// Render entity, once registered.
    pub entity: Option<Entity>,
}

/// Fixed-capacity particle pool.  `spawn` always succeeds.
#[derive(Resource, Debug, Clone)]
pub struct ParticlePool {
    capacity: usize,
    slots: Vec<PoolSlot>,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new(crate::constants::PARTICLE_POOL_CAPACITY)
    }
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Bind a particle to `request` and return its slot index.
    ///
    /// Prefers a retired slot, then a fresh slot while under capacity, and
    /// otherwise pre-empts the live particle with the least remaining life.
    pub fn spawn(&mut self, request: ParticleSpawn, now: f64) -> usize {
        let index = match self.slots.iter().position(|s| !s.particle.alive) {
            Some(i) => i,
            None if self.slots.len() < self.capacity => {
                self.slots.push(PoolSlot {
                    particle: SmokeParticle::dormant(),
                    entity: None,
                });
                self.slots.len() - 1
            }
            None => self
                .slots
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.particle
                        .remaining_life
                        .total_cmp(&b.particle.remaining_life)
                })
                .map(|(i, _)| i)
                .unwrap_or(0),
        };
        self.slots[index].particle.respawn(&request, now);
        index
    }

    pub fn update(&mut self, now: f64, dt: f32, tick: f64, decay: f32) {
        for slot in &mut self.slots {
            slot.particle.advance(now, dt, tick, decay);
        }
    }

    pub fn get(&self, index: usize) -> Option<&SmokeParticle> {
        self.slots.get(index).map(|s| &s.particle)
    }

    pub fn slots(&self) -> &[PoolSlot] {
        &self.slots
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.particle.alive).count()
    }

    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Drop every slot and hand back the render entities that must be despawned.
    pub fn clear(&mut self) -> Vec<Entity> {
        self.slots.drain(..).filter_map(|s| s.entity).collect()
    }

    fn attach(&mut self, index: usize, entity: Entity) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.entity = Some(entity);
        }
    }
}

/// Per-emitter spawn gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterCooldown {
    last_spawn: f64,
}

impl Default for EmitterCooldown {
    fn default() -> Self {
        Self {
            last_spawn: f64::NEG_INFINITY,
        }
    }
}

impl EmitterCooldown {
    /// Returns `true` and records `now` if the cooldown has elapsed.
    pub fn try_fire(&mut self, now: f64, cooldown: f64) -> bool {
        if now - self.last_spawn >= cooldown {
            self.last_spawn = now;
            true
        } else {
            false
        }
    }
}

// ── ECS glue ─────────────────────────────────────────────────────────────────

/// Render entity standing in for pool slot `index`.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledParticle {
    pub index: usize,
}

pub fn particle_pool_update_system(
    time: Res<Time>,
    config: Res<GameplayConfig>,
    mut pool: ResMut<ParticlePool>,
) {
    pool.update(
        time.elapsed_secs_f64(),
        time.delta_secs(),
        config.particle_tick_secs,
        config.particle_velocity_decay,
    );
}

/// Give every slot created this frame a hidden render entity.
pub fn register_particle_entities_system(mut commands: Commands, mut pool: ResMut<ParticlePool>) {
    let pending: Vec<usize> = pool
        .slots()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.entity.is_none())
        .map(|(i, _)| i)
        .collect();
    for index in pending {
        let entity = commands
            .spawn((
                PooledParticle { index },
                Transform::from_translation(Vec3::new(0.0, 0.0, 0.8)),
                Visibility::Hidden,
            ))
            .id();
        pool.attach(index, entity);
    }
}

pub fn sync_particle_transforms_system(
    pool: Res<ParticlePool>,
    mut query: Query<(&PooledParticle, &mut Transform, &mut Visibility)>,
) {
    for (handle, mut transform, mut visibility) in query.iter_mut() {
        let Some(particle) = pool.get(handle.index) else {
            continue;
        };
        if particle.alive {
            transform.translation.x = particle.position.x;
            transform.translation.y = particle.position.y;
            transform.scale = Vec3::new(particle.scale, particle.scale, 1.0);
            *visibility = Visibility::Visible;
        } else {
            *visibility = Visibility::Hidden;
        }
    }
}
