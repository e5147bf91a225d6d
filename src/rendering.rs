//! Mesh2d visuals for level bodies and exhaust smoke.
//!
//! Bodies carry a [`VisualOutline`] from the moment they spawn; the first frame
//! after that, [`attach_outline_mesh_system`] turns it into a retained
//! triangle-list mesh.  The mesh lives in the entity's local space, so Rapier's
//! writeback moves and rotates it with no per-frame work here.
//!
//! Smoke puffs share one unit disc mesh but each gets its own material so the
//! fade can be driven per particle.
//!
//! The camera only reads [`CameraFocus`]; nothing here feeds back into the
//! simulation.

use crate::asteroid::Asteroid;
use crate::gameplay::{CameraFocus, GameplaySet};
use crate::loot::Loot;
use crate::outline::VisualOutline;
use crate::particles::{ParticlePool, PooledParticle};
use crate::rocket::{Hull, HullTint, Rocket};
use bevy::prelude::*;
use bevy::transform::TransformSystems;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};

/// Unit disc shared by every smoke puff.
#[derive(Resource, Debug, Clone)]
pub struct SmokeMesh(pub Handle<Mesh>);

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_smoke_mesh, setup_camera))
            .add_systems(
                PostUpdate,
                (
                    attach_outline_mesh_system,
                    attach_smoke_mesh_system,
                    rocket_tint_system,
                    smoke_fade_system,
                    sync_camera_system
                        .after(GameplaySet::Presentation)
                        .before(TransformSystems::Propagate),
                ),
            );
    }
}

pub fn setup_camera(mut commands: Commands, focus: Res<CameraFocus>) {
    commands.spawn((
        Camera2d,
        Transform::from_translation(focus.position.extend(999.0)),
    ));
}

/// Copy the eased focus point onto every 2D camera, keeping its depth.
pub fn sync_camera_system(
    focus: Res<CameraFocus>,
    mut cameras: Query<&mut Transform, With<Camera2d>>,
) {
    for mut transform in cameras.iter_mut() {
        transform.translation.x = focus.position.x;
        transform.translation.y = focus.position.y;
    }
}

fn setup_smoke_mesh(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    commands.insert_resource(SmokeMesh(meshes.add(disc_mesh(3.0, 10))));
}

/// Build a triangle-list mesh from explicit indices.
///
/// Works for concave outlines as long as `triangles` covers the interior.
pub fn outline_mesh(vertices: &[Vec2], triangles: &[[u32; 3]]) -> Mesh {
    let positions: Vec<[f32; 3]> = vertices.iter().map(|v| [v.x, v.y, 0.0]).collect();
    let normals = vec![[0.0, 0.0, 1.0]; vertices.len()];
    let uvs: Vec<[f32; 2]> = vertices
        .iter()
        .map(|v| [(v.x / 100.0) + 0.5, (v.y / 100.0) + 0.5])
        .collect();
    let indices: Vec<u32> = triangles.iter().flatten().copied().collect();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Regular N-gon approximating a disc, fanned from vertex 0.
pub fn disc_mesh(radius: f32, segments: u32) -> Mesh {
    let vertices: Vec<Vec2> = (0..segments)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / segments as f32;
            Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect();
    let triangles: Vec<[u32; 3]> = (1..segments.saturating_sub(1))
        .map(|i| [0, i, i + 1])
        .collect();
    outline_mesh(&vertices, &triangles)
}

pub fn rocket_color(tint: HullTint) -> Color {
    match tint {
        HullTint::Idle => Color::srgb(0.85, 0.88, 0.92),
        HullTint::Damaged => Color::srgb(0.95, 0.2, 0.15),
    }
}

/// Grey-brown rock tone, varied per entity with a multiplicative hash.
fn rock_color(seed: u32) -> Color {
    let h = seed.wrapping_mul(2_654_435_761).wrapping_add(0x5EED);
    let t = (h & 0xFFFF) as f32 / 65_535.0;
    let lum = 0.2 + t * 0.15;
    Color::srgb(lum + t * 0.05, lum + 0.01, lum - t * 0.03)
}

fn loot_color() -> Color {
    Color::srgb(0.35, 0.95, 0.7)
}

#[allow(clippy::type_complexity)]
pub fn attach_outline_mesh_system(
    mut commands: Commands,
    query: Query<
        (
            Entity,
            &VisualOutline,
            Has<Rocket>,
            Has<Asteroid>,
            Has<Loot>,
        ),
        Added<VisualOutline>,
    >,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (entity, outline, is_rocket, is_asteroid, is_loot) in query.iter() {
        if outline.triangles.is_empty() {
            continue;
        }
        let color = if is_rocket {
            rocket_color(HullTint::Idle)
        } else if is_loot {
            loot_color()
        } else if is_asteroid {
            rock_color(entity.index())
        } else {
            Color::WHITE
        };
        commands.entity(entity).insert((
            Mesh2d(meshes.add(outline_mesh(&outline.vertices, &outline.triangles))),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(color))),
        ));
    }
}

pub fn rocket_tint_system(
    rockets: Query<(&Hull, &MeshMaterial2d<ColorMaterial>), (With<Rocket>, Changed<Hull>)>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (hull, handle) in rockets.iter() {
        if let Some(material) = materials.get_mut(&handle.0) {
            material.color = rocket_color(hull.tint());
        }
    }
}

pub fn attach_smoke_mesh_system(
    mut commands: Commands,
    query: Query<Entity, Added<PooledParticle>>,
    smoke: Option<Res<SmokeMesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let Some(smoke) = smoke else {
        return;
    };
    for entity in query.iter() {
        let material = materials.add(ColorMaterial::from_color(Color::srgba(0.7, 0.7, 0.7, 0.0)));
        commands
            .entity(entity)
            .insert((Mesh2d(smoke.0.clone()), MeshMaterial2d(material)));
    }
}

/// Match each puff's alpha to its remaining life.
pub fn smoke_fade_system(
    pool: Res<ParticlePool>,
    query: Query<(&PooledParticle, &MeshMaterial2d<ColorMaterial>)>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (handle, material) in query.iter() {
        let Some(particle) = pool.get(handle.index) else {
            continue;
        };
        if let Some(material) = materials.get_mut(&material.0) {
            material.color.set_alpha(particle.opacity());
        }
    }
}
