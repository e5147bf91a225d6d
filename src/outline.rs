//! Outline-to-body conversion and the outline source collaborator.
//!
//! ## Frames
//!
//! Rapier places a body's centre of mass at the area centroid of its collider,
//! while the raw outline is authored around whatever origin the artist used.
//! [`convert_outline`] builds the collider in the centroid frame, reads back
//! its bounds and shifts the visual polygon by the same offset so the mesh and
//! the collider stay congruent while the body spins.
//!
//! One lyon tessellation feeds both sides: the collider is a compound of its
//! triangles and the render mesh reuses the same triangles shifted into the
//! visual frame.  The triangles tile the outline exactly, so Rapier's centre
//! of mass is the outline's area centroid.
//!
//! ## Sources
//!
//! [`OutlineSource`] maps an identifier and an arc-length step to an ordered
//! point list.  [`ProceduralOutlines`] is the built-in implementation: a small
//! library of seeded asteroid silhouettes, a loot gem and the rocket hull, each
//! resampled along its perimeter at `0, step, 2·step, …`.

use crate::constants::{
    ASTEROID_OUTLINE_RADIUS, ASTEROID_OUTLINE_VARIANTS, LOOT_OUTLINE_RADIUS, OUTLINE_SEED,
};
use crate::error::{GameError, GameResult, OutlineDefect};
use crate::geometry::{bounds_of, Polygon, Triangulation, RELATIVE_EPSILON};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f32::consts::TAU;


pub const ROCKET_OUTLINE_ID: &str = "rocket";
pub const LOOT_OUTLINE_ID: &str = "loot";

// ── Converter ────────────────────────────────────────────────────────────────

/// Collision and visual geometry for one outline at one scale.
///
/// Everything is expressed in the body frame: the origin is the centre of
/// mass Rapier will compute for [`Self::collider`].
#[derive(Debug, Clone)]
pub struct BodyOutline {
    pub collider_vertices: Vec<Vec2>,
    pub visual_vertices: Vec<Vec2>,
    /// Interior of `collider_vertices`.
    pub tessellation: Triangulation,
    /// Correction applied to the scaled input to reach the body frame.
    pub offset: Vec2,
    pub area: f32,
    pub bounding_radius: f32,
}

impl BodyOutline {
    /// Compound of convex triangles; concave outlines keep their true shape.
    pub fn collider(&self) -> Collider {
        let v = &self.tessellation.vertices;
        let parts = self
            .tessellation
            .triangles
            .iter()
            .map(|t| {
                (
                    Vec2::ZERO,
                    0.0,
                    Collider::triangle(v[t[0] as usize], v[t[1] as usize], v[t[2] as usize]),
                )
            })
            .collect();
        Collider::compound(parts)
    }

    pub fn mass(&self, density: f32) -> f32 {
        self.area * density
    }

    /// Area centroid of the visual polygon; zero up to rounding.
    pub fn visual_centroid(&self) -> Vec2 {
        match Polygon::new(self.visual_vertices.clone()) {
            Ok(poly) => poly.centroid(),
            Err(_) => Vec2::ZERO,
        }
    }

    /// Shift from the body frame to the visual frame.
    pub fn visual_shift(&self) -> Vec2 {
        match (self.visual_vertices.first(), self.collider_vertices.first()) {
            (Some(v), Some(c)) => *v - *c,
            _ => Vec2::ZERO,
        }
    }
}

/// Render-side copy of a body's visual polygon, consumed by the mesh builder.
#[derive(Component, Debug, Clone)]
pub struct VisualOutline {
    pub vertices: Vec<Vec2>,
    pub triangles: Vec<[u32; 3]>,
}

impl From<&BodyOutline> for VisualOutline {
    fn from(body: &BodyOutline) -> Self {
        let mesh = body.tessellation.clone().translated(body.visual_shift());
        Self {
            vertices: mesh.vertices,
            triangles: mesh.triangles,
        }
    }
}

/// Convert an ordered outline and a uniform scale into body geometry.
///
/// Fails with [`GameError::MalformedOutline`] when fewer than three points
/// remain after merging duplicates, the scale is not positive, the outline
/// encloses no area or its edges cross.  Duplicate and collinear tolerances
/// are relative to the outline's extent, so scale alone never rejects it.
pub fn convert_outline(points: &[Vec2], scale: f32) -> GameResult<BodyOutline> {
    if points.len() < 3 {
        return Err(OutlineDefect::TooFewPoints { got: points.len() }.into());
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(OutlineDefect::InvalidScale { scale }.into());
    }

    let scaled: Vec<Vec2> = points.iter().map(|p| *p * scale).collect();
    let merge_distance = RELATIVE_EPSILON * bounds_of(&scaled).extent();
    let input = Polygon::new(dedupe_closed(scaled, merge_distance))?;
    if input.is_degenerate() {
        return Err(OutlineDefect::ZeroArea.into());
    }
    let input = input.without_collinear()?;
    let input_bounds = input.bounds();

    let body = input.translated(-input.centroid());
    let body_bounds = body.bounds();

    let offset =
        ((input_bounds.min - body_bounds.min) + (input_bounds.max - body_bounds.max)) * 0.5;
    let visual = input.translated(-offset);
    let tessellation = body.triangulate()?;

    Ok(BodyOutline {
        area: body.area(),
        bounding_radius: body.bounding_radius(),
        collider_vertices: body.into_points(),
        visual_vertices: visual.into_points(),
        tessellation,
        offset,
    })
}

fn dedupe_closed(points: Vec<Vec2>, merge_distance: f32) -> Vec<Vec2> {
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for p in points {
        if out
            .last()
            .is_none_or(|last| last.distance(p) > merge_distance)
        {
            out.push(p);
        }
    }
    while out.len() > 1 && out[0].distance(out[out.len() - 1]) <= merge_distance {
        out.pop();
    }
    out
}

// ── Sources ──────────────────────────────────────────────────────────────────

/// Produces an ordered outline for an identifier at a given arc-length step.
pub trait OutlineSource {
    fn sample(&self, id: &str, step: f32) -> GameResult<Vec<Vec2>>;
}

/// Sample an outline and convert it in one go.
pub fn build_body<S: OutlineSource + ?Sized>(
    source: &S,
    id: &str,
    step: f32,
    scale: f32,
) -> GameResult<BodyOutline> {
    let points = source.sample(id, step)?;
    convert_outline(&points, scale)
}

/// Built-in procedural outline library.
#[derive(Resource, Debug, Clone)]
pub struct ProceduralOutlines {
    shapes: HashMap<String, Vec<Vec2>>,
    asteroid_ids: Vec<String>,
}

impl Default for ProceduralOutlines {
    fn default() -> Self {
        Self::new(OUTLINE_SEED, ASTEROID_OUTLINE_VARIANTS)
    }
}

impl ProceduralOutlines {
    pub fn new(seed: u64, asteroid_variants: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut shapes = HashMap::new();
        let mut asteroid_ids = Vec::with_capacity(asteroid_variants);

        for k in 0..asteroid_variants {
            let id = format!("asteroid-{k}");
            shapes.insert(id.clone(), jagged_outline(&mut rng, ASTEROID_OUTLINE_RADIUS));
            asteroid_ids.push(id);
        }
        shapes.insert(LOOT_OUTLINE_ID.to_string(), gem_outline(LOOT_OUTLINE_RADIUS));
        shapes.insert(ROCKET_OUTLINE_ID.to_string(), rocket_outline());

        Self {
            shapes,
            asteroid_ids,
        }
    }

    /// Register or replace a control polygon.
    pub fn insert(&mut self, id: impl Into<String>, points: Vec<Vec2>) {
        self.shapes.insert(id.into(), points);
    }

    pub fn asteroid_ids(&self) -> &[String] {
        &self.asteroid_ids
    }
}

impl OutlineSource for ProceduralOutlines {
    fn sample(&self, id: &str, step: f32) -> GameResult<Vec<Vec2>> {
        let control = self
            .shapes
            .get(id)
            .ok_or_else(|| GameError::UnknownOutline { id: id.to_string() })?;
        if !step.is_finite() || step <= 0.0 {
            return Err(GameError::InvalidSampleStep { step });
        }
        Ok(resample_closed(control, step))
    }
}

/// Points at arc lengths `0, step, 2·step, …` strictly below the perimeter.
pub fn resample_closed(points: &[Vec2], step: f32) -> Vec<Vec2> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }
    let lengths: Vec<f32> = (0..n)
        .map(|i| points[i].distance(points[(i + 1) % n]))
        .collect();
    let perimeter: f32 = lengths.iter().sum();

    let mut out = Vec::new();
    let mut seg = 0;
    let mut seg_start = 0.0;
    let mut k = 0u32;
    loop {
        let d = step * k as f32;
        if d >= perimeter {
            break;
        }
        while seg + 1 < n && d > seg_start + lengths[seg] {
            seg_start += lengths[seg];
            seg += 1;
        }
        let t = if lengths[seg] > 0.0 {
            ((d - seg_start) / lengths[seg]).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(points[seg].lerp(points[(seg + 1) % n], t));
        k += 1;
    }
    out
}

/// Star-shaped rock silhouette with a low-frequency lobe and per-vertex jitter.
fn jagged_outline(rng: &mut StdRng, radius: f32) -> Vec<Vec2> {
    let vertices: usize = rng.gen_range(9..=16);
    let lobes = rng.gen_range(2..=4_u32) as f32;
    let phase: f32 = rng.gen_range(0.0..TAU);
    let spacing = TAU / vertices as f32;
    (0..vertices)
        .map(|i| {
            let angle = spacing * i as f32 + rng.gen_range(-0.3_f32..0.3) * spacing;
            let jitter: f32 = rng.gen_range(-0.15..0.15);
            let r = radius * (1.0 + 0.18 * (lobes * angle + phase).sin() + jitter);
            Vec2::from_angle(angle) * r
        })
        .collect()
}

/// Eight-point crystal with alternating long and short facets.
fn gem_outline(radius: f32) -> Vec<Vec2> {
    (0..8)
        .map(|i| {
            let r = if i % 2 == 0 { radius } else { radius * 0.7 };
            Vec2::from_angle(TAU * i as f32 / 8.0) * r
        })
        .collect()
}

/// Dart pointing along +Y with a notched tail.
fn rocket_outline() -> Vec<Vec2> {
    vec![
        Vec2::new(0.0, 32.0),
        Vec2::new(-18.0, -22.0),
        Vec2::new(0.0, -12.0),
        Vec2::new(18.0, -22.0),
    ]
}
