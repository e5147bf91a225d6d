//! Plain polygon maths shared by the outline converter and the renderer.
//!
//! Nothing here touches the ECS.  A [`Polygon`] is an ordered point list with
//! winding preserved; derived quantities (bounds, area centroid, bounding radius)
//! are computed on demand.
//!
//! Every tolerance is relative: lengths scale with the polygon's extent and
//! areas with its square, so the same outline behaves identically at any scale.

use crate::error::OutlineDefect;
use bevy::prelude::*;
use lyon::math::{point, Point};
use lyon::path::builder::PathBuilder;
use lyon::path::PathBuffer;
use lyon::tessellation::geometry_builder::{BuffersBuilder, Positions};
use lyon::tessellation::{FillOptions, FillTessellator, VertexBuffers};

/// Tolerance as a fraction of the extent (lengths) or extent squared (areas).
pub const RELATIVE_EPSILON: f32 = 1e-6;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Longer side of the box.
    pub fn extent(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y)
    }
}

/// Triangles over their own vertex list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    pub vertices: Vec<Vec2>,
    /// Counter-clockwise index triples into `vertices`.
    pub triangles: Vec<[u32; 3]>,
}

impl Triangulation {
    pub fn area(&self) -> f32 {
        triangles_area(&self.vertices, &self.triangles)
    }

    pub fn translated(mut self, offset: Vec2) -> Self {
        for v in &mut self.vertices {
            *v += offset;
        }
        self
    }
}

/// Ordered, closed sequence of at least three points.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    points: Vec<Vec2>,
}

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Result<Self, OutlineDefect> {
        if points.len() < 3 {
            return Err(OutlineDefect::TooFewPoints { got: points.len() });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Vec2> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        bounds_of(&self.points)
    }

    /// Areas at or below this are noise at this polygon's scale.
    pub fn area_tolerance(&self) -> f32 {
        let extent = self.bounds().extent();
        RELATIVE_EPSILON * extent * extent
    }

    pub fn is_degenerate(&self) -> bool {
        self.area() <= self.area_tolerance()
    }

    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f32 {
        let n = self.points.len();
        let mut twice = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice += a.perp_dot(b);
        }
        twice * 0.5
    }

    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    /// Area-weighted centroid, i.e. the centre of mass of a uniform-density lamina.
    ///
    /// Falls back to the vertex average for degenerate polygons.
    pub fn centroid(&self) -> Vec2 {
        let n = self.points.len();
        if self.is_degenerate() {
            let sum: Vec2 = self.points.iter().copied().sum();
            return sum / n as f32;
        }
        let mut acc = Vec2::ZERO;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            acc += (a + b) * a.perp_dot(b);
        }
        acc / (6.0 * self.signed_area())
    }

    /// Distance from the local origin to the farthest vertex.
    pub fn bounding_radius(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.length())
            .fold(0.0_f32, f32::max)
    }

    pub fn translated(&self, offset: Vec2) -> Polygon {
        Polygon {
            points: self.points.iter().map(|p| *p + offset).collect(),
        }
    }

    pub fn scaled(&self, factor: f32) -> Polygon {
        Polygon {
            points: self.points.iter().map(|p| *p * factor).collect(),
        }
    }

    /// Drop vertices that sit on the line through their neighbours.
    ///
    /// A polygon that collapses below three points encloses no area.
    pub fn without_collinear(&self) -> Result<Polygon, OutlineDefect> {
        let tol = self.area_tolerance();
        let flat = |a: Vec2, b: Vec2, c: Vec2| (b - a).perp_dot(c - b).abs() <= tol;

        let mut kept: Vec<Vec2> = Vec::with_capacity(self.points.len());
        for &p in &self.points {
            while kept.len() >= 2 && flat(kept[kept.len() - 2], kept[kept.len() - 1], p) {
                kept.pop();
            }
            kept.push(p);
        }
        // The run may continue across the seam.
        loop {
            let m = kept.len();
            if m < 3 {
                return Err(OutlineDefect::ZeroArea);
            }
            if flat(kept[m - 2], kept[m - 1], kept[0]) {
                kept.pop();
            } else if flat(kept[m - 1], kept[0], kept[1]) {
                kept.remove(0);
            } else {
                break;
            }
        }
        Ok(Polygon { points: kept })
    }

    /// No two non-adjacent edges cross.
    ///
    /// Contacts within the area tolerance count as touching, not crossing, so
    /// rounding noise along straight runs is never reported.
    pub fn is_simple(&self) -> bool {
        let tol = self.area_tolerance();
        let n = self.points.len();
        for i in 0..n {
            let (a1, a2) = (self.points[i], self.points[(i + 1) % n]);
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (b1, b2) = (self.points[j], self.points[(j + 1) % n]);
                if segments_cross(a1, a2, b1, b2, tol) {
                    return false;
                }
            }
        }
        true
    }

    /// Fill-tessellate the interior with lyon.
    ///
    /// Works for simple polygons of either winding; every returned triangle is
    /// counter-clockwise and slivers below the area tolerance are dropped.
    /// Crossing edges produce [`OutlineDefect::SelfIntersecting`].
    pub fn triangulate(&self) -> Result<Triangulation, OutlineDefect> {
        if !self.is_simple() {
            return Err(OutlineDefect::SelfIntersecting);
        }
        // Tessellate in a unit-sized frame so lyon sees the same numbers
        // whatever the outline's scale.
        let bounds = self.bounds();
        let origin = bounds.center();
        let extent = bounds.extent();
        if extent <= 0.0 || !extent.is_finite() {
            return Err(OutlineDefect::ZeroArea);
        }
        let to_unit = |p: Vec2| {
            let q = (p - origin) / extent;
            point(q.x, q.y)
        };

        let mut path_buffer = PathBuffer::new();
        let mut builder = path_buffer.builder();
        builder.begin(to_unit(self.points[0]));
        for p in &self.points[1..] {
            builder.line_to(to_unit(*p));
        }
        builder.close();
        let path_id = builder.build();

        let mut buffers: VertexBuffers<Point, u32> = VertexBuffers::new();
        FillTessellator::new()
            .tessellate_path(
                path_buffer.get(path_id),
                &FillOptions::default(),
                &mut BuffersBuilder::new(&mut buffers, Positions),
            )
            .map_err(|e| OutlineDefect::Untessellable {
                reason: format!("{e:?}"),
            })?;

        let vertices: Vec<Vec2> = buffers
            .vertices
            .iter()
            .map(|v| Vec2::new(v.x, v.y) * extent + origin)
            .collect();
        let tol = self.area_tolerance();
        let triangles: Vec<[u32; 3]> = buffers
            .indices
            .chunks_exact(3)
            .filter_map(|t| {
                let (a, b, c) = (
                    vertices[t[0] as usize],
                    vertices[t[1] as usize],
                    vertices[t[2] as usize],
                );
                let twice = (b - a).perp_dot(c - a);
                if twice.abs() * 0.5 <= tol {
                    None
                } else if twice > 0.0 {
                    Some([t[0], t[1], t[2]])
                } else {
                    Some([t[0], t[2], t[1]])
                }
            })
            .collect();
        if triangles.is_empty() {
            return Err(OutlineDefect::ZeroArea);
        }
        Ok(Triangulation {
            vertices,
            triangles,
        })
    }
}

pub fn bounds_of(points: &[Vec2]) -> Bounds {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for p in points {
        min = min.min(*p);
        max = max.max(*p);
    }
    Bounds { min, max }
}

/// Proper crossing of segments `p1p2` and `q1q2`.
///
/// Each endpoint must lie clearly on its side of the other segment's line;
/// anything within `tol` counts as touching.
fn segments_cross(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2, tol: f32) -> bool {
    let d1 = (p2 - p1).perp_dot(q1 - p1);
    let d2 = (p2 - p1).perp_dot(q2 - p1);
    let d3 = (q2 - q1).perp_dot(p1 - q1);
    let d4 = (q2 - q1).perp_dot(p2 - q1);
    let clear = |d: f32| d.abs() > tol;
    d1 * d2 < 0.0
        && d3 * d4 < 0.0
        && clear(d1)
        && clear(d2)
        && clear(d3)
        && clear(d4)
}

/// Sum of the absolute areas of `triangles` over `points`.
pub fn triangles_area(points: &[Vec2], triangles: &[[u32; 3]]) -> f32 {
    triangles
        .iter()
        .map(|t| {
            let a = points[t[0] as usize];
            let b = points[t[1] as usize];
            let c = points[t[2] as usize];
            (b - a).perp_dot(c - a).abs() * 0.5
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f32) -> Polygon {
        Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(side, 0.0),
            Vec2::new(side, side),
            Vec2::new(0.0, side),
        ])
        .unwrap()
    }

    /// An L-shape: concave, so the area centroid and bounds centre differ.
    fn l_shape() -> Polygon {
        Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_fewer_than_three_points() {
        let err = Polygon::new(vec![Vec2::ZERO, Vec2::X]).unwrap_err();
        assert_eq!(err, OutlineDefect::TooFewPoints { got: 2 });
    }

    #[test]
    fn square_area_and_centroid() {
        let sq = square(4.0);
        assert!((sq.signed_area() - 16.0).abs() < 1e-5);
        assert!((sq.centroid() - Vec2::new(2.0, 2.0)).length() < 1e-5);
        let b = sq.bounds();
        assert_eq!(b.min, Vec2::ZERO);
        assert_eq!(b.max, Vec2::splat(4.0));
    }

    #[test]
    fn clockwise_winding_has_negative_signed_area() {
        let cw = Polygon::new(square(2.0).points().iter().rev().copied().collect()).unwrap();
        assert!(cw.signed_area() < 0.0);
        assert!((cw.area() - 4.0).abs() < 1e-5);
        assert!((cw.centroid() - Vec2::ONE).length() < 1e-5);
    }

    #[test]
    fn concave_centroid_differs_from_bounds_centre() {
        let l = l_shape();
        let c = l.centroid();
        // Three 10×10 cells at (5,5), (15,5), (5,15).
        assert!((c - Vec2::new(25.0 / 3.0, 25.0 / 3.0)).length() < 1e-4);
        assert!((c - l.bounds().center()).length() > 1.0);
    }

    fn assert_ccw(t: &Triangulation) {
        for tri in &t.triangles {
            let (a, b, c) = (
                t.vertices[tri[0] as usize],
                t.vertices[tri[1] as usize],
                t.vertices[tri[2] as usize],
            );
            assert!((b - a).perp_dot(c - a) > 0.0, "triangles are emitted CCW");
        }
    }

    /// Every triangle centroid must fall inside the outline.
    fn assert_inside(poly: &Polygon, t: &Triangulation) {
        for tri in &t.triangles {
            let c = (t.vertices[tri[0] as usize]
                + t.vertices[tri[1] as usize]
                + t.vertices[tri[2] as usize])
                / 3.0;
            assert!(contains(poly, c), "triangle centred at {c:?} spills outside");
        }
    }

    /// Even-odd point-in-polygon test.
    fn contains(poly: &Polygon, p: Vec2) -> bool {
        let pts = poly.points();
        let n = pts.len();
        let mut inside = false;
        for i in 0..n {
            let (a, b) = (pts[i], pts[(i + 1) % n]);
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    #[test]
    fn triangulation_covers_concave_area() {
        let l = l_shape();
        let t = l.triangulate().expect("L-shape is simple");
        assert_eq!(t.triangles.len(), 4);
        assert!((t.area() - l.area()).abs() < 1e-3);
        assert_inside(&l, &t);
        assert_ccw(&t);
    }

    #[test]
    fn triangulation_handles_clockwise_input() {
        let cw = Polygon::new(l_shape().points().iter().rev().copied().collect()).unwrap();
        let t = cw.triangulate().unwrap();
        assert!((t.area() - 300.0).abs() < 1e-3);
        assert_inside(&cw, &t);
        assert_ccw(&t);
    }

    /// A comb whose notches put reflex vertices on many candidate diagonals.
    #[test]
    fn comb_triangulation_stays_inside() {
        let mut pts = vec![Vec2::new(0.0, 0.0), Vec2::new(50.0, 0.0)];
        for k in (0..5).rev() {
            let x = k as f32 * 10.0;
            pts.push(Vec2::new(x + 10.0, 30.0));
            pts.push(Vec2::new(x + 5.0, 10.0));
            pts.push(Vec2::new(x, 30.0));
        }
        pts.dedup();
        let comb = Polygon::new(pts).unwrap();
        let t = comb.triangulate().unwrap();
        assert!(
            (t.area() - comb.area()).abs() < 1e-2,
            "area {} vs {}",
            t.area(),
            comb.area()
        );
        assert_inside(&comb, &t);
    }

    #[test]
    fn tolerances_follow_scale() {
        for factor in [1e-4, 1.0, 1e4] {
            let l = l_shape().scaled(factor);
            let t = l.triangulate().expect("scaled L-shape is simple");
            let rel = (t.area() - l.area()).abs() / l.area();
            assert!(rel < 1e-4, "factor {factor}: relative area error {rel}");
            assert!(!l.is_degenerate());
        }
    }

    #[test]
    fn collinear_runs_are_removed() {
        let poly = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(7.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(0.0, 5.0),
        ])
        .unwrap();
        let clean = poly.without_collinear().unwrap();
        assert_eq!(clean.len(), 4);
        assert!((clean.area() - 100.0).abs() < 1e-3);

        let line = Polygon::new(vec![Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)]).unwrap();
        assert_eq!(line.without_collinear(), Err(OutlineDefect::ZeroArea));
    }

    #[test]
    fn collinear_vertices_are_skipped() {
        let poly = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])
        .unwrap();
        let t = poly.triangulate().unwrap();
        assert!((t.area() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn bow_tie_is_self_intersecting() {
        let bow = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(-5.0, 5.0),
        ])
        .unwrap();
        assert!(!bow.is_simple());
        assert_eq!(bow.triangulate(), Err(OutlineDefect::SelfIntersecting));
    }

    #[test]
    fn bounding_radius_is_measured_from_origin() {
        let centred = square(2.0).translated(Vec2::splat(-1.0));
        assert!((centred.bounding_radius() - 2.0_f32.sqrt()).abs() < 1e-5);
        assert!((centred.scaled(3.0).bounding_radius() - 3.0 * 2.0_f32.sqrt()).abs() < 1e-4);
    }
}
