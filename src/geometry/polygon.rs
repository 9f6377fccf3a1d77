//! Polygon type and the geometric queries the model is built on.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubzeroError};
use crate::utils::math::{FloeFloat, Vec2};

use super::clip;

/// A closed vertex ring: first point equals the last.
pub type Ring<F> = Vec<Vec2<F>>;

/// Absolute tolerance (m) for on-boundary classification.
pub fn boundary_eps<F: FloeFloat>() -> F {
    F::lit(1e-8)
}

/// Result of a point-in-polygon query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    OnBoundary,
    Outside,
}

/// Simple polygon with an exterior ring and zero or more interior rings
/// (holes). The exterior is stored counter-clockwise, holes clockwise,
/// rings closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon<F> {
    exterior: Ring<F>,
    interiors: Vec<Ring<F>>,
}

/// Signed area of a closed ring (positive for counter-clockwise).
pub fn ring_signed_area<F: FloeFloat>(ring: &[Vec2<F>]) -> F {
    let mut sum = F::zero();
    for w in ring.windows(2) {
        sum += w[0].cross(w[1]);
    }
    sum * F::lit(0.5)
}

/// Area centroid of a closed ring.
pub fn ring_centroid<F: FloeFloat>(ring: &[Vec2<F>]) -> Vec2<F> {
    let mut cx = F::zero();
    let mut cy = F::zero();
    let mut a = F::zero();
    for w in ring.windows(2) {
        let cross = w[0].cross(w[1]);
        cx += (w[0].x + w[1].x) * cross;
        cy += (w[0].y + w[1].y) * cross;
        a += cross;
    }
    if a == F::zero() {
        // Degenerate ring, fall back to the vertex mean.
        let n = F::from_usize(ring.len().saturating_sub(1).max(1)).unwrap_or_else(F::one);
        let mut mean = Vec2::zero();
        for p in &ring[..ring.len().saturating_sub(1)] {
            mean += *p;
        }
        return mean / n;
    }
    let scale = F::one() / (F::lit(3.0) * a);
    Vec2::new(cx * scale, cy * scale)
}

/// Distance from a point to a segment.
pub fn point_segment_distance<F: FloeFloat>(p: Vec2<F>, a: Vec2<F>, b: Vec2<F>) -> F {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == F::zero() {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).max(F::zero()).min(F::one());
    p.distance(a + ab * t)
}

/// Point-in-ring classification by crossing count, with an explicit
/// on-boundary band. Follows the usual `Contains` convention for points on
/// edges and vertices.
pub fn ring_contains<F: FloeFloat>(ring: &[Vec2<F>], p: Vec2<F>) -> Containment {
    let eps = boundary_eps::<F>();
    let mut inside = false;
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        if point_segment_distance(p, a, b) <= eps {
            return Containment::OnBoundary;
        }
        let crosses = (a.y > p.y) != (b.y > p.y);
        if crosses {
            let t = (p.y - a.y) / (b.y - a.y);
            let x = a.x + (b.x - a.x) * t;
            if x > p.x {
                inside = !inside;
            }
        }
    }
    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

fn sanitize_ring<F: FloeFloat>(mut ring: Ring<F>) -> Result<Ring<F>> {
    // Drop an explicit closing point, dedup adjacent repeats, then close.
    if ring.len() >= 2 {
        let first = ring[0];
        if let Some(last) = ring.last().copied() {
            if last.distance(first) <= boundary_eps::<F>() {
                ring.pop();
            }
        }
    }
    ring.dedup_by(|a, b| a.distance(*b) <= boundary_eps::<F>());
    if ring.len() < 3 {
        return Err(SubzeroError::InvalidGeometry(
            "ring must have at least three distinct points".into(),
        ));
    }
    ring.push(ring[0]);
    if ring_signed_area(&ring) == F::zero() {
        return Err(SubzeroError::InvalidGeometry(
            "ring is coincident with a line".into(),
        ));
    }
    Ok(ring)
}

fn reverse_ring<F: FloeFloat>(ring: &mut Ring<F>) {
    ring.reverse();
}

impl<F: FloeFloat> Polygon<F> {
    /// Builds a polygon from an exterior ring and optional holes. Rings are
    /// validated, auto-closed, and oriented (exterior counter-clockwise,
    /// holes clockwise).
    pub fn new(exterior: Ring<F>, interiors: Vec<Ring<F>>) -> Result<Self> {
        let mut exterior = sanitize_ring(exterior)?;
        if ring_signed_area(&exterior) < F::zero() {
            reverse_ring(&mut exterior);
        }
        let mut holes = Vec::with_capacity(interiors.len());
        for ring in interiors {
            let mut ring = sanitize_ring(ring)?;
            if ring_signed_area(&ring) > F::zero() {
                reverse_ring(&mut ring);
            }
            holes.push(ring);
        }
        Ok(Self {
            exterior,
            interiors: holes,
        })
    }

    /// Builds a hole-free polygon from a vertex ring.
    pub fn from_ring(exterior: Ring<F>) -> Result<Self> {
        Self::new(exterior, Vec::new())
    }

    /// Axis-aligned rectangle.
    pub fn rectangle(min: Vec2<F>, max: Vec2<F>) -> Result<Self> {
        Self::from_ring(vec![
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    /// Closed exterior ring (counter-clockwise).
    pub fn exterior(&self) -> &[Vec2<F>] {
        &self.exterior
    }

    /// Closed interior rings (clockwise).
    pub fn interiors(&self) -> &[Ring<F>] {
        &self.interiors
    }

    /// Number of distinct exterior vertices.
    pub fn num_vertices(&self) -> usize {
        self.exterior.len() - 1
    }

    pub fn has_holes(&self) -> bool {
        !self.interiors.is_empty()
    }

    /// The same polygon with all holes dropped.
    pub fn remove_holes(&self) -> Self {
        Self {
            exterior: self.exterior.clone(),
            interiors: Vec::new(),
        }
    }

    /// Enclosed area; holes subtract.
    pub fn area(&self) -> F {
        let mut a = ring_signed_area(&self.exterior).abs();
        for hole in &self.interiors {
            a -= ring_signed_area(hole).abs();
        }
        a.max(F::zero())
    }

    /// Signed area of the exterior ring (positive: counter-clockwise).
    pub fn signed_area(&self) -> F {
        ring_signed_area(&self.exterior)
    }

    /// Area centroid, holes accounted for.
    pub fn centroid(&self) -> Vec2<F> {
        if self.interiors.is_empty() {
            return ring_centroid(&self.exterior);
        }
        let ext_area = ring_signed_area(&self.exterior).abs();
        let mut weighted = ring_centroid(&self.exterior) * ext_area;
        let mut total = ext_area;
        for hole in &self.interiors {
            let a = ring_signed_area(hole).abs();
            weighted -= ring_centroid(hole) * a;
            total -= a;
        }
        if total <= F::zero() {
            ring_centroid(&self.exterior)
        } else {
            weighted / total
        }
    }

    /// Axis-aligned bounding box `(min, max)` of the exterior.
    pub fn bounding_box(&self) -> (Vec2<F>, Vec2<F>) {
        let mut min = self.exterior[0];
        let mut max = self.exterior[0];
        for p in &self.exterior {
            min = min.min_by_component(*p);
            max = max.max_by_component(*p);
        }
        (min, max)
    }

    /// Largest vertex distance from `from`.
    pub fn max_radius(&self, from: Vec2<F>) -> F {
        let mut r = F::zero();
        for p in &self.exterior[..self.exterior.len() - 1] {
            r = r.max(p.distance(from));
        }
        r
    }

    pub fn translate(&self, offset: Vec2<F>) -> Self {
        let map = |ring: &Ring<F>| ring.iter().map(|p| *p + offset).collect::<Ring<F>>();
        Self {
            exterior: map(&self.exterior),
            interiors: self.interiors.iter().map(map).collect(),
        }
    }

    /// Rotates about an arbitrary pivot.
    pub fn rotate_about(&self, pivot: Vec2<F>, angle: F) -> Self {
        let map = |ring: &Ring<F>| {
            ring.iter()
                .map(|p| (*p - pivot).rotate(angle) + pivot)
                .collect::<Ring<F>>()
        };
        Self {
            exterior: map(&self.exterior),
            interiors: self.interiors.iter().map(map).collect(),
        }
    }

    /// Rotates about the polygon centroid.
    pub fn rotate(&self, angle: F) -> Self {
        self.rotate_about(self.centroid(), angle)
    }

    /// Uniform scaling about the centroid.
    pub fn scale(&self, factor: F) -> Self {
        let c = self.centroid();
        let map = |ring: &Ring<F>| {
            ring.iter()
                .map(|p| c + (*p - c) * factor)
                .collect::<Ring<F>>()
        };
        Self {
            exterior: map(&self.exterior),
            interiors: self.interiors.iter().map(map).collect(),
        }
    }

    /// Point classification against the polygon including holes.
    pub fn contains(&self, p: Vec2<F>) -> Containment {
        match ring_contains(&self.exterior, p) {
            Containment::Outside => Containment::Outside,
            Containment::OnBoundary => Containment::OnBoundary,
            Containment::Inside => {
                for hole in &self.interiors {
                    match ring_contains(hole, p) {
                        Containment::Inside => return Containment::Outside,
                        Containment::OnBoundary => return Containment::OnBoundary,
                        Containment::Outside => {}
                    }
                }
                Containment::Inside
            }
        }
    }

    /// Signed distance from `p` to the polygon boundary, negative inside.
    pub fn signed_distance(&self, p: Vec2<F>) -> F {
        let mut dist = F::infinity();
        for w in self.exterior.windows(2) {
            dist = dist.min(point_segment_distance(p, w[0], w[1]));
        }
        for hole in &self.interiors {
            for w in hole.windows(2) {
                dist = dist.min(point_segment_distance(p, w[0], w[1]));
            }
        }
        match self.contains(p) {
            Containment::Inside => -dist,
            Containment::OnBoundary => F::zero(),
            Containment::Outside => dist,
        }
    }

    /// Polar moment of area about the centroid scaled by `rho_h` (ρ·h),
    /// i.e. the moment of inertia of a plate of that areal density.
    ///
    /// Green's-theorem summation: `(ρh/12) Σ wᵢ ((xᵢ²+xᵢxᵢ₊₁+xᵢ₊₁²) +
    /// (yᵢ²+yᵢyᵢ₊₁+yᵢ₊₁²))` with `wᵢ` the edge cross product.
    pub fn moment_of_inertia(&self, rho_h: F) -> F {
        let c = self.centroid();
        let ring_term = |ring: &Ring<F>| {
            let mut sum = F::zero();
            for w in ring.windows(2) {
                let a = w[0] - c;
                let b = w[1] - c;
                let cross = a.cross(b);
                let term = a.x * a.x
                    + a.x * b.x
                    + b.x * b.x
                    + a.y * a.y
                    + a.y * b.y
                    + b.y * b.y;
                sum += cross * term;
            }
            sum
        };
        let mut total = ring_term(&self.exterior);
        for hole in &self.interiors {
            // Holes are wound clockwise, so their contribution subtracts.
            total += ring_term(hole);
        }
        (rho_h / F::lit(12.0) * total).abs()
    }

    /// Interior angle at every exterior vertex, in radians.
    ///
    /// The ring is traversed clockwise and the convex-angle test against the
    /// polygon edges decides whether the reflex complement is taken.
    pub fn interior_angles(&self) -> Vec<F> {
        let mut ring: Ring<F> = self.exterior.clone();
        if ring_signed_area(&ring) > F::zero() {
            reverse_ring(&mut ring);
        }
        let n = ring.len() - 1;
        let two_pi = F::lit(std::f64::consts::TAU);
        let mut angles = Vec::with_capacity(n);
        for i in 0..n {
            let prev = ring[(i + n - 1) % n];
            let v = ring[i];
            let next = ring[i + 1];
            let u = prev - v;
            let w = next - v;
            let denom = u.length() * w.length();
            if denom == F::zero() {
                angles.push(F::zero());
                continue;
            }
            let cos = (u.dot(w) / denom).max(-F::one()).min(F::one());
            let raw = cos.acos();
            // For a clockwise ring the vertex is convex when the turn from
            // the incoming to the outgoing edge is counter-clockwise.
            let convex = u.cross(w) > F::zero();
            angles.push(if convex { raw } else { two_pi - raw });
        }
        angles
    }

    /// Crossing points between this polygon's boundary and `other`'s.
    pub fn boundary_intersections(&self, other: &Self) -> Vec<Vec2<F>> {
        clip::boundary_intersections(self, other)
    }

    /// Boolean intersection with another polygon (holes ignored).
    pub fn intersection(&self, other: &Self) -> Vec<Polygon<F>> {
        clip::intersection(self, other)
    }

    /// Boolean difference `self \ other` (holes ignored on both operands;
    /// a fully-contained subtrahend produces a hole).
    pub fn difference(&self, other: &Self) -> Vec<Polygon<F>> {
        clip::difference(self, other)
    }

    /// Boolean union with another polygon.
    pub fn union(&self, other: &Self) -> Vec<Polygon<F>> {
        clip::union(self, other)
    }

    /// Splits the polygon at the horizontal line `y`, returning the pieces
    /// below and above the line. Holes intersecting the cut are opened.
    pub fn split_at_horizontal_line(&self, y: F) -> (Vec<Polygon<F>>, Vec<Polygon<F>>) {
        clip::split_at_horizontal_line(self, y)
    }

    /// Cuts the polygon horizontally through the centroid of its first hole.
    /// Returns the piece lists below and above the cut.
    pub fn split_around_first_hole(&self) -> (Vec<Polygon<F>>, Vec<Polygon<F>>) {
        match self.interiors.first() {
            None => (vec![self.clone()], Vec::new()),
            Some(hole) => self.split_at_horizontal_line(ring_centroid(hole).y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Polygon<f64> {
        Polygon::rectangle(Vec2::new(0.0, 0.0), Vec2::new(side, side)).unwrap()
    }

    #[test]
    fn rejects_degenerate_rings() {
        let line = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
        ];
        assert!(Polygon::from_ring(line).is_err());
        let two = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        assert!(Polygon::<f64>::from_ring(two).is_err());
    }

    #[test]
    fn closes_and_orients_rings() {
        // Clockwise open input.
        let p = Polygon::from_ring(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 0.0),
        ] as Ring<f64>)
        .unwrap();
        assert_eq!(p.exterior().first(), p.exterior().last());
        assert!(p.signed_area() > 0.0);
        assert!((p.area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn area_and_centroid_with_hole() {
        let outer: Ring<f64> = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        let hole = vec![
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(1.0, 2.0),
        ];
        let p = Polygon::new(outer, vec![hole]).unwrap();
        assert!(p.has_holes());
        assert!((p.area() - 15.0).abs() < 1e-12);
        // Hole below-left of center pushes the centroid up-right of (2, 2).
        let c = p.centroid();
        assert!(c.x > 2.0 && c.y > 2.0);
        let bare = p.remove_holes();
        assert!(!bare.has_holes());
        assert!((bare.area() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn containment_classes() {
        let p = square(2.0);
        assert_eq!(p.contains(Vec2::new(1.0, 1.0)), Containment::Inside);
        assert_eq!(p.contains(Vec2::new(2.0, 1.0)), Containment::OnBoundary);
        assert_eq!(p.contains(Vec2::new(3.0, 1.0)), Containment::Outside);
    }

    #[test]
    fn signed_distance_sign_convention() {
        let p = square(2.0);
        assert!((p.signed_distance(Vec2::new(1.0, 1.0)) + 1.0).abs() < 1e-12);
        assert!((p.signed_distance(Vec2::new(3.0, 1.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn translation_preserves_area() {
        let p = square(3.0);
        let q = p.translate(Vec2::new(17.0, -4.0));
        assert!((p.area() - q.area()).abs() < 1e-12);
        assert!((q.centroid().x - 18.5).abs() < 1e-12);
    }

    #[test]
    fn rotation_preserves_area_and_centroid() {
        let p = square(2.0);
        let q = p.rotate(0.7);
        assert!((p.area() - q.area()).abs() < 1e-9);
        assert!(p.centroid().distance(q.centroid()) < 1e-9);
    }

    #[test]
    fn max_radius_dominates_vertices() {
        let p = square(2.0);
        let c = p.centroid();
        let r = p.max_radius(c);
        for v in p.exterior() {
            assert!(r + 1e-12 >= v.distance(c));
        }
    }

    #[test]
    fn rectangle_moment_of_inertia() {
        // Solid rectangle about its centroid: I = ρh·w·h·(w² + h²)/12.
        let p = Polygon::rectangle(Vec2::new(0.0_f64, 0.0), Vec2::new(4.0, 2.0)).unwrap();
        let expected = 1.0 * 4.0 * 2.0 * (16.0 + 4.0) / 12.0;
        assert!((p.moment_of_inertia(1.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn square_interior_angles_are_right() {
        let p = square(2.0);
        for angle in p.interior_angles() {
            assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        }
    }

    #[test]
    fn l_shape_has_one_reflex_angle() {
        let p = Polygon::from_ring(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(0.0, 2.0),
        ])
        .unwrap();
        let angles = p.interior_angles();
        let reflex = angles
            .iter()
            .filter(|a| **a > std::f64::consts::PI)
            .count();
        assert_eq!(reflex, 1);
        let total: f64 = angles.iter().sum();
        // Sum of interior angles of a hexagon.
        assert!((total - 4.0 * std::f64::consts::PI).abs() < 1e-9);
    }
}
