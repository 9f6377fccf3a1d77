//! Polygon boolean operations.
//!
//! Floe-floe overlap, deformation, and fusion all reduce to intersection,
//! difference, and union of simple polygons. Crossing-linked traversal
//! (Greiner–Hormann) handles the general non-convex case; a containment
//! fallback covers operand pairs whose boundaries do not cross. Convex
//! clip regions (Voronoi half-planes, horizontal splits) go through plain
//! half-plane clipping.

use crate::utils::math::{FloeFloat, Vec2};

use super::polygon::{
    ring_contains, ring_signed_area, Containment, Polygon, Ring,
};

/// Parametric tolerance: crossings this close to an edge endpoint are not
/// treated as transversal.
const ALPHA_EPS: f64 = 1e-9;

/// Output rings with less enclosed area than this (m²) are discarded.
const MIN_RING_AREA: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolOp {
    Intersection,
    Difference,
    Union,
}

/// Transversal crossing of two segments, with both parametric coordinates.
fn segment_crossing<F: FloeFloat>(
    p1: Vec2<F>,
    p2: Vec2<F>,
    q1: Vec2<F>,
    q2: Vec2<F>,
) -> Option<(F, F, Vec2<F>)> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.cross(s);
    let scale = r.length() * s.length();
    if denom.abs() <= F::lit(1e-12) * scale {
        return None;
    }
    let qp = q1 - p1;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    let lo = F::lit(ALPHA_EPS);
    let hi = F::one() - F::lit(ALPHA_EPS);
    if t < lo || t > hi || u < lo || u > hi {
        return None;
    }
    Some((t, u, p1 + r * t))
}

/// All boundary crossing points between two polygons, endpoints included.
pub fn boundary_intersections<F: FloeFloat>(a: &Polygon<F>, b: &Polygon<F>) -> Vec<Vec2<F>> {
    let mut points: Vec<Vec2<F>> = Vec::new();
    let eps = F::lit(1e-6);
    for ea in a.exterior().windows(2) {
        for eb in b.exterior().windows(2) {
            let r = ea[1] - ea[0];
            let s = eb[1] - eb[0];
            let denom = r.cross(s);
            if denom.abs() <= F::lit(1e-12) * r.length() * s.length() {
                continue;
            }
            let qp = eb[0] - ea[0];
            let t = qp.cross(s) / denom;
            let u = qp.cross(r) / denom;
            if t < -F::lit(ALPHA_EPS)
                || t > F::one() + F::lit(ALPHA_EPS)
                || u < -F::lit(ALPHA_EPS)
                || u > F::one() + F::lit(ALPHA_EPS)
            {
                continue;
            }
            let p = ea[0] + r * t;
            if !points.iter().any(|q| q.distance(p) <= eps) {
                points.push(p);
            }
        }
    }
    points
}

struct Node<F> {
    pos: Vec2<F>,
    next: usize,
    prev: usize,
    neighbor: usize,
    entry: bool,
    visited: bool,
    is_crossing: bool,
}

struct Crossing<F> {
    pos: Vec2<F>,
    s_edge: usize,
    s_alpha: F,
    c_edge: usize,
    c_alpha: F,
}

fn open_ring<F: FloeFloat>(ring: &[Vec2<F>]) -> &[Vec2<F>] {
    &ring[..ring.len() - 1]
}

/// Builds the circularly-linked node list for one ring, splicing crossings
/// into their edges sorted by parametric position. Returns the arena index
/// of each crossing.
fn build_nodes<F: FloeFloat>(
    arena: &mut Vec<Node<F>>,
    ring: &[Vec2<F>],
    crossings: &[Crossing<F>],
    subject_side: bool,
) -> Vec<usize> {
    let base = arena.len();
    let mut crossing_nodes = vec![usize::MAX; crossings.len()];
    for (edge, vertex) in ring.iter().enumerate() {
        arena.push(Node {
            pos: *vertex,
            next: 0,
            prev: 0,
            neighbor: usize::MAX,
            entry: false,
            visited: false,
            is_crossing: false,
        });
        let mut on_edge: Vec<(F, usize)> = crossings
            .iter()
            .enumerate()
            .filter_map(|(k, c)| {
                let (e, alpha) = if subject_side {
                    (c.s_edge, c.s_alpha)
                } else {
                    (c.c_edge, c.c_alpha)
                };
                (e == edge).then_some((alpha, k))
            })
            .collect();
        on_edge.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        for (_, k) in on_edge {
            crossing_nodes[k] = arena.len();
            arena.push(Node {
                pos: crossings[k].pos,
                next: 0,
                prev: 0,
                neighbor: usize::MAX,
                entry: false,
                visited: false,
                is_crossing: true,
            });
        }
    }
    let len = arena.len() - base;
    for i in 0..len {
        arena[base + i].next = base + (i + 1) % len;
        arena[base + i].prev = base + (i + len - 1) % len;
    }
    crossing_nodes
}

/// Marks entry/exit flags along one ring by toggling an inside/outside
/// state seeded from an original vertex kept off the other boundary.
fn mark_entries<F: FloeFloat>(
    arena: &mut [Node<F>],
    ring_start: usize,
    other: &[Vec2<F>],
) -> bool {
    // Find a non-crossing node whose containment in the other ring is
    // unambiguous.
    let mut seed = usize::MAX;
    let mut inside = false;
    let mut idx = ring_start;
    loop {
        if !arena[idx].is_crossing {
            match ring_contains(other, arena[idx].pos) {
                Containment::Inside => {
                    seed = idx;
                    inside = true;
                    break;
                }
                Containment::Outside => {
                    seed = idx;
                    inside = false;
                    break;
                }
                Containment::OnBoundary => {}
            }
        }
        idx = arena[idx].next;
        if idx == ring_start {
            break;
        }
    }
    if seed == usize::MAX {
        return false;
    }
    let mut idx = arena[seed].next;
    let mut state = inside;
    while idx != seed {
        if arena[idx].is_crossing {
            arena[idx].entry = !state;
            state = !state;
        }
        idx = arena[idx].next;
    }
    // An odd crossing count means the parity bookkeeping is broken.
    state == inside
}

fn trace_rings<F: FloeFloat>(arena: &mut [Node<F>], crossing_nodes: &[usize]) -> Vec<Ring<F>> {
    let mut rings = Vec::new();
    let cap = 4 * arena.len() + 8;
    for &start in crossing_nodes {
        if arena[start].visited {
            continue;
        }
        let mut ring: Ring<F> = vec![arena[start].pos];
        let mut current = start;
        let mut steps = 0usize;
        let mut ok = true;
        loop {
            arena[current].visited = true;
            let nb = arena[current].neighbor;
            arena[nb].visited = true;
            if arena[current].entry {
                loop {
                    current = arena[current].next;
                    ring.push(arena[current].pos);
                    steps += 1;
                    if arena[current].is_crossing || steps > cap {
                        break;
                    }
                }
            } else {
                loop {
                    current = arena[current].prev;
                    ring.push(arena[current].pos);
                    steps += 1;
                    if arena[current].is_crossing || steps > cap {
                        break;
                    }
                }
            }
            if steps > cap {
                ok = false;
                break;
            }
            arena[current].visited = true;
            let nb = arena[current].neighbor;
            arena[nb].visited = true;
            current = nb;
            if current == start || arena[current].neighbor == start {
                break;
            }
        }
        if ok {
            rings.push(ring);
        }
    }
    rings
}

fn clean_ring<F: FloeFloat>(mut ring: Ring<F>) -> Option<Ring<F>> {
    let eps = F::lit(1e-9);
    ring.dedup_by(|a, b| a.distance(*b) <= eps);
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first.distance(last) <= eps {
            ring.pop();
        }
    }
    if ring.len() < 3 {
        return None;
    }
    ring.push(ring[0]);
    if ring_signed_area(&ring).abs() < F::lit(MIN_RING_AREA) {
        return None;
    }
    Some(ring)
}

/// A point strictly inside a closed ring, probing the centroid first and
/// inward-nudged edge midpoints as fallback.
fn ring_interior_point<F: FloeFloat>(ring: &[Vec2<F>]) -> Vec2<F> {
    let c = super::polygon::ring_centroid(ring);
    if ring_contains(ring, c) == Containment::Inside {
        return c;
    }
    let scale = ring_signed_area(ring).abs().sqrt();
    for frac in [1e-3, 1e-6] {
        let nudge = scale * F::lit(frac);
        for w in ring.windows(2) {
            let mid = (w[0] + w[1]) * F::lit(0.5);
            let n = (w[1] - w[0]).perp().normalize_or_zero();
            for probe in [mid + n * nudge, mid - n * nudge] {
                if ring_contains(ring, probe) == Containment::Inside {
                    return probe;
                }
            }
        }
    }
    c
}

/// Groups traced rings into polygons by nesting depth: rings contained in
/// an even number of others are exteriors, odd-depth rings are holes of
/// the smallest exterior containing them. Traversal direction is not a
/// reliable orientation signal, so orientation is normalized downstream.
fn assemble_rings<F: FloeFloat>(rings: Vec<Ring<F>>) -> Vec<Polygon<F>> {
    let cleaned: Vec<Ring<F>> = rings.into_iter().filter_map(clean_ring).collect();
    let probes: Vec<Vec2<F>> = cleaned.iter().map(|r| ring_interior_point(r)).collect();
    let mut depth = vec![0usize; cleaned.len()];
    for i in 0..cleaned.len() {
        for j in 0..cleaned.len() {
            if i != j && ring_contains(&cleaned[j], probes[i]) == Containment::Inside {
                depth[i] += 1;
            }
        }
    }

    let outer_ids: Vec<usize> = (0..cleaned.len()).filter(|i| depth[*i] % 2 == 0).collect();
    let mut grouped: Vec<(Ring<F>, Vec<Ring<F>>)> = outer_ids
        .iter()
        .map(|&i| (cleaned[i].clone(), Vec::new()))
        .collect();
    for i in (0..cleaned.len()).filter(|i| depth[*i] % 2 == 1) {
        let mut best: Option<usize> = None;
        for (slot, &oid) in outer_ids.iter().enumerate() {
            if ring_contains(&cleaned[oid], probes[i]) != Containment::Inside {
                continue;
            }
            let smaller = match best {
                None => true,
                Some(b) => {
                    ring_signed_area(&cleaned[oid]).abs()
                        < ring_signed_area(&cleaned[outer_ids[b]]).abs()
                }
            };
            if smaller {
                best = Some(slot);
            }
        }
        if let Some(slot) = best {
            grouped[slot].1.push(cleaned[i].clone());
        }
    }
    grouped
        .into_iter()
        .filter_map(|(outer, holes)| Polygon::new(outer, holes).ok())
        .collect()
}

/// A point strictly inside the polygon, probing inward-nudged edge
/// midpoints at a few scales before settling for the centroid.
fn interior_point<F: FloeFloat>(poly: &Polygon<F>) -> Vec2<F> {
    let c = poly.centroid();
    if poly.contains(c) == Containment::Inside {
        return c;
    }
    let scale = poly.area().sqrt();
    for frac in [1e-3, 1e-6, 1e-9] {
        let nudge = scale * F::lit(frac);
        for w in poly.exterior().windows(2) {
            let mid = (w[0] + w[1]) * F::lit(0.5);
            let inward = (w[1] - w[0]).perp().normalize_or_zero();
            let probe = mid + inward * nudge;
            if poly.contains(probe) == Containment::Inside {
                return probe;
            }
        }
    }
    c
}

/// Crossing-linked clipping; `None` requests the containment fallback.
fn greiner_hormann<F: FloeFloat>(
    subject: &Polygon<F>,
    clip: &Polygon<F>,
    op: BoolOp,
) -> Option<Vec<Polygon<F>>> {
    let s_ring = open_ring(subject.exterior());
    let c_ring = open_ring(clip.exterior());

    let mut crossings: Vec<Crossing<F>> = Vec::new();
    for (i, sa) in s_ring.iter().enumerate() {
        let sb = s_ring[(i + 1) % s_ring.len()];
        for (j, ca) in c_ring.iter().enumerate() {
            let cb = c_ring[(j + 1) % c_ring.len()];
            if let Some((t, u, pos)) = segment_crossing(*sa, sb, *ca, cb) {
                crossings.push(Crossing {
                    pos,
                    s_edge: i,
                    s_alpha: t,
                    c_edge: j,
                    c_alpha: u,
                });
            }
        }
    }
    if crossings.is_empty() || crossings.len() % 2 != 0 {
        return None;
    }

    let mut arena: Vec<Node<F>> = Vec::new();
    let s_nodes = build_nodes(&mut arena, s_ring, &crossings, true);
    let c_base = arena.len();
    let c_nodes = build_nodes(&mut arena, c_ring, &crossings, false);
    for k in 0..crossings.len() {
        let (sn, cn) = (s_nodes[k], c_nodes[k]);
        arena[sn].neighbor = cn;
        arena[cn].neighbor = sn;
    }

    if !mark_entries(&mut arena, 0, clip.exterior()) {
        return None;
    }
    if !mark_entries(&mut arena, c_base, subject.exterior()) {
        return None;
    }

    match op {
        BoolOp::Intersection => {}
        BoolOp::Difference => {
            for idx in &s_nodes {
                arena[*idx].entry = !arena[*idx].entry;
            }
        }
        BoolOp::Union => {
            for node in arena.iter_mut() {
                if node.is_crossing {
                    node.entry = !node.entry;
                }
            }
        }
    }

    let rings = trace_rings(&mut arena, &s_nodes);
    Some(assemble_rings(rings))
}

fn boxes_disjoint<F: FloeFloat>(a: &Polygon<F>, b: &Polygon<F>) -> bool {
    let (amin, amax) = a.bounding_box();
    let (bmin, bmax) = b.bounding_box();
    amax.x < bmin.x || bmax.x < amin.x || amax.y < bmin.y || bmax.y < amin.y
}

/// Boolean intersection of two polygons (exterior rings).
pub fn intersection<F: FloeFloat>(a: &Polygon<F>, b: &Polygon<F>) -> Vec<Polygon<F>> {
    if boxes_disjoint(a, b) {
        return Vec::new();
    }
    if let Some(result) = greiner_hormann(a, b, BoolOp::Intersection) {
        return result;
    }
    // No transversal crossings: either one operand contains the other or
    // they are disjoint. The contained operand is the smaller one.
    if a.area() <= b.area() {
        if b.contains(interior_point(a)) != Containment::Outside {
            return vec![a.remove_holes()];
        }
    } else if a.contains(interior_point(b)) != Containment::Outside {
        return vec![b.remove_holes()];
    }
    Vec::new()
}

/// Boolean difference `a \ b`. A subtrahend strictly inside the subject
/// produces a polygon with a hole.
pub fn difference<F: FloeFloat>(a: &Polygon<F>, b: &Polygon<F>) -> Vec<Polygon<F>> {
    if boxes_disjoint(a, b) {
        return vec![a.clone()];
    }
    if let Some(result) = greiner_hormann(a, b, BoolOp::Difference) {
        return result;
    }
    if a.area() <= b.area() {
        if b.contains(interior_point(a)) != Containment::Outside {
            return Vec::new();
        }
    } else if a.contains(interior_point(b)) != Containment::Outside {
        let hole: Ring<F> = b.exterior().to_vec();
        return Polygon::new(a.exterior().to_vec(), vec![hole])
            .map(|p| vec![p])
            .unwrap_or_default();
    }
    vec![a.clone()]
}

/// Boolean union of two polygons.
pub fn union<F: FloeFloat>(a: &Polygon<F>, b: &Polygon<F>) -> Vec<Polygon<F>> {
    if boxes_disjoint(a, b) {
        return vec![a.clone(), b.clone()];
    }
    if let Some(result) = greiner_hormann(a, b, BoolOp::Union) {
        return result;
    }
    if a.area() <= b.area() {
        if b.contains(interior_point(a)) != Containment::Outside {
            return vec![b.clone()];
        }
    } else if a.contains(interior_point(b)) != Containment::Outside {
        return vec![a.clone()];
    }
    vec![a.clone(), b.clone()]
}

/// Half-plane clip of an open ring, keeping the side `normal·p ≤ offset`.
/// Sutherland-Hodgman step over one plane.
pub fn clip_ring_halfplane<F: FloeFloat>(
    ring: &[Vec2<F>],
    normal: Vec2<F>,
    offset: F,
) -> Vec<Vec2<F>> {
    if ring.is_empty() {
        return Vec::new();
    }
    let eps = F::lit(1e-12);
    let mut clipped = Vec::with_capacity(ring.len() + 2);
    for i in 0..ring.len() {
        let current = ring[i];
        let next = ring[(i + 1) % ring.len()];
        let current_dist = normal.dot(current) - offset;
        let next_dist = normal.dot(next) - offset;
        let current_inside = current_dist <= eps;
        let next_inside = next_dist <= eps;

        if current_inside && next_inside {
            clipped.push(next);
        } else if current_inside && !next_inside {
            if let Some(p) = plane_crossing(current, next, current_dist, next_dist) {
                clipped.push(p);
            }
        } else if !current_inside && next_inside {
            if let Some(p) = plane_crossing(current, next, current_dist, next_dist) {
                clipped.push(p);
            }
            clipped.push(next);
        }
    }
    clipped
}

fn plane_crossing<F: FloeFloat>(
    start: Vec2<F>,
    end: Vec2<F>,
    start_dist: F,
    end_dist: F,
) -> Option<Vec2<F>> {
    let denom = start_dist - end_dist;
    if denom.abs() <= F::lit(1e-12) {
        return None;
    }
    let t = start_dist / denom;
    Some(start + (end - start) * t)
}

fn clip_to_rect_with_holes<F: FloeFloat>(poly: &Polygon<F>, rect: &Polygon<F>) -> Vec<Polygon<F>> {
    let mut pieces = intersection(&poly.remove_holes(), rect);
    for hole in poly.interiors() {
        let Ok(hole_poly) = Polygon::from_ring(hole.clone()) else {
            continue;
        };
        pieces = pieces
            .iter()
            .flat_map(|piece| difference(piece, &hole_poly))
            .collect();
    }
    pieces
}

/// Splits a polygon at the horizontal line `y` into (below, above) pieces.
pub fn split_at_horizontal_line<F: FloeFloat>(
    poly: &Polygon<F>,
    y: F,
) -> (Vec<Polygon<F>>, Vec<Polygon<F>>) {
    let (min, max) = poly.bounding_box();
    let pad = ((max.x - min.x) + (max.y - min.y)) * F::lit(0.5) + F::one();
    // Nudge the cut off any coincident vertex so crossings stay transversal.
    let mut cut = y;
    let near = F::lit(1e-9) * (max.y - min.y).max(F::one());
    let coincident = |c: F| {
        poly.exterior()
            .iter()
            .chain(poly.interiors().iter().flatten())
            .any(|p| (p.y - c).abs() <= near)
    };
    while coincident(cut) {
        cut += near * F::lit(3.0);
    }

    if cut <= min.y {
        return (Vec::new(), vec![poly.clone()]);
    }
    if cut >= max.y {
        return (vec![poly.clone()], Vec::new());
    }

    let below_rect = Polygon::rectangle(
        Vec2::new(min.x - pad, min.y - pad),
        Vec2::new(max.x + pad, cut),
    );
    let above_rect = Polygon::rectangle(
        Vec2::new(min.x - pad, cut),
        Vec2::new(max.x + pad, max.y + pad),
    );
    let (Ok(below_rect), Ok(above_rect)) = (below_rect, above_rect) else {
        return (vec![poly.clone()], Vec::new());
    };
    (
        clip_to_rect_with_holes(poly, &below_rect),
        clip_to_rect_with_holes(poly, &above_rect),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: (f64, f64), side: f64) -> Polygon<f64> {
        Polygon::rectangle(
            Vec2::new(min.0, min.1),
            Vec2::new(min.0 + side, min.1 + side),
        )
        .unwrap()
    }

    fn total_area(polys: &[Polygon<f64>]) -> f64 {
        polys.iter().map(|p| p.area()).sum()
    }

    #[test]
    fn overlapping_squares_intersect_in_unit_square() {
        let a = square((0.0, 0.0), 2.0);
        let b = square((1.0, 1.0), 2.0);
        let inter = intersection(&a, &b);
        assert_eq!(inter.len(), 1);
        assert!((total_area(&inter) - 1.0).abs() < 1e-9);
        let c = inter[0].centroid();
        assert!((c.x - 1.5).abs() < 1e-9 && (c.y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn self_intersection_is_identity() {
        let a = square((0.0, 0.0), 2.0);
        let inter = intersection(&a, &a);
        assert!((total_area(&inter) - a.area()).abs() < 1e-9);
        assert!(difference(&a, &a).is_empty());
    }

    #[test]
    fn disjoint_polygons_do_not_intersect() {
        let a = square((0.0, 0.0), 1.0);
        let b = square((5.0, 5.0), 1.0);
        assert!(intersection(&a, &b).is_empty());
        assert!((total_area(&difference(&a, &b)) - 1.0).abs() < 1e-12);
        assert!((total_area(&union(&a, &b)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn contained_operand_shortcuts() {
        let big = square((0.0, 0.0), 4.0);
        let small = square((1.0, 1.0), 1.0);
        let inter = intersection(&big, &small);
        assert!((total_area(&inter) - 1.0).abs() < 1e-12);
        let uni = union(&big, &small);
        assert!((total_area(&uni) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn difference_of_contained_hole() {
        let big = square((0.0, 0.0), 4.0);
        let small = square((1.0, 1.0), 1.0);
        let diff = difference(&big, &small);
        assert_eq!(diff.len(), 1);
        assert!(diff[0].has_holes());
        assert!((diff[0].area() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn difference_carves_an_l_shape() {
        let a = square((0.0, 0.0), 2.0);
        let b = square((1.0, 1.0), 2.0);
        let diff = difference(&a, &b);
        assert!((total_area(&diff) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_offset_squares() {
        let a = square((0.0, 0.0), 2.0);
        let b = square((1.0, 1.0), 2.0);
        let uni = union(&a, &b);
        assert_eq!(uni.len(), 1);
        assert!((total_area(&uni) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn nonconvex_intersection_splits_in_two() {
        // A "U" shape crossed by a bar intersects in the two prongs.
        let u = Polygon::from_ring(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(2.0, 3.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(0.0, 3.0),
        ])
        .unwrap();
        let bar = Polygon::rectangle(Vec2::new(-1.0, 1.5), Vec2::new(4.0, 2.5)).unwrap();
        let inter = intersection(&u, &bar);
        assert_eq!(inter.len(), 2);
        assert!((total_area(&inter) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn boundary_intersections_of_offset_squares() {
        let a = square((0.0, 0.0), 2.0);
        let b = square((1.0, 1.0), 2.0);
        let pts = boundary_intersections(&a, &b);
        assert_eq!(pts.len(), 2);
        for p in pts {
            assert!((p.distance(Vec2::new(2.0, 1.0)) < 1e-9)
                || (p.distance(Vec2::new(1.0, 2.0)) < 1e-9));
        }
    }

    #[test]
    fn halfplane_clip_keeps_lower_half() {
        let ring: Vec<Vec2<f64>> = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        // Keep y <= 1.
        let clipped = clip_ring_halfplane(&ring, Vec2::new(0.0, 1.0), 1.0);
        let mut closed = clipped.clone();
        closed.push(closed[0]);
        assert!((ring_signed_area(&closed).abs() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn horizontal_split_partitions_area() {
        let p = square((0.0, 0.0), 2.0);
        let (below, above) = split_at_horizontal_line(&p, 0.5);
        assert!((total_area(&below) - 1.0).abs() < 1e-6);
        assert!((total_area(&above) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn split_around_hole_opens_it() {
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        let hole = vec![
            Vec2::new(1.5, 1.5),
            Vec2::new(2.5, 1.5),
            Vec2::new(2.5, 2.5),
            Vec2::new(1.5, 2.5),
        ];
        let p = Polygon::new(outer, vec![hole]).unwrap();
        let (below, above) = p.split_around_first_hole();
        assert!(!below.is_empty() && !above.is_empty());
        for piece in below.iter().chain(above.iter()) {
            assert!(!piece.has_holes());
        }
        let total: f64 = total_area(&below) + total_area(&above);
        assert!((total - 15.0).abs() < 1e-5);
    }
}
