//! Contact force construction: elastic normal force direction and Coulomb
//! friction for one overlap region.

use crate::geometry::{Containment, Polygon};
use crate::utils::math::{FloeFloat, Vec2};

/// Elastic spring constant for a floe-floe contact.
///
/// Very large floes use the stiffer min-form; the harmonic form otherwise.
pub fn floe_pair_force_factor<F: FloeFloat>(e: F, h1: F, a1: F, h2: F, a2: F) -> F {
    let large = F::lit(1e9);
    if a1.min(a2) > large {
        e * h1.min(h2) / a1.sqrt().min(a2.sqrt())
    } else {
        e * h1 * h2 / (h1 * a2.sqrt() + h2 * a1.sqrt())
    }
}

/// Elastic spring constant for a floe-wall or floe-topography contact.
pub fn boundary_force_factor<F: FloeFloat>(e: F, height: F, area: F) -> F {
    e * height / area.sqrt()
}

/// Direction of the normal force exerted on `poly_i` by `poly_j` over one
/// overlap region.
///
/// With exactly two boundary crossing points on the region, the force axis
/// is the perpendicular to their chord. Otherwise the region edges lying on
/// `poly_i`'s boundary vote for an averaged outward direction. The sign is
/// fixed so a small push along the force reduces the overlap.
pub fn normal_force_direction<F: FloeFloat>(
    poly_i: &Polygon<F>,
    poly_j: &Polygon<F>,
    region: &Polygon<F>,
) -> Option<Vec2<F>> {
    let region_centroid = region.centroid();
    let probe = region.area().sqrt() * F::lit(1e-3);
    let on_region = |p: Vec2<F>| {
        region.signed_distance(p).abs() <= probe.max(F::lit(1e-8))
    };
    let crossings: Vec<Vec2<F>> = poly_i
        .boundary_intersections(poly_j)
        .into_iter()
        .filter(|p| on_region(*p))
        .collect();

    if crossings.len() == 2 {
        let chord = crossings[1] - crossings[0];
        let axis = chord.perp().normalize_or_zero();
        if axis == Vec2::zero() {
            return None;
        }
        // Push floe `i` away from floe `j`: that is the orientation along
        // which a small displacement reduces the overlap.
        let separation = poly_i.centroid() - poly_j.centroid();
        let score = if separation == Vec2::zero() {
            axis.dot(poly_i.centroid() - region_centroid)
        } else {
            axis.dot(separation)
        };
        if score < F::zero() {
            return Some(-axis);
        }
        return Some(axis);
    }

    let eps = F::lit(1e-8);
    let mut accum = Vec2::zero();
    for w in region.exterior().windows(2) {
        let mid = (w[0] + w[1]) * F::lit(0.5);
        if poly_i.signed_distance(mid).abs() >= eps {
            continue;
        }
        let edge = w[1] - w[0];
        let mut n = Vec2::new(edge.y, -edge.x);
        // Keep the orientation that steps off the edge out of the region.
        if region.contains(mid + n.normalize_or_zero() * probe) == Containment::Inside {
            n = -n;
        }
        accum += n;
    }
    let dir = accum.normalize_or_zero();
    if dir == Vec2::zero() {
        None
    } else {
        Some(dir)
    }
}

/// Friction at a contact point with relative velocity `rel_vel` (this floe
/// relative to the other body). Linear in the slip rate through the shear
/// modulus, capped by the Coulomb limit `μ|N|`.
pub fn friction_force<F: FloeFloat>(
    rel_vel: Vec2<F>,
    normal_force: Vec2<F>,
    contact_len: F,
    dt: F,
    shear_modulus: F,
    mu: F,
) -> Vec2<F> {
    let slip = rel_vel.length();
    if slip == F::zero() {
        return Vec2::zero();
    }
    let n_mag = normal_force.length();
    let tangent = rel_vel / slip;
    let raw = shear_modulus * contact_len * dt * n_mag * slip;
    let mag = raw.min(mu * n_mag);
    -tangent * mag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(min: (f64, f64), max: (f64, f64)) -> Polygon<f64> {
        Polygon::rectangle(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1)).unwrap()
    }

    #[test]
    fn harmonic_force_factor_for_normal_floes() {
        let k = floe_pair_force_factor(6e6_f64, 0.5, 1e8, 0.5, 1e8);
        let expected = 6e6 * 0.5 * 0.5 / (0.5 * 1e4 + 0.5 * 1e4);
        assert!((k - expected).abs() < 1e-9);
    }

    #[test]
    fn large_floes_use_min_form() {
        let k = floe_pair_force_factor(6e6_f64, 0.5, 4e9, 1.0, 9e9);
        let expected = 6e6 * 0.5 / (4e9_f64).sqrt();
        assert!((k - expected).abs() < 1e-9);
    }

    #[test]
    fn two_crossing_normal_points_out_of_the_other_floe() {
        // Two squares overlapping along x; the overlap is the strip between
        // x = 1 and x = 2.
        let a = rect((0.0, 0.0), (2.0, 2.0));
        let b = rect((1.0, 0.1), (3.0, 1.9));
        let region = &a.intersection(&b)[0];
        let dir = normal_force_direction(&a, &b, region).unwrap();
        // Force on `a` pushes it west, out of `b`.
        assert!(dir.x < -0.9);
        assert!(dir.y.abs() < 0.1);
    }

    #[test]
    fn friction_opposes_relative_motion_and_is_capped() {
        let rel: Vec2<f64> = Vec2::new(0.4, 0.0);
        let normal = Vec2::new(0.0, 1e6);
        let f = friction_force(rel, normal, 100.0, 10.0, 2.3e6, 0.2);
        assert!(f.x < 0.0);
        assert!(f.y.abs() < 1e-9);
        assert!(f.length() <= 0.2 * 1e6 + 1e-6);
    }

    #[test]
    fn zero_slip_gives_zero_friction() {
        let f: Vec2<f64> =
            friction_force(Vec2::zero(), Vec2::new(0.0, 1e6), 100.0, 10.0, 2.3e6, 0.2);
        assert_eq!(f, Vec2::zero());
    }
}
