//! Bounded Voronoi tessellation used to shatter floes and seed floe fields.

use log::warn;
use rand::Rng;

use crate::utils::math::{FloeFloat, Vec2};

use super::clip::clip_ring_halfplane;
use super::polygon::{Containment, Polygon};

/// Fraction of the requested seed count below which a warning is logged.
const WARN_FRACTION: f64 = 0.5;

/// Uniform sample inside an axis-aligned box.
fn sample_in_box<F: FloeFloat, R: Rng>(rng: &mut R, min: Vec2<F>, max: Vec2<F>) -> Vec2<F> {
    let tx = F::lit(rng.gen::<f64>());
    let ty = F::lit(rng.gen::<f64>());
    Vec2::new(
        min.x + (max.x - min.x) * tx,
        min.y + (max.y - min.y) * ty,
    )
}

/// Rejection-samples up to `target` seed points inside `shape`.
///
/// The attempted count per round is scaled by the inverse of the shape's
/// area fraction within its bounding box, so shapes that fill little of
/// their box still reach the target. Gives up after `max_tries` rounds and
/// warns when the yield stays below half the request.
pub fn sample_seeds_in_polygon<F: FloeFloat, R: Rng>(
    shape: &Polygon<F>,
    target: usize,
    max_tries: usize,
    rng: &mut R,
) -> Vec<Vec2<F>> {
    let (min, max) = shape.bounding_box();
    let box_area = (max.x - min.x) * (max.y - min.y);
    let area_fraction = if box_area > F::zero() {
        (shape.area() / box_area).max(F::lit(1e-3))
    } else {
        F::one()
    };
    let scale = (F::one() / area_fraction)
        .ceil()
        .to_usize()
        .unwrap_or(1)
        .max(1);

    let mut seeds: Vec<Vec2<F>> = Vec::with_capacity(target);
    let mut tries = 0;
    while seeds.len() < target && tries < max_tries {
        tries += 1;
        for _ in 0..target.saturating_sub(seeds.len()) * scale {
            if seeds.len() >= target {
                break;
            }
            let p = sample_in_box(rng, min, max);
            if shape.contains(p) == Containment::Inside {
                seeds.push(p);
            }
        }
    }
    if (seeds.len() as f64) < WARN_FRACTION * target as f64 {
        warn!(
            "Voronoi seeding produced {} of {} requested points after {} tries",
            seeds.len(),
            target,
            tries
        );
    }
    seeds
}

/// Voronoi cells of `seeds` clipped to the axis-aligned box `(min, max)`.
///
/// Each cell starts from the box rectangle and is cut by the perpendicular
/// bisector half-plane against every other seed; box and half-planes are
/// convex so plain half-plane clipping is exact.
pub fn voronoi_cells<F: FloeFloat>(
    min: Vec2<F>,
    max: Vec2<F>,
    seeds: &[Vec2<F>],
) -> Vec<Polygon<F>> {
    let box_ring = [
        min,
        Vec2::new(max.x, min.y),
        max,
        Vec2::new(min.x, max.y),
    ];
    let mut cells = Vec::with_capacity(seeds.len());
    for (i, seed) in seeds.iter().enumerate() {
        let mut ring: Vec<Vec2<F>> = box_ring.to_vec();
        for (j, other) in seeds.iter().enumerate() {
            if i == j {
                continue;
            }
            // Keep the side of the bisector nearer to `seed`.
            let normal = *other - *seed;
            let mid = (*seed + *other) * F::lit(0.5);
            ring = clip_ring_halfplane(&ring, normal, normal.dot(mid));
            if ring.len() < 3 {
                break;
            }
        }
        if let Ok(cell) = Polygon::from_ring(ring) {
            cells.push(cell);
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn cells_partition_the_box() {
        let seeds = vec![
            Vec2::new(1.0, 1.0),
            Vec2::new(3.0, 1.0),
            Vec2::new(2.0, 3.0),
            Vec2::new(0.7, 3.2),
        ];
        let cells = voronoi_cells(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0), &seeds);
        assert_eq!(cells.len(), seeds.len());
        let total: f64 = cells.iter().map(|c| c.area()).sum();
        assert!((total - 16.0).abs() < 1e-9);
        // Every seed sits inside its own cell.
        for (seed, cell) in seeds.iter().zip(cells.iter()) {
            assert_ne!(cell.contains(*seed), Containment::Outside);
        }
    }

    #[test]
    fn two_seed_cells_split_along_bisector() {
        let seeds = vec![Vec2::new(1.0_f64, 2.0), Vec2::new(3.0, 2.0)];
        let cells = voronoi_cells(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0), &seeds);
        assert_eq!(cells.len(), 2);
        assert!((cells[0].area() - 8.0).abs() < 1e-9);
        assert!((cells[1].area() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn seed_sampling_stays_inside_the_shape() {
        let shape = Polygon::from_ring(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])
        .unwrap();
        let mut rng = Pcg64::seed_from_u64(7);
        let seeds = sample_seeds_in_polygon(&shape, 25, 10, &mut rng);
        assert_eq!(seeds.len(), 25);
        for p in seeds {
            assert_eq!(shape.contains(p), Containment::Inside);
        }
    }

    #[test]
    fn seed_sampling_is_deterministic_for_a_fixed_seed() {
        let shape = Polygon::from_ring(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(0.0, 5.0),
        ])
        .unwrap();
        let mut rng_a = Pcg64::seed_from_u64(42);
        let mut rng_b = Pcg64::seed_from_u64(42);
        let a = sample_seeds_in_polygon(&shape, 8, 10, &mut rng_a);
        let b = sample_seeds_in_polygon(&shape, 8, 10, &mut rng_b);
        assert_eq!(a, b);
    }
}
