//! Stress-driven fracture: yield-curve candidate selection, deformation
//! around the largest contact, and momentum-conserving Voronoi splits.

pub mod yield_curve;

use log::warn;
use rand::Rng;

pub use yield_curve::{HiblerYieldCurve, YieldCriteria};

use crate::config::{Constants, FloeSettings, FractureSettings};
use crate::floe::{factory, Floe, FloeStatus};
use crate::geometry::{sample_seeds_in_polygon, voronoi_cells, Polygon};
use crate::utils::exec;
use crate::utils::math::{FloeFloat, Vec2};

/// Mean height and compactness of the active real fleet; inputs for
/// state-dependent yield curves.
pub fn fleet_statistics<F: FloeFloat>(floes: &[Floe<F>], domain_area: F) -> (F, F) {
    let mut height_sum = F::zero();
    let mut area_sum = F::zero();
    let mut count = 0usize;
    for floe in floes.iter().filter(|f| f.is_real()) {
        if floe.status == FloeStatus::Remove {
            continue;
        }
        height_sum += floe.height;
        area_sum += floe.area;
        count += 1;
    }
    if count == 0 {
        return (F::one(), F::one());
    }
    let mean_height = height_sum / F::from_usize(count).unwrap_or_else(F::one);
    let compactness = if domain_area > F::zero() {
        (area_sum / domain_area).min(F::one())
    } else {
        F::one()
    };
    (mean_height, compactness)
}

/// Runs one fracture pass over the real floes.
///
/// Candidates are selected in parallel against the (freshly updated) yield
/// criteria; deformation and splitting edit the floe list serially. New
/// pieces take ids from `next_id` upward and record the parent id in their
/// lineage. Returns the number of floes fractured.
#[allow(clippy::too_many_arguments)]
pub fn fracture_floes<F: FloeFloat, R: Rng>(
    floes: &mut Vec<Floe<F>>,
    n_real: usize,
    criteria: &mut YieldCriteria<F>,
    settings: &FractureSettings<F>,
    floe_settings: &FloeSettings<F>,
    consts: &Constants<F>,
    domain_area: F,
    next_id: &mut u64,
    rng: &mut R,
) -> usize {
    if !settings.fractures_on {
        return 0;
    }
    let (mean_height, compactness) = fleet_statistics(floes, domain_area);
    if criteria.update(mean_height, compactness).is_err() {
        return 0;
    }

    let candidates: Vec<bool> = {
        let floes = &floes[..n_real];
        exec::map_indices(n_real, |i| {
            let floe = &floes[i];
            floe.status == FloeStatus::Active
                && floe.area > settings.min_floe_area
                && criteria.fails(floe.stress_accum)
        })
    };

    let mut fractured = 0;
    for i in (0..n_real).filter(|&i| candidates[i]) {
        if settings.deform_on {
            deform_floe(floes, i, consts);
        }
        if split_floe(floes, i, settings, floe_settings, consts, next_id, rng) {
            fractured += 1;
        }
    }
    fractured
}

/// Deforms floe `i` around its largest contact: the deforming neighbor's
/// polygon is advanced half the overlap depth along the contact force and
/// subtracted from the floe.
fn deform_floe<F: FloeFloat>(floes: &mut [Floe<F>], i: usize, consts: &Constants<F>) {
    let Some(row) = floes[i]
        .interactions
        .rows()
        .iter()
        .filter(|r| r.other_idx >= 0 && (r.other_idx as usize) < floes.len())
        .max_by(|a, b| {
            a.overlap
                .partial_cmp(&b.overlap)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
    else {
        return;
    };
    let force = Vec2::new(row.fx, row.fy);
    let dir = force.normalize_or_zero();
    if dir == Vec2::zero() {
        return;
    }
    let deformer_idx = row.other_idx as usize;
    let deformer = floes[deformer_idx].polygon.clone();
    let floe = &floes[i];

    let regions = floe.polygon.intersection(&deformer);
    let Some(region) = regions.iter().max_by(|a, b| {
        a.area()
            .partial_cmp(&b.area())
            .unwrap_or(std::cmp::Ordering::Equal)
    }) else {
        return;
    };
    let depth = region.signed_distance(region.centroid()).abs();
    let shifted = deformer.translate(dir * (depth * F::lit(0.5)));

    let pieces = floe.polygon.difference(&shifted);
    let Some(largest) = pieces.into_iter().max_by(|a, b| {
        a.area()
            .partial_cmp(&b.area())
            .unwrap_or(std::cmp::Ordering::Equal)
    }) else {
        return;
    };
    if largest.area() <= floe.area * F::lit(0.9) {
        return;
    }

    let floe = &mut floes[i];
    let (old_mass, old_moment) = (floe.mass, floe.moment);
    floe.set_polygon(largest.remove_holes(), consts.rho_i);
    // Shape change conserves linear and angular momentum.
    if floe.mass > F::zero() {
        let mass_ratio = old_mass / floe.mass;
        floe.u *= mass_ratio;
        floe.v *= mass_ratio;
    }
    if floe.moment > F::zero() {
        floe.xi *= old_moment / floe.moment;
    }
}

/// Splits floe `i` into Voronoi pieces, conserving mass and momentum.
/// Returns false when the tessellation cannot produce at least two pieces.
fn split_floe<F: FloeFloat, R: Rng>(
    floes: &mut Vec<Floe<F>>,
    i: usize,
    settings: &FractureSettings<F>,
    floe_settings: &FloeSettings<F>,
    consts: &Constants<F>,
    next_id: &mut u64,
    rng: &mut R,
) -> bool {
    let parent = floes[i].clone();
    let min = parent.centroid - Vec2::splat(parent.rmax);
    let max = parent.centroid + Vec2::splat(parent.rmax);

    let seeds =
        sample_seeds_in_polygon(&parent.polygon, settings.npieces, settings.max_tries, rng);
    if seeds.len() < 2 {
        warn!(
            "fracture of floe {} skipped: only {} Voronoi seeds",
            parent.id,
            seeds.len()
        );
        return false;
    }
    let cells = voronoi_cells(min, max, &seeds);

    let mut pieces: Vec<Polygon<F>> = Vec::new();
    for cell in &cells {
        for piece in parent.polygon.intersection(cell) {
            let piece = piece.remove_holes();
            if piece.area() > F::zero() {
                pieces.push(piece);
            }
        }
    }
    if pieces.len() < 2 {
        return false;
    }

    for piece in pieces {
        let Ok(mut child) = factory::build_floe(
            piece,
            parent.height,
            consts,
            floe_settings,
            rng,
        ) else {
            continue;
        };
        // Pieces keep the parent's rigid-body motion: equal velocities
        // partition momentum in proportion to mass.
        child.u = parent.u;
        child.v = parent.v;
        child.xi = parent.xi;
        child.alpha = parent.alpha;
        child.p_dxdt = parent.p_dxdt;
        child.p_dydt = parent.p_dydt;
        child.p_dudt = parent.p_dudt;
        child.p_dvdt = parent.p_dvdt;
        child.p_dxidt = parent.p_dxidt;
        child.p_dalphadt = parent.p_dalphadt;
        child.strain = parent.strain;
        child.id = *next_id;
        *next_id += 1;
        child.parent_ids = vec![parent.id];
        floes.push(child);
    }
    floes[i].status = FloeStatus::Remove;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FractureCriteria;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn floe_rect(id: u64, min: (f64, f64), max: (f64, f64), height: f64) -> Floe<f64> {
        let poly = Polygon::rectangle(
            Vec2::new(min.0, min.1),
            Vec2::new(max.0, max.1),
        )
        .unwrap();
        let mut rng = Pcg64::seed_from_u64(id);
        let mut floe = factory::build_floe(
            poly,
            height,
            &Constants::default(),
            &FloeSettings::default(),
            &mut rng,
        )
        .unwrap();
        floe.id = id;
        floe
    }

    fn hibler_criteria() -> YieldCriteria<f64> {
        YieldCriteria::from_settings(
            &FractureCriteria::Hibler { pstar: 5e5, c: -1.0 },
            0.5,
            1.0,
        )
        .unwrap()
    }

    fn fracture_settings() -> FractureSettings<f64> {
        FractureSettings {
            fractures_on: true,
            criteria: FractureCriteria::Hibler { pstar: 5e5, c: -1.0 },
            dt_fracture: 1,
            npieces: 3,
            deform_on: false,
            min_floe_area: 1e6,
            max_tries: 10,
        }
    }

    #[test]
    fn yield_test_selects_the_failing_floes() {
        use crate::utils::math::Mat2;
        // Four floes: 0 and 1 under failing compressive stress, 2 under
        // mild stress inside the curve, 3 failing but below the area gate.
        let failing = Mat2::new(-149777.0, -17140.0, -17140.0, -9710.0);
        let mild = Mat2::new(-1e4, 0.0, 0.0, -1e4);
        let mut floes = vec![
            floe_rect(1, (0.0, 0.0), (2e4, 2e4), 0.25),
            floe_rect(2, (3e4, 0.0), (5e4, 2e4), 0.25),
            floe_rect(3, (0.0, 3e4), (2e4, 5e4), 0.25),
            floe_rect(4, (3e4, 3e4), (3.09e4, 3.09e4), 0.25),
        ];
        floes[0].stress_accum = failing;
        floes[1].stress_accum = failing;
        floes[2].stress_accum = mild;
        floes[3].stress_accum = failing;

        let criteria = hibler_criteria();
        let settings = fracture_settings();
        let frac_idx: Vec<usize> = (0..floes.len())
            .filter(|&i| {
                floes[i].status == FloeStatus::Active
                    && floes[i].area > settings.min_floe_area
                    && criteria.fails(floes[i].stress_accum)
            })
            .collect();
        assert_eq!(frac_idx, vec![0, 1]);
    }

    #[test]
    fn split_conserves_area_mass_and_motion() {
        let mut floes = vec![floe_rect(5, (0.0, 0.0), (3e4, 3e4), 0.5)];
        floes[0].u = 0.4;
        floes[0].v = -0.1;
        floes[0].xi = 1e-6;
        floes[0].p_dudt = 2e-5;
        let parent = floes[0].clone();

        let mut next_id = 6;
        let mut rng = Pcg64::seed_from_u64(17);
        let ok = split_floe(
            &mut floes,
            0,
            &fracture_settings(),
            &FloeSettings::default(),
            &Constants::default(),
            &mut next_id,
            &mut rng,
        );
        assert!(ok);
        assert_eq!(floes[0].status, FloeStatus::Remove);

        let children: Vec<&Floe<f64>> = floes.iter().skip(1).collect();
        assert!(children.len() >= 2);
        let total_area: f64 = children.iter().map(|c| c.area).sum();
        assert!((total_area - parent.area).abs() < 1e-4 * parent.area);
        let total_mass: f64 = children.iter().map(|c| c.mass).sum();
        assert!((total_mass - parent.mass).abs() < 1e-4 * parent.mass);
        let px: f64 = children.iter().map(|c| c.mass * c.u).sum();
        assert!((px - parent.mass * parent.u).abs() < 1e-4 * (parent.mass * parent.u).abs());
        for child in &children {
            assert_eq!(child.u, parent.u);
            assert_eq!(child.v, parent.v);
            assert_eq!(child.xi, parent.xi);
            assert_eq!(child.p_dudt, parent.p_dudt);
            assert_eq!(child.strain, parent.strain);
            assert_eq!(child.parent_ids, vec![parent.id]);
            assert!(child.id >= 6);
        }
        // Ids are fresh and unique.
        let mut ids: Vec<u64> = children.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), children.len());
    }

    #[test]
    fn split_pieces_tile_the_parent() {
        let mut floes = vec![floe_rect(9, (0.0, 0.0), (2e4, 2e4), 0.5)];
        let parent_poly = floes[0].polygon.clone();
        let parent_area = floes[0].area;
        let mut next_id = 10;
        let mut rng = Pcg64::seed_from_u64(23);
        assert!(split_floe(
            &mut floes,
            0,
            &fracture_settings(),
            &FloeSettings::default(),
            &Constants::default(),
            &mut next_id,
            &mut rng,
        ));
        let mut covered = 0.0;
        for child in floes.iter().skip(1) {
            for piece in child.polygon.intersection(&parent_poly) {
                covered += piece.area();
            }
        }
        assert!((covered - parent_area).abs() < 1e-4 * parent_area);
    }

    #[test]
    fn deformation_bites_into_the_floe() {
        let mut floes = vec![
            floe_rect(1, (0.0, 0.0), (2e4, 2e4), 0.5),
            floe_rect(2, (1.95e4, 0.1e4), (3.95e4, 1.9e4), 0.5),
        ];
        // Largest-overlap interaction pushing floe 0 west.
        floes[0].interactions.push(crate::floe::Interaction {
            other_idx: 1,
            fx: -1e7,
            fy: 0.0,
            px: 1.97e4,
            py: 1e4,
            torque: 0.0,
            overlap: 9e5,
        });
        let before_area = floes[0].area;
        let before_centroid = floes[0].centroid;
        deform_floe(&mut floes, 0, &Constants::default());
        assert!(floes[0].area < before_area);
        assert!(floes[0].area > 0.9 * before_area);
        // Losing area on the east side moves the centroid west.
        assert!(floes[0].centroid.x < before_centroid.x);
    }

    #[test]
    fn fracture_pass_respects_cadence_gate() {
        let mut floes = vec![floe_rect(1, (0.0, 0.0), (2e4, 2e4), 0.5)];
        let mut criteria = hibler_criteria();
        let mut settings = fracture_settings();
        settings.fractures_on = false;
        let mut next_id = 2;
        let mut rng = Pcg64::seed_from_u64(3);
        let n = fracture_floes(
            &mut floes,
            1,
            &mut criteria,
            &settings,
            &FloeSettings::default(),
            &Constants::default(),
            1e10,
            &mut next_id,
            &mut rng,
        );
        assert_eq!(n, 0);
        assert_eq!(floes.len(), 1);
    }
}
