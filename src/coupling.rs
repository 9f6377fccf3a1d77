//! Ocean/atmosphere coupling: per-floe forcing from the grid fields and
//! reverse stress from the ice onto the ocean.

use crate::config::Constants;
use crate::floe::Floe;
use crate::grid::{Grid, Ocean, Atmos};
use crate::utils::exec;
use crate::utils::math::{FloeFloat, Vec2};

/// Computes ocean/atmosphere force and torque for every real floe and
/// accumulates reverse stress into the grid cells.
///
/// `ghost_translations[i]` holds the periodic translations of floe `i`'s
/// ghosts so a floe straddling a periodic wall is coupled to the cells its
/// wrapped image covers. Writes to floe `i` are exclusive to its worker;
/// grid-cell accumulators are guarded by their per-node locks.
pub fn couple_floes<F: FloeFloat>(
    floes: &mut [Floe<F>],
    ghost_translations: &[Vec<Vec2<F>>],
    grid: &Grid<F>,
    ocean: &Ocean<F>,
    atmos: &Atmos<F>,
    consts: &Constants<F>,
) {
    exec::for_each_mut_indexed(floes, |i, floe| {
        let empty = Vec::new();
        let translations = ghost_translations.get(i).unwrap_or(&empty);
        couple_one(i, floe, translations, grid, ocean, atmos, consts);
    });
}

fn couple_one<F: FloeFloat>(
    floe_idx: usize,
    floe: &mut Floe<F>,
    ghost_translations: &[Vec2<F>],
    grid: &Grid<F>,
    ocean: &Ocean<F>,
    atmos: &Atmos<F>,
    consts: &Constants<F>,
) {
    floe.fx_oa = F::zero();
    floe.fy_oa = F::zero();
    floe.trq_oa = F::zero();

    let ma_ratio = floe.mass / floe.area;
    let mut hflx_weighted = F::zero();
    let mut hflx_area = F::zero();

    let mut translations = Vec::with_capacity(1 + ghost_translations.len());
    translations.push(Vec2::zero());
    translations.extend_from_slice(ghost_translations);

    for &shift in &translations {
        let poly = if shift == Vec2::zero() {
            floe.polygon.clone()
        } else {
            floe.polygon.translate(shift)
        };
        let center = floe.centroid + shift;

        for (gi, gj) in grid.nodes_within(center, floe.rmax) {
            let Some(cell_poly) = grid.node_cell_polygon(gi, gj) else {
                continue;
            };
            let cell_area = cell_poly.area();
            if cell_area <= F::zero() {
                continue;
            }
            let overlap: F = poly
                .intersection(&cell_poly)
                .iter()
                .map(|p| p.area())
                .sum();
            if overlap <= F::zero() {
                continue;
            }
            let ratio = (overlap / cell_area).min(F::one());
            let idx = grid.node_index(gi, gj);
            let node = grid.node_point(gi, gj);

            // Local ice velocity at the cell center.
            let ice_vel = Vec2::new(
                floe.u - floe.xi * (node.y - center.y),
                floe.v + floe.xi * (node.x - center.x),
            );
            let ocn_vel = Vec2::new(ocean.u[idx], ocean.v[idx]);
            let atm_vel = Vec2::new(atmos.u[idx], atmos.v[idx]);

            // Atmospheric drag over the overlap.
            let f_atm = atm_vel * (consts.rho_a * consts.c_ia * atm_vel.length() * overlap);

            // Ocean pressure gradient balancing the geostrophic current.
            let f_pg = Vec2::new(-ocn_vel.y, ocn_vel.x) * (ma_ratio * consts.coriolis * overlap);

            // Ocean drag rotated by the turning angle.
            let rel = ocn_vel - ice_vel;
            let tau_ocn = rel.rotate(consts.turn_angle) * (consts.rho_o * consts.c_io * rel.length());
            let f_ocn = tau_ocn * overlap;

            // Coriolis force on the floe itself.
            let f_cor = Vec2::new(floe.v, -floe.u) * (ma_ratio * consts.coriolis * overlap);

            let force = f_atm + f_pg + f_ocn + f_cor;
            floe.fx_oa += force.x;
            floe.fy_oa += force.y;
            floe.trq_oa += (node - center).cross(force);

            hflx_weighted += ocean.hflx_factor[idx] * overlap;
            hflx_area += overlap;

            // Sub-floe quadrature points inside this cell.
            let (cell_min, cell_max) = cell_poly.bounding_box();
            let npoints = floe
                .x_subfloe_points
                .iter()
                .zip(floe.y_subfloe_points.iter())
                .filter(|(dx, dy)| {
                    let p = center + Vec2::new(**dx, **dy);
                    p.x >= cell_min.x && p.x <= cell_max.x && p.y >= cell_min.y && p.y <= cell_max.y
                })
                .count();

            let mut cell = grid.cell(idx);
            cell.stress
                .add(floe_idx, -tau_ocn.x * ratio, -tau_ocn.y * ratio, npoints);
            cell.si_frac += ratio;
            cell.floes.push(floe_idx, shift);
        }
    }

    floe.hflx_factor = if hflx_area > F::zero() {
        hflx_weighted / hflx_area
    } else {
        F::zero()
    };
}

/// Folds the per-cell accumulators into the ocean fields: the ice fraction
/// (clamped to full cover) and the mean reverse stress over the cell's
/// quadrature points.
pub fn fold_ocean_coupling<F: FloeFloat>(grid: &Grid<F>, ocean: &mut Ocean<F>) {
    for idx in 0..grid.num_nodes() {
        let cell = grid.cell(idx);
        ocean.si_frac[idx] = cell.si_frac.min(F::one());
        let (tx, ty, npoints) = cell.stress.totals();
        let denom = F::from_usize(npoints.max(1)).unwrap_or_else(F::one);
        ocean.tau_x[idx] = tx / denom;
        ocean.tau_y[idx] = ty / denom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FloeSettings, GridSpacing, GridSpec};
    use crate::floe::factory;
    use crate::geometry::Polygon;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn grid() -> Grid<f64> {
        Grid::from_spec(&GridSpec {
            x0: 0.0,
            xf: 1e5,
            y0: 0.0,
            yf: 1e5,
            spacing: GridSpacing::CellCount { nx: 10, ny: 10 },
        })
        .unwrap()
    }

    fn floe_at(x: f64, y: f64, half: f64) -> Floe<f64> {
        let poly =
            Polygon::rectangle(Vec2::new(x - half, y - half), Vec2::new(x + half, y + half))
                .unwrap();
        let mut rng = Pcg64::seed_from_u64(2);
        factory::build_floe(
            poly,
            0.5,
            &Constants::default(),
            &FloeSettings::default(),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn ocean_current_drags_a_stationary_floe() {
        let grid = grid();
        let ocean = Ocean::uniform(&grid, 0.5, 0.0, -1.0);
        let atmos = Atmos::uniform(&grid, 0.0, 0.0, -5.0);
        let mut floes = vec![floe_at(5.05e4, 5.05e4, 1.1e4)];
        let ghosts = vec![Vec::new()];
        couple_floes(
            &mut floes,
            &ghosts,
            &grid,
            &ocean,
            &atmos,
            &Constants::default(),
        );
        // Eastward current pushes the floe east.
        assert!(floes[0].fx_oa > 0.0);
    }

    #[test]
    fn wind_drags_the_floe_downwind() {
        let grid = grid();
        let ocean = Ocean::uniform(&grid, 0.0, 0.0, -1.0);
        let atmos = Atmos::uniform(&grid, 0.0, 10.0, -5.0);
        let mut floes = vec![floe_at(5.05e4, 5.05e4, 1.1e4)];
        let ghosts = vec![Vec::new()];
        couple_floes(
            &mut floes,
            &ghosts,
            &grid,
            &ocean,
            &atmos,
            &Constants::default(),
        );
        assert!(floes[0].fy_oa > 0.0);
    }

    #[test]
    fn reverse_stress_and_ice_fraction_are_recorded() {
        let grid = grid();
        let mut ocean = Ocean::uniform(&grid, 0.5, 0.0, -1.0);
        let atmos = Atmos::uniform(&grid, 0.0, 0.0, -5.0);
        let mut floes = vec![floe_at(5.05e4, 5.05e4, 1.1e4)];
        let ghosts = vec![Vec::new()];
        couple_floes(
            &mut floes,
            &ghosts,
            &grid,
            &ocean,
            &atmos,
            &Constants::default(),
        );
        fold_ocean_coupling(&grid, &mut ocean);
        // The node under the floe centroid is fully covered.
        let idx = grid.node_index(5, 5);
        assert!((ocean.si_frac[idx] - 1.0).abs() < 1e-9);
        let cell = grid.cell(idx);
        let (tx, _, np) = cell.stress.totals();
        // Ice slower than the eastward current: drag on ice is eastward, so
        // the reverse stress on the ocean points west.
        assert!(tx < 0.0);
        assert!(np > 0);
        assert_eq!(cell.floes.entries.len(), 1);
    }

    #[test]
    fn ghost_translation_couples_across_the_wrap() {
        let grid = grid();
        let ocean = Ocean::uniform(&grid, 0.5, 0.0, -1.0);
        let atmos = Atmos::uniform(&grid, 0.0, 0.0, -5.0);
        // Floe near the east edge; its ghost sits one domain width west.
        let mut floes = vec![floe_at(9.55e4, 5.05e4, 0.7e4)];
        let ghosts = vec![vec![Vec2::new(-1e5, 0.0)]];
        couple_floes(
            &mut floes,
            &ghosts,
            &grid,
            &ocean,
            &atmos,
            &Constants::default(),
        );
        // The wrapped image covers cells near the west edge.
        let idx = grid.node_index(0, 5);
        let cell = grid.cell(idx);
        assert!(!cell.floes.entries.is_empty());
        assert!((cell.floes.entries[0].translation.x + 1e5).abs() < 1e-9);
    }
}
