//! Periodic ghost floes.
//!
//! Before the collision passes, every real floe whose bounding disc crosses
//! a periodic wall pair is replicated one domain length across that axis so
//! collision detection spans the wrap-around. Ghosts share their parent's
//! `id`, live in the same floe list, and are discarded at the start of the
//! next timestep after their interactions have been folded into the parent.

use crate::domain::Domain;
use crate::floe::Floe;
use crate::utils::math::{FloeFloat, Vec2};

/// Removes every ghost left from the previous step and clears the ghost
/// registries of the surviving real floes.
pub fn clear_ghosts<F: FloeFloat>(floes: &mut Vec<Floe<F>>) {
    floes.retain(|f| f.is_real());
    for floe in floes.iter_mut() {
        floe.ghosts.clear();
    }
}

/// Periodic translations a real floe needs given the domain, one per
/// crossed axis.
fn crossed_axis_translations<F: FloeFloat>(floe: &Floe<F>, domain: &Domain<F>) -> Vec<Vec2<F>> {
    let mut out = Vec::new();
    if domain.east_west_periodic() {
        let width = domain.width();
        if floe.centroid.x + floe.rmax > domain.east.val {
            out.push(Vec2::new(-width, F::zero()));
        } else if floe.centroid.x - floe.rmax < domain.west.val {
            out.push(Vec2::new(width, F::zero()));
        }
    }
    if domain.north_south_periodic() {
        let height = domain.height();
        if floe.centroid.y + floe.rmax > domain.north.val {
            out.push(Vec2::new(F::zero(), -height));
        } else if floe.centroid.y - floe.rmax < domain.south.val {
            out.push(Vec2::new(F::zero(), height));
        }
    }
    out
}

/// Appends ghost replicas for every real floe crossing a periodic wall.
///
/// When a parent's centroid has drifted outside the domain along the
/// crossed axis, the parent and its ghost swap geometry so the real floe
/// always keeps an in-domain centroid.
pub fn add_ghosts<F: FloeFloat>(floes: &mut Vec<Floe<F>>, domain: &Domain<F>) {
    let n_real = floes.len();
    for i in 0..n_real {
        let translations = crossed_axis_translations(&floes[i], domain);
        for shift in translations {
            let ghost_id = floes[i].ghosts.len() as u32 + 1;
            let mut ghost = floes[i].make_ghost(shift, ghost_id);
            let parent_out = {
                let c = floes[i].centroid;
                (shift.x != F::zero() && (c.x < domain.west.val || c.x > domain.east.val))
                    || (shift.y != F::zero()
                        && (c.y < domain.south.val || c.y > domain.north.val))
            };
            if parent_out {
                // The ghost is the in-domain copy; keep it in the real slot.
                std::mem::swap(&mut floes[i].polygon, &mut ghost.polygon);
                std::mem::swap(&mut floes[i].centroid, &mut ghost.centroid);
            }
            let ghost_idx = floes.len();
            floes[i].ghosts.push(ghost_idx);
            floes.push(ghost);
        }
    }
}

/// Ghost translations per real floe, read from the current ghost registry.
pub fn ghost_translations<F: FloeFloat>(floes: &[Floe<F>], n_real: usize) -> Vec<Vec<Vec2<F>>> {
    (0..n_real)
        .map(|i| {
            floes[i]
                .ghosts
                .iter()
                .map(|&g| floes[g].centroid - floes[i].centroid)
                .collect()
        })
        .collect()
}
