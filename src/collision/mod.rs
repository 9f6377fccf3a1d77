//! Collision engine: three fork-joined passes over the floe list.
//!
//! Pass 1 computes contact forces per floe against later-indexed floes,
//! walls, and topography, writing only to that floe's interaction table.
//! Pass 2 (serial) mirrors forces onto partners and folds ghost
//! interactions into parents. Pass 3 totals forces and torques.

pub mod contact;
pub mod ghost;

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::config::{CollisionSettings, Constants};
use crate::domain::{Boundary, BoundaryKind, Direction, Domain};
use crate::floe::{
    Floe, FloeStatus, Interaction, InteractionTable, DOMAIN_PARTNER, TOPOGRAPHY_PARTNER,
};
use crate::geometry::Polygon;
use crate::utils::exec;
use crate::utils::math::{FloeFloat, Vec2};

use contact::{
    boundary_force_factor, floe_pair_force_factor, friction_force, normal_force_direction,
};

/// First-seen ghost pair per logical floe pair, keyed by `(id_hi, id_lo)`.
type DedupMap = Mutex<HashMap<(u64, u64), (u32, u32)>>;

struct PassOne<F> {
    rows: Vec<Interaction<F>>,
    overarea: F,
    remove: bool,
    fuse_with: Vec<usize>,
}

impl<F: FloeFloat> Default for PassOne<F> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            overarea: F::zero(),
            remove: false,
            fuse_with: Vec::new(),
        }
    }
}

/// Minimum meaningful overlap-region area for a pair of vertex counts.
fn region_area_threshold<F: FloeFloat>(n1: usize, n2: usize) -> F {
    F::from_usize(n1.min(n2)).unwrap_or_else(F::one) * F::lit(100.0 / 1.75)
}

/// Admission rule for a candidate pair against the first-seen ghost pair:
/// admit an exact repeat or a single-sided ghost crossing, reject pairs
/// that differ on both sides (the repeat through the second periodic axis).
fn admit_pair(first: (u32, u32), current: (u32, u32)) -> bool {
    let hi_match = current.0 == first.0;
    let lo_match = current.1 == first.1;
    (hi_match && lo_match) || (hi_match != lo_match)
}

fn dedup_admits<F: FloeFloat>(dedup: &DedupMap, a: &Floe<F>, b: &Floe<F>) -> bool {
    let (key, val) = if a.id >= b.id {
        ((a.id, b.id), (a.ghost_id, b.ghost_id))
    } else {
        ((b.id, a.id), (b.ghost_id, a.ghost_id))
    };
    let mut map = dedup.lock();
    match map.get(&key) {
        None => {
            map.insert(key, val);
            true
        }
        Some(first) => admit_pair(*first, val),
    }
}

fn floe_pair_forces<F: FloeFloat>(
    out: &mut PassOne<F>,
    i: usize,
    j: usize,
    floes: &[Floe<F>],
    n_real: usize,
    consts: &Constants<F>,
    settings: &CollisionSettings<F>,
    dt: F,
) {
    let (a, b) = (&floes[i], &floes[j]);
    let regions = a.polygon.intersection(&b.polygon);
    if regions.is_empty() {
        return;
    }
    let total: F = regions.iter().map(|r| r.area()).sum();
    if total <= F::zero() {
        return;
    }
    out.overarea += total;

    if total / a.area > settings.floe_floe_max_overlap
        || total / b.area > settings.floe_floe_max_overlap
    {
        if i < n_real && j < n_real {
            out.fuse_with.push(j);
        }
        return;
    }

    let threshold = region_area_threshold(a.polygon.num_vertices(), b.polygon.num_vertices());
    let k = floe_pair_force_factor(consts.e, a.height, a.area, b.height, b.area);
    let shear = consts.shear_modulus();
    for region in &regions {
        let area = region.area();
        if area < threshold {
            continue;
        }
        let Some(dir) = normal_force_direction(&a.polygon, &b.polygon, region) else {
            continue;
        };
        let point = region.centroid();
        let normal = dir * (area * k);
        let rel_vel = a.velocity_at(point) - b.velocity_at(point);
        let friction = friction_force(rel_vel, normal, area.sqrt(), dt, shear, consts.mu);
        let force = normal + friction;
        out.rows.push(Interaction {
            other_idx: j as i64,
            fx: force.x,
            fy: force.y,
            px: point.x,
            py: point.y,
            torque: F::zero(),
            overlap: area,
        });
    }
}

fn wall_near_floe<F: FloeFloat>(floe: &Floe<F>, wall: &Boundary<F>) -> bool {
    match wall.direction {
        Direction::North => floe.centroid.y + floe.rmax > wall.val,
        Direction::South => floe.centroid.y - floe.rmax < wall.val,
        Direction::East => floe.centroid.x + floe.rmax > wall.val,
        Direction::West => floe.centroid.x - floe.rmax < wall.val,
    }
}

fn crosses_open_wall<F: FloeFloat>(floe: &Floe<F>, wall: &Boundary<F>) -> bool {
    let (min, max) = floe.polygon.bounding_box();
    match wall.direction {
        Direction::North => max.y > wall.val,
        Direction::South => min.y < wall.val,
        Direction::East => max.x > wall.val,
        Direction::West => min.x < wall.val,
    }
}

fn rigid_boundary_forces<F: FloeFloat>(
    out: &mut PassOne<F>,
    floe: &Floe<F>,
    obstacle: &Polygon<F>,
    wall_tangent: Option<Vec2<F>>,
    obstacle_vel: Vec2<F>,
    partner: i64,
    consts: &Constants<F>,
    settings: &CollisionSettings<F>,
    dt: F,
) {
    let regions = floe.polygon.intersection(obstacle);
    if regions.is_empty() {
        return;
    }
    let total: F = regions.iter().map(|r| r.area()).sum();
    if total <= F::zero() {
        return;
    }
    out.overarea += total;
    if total / floe.area > settings.floe_domain_max_overlap {
        out.remove = true;
        return;
    }
    let threshold = region_area_threshold(floe.polygon.num_vertices(), 4);
    let k = boundary_force_factor(consts.e, floe.height, floe.area);
    let shear = consts.shear_modulus();
    for region in &regions {
        let area = region.area();
        if area < threshold {
            continue;
        }
        let Some(dir) = normal_force_direction(&floe.polygon, obstacle, region) else {
            continue;
        };
        let point = region.centroid();
        let mut normal = dir * (area * k);
        if let Some(tangent) = wall_tangent {
            // Rigid walls only push along their own normal.
            normal -= tangent * normal.dot(tangent);
        }
        let rel_vel = floe.velocity_at(point) - obstacle_vel;
        let friction = friction_force(rel_vel, normal, area.sqrt(), dt, shear, consts.mu);
        let force = normal + friction;
        out.rows.push(Interaction {
            other_idx: partner,
            fx: force.x,
            fy: force.y,
            px: point.x,
            py: point.y,
            torque: F::zero(),
            overlap: area,
        });
    }
}

fn domain_forces<F: FloeFloat>(
    out: &mut PassOne<F>,
    floe: &Floe<F>,
    domain: &Domain<F>,
    consts: &Constants<F>,
    settings: &CollisionSettings<F>,
    dt: F,
) {
    for wall in domain.walls() {
        if !wall_near_floe(floe, wall) {
            continue;
        }
        match wall.kind {
            BoundaryKind::Open => {
                if crosses_open_wall(floe, wall) {
                    out.remove = true;
                }
            }
            BoundaryKind::Periodic => {}
            BoundaryKind::Collision | BoundaryKind::Moving { .. } => {
                rigid_boundary_forces(
                    out,
                    floe,
                    &wall.poly,
                    Some(wall.tangent()),
                    wall.kind.velocity(),
                    DOMAIN_PARTNER,
                    consts,
                    settings,
                    dt,
                );
            }
        }
    }
    for topo in &domain.topography {
        if floe.centroid.distance(topo.centroid) > floe.rmax + topo.rmax {
            continue;
        }
        rigid_boundary_forces(
            out,
            floe,
            &topo.polygon,
            None,
            Vec2::zero(),
            TOPOGRAPHY_PARTNER,
            consts,
            settings,
            dt,
        );
    }
}

fn pass_one<F: FloeFloat>(
    i: usize,
    floes: &[Floe<F>],
    n_real: usize,
    domain: &Domain<F>,
    consts: &Constants<F>,
    settings: &CollisionSettings<F>,
    dt: F,
    dedup: &DedupMap,
) -> PassOne<F> {
    let mut out = PassOne::default();
    let floe = &floes[i];
    if floe.status == FloeStatus::Remove {
        return out;
    }
    for j in (i + 1)..floes.len() {
        let other = &floes[j];
        if other.status == FloeStatus::Remove || floe.id == other.id {
            continue;
        }
        if floe.centroid.distance(other.centroid) > floe.rmax + other.rmax {
            continue;
        }
        if !dedup_admits(dedup, floe, other) {
            continue;
        }
        floe_pair_forces(&mut out, i, j, floes, n_real, consts, settings, dt);
    }
    if i < n_real {
        domain_forces(&mut out, floe, domain, consts, settings, dt);
    }
    out
}

fn apply_pass_one<F: FloeFloat>(floes: &mut [Floe<F>], results: Vec<PassOne<F>>) {
    // Statuses first, then tables, so fuse marks land on both partners.
    let mut fuse_pairs: Vec<(usize, usize)> = Vec::new();
    for (i, out) in results.into_iter().enumerate() {
        let mut table = InteractionTable::new();
        table.extend_from(out.rows);
        floes[i].interactions = table;
        floes[i].overarea = out.overarea;
        if out.remove {
            floes[i].status = FloeStatus::Remove;
        }
        for j in out.fuse_with {
            fuse_pairs.push((i, j));
        }
    }
    for (i, j) in fuse_pairs {
        if floes[i].status == FloeStatus::Active {
            floes[i].status = FloeStatus::Fuse;
        }
        if floes[j].status == FloeStatus::Active {
            floes[j].status = FloeStatus::Fuse;
        }
        if floes[i].status == FloeStatus::Fuse && floes[j].status == FloeStatus::Fuse {
            floes[i].fuse_partners.push(j);
            floes[j].fuse_partners.push(i);
        }
    }
}

/// Serial pass: force mirroring and ghost folding.
fn pass_two<F: FloeFloat>(floes: &mut [Floe<F>], n_real: usize) {
    // Mirror every pass-one row onto its partner with the opposite sign.
    let mut mirrored: Vec<(usize, Interaction<F>)> = Vec::new();
    for (i, floe) in floes.iter().enumerate() {
        for row in floe.interactions.rows() {
            if row.other_idx >= 0 {
                let j = row.other_idx as usize;
                mirrored.push((
                    j,
                    Interaction {
                        other_idx: i as i64,
                        fx: -row.fx,
                        fy: -row.fy,
                        px: row.px,
                        py: row.py,
                        torque: F::zero(),
                        overlap: row.overlap,
                    },
                ));
            }
        }
    }
    for (j, row) in mirrored {
        floes[j].interactions.push(row);
    }

    // Fold ghost interactions into parents, translating application points
    // back into the parent frame.
    for p in 0..n_real {
        let ghost_indices = floes[p].ghosts.clone();
        for g in ghost_indices {
            let shift = floes[p].centroid - floes[g].centroid;
            let rows: Vec<Interaction<F>> = floes[g].interactions.rows().to_vec();
            floes[g].interactions.clear();
            for mut row in rows {
                row.px += shift.x;
                row.py += shift.y;
                floes[p].interactions.push(row);
            }
        }
    }

    // Re-number ghost partners to their real floes.
    let mut ghost_parent: HashMap<usize, usize> = HashMap::new();
    for p in 0..n_real {
        for &g in &floes[p].ghosts {
            ghost_parent.insert(g, p);
        }
    }
    for floe in floes.iter_mut().take(n_real) {
        for row in floe.interactions.rows_mut() {
            if row.other_idx >= n_real as i64 {
                let ghost_idx = row.other_idx as usize;
                if let Some(&parent) = ghost_parent.get(&ghost_idx) {
                    row.other_idx = parent as i64;
                }
            }
        }
    }
}

/// Parallel pass: torque per interaction and per-floe totals.
fn pass_three<F: FloeFloat>(floes: &mut [Floe<F>], n_real: usize) {
    exec::for_each_mut(&mut floes[..n_real], |floe| {
        let c = floe.centroid;
        let mut force = Vec2::zero();
        let mut torque = F::zero();
        for row in floe.interactions.rows_mut() {
            row.torque = (row.px - c.x) * row.fy - (row.py - c.y) * row.fx;
            force += Vec2::new(row.fx, row.fy);
            torque += row.torque;
        }
        floe.collision_force = force;
        floe.collision_trq = torque;
    });
}

/// Runs the three collision passes over the floe list (ghosts included).
pub fn collide<F: FloeFloat>(
    floes: &mut Vec<Floe<F>>,
    n_real: usize,
    domain: &Domain<F>,
    consts: &Constants<F>,
    settings: &CollisionSettings<F>,
    dt: F,
) {
    let dedup: DedupMap = Mutex::new(HashMap::new());
    let results = exec::map_indices(floes.len(), |i| {
        pass_one(i, floes, n_real, domain, consts, settings, dt, &dedup)
    });
    apply_pass_one(floes, results);
    pass_two(floes, n_real);
    pass_three(floes, n_real);
}
