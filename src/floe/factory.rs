//! Floe construction: from coordinates, from polygons (splitting around
//! holes), and whole fields from Voronoi tessellation.

use log::warn;
use rand::Rng;

use crate::config::{
    Constants, FloeSettings, SubfloePointsGenerator, MAX_FLOE_HEIGHT,
};
use crate::domain::Domain;
use crate::error::{Result, SubzeroError};
use crate::geometry::{sample_seeds_in_polygon, voronoi_cells, Containment, Polygon};
use crate::utils::math::{FloeFloat, Mat2, Vec2};

use super::stress::StressHistory;
use super::{Floe, FloeStatus, InteractionTable};

/// Builds a floe from a hole-free polygon. The polygon's holes, if any,
/// are dropped; use [`floes_from_polygon`] to split around them instead.
pub fn build_floe<F: FloeFloat, R: Rng>(
    polygon: Polygon<F>,
    height: F,
    consts: &Constants<F>,
    settings: &FloeSettings<F>,
    rng: &mut R,
) -> Result<Floe<F>> {
    if height <= F::zero() {
        return Err(SubzeroError::ArgumentOutOfRange(
            "floe height must be positive".into(),
        ));
    }
    let height = height.min(F::lit(MAX_FLOE_HEIGHT));
    let polygon = polygon.remove_holes();
    let area = polygon.area();
    if area <= F::zero() {
        return Err(SubzeroError::InvalidGeometry(
            "floe polygon encloses no area".into(),
        ));
    }
    let centroid = polygon.centroid();
    let rmax = polygon.max_radius(centroid);
    let mass = area * height * consts.rho_i;
    let moment = polygon.moment_of_inertia(consts.rho_i * height);
    let (x_subfloe_points, y_subfloe_points) =
        generate_subfloe_points(&polygon, centroid, rmax, settings.subfloe_points, rng);

    Ok(Floe {
        polygon,
        centroid,
        area,
        rmax,
        height,
        mass,
        moment,
        u: F::zero(),
        v: F::zero(),
        xi: F::zero(),
        alpha: F::zero(),
        p_dxdt: F::zero(),
        p_dydt: F::zero(),
        p_dudt: F::zero(),
        p_dvdt: F::zero(),
        p_dxidt: F::zero(),
        p_dalphadt: F::zero(),
        x_subfloe_points,
        y_subfloe_points,
        fx_oa: F::zero(),
        fy_oa: F::zero(),
        trq_oa: F::zero(),
        hflx_factor: F::zero(),
        collision_force: Vec2::zero(),
        collision_trq: F::zero(),
        interactions: InteractionTable::new(),
        overarea: F::zero(),
        status: FloeStatus::Active,
        fuse_partners: Vec::new(),
        id: 0,
        ghost_id: 0,
        parent_ids: Vec::new(),
        ghosts: Vec::new(),
        stress_accum: Mat2::zero(),
        stress_history: StressHistory::new(settings.stress_history_len),
        strain: Mat2::zero(),
    })
}

/// Builds a floe from a raw coordinate ring.
pub fn floe_from_coords<F: FloeFloat, R: Rng>(
    coords: &[(F, F)],
    height: F,
    consts: &Constants<F>,
    settings: &FloeSettings<F>,
    rng: &mut R,
) -> Result<Floe<F>> {
    let ring = coords.iter().map(|(x, y)| Vec2::new(*x, *y)).collect();
    build_floe(Polygon::from_ring(ring)?, height, consts, settings, rng)
}

/// Builds one or more floes from a polygon, splitting around holes until
/// every piece is hole-free. Pieces below the settings' minimum area are
/// dropped.
pub fn floes_from_polygon<F: FloeFloat, R: Rng>(
    polygon: Polygon<F>,
    height: F,
    consts: &Constants<F>,
    settings: &FloeSettings<F>,
    rng: &mut R,
) -> Result<Vec<Floe<F>>> {
    let mut queue = vec![polygon];
    let mut pieces: Vec<Polygon<F>> = Vec::new();
    while let Some(poly) = queue.pop() {
        if poly.has_holes() {
            let (below, above) = poly.split_around_first_hole();
            queue.extend(below);
            queue.extend(above);
        } else {
            pieces.push(poly);
        }
    }
    let mut floes = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if piece.area() < settings.min_floe_area {
            continue;
        }
        floes.push(build_floe(piece, height, consts, settings, rng)?);
    }
    Ok(floes)
}

/// Fills the domain with a Voronoi-tessellated floe field.
///
/// `concentration` is the target ice area fraction in `(0, 1]`; each cell
/// is shrunk about its centroid by `√concentration`. Heights are drawn
/// uniformly from `hbar ± dh`.
pub fn voronoi_floe_field<F: FloeFloat, R: Rng>(
    nfloes: usize,
    concentration: F,
    domain: &Domain<F>,
    hbar: F,
    dh: F,
    consts: &Constants<F>,
    settings: &FloeSettings<F>,
    rng: &mut R,
) -> Result<Vec<Floe<F>>> {
    if nfloes == 0 {
        return Ok(Vec::new());
    }
    if concentration <= F::zero() || concentration > F::one() {
        return Err(SubzeroError::ArgumentOutOfRange(
            "concentration must be in (0, 1]".into(),
        ));
    }
    if hbar <= F::zero() || dh < F::zero() || dh >= hbar {
        return Err(SubzeroError::ArgumentOutOfRange(
            "floe field heights must satisfy 0 < dh < hbar".into(),
        ));
    }
    let min = Vec2::new(domain.west.val, domain.south.val);
    let max = Vec2::new(domain.east.val, domain.north.val);
    let bounds = Polygon::rectangle(min, max)?;
    let seeds = sample_seeds_in_polygon(&bounds, nfloes, 10, rng);
    let cells = voronoi_cells(min, max, &seeds);

    let shrink = concentration.sqrt();
    let mut floes = Vec::new();
    for cell in cells {
        // Carve out topography before shrinking.
        let mut open_water = vec![cell];
        for topo in &domain.topography {
            open_water = open_water
                .iter()
                .flat_map(|piece| piece.difference(&topo.polygon))
                .collect();
        }
        for piece in open_water {
            let scaled = piece.scale(shrink);
            if scaled.area() < settings.min_floe_area {
                continue;
            }
            let height = hbar + (F::lit(2.0) * F::lit(rng.gen::<f64>()) - F::one()) * dh;
            floes.push(build_floe(scaled, height, consts, settings, rng)?);
        }
    }
    if floes.is_empty() {
        warn!("Voronoi floe field produced no floes above the minimum area");
    }
    Ok(floes)
}

/// Generates sub-floe quadrature point offsets for a polygon.
pub fn generate_subfloe_points<F: FloeFloat, R: Rng>(
    polygon: &Polygon<F>,
    centroid: Vec2<F>,
    rmax: F,
    generator: SubfloePointsGenerator<F>,
    rng: &mut R,
) -> (Vec<F>, Vec<F>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    match generator {
        SubfloePointsGenerator::Grid { spacing_frac } => {
            let spacing = (rmax * spacing_frac).max(F::lit(1e-6));
            let (min, max) = polygon.bounding_box();
            let mut y = min.y;
            while y <= max.y {
                let mut x = min.x;
                while x <= max.x {
                    let p = Vec2::new(x, y);
                    if polygon.contains(p) == Containment::Inside {
                        xs.push(p.x - centroid.x);
                        ys.push(p.y - centroid.y);
                    }
                    x += spacing;
                }
                y += spacing;
            }
        }
        SubfloePointsGenerator::MonteCarlo { npoints } => {
            let (min, max) = polygon.bounding_box();
            let mut tries = 0;
            let max_tries = npoints.saturating_mul(100).max(100);
            while xs.len() < npoints && tries < max_tries {
                tries += 1;
                let p = Vec2::new(
                    min.x + (max.x - min.x) * F::lit(rng.gen::<f64>()),
                    min.y + (max.y - min.y) * F::lit(rng.gen::<f64>()),
                );
                if polygon.contains(p) == Containment::Inside {
                    xs.push(p.x - centroid.x);
                    ys.push(p.y - centroid.y);
                }
            }
        }
    }
    if xs.is_empty() {
        // A floe always carries at least its centroid as quadrature point.
        xs.push(F::zero());
        ys.push(F::zero());
    }
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridSpacing, GridSpec};
    use crate::domain::{Boundary, BoundaryKind, Direction};
    use crate::grid::Grid;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn consts() -> Constants<f64> {
        Constants::default()
    }

    fn settings() -> FloeSettings<f64> {
        FloeSettings {
            min_floe_area: 1e4,
            ..FloeSettings::default()
        }
    }

    #[test]
    fn build_floe_mass_properties() {
        let poly = Polygon::rectangle(Vec2::new(0.0, 0.0), Vec2::new(1e4, 1e4)).unwrap();
        let mut rng = Pcg64::seed_from_u64(3);
        let floe = build_floe(poly, 0.5, &consts(), &settings(), &mut rng).unwrap();
        assert!((floe.area - 1e8).abs() < 1.0);
        assert!((floe.mass - 1e8 * 0.5 * 920.0).abs() < 1e3);
        assert!(floe.moment > 0.0);
        assert!(floe.rmax > 0.0);
        assert!(!floe.x_subfloe_points.is_empty());
        assert_eq!(floe.x_subfloe_points.len(), floe.y_subfloe_points.len());
    }

    #[test]
    fn height_is_validated_and_capped() {
        let poly = Polygon::rectangle(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0)).unwrap();
        let mut rng = Pcg64::seed_from_u64(3);
        assert!(build_floe(poly.clone(), 0.0, &consts(), &settings(), &mut rng).is_err());
        let tall = build_floe(poly, 50.0, &consts(), &settings(), &mut rng).unwrap();
        assert_eq!(tall.height, MAX_FLOE_HEIGHT);
    }

    #[test]
    fn subfloe_points_lie_inside_the_floe() {
        let poly = Polygon::rectangle(Vec2::new(0.0, 0.0), Vec2::new(5e3, 5e3)).unwrap();
        let mut rng = Pcg64::seed_from_u64(11);
        let floe = build_floe(poly, 0.25, &consts(), &settings(), &mut rng).unwrap();
        for (dx, dy) in floe
            .x_subfloe_points
            .iter()
            .zip(floe.y_subfloe_points.iter())
        {
            let p = floe.centroid + Vec2::new(*dx, *dy);
            assert_ne!(floe.polygon.contains(p), Containment::Outside);
        }
    }

    #[test]
    fn polygon_with_hole_splits_into_hole_free_floes() {
        let outer = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(2e3, 0.0),
            Vec2::new(2e3, 2e3),
            Vec2::new(0.0, 2e3),
        ];
        let hole = vec![
            Vec2::new(800.0, 800.0),
            Vec2::new(1200.0, 800.0),
            Vec2::new(1200.0, 1200.0),
            Vec2::new(800.0, 1200.0),
        ];
        let poly = Polygon::new(outer, vec![hole]).unwrap();
        let mut rng = Pcg64::seed_from_u64(5);
        let floes = floes_from_polygon(poly, 0.5, &consts(), &settings(), &mut rng).unwrap();
        assert!(floes.len() >= 2);
        let total: f64 = floes.iter().map(|f| f.area).sum();
        assert!((total - (4e6 - 1.6e5)).abs() < 10.0);
        for floe in &floes {
            assert!(!floe.polygon.has_holes());
        }
    }

    #[test]
    fn voronoi_field_respects_concentration() {
        let grid = Grid::from_spec(&GridSpec {
            x0: 0.0,
            xf: 1e5,
            y0: 0.0,
            yf: 1e5,
            spacing: GridSpacing::CellCount { nx: 10, ny: 10 },
        })
        .unwrap();
        let domain = Domain::new(
            Boundary::new(Direction::North, BoundaryKind::Collision, &grid).unwrap(),
            Boundary::new(Direction::South, BoundaryKind::Collision, &grid).unwrap(),
            Boundary::new(Direction::East, BoundaryKind::Collision, &grid).unwrap(),
            Boundary::new(Direction::West, BoundaryKind::Collision, &grid).unwrap(),
        )
        .unwrap();
        let mut rng = Pcg64::seed_from_u64(9);
        let floes = voronoi_floe_field(
            12,
            0.6,
            &domain,
            0.5,
            0.1,
            &consts(),
            &settings(),
            &mut rng,
        )
        .unwrap();
        assert!(!floes.is_empty());
        let ice_area: f64 = floes.iter().map(|f| f.area).sum();
        let frac = ice_area / 1e10;
        assert!(frac > 0.3 && frac < 0.75, "fraction was {frac}");
        for floe in &floes {
            assert!(domain.contains(floe.centroid));
            assert!(floe.height > 0.3 && floe.height < 0.7);
        }
    }

    #[test]
    fn degenerate_coords_are_rejected() {
        let mut rng = Pcg64::seed_from_u64(1);
        let result = floe_from_coords(
            &[(0.0_f64, 0.0), (1.0, 1.0)],
            0.5,
            &consts(),
            &settings(),
            &mut rng,
        );
        assert!(matches!(result, Err(SubzeroError::InvalidGeometry(_))));
    }
}
