use rand::SeedableRng;
use rand_pcg::Pcg64;
use subzero::collision::ghost;
use subzero::collision::collide;
use subzero::floe::factory;
use subzero::*;

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

fn east_west_periodic_domain() -> Domain<f64> {
    let grid = grid();
    Domain::new(
        Boundary::new(Direction::North, BoundaryKind::Collision, &grid).unwrap(),
        Boundary::new(Direction::South, BoundaryKind::Collision, &grid).unwrap(),
        Boundary::new(Direction::East, BoundaryKind::Periodic, &grid).unwrap(),
        Boundary::new(Direction::West, BoundaryKind::Periodic, &grid).unwrap(),
    )
    .unwrap()
}

fn floe_rect(id: u64, min: (f64, f64), max: (f64, f64)) -> Floe<f64> {
    let poly = Polygon::rectangle(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1)).unwrap();
    let mut rng = Pcg64::seed_from_u64(id);
    let mut floe = factory::build_floe(
        poly,
        0.5,
        &Constants::default(),
        &FloeSettings::default(),
        &mut rng,
    )
    .unwrap();
    floe.id = id;
    floe
}

#[test]
fn one_ghost_per_crossed_periodic_axis() {
    let domain = east_west_periodic_domain();
    let mut floes = vec![
        floe_rect(1, (9.55e4, 4e4), (1.03e5, 6e4)),
        floe_rect(2, (0.1e4, 4.1e4), (0.6e4, 5.9e4)),
    ];
    ghost::add_ghosts(&mut floes, &domain);
    assert_eq!(floes.len(), 3);
    assert_eq!(floes[0].ghosts, vec![2]);
    assert!(floes[1].ghosts.is_empty());
    assert_eq!(floes[2].ghost_id, 1);
    assert_eq!(floes[2].id, 1);
}

#[test]
fn parent_inherits_ghost_interactions_in_its_own_frame() {
    let domain = east_west_periodic_domain();
    let mut floes = vec![
        floe_rect(1, (9.55e4, 4e4), (1.03e5, 6e4)),
        floe_rect(2, (0.1e4, 4.1e4), (0.6e4, 5.9e4)),
    ];
    ghost::add_ghosts(&mut floes, &domain);
    collide(
        &mut floes,
        2,
        &domain,
        &Constants::default(),
        &CollisionSettings::default(),
        10.0,
    );

    // The wrapped contact reaches the parent with its application point
    // translated back across the domain width.
    let parent_rows = floes[0].interactions.rows();
    assert_eq!(parent_rows.len(), 1);
    let row = parent_rows[0];
    assert_eq!(row.other_idx, 1);
    assert!(row.px > 1e5, "contact point should be in the parent frame, got {}", row.px);
    assert!(row.overlap > 0.0);

    // The western floe sees the parent (not the ghost) as its partner.
    let west_rows = floes[1].interactions.rows();
    assert_eq!(west_rows.len(), 1);
    let mirror = west_rows[0];
    assert_eq!(mirror.other_idx, 0);
    assert!(mirror.px < 1e4, "mirror point stays in the western frame");

    // Forces are equal and opposite across the wrap.
    assert!((row.fx + mirror.fx).abs() <= 1e-9 * row.fx.abs().max(1.0));
    assert!((row.fy + mirror.fy).abs() <= 1e-9 * row.fx.abs().max(1.0));

    // Totals folded through pass three agree.
    let fa = floes[0].collision_force;
    let fb = floes[1].collision_force;
    assert!(fa.x < 0.0, "eastern floe is pushed back west, got {fa:?}");
    assert!(fb.x > 0.0, "western floe is pushed east, got {fb:?}");
}

#[test]
fn ghosts_are_cleared_between_steps() {
    let domain = east_west_periodic_domain();
    let mut floes = vec![floe_rect(1, (9.55e4, 4e4), (1.03e5, 6e4))];
    ghost::add_ghosts(&mut floes, &domain);
    assert_eq!(floes.len(), 2);
    ghost::clear_ghosts(&mut floes);
    assert_eq!(floes.len(), 1);
    assert!(floes[0].ghosts.is_empty());
    // A second round recreates the ghost with a fresh index.
    ghost::add_ghosts(&mut floes, &domain);
    assert_eq!(floes.len(), 2);
    assert_eq!(floes[0].ghosts, vec![1]);
}
