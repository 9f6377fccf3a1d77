//! Simulation driver: owns the model state and orchestrates the
//! discrete-element timestep loop.

use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::collision::{self, ghost};
use crate::config::{
    CollisionSettings, Constants, FloeSettings, FractureSettings, GridSpec, SimulationSettings,
};
use crate::coupling;
use crate::domain::{Boundary, BoundaryKind, Direction, Domain, TopographyElement};
use crate::dynamics::Integrator;
use crate::error::Result;
use crate::floe::{Floe, FloeStatus};
use crate::fracture::{self, YieldCriteria};
use crate::grid::{Atmos, Grid, Ocean};
use crate::utils::exec;
use crate::utils::logging::ScopedTimer;
use crate::utils::math::{FloeFloat, Vec2};

/// Central simulation container orchestrating all subsystems.
pub struct Model<F: FloeFloat> {
    pub grid: Grid<F>,
    pub ocean: Ocean<F>,
    pub atmos: Atmos<F>,
    pub domain: Domain<F>,
    pub floes: Vec<Floe<F>>,
    pub consts: Constants<F>,
    pub collision_settings: CollisionSettings<F>,
    pub fracture_settings: FractureSettings<F>,
    pub floe_settings: FloeSettings<F>,
    pub sim_settings: SimulationSettings<F>,
    grid_spec: GridSpec<F>,
    integrator: Integrator<F>,
    criteria: YieldCriteria<F>,
    rng: Pcg64,
    next_id: u64,
    timestep: usize,
}

impl<F: FloeFloat> Model<F> {
    pub fn builder(grid_spec: GridSpec<F>) -> ModelBuilder<F> {
        ModelBuilder::new(grid_spec)
    }

    /// Current timestep count.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn grid_spec(&self) -> &GridSpec<F> {
        &self.grid_spec
    }

    /// Number of real (non-ghost) floes.
    pub fn n_real(&self) -> usize {
        self.floes.iter().filter(|f| f.is_real()).count()
    }

    /// Adds a floe, assigning it the next unique id.
    pub fn add_floe(&mut self, mut floe: Floe<F>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        floe.id = id;
        self.floes.push(floe);
        id
    }

    pub fn add_floes(&mut self, floes: Vec<Floe<F>>) -> Vec<u64> {
        floes.into_iter().map(|f| self.add_floe(f)).collect()
    }

    /// The seeded stream threaded through the factory and fracture.
    pub fn rng(&mut self) -> &mut Pcg64 {
        &mut self.rng
    }

    /// Runs `n_dt` timesteps.
    pub fn run(&mut self) {
        for _ in 0..self.sim_settings.n_dt {
            self.step();
            let every = self.sim_settings.verbose_every;
            if every > 0 && self.timestep % every == 0 {
                info!(
                    "timestep {} of {}: {} floes",
                    self.timestep,
                    self.sim_settings.n_dt,
                    self.n_real()
                );
            }
        }
    }

    /// Advances the model by one timestep.
    pub fn step(&mut self) {
        let _timer = ScopedTimer::new("model::step");
        let dt = self.sim_settings.dt;

        // 1. Clear last step's ghosts and per-cell accumulators.
        ghost::clear_ghosts(&mut self.floes);
        self.grid.clear_cells();
        self.ocean.clear_si_frac();
        let n_real = self.floes.len();
        for floe in &mut self.floes {
            floe.reset_forces();
        }

        // 2. Replicate floes across periodic walls.
        ghost::add_ghosts(&mut self.floes, &self.domain);

        // 3. Ocean/atmosphere coupling over the real floes.
        let translations = ghost::ghost_translations(&self.floes, n_real);
        coupling::couple_floes(
            &mut self.floes[..n_real],
            &translations,
            &self.grid,
            &self.ocean,
            &self.atmos,
            &self.consts,
        );
        coupling::fold_ocean_coupling(&self.grid, &mut self.ocean);

        // 4. Collisions, then stress/strain bookkeeping.
        collision::collide(
            &mut self.floes,
            n_real,
            &self.domain,
            &self.consts,
            &self.collision_settings,
            dt,
        );
        let calculator = self.floe_settings.stress_calculator;
        exec::for_each_mut(&mut self.floes[..n_real], move |floe| {
            floe.update_stress(calculator);
            floe.update_strain();
        });

        // 5. Moving walls advance before the floes do.
        self.domain.advance_walls(dt);

        // 6. Rigid-body integration of the real floes.
        self.integrator.step_floes(&mut self.floes[..n_real]);

        // 7. Fracture on its own cadence.
        self.timestep += 1;
        if self.fracture_settings.fractures_on
            && self.fracture_settings.dt_fracture > 0
            && self.timestep % self.fracture_settings.dt_fracture == 0
        {
            let domain_area = self.domain.width() * self.domain.height();
            let fractured = fracture::fracture_floes(
                &mut self.floes,
                n_real,
                &mut self.criteria,
                &self.fracture_settings,
                &self.floe_settings,
                &self.consts,
                domain_area,
                &mut self.next_id,
                &mut self.rng,
            );
            if fractured > 0 {
                debug!("fractured {fractured} floes at timestep {}", self.timestep);
            }
        }

        // 8. Compact the floe list.
        self.compact();
    }

    /// Wraps real floes back into the domain across periodic axes, fuses
    /// marked pairs, and drops ghosts and removed floes, keeping surviving
    /// ids stable.
    fn compact(&mut self) {
        self.wrap_periodic();
        self.fuse_marked();

        let keep: Vec<bool> = self
            .floes
            .iter()
            .map(|f| f.is_real() && f.status != FloeStatus::Remove)
            .collect();
        let mut new_index = vec![-1i64; self.floes.len()];
        let mut next = 0i64;
        for (i, kept) in keep.iter().enumerate() {
            if *kept {
                new_index[i] = next;
                next += 1;
            }
        }

        let mut idx = 0;
        self.floes.retain(|_| {
            let kept = keep[idx];
            idx += 1;
            kept
        });
        for floe in &mut self.floes {
            floe.ghosts.clear();
            floe.fuse_partners.clear();
            floe.interactions.retain_partners(
                |other| other < 0 || (other as usize) < keep.len() && keep[other as usize],
                |other| {
                    if other >= 0 {
                        new_index[other as usize]
                    } else {
                        other
                    }
                },
            );
        }
    }

    fn wrap_periodic(&mut self) {
        let width = self.domain.width();
        let height = self.domain.height();
        let (west, east) = (self.domain.west.val, self.domain.east.val);
        let (south, north) = (self.domain.south.val, self.domain.north.val);
        let ew = self.domain.east_west_periodic();
        let ns = self.domain.north_south_periodic();
        for floe in self.floes.iter_mut().filter(|f| f.is_real()) {
            let mut shift = Vec2::zero();
            if ew {
                if floe.centroid.x > east {
                    shift.x = -width;
                } else if floe.centroid.x < west {
                    shift.x = width;
                }
            }
            if ns {
                if floe.centroid.y > north {
                    shift.y = -height;
                } else if floe.centroid.y < south {
                    shift.y = height;
                }
            }
            if shift != Vec2::zero() {
                floe.translate(shift);
            }
        }
    }

    /// Merges fuse-marked pairs: the smaller floe is absorbed into the
    /// larger, conserving mass and momentum.
    fn fuse_marked(&mut self) {
        let n = self.floes.len();
        for i in 0..n {
            if self.floes[i].status != FloeStatus::Fuse {
                continue;
            }
            let partners = self.floes[i].fuse_partners.clone();
            for j in partners {
                if j >= n || i == j {
                    continue;
                }
                if self.floes[j].status != FloeStatus::Fuse {
                    continue;
                }
                let (keep, drop) = if self.floes[i].area >= self.floes[j].area {
                    (i, j)
                } else {
                    (j, i)
                };
                let union = self.floes[keep].polygon.union(&self.floes[drop].polygon);
                let Some(merged) = union.into_iter().max_by(|a, b| {
                    a.area()
                        .partial_cmp(&b.area())
                        .unwrap_or(std::cmp::Ordering::Equal)
                }) else {
                    continue;
                };
                let total_mass = self.floes[keep].mass + self.floes[drop].mass;
                let momentum_x =
                    self.floes[keep].mass * self.floes[keep].u + self.floes[drop].mass * self.floes[drop].u;
                let momentum_y =
                    self.floes[keep].mass * self.floes[keep].v + self.floes[drop].mass * self.floes[drop].v;
                let spin = self.floes[keep].moment * self.floes[keep].xi
                    + self.floes[drop].moment * self.floes[drop].xi;

                let merged = merged.remove_holes();
                let area = merged.area();
                if area <= F::zero() {
                    continue;
                }
                let floe = &mut self.floes[keep];
                floe.height = total_mass / (self.consts.rho_i * area);
                floe.set_polygon(merged, self.consts.rho_i);
                floe.u = momentum_x / floe.mass;
                floe.v = momentum_y / floe.mass;
                if floe.moment > F::zero() {
                    floe.xi = spin / floe.moment;
                }
                floe.status = FloeStatus::Active;
                self.floes[drop].status = FloeStatus::Remove;
            }
        }
        // Unpaired fuse marks revert to active.
        for floe in &mut self.floes {
            if floe.status == FloeStatus::Fuse {
                floe.status = FloeStatus::Active;
            }
        }
    }
}

/// Builder for [`Model`]; wall kinds default to collision walls.
pub struct ModelBuilder<F: FloeFloat> {
    grid_spec: GridSpec<F>,
    north: BoundaryKind<F>,
    south: BoundaryKind<F>,
    east: BoundaryKind<F>,
    west: BoundaryKind<F>,
    topography: Vec<TopographyElement<F>>,
    ocean_uniform: (F, F, F),
    atmos_uniform: (F, F, F),
    consts: Constants<F>,
    collision_settings: CollisionSettings<F>,
    fracture_settings: FractureSettings<F>,
    floe_settings: FloeSettings<F>,
    sim_settings: SimulationSettings<F>,
}

impl<F: FloeFloat> ModelBuilder<F> {
    pub fn new(grid_spec: GridSpec<F>) -> Self {
        Self {
            grid_spec,
            north: BoundaryKind::Collision,
            south: BoundaryKind::Collision,
            east: BoundaryKind::Collision,
            west: BoundaryKind::Collision,
            topography: Vec::new(),
            ocean_uniform: (F::zero(), F::zero(), F::zero()),
            atmos_uniform: (F::zero(), F::zero(), F::zero()),
            consts: Constants::default(),
            collision_settings: CollisionSettings::default(),
            fracture_settings: FractureSettings::default(),
            floe_settings: FloeSettings::default(),
            sim_settings: SimulationSettings::default(),
        }
    }

    pub fn boundaries(
        mut self,
        north: BoundaryKind<F>,
        south: BoundaryKind<F>,
        east: BoundaryKind<F>,
        west: BoundaryKind<F>,
    ) -> Self {
        self.north = north;
        self.south = south;
        self.east = east;
        self.west = west;
        self
    }

    pub fn topography(mut self, topography: Vec<TopographyElement<F>>) -> Self {
        self.topography = topography;
        self
    }

    pub fn ocean_uniform(mut self, u: F, v: F, temp: F) -> Self {
        self.ocean_uniform = (u, v, temp);
        self
    }

    pub fn atmos_uniform(mut self, u: F, v: F, temp: F) -> Self {
        self.atmos_uniform = (u, v, temp);
        self
    }

    pub fn constants(mut self, consts: Constants<F>) -> Self {
        self.consts = consts;
        self
    }

    pub fn collision_settings(mut self, settings: CollisionSettings<F>) -> Self {
        self.collision_settings = settings;
        self
    }

    pub fn fracture_settings(mut self, settings: FractureSettings<F>) -> Self {
        self.fracture_settings = settings;
        self
    }

    pub fn floe_settings(mut self, settings: FloeSettings<F>) -> Self {
        self.floe_settings = settings;
        self
    }

    pub fn simulation_settings(mut self, settings: SimulationSettings<F>) -> Self {
        self.sim_settings = settings;
        self
    }

    pub fn build(self) -> Result<Model<F>> {
        let grid = Grid::from_spec(&self.grid_spec)?;
        let domain = Domain::new(
            Boundary::new(Direction::North, self.north, &grid)?,
            Boundary::new(Direction::South, self.south, &grid)?,
            Boundary::new(Direction::East, self.east, &grid)?,
            Boundary::new(Direction::West, self.west, &grid)?,
        )?
        .with_topography(self.topography);
        let (ou, ov, otemp) = self.ocean_uniform;
        let ocean = Ocean::uniform(&grid, ou, ov, otemp);
        let (au, av, atemp) = self.atmos_uniform;
        let atmos = Atmos::uniform(&grid, au, av, atemp);
        ocean.validate_against(&atmos);

        let criteria =
            YieldCriteria::from_settings(&self.fracture_settings.criteria, F::one(), F::one())?;
        let integrator = Integrator::new(self.sim_settings.dt);
        let rng = Pcg64::seed_from_u64(self.sim_settings.rng_seed);

        Ok(Model {
            grid,
            ocean,
            atmos,
            domain,
            floes: Vec::new(),
            consts: self.consts,
            collision_settings: self.collision_settings,
            fracture_settings: self.fracture_settings,
            floe_settings: self.floe_settings,
            sim_settings: self.sim_settings,
            grid_spec: self.grid_spec,
            integrator,
            criteria,
            rng,
            next_id: 1,
            timestep: 0,
        })
    }
}
