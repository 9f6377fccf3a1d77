//! Physical constants and simulation settings.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubzeroError};
use crate::utils::math::FloeFloat;

/// Density of sea ice (kg/m³).
pub const DEFAULT_ICE_DENSITY: f64 = 920.0;

/// Density of sea water (kg/m³).
pub const DEFAULT_OCEAN_DENSITY: f64 = 1027.0;

/// Density of air (kg/m³).
pub const DEFAULT_AIR_DENSITY: f64 = 1.2;

/// Ice-ocean drag coefficient.
pub const DEFAULT_ICE_OCEAN_DRAG: f64 = 3e-3;

/// Ice-atmosphere drag coefficient.
pub const DEFAULT_ICE_ATMOS_DRAG: f64 = 1e-3;

/// Atmosphere-ocean drag coefficient.
pub const DEFAULT_ATMOS_OCEAN_DRAG: f64 = 1.25e-3;

/// Coriolis parameter (1/s).
pub const DEFAULT_CORIOLIS: f64 = 1.4e-4;

/// Ekman turning angle of the ocean drag (degrees).
pub const DEFAULT_TURN_ANGLE_DEG: f64 = 15.0;

/// Latent heat of fusion of sea ice (J/kg).
pub const DEFAULT_LATENT_HEAT: f64 = 2.93e5;

/// Thermal conductivity of ice (W/m/K).
pub const DEFAULT_CONDUCTIVITY: f64 = 2.14;

/// Poisson's ratio of ice.
pub const DEFAULT_POISSON_RATIO: f64 = 0.3;

/// Coulomb friction coefficient between floes.
pub const DEFAULT_FRICTION_COEFF: f64 = 0.2;

/// Young's modulus of ice (Pa).
pub const DEFAULT_YOUNGS_MODULUS: f64 = 6e6;

/// Upper bound on floe thickness (m).
pub const MAX_FLOE_HEIGHT: f64 = 10.0;

/// Floes lighter than this (kg) are resurrected and marked for removal.
pub const MIN_FLOE_MASS: f64 = 100.0;

/// Angular velocity clamp (rad/s).
pub const MAX_ANGULAR_VELOCITY: f64 = 1e-5;

/// Physical constants shared by every component of the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "F: FloeFloat"))]
pub struct Constants<F> {
    /// Ice density ρᵢ (kg/m³).
    pub rho_i: F,
    /// Ocean density ρₒ (kg/m³).
    pub rho_o: F,
    /// Air density ρₐ (kg/m³).
    pub rho_a: F,
    /// Ice-ocean drag coefficient.
    pub c_io: F,
    /// Ice-atmosphere drag coefficient.
    pub c_ia: F,
    /// Atmosphere-ocean drag coefficient.
    pub c_ao: F,
    /// Coriolis parameter f (1/s).
    pub coriolis: F,
    /// Ekman turning angle (radians).
    pub turn_angle: F,
    /// Latent heat of fusion L (J/kg).
    pub latent_heat: F,
    /// Thermal conductivity k (W/m/K).
    pub conductivity: F,
    /// Poisson's ratio ν.
    pub nu: F,
    /// Coulomb friction coefficient μ.
    pub mu: F,
    /// Young's modulus E (Pa).
    pub e: F,
}

impl<F: FloeFloat> Default for Constants<F> {
    fn default() -> Self {
        Self {
            rho_i: F::lit(DEFAULT_ICE_DENSITY),
            rho_o: F::lit(DEFAULT_OCEAN_DENSITY),
            rho_a: F::lit(DEFAULT_AIR_DENSITY),
            c_io: F::lit(DEFAULT_ICE_OCEAN_DRAG),
            c_ia: F::lit(DEFAULT_ICE_ATMOS_DRAG),
            c_ao: F::lit(DEFAULT_ATMOS_OCEAN_DRAG),
            coriolis: F::lit(DEFAULT_CORIOLIS),
            turn_angle: F::lit(DEFAULT_TURN_ANGLE_DEG.to_radians()),
            latent_heat: F::lit(DEFAULT_LATENT_HEAT),
            conductivity: F::lit(DEFAULT_CONDUCTIVITY),
            nu: F::lit(DEFAULT_POISSON_RATIO),
            mu: F::lit(DEFAULT_FRICTION_COEFF),
            e: F::lit(DEFAULT_YOUNGS_MODULUS),
        }
    }
}

impl<F: FloeFloat> Constants<F> {
    /// Shear modulus `G = E / (2(1 + ν))`.
    pub fn shear_modulus(&self) -> F {
        self.e / (F::lit(2.0) * (F::one() + self.nu))
    }
}

/// Grid extent plus either a cell size or a cell count per axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridSpec<F> {
    pub x0: F,
    pub xf: F,
    pub y0: F,
    pub yf: F,
    pub spacing: GridSpacing<F>,
}

/// The two recognized ways of fixing grid resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum GridSpacing<F> {
    CellSize { dx: F, dy: F },
    CellCount { nx: usize, ny: usize },
}

impl<F: FloeFloat> GridSpec<F> {
    /// Resolves the spec into `(nx, ny, dx, dy)`.
    pub fn resolve(&self) -> Result<(usize, usize, F, F)> {
        if self.xf <= self.x0 || self.yf <= self.y0 {
            return Err(SubzeroError::ArgumentOutOfRange(
                "grid extent must be positive along both axes".into(),
            ));
        }
        let (wx, wy) = (self.xf - self.x0, self.yf - self.y0);
        match self.spacing {
            GridSpacing::CellSize { dx, dy } => {
                if dx <= F::zero() || dy <= F::zero() {
                    return Err(SubzeroError::ArgumentOutOfRange(
                        "grid cell size must be positive".into(),
                    ));
                }
                let nx = (wx / dx).ceil().to_usize().unwrap_or(0).max(1);
                let ny = (wy / dy).ceil().to_usize().unwrap_or(0).max(1);
                Ok((nx, ny, dx, dy))
            }
            GridSpacing::CellCount { nx, ny } => {
                if nx == 0 || ny == 0 {
                    return Err(SubzeroError::ArgumentOutOfRange(
                        "grid cell count must be positive".into(),
                    ));
                }
                let dx = wx / F::from_usize(nx).unwrap_or_else(F::one);
                let dy = wy / F::from_usize(ny).unwrap_or_else(F::one);
                Ok((nx, ny, dx, dy))
            }
        }
    }
}

/// How sub-floe integration points are generated at floe construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SubfloePointsGenerator<F> {
    /// Regular grid of points with the given spacing fraction of `rmax`.
    Grid { spacing_frac: F },
    /// Uniform rejection sampling inside the floe polygon.
    MonteCarlo { npoints: usize },
}

impl<F: FloeFloat> Default for SubfloePointsGenerator<F> {
    fn default() -> Self {
        Self::Grid {
            spacing_frac: F::lit(0.25),
        }
    }
}

/// Policy turning the stress history into the accumulated stress tensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum StressCalculator<F> {
    /// Plain mean over the bounded history buffer.
    RunningAverage,
    /// Exponentially-weighted blend of the newest tensor into the
    /// accumulator with weight `lambda`.
    DecayAverage { lambda: F },
}

impl<F: FloeFloat> Default for StressCalculator<F> {
    fn default() -> Self {
        Self::RunningAverage
    }
}

/// Floe-level settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "F: FloeFloat"))]
pub struct FloeSettings<F> {
    /// Floes below this area (m²) are never created by the factory and are
    /// dropped when produced by fracture.
    pub min_floe_area: F,
    pub subfloe_points: SubfloePointsGenerator<F>,
    pub stress_calculator: StressCalculator<F>,
    /// Capacity of the per-floe stress history ring buffer.
    pub stress_history_len: usize,
}

impl<F: FloeFloat> Default for FloeSettings<F> {
    fn default() -> Self {
        Self {
            min_floe_area: F::lit(1e6),
            subfloe_points: SubfloePointsGenerator::default(),
            stress_calculator: StressCalculator::default(),
            stress_history_len: 1000,
        }
    }
}

/// Yield criteria recognized by the fracture engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FractureCriteria<F> {
    /// Fracture disabled by criteria.
    None,
    /// Hibler-style yield curve parametrized by `p*` and `c`.
    Hibler { pstar: F, c: F },
    /// User-supplied yield polygon in principal-stress space, given as a
    /// closed vertex ring.
    Custom { vertices: Vec<(F, F)> },
}

/// Fracture engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "F: FloeFloat"))]
pub struct FractureSettings<F> {
    pub fractures_on: bool,
    pub criteria: FractureCriteria<F>,
    /// Number of timesteps between fracture passes.
    pub dt_fracture: usize,
    /// Target number of Voronoi pieces per fractured floe.
    pub npieces: usize,
    /// Deform floes around their largest contact before splitting.
    pub deform_on: bool,
    /// Floes below this area are not fracture candidates.
    pub min_floe_area: F,
    /// Attempt bound for Voronoi seeding.
    pub max_tries: usize,
}

impl<F: FloeFloat> Default for FractureSettings<F> {
    fn default() -> Self {
        Self {
            fractures_on: false,
            criteria: FractureCriteria::None,
            dt_fracture: 75,
            npieces: 3,
            deform_on: false,
            min_floe_area: F::lit(1e9),
            max_tries: 10,
        }
    }
}

/// Collision engine settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "F: FloeFloat"))]
pub struct CollisionSettings<F> {
    /// Overlap fraction beyond which two floes fuse instead of colliding.
    pub floe_floe_max_overlap: F,
    /// Overlap fraction with a wall or topography beyond which a floe is
    /// removed.
    pub floe_domain_max_overlap: F,
}

impl<F: FloeFloat> Default for CollisionSettings<F> {
    fn default() -> Self {
        Self {
            floe_floe_max_overlap: F::lit(0.55),
            floe_domain_max_overlap: F::lit(0.75),
        }
    }
}

/// Outer-loop settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "F: FloeFloat"))]
pub struct SimulationSettings<F> {
    /// Timestep Δt (s).
    pub dt: F,
    /// Number of timesteps to run.
    pub n_dt: usize,
    /// Log a progress line every `verbose_every` steps (0 disables).
    pub verbose_every: usize,
    /// Seed for the single Pcg64 stream threaded through the factory,
    /// Voronoi seeding, and fracture.
    pub rng_seed: u64,
}

impl<F: FloeFloat> Default for SimulationSettings<F> {
    fn default() -> Self {
        Self {
            dt: F::lit(10.0),
            n_dt: 2000,
            verbose_every: 50,
            rng_seed: 1,
        }
    }
}
