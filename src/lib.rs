//! Subzero – discrete-element sea-ice dynamics for Rust.
//!
//! This crate simulates fields of rigid polygonal sea-ice floes in a
//! bounded two-dimensional ocean: ocean/atmosphere coupling over an
//! Eulerian grid, elastic collisions with friction across periodic, open,
//! collision, and moving boundaries, second-order rigid-body integration,
//! and stress-driven fracture into Voronoi pieces.

pub mod collision;
pub mod config;
pub mod coupling;
pub mod domain;
pub mod dynamics;
pub mod error;
pub mod floe;
pub mod fracture;
pub mod geometry;
pub mod grid;
pub mod simulation;
pub mod snapshot;
pub mod utils;

pub use config::{
    CollisionSettings, Constants, FloeSettings, FractureCriteria, FractureSettings, GridSpacing,
    GridSpec, SimulationSettings, StressCalculator, SubfloePointsGenerator,
};
pub use domain::{Boundary, BoundaryKind, Direction, Domain, TopographyElement};
pub use error::{Result, SubzeroError};
pub use floe::{factory, Floe, FloeStatus, Interaction, InteractionTable, StressHistory};
pub use fracture::{HiblerYieldCurve, YieldCriteria};
pub use geometry::{Containment, Polygon};
pub use grid::{Atmos, CellFloes, Grid, IceStressCell, Ocean};
pub use simulation::{Model, ModelBuilder};
pub use snapshot::{FloeFieldSnapshot, FloeRecord, InitialState};
pub use utils::math::{FloeFloat, Mat2, Vec2};

/// High-level convenience wrapper that owns a [`Model`].
pub struct Subzero<F: FloeFloat> {
    model: Model<F>,
}

impl<F: FloeFloat> Subzero<F> {
    pub fn new(model: Model<F>) -> Self {
        Self { model }
    }

    /// Adds a floe to the model and returns its assigned id.
    pub fn add_floe(&mut self, floe: Floe<F>) -> u64 {
        self.model.add_floe(floe)
    }

    /// Advances the simulation by one timestep.
    pub fn step(&mut self) {
        self.model.step();
    }

    /// Runs the configured number of timesteps.
    pub fn run(&mut self) {
        self.model.run();
    }

    /// Snapshot of the current floe field.
    pub fn snapshot(&self) -> FloeFieldSnapshot<F> {
        snapshot::capture(&self.model)
    }

    pub fn model(&self) -> &Model<F> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model<F> {
        &mut self.model
    }
}
