//! Serializable records for the persisted floe-field snapshot and the
//! initial simulation state. This is the read/write contract with output,
//! plotting, and diagnostic consumers; the file format is theirs.

use serde::{Deserialize, Serialize};

use crate::config::{
    CollisionSettings, Constants, FloeSettings, FractureSettings, GridSpec, SimulationSettings,
};
use crate::domain::Domain;
use crate::floe::Floe;
use crate::simulation::Model;
use crate::utils::math::{FloeFloat, Mat2};

/// Per-floe record as persisted each snapshot timestep.
///
/// Records with `ghost_id > 0` are periodic replicas and must be filtered
/// when analyzing conservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloeRecord<F> {
    pub centroid: (F, F),
    /// Closed exterior ring of the floe polygon.
    pub coords: Vec<(F, F)>,
    pub mass: F,
    pub moment: F,
    pub u: F,
    pub v: F,
    pub xi: F,
    pub ghost_id: u32,
    pub id: u64,
    pub parent_ids: Vec<u64>,
    pub stress_accum: Mat2<F>,
    pub strain: Mat2<F>,
    pub area: F,
    pub height: F,
}

impl<F: FloeFloat> From<&Floe<F>> for FloeRecord<F> {
    fn from(floe: &Floe<F>) -> Self {
        Self {
            centroid: (floe.centroid.x, floe.centroid.y),
            coords: floe
                .polygon
                .exterior()
                .iter()
                .map(|p| (p.x, p.y))
                .collect(),
            mass: floe.mass,
            moment: floe.moment,
            u: floe.u,
            v: floe.v,
            xi: floe.xi,
            ghost_id: floe.ghost_id,
            id: floe.id,
            parent_ids: floe.parent_ids.clone(),
            stress_accum: floe.stress_accum,
            strain: floe.strain,
            area: floe.area,
            height: floe.height,
        }
    }
}

/// Floe-field snapshot keyed by timestep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloeFieldSnapshot<F> {
    pub timestep: usize,
    pub floes: Vec<FloeRecord<F>>,
}

/// Captures the current floe field of a model.
pub fn capture<F: FloeFloat>(model: &Model<F>) -> FloeFieldSnapshot<F> {
    FloeFieldSnapshot {
        timestep: model.timestep(),
        floes: model.floes.iter().map(FloeRecord::from).collect(),
    }
}

/// Full simulation configuration plus the initial floe list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "F: FloeFloat"))]
pub struct InitialState<F> {
    pub grid: GridSpec<F>,
    pub domain: Domain<F>,
    pub constants: Constants<F>,
    pub floe_settings: FloeSettings<F>,
    pub fracture_settings: FractureSettings<F>,
    pub collision_settings: CollisionSettings<F>,
    pub simulation_settings: SimulationSettings<F>,
    pub floes: Vec<FloeRecord<F>>,
}

/// Captures the model configuration and current floes as an initial state.
pub fn initial_state<F: FloeFloat>(model: &Model<F>) -> InitialState<F> {
    InitialState {
        grid: *model.grid_spec(),
        domain: model.domain.clone(),
        constants: model.consts,
        floe_settings: model.floe_settings,
        fracture_settings: model.fracture_settings.clone(),
        collision_settings: model.collision_settings,
        simulation_settings: model.sim_settings,
        floes: model
            .floes
            .iter()
            .filter(|f| f.is_real())
            .map(FloeRecord::from)
            .collect(),
    }
}
