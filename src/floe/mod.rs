//! Floe entity: rigid polygonal ice plate with inertia, forcing state, and
//! collision bookkeeping.

pub mod factory;
pub mod interactions;
pub mod stress;

use serde::{Deserialize, Serialize};

pub use interactions::{Interaction, InteractionTable, DOMAIN_PARTNER, TOPOGRAPHY_PARTNER};
pub use stress::StressHistory;

use crate::config::StressCalculator;
use crate::geometry::Polygon;
use crate::utils::math::{FloeFloat, Mat2, Vec2};

/// Lifecycle state of a floe within a timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FloeStatus {
    #[default]
    Active,
    /// Dropped at the next compaction.
    Remove,
    /// Merged with its fuse partners at the next compaction.
    Fuse,
}

/// Rigid polygonal sea-ice floe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Floe<F> {
    // Geometry.
    pub polygon: Polygon<F>,
    pub centroid: Vec2<F>,
    pub area: F,
    /// Maximum vertex distance from the centroid.
    pub rmax: F,

    // Mass properties.
    pub height: F,
    pub mass: F,
    pub moment: F,

    // Kinematics.
    pub u: F,
    pub v: F,
    /// Angular velocity ξ.
    pub xi: F,
    /// Orientation α.
    pub alpha: F,

    // Previous-step derivatives for the second-order update.
    pub p_dxdt: F,
    pub p_dydt: F,
    pub p_dudt: F,
    pub p_dvdt: F,
    pub p_dxidt: F,
    pub p_dalphadt: F,

    // Sub-floe integration points, offsets from the centroid.
    pub x_subfloe_points: Vec<F>,
    pub y_subfloe_points: Vec<F>,

    // Ocean/atmosphere forcing.
    pub fx_oa: F,
    pub fy_oa: F,
    pub trq_oa: F,
    /// Ocean heat-flux factor sampled under the floe during coupling.
    pub hflx_factor: F,

    // Collision forcing.
    pub collision_force: Vec2<F>,
    pub collision_trq: F,
    pub interactions: InteractionTable<F>,
    /// Total overlap area with other floes this step.
    pub overarea: F,

    // Status.
    pub status: FloeStatus,
    pub fuse_partners: Vec<usize>,

    // Identity.
    pub id: u64,
    /// 0 for a real floe; ghosts carry their 1-based replica number.
    pub ghost_id: u32,
    pub parent_ids: Vec<u64>,
    /// Indices of this floe's ghost replicas in the floe list.
    pub ghosts: Vec<usize>,

    // Stress state.
    pub stress_accum: Mat2<F>,
    pub stress_history: StressHistory<F>,
    pub strain: Mat2<F>,
}

impl<F: FloeFloat> Floe<F> {
    /// Whether this floe is a real (non-ghost) entry in the floe list.
    pub fn is_real(&self) -> bool {
        self.ghost_id == 0
    }

    /// Velocity of the floe material at `point`, including rotation.
    pub fn velocity_at(&self, point: Vec2<F>) -> Vec2<F> {
        Vec2::new(
            self.u - self.xi * (point.y - self.centroid.y),
            self.v + self.xi * (point.x - self.centroid.x),
        )
    }

    /// Resets the per-step forcing accumulators.
    pub fn reset_forces(&mut self) {
        self.fx_oa = F::zero();
        self.fy_oa = F::zero();
        self.trq_oa = F::zero();
        self.collision_force = Vec2::zero();
        self.collision_trq = F::zero();
        self.interactions.clear();
        self.overarea = F::zero();
        self.fuse_partners.clear();
    }

    /// Replaces the floe geometry, recomputing centroid, area, rmax, mass
    /// and moment at the current height and the given ice density.
    pub fn set_polygon(&mut self, polygon: Polygon<F>, rho_i: F) {
        self.centroid = polygon.centroid();
        self.area = polygon.area();
        self.rmax = polygon.max_radius(self.centroid);
        self.mass = self.area * self.height * rho_i;
        self.moment = polygon.moment_of_inertia(rho_i * self.height);
        self.polygon = polygon;
    }

    /// Translates the floe rigidly.
    pub fn translate(&mut self, offset: Vec2<F>) {
        self.polygon = self.polygon.translate(offset);
        self.centroid += offset;
    }

    /// Deep-copies this floe as a periodic ghost replica.
    pub fn make_ghost(&self, translation: Vec2<F>, ghost_id: u32) -> Self {
        let mut ghost = self.clone();
        ghost.polygon = ghost.polygon.translate(translation);
        ghost.centroid += translation;
        ghost.ghost_id = ghost_id;
        ghost.ghosts = Vec::new();
        ghost.interactions = InteractionTable::new();
        ghost.collision_force = Vec2::zero();
        ghost.collision_trq = F::zero();
        ghost.overarea = F::zero();
        ghost
    }

    /// Per-step stress tensor from the accumulated interactions:
    /// the symmetrized force-moment sum over contact points, normalized by
    /// the floe volume.
    pub fn step_stress(&self) -> Mat2<F> {
        let mut m = Mat2::zero();
        for row in self.interactions.rows() {
            let force = Vec2::new(row.fx, row.fy);
            let arm = Vec2::new(row.px, row.py) - self.centroid;
            m += Mat2::outer(force, arm);
        }
        let volume = self.area * self.height;
        if volume > F::zero() {
            m.symmetric_part() * (F::one() / volume)
        } else {
            Mat2::zero()
        }
    }

    /// Pushes this step's stress into the history and refreshes the
    /// accumulated tensor under the given calculator policy.
    pub fn update_stress(&mut self, calculator: StressCalculator<F>) {
        let newest = self.step_stress();
        self.stress_history.push(newest);
        self.stress_accum = self
            .stress_history
            .accumulate(self.stress_accum, newest, calculator);
    }

    /// Strain rate of the rigid motion over the floe footprint, from the
    /// boundary line integral of the vertex velocity field.
    pub fn update_strain(&mut self) {
        let ring = self.polygon.exterior();
        let area = self.area;
        if area <= F::zero() {
            self.strain = Mat2::zero();
            return;
        }
        let half = F::lit(0.5);
        let mut dudx = F::zero();
        let mut dudy = F::zero();
        let mut dvdx = F::zero();
        let mut dvdy = F::zero();
        for w in ring.windows(2) {
            let va = self.velocity_at(w[0]);
            let vb = self.velocity_at(w[1]);
            let dx = w[1].x - w[0].x;
            let dy = w[1].y - w[0].y;
            dudx += (va.x + vb.x) * half * dy;
            dudy -= (va.x + vb.x) * half * dx;
            dvdx += (vb.y + va.y) * half * dy;
            dvdy -= (vb.y + va.y) * half * dx;
        }
        let inv_a = F::one() / area;
        let shear = (dudy + dvdx) * half * inv_a;
        self.strain = Mat2::new(dudx * inv_a, shear, shear, dvdy * inv_a);
    }
}
