//! Regular rectilinear grid and the Eulerian ocean/atmosphere fields
//! registered on it.
//!
//! Field matrices hold one value per grid-line node, `(nx+1) × (ny+1)`
//! row-major with the x index fastest. Every node also owns the mutable
//! per-step accumulators the coupling pass writes into: the list of floes
//! overlapping its cell and the reverse-stress sums. Those are guarded by
//! one lock per node so coupling workers can run fork-joined.

use log::warn;
use parking_lot::Mutex;

use crate::config::GridSpec;
use crate::error::Result;
use crate::geometry::Polygon;
use crate::utils::math::{FloeFloat, Vec2};

/// Reference to a floe overlapping a grid node's cell, with the periodic
/// translation that was applied to the floe polygon for that overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFloeRef<F> {
    pub floe_idx: usize,
    pub translation: Vec2<F>,
}

/// Per-node list of overlapping floes.
#[derive(Debug, Clone)]
pub struct CellFloes<F> {
    pub entries: Vec<CellFloeRef<F>>,
}

impl<F> Default for CellFloes<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: FloeFloat> CellFloes<F> {
    pub fn push(&mut self, floe_idx: usize, translation: Vec2<F>) {
        self.entries.push(CellFloeRef {
            floe_idx,
            translation,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Running reverse-stress sums for one contributing floe in one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStressEntry<F> {
    pub floe_idx: usize,
    pub tau_x: F,
    pub tau_y: F,
    pub npoints: usize,
}

/// Per-cell reverse stress onto the ocean, kept per contributing floe.
#[derive(Debug, Clone)]
pub struct IceStressCell<F> {
    pub entries: Vec<CellStressEntry<F>>,
}

impl<F> Default for IceStressCell<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<F: FloeFloat> IceStressCell<F> {
    /// Accumulates a stress contribution, merging with an existing entry
    /// for the same floe.
    pub fn add(&mut self, floe_idx: usize, tau_x: F, tau_y: F, npoints: usize) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.floe_idx == floe_idx)
        {
            entry.tau_x += tau_x;
            entry.tau_y += tau_y;
            entry.npoints += npoints;
        } else {
            self.entries.push(CellStressEntry {
                floe_idx,
                tau_x,
                tau_y,
                npoints,
            });
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Total stress over all contributing floes.
    pub fn totals(&self) -> (F, F, usize) {
        let mut tx = F::zero();
        let mut ty = F::zero();
        let mut np = 0;
        for e in &self.entries {
            tx += e.tau_x;
            ty += e.tau_y;
            np += e.npoints;
        }
        (tx, ty, np)
    }
}

/// Mutable per-node state written during the coupling pass.
#[derive(Debug)]
pub struct GridCell<F> {
    pub floes: CellFloes<F>,
    pub stress: IceStressCell<F>,
    /// Sea-ice area fraction accumulated this step, folded into the ocean
    /// field after the pass.
    pub si_frac: F,
}

impl<F: FloeFloat> Default for GridCell<F> {
    fn default() -> Self {
        Self {
            floes: CellFloes::default(),
            stress: IceStressCell::default(),
            si_frac: F::zero(),
        }
    }
}

/// Axis-aligned regular rectilinear grid.
pub struct Grid<F> {
    pub nx: usize,
    pub ny: usize,
    pub x0: F,
    pub xf: F,
    pub y0: F,
    pub yf: F,
    pub dx: F,
    pub dy: F,
    /// Grid lines, `nx + 1` values.
    pub xg: Vec<F>,
    /// Grid lines, `ny + 1` values.
    pub yg: Vec<F>,
    /// Cell centers, `nx` values.
    pub xc: Vec<F>,
    /// Cell centers, `ny` values.
    pub yc: Vec<F>,
    cells: Vec<Mutex<GridCell<F>>>,
}

impl<F: FloeFloat> Grid<F> {
    pub fn from_spec(spec: &GridSpec<F>) -> Result<Self> {
        let (nx, ny, dx, dy) = spec.resolve()?;
        let xg: Vec<F> = (0..=nx)
            .map(|i| spec.x0 + dx * F::from_usize(i).unwrap_or_else(F::zero))
            .collect();
        let yg: Vec<F> = (0..=ny)
            .map(|j| spec.y0 + dy * F::from_usize(j).unwrap_or_else(F::zero))
            .collect();
        let half = F::lit(0.5);
        let xc: Vec<F> = (0..nx).map(|i| xg[i] + dx * half).collect();
        let yc: Vec<F> = (0..ny).map(|j| yg[j] + dy * half).collect();
        let mut cells = Vec::with_capacity((nx + 1) * (ny + 1));
        for _ in 0..(nx + 1) * (ny + 1) {
            cells.push(Mutex::new(GridCell::default()));
        }
        Ok(Self {
            nx,
            ny,
            x0: spec.x0,
            xf: spec.xf,
            y0: spec.y0,
            yf: spec.yf,
            dx,
            dy,
            xg,
            yg,
            xc,
            yc,
            cells,
        })
    }

    /// Number of field nodes per axis pair, `(nx + 1) * (ny + 1)`.
    pub fn num_nodes(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    #[inline]
    pub fn node_index(&self, i: usize, j: usize) -> usize {
        j * (self.nx + 1) + i
    }

    /// Node position `(xg[i], yg[j])`.
    #[inline]
    pub fn node_point(&self, i: usize, j: usize) -> Vec2<F> {
        Vec2::new(self.xg[i], self.yg[j])
    }

    /// The cell registered to node `(i, j)`: a `dx × dy` box centered on
    /// the node, clamped to the grid extent.
    pub fn node_cell_polygon(&self, i: usize, j: usize) -> Option<Polygon<F>> {
        let half = F::lit(0.5);
        let p = self.node_point(i, j);
        let min = Vec2::new(
            (p.x - self.dx * half).max(self.x0),
            (p.y - self.dy * half).max(self.y0),
        );
        let max = Vec2::new(
            (p.x + self.dx * half).min(self.xf),
            (p.y + self.dy * half).min(self.yf),
        );
        Polygon::rectangle(min, max).ok()
    }

    /// Indices of nodes within `radius` of `center`.
    pub fn nodes_within(&self, center: Vec2<F>, radius: F) -> Vec<(usize, usize)> {
        let lo_i = ((center.x - radius - self.x0) / self.dx).floor();
        let hi_i = ((center.x + radius - self.x0) / self.dx).ceil();
        let lo_j = ((center.y - radius - self.y0) / self.dy).floor();
        let hi_j = ((center.y + radius - self.y0) / self.dy).ceil();
        let clamp = |v: F, n: usize| -> usize {
            if v <= F::zero() {
                0
            } else {
                v.to_usize().unwrap_or(0).min(n)
            }
        };
        let (lo_i, hi_i) = (clamp(lo_i, self.nx), clamp(hi_i, self.nx));
        let (lo_j, hi_j) = (clamp(lo_j, self.ny), clamp(hi_j, self.ny));
        let r2 = radius * radius;
        let mut out = Vec::new();
        for j in lo_j..=hi_j {
            for i in lo_i..=hi_i {
                if (self.node_point(i, j) - center).length_squared() <= r2 {
                    out.push((i, j));
                }
            }
        }
        out
    }

    /// Locked access to a node's per-step accumulators.
    pub fn cell(&self, idx: usize) -> parking_lot::MutexGuard<'_, GridCell<F>> {
        self.cells[idx].lock()
    }

    /// Clears every per-node accumulator. Called at the top of each step.
    pub fn clear_cells(&self) {
        for cell in &self.cells {
            let mut cell = cell.lock();
            cell.floes.clear();
            cell.stress.clear();
            cell.si_frac = F::zero();
        }
    }
}

/// Ocean state, one value per grid node.
#[derive(Debug, Clone)]
pub struct Ocean<F> {
    pub u: Vec<F>,
    pub v: Vec<F>,
    pub temp: Vec<F>,
    pub tau_x: Vec<F>,
    pub tau_y: Vec<F>,
    pub si_frac: Vec<F>,
    pub hflx_factor: Vec<F>,
    pub dissolved: Vec<F>,
}

impl<F: FloeFloat> Ocean<F> {
    /// Spatially uniform ocean.
    pub fn uniform(grid: &Grid<F>, u: F, v: F, temp: F) -> Self {
        let n = grid.num_nodes();
        let ocean = Self {
            u: vec![u; n],
            v: vec![v; n],
            temp: vec![temp; n],
            tau_x: vec![F::zero(); n],
            tau_y: vec![F::zero(); n],
            si_frac: vec![F::zero(); n],
            hflx_factor: vec![F::zero(); n],
            dissolved: vec![F::zero(); n],
        };
        ocean.check_freezing_range();
        ocean
    }

    fn check_freezing_range(&self) {
        let freeze_lo = F::lit(-1.8);
        let freeze_hi = F::zero();
        if self
            .temp
            .iter()
            .any(|t| *t < freeze_lo || *t > freeze_hi)
        {
            warn!(
                "ocean temperature outside the freezing range [{}, {}] at one or more nodes",
                freeze_lo, freeze_hi
            );
        }
    }

    /// Logs thermodynamic anomalies between the ocean and the atmosphere.
    pub fn validate_against(&self, atmos: &Atmos<F>) {
        let ocean_warmer = self
            .temp
            .iter()
            .zip(&atmos.temp)
            .any(|(o, a)| *o > *a);
        let atmos_warmer = self
            .temp
            .iter()
            .zip(&atmos.temp)
            .any(|(o, a)| *a > *o);
        if ocean_warmer {
            warn!("ocean warmer than atmosphere at one or more nodes; ice will melt from below");
        }
        if atmos_warmer {
            warn!("atmosphere warmer than ocean at one or more nodes; ice will melt from above");
        }
    }

    pub fn clear_si_frac(&mut self) {
        for v in &mut self.si_frac {
            *v = F::zero();
        }
    }
}

/// Atmosphere state, one value per grid node.
#[derive(Debug, Clone)]
pub struct Atmos<F> {
    pub u: Vec<F>,
    pub v: Vec<F>,
    pub temp: Vec<F>,
}

impl<F: FloeFloat> Atmos<F> {
    /// Spatially uniform atmosphere.
    pub fn uniform(grid: &Grid<F>, u: F, v: F, temp: F) -> Self {
        let n = grid.num_nodes();
        Self {
            u: vec![u; n],
            v: vec![v; n],
            temp: vec![temp; n],
        }
    }
}
