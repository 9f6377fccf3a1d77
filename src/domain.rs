//! Domain walls and immovable topography.
//!
//! The four walls are a tagged variant dispatched with a small match at the
//! boundary-interaction call sites; there is no boundary trait hierarchy.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubzeroError};
use crate::geometry::Polygon;
use crate::grid::Grid;
use crate::utils::math::{FloeFloat, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// Wall behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryKind<F> {
    /// Floes crossing the wall are removed.
    Open,
    /// Paired with the opposite wall; floes wrap around.
    Periodic,
    /// Rigid wall floes collide with.
    Collision,
    /// Rigid wall with a velocity; translates between timesteps.
    Moving { u: F, v: F },
}

impl<F: FloeFloat> BoundaryKind<F> {
    pub fn is_periodic(&self) -> bool {
        matches!(self, BoundaryKind::Periodic)
    }

    /// Wall velocity; zero for non-moving walls.
    pub fn velocity(&self) -> Vec2<F> {
        match self {
            BoundaryKind::Moving { u, v } => Vec2::new(*u, *v),
            _ => Vec2::zero(),
        }
    }
}

/// One domain wall: kind, edge coordinate, and the bounding-box polygon
/// extending away from the domain interior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundary<F> {
    pub direction: Direction,
    pub kind: BoundaryKind<F>,
    /// Edge coordinate: y for north/south, x for east/west.
    pub val: F,
    pub poly: Polygon<F>,
}

impl<F: FloeFloat> Boundary<F> {
    /// Builds a wall along one edge of the grid.
    pub fn new(direction: Direction, kind: BoundaryKind<F>, grid: &Grid<F>) -> Result<Self> {
        let pad = (grid.xf - grid.x0).max(grid.yf - grid.y0);
        let (val, min, max) = match direction {
            Direction::North => (
                grid.yf,
                Vec2::new(grid.x0 - pad, grid.yf),
                Vec2::new(grid.xf + pad, grid.yf + pad),
            ),
            Direction::South => (
                grid.y0,
                Vec2::new(grid.x0 - pad, grid.y0 - pad),
                Vec2::new(grid.xf + pad, grid.y0),
            ),
            Direction::East => (
                grid.xf,
                Vec2::new(grid.xf, grid.y0 - pad),
                Vec2::new(grid.xf + pad, grid.yf + pad),
            ),
            Direction::West => (
                grid.x0,
                Vec2::new(grid.x0 - pad, grid.y0 - pad),
                Vec2::new(grid.x0, grid.yf + pad),
            ),
        };
        Ok(Self {
            direction,
            kind,
            val,
            poly: Polygon::rectangle(min, max)?,
        })
    }

    /// Advances a moving wall by one timestep; other kinds are unchanged.
    pub fn advance(&mut self, dt: F) {
        let vel = self.kind.velocity();
        if vel == Vec2::zero() {
            return;
        }
        self.poly = self.poly.translate(vel * dt);
        self.val += match self.direction {
            Direction::North | Direction::South => vel.y * dt,
            Direction::East | Direction::West => vel.x * dt,
        };
    }

    /// Unit tangent along the wall face.
    pub fn tangent(&self) -> Vec2<F> {
        match self.direction {
            Direction::North | Direction::South => Vec2::new(F::one(), F::zero()),
            Direction::East | Direction::West => Vec2::new(F::zero(), F::one()),
        }
    }
}

/// Immovable, unbreakable grounded feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopographyElement<F> {
    pub polygon: Polygon<F>,
    pub centroid: Vec2<F>,
    pub rmax: F,
}

impl<F: FloeFloat> TopographyElement<F> {
    pub fn new(polygon: Polygon<F>) -> Result<Self> {
        let polygon = polygon.remove_holes();
        let centroid = polygon.centroid();
        let rmax = polygon.max_radius(centroid);
        if rmax <= F::zero() {
            return Err(SubzeroError::ArgumentOutOfRange(
                "topography element has zero radius".into(),
            ));
        }
        Ok(Self {
            polygon,
            centroid,
            rmax,
        })
    }
}

/// The four walls plus topography.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain<F> {
    pub north: Boundary<F>,
    pub south: Boundary<F>,
    pub east: Boundary<F>,
    pub west: Boundary<F>,
    pub topography: Vec<TopographyElement<F>>,
}

impl<F: FloeFloat> Domain<F> {
    pub fn new(
        north: Boundary<F>,
        south: Boundary<F>,
        east: Boundary<F>,
        west: Boundary<F>,
    ) -> Result<Self> {
        if north.direction != Direction::North
            || south.direction != Direction::South
            || east.direction != Direction::East
            || west.direction != Direction::West
        {
            return Err(SubzeroError::DomainInvariant(
                "boundary directions do not match their domain slots".into(),
            ));
        }
        if north.val <= south.val || east.val <= west.val {
            return Err(SubzeroError::DomainInvariant(
                "domain bounds are inverted or empty".into(),
            ));
        }
        if north.kind.is_periodic() != south.kind.is_periodic() {
            return Err(SubzeroError::DomainInvariant(
                "north and south walls must share periodicity".into(),
            ));
        }
        if east.kind.is_periodic() != west.kind.is_periodic() {
            return Err(SubzeroError::DomainInvariant(
                "east and west walls must share periodicity".into(),
            ));
        }
        Ok(Self {
            north,
            south,
            east,
            west,
            topography: Vec::new(),
        })
    }

    pub fn with_topography(mut self, topography: Vec<TopographyElement<F>>) -> Self {
        self.topography = topography;
        self
    }

    pub fn width(&self) -> F {
        self.east.val - self.west.val
    }

    pub fn height(&self) -> F {
        self.north.val - self.south.val
    }

    pub fn east_west_periodic(&self) -> bool {
        self.east.kind.is_periodic()
    }

    pub fn north_south_periodic(&self) -> bool {
        self.north.kind.is_periodic()
    }

    /// Whether a point lies inside the domain box.
    pub fn contains(&self, p: Vec2<F>) -> bool {
        p.x >= self.west.val && p.x <= self.east.val && p.y >= self.south.val && p.y <= self.north.val
    }

    /// Advances moving walls by one timestep.
    pub fn advance_walls(&mut self, dt: F) {
        self.north.advance(dt);
        self.south.advance(dt);
        self.east.advance(dt);
        self.west.advance(dt);
    }

    pub fn walls(&self) -> [&Boundary<F>; 4] {
        [&self.north, &self.south, &self.east, &self.west]
    }
}
