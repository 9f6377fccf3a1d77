//! Yield criteria in principal-stress space.

use crate::config::FractureCriteria;
use crate::error::{Result, SubzeroError};
use crate::geometry::{Containment, Polygon};
use crate::utils::math::{FloeFloat, Mat2, Vec2};

/// Number of parameter samples used to polygonize the Hibler ellipse.
const HIBLER_SAMPLES: usize = 100;

/// Hibler-style elliptical yield curve, polygonized.
///
/// The ellipse has semi-axes `p/√2` and `p/(2√2)` along the axes rotated
/// 45° in principal-stress space, centered at `(−p/2, −p/2)`, with
/// `p = p* · h_mean · exp(−c (1 − compactness))`.
#[derive(Debug, Clone)]
pub struct HiblerYieldCurve<F> {
    pub pstar: F,
    pub c: F,
    pub polygon: Polygon<F>,
}

impl<F: FloeFloat> HiblerYieldCurve<F> {
    pub fn new(pstar: F, c: F, mean_height: F, compactness: F) -> Result<Self> {
        if pstar <= F::zero() {
            return Err(SubzeroError::ArgumentOutOfRange(
                "p* must be positive".into(),
            ));
        }
        let polygon = hibler_polygon(pstar, c, mean_height, compactness)?;
        Ok(Self { pstar, c, polygon })
    }

    /// Rebuilds the curve from current fleet statistics.
    pub fn update(&mut self, mean_height: F, compactness: F) -> Result<()> {
        self.polygon = hibler_polygon(self.pstar, self.c, mean_height, compactness)?;
        Ok(())
    }
}

fn hibler_polygon<F: FloeFloat>(
    pstar: F,
    c: F,
    mean_height: F,
    compactness: F,
) -> Result<Polygon<F>> {
    let p = pstar * mean_height * (-c * (F::one() - compactness)).exp();
    let a = p * F::lit(std::f64::consts::SQRT_2 / 2.0);
    let b = a * F::lit(0.5);
    let (sin45, cos45) = F::lit(std::f64::consts::FRAC_PI_4).sin_cos();
    let center = -p * F::lit(0.5);
    let step = F::lit(std::f64::consts::TAU) / F::from_usize(HIBLER_SAMPLES - 1).unwrap_or_else(F::one);
    let mut ring = Vec::with_capacity(HIBLER_SAMPLES);
    for i in 0..HIBLER_SAMPLES {
        let t = step * F::from_usize(i).unwrap_or_else(F::zero);
        let x = a * t.cos();
        let y = b * t.sin();
        ring.push(Vec2::new(
            x * cos45 - y * sin45 + center,
            x * sin45 + y * cos45 + center,
        ));
    }
    Polygon::from_ring(ring)
}

/// Runtime yield criteria, built from the configured variant.
#[derive(Debug, Clone)]
pub enum YieldCriteria<F> {
    None,
    Hibler(HiblerYieldCurve<F>),
    Custom(Polygon<F>),
}

impl<F: FloeFloat> YieldCriteria<F> {
    /// Instantiates the configured criteria with initial fleet statistics.
    pub fn from_settings(
        criteria: &FractureCriteria<F>,
        mean_height: F,
        compactness: F,
    ) -> Result<Self> {
        Ok(match criteria {
            FractureCriteria::None => Self::None,
            FractureCriteria::Hibler { pstar, c } => {
                Self::Hibler(HiblerYieldCurve::new(*pstar, *c, mean_height, compactness)?)
            }
            FractureCriteria::Custom { vertices } => {
                let ring = vertices.iter().map(|(x, y)| Vec2::new(*x, *y)).collect();
                Self::Custom(Polygon::from_ring(ring)?)
            }
        })
    }

    /// Rebuilds state-dependent curves from current fleet statistics.
    pub fn update(&mut self, mean_height: F, compactness: F) -> Result<()> {
        if let Self::Hibler(curve) = self {
            curve.update(mean_height, compactness)?;
        }
        Ok(())
    }

    /// Whether a stress tensor's principal point falls outside the yield
    /// region (i.e. the floe fails).
    pub fn fails(&self, stress: Mat2<F>) -> bool {
        let curve = match self {
            Self::None => return false,
            Self::Hibler(h) => &h.polygon,
            Self::Custom(p) => p,
        };
        let (sigma1, sigma2) = stress.principal_values();
        curve.contains(Vec2::new(sigma1, sigma2)) == Containment::Outside
    }
}
