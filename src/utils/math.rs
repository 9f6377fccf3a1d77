//! Generic 2-D vector and tensor math for the model.
//!
//! All geometry and physics are generic over [`FloeFloat`] so a simulation
//! can run in single or double precision without touching the model code.

use std::fmt::{Debug, Display};
use std::iter::Sum;

use num_traits::{Float, FromPrimitive, NumAssignOps};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Floating-point scalar carried through every geometric and physical
/// quantity in the model.
pub trait FloeFloat:
    Float
    + FromPrimitive
    + NumAssignOps
    + Sum
    + Debug
    + Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Converts an `f64` literal into the working precision.
    fn lit(v: f64) -> Self;
}

impl FloeFloat for f32 {
    #[inline]
    fn lit(v: f64) -> Self {
        v as f32
    }
}

impl FloeFloat for f64 {
    #[inline]
    fn lit(v: f64) -> Self {
        v
    }
}

/// 2-D vector in the working precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2<F> {
    pub x: F,
    pub y: F,
}

impl<F: FloeFloat> Vec2<F> {
    #[inline]
    pub fn new(x: F, y: F) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn zero() -> Self {
        Self {
            x: F::zero(),
            y: F::zero(),
        }
    }

    #[inline]
    pub fn splat(v: F) -> Self {
        Self { x: v, y: v }
    }

    #[inline]
    pub fn dot(self, other: Self) -> F {
        self.x * other.x + self.y * other.y
    }

    /// 2-D cross product (z-component of the 3-D cross).
    #[inline]
    pub fn cross(self, other: Self) -> F {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn length_squared(self) -> F {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> F {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance(self, other: Self) -> F {
        (self - other).length()
    }

    /// Counter-clockwise perpendicular.
    #[inline]
    pub fn perp(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > F::zero() {
            self / len
        } else {
            Self::zero()
        }
    }

    /// Rotates the vector by `angle` radians about the origin.
    pub fn rotate(self, angle: F) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    #[inline]
    pub fn min_by_component(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
        }
    }

    #[inline]
    pub fn max_by_component(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
        }
    }
}

impl<F: FloeFloat> std::ops::Add for Vec2<F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<F: FloeFloat> std::ops::Sub for Vec2<F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl<F: FloeFloat> std::ops::Neg for Vec2<F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl<F: FloeFloat> std::ops::Mul<F> for Vec2<F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: F) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl<F: FloeFloat> std::ops::Div<F> for Vec2<F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: F) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl<F: FloeFloat> std::ops::AddAssign for Vec2<F> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<F: FloeFloat> std::ops::SubAssign for Vec2<F> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// 2×2 tensor, row-major. Used for per-floe stress and strain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat2<F> {
    pub xx: F,
    pub xy: F,
    pub yx: F,
    pub yy: F,
}

impl<F: FloeFloat> Mat2<F> {
    #[inline]
    pub fn new(xx: F, xy: F, yx: F, yy: F) -> Self {
        Self { xx, xy, yx, yy }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::new(F::zero(), F::zero(), F::zero(), F::zero())
    }

    /// Outer product `a ⊗ b`.
    pub fn outer(a: Vec2<F>, b: Vec2<F>) -> Self {
        Self::new(a.x * b.x, a.x * b.y, a.y * b.x, a.y * b.y)
    }

    #[inline]
    pub fn trace(self) -> F {
        self.xx + self.yy
    }

    pub fn transpose(self) -> Self {
        Self::new(self.xx, self.yx, self.xy, self.yy)
    }

    /// Symmetric part `(M + Mᵀ)/2`.
    pub fn symmetric_part(self) -> Self {
        let half = F::lit(0.5);
        Self::new(
            self.xx,
            (self.xy + self.yx) * half,
            (self.xy + self.yx) * half,
            self.yy,
        )
    }

    /// Eigenvalues of the symmetric part, largest first.
    ///
    /// The stress tensors pushed by the collision engine are symmetrized, so
    /// this is exact for them.
    pub fn principal_values(self) -> (F, F) {
        let half = F::lit(0.5);
        let m = self.symmetric_part();
        let mean = (m.xx + m.yy) * half;
        let diff = (m.xx - m.yy) * half;
        let radius = (diff * diff + m.xy * m.xy).sqrt();
        (mean + radius, mean - radius)
    }
}

impl<F: FloeFloat> std::ops::Add for Mat2<F> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.xx + rhs.xx,
            self.xy + rhs.xy,
            self.yx + rhs.yx,
            self.yy + rhs.yy,
        )
    }
}

impl<F: FloeFloat> std::ops::Sub for Mat2<F> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.xx - rhs.xx,
            self.xy - rhs.xy,
            self.yx - rhs.yx,
            self.yy - rhs.yy,
        )
    }
}

impl<F: FloeFloat> std::ops::Mul<F> for Mat2<F> {
    type Output = Self;
    fn mul(self, rhs: F) -> Self {
        Self::new(self.xx * rhs, self.xy * rhs, self.yx * rhs, self.yy * rhs)
    }
}

impl<F: FloeFloat> std::ops::AddAssign for Mat2<F> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: FloeFloat> std::ops::SubAssign for Mat2<F> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
