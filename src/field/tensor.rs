//! Symmetric 2×2 tensors and their closed-form eigen-decomposition.

use crate::model::Point;

/// Symmetric matrix `[[a, b], [b, c]]`.
///
/// For road fields the major eigenvector is the preferred travel direction
/// and the eigenvalue spread is the strength of that preference.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tensor {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// Eigenvalues (major ≥ minor) with the unit major eigenvector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eigen {
    pub major: f64,
    pub minor: f64,
    /// Sign is arbitrary: a direction field is a line field.
    pub major_dir: Point,
}

impl Eigen {
    pub fn minor_dir(&self) -> Point {
        self.major_dir.perp()
    }

    /// `major - minor`; zero for isotropic tensors (no preferred direction).
    pub fn anisotropy(&self) -> f64 {
        self.major - self.minor
    }
}

impl Tensor {
    pub const ZERO: Tensor = Tensor { a: 0.0, b: 0.0, c: 0.0 };

    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// `λ · I`.
    pub const fn isotropic(lambda: f64) -> Self {
        Self::new(lambda, 0.0, lambda)
    }

    /// Tensor with eigenvalue `major` along `angle` (radians) and `minor`
    /// perpendicular to it.
    pub fn from_angle(angle: f64, major: f64, minor: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(
            major * c * c + minor * s * s,
            (major - minor) * s * c,
            major * s * s + minor * c * c,
        )
    }

    /// Like [`from_angle`](Self::from_angle) for a direction vector. A zero
    /// vector yields the isotropic tensor `minor · I`.
    pub fn from_direction(dir: Point, major: f64, minor: f64) -> Self {
        match dir.normalized() {
            Some(d) => Self::from_angle(d.y.atan2(d.x), major, minor),
            None => Self::isotropic(minor),
        }
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.a * k, self.b * k, self.c * k)
    }

    pub fn trace(self) -> f64 {
        self.a + self.c
    }

    /// Frobenius norm.
    pub fn norm(self) -> f64 {
        (self.a * self.a + 2.0 * self.b * self.b + self.c * self.c).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }

    pub fn eigen(self) -> Eigen {
        let mean = 0.5 * (self.a + self.c);
        let half_diff = 0.5 * (self.a - self.c);
        let radius = half_diff.hypot(self.b);
        let angle = 0.5 * (2.0 * self.b).atan2(self.a - self.c);
        let (s, c) = angle.sin_cos();
        Eigen {
            major: mean + radius,
            minor: mean - radius,
            major_dir: Point::new(c, s),
        }
    }

    /// Clips both eigenvalues to `[lo, hi]` and reconstructs.
    pub fn clamp_eigen(self, lo: f64, hi: f64) -> Self {
        let e = self.eigen();
        let angle = e.major_dir.y.atan2(e.major_dir.x);
        Self::from_angle(angle, e.major.clamp(lo, hi), e.minor.clamp(lo, hi))
    }
}

impl std::ops::Add for Tensor {
    type Output = Tensor;
    fn add(self, o: Tensor) -> Tensor {
        Tensor::new(self.a + o.a, self.b + o.b, self.c + o.c)
    }
}

impl std::ops::AddAssign for Tensor {
    fn add_assign(&mut self, o: Tensor) {
        *self = *self + o;
    }
}

impl std::iter::Sum for Tensor {
    fn sum<I: Iterator<Item = Tensor>>(iter: I) -> Tensor {
        iter.fold(Tensor::ZERO, |acc, t| acc + t)
    }
}
