//! 3x3 matrices for colorants and chromatic adaptation
//!
//! Profiles store s15Fixed16 coefficients; everything here is f64.

use std::ops::{Index, Mul};

use crate::color::Xyz;

/// Determinants below this are treated as singular
const SINGULAR_EPSILON: f64 = 1e-12;

type Vec3 = [f64; 3];

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Row-major: `m[row][col]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3x3 {
    pub m: [Vec3; 3],
}

impl Matrix3x3 {
    pub const fn new(m: [Vec3; 3]) -> Self {
        Self { m }
    }

    pub const fn identity() -> Self {
        Self::diagonal(1.0, 1.0, 1.0)
    }

    pub const fn diagonal(d0: f64, d1: f64, d2: f64) -> Self {
        Self::new([[d0, 0.0, 0.0], [0.0, d1, 0.0], [0.0, 0.0, d2]])
    }

    /// Columns are the rXYZ, gXYZ and bXYZ colorants
    pub fn from_columns(c0: Xyz, c1: Xyz, c2: Xyz) -> Self {
        Self::new([c0.to_array(), c1.to_array(), c2.to_array()]).transpose()
    }

    pub fn column(&self, i: usize) -> Xyz {
        Xyz::from_array(self.m.map(|row| row[i]))
    }

    pub fn transpose(&self) -> Self {
        Self::new([0, 1, 2].map(|c| self.m.map(|row| row[c])))
    }

    #[inline]
    pub fn multiply_vec(&self, v: Vec3) -> Vec3 {
        self.m.map(|row| dot(row, v))
    }

    /// `self * other`
    pub fn multiply(&self, other: &Self) -> Self {
        let columns = other.transpose();
        Self::new(self.m.map(|row| columns.m.map(|col| dot(row, col))))
    }

    pub fn determinant(&self) -> f64 {
        dot(self.m[0], cross(self.m[1], self.m[2]))
    }

    /// `None` when singular
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let [r0, r1, r2] = self.m;
        // Columns of the inverse are the row cross products over det
        let adjugate_t = Self::new([cross(r1, r2), cross(r2, r0), cross(r0, r1)]);
        Some(Self::new(adjugate_t.transpose().m.map(|row| row.map(|v| v / det))))
    }

    /// RGB to XYZ for xy primaries, scaled so RGB (1, 1, 1) lands on `white`
    pub fn from_primaries(primaries: [(f64, f64); 3], white: Xyz) -> Option<Self> {
        let [r, g, b] = primaries.map(|(x, y)| Xyz::from_xyy(x, y, 1.0));
        let s = Self::from_columns(r, g, b)
            .inverse()?
            .multiply_vec(white.to_array());
        Some(Self::from_columns(r.scale(s[0]), g.scale(s[1]), b.scale(s[2])))
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.approx_eq(&Self::identity(), epsilon)
    }
}

impl Default for Matrix3x3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Index<usize> for Matrix3x3 {
    type Output = Vec3;

    fn index(&self, row: usize) -> &Vec3 {
        &self.m[row]
    }
}

impl Mul for Matrix3x3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl Mul<Vec3> for Matrix3x3 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        self.multiply_vec(rhs)
    }
}
