//! CIELAB relative to the D50 PCS white

use super::xyz::{D50, Xyz};

/// 6/29, where the cube root hands over to the linear segment
const EPSILON_ROOT: f64 = 6.0 / 29.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    /// L* in 0..=100
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.l, self.a, self.b]
    }

    pub fn from_xyz(xyz: Xyz) -> Self {
        let [fx, fy, fz] = [xyz.x / D50.x, xyz.y, xyz.z / D50.z].map(f);
        Self::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
    }

    pub fn to_xyz(self) -> Xyz {
        let fy = (self.l + 16.0) / 116.0;
        let [x, y, z] = [fy + self.a / 500.0, fy, fy - self.b / 200.0].map(f_inv);
        Xyz::new(x * D50.x, y, z * D50.z)
    }
}

/// L* of a relative luminance
pub fn lightness(y: f64) -> f64 {
    116.0 * f(y) - 16.0
}

fn f(t: f64) -> f64 {
    if t > EPSILON_ROOT.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * EPSILON_ROOT * EPSILON_ROOT) + 4.0 / 29.0
    }
}

fn f_inv(t: f64) -> f64 {
    if t > EPSILON_ROOT {
        t.powi(3)
    } else {
        3.0 * EPSILON_ROOT * EPSILON_ROOT * (t - 4.0 / 29.0)
    }
}
