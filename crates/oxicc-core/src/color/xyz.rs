//! PCS XYZ
//!
//! Tristimulus values relative to the D50 PCS illuminant, with the media
//! white at Y = 1.

/// CIE 1931 tristimulus values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// PCS illuminant as the header encodes it
pub const D50: Xyz = Xyz::new(0.9642, 1.0, 0.8249);

/// Daylight white of sRGB, Display P3, Adobe RGB and BT.2020
pub const D65: Xyz = Xyz::new(0.95047, 1.0, 1.08883);

impl Xyz {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn from_array([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Point with chromaticity (x, y) and luminance `luminance`.
    /// A zero y has no defined XYZ and gives black.
    pub fn from_xyy(x: f64, y: f64, luminance: f64) -> Self {
        if y <= 0.0 {
            return Self::default();
        }
        let k = luminance / y;
        Self::new(x * k, luminance, (1.0 - x - y) * k)
    }

    /// Chromaticity (x, y); `None` for black
    pub fn chromaticity(self) -> Option<(f64, f64)> {
        let sum = self.x + self.y + self.z;
        (sum > 0.0).then(|| (self.x / sum, self.y / sum))
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    /// Per-channel ratio, with 0 where the divisor is 0
    pub fn div_components(&self, divisor: &Self) -> Self {
        let ratio = |a: f64, b: f64| if b == 0.0 { 0.0 } else { a / b };
        Self::new(
            ratio(self.x, divisor.x),
            ratio(self.y, divisor.y),
            ratio(self.z, divisor.z),
        )
    }

    /// Every channel within `tolerance`
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array())
            .all(|(a, b)| (a - b).abs() < tolerance)
    }
}

impl From<[f64; 3]> for Xyz {
    fn from(v: [f64; 3]) -> Self {
        Self::from_array(v)
    }
}

impl From<Xyz> for [f64; 3] {
    fn from(xyz: Xyz) -> Self {
        xyz.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d65_chromaticity() {
        let (x, y) = D65.chromaticity().unwrap();
        assert!((x - 0.3127).abs() < 5e-4, "{x}");
        assert!((y - 0.3290).abs() < 5e-4, "{y}");
        assert!(Xyz::from_xyy(x, y, 1.0).approx_eq(&D65, 1e-12));
    }

    #[test]
    fn test_black_has_no_chromaticity() {
        assert_eq!(Xyz::default().chromaticity(), None);
        assert_eq!(Xyz::from_xyy(0.3, 0.0, 1.0), Xyz::default());
    }

    #[test]
    fn test_ratio_to_d50() {
        let media = Xyz::new(0.9642 * 0.5, 0.98, 0.0);
        let ratio = media.div_components(&D50);
        assert!(ratio.approx_eq(&Xyz::new(0.5, 0.98, 0.0), 1e-12));
        assert_eq!(D50.div_components(&Xyz::default()), Xyz::default());
        assert!(D50.scale(0.5).approx_eq(&Xyz::new(0.4821, 0.5, 0.41245), 1e-12));
    }
}
