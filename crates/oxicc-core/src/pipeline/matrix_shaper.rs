//! Matrix-shaper stages
//!
//! Matrix-shaper profiles (sRGB, Display P3, ...) carry one tone curve per
//! channel and a 3x3 colorant matrix whose columns are the D50-adapted
//! rXYZ/gXYZ/bXYZ tags.
//!
//! Device -> PCS: TRC decode, then matrix to XYZ.
//! PCS -> Device: inverse matrix, then TRC encode.

use crate::error::{Error, Result};
use crate::icc::{Curve, TagSignature};
use crate::math::Matrix3x3;
use crate::profile::Profile;

/// One direction of a matrix-shaper profile
#[derive(Debug, Clone)]
pub(crate) struct MatrixShaper {
    curves: [Curve; 3],
    matrix: Matrix3x3,
    inverse: bool,
}

impl MatrixShaper {
    fn curves(profile: &Profile) -> Result<[Curve; 3]> {
        Ok([
            profile.curve(TagSignature::RED_TRC)?,
            profile.curve(TagSignature::GREEN_TRC)?,
            profile.curve(TagSignature::BLUE_TRC)?,
        ])
    }

    /// RGB -> XYZ
    pub(crate) fn forward(profile: &Profile) -> Result<Self> {
        Ok(Self {
            curves: Self::curves(profile)?,
            matrix: profile.colorant_matrix()?,
            inverse: false,
        })
    }

    /// XYZ -> RGB; fails when the colorant matrix cannot be inverted
    pub(crate) fn inverse(profile: &Profile) -> Result<Self> {
        let curves = Self::curves(profile)?;
        let matrix = profile.colorant_matrix()?.inverse().ok_or_else(|| {
            Error::IncompatibleChain("colorant matrix is singular and cannot be inverted".into())
        })?;
        Ok(Self {
            curves,
            matrix,
            inverse: true,
        })
    }

    #[inline]
    pub(crate) fn eval(&self, input: &[f64], out: &mut [f64]) {
        let v = [input[0], input[1], input[2]];
        if self.inverse {
            let linear = self.matrix.multiply_vec(v);
            for ((o, curve), x) in out.iter_mut().zip(&self.curves).zip(linear) {
                *o = curve.eval_inverse(x);
            }
        } else {
            let linear = [
                self.curves[0].eval(v[0]),
                self.curves[1].eval(v[1]),
                self.curves[2].eval(v[2]),
            ];
            out[..3].copy_from_slice(&self.matrix.multiply_vec(linear));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::StandardProfile;

    #[test]
    fn test_white_maps_to_d50() {
        let p = StandardProfile::Srgb.to_profile().unwrap();
        let fwd = MatrixShaper::forward(&p).unwrap();
        let mut xyz = [0.0; 3];
        fwd.eval(&[1.0, 1.0, 1.0], &mut xyz);
        assert!((xyz[0] - 0.9642).abs() < 1e-3);
        assert!((xyz[1] - 1.0).abs() < 1e-3);
        assert!((xyz[2] - 0.8249).abs() < 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let p = StandardProfile::AdobeRgb.to_profile().unwrap();
        let fwd = MatrixShaper::forward(&p).unwrap();
        let inv = MatrixShaper::inverse(&p).unwrap();

        for rgb in [[0.2, 0.5, 0.8], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.7, 0.7, 0.7]] {
            let mut xyz = [0.0; 3];
            let mut back = [0.0; 3];
            fwd.eval(&rgb, &mut xyz);
            inv.eval(&xyz, &mut back);
            for c in 0..3 {
                assert!((back[c] - rgb[c]).abs() < 1e-6, "{rgb:?} -> {back:?}");
            }
        }
    }
}
