//! Bradford chromatic adaptation
//!
//! ICC.1:2022 Annex E recommends the linearized Bradford transform for
//! adapting device white points to the D50 PCS; the result is what a
//! v4 `chad` tag stores.

use crate::color::Xyz;
use crate::math::Matrix3x3;

/// Bradford matrix: XYZ -> LMS (cone response)
const BRADFORD_XYZ_TO_LMS: Matrix3x3 = Matrix3x3::new([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

/// Adaptation matrix taking colors seen under `src_white` to `dst_white`.
///
/// `XYZ_dst = M x XYZ_src`
pub fn bradford_adaptation(src_white: Xyz, dst_white: Xyz) -> Matrix3x3 {
    let Some(lms_to_xyz) = BRADFORD_XYZ_TO_LMS.inverse() else {
        return Matrix3x3::identity();
    };
    let src = BRADFORD_XYZ_TO_LMS.multiply_vec(src_white.to_array());
    let dst = BRADFORD_XYZ_TO_LMS.multiply_vec(dst_white.to_array());
    let ratio = |i: usize| {
        if src[i].abs() > 1e-10 {
            dst[i] / src[i]
        } else {
            1.0
        }
    };
    let scale = Matrix3x3::diagonal(ratio(0), ratio(1), ratio(2));

    // M = M_A^-1 x Scale x M_A
    lms_to_xyz.multiply(&scale.multiply(&BRADFORD_XYZ_TO_LMS))
}
