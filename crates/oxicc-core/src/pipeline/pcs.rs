//! PCS encodings and conversions
//!
//! Stages pass PCS values around as floats: XYZ relative to D50 with white
//! at Y = 1, Lab as L* in 0..100 and a*, b* around zero. LUT elements work
//! on normalized integer encodings instead, converted at the LUT edge.

use crate::color::{Lab, Xyz};
use crate::icc::ColorSpace;

/// u1Fixed15 XYZ: 0x8000 is 1.0
const XYZ_ENCODED_MAX: f64 = 65535.0 / 32768.0;
/// v2 16-bit Lab: 0xFF00 is L* 100 and a*/b* 0 sit at 0x8000
const LAB_V2_L_MAX: f64 = 100.0 * 65535.0 / 65280.0;
const LAB_V2_AB_MAX: f64 = 65535.0 / 256.0;

/// How a LUT stores PCS values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PcsEncoding {
    Xyz,
    /// `mft2` Lab, kept from ICC v2
    LabV2,
    /// Lab for `mft1`, `mAB ` and `mBA `
    LabV4,
}

impl PcsEncoding {
    /// Encoding of a LUT boundary, or `None` for device data
    pub(crate) fn for_lut(space: ColorSpace, legacy16: bool) -> Option<Self> {
        match space {
            ColorSpace::Xyz => Some(Self::Xyz),
            ColorSpace::Lab if legacy16 => Some(Self::LabV2),
            ColorSpace::Lab => Some(Self::LabV4),
            _ => None,
        }
    }

    /// Normalized LUT values -> PCS floats
    pub(crate) fn decode(self, v: &[f64], out: &mut [f64]) {
        match self {
            Self::Xyz => {
                for (o, &x) in out.iter_mut().zip(&v[..3]) {
                    *o = x * XYZ_ENCODED_MAX;
                }
            }
            Self::LabV2 => {
                out[0] = v[0] * LAB_V2_L_MAX;
                out[1] = v[1] * LAB_V2_AB_MAX - 128.0;
                out[2] = v[2] * LAB_V2_AB_MAX - 128.0;
            }
            Self::LabV4 => {
                out[0] = v[0] * 100.0;
                out[1] = v[1] * 255.0 - 128.0;
                out[2] = v[2] * 255.0 - 128.0;
            }
        }
    }

    /// PCS floats -> normalized LUT values, clamped to [0, 1]
    pub(crate) fn encode(self, v: &[f64], out: &mut [f64]) {
        let encoded = match self {
            Self::Xyz => [
                v[0] / XYZ_ENCODED_MAX,
                v[1] / XYZ_ENCODED_MAX,
                v[2] / XYZ_ENCODED_MAX,
            ],
            Self::LabV2 => [
                v[0] / LAB_V2_L_MAX,
                (v[1] + 128.0) / LAB_V2_AB_MAX,
                (v[2] + 128.0) / LAB_V2_AB_MAX,
            ],
            Self::LabV4 => [v[0] / 100.0, (v[1] + 128.0) / 255.0, (v[2] + 128.0) / 255.0],
        };
        for (o, e) in out.iter_mut().zip(encoded) {
            *o = e.clamp(0.0, 1.0);
        }
    }
}

#[inline]
pub(crate) fn xyz_to_lab(v: &[f64], out: &mut [f64]) {
    let lab = Lab::from_xyz(Xyz::new(v[0], v[1], v[2]));
    out[..3].copy_from_slice(&lab.to_array());
}

#[inline]
pub(crate) fn lab_to_xyz(v: &[f64], out: &mut [f64]) {
    let xyz = Lab::new(v[0], v[1], v[2]).to_xyz();
    out[..3].copy_from_slice(&xyz.to_array());
}
