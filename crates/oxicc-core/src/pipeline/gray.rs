//! Gray TRC stages
//!
//! A gray profile maps its single channel through `kTRC` to luminance.
//! In XYZ the result is the D50 white scaled by Y; in Lab it is L* with
//! zero chroma.

use crate::color::{D50, Lab, lab::lightness};
use crate::error::Result;
use crate::icc::{ColorSpace, Curve, TagSignature};
use crate::profile::Profile;

#[derive(Debug, Clone)]
pub(crate) struct GrayStage {
    curve: Curve,
    pcs: ColorSpace,
    inverse: bool,
}

impl GrayStage {
    pub(crate) fn new(profile: &Profile, pcs: ColorSpace, inverse: bool) -> Result<Self> {
        Ok(Self {
            curve: profile.curve(TagSignature::GRAY_TRC)?,
            pcs,
            inverse,
        })
    }

    pub(crate) fn eval(&self, input: &[f64], out: &mut [f64]) {
        if self.inverse {
            let y = match self.pcs {
                ColorSpace::Lab => Lab::new(input[0], 0.0, 0.0).to_xyz().y,
                _ => input[1],
            };
            out[0] = self.curve.eval_inverse(y);
            return;
        }

        let y = self.curve.eval(input[0]);
        match self.pcs {
            ColorSpace::Lab => out[..3].copy_from_slice(&[lightness(y), 0.0, 0.0]),
            _ => out[..3].copy_from_slice(&D50.scale(y).to_array()),
        }
    }
}
