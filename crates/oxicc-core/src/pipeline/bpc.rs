//! Black point compensation (BPC)
//!
//! BPC maps the source black point to the destination black point with a
//! per-component linear scale in XYZ, keeping the D50 white fixed. It sits
//! at the PCS junction between a Device -> PCS stage and a PCS -> Device
//! stage.

use tracing::debug;

use crate::color::{D50, Xyz};
use crate::icc::{ColorSpace, RenderingIntent};
use crate::profile::Profile;
use crate::transform::Direction;

use super::options::TransformOptions;
use super::{MAX_CHANNELS, StageKind, compile};

/// Scale and offset applied to PCS XYZ
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BpcParams {
    pub scale: [f64; 3],
    pub offset: [f64; 3],
}

impl BpcParams {
    /// Parameters taking `src_black` to `dst_black`, or `None` when the
    /// source black coincides with white in some component
    pub(crate) fn calculate(src_black: Xyz, dst_black: Xyz) -> Option<Self> {
        let white = D50.to_array();
        let src = src_black.to_array();
        let dst = dst_black.to_array();

        let mut scale = [0.0; 3];
        let mut offset = [0.0; 3];
        for c in 0..3 {
            let t = src[c] - white[c];
            if t.abs() < 1e-10 {
                return None;
            }
            scale[c] = (dst[c] - white[c]) / t;
            offset[c] = -white[c] * (dst[c] - src[c]) / t;
        }
        Some(Self { scale, offset })
    }

    #[inline]
    pub(crate) fn apply(&self, input: &[f64], out: &mut [f64]) {
        for c in 0..3 {
            out[c] = self.offset[c] + input[c] * self.scale[c];
        }
    }
}

/// Darkest device value: full ink for subtractive spaces, zero otherwise
fn darkest(space: ColorSpace) -> f64 {
    match space {
        ColorSpace::Cmyk
        | ColorSpace::Cmy
        | ColorSpace::Color2
        | ColorSpace::Color3
        | ColorSpace::Color4
        | ColorSpace::Color5
        | ColorSpace::Color6
        | ColorSpace::Color7
        | ColorSpace::Color8
        | ColorSpace::Color9
        | ColorSpace::Color10
        | ColorSpace::Color11
        | ColorSpace::Color12
        | ColorSpace::Color13
        | ColorSpace::Color14
        | ColorSpace::Color15 => 1.0,
        _ => 0.0,
    }
}

/// Profile black point in PCS XYZ.
///
/// Uses `bkpt` when present, zero for matrix-shaper profiles, and otherwise
/// runs the profile's Device -> PCS stage on its darkest colorant.
pub(crate) fn black_point(
    profile: &Profile,
    intent: RenderingIntent,
    options: &TransformOptions,
) -> Xyz {
    if let Some(bkpt) = profile.media_black_point() {
        return bkpt;
    }

    // Black is taken from the relative rendering of the chosen intent
    let intent = match intent {
        RenderingIntent::AbsoluteColorimetric => RenderingIntent::RelativeColorimetric,
        other => other,
    };
    let stage = match compile(profile, intent, Direction::DeviceToPcs, options) {
        Ok(stage) => stage,
        Err(e) => {
            debug!(error = %e, "no Device -> PCS stage for black point, assuming zero");
            return Xyz::new(0.0, 0.0, 0.0);
        }
    };
    if stage.kind == StageKind::MatrixShaper {
        return Xyz::new(0.0, 0.0, 0.0);
    }

    let input = [darkest(stage.input); MAX_CHANNELS];
    let mut out = [0.0; MAX_CHANNELS];
    stage.eval(&input, &mut out);
    if stage.output == ColorSpace::Lab {
        let mut xyz = [0.0; MAX_CHANNELS];
        super::pcs::lab_to_xyz(&out, &mut xyz);
        out = xyz;
    }
    Xyz::new(out[0], out[1], out[2])
}
