//! Compiled color transform pipeline
//!
//! Each [`StageDescriptor`](crate::StageDescriptor) compiles into one or
//! more evaluation stages:
//! - LUT profiles: the A2Bx / B2Ax tag picked by rendering intent
//! - Matrix-shaper profiles (RGB): TRCs plus colorant matrix
//! - Gray profiles: `kTRC`
//!
//! Between descriptors the chain is joined at the PCS, inserting XYZ/Lab
//! conversion and black point compensation where needed.
//!
//! # Working representation
//!
//! Device values are normalized to [0, 1]. PCS XYZ is D50 relative with
//! white at Y = 1; PCS Lab is L* 0..100 with signed a*, b*.

mod bpc;
mod gray;
mod lut;
mod matrix_shaper;
mod options;
pub(crate) mod pcs;

pub use options::{Interpolation, TransformOptions};

use tracing::{debug, warn};

use crate::color::D50;
use crate::error::{Error, Result};
use crate::icc::{ColorSpace, ProfileClass, RenderingIntent, TagSignature};
use crate::profile::Profile;
use crate::transform::{Direction, StageDescriptor};

use bpc::BpcParams;
use gray::GrayStage;
use lut::LutStage;
use matrix_shaper::MatrixShaper;

/// Most channels any stage reads or writes (15 colorants plus slack)
pub(crate) const MAX_CHANNELS: usize = 16;

/// Media white ratios closer to 1 than this skip the absolute scaling
const ABSOLUTE_EPSILON: f64 = 1e-6;

/// One evaluation step
#[derive(Debug, Clone)]
pub(crate) enum Stage {
    MatrixShaper(MatrixShaper),
    Gray(GrayStage),
    Lut(LutStage),
    XyzToLab,
    LabToXyz,
    /// Component-wise XYZ scale (absolute colorimetric)
    ScaleXyz([f64; 3]),
    Bpc(BpcParams),
}

impl Stage {
    #[inline]
    fn eval(&self, input: &[f64], out: &mut [f64]) {
        match self {
            Self::MatrixShaper(s) => s.eval(input, out),
            Self::Gray(s) => s.eval(input, out),
            Self::Lut(s) => s.eval(input, out),
            Self::XyzToLab => pcs::xyz_to_lab(input, out),
            Self::LabToXyz => pcs::lab_to_xyz(input, out),
            Self::ScaleXyz(s) => {
                for c in 0..3 {
                    out[c] = input[c] * s[c];
                }
            }
            Self::Bpc(p) => p.apply(input, out),
        }
    }
}

/// How a descriptor was compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StageKind {
    Lut(TagSignature),
    MatrixShaper,
    Gray,
}

/// Stages compiled from one descriptor
#[derive(Debug, Clone)]
pub(crate) struct CompiledStage {
    pub kind: StageKind,
    pub input: ColorSpace,
    pub output: ColorSpace,
    stages: Vec<Stage>,
}

impl CompiledStage {
    pub(crate) fn eval(&self, input: &[f64], out: &mut [f64]) {
        run(&self.stages, input, out);
    }
}

fn run(stages: &[Stage], input: &[f64], out: &mut [f64]) {
    let mut a = [0.0; MAX_CHANNELS];
    let mut b = [0.0; MAX_CHANNELS];
    let n = input.len().min(MAX_CHANNELS);
    a[..n].copy_from_slice(&input[..n]);
    for stage in stages {
        stage.eval(&a, &mut b);
        std::mem::swap(&mut a, &mut b);
    }
    let m = out.len().min(MAX_CHANNELS);
    out[..m].copy_from_slice(&a[..m]);
}

/// LUT tags to try for an intent, preferred first
fn lut_candidates(intent: RenderingIntent, direction: Direction) -> &'static [TagSignature] {
    use TagSignature as T;
    match (direction, intent) {
        (Direction::DeviceToPcs, RenderingIntent::Perceptual) => &[T::A2B0],
        (
            Direction::DeviceToPcs,
            RenderingIntent::RelativeColorimetric | RenderingIntent::AbsoluteColorimetric,
        ) => &[T::A2B1, T::A2B0],
        (Direction::DeviceToPcs, RenderingIntent::Saturation) => &[T::A2B2, T::A2B0],
        (Direction::PcsToDevice, RenderingIntent::Perceptual) => &[T::B2A0],
        (
            Direction::PcsToDevice,
            RenderingIntent::RelativeColorimetric | RenderingIntent::AbsoluteColorimetric,
        ) => &[T::B2A1, T::B2A0],
        (Direction::PcsToDevice, RenderingIntent::Saturation) => &[T::B2A2, T::B2A0],
    }
}

/// Compile one profile in one direction
pub(crate) fn compile(
    profile: &Profile,
    intent: RenderingIntent,
    direction: Direction,
    options: &TransformOptions,
) -> Result<CompiledStage> {
    let space = profile.color_space();
    let pcs = profile.pcs();
    let candidates = lut_candidates(intent, direction);

    let (kind, stage, device_pcs) =
        if let Some(&sig) = candidates.iter().find(|&&s| profile.contains_tag(s)) {
            if sig != candidates[0] {
                warn!(wanted = %candidates[0], using = %sig, "LUT tag missing, falling back");
            }
            let tag = profile.require(sig)?;
            let (from, to) = match direction {
                Direction::DeviceToPcs => (space, pcs),
                Direction::PcsToDevice => (pcs, space),
            };
            let lut = LutStage::new(sig, &tag, from, to, options.interpolation)?;
            (StageKind::Lut(sig), Stage::Lut(lut), pcs)
        } else if space == ColorSpace::Rgb {
            let shaper = match direction {
                Direction::DeviceToPcs => MatrixShaper::forward(profile)?,
                Direction::PcsToDevice => MatrixShaper::inverse(profile)?,
            };
            (StageKind::MatrixShaper, Stage::MatrixShaper(shaper), ColorSpace::Xyz)
        } else if space == ColorSpace::Gray {
            let gray_pcs = if pcs == ColorSpace::Lab {
                ColorSpace::Lab
            } else {
                ColorSpace::Xyz
            };
            let inverse = direction == Direction::PcsToDevice;
            let gray = GrayStage::new(profile, gray_pcs, inverse)?;
            (StageKind::Gray, Stage::Gray(gray), gray_pcs)
        } else {
            return Err(Error::MissingTag(candidates[0]));
        };

    let mut stages = vec![stage];
    if intent == RenderingIntent::AbsoluteColorimetric
        && profile.device_class() != ProfileClass::DeviceLink
        && device_pcs.is_pcs()
    {
        let white = profile.media_white_point().unwrap_or(D50);
        let ratio = white.div_components(&D50).to_array();
        if ratio.iter().any(|r| (r - 1.0).abs() > ABSOLUTE_EPSILON) {
            let scale = match direction {
                Direction::DeviceToPcs => ratio,
                Direction::PcsToDevice => ratio.map(|r| 1.0 / r),
            };
            let lab = device_pcs == ColorSpace::Lab;
            let scaled = if lab {
                vec![Stage::LabToXyz, Stage::ScaleXyz(scale), Stage::XyzToLab]
            } else {
                vec![Stage::ScaleXyz(scale)]
            };
            match direction {
                Direction::DeviceToPcs => stages.extend(scaled),
                Direction::PcsToDevice => {
                    stages.splice(0..0, scaled);
                }
            }
        }
    }

    let (input, output) = match direction {
        Direction::DeviceToPcs => (space, device_pcs),
        Direction::PcsToDevice => (device_pcs, space),
    };
    debug!(?kind, ?direction, ?intent, %input, %output, "compiled stage");
    Ok(CompiledStage {
        kind,
        input,
        output,
        stages,
    })
}

/// A complete, validated chain
#[derive(Debug, Clone)]
pub(crate) struct Pipeline {
    stages: Vec<Stage>,
    pub input: ColorSpace,
    pub output: ColorSpace,
}

impl Pipeline {
    /// Compile and join a descriptor sequence
    pub(crate) fn build(
        descriptors: &[StageDescriptor<'_>],
        options: &TransformOptions,
    ) -> Result<Self> {
        if descriptors.is_empty() {
            return Err(Error::IncompatibleChain("empty stage sequence".into()));
        }

        let compiled = descriptors
            .iter()
            .map(|d| compile(d.profile, d.intent, d.direction, options))
            .collect::<Result<Vec<_>>>()?;

        let mut stages = Vec::new();
        for (i, (desc, stage)) in descriptors.iter().zip(&compiled).enumerate() {
            if i > 0 {
                let prev_desc = &descriptors[i - 1];
                let prev = &compiled[i - 1];
                join(prev_desc, prev, desc, stage, options, &mut stages)?;
            }
            stages.extend(stage.stages.iter().cloned());
        }

        let input = compiled[0].input;
        let output = compiled[compiled.len() - 1].output;
        debug!(
            descriptors = descriptors.len(),
            stages = stages.len(),
            %input,
            %output,
            "built pipeline"
        );
        Ok(Self {
            stages,
            input,
            output,
        })
    }

    /// Evaluate one pixel: `input` has the input space's channels
    #[inline]
    pub(crate) fn eval(&self, input: &[f64], out: &mut [f64]) {
        run(&self.stages, input, out);
    }
}

/// Connect `prev`'s output to `next`'s input
fn join(
    prev_desc: &StageDescriptor<'_>,
    prev: &CompiledStage,
    next_desc: &StageDescriptor<'_>,
    next: &CompiledStage,
    options: &TransformOptions,
    stages: &mut Vec<Stage>,
) -> Result<()> {
    let (from, to) = (prev.output, next.input);
    if from != to && !(from.is_pcs() && to.is_pcs()) {
        return Err(Error::IncompatibleChain(format!(
            "stage outputs {from} but the next stage expects {to}"
        )));
    }

    let at_pcs = from.is_pcs()
        && prev_desc.direction == Direction::DeviceToPcs
        && next_desc.direction == Direction::PcsToDevice;
    let wants_bpc = prev_desc.black_point_compensation || next_desc.black_point_compensation;
    if at_pcs && wants_bpc {
        if let Some(params) = bpc_params(prev_desc, next_desc, options) {
            if from == ColorSpace::Lab {
                stages.push(Stage::LabToXyz);
            }
            stages.push(Stage::Bpc(params));
            if to == ColorSpace::Lab {
                stages.push(Stage::XyzToLab);
            }
            return Ok(());
        }
    }

    match (from, to) {
        (ColorSpace::Xyz, ColorSpace::Lab) => stages.push(Stage::XyzToLab),
        (ColorSpace::Lab, ColorSpace::Xyz) => stages.push(Stage::LabToXyz),
        _ => {}
    }
    Ok(())
}

fn bpc_params(
    src: &StageDescriptor<'_>,
    dst: &StageDescriptor<'_>,
    options: &TransformOptions,
) -> Option<BpcParams> {
    let src_black = bpc::black_point(src.profile, src.intent, options);
    let dst_black = bpc::black_point(dst.profile, dst.intent, options);
    if src_black.approx_eq(&dst_black, 1e-9) {
        debug!(black = ?src_black, "black points match, skipping BPC");
        return None;
    }
    let params = BpcParams::calculate(src_black, dst_black);
    match params {
        Some(p) => debug!(?src_black, ?dst_black, scale = ?p.scale, "inserted BPC"),
        None => debug!(?src_black, ?dst_black, "degenerate BPC scale, skipping"),
    }
    params
}

/// Sample `n` evenly spaced points of [0, 1]
pub(crate) fn grid_value(i: usize, n: usize) -> f64 {
    if n <= 1 { 0.0 } else { i as f64 / (n - 1) as f64 }
}
