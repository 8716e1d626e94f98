//! Color transforms
//!
//! A [`Transform`] is a chain of profile stages compiled into one
//! [`Pipeline`](crate::pipeline). It borrows its profiles, so it cannot
//! outlive them, and runs over caller-owned pixel buffers.

use multiversion::multiversion;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::builder::MutableProfile;
use crate::error::{Error, Result};
use crate::icc::{
    Clut, ColorSpace, LegacyLut, LutPrecision, ProfileClass, RenderingIntent, TagData,
    TagSignature, TextData,
};
use crate::math::Matrix3x3;
use crate::pipeline::pcs::PcsEncoding;
use crate::pipeline::{MAX_CHANNELS, Pipeline, TransformOptions, grid_value};
use crate::pixel::{PixelBuffer, PixelBufferMut, PixelCodec, check_geometry};
use crate::profile::Profile;

/// Largest CLUT a device link may sample
const MAX_LINK_ENTRIES: usize = 1 << 20;

/// Which way a stage runs through its profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Data color space in, PCS out
    DeviceToPcs,
    /// PCS in, data color space out
    PcsToDevice,
}

/// One profile's role in a transform
#[derive(Debug, Clone, Copy)]
pub struct StageDescriptor<'a> {
    pub profile: &'a Profile,
    pub intent: RenderingIntent,
    pub direction: Direction,
    pub black_point_compensation: bool,
}

impl<'a> StageDescriptor<'a> {
    pub fn new(profile: &'a Profile, intent: RenderingIntent, direction: Direction) -> Self {
        Self {
            profile,
            intent,
            direction,
            black_point_compensation: false,
        }
    }

    pub fn with_black_point_compensation(mut self, enabled: bool) -> Self {
        self.black_point_compensation = enabled;
        self
    }
}

/// A compiled color transform
///
/// # Example
///
/// ```
/// use oxicc_core::{PixelBuffer, PixelBufferMut, PixelFormat, StandardProfile, Transform};
///
/// let srgb = StandardProfile::Srgb.to_profile().unwrap();
/// let p3 = StandardProfile::DisplayP3.to_profile().unwrap();
/// let transform = Transform::between(&srgb, &p3).unwrap();
///
/// let src = [255u8, 0, 0];
/// let mut dst = [0u8; 3];
/// transform
///     .apply(
///         &PixelBuffer::new(&src, 1, 1, 3, PixelFormat::RGB8),
///         &mut PixelBufferMut::new(&mut dst, 1, 1, 3, PixelFormat::RGB8),
///     )
///     .unwrap();
/// assert!(dst[0] < 255);
/// ```
#[derive(Debug, Clone)]
pub struct Transform<'a> {
    stages: Vec<StageDescriptor<'a>>,
    pipeline: Pipeline,
    options: TransformOptions,
}

impl<'a> Transform<'a> {
    /// Compile a stage chain with default options
    pub fn new(stages: &[StageDescriptor<'a>]) -> Result<Self> {
        Self::with_options(stages, TransformOptions::default())
    }

    pub fn with_options(stages: &[StageDescriptor<'a>], options: TransformOptions) -> Result<Self> {
        let pipeline = Pipeline::build(stages, &options)?;
        Ok(Self {
            stages: stages.to_vec(),
            pipeline,
            options,
        })
    }

    /// Perceptual `src` Device -> PCS then `dst` PCS -> Device
    pub fn between(src: &'a Profile, dst: &'a Profile) -> Result<Self> {
        Self::new(&[
            StageDescriptor::new(src, RenderingIntent::Perceptual, Direction::DeviceToPcs),
            StageDescriptor::new(dst, RenderingIntent::Perceptual, Direction::PcsToDevice),
        ])
    }

    pub fn input_space(&self) -> ColorSpace {
        self.pipeline.input
    }

    pub fn output_space(&self) -> ColorSpace {
        self.pipeline.output
    }

    /// Number of profile stages
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Convert `src` into `dst`.
    ///
    /// Both buffers are validated before anything is written; on error
    /// `dst` is untouched.
    pub fn apply(&self, src: &PixelBuffer<'_>, dst: &mut PixelBufferMut<'_>) -> Result<()> {
        let src_codec = PixelCodec::new(src.format, self.input_space())?;
        let dst_codec = PixelCodec::new(dst.format, self.output_space())?;

        if (src.width, src.height) != (dst.width, dst.height) {
            return Err(Error::Transform(format!(
                "source is {}x{} but destination is {}x{}",
                src.width, src.height, dst.width, dst.height
            )));
        }
        let src_row = check_geometry(
            "source",
            src.data.len(),
            src.width,
            src.height,
            src.bytes_per_row,
            src_codec.bytes_per_pixel(),
        )?;
        let dst_row = check_geometry(
            "destination",
            dst.data.len(),
            dst.width,
            dst.height,
            dst.bytes_per_row,
            dst_codec.bytes_per_pixel(),
        )?;
        if src.width == 0 || src.height == 0 {
            return Ok(());
        }

        let pipeline = &self.pipeline;
        let kernel = |(y, row): (usize, &mut [u8])| {
            transform_row(
                pipeline,
                &src_codec,
                &dst_codec,
                src.row(y, src_row),
                &mut row[..dst_row],
            );
        };

        let height = dst.height;
        #[cfg(feature = "parallel")]
        if self.options.parallel {
            dst.data
                .par_chunks_mut(dst.bytes_per_row)
                .take(height)
                .enumerate()
                .for_each(kernel);
            return Ok(());
        }
        dst.data
            .chunks_mut(dst.bytes_per_row)
            .take(height)
            .enumerate()
            .for_each(kernel);
        Ok(())
    }

    /// Sample the whole chain into a `link` profile holding one `mft2` A2B0
    pub fn create_device_link(&self, grid_points: u8) -> Result<Profile> {
        if grid_points < 2 {
            return Err(Error::Transform(format!(
                "device link needs at least 2 grid points, got {grid_points}"
            )));
        }
        let (input, output) = (self.input_space(), self.output_space());
        let (inputs, outputs) = (input.channels(), output.channels());
        let g = grid_points as usize;
        let entries = u32::try_from(inputs)
            .ok()
            .and_then(|n| g.checked_pow(n))
            .filter(|&n| n <= MAX_LINK_ENTRIES)
            .ok_or_else(|| {
                Error::Transform(format!(
                    "{grid_points}^{inputs} grid points exceed the device link limit"
                ))
            })?;

        let in_pcs = PcsEncoding::for_lut(input, true);
        let out_pcs = PcsEncoding::for_lut(output, true);
        let mut data = Vec::with_capacity(entries * outputs);
        let mut normalized = [0.0; MAX_CHANNELS];
        let mut values = [0.0; MAX_CHANNELS];
        let mut result = [0.0; MAX_CHANNELS];
        let mut encoded = [0.0; MAX_CHANNELS];
        for index in 0..entries {
            // First input varies slowest
            let mut rest = index;
            for c in (0..inputs).rev() {
                normalized[c] = grid_value(rest % g, g);
                rest /= g;
            }
            match in_pcs {
                Some(enc) => enc.decode(&normalized[..3], &mut values),
                None => values[..inputs].copy_from_slice(&normalized[..inputs]),
            }
            self.pipeline.eval(&values[..inputs], &mut result[..outputs]);
            match out_pcs {
                Some(enc) => enc.encode(&result[..3], &mut encoded),
                None => {
                    for (e, r) in encoded.iter_mut().zip(&result[..outputs]) {
                        *e = r.clamp(0.0, 1.0);
                    }
                }
            }
            data.extend_from_slice(&encoded[..outputs]);
        }

        let lut = LegacyLut {
            precision: LutPrecision::U16,
            input_channels: inputs,
            output_channels: outputs,
            matrix: Matrix3x3::identity(),
            input_tables: vec![vec![0.0, 1.0]; inputs],
            clut: Clut {
                grid_points: vec![grid_points; inputs],
                output_channels: outputs,
                data,
            },
            output_tables: vec![vec![0.0, 1.0]; outputs],
        };

        let mut link = MutableProfile::new(ProfileClass::DeviceLink, input, output);
        link.set_tag_data(
            TagSignature::DESC,
            &TagData::Text(TextData::localized(format!("Device link {input} to {output}"))),
        )?;
        link.set_tag_data(TagSignature::A2B0, &TagData::Lut(lut))?;
        debug!(%input, %output, grid_points, entries, "sampled device link");
        link.to_profile()
    }
}

#[multiversion(targets("x86_64+avx2", "x86_64+sse4.1", "aarch64+neon",))]
fn transform_row(
    pipeline: &Pipeline,
    src: &PixelCodec,
    dst: &PixelCodec,
    input: &[u8],
    output: &mut [u8],
) {
    let mut color = [0.0; MAX_CHANNELS];
    let mut result = [0.0; MAX_CHANNELS];
    let (src_channels, dst_channels) = (src.channels(), dst.channels());
    for (s, d) in input
        .chunks_exact(src.bytes_per_pixel())
        .zip(output.chunks_exact_mut(dst.bytes_per_pixel()))
    {
        let alpha = src.decode(s, &mut color);
        pipeline.eval(&color[..src_channels], &mut result[..dst_channels]);
        dst.encode(&result, alpha, d);
    }
}
