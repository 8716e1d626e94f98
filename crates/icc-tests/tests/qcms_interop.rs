//! Interoperability with qcms
//!
//! qcms only handles matrix-shaper and gray profiles, which is exactly
//! what the standard set produces.

use anyhow::{Context, Result};
use icc_tests::accuracy::xyz_to_lab;
use icc_tests::fixtures::{self, SRGB_COLORANTS};
use icc_tests::{DeltaEStats, TestPattern, delta_e_2000, generate_pattern, max_channel_diff};
use oxicc_core::{
    AlphaInfo, Depth, Direction, PixelBuffer, PixelBufferMut, PixelFormat, Profile,
    RenderingIntent, StageDescriptor, StandardProfile, Transform,
};

fn qcms_profile(profile: &Profile) -> Result<Box<qcms::Profile>> {
    qcms::Profile::new_from_slice(profile.raw_data(), false)
        .with_context(|| format!("qcms rejected {:?}", profile.description()))
}

fn qcms_rgb8(src: &qcms::Profile, dst: &qcms::Profile, pixels: &[u8]) -> Result<Vec<u8>> {
    let transform = qcms::Transform::new(src, dst, qcms::DataType::RGB8, qcms::Intent::Perceptual)
        .context("qcms transform")?;
    let mut data = pixels.to_vec();
    transform.apply(&mut data);
    Ok(data)
}

fn ours_rgb8(src: &Profile, dst: &Profile, pixels: &[u8]) -> Result<Vec<u8>> {
    let t = Transform::between(src, dst)?;
    let n = pixels.len() / 3;
    let mut out = vec![0u8; pixels.len()];
    t.apply(
        &PixelBuffer::new(pixels, n, 1, pixels.len(), PixelFormat::RGB8),
        &mut PixelBufferMut::new(&mut out, n, 1, pixels.len(), PixelFormat::RGB8),
    )?;
    Ok(out)
}

#[test]
fn test_qcms_accepts_standard_profiles() -> Result<()> {
    for standard in StandardProfile::ALL {
        qcms_profile(&standard.to_profile()?)?;
    }
    // And the hand-assembled v4 fixture
    let fixture = Profile::parse(fixtures::matrix_shaper(SRGB_COLORANTS, 2.2))?;
    qcms_profile(&fixture)?;
    Ok(())
}

#[test]
fn test_srgb_to_p3_matches_qcms() -> Result<()> {
    let srgb = StandardProfile::Srgb.to_profile()?;
    let p3 = StandardProfile::DisplayP3.to_profile()?;
    let pixels = generate_pattern(TestPattern::Random(21), 48, 48);

    let ours = ours_rgb8(&srgb, &p3, &pixels)?;
    let reference = qcms_rgb8(&*qcms_profile(&srgb)?, &*qcms_profile(&p3)?, &pixels)?;
    // qcms quantizes its output curves, so allow a little more slack
    let diff = max_channel_diff(&ours, &reference);
    assert!(diff <= 3.0, "max channel difference {diff}");
    Ok(())
}

#[test]
fn test_our_srgb_matches_qcms_builtin() -> Result<()> {
    let srgb = StandardProfile::Srgb.to_profile()?;
    let adobe = StandardProfile::AdobeRgb.to_profile()?;
    let pixels = generate_pattern(TestPattern::Lattice(5), 125, 1);

    let ours = ours_rgb8(&srgb, &adobe, &pixels)?;
    let builtin = qcms::Profile::new_sRGB();
    let reference = qcms_rgb8(&builtin, &*qcms_profile(&adobe)?, &pixels)?;

    // Compare perceptually, reading both results as Adobe RGB through our pipeline
    let xyz = ours_xyz(&adobe, &ours)?;
    let xyz_ref = ours_xyz(&adobe, &reference)?;
    let lab = |p: &[f32]| xyz_to_lab([p[0] as f64, p[1] as f64, p[2] as f64]);
    let stats = DeltaEStats::from_samples(
        xyz.chunks_exact(3)
            .zip(xyz_ref.chunks_exact(3))
            .map(|(a, b)| delta_e_2000(lab(a), lab(b))),
    );
    assert_eq!(stats.count, 125);
    // One 8-bit step apart at most
    assert!(stats.mean < 1.0 && stats.max < 2.0, "{stats:?}");
    Ok(())
}

/// RGB8 pixels to float PCS XYZ
fn ours_xyz(src: &Profile, pixels: &[u8]) -> Result<Vec<f32>> {
    let t = Transform::new(&[StageDescriptor::new(
        src,
        RenderingIntent::RelativeColorimetric,
        Direction::DeviceToPcs,
    )])?;
    let n = pixels.len() / 3;
    let mut out = vec![0f32; n * 3];
    t.apply(
        &PixelBuffer::new(pixels, n, 1, pixels.len(), PixelFormat::RGB8),
        &mut PixelBufferMut::from_slice(
            &mut out[..],
            n,
            1,
            n * 12,
            PixelFormat::new(Depth::F32, AlphaInfo::None),
        ),
    )?;
    Ok(out)
}
