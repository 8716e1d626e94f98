//! Interoperability with Little CMS
//!
//! Profiles written here must load in lcms2, profiles lcms2 writes must
//! load here, and both engines must agree on pixels.

use std::slice;

use anyhow::Result;
use icc_tests::{TestPattern, generate_pattern, max_channel_diff};
use lcms2::{Flags, Intent, PixelFormat};
use oxicc_core::{
    ColorSpace, PixelBuffer, PixelBufferMut, PixelFormat as Format, Profile, ProfileClass,
    StandardProfile, Transform,
};

fn lcms2_rgb8(src: &lcms2::Profile, dst: &lcms2::Profile, pixels: &[u8]) -> Vec<u8> {
    let transform = lcms2::Transform::<[u8; 3], [u8; 3]>::new(
        src,
        PixelFormat::RGB_8,
        dst,
        PixelFormat::RGB_8,
        Intent::Perceptual,
    )
    .expect("lcms2 transform");
    let input: Vec<[u8; 3]> = pixels.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect();
    let mut output = vec![[0u8; 3]; input.len()];
    transform.transform_pixels(&input, &mut output);
    output.into_iter().flatten().collect()
}

fn ours_rgb8(t: &Transform<'_>, pixels: &[u8]) -> Result<Vec<u8>> {
    let n = pixels.len() / 3;
    let mut out = vec![0u8; pixels.len()];
    t.apply(
        &PixelBuffer::new(pixels, n, 1, pixels.len(), Format::RGB8),
        &mut PixelBufferMut::new(&mut out, n, 1, pixels.len(), Format::RGB8),
    )?;
    Ok(out)
}

#[test]
fn test_lcms2_loads_standard_profiles() -> Result<()> {
    for standard in StandardProfile::ALL {
        let profile = standard.to_profile()?;
        let loaded = lcms2::Profile::new_icc(profile.raw_data())?;
        let expected = match profile.color_space() {
            ColorSpace::Gray => lcms2::ColorSpaceSignature::GrayData,
            _ => lcms2::ColorSpaceSignature::RgbData,
        };
        assert_eq!(loaded.color_space(), expected, "{standard}");
        assert_eq!(
            loaded.device_class(),
            lcms2::ProfileClassSignature::DisplayClass,
            "{standard}"
        );
    }
    Ok(())
}

#[test]
fn test_lcms2_srgb_parses_and_verifies() -> Result<()> {
    let bytes = lcms2::Profile::new_srgb().icc()?;
    let profile = Profile::parse(bytes.clone())?;
    assert_eq!(profile.device_class(), ProfileClass::Display);
    assert_eq!(profile.color_space(), ColorSpace::Rgb);
    assert_eq!(profile.pcs(), ColorSpace::Xyz);
    profile.verify()?;
    assert_eq!(profile.raw_data(), &bytes[..]);
    assert_eq!(profile.to_mutable().raw_data(), bytes);
    Ok(())
}

#[test]
fn test_srgb_to_p3_matches_lcms2() -> Result<()> {
    let srgb = StandardProfile::Srgb.to_profile()?;
    let p3 = StandardProfile::DisplayP3.to_profile()?;
    let pixels = generate_pattern(TestPattern::Random(3), 64, 64);

    let t = Transform::between(&srgb, &p3)?;
    let ours = ours_rgb8(&t, &pixels)?;
    let reference = lcms2_rgb8(
        &lcms2::Profile::new_icc(srgb.raw_data())?,
        &lcms2::Profile::new_icc(p3.raw_data())?,
        &pixels,
    );
    let diff = max_channel_diff(&ours, &reference);
    assert!(diff <= 2.0, "max channel difference {diff}");
    Ok(())
}

#[test]
fn test_lcms2_profile_in_our_pipeline() -> Result<()> {
    // lcms2's own sRGB against ours: both encode the same curve and primaries
    let theirs = Profile::parse(lcms2::Profile::new_srgb().icc()?)?;
    let ours = StandardProfile::Srgb.to_profile()?;
    let t = Transform::between(&theirs, &ours)?;

    let pixels = generate_pattern(TestPattern::Lattice(6), 216, 1);
    let out = ours_rgb8(&t, &pixels)?;
    let diff = max_channel_diff(&out, &pixels);
    assert!(diff <= 1.0, "max channel difference {diff}");
    Ok(())
}

#[test]
fn test_lcms2_runs_our_device_link() -> Result<()> {
    let srgb = StandardProfile::Srgb.to_profile()?;
    let p3 = StandardProfile::DisplayP3.to_profile()?;
    let t = Transform::between(&srgb, &p3)?;
    let link = t.create_device_link(17)?;

    let loaded = lcms2::Profile::new_icc(link.raw_data())?;
    assert_eq!(
        loaded.device_class(),
        lcms2::ProfileClassSignature::LinkClass
    );
    let profiles = [&loaded];
    let via_link = lcms2::Transform::<[u8; 3], [u8; 3]>::new_multiprofile(
        &profiles,
        PixelFormat::RGB_8,
        PixelFormat::RGB_8,
        Intent::Perceptual,
        Flags::default(),
    )?;

    let pixels = generate_pattern(TestPattern::Random(11), 32, 32);
    let direct = ours_rgb8(&t, &pixels)?;
    for (px, expected) in pixels.chunks_exact(3).zip(direct.chunks_exact(3)) {
        let input = [px[0], px[1], px[2]];
        let mut output = [0u8; 3];
        via_link.transform_pixels(slice::from_ref(&input), slice::from_mut(&mut output));
        let diff = max_channel_diff(&output[..], expected);
        assert!(diff <= 3.0, "{input:?}: {output:?} vs {expected:?}");
    }
    Ok(())
}
