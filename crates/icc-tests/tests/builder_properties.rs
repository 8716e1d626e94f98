//! Seeded random edits against a model
//!
//! Every step checks the builder against a plain map of signature to
//! bytes, and periodically checks that serializing and reparsing keeps
//! every tag. Runs start either from an empty profile or from a parsed
//! copy, which takes the unmodified paths first.

use std::collections::BTreeMap;

use anyhow::Result;
use oxicc_core::{
    ColorSpace, MutableProfile, Profile, ProfileClass, StandardProfile, TagSignature,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const SIGNATURES: [&[u8; 4]; 8] = [
    b"desc", b"cprt", b"wtpt", b"rTRC", b"gTRC", b"bTRC", b"zz01", b"zz02",
];

fn random_payload(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let len = rng.gen_range(1..=40);
    (0..len).map(|_| rng.r#gen()).collect()
}

fn check(m: &MutableProfile, model: &BTreeMap<TagSignature, Vec<u8>>) {
    let mut sigs = m.tag_signatures();
    sigs.sort();
    assert_eq!(sigs, model.keys().copied().collect::<Vec<_>>());
    for (sig, bytes) in model {
        assert_eq!(m.tag(*sig), Some(&bytes[..]), "{sig}");
    }
}

fn check_reparse(m: &MutableProfile, model: &BTreeMap<TagSignature, Vec<u8>>) -> Result<()> {
    let bytes = m.raw_data();
    assert_eq!(bytes.len() % 4, 0);
    let profile = Profile::parse(bytes)?;
    assert_eq!(profile.tag_count(), model.len());
    for (sig, data) in model {
        assert_eq!(profile.tag(*sig), Some(&data[..]), "{sig}");
    }
    Ok(())
}

fn random_edits(
    rng: &mut ChaCha8Rng,
    m: &mut MutableProfile,
    model: &mut BTreeMap<TagSignature, Vec<u8>>,
    steps: usize,
) -> Result<()> {
    for step in 0..steps {
        let sig = TagSignature::from_bytes(*SIGNATURES[rng.gen_range(0..SIGNATURES.len())]);
        match rng.gen_range(0..11) {
            0..=4 => {
                let data = random_payload(rng);
                m.set_tag(sig, Some(&data))?;
                model.insert(sig, data);
            }
            5 => {
                // Same-size overwrite of whatever is there
                if let Some(old) = model.get(&sig).cloned() {
                    let data: Vec<u8> = old.iter().map(|b| b.wrapping_add(1)).collect();
                    m.set_tag(sig, Some(&data))?;
                    model.insert(sig, data);
                }
            }
            6 | 7 => {
                let removed = m.remove_tag(sig);
                assert_eq!(removed, model.remove(&sig).is_some());
            }
            8 => {
                let existing =
                    TagSignature::from_bytes(*SIGNATURES[rng.gen_range(0..SIGNATURES.len())]);
                match model.get(&existing).cloned() {
                    Some(data) if existing != sig => {
                        m.share_tag(sig, existing)?;
                        model.insert(sig, data);
                    }
                    Some(_) => {}
                    None => assert!(m.share_tag(sig, existing).is_err()),
                }
            }
            9 => {
                // Rewriting the current header changes nothing
                let header = m.header().to_bytes();
                m.set_header(&header)?;
            }
            _ => m.compact(),
        }
        check(m, model);
        if step % 25 == 0 {
            check_reparse(m, model)?;
        }
    }
    check_reparse(m, model)
}

#[test]
fn test_random_edits_match_model() -> Result<()> {
    for seed in 0..16u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut m = MutableProfile::new(ProfileClass::Display, ColorSpace::Rgb, ColorSpace::Xyz);
        let mut model = BTreeMap::new();
        random_edits(&mut rng, &mut m, &mut model, 200)?;
    }
    Ok(())
}

#[test]
fn test_random_edits_on_parsed_copy() -> Result<()> {
    let original = StandardProfile::Srgb.to_profile()?;
    let bytes = original.raw_data().to_vec();
    for seed in 100..116u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut m = Profile::parse(bytes.clone())?.to_mutable();
        let mut model: BTreeMap<TagSignature, Vec<u8>> = original
            .tag_signatures()
            .into_iter()
            .filter_map(|sig| Some((sig, original.tag(sig)?.to_vec())))
            .collect();

        // Untouched copies survive compaction byte for byte
        m.compact();
        assert!(!m.is_modified());
        assert_eq!(m.raw_data(), bytes);
        check(&m, &model);

        random_edits(&mut rng, &mut m, &mut model, 120)?;
    }
    Ok(())
}

#[test]
fn test_overwriting_a_shared_tag_splits_it() -> Result<()> {
    let mut m = MutableProfile::new(ProfileClass::Display, ColorSpace::Rgb, ColorSpace::Xyz);
    let (r, g) = (TagSignature::RED_TRC, TagSignature::GREEN_TRC);
    m.set_tag(r, Some(b"curv\0\0\0\0\0\0\0\0"))?;
    m.share_tag(g, r)?;

    m.set_tag(g, Some(b"curv\0\0\0\0\0\0\0\x01"))?;
    assert_eq!(m.tag(r), Some(&b"curv\0\0\0\0\0\0\0\0"[..]));
    assert_eq!(m.tag(g), Some(&b"curv\0\0\0\0\0\0\0\x01"[..]));
    Ok(())
}

#[test]
fn test_serialized_size_is_tight() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut m = MutableProfile::new(ProfileClass::Input, ColorSpace::Rgb, ColorSpace::Lab);
    let mut expected = 128 + 4;
    for sig in SIGNATURES {
        let data = random_payload(&mut rng);
        expected += 12 + data.len().div_ceil(4) * 4;
        m.set_tag(TagSignature::from_bytes(*sig), Some(&data))?;
        // Churn leaves orphans behind in the working buffer
        m.set_tag(TagSignature::from_bytes(*sig), Some(&[0u8; 3]))?;
        m.set_tag(TagSignature::from_bytes(*sig), Some(&data))?;
    }
    assert_eq!(m.raw_data().len(), expected);
    Ok(())
}
