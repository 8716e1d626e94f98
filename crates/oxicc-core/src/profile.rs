//! ICC profile object
//!
//! A [`Profile`] owns the profile bytes together with the parsed header and
//! tag table. It never changes after parsing: tag lookups are zero-copy
//! views into the backing buffer and typed decoding happens on demand.
//! Use [`Profile::to_mutable`] to edit a private copy.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::builder::MutableProfile;
use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::icc::header::{FLAGS_RANGE, INTENT_RANGE, PROFILE_ID_RANGE};
use crate::icc::md5::Md5;
use crate::icc::{
    ColorSpace, Curve, ProfileClass, ProfileHeader, TagData, TagSignature, TagTable, VcgtData,
    VcgtFormula,
};
use crate::math::Matrix3x3;
use crate::standard::StandardProfile;
use crate::verify::{self, Issue};

/// Largest deviation from a pure power law still reported as a gamma
pub const GAMMA_FIT_TOLERANCE: f64 = 0.06;

/// Samples used for the power-law fit, away from both ends of the curve
const GAMMA_FIT_SAMPLES: std::ops::Range<u32> = 3..62;
const GAMMA_FIT_STEPS: f64 = 64.0;

/// ICC Color Profile
///
/// Supports ICC v2 and v4 profiles of every class. Parsing validates the
/// header and the tag table; tag contents are only checked when decoded
/// or by [`verify`](Self::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    header: ProfileHeader,
    table: TagTable,
    data: Vec<u8>,
}

impl Profile {
    /// Parse a complete profile
    pub fn parse(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let header = ProfileHeader::parse(&data)?;
        let table = TagTable::parse(&data)?;
        debug!(
            class = ?header.device_class,
            space = %header.color_space,
            pcs = %header.pcs,
            version = %header.version,
            tags = table.len(),
            "parsed ICC profile"
        );
        Ok(Self {
            header,
            table,
            data,
        })
    }

    /// Read and parse a profile file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(std::fs::read(path)?)
    }

    /// Resolve a built-in profile by name, e.g. `"sRGB"` or `"Display P3"`
    pub fn named(name: &str) -> Result<Option<Self>> {
        StandardProfile::from_name(name)
            .map(StandardProfile::to_profile)
            .transpose()
    }

    pub fn header(&self) -> &ProfileHeader {
        &self.header
    }

    pub fn tag_table(&self) -> &TagTable {
        &self.table
    }

    pub fn device_class(&self) -> ProfileClass {
        self.header.device_class
    }

    pub fn color_space(&self) -> ColorSpace {
        self.header.color_space
    }

    pub fn pcs(&self) -> ColorSpace {
        self.header.pcs
    }

    /// Raw bytes of a tag, zero-copy
    pub fn tag(&self, signature: TagSignature) -> Option<&[u8]> {
        self.table
            .get(signature)
            .and_then(|e| self.data.get(e.range()))
    }

    pub fn contains_tag(&self, signature: TagSignature) -> bool {
        self.table.contains(signature)
    }

    /// Tag signatures in table order
    pub fn tag_signatures(&self) -> Vec<TagSignature> {
        self.table.signatures().collect()
    }

    pub fn tag_count(&self) -> usize {
        self.table.len()
    }

    /// Decode a tag. `Ok(None)` when the tag is absent.
    pub fn tag_data(&self, signature: TagSignature) -> Result<Option<TagData>> {
        self.tag(signature)
            .map(|bytes| TagData::parse(bytes, signature))
            .transpose()
    }

    /// Decode a tag that must be present
    pub(crate) fn require(&self, signature: TagSignature) -> Result<TagData> {
        self.tag_data(signature)?
            .ok_or(Error::MissingTag(signature))
    }

    /// Decode a tone curve tag
    pub fn curve(&self, signature: TagSignature) -> Result<Curve> {
        match self.require(signature)? {
            TagData::Curve(c) => Ok(c),
            other => Err(Error::malformed_tag(
                signature,
                format!("expected a curve, found '{}'", other.type_signature()),
            )),
        }
    }

    /// Decode a single-value `XYZ ` tag
    pub fn xyz(&self, signature: TagSignature) -> Result<Xyz> {
        let data = self.require(signature)?;
        data.as_xyz().ok_or_else(|| {
            Error::malformed_tag(
                signature,
                format!("expected XYZ, found '{}'", data.type_signature()),
            )
        })
    }

    /// Colorant matrix built from rXYZ/gXYZ/bXYZ (columns)
    pub fn colorant_matrix(&self) -> Result<Matrix3x3> {
        Ok(Matrix3x3::from_columns(
            self.xyz(TagSignature::RED_COLORANT)?,
            self.xyz(TagSignature::GREEN_COLORANT)?,
            self.xyz(TagSignature::BLUE_COLORANT)?,
        ))
    }

    /// Media white point (`wtpt`), if present and decodable
    pub fn media_white_point(&self) -> Option<Xyz> {
        self.xyz(TagSignature::MEDIA_WHITE).ok()
    }

    /// Media black point (`bkpt`), if present and decodable
    pub fn media_black_point(&self) -> Option<Xyz> {
        self.xyz(TagSignature::MEDIA_BLACK).ok()
    }

    /// The complete profile bytes
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Profile ID check value.
    ///
    /// `None` when the stored ID is all zero (no ID assigned); otherwise the
    /// MD5 of the profile with flags, intent and ID zeroed.
    pub fn digest(&self) -> Option<[u8; 16]> {
        if self.header.profile_id == [0; 16] {
            None
        } else {
            Some(self.computed_digest())
        }
    }

    /// MD5 over the profile with the header flags, rendering intent and
    /// profile ID fields zeroed (ICC.1:2022 section 7.2.18)
    pub fn computed_digest(&self) -> [u8; 16] {
        profile_digest(&self.data)
    }

    /// True when a stored ID is present and matches the computed digest
    pub fn has_valid_id(&self) -> bool {
        self.digest() == Some(self.header.profile_id)
    }

    /// Stamp the computed profile ID into the header and bytes
    pub fn with_profile_id(mut self) -> Self {
        let id = self.computed_digest();
        self.data[PROFILE_ID_RANGE].copy_from_slice(&id);
        self.header.profile_id = id;
        self
    }

    /// Approximate gamma of the tone curves.
    ///
    /// Pure power curves report their exponent; other curves are fitted to
    /// a power law in the log domain and rejected when the fit deviates by
    /// more than [`GAMMA_FIT_TOLERANCE`]. RGB channels are averaged.
    pub fn estimate_gamma(&self) -> Result<f64> {
        let signatures: &[TagSignature] = if self.contains_tag(TagSignature::RED_TRC) {
            &[
                TagSignature::RED_TRC,
                TagSignature::GREEN_TRC,
                TagSignature::BLUE_TRC,
            ]
        } else if self.contains_tag(TagSignature::GRAY_TRC) {
            &[TagSignature::GRAY_TRC]
        } else {
            return Err(Error::EstimationFailed("profile has no tone curves".into()));
        };

        let mut total = 0.0;
        for &sig in signatures {
            let curve = self
                .curve(sig)
                .map_err(|e| Error::EstimationFailed(e.to_string()))?;
            total += fit_gamma(&curve)
                .map_err(|reason| Error::EstimationFailed(format!("{sig}: {reason}")))?;
        }
        Ok(total / signatures.len() as f64)
    }

    fn text_tag(&self, signature: TagSignature) -> Option<String> {
        match self.tag_data(signature) {
            Ok(Some(data)) => data.as_text().map(str::to_owned),
            _ => None,
        }
    }

    /// Profile description (`desc`), from a `desc`, `mluc` or `text` element
    pub fn description(&self) -> Option<String> {
        self.text_tag(TagSignature::DESC)
    }

    /// Copyright notice (`cprt`)
    pub fn copyright(&self) -> Option<String> {
        self.text_tag(TagSignature::COPYRIGHT)
    }

    fn vcgt(&self) -> Option<VcgtData> {
        match self.tag_data(TagSignature::VCGT) {
            Ok(Some(TagData::Vcgt(v))) => Some(v),
            _ => None,
        }
    }

    /// Video card gamma ramps resampled to `samples` points per channel
    pub fn display_transfer_tables(&self, samples: usize) -> Option<Vec<[f32; 3]>> {
        if samples < 2 {
            return None;
        }
        let vcgt = self.vcgt()?;
        let max = (samples - 1) as f64;
        Some(
            (0..samples)
                .map(|i| vcgt.eval(i as f64 / max).map(|v| v as f32))
                .collect(),
        )
    }

    /// Video card gamma formula, when stored in formula form
    pub fn display_transfer_formula(&self) -> Option<[VcgtFormula; 3]> {
        match self.vcgt()? {
            VcgtData::Formula(f) => Some(f),
            VcgtData::Table(_) => None,
        }
    }

    /// Run the conformance checks.
    ///
    /// Returns the warnings when the profile is usable, or
    /// [`Error::VerificationFailed`] carrying every error and warning.
    pub fn verify(&self) -> Result<Vec<Issue>> {
        verify::verify(self)
    }

    /// Private, editable copy
    pub fn to_mutable(&self) -> MutableProfile {
        MutableProfile::from_profile(self)
    }
}

/// MD5 with flags, rendering intent and profile ID treated as zero
pub(crate) fn profile_digest(data: &[u8]) -> [u8; 16] {
    let mut h = Md5::new();
    let mut last = 0;
    for range in [FLAGS_RANGE, INTENT_RANGE, PROFILE_ID_RANGE] {
        if range.start > data.len() {
            break;
        }
        h.update(&data[last..range.start]);
        h.update(&[0u8; 16][..range.len()]);
        last = range.end.min(data.len());
    }
    h.update(&data[last..]);
    h.finalize()
}

/// Power-law exponent of a tone curve
pub(crate) fn fit_gamma(curve: &Curve) -> std::result::Result<f64, String> {
    if let Some(g) = curve.exact_gamma() {
        return Ok(g);
    }

    let (mut num, mut den) = (0.0, 0.0);
    let mut points = Vec::new();
    for i in GAMMA_FIT_SAMPLES {
        let x = i as f64 / GAMMA_FIT_STEPS;
        let y = curve.eval(x);
        if y <= 1e-6 {
            continue;
        }
        let (lx, ly) = (x.ln(), y.ln());
        num += lx * ly;
        den += lx * lx;
        points.push((x, y));
    }
    if points.len() < 8 || den <= 0.0 {
        return Err("curve is flat or empty".into());
    }

    let gamma = num / den;
    let worst = points
        .iter()
        .map(|&(x, y)| (x.powf(gamma) - y).abs())
        .fold(0.0, f64::max);
    if !gamma.is_finite() || gamma <= 0.0 || worst > GAMMA_FIT_TOLERANCE {
        return Err(format!(
            "no clean power-law fit (gamma {gamma:.3}, max deviation {worst:.3})"
        ));
    }
    Ok(gamma)
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ICC v{} {:?} {} -> {} ({} tags, {} bytes)",
            self.header.version,
            self.header.device_class,
            self.header.color_space,
            self.header.pcs,
            self.table.len(),
            self.data.len()
        )?;
        if let Some(desc) = self.description() {
            write!(f, " \"{desc}\"")?;
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Profile {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::icc::header::tests::sample_header_bytes;
    use crate::icc::{IccWriter, TextData};
    use crate::math::ParametricCurve;

    /// Assemble a profile from a header template and tag elements
    pub(crate) fn assemble(tags: &[(TagSignature, Vec<u8>)]) -> Vec<u8> {
        let table_len = 4 + 12 * tags.len();
        let mut offset = 128 + table_len;
        let mut table = IccWriter::new();
        let mut payload = IccWriter::new();
        table.write_u32(tags.len() as u32);
        for (sig, bytes) in tags {
            table.write_signature(*sig);
            table.write_u32(offset as u32);
            table.write_u32(bytes.len() as u32);
            payload.write_bytes(bytes);
            payload.pad_to_alignment(4);
            offset = 128 + table_len + payload.len();
        }
        let size = 128 + table_len + payload.len();
        let mut data = sample_header_bytes(size as u32);
        data.extend_from_slice(table.as_slice());
        data.extend_from_slice(payload.as_slice());
        data
    }

    fn element(data: TagData) -> Vec<u8> {
        data.to_bytes().unwrap()
    }

    fn curve_element(curve: Curve) -> Vec<u8> {
        element(TagData::Curve(curve))
    }

    #[test]
    fn test_minimal_profile() {
        let data = assemble(&[]);
        assert_eq!(data.len(), 132);
        let p = Profile::parse(data.clone()).unwrap();
        assert_eq!(p.tag_count(), 0);
        assert_eq!(p.raw_data(), &data[..]);

        assert!(matches!(
            Profile::parse(&data[..131]),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_tag_lookup_is_exact() {
        let desc = element(TagData::Text(TextData::description("Test RGB")));
        let data = assemble(&[(TagSignature::DESC, desc.clone())]);
        let p = Profile::parse(data).unwrap();
        assert_eq!(p.tag(TagSignature::DESC), Some(&desc[..]));
        assert_eq!(p.description().as_deref(), Some("Test RGB"));
        assert!(p.tag(TagSignature::COPYRIGHT).is_none());
        assert!(p.tag_data(TagSignature::COPYRIGHT).unwrap().is_none());
        assert!(p.to_string().contains("Test RGB"));
    }

    #[test]
    fn test_digest_none_when_unset() {
        let p = Profile::parse(assemble(&[])).unwrap();
        assert!(p.digest().is_none());
        assert!(!p.has_valid_id());
    }

    #[test]
    fn test_profile_id_stamping() {
        let p = Profile::parse(assemble(&[])).unwrap();
        let computed = p.computed_digest();
        let stamped = p.with_profile_id();
        assert_eq!(stamped.header().profile_id, computed);
        // Stamping does not change the digest input
        assert_eq!(stamped.digest(), Some(computed));
        assert!(stamped.has_valid_id());

        let reparsed = Profile::parse(stamped.raw_data().to_vec()).unwrap();
        assert_eq!(reparsed.digest(), stamped.digest());
    }

    #[test]
    fn test_digest_ignores_flags_and_intent() {
        let mut data = assemble(&[]);
        let a = profile_digest(&data);
        data[47] = 1;
        data[67] = 3;
        assert_eq!(profile_digest(&data), a);
        data[100] = 1;
        assert_ne!(profile_digest(&data), a);
    }

    #[test]
    fn test_estimate_gamma_exact() {
        let trc = curve_element(Curve::Gamma(2.2));
        let data = assemble(&[
            (TagSignature::RED_TRC, trc.clone()),
            (TagSignature::GREEN_TRC, trc.clone()),
            (TagSignature::BLUE_TRC, trc),
        ]);
        let g = Profile::parse(data).unwrap().estimate_gamma().unwrap();
        assert!((g - 2.19921875).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_gamma_fitted_table() {
        let table: Vec<u16> = (0..1024)
            .map(|i| ((i as f64 / 1023.0).powf(1.8) * 65535.0).round() as u16)
            .collect();
        let data = assemble(&[(TagSignature::GRAY_TRC, curve_element(Curve::Table(table)))]);
        let g = Profile::parse(data).unwrap().estimate_gamma().unwrap();
        assert!((g - 1.8).abs() < 0.01, "fitted {g}");
    }

    #[test]
    fn test_estimate_gamma_srgb_parametric() {
        let data = assemble(&[(
            TagSignature::GRAY_TRC,
            curve_element(Curve::Parametric(ParametricCurve::srgb())),
        )]);
        let g = Profile::parse(data).unwrap().estimate_gamma().unwrap();
        assert!(g > 1.9 && g < 2.3, "sRGB fit {g}");
    }

    #[test]
    fn test_estimate_gamma_failures() {
        let s_curve: Vec<u16> = (0..256)
            .map(|i| {
                let x = i as f64 / 255.0;
                ((3.0 * x * x - 2.0 * x * x * x) * 65535.0).round() as u16
            })
            .collect();
        let data = assemble(&[(TagSignature::GRAY_TRC, curve_element(Curve::Table(s_curve)))]);
        assert!(matches!(
            Profile::parse(data).unwrap().estimate_gamma(),
            Err(Error::EstimationFailed(_))
        ));

        let empty = Profile::parse(assemble(&[])).unwrap();
        assert!(matches!(
            empty.estimate_gamma(),
            Err(Error::EstimationFailed(_))
        ));
    }

    #[test]
    fn test_display_transfer() {
        let vcgt = VcgtData::Formula([VcgtFormula {
            gamma: 2.0,
            min: 0.0,
            max: 1.0,
        }; 3]);
        let data = assemble(&[(TagSignature::VCGT, element(TagData::Vcgt(vcgt)))]);
        let p = Profile::parse(data).unwrap();
        let tables = p.display_transfer_tables(3).unwrap();
        assert_eq!(tables.len(), 3);
        assert!((tables[1][0] - 0.25).abs() < 1e-6);
        assert_eq!(p.display_transfer_formula().unwrap()[2].gamma, 2.0);
        assert!(p.display_transfer_tables(1).is_none());
    }

    #[test]
    fn test_colorant_matrix_missing() {
        let p = Profile::parse(assemble(&[])).unwrap();
        assert!(matches!(
            p.colorant_matrix(),
            Err(Error::MissingTag(TagSignature::RED_COLORANT))
        ));
    }
}
