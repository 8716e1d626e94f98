//! Profile conformance checks
//!
//! Findings are split into errors (the profile cannot be used for the
//! transforms its class promises) and warnings (non-conformance that does
//! not stop it from working). Every check runs; nothing short-circuits.

use std::fmt;

use tracing::debug;

use crate::color::D50;
use crate::error::{Error, Result};
use crate::icc::header::HEADER_SIZE;
use crate::icc::{ColorSpace, ProfileClass, TagData, TagSignature};
use crate::profile::Profile;

/// Largest illuminant deviation from D50 accepted without a warning
const ILLUMINANT_TOLERANCE: f64 = 1.0 / 256.0;

/// One verification finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Tag the finding is about, if any
    pub tag: Option<TagSignature>,
    pub message: String,
}

impl Issue {
    fn general(message: impl Into<String>) -> Self {
        Self {
            tag: None,
            message: message.into(),
        }
    }

    fn tag(tag: TagSignature, message: impl Into<String>) -> Self {
        Self {
            tag: Some(tag),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(f, "[{tag}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Default)]
struct Report {
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
}

/// Expected element family of a transform tag
#[derive(Clone, Copy)]
enum Expect {
    Curve,
    Xyz,
    Lut,
    Decodable,
}

impl Expect {
    fn matches(self, data: &TagData) -> bool {
        match self {
            Self::Curve => matches!(data, TagData::Curve(_)),
            Self::Xyz => data.as_xyz().is_some(),
            Self::Lut => matches!(data, TagData::Lut(_) | TagData::LutAb(_)),
            Self::Decodable => true,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Curve => "curv/para",
            Self::Xyz => "XYZ",
            Self::Lut => "a LUT type",
            Self::Decodable => "any type",
        }
    }
}

const MATRIX_SHAPER: [(TagSignature, Expect); 6] = [
    (TagSignature::RED_COLORANT, Expect::Xyz),
    (TagSignature::GREEN_COLORANT, Expect::Xyz),
    (TagSignature::BLUE_COLORANT, Expect::Xyz),
    (TagSignature::RED_TRC, Expect::Curve),
    (TagSignature::GREEN_TRC, Expect::Curve),
    (TagSignature::BLUE_TRC, Expect::Curve),
];

/// Alternative sets of tags, any one of which makes the class usable
fn required_sets(profile: &Profile) -> Vec<Vec<(TagSignature, Expect)>> {
    let a2b0 = vec![(TagSignature::A2B0, Expect::Lut)];
    let both = vec![
        (TagSignature::A2B0, Expect::Lut),
        (TagSignature::B2A0, Expect::Lut),
    ];
    let gray = vec![(TagSignature::GRAY_TRC, Expect::Curve)];

    match (profile.device_class(), profile.color_space()) {
        (ProfileClass::Input | ProfileClass::Display, ColorSpace::Rgb) => {
            vec![MATRIX_SHAPER.to_vec(), a2b0]
        }
        (ProfileClass::Input | ProfileClass::Display, ColorSpace::Gray) => vec![gray, a2b0],
        (ProfileClass::Input | ProfileClass::Display, _) => vec![a2b0],
        (ProfileClass::Output, ColorSpace::Gray) => vec![gray, both],
        (ProfileClass::Output | ProfileClass::ColorSpace, _) => vec![both],
        (ProfileClass::DeviceLink | ProfileClass::Abstract, _) => vec![a2b0],
        (ProfileClass::NamedColor, _) => vec![vec![(
            TagSignature::NAMED_COLOR2,
            Expect::Decodable,
        )]],
    }
}

pub(crate) fn verify(profile: &Profile) -> Result<Vec<Issue>> {
    let mut report = Report::default();
    check_structure(profile, &mut report);
    check_required(profile, &mut report);
    check_header(profile, &mut report);

    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "verified profile"
    );
    if report.errors.is_empty() {
        Ok(report.warnings)
    } else {
        Err(Error::VerificationFailed {
            errors: report.errors,
            warnings: report.warnings,
        })
    }
}

fn check_structure(profile: &Profile, report: &mut Report) {
    let table = profile.tag_table();
    let data_start = HEADER_SIZE + table.serialized_len();

    for entry in table.entries() {
        if entry.size > 0 && (entry.offset as usize) < data_start {
            report.errors.push(Issue::tag(
                entry.signature,
                format!(
                    "data at offset {} overlaps the header or tag table (ends at {data_start})",
                    entry.offset
                ),
            ));
        }
        if entry.offset % 4 != 0 {
            report.warnings.push(Issue::tag(
                entry.signature,
                format!("offset {} is not 4-byte aligned", entry.offset),
            ));
        }
    }

    if profile.raw_data().len() % 4 != 0 {
        report.warnings.push(Issue::general(format!(
            "profile size {} is not a multiple of 4",
            profile.raw_data().len()
        )));
    }
}

fn check_required(profile: &Profile, report: &mut Report) {
    let sets = required_sets(profile);
    let mut checked = Vec::new();

    // The first alternative whose tags are all present decides the contents check
    let chosen = sets
        .iter()
        .find(|set| set.iter().all(|(sig, _)| profile.contains_tag(*sig)));

    match chosen {
        Some(set) => {
            for &(sig, expect) in set {
                checked.push(sig);
                match profile.tag_data(sig) {
                    Ok(Some(data)) if expect.matches(&data) => {}
                    Ok(Some(data)) => report.errors.push(Issue::tag(
                        sig,
                        format!(
                            "expected {}, found '{}'",
                            expect.name(),
                            data.type_signature()
                        ),
                    )),
                    Ok(None) => report.errors.push(Issue::tag(sig, "required tag is missing")),
                    Err(e) => report.errors.push(Issue::tag(sig, e.to_string())),
                }
            }
            if set.iter().any(|(sig, _)| *sig == TagSignature::RED_COLORANT) {
                match profile.colorant_matrix() {
                    Ok(m) if m.inverse().is_none() => report.errors.push(Issue::general(
                        "colorant matrix is singular and cannot be inverted",
                    )),
                    _ => {}
                }
            }
        }
        None => {
            let wanted: Vec<String> = sets
                .iter()
                .map(|set| {
                    set.iter()
                        .map(|(sig, _)| sig.to_string())
                        .collect::<Vec<_>>()
                        .join("+")
                })
                .collect();
            report.errors.push(Issue::general(format!(
                "{:?} profile needs one of: {}",
                profile.device_class(),
                wanted.join(" or ")
            )));
        }
    }

    let mut informative = vec![TagSignature::DESC, TagSignature::COPYRIGHT];
    if profile.device_class() != ProfileClass::DeviceLink {
        informative.push(TagSignature::MEDIA_WHITE);
    }
    for sig in informative {
        if !profile.contains_tag(sig) {
            report
                .warnings
                .push(Issue::tag(sig, "recommended tag is missing"));
        }
    }

    for sig in profile.tag_signatures() {
        if checked.contains(&sig) {
            continue;
        }
        if let Err(e) = profile.tag_data(sig) {
            report.warnings.push(Issue::tag(sig, e.to_string()));
        }
    }
}

fn check_header(profile: &Profile, report: &mut Report) {
    let header = profile.header();

    if header.device_class != ProfileClass::DeviceLink && !header.pcs.is_pcs() {
        report.errors.push(Issue::general(format!(
            "PCS must be XYZ or Lab, found {}",
            header.pcs
        )));
    }

    let illuminant = header.illuminant.to_xyz();
    if !illuminant.approx_eq(&D50, ILLUMINANT_TOLERANCE) {
        report.warnings.push(Issue::general(format!(
            "illuminant ({:.4}, {:.4}, {:.4}) is not D50",
            illuminant.x, illuminant.y, illuminant.z
        )));
    }

    if !matches!(header.version.major, 2 | 4) {
        report.warnings.push(Issue::general(format!(
            "unknown major version {}",
            header.version.major
        )));
    }

    if !header.creation_date.is_plausible() {
        report.warnings.push(Issue::general(format!(
            "implausible creation date {:?}",
            header.creation_date
        )));
    }

    if header.profile_id != [0; 16] && !profile.has_valid_id() {
        report
            .warnings
            .push(Issue::general("stored profile ID does not match the computed MD5"));
    }
}
