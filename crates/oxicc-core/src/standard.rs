//! Built-in display profiles
//!
//! Matrix-shaper and gray profiles synthesized from primaries and transfer
//! functions. Every profile is a v4.3 display profile: colorants adapted
//! to D50 with Bradford, a D50 media white point, a `chad` tag for the RGB
//! spaces, shared `para` tone curves and `mluc` text.

use std::fmt;

use crate::builder::{HeaderField, MutableProfile};
use crate::color::{D50, D65};
use crate::error::Result;
use crate::icc::{
    ColorSpace, Curve, DateTimeNumber, ProfileClass, TagData, TagSignature, TextData, XyzNumber,
};
use crate::math::{Matrix3x3, ParametricCurve, bradford_adaptation};
use crate::profile::Profile;

const COPYRIGHT: &str = "No copyright, use freely";

/// Fixed creation date so built profiles are byte-for-byte reproducible
const CREATED: DateTimeNumber = DateTimeNumber {
    year: 2024,
    month: 1,
    day: 1,
    hour: 0,
    minute: 0,
    second: 0,
};

/// Adobe RGB (1998) gamma, 2 + 51/256 as stored in u8Fixed8
const ADOBE_RGB_GAMMA: f64 = 563.0 / 256.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardProfile {
    Srgb,
    LinearSrgb,
    DisplayP3,
    AdobeRgb,
    Rec2020,
    GrayGamma22,
    GrayLinear,
}

impl StandardProfile {
    pub const ALL: [Self; 7] = [
        Self::Srgb,
        Self::LinearSrgb,
        Self::DisplayP3,
        Self::AdobeRgb,
        Self::Rec2020,
        Self::GrayGamma22,
        Self::GrayLinear,
    ];

    /// Description written into the profile
    pub fn name(self) -> &'static str {
        match self {
            Self::Srgb => "sRGB IEC61966-2.1",
            Self::LinearSrgb => "Linear sRGB",
            Self::DisplayP3 => "Display P3",
            Self::AdobeRgb => "Adobe RGB (1998)",
            Self::Rec2020 => "ITU-R BT.2020",
            Self::GrayGamma22 => "Generic Gray Gamma 2.2",
            Self::GrayLinear => "Linear Gray",
        }
    }

    /// Look up by name, ignoring case, spaces and punctuation.
    ///
    /// Accepts the descriptions from [`name`](Self::name) as well as common
    /// short forms such as `"srgb"`, `"p3"`, `"bt2020"` or `"gray"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let found = match key.as_str() {
            "srgb" | "srgbiec6196621" => Self::Srgb,
            "linearsrgb" | "srgblinear" => Self::LinearSrgb,
            "displayp3" | "p3" => Self::DisplayP3,
            "adobergb" | "adobergb1998" => Self::AdobeRgb,
            "rec2020" | "bt2020" | "iturbt2020" => Self::Rec2020,
            "gray" | "graygamma22" | "genericgraygamma22" => Self::GrayGamma22,
            "lineargray" | "graylinear" => Self::GrayLinear,
            _ => return None,
        };
        Some(found)
    }

    /// xy chromaticities of the red, green and blue primaries
    fn primaries(self) -> Option<[(f64, f64); 3]> {
        match self {
            Self::Srgb | Self::LinearSrgb => Some([(0.64, 0.33), (0.30, 0.60), (0.15, 0.06)]),
            Self::DisplayP3 => Some([(0.680, 0.320), (0.265, 0.690), (0.150, 0.060)]),
            Self::AdobeRgb => Some([(0.64, 0.33), (0.21, 0.71), (0.15, 0.06)]),
            Self::Rec2020 => Some([(0.708, 0.292), (0.170, 0.797), (0.131, 0.046)]),
            Self::GrayGamma22 | Self::GrayLinear => None,
        }
    }

    fn transfer(self) -> ParametricCurve {
        match self {
            Self::Srgb | Self::DisplayP3 => ParametricCurve::srgb(),
            Self::Rec2020 => ParametricCurve::bt709(),
            Self::AdobeRgb => ParametricCurve::gamma(ADOBE_RGB_GAMMA),
            Self::GrayGamma22 => ParametricCurve::gamma(2.2),
            Self::LinearSrgb | Self::GrayLinear => ParametricCurve::gamma(1.0),
        }
    }

    /// Build the profile bytes and parse them
    pub fn to_profile(self) -> Result<Profile> {
        let space = match self.primaries() {
            Some(_) => ColorSpace::Rgb,
            None => ColorSpace::Gray,
        };
        let mut m = MutableProfile::new(ProfileClass::Display, space, ColorSpace::Xyz);
        m.set_header_field(HeaderField::CreationDate(CREATED))?;

        m.set_tag_data(
            TagSignature::DESC,
            &TagData::Text(TextData::localized(self.name())),
        )?;
        m.set_tag_data(
            TagSignature::COPYRIGHT,
            &TagData::Text(TextData::localized(COPYRIGHT)),
        )?;
        m.set_tag_data(
            TagSignature::MEDIA_WHITE,
            &TagData::Xyz(vec![XyzNumber::from_xyz(D50)]),
        )?;

        let trc = TagData::Curve(Curve::Parametric(self.transfer()));
        let Some(primaries) = self.primaries() else {
            m.set_tag_data(TagSignature::GRAY_TRC, &trc)?;
            return m.to_profile();
        };

        let chad = bradford_adaptation(D65, D50);
        let colorants = Matrix3x3::from_primaries(primaries, D65)
            .map(|rgb_to_xyz| chad.multiply(&rgb_to_xyz))
            .unwrap_or_default();
        m.set_tag_data(
            TagSignature::CHAD,
            &TagData::S15Fixed16Array(chad.m.iter().flatten().copied().collect()),
        )?;
        for (i, sig) in [
            TagSignature::RED_COLORANT,
            TagSignature::GREEN_COLORANT,
            TagSignature::BLUE_COLORANT,
        ]
        .into_iter()
        .enumerate()
        {
            let column = XyzNumber::from_xyz(colorants.column(i));
            m.set_tag_data(sig, &TagData::Xyz(vec![column]))?;
        }

        m.set_tag_data(TagSignature::RED_TRC, &trc)?;
        m.share_tag(TagSignature::GREEN_TRC, TagSignature::RED_TRC)?;
        m.share_tag(TagSignature::BLUE_TRC, TagSignature::RED_TRC)?;
        m.to_profile()
    }
}

impl fmt::Display for StandardProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
