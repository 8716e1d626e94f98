//! ICC Profile Tag Decoding and Encoding
//!
//! Tags contain the actual profile data. Each tag element has:
//! - A 4-byte type signature identifying the data format
//! - 4 reserved bytes
//! - Type-specific data
//!
//! Decoders receive the complete element, type header included, because
//! several types (`mluc`, `mAB `, `mBA `) store offsets relative to the
//! element start.
//!
//! See ICC.1:2022 Section 10.

mod curves;
mod lut;
mod text;
mod vcgt;
mod xyz;

pub use curves::Curve;
pub use lut::{Clut, LegacyLut, LutAb, LutAbKind, LutMatrix, LutPrecision, MAX_CLUT_INPUTS};
pub use text::{LocalizedString, TextData, TextKind};
pub use vcgt::{VcgtData, VcgtFormula};

use tracing::trace;

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::math::Matrix3x3;

use super::io::IccWriter;
use super::types::{TagSignature, TypeSignature, XyzNumber};

/// Decoder failure before the tag signature is known; [`TagData::parse`]
/// stamps the real signature on the way out.
pub(crate) fn invalid(reason: impl Into<String>) -> Error {
    Error::malformed_tag(TagSignature(0), reason)
}

/// Decoded tag element
#[derive(Debug, Clone, PartialEq)]
pub enum TagData {
    /// `XYZ ` (colorants, white and black point)
    Xyz(Vec<XyzNumber>),
    /// `curv` or `para`
    Curve(Curve),
    /// `text`, `desc` or `mluc`
    Text(TextData),
    /// `sf32` (chromatic adaptation)
    S15Fixed16Array(Vec<f64>),
    /// `mft1` or `mft2`
    Lut(LegacyLut),
    /// `mAB ` or `mBA `
    LutAb(LutAb),
    /// `vcgt`
    Vcgt(VcgtData),
    /// Any other type, kept verbatim
    Unknown {
        type_signature: TypeSignature,
        data: Vec<u8>,
    },
}

impl TagData {
    /// Decode a complete tag element stored under `signature`
    pub fn parse(data: &[u8], signature: TagSignature) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::malformed_tag(
                signature,
                format!("{} bytes is too small for a type header", data.len()),
            ));
        }
        let type_signature =
            TypeSignature(u32::from_be_bytes([data[0], data[1], data[2], data[3]]));
        trace!(tag = %signature, ty = %type_signature, len = data.len(), "decoding tag");

        let decoded = match type_signature {
            TypeSignature::XYZ => xyz::parse_xyz(data).map(Self::Xyz),
            TypeSignature::CURVE | TypeSignature::PARA => {
                Curve::read(&mut super::io::Cursor::new(data)).map(Self::Curve)
            }
            TypeSignature::TEXT => TextData::parse_text(data).map(Self::Text),
            TypeSignature::DESC => TextData::parse_desc(data).map(Self::Text),
            TypeSignature::MLUC => TextData::parse_mluc(data).map(Self::Text),
            TypeSignature::SF32 => xyz::parse_sf32(data).map(Self::S15Fixed16Array),
            TypeSignature::LUT8 => LegacyLut::parse(data, LutPrecision::U8).map(Self::Lut),
            TypeSignature::LUT16 => LegacyLut::parse(data, LutPrecision::U16).map(Self::Lut),
            TypeSignature::LUTA2B => LutAb::parse(data, LutAbKind::AToB).map(Self::LutAb),
            TypeSignature::LUTB2A => LutAb::parse(data, LutAbKind::BToA).map(Self::LutAb),
            TypeSignature::VCGT => VcgtData::parse(data).map(Self::Vcgt),
            _ => Ok(Self::Unknown {
                type_signature,
                data: data.to_vec(),
            }),
        };

        decoded.map_err(|e| match e {
            Error::MalformedTag { reason, .. } => Error::malformed_tag(signature, reason),
            other => Error::malformed_tag(signature, other.to_string()),
        })
    }

    /// Type signature this data encodes as
    pub fn type_signature(&self) -> TypeSignature {
        match self {
            Self::Xyz(_) => TypeSignature::XYZ,
            Self::Curve(Curve::Parametric(_)) => TypeSignature::PARA,
            Self::Curve(_) => TypeSignature::CURVE,
            Self::Text(t) => match t.kind {
                TextKind::Text => TypeSignature::TEXT,
                TextKind::Description => TypeSignature::DESC,
                TextKind::MultiLocalized => TypeSignature::MLUC,
            },
            Self::S15Fixed16Array(_) => TypeSignature::SF32,
            Self::Lut(l) => match l.precision {
                LutPrecision::U8 => TypeSignature::LUT8,
                LutPrecision::U16 => TypeSignature::LUT16,
            },
            Self::LutAb(l) => match l.kind {
                LutAbKind::AToB => TypeSignature::LUTA2B,
                LutAbKind::BToA => TypeSignature::LUTB2A,
            },
            Self::Vcgt(_) => TypeSignature::VCGT,
            Self::Unknown { type_signature, .. } => *type_signature,
        }
    }

    /// Encode as a complete tag element
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = IccWriter::new();
        match self {
            Self::Xyz(values) => xyz::write_xyz(values, &mut w),
            Self::Curve(c) => c.write(&mut w),
            Self::Text(t) => t.write(&mut w),
            Self::S15Fixed16Array(values) => xyz::write_sf32(values, &mut w),
            Self::Lut(l) => l.write(&mut w)?,
            Self::LutAb(l) => l.write(&mut w)?,
            Self::Vcgt(v) => v.write(&mut w),
            Self::Unknown { data, .. } => w.write_bytes(data),
        }
        Ok(w.into_inner())
    }

    /// Single XYZ value of an `XYZ ` tag
    pub fn as_xyz(&self) -> Option<Xyz> {
        match self {
            Self::Xyz(values) => xyz::first_xyz(values),
            _ => None,
        }
    }

    pub fn as_curve(&self) -> Option<&Curve> {
        match self {
            Self::Curve(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Row-major matrix of an `sf32` tag with at least nine values
    pub fn as_matrix(&self) -> Option<Matrix3x3> {
        match self {
            Self::S15Fixed16Array(values) => xyz::sf32_matrix(values),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::D50;
    use crate::math::ParametricCurve;

    #[test]
    fn test_dispatch_and_encode() {
        let cases = [
            TagData::Xyz(vec![XyzNumber::from_xyz(D50)]),
            TagData::Curve(Curve::Parametric(ParametricCurve::gamma(2.0))),
            TagData::Curve(Curve::Gamma(1.8)),
            TagData::Text(TextData::localized("Test profile")),
            TagData::Text(TextData::description("Test profile")),
            TagData::S15Fixed16Array(vec![1.0, 0.0, 0.5]),
        ];
        for data in cases {
            let bytes = data.to_bytes().unwrap();
            assert_eq!(&bytes[..4], &data.type_signature().0.to_be_bytes());
            let back = TagData::parse(&bytes, TagSignature::DESC).unwrap();
            assert_eq!(back.type_signature(), data.type_signature());
        }
    }

    #[test]
    fn test_errors_carry_signature() {
        let err = TagData::parse(b"curv\0\0\0\0\0\0\0\x09", TagSignature::RED_TRC).unwrap_err();
        match err {
            Error::MalformedTag { signature, .. } => assert_eq!(signature, TagSignature::RED_TRC),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(TagData::parse(b"curv", TagSignature::RED_TRC).is_err());
    }

    #[test]
    fn test_unknown_type_kept_verbatim() {
        let raw = b"ZZZZ\0\0\0\0payload".to_vec();
        let data = TagData::parse(&raw, TagSignature(0x7465_7374)).unwrap();
        assert_eq!(data.type_signature().to_string(), "ZZZZ");
        assert_eq!(data.to_bytes().unwrap(), raw);
    }

    #[test]
    fn test_accessors() {
        let xyz = TagData::Xyz(vec![XyzNumber::from_xyz(D50)]);
        assert!(xyz.as_xyz().is_some());
        assert!(xyz.as_curve().is_none());
        let text = TagData::Text(TextData::text("hello"));
        assert_eq!(text.as_text(), Some("hello"));
        let chad = TagData::S15Fixed16Array(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert!(chad.as_matrix().unwrap().is_identity(1e-9));
    }
}
