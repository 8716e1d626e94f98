//! The 128-byte profile header (ICC.1:2022 section 7.2)
//!
//! Parsing keeps every byte, including the reserved tail, so an untouched
//! header writes back identically.

use std::fmt;

use crate::color::D50;
use crate::error::{Error, Result};

use super::io::{IccReader, IccWriter};
use super::types::{DateTimeNumber, XyzNumber};

/// `acsp` at byte 36
pub const PROFILE_SIGNATURE: u32 = u32::from_be_bytes(*b"acsp");

/// Header length, and the minimum length of any profile
pub const HEADER_SIZE: usize = 128;

/// Byte range of the profile ID within the header
pub(crate) const PROFILE_ID_RANGE: std::ops::Range<usize> = 84..100;
/// Byte range of the profile flags within the header
pub(crate) const FLAGS_RANGE: std::ops::Range<usize> = 44..48;
/// Byte range of the rendering intent within the header
pub(crate) const INTENT_RANGE: std::ops::Range<usize> = 64..68;

/// Decoded header; field comments give byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileHeader {
    /// 0
    pub size: u32,
    /// 4
    pub cmm_type: u32,
    /// 8
    pub version: ProfileVersion,
    /// 12
    pub device_class: ProfileClass,
    /// 16, the device side of the profile
    pub color_space: ColorSpace,
    /// 20; the output space for device links
    pub pcs: ColorSpace,
    /// 24
    pub creation_date: DateTimeNumber,
    /// 40
    pub platform: u32,
    /// 44, excluded from the profile ID
    pub flags: u32,
    /// 48
    pub manufacturer: u32,
    /// 52
    pub model: u32,
    /// 56
    pub attributes: u64,
    /// 64, excluded from the profile ID
    pub rendering_intent: RenderingIntent,
    /// 68
    pub illuminant: XyzNumber,
    /// 80
    pub creator: u32,
    /// 84, MD5 of the profile or all zero
    pub profile_id: [u8; 16],
    /// 100..128
    pub reserved: [u8; 28],
}

impl ProfileHeader {
    /// Header for a new, empty v4.3 profile with a D50 illuminant
    pub fn new(device_class: ProfileClass, color_space: ColorSpace, pcs: ColorSpace) -> Self {
        Self {
            size: HEADER_SIZE as u32,
            cmm_type: 0,
            version: ProfileVersion::V4_3,
            device_class,
            color_space,
            pcs,
            creation_date: DateTimeNumber::default(),
            platform: 0,
            flags: 0,
            manufacturer: 0,
            model: 0,
            attributes: 0,
            rendering_intent: RenderingIntent::Perceptual,
            illuminant: XyzNumber::from_xyz(D50),
            creator: 0,
            profile_id: [0; 16],
            reserved: [0; 28],
        }
    }

    /// Parse the header of a complete profile buffer.
    ///
    /// The size field must match `data.len()` exactly.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Self::parse_fields(data)?;
        if header.size as usize != data.len() {
            return Err(Error::MalformedHeader(format!(
                "size field says {} bytes, buffer holds {}",
                header.size,
                data.len()
            )));
        }
        Ok(header)
    }

    /// Parse and validate every header field except the size comparison
    pub fn parse_fields(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::MalformedHeader(format!(
                "need {HEADER_SIZE} header bytes, got {}",
                data.len()
            )));
        }
        let r = IccReader::new(&data[..HEADER_SIZE]);

        let signature = r.read_u32(36)?;
        if signature != PROFILE_SIGNATURE {
            return Err(Error::MalformedHeader(format!(
                "missing 'acsp' magic, found {signature:#010x}"
            )));
        }

        let version = ProfileVersion::from_bytes(r.slice(8, 4)?);
        let device_class = ProfileClass::from_u32(r.read_u32(12)?)?;
        let color_space = ColorSpace::from_u32(r.read_u32(16)?)?;
        let pcs = ColorSpace::from_u32(r.read_u32(20)?)?;
        let creation_date = DateTimeNumber::from_bytes(r.slice(24, 12)?).unwrap_or_default();
        let rendering_intent = RenderingIntent::from_u32(r.read_u32(64)?)?;

        let mut profile_id = [0u8; 16];
        profile_id.copy_from_slice(r.slice(PROFILE_ID_RANGE.start, 16)?);
        let mut reserved = [0u8; 28];
        reserved.copy_from_slice(r.slice(100, 28)?);

        Ok(Self {
            size: r.read_u32(0)?,
            cmm_type: r.read_u32(4)?,
            version,
            device_class,
            color_space,
            pcs,
            creation_date,
            platform: r.read_u32(40)?,
            flags: r.read_u32(44)?,
            manufacturer: r.read_u32(48)?,
            model: r.read_u32(52)?,
            attributes: r.read_u64(56)?,
            rendering_intent,
            illuminant: r.read_xyz(68)?,
            creator: r.read_u32(80)?,
            profile_id,
            reserved,
        })
    }

    /// Serialize to the exact 128-byte layout [`parse`](Self::parse) reads
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut w = IccWriter::with_capacity(HEADER_SIZE);
        self.write_to(&mut w);
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(w.as_slice());
        out
    }

    pub(crate) fn write_to(&self, w: &mut IccWriter) {
        w.write_u32(self.size);
        w.write_u32(self.cmm_type);
        w.write_bytes(&self.version.to_bytes());
        w.write_u32(self.device_class.to_u32());
        w.write_u32(self.color_space.to_u32());
        w.write_u32(self.pcs.to_u32());
        w.write_bytes(&self.creation_date.to_bytes());
        w.write_u32(PROFILE_SIGNATURE);
        w.write_u32(self.platform);
        w.write_u32(self.flags);
        w.write_u32(self.manufacturer);
        w.write_u32(self.model);
        w.write_u64(self.attributes);
        w.write_u32(self.rendering_intent.to_u32());
        w.write_xyz(&self.illuminant);
        w.write_u32(self.creator);
        w.write_bytes(&self.profile_id);
        w.write_bytes(&self.reserved);
    }
}

/// Byte 8 is the major version, byte 9 holds minor and bug-fix nibbles,
/// bytes 10..12 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub reserved: u16,
}

impl ProfileVersion {
    pub const V4_3: Self = Self::new(4, 3, 0);

    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
            reserved: 0,
        }
    }

    fn from_bytes(b: &[u8]) -> Self {
        Self {
            major: b[0],
            minor: b[1] >> 4,
            patch: b[1] & 0x0F,
            reserved: u16::from_be_bytes([b[2], b[3]]),
        }
    }

    fn to_bytes(self) -> [u8; 4] {
        let [r0, r1] = self.reserved.to_be_bytes();
        [self.major, (self.minor << 4) | (self.patch & 0x0F), r0, r1]
    }
}

impl fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Device class at byte 12
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileClass {
    /// `scnr`
    Input,
    /// `mntr`
    Display,
    /// `prtr`
    Output,
    /// `link`: device to device, with the output space in the PCS field
    DeviceLink,
    /// `spac`
    ColorSpace,
    /// `abst`
    Abstract,
    /// `nmcl`
    NamedColor,
}

impl ProfileClass {
    const TABLE: [(Self, [u8; 4]); 7] = [
        (Self::Input, *b"scnr"),
        (Self::Display, *b"mntr"),
        (Self::Output, *b"prtr"),
        (Self::DeviceLink, *b"link"),
        (Self::ColorSpace, *b"spac"),
        (Self::Abstract, *b"abst"),
        (Self::NamedColor, *b"nmcl"),
    ];

    pub fn from_u32(val: u32) -> Result<Self> {
        lookup(&Self::TABLE, val)
            .ok_or_else(|| Error::MalformedHeader(format!("unknown profile class {val:#010x}")))
    }

    pub fn to_u32(&self) -> u32 {
        signature_of(&Self::TABLE, *self)
    }
}

fn lookup<T: Copy>(table: &[(T, [u8; 4])], val: u32) -> Option<T> {
    let bytes = val.to_be_bytes();
    table.iter().find(|(_, sig)| *sig == bytes).map(|(v, _)| *v)
}

fn signature_of<T: Copy + PartialEq>(table: &[(T, [u8; 4])], value: T) -> u32 {
    table
        .iter()
        .find(|(v, _)| *v == value)
        .map(|(_, sig)| u32::from_be_bytes(*sig))
        .unwrap_or_default()
}

/// Data color space at byte 16, PCS at byte 20
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Xyz,
    Lab,
    Luv,
    YCbCr,
    Yxy,
    Rgb,
    Gray,
    Hsv,
    Hls,
    Cmyk,
    Cmy,
    Color2,
    Color3,
    Color4,
    Color5,
    Color6,
    Color7,
    Color8,
    Color9,
    Color10,
    Color11,
    Color12,
    Color13,
    Color14,
    Color15,
}

impl ColorSpace {
    const TABLE: [(Self, [u8; 4]); 25] = [
        (Self::Xyz, *b"XYZ "),
        (Self::Lab, *b"Lab "),
        (Self::Luv, *b"Luv "),
        (Self::YCbCr, *b"YCbr"),
        (Self::Yxy, *b"Yxy "),
        (Self::Rgb, *b"RGB "),
        (Self::Gray, *b"GRAY"),
        (Self::Hsv, *b"HSV "),
        (Self::Hls, *b"HLS "),
        (Self::Cmyk, *b"CMYK"),
        (Self::Cmy, *b"CMY "),
        (Self::Color2, *b"2CLR"),
        (Self::Color3, *b"3CLR"),
        (Self::Color4, *b"4CLR"),
        (Self::Color5, *b"5CLR"),
        (Self::Color6, *b"6CLR"),
        (Self::Color7, *b"7CLR"),
        (Self::Color8, *b"8CLR"),
        (Self::Color9, *b"9CLR"),
        (Self::Color10, *b"ACLR"),
        (Self::Color11, *b"BCLR"),
        (Self::Color12, *b"CCLR"),
        (Self::Color13, *b"DCLR"),
        (Self::Color14, *b"ECLR"),
        (Self::Color15, *b"FCLR"),
    ];

    pub fn from_u32(val: u32) -> Result<Self> {
        lookup(&Self::TABLE, val)
            .ok_or_else(|| Error::MalformedHeader(format!("unknown color space {val:#010x}")))
    }

    pub fn to_u32(&self) -> u32 {
        signature_of(&Self::TABLE, *self)
    }

    /// XYZ and Lab can serve as a profile connection space
    pub fn is_pcs(&self) -> bool {
        matches!(self, Self::Xyz | Self::Lab)
    }

    /// Components per pixel
    pub fn channels(&self) -> usize {
        let [lead, .., last] = signature_of(&Self::TABLE, *self).to_be_bytes();
        match (self, lead) {
            (Self::Gray, _) => 1,
            (Self::Cmyk, _) => 4,
            // nCLR, with n a hex digit
            (_, b'2'..=b'9') if last == b'R' => usize::from(lead - b'0'),
            (_, b'A'..=b'F') if last == b'R' => usize::from(lead - b'A') + 10,
            _ => 3,
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = self.to_u32().to_be_bytes();
        f.write_str(String::from_utf8_lossy(&sig).trim_end())
    }
}

/// Header intent at byte 64; also selects the LUT tag at transform time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingIntent {
    #[default]
    Perceptual,
    RelativeColorimetric,
    Saturation,
    /// Relative colorimetric rescaled to the media white
    AbsoluteColorimetric,
}

impl RenderingIntent {
    pub const ALL: [Self; 4] = [
        Self::Perceptual,
        Self::RelativeColorimetric,
        Self::Saturation,
        Self::AbsoluteColorimetric,
    ];

    pub fn from_u32(val: u32) -> Result<Self> {
        usize::try_from(val)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| {
                Error::MalformedHeader(format!("rendering intent {val} is not in 0..=3"))
            })
    }

    pub fn to_u32(&self) -> u32 {
        *self as u32
    }
}
