//! Signatures and fixed-point numbers from ICC.1:2022 section 4

use std::fmt;

use crate::color::Xyz;

/// Four-character code newtype with ASCII display; bytes that are not
/// printable show as `?`
macro_rules! four_cc {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn from_bytes(b: [u8; 4]) -> Self {
                Self(u32::from_be_bytes(b))
            }

            pub const fn to_bytes(self) -> [u8; 4] {
                self.0.to_be_bytes()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text: String = self
                    .to_bytes()
                    .iter()
                    .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
                    .collect();
                f.write_str(&text)
            }
        }
    };
}

four_cc!(
    /// Key of a tag table entry
    TagSignature
);

four_cc!(
    /// First four bytes of every tag payload
    TypeSignature
);

impl TagSignature {
    pub const A2B0: Self = Self::from_bytes(*b"A2B0");
    pub const A2B1: Self = Self::from_bytes(*b"A2B1");
    pub const A2B2: Self = Self::from_bytes(*b"A2B2");
    pub const B2A0: Self = Self::from_bytes(*b"B2A0");
    pub const B2A1: Self = Self::from_bytes(*b"B2A1");
    pub const B2A2: Self = Self::from_bytes(*b"B2A2");
    pub const RED_COLORANT: Self = Self::from_bytes(*b"rXYZ");
    pub const GREEN_COLORANT: Self = Self::from_bytes(*b"gXYZ");
    pub const BLUE_COLORANT: Self = Self::from_bytes(*b"bXYZ");
    pub const RED_TRC: Self = Self::from_bytes(*b"rTRC");
    pub const GREEN_TRC: Self = Self::from_bytes(*b"gTRC");
    pub const BLUE_TRC: Self = Self::from_bytes(*b"bTRC");
    pub const GRAY_TRC: Self = Self::from_bytes(*b"kTRC");
    pub const MEDIA_WHITE: Self = Self::from_bytes(*b"wtpt");
    pub const MEDIA_BLACK: Self = Self::from_bytes(*b"bkpt");
    pub const CHAD: Self = Self::from_bytes(*b"chad");
    pub const DESC: Self = Self::from_bytes(*b"desc");
    pub const COPYRIGHT: Self = Self::from_bytes(*b"cprt");
    pub const GAMUT: Self = Self::from_bytes(*b"gamt");
    pub const PROFILE_SEQUENCE: Self = Self::from_bytes(*b"pseq");
    pub const NAMED_COLOR2: Self = Self::from_bytes(*b"ncl2");
    /// Apple video card gamma
    pub const VCGT: Self = Self::from_bytes(*b"vcgt");
}

impl TypeSignature {
    pub const XYZ: Self = Self::from_bytes(*b"XYZ ");
    pub const CURVE: Self = Self::from_bytes(*b"curv");
    pub const PARA: Self = Self::from_bytes(*b"para");
    pub const TEXT: Self = Self::from_bytes(*b"text");
    /// v2 `textDescriptionType`
    pub const DESC: Self = Self::from_bytes(*b"desc");
    pub const MLUC: Self = Self::from_bytes(*b"mluc");
    pub const LUT8: Self = Self::from_bytes(*b"mft1");
    pub const LUT16: Self = Self::from_bytes(*b"mft2");
    pub const LUTA2B: Self = Self::from_bytes(*b"mAB ");
    pub const LUTB2A: Self = Self::from_bytes(*b"mBA ");
    pub const SF32: Self = Self::from_bytes(*b"sf32");
    pub const VCGT: Self = Self::from_bytes(*b"vcgt");
}

/// s15Fixed16Number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct S15Fixed16(pub i32);

impl S15Fixed16 {
    /// Nearest representable value, saturating at the ends of the range
    pub fn from_f64(v: f64) -> Self {
        Self((v * 65536.0).round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 65536.0
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_be_bytes(bytes))
    }

    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// u8Fixed8Number, the single-gamma `curv` encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U8Fixed8(pub u16);

impl U8Fixed8 {
    pub fn from_f64(v: f64) -> Self {
        Self((v * 256.0).round().clamp(0.0, f64::from(u16::MAX)) as u16)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 256.0
    }
}

/// Three s15Fixed16 values as stored in `XYZ ` tags and the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XyzNumber {
    pub x: S15Fixed16,
    pub y: S15Fixed16,
    pub z: S15Fixed16,
}

impl XyzNumber {
    pub fn from_bytes(bytes: &[u8; 12]) -> Self {
        let word = |i: usize| {
            S15Fixed16::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
        };
        Self {
            x: word(0),
            y: word(4),
            z: word(8),
        }
    }

    pub fn to_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        for (chunk, v) in out.chunks_exact_mut(4).zip([self.x, self.y, self.z]) {
            chunk.copy_from_slice(&v.to_be_bytes());
        }
        out
    }

    pub fn to_xyz(&self) -> Xyz {
        Xyz::new(self.x.to_f64(), self.y.to_f64(), self.z.to_f64())
    }

    pub fn from_xyz(xyz: Xyz) -> Self {
        let [x, y, z] = xyz.to_array().map(S15Fixed16::from_f64);
        Self { x, y, z }
    }
}

/// dateTimeNumber: six big-endian u16 fields, UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeNumber {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl DateTimeNumber {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..12)?;
        let mut fields = bytes.chunks_exact(2).map(|p| u16::from_be_bytes([p[0], p[1]]));
        let mut next = || fields.next().unwrap_or_default();
        Some(Self {
            year: next(),
            month: next(),
            day: next(),
            hour: next(),
            minute: next(),
            second: next(),
        })
    }

    pub fn to_bytes(&self) -> [u8; 12] {
        let fields = [self.year, self.month, self.day, self.hour, self.minute, self.second];
        let mut out = [0u8; 12];
        for (chunk, v) in out.chunks_exact_mut(2).zip(fields) {
            chunk.copy_from_slice(&v.to_be_bytes());
        }
        out
    }

    /// An all-zero date means unset and passes
    pub fn is_plausible(&self) -> bool {
        *self == Self::default()
            || ((1..=12).contains(&self.month)
                && (1..=31).contains(&self.day)
                && self.hour < 24
                && self.minute < 60
                && self.second < 61)
    }
}
