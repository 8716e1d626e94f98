//! Text Tag Types
//!
//! - textType (`text`): 7-bit ASCII, NUL terminated
//! - textDescriptionType (`desc`): v2 ASCII + Unicode + ScriptCode description
//! - multiLocalizedUnicodeType (`mluc`): v4 UTF-16BE records per locale
//!
//! See ICC.1:2022 Sections 10.15 and 10.24, ICC.1:2001-04 Section 6.5.17

use crate::error::Result;
use crate::icc::io::{Cursor, IccWriter};
use crate::icc::types::TypeSignature;

use super::invalid;

/// Which text encoding a [`TextData`] came from (and is written back as)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Text,
    Description,
    MultiLocalized,
}

/// One `mluc` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedString {
    /// ISO 639-1 language code, e.g. `*b"en"`
    pub language: [u8; 2],
    /// ISO 3166-1 country code, e.g. `*b"US"`
    pub country: [u8; 2],
    pub text: String,
}

impl LocalizedString {
    pub fn new(language: [u8; 2], country: [u8; 2], text: impl Into<String>) -> Self {
        Self {
            language,
            country,
            text: text.into(),
        }
    }
}

/// Decoded text tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextData {
    pub kind: TextKind,
    /// Primary text: the first English record for `mluc`, or the first record
    pub text: String,
    /// All `mluc` records (empty for the other kinds)
    pub localized: Vec<LocalizedString>,
}

impl TextData {
    /// Plain `text` content
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Text,
            text: text.into(),
            localized: Vec::new(),
        }
    }

    /// v2 `desc` content
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Description,
            text: text.into(),
            localized: Vec::new(),
        }
    }

    /// `mluc` with a single en-US record
    pub fn localized(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: TextKind::MultiLocalized,
            localized: vec![LocalizedString::new(*b"en", *b"US", text.clone())],
            text,
        }
    }

    /// Parse `text` (full tag bytes, including the type header)
    pub fn parse_text(data: &[u8]) -> Result<Self> {
        let body = data.get(8..).ok_or_else(|| invalid("text tag too small"))?;
        let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
        Ok(Self::text(String::from_utf8_lossy(&body[..end]).into_owned()))
    }

    /// Parse v2 `desc` (full tag bytes)
    ///
    /// The ASCII part is authoritative; the Unicode part is only used when
    /// the ASCII string is empty.
    pub fn parse_desc(data: &[u8]) -> Result<Self> {
        let mut c = Cursor::at(data, 8);
        let ascii_len = c.u32()? as usize;
        if ascii_len > c.remaining() {
            return Err(invalid(format!("desc ASCII length {ascii_len} exceeds tag")));
        }
        let ascii = c.bytes(ascii_len)?;
        let end = ascii.iter().position(|&b| b == 0).unwrap_or(ascii.len());
        let mut text = String::from_utf8_lossy(&ascii[..end]).into_owned();

        if text.is_empty() && c.remaining() >= 8 {
            let _language = c.u32()?;
            let units = c.u32()? as usize;
            if units <= c.remaining() / 2 {
                let raw = c.bytes(units * 2)?;
                text = decode_utf16be(raw).trim_end_matches('\0').to_string();
            }
        }

        Ok(Self::description(text))
    }

    /// Parse `mluc` (full tag bytes; record offsets are relative to the tag start)
    pub fn parse_mluc(data: &[u8]) -> Result<Self> {
        let mut c = Cursor::at(data, 8);
        let count = c.u32()? as usize;
        let record_size = c.u32()? as usize;
        if record_size < 12 {
            return Err(invalid(format!("mluc record size {record_size} below 12")));
        }
        if count > c.remaining() / record_size {
            return Err(invalid(format!("mluc record count {count} exceeds tag")));
        }

        let mut localized = Vec::with_capacity(count);
        for i in 0..count {
            let mut r = Cursor::at(data, 16 + i * record_size);
            let lang = r.u16()?.to_be_bytes();
            let country = r.u16()?.to_be_bytes();
            let len = r.u32()? as usize;
            let offset = r.u32()? as usize;
            let raw = Cursor::at(data, offset).bytes(len)?;
            localized.push(LocalizedString::new(lang, country, decode_utf16be(raw)));
        }

        let text = localized
            .iter()
            .find(|s| &s.language == b"en")
            .or_else(|| localized.first())
            .map(|s| s.text.clone())
            .unwrap_or_default();

        Ok(Self {
            kind: TextKind::MultiLocalized,
            text,
            localized,
        })
    }

    /// Text for a locale, falling back to the primary text
    pub fn get_locale(&self, language: [u8; 2], country: Option<[u8; 2]>) -> &str {
        self.localized
            .iter()
            .find(|s| s.language == language && country.is_none_or(|c| s.country == c))
            .map(|s| s.text.as_str())
            .unwrap_or(&self.text)
    }

    /// Encode in the tag type given by [`kind`](Self::kind)
    pub fn write(&self, w: &mut IccWriter) {
        match self.kind {
            TextKind::Text => {
                w.write_type_header(TypeSignature::TEXT);
                w.write_bytes(ascii(&self.text).as_slice());
                w.write_u8(0);
            }
            TextKind::Description => {
                let ascii = ascii(&self.text);
                w.write_type_header(TypeSignature::DESC);
                w.write_u32(ascii.len() as u32 + 1);
                w.write_bytes(&ascii);
                w.write_u8(0);
                // Empty Unicode and ScriptCode parts
                w.write_u32(0);
                w.write_u32(0);
                w.write_u16(0);
                w.write_u8(0);
                w.write_bytes(&[0u8; 67]);
            }
            TextKind::MultiLocalized => {
                let records: Vec<LocalizedString> = if self.localized.is_empty() {
                    vec![LocalizedString::new(*b"en", *b"US", self.text.clone())]
                } else {
                    self.localized.clone()
                };
                let encoded: Vec<Vec<u8>> = records
                    .iter()
                    .map(|r| r.text.encode_utf16().flat_map(u16::to_be_bytes).collect())
                    .collect();

                w.write_type_header(TypeSignature::MLUC);
                w.write_u32(records.len() as u32);
                w.write_u32(12);
                let mut offset = 16 + 12 * records.len();
                for (record, bytes) in records.iter().zip(&encoded) {
                    w.write_u16(u16::from_be_bytes(record.language));
                    w.write_u16(u16::from_be_bytes(record.country));
                    w.write_u32(bytes.len() as u32);
                    w.write_u32(offset as u32);
                    offset += bytes.len();
                }
                for bytes in &encoded {
                    w.write_bytes(bytes);
                }
            }
        }
    }
}

fn ascii(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| if ch.is_ascii() && ch != '\0' { ch as u8 } else { b'?' })
        .collect()
}

fn decode_utf16be(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|p| u16::from_be_bytes([p[0], p[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &TextData) -> Vec<u8> {
        let mut w = IccWriter::new();
        text.write(&mut w);
        w.into_inner()
    }

    #[test]
    fn test_parse_text() {
        let data = b"text\0\0\0\0Copyright 2024\0\0";
        let t = TextData::parse_text(data).unwrap();
        assert_eq!(t.text, "Copyright 2024");
        assert_eq!(t.kind, TextKind::Text);
        assert_eq!(encode(&t), &data[..data.len() - 1]);
    }

    #[test]
    fn test_desc_round_trip() {
        let t = TextData::description("sRGB IEC61966-2.1");
        let bytes = encode(&t);
        assert_eq!(&bytes[..4], b"desc");
        assert_eq!(TextData::parse_desc(&bytes).unwrap(), t);
    }

    #[test]
    fn test_desc_unicode_fallback() {
        let mut data = b"desc\0\0\0\0".to_vec();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&3u32.to_be_bytes());
        for ch in "Hi\0".encode_utf16() {
            data.extend_from_slice(&ch.to_be_bytes());
        }
        assert_eq!(TextData::parse_desc(&data).unwrap().text, "Hi");
    }

    #[test]
    fn test_mluc_records() {
        let t = TextData {
            kind: TextKind::MultiLocalized,
            text: "Colour".into(),
            localized: vec![
                LocalizedString::new(*b"de", *b"DE", "Farbe"),
                LocalizedString::new(*b"en", *b"GB", "Colour"),
            ],
        };
        let bytes = encode(&t);
        let back = TextData::parse_mluc(&bytes).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.get_locale(*b"de", None), "Farbe");
        assert_eq!(back.get_locale(*b"fr", None), "Colour");
    }

    #[test]
    fn test_mluc_bad_offsets() {
        let mut bytes = encode(&TextData::localized("Display"));
        // Point the record past the end of the tag
        bytes[24..28].copy_from_slice(&1000u32.to_be_bytes());
        assert!(TextData::parse_mluc(&bytes).is_err());
        assert!(TextData::parse_mluc(b"mluc\0\0\0\0\0\0\0\x01\0\0\0\x04").is_err());
    }
}
