//! Pixel formats and buffers
//!
//! A [`PixelFormat`] describes how one pixel is stored: component depth,
//! where alpha (or an ignored slot) sits and the byte order of each
//! component. The number of color components comes from the color space
//! of the transform end the buffer is attached to.
//!
//! [`Layout`] keeps the packed bit layout used by Core Graphics bitmaps:
//! alpha info in bits 0..5 and byte order in bits 12..15.

use crate::error::{Error, Result};
use crate::icc::ColorSpace;
use crate::pipeline::pcs::PcsEncoding;

/// Component storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    U8,
    U16,
    F32,
}

impl Depth {
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Where alpha lives and whether colors are premultiplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaInfo {
    #[default]
    None,
    PremultipliedLast,
    PremultipliedFirst,
    Last,
    First,
    /// Extra slot after the color, ignored on read
    NoneSkipLast,
    /// Extra slot before the color, ignored on read
    NoneSkipFirst,
}

impl AlphaInfo {
    pub const MASK: u32 = 0x1f;

    pub fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits & Self::MASK {
            0 => Self::None,
            1 => Self::PremultipliedLast,
            2 => Self::PremultipliedFirst,
            3 => Self::Last,
            4 => Self::First,
            5 => Self::NoneSkipLast,
            6 => Self::NoneSkipFirst,
            _ => return None,
        })
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::PremultipliedLast => 1,
            Self::PremultipliedFirst => 2,
            Self::Last => 3,
            Self::First => 4,
            Self::NoneSkipLast => 5,
            Self::NoneSkipFirst => 6,
        }
    }

    /// Pixel has a slot besides the color components
    pub fn has_slot(self) -> bool {
        self != Self::None
    }

    /// Slot carries real alpha
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::PremultipliedLast | Self::PremultipliedFirst | Self::Last | Self::First
        )
    }

    pub fn is_premultiplied(self) -> bool {
        matches!(self, Self::PremultipliedLast | Self::PremultipliedFirst)
    }

    pub fn is_first(self) -> bool {
        matches!(
            self,
            Self::PremultipliedFirst | Self::First | Self::NoneSkipFirst
        )
    }
}

/// Byte order of components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Native endianness
    #[default]
    Default,
    Little16,
    Little32,
    Big16,
    Big32,
}

impl ByteOrder {
    pub const MASK: u32 = 0x7000;
    const SHIFT: u32 = 12;

    pub fn from_bits(bits: u32) -> Option<Self> {
        Some(match (bits & Self::MASK) >> Self::SHIFT {
            0 => Self::Default,
            1 => Self::Little16,
            2 => Self::Little32,
            3 => Self::Big16,
            4 => Self::Big32,
            _ => return None,
        })
    }

    pub fn bits(self) -> u32 {
        let v = match self {
            Self::Default => 0,
            Self::Little16 => 1,
            Self::Little32 => 2,
            Self::Big16 => 3,
            Self::Big32 => 4,
        };
        v << Self::SHIFT
    }

    fn is_16(self) -> bool {
        matches!(self, Self::Little16 | Self::Big16)
    }

    fn is_32(self) -> bool {
        matches!(self, Self::Little32 | Self::Big32)
    }
}

/// Alpha info plus byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Layout {
    pub alpha: AlphaInfo,
    pub byte_order: ByteOrder,
}

impl Layout {
    pub const fn new(alpha: AlphaInfo, byte_order: ByteOrder) -> Self {
        Self { alpha, byte_order }
    }

    /// Decode packed bits. Bits outside both masks are ignored.
    pub fn from_bits(bits: u32) -> Result<Self> {
        let alpha = AlphaInfo::from_bits(bits)
            .ok_or_else(|| Error::Transform(format!("unknown alpha info in layout {bits:#x}")))?;
        let byte_order = ByteOrder::from_bits(bits)
            .ok_or_else(|| Error::Transform(format!("unknown byte order in layout {bits:#x}")))?;
        Ok(Self { alpha, byte_order })
    }

    pub fn bits(self) -> u32 {
        self.alpha.bits() | self.byte_order.bits()
    }
}

/// Full description of one stored pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub depth: Depth,
    pub layout: Layout,
}

impl PixelFormat {
    pub const RGB8: Self = Self::new(Depth::U8, AlphaInfo::None);
    pub const RGBA8: Self = Self::new(Depth::U8, AlphaInfo::Last);

    /// Native byte order
    pub const fn new(depth: Depth, alpha: AlphaInfo) -> Self {
        Self {
            depth,
            layout: Layout::new(alpha, ByteOrder::Default),
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.layout.byte_order = byte_order;
        self
    }

    /// Slots per pixel for a color space with `channels` components
    pub fn slots(&self, channels: usize) -> usize {
        channels + usize::from(self.layout.alpha.has_slot())
    }

    pub fn bytes_per_pixel(&self, channels: usize) -> usize {
        self.slots(channels) * self.depth.bytes()
    }
}

/// Read-only image rows
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub bytes_per_row: usize,
    pub format: PixelFormat,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        bytes_per_row: usize,
        format: PixelFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            bytes_per_row,
            format,
        }
    }

    /// Borrow typed components (`u16`, `f32`) as bytes; `bytes_per_row` is in bytes
    pub fn from_slice<T: bytemuck::Pod>(
        data: &'a [T],
        width: usize,
        height: usize,
        bytes_per_row: usize,
        format: PixelFormat,
    ) -> Self {
        Self::new(
            bytemuck::cast_slice(data),
            width,
            height,
            bytes_per_row,
            format,
        )
    }

    pub(crate) fn row(&self, y: usize, row_bytes: usize) -> &'a [u8] {
        let start = y * self.bytes_per_row;
        &self.data[start..start + row_bytes]
    }
}

/// Writable image rows
#[derive(Debug)]
pub struct PixelBufferMut<'a> {
    pub data: &'a mut [u8],
    pub width: usize,
    pub height: usize,
    pub bytes_per_row: usize,
    pub format: PixelFormat,
}

impl<'a> PixelBufferMut<'a> {
    pub fn new(
        data: &'a mut [u8],
        width: usize,
        height: usize,
        bytes_per_row: usize,
        format: PixelFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            bytes_per_row,
            format,
        }
    }

    pub fn from_slice<T: bytemuck::Pod>(
        data: &'a mut [T],
        width: usize,
        height: usize,
        bytes_per_row: usize,
        format: PixelFormat,
    ) -> Self {
        Self::new(
            bytemuck::cast_slice_mut(data),
            width,
            height,
            bytes_per_row,
            format,
        )
    }
}

/// Check a buffer can hold `height` rows of `width` pixels
pub(crate) fn check_geometry(
    name: &str,
    len: usize,
    width: usize,
    height: usize,
    bytes_per_row: usize,
    bytes_per_pixel: usize,
) -> Result<usize> {
    let row_bytes = width
        .checked_mul(bytes_per_pixel)
        .ok_or_else(|| Error::Transform(format!("{name}: row size overflows")))?;
    if bytes_per_row < row_bytes {
        return Err(Error::Transform(format!(
            "{name}: {bytes_per_row} bytes per row, need at least {row_bytes}"
        )));
    }
    if width == 0 || height == 0 {
        return Ok(row_bytes);
    }
    let needed = (height - 1)
        .checked_mul(bytes_per_row)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or_else(|| Error::Transform(format!("{name}: buffer size overflows")))?;
    if len < needed {
        return Err(Error::Transform(format!(
            "{name}: buffer holds {len} bytes, need {needed}"
        )));
    }
    Ok(row_bytes)
}

/// Reads and writes pixels of one format in one color space
#[derive(Debug, Clone, Copy)]
pub(crate) struct PixelCodec {
    depth: Depth,
    byte_order: ByteOrder,
    alpha: AlphaInfo,
    channels: usize,
    /// Set when the data holds PCS values
    pcs: Option<PcsEncoding>,
}

impl PixelCodec {
    pub(crate) fn new(format: PixelFormat, space: ColorSpace) -> Result<Self> {
        let channels = space.channels();
        let slots = format.slots(channels);
        let order = format.layout.byte_order;
        let ok = match format.depth {
            Depth::U8 => !order.is_16() && (!order.is_32() || slots == 4),
            Depth::U16 => !order.is_32(),
            Depth::F32 => !order.is_16(),
        };
        if !ok {
            return Err(Error::Transform(format!(
                "byte order {order:?} does not fit {:?} pixels with {slots} components",
                format.depth
            )));
        }
        let pcs = match space {
            ColorSpace::Xyz => Some(PcsEncoding::Xyz),
            ColorSpace::Lab => Some(PcsEncoding::LabV4),
            _ => None,
        };
        Ok(Self {
            depth: format.depth,
            byte_order: order,
            alpha: format.layout.alpha,
            channels,
            pcs,
        })
    }

    pub(crate) fn channels(&self) -> usize {
        self.channels
    }

    pub(crate) fn has_alpha(&self) -> bool {
        self.alpha.has_alpha()
    }

    pub(crate) fn bytes_per_pixel(&self) -> usize {
        (self.channels + usize::from(self.alpha.has_slot())) * self.depth.bytes()
    }

    fn color_slot(&self, c: usize) -> usize {
        if self.alpha.is_first() { c + 1 } else { c }
    }

    fn alpha_slot(&self) -> usize {
        if self.alpha.is_first() { 0 } else { self.channels }
    }

    /// Raw component: normalized for integers, as stored for floats
    fn read(&self, px: &[u8], slot: usize) -> f64 {
        match self.depth {
            Depth::U8 => {
                let i = match self.byte_order {
                    ByteOrder::Little32 => 3 - slot,
                    _ => slot,
                };
                px[i] as f64 / 255.0
            }
            Depth::U16 => {
                let b = [px[slot * 2], px[slot * 2 + 1]];
                let v = match self.byte_order {
                    ByteOrder::Little16 => u16::from_le_bytes(b),
                    ByteOrder::Big16 => u16::from_be_bytes(b),
                    _ => u16::from_ne_bytes(b),
                };
                v as f64 / 65535.0
            }
            Depth::F32 => {
                let at = slot * 4;
                let b = [px[at], px[at + 1], px[at + 2], px[at + 3]];
                let v = match self.byte_order {
                    ByteOrder::Little32 => f32::from_le_bytes(b),
                    ByteOrder::Big32 => f32::from_be_bytes(b),
                    _ => f32::from_ne_bytes(b),
                };
                v as f64
            }
        }
    }

    fn write(&self, px: &mut [u8], slot: usize, v: f64) {
        match self.depth {
            Depth::U8 => {
                let i = match self.byte_order {
                    ByteOrder::Little32 => 3 - slot,
                    _ => slot,
                };
                px[i] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            Depth::U16 => {
                let v = (v.clamp(0.0, 1.0) * 65535.0).round() as u16;
                let b = match self.byte_order {
                    ByteOrder::Little16 => v.to_le_bytes(),
                    ByteOrder::Big16 => v.to_be_bytes(),
                    _ => v.to_ne_bytes(),
                };
                px[slot * 2..slot * 2 + 2].copy_from_slice(&b);
            }
            Depth::F32 => {
                let v = v as f32;
                let b = match self.byte_order {
                    ByteOrder::Little32 => v.to_le_bytes(),
                    ByteOrder::Big32 => v.to_be_bytes(),
                    _ => v.to_ne_bytes(),
                };
                px[slot * 4..slot * 4 + 4].copy_from_slice(&b);
            }
        }
    }

    /// Decode one pixel into working values; returns straight alpha if present
    pub(crate) fn decode(&self, px: &[u8], color: &mut [f64]) -> Option<f64> {
        let mut raw = [0.0; 3];
        let alpha = self
            .alpha
            .has_alpha()
            .then(|| self.read(px, self.alpha_slot()));

        for (c, out) in color.iter_mut().enumerate().take(self.channels) {
            let mut v = self.read(px, self.color_slot(c));
            if self.alpha.is_premultiplied() {
                if let Some(a) = alpha.filter(|&a| a > 0.0) {
                    v /= a;
                }
            }
            *out = v;
        }

        if let Some(enc) = self.pcs {
            if self.depth != Depth::F32 {
                raw.copy_from_slice(&color[..3]);
                enc.decode(&raw, color);
            }
        }
        alpha
    }

    /// Encode working values; `alpha` is the source's straight alpha
    pub(crate) fn encode(&self, color: &[f64], alpha: Option<f64>, px: &mut [u8]) {
        let mut values = [0.0; crate::pipeline::MAX_CHANNELS];
        let n = self.channels;
        match self.pcs {
            Some(enc) if self.depth != Depth::F32 => enc.encode(&color[..3], &mut values),
            Some(_) => values[..n].copy_from_slice(&color[..n]),
            None => {
                for (v, &c) in values.iter_mut().zip(&color[..n]) {
                    *v = c.clamp(0.0, 1.0);
                }
            }
        }

        let a = alpha.unwrap_or(1.0);
        if self.alpha.is_premultiplied() {
            for v in &mut values[..n] {
                *v *= a;
            }
        }
        for (c, &v) in values[..n].iter().enumerate() {
            self.write(px, self.color_slot(c), v);
        }
        if self.alpha.has_alpha() {
            self.write(px, self.alpha_slot(), a);
        } else if self.alpha.has_slot() {
            self.write(px, self.alpha_slot(), 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_bits() {
        let layout = Layout::new(AlphaInfo::PremultipliedFirst, ByteOrder::Little32);
        assert_eq!(layout.bits(), 2 | (2 << 12));
        assert_eq!(Layout::from_bits(layout.bits()).unwrap(), layout);
        assert_eq!(
            Layout::from_bits(0x100 | 3).unwrap(),
            Layout::new(AlphaInfo::Last, ByteOrder::Default)
        );
        assert!(Layout::from_bits(7).is_err());
        assert!(Layout::from_bits(5 << 12).is_err());
    }

    #[test]
    fn test_byte_order_fits_depth() {
        let rgb = ColorSpace::Rgb;
        let f = |d, a, o| PixelFormat::new(d, a).with_byte_order(o);
        assert!(PixelCodec::new(f(Depth::U16, AlphaInfo::None, ByteOrder::Big16), rgb).is_ok());
        assert!(PixelCodec::new(f(Depth::U16, AlphaInfo::None, ByteOrder::Big32), rgb).is_err());
        assert!(PixelCodec::new(f(Depth::F32, AlphaInfo::None, ByteOrder::Little16), rgb).is_err());
        assert!(PixelCodec::new(f(Depth::U8, AlphaInfo::Last, ByteOrder::Little32), rgb).is_ok());
        assert!(PixelCodec::new(f(Depth::U8, AlphaInfo::None, ByteOrder::Little32), rgb).is_err());
        assert!(PixelCodec::new(f(Depth::U8, AlphaInfo::None, ByteOrder::Big16), rgb).is_err());
    }

    #[test]
    fn test_geometry() {
        assert_eq!(check_geometry("src", 12, 2, 2, 6, 3).unwrap(), 6);
        // Last row needs no padding
        assert!(check_geometry("src", 14, 2, 2, 8, 3).is_ok());
        assert!(check_geometry("src", 13, 2, 2, 8, 3).is_err());
        assert!(check_geometry("src", 100, 4, 1, 8, 3).is_err());
        assert!(check_geometry("src", 0, usize::MAX, 1, usize::MAX, 2).is_err());
        assert!(check_geometry("src", 0, 0, 5, 0, 3).is_ok());
    }

    #[test]
    fn test_u8_little32_reverses_components() {
        let format =
            PixelFormat::new(Depth::U8, AlphaInfo::First).with_byte_order(ByteOrder::Little32);
        let codec = PixelCodec::new(format, ColorSpace::Rgb).unwrap();
        // Memory order B G R A for logical A R G B
        let px = [0u8, 128, 255, 255];
        let mut color = [0.0; 3];
        let alpha = codec.decode(&px, &mut color);
        assert_eq!(alpha, Some(1.0));
        assert_eq!(color[0], 1.0);
        assert!((color[1] - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(color[2], 0.0);

        let mut out = [0u8; 4];
        codec.encode(&color, alpha, &mut out);
        assert_eq!(out, px);
    }

    #[test]
    fn test_u16_endianness() {
        let gray = ColorSpace::Gray;
        let big = PixelCodec::new(
            PixelFormat::new(Depth::U16, AlphaInfo::None).with_byte_order(ByteOrder::Big16),
            gray,
        )
        .unwrap();
        let mut out = [0u8; 2];
        big.encode(&[1.0 / 65535.0 * 258.0], None, &mut out);
        assert_eq!(out, [0x01, 0x02]);

        let little = PixelCodec::new(
            PixelFormat::new(Depth::U16, AlphaInfo::None).with_byte_order(ByteOrder::Little16),
            gray,
        )
        .unwrap();
        let mut g = [0.0];
        little.decode(&out, &mut g);
        assert!((g[0] - 513.0 / 65535.0).abs() < 1e-12);
    }

    #[test]
    fn test_premultiplied_alpha() {
        let format = PixelFormat::new(Depth::U8, AlphaInfo::PremultipliedLast);
        let codec = PixelCodec::new(format, ColorSpace::Rgb).unwrap();
        let mut color = [0.0; 3];
        let alpha = codec.decode(&[64, 0, 128, 128], &mut color);
        let a = 128.0 / 255.0;
        assert_eq!(alpha, Some(a));
        assert!((color[0] - 64.0 / 255.0 / a).abs() < 1e-12);

        // Zero alpha leaves colors as stored
        let alpha = codec.decode(&[10, 0, 0, 0], &mut color);
        assert_eq!(alpha, Some(0.0));
        assert!((color[0] - 10.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_defaults() {
        let skip_format = PixelFormat::new(Depth::U8, AlphaInfo::NoneSkipFirst);
        let skip = PixelCodec::new(skip_format, ColorSpace::Rgb).unwrap();
        let mut px = [0u8; 4];
        skip.encode(&[0.0, 0.5, 1.0], None, &mut px);
        assert_eq!(px, [255, 0, 128, 255]);

        let straight = PixelCodec::new(PixelFormat::RGBA8, ColorSpace::Rgb).unwrap();
        straight.encode(&[0.0, 0.0, 0.0], None, &mut px);
        assert_eq!(px[3], 255);
        straight.encode(&[2.0, -1.0, 0.0], Some(0.5), &mut px);
        assert_eq!(px, [255, 0, 0, 128]);
    }

    #[test]
    fn test_pcs_data() {
        let lab16 = PixelCodec::new(PixelFormat::new(Depth::U16, AlphaInfo::None), ColorSpace::Lab)
            .unwrap();
        let mut px = [0u8; 6];
        lab16.encode(&[100.0, 0.0, -128.0], None, &mut px);
        assert_eq!(u16::from_ne_bytes([px[0], px[1]]), 65535);
        assert_eq!(u16::from_ne_bytes([px[4], px[5]]), 0);

        let mut lab = [0.0; 3];
        lab16.decode(&px, &mut lab);
        assert!((lab[0] - 100.0).abs() < 1e-9);
        assert!((lab[2] + 128.0).abs() < 1e-9);

        // Float PCS data is raw and unclamped
        let xyz_f = PixelCodec::new(PixelFormat::new(Depth::F32, AlphaInfo::None), ColorSpace::Xyz)
            .unwrap();
        let mut px = [0u8; 12];
        xyz_f.encode(&[0.9642, 1.5, -0.25], None, &mut px);
        let floats: Vec<f32> = px
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(floats, [0.9642f32, 1.5, -0.25]);
    }
}
