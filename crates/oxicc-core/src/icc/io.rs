//! Big-endian binary reader and writer for ICC data
//!
//! Every multi-byte value in an ICC profile is big-endian. The reader is a
//! random-access view over a borrowed slice; [`Cursor`] adds a position for
//! the sequential tag decoders. The writer owns a growing buffer.

use crate::error::{Error, Result};

use super::types::{S15Fixed16, TagSignature, TypeSignature, U8Fixed8, XyzNumber};

/// Bounds-checked big-endian view over ICC bytes
#[derive(Debug, Clone, Copy)]
pub struct IccReader<'a> {
    data: &'a [u8],
}

impl<'a> IccReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `len` bytes at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).ok_or(Error::OutOfBounds {
            offset,
            width: len,
            len: self.data.len(),
        })?;
        self.data.get(offset..end).ok_or(Error::OutOfBounds {
            offset,
            width: len,
            len: self.data.len(),
        })
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let bytes = self.slice(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array(offset)?))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array(offset)?))
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array(offset)?))
    }

    pub fn read_s15_fixed16(&self, offset: usize) -> Result<f64> {
        Ok(S15Fixed16::from_be_bytes(self.array(offset)?).to_f64())
    }

    pub fn read_u8_fixed8(&self, offset: usize) -> Result<f64> {
        Ok(U8Fixed8(self.read_u16(offset)?).to_f64())
    }

    pub fn read_signature(&self, offset: usize) -> Result<TagSignature> {
        Ok(TagSignature(self.read_u32(offset)?))
    }

    pub fn read_xyz(&self, offset: usize) -> Result<XyzNumber> {
        let bytes: [u8; 12] = self.array(offset)?;
        Ok(XyzNumber::from_bytes(&bytes))
    }
}

/// Sequential reader used by tag decoders
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    reader: IccReader<'a>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: IccReader::new(data),
            pos: 0,
        }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            reader: IccReader::new(data),
            pos,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.reader.len().saturating_sub(self.pos)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.reader.slice(self.pos, n)?;
        self.pos += n;
        Ok(())
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let out = self.reader.slice(self.pos, n)?;
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8> {
        let v = self.reader.read_u8(self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let v = self.reader.read_u16(self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn u32(&mut self) -> Result<u32> {
        let v = self.reader.read_u32(self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn s15_fixed16(&mut self) -> Result<f64> {
        let v = self.reader.read_s15_fixed16(self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn u8_fixed8(&mut self) -> Result<f64> {
        let v = self.reader.read_u8_fixed8(self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn xyz(&mut self) -> Result<XyzNumber> {
        let v = self.reader.read_xyz(self.pos)?;
        self.pos += 12;
        Ok(v)
    }
}

/// Big-endian writer over an owned, growing buffer
#[derive(Debug, Clone, Default)]
pub struct IccWriter {
    buf: Vec<u8>,
}

impl IccWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn write_s15_fixed16(&mut self, v: f64) {
        self.buf
            .extend_from_slice(&S15Fixed16::from_f64(v).to_be_bytes());
    }

    pub fn write_u8_fixed8(&mut self, v: f64) {
        self.write_u16(U8Fixed8::from_f64(v).0);
    }

    pub fn write_signature(&mut self, sig: TagSignature) {
        self.write_u32(sig.0);
    }

    /// Type signature followed by the 4 reserved bytes every tag type starts with
    pub fn write_type_header(&mut self, sig: TypeSignature) {
        self.write_u32(sig.0);
        self.write_u32(0);
    }

    pub fn write_xyz(&mut self, xyz: &XyzNumber) {
        self.buf.extend_from_slice(&xyz.to_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Zero-pad up to the next multiple of `align`
    pub fn pad_to_alignment(&mut self, align: usize) {
        let rem = self.buf.len() % align;
        if rem != 0 {
            self.buf.resize(self.buf.len() + align - rem, 0);
        }
    }

    /// Overwrite a previously written u32
    pub fn patch_u32(&mut self, offset: usize, v: u32) -> Result<()> {
        let len = self.buf.len();
        let slot = offset
            .checked_add(4)
            .and_then(|end| self.buf.get_mut(offset..end))
            .ok_or(Error::OutOfBounds {
                offset,
                width: 4,
                len,
            })?;
        slot.copy_from_slice(&v.to_be_bytes());
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
