//! LUT Tag Types
//!
//! LUT (Look-Up Table) tags define complex color transformations.
//!
//! Types:
//! - mft1 (Lut8Type): 8-bit precision LUT
//! - mft2 (Lut16Type): 16-bit precision LUT
//! - mAB (lutAToBType): v4 A-to-B transform
//! - mBA (lutBToAType): v4 B-to-A transform
//!
//! Table and grid values are normalized to [0, 1] on decode and quantized
//! back on encode, so a decoded 16-bit LUT re-encodes to the same bytes.
//!
//! See ICC.1:2022 Sections 10.10-10.13

use crate::error::Result;
use crate::icc::io::{Cursor, IccWriter};
use crate::icc::types::TypeSignature;
use crate::math::Matrix3x3;

use super::curves::Curve;
use super::invalid;

/// CLUT inputs beyond this are rejected (ICC allows 15)
pub const MAX_CLUT_INPUTS: usize = 15;

/// Sample width of a legacy LUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutPrecision {
    U8,
    U16,
}

impl LutPrecision {
    fn max(self) -> f64 {
        match self {
            Self::U8 => 255.0,
            Self::U16 => 65535.0,
        }
    }
}

/// Multidimensional color lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct Clut {
    /// Grid points per input dimension
    pub grid_points: Vec<u8>,
    pub output_channels: usize,
    /// Samples in ICC order, normalized to [0, 1]
    pub data: Vec<f64>,
}

impl Clut {
    pub fn input_channels(&self) -> usize {
        self.grid_points.len()
    }

    fn entry_count(grid_points: &[u8], outputs: usize) -> Result<usize> {
        grid_points
            .iter()
            .try_fold(outputs, |acc, &g| {
                if g == 0 {
                    None
                } else {
                    acc.checked_mul(g as usize)
                }
            })
            .ok_or_else(|| invalid("CLUT grid is empty or too large"))
    }

    fn read(
        c: &mut Cursor<'_>,
        grid_points: Vec<u8>,
        outputs: usize,
        precision: LutPrecision,
    ) -> Result<Self> {
        let count = Self::entry_count(&grid_points, outputs)?;
        let width = match precision {
            LutPrecision::U8 => 1,
            LutPrecision::U16 => 2,
        };
        if count > c.remaining() / width {
            return Err(invalid(format!("CLUT of {count} entries truncated")));
        }
        let max = precision.max();
        let data = (0..count)
            .map(|_| match precision {
                LutPrecision::U8 => c.u8().map(|v| v as f64 / max),
                LutPrecision::U16 => c.u16().map(|v| v as f64 / max),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            grid_points,
            output_channels: outputs,
            data,
        })
    }

    fn write_samples(&self, w: &mut IccWriter, precision: LutPrecision) {
        for &v in &self.data {
            match precision {
                LutPrecision::U8 => w.write_u8(quantize(v, 255.0) as u8),
                LutPrecision::U16 => w.write_u16(quantize(v, 65535.0) as u16),
            }
        }
    }
}

fn quantize(v: f64, max: f64) -> f64 {
    (v.clamp(0.0, 1.0) * max).round()
}

fn check_channels(inputs: usize, outputs: usize) -> Result<()> {
    if inputs == 0 || inputs > MAX_CLUT_INPUTS || outputs == 0 || outputs > MAX_CLUT_INPUTS {
        return Err(invalid(format!(
            "unsupported channel counts {inputs} in / {outputs} out"
        )));
    }
    Ok(())
}

/// Legacy LUT (mft1 / mft2)
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyLut {
    pub precision: LutPrecision,
    pub input_channels: usize,
    pub output_channels: usize,
    /// Applied only when the input space is XYZ
    pub matrix: Matrix3x3,
    /// One normalized table per input channel
    pub input_tables: Vec<Vec<f64>>,
    pub clut: Clut,
    /// One normalized table per output channel
    pub output_tables: Vec<Vec<f64>>,
}

impl LegacyLut {
    /// Parse `mft1` or `mft2` (full tag bytes)
    pub fn parse(data: &[u8], precision: LutPrecision) -> Result<Self> {
        let mut c = Cursor::at(data, 8);
        let inputs = c.u8()? as usize;
        let outputs = c.u8()? as usize;
        let grid = c.u8()?;
        c.skip(1)?;
        check_channels(inputs, outputs)?;

        let mut m = [[0.0; 3]; 3];
        for row in m.iter_mut() {
            for cell in row.iter_mut() {
                *cell = c.s15_fixed16()?;
            }
        }

        let (in_entries, out_entries) = match precision {
            LutPrecision::U8 => (256, 256),
            LutPrecision::U16 => (c.u16()? as usize, c.u16()? as usize),
        };
        if matches!(precision, LutPrecision::U16) && (in_entries < 2 || out_entries < 2) {
            return Err(invalid("mft2 tables need at least 2 entries"));
        }

        let input_tables = read_tables(&mut c, inputs, in_entries, precision)?;
        let clut = Clut::read(&mut c, vec![grid; inputs], outputs, precision)?;
        let output_tables = read_tables(&mut c, outputs, out_entries, precision)?;

        Ok(Self {
            precision,
            input_channels: inputs,
            output_channels: outputs,
            matrix: Matrix3x3::new(m),
            input_tables,
            clut,
            output_tables,
        })
    }

    /// Encode as `mft1`/`mft2` according to [`precision`](Self::precision)
    pub fn write(&self, w: &mut IccWriter) -> Result<()> {
        let grid = self.clut.grid_points.first().copied().unwrap_or(0);
        if self.clut.grid_points.iter().any(|&g| g != grid)
            || self.clut.grid_points.len() != self.input_channels
        {
            return Err(invalid("legacy LUTs need a uniform grid over every input"));
        }
        let in_entries = self.input_tables.first().map_or(0, Vec::len);
        let out_entries = self.output_tables.first().map_or(0, Vec::len);
        let uniform = |tables: &[Vec<f64>], n: usize| tables.iter().all(|t| t.len() == n);
        if !uniform(&self.input_tables, in_entries) || !uniform(&self.output_tables, out_entries) {
            return Err(invalid("legacy LUT tables differ in length"));
        }
        if self.precision == LutPrecision::U8 && (in_entries != 256 || out_entries != 256) {
            return Err(invalid("mft1 tables must have 256 entries"));
        }

        w.write_type_header(match self.precision {
            LutPrecision::U8 => TypeSignature::LUT8,
            LutPrecision::U16 => TypeSignature::LUT16,
        });
        w.write_u8(self.input_channels as u8);
        w.write_u8(self.output_channels as u8);
        w.write_u8(grid);
        w.write_u8(0);
        for row in &self.matrix.m {
            for &v in row {
                w.write_s15_fixed16(v);
            }
        }
        if self.precision == LutPrecision::U16 {
            w.write_u16(in_entries as u16);
            w.write_u16(out_entries as u16);
        }
        write_tables(w, &self.input_tables, self.precision);
        self.clut.write_samples(w, self.precision);
        write_tables(w, &self.output_tables, self.precision);
        Ok(())
    }
}

fn read_tables(
    c: &mut Cursor<'_>,
    count: usize,
    entries: usize,
    precision: LutPrecision,
) -> Result<Vec<Vec<f64>>> {
    let width = match precision {
        LutPrecision::U8 => 1,
        LutPrecision::U16 => 2,
    };
    if count * entries > c.remaining() / width {
        return Err(invalid("LUT tables truncated"));
    }
    let max = precision.max();
    (0..count)
        .map(|_| {
            (0..entries)
                .map(|_| match precision {
                    LutPrecision::U8 => c.u8().map(|v| v as f64 / max),
                    LutPrecision::U16 => c.u16().map(|v| v as f64 / max),
                })
                .collect()
        })
        .collect()
}

fn write_tables(w: &mut IccWriter, tables: &[Vec<f64>], precision: LutPrecision) {
    for table in tables {
        for &v in table {
            match precision {
                LutPrecision::U8 => w.write_u8(quantize(v, 255.0) as u8),
                LutPrecision::U16 => w.write_u16(quantize(v, 65535.0) as u16),
            }
        }
    }
}

/// Matrix element of a v4 LUT: 3x3 plus offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LutMatrix {
    pub matrix: Matrix3x3,
    pub offset: [f64; 3],
}

impl LutMatrix {
    fn read(c: &mut Cursor<'_>) -> Result<Self> {
        let mut m = [[0.0; 3]; 3];
        for row in m.iter_mut() {
            for cell in row.iter_mut() {
                *cell = c.s15_fixed16()?;
            }
        }
        let offset = [c.s15_fixed16()?, c.s15_fixed16()?, c.s15_fixed16()?];
        Ok(Self {
            matrix: Matrix3x3::new(m),
            offset,
        })
    }

    pub fn apply(&self, v: [f64; 3]) -> [f64; 3] {
        let r = self.matrix.multiply_vec(v);
        [r[0] + self.offset[0], r[1] + self.offset[1], r[2] + self.offset[2]]
    }
}

/// Which of the v4 LUT types a [`LutAb`] was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutAbKind {
    /// `mAB `: A curves, CLUT, M curves, matrix, B curves
    AToB,
    /// `mBA `: B curves, matrix, M curves, CLUT, A curves
    BToA,
}

/// v4 LUT (mAB / mBA). Every element is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct LutAb {
    pub kind: LutAbKind,
    pub input_channels: usize,
    pub output_channels: usize,
    pub a_curves: Option<Vec<Curve>>,
    pub clut: Option<Clut>,
    pub m_curves: Option<Vec<Curve>>,
    pub matrix: Option<LutMatrix>,
    pub b_curves: Option<Vec<Curve>>,
}

impl LutAb {
    /// Parse `mAB ` or `mBA ` (full tag bytes; element offsets are tag relative)
    pub fn parse(data: &[u8], kind: LutAbKind) -> Result<Self> {
        let mut c = Cursor::at(data, 8);
        let inputs = c.u8()? as usize;
        let outputs = c.u8()? as usize;
        c.skip(2)?;
        check_channels(inputs, outputs)?;
        let b_offset = c.u32()? as usize;
        let matrix_offset = c.u32()? as usize;
        let m_offset = c.u32()? as usize;
        let clut_offset = c.u32()? as usize;
        let a_offset = c.u32()? as usize;

        // Channel count on the PCS side of the matrix and of the B/M curves
        let (a_count, bm_count) = match kind {
            LutAbKind::AToB => (inputs, outputs),
            LutAbKind::BToA => (outputs, inputs),
        };

        let at = |offset: usize| (offset != 0).then(|| Cursor::at(data, offset));

        let b_curves = at(b_offset).map(|mut c| read_curve_set(&mut c, bm_count)).transpose()?;
        let m_curves = at(m_offset).map(|mut c| read_curve_set(&mut c, bm_count)).transpose()?;
        let a_curves = at(a_offset).map(|mut c| read_curve_set(&mut c, a_count)).transpose()?;
        let matrix = at(matrix_offset).map(|mut c| LutMatrix::read(&mut c)).transpose()?;
        let clut = at(clut_offset)
            .map(|mut c| {
                let grid = c.bytes(16)?[..inputs].to_vec();
                let precision = match c.u8()? {
                    1 => LutPrecision::U8,
                    2 => LutPrecision::U16,
                    p => return Err(invalid(format!("CLUT precision {p} not 1 or 2"))),
                };
                c.skip(3)?;
                Clut::read(&mut c, grid, outputs, precision)
            })
            .transpose()?;

        if (matrix.is_some() || m_curves.is_some()) && bm_count != 3 {
            return Err(invalid("matrix element requires 3 channels"));
        }
        if b_curves.is_none() {
            return Err(invalid("B curves are required"));
        }
        if clut.is_some() && a_curves.is_none() {
            return Err(invalid("CLUT present without A curves"));
        }
        if clut.is_none() && inputs != outputs {
            return Err(invalid("channel count changes without a CLUT"));
        }

        Ok(Self {
            kind,
            input_channels: inputs,
            output_channels: outputs,
            a_curves,
            clut,
            m_curves,
            matrix,
            b_curves,
        })
    }

    /// Encode with 16-bit CLUT precision; elements are laid out in the
    /// order they appear in the processing chain
    pub fn write(&self, w: &mut IccWriter) -> Result<()> {
        let start = w.len();
        w.write_type_header(match self.kind {
            LutAbKind::AToB => TypeSignature::LUTA2B,
            LutAbKind::BToA => TypeSignature::LUTB2A,
        });
        w.write_u8(self.input_channels as u8);
        w.write_u8(self.output_channels as u8);
        w.write_u16(0);
        let offsets_at = w.len();
        for _ in 0..5 {
            w.write_u32(0);
        }

        let mut offsets = [0u32; 5]; // B, matrix, M, CLUT, A
        let mut element = |w: &mut IccWriter, slot: usize| {
            w.pad_to_alignment(4);
            offsets[slot] = (w.len() - start) as u32;
        };

        if let Some(curves) = &self.b_curves {
            element(w, 0);
            write_curve_set(w, curves);
        }
        if let Some(m) = &self.matrix {
            element(w, 1);
            for row in &m.matrix.m {
                for &v in row {
                    w.write_s15_fixed16(v);
                }
            }
            for &v in &m.offset {
                w.write_s15_fixed16(v);
            }
        }
        if let Some(curves) = &self.m_curves {
            element(w, 2);
            write_curve_set(w, curves);
        }
        if let Some(clut) = &self.clut {
            element(w, 3);
            let mut grid = [0u8; 16];
            for (slot, &g) in grid.iter_mut().zip(&clut.grid_points) {
                *slot = g;
            }
            w.write_bytes(&grid);
            w.write_u8(2);
            w.write_bytes(&[0, 0, 0]);
            clut.write_samples(w, LutPrecision::U16);
        }
        if let Some(curves) = &self.a_curves {
            element(w, 4);
            write_curve_set(w, curves);
        }

        for (i, &offset) in offsets.iter().enumerate() {
            w.patch_u32(offsets_at + 4 * i, offset)?;
        }
        Ok(())
    }
}

fn read_curve_set(c: &mut Cursor<'_>, count: usize) -> Result<Vec<Curve>> {
    let mut curves = Vec::with_capacity(count);
    for _ in 0..count {
        curves.push(Curve::read(c)?);
        // Each curve starts on a 4-byte boundary
        let pad = (4 - c.position() % 4) % 4;
        if pad > 0 && c.remaining() >= pad {
            c.skip(pad)?;
        }
    }
    Ok(curves)
}

fn write_curve_set(w: &mut IccWriter, curves: &[Curve]) {
    for curve in curves {
        curve.write(w);
        w.pad_to_alignment(4);
    }
}
