//! Apple video card gamma type (`vcgt`)
//!
//! Display profiles may carry the transfer ramps that should be loaded into
//! the video card. Two encodings exist: sampled per-channel tables and a
//! per-channel gamma/min/max formula.

use crate::error::Result;
use crate::icc::io::{Cursor, IccWriter};
use crate::icc::types::TypeSignature;
use crate::math::interp_table;

use super::invalid;

/// `output = min + (max - min) * input^gamma`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VcgtFormula {
    pub gamma: f64,
    pub min: f64,
    pub max: f64,
}

impl VcgtFormula {
    pub fn eval(&self, x: f64) -> f64 {
        self.min + (self.max - self.min) * x.clamp(0.0, 1.0).powf(self.gamma)
    }
}

impl Default for VcgtFormula {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            min: 0.0,
            max: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VcgtData {
    /// One normalized table per channel (1 or 3 channels)
    Table(Vec<Vec<f64>>),
    Formula([VcgtFormula; 3]),
}

impl VcgtData {
    /// Parse full tag bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut c = Cursor::at(data, 8);
        match c.u32()? {
            0 => {
                let channels = c.u16()? as usize;
                let entries = c.u16()? as usize;
                let width = c.u16()? as usize;
                if !matches!(channels, 1 | 3) || !matches!(width, 1 | 2) || entries < 2 {
                    return Err(invalid(format!(
                        "vcgt table with {channels} channels, {entries} entries of {width} bytes"
                    )));
                }
                if channels * entries > c.remaining() / width {
                    return Err(invalid("vcgt table truncated"));
                }
                let max = if width == 1 { 255.0 } else { 65535.0 };
                let tables = (0..channels)
                    .map(|_| {
                        (0..entries)
                            .map(|_| -> Result<f64> {
                                let v = if width == 1 { c.u8()? as f64 } else { c.u16()? as f64 };
                                Ok(v / max)
                            })
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Table(tables))
            }
            1 => {
                let mut formula = [VcgtFormula::default(); 3];
                for f in formula.iter_mut() {
                    f.gamma = c.s15_fixed16()?;
                    f.min = c.s15_fixed16()?;
                    f.max = c.s15_fixed16()?;
                }
                Ok(Self::Formula(formula))
            }
            other => Err(invalid(format!("unknown vcgt gamma type {other}"))),
        }
    }

    /// Encode; tables are written with 16-bit entries
    pub fn write(&self, w: &mut IccWriter) {
        w.write_type_header(TypeSignature::VCGT);
        match self {
            Self::Table(tables) => {
                let entries = tables.first().map_or(0, Vec::len);
                w.write_u32(0);
                w.write_u16(tables.len() as u16);
                w.write_u16(entries as u16);
                w.write_u16(2);
                for table in tables {
                    for &v in table {
                        w.write_u16((v.clamp(0.0, 1.0) * 65535.0).round() as u16);
                    }
                }
            }
            Self::Formula(formula) => {
                w.write_u32(1);
                for f in formula {
                    w.write_s15_fixed16(f.gamma);
                    w.write_s15_fixed16(f.min);
                    w.write_s15_fixed16(f.max);
                }
            }
        }
    }

    /// Evaluate all three channels at `x`; single-channel tables apply to all
    pub fn eval(&self, x: f64) -> [f64; 3] {
        match self {
            Self::Table(tables) => {
                let at = |i: usize| {
                    tables
                        .get(i)
                        .or_else(|| tables.first())
                        .map_or(x, |t| interp_table(t, x))
                };
                [at(0), at(1), at(2)]
            }
            Self::Formula(f) => [f[0].eval(x), f[1].eval(x), f[2].eval(x)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcgt_table() {
        let mut data = b"vcgt\0\0\0\0".to_vec();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&[0, 1, 0, 3, 0, 1]);
        data.extend_from_slice(&[0, 128, 255]);
        let vcgt = VcgtData::parse(&data).unwrap();
        let mid = vcgt.eval(0.5);
        assert!((mid[0] - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(mid[0], mid[2]);
    }

    #[test]
    fn test_vcgt_formula_round_trip() {
        let vcgt = VcgtData::Formula([
            VcgtFormula { gamma: 1.0, min: 0.0, max: 1.0 },
            VcgtFormula { gamma: 2.0, min: 0.0, max: 0.5 },
            VcgtFormula { gamma: 0.5, min: 0.25, max: 1.0 },
        ]);
        let mut w = IccWriter::new();
        vcgt.write(&mut w);
        let back = VcgtData::parse(&w.into_inner()).unwrap();
        assert_eq!(back, vcgt);
        let v = back.eval(0.5);
        assert!((v[1] - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_vcgt_rejects_bad_layout() {
        let mut data = b"vcgt\0\0\0\0".to_vec();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&[0, 2, 0, 3, 0, 1]);
        assert!(VcgtData::parse(&data).is_err());

        let mut data = b"vcgt\0\0\0\0".to_vec();
        data.extend_from_slice(&7u32.to_be_bytes());
        assert!(VcgtData::parse(&data).is_err());
    }
}
