//! Curve Tag Types
//!
//! - curveType (`curv`): identity, a single u8Fixed8 gamma, or a sampled table
//! - parametricCurveType (`para`): one of the five ICC function types
//!
//! Both decode into [`Curve`], which is also the element type of the curve
//! sets inside `mAB `/`mBA ` LUTs.
//!
//! See ICC.1:2022 Sections 10.6 and 10.18

use crate::error::Result;
use crate::icc::io::{Cursor, IccWriter};
use crate::icc::types::TypeSignature;
use crate::math::{ParametricCurve, ParametricCurveType};

use super::invalid;

/// A one-dimensional tone curve
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    /// `curv` with no entries
    Identity,
    /// `curv` with a single u8Fixed8 exponent
    Gamma(f64),
    /// `curv` with sampled 16-bit entries spanning [0, 1]
    Table(Vec<u16>),
    /// `para`
    Parametric(ParametricCurve),
}

impl Curve {
    /// Decode a `curv` or `para` element starting at the cursor's type signature.
    ///
    /// The cursor is left just past the element (unpadded).
    pub fn read(c: &mut Cursor<'_>) -> Result<Self> {
        let type_sig = TypeSignature(c.u32()?);
        c.skip(4)?;

        match type_sig {
            TypeSignature::CURVE => {
                let count = c.u32()? as usize;
                match count {
                    0 => Ok(Self::Identity),
                    1 => Ok(Self::Gamma(c.u8_fixed8()?)),
                    _ => {
                        if count > c.remaining() / 2 {
                            return Err(invalid(format!("curv table of {count} entries truncated")));
                        }
                        let table = (0..count).map(|_| c.u16()).collect::<Result<Vec<_>>>()?;
                        Ok(Self::Table(table))
                    }
                }
            }
            TypeSignature::PARA => {
                let function = c.u16()?;
                c.skip(2)?;
                let curve_type = ParametricCurveType::from_icc(function).ok_or_else(|| {
                    invalid(format!("unknown parametric function type {function}"))
                })?;
                let params = (0..curve_type.param_count())
                    .map(|_| c.s15_fixed16())
                    .collect::<Result<Vec<_>>>()?;
                ParametricCurve::from_params(curve_type, &params)
                    .map(Self::Parametric)
                    .ok_or_else(|| invalid("parametric curve parameters missing"))
            }
            other => Err(invalid(format!("expected curv or para, found '{other}'"))),
        }
    }

    /// Encode as a complete `curv`/`para` element, without trailing padding
    pub fn write(&self, w: &mut IccWriter) {
        match self {
            Self::Identity => {
                w.write_type_header(TypeSignature::CURVE);
                w.write_u32(0);
            }
            Self::Gamma(g) => {
                w.write_type_header(TypeSignature::CURVE);
                w.write_u32(1);
                w.write_u8_fixed8(*g);
            }
            Self::Table(table) => {
                w.write_type_header(TypeSignature::CURVE);
                w.write_u32(table.len() as u32);
                for &v in table {
                    w.write_u16(v);
                }
            }
            Self::Parametric(p) => {
                w.write_type_header(TypeSignature::PARA);
                w.write_u16(p.kind.to_icc());
                w.write_u16(0);
                for v in p.params() {
                    w.write_s15_fixed16(v);
                }
            }
        }
    }

    /// Encoded element size in bytes, without padding
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Identity => 12,
            Self::Gamma(_) => 14,
            Self::Table(t) => 12 + 2 * t.len(),
            Self::Parametric(p) => 12 + 4 * p.kind.param_count(),
        }
    }

    /// Evaluate the curve (encoded -> linear) over [0, 1]
    pub fn eval(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Self::Identity => x,
            Self::Gamma(g) => x.powf(*g),
            Self::Table(table) => interp_u16(table, x),
            Self::Parametric(p) => p.eval(x),
        }
    }

    /// Evaluate the inverse (linear -> encoded).
    ///
    /// Tables are inverted by binary search over the sampled values and work
    /// for either monotonic direction.
    pub fn eval_inverse(&self, y: f64) -> f64 {
        let y = y.clamp(0.0, 1.0);
        match self {
            Self::Identity => y,
            Self::Gamma(g) => {
                if g.abs() > 1e-10 {
                    y.powf(1.0 / g)
                } else {
                    y
                }
            }
            Self::Table(table) => invert_table(table, y),
            Self::Parametric(p) => p.eval_inverse(y),
        }
    }

    /// True when the curve maps every input to itself (within `epsilon`)
    pub fn is_identity(&self, epsilon: f64) -> bool {
        match self {
            Self::Identity => true,
            Self::Gamma(g) => (g - 1.0).abs() <= epsilon,
            _ => (0..=16).all(|i| {
                let x = i as f64 / 16.0;
                (self.eval(x) - x).abs() <= epsilon
            }),
        }
    }

    /// Exponent when the curve is a pure power law
    pub fn exact_gamma(&self) -> Option<f64> {
        match self {
            Self::Identity => Some(1.0),
            Self::Gamma(g) => Some(*g),
            Self::Parametric(p) if p.kind == ParametricCurveType::Gamma => Some(p.exponent()),
            _ => None,
        }
    }
}

fn interp_u16(table: &[u16], x: f64) -> f64 {
    match table.len() {
        0 => x,
        1 => table[0] as f64 / 65535.0,
        n => {
            let pos = x * (n - 1) as f64;
            let i = (pos.floor() as usize).min(n - 2);
            let t = pos - i as f64;
            let a = table[i] as f64;
            let b = table[i + 1] as f64;
            (a + t * (b - a)) / 65535.0
        }
    }
}

fn invert_table(table: &[u16], y: f64) -> f64 {
    let n = table.len();
    if n < 2 {
        return y;
    }
    let first = table[0] as f64 / 65535.0;
    let last = table[n - 1] as f64 / 65535.0;
    let ascending = last >= first;
    let target = y * 65535.0;

    // First index whose sample passes `target` in the table's direction
    let (mut lo, mut hi) = (0usize, n - 1);
    while lo < hi {
        let mid = (lo + hi) / 2;
        let v = table[mid] as f64;
        let before = if ascending { v < target } else { v > target };
        if before {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    if lo == 0 {
        return 0.0;
    }
    let a = table[lo - 1] as f64;
    let b = table[lo] as f64;
    let t = if (b - a).abs() > f64::EPSILON {
        ((target - a) / (b - a)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((lo - 1) as f64 + t) / (n - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<Curve> {
        Curve::read(&mut Cursor::new(bytes))
    }

    fn encode(curve: &Curve) -> Vec<u8> {
        let mut w = IccWriter::new();
        curve.write(&mut w);
        w.into_inner()
    }

    #[test]
    fn test_curv_identity_and_gamma() {
        let identity = b"curv\0\0\0\0\0\0\0\0";
        assert_eq!(decode(identity).unwrap(), Curve::Identity);

        let mut gamma = b"curv\0\0\0\0\0\0\0\x01".to_vec();
        gamma.extend_from_slice(&[0x02, 0x33]); // 2.2 in u8Fixed8
        let curve = decode(&gamma).unwrap();
        let g = curve.exact_gamma().unwrap();
        assert!((g - 2.19921875).abs() < 1e-9);
        assert_eq!(encode(&curve), gamma);
    }

    #[test]
    fn test_curv_table_eval_and_inverse() {
        let table: Vec<u16> = (0..256)
            .map(|i| ((i as f64 / 255.0).powf(2.2) * 65535.0).round() as u16)
            .collect();
        let curve = Curve::Table(table);
        let bytes = encode(&curve);
        assert_eq!(bytes.len(), curve.encoded_len());
        assert_eq!(decode(&bytes).unwrap(), curve);

        let y = curve.eval(0.5);
        assert!((y - 0.5_f64.powf(2.2)).abs() < 1e-3);
        assert!((curve.eval_inverse(y) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_descending_table_inverse() {
        let curve = Curve::Table(vec![65535, 32768, 0]);
        assert!((curve.eval_inverse(0.75) - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_para_round_trip() {
        let curve = Curve::Parametric(ParametricCurve::srgb());
        let bytes = encode(&curve);
        assert_eq!(&bytes[..4], b"para");
        assert_eq!(bytes.len(), 32);
        let back = decode(&bytes).unwrap();
        // s15Fixed16 quantization
        assert!((back.eval(0.5) - curve.eval(0.5)).abs() < 1e-4);
    }

    #[test]
    fn test_truncated_and_unknown() {
        let mut truncated = b"curv\0\0\0\0\0\0\0\x10".to_vec();
        truncated.extend_from_slice(&[0u8; 6]);
        assert!(decode(&truncated).is_err());

        let bad_para = b"para\0\0\0\0\0\x09\0\0";
        assert!(decode(bad_para).is_err());
        assert!(decode(b"XYZ \0\0\0\0").is_err());
    }

    #[test]
    fn test_is_identity() {
        assert!(Curve::Identity.is_identity(0.0));
        assert!(Curve::Table(vec![0, 65535]).is_identity(1e-9));
        assert!(!Curve::Gamma(2.2).is_identity(1e-3));
    }
}
