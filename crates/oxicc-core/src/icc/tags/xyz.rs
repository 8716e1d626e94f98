//! XYZ and s15Fixed16 array tag types
//!
//! `XYZ ` holds colorants, media white and black points; `sf32` holds the
//! chromatic adaptation matrix.
//!
//! See ICC.1:2022 Sections 10.22 and 10.31

use crate::color::Xyz;
use crate::error::Result;
use crate::icc::io::{Cursor, IccWriter};
use crate::icc::types::{TypeSignature, XyzNumber};
use crate::math::Matrix3x3;

use super::invalid;

/// Parse the XYZNumber array of an `XYZ ` tag (full tag bytes)
pub fn parse_xyz(data: &[u8]) -> Result<Vec<XyzNumber>> {
    let count = data.len().saturating_sub(8) / 12;
    if count == 0 {
        return Err(invalid("XYZ tag holds no values"));
    }
    let mut c = Cursor::at(data, 8);
    (0..count).map(|_| c.xyz()).collect()
}

pub fn write_xyz(values: &[XyzNumber], w: &mut IccWriter) {
    w.write_type_header(TypeSignature::XYZ);
    for v in values {
        w.write_xyz(v);
    }
}

/// Parse an `sf32` array (full tag bytes)
pub fn parse_sf32(data: &[u8]) -> Result<Vec<f64>> {
    let count = data.len().saturating_sub(8) / 4;
    let mut c = Cursor::at(data, 8);
    (0..count).map(|_| c.s15_fixed16()).collect()
}

pub fn write_sf32(values: &[f64], w: &mut IccWriter) {
    w.write_type_header(TypeSignature::SF32);
    for &v in values {
        w.write_s15_fixed16(v);
    }
}

/// Interpret the first nine `sf32` values as a row-major 3x3 matrix
pub fn sf32_matrix(values: &[f64]) -> Option<Matrix3x3> {
    if values.len() < 9 {
        return None;
    }
    Some(Matrix3x3::new([
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
        [values[6], values[7], values[8]],
    ]))
}

/// First value of an XYZ array as a float triple
pub fn first_xyz(values: &[XyzNumber]) -> Option<Xyz> {
    values.first().map(XyzNumber::to_xyz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::D50;

    #[test]
    fn test_xyz_round_trip() {
        let values = vec![XyzNumber::from_xyz(D50), XyzNumber::from_xyz(Xyz::new(0.1, 0.2, 0.3))];
        let mut w = IccWriter::new();
        write_xyz(&values, &mut w);
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), 8 + 24);
        let back = parse_xyz(&bytes).unwrap();
        assert_eq!(back, values);
        assert!(first_xyz(&back).unwrap().approx_eq(&D50, 1e-4));
    }

    #[test]
    fn test_xyz_empty_rejected() {
        assert!(parse_xyz(b"XYZ \0\0\0\0\0\0\0\0").is_err());
    }

    #[test]
    fn test_sf32_matrix() {
        let values = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let mut w = IccWriter::new();
        write_sf32(&values, &mut w);
        let parsed = parse_sf32(&w.into_inner()).unwrap();
        assert!(sf32_matrix(&parsed).unwrap().is_identity(1e-9));
        assert!(sf32_matrix(&parsed[..8]).is_none());
    }
}
