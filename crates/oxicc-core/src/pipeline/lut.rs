//! LUT stages
//!
//! A LUT tag is flattened into a list of elements evaluated in order over
//! normalized values:
//!
//! - `mft1` / `mft2`: matrix (XYZ input only), input tables, CLUT, output tables
//! - `mAB `: A curves, CLUT, M curves, matrix + offset, B curves
//! - `mBA `: B curves, matrix + offset, M curves, CLUT, A curves
//!
//! PCS values are converted to and from the LUT's integer encoding at the
//! stage edges; device values pass through clamped to [0, 1].

use crate::error::{Error, Result};
use crate::icc::{
    Clut, ColorSpace, Curve, LegacyLut, LutAb, LutAbKind, LutMatrix, LutPrecision, TagData,
    TagSignature,
};
use crate::math::{
    Matrix3x3, interp_table, multilinear_interp, tetrahedral_interp, trilinear_interp,
};

use super::MAX_CHANNELS;
use super::options::Interpolation;
use super::pcs::PcsEncoding;

#[derive(Debug, Clone)]
enum Element {
    Curves(Vec<Curve>),
    Tables(Vec<Vec<f64>>),
    Matrix(Matrix3x3),
    MatrixOffset(LutMatrix),
    Clut(ClutElement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClutMethod {
    Tetrahedral,
    Trilinear,
    Multilinear,
}

#[derive(Debug, Clone)]
struct ClutElement {
    grid: Vec<usize>,
    outputs: usize,
    data: Vec<f64>,
    method: ClutMethod,
}

impl ClutElement {
    fn new(clut: &Clut, interpolation: Interpolation) -> Self {
        let grid: Vec<usize> = clut.grid_points.iter().map(|&g| g as usize).collect();
        let cubic = grid.len() == 3 && grid.iter().all(|&g| g == grid[0]);
        let method = match (cubic, interpolation) {
            (true, Interpolation::Tetrahedral) => ClutMethod::Tetrahedral,
            (true, Interpolation::Trilinear) => ClutMethod::Trilinear,
            (false, _) => ClutMethod::Multilinear,
        };
        Self {
            grid,
            outputs: clut.output_channels,
            data: clut.data.clone(),
            method,
        }
    }

    #[inline]
    fn eval(&self, input: &[f64], out: &mut [f64]) {
        let out = &mut out[..self.outputs];
        match self.method {
            ClutMethod::Tetrahedral => {
                tetrahedral_interp(&self.data, self.grid[0], [input[0], input[1], input[2]], out)
            }
            ClutMethod::Trilinear => {
                trilinear_interp(&self.data, self.grid[0], [input[0], input[1], input[2]], out)
            }
            ClutMethod::Multilinear => {
                multilinear_interp(&self.data, &self.grid, &input[..self.grid.len()], out)
            }
        }
    }
}

impl Element {
    #[inline]
    fn eval(&self, v: &mut [f64; MAX_CHANNELS]) {
        match self {
            Self::Curves(curves) => {
                for (x, curve) in v.iter_mut().zip(curves) {
                    *x = curve.eval(*x);
                }
            }
            Self::Tables(tables) => {
                for (x, table) in v.iter_mut().zip(tables) {
                    *x = interp_table(table, *x);
                }
            }
            Self::Matrix(m) => {
                let r = m.multiply_vec([v[0], v[1], v[2]]);
                v[..3].copy_from_slice(&r);
            }
            Self::MatrixOffset(m) => {
                let r = m.apply([v[0], v[1], v[2]]);
                v[..3].copy_from_slice(&r);
            }
            Self::Clut(clut) => {
                let mut out = [0.0; MAX_CHANNELS];
                clut.eval(&v[..], &mut out);
                *v = out;
            }
        }
    }
}

/// Compiled LUT tag
#[derive(Debug, Clone)]
pub(crate) struct LutStage {
    inputs: usize,
    outputs: usize,
    input_pcs: Option<PcsEncoding>,
    output_pcs: Option<PcsEncoding>,
    elements: Vec<Element>,
}

impl LutStage {
    /// Compile a decoded LUT tag read from `signature`
    pub(crate) fn new(
        signature: TagSignature,
        tag: &TagData,
        input_space: ColorSpace,
        output_space: ColorSpace,
        interpolation: Interpolation,
    ) -> Result<Self> {
        let (inputs, outputs, legacy16, elements) = match tag {
            TagData::Lut(lut) => (
                lut.input_channels,
                lut.output_channels,
                lut.precision == LutPrecision::U16,
                legacy_elements(lut, input_space, interpolation),
            ),
            TagData::LutAb(lut) => (
                lut.input_channels,
                lut.output_channels,
                false,
                ab_elements(lut, interpolation),
            ),
            other => {
                return Err(Error::malformed_tag(
                    signature,
                    format!("expected a LUT type, found {}", other.type_signature()),
                ));
            }
        };

        if inputs != input_space.channels() || outputs != output_space.channels() {
            return Err(Error::IncompatibleChain(format!(
                "{signature} maps {inputs} -> {outputs} channels, \
                 profile needs {} ({input_space}) -> {} ({output_space})",
                input_space.channels(),
                output_space.channels()
            )));
        }

        Ok(Self {
            inputs,
            outputs,
            input_pcs: PcsEncoding::for_lut(input_space, legacy16),
            output_pcs: PcsEncoding::for_lut(output_space, legacy16),
            elements,
        })
    }

    pub(crate) fn eval(&self, input: &[f64], out: &mut [f64]) {
        let mut v = [0.0; MAX_CHANNELS];
        match self.input_pcs {
            Some(enc) => enc.encode(input, &mut v),
            None => {
                for (x, &i) in v.iter_mut().zip(&input[..self.inputs]) {
                    *x = i.clamp(0.0, 1.0);
                }
            }
        }

        for element in &self.elements {
            element.eval(&mut v);
        }

        match self.output_pcs {
            Some(enc) => enc.decode(&v, out),
            None => {
                for (o, &x) in out.iter_mut().zip(&v[..self.outputs]) {
                    *o = x.clamp(0.0, 1.0);
                }
            }
        }
    }
}

fn legacy_elements(
    lut: &LegacyLut,
    input_space: ColorSpace,
    interpolation: Interpolation,
) -> Vec<Element> {
    let mut elements = Vec::with_capacity(4);
    if input_space == ColorSpace::Xyz && !lut.matrix.is_identity(1e-9) {
        elements.push(Element::Matrix(lut.matrix));
    }
    elements.push(Element::Tables(lut.input_tables.clone()));
    elements.push(Element::Clut(ClutElement::new(&lut.clut, interpolation)));
    elements.push(Element::Tables(lut.output_tables.clone()));
    elements
}

fn ab_elements(lut: &LutAb, interpolation: Interpolation) -> Vec<Element> {
    let curves = |c: &Option<Vec<Curve>>| c.clone().map(Element::Curves);
    let clut = lut
        .clut
        .as_ref()
        .map(|c| Element::Clut(ClutElement::new(c, interpolation)));
    let matrix = lut.matrix.map(Element::MatrixOffset);

    let ordered = match lut.kind {
        LutAbKind::AToB => [
            curves(&lut.a_curves),
            clut,
            curves(&lut.m_curves),
            matrix,
            curves(&lut.b_curves),
        ],
        LutAbKind::BToA => [
            curves(&lut.b_curves),
            matrix,
            curves(&lut.m_curves),
            clut,
            curves(&lut.a_curves),
        ],
    };
    ordered.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_clut(grid: u8, outputs: usize) -> Clut {
        let g = grid as usize;
        let mut data = Vec::new();
        for r in 0..g {
            for gg in 0..g {
                for b in 0..g {
                    let p = [r, gg, b].map(|i| i as f64 / (g - 1) as f64);
                    data.extend_from_slice(&p[..outputs]);
                }
            }
        }
        Clut {
            grid_points: vec![grid; 3],
            output_channels: outputs,
            data,
        }
    }

    fn legacy(precision: LutPrecision) -> LegacyLut {
        LegacyLut {
            precision,
            input_channels: 3,
            output_channels: 3,
            matrix: Matrix3x3::identity(),
            input_tables: vec![vec![0.0, 1.0]; 3],
            clut: identity_clut(5, 3),
            output_tables: vec![vec![0.0, 1.0]; 3],
        }
    }

    #[test]
    fn test_device_identity() {
        let tag = TagData::Lut(legacy(LutPrecision::U16));
        for interp in [Interpolation::Tetrahedral, Interpolation::Trilinear] {
            let stage = LutStage::new(
                TagSignature::A2B0,
                &tag,
                ColorSpace::Rgb,
                ColorSpace::Rgb,
                interp,
            )
            .unwrap();
            let mut out = [0.0; 3];
            stage.eval(&[0.2, 0.55, 0.9], &mut out);
            assert!((out[0] - 0.2).abs() < 1e-9);
            assert!((out[1] - 0.55).abs() < 1e-9);
            assert!((out[2] - 0.9).abs() < 1e-9);
        }
    }

    #[test]
    fn test_lab_output_encoding() {
        // Identity tables and grid: the device value is the encoded Lab
        let v2 = TagData::Lut(legacy(LutPrecision::U16));
        let stage = LutStage::new(
            TagSignature::A2B0,
            &v2,
            ColorSpace::Rgb,
            ColorSpace::Lab,
            Interpolation::Tetrahedral,
        )
        .unwrap();
        let mut lab = [0.0; 3];
        stage.eval(&[1.0, 0.5, 0.5], &mut lab);
        assert!((lab[0] - 100.0 * 65535.0 / 65280.0).abs() < 1e-6);

        let v4 = TagData::Lut(legacy(LutPrecision::U8));
        let stage = LutStage::new(
            TagSignature::A2B0,
            &v4,
            ColorSpace::Rgb,
            ColorSpace::Lab,
            Interpolation::Tetrahedral,
        )
        .unwrap();
        stage.eval(&[1.0, 128.0 / 255.0, 128.0 / 255.0], &mut lab);
        assert!((lab[0] - 100.0).abs() < 1e-6);
        assert!(lab[1].abs() < 1e-6 && lab[2].abs() < 1e-6);
    }

    #[test]
    fn test_ab_element_order() {
        // mAB with only B curves and a matrix: matrix runs before the curves
        let lut = LutAb {
            kind: LutAbKind::AToB,
            input_channels: 3,
            output_channels: 3,
            a_curves: None,
            clut: None,
            m_curves: Some(vec![Curve::Identity; 3]),
            matrix: Some(LutMatrix {
                matrix: Matrix3x3::diagonal(0.5, 0.5, 0.5),
                offset: [0.0; 3],
            }),
            b_curves: Some(vec![Curve::Gamma(2.0); 3]),
        };
        let stage = LutStage::new(
            TagSignature::A2B0,
            &TagData::LutAb(lut.clone()),
            ColorSpace::Rgb,
            ColorSpace::Rgb,
            Interpolation::Tetrahedral,
        )
        .unwrap();
        let mut out = [0.0; 3];
        stage.eval(&[1.0, 1.0, 1.0], &mut out);
        assert!((out[0] - 0.25).abs() < 1e-12);

        // The same elements read as mBA run curves first
        let bta = LutAb {
            kind: LutAbKind::BToA,
            ..lut
        };
        let stage = LutStage::new(
            TagSignature::B2A0,
            &TagData::LutAb(bta),
            ColorSpace::Rgb,
            ColorSpace::Rgb,
            Interpolation::Tetrahedral,
        )
        .unwrap();
        stage.eval(&[0.8, 0.8, 0.8], &mut out);
        assert!((out[0] - 0.32).abs() < 1e-12);
    }

    #[test]
    fn test_channel_mismatch() {
        let tag = TagData::Lut(legacy(LutPrecision::U16));
        assert!(matches!(
            LutStage::new(
                TagSignature::A2B0,
                &tag,
                ColorSpace::Cmyk,
                ColorSpace::Lab,
                Interpolation::Tetrahedral
            ),
            Err(Error::IncompatibleChain(_))
        ));
        assert!(matches!(
            LutStage::new(
                TagSignature::A2B0,
                &TagData::Curve(Curve::Identity),
                ColorSpace::Rgb,
                ColorSpace::Lab,
                Interpolation::Tetrahedral
            ),
            Err(Error::MalformedTag { .. })
        ));
    }

    #[test]
    fn test_four_input_multilinear() {
        // 2-point 4D grid whose output is the mean of the inputs
        let mut data = Vec::new();
        for i in 0..16u32 {
            data.push(i.count_ones() as f64 / 4.0);
        }
        let lut = LegacyLut {
            precision: LutPrecision::U16,
            input_channels: 4,
            output_channels: 1,
            matrix: Matrix3x3::identity(),
            input_tables: vec![vec![0.0, 1.0]; 4],
            clut: Clut {
                grid_points: vec![2; 4],
                output_channels: 1,
                data,
            },
            output_tables: vec![vec![0.0, 1.0]],
        };
        let stage = LutStage::new(
            TagSignature::A2B0,
            &TagData::Lut(lut),
            ColorSpace::Cmyk,
            ColorSpace::Gray,
            Interpolation::Tetrahedral,
        )
        .unwrap();
        let mut out = [0.0];
        stage.eval(&[0.2, 0.4, 0.6, 0.8], &mut out);
        assert!((out[0] - 0.5).abs() < 1e-12);
    }
}
