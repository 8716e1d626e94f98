//! ICC parametric curves (`para`, ICC.1:2022 section 10.18)
//!
//! Every function type is a special case of type 4,
//!
//! ```text
//! Y = (aX + b)^g + e   for X >= d
//! Y = cX + f           for X <  d
//! ```
//!
//! so curves are kept in that form and remember their stored type only for
//! serialization.

/// Stored function type; the discriminant is the value written to the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ParametricCurveType {
    /// `X^g`
    Gamma = 0,
    /// `(aX + b)^g`, zero below `-b/a` (CIE 122-1966)
    Offset = 1,
    /// `(aX + b)^g + c`, `c` below `-b/a` (IEC 61966-3)
    OffsetBias = 2,
    /// `(aX + b)^g` above `d`, `cX` below (IEC 61966-2.1, sRGB)
    Linear = 3,
    /// The general form above
    LinearBias = 4,
}

impl ParametricCurveType {
    pub fn from_icc(value: u16) -> Option<Self> {
        [
            Self::Gamma,
            Self::Offset,
            Self::OffsetBias,
            Self::Linear,
            Self::LinearBias,
        ]
        .into_iter()
        .find(|t| t.to_icc() == value)
    }

    pub fn to_icc(self) -> u16 {
        self as u16
    }

    /// Number of s15Fixed16 parameters stored for this type
    pub fn param_count(self) -> usize {
        [1, 3, 4, 5, 7][self as usize]
    }
}

/// Parametric transfer function, encoded to linear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricCurve {
    pub kind: ParametricCurveType,
    /// g, a, b, c, d, e, f of the general form
    general: [f64; 7],
}

impl ParametricCurve {
    pub fn gamma(g: f64) -> Self {
        Self {
            kind: ParametricCurveType::Gamma,
            general: [g, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        }
    }

    /// IEC 61966-2-1 sRGB
    pub fn srgb() -> Self {
        Self::linear_segment(2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045)
    }

    /// BT.709, also used by BT.2020
    pub fn bt709() -> Self {
        Self::linear_segment(1.0 / 0.45, 1.0 / 1.099, 0.099 / 1.099, 1.0 / 4.5, 0.081)
    }

    fn linear_segment(g: f64, a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            kind: ParametricCurveType::Linear,
            general: [g, a, b, c, d, 0.0, 0.0],
        }
    }

    /// Build from stored parameters; `None` when too few are given
    pub fn from_params(kind: ParametricCurveType, params: &[f64]) -> Option<Self> {
        let p = params.get(..kind.param_count())?;
        let threshold = |a: f64, b: f64| if a.abs() > 1e-10 { -b / a } else { 0.0 };
        let general = match kind {
            ParametricCurveType::Gamma => [p[0], 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            ParametricCurveType::Offset => [p[0], p[1], p[2], 0.0, threshold(p[1], p[2]), 0.0, 0.0],
            ParametricCurveType::OffsetBias => {
                [p[0], p[1], p[2], 0.0, threshold(p[1], p[2]), p[3], p[3]]
            }
            ParametricCurveType::Linear => [p[0], p[1], p[2], p[3], p[4], 0.0, 0.0],
            ParametricCurveType::LinearBias => [p[0], p[1], p[2], p[3], p[4], p[5], p[6]],
        };
        Some(Self { kind, general })
    }

    /// Parameters in stored order
    pub fn params(&self) -> Vec<f64> {
        let [g, a, b, c, d, e, f] = self.general;
        match self.kind {
            ParametricCurveType::Gamma => vec![g],
            ParametricCurveType::Offset => vec![g, a, b],
            ParametricCurveType::OffsetBias => vec![g, a, b, e],
            ParametricCurveType::Linear => vec![g, a, b, c, d],
            ParametricCurveType::LinearBias => vec![g, a, b, c, d, e, f],
        }
    }

    /// The power-segment exponent
    pub fn exponent(&self) -> f64 {
        self.general[0]
    }

    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        let [g, a, b, c, d, e, f] = self.general;
        let x = x.clamp(0.0, 1.0);
        if x >= d {
            (a * x + b).max(0.0).powf(g) + e
        } else {
            c * x + f
        }
    }

    /// Linear to encoded, in closed form for every type
    pub fn eval_inverse(&self, y: f64) -> f64 {
        let [g, a, b, c, d, e, f] = self.general;
        let y = y.clamp(0.0, 1.0);
        if g.abs() < 1e-10 || a.abs() < 1e-10 {
            return y;
        }
        let x = ((y - e).max(0.0).powf(1.0 / g) - b) / a;
        if x >= d || c.abs() < 1e-10 {
            x.clamp(0.0, 1.0)
        } else {
            ((y - f) / c).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srgb_reference(v: f64) -> f64 {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    }

    #[test]
    fn test_srgb_matches_reference() {
        let curve = ParametricCurve::srgb();
        for i in 0..=255 {
            let x = i as f64 / 255.0;
            assert!((curve.eval(x) - srgb_reference(x)).abs() < 1e-12, "{i}");
            assert!((curve.eval_inverse(curve.eval(x)) - x).abs() < 1e-9, "{i}");
        }
    }

    #[test]
    fn test_every_type_inverts() {
        let cases: [(ParametricCurveType, &[f64]); 5] = [
            (ParametricCurveType::Gamma, &[1.8]),
            (ParametricCurveType::Offset, &[2.2, 1.1, -0.1]),
            (ParametricCurveType::OffsetBias, &[2.4, 1.0 / 1.055, 0.055 / 1.055, 0.01]),
            (ParametricCurveType::Linear, &[2.6, 1.0, 0.0, 0.5, 0.1]),
            (ParametricCurveType::LinearBias, &[2.4, 0.9, 0.1, 0.25, 0.21, 0.02, 0.01]),
        ];
        for (kind, params) in cases {
            let curve = ParametricCurve::from_params(kind, params).unwrap();
            assert_eq!(curve.params(), params);
            for i in 3..20 {
                let x = i as f64 / 20.0;
                let back = curve.eval_inverse(curve.eval(x));
                assert!((back - x).abs() < 1e-9, "{kind:?} at {x}: {back}");
            }
        }
    }

    #[test]
    fn test_offset_is_zero_below_threshold() {
        let curve =
            ParametricCurve::from_params(ParametricCurveType::Offset, &[2.0, 2.0, -0.5]).unwrap();
        assert_eq!(curve.eval(0.1), 0.0);
        assert!((curve.eval(0.75) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_type_codes() {
        for value in 0..5 {
            let kind = ParametricCurveType::from_icc(value).unwrap();
            assert_eq!(kind.to_icc(), value);
        }
        assert_eq!(ParametricCurveType::from_icc(5), None);
        assert_eq!(ParametricCurveType::LinearBias.param_count(), 7);
        let short = ParametricCurve::from_params(ParametricCurveType::LinearBias, &[1.0, 2.0]);
        assert!(short.is_none());
    }
}
