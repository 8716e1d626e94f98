//! Mathematical operations for color management
//!
//! - 3x3 matrix operations for colorant matrices
//! - ICC parametric transfer functions
//! - Bradford chromatic adaptation
//! - Interpolation for curve and CLUT evaluation

pub mod chromatic_adaptation;
pub mod interpolation;
pub mod matrix;
pub mod parametric;

pub use chromatic_adaptation::bradford_adaptation;
pub use interpolation::{
    interp_table, lerp, multilinear_interp, tetrahedral_interp, trilinear_interp,
};
pub use matrix::Matrix3x3;
pub use parametric::{ParametricCurve, ParametricCurveType};
