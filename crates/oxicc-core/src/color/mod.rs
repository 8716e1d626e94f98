//! PCS coordinates: D50-relative XYZ and CIELAB

pub mod lab;
pub mod xyz;

pub use lab::Lab;
pub use xyz::{D50, D65, Xyz};
