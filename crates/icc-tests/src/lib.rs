//! # icc-tests
//!
//! Integration and interop testing for oxicc.
//!
//! This crate provides:
//! - Byte-level profile fixtures for parse and builder tests
//! - Seeded pixel patterns
//! - Accuracy measurement (channel differences, CIEDE2000 via palette)
//!
//! ## Reference Implementations
//!
//! - **lcms2**: parses our serialized profiles and serves as the pixel reference
//! - **qcms**: Firefox's CMS, checks our matrix-shaper profiles are accepted

pub mod accuracy;
pub mod fixtures;
pub mod patterns;

pub use accuracy::{DeltaEStats, delta_e_2000, max_channel_diff};
pub use patterns::{TestPattern, generate_pattern};
