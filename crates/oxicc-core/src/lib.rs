//! # oxicc - ICC profiles in pure Rust
//!
//! Parse, validate, build and apply ICC v2/v4 color profiles.
//!
//! ## Features
//!
//! - **Bit-exact I/O**: an unmodified profile serializes to the bytes it
//!   was parsed from; edited profiles are repacked with shared tags kept
//! - **Validation**: header and tag table checks on parse, plus
//!   [`Profile::verify`] for class-specific conformance
//! - **Transforms**: matrix-shaper, gray and LUT (`mft1`, `mft2`, `mAB `,
//!   `mBA `) profiles chained at the PCS, with black point compensation
//! - **Pixels**: 8-bit, 16-bit and float buffers with every alpha and
//!   byte-order layout, optionally row-parallel
//!
//! ## Quick Start
//!
//! ```
//! use oxicc_core::{PixelBuffer, PixelBufferMut, PixelFormat, Profile, Transform};
//!
//! let srgb = Profile::named("sRGB").unwrap().unwrap();
//! let p3 = Profile::named("Display P3").unwrap().unwrap();
//! let transform = Transform::between(&srgb, &p3).unwrap();
//!
//! let src = [255u8, 128, 64];
//! let mut dst = [0u8; 3];
//! transform
//!     .apply(
//!         &PixelBuffer::new(&src, 1, 1, 3, PixelFormat::RGB8),
//!         &mut PixelBufferMut::new(&mut dst, 1, 1, 3, PixelFormat::RGB8),
//!     )
//!     .unwrap();
//! ```
//!
//! ## Cargo features
//!
//! - `parallel` (default): run transform rows on rayon
//! - `registry` (default): [`DirectoryRegistry`] over profile folders

pub mod builder;
pub mod color;
pub mod error;
pub mod icc;
pub mod math;
pub mod pipeline;
pub mod pixel;
pub mod profile;
#[cfg(feature = "registry")]
pub mod registry;
pub mod standard;
pub mod transform;
pub mod verify;

pub use builder::{HeaderField, MutableProfile};
pub use color::{D50, D65, Lab, Xyz};
pub use error::{Error, Result};
pub use icc::{ColorSpace, ProfileClass, ProfileHeader, RenderingIntent, TagData, TagSignature};
pub use math::{Matrix3x3, ParametricCurve};
pub use pipeline::{Interpolation, TransformOptions};
pub use pixel::{AlphaInfo, ByteOrder, Depth, Layout, PixelBuffer, PixelBufferMut, PixelFormat};
pub use profile::Profile;
#[cfg(feature = "registry")]
pub use registry::{DirectoryRegistry, ProfileRegistry, RegistryEntry};
pub use standard::StandardProfile;
pub use transform::{Direction, StageDescriptor, Transform};
pub use verify::Issue;

/// Version of oxicc
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_profile_and_transform_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Profile>();
        assert_send_sync::<Transform<'static>>();
    }
}
