//! ICC profile binary format
//!
//! Byte-level building blocks for ICC.1:2022 (v4) and ICC.1:2001-04 (v2).
//!
//! # Structure
//!
//! An ICC profile consists of:
//! 1. A 128-byte header
//! 2. A tag table listing all tags
//! 3. Tag data (entries may share data)
//!
//! [`Profile`](crate::Profile) ties these together; the pieces here are
//! usable on their own for tooling that works below the profile level.

pub mod header;
pub mod io;
pub mod md5;
pub mod tag_table;
pub mod tags;
pub mod types;

pub use header::{
    ColorSpace, HEADER_SIZE, PROFILE_SIGNATURE, ProfileClass, ProfileHeader, ProfileVersion,
    RenderingIntent,
};
pub use io::{Cursor, IccReader, IccWriter};
pub use tag_table::{TagEntry, TagTable};
pub use tags::{
    Clut, Curve, LegacyLut, LocalizedString, LutAb, LutAbKind, LutMatrix, LutPrecision, TagData,
    TextData, TextKind, VcgtData, VcgtFormula,
};
pub use types::{
    DateTimeNumber, S15Fixed16, TagSignature, TypeSignature, U8Fixed8, XyzNumber,
};
