//! Mutable profile builder
//!
//! [`MutableProfile`] owns a private copy of the profile bytes. Tag edits
//! append data to that buffer (or overwrite in place when the size is
//! unchanged and no other tag shares the data); replaced bytes stay behind
//! as orphans until [`MutableProfile::compact`] or serialization.
//!
//! Serialization writes the header, the table and the tag data in
//! ascending signature order. An unmodified copy serializes to exactly the
//! bytes it was made from.

use std::collections::HashMap;

use tracing::trace;

use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::icc::header::{HEADER_SIZE, INTENT_RANGE};
use crate::icc::tag_table::TAG_ENTRY_SIZE;
use crate::icc::{
    ColorSpace, DateTimeNumber, IccWriter, ProfileClass, ProfileHeader, ProfileVersion, TagData,
    TagEntry, TagSignature, TagTable, XyzNumber,
};
use crate::profile::Profile;

/// One header field and its new value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderField {
    CmmType(u32),
    Version(ProfileVersion),
    DeviceClass(ProfileClass),
    ColorSpace(ColorSpace),
    Pcs(ColorSpace),
    CreationDate(DateTimeNumber),
    Platform(u32),
    Flags(u32),
    Manufacturer(u32),
    Model(u32),
    Attributes(u64),
    /// Raw header value; only 0..=3 are accepted
    RenderingIntent(u32),
    Illuminant(Xyz),
    Creator(u32),
}

/// Editable ICC profile
#[derive(Debug, Clone)]
pub struct MutableProfile {
    header: ProfileHeader,
    table: TagTable,
    data: Vec<u8>,
    modified: bool,
}

impl MutableProfile {
    /// Empty v4.3 profile with a D50 illuminant and no tags
    pub fn new(device_class: ProfileClass, color_space: ColorSpace, pcs: ColorSpace) -> Self {
        let header = ProfileHeader::new(device_class, color_space, pcs);
        let mut data = header.to_bytes().to_vec();
        data.extend_from_slice(&[0; 4]);
        Self {
            header,
            table: TagTable::new(),
            data,
            modified: true,
        }
    }

    /// Private copy of a parsed profile
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            header: profile.header().clone(),
            table: profile.tag_table().clone(),
            data: profile.raw_data().to_vec(),
            modified: false,
        }
    }

    pub fn header(&self) -> &ProfileHeader {
        &self.header
    }

    pub fn tag(&self, signature: TagSignature) -> Option<&[u8]> {
        self.table
            .get(signature)
            .and_then(|e| self.data.get(e.range()))
    }

    pub fn contains_tag(&self, signature: TagSignature) -> bool {
        self.table.contains(signature)
    }

    /// Signatures in table order (insertion order for new tags)
    pub fn tag_signatures(&self) -> Vec<TagSignature> {
        self.table.signatures().collect()
    }

    /// True once any edit has been made since creation from bytes
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Insert, replace (`Some`) or remove (`None`) a tag
    pub fn set_tag(&mut self, signature: TagSignature, data: Option<&[u8]>) -> Result<()> {
        let Some(bytes) = data else {
            self.remove_tag(signature);
            return Ok(());
        };

        let size = u32::try_from(bytes.len()).map_err(|_| {
            Error::MalformedTagTable(format!("tag {signature} larger than 4 GiB"))
        })?;

        if let Some(entry) = self.table.get(signature).copied() {
            if entry.size == size && self.table.aliases_of(signature).is_empty() {
                trace!(tag = %signature, size, "replacing tag in place");
                self.data[entry.range()].copy_from_slice(bytes);
                self.modified = true;
                return Ok(());
            }
        }

        let offset = self.append(bytes)?;
        trace!(tag = %signature, offset, size, "appending tag");
        self.table.upsert(TagEntry::new(signature, offset, size));
        self.modified = true;
        Ok(())
    }

    /// Encode and store a typed tag
    pub fn set_tag_data(&mut self, signature: TagSignature, data: &TagData) -> Result<()> {
        let bytes = data.to_bytes()?;
        self.set_tag(signature, Some(&bytes))
    }

    /// Remove a tag; returns whether it was present
    pub fn remove_tag(&mut self, signature: TagSignature) -> bool {
        let removed = self.table.remove(signature).is_some();
        self.modified |= removed;
        removed
    }

    /// Point `signature` at the data of `existing` (shared tag data)
    pub fn share_tag(&mut self, signature: TagSignature, existing: TagSignature) -> Result<()> {
        let entry = *self
            .table
            .get(existing)
            .ok_or(Error::MissingTag(existing))?;
        self.table
            .upsert(TagEntry::new(signature, entry.offset, entry.size));
        self.modified = true;
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<u32> {
        let aligned = self.data.len().next_multiple_of(4);
        let offset = u32::try_from(aligned)
            .ok()
            .filter(|&o| (o as u64) + (bytes.len() as u64) <= u32::MAX as u64)
            .ok_or_else(|| Error::MalformedTagTable("profile would exceed 4 GiB".into()))?;
        self.data.resize(aligned, 0);
        self.data.extend_from_slice(bytes);
        Ok(offset)
    }

    /// Change one header field, validated exactly like parsing
    pub fn set_header_field(&mut self, field: HeaderField) -> Result<()> {
        let mut header = self.header.clone();
        let mut raw_intent = None;
        match field {
            HeaderField::CmmType(v) => header.cmm_type = v,
            HeaderField::Version(v) => {
                if v.minor > 0x0F || v.patch > 0x0F {
                    return Err(Error::MalformedHeader(format!(
                        "version {v} does not fit the minor and bug-fix nibbles"
                    )));
                }
                header.version = v;
            }
            HeaderField::DeviceClass(v) => header.device_class = v,
            HeaderField::ColorSpace(v) => header.color_space = v,
            HeaderField::Pcs(v) => header.pcs = v,
            HeaderField::CreationDate(v) => header.creation_date = v,
            HeaderField::Platform(v) => header.platform = v,
            HeaderField::Flags(v) => header.flags = v,
            HeaderField::Manufacturer(v) => header.manufacturer = v,
            HeaderField::Model(v) => header.model = v,
            HeaderField::Attributes(v) => header.attributes = v,
            HeaderField::RenderingIntent(v) => raw_intent = Some(v),
            HeaderField::Illuminant(v) => header.illuminant = XyzNumber::from_xyz(v),
            HeaderField::Creator(v) => header.creator = v,
        }
        let mut bytes = header.to_bytes();
        if let Some(intent) = raw_intent {
            bytes[INTENT_RANGE].copy_from_slice(&intent.to_be_bytes());
        }
        self.commit_header(&bytes)
    }

    /// Replace the whole header; the size field is ignored and recomputed
    pub fn set_header(&mut self, bytes: &[u8]) -> Result<()> {
        self.commit_header(bytes)
    }

    fn commit_header(&mut self, bytes: &[u8]) -> Result<()> {
        let header = ProfileHeader::parse_fields(bytes)?;
        if header != self.header {
            self.header = header;
            self.modified = true;
        }
        Ok(())
    }

    /// Drop orphaned bytes from the private buffer.
    ///
    /// An unmodified copy holds no orphans and is left as parsed. Otherwise
    /// tag data is repacked in table order behind a rewritten header and
    /// table, so the buffer stays a well-formed profile.
    pub fn compact(&mut self) {
        if !self.modified {
            return;
        }
        let mut data = vec![0; HEADER_SIZE + self.table.serialized_len()];
        let mut moved: HashMap<(u32, u32), u32> = HashMap::new();

        let old = std::mem::take(&mut self.data);
        for entry in self.table.entries_mut() {
            let offset = *moved.entry((entry.offset, entry.size)).or_insert_with(|| {
                let at = data.len().next_multiple_of(4);
                data.resize(at, 0);
                data.extend_from_slice(&old[entry.range()]);
                at as u32
            });
            entry.offset = offset;
        }

        let mut header = self.header.clone();
        header.size = data.len() as u32;
        let mut w = IccWriter::with_capacity(HEADER_SIZE + self.table.serialized_len());
        header.write_to(&mut w);
        self.table.write_to(&mut w);
        data[..w.len()].copy_from_slice(w.as_slice());
        self.data = data;
    }

    /// Serialized profile.
    ///
    /// Unmodified copies return the original bytes. Otherwise tags are laid
    /// out in ascending signature order with shared data written once, the
    /// size field is recomputed and the profile ID is cleared.
    pub fn raw_data(&self) -> Vec<u8> {
        if !self.modified {
            return self.data.clone();
        }

        let mut sorted: Vec<TagEntry> = self.table.entries().to_vec();
        sorted.sort_by_key(|e| e.signature);

        let mut table = TagTable::new();
        let data_start = HEADER_SIZE + 4 + TAG_ENTRY_SIZE * sorted.len();
        let mut payload = IccWriter::new();
        let mut placed: HashMap<(u32, u32), u32> = HashMap::new();
        for entry in &sorted {
            let offset = *placed.entry((entry.offset, entry.size)).or_insert_with(|| {
                let at = data_start + payload.len();
                payload.write_bytes(&self.data[entry.range()]);
                payload.pad_to_alignment(4);
                at as u32
            });
            table.upsert(TagEntry::new(entry.signature, offset, entry.size));
        }

        let mut header = self.header.clone();
        header.size = (data_start + payload.len()) as u32;
        header.profile_id = [0; 16];

        let mut w = IccWriter::with_capacity(header.size as usize);
        header.write_to(&mut w);
        table.write_to(&mut w);
        w.write_bytes(payload.as_slice());
        w.into_inner()
    }

    /// Freeze into an immutable [`Profile`]
    pub fn to_profile(&self) -> Result<Profile> {
        Profile::parse(self.raw_data())
    }
}

impl From<&Profile> for MutableProfile {
    fn from(profile: &Profile) -> Self {
        Self::from_profile(profile)
    }
}
