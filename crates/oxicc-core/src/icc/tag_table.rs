//! ICC tag table
//!
//! A u32 count at offset 128 followed by `count` (signature, offset, size)
//! triples. Entries keep their stored order; lookups go through a hash
//! index. Two entries may point at the same range (shared tag data) but
//! distinct ranges must not overlap.

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{Error, Result};

use super::header::HEADER_SIZE;
use super::io::{IccReader, IccWriter};
use super::types::TagSignature;

/// Size of one table entry
pub const TAG_ENTRY_SIZE: usize = 12;

/// One tag table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagEntry {
    pub signature: TagSignature,
    pub offset: u32,
    pub size: u32,
}

impl TagEntry {
    pub fn new(signature: TagSignature, offset: u32, size: u32) -> Self {
        Self {
            signature,
            offset,
            size,
        }
    }

    /// Byte range of the tag data
    pub fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }
}

/// Ordered, signature-unique tag table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTable {
    entries: Vec<TagEntry>,
    index: HashMap<TagSignature, usize>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate the table of a complete profile buffer
    pub fn parse(data: &[u8]) -> Result<Self> {
        let r = IccReader::new(data);
        let count = r.read_u32(HEADER_SIZE).map_err(|_| {
            Error::MalformedTagTable(format!(
                "buffer of {} bytes ends before the tag count",
                data.len()
            ))
        })? as usize;

        count
            .checked_mul(TAG_ENTRY_SIZE)
            .and_then(|n| n.checked_add(HEADER_SIZE + 4))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                Error::MalformedTagTable(format!(
                    "{count} entries exceed buffer of {} bytes",
                    data.len()
                ))
            })?;

        let mut table = Self::new();
        for i in 0..count {
            let at = HEADER_SIZE + 4 + i * TAG_ENTRY_SIZE;
            let entry = TagEntry::new(
                r.read_signature(at)?,
                r.read_u32(at + 4)?,
                r.read_u32(at + 8)?,
            );

            let end = (entry.offset as u64) + (entry.size as u64);
            if end > data.len() as u64 {
                return Err(Error::MalformedTagTable(format!(
                    "tag {} at {}+{} exceeds buffer of {} bytes",
                    entry.signature,
                    entry.offset,
                    entry.size,
                    data.len()
                )));
            }
            if table.index.contains_key(&entry.signature) {
                return Err(Error::MalformedTagTable(format!(
                    "duplicate tag {}",
                    entry.signature
                )));
            }
            table.push(entry);
        }

        table.check_overlaps()?;
        Ok(table)
    }

    /// Reject distinct ranges that share bytes; identical ranges alias
    fn check_overlaps(&self) -> Result<()> {
        let mut ranges: Vec<(Range<usize>, TagSignature)> = self
            .entries
            .iter()
            .filter(|e| e.size > 0)
            .map(|e| (e.range(), e.signature))
            .collect();
        ranges.sort_by_key(|(r, _)| (r.start, r.end));
        ranges.dedup_by(|b, a| a.0 == b.0);

        for pair in ranges.windows(2) {
            let (a, sig_a) = &pair[0];
            let (b, sig_b) = &pair[1];
            if b.start < a.end {
                return Err(Error::MalformedTagTable(format!(
                    "tags {sig_a} ({}..{}) and {sig_b} ({}..{}) overlap",
                    a.start, a.end, b.start, b.end
                )));
            }
        }
        Ok(())
    }

    fn push(&mut self, entry: TagEntry) {
        self.index.insert(entry.signature, self.entries.len());
        self.entries.push(entry);
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.signature, i))
            .collect();
    }

    pub fn get(&self, signature: TagSignature) -> Option<&TagEntry> {
        self.index.get(&signature).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, signature: TagSignature) -> bool {
        self.index.contains_key(&signature)
    }

    /// Entries in table order
    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    pub fn signatures(&self) -> impl Iterator<Item = TagSignature> + '_ {
        self.entries.iter().map(|e| e.signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Signatures of other entries pointing at exactly the same bytes
    pub fn aliases_of(&self, signature: TagSignature) -> Vec<TagSignature> {
        let Some(entry) = self.get(signature) else {
            return Vec::new();
        };
        self.entries
            .iter()
            .filter(|e| {
                e.signature != signature && e.offset == entry.offset && e.size == entry.size
            })
            .map(|e| e.signature)
            .collect()
    }

    /// Insert or replace, keeping the position of an existing entry
    pub(crate) fn upsert(&mut self, entry: TagEntry) {
        match self.index.get(&entry.signature) {
            Some(&i) => self.entries[i] = entry,
            None => self.push(entry),
        }
    }

    pub(crate) fn remove(&mut self, signature: TagSignature) -> Option<TagEntry> {
        let i = self.index.remove(&signature)?;
        let entry = self.entries.remove(i);
        self.reindex();
        Some(entry)
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [TagEntry] {
        &mut self.entries
    }

    /// Bytes taken by the count and the entries
    pub fn serialized_len(&self) -> usize {
        4 + self.entries.len() * TAG_ENTRY_SIZE
    }

    pub fn write_to(&self, w: &mut IccWriter) {
        w.write_u32(self.entries.len() as u32);
        for e in &self.entries {
            w.write_signature(e.signature);
            w.write_u32(e.offset);
            w.write_u32(e.size);
        }
    }
}
