//! The flat catalogue at the start of the archive.

use {
	crate::{Error, ReadExt},
	byteorder::{ReadBytesExt, BE},
	serde::Serialize,
	std::{collections::HashMap, io},
	tracing::{debug, trace},
};

pub const MAGIC: u16 = 0xFFFF;
/// magic, entry count, two reserved fields
pub const HEADER_LEN: usize = 2 + 4 + 4 + 2;
/// offset, size, kind tag, id
pub const ROW_LEN: usize = 4 * 4;

pub const TAG_DESCRIPTOR: u32 = u32::from_be_bytes(*b"PDf5");
pub const TAG_IMAGE: u32 = u32::from_be_bytes(*b"Bit2");
pub const TAG_COLOR: u32 = u32::from_be_bytes(*b"Clrs");
pub const TAG_NAME: u32 = u32::from_be_bytes(*b"CIm4");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
	Descriptor,
	Image,
	Color,
	Name,
	Unknown(u32),
}

impl EntryKind {
	pub fn fromTag(tag: u32) -> Self {
		match tag {
			TAG_DESCRIPTOR => Self::Descriptor,
			TAG_IMAGE => Self::Image,
			TAG_COLOR => Self::Color,
			TAG_NAME => Self::Name,
			other => Self::Unknown(other),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
	pub offset: u32,
	pub size: u32,
	pub kind: EntryKind,
	pub id: u32,
}

impl IndexEntry {
	/// The `size` bytes at `offset`.
	pub fn body<'a>(&self, archive: &'a [u8]) -> Option<&'a [u8]> {
		crate::sliceAt(archive, self.offset, self.size as _)
	}

	pub(crate) fn outOfBounds(&self) -> crate::ItemError {
		crate::ItemError::EntryOutOfBounds { kind: self.kind, id: self.id, offset: self.offset, size: self.size }
	}
}

/// Index rows bucketed by kind, each bucket keyed by entry id.
#[derive(Debug, Default)]
pub struct ArchiveIndex {
	pub entryCount: u32,
	pub descriptors: HashMap<u32, IndexEntry>,
	pub images: HashMap<u32, IndexEntry>,
	pub colors: HashMap<u32, IndexEntry>,
	pub names: HashMap<u32, IndexEntry>,
	pub unknownCount: usize,
}

impl ArchiveIndex {
	pub fn parse(archive: &[u8]) -> Result<Self, Error> {
		if archive.len() < HEADER_LEN {
			return Err(Error::TruncatedHeader { len: archive.len(), needed: HEADER_LEN });
		}
		let cursor = &mut io::Cursor::new(archive);
		let truncated = |_: io::Error| Error::TruncatedHeader { len: archive.len(), needed: HEADER_LEN };
		let magic = cursor.read_u16::<BE>().map_err(truncated)?;
		if magic != MAGIC {
			return Err(Error::BadMagic { found: magic });
		}
		let entryCount = cursor.read_u32::<BE>().map_err(truncated)?;
		// two reserved fields of unknown purpose
		cursor.skip(4 + 2).map_err(truncated)?;

		let available = cursor.remaining() / ROW_LEN;
		if entryCount as usize > available {
			return Err(Error::TruncatedIndex { declared: entryCount, available });
		}
		debug!("index declares {entryCount} entries");

		let mut index = Self { entryCount, ..Self::default() };
		for _ in 0..entryCount {
			let mut field =
				|| cursor.read_u32::<BE>().map_err(|_| Error::TruncatedIndex { declared: entryCount, available });
			let (offset, size, tag, id) = (field()?, field()?, field()?, field()?);
			index.insert(IndexEntry { offset, size, kind: EntryKind::fromTag(tag), id });
		}
		Ok(index)
	}

	/// Later rows replace earlier ones with the same kind and id.
	fn insert(&mut self, entry: IndexEntry) {
		let bucket = match entry.kind {
			EntryKind::Descriptor => &mut self.descriptors,
			EntryKind::Image => &mut self.images,
			EntryKind::Color => &mut self.colors,
			EntryKind::Name => &mut self.names,
			EntryKind::Unknown(tag) => {
				trace!("ignoring entry {} with tag {tag:#010X}", entry.id);
				self.unknownCount += 1;
				return;
			}
		};
		if let Some(previous) = bucket.insert(entry.id, entry) {
			debug!("{:?} entry {} at {} replaces the one at {}", entry.kind, entry.id, entry.offset, previous.offset);
		}
	}
}

#[cfg(test)]
pub(crate) mod testing {
	/// Serializes an archive header plus index rows, followed by `payload`.
	pub(crate) fn archiveBytes(rows: &[(u32, u32, u32, u32)], payload: &[u8]) -> Vec<u8> {
		let mut bytes = Vec::new();
		bytes.extend_from_slice(&super::MAGIC.to_be_bytes());
		bytes.extend_from_slice(&(rows.len() as u32).to_be_bytes());
		bytes.extend_from_slice(&[0xAB; 6]);
		for &(offset, size, tag, id) in rows {
			for field in [offset, size, tag, id] {
				bytes.extend_from_slice(&field.to_be_bytes());
			}
		}
		bytes.extend_from_slice(payload);
		bytes
	}

	/// Where the payload starts for an archive with `rowCount` rows.
	pub(crate) fn payloadOffset(rowCount: usize) -> u32 {
		(super::HEADER_LEN + rowCount * super::ROW_LEN) as _
	}
}
