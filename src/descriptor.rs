//! Descriptor bodies: which bitmap and which palette make up one sprite.

use {
	crate::{
		index::{ArchiveIndex, IndexEntry},
		ItemError,
	},
	byteorder::{ReadBytesExt, BE},
	serde::Serialize,
	std::{collections::BTreeMap, io},
	tracing::warn,
};

/// version, image reference, color reference
pub const MANDATORY_LEN: u32 = 3 * 4;
pub const TAIL_FIELD_LEN: i64 = 4;
/// The bitmap's first row holds colors rather than pixels.
pub const CUSTOM_COLORS_FLAG: u32 = 0x2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Descriptor {
	pub id: u32,
	pub version: u32,
	pub imageRef: u32,
	pub colorRef: u32,
	pub checksum: Option<u32>,
	pub flags: Option<u32>,
}

impl Descriptor {
	/// The three mandatory fields are always read. Archive builds differ in how
	/// many optional fields follow; only those covered by `entry.size` are read.
	pub fn read(archive: &[u8], entry: &IndexEntry) -> Result<Self, ItemError> {
		let mut remaining = i64::from(entry.size) - i64::from(MANDATORY_LEN);
		let tailFields = remaining.clamp(0, 2 * TAIL_FIELD_LEN) / TAIL_FIELD_LEN;
		let body = crate::sliceAt(archive, entry.offset, (MANDATORY_LEN as i64 + tailFields * TAIL_FIELD_LEN) as _)
			.ok_or_else(|| entry.outOfBounds())?;
		let cursor = &mut io::Cursor::new(body);
		let mut field = || cursor.read_u32::<BE>().map_err(|_| entry.outOfBounds());
		let (version, imageRef, colorRef) = (field()?, field()?, field()?);
		let mut optionalField = || -> Result<Option<u32>, ItemError> {
			if remaining < TAIL_FIELD_LEN {
				return Ok(None);
			}
			remaining -= TAIL_FIELD_LEN;
			field().map(Some)
		};
		let checksum = optionalField()?;
		let flags = optionalField()?;
		Ok(Self { id: entry.id, version, imageRef, colorRef, checksum, flags })
	}

	#[inline]
	pub fn hasCustomColors(&self) -> bool {
		self.flags.map_or(false, |flags| flags & CUSTOM_COLORS_FLAG != 0)
	}
}

/// Reads every descriptor the index lists. Unreadable ones are reported and left out.
pub fn resolveAll(archive: &[u8], index: &ArchiveIndex) -> BTreeMap<u32, Descriptor> {
	let mut descriptors = BTreeMap::new();
	for entry in index.descriptors.values() {
		match Descriptor::read(archive, entry) {
			Ok(descriptor) => {
				descriptors.insert(entry.id, descriptor);
			}
			Err(err) => warn!("skipping descriptor {}: {err}", entry.id),
		}
	}
	descriptors
}
