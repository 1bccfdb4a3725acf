//! Name entries: display text for sprites, used only to label output files.

use {
	crate::{
		index::{ArchiveIndex, IndexEntry},
		ItemError,
	},
	byteorder::{ReadBytesExt, BE},
	serde::Serialize,
	std::{
		collections::HashMap,
		io::{self, Write},
	},
	tracing::warn,
};

/// reserved i64, then three candidate ids
pub const FIXED_LEN: usize = 8 + 3 * 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
	pub imageId: u32,
	pub textId: u32,
	pub candidateIds: (u32, u32, u32),
	pub text: String,
}

impl NameRecord {
	pub fn read(archive: &[u8], entry: &IndexEntry) -> Result<Self, ItemError> {
		let textLen = (entry.size as usize).saturating_sub(FIXED_LEN);
		let body = crate::sliceAt(archive, entry.offset, FIXED_LEN + textLen).ok_or_else(|| entry.outOfBounds())?;
		let cursor = &mut io::Cursor::new(body);
		let mut read = || -> io::Result<(u32, u32, u32)> {
			let _reserved = cursor.read_i64::<BE>()?;
			Ok((cursor.read_u32::<BE>()?, cursor.read_u32::<BE>()?, cursor.read_u32::<BE>()?))
		};
		let candidateIds @ (one, two, three) = read().map_err(|_| entry.outOfBounds())?;
		let imageId = [one, two, three].into_iter().find(|&id| id != 0).unwrap_or(0);
		Ok(Self { imageId, textId: entry.id, candidateIds, text: printableAscii(&body[FIXED_LEN..]) })
	}
}

/// Keeps only bytes in `' '..='~'`.
pub fn printableAscii(bytes: &[u8]) -> String {
	bytes.iter().filter(|byte| (b' '..=b'~').contains(*byte)).map(|&byte| char::from(byte)).collect()
}

#[derive(Debug, Default)]
pub struct NameTable {
	records: Vec<NameRecord>,
	byImageId: HashMap<u32, usize>,
}

impl NameTable {
	pub fn build(archive: &[u8], index: &ArchiveIndex) -> Self {
		let mut records = Vec::with_capacity(index.names.len());
		for entry in index.names.values() {
			match NameRecord::read(archive, entry) {
				Ok(record) => records.push(record),
				Err(err) => warn!("skipping name {}: {err}", entry.id),
			}
		}
		Self::fromRecords(records)
	}

	/// When several records name the same image, the lowest text id wins.
	pub fn fromRecords(mut records: Vec<NameRecord>) -> Self {
		records.sort_by_key(|record| record.textId);
		let mut byImageId = HashMap::with_capacity(records.len());
		for (i, record) in records.iter().enumerate() {
			if record.imageId != 0 && !record.text.is_empty() {
				byImageId.entry(record.imageId).or_insert(i);
			}
		}
		Self { records, byImageId }
	}

	pub fn records(&self) -> &[NameRecord] {
		&self.records
	}

	pub fn textFor(&self, imageId: u32) -> Option<&str> {
		self.byImageId.get(&imageId).map(|&i| self.records[i].text.as_str())
	}

	pub fn writeCsv(&self, writer: &mut impl Write) -> io::Result<()> {
		writeln!(writer, "image_id,name_id,id_one,id_two,id_three,name")?;
		for NameRecord { imageId, textId, candidateIds: (one, two, three), text } in &self.records {
			writeln!(writer, "{imageId},{textId},{one},{two},{three},{}", csvField(text))?;
		}
		Ok(())
	}
}

fn csvField(text: &str) -> String {
	if text.contains([',', '"']) || text.starts_with(' ') || text.ends_with(' ') {
		format!("\"{}\"", text.replace('"', "\"\""))
	} else {
		text.to_owned()
	}
}
