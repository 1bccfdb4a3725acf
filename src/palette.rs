//! Per-image palettes and the fixed master color table they index into.

use {
	crate::{
		index::{ArchiveIndex, IndexEntry},
		ItemError, PAL_LEN, RGB_SIZE,
	},
	std::collections::HashMap,
	tracing::warn,
};

pub const MASTER_SLOTS: usize = 256;

/// Maps a decoded pixel value to a master table slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
	pub id: u32,
	pub slots: Box<[u8]>,
}

impl Palette {
	pub fn read(archive: &[u8], entry: &IndexEntry) -> Result<Self, ItemError> {
		let body = entry.body(archive).ok_or_else(|| entry.outOfBounds())?;
		Ok(Self { id: entry.id, slots: body.into() })
	}

	#[inline]
	pub fn slot(&self, value: u8) -> Option<u8> {
		self.slots.get(value as usize).copied()
	}
}

pub fn loadAll(archive: &[u8], index: &ArchiveIndex) -> HashMap<u32, Palette> {
	let mut palettes = HashMap::with_capacity(index.colors.len());
	for entry in index.colors.values() {
		match Palette::read(archive, entry) {
			Ok(palette) => {
				palettes.insert(entry.id, palette);
			}
			Err(err) => warn!("skipping palette {}: {err}", entry.id),
		}
	}
	palettes
}

/// 256 RGB triples, independent of any archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPalette(pub [[u8; RGB_SIZE]; MASTER_SLOTS]);

impl MasterPalette {
	/// The classic 8-bit Macintosh system palette: a 6x6x6 cube from white down,
	/// then red, green, blue and gray ramps, then black.
	pub const MAC_SYSTEM: Self = Self(macSystem());

	/// Reads a raw `.pal` file: 256 RGB triples, nothing else.
	pub fn fromPalBytes(bytes: &[u8]) -> Option<Self> {
		if bytes.len() != PAL_LEN {
			return None;
		}
		let mut table = [[0; RGB_SIZE]; MASTER_SLOTS];
		for (rgb, chunk) in table.iter_mut().zip(bytes.chunks_exact(RGB_SIZE)) {
			rgb.copy_from_slice(chunk);
		}
		Some(Self(table))
	}

	#[inline(always)]
	pub fn rgb(&self, slot: u8) -> [u8; RGB_SIZE] {
		self.0[slot as usize]
	}
}

impl Default for MasterPalette {
	fn default() -> Self {
		Self::MAC_SYSTEM
	}
}

const fn macSystem() -> [[u8; RGB_SIZE]; MASTER_SLOTS] {
	const STEP: u8 = 0x33;
	const CUBE_LEN: usize = 6 * 6 * 6 - 1;
	const RAMP: [u8; 10] = [0xEE, 0xDD, 0xBB, 0xAA, 0x88, 0x77, 0x55, 0x44, 0x22, 0x11];
	let mut table = [[0; RGB_SIZE]; MASTER_SLOTS];
	let mut i = 0;
	while i < CUBE_LEN {
		table[i] = [
			0xFF - (i / 36) as u8 * STEP,
			0xFF - (i / 6 % 6) as u8 * STEP,
			0xFF - (i % 6) as u8 * STEP,
		];
		i += 1;
	}
	let mut j = 0;
	while j < RAMP.len() {
		let level = RAMP[j];
		table[CUBE_LEN + j] = [level, 0, 0];
		table[CUBE_LEN + RAMP.len() + j] = [0, level, 0];
		table[CUBE_LEN + 2 * RAMP.len() + j] = [0, 0, level];
		table[CUBE_LEN + 3 * RAMP.len() + j] = [level, level, level];
		j += 1;
	}
	table
}
