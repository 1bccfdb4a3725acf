//! Bitmap entries: header, run-length/literal pixel stream, and RGBA compositing.
//!
//! The pixel stream is a sequence of blocks. Each block starts with one bit
//! (set for a literal block) and a `blockLenWidth`-bit length biased by one.
//! A literal block then holds that many `valueWidth`-bit pixel values; a repeat
//! block holds a single value that fills the whole block.

use {
	crate::{
		bits::{BitReader, BitReaderError},
		descriptor::Descriptor,
		index::IndexEntry,
		palette::{MasterPalette, Palette},
		Archive, ItemError, RGBA_SIZE, RGB_SIZE,
	},
	byteorder::{ReadBytesExt, BE},
	core::cmp::min,
	serde::Deserialize,
	std::io,
	tracing::trace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
	pub height: u16,
	pub width: u16,
	pub valueWidth: u8,
	pub blockLenWidth: u8,
}

impl ImageHeader {
	/// height, width, reserved, value width, block length width
	pub const LEN: usize = 2 + 2 + 4 + 1 + 1;

	pub fn read(cursor: &mut io::Cursor<&[u8]>) -> io::Result<Self> {
		let height = cursor.read_u16::<BE>()?;
		let width = cursor.read_u16::<BE>()?;
		let _reserved = cursor.read_u32::<BE>()?;
		Ok(Self { height, width, valueWidth: cursor.read_u8()?, blockLenWidth: cursor.read_u8()? })
	}
}

pub fn validateDimensions(width: u32, height: u32) -> Result<(), ItemError> {
	const LIMIT: u32 = 1 << 16;
	if width == 0 || height == 0 || width >= LIMIT || height >= LIMIT {
		return Err(ItemError::InvalidDimensions { width, height });
	}
	Ok(())
}

/// Decodes exactly `pixelCount` indexed pixels from `stream`.
pub fn decodeIndexed(
	stream: &[u8],
	pixelCount: usize,
	valueWidth: u8,
	blockLenWidth: u8,
) -> Result<Vec<u8>, ItemError> {
	const INITIAL_CAPACITY: usize = 1 << 20;
	if u32::from(valueWidth) > u8::BITS || u32::from(blockLenWidth) > u32::BITS {
		return Err(ItemError::UnsupportedBitWidth { valueWidth, blockLenWidth });
	}
	let (bits, mut pixels) = (&mut BitReader::new(stream), Vec::with_capacity(min(pixelCount, INITIAL_CAPACITY)));
	if let Err(err) = decodeBlocks(bits, &mut pixels, pixelCount, valueWidth.into(), blockLenWidth.into()) {
		trace!("{err}");
	}
	if pixels.len() < pixelCount {
		return Err(ItemError::TruncatedStream { decoded: pixels.len(), expected: pixelCount });
	}
	Ok(pixels)
}

fn decodeBlocks(
	bits: &mut BitReader<'_>,
	pixels: &mut Vec<u8>,
	pixelCount: usize,
	valueWidth: u32,
	blockLenWidth: u32,
) -> Result<(), BitReaderError> {
	while pixels.len() < pixelCount {
		let isLiteralBlock = bits.readBit()?;
		let blockSize = bits.readInt(blockLenWidth)? as usize + 1;
		let blockEnd = min(pixels.len().saturating_add(blockSize), pixelCount);
		if isLiteralBlock {
			while pixels.len() < blockEnd {
				pixels.push(bits.readBits(valueWidth)?);
			}
		} else {
			let value = bits.readBits(valueWidth)?;
			pixels.resize(blockEnd, value);
		}
	}
	Ok(())
}

/// Which master slots come out transparent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TransparencyRule {
	/// palette entries pointing at master slot 0
	#[default]
	SlotZero,
	/// pixels whose final color is pure white
	PureWhite,
}

impl TransparencyRule {
	#[inline(always)]
	pub fn alpha(self, slot: u8, rgb: [u8; RGB_SIZE]) -> u8 {
		let isTransparent = match self {
			Self::SlotZero => slot == 0,
			Self::PureWhite => rgb == [0xFF; RGB_SIZE],
		};
		if isTransparent {
			0x00
		} else {
			0xFF
		}
	}
}

/// Row-major RGBA, one pixel per indexed value.
pub fn composite(
	indexed: &[u8],
	palette: &Palette,
	master: &MasterPalette,
	rule: TransparencyRule,
) -> Result<Vec<u8>, ItemError> {
	let mut rgba = Vec::with_capacity(indexed.len() * RGBA_SIZE);
	for &value in indexed {
		let slot = palette
			.slot(value)
			.ok_or(ItemError::PaletteIndexOutOfRange { value, len: palette.slots.len() })?;
		let rgb @ [red, green, blue] = master.rgb(slot);
		rgba.extend_from_slice(&[red, green, blue, rule.alpha(slot, rgb)]);
	}
	Ok(rgba)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
	pub transparency: TransparencyRule,
	/// Drop the leading color row of bitmaps whose descriptor has the custom-colors flag.
	pub dropCustomColorRow: bool,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self { transparency: TransparencyRule::default(), dropCustomColorRow: true }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
	pub width: u16,
	pub height: u16,
	pub indexedPixels: Vec<u8>,
	pub rgba: Vec<u8>,
}

/// Reads the bitmap entry's header and pixel stream. The stream is confined to
/// the entry's declared extent.
pub fn decodeBitmap(archive: &[u8], entry: &IndexEntry) -> Result<(ImageHeader, Vec<u8>), ItemError> {
	let start = entry.offset as usize;
	let headerBytes = crate::sliceAt(archive, entry.offset, ImageHeader::LEN).ok_or_else(|| entry.outOfBounds())?;
	let header = ImageHeader::read(&mut io::Cursor::new(headerBytes)).map_err(|_| entry.outOfBounds())?;
	let (width, height) = (u32::from(header.width), u32::from(header.height));
	validateDimensions(width, height)?;
	let end = min(start.saturating_add(entry.size as _), archive.len());
	let stream = archive.get(start + ImageHeader::LEN..end).unwrap_or_default();
	let pixels =
		decodeIndexed(stream, width as usize * height as usize, header.valueWidth, header.blockLenWidth)?;
	Ok((header, pixels))
}

/// Joins `descriptor` to its bitmap and palette and produces the final image.
pub fn decode(
	archive: &Archive<'_>,
	descriptor: &Descriptor,
	master: &MasterPalette,
	options: DecodeOptions,
) -> Result<DecodedImage, ItemError> {
	let entry = archive
		.index
		.images
		.get(&descriptor.imageRef)
		.ok_or(ItemError::MissingImage { imageRef: descriptor.imageRef })?;
	let (ImageHeader { width, mut height, .. }, mut indexedPixels) = decodeBitmap(archive.bytes, entry)?;

	if options.dropCustomColorRow && descriptor.hasCustomColors() {
		indexedPixels.drain(..width as usize);
		height -= 1;
		validateDimensions(width.into(), height.into())?;
	}

	let palette = archive
		.palettes
		.get(&descriptor.colorRef)
		.ok_or(ItemError::MissingPalette { colorRef: descriptor.colorRef })?;
	let rgba = composite(&indexedPixels, palette, master, options.transparency)?;
	Ok(DecodedImage { width, height, indexedPixels, rgba })
}
