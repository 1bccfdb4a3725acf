use {crate::index::EntryKind, thiserror::Error};

/// Failures that make the whole archive unusable.
#[derive(Debug, Error)]
pub enum Error {
	#[error("archive header magic is {found:#06X}, expected 0xFFFF")]
	BadMagic { found: u16 },

	#[error("archive is {len} bytes, too short for its {needed}-byte header")]
	TruncatedHeader { len: usize, needed: usize },

	#[error("index declares {declared} entries but only {available} fit in the archive")]
	TruncatedIndex { declared: u32, available: usize },

	#[error("cannot start the worker pool: {0}")]
	WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failures local to one catalogue item; the batch carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
	#[error("image {imageRef} not found")]
	MissingImage { imageRef: u32 },

	#[error("palette {colorRef} not found")]
	MissingPalette { colorRef: u32 },

	#[error("invalid dimensions {width}x{height}")]
	InvalidDimensions { width: u32, height: u32 },

	#[error("pixel stream ended after {decoded} of {expected} pixels")]
	TruncatedStream { decoded: usize, expected: usize },

	#[error("{kind:?} entry {id} ({size} bytes at {offset}) lies outside the archive")]
	EntryOutOfBounds { kind: EntryKind, id: u32, offset: u32, size: u32 },

	#[error("unsupported bit widths: {valueWidth} per value, {blockLenWidth} per block length")]
	UnsupportedBitWidth { valueWidth: u8, blockLenWidth: u8 },

	#[error("pixel value {value} is past the end of a {len}-slot palette")]
	PaletteIndexOutOfRange { value: u8, len: usize },

	#[error("cannot write output: {0}")]
	Output(String),
}
