#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	serde::ser,
	std::io::{self, Seek, SeekFrom},
	tracing::Level,
};

pub mod archive;
pub mod bits;
pub mod config;
pub mod descriptor;
mod error;
pub mod extract;
pub mod image;
pub mod index;
pub mod names;
pub mod palette;

pub use {
	archive::Archive,
	error::{Error, ItemError},
};

pub const PAL_LEN: usize = 256 * 3;
pub const RGB_SIZE: usize = 3;
pub const RGBA_SIZE: usize = 4;

pub trait ReadExt {
	fn remaining(&self) -> usize;
	fn skip(&mut self, count: usize) -> io::Result<()>;
}
impl ReadExt for io::Cursor<&[u8]> {
	#[inline]
	fn remaining(&self) -> usize {
		self.get_ref().len().saturating_sub(self.position() as _)
	}
	fn skip(&mut self, count: usize) -> io::Result<()> {
		if count > self.remaining() {
			return Err(io::ErrorKind::UnexpectedEof.into());
		}
		self.seek(SeekFrom::Current(count as _)).map(drop)
	}
}

/// Returns the `len` bytes at `offset`, or `None` if any of them lie outside `bytes`.
#[inline]
pub fn sliceAt(bytes: &[u8], offset: u32, len: usize) -> Option<&[u8]> {
	let start = offset as usize;
	bytes.get(start..start.checked_add(len)?)
}

pub fn toml_toStringPretty<T: ?Sized + ser::Serialize>(value: &T) -> Result<String, toml::ser::Error> {
	let mut string = String::with_capacity(128);
	value.serialize((&mut toml::ser::Serializer::pretty(&mut string)).pretty_array(false))?;
	Ok(string)
}

/// `verbosity` counts `-v` flags minus `-q` flags; 0 means `INFO`.
pub fn verbosityLevel(verbosity: i32) -> Level {
	match verbosity {
		i32::MIN..=-2 => Level::ERROR,
		-1 => Level::WARN,
		0 => Level::INFO,
		1 => Level::DEBUG,
		_ => Level::TRACE,
	}
}

pub fn initTracing(level: Level) {
	tracing_subscriber::fmt().with_max_level(level).with_target(false).with_writer(io::stderr).init();
}
