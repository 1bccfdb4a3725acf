//! Optional TOML settings file. Every key may be overridden on the command line.

use {
	crate::image::TransparencyRule,
	serde::Deserialize,
	std::{fs, io, path::PathBuf},
	thiserror::Error,
};

#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub archive: Option<PathBuf>,
	pub outputDir: Option<PathBuf>,
	pub jobs: Option<usize>,
	pub transparency: Option<TransparencyRule>,
	pub keepCustomColorRow: Option<bool>,
	pub namesCsv: Option<bool>,
	/// Raw 768-byte RGB file replacing the built-in master table.
	pub masterPalette: Option<PathBuf>,
	/// Same scale as `-v`/`-q`: 0 is info, negative is quieter.
	pub verbosity: Option<i32>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{path:?}: {source}")]
	Read { path: PathBuf, source: io::Error },
	#[error("{path:?}: {source}")]
	Parse { path: PathBuf, source: toml::de::Error },
}

impl Config {
	pub fn fromToml(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}

	pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
		let path = path.into();
		match fs::read_to_string(&path) {
			Err(source) => Err(ConfigError::Read { path, source }),
			Ok(text) => Self::fromToml(&text).map_err(|source| ConfigError::Parse { path, source }),
		}
	}
}
