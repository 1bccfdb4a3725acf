#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::{Context, Result},
	cl_images_extract::{
		descriptor::Descriptor, initTracing, names::NameRecord, toml_toStringPretty, Archive,
	},
	clap::Parser,
	serde::Serialize,
	std::{
		fs,
		io::{self, Read, Write},
		path::PathBuf,
	},
	tracing::Level,
};

fn main() -> Result<()> {
	/// Prints a CL_Images archive's catalogue as TOML, without decoding any pixels.
	#[derive(Parser)]
	struct Args {
		/// archive to read; stdin when absent
		archive: Option<PathBuf>,

		/// leave out the name records
		#[clap(long)]
		skipNames: bool,
	}
	let Args { archive: archivePath, skipNames } = Args::parse();
	initTracing(Level::WARN);

	let bytes = match &archivePath {
		Some(path) => fs::read(path).with_context(|| format!("{path:?}"))?,
		None => readToVec(io::stdin())?,
	};
	let archive = Archive::load(&bytes)?;

	#[derive(Serialize)]
	struct IndexTOML<'a> {
		header: Header,
		#[serde(rename = "descriptor", skip_serializing_if = "Vec::is_empty")]
		descriptors: Vec<&'a Descriptor>,
		#[serde(rename = "palette", skip_serializing_if = "Vec::is_empty")]
		palettes: Vec<PaletteSummary>,
		#[serde(rename = "name", skip_serializing_if = "Vec::is_empty")]
		names: Vec<&'a NameRecord>,
	}
	#[derive(Serialize)]
	struct Header {
		entryCount: u32,
		descriptors: usize,
		images: usize,
		palettes: usize,
		names: usize,
		unknown: usize,
	}
	#[derive(Serialize)]
	struct PaletteSummary {
		id: u32,
		slots: usize,
	}

	let index = &archive.index;
	let mut palettes: Vec<_> =
		archive.palettes.values().map(|palette| PaletteSummary { id: palette.id, slots: palette.slots.len() }).collect();
	palettes.sort_by_key(|palette| palette.id);
	let toml = toml_toStringPretty(&IndexTOML {
		header: Header {
			entryCount: index.entryCount,
			descriptors: index.descriptors.len(),
			images: index.images.len(),
			palettes: index.colors.len(),
			names: index.names.len(),
			unknown: index.unknownCount,
		},
		descriptors: archive.descriptors.values().collect(),
		palettes,
		names: if skipNames { Vec::new() } else { archive.names.records().iter().collect() },
	})?;
	io::stdout().lock().write_all(toml.as_bytes())?;

	fn readToVec(mut reader: impl Read) -> io::Result<Vec<u8>> {
		let mut vec = Vec::new();
		reader.read_to_end(&mut vec)?;
		Ok(vec)
	}

	Ok(())
}
