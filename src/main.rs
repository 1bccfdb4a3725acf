#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	anyhow::{bail, Context, Result},
	cl_images_extract::{
		config::Config,
		extract::{Extractor, PngDirectory},
		image::{DecodeOptions, TransparencyRule},
		initTracing,
		palette::MasterPalette,
		verbosityLevel, Archive, PAL_LEN,
	},
	clap::{ArgAction, Parser},
	const_format::concatcp,
	std::{
		fs::{self, File},
		io::{BufWriter, Write},
		num::NonZeroUsize,
		path::PathBuf,
		process::ExitCode,
	},
	tracing::info,
};

const DEFAULT_ARCHIVE: &str = "CL_Images";
const DEFAULT_OUTPUT_DIR: &str = "out";
const NAMES_CSV: &str = "names.csv";

/// Extracts every sprite in a CL_Images archive as PNG.
#[derive(Parser)]
#[clap(version)]
struct Args {
	#[clap(help = concatcp!("archive to read [default: ", DEFAULT_ARCHIVE, "]"))]
	archive: Option<PathBuf>,

	#[clap(
		short,
		long = "out",
		help = concatcp!("directory receiving the PNGs and ", NAMES_CSV, " [default: ", DEFAULT_OUTPUT_DIR, "]")
	)]
	outputDir: Option<PathBuf>,

	/// worker threads [default: one per CPU]
	#[clap(short, long)]
	jobs: Option<NonZeroUsize>,

	#[clap(long, value_enum)]
	transparency: Option<TransparencyRule>,

	/// keep the leading color row of custom-colored sprites
	#[clap(long)]
	keepCustomColorRow: bool,

	#[clap(long, help = concatcp!("do not write ", NAMES_CSV))]
	noNamesCsv: bool,

	/// 768-byte RGB file replacing the built-in master palette
	#[clap(long)]
	masterPalette: Option<PathBuf>,

	/// TOML file with defaults for the options above
	#[clap(short, long)]
	config: Option<PathBuf>,

	#[clap(short, long, action = ArgAction::Count)]
	verbose: u8,

	#[clap(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
	quiet: u8,
}

fn main() -> Result<ExitCode> {
	let args = Args::parse();
	let config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::default(),
	};
	let count = |flags: u8| i32::try_from(flags).unwrap_or(i32::MAX);
	initTracing(verbosityLevel(
		count(args.verbose).saturating_sub(count(args.quiet)).saturating_add(config.verbosity.unwrap_or(0)),
	));

	let archivePath = args.archive.or(config.archive).unwrap_or_else(|| DEFAULT_ARCHIVE.into());
	let outputDir = args.outputDir.or(config.outputDir).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into());
	let master = match args.masterPalette.or(config.masterPalette) {
		None => MasterPalette::default(),
		Some(path) => {
			let bytes = fs::read(&path).with_context(|| format!("{path:?}"))?;
			match MasterPalette::fromPalBytes(&bytes) {
				Some(master) => master,
				None => bail!("{path:?}: expected {PAL_LEN} bytes, found {}", bytes.len()),
			}
		}
	};
	let extractor = Extractor {
		master: &master,
		options: DecodeOptions {
			transparency: args.transparency.or(config.transparency).unwrap_or_default(),
			dropCustomColorRow: !(args.keepCustomColorRow || config.keepCustomColorRow.unwrap_or(false)),
		},
		jobs: args.jobs.or(config.jobs.and_then(NonZeroUsize::new)),
	};

	info!("reading {archivePath:?}");
	let bytes = fs::read(&archivePath).with_context(|| format!("{archivePath:?}"))?;
	let archive = Archive::load(&bytes).with_context(|| format!("{archivePath:?}"))?;

	fs::create_dir_all(&outputDir).with_context(|| format!("{outputDir:?}"))?;
	if !args.noNamesCsv && config.namesCsv.unwrap_or(true) {
		let path = outputDir.join(NAMES_CSV);
		info!("writing {} names to {path:?}", archive.names.records().len());
		let writer = &mut BufWriter::new(File::create(&path).with_context(|| format!("{path:?}"))?);
		archive.names.writeCsv(writer).and_then(|()| writer.flush()).with_context(|| format!("{path:?}"))?;
	}

	let summary = extractor.run(&archive, &PngDirectory::new(outputDir))?;
	Ok(if summary.skipped.is_empty() || summary.decoded > 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
