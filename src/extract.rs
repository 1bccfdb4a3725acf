//! The batch: one decode task per descriptor on a bounded worker pool.

use {
	crate::{
		descriptor::Descriptor,
		image::{self, DecodeOptions, DecodedImage},
		palette::MasterPalette,
		Archive, Error, ItemError,
	},
	png::{BitDepth, ColorType},
	rayon::prelude::*,
	std::{
		fs::{self, File},
		io::BufWriter,
		num::NonZeroUsize,
		path::{Path, PathBuf},
		sync::{
			atomic::{AtomicUsize, Ordering},
			Mutex,
		},
		thread,
	},
	tracing::{debug, info, warn},
};

const PROGRESS_EVERY: usize = 500;

/// Receives finished images. Called from worker threads, in no particular order.
pub trait ImageSink: Sync {
	fn accept(&self, descriptor: &Descriptor, name: Option<&str>, image: &DecodedImage) -> Result<(), ItemError>;
}

/// Writes one RGBA PNG per image into a directory.
pub struct PngDirectory {
	dir: PathBuf,
}

impl PngDirectory {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}
}

impl ImageSink for PngDirectory {
	fn accept(&self, descriptor: &Descriptor, name: Option<&str>, image: &DecodedImage) -> Result<(), ItemError> {
		let path = self.dir.join(outputFileName(descriptor.id, name));
		let output = |err: &dyn std::fmt::Display| ItemError::Output(format!("{}: {err}", path.display()));
		let mut file = BufWriter::new(File::create(&path).map_err(|err| output(&err))?);
		let mut png = png::Encoder::new(&mut file, image.width.into(), image.height.into());
		png.set_color(ColorType::Rgba);
		png.set_depth(BitDepth::Eight);
		let written = png
			.write_header()
			.and_then(|mut writer| writer.write_image_data(&image.rgba).and_then(|()| writer.finish()))
			.map_err(|err| output(&err))
			.and_then(|()| file.into_inner().map(drop).map_err(|err| output(err.error())));
		if written.is_err() {
			// a partial file must not pass for a finished image
			let _ = fs::remove_file(&path);
		}
		written
	}
}

/// `0042.png`, or `0042 Healer Robe.png` when the descriptor has a name.
pub fn outputFileName(id: u32, name: Option<&str>) -> String {
	let name = name.map(|name| {
		name.chars()
			.map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
			.collect::<String>()
	});
	match name.as_deref().map(str::trim) {
		Some(name) if !name.is_empty() && !name.chars().all(|c| c == '.') => format!("{id:04} {name}.png"),
		_ => format!("{id:04}.png"),
	}
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
	pub decoded: usize,
	/// Sorted by descriptor id.
	pub skipped: Vec<(u32, ItemError)>,
}

pub struct Extractor<'a> {
	pub master: &'a MasterPalette,
	pub options: DecodeOptions,
	/// Worker count; `None` means one per available CPU.
	pub jobs: Option<NonZeroUsize>,
}

impl Extractor<'_> {
	pub fn workerCount(&self) -> usize {
		self.jobs.or_else(|| thread::available_parallelism().ok()).map_or(1, NonZeroUsize::get)
	}

	/// Decodes every descriptor. Per-item failures are logged and collected;
	/// only a pool that cannot start fails the batch.
	pub fn run(&self, archive: &Archive<'_>, sink: &dyn ImageSink) -> Result<Summary, Error> {
		let workList: Vec<&Descriptor> = archive.descriptors.values().collect();
		let (total, workers) = (workList.len(), self.workerCount());
		info!("decoding {total} images on {workers} workers");
		let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
		let (done, decoded, skipped) = (AtomicUsize::new(0), AtomicUsize::new(0), Mutex::new(Vec::new()));
		pool.install(|| {
			workList.par_iter().for_each(|&descriptor| {
				match self.extractOne(archive, descriptor, sink) {
					Ok(()) => {
						decoded.fetch_add(1, Ordering::Relaxed);
					}
					Err(err) => {
						warn!("skipping {:04}: {err}", descriptor.id);
						if let Ok(mut skipped) = skipped.lock() {
							skipped.push((descriptor.id, err));
						}
					}
				}
				let done = done.fetch_add(1, Ordering::Relaxed) + 1;
				if done % PROGRESS_EVERY == 0 || done == total {
					info!("{done}/{total} images processed");
				}
			});
		});
		let mut skipped = skipped.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
		skipped.sort_by_key(|&(id, _)| id);
		let summary = Summary { decoded: decoded.into_inner(), skipped };
		info!("complete: {} decoded, {} skipped", summary.decoded, summary.skipped.len());
		Ok(summary)
	}

	fn extractOne(&self, archive: &Archive<'_>, descriptor: &Descriptor, sink: &dyn ImageSink) -> Result<(), ItemError> {
		let image = image::decode(archive, descriptor, self.master, self.options)?;
		let name = archive.names.textFor(descriptor.id);
		sink.accept(descriptor, name, &image)?;
		debug!("{:04} {}x{} {}", descriptor.id, image.width, image.height, name.unwrap_or_default());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fileNamesArePaddedAndSanitized() {
		assert_eq!(outputFileName(7, None), "0007.png");
		assert_eq!(outputFileName(123_456, None), "123456.png");
		assert_eq!(outputFileName(42, Some("Healer Robe")), "0042 Healer Robe.png");
		assert_eq!(outputFileName(42, Some("a/b: c?")), "0042 a_b_ c_.png");
		assert_eq!(outputFileName(42, Some("  ")), "0042.png");
		assert_eq!(outputFileName(42, Some("..")), "0042.png");
	}

	#[test]
	fn failedWriteLeavesNoFile() {
		let dir = std::env::temp_dir().join(format!("cl_images_extract-sink-{}", std::process::id()));
		fs::create_dir_all(&dir).unwrap();
		let sink = PngDirectory::new(&dir);
		let descriptor =
			|id| Descriptor { id, version: 1, imageRef: 1, colorRef: 1, checksum: None, flags: None };
		let image = |rgba: Vec<u8>| DecodedImage { width: 2, height: 2, indexedPixels: vec![0; 4], rgba };

		let err = sink.accept(&descriptor(1), None, &image(vec![0; 3])).unwrap_err();
		assert!(matches!(err, ItemError::Output(message) if message.contains("0001.png")));
		assert!(!dir.join("0001.png").exists());

		sink.accept(&descriptor(2), None, &image(vec![0xFF; 16])).unwrap();
		let png = fs::read(dir.join("0002.png")).unwrap();
		fs::remove_dir_all(&dir).unwrap();
		assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
	}

	#[test]
	fn explicitJobCountWins() {
		let master = MasterPalette::default();
		let extractor = Extractor { master: &master, options: DecodeOptions::default(), jobs: NonZeroUsize::new(3) };
		assert_eq!(extractor.workerCount(), 3);
		let extractor = Extractor { jobs: None, ..extractor };
		assert!(extractor.workerCount() >= 1);
	}
}
