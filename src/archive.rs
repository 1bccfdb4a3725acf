use {
	crate::{
		descriptor::{self, Descriptor},
		index::ArchiveIndex,
		names::NameTable,
		palette::{self, Palette},
		Error,
	},
	std::collections::{BTreeMap, HashMap},
	tracing::info,
};

/// Everything the setup phase learns about an archive. Read-only once loaded.
pub struct Archive<'a> {
	pub bytes: &'a [u8],
	pub index: ArchiveIndex,
	pub descriptors: BTreeMap<u32, Descriptor>,
	pub palettes: HashMap<u32, Palette>,
	pub names: NameTable,
}

impl<'a> Archive<'a> {
	pub fn load(bytes: &'a [u8]) -> Result<Self, Error> {
		info!("reading index");
		let index = ArchiveIndex::parse(bytes)?;
		info!(
			"found {} entries: {} descriptors, {} images, {} palettes, {} names, {} other",
			index.entryCount,
			index.descriptors.len(),
			index.images.len(),
			index.colors.len(),
			index.names.len(),
			index.unknownCount,
		);
		info!("reading descriptors");
		let descriptors = descriptor::resolveAll(bytes, &index);
		info!("reading names");
		let names = NameTable::build(bytes, &index);
		info!("reading palettes");
		let palettes = palette::loadAll(bytes, &index);
		Ok(Self { bytes, index, descriptors, palettes, names })
	}
}
