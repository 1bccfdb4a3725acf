#![allow(dead_code, non_snake_case)]

use {
	cl_images_extract::{
		descriptor::Descriptor,
		extract::ImageSink,
		image::DecodedImage,
		index::{HEADER_LEN, MAGIC, ROW_LEN},
		ItemError,
	},
	std::{collections::BTreeMap, sync::Mutex},
};

pub use cl_images_extract::index::{TAG_COLOR, TAG_DESCRIPTOR, TAG_IMAGE, TAG_NAME};

/// Lays out a header, the index rows, then each entry's body in row order.
#[derive(Default)]
pub struct ArchiveBuilder {
	rows: Vec<(u32, u32, Vec<u8>, Option<u32>)>,
}

impl ArchiveBuilder {
	pub fn entry(mut self, tag: u32, id: u32, body: Vec<u8>) -> Self {
		self.rows.push((tag, id, body, None));
		self
	}

	/// Declares `size` in the index regardless of how long `body` is.
	pub fn entryWithSize(mut self, tag: u32, id: u32, body: Vec<u8>, size: u32) -> Self {
		self.rows.push((tag, id, body, Some(size)));
		self
	}

	pub fn build(&self) -> Vec<u8> {
		let mut bytes = Vec::new();
		bytes.extend_from_slice(&MAGIC.to_be_bytes());
		bytes.extend_from_slice(&(self.rows.len() as u32).to_be_bytes());
		bytes.extend_from_slice(&[0; 6]);
		let mut offset = HEADER_LEN + self.rows.len() * ROW_LEN;
		for (tag, id, body, size) in &self.rows {
			let size = size.unwrap_or(body.len() as u32);
			for field in [offset as u32, size, *tag, *id] {
				bytes.extend_from_slice(&field.to_be_bytes());
			}
			offset += body.len();
		}
		for (_, _, body, _) in &self.rows {
			bytes.extend_from_slice(body);
		}
		bytes
	}
}

pub fn descriptorBody(imageRef: u32, colorRef: u32, flags: Option<u32>) -> Vec<u8> {
	let mut fields = vec![1, imageRef, colorRef];
	if let Some(flags) = flags {
		fields.extend([0x1234_5678, flags]);
	}
	fields.iter().flat_map(|field: &u32| field.to_be_bytes()).collect()
}

pub fn bitmapBody(width: u16, height: u16, valueWidth: u8, blockLenWidth: u8, stream: &[u8]) -> Vec<u8> {
	let mut body = Vec::new();
	body.extend_from_slice(&height.to_be_bytes());
	body.extend_from_slice(&width.to_be_bytes());
	body.extend_from_slice(&[0xEE; 4]);
	body.extend_from_slice(&[valueWidth, blockLenWidth]);
	body.extend_from_slice(stream);
	body
}

pub fn nameBody(ids: [u32; 3], text: &str) -> Vec<u8> {
	let mut body = 0_i64.to_be_bytes().to_vec();
	for id in ids {
		body.extend_from_slice(&id.to_be_bytes());
	}
	body.extend_from_slice(text.as_bytes());
	body
}

#[derive(Default)]
pub struct BitWriter {
	bytes: Vec<u8>,
	bitCount: usize,
}

impl BitWriter {
	pub fn bit(&mut self, bit: bool) -> &mut Self {
		if self.bitCount % 8 == 0 {
			self.bytes.push(0);
		}
		if bit {
			*self.bytes.last_mut().unwrap() |= 0x80 >> (self.bitCount % 8);
		}
		self.bitCount += 1;
		self
	}

	pub fn int(&mut self, value: u32, width: u8) -> &mut Self {
		for shift in (0..u32::from(width)).rev() {
			self.bit(value >> shift & 1 != 0);
		}
		self
	}

	pub fn finish(&mut self) -> Vec<u8> {
		std::mem::take(&mut self.bytes)
	}
}

/// Reference encoder: runs of two or more equal pixels become repeat blocks,
/// everything else goes into literal blocks. `blockLenWidth` must be below 32.
pub fn encode(pixels: &[u8], valueWidth: u8, blockLenWidth: u8) -> Vec<u8> {
	let maxBlock = 1_usize << blockLenWidth;
	let startsRun = |i: usize| i + 1 < pixels.len() && pixels[i] == pixels[i + 1];
	let (writer, mut i) = (&mut BitWriter::default(), 0);
	while i < pixels.len() {
		if startsRun(i) && maxBlock > 1 {
			let run = pixels[i..].iter().take(maxBlock).take_while(|&&pixel| pixel == pixels[i]).count();
			writer.bit(false).int((run - 1) as u32, blockLenWidth).int(pixels[i].into(), valueWidth);
			i += run;
		} else {
			let mut end = i + 1;
			while end < pixels.len() && end - i < maxBlock && !startsRun(end) {
				end += 1;
			}
			writer.bit(true).int((end - i - 1) as u32, blockLenWidth);
			for &pixel in &pixels[i..end] {
				writer.int(pixel.into(), valueWidth);
			}
			i = end;
		}
	}
	writer.finish()
}

/// Keeps every accepted image, keyed by descriptor id.
#[derive(Default)]
pub struct MemorySink {
	pub images: Mutex<BTreeMap<u32, (Option<String>, DecodedImage)>>,
}

impl ImageSink for MemorySink {
	fn accept(&self, descriptor: &Descriptor, name: Option<&str>, image: &DecodedImage) -> Result<(), ItemError> {
		let previous =
			self.images.lock().unwrap().insert(descriptor.id, (name.map(str::to_owned), image.clone()));
		assert!(previous.is_none(), "descriptor {} delivered twice", descriptor.id);
		Ok(())
	}
}

impl MemorySink {
	pub fn into_inner(self) -> BTreeMap<u32, (Option<String>, DecodedImage)> {
		self.images.into_inner().unwrap()
	}
}
