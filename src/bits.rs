//! MSB-first bit extraction over a borrowed byte slice.
//!
//! Bit 7 of each byte is read first. The position only moves forward.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitReaderError {
	#[error("bitstream ended: {requested} more bits wanted at bit {position} of {available}")]
	UnexpectedEnd { requested: u32, position: usize, available: usize },

	#[error("cannot read {requested} bits into a {capacity}-bit value")]
	TooWide { requested: u32, capacity: u32 },
}

pub struct BitReader<'a> {
	bytes: &'a [u8],
	position: usize,
}

impl<'a> BitReader<'a> {
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, position: 0 }
	}

	#[inline(always)]
	pub fn position(&self) -> usize {
		self.position
	}

	#[inline(always)]
	pub fn remainingBits(&self) -> usize {
		self.bytes.len() * u8::BITS as usize - self.position
	}

	#[inline]
	pub fn readBit(&mut self) -> Result<bool, BitReaderError> {
		let Some(&byte) = self.bytes.get(self.position >> 3) else {
			return Err(self.unexpectedEnd(1));
		};
		let bit = byte >> (7 - (self.position & 7)) & 1;
		self.position += 1;
		Ok(bit != 0)
	}

	/// Reads `bitCount` bits as an unsigned integer, first bit most significant.
	/// Nothing is consumed when the stream holds fewer than `bitCount` bits.
	pub fn readInt(&mut self, bitCount: u32) -> Result<u32, BitReaderError> {
		if bitCount > u32::BITS {
			return Err(BitReaderError::TooWide { requested: bitCount, capacity: u32::BITS });
		}
		if bitCount as usize > self.remainingBits() {
			return Err(self.unexpectedEnd(bitCount));
		}
		let mut value = 0_u64;
		for _ in 0..bitCount {
			value = value << 1 | u64::from(self.readBit()?);
		}
		Ok(value as u32)
	}

	/// Reads one `bitCount`-bit pixel value (at most 8 bits).
	#[inline]
	pub fn readBits(&mut self, bitCount: u32) -> Result<u8, BitReaderError> {
		if bitCount > u8::BITS {
			return Err(BitReaderError::TooWide { requested: bitCount, capacity: u8::BITS });
		}
		self.readInt(bitCount).map(|value| value as u8)
	}

	fn unexpectedEnd(&self, requested: u32) -> BitReaderError {
		BitReaderError::UnexpectedEnd {
			requested,
			position: self.position,
			available: self.bytes.len() * u8::BITS as usize,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bitsComeOutMostSignificantFirst() {
		let mut reader = BitReader::new(&[0b1010_0001]);
		let bits: Vec<bool> = (0..8).map(|_| reader.readBit().unwrap()).collect();
		assert_eq!(bits, [true, false, true, false, false, false, false, true]);
		assert_eq!(reader.position(), 8);
	}

	#[test]
	fn readIntSpansByteBoundaries() {
		let mut reader = BitReader::new(&[0b0000_0111, 0b1100_0000]);
		assert_eq!(reader.readInt(5).unwrap(), 0);
		assert_eq!(reader.readInt(5).unwrap(), 0b11111);
		assert_eq!(reader.remainingBits(), 6);
	}

	#[test]
	fn zeroWidthReadsConsumeNothing() {
		let mut reader = BitReader::new(&[0xFF]);
		assert_eq!(reader.readInt(0).unwrap(), 0);
		assert_eq!(reader.readBits(0).unwrap(), 0);
		assert_eq!(reader.position(), 0);
	}

	#[test]
	fn fullWidthRead() {
		let mut reader = BitReader::new(&[0xDE, 0xAD, 0xBE, 0xEF, 0x80]);
		assert_eq!(reader.readInt(32).unwrap(), 0xDEAD_BEEF);
		assert!(reader.readBit().unwrap());
	}

	#[test]
	fn readingPastTheEndFails() {
		let mut reader = BitReader::new(&[0xF0]);
		assert_eq!(reader.readInt(6).unwrap(), 0b111100);
		assert_eq!(
			reader.readInt(3),
			Err(BitReaderError::UnexpectedEnd { requested: 3, position: 6, available: 8 })
		);
		assert_eq!(reader.position(), 6);
		assert_eq!(reader.readInt(2).unwrap(), 0);
		assert!(matches!(reader.readBit(), Err(BitReaderError::UnexpectedEnd { .. })));
		assert!(BitReader::new(&[]).readBit().is_err());
	}

	#[test]
	fn overwideReadsAreRejected() {
		let mut reader = BitReader::new(&[0; 8]);
		assert_eq!(reader.readInt(33), Err(BitReaderError::TooWide { requested: 33, capacity: 32 }));
		assert_eq!(reader.readBits(9), Err(BitReaderError::TooWide { requested: 9, capacity: 8 }));
		assert_eq!(reader.position(), 0);
	}

	#[test]
	fn mixedWidthsReadBackInOrder() {
		// 1 10101 1111111111 11
		let mut reader = BitReader::new(&[0b1101_0111, 0b1111_1111, 0b1100_0000]);
		assert!(reader.readBit().unwrap());
		assert_eq!(reader.readInt(5).unwrap(), 0x15);
		assert_eq!(reader.readInt(10).unwrap(), 0x3FF);
		assert_eq!(reader.readBits(2).unwrap(), 3);
		assert_eq!(reader.remainingBits(), 6);
	}
}
