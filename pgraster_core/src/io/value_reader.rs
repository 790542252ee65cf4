//! The `ValueReader` trait reads the scalar fields of a tile payload with a fixed byte order.
//!
//! A WKB raster declares its byte order in its first byte, so the decoder picks the
//! implementation at runtime and then reads every header field, nodata value and pixel
//! word through the same reader.
//!
//! ```rust
//! use pgraster_core::io::{ValueReader, ValueReaderSlice};
//!
//! let data = &[0x01, 0x02, 0x03, 0x04];
//! let mut reader = ValueReaderSlice::new_le(data);
//! assert_eq!(reader.read_u16().unwrap(), 0x0201);
//!
//! let mut reader = ValueReaderSlice::new_be(data);
//! assert_eq!(reader.read_u16().unwrap(), 0x0102);
//! ```

use crate::types::PixelType;
use anyhow::{Result, bail, ensure};
use byteorder::{ByteOrder, NativeEndian, ReadBytesExt};
use std::io::{Read, Seek};

/// A simple alias for types implementing both `Seek` and `Read`.
pub trait SeekRead: Seek + Read {}

/// Reads values with the byte order `E`.
pub trait ValueReader<'a, E: ByteOrder + 'a> {
	/// Returns the underlying reader.
	fn get_reader(&mut self) -> &mut dyn SeekRead;

	/// Total length of the readable data in bytes.
	fn len(&self) -> u64;

	/// Current read position in bytes.
	fn position(&mut self) -> u64;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of bytes left to read.
	fn remaining(&mut self) -> u64 {
		self.len().saturating_sub(self.position())
	}

	fn read_u8(&mut self) -> Result<u8> {
		Ok(self.get_reader().read_u8()?)
	}

	fn read_i8(&mut self) -> Result<i8> {
		Ok(self.get_reader().read_i8()?)
	}

	fn read_u16(&mut self) -> Result<u16> {
		Ok(self.get_reader().read_u16::<E>()?)
	}

	fn read_i16(&mut self) -> Result<i16> {
		Ok(self.get_reader().read_i16::<E>()?)
	}

	fn read_u32(&mut self) -> Result<u32> {
		Ok(self.get_reader().read_u32::<E>()?)
	}

	fn read_i32(&mut self) -> Result<i32> {
		Ok(self.get_reader().read_i32::<E>()?)
	}

	fn read_f32(&mut self) -> Result<f32> {
		Ok(self.get_reader().read_f32::<E>()?)
	}

	fn read_f64(&mut self) -> Result<f64> {
		Ok(self.get_reader().read_f64::<E>()?)
	}

	/// Reads one value stored with the width and signedness of `pixel_type`.
	fn read_pixel_value(&mut self, pixel_type: PixelType) -> Result<f64> {
		use PixelType::*;
		Ok(match pixel_type {
			Bool1 | UInt2 | UInt4 | UInt8 => f64::from(self.read_u8()?),
			Int8 => f64::from(self.read_i8()?),
			Int16 => f64::from(self.read_i16()?),
			UInt16 => f64::from(self.read_u16()?),
			Int32 => f64::from(self.read_i32()?),
			UInt32 => f64::from(self.read_u32()?),
			Float32 => f64::from(self.read_f32()?),
			Float64 => self.read_f64()?,
		})
	}

	/// Reads `count` words of `word_size` bytes and returns them in native byte order.
	fn read_words_native(&mut self, word_size: usize, count: usize) -> Result<Vec<u8>> {
		let length = word_size * count;
		ensure!(
			self.remaining() >= length as u64,
			"expected {length} bytes of pixel data, but only {} are left",
			self.remaining()
		);

		let mut data = vec![0u8; length];
		match word_size {
			1 => self.get_reader().read_exact(&mut data)?,
			2 => {
				for chunk in data.chunks_exact_mut(2) {
					NativeEndian::write_u16(chunk, self.read_u16()?);
				}
			}
			4 => {
				for chunk in data.chunks_exact_mut(4) {
					NativeEndian::write_u32(chunk, self.read_u32()?);
				}
			}
			8 => {
				for chunk in data.chunks_exact_mut(8) {
					NativeEndian::write_u64(chunk, self.get_reader().read_u64::<E>()?);
				}
			}
			_ => bail!("unsupported word size {word_size}"),
		}
		Ok(data)
	}
}
