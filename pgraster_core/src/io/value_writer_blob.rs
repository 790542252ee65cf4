use super::ValueWriter;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::{
	io::{Cursor, Write},
	marker::PhantomData,
};

/// Collects written values in memory.
pub struct ValueWriterBlob<E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<Vec<u8>>,
}

impl<E: ByteOrder> ValueWriterBlob<E> {
	#[allow(clippy::new_without_default)]
	pub fn new() -> ValueWriterBlob<E> {
		ValueWriterBlob {
			_phantom: PhantomData,
			cursor: Cursor::new(Vec::new()),
		}
	}

	pub fn into_vec(self) -> Vec<u8> {
		self.cursor.into_inner()
	}
}

impl ValueWriterBlob<LittleEndian> {
	pub fn new_le() -> ValueWriterBlob<LittleEndian> {
		ValueWriterBlob::new()
	}
}

impl ValueWriterBlob<BigEndian> {
	pub fn new_be() -> ValueWriterBlob<BigEndian> {
		ValueWriterBlob::new()
	}
}

impl<E: ByteOrder> ValueWriter<E> for ValueWriterBlob<E> {
	fn get_writer(&mut self) -> &mut dyn Write {
		&mut self.cursor
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::PixelType;
	use anyhow::Result;

	#[test]
	fn writes_header_fields() -> Result<()> {
		let mut writer = ValueWriterBlob::new_le();
		writer.write_u8(1)?;
		writer.write_u16(0x0102)?;
		writer.write_i32(-1)?;
		assert_eq!(writer.into_vec(), vec![1, 0x02, 0x01, 0xFF, 0xFF, 0xFF, 0xFF]);

		let mut writer = ValueWriterBlob::new_be();
		writer.write_u16(0x0102)?;
		assert_eq!(writer.into_vec(), vec![0x01, 0x02]);
		Ok(())
	}

	#[test]
	fn writes_pixel_values_with_type_width() -> Result<()> {
		let mut writer = ValueWriterBlob::new_be();
		writer.write_pixel_value(PixelType::Int8, -1.0)?;
		writer.write_pixel_value(PixelType::UInt16, 258.0)?;
		writer.write_pixel_value(PixelType::Float32, 1.0)?;
		assert_eq!(
			writer.into_vec(),
			vec![0xFF, 0x01, 0x02, 0x3F, 0x80, 0x00, 0x00]
		);
		Ok(())
	}
}
