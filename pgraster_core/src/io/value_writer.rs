use crate::types::PixelType;
use anyhow::Result;
use byteorder::{ByteOrder, WriteBytesExt};
use std::io::Write;

/// Writes values with the byte order `E`. Counterpart of [`ValueReader`](super::ValueReader).
pub trait ValueWriter<E: ByteOrder> {
	fn get_writer(&mut self) -> &mut dyn Write;

	fn write_u8(&mut self, value: u8) -> Result<()> {
		Ok(self.get_writer().write_u8(value)?)
	}

	fn write_u16(&mut self, value: u16) -> Result<()> {
		Ok(self.get_writer().write_u16::<E>(value)?)
	}

	fn write_i32(&mut self, value: i32) -> Result<()> {
		Ok(self.get_writer().write_i32::<E>(value)?)
	}

	fn write_f64(&mut self, value: f64) -> Result<()> {
		Ok(self.get_writer().write_f64::<E>(value)?)
	}

	/// Writes `value` with the width of `pixel_type`, truncating it the way a cast does.
	fn write_pixel_value(&mut self, pixel_type: PixelType, value: f64) -> Result<()> {
		use PixelType::*;
		let writer = self.get_writer();
		match pixel_type {
			Bool1 | UInt2 | UInt4 | UInt8 => writer.write_u8(value as u8)?,
			Int8 => writer.write_i8(value as i8)?,
			Int16 => writer.write_i16::<E>(value as i16)?,
			UInt16 => writer.write_u16::<E>(value as u16)?,
			Int32 => writer.write_i32::<E>(value as i32)?,
			UInt32 => writer.write_u32::<E>(value as u32)?,
			Float32 => writer.write_f32::<E>(value as f32)?,
			Float64 => writer.write_f64::<E>(value)?,
		}
		Ok(())
	}
}
