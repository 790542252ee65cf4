use crate::{
	io::{ValueReader, ValueReaderSlice, ValueWriter},
	types::GeoTransform,
};
use anyhow::{Result, bail, ensure};
use byteorder::ByteOrder;

/// Size of the serialized header, including the endianness byte.
pub const HEADER_SIZE: usize = 61;

/// Header fields of a tile payload.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterHeader {
	pub version: u16,
	pub band_count: u16,
	pub scale_x: f64,
	pub scale_y: f64,
	pub upper_left_x: f64,
	pub upper_left_y: f64,
	pub skew_x: f64,
	pub skew_y: f64,
	pub srid: i32,
	pub width: u16,
	pub height: u16,
}

/// Byte order flag of a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadEndian {
	Big,
	Little,
}

impl PayloadEndian {
	pub fn from_flag(flag: u8) -> Result<PayloadEndian> {
		Ok(match flag {
			0 => PayloadEndian::Big,
			1 => PayloadEndian::Little,
			_ => bail!("invalid endianness flag {flag}"),
		})
	}

	pub fn flag(&self) -> u8 {
		match self {
			PayloadEndian::Big => 0,
			PayloadEndian::Little => 1,
		}
	}
}

impl RasterHeader {
	/// Reads only the header of a payload.
	pub fn decode(bytes: &[u8]) -> Result<RasterHeader> {
		ensure!(
			bytes.len() >= HEADER_SIZE,
			"payload of {} bytes is shorter than a raster header",
			bytes.len()
		);
		match PayloadEndian::from_flag(bytes[0])? {
			PayloadEndian::Little => RasterHeader::read(&mut ValueReaderSlice::new_le(&bytes[1..])),
			PayloadEndian::Big => RasterHeader::read(&mut ValueReaderSlice::new_be(&bytes[1..])),
		}
	}

	pub(crate) fn read<'a, E: ByteOrder + 'a>(reader: &mut impl ValueReader<'a, E>) -> Result<RasterHeader> {
		let version = reader.read_u16()?;
		ensure!(version == 0, "unsupported raster version {version}");
		Ok(RasterHeader {
			version,
			band_count: reader.read_u16()?,
			scale_x: reader.read_f64()?,
			scale_y: reader.read_f64()?,
			upper_left_x: reader.read_f64()?,
			upper_left_y: reader.read_f64()?,
			skew_x: reader.read_f64()?,
			skew_y: reader.read_f64()?,
			srid: reader.read_i32()?,
			width: reader.read_u16()?,
			height: reader.read_u16()?,
		})
	}

	pub(crate) fn write<E: ByteOrder>(&self, writer: &mut impl ValueWriter<E>) -> Result<()> {
		writer.write_u16(self.version)?;
		writer.write_u16(self.band_count)?;
		writer.write_f64(self.scale_x)?;
		writer.write_f64(self.scale_y)?;
		writer.write_f64(self.upper_left_x)?;
		writer.write_f64(self.upper_left_y)?;
		writer.write_f64(self.skew_x)?;
		writer.write_f64(self.skew_y)?;
		writer.write_i32(self.srid)?;
		writer.write_u16(self.width)?;
		writer.write_u16(self.height)?;
		Ok(())
	}

	pub fn geo_transform(&self) -> GeoTransform {
		GeoTransform::new(self.upper_left_x, self.upper_left_y, self.scale_x, self.scale_y)
			.with_skew(self.skew_x, self.skew_y)
	}

	pub fn pixel_count(&self) -> usize {
		self.width as usize * self.height as usize
	}
}
