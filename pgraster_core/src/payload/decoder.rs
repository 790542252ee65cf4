use super::{HEADER_SIZE, PayloadEndian, RasterHeader};
use crate::{
	io::{ValueReader, ValueReaderSlice},
	types::{BandDescriptor, PixelBuffer, PixelType},
};
use anyhow::{Result, bail, ensure};
use byteorder::ByteOrder;
use pgraster_derive::context;

const FLAG_OFFLINE: u8 = 0x80;
const FLAG_HAS_NODATA: u8 = 0x40;
const FLAG_IS_NODATA: u8 = 0x20;
const PIXEL_TYPE_MASK: u8 = 0x0F;

/// One decoded band of a tile payload.
#[derive(Clone, Debug, PartialEq)]
pub struct PayloadBand {
	pub pixel_type: PixelType,
	pub has_nodata: bool,
	pub is_nodata: bool,
	pub nodata_value: f64,
	/// Offset of the first pixel byte within the payload.
	pub data_offset: usize,
	/// Pixels in native byte order.
	pub data: Vec<u8>,
}

impl PayloadBand {
	pub fn descriptor(&self) -> BandDescriptor {
		let descriptor = BandDescriptor::from_pixel_type(self.pixel_type);
		if self.has_nodata {
			descriptor.with_nodata(self.nodata_value)
		} else {
			descriptor
		}
	}

	pub fn to_pixel_buffer(&self, width: u32, height: u32) -> Result<PixelBuffer> {
		PixelBuffer::from_bytes(self.pixel_type.data_type(), width, height, self.data.clone())
	}
}

/// A fully decoded tile payload.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterPayload {
	pub endian: PayloadEndian,
	pub header: RasterHeader,
	pub bands: Vec<PayloadBand>,
}

impl RasterPayload {
	#[context("decoding raster payload of {} bytes", bytes.len())]
	pub fn decode(bytes: &[u8]) -> Result<RasterPayload> {
		ensure!(
			bytes.len() >= HEADER_SIZE,
			"payload of {} bytes is shorter than a raster header",
			bytes.len()
		);
		let endian = PayloadEndian::from_flag(bytes[0])?;
		let (header, bands) = match endian {
			PayloadEndian::Little => decode_body(&mut ValueReaderSlice::new_le(&bytes[1..]))?,
			PayloadEndian::Big => decode_body(&mut ValueReaderSlice::new_be(&bytes[1..]))?,
		};
		Ok(RasterPayload { endian, header, bands })
	}

	/// Band by 1-based index.
	pub fn band(&self, index: usize) -> Result<&PayloadBand> {
		ensure!(index >= 1, "band indexes start at 1");
		match self.bands.get(index - 1) {
			Some(band) => Ok(band),
			None => bail!("band {index} requested, but the tile has {} bands", self.bands.len()),
		}
	}

	/// Band by 1-based index as a pixel buffer of the tile's size.
	pub fn band_buffer(&self, index: usize) -> Result<PixelBuffer> {
		self
			.band(index)?
			.to_pixel_buffer(u32::from(self.header.width), u32::from(self.header.height))
	}
}

fn decode_body<'a, E: ByteOrder + 'a>(
	reader: &mut ValueReaderSlice<'a, E>,
) -> Result<(RasterHeader, Vec<PayloadBand>)> {
	let header = RasterHeader::read(reader)?;
	let pixel_count = header.pixel_count();

	let mut bands = Vec::with_capacity(header.band_count as usize);
	for index in 1..=header.band_count {
		let flags = reader.read_u8()?;
		ensure!(flags & FLAG_OFFLINE == 0, "band {index} is stored out of database");
		let pixel_type = PixelType::from_code(flags & PIXEL_TYPE_MASK)?;
		let nodata_value = reader.read_pixel_value(pixel_type)?;
		let data_offset = 1 + reader.position() as usize;
		let data = reader.read_words_native(pixel_type.stored_size(), pixel_count)?;
		log::trace!("band {index}: {pixel_type} at offset {data_offset}, {} bytes", data.len());
		bands.push(PayloadBand {
			pixel_type,
			has_nodata: flags & FLAG_HAS_NODATA != 0,
			is_nodata: flags & FLAG_IS_NODATA != 0,
			nodata_value,
			data_offset,
			data,
		});
	}

	if reader.remaining() > 0 {
		log::trace!("ignoring {} trailing payload bytes", reader.remaining());
	}

	Ok((header, bands))
}
