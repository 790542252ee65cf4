use super::{PayloadEndian, RasterHeader};
use crate::{
	io::{ValueWriter, ValueWriterBlob},
	types::{GeoTransform, PixelType},
};
use anyhow::{Result, ensure};
use byteorder::ByteOrder;

struct BandSpec {
	pixel_type: PixelType,
	nodata: Option<f64>,
	values: Vec<f64>,
}

/// Writes tile payloads, mainly to populate offline catalogs and test fixtures.
///
/// ```rust
/// use pgraster_core::{payload::*, types::*};
///
/// let bytes = RasterPayloadBuilder::new(2, 1)
/// 	.geo_transform(GeoTransform::new(10.0, 20.0, 1.0, -1.0))
/// 	.srid(4326)
/// 	.band(PixelType::UInt8, None, vec![7.0, 9.0])
/// 	.encode(PayloadEndian::Little)
/// 	.unwrap();
///
/// let payload = RasterPayload::decode(&bytes).unwrap();
/// assert_eq!(payload.header.upper_left_x, 10.0);
/// assert_eq!(payload.band(1).unwrap().data, vec![7, 9]);
/// ```
pub struct RasterPayloadBuilder {
	header: RasterHeader,
	bands: Vec<BandSpec>,
}

impl RasterPayloadBuilder {
	pub fn new(width: u16, height: u16) -> RasterPayloadBuilder {
		RasterPayloadBuilder {
			header: RasterHeader {
				version: 0,
				band_count: 0,
				scale_x: 1.0,
				scale_y: -1.0,
				upper_left_x: 0.0,
				upper_left_y: 0.0,
				skew_x: 0.0,
				skew_y: 0.0,
				srid: 0,
				width,
				height,
			},
			bands: Vec::new(),
		}
	}

	pub fn geo_transform(mut self, transform: GeoTransform) -> Self {
		self.header.upper_left_x = transform.origin_x;
		self.header.upper_left_y = transform.origin_y;
		self.header.scale_x = transform.pixel_size_x;
		self.header.scale_y = transform.pixel_size_y;
		self.header.skew_x = transform.skew_x;
		self.header.skew_y = transform.skew_y;
		self
	}

	pub fn srid(mut self, srid: i32) -> Self {
		self.header.srid = srid;
		self
	}

	/// Appends a band with one value per pixel in row-major order.
	pub fn band(mut self, pixel_type: PixelType, nodata: Option<f64>, values: Vec<f64>) -> Self {
		self.bands.push(BandSpec {
			pixel_type,
			nodata,
			values,
		});
		self
	}

	/// Appends a band where every pixel is produced by `f(x, y)`.
	pub fn band_fn(self, pixel_type: PixelType, nodata: Option<f64>, f: impl Fn(u32, u32) -> f64) -> Self {
		let (width, height) = (u32::from(self.header.width), u32::from(self.header.height));
		let values = (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).map(|(x, y)| f(x, y)).collect();
		self.band(pixel_type, nodata, values)
	}

	pub fn encode(&self, endian: PayloadEndian) -> Result<Vec<u8>> {
		match endian {
			PayloadEndian::Little => self.write(ValueWriterBlob::new_le(), endian),
			PayloadEndian::Big => self.write(ValueWriterBlob::new_be(), endian),
		}
	}

	fn write<E: ByteOrder>(&self, mut writer: ValueWriterBlob<E>, endian: PayloadEndian) -> Result<Vec<u8>> {
		let mut header = self.header.clone();
		header.band_count = u16::try_from(self.bands.len())?;

		writer.write_u8(endian.flag())?;
		header.write(&mut writer)?;

		for (index, band) in self.bands.iter().enumerate() {
			ensure!(
				band.values.len() == header.pixel_count(),
				"band {} has {} values, expected {}",
				index + 1,
				band.values.len(),
				header.pixel_count()
			);
			let mut flags = band.pixel_type.code();
			if band.nodata.is_some() {
				flags |= 0x40;
			}
			writer.write_u8(flags)?;
			writer.write_pixel_value(band.pixel_type, band.nodata.unwrap_or(0.0))?;
			for value in &band.values {
				writer.write_pixel_value(band.pixel_type, *value)?;
			}
		}
		Ok(writer.into_vec())
	}
}
