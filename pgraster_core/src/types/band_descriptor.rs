use super::{BandDataType, PixelType};
use std::fmt::Display;

/// Data type, bit depth and nodata of one band of a coverage.
///
/// Resolved once from a representative tile and shared by all tiles of the coverage.
#[derive(Clone, Debug, PartialEq)]
pub struct BandDescriptor {
	pub data_type: BandDataType,
	pub bit_depth: u8,
	pub is_signed_byte: bool,
	pub has_nodata: bool,
	pub nodata_value: Option<f64>,
}

impl BandDescriptor {
	/// Maps a stored pixel-type tag plus nodata information to a descriptor.
	///
	/// Tags outside the known vocabulary fall back to unsigned 8-bit data without the
	/// signed-byte flag. `nodata_is_null` reports whether the stored nodata value is SQL
	/// `NULL`; only a non-null value with an actual number counts as nodata.
	pub fn from_tag(tag: &str, nodata_is_null: bool, nodata_value: Option<f64>) -> BandDescriptor {
		let mut descriptor = match PixelType::from_tag(tag) {
			Some(pixel_type) => BandDescriptor::from_pixel_type(pixel_type),
			None => {
				log::debug!("unknown pixel type '{tag}', using 8BUI");
				BandDescriptor::default()
			}
		};
		if !nodata_is_null && let Some(value) = nodata_value {
			descriptor.has_nodata = true;
			descriptor.nodata_value = Some(value);
		}
		descriptor
	}

	pub fn from_pixel_type(pixel_type: PixelType) -> BandDescriptor {
		BandDescriptor {
			data_type: pixel_type.data_type(),
			bit_depth: pixel_type.bit_depth(),
			is_signed_byte: pixel_type.is_signed_byte(),
			has_nodata: false,
			nodata_value: None,
		}
	}

	pub fn with_nodata(mut self, value: f64) -> BandDescriptor {
		self.has_nodata = true;
		self.nodata_value = Some(value);
		self
	}
}

impl Default for BandDescriptor {
	fn default() -> Self {
		BandDescriptor::from_pixel_type(PixelType::UInt8)
	}
}

impl Display for BandDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} ({} bit", self.data_type, self.bit_depth)?;
		if self.is_signed_byte {
			f.write_str(", signed")?;
		}
		if let Some(value) = self.nodata_value {
			write!(f, ", nodata {value}")?;
		}
		f.write_str(")")
	}
}
