//! Pixel types of stored raster bands and the data types they are served as.
//!
//! A stored band carries one of eleven pixel types, spelled by PostGIS as tags such as
//! `8BUI` or `32BF` and encoded in tile payloads as a 4-bit code. Each pixel type maps
//! to one [`BandDataType`] plus a bit depth. Sub-byte types (`1BB`, `2BUI`, `4BUI`)
//! are stored one byte per pixel and served as 8-bit data with a reduced bit depth;
//! `8BSI` is served as 8-bit data flagged as signed.
//!
//! ```rust
//! use pgraster_core::types::{BandDataType, PixelType};
//!
//! let pixel_type = PixelType::from_tag("16BSI").unwrap();
//! assert_eq!(pixel_type.data_type(), BandDataType::Int16);
//! assert_eq!(pixel_type.bit_depth(), 16);
//! assert_eq!(PixelType::from_tag("bogus"), None);
//! ```

use anyhow::{Result, bail};
use std::fmt::Display;

/// Data type of a served band or pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BandDataType {
	Byte,
	Int16,
	UInt16,
	Int32,
	UInt32,
	Float32,
	Float64,
}

impl BandDataType {
	/// Size of one pixel in bytes.
	pub fn size(&self) -> usize {
		match self {
			BandDataType::Byte => 1,
			BandDataType::Int16 | BandDataType::UInt16 => 2,
			BandDataType::Int32 | BandDataType::UInt32 | BandDataType::Float32 => 4,
			BandDataType::Float64 => 8,
		}
	}

	/// Inclusive value range of an integer type, `None` for floats.
	pub fn integer_range(&self) -> Option<(f64, f64)> {
		match self {
			BandDataType::Byte => Some((0.0, f64::from(u8::MAX))),
			BandDataType::Int16 => Some((f64::from(i16::MIN), f64::from(i16::MAX))),
			BandDataType::UInt16 => Some((0.0, f64::from(u16::MAX))),
			BandDataType::Int32 => Some((f64::from(i32::MIN), f64::from(i32::MAX))),
			BandDataType::UInt32 => Some((0.0, f64::from(u32::MAX))),
			BandDataType::Float32 | BandDataType::Float64 => None,
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			BandDataType::Byte => "Byte",
			BandDataType::Int16 => "Int16",
			BandDataType::UInt16 => "UInt16",
			BandDataType::Int32 => "Int32",
			BandDataType::UInt32 => "UInt32",
			BandDataType::Float32 => "Float32",
			BandDataType::Float64 => "Float64",
		}
	}
}

impl Display for BandDataType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Pixel type of a stored band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelType {
	Bool1,
	UInt2,
	UInt4,
	Int8,
	UInt8,
	Int16,
	UInt16,
	Int32,
	UInt32,
	Float32,
	Float64,
}

impl PixelType {
	pub const ALL: [PixelType; 11] = [
		PixelType::Bool1,
		PixelType::UInt2,
		PixelType::UInt4,
		PixelType::Int8,
		PixelType::UInt8,
		PixelType::Int16,
		PixelType::UInt16,
		PixelType::Int32,
		PixelType::UInt32,
		PixelType::Float32,
		PixelType::Float64,
	];

	/// The PostGIS tag, as returned by `ST_BandPixelType`.
	pub fn tag(&self) -> &'static str {
		match self {
			PixelType::Bool1 => "1BB",
			PixelType::UInt2 => "2BUI",
			PixelType::UInt4 => "4BUI",
			PixelType::Int8 => "8BSI",
			PixelType::UInt8 => "8BUI",
			PixelType::Int16 => "16BSI",
			PixelType::UInt16 => "16BUI",
			PixelType::Int32 => "32BSI",
			PixelType::UInt32 => "32BUI",
			PixelType::Float32 => "32BF",
			PixelType::Float64 => "64BF",
		}
	}

	/// Looks up a tag, ignoring case and anything after the tag itself.
	pub fn from_tag(tag: &str) -> Option<PixelType> {
		let tag = tag.trim().to_ascii_uppercase();
		PixelType::ALL.into_iter().find(|pixel_type| tag.starts_with(pixel_type.tag()))
	}

	/// The 4-bit code used in tile payloads.
	pub fn code(&self) -> u8 {
		match self {
			PixelType::Bool1 => 0,
			PixelType::UInt2 => 1,
			PixelType::UInt4 => 2,
			PixelType::Int8 => 3,
			PixelType::UInt8 => 4,
			PixelType::Int16 => 5,
			PixelType::UInt16 => 6,
			PixelType::Int32 => 7,
			PixelType::UInt32 => 8,
			PixelType::Float32 => 10,
			PixelType::Float64 => 11,
		}
	}

	pub fn from_code(code: u8) -> Result<PixelType> {
		match PixelType::ALL.into_iter().find(|pixel_type| pixel_type.code() == code) {
			Some(pixel_type) => Ok(pixel_type),
			None => bail!("unknown pixel type code {code}"),
		}
	}

	pub fn data_type(&self) -> BandDataType {
		match self {
			PixelType::Bool1 | PixelType::UInt2 | PixelType::UInt4 | PixelType::Int8 | PixelType::UInt8 => {
				BandDataType::Byte
			}
			PixelType::Int16 => BandDataType::Int16,
			PixelType::UInt16 => BandDataType::UInt16,
			PixelType::Int32 => BandDataType::Int32,
			PixelType::UInt32 => BandDataType::UInt32,
			PixelType::Float32 => BandDataType::Float32,
			PixelType::Float64 => BandDataType::Float64,
		}
	}

	/// Number of significant bits per pixel.
	pub fn bit_depth(&self) -> u8 {
		match self {
			PixelType::Bool1 => 1,
			PixelType::UInt2 => 2,
			PixelType::UInt4 => 4,
			PixelType::Int8 | PixelType::UInt8 => 8,
			PixelType::Int16 | PixelType::UInt16 => 16,
			PixelType::Int32 | PixelType::UInt32 | PixelType::Float32 => 32,
			PixelType::Float64 => 64,
		}
	}

	pub fn is_signed_byte(&self) -> bool {
		*self == PixelType::Int8
	}

	/// Size of one stored pixel in bytes. Sub-byte types occupy a full byte.
	pub fn stored_size(&self) -> usize {
		self.data_type().size()
	}
}

impl Display for PixelType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.tag())
	}
}
