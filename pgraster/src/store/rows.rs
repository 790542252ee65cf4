//! Typed results of the store queries.

use geo::{Polygon, Rect};
use pgraster_core::types::GeoTransform;
use std::fmt::Display;

/// Extent, srid and band count of all rows sharing one srid.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageSummary {
	pub srid: i32,
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
	pub band_count: u32,
}

/// Pixel size, skew and size of one representative tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGeometry {
	pub scale_x: f64,
	pub scale_y: f64,
	pub skew_x: f64,
	pub skew_y: f64,
	pub width: u32,
	pub height: u32,
}

/// Pixel type tag and nodata of one band of the representative tile.
#[derive(Clone, Debug, PartialEq)]
pub struct BandMetadataRow {
	/// 1-based band index.
	pub band: usize,
	pub pixel_type: String,
	pub nodata_is_null: bool,
	pub nodata_value: Option<f64>,
}

/// What singles out one row of a table.
#[derive(Clone, Debug, PartialEq)]
pub enum RowIdentity {
	/// Value of a primary key, unique or sequence column, as text.
	Column { column: String, value: String },
	/// Upper left corner of the row's raster.
	UpperLeft { x: f64, y: f64 },
}

impl Display for RowIdentity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RowIdentity::Column { column, value } => write!(f, "{column} = {value}"),
			RowIdentity::UpperLeft { x, y } => write!(f, "UpperLeft = {x}, {y}"),
		}
	}
}

/// Order of the rows returned by a spatial query: by upper left Y, then upper left X
/// ascending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileOrder {
	/// Pixel-space rasters whose Y grows downwards.
	YAscending,
	/// Georeferenced rasters whose Y grows upwards.
	YDescending,
}

impl TileOrder {
	/// Local or unset srids (zero or negative) sort ascending, everything else descending.
	pub fn for_srid(srid: i32) -> TileOrder {
		if srid <= 0 {
			TileOrder::YAscending
		} else {
			TileOrder::YDescending
		}
	}

	pub fn sql_direction(&self) -> &'static str {
		match self {
			TileOrder::YAscending => "ASC",
			TileOrder::YDescending => "DESC",
		}
	}
}

/// One tile returned by a spatial query.
#[derive(Clone, PartialEq)]
pub struct TileRow {
	pub origin_x: f64,
	pub origin_y: f64,
	pub scale_x: f64,
	pub scale_y: f64,
	pub skew_x: f64,
	pub skew_y: f64,
	pub width: u32,
	pub height: u32,
	pub payload: Vec<u8>,
}

impl TileRow {
	pub fn geo_transform(&self) -> GeoTransform {
		GeoTransform::new(self.origin_x, self.origin_y, self.scale_x, self.scale_y).with_skew(self.skew_x, self.skew_y)
	}

	pub fn bounds(&self) -> Rect<f64> {
		self.geo_transform().bounds(self.width, self.height)
	}
}

impl std::fmt::Debug for TileRow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TileRow")
			.field("origin", &(self.origin_x, self.origin_y))
			.field("size", &(self.width, self.height))
			.field("payload_len", &self.payload.len())
			.finish()
	}
}

/// The area a spatial query asks for, in the coverage's srid.
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
	pub polygon: Polygon<f64>,
	pub srid: i32,
}
