use crate::{Footprint, SourceSelector, TileOrder};
use geo::Coord;
use pgraster_core::types::{GeoTransform, PixelWindow};
use std::fmt::Display;

/// Geometry of a resolved raster. Produced once by the resolver and never changed.
///
/// `pixel_size_y` is negative for north-up rasters.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageDescriptor {
	pub origin_x: f64,
	pub origin_y: f64,
	pub pixel_size_x: f64,
	pub pixel_size_y: f64,
	pub skew_x: f64,
	pub skew_y: f64,
	pub srid: i32,
	pub raster_width: u32,
	pub raster_height: u32,
	pub block_width: u32,
	pub block_height: u32,
	pub band_count: u32,
}

impl CoverageDescriptor {
	/// The descriptor of a table that only lists its rows as subdatasets.
	pub fn empty() -> CoverageDescriptor {
		CoverageDescriptor {
			origin_x: 0.0,
			origin_y: 0.0,
			pixel_size_x: 1.0,
			pixel_size_y: 1.0,
			skew_x: 0.0,
			skew_y: 0.0,
			srid: 0,
			raster_width: 0,
			raster_height: 0,
			block_width: 0,
			block_height: 0,
			band_count: 0,
		}
	}

	pub fn geo_transform(&self) -> GeoTransform {
		GeoTransform::new(self.origin_x, self.origin_y, self.pixel_size_x, self.pixel_size_y)
			.with_skew(self.skew_x, self.skew_y)
	}

	/// Zero or negative srids mark rasters without a real spatial reference.
	pub fn is_local_srid(&self) -> bool {
		self.srid <= 0
	}

	pub fn tile_order(&self) -> TileOrder {
		TileOrder::for_srid(self.srid)
	}

	pub fn is_empty(&self) -> bool {
		self.raster_width == 0 || self.raster_height == 0
	}

	/// The area covered by `window`, for a spatial query.
	pub fn footprint(&self, window: &PixelWindow) -> Footprint {
		Footprint {
			polygon: self.geo_transform().window_polygon(window),
			srid: self.srid,
		}
	}

	/// Pixel position of a georeferenced point, ignoring skew.
	pub fn pixel_of(&self, point: Coord<f64>) -> (f64, f64) {
		(
			(point.x - self.origin_x) / self.pixel_size_x,
			(point.y - self.origin_y) / self.pixel_size_y,
		)
	}
}

impl Display for CoverageDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{}x{} px, {} bands, blocks {}x{}, origin ({}, {}), pixel ({}, {}), srid {}",
			self.raster_width,
			self.raster_height,
			self.band_count,
			self.block_width,
			self.block_height,
			self.origin_x,
			self.origin_y,
			self.pixel_size_x,
			self.pixel_size_y,
			self.srid
		)
	}
}

/// One row of a table exposed as its own raster.
#[derive(Clone, Debug, PartialEq)]
pub struct SubdatasetEntry {
	pub name: String,
	pub description: String,
	/// Opens exactly this row.
	pub selector: SourceSelector,
}
