//! Fixtures for tests: tile payloads, a 2×2 grid catalog and a store wrapper that counts
//! and optionally fails queries.

use crate::{
	BandMetadataRow, CoverageSummary, Footprint, RasterStore, RowIdentity, SourceSelector, SqliteCatalogWriter,
	TileGeometry, TileOrder, TileRow,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use pgraster_core::{
	payload::{PayloadEndian, RasterPayloadBuilder},
	types::{GeoTransform, PixelType},
};
use std::{path::Path, sync::Arc};

pub const GRID_TILE_SIZE: u16 = 256;

pub const WGS84_SRTEXT: &str = "GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],\
	PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433],AUTHORITY[\"EPSG\",\"4326\"]]";

/// Pixel value of the grid fixture at pixel `(x, y)` of tile `(col, row)`.
pub fn grid_value(col: u32, row: u32, x: u32, y: u32) -> f64 {
	f64::from((row * 2 + col) * 1000 + (y % 10) * 10 + x % 10)
}

/// One 256×256 tile of the grid fixture: pixel size (1, −1), upper left corner at
/// (256·col, −256·row), one 16BUI band.
pub fn grid_tile(col: u32, row: u32, srid: i32) -> Result<Vec<u8>> {
	let size = f64::from(GRID_TILE_SIZE);
	RasterPayloadBuilder::new(GRID_TILE_SIZE, GRID_TILE_SIZE)
		.geo_transform(GeoTransform::new(size * f64::from(col), -size * f64::from(row), 1.0, -1.0))
		.srid(srid)
		.band_fn(PixelType::UInt16, None, |x, y| grid_value(col, row, x, y))
		.encode(PayloadEndian::Little)
}

/// Writes the 2×2 grid as table `grid`, column `rast`, rows in the order
/// (0,0), (1,0), (0,1), (1,1).
pub fn write_grid_catalog(path: &Path, srid: i32) -> Result<()> {
	let writer = SqliteCatalogWriter::create(path, "grid", "rast")?;
	for (col, row) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
		writer.insert_tile(&grid_tile(col, row, srid)?)?;
	}
	writer.insert_spatial_ref(4326, WGS84_SRTEXT)?;
	Ok(())
}

pub fn grid_selector() -> SourceSelector {
	SourceSelector::new("main", "grid", "rast")
}

/// Wraps a store, records the name of every method called on it and fails the
/// methods named in `failing`. `without_band_metadata` hides the band rows.
pub struct CountingStore {
	inner: Arc<dyn RasterStore>,
	calls: Mutex<Vec<&'static str>>,
	failing: Vec<&'static str>,
	hide_band_metadata: bool,
}

impl CountingStore {
	pub fn new(inner: Arc<dyn RasterStore>) -> CountingStore {
		CountingStore {
			inner,
			calls: Mutex::new(Vec::new()),
			failing: Vec::new(),
			hide_band_metadata: false,
		}
	}

	pub fn failing(mut self, method: &'static str) -> CountingStore {
		self.failing.push(method);
		self
	}

	pub fn without_band_metadata(mut self) -> CountingStore {
		self.hide_band_metadata = true;
		self
	}

	pub fn calls(&self) -> Vec<&'static str> {
		self.calls.lock().clone()
	}

	pub fn count(&self, method: &str) -> usize {
		self.calls.lock().iter().filter(|c| **c == method).count()
	}

	pub fn reset(&self) {
		self.calls.lock().clear();
	}

	fn record(&self, method: &'static str) -> Result<()> {
		self.calls.lock().push(method);
		if self.failing.contains(&method) {
			bail!("{method} failed on purpose");
		}
		Ok(())
	}
}

#[async_trait]
impl RasterStore for CountingStore {
	fn name(&self) -> String {
		format!("counting {}", self.inner.name())
	}

	async fn count_rows(&self, selector: &SourceSelector) -> Result<u64> {
		self.record("count_rows")?;
		self.inner.count_rows(selector).await
	}

	async fn coverage_summary(&self, selector: &SourceSelector) -> Result<Vec<CoverageSummary>> {
		self.record("coverage_summary")?;
		self.inner.coverage_summary(selector).await
	}

	async fn representative_geometry(&self, selector: &SourceSelector) -> Result<Option<TileGeometry>> {
		self.record("representative_geometry")?;
		self.inner.representative_geometry(selector).await
	}

	async fn band_metadata(&self, selector: &SourceSelector) -> Result<Vec<BandMetadataRow>> {
		self.record("band_metadata")?;
		if self.hide_band_metadata {
			return Ok(Vec::new());
		}
		self.inner.band_metadata(selector).await
	}

	async fn union_extent_wkt(&self, selector: &SourceSelector, srid: i32) -> Result<Option<String>> {
		self.record("union_extent_wkt")?;
		self.inner.union_extent_wkt(selector, srid).await
	}

	async fn primary_key_column(&self, selector: &SourceSelector) -> Result<Option<String>> {
		self.record("primary_key_column")?;
		self.inner.primary_key_column(selector).await
	}

	async fn sequence_column(&self, selector: &SourceSelector) -> Result<Option<String>> {
		self.record("sequence_column")?;
		self.inner.sequence_column(selector).await
	}

	async fn row_identifiers(&self, selector: &SourceSelector, column: &str) -> Result<Vec<String>> {
		self.record("row_identifiers")?;
		self.inner.row_identifiers(selector, column).await
	}

	async fn row_upper_lefts(&self, selector: &SourceSelector) -> Result<Vec<(f64, f64)>> {
		self.record("row_upper_lefts")?;
		self.inner.row_upper_lefts(selector).await
	}

	fn identity_predicate(&self, selector: &SourceSelector, identity: &RowIdentity) -> String {
		self.inner.identity_predicate(selector, identity)
	}

	async fn intersecting_tiles(
		&self,
		selector: &SourceSelector,
		footprint: &Footprint,
		order: TileOrder,
	) -> Result<Vec<TileRow>> {
		self.record("intersecting_tiles")?;
		self.inner.intersecting_tiles(selector, footprint, order).await
	}

	async fn spatial_ref_text(&self, srid: i32) -> Result<Option<String>> {
		self.record("spatial_ref_text")?;
		self.inner.spatial_ref_text(srid).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pgraster_core::payload::RasterPayload;

	#[test]
	fn grid_tiles_carry_their_position() {
		let payload = RasterPayload::decode(&grid_tile(1, 1, 4326).unwrap()).unwrap();
		assert_eq!(payload.header.upper_left_x, 256.0);
		assert_eq!(payload.header.upper_left_y, -256.0);
		assert_eq!(payload.header.srid, 4326);
		let band = payload.band_buffer(1).unwrap();
		assert_eq!(band.get_xy(3, 2), grid_value(1, 1, 3, 2));
		assert_eq!(band.get_xy(3, 2), 3023.0);
	}
}
