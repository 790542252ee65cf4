//! [`RasterStore`] over an offline SQLite tile catalog.
//!
//! A catalog table holds one tile per row: the payload blob in the selector's column plus
//! the header fields and the tile envelope as plain columns, so every query the resolver
//! and the fetch engine issue is answerable without decoding payloads. The only
//! exception is band metadata, which is read from the representative payload.
//!
//! SQLite has no schemas; the selector's schema is ignored. Spatial intersection is
//! envelope overlap. Catalogs are written by [`SqliteCatalogWriter`].
//!
//! | column | type |
//! |---|---|
//! | `rid` | `INTEGER PRIMARY KEY` |
//! | `upperleftx`, `upperlefty`, `scalex`, `scaley`, `skewx`, `skewy` | `REAL` |
//! | `width`, `height`, `srid`, `numbands` | `INTEGER` |
//! | `minx`, `miny`, `maxx`, `maxy` | `REAL` |
//! | payload column | `BLOB` |

mod writer;
pub use writer::*;

use crate::{
	BandMetadataRow, CoverageSummary, Footprint, RasterStore, RowIdentity, SourceSelector, TileGeometry, TileOrder,
	TileRow, quote_ident, store::identifier_literal,
};
use anyhow::{Result, bail, ensure};
use async_trait::async_trait;
use geo::{BoundingRect, Polygon, Rect, coord};
use pgraster_core::{config::StoreConfig, payload::RasterPayload};
use pgraster_derive::context;
use r2d2::Pool;
use r2d2_sqlite::{
	SqliteConnectionManager,
	rusqlite::{OptionalExtension, Row, params},
};
use std::path::{Path, PathBuf};
use wkt::ToWkt;

const TILE_COLUMNS: &str = "upperleftx, upperlefty, scalex, scaley, skewx, skewy, width, height";

pub struct SqliteStore {
	pool: Pool<SqliteConnectionManager>,
	path: PathBuf,
}

impl SqliteStore {
	#[context("opening SQLite raster catalog '{}'", path.display())]
	pub fn open_path(path: &Path, config: &StoreConfig) -> Result<SqliteStore> {
		log::debug!("open {path:?}");
		ensure!(path.exists(), "file {path:?} does not exist");
		let manager = SqliteConnectionManager::file(path);
		let pool = Pool::builder()
			.max_size(config.max_connections)
			.connection_timeout(config.acquire_timeout())
			.build(manager)?;
		Ok(SqliteStore {
			pool,
			path: path.to_path_buf(),
		})
	}

	fn from_clause(selector: &SourceSelector) -> String {
		format!("FROM {}{}", quote_ident(&selector.table), selector.where_clause())
	}

	fn query_rows<T>(&self, sql: &str, map: impl FnMut(&Row<'_>) -> r2d2_sqlite::rusqlite::Result<T>) -> Result<Vec<T>> {
		log::trace!("SQL: {sql}");
		let conn = self.pool.get()?;
		let mut stmt = conn.prepare(sql)?;
		let rows = stmt.query_map([], map)?.collect::<Result<Vec<T>, _>>()?;
		Ok(rows)
	}

	fn query_optional<T>(&self, sql: &str, map: impl FnOnce(&Row<'_>) -> r2d2_sqlite::rusqlite::Result<T>) -> Result<Option<T>> {
		log::trace!("SQL: {sql}");
		let conn = self.pool.get()?;
		let mut stmt = conn.prepare(sql)?;
		Ok(stmt.query_row([], map).optional()?)
	}

	fn table_exists(&self, table: &str) -> Result<bool> {
		let conn = self.pool.get()?;
		let mut stmt = conn.prepare("SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
		Ok(stmt.query_row(params![table], |row| row.get::<_, i64>(0))? > 0)
	}
}

fn tile_geometry(row: &Row<'_>) -> r2d2_sqlite::rusqlite::Result<TileGeometry> {
	Ok(TileGeometry {
		scale_x: row.get(0)?,
		scale_y: row.get(1)?,
		skew_x: row.get(2)?,
		skew_y: row.get(3)?,
		width: row.get(4)?,
		height: row.get(5)?,
	})
}

/// The envelope of a footprint as the four bind values of the overlap test.
fn envelope(polygon: &Polygon<f64>) -> Result<Rect<f64>> {
	match polygon.bounding_rect() {
		Some(rect) => Ok(rect),
		None => bail!("footprint polygon is empty"),
	}
}

#[async_trait]
impl RasterStore for SqliteStore {
	fn name(&self) -> String {
		format!("SQLite {}", self.path.display())
	}

	async fn count_rows(&self, selector: &SourceSelector) -> Result<u64> {
		let sql = format!("SELECT count(*) {}", Self::from_clause(selector));
		let count = self.query_optional(&sql, |row| row.get::<_, i64>(0))?.unwrap_or(0);
		Ok(u64::try_from(count)?)
	}

	async fn coverage_summary(&self, selector: &SourceSelector) -> Result<Vec<CoverageSummary>> {
		let sql = format!(
			"SELECT srid, MIN(minx), MIN(miny), MAX(maxx), MAX(maxy), MAX(numbands) {} GROUP BY srid ORDER BY srid",
			Self::from_clause(selector)
		);
		self.query_rows(&sql, |row| {
			Ok(CoverageSummary {
				srid: row.get(0)?,
				min_x: row.get(1)?,
				min_y: row.get(2)?,
				max_x: row.get(3)?,
				max_y: row.get(4)?,
				band_count: row.get(5)?,
			})
		})
	}

	async fn representative_geometry(&self, selector: &SourceSelector) -> Result<Option<TileGeometry>> {
		let sql = format!(
			"SELECT scalex, scaley, skewx, skewy, width, height {} LIMIT 1",
			Self::from_clause(selector)
		);
		self.query_optional(&sql, tile_geometry)
	}

	async fn band_metadata(&self, selector: &SourceSelector) -> Result<Vec<BandMetadataRow>> {
		let sql = format!("SELECT {} {} LIMIT 1", selector.quoted_column(), Self::from_clause(selector));
		let Some(blob) = self.query_optional(&sql, |row| row.get::<_, Vec<u8>>(0))? else {
			return Ok(Vec::new());
		};
		let payload = RasterPayload::decode(&blob)?;
		Ok(payload
			.bands
			.iter()
			.enumerate()
			.map(|(index, band)| BandMetadataRow {
				band: index + 1,
				pixel_type: band.pixel_type.tag().to_string(),
				nodata_is_null: !band.has_nodata,
				nodata_value: band.has_nodata.then_some(band.nodata_value),
			})
			.collect())
	}

	async fn union_extent_wkt(&self, selector: &SourceSelector, srid: i32) -> Result<Option<String>> {
		let sql = format!(
			"SELECT MIN(minx), MIN(miny), MAX(maxx), MAX(maxy) {}",
			Self::from_clause(selector)
		);
		let extent = self.query_optional(&sql, |row| {
			Ok((
				row.get::<_, Option<f64>>(0)?,
				row.get::<_, Option<f64>>(1)?,
				row.get::<_, Option<f64>>(2)?,
				row.get::<_, Option<f64>>(3)?,
			))
		})?;
		Ok(match extent {
			Some((Some(min_x), Some(min_y), Some(max_x), Some(max_y))) => {
				log::trace!("union extent in srid {srid}");
				let rect = Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y });
				Some(rect.to_polygon().wkt_string())
			}
			_ => None,
		})
	}

	async fn primary_key_column(&self, selector: &SourceSelector) -> Result<Option<String>> {
		let sql = "SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk LIMIT 1";
		log::trace!("SQL: {sql}");
		let conn = self.pool.get()?;
		let mut stmt = conn.prepare(sql)?;
		Ok(stmt
			.query_row(params![selector.table], |row| row.get::<_, String>(0))
			.optional()?)
	}

	async fn sequence_column(&self, _selector: &SourceSelector) -> Result<Option<String>> {
		Ok(None)
	}

	async fn row_identifiers(&self, selector: &SourceSelector, column: &str) -> Result<Vec<String>> {
		let sql = format!(
			"SELECT CAST({} AS TEXT) {}",
			quote_ident(column),
			Self::from_clause(selector)
		);
		self.query_rows(&sql, |row| Ok(row.get::<_, Option<String>>(0)?.unwrap_or_default()))
	}

	async fn row_upper_lefts(&self, selector: &SourceSelector) -> Result<Vec<(f64, f64)>> {
		let sql = format!("SELECT upperleftx, upperlefty {}", Self::from_clause(selector));
		self.query_rows(&sql, |row| Ok((row.get(0)?, row.get(1)?)))
	}

	fn identity_predicate(&self, _selector: &SourceSelector, identity: &RowIdentity) -> String {
		match identity {
			RowIdentity::Column { column, value } => format!("{} = {}", quote_ident(column), identifier_literal(value)),
			RowIdentity::UpperLeft { x, y } => format!("upperleftx = {x} AND upperlefty = {y}"),
		}
	}

	async fn intersecting_tiles(
		&self,
		selector: &SourceSelector,
		footprint: &Footprint,
		order: TileOrder,
	) -> Result<Vec<TileRow>> {
		let rect = envelope(&footprint.polygon)?;
		let sql = format!(
			"SELECT {TILE_COLUMNS}, {} FROM {}{} ORDER BY upperlefty {}, upperleftx ASC",
			selector.quoted_column(),
			quote_ident(&selector.table),
			selector.where_clause_and(&format!(
				"srid = {} AND maxx >= ?1 AND minx <= ?2 AND maxy >= ?3 AND miny <= ?4",
				footprint.srid
			)),
			order.sql_direction()
		);
		log::trace!("SQL: {sql}");
		let conn = self.pool.get()?;
		let mut stmt = conn.prepare(&sql)?;
		let rows = stmt
			.query_map(params![rect.min().x, rect.max().x, rect.min().y, rect.max().y], |row| {
				Ok(TileRow {
					origin_x: row.get(0)?,
					origin_y: row.get(1)?,
					scale_x: row.get(2)?,
					scale_y: row.get(3)?,
					skew_x: row.get(4)?,
					skew_y: row.get(5)?,
					width: row.get(6)?,
					height: row.get(7)?,
					payload: row.get(8)?,
				})
			})?
			.collect::<Result<Vec<_>, _>>()?;
		Ok(rows)
	}

	async fn spatial_ref_text(&self, srid: i32) -> Result<Option<String>> {
		if !self.table_exists("spatial_ref_sys")? {
			return Ok(None);
		}
		let sql = format!("SELECT srtext FROM spatial_ref_sys WHERE srid = {srid}");
		Ok(self.query_optional(&sql, |row| row.get::<_, Option<String>>(0))?.flatten())
	}
}

impl std::fmt::Debug for SqliteStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SqliteStore").field("path", &self.path).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{grid_selector, write_grid_catalog};
	use approx::assert_relative_eq;
	use assert_fs::NamedTempFile;
	use geo::polygon;
	use pretty_assertions::assert_eq;

	fn grid_catalog(srid: i32) -> NamedTempFile {
		let file = NamedTempFile::new("grid.sqlite").unwrap();
		write_grid_catalog(file.path(), srid).unwrap();
		file
	}

	fn open(file: &NamedTempFile) -> SqliteStore {
		SqliteStore::open_path(file.path(), &StoreConfig::default()).unwrap()
	}

	#[test]
	fn open_missing_file_fails() {
		let err = SqliteStore::open_path(Path::new("/does/not/exist.sqlite"), &StoreConfig::default()).unwrap_err();
		assert!(format!("{err:#}").contains("does not exist"), "{err:#}");
	}

	#[tokio::test]
	async fn counts_and_summarises() {
		let file = grid_catalog(4326);
		let store = open(&file);
		let selector = grid_selector();

		assert_eq!(store.count_rows(&selector).await.unwrap(), 4);
		assert_eq!(
			store.count_rows(&selector.and_predicate("upperleftx = 256")).await.unwrap(),
			2
		);

		let summary = store.coverage_summary(&selector).await.unwrap();
		assert_eq!(
			summary,
			vec![CoverageSummary {
				srid: 4326,
				min_x: 0.0,
				min_y: -512.0,
				max_x: 512.0,
				max_y: 0.0,
				band_count: 1,
			}]
		);

		let geometry = store.representative_geometry(&selector).await.unwrap().unwrap();
		assert_eq!((geometry.width, geometry.height), (256, 256));
		assert_relative_eq!(geometry.scale_y, -1.0);
	}

	#[tokio::test]
	async fn band_metadata_comes_from_the_payload() {
		let file = grid_catalog(4326);
		let rows = open(&file).band_metadata(&grid_selector()).await.unwrap();
		assert_eq!(
			rows,
			vec![BandMetadataRow {
				band: 1,
				pixel_type: "16BUI".to_string(),
				nodata_is_null: true,
				nodata_value: None,
			}]
		);
	}

	#[tokio::test]
	async fn union_extent_is_a_polygon() {
		let file = grid_catalog(4326);
		let store = open(&file);
		let wkt = store.union_extent_wkt(&grid_selector(), 4326).await.unwrap().unwrap();
		assert!(wkt.starts_with("POLYGON(("), "{wkt}");
		let none = store
			.union_extent_wkt(&grid_selector().and_predicate("rid < 0"), 4326)
			.await
			.unwrap();
		assert_eq!(none, None);
	}

	#[tokio::test]
	async fn identifiers() {
		let file = grid_catalog(4326);
		let store = open(&file);
		let selector = grid_selector();
		assert_eq!(store.primary_key_column(&selector).await.unwrap().as_deref(), Some("rid"));
		assert_eq!(store.sequence_column(&selector).await.unwrap(), None);
		assert_eq!(store.row_identifiers(&selector, "rid").await.unwrap(), vec!["1", "2", "3", "4"]);
		assert_eq!(store.row_upper_lefts(&selector).await.unwrap().len(), 4);
		assert_eq!(
			store.identity_predicate(&selector, &RowIdentity::UpperLeft { x: 256.0, y: -256.0 }),
			"upperleftx = 256 AND upperlefty = -256"
		);
	}

	#[tokio::test]
	async fn intersecting_tiles_are_ordered() {
		let file = grid_catalog(4326);
		let store = open(&file);
		let footprint = Footprint {
			polygon: polygon![(x: 0.0, y: 0.0), (x: 512.0, y: 0.0), (x: 512.0, y: -512.0), (x: 0.0, y: -512.0)],
			srid: 4326,
		};
		let tiles = store
			.intersecting_tiles(&grid_selector(), &footprint, TileOrder::YDescending)
			.await
			.unwrap();
		let origins: Vec<(f64, f64)> = tiles.iter().map(|t| (t.origin_x, t.origin_y)).collect();
		assert_eq!(origins, vec![(0.0, 0.0), (256.0, 0.0), (0.0, -256.0), (256.0, -256.0)]);

		let tiles = store
			.intersecting_tiles(&grid_selector(), &footprint, TileOrder::YAscending)
			.await
			.unwrap();
		assert_eq!((tiles[0].origin_x, tiles[0].origin_y), (0.0, -256.0));
	}

	#[tokio::test]
	async fn spatial_ref_lookup() {
		let file = grid_catalog(4326);
		let store = open(&file);
		let text = store.spatial_ref_text(4326).await.unwrap().unwrap();
		assert!(text.starts_with("GEOGCS[\"WGS 84\""), "{text}");
		assert_eq!(store.spatial_ref_text(3857).await.unwrap(), None);
	}
}
