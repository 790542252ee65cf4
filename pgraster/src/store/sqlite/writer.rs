use crate::quote_ident;
use anyhow::Result;
use pgraster_core::payload::RasterHeader;
use pgraster_derive::context;
use r2d2::Pool;
use r2d2_sqlite::{SqliteConnectionManager, rusqlite::params};
use std::{fs::remove_file, path::Path};

/// Creates a SQLite raster catalog and fills it with tile payloads.
///
/// Every inserted payload is decoded far enough to fill the header and envelope
/// columns, so a catalog written here is always consistent with its blobs.
pub struct SqliteCatalogWriter {
	pool: Pool<SqliteConnectionManager>,
	table: String,
	column: String,
}

impl SqliteCatalogWriter {
	/// Creates a new catalog at `path`, replacing any existing file.
	#[context("creating SQLite raster catalog '{}'", path.display())]
	pub fn create(path: &Path, table: &str, column: &str) -> Result<SqliteCatalogWriter> {
		if path.exists() {
			remove_file(path)?;
		}
		let manager = SqliteConnectionManager::file(path);
		let pool = Pool::builder().max_size(1).build(manager)?;

		let t = quote_ident(table);
		let index = quote_ident(&format!("{table}_envelope"));
		pool.get()?.execute_batch(&format!(
			"CREATE TABLE {t} (rid INTEGER PRIMARY KEY, upperleftx REAL, upperlefty REAL, scalex REAL, scaley REAL, \
			skewx REAL, skewy REAL, width INTEGER, height INTEGER, srid INTEGER, numbands INTEGER, \
			minx REAL, miny REAL, maxx REAL, maxy REAL, {} BLOB);
			CREATE INDEX {index} ON {t} (minx, maxx, miny, maxy);
			CREATE TABLE spatial_ref_sys (srid INTEGER PRIMARY KEY, srtext TEXT);",
			quote_ident(column)
		))?;

		Ok(SqliteCatalogWriter {
			pool,
			table: table.to_string(),
			column: column.to_string(),
		})
	}

	/// Appends one tile and returns its `rid`.
	#[context("adding a tile of {} bytes to '{}'", payload.len(), self.table)]
	pub fn insert_tile(&self, payload: &[u8]) -> Result<i64> {
		let header = RasterHeader::decode(payload)?;
		let bounds = header
			.geo_transform()
			.bounds(u32::from(header.width), u32::from(header.height));
		let sql = format!(
			"INSERT INTO {} (upperleftx, upperlefty, scalex, scaley, skewx, skewy, width, height, srid, numbands, \
			minx, miny, maxx, maxy, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
			quote_ident(&self.table),
			quote_ident(&self.column)
		);
		log::trace!("SQL: {sql}");
		let conn = self.pool.get()?;
		conn.execute(
			&sql,
			params![
				header.upper_left_x,
				header.upper_left_y,
				header.scale_x,
				header.scale_y,
				header.skew_x,
				header.skew_y,
				header.width,
				header.height,
				header.srid,
				header.band_count,
				bounds.min().x,
				bounds.min().y,
				bounds.max().x,
				bounds.max().y,
				payload
			],
		)?;
		Ok(conn.last_insert_rowid())
	}

	/// Inserts or replaces the WKT definition of `srid`.
	#[context("setting spatial reference {srid}")]
	pub fn insert_spatial_ref(&self, srid: i32, srtext: &str) -> Result<()> {
		self.pool.get()?.execute(
			"INSERT OR REPLACE INTO spatial_ref_sys (srid, srtext) VALUES (?1, ?2)",
			params![srid, srtext],
		)?;
		Ok(())
	}
}
