//! The relational store holding the tile rows.
//!
//! [`RasterStore`] has one method per round trip the resolver and the fetch engine make.
//! Every method issues at most one query and awaits it before returning, so a handle
//! never has two queries in flight.
//!
//! Two backends implement it:
//! - [`PostgisStore`]: a PostgreSQL database with the PostGIS raster extension,
//! - [`SqliteStore`]: an offline SQLite catalog of tiles, written by [`SqliteCatalogWriter`].

mod postgis;
pub use postgis::*;

mod rows;
pub use rows::*;

mod sqlite;
pub use sqlite::*;

use crate::SourceSelector;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RasterStore: Send + Sync {
	/// A short description of the backend for log messages.
	fn name(&self) -> String;

	/// Number of rows matched by the selector.
	async fn count_rows(&self, selector: &SourceSelector) -> Result<u64>;

	/// Extent, srid and maximum band count, one entry per distinct srid.
	async fn coverage_summary(&self, selector: &SourceSelector) -> Result<Vec<CoverageSummary>>;

	/// Geometry of one matching row.
	async fn representative_geometry(&self, selector: &SourceSelector) -> Result<Option<TileGeometry>>;

	/// One entry per band of one matching row.
	async fn band_metadata(&self, selector: &SourceSelector) -> Result<Vec<BandMetadataRow>>;

	/// Union extent of all matching rows as WKT, tagged with `srid`.
	async fn union_extent_wkt(&self, selector: &SourceSelector, srid: i32) -> Result<Option<String>>;

	/// A primary key or unique column of the table.
	async fn primary_key_column(&self, selector: &SourceSelector) -> Result<Option<String>>;

	/// A column filled from a sequence.
	async fn sequence_column(&self, selector: &SourceSelector) -> Result<Option<String>>;

	/// Values of `column` for all matching rows, as text.
	async fn row_identifiers(&self, selector: &SourceSelector, column: &str) -> Result<Vec<String>>;

	/// Upper left corners of all matching rows.
	async fn row_upper_lefts(&self, selector: &SourceSelector) -> Result<Vec<(f64, f64)>>;

	/// An SQL condition matching exactly the row described by `identity`.
	fn identity_predicate(&self, selector: &SourceSelector, identity: &RowIdentity) -> String;

	/// Matching rows whose raster intersects `footprint`, sorted by `order`.
	async fn intersecting_tiles(
		&self,
		selector: &SourceSelector,
		footprint: &Footprint,
		order: TileOrder,
	) -> Result<Vec<TileRow>>;

	/// WKT definition of a spatial reference id.
	async fn spatial_ref_text(&self, srid: i32) -> Result<Option<String>>;
}

/// Renders a row identifier value as an SQL literal: integers stay bare, anything else
/// is quoted.
pub(crate) fn identifier_literal(value: &str) -> String {
	if value.parse::<i64>().is_ok() {
		value.to_string()
	} else {
		crate::quote_literal(value)
	}
}
