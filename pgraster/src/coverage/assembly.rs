//! How the rows matched by a selector are turned into rasters.
//!
//! - [`SingleRaster`]: one row, or the whole table, taking its size from one tile.
//! - [`RasterPerRow`]: every row becomes its own subdataset; the umbrella has no pixels.
//! - [`RasterPerTable`]: all rows form one raster spanning their union extent.

use super::{CoverageDescriptor, SubdatasetEntry};
use crate::{CoverageSummary, RasterStore, ResolveError, RowIdentity, SourceSelector, TileGeometry};
use anyhow::Result;
use async_trait::async_trait;
use geo::{BoundingRect, Geometry};
use pgraster_core::types::RasterMode;
use std::str::FromStr;
use wkt::Wkt;

/// Geometry and subdatasets produced by one [`CoverageAssembly`].
#[derive(Clone, Debug, PartialEq)]
pub struct Assembly {
	pub coverage: CoverageDescriptor,
	pub subdatasets: Vec<SubdatasetEntry>,
}

#[async_trait]
pub trait CoverageAssembly: Send + Sync {
	fn name(&self) -> &'static str;

	async fn assemble(&self, store: &dyn RasterStore, selector: &SourceSelector) -> Result<Assembly>;
}

/// Picks the assembly for `row_count` rows in `mode`.
pub fn choose_assembly(mode: RasterMode, row_count: u64) -> Box<dyn CoverageAssembly> {
	match (row_count, mode) {
		(0 | 1, _) => Box::new(SingleRaster),
		(_, RasterMode::PerRow) => Box::new(RasterPerRow),
		(_, RasterMode::PerTable) => Box::new(RasterPerTable),
	}
}

pub struct SingleRaster;

#[async_trait]
impl CoverageAssembly for SingleRaster {
	fn name(&self) -> &'static str {
		"single raster"
	}

	async fn assemble(&self, store: &dyn RasterStore, selector: &SourceSelector) -> Result<Assembly> {
		let summary = summarize(store, selector).await?;
		let geometry = representative(store, selector).await?;
		let coverage = descriptor(&summary, &geometry, geometry.width, geometry.height)?;
		Ok(Assembly {
			coverage,
			subdatasets: Vec::new(),
		})
	}
}

pub struct RasterPerTable;

#[async_trait]
impl CoverageAssembly for RasterPerTable {
	fn name(&self) -> &'static str {
		"raster per table"
	}

	async fn assemble(&self, store: &dyn RasterStore, selector: &SourceSelector) -> Result<Assembly> {
		let summary = summarize(store, selector).await?;
		let geometry = representative(store, selector).await?;

		let Some(text) = store.union_extent_wkt(selector, summary.srid).await? else {
			return Err(ResolveError::EmptyResult {
				query: "union extent",
				selector: selector.to_string(),
			}
			.into());
		};
		let (span_x, span_y) = extent_span(&text)?;
		let width = pixels(span_x, geometry.scale_x)?;
		let height = pixels(span_y, geometry.scale_y)?;
		log::debug!("union extent {span_x} x {span_y} gives {width}x{height} pixels");

		let coverage = descriptor(&summary, &geometry, width, height)?;
		Ok(Assembly {
			coverage,
			subdatasets: Vec::new(),
		})
	}
}

pub struct RasterPerRow;

#[async_trait]
impl CoverageAssembly for RasterPerRow {
	fn name(&self) -> &'static str {
		"raster per row"
	}

	async fn assemble(&self, store: &dyn RasterStore, selector: &SourceSelector) -> Result<Assembly> {
		let identities = row_identities(store, selector).await?;
		let subdatasets = identities
			.iter()
			.map(|identity| {
				let row = selector.and_predicate(&store.identity_predicate(selector, identity));
				SubdatasetEntry {
					name: row.to_string(),
					description: format!(
						"PostGIS Raster at {}.{} ({}), {identity}",
						selector.schema, selector.table, selector.column
					),
					selector: row,
				}
			})
			.collect();
		Ok(Assembly {
			coverage: CoverageDescriptor::empty(),
			subdatasets,
		})
	}
}

/// Identifiers of all matched rows: a key column if there is one, a sequence column
/// next, the upper left corner last.
async fn row_identities(store: &dyn RasterStore, selector: &SourceSelector) -> Result<Vec<RowIdentity>> {
	let column = match store.primary_key_column(selector).await? {
		Some(column) => Some(column),
		None => store.sequence_column(selector).await?,
	};
	Ok(match column {
		Some(column) => {
			log::debug!("identifying rows by column '{column}'");
			store
				.row_identifiers(selector, &column)
				.await?
				.into_iter()
				.map(|value| RowIdentity::Column {
					column: column.clone(),
					value,
				})
				.collect()
		}
		None => {
			log::debug!("identifying rows by their upper left corner");
			store
				.row_upper_lefts(selector)
				.await?
				.into_iter()
				.map(|(x, y)| RowIdentity::UpperLeft { x, y })
				.collect()
		}
	})
}

async fn summarize(store: &dyn RasterStore, selector: &SourceSelector) -> Result<CoverageSummary> {
	let mut summaries = store.coverage_summary(selector).await?;
	match summaries.len() {
		0 => Err(ResolveError::EmptyResult {
			query: "coverage summary",
			selector: selector.to_string(),
		}
		.into()),
		1 => Ok(summaries.remove(0)),
		_ => Err(ResolveError::InconsistentSrid {
			srids: summaries.iter().map(|s| s.srid).collect(),
		}
		.into()),
	}
}

async fn representative(store: &dyn RasterStore, selector: &SourceSelector) -> Result<TileGeometry> {
	match store.representative_geometry(selector).await? {
		Some(geometry) => Ok(geometry),
		None => Err(ResolveError::EmptyResult {
			query: "representative tile",
			selector: selector.to_string(),
		}
		.into()),
	}
}

fn descriptor(summary: &CoverageSummary, geometry: &TileGeometry, width: u32, height: u32) -> Result<CoverageDescriptor> {
	if geometry.scale_x == 0.0 || geometry.scale_y == 0.0 {
		return Err(ResolveError::InvalidGeometry {
			reason: format!("pixel size {} x {}", geometry.scale_x, geometry.scale_y),
		}
		.into());
	}
	if geometry.width == 0 || geometry.height == 0 {
		return Err(ResolveError::InvalidGeometry {
			reason: format!("tile size {}x{}", geometry.width, geometry.height),
		}
		.into());
	}
	let origin_y = if geometry.scale_y < 0.0 {
		summary.max_y
	} else {
		summary.min_y
	};
	Ok(CoverageDescriptor {
		origin_x: summary.min_x,
		origin_y,
		pixel_size_x: geometry.scale_x,
		pixel_size_y: geometry.scale_y,
		skew_x: geometry.skew_x,
		skew_y: geometry.skew_y,
		srid: summary.srid,
		raster_width: width,
		raster_height: height,
		block_width: geometry.width,
		block_height: geometry.height,
		band_count: summary.band_count,
	})
}

/// Width and height of the bounding box of a WKT geometry.
fn extent_span(text: &str) -> Result<(f64, f64)> {
	let unparseable = |reason: String| ResolveError::UnparseableExtent {
		text: text.to_string(),
		reason,
	};
	let wkt = Wkt::<f64>::from_str(text).map_err(|e| unparseable(e.to_string()))?;
	let geometry = Geometry::<f64>::try_from(wkt).map_err(|e| unparseable(e.to_string()))?;
	let Some(rect) = geometry.bounding_rect() else {
		return Err(unparseable("the geometry is empty".to_string()).into());
	};
	Ok((rect.width(), rect.height()))
}

/// `round(|span / pixel_size|)`
fn pixels(span: f64, pixel_size: f64) -> Result<u32> {
	if pixel_size == 0.0 || !pixel_size.is_finite() {
		return Err(ResolveError::InvalidGeometry {
			reason: format!("pixel size {pixel_size}"),
		}
		.into());
	}
	let count = (span / pixel_size).abs().round();
	if count > f64::from(u32::MAX) {
		return Err(ResolveError::InvalidGeometry {
			reason: format!("{count} pixels do not fit a raster"),
		}
		.into());
	}
	Ok(count as u32)
}
