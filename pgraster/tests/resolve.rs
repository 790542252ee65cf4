use anyhow::Result;
use approx::assert_relative_eq;
use assert_fs::NamedTempFile;
use pgraster::{testing::*, *};
use pretty_assertions::assert_eq;
use r2d2_sqlite::rusqlite::Connection;
use rstest::rstest;
use std::sync::Arc;

fn grid_store(srid: i32) -> Result<(NamedTempFile, SqliteStore)> {
	let file = NamedTempFile::new("grid.sqlite")?;
	write_grid_catalog(file.path(), srid)?;
	let store = SqliteStore::open_path(file.path(), &StoreConfig::default())?;
	Ok((file, store))
}

fn resolve_error(err: &anyhow::Error) -> Option<&ResolveError> {
	err.downcast_ref::<ResolveError>()
}

#[tokio::test]
async fn single_row_takes_the_tile_size() -> Result<()> {
	let (_file, store) = grid_store(4326)?;
	let selector = grid_selector().with_predicate("rid = 2");
	let resolved = CoverageResolver::new(&store).resolve(&selector).await?;

	let coverage = resolved.coverage;
	assert_eq!((coverage.raster_width, coverage.raster_height), (256, 256));
	assert_eq!((coverage.block_width, coverage.block_height), (256, 256));
	assert_eq!((coverage.origin_x, coverage.origin_y), (256.0, 0.0));
	assert_eq!(coverage.srid, 4326);
	assert_eq!(resolved.bands, vec![BandDescriptor::from_pixel_type(PixelType::UInt16)]);
	assert!(resolved.subdatasets.is_empty());
	Ok(())
}

#[tokio::test]
async fn whole_table_spans_the_union_extent() -> Result<()> {
	let (_file, store) = grid_store(4326)?;
	let selector = grid_selector().with_mode(RasterMode::PerTable);
	let coverage = CoverageResolver::new(&store).resolve(&selector).await?.coverage;

	assert_eq!((coverage.raster_width, coverage.raster_height), (512, 512));
	assert_eq!(coverage.band_count, 1);
	assert_eq!(coverage.geo_transform().to_gdal(), [0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);
	assert_relative_eq!(coverage.pixel_size_y, -1.0);
	assert!(!coverage.is_local_srid());
	Ok(())
}

#[tokio::test]
async fn zero_rows_fail_with_an_empty_result() -> Result<()> {
	let (_file, store) = grid_store(4326)?;
	let selector = grid_selector().with_predicate("rid > 100");
	let err = CoverageResolver::new(&store).resolve(&selector).await.unwrap_err();
	assert_eq!(
		resolve_error(&err),
		Some(&ResolveError::EmptyResult {
			query: "row count",
			selector: selector.to_string(),
		})
	);
	Ok(())
}

#[tokio::test]
async fn rows_become_subdatasets_by_primary_key() -> Result<()> {
	let (_file, store) = grid_store(4326)?;
	let selector = grid_selector().with_predicate("rid <= 2");
	let resolved = CoverageResolver::new(&store).resolve(&selector).await?;

	assert!(resolved.coverage.is_empty());
	assert_eq!(resolved.coverage.band_count, 1);
	assert_eq!(resolved.bands, vec![BandDescriptor::from_pixel_type(PixelType::UInt16)]);
	let names: Vec<&str> = resolved.subdatasets.iter().map(|s| s.name.as_str()).collect();
	assert_eq!(
		names,
		vec![
			"schema=main table=grid column=rast where='rid <= 2 AND \"rid\" = 1'",
			"schema=main table=grid column=rast where='rid <= 2 AND \"rid\" = 2'",
		]
	);
	assert_eq!(
		resolved.subdatasets[1].description,
		"PostGIS Raster at main.grid (rast), rid = 2"
	);

	let row = CoverageResolver::new(&store)
		.resolve(&resolved.subdatasets[1].selector)
		.await?;
	assert_eq!((row.coverage.origin_x, row.coverage.raster_width), (256.0, 256));
	Ok(())
}

#[tokio::test]
async fn rows_without_key_are_identified_by_upper_left() -> Result<()> {
	let (file, store) = grid_store(4326)?;
	Connection::open(file.path())?.execute_batch("CREATE VIEW tiles AS SELECT * FROM grid")?;
	let selector = SourceSelector::new("main", "tiles", "rast");
	let resolved = CoverageResolver::new(&store).resolve(&selector).await?;

	assert_eq!(resolved.subdatasets.len(), 4);
	let last = &resolved.subdatasets[3];
	assert_eq!(last.description, "PostGIS Raster at main.tiles (rast), UpperLeft = 256, -256");
	assert_eq!(
		last.selector.predicate.as_deref(),
		Some("upperleftx = 256 AND upperlefty = -256")
	);
	assert_eq!(store.count_rows(&last.selector).await?, 1);
	Ok(())
}

#[tokio::test]
async fn mixed_srids_are_rejected() -> Result<()> {
	let file = NamedTempFile::new("mixed.sqlite")?;
	let writer = SqliteCatalogWriter::create(file.path(), "grid", "rast")?;
	writer.insert_tile(&grid_tile(0, 0, 4326)?)?;
	writer.insert_tile(&grid_tile(1, 0, 3857)?)?;
	let store = SqliteStore::open_path(file.path(), &StoreConfig::default())?;

	let selector = grid_selector().with_mode(RasterMode::PerTable);
	let err = CoverageResolver::new(&store).resolve(&selector).await.unwrap_err();
	assert_eq!(
		resolve_error(&err),
		Some(&ResolveError::InconsistentSrid { srids: vec![3857, 4326] })
	);
	Ok(())
}

#[tokio::test]
async fn query_failures_abort_resolution() -> Result<()> {
	let (_file, store) = grid_store(4326)?;
	let store = CountingStore::new(Arc::new(store)).failing("union_extent_wkt");
	let selector = grid_selector().with_mode(RasterMode::PerTable);
	let err = CoverageResolver::new(&store).resolve(&selector).await.unwrap_err();
	assert!(format!("{err:#}").contains("union_extent_wkt failed on purpose"), "{err:#}");
	assert_eq!(
		store.calls(),
		vec![
			"count_rows",
			"coverage_summary",
			"representative_geometry",
			"union_extent_wkt"
		]
	);
	Ok(())
}

#[tokio::test]
async fn per_row_umbrella_resolves_bands() -> Result<()> {
	let (_file, store) = grid_store(4326)?;
	let store = CountingStore::new(Arc::new(store));
	let resolved = CoverageResolver::new(&store).resolve(&grid_selector()).await?;

	assert_eq!(resolved.subdatasets.len(), 4);
	assert_eq!(resolved.bands, vec![BandDescriptor::from_pixel_type(PixelType::UInt16)]);
	assert_eq!(store.count("band_metadata"), 1);
	Ok(())
}

#[rstest]
#[case::single_row(grid_selector().with_predicate("rid = 1"))]
#[case::per_row(grid_selector())]
#[case::per_table(grid_selector().with_mode(RasterMode::PerTable))]
#[tokio::test]
async fn missing_band_metadata_aborts_resolution(#[case] selector: SourceSelector) -> Result<()> {
	let (_file, store) = grid_store(4326)?;
	let store = CountingStore::new(Arc::new(store)).without_band_metadata();
	let err = CoverageResolver::new(&store).resolve(&selector).await.unwrap_err();
	assert_eq!(
		resolve_error(&err),
		Some(&ResolveError::EmptyResult {
			query: "band metadata",
			selector: selector.to_string(),
		})
	);
	Ok(())
}
