use anyhow::Result;
use assert_fs::NamedTempFile;
use pgraster::{testing::*, *};
use pretty_assertions::assert_eq;
use std::{path::Path, sync::Arc};

fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

async fn open_grid(config: &RasterConfig) -> Result<(NamedTempFile, Arc<CountingStore>, RasterDataset)> {
	init_logger();
	let file = NamedTempFile::new("grid.sqlite")?;
	write_grid_catalog(file.path(), 4326)?;
	let store = Arc::new(CountingStore::new(Arc::new(SqliteStore::open_path(
		file.path(),
		&config.store,
	)?)));
	let selector = grid_selector().with_mode(RasterMode::PerTable);
	let dataset = RasterDataset::open(store.clone(), &selector, config).await?;
	store.reset();
	Ok((file, store, dataset))
}

fn expected_window(window: &PixelWindow) -> Vec<f64> {
	let mut values = Vec::new();
	for y in window.y_off..window.y_off + window.height {
		for x in window.x_off..window.x_off + window.width {
			values.push(grid_value(x / 256, y / 256, x % 256, y % 256));
		}
	}
	values
}

fn values(buffer: &PixelBuffer) -> Vec<f64> {
	(0..buffer.len()).map(|i| buffer.get(i)).collect()
}

#[tokio::test]
async fn reads_across_block_borders() -> Result<()> {
	let (_file, store, mut dataset) = open_grid(&RasterConfig::default()).await?;
	let window = PixelWindow::new(250, 245, 12, 20);

	let bands = dataset
		.read(&window, BufferSize::from(&window), BandDataType::Float32, &[1])
		.await?;

	assert_eq!(bands.len(), 1);
	assert_eq!(bands[0].data_type(), BandDataType::Float32);
	assert_eq!((bands[0].width(), bands[0].height()), (12, 20));
	assert_eq!(values(&bands[0]), expected_window(&window));
	assert_eq!(store.calls(), vec!["intersecting_tiles"]);
	assert_eq!(dataset.engine().state(), FetchState::Cached);
	Ok(())
}

#[tokio::test]
async fn repeated_reads_are_served_from_the_cache() -> Result<()> {
	let (_file, store, mut dataset) = open_grid(&RasterConfig::default()).await?;
	let window = PixelWindow::new(0, 0, 512, 512);

	let first = dataset
		.read(&window, BufferSize::from(&window), BandDataType::UInt16, &[1])
		.await?;
	store.reset();
	let second = dataset
		.read(&window, BufferSize::from(&window), BandDataType::UInt16, &[1])
		.await?;

	assert!(store.calls().is_empty());
	assert_eq!(first, second);
	assert_eq!(dataset.cache().len(), 4);
	Ok(())
}

#[tokio::test]
async fn smaller_buffers_sample_the_window() -> Result<()> {
	let (_file, store, mut dataset) = open_grid(&RasterConfig::default()).await?;
	let window = PixelWindow::new(0, 0, 512, 512);

	let bands = dataset
		.read(&window, BufferSize::new(256, 256), BandDataType::UInt16, &[1])
		.await?;

	assert_eq!(dataset.engine().state(), FetchState::Uncached);
	assert_eq!(store.count("intersecting_tiles"), 4);
	let band = &bands[0];
	assert_eq!((band.width(), band.height()), (256, 256));
	assert_eq!(band.get_xy(0, 0), grid_value(0, 0, 1, 1));
	assert_eq!(band.get_xy(200, 10), grid_value(1, 0, 145, 21));
	Ok(())
}

#[tokio::test]
async fn disabled_batching_reads_block_by_block() -> Result<()> {
	let config = RasterConfig::from_string("fetch:\n  batch: false\n")?;
	let (_file, store, mut dataset) = open_grid(&config).await?;
	let window = PixelWindow::new(100, 100, 300, 300);

	let bands = dataset
		.read(&window, BufferSize::from(&window), BandDataType::UInt16, &[1])
		.await?;

	assert_eq!(values(&bands[0]), expected_window(&window));
	assert_eq!(store.count("intersecting_tiles"), 4);
	assert_eq!(dataset.engine().state(), FetchState::Uncached);
	Ok(())
}

#[tokio::test]
async fn narrow_buffer_types_clamp() -> Result<()> {
	let (_file, _store, mut dataset) = open_grid(&RasterConfig::default()).await?;
	let window = PixelWindow::new(0, 0, 512, 512);
	let bands = dataset
		.read(&window, BufferSize::from(&window), BandDataType::Byte, &[1])
		.await?;
	assert_eq!(bands[0].get_xy(5, 0), 5.0);
	assert_eq!(bands[0].get_xy(300, 0), 255.0);
	Ok(())
}

#[tokio::test]
async fn rejects_bad_requests() -> Result<()> {
	let (_file, store, mut dataset) = open_grid(&RasterConfig::default()).await?;

	let outside = PixelWindow::new(500, 0, 20, 20);
	let err = dataset
		.read(&outside, BufferSize::from(&outside), BandDataType::UInt16, &[1])
		.await
		.unwrap_err();
	assert!(format!("{err:#}").contains("exceeds raster size 512x512"), "{err:#}");

	let window = PixelWindow::new(0, 0, 10, 10);
	let err = dataset
		.read(&window, BufferSize::from(&window), BandDataType::UInt16, &[2])
		.await
		.unwrap_err();
	assert!(format!("{err:#}").contains("band 2 requested"), "{err:#}");
	assert!(store.calls().is_empty());
	Ok(())
}

#[tokio::test]
async fn projection_is_looked_up_once() -> Result<()> {
	let (_file, store, dataset) = open_grid(&RasterConfig::default()).await?;
	assert_eq!(dataset.projection_ref().await?, WGS84_SRTEXT);
	assert_eq!(dataset.projection_ref().await?, WGS84_SRTEXT);
	assert_eq!(store.count("spatial_ref_text"), 1);
	assert_eq!(dataset.geo_transform(), [0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);
	Ok(())
}

#[tokio::test]
async fn local_srids_have_no_projection() -> Result<()> {
	let file = NamedTempFile::new("local.sqlite")?;
	write_grid_catalog(file.path(), 0)?;
	let store = Arc::new(CountingStore::new(Arc::new(SqliteStore::open_path(
		file.path(),
		&StoreConfig::default(),
	)?)));
	let selector = grid_selector().with_predicate("rid = 1");
	let dataset = RasterDataset::open(store.clone(), &selector, &RasterConfig::default()).await?;
	store.reset();
	assert_eq!(dataset.projection_ref().await?, "");
	assert!(store.calls().is_empty());
	Ok(())
}

#[tokio::test]
async fn per_row_tables_list_subdatasets() -> Result<()> {
	init_logger();
	let file = NamedTempFile::new("grid.sqlite")?;
	write_grid_catalog(file.path(), 4326)?;
	let store: Arc<dyn RasterStore> = Arc::new(SqliteStore::open_path(file.path(), &StoreConfig::default())?);
	let config = RasterConfig::default();

	let mut umbrella = RasterDataset::open(store.clone(), &grid_selector(), &config).await?;
	assert_eq!(umbrella.subdatasets().len(), 4);
	assert_eq!(umbrella.coverage().raster_width, 0);
	let window = PixelWindow::new(0, 0, 1, 1);
	assert!(
		umbrella
			.read(&window, BufferSize::from(&window), BandDataType::Byte, &[1])
			.await
			.is_err()
	);

	let entry = &umbrella.subdatasets()[3];
	assert_eq!(entry.description, "PostGIS Raster at main.grid (rast), rid = 4");
	let mut row = RasterDataset::open(store, &entry.selector, &config).await?;
	assert_eq!(row.geo_transform(), [256.0, 1.0, 0.0, -256.0, 0.0, -1.0]);
	let window = PixelWindow::new(0, 0, 256, 256);
	let bands = row
		.read(&window, BufferSize::from(&window), BandDataType::UInt16, &[1])
		.await?;
	assert_eq!(bands[0].get_xy(12, 34), grid_value(1, 1, 12, 34));
	Ok(())
}

#[tokio::test]
async fn config_file_drives_the_selector() -> Result<()> {
	let config = RasterConfig::from_path(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../testdata/pgraster.yml"))?;
	assert_eq!(config.mode, RasterMode::PerTable);
	let selector = SourceSelector::from_config(&config, "elevation");
	assert_eq!(selector.to_string(), "schema=public table=elevation column=rast mode=2");
	assert!(!config.fetch.batch);
	Ok(())
}
