//! An open raster: resolved geometry, a block cache and the engine filling it.

use crate::{
	BlockFetchEngine, CoverageDescriptor, CoverageResolver, FetchContext, FetchOutcome, FetchRequest, RasterStore,
	SourceSelector, SubdatasetEntry,
};
use anyhow::{Result, ensure};
use pgraster_core::{
	cache::{BlockCache, BlockKey, InMemoryBlockCache},
	config::RasterConfig,
	types::{BandDataType, BandDescriptor, BufferSize, PixelBuffer, PixelWindow},
};
use pgraster_derive::context;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A raster handle over the rows matched by one [`SourceSelector`].
///
/// Geometry and band layout are resolved once in [`RasterDataset::open`] and never change.
/// Blocks are fetched lazily and stay cached until the handle is dropped.
pub struct RasterDataset {
	store: Arc<dyn RasterStore>,
	selector: SourceSelector,
	coverage: CoverageDescriptor,
	bands: Vec<BandDescriptor>,
	subdatasets: Vec<SubdatasetEntry>,
	engine: BlockFetchEngine,
	cache: InMemoryBlockCache,
	projection: OnceCell<String>,
}

impl RasterDataset {
	#[context("opening raster {selector}")]
	pub async fn open(store: Arc<dyn RasterStore>, selector: &SourceSelector, config: &RasterConfig) -> Result<RasterDataset> {
		let resolved = CoverageResolver::new(store.as_ref()).resolve(selector).await?;
		let coverage = resolved.coverage;
		Ok(RasterDataset {
			cache: InMemoryBlockCache::new(coverage.block_width, coverage.block_height),
			engine: BlockFetchEngine::new(&config.fetch),
			selector: selector.clone(),
			bands: resolved.bands,
			subdatasets: resolved.subdatasets,
			projection: OnceCell::new(),
			coverage,
			store,
		})
	}

	pub fn coverage(&self) -> &CoverageDescriptor {
		&self.coverage
	}

	pub fn bands(&self) -> &[BandDescriptor] {
		&self.bands
	}

	pub fn selector(&self) -> &SourceSelector {
		&self.selector
	}

	/// The rows of the table when it is opened one raster per row.
	pub fn subdatasets(&self) -> &[SubdatasetEntry] {
		&self.subdatasets
	}

	/// GDAL ordered affine coefficients.
	pub fn geo_transform(&self) -> [f64; 6] {
		self.coverage.geo_transform().to_gdal()
	}

	pub fn engine(&self) -> &BlockFetchEngine {
		&self.engine
	}

	pub fn cache(&self) -> &dyn BlockCache {
		&self.cache
	}

	/// WKT of the raster's spatial reference, or an empty string for local srids.
	/// Looked up once.
	pub async fn projection_ref(&self) -> Result<String> {
		let projection = self.projection.get_or_try_init(|| self.lookup_projection()).await?;
		Ok(projection.clone())
	}

	async fn lookup_projection(&self) -> Result<String> {
		if self.coverage.is_local_srid() {
			return Ok(String::new());
		}
		Ok(match self.store.spatial_ref_text(self.coverage.srid).await? {
			Some(text) => text,
			None => {
				log::debug!("no spatial reference text for srid {}", self.coverage.srid);
				String::new()
			}
		})
	}

	/// Reads `window` of the given 1-based `bands` into buffers of `buffer` size and
	/// `buffer_type`, one per band.
	///
	/// Buffers of the window's size are filled from the block cache. Other sizes sample the
	/// window by nearest neighbour.
	#[context("reading {window} of {}", self.selector)]
	pub async fn read(
		&mut self,
		window: &PixelWindow,
		buffer: BufferSize,
		buffer_type: BandDataType,
		bands: &[usize],
	) -> Result<Vec<PixelBuffer>> {
		ensure!(
			!self.coverage.is_empty(),
			"the raster has no pixels, open one of its {} subdatasets instead",
			self.subdatasets.len()
		);
		window.ensure_within(self.coverage.raster_width, self.coverage.raster_height)?;
		ensure!(buffer.width > 0 && buffer.height > 0, "buffer size must not be zero");
		for &band in bands {
			ensure!(
				(1..=self.bands.len()).contains(&band),
				"band {band} requested, but the raster has {} bands",
				self.bands.len()
			);
		}

		let request = FetchRequest::read(*window, bands).with_buffer(buffer);
		let ctx = FetchContext {
			store: self.store.as_ref(),
			selector: &self.selector,
			coverage: &self.coverage,
			bands: &self.bands,
		};
		let outcome = self.engine.fetch_and_cache(&ctx, &request, &mut self.cache).await?;
		if let FetchOutcome::Delegate(reason) = &outcome {
			log::trace!("per-block path for {window}: {reason}");
		}
		self.engine.fill_missing(&ctx, &request, &mut self.cache).await?;

		bands
			.iter()
			.map(|&band| {
				let pixels = self.assemble(band, window)?.convert(buffer_type);
				Ok(pixels.resample_nearest(buffer.width, buffer.height))
			})
			.collect()
	}

	/// Copies the cached blocks under `window` into one buffer of the band's type.
	/// Blocks that are not cached read as zero.
	fn assemble(&self, band: usize, window: &PixelWindow) -> Result<PixelBuffer> {
		let data_type = self.bands[band - 1].data_type;
		let (block_width, block_height) = (self.coverage.block_width, self.coverage.block_height);
		let mut pixels = PixelBuffer::zeroed(data_type, window.width, window.height);
		for (_, col, row) in window.block_range(block_width, block_height).iter() {
			let Some(block) = self.cache.get(&BlockKey::new(band, col, row)) else {
				continue;
			};
			let x = i64::from(col) * i64::from(block_width) - i64::from(window.x_off);
			let y = i64::from(row) * i64::from(block_height) - i64::from(window.y_off);
			pixels.paste(block, x, y)?;
		}
		Ok(pixels)
	}
}

impl std::fmt::Debug for RasterDataset {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RasterDataset")
			.field("store", &self.store.name())
			.field("selector", &self.selector)
			.field("coverage", &self.coverage)
			.field("bands", &self.bands.len())
			.field("cached_blocks", &self.cache.len())
			.finish()
	}
}
