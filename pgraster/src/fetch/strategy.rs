//! The two ways of filling the block cache.
//!
//! [`BatchSpatialFetch`] issues one spatial query for a whole window and maps the ordered
//! tiles onto the window's block grid by position. [`SingleBlockFetch`] issues one query
//! per absent block and places the first tile found by its georeferenced origin.

use super::{DelegateReason, FetchContext, FetchOutcome, FetchRequest};
use crate::{CoverageDescriptor, TileRow};
use anyhow::Result;
use async_trait::async_trait;
use geo::{BoundingRect, Rect};
use itertools::Itertools;
use pgraster_core::{
	cache::{BlockCache, BlockKey},
	payload::RasterPayload,
	types::{BandDescriptor, PixelBuffer, PixelWindow},
};

#[async_trait]
pub trait BlockFetchStrategy: Send + Sync {
	fn name(&self) -> &'static str;

	/// Installs blocks covering `request` into `cache`.
	async fn fetch(
		&self,
		ctx: &FetchContext<'_>,
		request: &FetchRequest,
		cache: &mut dyn BlockCache,
	) -> Result<FetchOutcome>;
}

pub struct BatchSpatialFetch;

#[async_trait]
impl BlockFetchStrategy for BatchSpatialFetch {
	fn name(&self) -> &'static str {
		"batch spatial fetch"
	}

	async fn fetch(
		&self,
		ctx: &FetchContext<'_>,
		request: &FetchRequest,
		cache: &mut dyn BlockCache,
	) -> Result<FetchOutcome> {
		let coverage = ctx.coverage;
		let tiles = match query_tiles(ctx, &request.window).await {
			Ok(tiles) => tiles,
			Err(err) => {
				log::warn!("batch query for {} failed, delegating: {err:#}", request.window);
				return Ok(FetchOutcome::Delegate(DelegateReason::QueryFailed(format!("{err:#}"))));
			}
		};
		if tiles.is_empty() {
			return Ok(FetchOutcome::Delegate(DelegateReason::NoTiles));
		}

		let range = request.window.block_range(coverage.block_width, coverage.block_height);
		if tiles.len() > range.len() {
			log::warn!(
				"{} tiles intersect {}, but it spans only {} blocks",
				tiles.len(),
				request.window,
				range.len()
			);
		}

		let payloads: Vec<Option<RasterPayload>> = tiles.iter().map(decode_or_skip).collect();
		let positions: Vec<(usize, u32, u32)> = range.iter().collect();

		let mut installed = Vec::new();
		for &band in &request.bands {
			let descriptor = ctx.band(band)?;
			for (index, payload) in payloads.iter().enumerate() {
				let Some(&(_, col, row)) = positions.get(index) else {
					log::warn!("tuple {index} has no block in {}, skipping it", request.window);
					continue;
				};
				let Some(payload) = payload else {
					continue;
				};
				let key = BlockKey::new(band, col, row);
				log::trace!("tuple {index} -> {key}");
				match block_from_tile(payload, band, descriptor, coverage, (0, 0)) {
					Ok(block) => {
						cache.insert(key, block)?;
						installed.push(key);
					}
					Err(err) => log::warn!("skipping {key}: {err:#}"),
				}
			}
		}
		Ok(FetchOutcome::Cached(sorted(installed)))
	}
}

pub struct SingleBlockFetch;

impl SingleBlockFetch {
	/// Queries the tiles of one block and installs the first. Blocks without any tile
	/// are installed as zeros. Returns whether a tile was found.
	pub async fn fetch_block(&self, ctx: &FetchContext<'_>, key: BlockKey, cache: &mut dyn BlockCache) -> Result<bool> {
		let coverage = ctx.coverage;
		let descriptor = ctx.band(key.band)?;
		let window = ctx.block_window(&key);
		let tiles = query_tiles(ctx, &window).await?;

		let block = match tiles.first() {
			Some(tile) => {
				let (col, row) = coverage.pixel_of(geo::coord! { x: tile.origin_x, y: tile.origin_y });
				let offset = (
					col.round() as i64 - i64::from(window.x_off),
					row.round() as i64 - i64::from(window.y_off),
				);
				match decode_or_skip(tile).map(|payload| block_from_tile(&payload, key.band, descriptor, coverage, offset)) {
					Some(Ok(block)) => Some(block),
					Some(Err(err)) => {
						log::warn!("skipping {key}: {err:#}");
						None
					}
					None => None,
				}
			}
			None => None,
		};

		let found = block.is_some();
		let block = block.unwrap_or_else(|| PixelBuffer::zeroed(descriptor.data_type, window.width, window.height));
		cache.insert(key, block)?;
		Ok(found)
	}
}

#[async_trait]
impl BlockFetchStrategy for SingleBlockFetch {
	fn name(&self) -> &'static str {
		"single block fetch"
	}

	/// Fetches every block of the request that the cache does not hold yet.
	async fn fetch(
		&self,
		ctx: &FetchContext<'_>,
		request: &FetchRequest,
		cache: &mut dyn BlockCache,
	) -> Result<FetchOutcome> {
		let range = request
			.window
			.block_range(ctx.coverage.block_width, ctx.coverage.block_height);
		let mut installed = Vec::new();
		for &band in &request.bands {
			for (_, col, row) in range.iter() {
				let key = BlockKey::new(band, col, row);
				if cache.contains(&key) {
					continue;
				}
				self.fetch_block(ctx, key, cache).await?;
				installed.push(key);
			}
		}
		Ok(FetchOutcome::Cached(sorted(installed)))
	}
}

/// Tiles with a non-zero overlap with `window`, in grid order.
async fn query_tiles(ctx: &FetchContext<'_>, window: &PixelWindow) -> Result<Vec<TileRow>> {
	let footprint = ctx.coverage.footprint(window);
	let area = footprint.polygon.bounding_rect();
	let tiles = ctx
		.store
		.intersecting_tiles(ctx.selector, &footprint, ctx.coverage.tile_order())
		.await?;
	let count = tiles.len();
	let tiles: Vec<TileRow> = tiles
		.into_iter()
		.filter(|tile| area.is_some_and(|area| overlaps(&tile.bounds(), &area)))
		.collect();
	if tiles.len() < count {
		log::trace!("discarded {} tiles touching {window} without overlap", count - tiles.len());
	}
	Ok(tiles)
}

fn overlaps(a: &Rect<f64>, b: &Rect<f64>) -> bool {
	let width = a.max().x.min(b.max().x) - a.min().x.max(b.min().x);
	let height = a.max().y.min(b.max().y) - a.min().y.max(b.min().y);
	width > 0.0 && height > 0.0
}

fn decode_or_skip(tile: &TileRow) -> Option<RasterPayload> {
	match RasterPayload::decode(&tile.payload) {
		Ok(payload) => Some(payload),
		Err(err) => {
			log::warn!("skipping tile at ({}, {}): {err:#}", tile.origin_x, tile.origin_y);
			None
		}
	}
}

/// A block of the coverage's block size holding one band of `payload`, placed at
/// `offset` pixels from the block's upper left corner.
fn block_from_tile(
	payload: &RasterPayload,
	band: usize,
	descriptor: &BandDescriptor,
	coverage: &CoverageDescriptor,
	offset: (i64, i64),
) -> Result<PixelBuffer> {
	let source = payload.band_buffer(band)?;
	let source = if source.data_type() == descriptor.data_type {
		source
	} else {
		log::trace!("converting band {band} from {} to {}", source.data_type(), descriptor.data_type);
		source.convert(descriptor.data_type)
	};
	let mut block = PixelBuffer::zeroed(descriptor.data_type, coverage.block_width, coverage.block_height);
	block.paste(&source, offset.0, offset.1)?;
	Ok(block)
}

fn sorted(keys: Vec<BlockKey>) -> Vec<BlockKey> {
	keys.into_iter().sorted_by_key(|k| (k.band, k.row, k.col)).collect()
}
