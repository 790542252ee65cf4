use super::{
	AccessMode, BatchSpatialFetch, BlockFetchStrategy, DelegateReason, FetchContext, FetchOutcome, FetchRequest,
	SingleBlockFetch,
};
use anyhow::Result;
use pgraster_core::{cache::BlockCache, config::FetchConfig};

/// Whether the batch pass has populated the cache of a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchState {
	Uncached,
	Cached,
}

/// Fills a handle's block cache on first pixel access.
///
/// The first read that qualifies for the batch path runs one spatial query for its window
/// and moves the engine to [`FetchState::Cached`]. From then on [`fetch_and_cache`]
/// returns [`FetchOutcome::AlreadyCached`] without touching the store. Requests that do
/// not qualify are delegated; their blocks, and any block the batch pass did not
/// install, are fetched one by one through [`fill_missing`].
///
/// [`fetch_and_cache`]: BlockFetchEngine::fetch_and_cache
/// [`fill_missing`]: BlockFetchEngine::fill_missing
pub struct BlockFetchEngine {
	state: FetchState,
	batch_enabled: bool,
	batch: BatchSpatialFetch,
	single: SingleBlockFetch,
}

impl BlockFetchEngine {
	pub fn new(config: &FetchConfig) -> BlockFetchEngine {
		BlockFetchEngine {
			state: FetchState::Uncached,
			batch_enabled: config.batch,
			batch: BatchSpatialFetch,
			single: SingleBlockFetch,
		}
	}

	pub fn state(&self) -> FetchState {
		self.state
	}

	/// Runs the batch path for `request` unless the cache is already populated or the
	/// request has to be delegated.
	pub async fn fetch_and_cache(
		&mut self,
		ctx: &FetchContext<'_>,
		request: &FetchRequest,
		cache: &mut dyn BlockCache,
	) -> Result<FetchOutcome> {
		if self.state == FetchState::Cached {
			return Ok(FetchOutcome::AlreadyCached);
		}
		if let Some(reason) = self.precondition(request) {
			log::debug!("delegating {}: {reason}", request.window);
			return Ok(FetchOutcome::Delegate(reason));
		}

		log::debug!("{} for {}", self.batch.name(), request.window);
		let outcome = self.batch.fetch(ctx, request, cache).await?;
		if let FetchOutcome::Cached(keys) = &outcome {
			log::debug!("installed {} blocks", keys.len());
			self.state = FetchState::Cached;
		}
		Ok(outcome)
	}

	/// Fetches every block of `request` the cache does not hold yet, one query per block.
	pub async fn fill_missing(
		&self,
		ctx: &FetchContext<'_>,
		request: &FetchRequest,
		cache: &mut dyn BlockCache,
	) -> Result<FetchOutcome> {
		let outcome = self.single.fetch(ctx, request, cache).await?;
		if let FetchOutcome::Cached(keys) = &outcome
			&& !keys.is_empty()
		{
			log::debug!("{} installed {} blocks", self.single.name(), keys.len());
		}
		Ok(outcome)
	}

	fn precondition(&self, request: &FetchRequest) -> Option<DelegateReason> {
		if request.access == AccessMode::Write {
			Some(DelegateReason::Write)
		} else if !request.buffer.matches(&request.window) {
			Some(DelegateReason::BufferMismatch)
		} else if !self.batch_enabled {
			Some(DelegateReason::BatchDisabled)
		} else {
			None
		}
	}
}

impl std::fmt::Debug for BlockFetchEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BlockFetchEngine")
			.field("state", &self.state)
			.field("batch_enabled", &self.batch_enabled)
			.finish()
	}
}
