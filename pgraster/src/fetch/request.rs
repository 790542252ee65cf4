use crate::{CoverageDescriptor, RasterStore, SourceSelector};
use anyhow::{Result, bail};
use pgraster_core::{
	cache::BlockKey,
	types::{BandDescriptor, BufferSize, PixelWindow},
};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
	Read,
	Write,
}

/// One pixel I/O request as it reaches the fetch engine.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
	pub access: AccessMode,
	pub window: PixelWindow,
	pub buffer: BufferSize,
	/// 1-based band indexes.
	pub bands: Vec<usize>,
}

impl FetchRequest {
	/// A read whose buffer has the size of the window.
	pub fn read(window: PixelWindow, bands: &[usize]) -> FetchRequest {
		FetchRequest {
			access: AccessMode::Read,
			window,
			buffer: BufferSize::from(&window),
			bands: bands.to_vec(),
		}
	}

	pub fn with_buffer(mut self, buffer: BufferSize) -> FetchRequest {
		self.buffer = buffer;
		self
	}

	pub fn with_access(mut self, access: AccessMode) -> FetchRequest {
		self.access = access;
		self
	}
}

/// Why a request is left to the per-block path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DelegateReason {
	Write,
	BufferMismatch,
	BatchDisabled,
	NoTiles,
	QueryFailed(String),
}

impl Display for DelegateReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DelegateReason::Write => f.write_str("write access"),
			DelegateReason::BufferMismatch => f.write_str("buffer size differs from window size"),
			DelegateReason::BatchDisabled => f.write_str("batch fetching is disabled"),
			DelegateReason::NoTiles => f.write_str("no tiles intersect the window"),
			DelegateReason::QueryFailed(message) => write!(f, "spatial query failed: {message}"),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
	/// Blocks installed by this call, sorted by band, row and column.
	Cached(Vec<BlockKey>),
	/// The handle had already populated its cache.
	AlreadyCached,
	Delegate(DelegateReason),
}

/// What a fetch strategy needs to know about the open raster.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
	pub store: &'a dyn RasterStore,
	pub selector: &'a SourceSelector,
	pub coverage: &'a CoverageDescriptor,
	pub bands: &'a [BandDescriptor],
}

impl FetchContext<'_> {
	/// Descriptor of a 1-based band.
	pub fn band(&self, index: usize) -> Result<&BandDescriptor> {
		match index.checked_sub(1).and_then(|i| self.bands.get(i)) {
			Some(band) => Ok(band),
			None => bail!("band {index} requested, but the raster has {} bands", self.bands.len()),
		}
	}

	/// The pixel window covered by a block.
	pub fn block_window(&self, key: &BlockKey) -> PixelWindow {
		let (width, height) = (self.coverage.block_width, self.coverage.block_height);
		PixelWindow::new(key.col.saturating_mul(width), key.row.saturating_mul(height), width, height)
	}
}

impl std::fmt::Debug for FetchContext<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FetchContext")
			.field("store", &self.store.name())
			.field("selector", &self.selector.to_string())
			.field("coverage", &self.coverage.to_string())
			.finish()
	}
}
