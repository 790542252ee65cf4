use super::{BlockCache, BlockKey};
use crate::types::PixelBuffer;
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::collections::HashMap;

/// A [`BlockCache`] backed by a `HashMap`. Every inserted block must have the
/// configured block size.
pub struct InMemoryBlockCache {
	block_width: u32,
	block_height: u32,
	data: HashMap<BlockKey, PixelBuffer>,
}

impl InMemoryBlockCache {
	pub fn new(block_width: u32, block_height: u32) -> Self {
		Self {
			block_width,
			block_height,
			data: HashMap::new(),
		}
	}
}

impl BlockCache for InMemoryBlockCache {
	fn contains(&self, key: &BlockKey) -> bool {
		self.data.contains_key(key)
	}

	fn get(&self, key: &BlockKey) -> Option<&PixelBuffer> {
		self.data.get(key)
	}

	fn insert(&mut self, key: BlockKey, block: PixelBuffer) -> Result<()> {
		ensure!(
			block.width() == self.block_width && block.height() == self.block_height,
			"{key} is {}x{}, but blocks are {}x{}",
			block.width(),
			block.height(),
			self.block_width,
			self.block_height
		);
		self.data.insert(key, block);
		Ok(())
	}

	fn len(&self) -> usize {
		self.data.len()
	}

	fn keys(&self) -> Vec<BlockKey> {
		self.data.keys().copied().sorted_by_key(|k| (k.band, k.row, k.col)).collect()
	}
}
