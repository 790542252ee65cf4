use super::BlockKey;
use crate::types::PixelBuffer;
use anyhow::Result;

/// A store of decoded blocks.
pub trait BlockCache: Send + Sync {
	fn contains(&self, key: &BlockKey) -> bool;

	fn get(&self, key: &BlockKey) -> Option<&PixelBuffer>;

	/// Installs `block` under `key`, replacing an existing entry.
	fn insert(&mut self, key: BlockKey, block: PixelBuffer) -> Result<()>;

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// All keys, sorted by band, then row, then column.
	fn keys(&self) -> Vec<BlockKey>;
}
