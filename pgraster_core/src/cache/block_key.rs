use std::fmt::Display;

/// Address of a cached block: 1-based band index plus block column and row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
	pub band: usize,
	pub col: u32,
	pub row: u32,
}

impl BlockKey {
	pub fn new(band: usize, col: u32, row: u32) -> BlockKey {
		BlockKey { band, col, row }
	}
}

impl Display for BlockKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "band {} block ({}, {})", self.band, self.col, self.row)
	}
}
