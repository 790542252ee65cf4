use anyhow::{Result, ensure};
use std::fmt::{Debug, Display};

/// A rectangular window of a raster in pixel coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelWindow {
	pub x_off: u32,
	pub y_off: u32,
	pub width: u32,
	pub height: u32,
}

impl PixelWindow {
	pub fn new(x_off: u32, y_off: u32, width: u32, height: u32) -> PixelWindow {
		PixelWindow {
			x_off,
			y_off,
			width,
			height,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}

	pub fn pixel_count(&self) -> usize {
		self.width as usize * self.height as usize
	}

	/// Fails unless the window lies inside a `width` × `height` raster.
	pub fn ensure_within(&self, width: u32, height: u32) -> Result<()> {
		ensure!(!self.is_empty(), "window {self} is empty");
		ensure!(
			u64::from(self.x_off) + u64::from(self.width) <= u64::from(width)
				&& u64::from(self.y_off) + u64::from(self.height) <= u64::from(height),
			"window {self} exceeds raster size {width}x{height}"
		);
		Ok(())
	}

	/// The blocks of a `block_width` × `block_height` grid touched by this window.
	pub fn block_range(&self, block_width: u32, block_height: u32) -> BlockRange {
		let first_col = self.x_off / block_width;
		let first_row = self.y_off / block_height;
		let last_col = last_block(self.x_off, self.width, block_width);
		let last_row = last_block(self.y_off, self.height, block_height);
		BlockRange {
			first_col,
			first_row,
			cols: last_col - first_col + 1,
			rows: last_row - first_row + 1,
		}
	}
}

/// Index of the block holding the last pixel of `offset..offset+len`. Computed in u64
/// since the span may end past `u32::MAX`.
fn last_block(offset: u32, len: u32, block_size: u32) -> u32 {
	let last_pixel = u64::from(offset) + u64::from(len.max(1)) - 1;
	u32::try_from(last_pixel / u64::from(block_size)).unwrap_or(u32::MAX)
}

impl Display for PixelWindow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{},{} {}x{}]", self.x_off, self.y_off, self.width, self.height)
	}
}

impl Debug for PixelWindow {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "PixelWindow{self}")
	}
}

/// Block columns `first_col..first_col+cols` and rows `first_row..first_row+rows`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
	pub first_col: u32,
	pub first_row: u32,
	pub cols: u32,
	pub rows: u32,
}

impl BlockRange {
	pub fn len(&self) -> usize {
		self.cols as usize * self.rows as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Absolute block positions in row-major order, paired with their row-major index.
	pub fn iter(&self) -> impl Iterator<Item = (usize, u32, u32)> + '_ {
		(0..self.rows).flat_map(move |row| {
			(0..self.cols).map(move |col| {
				let index = row as usize * self.cols as usize + col as usize;
				(index, self.first_col + col, self.first_row + row)
			})
		})
	}
}

/// Size of the caller's pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSize {
	pub width: u32,
	pub height: u32,
}

impl BufferSize {
	pub fn new(width: u32, height: u32) -> BufferSize {
		BufferSize { width, height }
	}

	/// Whether the buffer maps one to one onto `window`.
	pub fn matches(&self, window: &PixelWindow) -> bool {
		self.width == window.width && self.height == window.height
	}
}

impl From<&PixelWindow> for BufferSize {
	fn from(window: &PixelWindow) -> Self {
		BufferSize::new(window.width, window.height)
	}
}
