//! A typed, row-major pixel plane in native byte order.
//!
//! Blocks in the cache, decoded tile bands and the result of a windowed read are all
//! `PixelBuffer`s. Values move between data types through [`PixelBuffer::convert`]:
//! identical types are copied byte for byte, integer targets are rounded and clamped to
//! their range, and NaN becomes zero.

use super::BandDataType;
use anyhow::{Result, ensure};
use byteorder::{ByteOrder, NativeEndian};
use std::fmt::Debug;

#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
	data_type: BandDataType,
	width: u32,
	height: u32,
	data: Vec<u8>,
}

impl PixelBuffer {
	pub fn zeroed(data_type: BandDataType, width: u32, height: u32) -> PixelBuffer {
		PixelBuffer {
			data_type,
			width,
			height,
			data: vec![0; width as usize * height as usize * data_type.size()],
		}
	}

	/// Wraps native-order pixel bytes.
	pub fn from_bytes(data_type: BandDataType, width: u32, height: u32, data: Vec<u8>) -> Result<PixelBuffer> {
		let expected = width as usize * height as usize * data_type.size();
		ensure!(
			data.len() == expected,
			"{width}x{height} {data_type} pixels need {expected} bytes, got {}",
			data.len()
		);
		Ok(PixelBuffer {
			data_type,
			width,
			height,
			data,
		})
	}

	pub fn from_values(data_type: BandDataType, width: u32, height: u32, values: &[f64]) -> Result<PixelBuffer> {
		ensure!(
			values.len() == width as usize * height as usize,
			"expected {} values, got {}",
			width as usize * height as usize,
			values.len()
		);
		let mut buffer = PixelBuffer::zeroed(data_type, width, height);
		for (index, value) in values.iter().enumerate() {
			buffer.set(index, *value);
		}
		Ok(buffer)
	}

	pub fn data_type(&self) -> BandDataType {
		self.data_type
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn len(&self) -> usize {
		self.width as usize * self.height as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.data
	}

	/// Value of the pixel at row-major `index`.
	pub fn get(&self, index: usize) -> f64 {
		let offset = index * self.data_type.size();
		let bytes = &self.data[offset..];
		match self.data_type {
			BandDataType::Byte => f64::from(bytes[0]),
			BandDataType::Int16 => f64::from(NativeEndian::read_i16(bytes)),
			BandDataType::UInt16 => f64::from(NativeEndian::read_u16(bytes)),
			BandDataType::Int32 => f64::from(NativeEndian::read_i32(bytes)),
			BandDataType::UInt32 => f64::from(NativeEndian::read_u32(bytes)),
			BandDataType::Float32 => f64::from(NativeEndian::read_f32(bytes)),
			BandDataType::Float64 => NativeEndian::read_f64(bytes),
		}
	}

	pub fn get_xy(&self, x: u32, y: u32) -> f64 {
		self.get(y as usize * self.width as usize + x as usize)
	}

	/// Stores `value` at row-major `index`, narrowed to the buffer's data type.
	pub fn set(&mut self, index: usize, value: f64) {
		let value = narrow(value, self.data_type);
		let offset = index * self.data_type.size();
		let bytes = &mut self.data[offset..];
		match self.data_type {
			BandDataType::Byte => bytes[0] = value as u8,
			BandDataType::Int16 => NativeEndian::write_i16(bytes, value as i16),
			BandDataType::UInt16 => NativeEndian::write_u16(bytes, value as u16),
			BandDataType::Int32 => NativeEndian::write_i32(bytes, value as i32),
			BandDataType::UInt32 => NativeEndian::write_u32(bytes, value as u32),
			BandDataType::Float32 => NativeEndian::write_f32(bytes, value as f32),
			BandDataType::Float64 => NativeEndian::write_f64(bytes, value),
		}
	}

	/// Returns the buffer as `target`. Same type: plain copy; otherwise narrow or widen
	/// every pixel.
	pub fn convert(&self, target: BandDataType) -> PixelBuffer {
		if target == self.data_type {
			return self.clone();
		}
		let mut result = PixelBuffer::zeroed(target, self.width, self.height);
		for index in 0..self.len() {
			result.set(index, self.get(index));
		}
		result
	}

	/// Samples the buffer onto a `width` × `height` grid, taking the pixel under the centre
	/// of every target pixel.
	pub fn resample_nearest(&self, width: u32, height: u32) -> PixelBuffer {
		if width == self.width && height == self.height {
			return self.clone();
		}
		let mut result = PixelBuffer::zeroed(self.data_type, width, height);
		if self.is_empty() {
			return result;
		}
		let size = self.data_type.size();
		let source_x: Vec<usize> = (0..width).map(|x| nearest(x, width, self.width)).collect();
		for y in 0..height {
			let source_y = nearest(y, height, self.height);
			for (x, &sx) in source_x.iter().enumerate() {
				let src = (source_y * self.width as usize + sx) * size;
				let dst = (y as usize * width as usize + x) * size;
				result.data[dst..dst + size].copy_from_slice(&self.data[src..src + size]);
			}
		}
		result
	}

	/// Copies `source` into this buffer with its upper left corner at `(x, y)`, clipping
	/// whatever falls outside. Offsets may be negative. Both buffers must share a data type.
	pub fn paste(&mut self, source: &PixelBuffer, x: i64, y: i64) -> Result<()> {
		ensure!(
			source.data_type == self.data_type,
			"cannot paste {} pixels into a {} buffer",
			source.data_type,
			self.data_type
		);
		let x0 = x.max(0);
		let y0 = y.max(0);
		let x1 = (x + i64::from(source.width)).min(i64::from(self.width));
		let y1 = (y + i64::from(source.height)).min(i64::from(self.height));
		if x0 >= x1 || y0 >= y1 {
			return Ok(());
		}
		let size = self.data_type.size();
		let cols = (x1 - x0) as usize * size;
		for dst_y in y0..y1 {
			let src_y = (dst_y - y) as usize;
			let src = (src_y * source.width as usize + (x0 - x) as usize) * size;
			let dst = (dst_y as usize * self.width as usize + x0 as usize) * size;
			self.data[dst..dst + cols].copy_from_slice(&source.data[src..src + cols]);
		}
		Ok(())
	}
}

impl Debug for PixelBuffer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PixelBuffer")
			.field("data_type", &self.data_type)
			.field("width", &self.width)
			.field("height", &self.height)
			.finish()
	}
}

/// Source index of target pixel `index` when `target` pixels cover `source` pixels.
fn nearest(index: u32, target: u32, source: u32) -> usize {
	let position = (f64::from(index) + 0.5) * f64::from(source) / f64::from(target);
	(position.floor() as usize).min(source as usize - 1)
}

/// Rounds and clamps `value` into the range of `data_type`.
fn narrow(value: f64, data_type: BandDataType) -> f64 {
	match data_type.integer_range() {
		Some((min, max)) => {
			if value.is_nan() {
				0.0
			} else {
				value.round().clamp(min, max)
			}
		}
		None => value,
	}
}
