//! The affine transform between pixel and georeferenced coordinates.
//!
//! The six coefficients follow the GDAL order `[origin_x, pixel_size_x, skew_x, origin_y,
//! skew_y, pixel_size_y]`:
//!
//! ```text
//! x = origin_x + col * pixel_size_x + row * skew_x
//! y = origin_y + col * skew_y       + row * pixel_size_y
//! ```
//!
//! A negative `pixel_size_y` means rows grow downwards while Y decreases, the usual
//! "north up" layout.

use super::PixelWindow;
use geo::{Coord, LineString, Polygon, Rect};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform {
	pub origin_x: f64,
	pub pixel_size_x: f64,
	pub skew_x: f64,
	pub origin_y: f64,
	pub skew_y: f64,
	pub pixel_size_y: f64,
}

impl GeoTransform {
	pub fn new(origin_x: f64, origin_y: f64, pixel_size_x: f64, pixel_size_y: f64) -> GeoTransform {
		GeoTransform {
			origin_x,
			pixel_size_x,
			skew_x: 0.0,
			origin_y,
			skew_y: 0.0,
			pixel_size_y,
		}
	}

	pub fn with_skew(mut self, skew_x: f64, skew_y: f64) -> GeoTransform {
		self.skew_x = skew_x;
		self.skew_y = skew_y;
		self
	}

	pub fn from_gdal(gt: [f64; 6]) -> GeoTransform {
		GeoTransform {
			origin_x: gt[0],
			pixel_size_x: gt[1],
			skew_x: gt[2],
			origin_y: gt[3],
			skew_y: gt[4],
			pixel_size_y: gt[5],
		}
	}

	pub fn to_gdal(&self) -> [f64; 6] {
		[
			self.origin_x,
			self.pixel_size_x,
			self.skew_x,
			self.origin_y,
			self.skew_y,
			self.pixel_size_y,
		]
	}

	/// Maps a pixel position to georeferenced coordinates.
	pub fn apply(&self, col: f64, row: f64) -> Coord<f64> {
		Coord {
			x: self.origin_x + col * self.pixel_size_x + row * self.skew_x,
			y: self.origin_y + col * self.skew_y + row * self.pixel_size_y,
		}
	}

	/// Corners of `window` in the order upper left, upper right, lower right, lower left.
	pub fn window_corners(&self, window: &PixelWindow) -> [Coord<f64>; 4] {
		let left = f64::from(window.x_off);
		let top = f64::from(window.y_off);
		let right = left + f64::from(window.width);
		let bottom = top + f64::from(window.height);
		[
			self.apply(left, top),
			self.apply(right, top),
			self.apply(right, bottom),
			self.apply(left, bottom),
		]
	}

	/// The window as a closed polygon ring.
	pub fn window_polygon(&self, window: &PixelWindow) -> Polygon<f64> {
		let [a, b, c, d] = self.window_corners(window);
		Polygon::new(LineString::from(vec![a, b, c, d, a]), vec![])
	}

	/// Axis aligned bounds of a `width` × `height` pixel area starting at the origin.
	pub fn bounds(&self, width: u32, height: u32) -> Rect<f64> {
		let corners = self.window_corners(&PixelWindow::new(0, 0, width, height));
		let (mut min, mut max) = (corners[0], corners[0]);
		for corner in &corners[1..] {
			min.x = min.x.min(corner.x);
			min.y = min.y.min(corner.y);
			max.x = max.x.max(corner.x);
			max.y = max.y.max(corner.y);
		}
		Rect::new(min, max)
	}
}
