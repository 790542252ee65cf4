//! Value types describing bands, pixel windows, pixel buffers and georeferencing.

mod band_descriptor;
pub use band_descriptor::*;

mod geo_transform;
pub use geo_transform::*;

mod pixel_buffer;
pub use pixel_buffer::*;

mod pixel_type;
pub use pixel_type::*;

mod pixel_window;
pub use pixel_window::*;

mod raster_mode;
pub use raster_mode::*;
