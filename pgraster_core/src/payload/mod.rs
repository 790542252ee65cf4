//! The WKB raster serialization of a single tile row.
//!
//! ```text
//! header   endianness u8 (1 = little, 0 = big), version u16, band count u16,
//!          scale x/y f64, upper left x/y f64, skew x/y f64, srid i32, width u16, height u16
//! band     flags u8 (0x80 offline, 0x40 has nodata, 0x20 is nodata, 0x0F pixel type),
//!          nodata value (pixel type width), width × height pixels
//! ```
//!
//! [`RasterPayload::decode`] turns such a payload into a header and per-band pixel planes
//! in native byte order; [`RasterPayloadBuilder`] writes one.

mod builder;
pub use builder::*;

mod decoder;
pub use decoder::*;

mod header;
pub use header::*;
