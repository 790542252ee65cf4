//! Contains the value types of a PostGIS raster coverage: affine transforms, pixel windows,
//! band types, the tile payload codec, pixel buffers, the block cache and configuration.

pub mod cache;

pub mod config;

pub mod io;

pub mod payload;

pub mod types;
