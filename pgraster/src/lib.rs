//! Gridded raster access over tile rows stored in a relational table.
//!
//! Every row of a PostGIS raster table holds one georeferenced tile. This crate infers
//! one coherent raster from the rows matched by a [`SourceSelector`] and serves pixel
//! windows from a block cache that is filled by spatial queries:
//! - [`CoverageResolver`] counts the rows and derives origin, pixel size, raster size,
//!   block size and band layout, or lists the rows as subdatasets,
//! - [`BlockFetchEngine`] turns the first read of a handle into one spatial query and
//!   installs the returned tiles as blocks,
//! - [`RasterDataset`] ties both together behind `open`/`read`.
//!
//! Rows live in a [`RasterStore`]: [`PostgisStore`] for PostgreSQL or [`SqliteStore`] for
//! an offline catalog.
//!
//! # Quick start
//! The example uses the fixtures of the `testing` feature.
//! ```rust
//! use pgraster::{testing::*, *};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let path = std::env::temp_dir().join("pgraster_doc_grid.sqlite");
//!     write_grid_catalog(&path, 4326)?;
//!
//!     let config = RasterConfig::default();
//!     let store = SqliteStore::open_path(&path, &config.store)?;
//!     let selector = grid_selector().with_mode(RasterMode::PerTable);
//!     let mut dataset = RasterDataset::open(Arc::new(store), &selector, &config).await?;
//!     assert_eq!(dataset.coverage().raster_width, 512);
//!
//!     let window = PixelWindow::new(250, 250, 10, 10);
//!     let bands = dataset.read(&window, BufferSize::from(&window), BandDataType::Float64, &[1]).await?;
//!     assert_eq!(bands[0].get_xy(9, 9), 3033.0);
//!     Ok(())
//! }
//! ```

mod coverage;
pub use coverage::*;

mod dataset;
pub use dataset::*;

mod error;
pub use error::*;

mod fetch;
pub use fetch::*;

mod selector;
pub use selector::*;

mod store;
pub use store::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use pgraster_core::{
	cache::{BlockCache, BlockKey, InMemoryBlockCache},
	config::{FetchConfig, RasterConfig, StoreConfig},
	types::*,
};
