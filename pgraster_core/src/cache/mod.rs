//! Storage for decoded blocks.
//!
//! The fetch engine installs one [`PixelBuffer`](crate::types::PixelBuffer) per
//! (band, block column, block row). Entries are never evicted; they live as long as the
//! cache.

mod block_key;
pub use block_key::*;

mod in_memory;
pub use in_memory::*;

mod traits;
pub use traits::*;
