//! Filling the block cache from the tiles that intersect a pixel window.

mod engine;
pub use engine::*;

mod request;
pub use request::*;

mod strategy;
pub use strategy::*;
