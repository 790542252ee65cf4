//! Coverage resolution: from a selector to raster geometry, band layout and subdatasets.

mod assembly;
pub use assembly::*;

mod descriptor;
pub use descriptor::*;

mod resolver;
pub use resolver::*;
