use serde::Deserialize;
use std::fmt::Display;

/// How the rows matched by a selector are exposed.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RasterMode {
	/// Every row is its own raster. Several rows become subdatasets.
	#[default]
	PerRow,
	/// All rows together form one tiled raster.
	PerTable,
}

impl RasterMode {
	pub fn as_str(&self) -> &str {
		match self {
			RasterMode::PerRow => "per_row",
			RasterMode::PerTable => "per_table",
		}
	}
}

impl Display for RasterMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
