//! YAML configuration of a raster source.
//!
//! ```yaml
//! default_schema: public
//! default_column: rast
//! mode: per_table
//! store:
//!   max_connections: 1
//!   acquire_timeout_seconds: 30
//! fetch:
//!   batch: true
//! ```
//!
//! Every key is optional; unknown keys are rejected.

use crate::types::RasterMode;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::{
	fs::File,
	io::{BufReader, Read},
	path::Path,
	time::Duration,
};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RasterConfig {
	/// Schema used when a selector names none.
	#[serde(default = "default_schema")]
	pub default_schema: String,

	/// Raster column used when a selector names none.
	#[serde(default = "default_column")]
	pub default_column: String,

	/// How the matched rows are exposed.
	#[serde(default)]
	pub mode: RasterMode,

	#[serde(default)]
	pub store: StoreConfig,

	#[serde(default)]
	pub fetch: FetchConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
	/// Connections per raster handle.
	#[serde(default = "default_max_connections")]
	pub max_connections: u32,

	#[serde(default = "default_acquire_timeout")]
	pub acquire_timeout_seconds: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
	/// Populate all blocks of a window with one spatial query. When disabled every
	/// block is fetched on its own.
	#[serde(default = "default_true")]
	pub batch: bool,
}

fn default_schema() -> String {
	String::from("public")
}

fn default_column() -> String {
	String::from("rast")
}

fn default_max_connections() -> u32 {
	1
}

fn default_acquire_timeout() -> u64 {
	30
}

fn default_true() -> bool {
	true
}

impl Default for RasterConfig {
	fn default() -> Self {
		Self {
			default_schema: default_schema(),
			default_column: default_column(),
			mode: RasterMode::default(),
			store: StoreConfig::default(),
			fetch: FetchConfig::default(),
		}
	}
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			max_connections: default_max_connections(),
			acquire_timeout_seconds: default_acquire_timeout(),
		}
	}
}

impl Default for FetchConfig {
	fn default() -> Self {
		Self { batch: true }
	}
}

impl StoreConfig {
	pub fn acquire_timeout(&self) -> Duration {
		Duration::from_secs(self.acquire_timeout_seconds)
	}
}

impl RasterConfig {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		let config: RasterConfig = serde_yaml_ng::from_reader(reader)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		let config: RasterConfig = serde_yaml_ng::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("opening config {path:?}"))?;
		RasterConfig::from_reader(BufReader::new(file)).with_context(|| format!("parsing config {path:?}"))
	}

	fn validate(&self) -> Result<()> {
		ensure!(!self.default_schema.is_empty(), "default_schema must not be empty");
		ensure!(!self.default_column.is_empty(), "default_column must not be empty");
		ensure!(self.store.max_connections >= 1, "store.max_connections must be at least 1");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::{NamedTempFile, prelude::*};
	use pretty_assertions::assert_eq;

	#[test]
	fn empty_document_gives_defaults() -> Result<()> {
		let config = RasterConfig::from_string("{}")?;
		assert_eq!(config, RasterConfig::default());
		assert_eq!(config.default_schema, "public");
		assert_eq!(config.default_column, "rast");
		assert_eq!(config.mode, RasterMode::PerRow);
		assert_eq!(config.store.max_connections, 1);
		assert_eq!(config.store.acquire_timeout(), Duration::from_secs(30));
		assert!(config.fetch.batch);
		Ok(())
	}

	#[test]
	fn full_document() -> Result<()> {
		let yaml = r#"
default_schema: gis
default_column: tile
mode: per_table
store:
  max_connections: 2
  acquire_timeout_seconds: 5
fetch:
  batch: false
"#;
		let config = RasterConfig::from_string(yaml)?;
		assert_eq!(
			config,
			RasterConfig {
				default_schema: "gis".into(),
				default_column: "tile".into(),
				mode: RasterMode::PerTable,
				store: StoreConfig {
					max_connections: 2,
					acquire_timeout_seconds: 5,
				},
				fetch: FetchConfig { batch: false },
			}
		);
		Ok(())
	}

	#[test]
	fn rejects_unknown_keys_and_bad_values() {
		assert!(RasterConfig::from_string("colour: red").is_err());
		assert!(RasterConfig::from_string("mode: per_tile").is_err());
		assert!(RasterConfig::from_string("store:\n  max_connections: 0").is_err());
		assert!(RasterConfig::from_string("default_column: ''").is_err());
	}

	#[test]
	fn from_path() -> Result<()> {
		let file = NamedTempFile::new("raster.yml")?;
		file.write_str("mode: per_table\n")?;
		let config = RasterConfig::from_path(file.path())?;
		assert_eq!(config.mode, RasterMode::PerTable);

		let err = RasterConfig::from_path(Path::new("/does/not/exist.yml")).unwrap_err();
		assert!(err.to_string().contains("opening config"), "{err}");
		Ok(())
	}
}
