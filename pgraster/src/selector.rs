//! Which rows of which table form a raster.

use pgraster_core::{config::RasterConfig, types::RasterMode};
use std::fmt::Display;

/// Schema, table, raster column and an optional row filter, plus the mode that decides
/// how the matched rows are exposed.
///
/// The predicate is raw SQL in the dialect of the store it is sent to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSelector {
	pub schema: String,
	pub table: String,
	pub column: String,
	pub predicate: Option<String>,
	pub mode: RasterMode,
}

impl SourceSelector {
	pub fn new(schema: &str, table: &str, column: &str) -> SourceSelector {
		SourceSelector {
			schema: schema.to_string(),
			table: table.to_string(),
			column: column.to_string(),
			predicate: None,
			mode: RasterMode::default(),
		}
	}

	/// A selector for `table` using the configured default schema, column and mode.
	pub fn from_config(config: &RasterConfig, table: &str) -> SourceSelector {
		SourceSelector::new(&config.default_schema, table, &config.default_column).with_mode(config.mode)
	}

	pub fn with_predicate(mut self, predicate: &str) -> SourceSelector {
		let predicate = predicate.trim();
		self.predicate = if predicate.is_empty() {
			None
		} else {
			Some(predicate.to_string())
		};
		self
	}

	pub fn with_mode(mut self, mode: RasterMode) -> SourceSelector {
		self.mode = mode;
		self
	}

	/// A copy whose predicate is `<current predicate> AND <extra>`.
	pub fn and_predicate(&self, extra: &str) -> SourceSelector {
		let predicate = match &self.predicate {
			Some(predicate) => format!("{predicate} AND {extra}"),
			None => extra.to_string(),
		};
		self.clone().with_predicate(&predicate)
	}

	/// `"schema"."table"`
	pub fn qualified_table(&self) -> String {
		format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
	}

	/// `"column"`
	pub fn quoted_column(&self) -> String {
		quote_ident(&self.column)
	}

	/// ` WHERE (predicate)`, or nothing without a predicate.
	pub fn where_clause(&self) -> String {
		match &self.predicate {
			Some(predicate) => format!(" WHERE ({predicate})"),
			None => String::new(),
		}
	}

	/// ` WHERE (predicate) AND condition`, or ` WHERE condition` without a predicate.
	pub fn where_clause_and(&self, condition: &str) -> String {
		match &self.predicate {
			Some(predicate) => format!(" WHERE ({predicate}) AND {condition}"),
			None => format!(" WHERE {condition}"),
		}
	}
}

impl Display for SourceSelector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "schema={} table={} column={}", self.schema, self.table, self.column)?;
		if let Some(predicate) = &self.predicate {
			write!(f, " where='{predicate}'")?;
		}
		if self.mode == RasterMode::PerTable {
			f.write_str(" mode=2")?;
		}
		Ok(())
	}
}

/// Quotes an SQL identifier.
pub fn quote_ident(ident: &str) -> String {
	format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quotes an SQL string literal.
pub fn quote_literal(value: &str) -> String {
	format!("'{}'", value.replace('\'', "''"))
}
