use std::fmt::Display;

/// Failures of coverage resolution that callers may want to tell apart.
///
/// They travel inside `anyhow::Error`; use `err.downcast_ref::<ResolveError>()`.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolveError {
	/// A query that must return rows returned none.
	EmptyResult { query: &'static str, selector: String },
	/// The matched rows use more than one spatial reference id.
	InconsistentSrid { srids: Vec<i32> },
	/// The union extent could not be parsed as WKT.
	UnparseableExtent { text: String, reason: String },
	/// The stored geometry cannot describe a pixel grid.
	InvalidGeometry { reason: String },
}

impl Display for ResolveError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ResolveError::EmptyResult { query, selector } => {
				write!(f, "{query} returned no rows for {selector}")
			}
			ResolveError::InconsistentSrid { srids } => {
				write!(f, "rows use different spatial reference ids: {srids:?}")
			}
			ResolveError::UnparseableExtent { text, reason } => {
				write!(f, "cannot parse extent '{text}': {reason}")
			}
			ResolveError::InvalidGeometry { reason } => write!(f, "invalid raster geometry: {reason}"),
		}
	}
}

impl std::error::Error for ResolveError {}
