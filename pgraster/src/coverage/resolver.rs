use super::{CoverageDescriptor, SubdatasetEntry, choose_assembly};
use crate::{BandMetadataRow, RasterStore, ResolveError, SourceSelector};
use anyhow::Result;
use pgraster_core::types::BandDescriptor;
use pgraster_derive::context;

/// Everything known about a selector after opening it.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCoverage {
	/// Zero sized when the rows are only listed as subdatasets.
	pub coverage: CoverageDescriptor,
	/// One per band, index 0 describing band 1.
	pub bands: Vec<BandDescriptor>,
	pub subdatasets: Vec<SubdatasetEntry>,
}

/// Infers raster geometry and band layout from the rows matched by a selector.
///
/// Resolution either succeeds completely or fails; a failing query, zero matching rows
/// and an unusable extent all abort it.
pub struct CoverageResolver<'a> {
	store: &'a dyn RasterStore,
}

impl<'a> CoverageResolver<'a> {
	pub fn new(store: &'a dyn RasterStore) -> CoverageResolver<'a> {
		CoverageResolver { store }
	}

	#[context("resolving coverage of {selector}")]
	pub async fn resolve(&self, selector: &SourceSelector) -> Result<ResolvedCoverage> {
		let count = self.store.count_rows(selector).await?;
		if count == 0 {
			return Err(ResolveError::EmptyResult {
				query: "row count",
				selector: selector.to_string(),
			}
			.into());
		}

		let assembly = choose_assembly(selector.mode, count);
		log::debug!("{count} rows match {selector}, assembling as {}", assembly.name());
		let assembled = assembly.assemble(self.store, selector).await?;

		let mut coverage = assembled.coverage;
		let rows = self.store.band_metadata(selector).await?;
		let bands = band_descriptors(&rows, coverage.band_count, selector)?;
		if coverage.band_count == 0 {
			coverage.band_count = bands.len() as u32;
		}

		if !coverage.is_empty() {
			log::debug!("resolved {coverage}");
		}
		Ok(ResolvedCoverage {
			coverage,
			bands,
			subdatasets: assembled.subdatasets,
		})
	}
}

/// One descriptor per band, index 0 describing band 1. The first row for a band index
/// wins. A `band_count` of zero takes the count from the rows.
///
/// Fails when there are no rows at all or when a band has none.
fn band_descriptors(rows: &[BandMetadataRow], band_count: u32, selector: &SourceSelector) -> Result<Vec<BandDescriptor>> {
	let missing = || ResolveError::EmptyResult {
		query: "band metadata",
		selector: selector.to_string(),
	};
	let band_count = if band_count == 0 {
		rows.iter().map(|row| row.band).max().ok_or_else(missing)?
	} else {
		band_count as usize
	};
	(1..=band_count)
		.map(|band| match rows.iter().find(|row| row.band == band) {
			Some(row) => Ok(BandDescriptor::from_tag(&row.pixel_type, row.nodata_is_null, row.nodata_value)),
			None => {
				log::warn!("no metadata for band {band} of {selector}");
				Err(anyhow::Error::from(missing()))
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use pgraster_core::types::BandDataType;
	use pretty_assertions::assert_eq;

	fn row(band: usize, pixel_type: &str, nodata: Option<f64>) -> BandMetadataRow {
		BandMetadataRow {
			band,
			pixel_type: pixel_type.to_string(),
			nodata_is_null: nodata.is_none(),
			nodata_value: nodata,
		}
	}

	fn selector() -> SourceSelector {
		SourceSelector::new("public", "dem", "rast")
	}

	fn band_metadata_error(err: &anyhow::Error) -> Option<&ResolveError> {
		err.downcast_ref::<ResolveError>()
	}

	#[test]
	fn first_row_per_band_wins() -> Result<()> {
		let rows = vec![row(1, "16BSI", Some(-9999.0)), row(1, "32BF", None), row(2, "8BSI", None)];
		let bands = band_descriptors(&rows, 2, &selector())?;
		assert_eq!(bands[0].data_type, BandDataType::Int16);
		assert_eq!(bands[0].nodata_value, Some(-9999.0));
		assert!(bands[1].is_signed_byte);
		Ok(())
	}

	#[test]
	fn zero_band_count_takes_the_rows() -> Result<()> {
		let rows = vec![row(2, "32BF", None), row(1, "16BUI", None)];
		let bands = band_descriptors(&rows, 0, &selector())?;
		assert_eq!(bands.len(), 2);
		assert_eq!(bands[0].data_type, BandDataType::UInt16);
		assert_eq!(bands[1].data_type, BandDataType::Float32);
		Ok(())
	}

	#[test]
	fn no_rows_is_an_error() {
		let expected = ResolveError::EmptyResult {
			query: "band metadata",
			selector: selector().to_string(),
		};
		for band_count in [0, 1] {
			let err = band_descriptors(&[], band_count, &selector()).unwrap_err();
			assert_eq!(band_metadata_error(&err), Some(&expected));
		}
	}

	#[test]
	fn a_band_without_rows_is_an_error() {
		let err = band_descriptors(&[row(1, "32BF", None)], 3, &selector()).unwrap_err();
		assert_eq!(
			band_metadata_error(&err),
			Some(&ResolveError::EmptyResult {
				query: "band metadata",
				selector: selector().to_string(),
			})
		);
	}

	#[test]
	fn unknown_tags_fall_back_to_bytes() -> Result<()> {
		let bands = band_descriptors(&[row(1, "128BX", None)], 1, &selector())?;
		assert_eq!(bands[0].data_type, BandDataType::Byte);
		assert_eq!(bands[0].bit_depth, 8);
		assert!(!bands[0].is_signed_byte);
		Ok(())
	}
}
