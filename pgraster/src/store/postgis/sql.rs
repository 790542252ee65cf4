//! SQL text sent to PostGIS. Kept free of I/O so the statements can be tested as strings.

use crate::{RowIdentity, SourceSelector, TileOrder, quote_ident, quote_literal, store::identifier_literal};

pub fn count_rows(s: &SourceSelector) -> String {
	format!("SELECT count(*) FROM {}{}", s.qualified_table(), s.where_clause())
}

/// One row per srid: srid, extent and the largest band count.
pub fn coverage_summary(s: &SourceSelector) -> String {
	let c = s.quoted_column();
	format!(
		"SELECT srid, ST_XMin(extent), ST_YMin(extent), ST_XMax(extent), ST_YMax(extent), nbband FROM (\
		SELECT ST_SRID({c}) AS srid, ST_Extent({c}::geometry) AS extent, max(ST_NumBands({c})) AS nbband \
		FROM {}{} GROUP BY srid) AS summary",
		s.qualified_table(),
		s.where_clause()
	)
}

pub fn representative_geometry(s: &SourceSelector) -> String {
	let c = s.quoted_column();
	format!(
		"SELECT ST_ScaleX({c}), ST_ScaleY({c}), ST_SkewX({c}), ST_SkewY({c}), ST_Width({c}), ST_Height({c}) \
		FROM {}{} LIMIT 1",
		s.qualified_table(),
		s.where_clause()
	)
}

/// Expands one row into one row per band.
pub fn band_metadata(s: &SourceSelector) -> String {
	let c = s.quoted_column();
	format!(
		"SELECT band, ST_BandPixelType({c}, band), ST_BandNoDataValue({c}, band) IS NULL, \
		ST_BandNoDataValue({c}, band) FROM (\
		SELECT {c}, generate_series(1, ST_NumBands({c})) AS band FROM (\
		SELECT {c} FROM {}{} LIMIT 1) AS tile) AS bands ORDER BY band",
		s.qualified_table(),
		s.where_clause()
	)
}

pub fn union_extent(s: &SourceSelector, srid: i32) -> String {
	format!(
		"SELECT ST_AsText(ST_SetSRID(ST_Extent({}::geometry), {srid})) FROM {}{}",
		s.quoted_column(),
		s.qualified_table(),
		s.where_clause()
	)
}

/// First column of a primary key or unique constraint.
pub fn primary_key_column(s: &SourceSelector) -> String {
	format!(
		"SELECT d.attname::text FROM pg_catalog.pg_constraint AS a \
		JOIN pg_catalog.pg_indexes AS b ON a.conname = b.indexname \
		JOIN pg_catalog.pg_class AS c ON c.relname = b.tablename \
		JOIN pg_catalog.pg_attribute AS d ON c.oid = d.attrelid \
		WHERE b.schemaname = {} AND b.tablename = {} AND d.attnum = a.conkey[1] AND a.contype IN ('p', 'u') \
		ORDER BY a.contype LIMIT 1",
		quote_literal(&s.schema),
		quote_literal(&s.table)
	)
}

/// A column whose default draws from a sequence.
pub fn sequence_column(s: &SourceSelector) -> String {
	format!(
		"SELECT cols.column_name::text FROM information_schema.columns AS cols \
		JOIN information_schema.sequences AS seqs ON cols.column_default LIKE '%' || seqs.sequence_name || '%' \
		WHERE cols.table_schema = {} AND cols.table_name = {} LIMIT 1",
		quote_literal(&s.schema),
		quote_literal(&s.table)
	)
}

pub fn row_identifiers(s: &SourceSelector, column: &str) -> String {
	format!(
		"SELECT {}::text FROM {}{}",
		quote_ident(column),
		s.qualified_table(),
		s.where_clause()
	)
}

pub fn row_upper_lefts(s: &SourceSelector) -> String {
	let c = s.quoted_column();
	format!(
		"SELECT ST_UpperLeftX({c}), ST_UpperLeftY({c}) FROM {}{}",
		s.qualified_table(),
		s.where_clause()
	)
}

pub fn identity_predicate(s: &SourceSelector, identity: &RowIdentity) -> String {
	match identity {
		RowIdentity::Column { column, value } => format!("{} = {}", quote_ident(column), identifier_literal(value)),
		RowIdentity::UpperLeft { x, y } => {
			let c = s.quoted_column();
			format!("ST_UpperLeftX({c}) = {x} AND ST_UpperLeftY({c}) = {y}")
		}
	}
}

/// Tiles intersecting the polygon `polygon_wkt`, in grid order.
pub fn intersecting_tiles(s: &SourceSelector, polygon_wkt: &str, srid: i32, order: TileOrder) -> String {
	let c = s.quoted_column();
	let condition = format!(
		"ST_Intersects({c}, ST_PolygonFromText({}, {srid}))",
		quote_literal(polygon_wkt)
	);
	format!(
		"SELECT ST_AsBinary({c}), ST_ScaleX({c}), ST_SkewY({c}), ST_SkewX({c}), ST_ScaleY({c}), \
		ST_UpperLeftX({c}), ST_UpperLeftY({c}), ST_Width({c}), ST_Height({c}) FROM {}{} \
		ORDER BY ST_UpperLeftY({c}) {}, ST_UpperLeftX({c}) ASC",
		s.qualified_table(),
		s.where_clause_and(&condition),
		order.sql_direction()
	)
}

pub fn spatial_ref_text(srid: i32) -> String {
	format!("SELECT srtext FROM spatial_ref_sys WHERE srid = {srid}")
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	fn selector() -> SourceSelector {
		SourceSelector::new("public", "dem", "rast")
	}

	fn filtered() -> SourceSelector {
		selector().with_predicate("year = 2020")
	}

	#[test]
	fn count() {
		assert_eq!(count_rows(&selector()), "SELECT count(*) FROM \"public\".\"dem\"");
		assert_eq!(
			count_rows(&filtered()),
			"SELECT count(*) FROM \"public\".\"dem\" WHERE (year = 2020)"
		);
	}

	#[test]
	fn summary_groups_by_srid() {
		assert_eq!(
			coverage_summary(&filtered()),
			"SELECT srid, ST_XMin(extent), ST_YMin(extent), ST_XMax(extent), ST_YMax(extent), nbband FROM (\
			SELECT ST_SRID(\"rast\") AS srid, ST_Extent(\"rast\"::geometry) AS extent, max(ST_NumBands(\"rast\")) AS nbband \
			FROM \"public\".\"dem\" WHERE (year = 2020) GROUP BY srid) AS summary"
		);
	}

	#[test]
	fn geometry_and_bands_use_one_row() {
		assert!(representative_geometry(&selector()).ends_with("FROM \"public\".\"dem\" LIMIT 1"));
		let sql = band_metadata(&filtered());
		assert!(sql.contains("generate_series(1, ST_NumBands(\"rast\"))"), "{sql}");
		assert!(sql.contains("FROM \"public\".\"dem\" WHERE (year = 2020) LIMIT 1"), "{sql}");
	}

	#[test]
	fn union_extent_sets_srid() {
		assert_eq!(
			union_extent(&selector(), 4326),
			"SELECT ST_AsText(ST_SetSRID(ST_Extent(\"rast\"::geometry), 4326)) FROM \"public\".\"dem\""
		);
	}

	#[test]
	fn catalog_lookups_use_literals() {
		let selector = SourceSelector::new("o'neil", "dem", "rast");
		assert!(primary_key_column(&selector).contains("b.schemaname = 'o''neil' AND b.tablename = 'dem'"));
		assert!(sequence_column(&selector).contains("cols.table_schema = 'o''neil' AND cols.table_name = 'dem'"));
	}

	#[test]
	fn identities() {
		let id = RowIdentity::Column {
			column: "rid".into(),
			value: "17".into(),
		};
		assert_eq!(identity_predicate(&selector(), &id), "\"rid\" = 17");

		let id = RowIdentity::Column {
			column: "name".into(),
			value: "north".into(),
		};
		assert_eq!(identity_predicate(&selector(), &id), "\"name\" = 'north'");

		let id = RowIdentity::UpperLeft { x: 256.0, y: -0.5 };
		assert_eq!(
			identity_predicate(&selector(), &id),
			"ST_UpperLeftX(\"rast\") = 256 AND ST_UpperLeftY(\"rast\") = -0.5"
		);
		assert_eq!(row_identifiers(&filtered(), "rid"), "SELECT \"rid\"::text FROM \"public\".\"dem\" WHERE (year = 2020)");
	}

	#[test]
	fn spatial_query_orders_by_grid() {
		let polygon = "POLYGON((0 0,512 0,512 -512,0 -512,0 0))";
		assert_eq!(
			intersecting_tiles(&selector(), polygon, 4326, TileOrder::YDescending),
			"SELECT ST_AsBinary(\"rast\"), ST_ScaleX(\"rast\"), ST_SkewY(\"rast\"), ST_SkewX(\"rast\"), ST_ScaleY(\"rast\"), \
			ST_UpperLeftX(\"rast\"), ST_UpperLeftY(\"rast\"), ST_Width(\"rast\"), ST_Height(\"rast\") FROM \"public\".\"dem\" \
			WHERE ST_Intersects(\"rast\", ST_PolygonFromText('POLYGON((0 0,512 0,512 -512,0 -512,0 0))', 4326)) \
			ORDER BY ST_UpperLeftY(\"rast\") DESC, ST_UpperLeftX(\"rast\") ASC"
		);
		let sql = intersecting_tiles(&filtered(), polygon, -1, TileOrder::YAscending);
		assert!(sql.contains("WHERE (year = 2020) AND ST_Intersects("), "{sql}");
		assert!(sql.ends_with("ORDER BY ST_UpperLeftY(\"rast\") ASC, ST_UpperLeftX(\"rast\") ASC"), "{sql}");
	}

	#[test]
	fn spatial_ref() {
		assert_eq!(spatial_ref_text(4326), "SELECT srtext FROM spatial_ref_sys WHERE srid = 4326");
	}
}
