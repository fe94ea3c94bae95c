//! CSV ingest and normalization.
//!
//! This module is responsible for turning the product-catalog CSV into a clean
//! `Catalog` of typed records that are safe to filter and aggregate.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (catalog order == file order)
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Catalog, Record};
use crate::error::AppError;

/// Columns every catalog file must carry (matched case-insensitively).
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "id",
    "gender",
    "masterCategory",
    "subCategory",
    "articleType",
    "baseColour",
    "season",
    "year",
    "usage",
    "productDisplayName",
];

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the catalog plus load diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedCatalog {
    pub catalog: Catalog,
    /// Malformed rows that were skipped (wrong column count, bad id, CSV errors).
    pub row_errors: Vec<RowError>,
    /// Rows dropped because `year` was missing or not a number.
    pub missing_year: usize,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedCatalog {
    pub fn rows_skipped(&self) -> usize {
        self.row_errors.len() + self.missing_year
    }
}

/// Load and normalize a catalog CSV from disk.
pub fn load_catalog(path: &Path) -> Result<IngestedCatalog, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open catalog CSV '{}': {e}", path.display()),
        )
    })?;

    let ingested = read_catalog(file)?;
    tracing::info!(
        path = %path.display(),
        rows_read = ingested.rows_read,
        rows_used = ingested.rows_used,
        "catalog loaded"
    );
    Ok(ingested)
}

/// Parse a catalog from any reader (the file loader and tests share this).
pub fn read_catalog<R: Read>(reader: R) -> Result<IngestedCatalog, AppError> {
    // `flexible` lets us see short/long rows ourselves and skip them with a
    // line number instead of aborting the whole load.
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut missing_year = 0usize;
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(line, error = %e, "skipping unreadable row");
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if record.len() != headers.len() {
            tracing::debug!(line, fields = record.len(), "skipping malformed row");
            row_errors.push(RowError {
                line,
                message: format!(
                    "Expected {} fields, found {}.",
                    headers.len(),
                    record.len()
                ),
            });
            continue;
        }

        match parse_row(&record, &header_map) {
            Ok(Some(r)) => records.push(r),
            Ok(None) => missing_year += 1,
            Err(message) => {
                tracing::debug!(line, %message, "skipping invalid row");
                row_errors.push(RowError { line, message });
            }
        }
    }

    let rows_used = records.len();
    if !row_errors.is_empty() || missing_year > 0 {
        tracing::warn!(
            malformed = row_errors.len(),
            missing_year,
            "some catalog rows were skipped"
        );
    }

    if rows_used == 0 {
        return Err(AppError::new(
            3,
            "No valid rows remain after dropping malformed rows and rows without a year.",
        ));
    }

    Ok(IngestedCatalog {
        catalog: Catalog::new(records),
        row_errors,
        missing_year,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿id"). If we don't strip it, schema validation will
    // incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| !header_map.contains_key(&name.to_ascii_lowercase()))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let list = missing
        .iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::new(2, format!("Missing required column(s): {list}")))
}

/// Parse one row. `Ok(None)` means the row has no usable year and is dropped.
fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Option<Record>, String> {
    let Some(year) = get_optional(record, header_map, "year").and_then(parse_year) else {
        return Ok(None);
    };

    let id_raw = get_optional(record, header_map, "id").ok_or_else(|| "Missing required value: `id`".to_string())?;
    let id = id_raw
        .parse::<i64>()
        .map_err(|_| format!("Invalid `id` '{id_raw}' (expected an integer)."))?;

    let text = |name: &str| get_optional(record, header_map, name).map(str::to_string);

    Ok(Some(Record {
        id,
        gender: text("gender"),
        master_category: text("mastercategory"),
        sub_category: text("subcategory"),
        article_type: text("articletype"),
        base_colour: text("basecolour"),
        season: text("season"),
        usage: text("usage"),
        product_display_name: text("productdisplayname"),
        year,
    }))
}

/// Coerce a year cell to an integer.
///
/// Spreadsheet exports frequently write whole numbers as `2012.0`, so a
/// finite float is accepted and truncated.
fn parse_year(s: &str) -> Option<i32> {
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let v = s.parse::<f64>().ok()?;
    if !v.is_finite() || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return None;
    }
    Some(v.trunc() as i32)
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dimension;

    const HEADER: &str = "id,gender,masterCategory,subCategory,articleType,baseColour,season,year,usage,productDisplayName\n";

    fn ingest(body: &str) -> Result<IngestedCatalog, AppError> {
        read_catalog(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn parses_well_formed_rows_in_file_order() {
        let data = ingest(concat!(
            "15970,Men,Apparel,Topwear,Shirts,Navy Blue,Fall,2011,Casual,Turtle Check Men Navy Blue Shirt\n",
            "39386,Men,Apparel,Bottomwear,Jeans,Blue,Summer,2012,Casual,Peter England Men Party Blue Jeans\n",
        ))
        .unwrap();

        assert_eq!(data.rows_read, 2);
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.rows_skipped(), 0);
        let records = data.catalog.records();
        assert_eq!(records[0].id, 15970);
        assert_eq!(records[0].base_colour.as_deref(), Some("Navy Blue"));
        assert_eq!(records[1].year, 2012);
        assert_eq!(records[1].text(Dimension::ArticleType), Some("Jeans"));
    }

    #[test]
    fn drops_rows_without_a_usable_year() {
        let data = ingest(concat!(
            "1,Men,Apparel,Topwear,Shirts,Black,Fall,,Casual,A\n",
            "2,Men,Apparel,Topwear,Shirts,Black,Fall,n/a,Casual,B\n",
            "3,Men,Apparel,Topwear,Shirts,Black,Fall,2013.0,Casual,C\n",
        ))
        .unwrap();

        assert_eq!(data.missing_year, 2);
        assert_eq!(data.rows_used, 1);
        assert_eq!(data.catalog.records()[0].year, 2013);
    }

    #[test]
    fn skips_rows_with_wrong_column_count() {
        let data = ingest(concat!(
            "1,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,Plain\n",
            "2,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,Name, with comma\n",
            "3,Women,Apparel\n",
        ))
        .unwrap();

        assert_eq!(data.rows_used, 1);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn empty_optional_fields_become_absent() {
        let data = ingest("7,,Accessories,Watches,Watches,,,2016,,\n").unwrap();
        let r = &data.catalog.records()[0];
        assert_eq!(r.gender, None);
        assert_eq!(r.base_colour, None);
        assert_eq!(r.usage, None);
        assert_eq!(r.master_category.as_deref(), Some("Accessories"));
    }

    #[test]
    fn invalid_id_is_a_row_error() {
        let data = ingest(concat!(
            "abc,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,X\n",
            "5,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,Y\n",
        ))
        .unwrap();
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 2);
        assert_eq!(data.rows_used, 1);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = read_catalog("id,gender,year\n1,Men,2012\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("`masterCategory`"));
        assert!(err.message().contains("`productDisplayName`"));
    }

    #[test]
    fn header_matching_ignores_case_and_bom() {
        let csv = "\u{feff}ID,Gender,MasterCategory,SubCategory,ArticleType,BaseColour,Season,Year,Usage,ProductDisplayName\n\
                   1,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,X\n";
        let data = read_catalog(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_used, 1);
    }

    #[test]
    fn no_usable_rows_is_an_error() {
        let err = ingest("1,Men,Apparel,Topwear,Shirts,Black,Fall,,Casual,X\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn parse_year_accepts_integral_floats() {
        assert_eq!(parse_year("2012"), Some(2012));
        assert_eq!(parse_year("2012.0"), Some(2012));
        assert_eq!(parse_year("NaN"), None);
        assert_eq!(parse_year("twenty"), None);
    }
}
