use std::path::Path;

use calamine::{open_workbook_auto, Reader};

use crate::loader::LoadError;

/// One spreadsheet row. Only the mineral and its producing countries are
/// required; missing figures are estimated later.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    /// 1-based spreadsheet row, counting the header.
    pub line: usize,
    pub mineral: String,
    pub countries: String,
    pub uses: String,
    pub production: Option<f64>,
    pub reserves: Option<f64>,
    pub price: Option<f64>,
    pub year: Option<i32>,
    pub status: Option<String>,
}

const MINERAL: &[&str] = &["critical mineral", "mineral", "mineral_name", "mineral name"];
const COUNTRIES: &[&str] = &[
    "primary african producing countries",
    "producing countries",
    "countries",
    "country",
];
const USES: &[&str] = &["key uses (criticality)", "key uses", "uses"];
const PRODUCTION: &[&str] = &["production volume", "production_volume", "production"];
const RESERVES: &[&str] = &["reserves"];
const PRICE: &[&str] = &["price", "price (usd/tonne)", "price_usd"];
const YEAR: &[&str] = &["year"];
const STATUS: &[&str] = &["status"];

const MAX_YEAR: i32 = 9999;

/// Read the workbook (or CSV file) at `path` into rows.
pub fn read_rows(path: &Path, sheet_name: &str) -> Result<Vec<SheetRow>, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingSpreadsheet(path.to_path_buf()));
    }

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let table = if is_csv {
        read_csv(path)?
    } else {
        read_workbook(path, sheet_name)?
    };
    rows_from_table(&table)
}

fn read_workbook(path: &Path, sheet_name: &str) -> Result<Vec<Vec<String>>, LoadError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| LoadError::Spreadsheet(format!("{}: {e}", path.display())))?;

    let names = workbook.sheet_names();
    let name = if names.iter().any(|n| n == sheet_name) {
        sheet_name.to_string()
    } else {
        let first = names
            .first()
            .cloned()
            .ok_or_else(|| LoadError::Spreadsheet(format!("{} has no sheets", path.display())))?;
        tracing::warn!("Sheet '{sheet_name}' not found, reading '{first}' instead");
        first
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| LoadError::Spreadsheet(format!("sheet '{name}': {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::Spreadsheet(format!("{}: {e}", path.display())))?;

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| LoadError::Spreadsheet(format!("{}: {e}", path.display())))
        })
        .collect()
}

/// Interpret a header row plus data rows. Columns are located by header name.
pub fn rows_from_table(table: &[Vec<String>]) -> Result<Vec<SheetRow>, LoadError> {
    let Some((header, body)) = table.split_first() else {
        return Err(LoadError::Spreadsheet("spreadsheet is empty".to_string()));
    };

    let column = |aliases: &[&str]| {
        header
            .iter()
            .position(|h| aliases.contains(&h.trim().to_lowercase().as_str()))
    };

    let mineral_col = column(MINERAL)
        .ok_or_else(|| LoadError::Spreadsheet("missing 'Critical Mineral' column".to_string()))?;
    let countries_col = column(COUNTRIES).ok_or_else(|| {
        LoadError::Spreadsheet("missing 'Primary African Producing Countries' column".to_string())
    })?;
    let uses_col = column(USES);
    let production_col = column(PRODUCTION);
    let reserves_col = column(RESERVES);
    let price_col = column(PRICE);
    let year_col = column(YEAR);
    let status_col = column(STATUS);

    let mut rows = Vec::with_capacity(body.len());
    for (line, cells) in body.iter().enumerate() {
        let text = |col: Option<usize>| {
            col.and_then(|c| cells.get(c))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        let mineral = text(Some(mineral_col));
        if mineral.is_empty() {
            continue;
        }

        // Header is row 1 in spreadsheet terms.
        let row_number = line + 2;
        rows.push(SheetRow {
            line: row_number,
            mineral,
            countries: text(Some(countries_col)),
            uses: text(uses_col),
            production: parse_number(&text(production_col), row_number)?,
            reserves: parse_number(&text(reserves_col), row_number)?,
            price: parse_number(&text(price_col), row_number)?,
            year: parse_year(&text(year_col), row_number)?,
            status: Some(text(status_col)).filter(|s| !s.is_empty()),
        });
    }
    Ok(rows)
}

fn parse_year(raw: &str, row: usize) -> Result<Option<i32>, LoadError> {
    let Some(value) = parse_number(raw, row)? else {
        return Ok(None);
    };
    if value.fract() != 0.0 || value > f64::from(MAX_YEAR) {
        return Err(LoadError::Spreadsheet(format!(
            "row {row}: '{raw}' is not a valid year"
        )));
    }
    Ok(Some(value as i32))
}

fn parse_number(raw: &str, row: usize) -> Result<Option<f64>, LoadError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(LoadError::Spreadsheet(format!(
            "row {row}: '{raw}' is not a non-negative number"
        ))),
    }
}
