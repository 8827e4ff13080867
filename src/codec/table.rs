use std::path::Path;

use anyhow::Context as _;
use serde_json::Value;

use crate::cache::filename::extension_of;
use crate::foundation::error::{BindError, BindResult};

/// Labeled 2-D table: named columns over rows of JSON cells.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Table {
    /// Column names.
    pub headers: Vec<String>,
    /// Row-major cells.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    /// `(rows, columns)`; the column count is the widest of headers and first row.
    pub fn shape(&self) -> (usize, usize) {
        let first = self.rows.first().map_or(0, Vec::len);
        (self.rows.len(), first.max(self.headers.len()))
    }

    /// Return `true` when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the column called `name`.
    pub fn column(&self, name: &str) -> Option<Vec<Value>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// Copy of the table without the columns at `hidden` indices.
    pub fn without_columns(&self, hidden: &[usize]) -> Self {
        let keep = |i: &usize| !hidden.contains(i);
        Self {
            headers: self
                .headers
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(i))
                .map(|(_, h)| h.clone())
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|r| {
                    r.iter()
                        .enumerate()
                        .filter(|(i, _)| keep(i))
                        .map(|(_, c)| c.clone())
                        .collect()
                })
                .collect(),
        }
    }
}

/// Dense row-major matrix of `f64`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NumericMatrix {
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub cols: usize,
    /// Row-major values.
    pub data: Vec<f64>,
}

impl NumericMatrix {
    /// Value at `(r, c)`.
    pub fn get(&self, r: usize, c: usize) -> Option<f64> {
        if r >= self.rows || c >= self.cols {
            return None;
        }
        self.data.get(r * self.cols + c).copied()
    }

    /// Rows as JSON cells; integral values are written as integers.
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.data
            .chunks(self.cols)
            .map(|row| row.iter().map(|&x| number_cell(x)).collect())
            .collect()
    }
}

fn number_cell(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        Value::from(x as i64)
    } else {
        serde_json::Number::from_f64(x).map_or(Value::Null, Value::Number)
    }
}

/// Convert rows of cells into a numeric matrix.
///
/// Booleans count as 0/1 and nulls as NaN; rows must all have the same width.
pub fn to_numeric(rows: &[Vec<Value>]) -> BindResult<NumericMatrix> {
    let cols = rows.first().map_or(0, Vec::len);
    let mut data = Vec::with_capacity(rows.len() * cols);
    for (r, row) in rows.iter().enumerate() {
        if row.len() != cols {
            return Err(BindError::validation(format!(
                "row {r} has {} cells but row 0 has {cols}; a numeric array must be rectangular",
                row.len()
            )));
        }
        for (c, cell) in row.iter().enumerate() {
            let x = match cell {
                Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                Value::Bool(b) => f64::from(u8::from(*b)),
                Value::Null => f64::NAN,
                Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                    BindError::validation(format!(
                        "cell ({r}, {c}) value {s:?} is not numeric"
                    ))
                })?,
                other => {
                    return Err(BindError::validation(format!(
                        "cell ({r}, {c}) value {other} is not numeric"
                    )));
                }
            };
            data.push(x);
        }
    }
    // An empty `[[]]` body is zero rows.
    let rows_n = if cols == 0 { 0 } else { rows.len() };
    Ok(NumericMatrix {
        rows: rows_n,
        cols,
        data,
    })
}

/// Headers resized to `width`: truncated, or padded with `"{i}"` for the missing 1-based positions.
pub fn fit_headers(headers: &[String], width: usize) -> Vec<String> {
    if headers.len() >= width {
        return headers[..width].to_vec();
    }
    headers
        .iter()
        .cloned()
        .chain((headers.len() + 1..=width).map(|i| i.to_string()))
        .collect()
}

/// Read a delimited text file into a table; `.tsv` files use tabs, everything else commas.
///
/// The first record is the header row. Cells are typed as integer, float, boolean or null when
/// they parse as one, and kept as strings otherwise.
pub fn read_delimited(path: &Path) -> BindResult<Table> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read table '{}'", path.display()))
        .map_err(|e| BindError::io(format!("{e:#}")))?;
    let delimiter = match extension_of(&path.to_string_lossy()).as_deref() {
        Some("tsv") => '\t',
        _ => ',',
    };
    let mut records = parse_records(&text, delimiter).into_iter();
    let headers = records.next().unwrap_or_default();
    let rows = records
        .map(|rec| rec.iter().map(|c| infer_cell(c)).collect())
        .collect();
    tracing::debug!(path = %path.display(), columns = headers.len(), "read delimited table");
    Ok(Table::new(headers, rows))
}

/// Split delimited text into records, honoring double-quoted fields with `""` escapes.
pub(crate) fn parse_records(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' if field.is_empty() => in_quotes = true,
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            c if c == delimiter => record.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    records
}

/// Type a raw delimited cell.
pub(crate) fn infer_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    match s {
        "True" | "true" | "TRUE" => return Value::Bool(true),
        "False" | "false" | "FALSE" => return Value::Bool(false),
        "NaN" | "nan" | "null" | "NULL" | "None" | "NA" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}

/// CSS-like rule applied to the cells whose id appears in `selectors`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StyleRule {
    /// Cell ids such as `row0_col1`.
    pub selectors: Vec<String>,
    /// `(property, value)` pairs.
    pub props: Vec<(String, String)>,
}

impl StyleRule {
    /// Rule for a single cell.
    pub fn cell(row: usize, col: usize, props: &[(&str, &str)]) -> Self {
        Self {
            selectors: vec![cell_id(row, col)],
            props: props
                .iter()
                .map(|(p, v)| ((*p).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    fn render(&self) -> String {
        self.props
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Identifier of the cell at `(row, col)` in the unhidden table.
pub fn cell_id(row: usize, col: usize) -> String {
    format!("row{row}_col{col}")
}

/// Display precision used when a [`Styler`] does not set one.
pub const DEFAULT_PRECISION: usize = 6;

/// A table plus presentation: float precision, per-cell style rules and hidden columns.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Styler {
    /// Underlying data.
    pub table: Table,
    /// Digits after the decimal point for float cells.
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Style rules; selectors refer to cell ids in the full table.
    #[serde(default)]
    pub rules: Vec<StyleRule>,
    /// Column indices left out of the rendered table.
    #[serde(default)]
    pub hidden_columns: Vec<usize>,
}

fn default_precision() -> usize {
    DEFAULT_PRECISION
}

/// Per-cell display strings and style strings, parallel to the data rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DataframeMetadata {
    /// Human-readable rendering of each cell.
    pub display_value: Vec<Vec<String>>,
    /// `"; "`-joined `prop: value` declarations for each cell, empty when unstyled.
    pub styling: Vec<Vec<String>>,
}

impl Styler {
    /// Styler with default precision and no rules.
    pub fn new(table: Table) -> Self {
        Self {
            table,
            precision: DEFAULT_PRECISION,
            rules: Vec::new(),
            hidden_columns: Vec::new(),
        }
    }

    /// Set the float precision.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Append a style rule.
    pub fn with_rule(mut self, rule: StyleRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Hide the column at `index`.
    pub fn hide_column(mut self, index: usize) -> Self {
        self.hidden_columns.push(index);
        self
    }

    /// The table with hidden columns removed.
    pub fn visible_table(&self) -> Table {
        self.table.without_columns(&self.hidden_columns)
    }

    /// Display and style strings for every visible cell.
    ///
    /// When several rules select the same cell their declarations are concatenated in rule order.
    pub fn metadata(&self) -> DataframeMetadata {
        let mut styles: std::collections::HashMap<&str, Vec<String>> =
            std::collections::HashMap::new();
        for rule in &self.rules {
            let rendered = rule.render();
            for sel in &rule.selectors {
                styles.entry(sel.as_str()).or_default().push(rendered.clone());
            }
        }

        let mut meta = DataframeMetadata::default();
        for (r, row) in self.table.rows.iter().enumerate() {
            let mut display = Vec::new();
            let mut styling = Vec::new();
            for (c, cell) in row.iter().enumerate() {
                if self.hidden_columns.contains(&c) {
                    continue;
                }
                display.push(display_cell(cell, self.precision));
                styling.push(
                    styles
                        .get(cell_id(r, c).as_str())
                        .map(|s| s.join("; "))
                        .unwrap_or_default(),
                );
            }
            meta.display_value.push(display);
            meta.styling.push(styling);
        }
        meta
    }
}

/// Render one cell the way it is shown to users.
pub fn display_cell(cell: &Value, precision: usize) -> String {
    match cell {
        Value::Null => "nan".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) if n.is_f64() => {
            format!("{:.*}", precision, n.as_f64().unwrap_or(f64::NAN))
        }
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/table.rs"]
mod tests;
