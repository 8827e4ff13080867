use std::path::Path;

use serde_json::{Value, json};

use crate::cache::store::ContentCache;
use crate::codec::table::{
    DataframeMetadata, NumericMatrix, Styler, Table, fit_headers, read_delimited, to_numeric,
};
use crate::components::base::{Clearable, Component, Configurable};
use crate::foundation::choice::choice_enum;
use crate::foundation::error::{BindError, BindResult};

/// Column count used when neither `headers` nor `col_count` is given.
const DEFAULT_COLUMNS: usize = 3;

choice_enum! {
    /// Representation a table is handed to the user function in.
    pub enum DataframeType ("type", default = Pandas) {
        /// Labeled table.
        Pandas => "pandas",
        /// Numeric matrix.
        Numpy => "numpy",
        /// Rows of cells.
        Array => "array",
    }
}

choice_enum! {
    /// Whether users may add or remove rows or columns.
    pub enum CountMode ("count", default = Dynamic) {
        /// The count cannot change.
        Fixed => "fixed",
        /// Rows or columns can be added and removed.
        Dynamic => "dynamic",
    }
}

choice_enum! {
    /// How a column is rendered and edited.
    pub enum ColumnType ("datatype", default = Str) {
        /// Plain text.
        Str => "str",
        /// Number.
        Number => "number",
        /// Checkbox.
        Bool => "bool",
        /// Date.
        Date => "date",
        /// Markdown text.
        Markdown => "markdown",
        /// Raw HTML.
        Html => "html",
        /// Image reference.
        Image => "image",
    }
}

/// A row or column count with its edit mode. Accepts `n` or `[n, "fixed"|"dynamic"]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "RawCount", into = "(usize, CountMode)")]
pub struct Count {
    /// Number of rows or columns.
    pub n: usize,
    /// Edit mode.
    pub mode: CountMode,
}

impl Count {
    /// A dynamic count of `n`.
    pub fn dynamic(n: usize) -> Self {
        Self {
            n,
            mode: CountMode::Dynamic,
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawCount {
    Plain(usize),
    Pair(usize, CountMode),
}

impl From<RawCount> for Count {
    fn from(raw: RawCount) -> Self {
        match raw {
            RawCount::Plain(n) => Self::dynamic(n),
            RawCount::Pair(n, mode) => Self { n, mode },
        }
    }
}

impl From<Count> for (usize, CountMode) {
    fn from(c: Count) -> Self {
        (c.n, c.mode)
    }
}

/// Column datatypes: one for the whole sheet, or one per column.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Datatype {
    /// Same type for every column.
    All(ColumnType),
    /// One type per column.
    PerColumn(Vec<ColumnType>),
}

impl Default for Datatype {
    fn default() -> Self {
        Self::All(ColumnType::Str)
    }
}

/// Wire payload of [`Dataframe`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DataframeData {
    /// Column names.
    pub headers: Vec<String>,
    /// Row-major cells.
    pub data: Vec<Vec<Value>>,
    /// Display and style strings for styled tables.
    #[serde(default)]
    pub metadata: Option<DataframeMetadata>,
}

/// Values accepted and produced by [`Dataframe`].
#[derive(Clone, Debug, PartialEq)]
pub enum DataframeValue {
    /// Labeled table.
    Table(Table),
    /// Table with presentation rules.
    Styled(Styler),
    /// Numeric matrix.
    Matrix(NumericMatrix),
    /// Rows of cells.
    Rows(Vec<Vec<Value>>),
    /// One-dimensional list: each item becomes a row, arrays are taken as whole rows.
    List(Vec<Value>),
    /// Already-shaped data with optional headers and metadata.
    Dict {
        /// Column names; empty uses the configured headers.
        headers: Vec<String>,
        /// Row-major cells.
        data: Vec<Vec<Value>>,
        /// Passed through unchanged.
        metadata: Option<DataframeMetadata>,
    },
    /// Path of a `.csv` or `.tsv` file.
    CsvPath(String),
}

impl DataframeValue {
    pub(crate) fn summary(&self) -> Value {
        match self {
            Self::Table(t) => json!({"headers": t.headers, "data": t.rows}),
            Self::Styled(s) => json!({"headers": s.table.headers, "data": s.table.rows, "styled": true}),
            Self::Matrix(m) => json!({"shape": [m.rows, m.cols], "data": m.to_rows()}),
            Self::Rows(rows) => json!(rows),
            Self::List(items) => json!(items),
            Self::Dict { headers, data, .. } => json!({"headers": headers, "data": data}),
            Self::CsvPath(p) => json!(p),
        }
    }

    /// Headers, rows and metadata; the headers are empty when the value carries none.
    fn parts(&self) -> BindResult<(Vec<String>, Vec<Vec<Value>>, Option<DataframeMetadata>)> {
        Ok(match self {
            Self::Table(t) => (t.headers.clone(), t.rows.clone(), None),
            Self::Styled(s) => {
                let visible = s.visible_table();
                (visible.headers, visible.rows, Some(s.metadata()))
            }
            Self::Matrix(m) => (vec![], m.to_rows(), None),
            Self::Rows(rows) => (vec![], rows.clone(), None),
            Self::List(items) => (vec![], list_rows(items), None),
            Self::Dict {
                headers,
                data,
                metadata,
            } => (headers.clone(), data.clone(), metadata.clone()),
            Self::CsvPath(p) => {
                let t = read_delimited(Path::new(p))?;
                (t.headers, t.rows, None)
            }
        })
    }
}

/// Rows for a one-dimensional list.
fn list_rows(items: &[Value]) -> Vec<Vec<Value>> {
    match items.first() {
        Some(Value::Array(_)) => items
            .iter()
            .map(|v| match v {
                Value::Array(row) => row.clone(),
                other => vec![other.clone()],
            })
            .collect(),
        _ => items.iter().map(|v| vec![v.clone()]).collect(),
    }
}

fn default_row_count() -> Count {
    Count::dynamic(1)
}

/// [`Dataframe`] options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DataframeOptions {
    /// Column names; defaults to `"1"`, `"2"`, ... for every column.
    pub headers: Option<Vec<String>>,
    /// Representation handed to the function.
    #[serde(rename = "type")]
    pub kind: DataframeType,
    /// Initial row count.
    #[serde(default = "default_row_count")]
    pub row_count: Count,
    /// Initial column count; defaults to the number of headers.
    pub col_count: Option<Count>,
    /// Column datatypes.
    pub datatype: Datatype,
}

impl Default for DataframeOptions {
    fn default() -> Self {
        Self {
            headers: None,
            kind: DataframeType::Pandas,
            row_count: default_row_count(),
            col_count: None,
            datatype: Datatype::default(),
        }
    }
}

/// Editable or display-only table.
#[derive(Clone, Debug)]
pub struct Dataframe {
    options: DataframeOptions,
    headers: Vec<String>,
}

impl Configurable for Dataframe {
    type Options = DataframeOptions;

    fn from_options(mut options: DataframeOptions) -> BindResult<Self> {
        let col_count = options.col_count.unwrap_or_else(|| {
            Count::dynamic(options.headers.as_ref().map_or(DEFAULT_COLUMNS, Vec::len))
        });
        if let Some(headers) = &options.headers
            && headers.len() != col_count.n
        {
            return Err(BindError::config(format!(
                "The length of the headers list must be equal to the col_count int.\n\
                 The column count is set to {} but `headers` has {} items. \
                 Check the values passed to `col_count` and `headers`.",
                col_count.n,
                headers.len()
            )));
        }
        let headers = options
            .headers
            .clone()
            .unwrap_or_else(|| (1..=col_count.n).map(|i| i.to_string()).collect());
        options.col_count = Some(col_count);
        options.headers = Some(headers.clone());
        Ok(Self { options, headers })
    }
}

impl Dataframe {
    fn table(&self, data: &DataframeData) -> BindResult<Table> {
        let rows = if data.data.len() == 1 && data.data[0].is_empty() {
            vec![]
        } else {
            data.data.clone()
        };
        let width = rows.first().map_or(data.headers.len(), Vec::len);
        let headers = if data.headers.is_empty() {
            (0..width).map(|i| i.to_string()).collect()
        } else {
            data.headers.clone()
        };
        if let Some(row) = rows.iter().find(|r| r.len() != headers.len()) {
            return Err(BindError::validation(format!(
                "{} columns passed, passed data had {} columns",
                headers.len(),
                row.len()
            )));
        }
        Ok(Table::new(headers, rows))
    }
}

impl Component for Dataframe {
    type Payload = DataframeData;
    type Value = DataframeValue;
    type Config = DataframeOptions;

    fn tag(&self) -> &'static str {
        "dataframe"
    }

    fn config(&self) -> &DataframeOptions {
        &self.options
    }

    fn preprocess(
        &self,
        _cache: &ContentCache,
        payload: Option<DataframeData>,
    ) -> BindResult<Option<DataframeValue>> {
        let Some(data) = payload else {
            return Ok(None);
        };
        Ok(Some(match self.options.kind {
            DataframeType::Pandas => DataframeValue::Table(self.table(&data)?),
            DataframeType::Numpy => DataframeValue::Matrix(to_numeric(&data.data)?),
            DataframeType::Array => DataframeValue::Rows(data.data),
        }))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn postprocess(
        &self,
        _cache: &ContentCache,
        value: Option<DataframeValue>,
    ) -> BindResult<Option<DataframeData>> {
        let Some(value) = value else {
            return Ok(self.empty_payload());
        };
        let (own, data, metadata) = value.parts()?;
        let headers = if own.is_empty() { self.headers.clone() } else { own };
        let width = match data.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => {
                return Ok(Some(DataframeData {
                    headers,
                    data: vec![],
                    metadata: None,
                }));
            }
        };
        Ok(Some(DataframeData {
            headers: fit_headers(&headers, width),
            data,
            metadata,
        }))
    }

    fn example_payload(&self) -> DataframeData {
        DataframeData {
            headers: vec!["a".to_string(), "b".to_string()],
            data: vec![vec![json!("foo"), json!("bar")]],
            metadata: None,
        }
    }

    fn example_value(&self) -> DataframeValue {
        DataframeValue::Dict {
            headers: vec!["a".to_string(), "b".to_string()],
            data: vec![vec![json!("foo"), json!("bar")]],
            metadata: None,
        }
    }

    fn api_info(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "headers": {"type": "array", "items": {"type": "string"}},
                "data": {"type": "array", "items": {"type": "array", "items": {}}},
                "metadata": {
                    "anyOf": [
                        {
                            "type": "object",
                            "properties": {
                                "display_value": {"type": "array", "items": {"type": "array", "items": {"type": "string"}}},
                                "styling": {"type": "array", "items": {"type": "array", "items": {"type": "string"}}}
                            }
                        },
                        {"type": "null"}
                    ]
                }
            },
            "required": ["headers", "data"]
        })
    }
}

impl Clearable for Dataframe {
    fn empty_payload(&self) -> Option<DataframeData> {
        Some(DataframeData {
            headers: self.headers.clone(),
            data: vec![],
            metadata: None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/dataframe.rs"]
mod tests;
