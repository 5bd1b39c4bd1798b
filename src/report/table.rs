use std::collections::HashMap;
use std::fmt;

use crate::error::{RecordError, Result};
use crate::record::{self, Value};

/// Two-dimensional view of recorded values. Rows and columns keep the order
/// in which they were first seen; missing cells read as the default value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: Option<String>,
    pub left_upper: Option<String>,
    default_value: Value,
    row_keys: Vec<String>,
    col_keys: Vec<String>,
    values: HashMap<String, HashMap<String, Value>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default_value: impl Into<Value>) -> Self {
        self.default_value = default_value.into();
        self
    }

    /// Empty table sharing this one's name, caption and default.
    fn empty_like(&self) -> Self {
        Self {
            name: self.name.clone(),
            left_upper: self.left_upper.clone(),
            default_value: self.default_value.clone(),
            ..Self::default()
        }
    }

    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    pub fn col_keys(&self) -> &[String] {
        &self.col_keys
    }

    pub fn rows_count(&self) -> usize {
        self.row_keys.len()
    }

    pub fn cols_count(&self) -> usize {
        self.col_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() || self.col_keys.is_empty()
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    pub fn append(&mut self, row: impl Into<String>, col: impl Into<String>, value: impl Into<Value>) {
        let row = row.into();
        let col = col.into();
        if !self.values.contains_key(&row) {
            self.row_keys.push(row.clone());
        }
        if !self.col_keys.contains(&col) {
            self.col_keys.push(col.clone());
        }
        self.values.entry(row).or_default().insert(col, value.into());
    }

    pub fn append_row<I, C, V>(&mut self, row: impl Into<String>, cells: I)
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        let row = row.into();
        for (col, value) in cells {
            self.append(row.clone(), col, value);
        }
    }

    pub fn get(&self, row: &str, col: &str) -> &Value {
        self.values
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&self.default_value)
    }

    pub fn get_row(&self, row: &str) -> Vec<(String, Value)> {
        self.col_keys
            .iter()
            .map(|col| (col.clone(), self.get(row, col).clone()))
            .collect()
    }

    pub fn get_column(&self, col: &str) -> Vec<(String, Value)> {
        self.row_keys
            .iter()
            .map(|row| (row.clone(), self.get(row, col).clone()))
            .collect()
    }

    pub fn transpose(&self) -> Table {
        let mut flipped = self.empty_like();
        for row in &self.row_keys {
            for col in &self.col_keys {
                flipped.append(col.clone(), row.clone(), self.get(row, col));
            }
        }
        flipped
    }

    /// Copy with rows and columns in alphabetical order.
    pub fn sorted(&self) -> Table {
        let mut rows = self.row_keys.clone();
        let mut cols = self.col_keys.clone();
        rows.sort();
        cols.sort();
        let mut sorted = self.empty_like();
        for row in &rows {
            for col in &cols {
                sorted.append(row.clone(), col.clone(), self.get(row, col));
            }
        }
        sorted
    }

    /// Header row first (blank corner), columns in alphabetical order.
    pub fn to_csv(&self, separator: &str) -> String {
        let mut cols = self.col_keys.clone();
        cols.sort();
        let mut lines = Vec::with_capacity(self.row_keys.len() + 1);
        lines.push(format!("{}{}", separator, cols.join(separator)));
        for row in &self.row_keys {
            let mut cells = vec![row.clone()];
            cells.extend(cols.iter().map(|col| self.get(row, col).to_string()));
            lines.push(cells.join(separator));
        }
        lines.join("\n")
    }

    pub fn pretty_string(&self, separator: &str) -> String {
        let mut lines = Vec::new();
        if let Some(name) = &self.name {
            lines.push(name.clone());
        }
        if self.is_empty() {
            lines.push("Empty Table".to_string());
            return lines.join("\n");
        }

        let corner = self.left_upper.clone().unwrap_or_default();
        let row_width = self
            .row_keys
            .iter()
            .map(|row| row.chars().count())
            .chain(std::iter::once(corner.chars().count()))
            .max()
            .unwrap_or(0);
        let col_widths: Vec<usize> = self
            .col_keys
            .iter()
            .map(|col| {
                self.get_column(col)
                    .iter()
                    .map(|(_, value)| value.to_string().chars().count())
                    .chain(std::iter::once(col.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut header = format!("{:>width$}", corner, width = row_width);
        for (col, width) in self.col_keys.iter().zip(&col_widths) {
            header.push_str(&format!("{}{:>width$}", separator, col, width = *width));
        }
        lines.push(header);

        for row in &self.row_keys {
            let mut line = format!("{:>width$}", row, width = row_width);
            for (col, width) in self.col_keys.iter().zip(&col_widths) {
                let cell = self.get(row, col).to_string();
                line.push_str(&format!("{}{:>width$}", separator, cell, width = *width));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Rows as string cells, header first with a blank corner.
    pub fn to_nested_list(&self) -> Vec<Vec<String>> {
        let mut header = vec![" ".to_string()];
        header.extend(self.col_keys.iter().cloned());
        let mut rows = vec![header];
        for row in &self.row_keys {
            let mut cells = vec![row.clone()];
            cells.extend(self.col_keys.iter().map(|col| self.get(row, col).to_string()));
            rows.push(cells);
        }
        rows
    }

    /// Document form read back by [`Table::from_json`]: name, caption and the
    /// rows of [`Table::to_nested_list`] with cells kept as typed values.
    pub fn to_json(&self) -> serde_json::Value {
        let mut header = vec![serde_json::Value::from(" ")];
        header.extend(self.col_keys.iter().map(|col| serde_json::Value::from(col.as_str())));
        let mut rows = vec![serde_json::Value::Array(header)];
        for row in &self.row_keys {
            let mut cells = vec![serde_json::Value::from(row.as_str())];
            cells.extend(
                self.col_keys
                    .iter()
                    .map(|col| serde_json::to_value(self.get(row, col)).unwrap_or(serde_json::Value::Null)),
            );
            rows.push(serde_json::Value::Array(cells));
        }
        serde_json::json!({
            "TableName": self.name,
            "LeftUpper": self.left_upper,
            "Table": rows,
        })
    }

    /// Builds a table from `{"TableName", "LeftUpper", "Table": [[corner,
    /// cols...], [row, cells...], ...]}`.
    pub fn from_json(document: &serde_json::Value) -> Result<Table> {
        let mut table = Table {
            name: optional_text(document, "TableName")?,
            left_upper: optional_text(document, "LeftUpper")?,
            ..Table::default()
        };
        let rows = document
            .get("Table")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| RecordError::TableFormat("missing \"Table\" rows".to_string()))?;
        let Some((header, body)) = rows.split_first() else {
            return Ok(table);
        };
        let header = cells_of(header)?;
        let cols = header
            .get(1..)
            .unwrap_or_default()
            .iter()
            .map(label_of)
            .collect::<Vec<_>>();
        for row in body {
            let cells = cells_of(row)?;
            let Some((row_key, values)) = cells.split_first() else {
                return Err(RecordError::TableFormat("empty row".to_string()));
            };
            if values.len() != cols.len() {
                return Err(RecordError::TableFormat(format!(
                    "row {} has {} cells, header has {}",
                    label_of(row_key),
                    values.len(),
                    cols.len()
                )));
            }
            for (col, value) in cols.iter().zip(values) {
                table.append(label_of(row_key), col.clone(), value_of(value)?);
            }
        }
        Ok(table)
    }

    pub fn to_html(&self) -> String {
        let rows = self.to_nested_list();
        let name = self.name.as_deref().unwrap_or("");
        let mut html = String::from("<table>\n");
        html.push_str("<tr class='headrow'>\n");
        html.push_str(&format!("<th colspan='{}'>{}</th>\n", rows[0].len(), escape_html(name)));
        html.push_str("</tr>\n");
        html.push_str("<tr class='bodyrow'>\n");
        for cell in &rows[0] {
            html.push_str(&format!("<th>{}</th>\n", escape_html(cell)));
        }
        html.push_str("</tr>\n");
        for row in &rows[1..] {
            html.push_str("<tr class='bodyrow'>\n");
            html.push_str(&format!("<th>{}</th>\n", escape_html(&row[0])));
            for cell in &row[1..] {
                html.push_str(&format!("<td>{}</td>\n", escape_html(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>");
        html
    }
}

/// Renders with the installed `table_separator`.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_string(&record::config().table_separator))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
}

fn optional_text(document: &serde_json::Value, field: &str) -> Result<Option<String>> {
    match document.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(RecordError::TableFormat(format!("{} is not text: {}", field, other))),
    }
}

fn cells_of(row: &serde_json::Value) -> Result<&[serde_json::Value]> {
    row.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| RecordError::TableFormat(format!("row is not a list: {}", row)))
}

/// Row and column keys: text as is, anything else in its JSON form.
fn label_of(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn value_of(cell: &serde_json::Value) -> Result<Value> {
    Ok(match cell {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(int) => Value::Int(int),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(text) => Value::Text(text.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(value_of).collect::<Result<_>>()?),
        serde_json::Value::Object(_) => {
            return Err(RecordError::TableFormat(format!("nested object in cell: {}", cell)))
        }
    })
}
