//! CSV/TSV codec
//!
//! Record separator is `\n` with `\r\n` normalized on the way in. Fields
//! containing the separator, a double quote, or a newline are wrapped in
//! double quotes with internal quotes doubled. Trailing empty cells and
//! trailing empty rows survive a round trip through the grid's extent;
//! serialization is dense from `(1,1)` to the greatest filled indices.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextruxError};
use crate::grid::{GridSource, InMemoryGrid};

/// Field separator of a delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    /// Comma-separated values
    Comma,
    /// Tab-separated values
    Tab,
}

impl Delimiter {
    /// The separator character.
    pub fn char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
        }
    }

    /// Pick a delimiter from a file extension; anything but `tsv` is CSV.
    pub fn from_extension(extension: &str) -> Self {
        if extension.eq_ignore_ascii_case("tsv") {
            Self::Tab
        } else {
            Self::Comma
        }
    }
}

/// Parse delimited text into a grid.
///
/// Quoted fields keep separators, quotes, and newlines; an unterminated
/// quote is an error. Unquoted quote characters are taken literally.
pub fn parse_grid(text: &str, delimiter: Delimiter) -> Result<InMemoryGrid> {
    if text.is_empty() {
        return Ok(InMemoryGrid::default());
    }

    let normalized = text.replace("\r\n", "\n");
    let sep = delimiter.char();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_opens_field = false;
    let mut line = 1usize;

    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        } else if c == '"' && field.is_empty() && !quote_opens_field {
            in_quotes = true;
            quote_opens_field = true;
        } else if c == sep {
            record.push(std::mem::take(&mut field));
            quote_opens_field = false;
        } else if c == '\n' {
            record.push(std::mem::take(&mut field));
            rows.push(std::mem::take(&mut record));
            quote_opens_field = false;
            line += 1;
        } else {
            field.push(c);
        }
    }
    if in_quotes {
        return Err(TextruxError::malformed_input(line, "unterminated quoted field"));
    }
    record.push(field);
    rows.push(record);

    let row_count = rows.len();
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut grid = InMemoryGrid::new(row_count, col_count);
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.trim().is_empty() {
                grid.set_cell(r + 1, c + 1, value.clone())?;
            }
        }
    }
    Ok(grid)
}

/// Serialize a grid densely from `(1,1)` to the greatest filled indices.
pub fn write_grid(grid: &dyn GridSource, delimiter: Delimiter) -> String {
    let sep = delimiter.char();
    let mut max_row = 0;
    let mut max_col = 0;
    for row in 1..=grid.row_count() {
        for col in 1..=grid.col_count() {
            if !grid.cell(row, col).trim().is_empty() {
                max_row = max_row.max(row);
                max_col = max_col.max(col);
            }
        }
    }
    if max_row == 0 {
        return String::new();
    }

    let mut lines = Vec::with_capacity(max_row);
    for row in 1..=max_row {
        let fields: Vec<String> = (1..=max_col)
            .map(|col| escape_field(grid.cell(row, col), sep))
            .collect();
        lines.push(fields.join(&sep.to_string()));
    }
    lines.join("\n")
}

fn escape_field(value: &str, sep: char) -> String {
    if value.contains(sep) || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
