// Copyright 2025 RisingWave Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Schema-on-read file parsing.
//!
//! Rows look like `<1> <hello> <1.5>`; a field may be empty (`<>`) or a
//! quoted string containing spaces. The schema is inferred from a prefix of
//! the file: per column the widest type wins, ordered
//! bool < int < float < string.

use std::path::Path;

use eddy_common::catalog::Schema;
use eddy_common::types::{Cell, CellType};

use crate::error::{Error, Result};

/// How many leading rows participate in schema inference.
const INFER_ROWS: usize = 500;

pub(crate) struct SorTable {
    pub schema: Schema,
    pub rows: Vec<Vec<Cell>>,
}

/// Reads at most `max_bytes` of `path` and materializes it as typed rows,
/// one cell per schema column (missing-padded).
pub(crate) fn parse_file(path: &Path, max_bytes: Option<u64>) -> Result<SorTable> {
    let mut raw = std::fs::read(path)?;
    if let Some(cap) = max_bytes {
        if (raw.len() as u64) > cap {
            raw.truncate(cap as usize);
            // A cut-off trailing line is dropped rather than misread.
            if let Some(pos) = raw.iter().rposition(|&b| b == b'\n') {
                raw.truncate(pos);
            } else {
                raw.clear();
            }
        }
    }
    let text = String::from_utf8_lossy(&raw);

    let fields: Vec<Vec<String>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect::<Result<_>>()?;

    let schema = infer_schema(&fields);
    let rows = fields
        .into_iter()
        .map(|row| typed_row(&schema, row))
        .collect();
    Ok(SorTable { schema, rows })
}

/// Splits one line into its bracketed fields.
fn parse_line(line: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('<') else {
            return Err(Error::Parse(format!("expected '<' in row {:?}", line)));
        };
        let Some(end) = body.find('>') else {
            return Err(Error::Parse(format!("unterminated field in row {:?}", line)));
        };
        let field = body[..end].trim();
        let field = field
            .strip_prefix('"')
            .and_then(|f| f.strip_suffix('"'))
            .unwrap_or(field);
        fields.push(field.to_owned());
        rest = body[end + 1..].trim_start();
    }
    Ok(fields)
}

#[derive(Clone, Copy, PartialEq, PartialOrd)]
enum FieldKind {
    Empty,
    Bool,
    Int,
    Float,
    Str,
}

fn classify(field: &str) -> FieldKind {
    if field.is_empty() {
        FieldKind::Empty
    } else if field == "0" || field == "1" {
        FieldKind::Bool
    } else if field.parse::<i32>().is_ok() {
        FieldKind::Int
    } else if field.parse::<f32>().is_ok() {
        FieldKind::Float
    } else {
        FieldKind::Str
    }
}

fn infer_schema(rows: &[Vec<String>]) -> Schema {
    let prefix = &rows[..rows.len().min(INFER_ROWS)];
    let width = prefix.iter().map(Vec::len).max().unwrap_or(0);
    let mut schema = Schema::default();
    for col in 0..width {
        let mut kind = FieldKind::Empty;
        for row in prefix {
            if let Some(field) = row.get(col) {
                let field_kind = classify(field);
                if field_kind > kind {
                    kind = field_kind;
                }
            }
        }
        schema.add(match kind {
            // An all-missing column defaults to bool.
            FieldKind::Empty | FieldKind::Bool => CellType::Bool,
            FieldKind::Int => CellType::Int,
            FieldKind::Float => CellType::Float,
            FieldKind::Str => CellType::Str,
        });
    }
    schema
}

/// Converts one raw row to schema-typed cells. Fields that do not parse as
/// the inferred column type (possible past the inference prefix) and fields
/// beyond the schema width degrade to missing / are dropped.
fn typed_row(schema: &Schema, raw: Vec<String>) -> Vec<Cell> {
    let mut cells = vec![Cell::Missing; schema.width()];
    for (col, field) in raw.into_iter().take(schema.width()).enumerate() {
        if field.is_empty() {
            continue;
        }
        cells[col] = match schema.col_type(col) {
            CellType::Bool => match field.as_str() {
                "0" => Cell::Bool(false),
                "1" => Cell::Bool(true),
                _ => Cell::Missing,
            },
            CellType::Int => field.parse().map(Cell::Int).unwrap_or(Cell::Missing),
            CellType::Float => field.parse().map(Cell::Float).unwrap_or(Cell::Missing),
            CellType::Str => Cell::Str(field),
        };
    }
    cells
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_schema_inference() {
        let file = write_temp("<1> <2> <hi> <1.5>\n<0> <-3> <bye> <2>\n");
        let table = parse_file(file.path(), None).unwrap();
        assert_eq!(format!("{:?}", table.schema), "BISF");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Bool(true));
        assert_eq!(table.rows[1][1], Cell::Int(-3));
        assert_eq!(table.rows[0][2], Cell::Str("hi".to_owned()));
        // An int-looking field in a float column still parses as float.
        assert_eq!(table.rows[1][3], Cell::Float(2.0));
    }

    #[test]
    fn test_missing_and_short_rows() {
        let file = write_temp("<1> <> <a>\n<2>\n");
        let table = parse_file(file.path(), None).unwrap();
        assert_eq!(format!("{:?}", table.schema), "IBS");
        assert_eq!(table.rows[0][1], Cell::Missing);
        assert_eq!(table.rows[1][1], Cell::Missing);
        assert_eq!(table.rows[1][2], Cell::Missing);
    }

    #[test]
    fn test_quoted_strings() {
        let file = write_temp("<\"hello world\">\n");
        let table = parse_file(file.path(), None).unwrap();
        assert_eq!(table.rows[0][0], Cell::Str("hello world".to_owned()));
    }

    #[test]
    fn test_byte_cap_drops_partial_line() {
        let file = write_temp("<1>\n<2>\n<3>\n");
        // Cap lands in the middle of the second line.
        let table = parse_file(file.path(), Some(6)).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Cell::Bool(true));
    }

    #[test]
    fn test_malformed_row() {
        let file = write_temp("no brackets\n");
        assert!(matches!(
            parse_file(file.path(), None),
            Err(Error::Parse(_))
        ));
    }
}
