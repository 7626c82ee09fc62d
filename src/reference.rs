use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::Result;

/// One row of the street reference table. Street names are not unique; a
/// street spanning several districts has one row per district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRow {
    pub street: String,
    pub district: String,
    pub quarter: String,
    pub zipcode: String,
}

/// The authoritative street -> {district, quarter, zipcode} table, loaded
/// once per run and read-only afterwards.
#[derive(Debug)]
pub struct ReferenceTable {
    by_street: HashMap<String, Vec<ReferenceRow>>,
    row_count: usize,
}

impl ReferenceTable {
    pub fn load(path: &Path) -> Result<ReferenceTable> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<ReferenceTable> {
        let mut lines = reader.lines();
        let header = lines
            .next()
            .ok_or("reference table is empty")??;
        let columns = split_delimited(&header);
        let street_idx = column_index(&columns, "street")?;
        let district_idx = column_index(&columns, "district")?;
        let quarter_idx = column_index(&columns, "quarter")?;
        let zipcode_idx = column_index(&columns, "zipcode")?;

        let mut rows = Vec::new();
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let fields = split_delimited(&line);
            if fields.len() != columns.len() {
                return Err(format!(
                    "reference row has {} fields, header has {}: {}",
                    fields.len(),
                    columns.len(),
                    line
                )
                .into());
            }
            rows.push(ReferenceRow {
                street: fields[street_idx].clone(),
                district: fields[district_idx].clone(),
                quarter: fields[quarter_idx].clone(),
                zipcode: fields[zipcode_idx].clone(),
            });
        }
        Ok(Self::from_rows(rows))
    }

    pub fn from_rows(rows: Vec<ReferenceRow>) -> ReferenceTable {
        let row_count = rows.len();
        let mut by_street: HashMap<String, Vec<ReferenceRow>> = HashMap::new();
        for row in rows {
            by_street.entry(row.street.clone()).or_default().push(row);
        }
        ReferenceTable {
            by_street,
            row_count,
        }
    }

    /// All rows for a street, in table order. Empty if the street is unknown.
    pub fn lookup(&self, street: &str) -> &[ReferenceRow] {
        self.by_street
            .get(street)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

fn column_index(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|column| column == name)
        .ok_or_else(|| format!("reference table has no '{}' column", name).into())
}

/// Splits one comma-delimited line, honoring double-quoted fields with
/// doubled inner quotes.
fn split_delimited(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
