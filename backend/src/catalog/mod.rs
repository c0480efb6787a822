pub mod schema;

use std::io::Read;

pub use schema::{CatalogSchema, SchemaError};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Catalog has no header row")]
    MissingHeader,
}

/// Spreadsheet exports are not always UTF-8; undecodable bytes become U+FFFD
/// instead of failing the whole load.
fn lossy_cell(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Product table loaded once at startup and never mutated afterwards.
/// Share it behind an `Arc`; concurrent readers need no locking.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Catalog {
    /// Short rows are padded with empty cells so every row spans the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader.byte_headers()?.iter().map(lossy_cell).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(CatalogError::MissingHeader);
        }

        let rows = reader
            .byte_records()
            .map(|record| record.map(|r| r.iter().map(lossy_cell).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

        log::info!(
            "Loaded catalog with {} rows and columns {:?}",
            rows.len(),
            columns
        );
        Ok(Self::new(columns, rows))
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn schema(&self) -> Result<CatalogSchema, SchemaError> {
        CatalogSchema::resolve(&self.columns)
    }
}
