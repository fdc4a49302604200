use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, warn};

use crate::data::CellValue;

pub type RecordFields = BTreeMap<String, CellValue>;

pub trait RecordSink {
    fn create_record(&mut self, fields: &RecordFields) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct CsvRecordSink {
    path: PathBuf,
    columns: Vec<String>,
}

impl CsvRecordSink {
    pub fn new(path: impl Into<PathBuf>, columns: Vec<String>) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn existing_layout(&self) -> Result<Option<(Vec<String>, u64)>> {
        let is_empty = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        if is_empty {
            return Ok(None);
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Opening records file {:?}", self.path))?;
        let headers = reader
            .headers()
            .with_context(|| format!("Reading header of {:?}", self.path))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut rows = 0u64;
        for record in reader.records() {
            record.with_context(|| format!("Reading row {} of {:?}", rows + 2, self.path))?;
            rows += 1;
        }
        Ok(Some((headers, rows)))
    }
}

impl RecordSink for CsvRecordSink {
    fn create_record(&mut self, fields: &RecordFields) -> Result<u64> {
        let existing = self.existing_layout()?;
        let (header, rows, write_header) = match existing {
            Some((header, rows)) => (header, rows, false),
            None => (self.columns.clone(), 0, true),
        };
        if header.is_empty() {
            bail!("Records file {:?} has no columns", self.path);
        }
        for column in fields.keys() {
            if !header.contains(column) {
                warn!(
                    "Column '{column}' is not part of {:?}; its value is dropped",
                    self.path
                );
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Opening records file {:?} for append", self.path))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if write_header {
            writer
                .write_record(&header)
                .context("Writing records header")?;
        }
        let row = header
            .iter()
            .map(|column| {
                fields
                    .get(column)
                    .map(CellValue::as_display)
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        writer.write_record(&row).context("Writing record row")?;
        writer.flush().context("Flushing records file")?;

        let row_id = rows + 1;
        debug!("Appended record {row_id} to {:?}", self.path);
        Ok(row_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSink {
    pub records: Vec<RecordFields>,
    pub reject_with: Option<String>,
}

impl RecordSink for MemoryRecordSink {
    fn create_record(&mut self, fields: &RecordFields) -> Result<u64> {
        if let Some(message) = &self.reject_with {
            bail!("{message}");
        }
        self.records.push(fields.clone());
        Ok(self.records.len() as u64)
    }
}
