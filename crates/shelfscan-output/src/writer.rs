//! JSON, CSV and XLSX writers.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use shelfscan_core::{OutputSettings, ScrapedResult};

use crate::error::OutputError;
use crate::flatten::{flatten_results, FlatRow, COLUMNS};

pub const SHEET_NAME: &str = "Results";

/// Which artifacts were written and which failed.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, OutputError)>,
}

impl WriteReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, path: &Path, outcome: Result<(), OutputError>) {
        match outcome {
            Ok(()) => {
                tracing::info!(path = %path.display(), "output written");
                self.written.push(path.to_path_buf());
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to write output");
                self.failed.push((path.to_path_buf(), e));
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputWriter {
    json_path: PathBuf,
    csv_path: PathBuf,
    excel_path: PathBuf,
}

impl OutputWriter {
    #[must_use]
    pub fn new(json_path: PathBuf, csv_path: PathBuf, excel_path: PathBuf) -> Self {
        Self {
            json_path,
            csv_path,
            excel_path,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &OutputSettings) -> Self {
        Self::new(
            settings.json_path.clone(),
            settings.csv_path.clone(),
            settings.excel_path.clone(),
        )
    }

    /// Write all three artifacts. Each format is attempted regardless of
    /// whether the others failed.
    #[must_use]
    pub fn write_all(&self, results: &[ScrapedResult]) -> WriteReport {
        let rows = flatten_results(results);
        let mut report = WriteReport::default();
        report.record(&self.json_path, write_json(&self.json_path, results));
        report.record(&self.csv_path, write_csv(&self.csv_path, &rows));
        report.record(&self.excel_path, write_excel(&self.excel_path, &rows));
        report
    }
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| OutputError::Io {
                path: parent.display().to_string(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

/// Pretty-printed JSON array, one object per result with its scenario map.
///
/// # Errors
///
/// Returns `OutputError` if serialization or the file write fails.
pub fn write_json(path: &Path, results: &[ScrapedResult]) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json).map_err(|e| OutputError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// CSV with a [`COLUMNS`] header row.
///
/// # Errors
///
/// Returns `OutputError` if the file cannot be created or written.
pub fn write_csv(path: &Path, rows: &[FlatRow]) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row.values())?;
    }
    writer.flush().map_err(|e| OutputError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Single-sheet workbook with a bold [`COLUMNS`] header row. Empty cells
/// are left blank.
///
/// # Errors
///
/// Returns `OutputError` if the workbook cannot be built or saved.
pub fn write_excel(path: &Path, rows: &[FlatRow]) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }
    for (row_index, row) in (1u32..).zip(rows) {
        for (col, value) in (0u16..).zip(row.values()) {
            if !value.is_empty() {
                sheet.write_string(row_index, col, value)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
