//! Sheet sink: renders named sheets as CSV files in an output directory,
//! standing in for a multi-tab workbook.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A presentation-ready sheet: a name, a header row, and data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Serialize this sheet as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Write one `<name>.csv` per sheet under `dir`, creating it if needed.
/// Returns the written paths in sheet order.
pub fn write_sheets(dir: &Path, sheets: &[Sheet]) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let path = dir.join(format!("{}.csv", sheet.name));
        sheet.write_csv(File::create(&path)?)?;
        log::info!("wrote {}", path.display());
        paths.push(path);
    }
    Ok(paths)
}
