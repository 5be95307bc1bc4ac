use std::fs;
use std::path::Path;

use cardio_ml_data::{Column, DataFrame};

use crate::error::IoResult;

/// Create the parent directories of `path` if it has any.
pub(crate) fn ensure_parent(path: &Path) -> IoResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Read a CSV file with a header row into a data frame.
///
/// Column types are inferred; blank fields in numeric columns become `NaN`.
pub fn read_frame_csv(path: impl AsRef<Path>) -> IoResult<DataFrame> {
    let mut rdr = csv::Reader::from_path(path.as_ref())?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(DataFrame::from_records(headers, records)?)
}

/// Write a data frame as CSV. Missing numeric values are written blank.
pub fn write_frame_csv(path: impl AsRef<Path>, frame: &DataFrame) -> IoResult<()> {
    let columns: Vec<Vec<String>> = frame
        .iter()
        .map(|(_, c)| match c {
            Column::Numeric(v) => v
                .iter()
                .map(|x| if x.is_nan() { String::new() } else { x.to_string() })
                .collect(),
            Column::Text(v) => v.clone(),
        })
        .collect();
    let rows: Vec<Vec<String>> = (0..frame.n_rows())
        .map(|i| columns.iter().map(|c| c[i].clone()).collect())
        .collect();
    write_table_csv(path, frame.column_names(), &rows)
}

/// Write a table of preformatted cells, creating parent directories.
pub fn write_table_csv(
    path: impl AsRef<Path>,
    header: &[String],
    rows: &[Vec<String>],
) -> IoResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
