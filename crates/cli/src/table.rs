//! Polars copy of a view, one named column per canonical factor column.

use crate::args::TableFormat;
use anyhow::{bail, Context, Result};
use nalgebra::DMatrix;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

pub fn to_frame(names: &[String], m: &DMatrix<f64>) -> Result<DataFrame> {
    if names.len() != m.ncols() {
        bail!("{} column names for a {}-column view", names.len(), m.ncols());
    }
    let series: Vec<Series> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<f64> = m.column(i).iter().copied().collect();
            Series::new(name.as_str().into(), values)
        })
        .collect();
    Ok(DataFrame::new(series)?)
}

/// Write `m` next to `stem` with the extension of `format`; `None` skips.
pub fn write(
    format: TableFormat,
    stem: &Path,
    names: &[String],
    m: &DMatrix<f64>,
) -> Result<Option<PathBuf>> {
    let ext = match format {
        TableFormat::None => return Ok(None),
        TableFormat::Parquet => "parquet",
        TableFormat::Csv => "csv",
    };
    let path = stem.with_extension(ext);
    let mut df = to_frame(names, m)?;
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    match format {
        TableFormat::Parquet => {
            ParquetWriter::new(file).finish(&mut df)?;
        }
        TableFormat::Csv => {
            CsvWriter::new(file).finish(&mut df)?;
        }
        TableFormat::None => {}
    }
    tracing::info!(path = %path.display(), rows = df.height(), cols = df.width(), "table");
    Ok(Some(path))
}
