use std::path::Path;

use matfile::{MatFile, NumericData};
use nalgebra::DMatrix;

use super::payload::{UploadBatch, UploadedFile};
use crate::analysis::{AnalysisLibrary, Decomposition};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// A decomposed batch plus the files that were skipped for their suffix.
#[derive(Debug)]
pub struct Ingested {
    pub decomposition: Decomposition,
    pub skipped: Vec<String>,
}

/// Decode every file of `batch` into a matrix and decompose them together.
///
/// Supported formats:
/// * `.mat` – MATLAB level-5 container; the last array whose name does not
///   start with `__` is used
/// * `.csv` – comma-delimited numeric table without header
///
/// Files with any other suffix are skipped with a warning. A batch in which
/// every file is skipped fails with [`DashboardError::NoSupportedFiles`].
pub fn parse_batch(
    batch: &UploadBatch,
    sampling_time: f64,
    library: &dyn AnalysisLibrary,
) -> Result<Ingested> {
    log::info!(
        "Parsing {} file{} with sampling time {sampling_time}",
        batch.len(),
        if batch.len() > 1 { "s" } else { "" },
    );

    let mut data = Vec::with_capacity(batch.len());
    let mut skipped = Vec::new();

    for file in &batch.files {
        match extract_matrix(file)? {
            Some(matrix) => data.push(matrix),
            None => skipped.push(file.name.clone()),
        }
    }

    if data.is_empty() {
        return Err(DashboardError::NoSupportedFiles);
    }

    log::info!("Extracting information from {} file(s)...", data.len());
    let decomposition = library.decompose(data, sampling_time)?;

    Ok(Ingested {
        decomposition,
        skipped,
    })
}

/// Supported upload formats, by filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Mat,
    Csv,
}

impl FileFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "mat" => Some(FileFormat::Mat),
            "csv" => Some(FileFormat::Csv),
            _ => None,
        }
    }
}

/// Decode one uploaded file. `Ok(None)` for unsupported suffixes.
pub fn extract_matrix(file: &UploadedFile) -> Result<Option<DMatrix<f64>>> {
    let Some(format) = FileFormat::from_name(&file.name) else {
        log::warn!("Skipping {}: unsupported file format", file.name);
        return Ok(None);
    };

    let bytes = file.decode()?;
    log::info!("Decoded {} bytes from {}", bytes.len(), file.name);

    let matrix = match format {
        FileFormat::Mat => parse_mat(&file.name, &bytes)?,
        FileFormat::Csv => parse_csv(&file.name, &bytes)?,
    };
    Ok(Some(matrix))
}

// ---------------------------------------------------------------------------
// .mat containers
// ---------------------------------------------------------------------------

/// Keys starting with this prefix are container metadata, not data.
const METADATA_PREFIX: &str = "__";

pub fn parse_mat(name: &str, bytes: &[u8]) -> Result<DMatrix<f64>> {
    let mat = MatFile::parse(bytes).map_err(|e| DashboardError::MalformedMat {
        file: name.to_string(),
        reason: format!("{e:?}"),
    })?;

    let mut chosen = None;
    for array in mat.arrays() {
        if array.name().starts_with(METADATA_PREFIX) {
            continue;
        }
        let real = real_part(array.data());
        let size = array.size();
        let rows = size.first().copied().unwrap_or(0);
        let cols: usize = size.iter().skip(1).product();
        if rows * cols != real.len() || real.is_empty() {
            log::warn!("{name}: array '{}' has inconsistent size {size:?}, ignored", array.name());
            continue;
        }
        log::info!("Extracted matrix from file {name} from key {}", array.name());
        // MATLAB stores column-major.
        chosen = Some(DMatrix::from_column_slice(rows, cols, &real));
    }

    chosen.ok_or_else(|| {
        log::error!("Invalid .mat file {name}, no matrices inside.");
        DashboardError::NoMatrixFound {
            file: name.to_string(),
        }
    })
}

fn real_part(data: &NumericData) -> Vec<f64> {
    fn widen<T: Copy + Into<f64>>(v: &[T]) -> Vec<f64> {
        v.iter().map(|&x| x.into()).collect()
    }
    match data {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => widen(real),
        NumericData::Int8 { real, .. } => widen(real),
        NumericData::UInt8 { real, .. } => widen(real),
        NumericData::Int16 { real, .. } => widen(real),
        NumericData::UInt16 { real, .. } => widen(real),
        NumericData::Int32 { real, .. } => widen(real),
        NumericData::UInt32 { real, .. } => widen(real),
        NumericData::Int64 { real, .. } => real.iter().map(|&x| x as f64).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|&x| x as f64).collect(),
    }
}

// ---------------------------------------------------------------------------
// .csv tables
// ---------------------------------------------------------------------------

/// Numeric table, no header. Empty trailing cells are dropped; rows without
/// a single numeric cell (headers, blank lines) are skipped. Any other cell
/// that does not parse is an error.
pub fn parse_csv(name: &str, bytes: &[u8]) -> Result<DMatrix<f64>> {
    let malformed = |reason: String| {
        log::error!("Problem reading the csv file {name}: {reason}");
        DashboardError::MalformedCsv {
            file: name.to_string(),
            reason,
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut width = None;
    let mut values = Vec::new();
    let mut rows = 0;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| malformed(format!("row {row_no}: {e}")))?;

        let mut cells: Vec<&str> = record.iter().collect();
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        let parsed: Vec<Option<f64>> = cells.iter().map(|c| c.parse().ok()).collect();
        if parsed.iter().all(Option::is_none) {
            log::warn!("{name}: row {row_no} has no numeric value, skipped");
            continue;
        }
        if let Some(col) = parsed.iter().position(Option::is_none) {
            return Err(malformed(format!(
                "row {row_no}, column {col}: {:?} is not a number",
                cells[col]
            )));
        }
        let row: Vec<f64> = parsed.into_iter().flatten().collect();

        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => {
                return Err(malformed(format!(
                    "row {row_no} has {} columns, expected {w}",
                    row.len()
                )));
            }
            Some(_) => {}
        }
        values.extend(row);
        rows += 1;
    }

    let Some(cols) = width else {
        return Err(malformed("no numeric rows".into()));
    };
    Ok(DMatrix::from_row_slice(rows, cols, &values))
}
