use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;

use crate::analysis::{Complex64, ModeRow};

// ---------------------------------------------------------------------------
// Save targets
// ---------------------------------------------------------------------------

pub const SVG_MIME: &str = "image/svg+xml";
pub const DATA_MIME: &str = "application/octet-stream";

/// Default file name and extension for a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub stem: String,
    pub extension: &'static str,
}

impl SaveTarget {
    /// Map a declared content type to a default file name. Unknown types get
    /// a placeholder without extension.
    pub fn for_content(mime: &str, name: Option<&str>) -> Self {
        let (default, extension) = match mime {
            SVG_MIME => ("nidmd-visualization", "svg"),
            DATA_MIME => ("nidmd-data", "csv"),
            _ => return SaveTarget {
                stem: "some-error".to_string(),
                extension: "",
            },
        };
        SaveTarget {
            stem: name.unwrap_or(default).to_string(),
            extension,
        }
    }

    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.stem.clone()
        } else {
            format!("{}.{}", self.stem, self.extension)
        }
    }

    /// Ask the user where to save. `None` when the dialog is cancelled.
    pub fn pick_path(&self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Save File")
            .set_file_name(self.file_name());
        if !self.extension.is_empty() {
            dialog = dialog.add_filter(self.extension, &[self.extension]);
        }
        dialog.save_file()
    }
}

/// Run the save dialog and write `contents` to the chosen path. Returns the
/// path written, or `None` if the user cancelled.
pub fn save(target: &SaveTarget, contents: &[u8]) -> anyhow::Result<Option<PathBuf>> {
    let Some(path) = target.pick_path() else {
        log::info!("Save of {} cancelled", target.file_name());
        return Ok(None);
    };
    std::fs::write(&path, contents)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(Some(path))
}

// ---------------------------------------------------------------------------
// Table formatting
// ---------------------------------------------------------------------------

/// Decimal text truncated (not rounded) to five fractional digits.
pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = format!("{x}");
    match text.split_once('.') {
        Some((whole, frac)) => format!("{whole}.{}", &frac[..frac.len().min(5)]),
        None => format!("{text}.0"),
    }
}

/// `"<re> +/- <|im|> j"`, both parts truncated like [`format_number`].
pub fn format_complex(z: Complex64) -> String {
    format!("{} +/- {} j", format_number(z.re), format_number(z.im.abs()))
}

/// One table row as displayed and exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub mode: usize,
    pub value: String,
    pub damping_time: String,
    pub period: String,
}

impl From<&ModeRow> for TableRow {
    fn from(row: &ModeRow) -> Self {
        TableRow {
            mode: row.mode,
            value: format_complex(row.value),
            damping_time: format_number(row.damping_time),
            period: format_number(row.period),
        }
    }
}

pub fn table_rows(rows: &[ModeRow]) -> Vec<TableRow> {
    rows.iter().map(TableRow::from).collect()
}

/// Formatted mode table as CSV with a header row.
pub fn table_csv(rows: &[ModeRow]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in table_rows(rows) {
        writer.serialize(row).context("serializing table row")?;
    }
    let bytes = writer.into_inner().context("flushing table csv")?;
    String::from_utf8(bytes).context("table csv is not utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_defaults() {
        assert_eq!(SaveTarget::for_content(SVG_MIME, None).file_name(), "nidmd-visualization.svg");
        assert_eq!(SaveTarget::for_content(DATA_MIME, None).file_name(), "nidmd-data.csv");
        assert_eq!(
            SaveTarget::for_content(DATA_MIME, Some("reference-modes")).file_name(),
            "reference-modes.csv"
        );
        let unknown = SaveTarget::for_content("text/html", Some("page"));
        assert_eq!(unknown.file_name(), "some-error");
        assert_eq!(unknown.extension, "");
    }

    #[test]
    fn numbers_are_truncated() {
        assert_eq!(format_number(0.123456789), "0.12345");
        assert_eq!(format_number(-3.999999), "-3.99999");
        assert_eq!(format_number(2.0), "2.0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::INFINITY), "inf");
    }

    #[test]
    fn complex_uses_absolute_imaginary() {
        assert_eq!(format_complex(Complex64::new(0.9, -0.4358899)), "0.9 +/- 0.43588 j");
        assert_eq!(format_complex(Complex64::new(1.0, 0.0)), "1.0 +/- 0.0 j");
    }

    #[test]
    fn table_exports_with_header() {
        let rows = vec![
            ModeRow::from_eigenvalue(1, Complex64::new(1.0, 0.0), 0.72),
            ModeRow::from_eigenvalue(2, Complex64::new(0.5, 0.5), 0.72),
        ];
        let csv = table_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("mode,value,damping_time,period"));
        assert_eq!(lines.next(), Some("1,1.0 +/- 0.0 j,inf,inf"));
        assert!(lines.next().unwrap().starts_with("2,0.5 +/- 0.5 j,"));
        assert_eq!(lines.next(), None);
    }
}
