use thiserror::Error;

use crate::analysis::AnalysisError;

// ---------------------------------------------------------------------------
// Errors surfaced at the event-handler boundary
// ---------------------------------------------------------------------------

/// Everything that can stop an ingestion or a computation from advancing the
/// session. None of these are fatal; the handler logs them and shows a short
/// message in the selection panel.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Invalid .mat file {file}, no matrices inside.")]
    NoMatrixFound { file: String },

    #[error("Could not read .mat file {file}: {reason}")]
    MalformedMat { file: String, reason: String },

    #[error("Problem reading the csv file {file}: {reason}")]
    MalformedCsv { file: String, reason: String },

    #[error("Malformed upload payload for {file}: {reason}")]
    InvalidPayload { file: String, reason: String },

    #[error("No supported files in upload (expected .mat or .csv).")]
    NoSupportedFiles,

    #[error("No setting chosen.")]
    NoModeSelected,

    #[error("The second group is not used in the Analysis setting.")]
    SlotUnavailable,

    #[error("Please upload Reference group before Match group.")]
    MissingReference,

    #[error("Analysis failed: {0}")]
    AnalysisLibraryFailure(String),
}

impl From<AnalysisError> for DashboardError {
    fn from(e: AnalysisError) -> Self {
        DashboardError::AnalysisLibraryFailure(e.to_string())
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
