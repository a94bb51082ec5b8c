/// Data layer: upload payloads and file ingestion.
///
/// Architecture:
/// ```text
///  "<metadata>,<base64>" per file
///        │
///        ▼
///   ┌──────────┐
///   │ payload  │  UploadBatch → raw bytes
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  ingest  │  .mat / .csv → DMatrix<f64>
///   └──────────┘
///        │
///        ▼
///   AnalysisLibrary::decompose → Decomposition
/// ```

pub mod ingest;
pub mod payload;
