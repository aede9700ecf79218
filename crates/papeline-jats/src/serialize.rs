//! Serializer (C8): emits a Document as a portable, UTF-8 key-value
//! artifact. Field order is whatever [`crate::document::Document`]'s
//! `Serialize` impl produces, which is fixed by field declaration order.

use crate::document::Document;
use papeline_core::PmcError;
use std::io::Write;

/// File extension for per-item artifacts.
pub const ARTIFACT_EXT: &str = "json";

/// Serialize one Document to a pretty-printed JSON string, suitable for
/// a per-item artifact file named `PMC<pmcid>.json`.
pub fn to_artifact_string(doc: &Document) -> Result<String, PmcError> {
    serde_json::to_string_pretty(doc).map_err(|e| PmcError::ParseError(e.to_string()))
}

/// Write one Document as a single compact JSON line, for stream mode
/// (one artifact per line, one Document per artifact).
pub fn write_stream_line<W: Write>(writer: &mut W, doc: &Document) -> Result<(), PmcError> {
    let line = serde_json::to_string(doc).map_err(|e| PmcError::ParseError(e.to_string()))?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// The per-item artifact filename for a given canonical PMCID.
pub fn artifact_filename(pmc_id: &str) -> String {
    format!("PMC{pmc_id}.{ARTIFACT_EXT}")
}
