//! Uploaded-document ingestion.
//!
//! Real extraction is not implemented yet; [`StubParser`] answers every
//! upload with a fixed receiver so the form flow can be exercised end to end.

use serde::{Deserialize, Serialize};

/// Structured fields lifted from an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub receiver_name: String,
    pub items: Vec<String>,
}

pub trait DocumentParser: Send + Sync {
    fn parse(&self, file_name: Option<&str>, bytes: &[u8]) -> ParsedDocument;
}

pub const STUB_RECEIVER_NAME: &str = "藤原 和将";

#[derive(Debug, Clone, Default)]
pub struct StubParser;

impl DocumentParser for StubParser {
    fn parse(&self, file_name: Option<&str>, bytes: &[u8]) -> ParsedDocument {
        tracing::debug!(?file_name, size = bytes.len(), "Parsing uploaded document");
        ParsedDocument {
            receiver_name: STUB_RECEIVER_NAME.to_string(),
            items: Vec::new(),
        }
    }
}
