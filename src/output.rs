//! Result types: the wire response, the validated [`ConversionResult`], and
//! the per-attempt [`RequestOutcome`].

use crate::error::{SubmitError, UploaderError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// JSON body of a 2xx response from the conversion endpoint.
///
/// Both fields are optional on the wire; [`ConversionResponse::into_result`]
/// decides whether the pair is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    #[serde(default)]
    pub markdown_content: Option<String>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    /// Informational status line some servers add ("File processed successfully").
    #[serde(default)]
    pub message: Option<String>,
}

impl ConversionResponse {
    /// Validate the response into a complete result.
    ///
    /// A field that is absent, `null`, or the empty string counts as missing.
    pub fn into_result(self) -> Result<ConversionResult, SubmitError> {
        if let Some(ref m) = self.message {
            debug!(message = %m, "Endpoint message");
        }
        match (non_empty(self.markdown_content), non_empty(self.ai_summary)) {
            (Some(extracted), Some(summary)) => Ok(ConversionResult { extracted, summary }),
            (extracted, summary) => {
                let mut missing = Vec::new();
                if extracted.is_none() {
                    missing.push("markdownContent".to_string());
                }
                if summary.is_none() {
                    missing.push("aiSummary".to_string());
                }
                Err(SubmitError::IncompleteResult { missing })
            }
        }
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Extracted text and summary returned by a successful submission.
///
/// Both halves are always present; partial results never become a
/// `ConversionResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    #[serde(rename = "markdownContent")]
    extracted: String,
    #[serde(rename = "aiSummary")]
    summary: String,
}

impl ConversionResult {
    pub fn new(extracted: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            extracted: extracted.into(),
            summary: summary.into(),
        }
    }

    /// The extracted Markdown, verbatim.
    pub fn extracted(&self) -> &str {
        &self.extracted
    }

    /// The generated summary, verbatim.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Assemble both halves into one Markdown document.
    pub fn to_markdown(&self) -> String {
        let mut doc = String::with_capacity(self.extracted.len() + self.summary.len() + 64);
        doc.push_str("## Summary\n\n");
        doc.push_str(self.summary.trim_end());
        doc.push_str("\n\n## Extracted Content\n\n");
        doc.push_str(self.extracted.trim_end());
        doc.push('\n');
        doc
    }
}

/// State of the most recent submission attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Pending,
    Succeeded(ConversionResult),
    Failed(SubmitError),
}

/// Write a result to `path` as Markdown.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn save_result(
    result: &ConversionResult,
    path: impl AsRef<Path>,
) -> Result<(), UploaderError> {
    let path = path.as_ref();
    let write_err = |source| UploaderError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, result.to_markdown())
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    debug!(path = %path.display(), "Result written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_response_becomes_result() {
        let resp: ConversionResponse = serde_json::from_str(
            r##"{"message":"File processed successfully","markdownContent":"# Title","aiSummary":"Short summary."}"##,
        )
        .unwrap();
        let result = resp.into_result().unwrap();
        assert_eq!(result.extracted(), "# Title");
        assert_eq!(result.summary(), "Short summary.");
    }

    #[test]
    fn missing_summary_is_incomplete() {
        let resp: ConversionResponse =
            serde_json::from_str(r##"{"markdownContent":"# Title"}"##).unwrap();
        assert_eq!(
            resp.into_result(),
            Err(SubmitError::IncompleteResult {
                missing: vec!["aiSummary".into()]
            })
        );
    }

    #[test]
    fn empty_strings_and_nulls_count_as_missing() {
        let resp: ConversionResponse =
            serde_json::from_str(r#"{"markdownContent":"","aiSummary":null}"#).unwrap();
        match resp.into_result() {
            Err(SubmitError::IncompleteResult { missing }) => {
                assert_eq!(missing, vec!["markdownContent", "aiSummary"]);
            }
            other => panic!("expected IncompleteResult, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_is_preserved_verbatim() {
        let resp = ConversionResponse {
            markdown_content: Some("```\n  indented\n```".into()),
            ai_summary: Some("  spaced  ".into()),
            message: None,
        };
        let result = resp.into_result().unwrap();
        assert_eq!(result.extracted(), "```\n  indented\n```");
        assert_eq!(result.summary(), "  spaced  ");
    }

    #[test]
    fn result_serialises_with_wire_names() {
        let json = serde_json::to_value(ConversionResult::new("a", "b")).unwrap();
        assert_eq!(json["markdownContent"], "a");
        assert_eq!(json["aiSummary"], "b");
    }

    #[tokio::test]
    async fn save_result_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.md");
        save_result(&ConversionResult::new("# Title", "Short summary."), &path)
            .await
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("## Summary\n\nShort summary."));
        assert!(written.contains("## Extracted Content\n\n# Title\n"));
        assert!(!path.with_extension("md.tmp").exists());
    }
}
