//! Builds analyze-documents job requests from validated caller input.

use super::types::{
    AnalysisInput, AnalysisTask, DEFAULT_DOCUMENT_ID, DocumentLocation, DocumentPair,
    DocumentTask, JobError, JobRequest,
};
use std::collections::HashSet;

/// Pair a single source document with its output container under the default identifier.
pub fn single_document(
    source: impl Into<String>,
    target: impl Into<String>,
    language: impl Into<String>,
) -> DocumentPair {
    DocumentPair {
        id: DEFAULT_DOCUMENT_ID.to_string(),
        source: source.into(),
        target: target.into(),
        language: language.into(),
    }
}

/// Validate the documents and assemble the submission body.
///
/// Fails with [`JobError::InvalidArgument`] when no document or task is given, a location is not
/// an absolute URL, a language is blank, or two documents share an identifier. The language code
/// is passed through untouched.
pub fn build_job_request(
    documents: Vec<DocumentPair>,
    tasks: Vec<AnalysisTask>,
) -> Result<JobRequest, JobError> {
    if documents.is_empty() {
        return Err(JobError::InvalidArgument(
            "at least one document is required".into(),
        ));
    }
    if tasks.is_empty() {
        return Err(JobError::InvalidArgument(
            "at least one analysis task is required".into(),
        ));
    }

    let mut seen = HashSet::with_capacity(documents.len());
    let mut entries = Vec::with_capacity(documents.len());
    for document in documents {
        if document.id.trim().is_empty() {
            return Err(JobError::InvalidArgument(
                "document id must not be empty".into(),
            ));
        }
        if !seen.insert(document.id.clone()) {
            return Err(JobError::InvalidArgument(format!(
                "duplicate document id '{}'",
                document.id
            )));
        }
        if document.language.trim().is_empty() {
            return Err(JobError::InvalidArgument(format!(
                "language must not be empty for document '{}'",
                document.id
            )));
        }
        let source = absolute_location("sourceDocument", &document.source)?;
        let target = absolute_location("targetDocument", &document.target)?;

        entries.push(DocumentTask {
            id: document.id,
            source,
            target,
            language: document.language,
        });
    }

    Ok(JobRequest {
        analysis_input: AnalysisInput { documents: entries },
        tasks,
    })
}

fn absolute_location(field: &str, value: &str) -> Result<DocumentLocation, JobError> {
    let trimmed = value.trim();
    reqwest::Url::parse(trimmed).map_err(|err| {
        JobError::InvalidArgument(format!("{field} must be an absolute URL ({err}): '{value}'"))
    })?;
    Ok(DocumentLocation::new(trimmed))
}
