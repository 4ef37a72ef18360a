//! Collapses a terminal job result into either documents or errors.

use super::types::{JobResult, Outcome, ReportedError, TaskResults};

/// Reconcile a parsed job result.
///
/// The first non-empty source wins: the job `error`, then the job `errors`, then task errors
/// concatenated in task order, then documents concatenated in task order. A result with none of
/// these reconciles to an empty document list.
pub fn reconcile<D: Clone>(result: &JobResult<D>) -> Outcome<D> {
    if let Some(error) = &result.error {
        return Outcome::Errors(vec![ReportedError::Job(error.clone())]);
    }

    if let Some(errors) = result.errors.as_ref().filter(|errors| !errors.is_empty()) {
        return Outcome::Errors(errors.iter().cloned().map(ReportedError::Job).collect());
    }

    reconcile_tasks(
        result
            .tasks
            .items
            .iter()
            .filter_map(|task| task.results.as_ref()),
    )
}

/// Reconcile task payloads alone: document errors first, then documents.
pub fn reconcile_tasks<'a, D, I>(tasks: I) -> Outcome<D>
where
    D: Clone + 'a,
    I: IntoIterator<Item = &'a TaskResults<D>> + Clone,
{
    let errors: Vec<ReportedError> = tasks
        .clone()
        .into_iter()
        .flat_map(|results| results.errors.iter().flatten())
        .cloned()
        .map(ReportedError::Document)
        .collect();
    if !errors.is_empty() {
        return Outcome::Errors(errors);
    }

    Outcome::Documents(
        tasks
            .into_iter()
            .flat_map(|results| results.documents.iter().flatten())
            .cloned()
            .collect(),
    )
}
