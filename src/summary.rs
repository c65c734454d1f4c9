//! Prose recap of an analytics request, written by the text generation agent.

use crate::agent::TextGenerator;
use crate::request::{AnalyticsRequest, RequestSummary};

/// Build the summarization prompt for a request record
pub fn summary_prompt(record: &str) -> String {
    format!(
        r#"Please provide a clear and insightful summary of this analytics request:

Requester information:
{}

Limit to 1 concise paragraph with three key bullet points and, if possible, a level of effort statement."#,
        record
    )
}

/// Ask the generator for a recap of `request`.
///
/// Failures are folded into [`RequestSummary::Failed`] and never abort the caller.
pub async fn summarize_request(
    generator: &dyn TextGenerator,
    request: &AnalyticsRequest,
) -> RequestSummary {
    let record = match serde_json::to_string_pretty(request) {
        Ok(record) => record,
        Err(e) => return RequestSummary::failed(e),
    };

    tracing::info!(request_type = %request.request_type, "summarizing the request");
    match generator.generate(&summary_prompt(&record)).await {
        Ok(text) => RequestSummary::Generated(text),
        Err(e) => {
            tracing::warn!(error = %e, "summary generation failed");
            RequestSummary::failed(e)
        }
    }
}
