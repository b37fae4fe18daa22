use serde::Serialize;
use serde_json::Value;

use crate::{ApiClient, Error, Replay, Result};
use orgscope_domain::SearchResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
	pub query: String,
	pub search_results: Vec<SummarySource>,
	pub summary_type: String,
	pub max_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySource {
	pub title: String,
	pub summary: String,
	pub source: String,
	pub content: String,
	pub relevance_score: f64,
}
impl From<&SearchResult> for SummarySource {
	fn from(result: &SearchResult) -> Self {
		Self {
			title: result.title.clone(),
			summary: result.summary.clone(),
			source: result.source_label().to_string(),
			content: result.content.clone(),
			relevance_score: result.relevance(),
		}
	}
}

pub async fn summarize(
	client: &ApiClient,
	token: Option<&str>,
	path: &str,
	request: &SummaryRequest,
) -> Result<String> {
	let json = client.post_json(&client.url(path), request, token, Replay::Never).await?;

	parse_summary(&json).ok_or_else(|| Error::InvalidResponse {
		message: "Summary response is missing the summary text.".to_string(),
	})
}

/// Accepts `{success, data: {summary}}`, `{summary}` or a bare string.
pub fn parse_summary(json: &Value) -> Option<String> {
	if let Some(text) = json.as_str() {
		return Some(text.to_string());
	}

	json.get("data")
		.and_then(|data| data.get("summary"))
		.or_else(|| json.get("summary"))
		.and_then(Value::as_str)
		.map(str::to_string)
}
