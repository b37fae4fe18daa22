use serde::Serialize;
use serde_json::Value;

use crate::{ApiClient, Replay, Result};
use orgscope_domain::{
	Channel, ChannelPage, DocumentMeta, EMPLOYEE_CONTENT_TYPE, ResultBody, ResultId, SearchFilters,
	SearchResult, is_wildcard,
};

const SEARCH_PATH: &str = "/search";
const DEFAULT_SCORE: f64 = 100.0;

/// One document-channel request.
#[derive(Debug, Clone)]
pub struct DocumentQuery<'a> {
	pub query: &'a str,
	pub filters: &'a SearchFilters,
	pub size: u32,
	pub from: u64,
	pub hybrid_weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
	pub query: String,
	pub filters: SearchRequestFilters,
	pub size: u32,
	pub from_: u64,
	pub semantic_enabled: bool,
	pub hybrid_weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequestFilters {
	pub source: Vec<String>,
	pub content_type: Vec<String>,
	pub date_range: String,
	pub author: Vec<String>,
	pub tags: Vec<String>,
	pub exclude_content_type: Vec<String>,
}

impl SearchRequest {
	/// Wildcard queries browse: empty text, keyword-only ranking, no content type filter.
	pub fn for_documents(query: &DocumentQuery<'_>) -> Self {
		let wildcard = is_wildcard(query.query);
		let filters = query.filters;

		Self {
			query: if wildcard { String::new() } else { query.query.trim().to_string() },
			filters: SearchRequestFilters {
				source: filters.source.clone(),
				content_type: if wildcard { Vec::new() } else { filters.content_type.clone() },
				date_range: filters.date_range.as_str().to_string(),
				author: filters.authors().to_vec(),
				tags: filters.tag_list().to_vec(),
				exclude_content_type: vec![EMPLOYEE_CONTENT_TYPE.to_string()],
			},
			size: query.size,
			from_: query.from,
			semantic_enabled: !wildcard,
			hybrid_weight: if wildcard { 0.0 } else { query.hybrid_weight },
		}
	}
}

pub async fn search_documents(
	client: &ApiClient,
	token: Option<&str>,
	query: &DocumentQuery<'_>,
) -> Result<ChannelPage> {
	let request = SearchRequest::for_documents(query);
	let json = client.post_json(&client.url(SEARCH_PATH), &request, token, Replay::Safe).await?;

	Ok(parse_search_response(&json, query.from, u64::from(query.size)))
}

/// Accepts `{results, total}` and `{success, data: {results, total}}`. Any other shape is an
/// empty page.
pub fn parse_search_response(json: &Value, offset: u64, page_size: u64) -> ChannelPage {
	let payload = if json.get("results").is_some() {
		json
	} else if let Some(data) = json.get("data").filter(|data| data.get("results").is_some()) {
		data
	} else {
		tracing::warn!(shape = %shape_of(json), "Search response has an unexpected shape.");

		return ChannelPage::empty(offset, page_size);
	};
	let Some(items) = payload.get("results").and_then(Value::as_array) else {
		tracing::warn!("Search response results are not an array.");

		return ChannelPage::empty(offset, page_size);
	};
	let results = items
		.iter()
		.enumerate()
		.filter(|(_, item)| item.is_object())
		.map(|(index, item)| search_result(item, offset + index as u64))
		.collect::<Vec<_>>();
	let total = payload
		.get("total")
		.and_then(Value::as_u64)
		.filter(|total| *total > 0)
		.unwrap_or(results.len() as u64);

	ChannelPage { results, total, offset, page_size }
}

/// Converts one wire hit. Hits tagged as employees keep their employee record.
pub fn search_result(item: &Value, absolute_offset: u64) -> SearchResult {
	let is_employee = ["content_type", "document_type"]
		.iter()
		.any(|key| item.get(*key).and_then(Value::as_str) == Some(EMPLOYEE_CONTENT_TYPE));

	if is_employee {
		return crate::employees::employee_result(item, absolute_offset);
	}

	let text = |keys: &[&str]| crate::text_field(item, keys).map(str::to_string);

	SearchResult {
		id: crate::id_field(item, &["id", "_id"])
			.map(ResultId::new)
			.unwrap_or_else(|| ResultId::positional(Channel::Document, absolute_offset)),
		title: text(&["title"]).unwrap_or_else(|| "Untitled Document".to_string()),
		summary: text(&["summary"]).unwrap_or_default(),
		content: text(&["content"]).unwrap_or_default(),
		url: text(&["url"]).unwrap_or_default(),
		department: text(&["department"]).unwrap_or_else(|| "Unknown".to_string()),
		tags: crate::string_list(item, "tags"),
		content_type: text(&["content_type", "document_type"])
			.unwrap_or_else(|| "document".to_string()),
		body: ResultBody::Document(DocumentMeta {
			source: text(&["source"]).unwrap_or_else(|| "search".to_string()),
			author: text(&["author"]).unwrap_or_else(|| "System".to_string()),
			timestamp: text(&["timestamp", "date"]).unwrap_or_default(),
			score: ["score", "relevance_score"]
				.iter()
				.find_map(|key| item.get(*key).and_then(Value::as_f64))
				.unwrap_or(DEFAULT_SCORE),
		}),
	}
}

pub(crate) fn shape_of(json: &Value) -> String {
	match json {
		Value::Object(map) => format!("object with keys {:?}", map.keys().collect::<Vec<_>>()),
		Value::Array(_) => "array".to_string(),
		Value::String(_) => "string".to_string(),
		Value::Number(_) => "number".to_string(),
		Value::Bool(_) => "bool".to_string(),
		Value::Null => "null".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_ids_use_absolute_offsets() {
		let json = serde_json::json!({ "results": [{ "title": "a" }, { "id": "d9" }], "total": 0 });
		let page = parse_search_response(&json, 20, 5);

		assert_eq!(page.results[0].id.as_str(), "document_at_20");
		assert_eq!(page.results[1].id.as_str(), "d9");
		assert_eq!(page.total, 2);
	}

	#[test]
	fn unexpected_shape_is_an_empty_page() {
		let page = parse_search_response(&serde_json::json!({ "error": "boom" }), 0, 5);

		assert!(page.results.is_empty());
		assert_eq!(page.total, 0);
	}
}
