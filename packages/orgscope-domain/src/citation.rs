use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	/// Excerpt of the source that the answer used.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub text_used: Option<String>,
}
impl Citation {
	pub fn titled(title: impl Into<String>) -> Self {
		Self { title: title.into(), url: None, text_used: None }
	}
}

/// Every shape a citation field may take on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum CitationPayload<'a> {
	Absent,
	Single(&'a Value),
	Many(&'a [Value]),
}
impl<'a> CitationPayload<'a> {
	/// Reads `citations` first and falls back to `citation` when the plural key is absent or
	/// null.
	pub fn classify(envelope: &'a Value) -> Self {
		let field = ["citations", "citation"]
			.into_iter()
			.filter_map(|key| envelope.get(key))
			.find(|value| !value.is_null());

		match field {
			None => Self::Absent,
			Some(Value::Array(items)) => Self::Many(items),
			Some(value) => Self::Single(value),
		}
	}

	pub fn into_citations(self) -> Vec<Citation> {
		match self {
			Self::Absent => Vec::new(),
			Self::Single(value) => citation_from_value(value).into_iter().collect(),
			Self::Many(items) => items.iter().filter_map(citation_from_value).collect(),
		}
	}
}

/// Normalizes whatever citation data `envelope` carries into a list. Never fails.
pub fn normalize_citations(envelope: &Value) -> Vec<Citation> {
	CitationPayload::classify(envelope).into_citations()
}

fn citation_from_value(value: &Value) -> Option<Citation> {
	match value {
		Value::String(title) if !title.trim().is_empty() => Some(Citation::titled(title.trim())),
		Value::Object(map) if !map.is_empty() => {
			let text = |key: &str| {
				map.get(key)
					.and_then(Value::as_str)
					.map(str::trim)
					.filter(|value| !value.is_empty())
					.map(str::to_string)
			};
			let title = text("title").or_else(|| text("name")).unwrap_or_else(|| UNTITLED.to_string());

			Some(Citation { title, url: text("url"), text_used: text("text_used").or_else(|| text("excerpt")) })
		},
		Value::Null => None,
		other => {
			tracing::warn!(payload = %other, "Dropping citation with unsupported shape.");

			None
		},
	}
}
