use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ApiClient, Replay, Result};
use orgscope_domain::{Citation, normalize_citations};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
	pub session_id: String,
	pub input: String,
	pub provider: String,
	pub provider_id: String,
	pub knowledge_scope: String,
	pub temperature: f32,
	pub k: u32,
	pub size: u32,
	pub rerank_topk: u32,
	/// Model and retrieval parameters passed through untouched, e.g. `knnField`.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl ChatRequest {
	pub fn from_config(
		cfg: &orgscope_config::Chat,
		session_id: impl Into<String>,
		input: impl Into<String>,
	) -> Self {
		Self {
			session_id: session_id.into(),
			input: input.into(),
			provider: cfg.provider.clone(),
			provider_id: cfg.provider_id.clone(),
			knowledge_scope: cfg.knowledge_scope.clone(),
			temperature: cfg.temperature,
			k: cfg.k,
			size: cfg.size,
			rerank_topk: cfg.rerank_topk,
			extra: cfg.extra_params.clone(),
		}
	}
}

/// `{code, msg, data}` wrapper used by every chat endpoint. `code == 0` is success.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatEnvelope {
	pub code: i64,
	#[serde(default)]
	pub msg: String,
	#[serde(default)]
	pub trace_id: Option<String>,
	#[serde(default)]
	pub data: Value,
}
impl ChatEnvelope {
	pub fn is_success(&self) -> bool {
		self.code == 0
	}

	pub fn reply(&self) -> ChatReply {
		ChatReply::from_data(&self.data)
	}

	pub fn sessions(&self) -> Vec<SessionInfo> {
		parse_items(&self.data, "session")
	}

	pub fn messages(&self) -> Vec<MessageResponse> {
		parse_items(&self.data, "message")
	}
}

/// Assistant answer with citations already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
	pub output: String,
	pub session_id: Option<String>,
	pub citations: Vec<Citation>,
	pub evaluation: Option<Value>,
}
impl ChatReply {
	pub fn from_data(data: &Value) -> Self {
		Self {
			output: crate::text_field(data, &["output"]).unwrap_or_default().to_string(),
			session_id: crate::text_field(data, &["session_id"]).map(str::to_string),
			citations: normalize_citations(data),
			evaluation: data.get("evaluation").filter(|value| !value.is_null()).cloned(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
	pub session_id: String,
	#[serde(default)]
	pub first_message: String,
	#[serde(default)]
	pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
	#[serde(default)]
	pub idx: i64,
	#[serde(default)]
	pub msg_id: String,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub role: String,
	#[serde(default)]
	pub created_at: String,
}

pub async fn send_chat(
	client: &ApiClient,
	token: Option<&str>,
	request: &ChatRequest,
) -> Result<ChatEnvelope> {
	let json = client.post_json(&client.chat_url("/chat"), request, token, Replay::Never).await?;

	Ok(serde_json::from_value(json)?)
}

pub async fn list_sessions(client: &ApiClient, token: Option<&str>) -> Result<ChatEnvelope> {
	let json = client.get_json(&client.chat_url("/sessions"), &[], token).await?;

	Ok(serde_json::from_value(json)?)
}

pub async fn list_messages(
	client: &ApiClient,
	token: Option<&str>,
	session_id: &str,
) -> Result<ChatEnvelope> {
	let json = client
		.get_json(&client.chat_url("/messages"), &[("session_id", session_id.to_string())], token)
		.await?;

	Ok(serde_json::from_value(json)?)
}

/// Skips items that do not match the expected shape instead of failing the whole list.
fn parse_items<T>(data: &Value, label: &str) -> Vec<T>
where
	T: for<'de> Deserialize<'de>,
{
	let Some(items) = data.as_array() else {
		if !data.is_null() {
			tracing::warn!(label, "Chat list payload is not an array.");
		}

		return Vec::new();
	};

	items
		.iter()
		.filter_map(|item| match serde_json::from_value(item.clone()) {
			Ok(parsed) => Some(parsed),
			Err(err) => {
				tracing::warn!(label, error = %err, "Skipping malformed chat list item.");

				None
			},
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reply_normalizes_singular_citation() {
		let data = serde_json::json!({
			"output": "Answer",
			"session_id": "session_9",
			"citation": { "title": "Policy", "url": "https://intra/policy" },
			"evaluation": { "ACCURACY": "high" },
		});
		let reply = ChatReply::from_data(&data);

		assert_eq!(reply.session_id.as_deref(), Some("session_9"));
		assert_eq!(reply.citations.len(), 1);
		assert_eq!(reply.citations[0].url.as_deref(), Some("https://intra/policy"));
		assert!(reply.evaluation.is_some());
	}

	#[test]
	fn malformed_list_items_are_skipped() {
		let data = serde_json::json!([
			{ "session_id": "a", "first_message": "hi", "created_at": "2024-06-01T00:00:00" },
			{ "first_message": "no id" },
		]);
		let sessions = parse_items::<SessionInfo>(&data, "session");

		assert_eq!(sessions.len(), 1);
		assert_eq!(sessions[0].session_id, "a");
	}
}
