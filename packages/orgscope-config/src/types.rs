use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub api: Api,
	pub search: Search,
	pub chat: Chat,
	#[serde(default)]
	pub summary: Summary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
	pub base_url: String,
	/// Optional. Chat, session and message endpoints fall back to `base_url` when unset.
	pub chat_base_url: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub retry: Retry,
}
impl Api {
	pub fn chat_base(&self) -> &str {
		self.chat_base_url.as_deref().unwrap_or(&self.base_url)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retry {
	pub max_retries: u32,
	pub base_delay_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_retries: 3, base_delay_ms: 1_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_debounce_ms")]
	pub debounce_ms: u64,
	pub page_size: u32,
	pub employee_page_size: u32,
	pub document_page_size: u32,
	#[serde(default = "default_hybrid_weight")]
	pub hybrid_weight: f32,
}
impl Search {
	/// Whether one page from each channel adds up to one logical page. When it does not, the
	/// combined page count either skips channel results or shows some twice.
	pub fn channels_fill_page(&self) -> bool {
		u64::from(self.employee_page_size) + u64::from(self.document_page_size)
			== u64::from(self.page_size)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
	pub provider: String,
	pub provider_id: String,
	#[serde(default = "default_knowledge_scope")]
	pub knowledge_scope: String,
	pub temperature: f32,
	pub k: u32,
	pub size: u32,
	pub rerank_topk: u32,
	/// Optional. Extra model parameters merged into every chat request body, e.g.
	/// `indexName` or `knnField`.
	#[serde(default)]
	pub extra_params: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Summary {
	pub path: String,
}
impl Default for Summary {
	fn default() -> Self {
		Self { path: default_summary_path() }
	}
}

fn default_debounce_ms() -> u64 {
	300
}

fn default_hybrid_weight() -> f32 {
	0.7
}

fn default_knowledge_scope() -> String {
	"world".to_string()
}

fn default_summary_path() -> String {
	"/llm/summary".to_string()
}
