pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod query;
pub mod sessions;
pub mod user;

pub use dispatcher::{
	ChatOptions, ChatTurn, Dispatcher, SummaryFormat, SummaryOptions, SummaryType, format_summary,
};
pub use error::{Error, Result};
pub use fetcher::{ChannelWarning, DualFetcher, FetchOutcome};
pub use query::{QueryController, SearchView};
pub use sessions::SessionReconciler;
pub use user::{Subscription, UserStore};

use std::{future::Future, pin::Pin, sync::Arc};

use orgscope_config::Config;
use orgscope_domain::{ChannelPage, EmployeeRecord};
use orgscope_providers::{
	ApiClient,
	chat::{self, ChatEnvelope, ChatRequest},
	employees::{self, EmployeeQuery, Hierarchy},
	search::{self, DocumentQuery},
	summary::{self, SummaryRequest},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type ProviderResult<T> = orgscope_providers::Result<T>;

/// Source of the bearer token attached to outgoing requests.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	fn token(&self) -> Option<String>;
}

/// Employee and document search plus employee lookups.
pub trait SearchBackend
where
	Self: Send + Sync,
{
	fn search_employees<'a>(
		&'a self,
		query: &'a EmployeeQuery<'a>,
	) -> BoxFuture<'a, ProviderResult<ChannelPage>>;

	fn search_documents<'a>(
		&'a self,
		query: &'a DocumentQuery<'a>,
	) -> BoxFuture<'a, ProviderResult<ChannelPage>>;

	fn get_employee<'a>(&'a self, id: i64) -> BoxFuture<'a, ProviderResult<EmployeeRecord>>;

	fn get_hierarchy<'a>(&'a self, id: i64) -> BoxFuture<'a, ProviderResult<Hierarchy>>;
}

pub trait ChatBackend
where
	Self: Send + Sync,
{
	fn send_chat<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, ProviderResult<ChatEnvelope>>;

	fn list_sessions<'a>(&'a self) -> BoxFuture<'a, ProviderResult<ChatEnvelope>>;

	fn list_messages<'a>(&'a self, session_id: &'a str)
	-> BoxFuture<'a, ProviderResult<ChatEnvelope>>;
}

pub trait SummaryBackend
where
	Self: Send + Sync,
{
	fn summarize<'a>(&'a self, request: &'a SummaryRequest) -> BoxFuture<'a, ProviderResult<String>>;
}

pub struct Backends {
	pub search: Arc<dyn SearchBackend>,
	pub chat: Arc<dyn ChatBackend>,
	pub summary: Arc<dyn SummaryBackend>,
}
impl Backends {
	pub fn new(
		search: Arc<dyn SearchBackend>,
		chat: Arc<dyn ChatBackend>,
		summary: Arc<dyn SummaryBackend>,
	) -> Self {
		Self { search, chat, summary }
	}

	/// HTTP backends for every seam, sharing one client.
	pub fn http(cfg: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
		let backend = Arc::new(HttpBackend::new(cfg, credentials)?);

		Ok(Self { search: backend.clone(), chat: backend.clone(), summary: backend })
	}
}

/// Credentials fixed at construction, for one-shot callers such as the CLI.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);
impl CredentialProvider for StaticToken {
	fn token(&self) -> Option<String> {
		self.0.clone()
	}
}

pub struct HttpBackend {
	client: ApiClient,
	summary_path: String,
	credentials: Arc<dyn CredentialProvider>,
}
impl HttpBackend {
	pub fn new(cfg: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
		Ok(Self {
			client: ApiClient::new(&cfg.api)?,
			summary_path: cfg.summary.path.clone(),
			credentials,
		})
	}
}

impl SearchBackend for HttpBackend {
	fn search_employees<'a>(
		&'a self,
		query: &'a EmployeeQuery<'a>,
	) -> BoxFuture<'a, ProviderResult<ChannelPage>> {
		Box::pin(async move {
			let token = self.credentials.token();

			employees::search_employees(&self.client, token.as_deref(), query).await
		})
	}

	fn search_documents<'a>(
		&'a self,
		query: &'a DocumentQuery<'a>,
	) -> BoxFuture<'a, ProviderResult<ChannelPage>> {
		Box::pin(async move {
			let token = self.credentials.token();

			search::search_documents(&self.client, token.as_deref(), query).await
		})
	}

	fn get_employee<'a>(&'a self, id: i64) -> BoxFuture<'a, ProviderResult<EmployeeRecord>> {
		Box::pin(async move {
			let token = self.credentials.token();

			employees::get_employee(&self.client, token.as_deref(), id).await
		})
	}

	fn get_hierarchy<'a>(&'a self, id: i64) -> BoxFuture<'a, ProviderResult<Hierarchy>> {
		Box::pin(async move {
			let token = self.credentials.token();

			employees::get_hierarchy(&self.client, token.as_deref(), id).await
		})
	}
}

impl ChatBackend for HttpBackend {
	fn send_chat<'a>(&'a self, request: &'a ChatRequest) -> BoxFuture<'a, ProviderResult<ChatEnvelope>> {
		Box::pin(async move {
			let token = self.credentials.token();

			chat::send_chat(&self.client, token.as_deref(), request).await
		})
	}

	fn list_sessions<'a>(&'a self) -> BoxFuture<'a, ProviderResult<ChatEnvelope>> {
		Box::pin(async move {
			let token = self.credentials.token();

			chat::list_sessions(&self.client, token.as_deref()).await
		})
	}

	fn list_messages<'a>(
		&'a self,
		session_id: &'a str,
	) -> BoxFuture<'a, ProviderResult<ChatEnvelope>> {
		Box::pin(async move {
			let token = self.credentials.token();

			chat::list_messages(&self.client, token.as_deref(), session_id).await
		})
	}
}

impl SummaryBackend for HttpBackend {
	fn summarize<'a>(&'a self, request: &'a SummaryRequest) -> BoxFuture<'a, ProviderResult<String>> {
		Box::pin(async move {
			let token = self.credentials.token();

			summary::summarize(&self.client, token.as_deref(), &self.summary_path, request).await
		})
	}
}
