mod error;

pub use error::{Error, Result};

use std::{
	net::SocketAddr,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::Router;
use serde_json::Map;
use tokio::{net::TcpListener, sync::oneshot};

use orgscope_config::{Api, Chat, Config, Retry, Search, Service, Summary};

/// In-process HTTP backend bound to an ephemeral local port. Shuts down on drop.
pub struct StubServer {
	addr: SocketAddr,
	shutdown: Option<oneshot::Sender<()>>,
}
impl StubServer {
	pub async fn start(app: Router) -> Result<Self> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			if let Err(err) = server.into_future().await {
				eprintln!("Stub server stopped with an error: {err}.");
			}
		});

		Ok(Self { addr, shutdown: Some(tx) })
	}

	pub fn addr(&self) -> SocketAddr {
		self.addr
	}

	pub fn base_url(&self) -> String {
		format!("http://{}", self.addr)
	}

	/// Configuration pointing every endpoint at this server.
	pub fn config(&self) -> Config {
		sample_config(&self.base_url())
	}
}
impl Drop for StubServer {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

/// Shared request counter for stub handlers.
#[derive(Clone, Debug, Default)]
pub struct Hits(Arc<AtomicUsize>);
impl Hits {
	pub fn record(&self) -> usize {
		self.0.fetch_add(1, Ordering::SeqCst) + 1
	}

	pub fn count(&self) -> usize {
		self.0.load(Ordering::SeqCst)
	}
}

/// Fast-failing configuration for tests: one retry with a 1ms delay and a short debounce.
pub fn sample_config(base_url: &str) -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		api: Api {
			base_url: base_url.to_string(),
			chat_base_url: None,
			timeout_ms: 2_000,
			default_headers: Map::new(),
			retry: Retry { max_retries: 1, base_delay_ms: 1 },
		},
		search: Search {
			debounce_ms: 300,
			page_size: 10,
			employee_page_size: 5,
			document_page_size: 5,
			hybrid_weight: 0.7,
		},
		chat: Chat {
			provider: "GCP_CLAUDE".to_string(),
			provider_id: "claude-3-5-sonnet@20240620".to_string(),
			knowledge_scope: "world".to_string(),
			temperature: 0.01,
			k: 5,
			size: 20,
			rerank_topk: 5,
			extra_params: Map::new(),
		},
		summary: Summary::default(),
	}
}
