use std::time::Duration;

use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode},
	routing,
};
use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};

use orgscope_domain::{ChannelPage, PageCursor, SearchFilters, SelectionTracker};
use orgscope_providers::{
	ApiClient, Error,
	chat::{self, ChatRequest},
	employees::{self, EmployeeQuery},
	search::{self, DocumentQuery, SearchRequest},
	summary::{self, SummaryRequest},
};
use orgscope_testkit::{Hits, StubServer};

fn document_query<'a>(query: &'a str, filters: &'a SearchFilters) -> DocumentQuery<'a> {
	DocumentQuery { query, filters, size: 5, from: 10, hybrid_weight: 0.7 }
}

#[test]
fn builds_bearer_auth_header() {
	let headers = orgscope_providers::auth_headers(Some("secret"), &Map::new())
		.expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
	assert!(
		orgscope_providers::auth_headers(None, &Map::new())
			.expect("Failed to build headers.")
			.get(AUTHORIZATION)
			.is_none()
	);
}

#[test]
fn wildcard_search_disables_semantic_ranking() {
	let filters = SearchFilters::default().with_content_type("policy");
	let wildcard = SearchRequest::for_documents(&document_query("*", &filters));
	let keyword = SearchRequest::for_documents(&document_query("leave policy", &filters));

	assert_eq!(wildcard.query, "");
	assert!(!wildcard.semantic_enabled);
	assert_eq!(wildcard.hybrid_weight, 0.0);
	assert!(wildcard.filters.content_type.is_empty());
	assert_eq!(keyword.filters.content_type, ["policy"]);
	assert!(keyword.semantic_enabled);
	assert_eq!(keyword.from_, 10);

	for request in [wildcard, keyword] {
		assert_eq!(request.filters.exclude_content_type, ["employee"]);
	}
}

#[test]
fn employee_and_document_ids_never_collide() {
	let employee = employees::employee_result(&serde_json::json!({ "id": 7, "name": "Ada" }), 0);
	let document = search::search_result(&serde_json::json!({ "id": "7", "title": "Leave policy" }), 0);
	let page = orgscope_domain::aggregate(
		&ChannelPage { results: vec![employee], total: 1, offset: 0, page_size: 5 },
		&ChannelPage { results: vec![document], total: 1, offset: 0, page_size: 5 },
		PageCursor::first(10),
	);
	let mut selection = SelectionTracker::new();

	selection.observe(&page);
	selection.toggle_all();

	let titles =
		selection.resolve(&page).into_iter().map(|result| result.title.as_str()).collect::<Vec<_>>();

	assert_eq!(page.combined_results[0].id.as_str(), "employee_7");
	assert_eq!(page.combined_results[1].id.as_str(), "7");
	assert_eq!(titles, ["Ada", "Leave policy"]);
}

#[tokio::test]
async fn document_search_reads_wrapped_responses() {
	let app = Router::new().route(
		"/search",
		routing::post(|Json(body): Json<Value>| async move {
			assert_eq!(body["filters"]["date_range"], "all");

			Json(serde_json::json!({
				"success": true,
				"data": { "results": [{ "id": "d1", "title": "Leave policy", "score": 0.9 }], "total": 12 },
			}))
		}),
	);
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let client = ApiClient::new(&server.config().api).expect("Failed to build client.");
	let filters = SearchFilters::default();
	let page = search::search_documents(&client, Some("t"), &document_query("leave", &filters))
		.await
		.expect("Search failed.");

	assert_eq!(page.total, 12);
	assert_eq!(page.offset, 10);
	assert_eq!(page.results[0].document().map(|meta| meta.score), Some(0.9));
}

#[tokio::test]
async fn employee_search_sends_wildcard_and_page() {
	let app = Router::new().route(
		"/employees/search",
		routing::get(|Query(params): Query<Map<String, Value>>| async move {
			assert_eq!(params["q"], "*");
			assert_eq!(params["page"], "2");

			Json(serde_json::json!({
				"data": { "employees": [{ "id": 1, "name": "Ada" }, { "id": 2, "name": "Lin" }], "total": 9 },
			}))
		}),
	);
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let client = ApiClient::new(&server.config().api).expect("Failed to build client.");
	let page = employees::search_employees(&client, None, &EmployeeQuery {
		query: "",
		size: 5,
		offset: 5,
	})
	.await
	.expect("Employee search failed.");

	assert_eq!(page.total, 9);
	assert_eq!(page.results.len(), 2);
	assert!(page.results.iter().all(|result| result.is_employee()));
}

#[tokio::test]
async fn unauthorized_is_reported_without_retry() {
	let hits = Hits::default();
	let app = Router::new()
		.route(
			"/search",
			routing::post(|State(hits): State<Hits>| async move {
				hits.record();

				StatusCode::UNAUTHORIZED
			}),
		)
		.with_state(hits.clone());
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let client = ApiClient::new(&server.config().api).expect("Failed to build client.");
	let filters = SearchFilters::default();
	let err = search::search_documents(&client, Some("expired"), &document_query("x", &filters))
		.await
		.expect_err("Expected an authentication failure.");

	assert!(matches!(err, Error::Unauthorized { .. }));
	assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn server_errors_are_retried() {
	let hits = Hits::default();
	let app = Router::new()
		.route(
			"/employees/7/hierarchy",
			routing::get(|State(hits): State<Hits>| async move {
				if hits.record() == 1 {
					return Err(StatusCode::SERVICE_UNAVAILABLE);
				}

				Ok(Json(serde_json::json!({
					"success": true,
					"data": {
						"employee": { "id": 7, "name": "Ada" },
						"managers": [{ "id": 2, "name": "Grace" }],
						"reports": [],
					},
				})))
			}),
		)
		.with_state(hits.clone());
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let client = ApiClient::new(&server.config().api).expect("Failed to build client.");
	let hierarchy =
		employees::get_hierarchy(&client, None, 7).await.expect("Hierarchy fetch failed.");

	assert_eq!(hits.count(), 2);
	assert_eq!(hierarchy.employee.name, "Ada");
	assert_eq!(hierarchy.managers[0].id, 2);
	assert!(hierarchy.reports.is_empty());
}

#[tokio::test]
async fn chat_requests_carry_config_defaults() {
	let app = Router::new().route(
		"/chat",
		routing::post(|headers: HeaderMap, Json(body): Json<Value>| async move {
			assert_eq!(headers[AUTHORIZATION], "Bearer t");
			assert_eq!(body["provider"], "GCP_CLAUDE");
			assert_eq!(body["knowledge_scope"], "world");
			assert_eq!(body["knnField"], "embeddings");

			Json(serde_json::json!({
				"code": 0,
				"msg": "ok",
				"data": { "output": "Hi", "session_id": body["session_id"], "citations": ["Handbook"] },
			}))
		}),
	);
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let mut cfg = server.config();

	cfg.chat.extra_params.insert("knnField".to_string(), Value::from("embeddings"));

	let client = ApiClient::new(&cfg.api).expect("Failed to build client.");
	let request = ChatRequest::from_config(&cfg.chat, "session_1", "hello");
	let envelope = chat::send_chat(&client, Some("t"), &request).await.expect("Chat failed.");
	let reply = envelope.reply();

	assert!(envelope.is_success());
	assert_eq!(reply.output, "Hi");
	assert_eq!(reply.session_id.as_deref(), Some("session_1"));
	assert_eq!(reply.citations[0].title, "Handbook");
}

#[tokio::test]
async fn chat_turns_are_sent_once_even_after_a_timeout() {
	let hits = Hits::default();
	let app = Router::new()
		.route(
			"/chat",
			routing::post(|State(hits): State<Hits>| async move {
				if hits.record() == 1 {
					tokio::time::sleep(Duration::from_millis(500)).await;
				}

				Json(serde_json::json!({ "code": 0, "msg": "ok", "data": { "output": "Hi" } }))
			}),
		)
		.with_state(hits.clone());
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let mut cfg = server.config();

	cfg.api.timeout_ms = 100;

	let client = ApiClient::new(&cfg.api).expect("Failed to build client.");
	let request = ChatRequest::from_config(&cfg.chat, "session_1", "hello");
	let err = chat::send_chat(&client, None, &request).await.expect_err("Expected a timeout.");

	assert!(matches!(err, Error::Reqwest(_)));
	assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn summary_posts_to_configured_path() {
	let app = Router::new().route(
		"/llm/summary",
		routing::post(|Json(body): Json<Value>| async move {
			assert_eq!(body["max_length"], 300);

			Json(serde_json::json!({ "success": true, "data": { "summary": "Short." } }))
		}),
	);
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let cfg = server.config();
	let client = ApiClient::new(&cfg.api).expect("Failed to build client.");
	let request = SummaryRequest {
		query: "leave".to_string(),
		search_results: Vec::new(),
		summary_type: "quick".to_string(),
		max_length: 300,
	};
	let text = summary::summarize(&client, None, &cfg.summary.path, &request)
		.await
		.expect("Summary failed.");

	assert_eq!(text, "Short.");
}
