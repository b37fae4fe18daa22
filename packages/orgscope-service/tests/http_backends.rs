use std::sync::Arc;

use axum::{
	Json, Router,
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	routing,
};
use serde_json::json;

use orgscope_domain::{Channel, PageCursor, SearchFilters, User};
use orgscope_service::{Backends, DualFetcher, UserStore};
use orgscope_testkit::StubServer;

#[tokio::test]
async fn dual_fetch_over_http_degrades_the_failing_channel() {
	let app = Router::new()
		.route("/employees/search", routing::get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
		.route(
			"/search",
			routing::post(|headers: HeaderMap| async move {
				assert_eq!(headers[AUTHORIZATION], "Bearer user-token");

				Json(json!({
					"results": [
						{ "id": "d1", "title": "One" },
						{ "id": "d2", "title": "Two" },
						{ "id": "d3", "title": "Three" },
						{ "id": "d4", "title": "Four" },
					],
					"total": 4,
					"took": 3,
				}))
			}),
		);
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let cfg = server.config();
	let users = UserStore::new();

	users.set_user(User::new("u1", "Ada"), Some("user-token".to_string()));

	let backends = Backends::http(&cfg, Arc::new(users)).expect("Failed to build backends.");
	let fetcher = DualFetcher::new(backends.search, &cfg.search);
	let outcome = fetcher
		.fetch("engineering manager", &SearchFilters::default(), PageCursor::first(cfg.search.page_size))
		.await
		.expect("Fetch failed.");

	assert_eq!(outcome.page.combined_total, 4);
	assert_eq!(outcome.page.len(), 4);
	assert_eq!(outcome.warnings.len(), 1);
	assert_eq!(outcome.warnings[0].channel, Channel::Employee);
}

#[tokio::test]
async fn expired_token_surfaces_as_authentication_failure() {
	let app = Router::new()
		.route("/employees/search", routing::get(|| async { StatusCode::UNAUTHORIZED }))
		.route("/search", routing::post(|| async { Json(json!({ "results": [], "total": 0 })) }));
	let server = StubServer::start(app).await.expect("Failed to start stub server.");
	let cfg = server.config();
	let backends =
		Backends::http(&cfg, Arc::new(UserStore::new())).expect("Failed to build backends.");
	let fetcher = DualFetcher::new(backends.search, &cfg.search);
	let err = fetcher
		.fetch("x", &SearchFilters::default(), PageCursor::first(10))
		.await
		.expect_err("Expected an authentication failure.");

	assert!(err.is_authentication());
}
