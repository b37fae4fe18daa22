use serde_json::json;
use time::macros::datetime;

use orgscope_domain::{
	AggregatedPage, Channel, ChannelPage, ChatMessage, ChatRole, ChatSession, Citation,
	DocumentMeta, EmployeeRecord, MessageId, MessageOrigin, PageCursor, ResultBody, ResultId,
	SearchResult, SelectionTracker, SessionId, SessionState, aggregate, is_wildcard,
	normalize_citations,
};

fn employee(id: &str) -> SearchResult {
	SearchResult {
		id: ResultId::new(id),
		title: format!("Employee {id}"),
		summary: "Engineering Manager".to_string(),
		content: String::new(),
		url: format!("mailto:{id}@example.com"),
		department: "Engineering".to_string(),
		tags: Vec::new(),
		content_type: "employee".to_string(),
		body: ResultBody::Employee(EmployeeRecord {
			name: format!("Employee {id}"),
			..Default::default()
		}),
	}
}

fn document(id: &str) -> SearchResult {
	SearchResult {
		id: ResultId::new(id),
		title: format!("Doc {id}"),
		summary: String::new(),
		content: "body".to_string(),
		url: String::new(),
		department: String::new(),
		tags: vec!["policy".to_string()],
		content_type: "document".to_string(),
		body: ResultBody::Document(DocumentMeta {
			source: "confluence".to_string(),
			author: "ops".to_string(),
			timestamp: "2024-01-01".to_string(),
			score: 0.4,
		}),
	}
}

fn channel(results: Vec<SearchResult>, total: u64) -> ChannelPage {
	ChannelPage { results, total, offset: 0, page_size: 5 }
}

fn page_of(ids: &[&str]) -> AggregatedPage {
	aggregate(
		&channel(Vec::new(), 0),
		&channel(ids.iter().map(|id| document(id)).collect(), ids.len() as u64),
		PageCursor::first(10),
	)
}

#[test]
fn combined_total_is_the_sum_of_channel_totals() {
	let employees = channel(vec![employee("e1"), employee("e2"), employee("e3")], 3);
	let documents = channel((1..=5).map(|n| document(&format!("d{n}"))).collect(), 7);
	let page = aggregate(&employees, &documents, PageCursor::first(5));

	assert_eq!(page.combined_total, 10);
	assert_eq!(page.employee_total, 3);
	assert_eq!(page.document_total, 7);
	assert_eq!(page.total_pages, 2);
	assert!(page.has_next_page);
	assert!(!page.has_previous_page);
}

#[test]
fn employees_precede_documents() {
	let employees = channel(vec![employee("e1")], 1);
	let documents = channel(vec![document("d1"), document("d2")], 2);
	let page = aggregate(&employees, &documents, PageCursor::first(10));
	let ids = page.combined_results.iter().map(|result| result.id.as_str()).collect::<Vec<_>>();

	assert_eq!(ids, ["e1", "d1", "d2"]);
	assert!(page.combined_results[0].is_employee());
	assert!(!page.has_next_page);
}

#[test]
fn aggregation_is_idempotent() {
	let employees = channel(vec![employee("e1")], 4);
	let documents = channel(vec![document("d1")], 9);
	let cursor = PageCursor::first(5).with_page(2);

	assert_eq!(aggregate(&employees, &documents, cursor), aggregate(&employees, &documents, cursor));
}

#[test]
fn last_page_has_no_next() {
	let employees = channel(vec![employee("e1")], 6);
	let documents = channel(vec![document("d1")], 6);
	let page = aggregate(&employees, &documents, PageCursor::first(5).with_page(3));

	assert_eq!(page.total_pages, 3);
	assert!(!page.has_next_page);
	assert!(page.has_previous_page);
}

#[test]
fn channel_offsets_follow_the_logical_page() {
	let cursor = PageCursor::first(10).with_page(3);

	assert_eq!(cursor.channel_offset(5), 10);
	assert_eq!(cursor.channel_offset(7), 14);
	assert_eq!(PageCursor::first(10).channel_offset(5), 0);
	assert_eq!(ResultId::positional(Channel::Document, 12).as_str(), "document_at_12");
}

#[test]
fn selection_stays_within_visible_results() {
	let mut selection = SelectionTracker::new();

	selection.observe(&page_of(&["a", "b", "c"]));

	assert!(selection.toggle(&ResultId::from("a")));
	assert!(selection.toggle(&ResultId::from("c")));
	assert!(!selection.toggle(&ResultId::from("zzz")));

	let next = page_of(&["c", "d"]);

	selection.observe(&next);

	assert_eq!(selection.ids(), [ResultId::from("c")]);
	assert!(selection.ids().iter().all(|id| next.contains(id)));
	assert_eq!(selection.resolve(&next).len(), 1);
}

#[test]
fn toggle_all_flips_between_all_and_none() {
	let mut selection = SelectionTracker::new();
	let page = page_of(&["a", "b"]);

	selection.observe(&page);
	selection.toggle(&ResultId::from("b"));
	selection.toggle_all();

	assert_eq!(selection.len(), 2);

	selection.toggle_all();

	assert!(selection.is_empty());
}

#[test]
fn toggling_twice_deselects() {
	let mut selection = SelectionTracker::new();

	selection.observe(&page_of(&["a"]));

	assert!(selection.toggle(&ResultId::from("a")));
	assert!(!selection.toggle(&ResultId::from("a")));
	assert!(selection.is_empty());
}

#[test]
fn citation_shapes_normalize_to_lists() {
	let expected = vec![Citation::titled("A")];

	assert_eq!(normalize_citations(&json!({ "citation": { "title": "A" } })), expected);
	assert_eq!(normalize_citations(&json!({ "citations": [{ "title": "A" }] })), expected);
	assert_eq!(normalize_citations(&json!({ "citation": [{ "title": "A" }] })), expected);
	assert!(normalize_citations(&json!({})).is_empty());
}

#[test]
fn plural_citations_take_precedence() {
	let envelope = json!({ "citations": [{ "title": "Plural" }], "citation": { "title": "Singular" } });

	assert_eq!(normalize_citations(&envelope), vec![Citation::titled("Plural")]);
}

#[test]
fn wildcards_are_blank_or_star() {
	assert!(is_wildcard("*"));
	assert!(is_wildcard("   "));
	assert!(!is_wildcard("engineering manager"));
}

#[test]
fn history_replacement_keeps_pending_local_messages() {
	let at = datetime!(2024-06-01 10:00:00 UTC);
	let mut session =
		ChatSession::persisted(SessionId::from("session_1"), "hello".to_string(), at);
	let stale = ChatMessage { origin: MessageOrigin::Server, ..ChatMessage::local(ChatRole::User, "hello", at) };
	let pending = ChatMessage::local(ChatRole::User, "follow up", at);

	session.messages.push(stale);
	session.messages.push(pending.clone());

	let settled = session.settled_ids();

	let fetched = vec![ChatMessage {
		id: MessageId::new("1"),
		role: ChatRole::User,
		content: "hello".to_string(),
		timestamp: at,
		citations: Vec::new(),
		origin: MessageOrigin::Server,
	}];

	session.replace_history(fetched, &settled);

	assert_eq!(session.messages.len(), 2);
	assert_eq!(session.messages[0].id, MessageId::new("1"));
	assert_eq!(session.messages[1], pending);
	assert_eq!(session.state, SessionState::Active);

	session.advance(SessionState::Persisted);

	assert_eq!(session.state, SessionState::Active);
}

#[test]
fn turns_confirmed_during_a_fetch_survive_the_replacement() {
	let at = datetime!(2024-06-01 10:00:00 UTC);
	let mut session = ChatSession::persisted(SessionId::from("session_1"), "old".to_string(), at);
	let settled = session.settled_ids();
	let question = ChatMessage::local(ChatRole::User, "new question", at);
	let answer = ChatMessage {
		origin: MessageOrigin::Server,
		..ChatMessage::local(ChatRole::Assistant, "new answer", at)
	};

	session.messages.push(ChatMessage { origin: MessageOrigin::Server, ..question.clone() });
	session.messages.push(answer.clone());

	let fetched = vec![ChatMessage {
		id: MessageId::new("1"),
		role: ChatRole::User,
		content: "old".to_string(),
		timestamp: at,
		citations: Vec::new(),
		origin: MessageOrigin::Server,
	}];

	session.replace_history(fetched, &settled);

	let contents = session.messages.iter().map(|message| message.content.as_str()).collect::<Vec<_>>();

	assert_eq!(contents, ["old", "new question", "new answer"]);
	assert_eq!(session.messages[2].id, answer.id);
}
