pub mod chat;
pub mod citation;
pub mod filters;
pub mod page;
pub mod query;
pub mod result;
pub mod selection;
pub mod time_serde;
pub mod user;

pub use chat::{
	ChatMessage, ChatRole, ChatSession, MessageId, MessageOrigin, SessionId, SessionState,
};
pub use citation::{Citation, CitationPayload, normalize_citations};
pub use filters::{DateRange, SearchFilters};
pub use page::{AggregatedPage, ChannelPage, PageCursor, aggregate};
pub use query::{QueryGeneration, is_conversational, is_wildcard};
pub use result::{
	Channel, DocumentMeta, EMPLOYEE_CONTENT_TYPE, EmployeeRecord, ResultBody, ResultId, SearchResult,
};
pub use selection::SelectionTracker;
pub use user::User;
