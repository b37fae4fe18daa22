use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::citation::Citation;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SESSION_SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);
impl SessionId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Mints a client-side id of the form `session_<unix millis>_<9 base36 chars>`.
	pub fn generate(now: OffsetDateTime) -> Self {
		let millis = now.unix_timestamp_nanos() / 1_000_000;

		Self(format!("session_{millis}_{}", base36_suffix(Uuid::new_v4().as_u128())))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl From<&str> for SessionId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);
impl MessageId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn local() -> Self {
		Self(format!("local_{}", Uuid::new_v4().simple()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for MessageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	User,
	Assistant,
}
impl ChatRole {
	/// Anything other than `user` is shown as the assistant.
	pub fn from_wire(role: &str) -> Self {
		if role.eq_ignore_ascii_case("user") { Self::User } else { Self::Assistant }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
	/// Appended by this client and not yet seen in a fetched history.
	Local,
	Server,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub id: MessageId,
	pub role: ChatRole,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
	#[serde(default)]
	pub citations: Vec<Citation>,
	pub origin: MessageOrigin,
}
impl ChatMessage {
	pub fn local(role: ChatRole, content: impl Into<String>, timestamp: OffsetDateTime) -> Self {
		Self {
			id: MessageId::local(),
			role,
			content: content.into(),
			timestamp,
			citations: Vec::new(),
			origin: MessageOrigin::Local,
		}
	}

	pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
		self.citations = citations;

		self
	}

	pub fn is_local(&self) -> bool {
		self.origin == MessageOrigin::Local
	}
}

/// Reconciliation state of a session. Transitions only move forward.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	/// Created locally, unknown to the server.
	#[default]
	New,
	/// Acknowledged by the server.
	Persisted,
	/// History loaded.
	Active,
}
impl SessionState {
	/// Returns the later of the two states.
	pub fn advance(self, to: Self) -> Self {
		self.max(to)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
	pub id: SessionId,
	pub first_message: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(default)]
	pub messages: Vec<ChatMessage>,
	#[serde(default)]
	pub state: SessionState,
}
impl ChatSession {
	pub fn local(id: SessionId, created_at: OffsetDateTime) -> Self {
		Self {
			id,
			first_message: String::new(),
			created_at,
			messages: Vec::new(),
			state: SessionState::New,
		}
	}

	pub fn persisted(id: SessionId, first_message: String, created_at: OffsetDateTime) -> Self {
		Self { id, first_message, created_at, messages: Vec::new(), state: SessionState::Persisted }
	}

	pub fn advance(&mut self, to: SessionState) {
		self.state = self.state.advance(to);
	}

	pub fn is_local_only(&self) -> bool {
		self.state == SessionState::New
	}

	/// Ids of messages the server has acknowledged. Taken before a history fetch starts and
	/// handed back to [`Self::replace_history`] once it resolves.
	pub fn settled_ids(&self) -> Vec<MessageId> {
		self.messages
			.iter()
			.filter(|message| !message.is_local())
			.map(|message| message.id.clone())
			.collect()
	}

	/// Replaces the history with `fetched`.
	///
	/// Only messages listed in `settled` are assumed to be covered by `fetched`. Everything else,
	/// including turns confirmed while the fetch was in flight, is re-appended after the fetched
	/// history in its original order.
	pub fn replace_history(&mut self, fetched: Vec<ChatMessage>, settled: &[MessageId]) {
		let pending = self
			.messages
			.drain(..)
			.filter(|message| {
				!settled.contains(&message.id)
					&& !fetched.iter().any(|server| server.id == message.id)
			})
			.collect::<Vec<_>>();

		self.messages = fetched;
		self.messages.extend(pending);

		if self.first_message.is_empty()
			&& let Some(first) = self.messages.iter().find(|message| message.role == ChatRole::User)
		{
			self.first_message = first.content.clone();
		}

		self.advance(SessionState::Active);
	}
}

fn base36_suffix(mut seed: u128) -> String {
	let mut suffix = String::with_capacity(SESSION_SUFFIX_LEN);

	for _ in 0..SESSION_SUFFIX_LEN {
		suffix.push(char::from(BASE36[(seed % 36) as usize]));

		seed /= 36;
	}

	suffix
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn generated_session_ids_carry_millis_and_suffix() {
		let id = SessionId::generate(datetime!(2024-06-01 00:00:00 UTC));
		let parts = id.as_str().split('_').collect::<Vec<_>>();

		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "session");
		assert_eq!(parts[1], "1717200000000");
		assert_eq!(parts[2].len(), SESSION_SUFFIX_LEN);
		assert!(parts[2].bytes().all(|byte| BASE36.contains(&byte)));
	}

	#[test]
	fn state_never_regresses() {
		assert_eq!(SessionState::Active.advance(SessionState::Persisted), SessionState::Active);
		assert_eq!(SessionState::New.advance(SessionState::Persisted), SessionState::Persisted);
	}
}
