use std::sync::{Arc, Mutex, MutexGuard};

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::{ChatBackend, Error, Result};
use orgscope_domain::{
	ChatMessage, ChatRole, ChatSession, MessageId, MessageOrigin, SessionId, SessionState,
	time_serde::parse_timestamp,
};
use orgscope_providers::chat::{ChatEnvelope, MessageResponse, SessionInfo};

/// Merges optimistic local sessions with the server's session list and message history.
///
/// Sessions are matched by id and never duplicated. The active session and the full list are
/// published as snapshots.
#[derive(Clone)]
pub struct SessionReconciler {
	inner: Arc<Inner>,
}

struct Inner {
	backend: Arc<dyn ChatBackend>,
	book: Mutex<SessionBook>,
	active: watch::Sender<Option<ChatSession>>,
	sessions: watch::Sender<Vec<ChatSession>>,
}

#[derive(Default)]
struct SessionBook {
	sessions: Vec<ChatSession>,
	active: Option<SessionId>,
}
impl SessionBook {
	fn position(&self, id: &SessionId) -> Option<usize> {
		self.sessions.iter().position(|session| &session.id == id)
	}

	fn get_mut(&mut self, id: &SessionId) -> Option<&mut ChatSession> {
		self.sessions.iter_mut().find(|session| &session.id == id)
	}

	fn ensure(&mut self, id: &SessionId, now: OffsetDateTime) -> &mut ChatSession {
		let index = match self.position(id) {
			Some(index) => index,
			None => {
				self.sessions.push(ChatSession::local(id.clone(), now));

				self.sessions.len() - 1
			},
		};

		&mut self.sessions[index]
	}

	/// Moves the session `from` to `to`, folding it into an existing `to` when both exist.
	fn rekey(&mut self, from: &SessionId, to: &SessionId) {
		let Some(from_index) = self.position(from) else {
			return;
		};

		if self.position(to).is_some() {
			let moved = self.sessions.remove(from_index);

			if let Some(target) = self.get_mut(to) {
				for message in moved.messages {
					if !target.messages.iter().any(|existing| existing.id == message.id) {
						target.messages.push(message);
					}
				}

				if target.first_message.is_empty() {
					target.first_message = moved.first_message;
				}

				target.advance(moved.state);
			}
		} else {
			self.sessions[from_index].id = to.clone();
		}

		if self.active.as_ref() == Some(from) {
			self.active = Some(to.clone());
		}
	}

	fn active_session(&self) -> Option<ChatSession> {
		self.active.as_ref().and_then(|id| self.sessions.iter().find(|session| &session.id == id)).cloned()
	}
}

impl SessionReconciler {
	pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
		let (active, _) = watch::channel(None);
		let (sessions, _) = watch::channel(Vec::new());

		Self {
			inner: Arc::new(Inner { backend, book: Mutex::new(SessionBook::default()), active, sessions }),
		}
	}

	pub fn subscribe_active(&self) -> watch::Receiver<Option<ChatSession>> {
		self.inner.active.subscribe()
	}

	pub fn subscribe_sessions(&self) -> watch::Receiver<Vec<ChatSession>> {
		self.inner.sessions.subscribe()
	}

	pub fn sessions(&self) -> Vec<ChatSession> {
		self.inner.lock().sessions.clone()
	}

	pub fn active(&self) -> Option<ChatSession> {
		self.inner.lock().active_session()
	}

	pub fn session(&self, id: &SessionId) -> Option<ChatSession> {
		self.inner.lock().sessions.iter().find(|session| &session.id == id).cloned()
	}

	/// Starts a local session and makes it active.
	pub fn create_session(&self) -> SessionId {
		let now = OffsetDateTime::now_utc();
		let id = SessionId::generate(now);
		let mut book = self.inner.lock();

		book.ensure(&id, now);
		book.active = Some(id.clone());

		self.inner.publish(&book);

		id
	}

	/// Registers a local session under `id` unless one already exists.
	pub fn register_local(&self, id: &SessionId) {
		let mut book = self.inner.lock();

		book.ensure(id, OffsetDateTime::now_utc());

		self.inner.publish(&book);
	}

	/// Merges the server's session list into the local one: server order first, then sessions
	/// the server does not know yet.
	pub async fn load_sessions(&self) -> Result<Vec<ChatSession>> {
		let envelope = self.inner.backend.list_sessions().await?;
		let infos = ensure_success(envelope)?.sessions();

		tracing::info!(count = infos.len(), "Loaded chat sessions.");

		let mut book = self.inner.lock();
		let mut local = std::mem::take(&mut book.sessions);
		let mut merged = Vec::with_capacity(infos.len() + local.len());

		for info in infos {
			let id = SessionId::new(info.session_id.clone());

			if merged.iter().any(|session: &ChatSession| session.id == id) {
				continue;
			}

			let session = match local.iter().position(|session| session.id == id) {
				Some(index) => {
					let mut session = local.remove(index);

					if session.first_message.is_empty() {
						session.first_message = info.first_message;
					}

					session.advance(SessionState::Persisted);

					session
				},
				None => persisted_session(info),
			};

			merged.push(session);
		}

		merged.extend(local);

		book.sessions = merged;

		self.inner.publish(&book);

		Ok(book.sessions.clone())
	}

	/// Makes `id` active and replaces its history with the server's. Messages the server had not
	/// acknowledged when the fetch started are kept, as are turns sent while it was in flight.
	/// Sessions the server does not know skip the fetch.
	pub async fn select_session(&self, id: &SessionId) -> Result<ChatSession> {
		let settled = {
			let mut book = self.inner.lock();
			let Some(session) = book.sessions.iter().find(|session| &session.id == id) else {
				return Err(Error::SessionNotFound { session_id: id.to_string() });
			};

			if session.is_local_only() {
				let session = session.clone();

				book.active = Some(id.clone());

				self.inner.publish(&book);

				return Ok(session);
			}

			let settled = session.settled_ids();

			book.active = Some(id.clone());

			self.inner.publish(&book);

			settled
		};
		let envelope = self.inner.backend.list_messages(id.as_str()).await?;
		let mut fetched = ensure_success(envelope)?.messages();

		fetched.sort_by_key(|message| message.idx);

		let fetched = fetched.into_iter().map(server_message).collect::<Vec<_>>();
		let mut book = self.inner.lock();
		let Some(session) = book.get_mut(id) else {
			return Err(Error::SessionNotFound { session_id: id.to_string() });
		};

		session.replace_history(fetched, &settled);

		let session = session.clone();

		self.inner.publish(&book);

		Ok(session)
	}

	/// Appends a user message that is about to be sent.
	pub fn begin_turn(&self, id: &SessionId, message: ChatMessage) {
		let mut book = self.inner.lock();
		let session = book.ensure(id, message.timestamp);

		if session.first_message.is_empty() {
			session.first_message = message.content.clone();
		}

		session.messages.push(message);

		self.inner.publish(&book);
	}

	/// Drops a user message whose send failed.
	pub fn abandon_turn(&self, id: &SessionId, message_id: &MessageId) {
		let mut book = self.inner.lock();

		if let Some(session) = book.get_mut(id) {
			session.messages.retain(|message| &message.id != message_id);
		}

		self.inner.publish(&book);
	}

	/// Records a confirmed exchange. When the server answered under a different session id the
	/// optimistic session is re-keyed, or merged if that id is already present.
	pub fn record_turn(
		&self,
		requested: &SessionId,
		confirmed: &SessionId,
		user_message: &MessageId,
		reply: ChatMessage,
	) {
		let mut book = self.inner.lock();

		if requested != confirmed {
			book.rekey(requested, confirmed);
		}

		let session = book.ensure(confirmed, reply.timestamp);

		if let Some(message) = session.messages.iter_mut().find(|message| &message.id == user_message)
		{
			message.origin = MessageOrigin::Server;
		}

		session.messages.push(reply);
		session.advance(SessionState::Persisted);

		self.inner.publish(&book);
	}

	/// Removes the session locally. The server copy is left alone.
	pub fn delete_session(&self, id: &SessionId) -> bool {
		let mut book = self.inner.lock();
		let Some(index) = book.position(id) else {
			return false;
		};

		book.sessions.remove(index);

		if book.active.as_ref() == Some(id) {
			book.active = None;
		}

		self.inner.publish(&book);

		true
	}
}

impl Inner {
	fn lock(&self) -> MutexGuard<'_, SessionBook> {
		self.book.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn publish(&self, book: &SessionBook) {
		self.sessions.send_replace(book.sessions.clone());
		self.active.send_replace(book.active_session());
	}
}

fn ensure_success(envelope: ChatEnvelope) -> Result<ChatEnvelope> {
	if envelope.is_success() {
		Ok(envelope)
	} else {
		Err(Error::Application { code: envelope.code, message: envelope.msg })
	}
}

fn persisted_session(info: SessionInfo) -> ChatSession {
	let created_at = parse_timestamp(&info.created_at).unwrap_or(OffsetDateTime::UNIX_EPOCH);

	ChatSession::persisted(SessionId::new(info.session_id), info.first_message, created_at)
}

fn server_message(message: MessageResponse) -> ChatMessage {
	let id = if message.msg_id.trim().is_empty() {
		MessageId::new(format!("idx_{}", message.idx))
	} else {
		MessageId::new(message.msg_id)
	};

	ChatMessage {
		id,
		role: ChatRole::from_wire(&message.role),
		timestamp: parse_timestamp(&message.created_at).unwrap_or(OffsetDateTime::UNIX_EPOCH),
		content: message.content,
		citations: Vec::new(),
		origin: MessageOrigin::Server,
	}
}
