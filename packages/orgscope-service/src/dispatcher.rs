use std::{fmt::Write as _, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, macros::format_description};

use crate::{ChatBackend, Error, Result, SessionReconciler, SummaryBackend};
use orgscope_domain::{
	ChatMessage, ChatRole, MessageId, MessageOrigin, SearchResult, SessionId, User,
};
use orgscope_providers::{
	chat::ChatRequest,
	summary::{SummaryRequest, SummarySource},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
	#[default]
	Quick,
	Detailed,
	Executive,
}
impl SummaryType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Quick => "quick",
			Self::Detailed => "detailed",
			Self::Executive => "executive",
		}
	}

	pub fn max_length(self) -> u32 {
		match self {
			Self::Quick => 300,
			Self::Detailed => 1_000,
			Self::Executive => 1_500,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Quick => "Quick Summary",
			Self::Detailed => "Detailed Analysis",
			Self::Executive => "Executive Summary",
		}
	}
}

/// Output post-processing. Generation is identical for every format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFormat {
	#[default]
	Text,
	Markdown,
	/// Plain-text report laid out for an external PDF converter.
	Pdf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
	pub summary_type: SummaryType,
	pub format: SummaryFormat,
	pub include_metadata: bool,
	pub include_sources: bool,
}
impl Default for SummaryOptions {
	fn default() -> Self {
		Self {
			summary_type: SummaryType::Quick,
			format: SummaryFormat::Text,
			include_metadata: true,
			include_sources: true,
		}
	}
}

/// Per-call overrides of the configured chat defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
	pub provider: Option<String>,
	pub provider_id: Option<String>,
	pub knowledge_scope: Option<String>,
	pub temperature: Option<f32>,
}

/// One confirmed chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
	pub requested_session_id: SessionId,
	/// The id the server answered under. Equals the requested id when the server omits one.
	pub session_id: SessionId,
	pub user_message: ChatMessage,
	pub reply: ChatMessage,
	pub evaluation: Option<Value>,
}

/// Turns selections into summary requests and chat input into reconciled turns.
#[derive(Clone)]
pub struct Dispatcher {
	chat: Arc<dyn ChatBackend>,
	summary: Arc<dyn SummaryBackend>,
	sessions: SessionReconciler,
	chat_cfg: orgscope_config::Chat,
}
impl Dispatcher {
	pub fn new(
		chat: Arc<dyn ChatBackend>,
		summary: Arc<dyn SummaryBackend>,
		sessions: SessionReconciler,
		chat_cfg: orgscope_config::Chat,
	) -> Self {
		Self { chat, summary, sessions, chat_cfg }
	}

	pub fn sessions(&self) -> &SessionReconciler {
		&self.sessions
	}

	pub async fn generate_summary(
		&self,
		query: &str,
		selection: &[SearchResult],
		user: Option<&User>,
		options: &SummaryOptions,
	) -> Result<String> {
		if selection.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Select at least one result to summarize.".to_string(),
			});
		}

		let request = SummaryRequest {
			query: query.trim().to_string(),
			search_results: selection.iter().map(SummarySource::from).collect(),
			summary_type: options.summary_type.as_str().to_string(),
			max_length: options.summary_type.max_length(),
		};

		tracing::info!(
			documents = selection.len(),
			summary_type = options.summary_type.as_str(),
			"Requesting summary."
		);

		let summary = self.summary.summarize(&request).await?;

		Ok(format_summary(&summary, selection, user, options, OffsetDateTime::now_utc()))
	}

	/// Sends `text` to the chat backend. Without a session id a new one is minted and
	/// registered before the request goes out.
	pub async fn send_message(
		&self,
		session_id: Option<SessionId>,
		text: &str,
		options: &ChatOptions,
	) -> Result<ChatTurn> {
		let text = text.trim();

		if text.is_empty() {
			return Err(Error::InvalidRequest { message: "Message text must be non-empty.".to_string() });
		}

		let now = OffsetDateTime::now_utc();
		let requested = match session_id {
			Some(id) => id,
			None => {
				let id = SessionId::generate(now);

				self.sessions.register_local(&id);

				id
			},
		};
		let user_message = ChatMessage::local(ChatRole::User, text, now);

		self.sessions.begin_turn(&requested, user_message.clone());

		let request = self.chat_request(&requested, text, options);
		let envelope = match self.chat.send_chat(&request).await {
			Ok(envelope) => envelope,
			Err(err) => {
				self.sessions.abandon_turn(&requested, &user_message.id);

				return Err(err.into());
			},
		};

		if !envelope.is_success() {
			self.sessions.abandon_turn(&requested, &user_message.id);

			return Err(Error::Application { code: envelope.code, message: envelope.msg });
		}

		let answer = envelope.reply();
		let confirmed = answer.session_id.map(SessionId::new).unwrap_or_else(|| requested.clone());
		let reply = ChatMessage {
			id: MessageId::local(),
			role: ChatRole::Assistant,
			content: answer.output,
			timestamp: OffsetDateTime::now_utc(),
			citations: answer.citations,
			origin: MessageOrigin::Server,
		};

		self.sessions.record_turn(&requested, &confirmed, &user_message.id, reply.clone());

		if confirmed != requested {
			tracing::info!(%requested, %confirmed, "Server assigned a different session id.");
		}

		Ok(ChatTurn {
			requested_session_id: requested,
			session_id: confirmed,
			user_message: ChatMessage { origin: MessageOrigin::Server, ..user_message },
			reply,
			evaluation: answer.evaluation,
		})
	}

	fn chat_request(&self, session_id: &SessionId, text: &str, options: &ChatOptions) -> ChatRequest {
		let mut request = ChatRequest::from_config(&self.chat_cfg, session_id.as_str(), text);

		if let Some(provider) = &options.provider {
			request.provider = provider.clone();
		}
		if let Some(provider_id) = &options.provider_id {
			request.provider_id = provider_id.clone();
		}
		if let Some(scope) = options.knowledge_scope.as_ref().filter(|scope| !scope.trim().is_empty())
		{
			request.knowledge_scope = scope.clone();
		}
		if let Some(temperature) = options.temperature {
			request.temperature = temperature;
		}

		request
	}
}

/// Applies the requested output format to a generated summary.
pub fn format_summary(
	summary: &str,
	selection: &[SearchResult],
	user: Option<&User>,
	options: &SummaryOptions,
	generated_at: OffsetDateTime,
) -> String {
	let date = generated_at
		.format(format_description!("[year]-[month]-[day]"))
		.unwrap_or_else(|_| generated_at.date().to_string());
	let user_name = user.map(|user| user.name.as_str()).unwrap_or("Unknown");
	let mut out = String::new();

	match options.format {
		SummaryFormat::Text => return summary.to_string(),
		SummaryFormat::Markdown => {
			if options.include_metadata {
				let _ = write!(
					out,
					"# Summary Report\n\n**Generated:** {date}\n**User:** {user_name}\n**Documents Analyzed:** {}\n**Summary Type:** {}\n\n---\n\n",
					selection.len(),
					options.summary_type.label(),
				);
			}

			let _ = write!(out, "## Summary\n\n{summary}");

			if options.include_sources {
				out.push_str("\n\n---\n\n## Sources\n");

				for (index, result) in selection.iter().enumerate() {
					let _ = writeln!(out, "{}. **{}** ({})", index + 1, result.title, result.source_label());
				}
			}
		},
		SummaryFormat::Pdf => {
			if options.include_metadata {
				let _ = write!(
					out,
					"SEARCH SUMMARY REPORT\nGenerated: {date}\nUser: {user_name}\nDocuments: {}\n\n",
					selection.len(),
				);
			}

			let _ = write!(out, "SUMMARY:\n{summary}\n");

			if options.include_sources {
				out.push_str("\nSOURCES:\n");

				for (index, result) in selection.iter().enumerate() {
					let _ = writeln!(out, "{}. {} ({})", index + 1, result.title, result.source_label());
				}
			}
		},
	}

	out
}
