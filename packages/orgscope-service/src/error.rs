pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Authentication required: {message}")]
	Authentication { message: String },
	#[error("Search failed on both channels: {message}")]
	TotalFailure { message: String },
	#[error("Chat service returned code {code}: {message}")]
	Application { code: i64, message: String },
	#[error("{message}")]
	InvalidRequest { message: String },
	#[error("Session {session_id} was not found.")]
	SessionNotFound { session_id: String },
	#[error(transparent)]
	Provider(orgscope_providers::Error),
}
impl Error {
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Authentication { .. })
	}
}
impl From<orgscope_providers::Error> for Error {
	fn from(err: orgscope_providers::Error) -> Self {
		if err.is_unauthorized() {
			Self::Authentication { message: err.to_string() }
		} else {
			Self::Provider(err)
		}
	}
}
