pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Request to {url} was rejected as unauthorized.")]
	Unauthorized { url: String },
	#[error("Request to {url} failed with status {status}: {body}")]
	Status { url: String, status: u16, body: String },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized { .. })
	}

	/// Transport failures and 5xx responses. Everything else is final.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Reqwest(err) => !err.is_decode() && !err.is_builder(),
			Self::Status { status, .. } => *status >= 500,
			_ => false,
		}
	}
}
