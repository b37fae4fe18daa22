mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Api, Chat, Config, Retry, Search, Service, Summary};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	if !cfg.search.channels_fill_page() {
		tracing::warn!(
			page_size = cfg.search.page_size,
			employee_page_size = cfg.search.employee_page_size,
			document_page_size = cfg.search.document_page_size,
			"Channel page sizes do not add up to search.page_size."
		);
	}

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.api.base_url.trim().is_empty() {
		return Err(Error::Validation { message: "api.base_url must be non-empty.".to_string() });
	}

	for (label, url) in [
		("api.base_url", Some(&cfg.api.base_url)),
		("api.chat_base_url", cfg.api.chat_base_url.as_ref()),
	] {
		if let Some(url) = url
			&& !(url.starts_with("http://") || url.starts_with("https://"))
		{
			return Err(Error::Validation {
				message: format!("{label} must start with http:// or https://."),
			});
		}
	}

	if cfg.api.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "api.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.api.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "api.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.search.debounce_ms == 0 {
		return Err(Error::Validation {
			message: "search.debounce_ms must be greater than zero.".to_string(),
		});
	}

	for (label, size) in [
		("search.page_size", cfg.search.page_size),
		("search.employee_page_size", cfg.search.employee_page_size),
		("search.document_page_size", cfg.search.document_page_size),
	] {
		if size == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if !cfg.search.hybrid_weight.is_finite() {
		return Err(Error::Validation {
			message: "search.hybrid_weight must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.hybrid_weight) {
		return Err(Error::Validation {
			message: "search.hybrid_weight must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (label, value) in [
		("chat.provider", &cfg.chat.provider),
		("chat.provider_id", &cfg.chat.provider_id),
		("chat.knowledge_scope", &cfg.chat.knowledge_scope),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !cfg.chat.temperature.is_finite() || cfg.chat.temperature < 0.0 {
		return Err(Error::Validation {
			message: "chat.temperature must be a finite number, zero or greater.".to_string(),
		});
	}
	if !cfg.summary.path.starts_with('/') {
		return Err(Error::Validation { message: "summary.path must start with /.".to_string() });
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.api.base_url.trim().trim_end_matches('/').to_string();

	cfg.api.base_url = trimmed;
	cfg.api.chat_base_url = cfg
		.api
		.chat_base_url
		.as_deref()
		.map(|url| url.trim().trim_end_matches('/'))
		.filter(|url| !url.is_empty())
		.map(str::to_string);

	if cfg.chat.knowledge_scope.trim().is_empty() {
		cfg.chat.knowledge_scope = "world".to_string();
	}
}
