use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, SearchBackend};
use orgscope_domain::{AggregatedPage, Channel, ChannelPage, PageCursor, SearchFilters, aggregate};
use orgscope_providers::{employees::EmployeeQuery, search::DocumentQuery};

/// Non-fatal failure of one channel while the other succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelWarning {
	pub channel: Channel,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
	pub page: AggregatedPage,
	pub warnings: Vec<ChannelWarning>,
}

/// Runs the employee and document searches together and aggregates once both settle.
#[derive(Clone)]
pub struct DualFetcher {
	backend: Arc<dyn SearchBackend>,
	employee_page_size: u32,
	document_page_size: u32,
	hybrid_weight: f32,
}
impl DualFetcher {
	pub fn new(backend: Arc<dyn SearchBackend>, cfg: &orgscope_config::Search) -> Self {
		Self {
			backend,
			employee_page_size: cfg.employee_page_size,
			document_page_size: cfg.document_page_size,
			hybrid_weight: cfg.hybrid_weight,
		}
	}

	pub async fn fetch(
		&self,
		query: &str,
		filters: &SearchFilters,
		cursor: PageCursor,
	) -> Result<FetchOutcome> {
		let employee_query = EmployeeQuery {
			query,
			size: self.employee_page_size,
			offset: cursor.channel_offset(self.employee_page_size),
		};
		let document_query = DocumentQuery {
			query,
			filters,
			size: self.document_page_size,
			from: cursor.channel_offset(self.document_page_size),
			hybrid_weight: self.hybrid_weight,
		};

		tracing::info!(query, page = cursor.page, "Issuing dual search.");

		let (employees, documents) = tokio::join!(
			self.backend.search_employees(&employee_query),
			self.backend.search_documents(&document_query),
		);

		for result in [&employees, &documents] {
			if let Err(err) = result
				&& err.is_unauthorized()
			{
				return Err(Error::Authentication { message: err.to_string() });
			}
		}

		let mut warnings = Vec::new();
		let (employees, documents) = match (employees, documents) {
			(Ok(employees), Ok(documents)) => (employees, documents),
			(Err(employee_err), Err(document_err)) => {
				return Err(Error::TotalFailure {
					message: format!("employees: {employee_err}; documents: {document_err}"),
				});
			},
			(Ok(employees), Err(err)) => {
				warnings.push(degraded(Channel::Document, &err));

				(
					employees,
					ChannelPage::empty(document_query.from, u64::from(self.document_page_size)),
				)
			},
			(Err(err), Ok(documents)) => {
				warnings.push(degraded(Channel::Employee, &err));

				(
					ChannelPage::empty(employee_query.offset, u64::from(self.employee_page_size)),
					documents,
				)
			},
		};

		Ok(FetchOutcome { page: aggregate(&employees, &documents, cursor), warnings })
	}
}

fn degraded(channel: Channel, err: &orgscope_providers::Error) -> ChannelWarning {
	tracing::warn!(%channel, error = %err, "Search channel failed. Showing the other channel only.");

	ChannelWarning { channel, message: err.to_string() }
}
