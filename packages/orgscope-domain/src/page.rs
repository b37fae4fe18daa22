use serde::{Deserialize, Serialize};

use crate::result::SearchResult;

/// One channel's slice of results. Offsets and page sizes are per channel and do not align
/// across channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelPage {
	pub results: Vec<SearchResult>,
	pub total: u64,
	pub offset: u64,
	pub page_size: u64,
}
impl ChannelPage {
	pub fn empty(offset: u64, page_size: u64) -> Self {
		Self { results: Vec::new(), total: 0, offset, page_size }
	}
}

/// Logical page position shared by both channels. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
	pub page: u32,
	pub page_size: u32,
}
impl PageCursor {
	pub fn first(page_size: u32) -> Self {
		Self { page: 1, page_size: page_size.max(1) }
	}

	pub fn with_page(self, page: u32) -> Self {
		Self { page: page.max(1), ..self }
	}

	/// Offset of this logical page within one channel that serves `channel_page_size` results
	/// per page.
	pub fn channel_offset(self, channel_page_size: u32) -> u64 {
		u64::from(self.page.saturating_sub(1)) * u64::from(channel_page_size)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPage {
	pub combined_results: Vec<SearchResult>,
	pub combined_total: u64,
	pub employee_total: u64,
	pub document_total: u64,
	pub current_page: u32,
	pub page_size: u32,
	pub total_pages: u32,
	pub has_next_page: bool,
	pub has_previous_page: bool,
}
impl AggregatedPage {
	pub fn contains(&self, id: &crate::ResultId) -> bool {
		self.combined_results.iter().any(|result| &result.id == id)
	}

	pub fn len(&self) -> usize {
		self.combined_results.len()
	}

	pub fn is_empty(&self) -> bool {
		self.combined_results.is_empty()
	}
}

/// Merges both channels into the single view. Employees precede documents; scores are not
/// compared across channels. Pagination flags derive from the combined total and the logical
/// page, never from the channel offsets.
pub fn aggregate(
	employees: &ChannelPage,
	documents: &ChannelPage,
	cursor: PageCursor,
) -> AggregatedPage {
	let page_size = cursor.page_size.max(1);
	let combined_total = employees.total + documents.total;
	let total_pages = u32::try_from(combined_total.div_ceil(u64::from(page_size)))
		.unwrap_or(u32::MAX);
	let current_page = cursor.page.max(1);
	let mut combined_results =
		Vec::with_capacity(employees.results.len() + documents.results.len());

	combined_results.extend(employees.results.iter().cloned());
	combined_results.extend(documents.results.iter().cloned());

	AggregatedPage {
		combined_results,
		combined_total,
		employee_total: employees.total,
		document_total: documents.total,
		current_page,
		page_size,
		total_pages,
		has_next_page: current_page < total_pages,
		has_previous_page: current_page > 1,
	}
}
