use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
	#[default]
	All,
	Today,
	Week,
	Month,
	Year,
}
impl DateRange {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::All => "all",
			Self::Today => "today",
			Self::Week => "week",
			Self::Month => "month",
			Self::Year => "year",
		}
	}
}

/// Search filters. Replaced wholesale on change, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
	pub source: Vec<String>,
	pub date_range: DateRange,
	pub content_type: Vec<String>,
	pub author: Option<Vec<String>>,
	pub tags: Option<Vec<String>>,
}
impl SearchFilters {
	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source.push(source.into());

		self
	}

	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type.push(content_type.into());

		self
	}

	pub fn with_date_range(mut self, date_range: DateRange) -> Self {
		self.date_range = date_range;

		self
	}

	pub fn authors(&self) -> &[String] {
		self.author.as_deref().unwrap_or_default()
	}

	pub fn tag_list(&self) -> &[String] {
		self.tags.as_deref().unwrap_or_default()
	}
}
