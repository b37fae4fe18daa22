use std::fmt;

use serde::{Deserialize, Serialize};

pub const EMPLOYEE_CONTENT_TYPE: &str = "employee";

/// One of the two independent search backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
	Employee,
	Document,
}
impl Channel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Employee => "employee",
			Self::Document => "document",
		}
	}
}
impl fmt::Display for Channel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(pub String);
impl ResultId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Directory ids share a number space with document ids, so they are namespaced.
	pub fn employee(directory_id: &str) -> Self {
		Self(format!("{}_{directory_id}", Channel::Employee.as_str()))
	}

	/// Deterministic id for wire results that arrive without one.
	pub fn positional(channel: Channel, absolute_offset: u64) -> Self {
		Self(format!("{}_at_{absolute_offset}", channel.as_str()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for ResultId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl From<&str> for ResultId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
	pub id: i64,
	pub name: String,
	pub title: String,
	pub email: String,
	pub department: String,
	pub location: String,
	pub phone: String,
	pub start_date: String,
	pub manager_id: Option<i64>,
	pub level: u32,
	pub has_reports: bool,
	pub report_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
	pub source: String,
	pub author: String,
	pub timestamp: String,
	pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultBody {
	Employee(EmployeeRecord),
	Document(DocumentMeta),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub id: ResultId,
	pub title: String,
	pub summary: String,
	pub content: String,
	pub url: String,
	pub department: String,
	pub tags: Vec<String>,
	pub content_type: String,
	pub body: ResultBody,
}
impl SearchResult {
	pub fn is_employee(&self) -> bool {
		matches!(self.body, ResultBody::Employee(_))
	}

	pub fn employee(&self) -> Option<&EmployeeRecord> {
		match &self.body {
			ResultBody::Employee(record) => Some(record),
			ResultBody::Document(_) => None,
		}
	}

	pub fn document(&self) -> Option<&DocumentMeta> {
		match &self.body {
			ResultBody::Document(meta) => Some(meta),
			ResultBody::Employee(_) => None,
		}
	}

	/// Where the result came from, as shown in source listings.
	pub fn source_label(&self) -> &str {
		match &self.body {
			ResultBody::Document(meta) => &meta.source,
			ResultBody::Employee(_) => "employee-directory",
		}
	}

	pub fn relevance(&self) -> f64 {
		match &self.body {
			ResultBody::Document(meta) => meta.score,
			ResultBody::Employee(_) => 1.0,
		}
	}
}
