use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiClient, Error, Result};
use orgscope_domain::{
	Channel, ChannelPage, EMPLOYEE_CONTENT_TYPE, EmployeeRecord, ResultBody, ResultId,
	SearchResult, is_wildcard,
};

const EMPLOYEE_SEARCH_PATH: &str = "/employees/search";

/// Manager chain and direct reports around one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
	pub employee: EmployeeRecord,
	pub managers: Vec<EmployeeRecord>,
	pub reports: Vec<EmployeeRecord>,
}

/// One employee-channel request.
#[derive(Debug, Clone)]
pub struct EmployeeQuery<'a> {
	pub query: &'a str,
	pub size: u32,
	pub offset: u64,
}
impl EmployeeQuery<'_> {
	/// The directory endpoint pages by number, 1-based.
	pub fn page(&self) -> u64 {
		self.offset / u64::from(self.size.max(1)) + 1
	}

	pub fn params(&self) -> Vec<(&'static str, String)> {
		let q = if is_wildcard(self.query) { "*".to_string() } else { self.query.trim().to_string() };

		vec![("q", q), ("size", self.size.to_string()), ("page", self.page().to_string())]
	}
}

pub async fn search_employees(
	client: &ApiClient,
	token: Option<&str>,
	query: &EmployeeQuery<'_>,
) -> Result<ChannelPage> {
	let json = client.get_json(&client.url(EMPLOYEE_SEARCH_PATH), &query.params(), token).await?;

	Ok(parse_employee_response(&json, query.offset, u64::from(query.size)))
}

pub async fn get_employee(client: &ApiClient, token: Option<&str>, id: i64) -> Result<EmployeeRecord> {
	let json = client.get_json(&client.url(&format!("/employees/{id}")), &[], token).await?;
	let payload = unwrap_data(&json);

	if !payload.is_object() {
		return Err(Error::InvalidResponse {
			message: format!("Employee {id} response is missing the employee object."),
		});
	}

	Ok(employee_record(payload))
}

pub async fn get_hierarchy(client: &ApiClient, token: Option<&str>, id: i64) -> Result<Hierarchy> {
	let json =
		client.get_json(&client.url(&format!("/employees/{id}/hierarchy")), &[], token).await?;

	parse_hierarchy(&json).ok_or_else(|| Error::InvalidResponse {
		message: format!("Hierarchy response for employee {id} is missing the employee object."),
	})
}

/// Accepts `{data: {employees, total}}` and `{employees, total}`. Any other shape is an empty
/// page.
pub fn parse_employee_response(json: &Value, offset: u64, page_size: u64) -> ChannelPage {
	let payload = match json.get("data") {
		Some(data) if data.get("employees").is_some() => data,
		_ => json,
	};
	let Some(items) = payload.get("employees").and_then(Value::as_array) else {
		tracing::warn!(
			shape = %crate::search::shape_of(json),
			"Employee search response has an unexpected shape."
		);

		return ChannelPage::empty(offset, page_size);
	};
	let results = items
		.iter()
		.enumerate()
		.filter(|(_, item)| item.is_object())
		.map(|(index, item)| employee_result(item, offset + index as u64))
		.collect::<Vec<_>>();
	let total = payload
		.get("total")
		.and_then(Value::as_u64)
		.filter(|total| *total > 0)
		.unwrap_or(results.len() as u64);

	ChannelPage { results, total, offset, page_size }
}

pub fn parse_hierarchy(json: &Value) -> Option<Hierarchy> {
	let payload = unwrap_data(json);
	let employee = payload.get("employee").filter(|employee| employee.is_object())?;
	let list = |key: &str| {
		payload
			.get(key)
			.and_then(Value::as_array)
			.map(|items| {
				items.iter().filter(|item| item.is_object()).map(employee_record).collect::<Vec<_>>()
			})
			.unwrap_or_default()
	};

	Some(Hierarchy {
		employee: employee_record(employee),
		managers: list("managers"),
		reports: list("reports"),
	})
}

/// Reads snake_case and camelCase spellings alike.
pub fn employee_record(item: &Value) -> EmployeeRecord {
	let text = |keys: &[&str]| crate::text_field(item, keys).unwrap_or_default().to_string();

	EmployeeRecord {
		id: crate::int_field(item, &["id", "_id"]).unwrap_or_default(),
		name: crate::text_field(item, &["name", "title"]).unwrap_or("Unknown").to_string(),
		title: text(&["title", "position"]),
		email: text(&["email"]),
		department: text(&["department"]),
		location: text(&["location"]),
		phone: text(&["phone"]),
		start_date: text(&["start_date", "startDate"]),
		manager_id: crate::int_field(item, &["manager_id", "managerId"]),
		level: crate::int_field(item, &["level"])
			.and_then(|level| u32::try_from(level).ok())
			.filter(|level| *level > 0)
			.unwrap_or(1),
		has_reports: ["has_reports", "hasReports"]
			.iter()
			.find_map(|key| item.get(*key).and_then(Value::as_bool))
			.unwrap_or(false),
		report_count: crate::int_field(item, &["report_count", "reportCount"])
			.and_then(|count| u32::try_from(count).ok())
			.unwrap_or(0),
	}
}

pub fn employee_result(item: &Value, absolute_offset: u64) -> SearchResult {
	let record = employee_record(item);
	let title = if record.title.is_empty() { "Employee" } else { record.title.as_str() };
	let department =
		if record.department.is_empty() { "Unknown Department" } else { record.department.as_str() };
	let mut content = format!("{title} in {department}");

	if !record.location.is_empty() {
		content.push_str(&format!(" - {}", record.location));
	}

	let tags = [record.department.as_str(), record.title.as_str()]
		.into_iter()
		.filter(|text| !text.is_empty())
		.map(slug)
		.chain([EMPLOYEE_CONTENT_TYPE.to_string()])
		.collect();

	SearchResult {
		id: crate::id_field(item, &["id", "_id"])
			.map(|id| ResultId::employee(&id))
			.unwrap_or_else(|| ResultId::positional(Channel::Employee, absolute_offset)),
		title: record.name.clone(),
		summary: format!("{} - {title} in {department}", record.name),
		content,
		url: if record.email.is_empty() { String::new() } else { format!("mailto:{}", record.email) },
		department: if record.department.is_empty() {
			"Unknown".to_string()
		} else {
			record.department.clone()
		},
		tags,
		content_type: EMPLOYEE_CONTENT_TYPE.to_string(),
		body: ResultBody::Employee(record),
	}
}

fn unwrap_data(json: &Value) -> &Value {
	json.get("data").filter(|data| data.is_object()).unwrap_or(json)
}

fn slug(text: &str) -> String {
	text.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join("-")
}
