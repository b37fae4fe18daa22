use serde::{Deserialize, Serialize};

/// The signed-in user. Only the id and name feed into outgoing requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub department: String,
	#[serde(default)]
	pub position: String,
	#[serde(default)]
	pub role: String,
	#[serde(default)]
	pub company: String,
}
impl User {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self { id: id.into(), name: name.into(), ..Default::default() }
	}
}
