use serde::{Deserialize, Serialize};

const CONVERSATIONAL_MARKERS: [&str; 11] = [
	"what", "how", "why", "when", "who", "tell me", "explain", "summarize", "find me", "show me",
	"help me",
];

/// Token identifying one issued query. Later generations supersede earlier ones.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QueryGeneration(pub u64);
impl QueryGeneration {
	pub fn next(self) -> Self {
		Self(self.0.wrapping_add(1))
	}

	pub fn supersedes(self, other: Self) -> bool {
		self > other
	}
}

/// Whether the text reads like a question meant for chat rather than a keyword search.
///
/// Matching is a lowercase substring test, so "showcase" counts because it contains "how".
pub fn is_conversational(text: &str) -> bool {
	let lowered = text.to_lowercase();

	CONVERSATIONAL_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Blank text and `*` both mean "everything".
pub fn is_wildcard(text: &str) -> bool {
	let trimmed = text.trim();

	trimmed.is_empty() || trimmed == "*"
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_conversational_text() {
		assert!(is_conversational("Who manages the platform team?"));
		assert!(is_conversational("Please SUMMARIZE the Q3 plan"));
		assert!(!is_conversational("vacation policy"));
	}

	#[test]
	fn generations_are_ordered() {
		let first = QueryGeneration::default().next();
		let second = first.next();

		assert!(second.supersedes(first));
		assert!(!first.supersedes(first));
	}
}
