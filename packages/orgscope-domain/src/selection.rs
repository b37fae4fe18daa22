use serde::{Deserialize, Serialize};

use crate::{page::AggregatedPage, result::{ResultId, SearchResult}};

/// Selection over the currently visible results, keyed by result id.
///
/// The tracker never stores result objects. Every new page passed to [`Self::observe`] replaces
/// the visible id list and drops selected ids that are no longer visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTracker {
	selected: Vec<ResultId>,
	visible: Vec<ResultId>,
}
impl SelectionTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn observe(&mut self, page: &AggregatedPage) {
		self.visible = page.combined_results.iter().map(|result| result.id.clone()).collect();

		let visible = &self.visible;

		self.selected.retain(|id| visible.contains(id));
	}

	/// Forgets both the visible ids and the selection.
	pub fn reset(&mut self) {
		self.selected.clear();
		self.visible.clear();
	}

	/// Returns whether `id` is selected afterwards. Ids that are not visible are ignored.
	pub fn toggle(&mut self, id: &ResultId) -> bool {
		if let Some(index) = self.selected.iter().position(|selected| selected == id) {
			self.selected.remove(index);

			return false;
		}
		if !self.visible.contains(id) {
			return false;
		}

		self.selected.push(id.clone());

		true
	}

	/// Clears the selection when every visible result is already selected, otherwise selects
	/// every visible result. Only the current page is considered.
	pub fn toggle_all(&mut self) {
		if !self.visible.is_empty() && self.selected.len() == self.visible.len() {
			self.selected.clear();
		} else {
			self.selected = self.visible.clone();
		}
	}

	pub fn deselect_all(&mut self) {
		self.selected.clear();
	}

	pub fn is_selected(&self, id: &ResultId) -> bool {
		self.selected.contains(id)
	}

	pub fn ids(&self) -> &[ResultId] {
		&self.selected
	}

	pub fn len(&self) -> usize {
		self.selected.len()
	}

	pub fn is_empty(&self) -> bool {
		self.selected.is_empty()
	}

	/// Dereferences the selection against `page`, in selection order.
	pub fn resolve<'a>(&self, page: &'a AggregatedPage) -> Vec<&'a SearchResult> {
		self.selected
			.iter()
			.filter_map(|id| page.combined_results.iter().find(|result| &result.id == id))
			.collect()
	}
}
