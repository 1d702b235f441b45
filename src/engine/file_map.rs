use std::collections::{BTreeSet, HashMap};

/// Candidate files that matched at least one modification, grouped by the
/// modification's owner filename.
///
/// Only membership matters; each set iterates in sorted order so change
/// notifications come out deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModificationFileMap {
	entries: HashMap<String, BTreeSet<String>>,
}

impl ModificationFileMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record that `identity` matched a modification owned by `owner`.
	/// Returns true when the pair was not recorded before.
	pub fn record(&mut self, owner: &str, identity: &str) -> bool {
		match self.entries.get_mut(owner) {
			Some(files) => files.insert(identity.to_string()),
			None => {
				self.entries
					.insert(owner.to_string(), BTreeSet::from([identity.to_string()]));
				true
			}
		}
	}

	/// Files recorded for `owner`, if any were.
	pub fn get(&self, owner: &str) -> Option<&BTreeSet<String>> {
		self.entries.get(owner)
	}

	/// Remove and return the entry for `owner`.
	pub fn remove(&mut self, owner: &str) -> Option<BTreeSet<String>> {
		self.entries.remove(owner)
	}

	pub fn contains(&self, owner: &str, identity: &str) -> bool {
		self.entries
			.get(owner)
			.is_some_and(|files| files.contains(identity))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
