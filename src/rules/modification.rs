use crate::document::target::normalize_separators;
use crate::pattern::Pattern;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// A compiled find/replace rule.
///
/// Modifications are immutable: a changed document is recompiled into new
/// modifications instead of patching existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
	owner_filename: String,
	filter: Pattern,
	find: Option<Pattern>,
	replace: String,
	own_document_id: PathBuf,
}

impl Modification {
	/// Build a modification. `replace` uses the regex crate's `${n}` syntax.
	pub fn new(
		owner_filename: String,
		filter: Pattern,
		find: Option<Pattern>,
		replace: String,
		own_document_id: PathBuf,
	) -> Self {
		Modification {
			owner_filename,
			filter,
			find,
			replace,
			own_document_id,
		}
	}

	/// Target filename of the owning document. Shared by every modification
	/// of documents targeting the same name.
	pub fn owner_filename(&self) -> &str {
		&self.owner_filename
	}

	pub fn filter(&self) -> &Pattern {
		&self.filter
	}

	/// Find pattern; `None` makes the rule inert.
	pub fn find(&self) -> Option<&Pattern> {
		self.find.as_ref()
	}

	pub fn replace(&self) -> &str {
		&self.replace
	}

	/// Path of the document this rule was compiled from.
	pub fn own_document_id(&self) -> &Path {
		&self.own_document_id
	}

	/// Whether the filter accepts a candidate identity.
	pub fn applies_to(&self, identity: &str) -> bool {
		self.filter.is_match(&normalize_separators(identity))
	}

	/// Replace the first match of the find pattern. Inert rules and
	/// non-matching content return the input unchanged.
	pub fn apply<'a>(&self, content: &'a str) -> Cow<'a, str> {
		match self.find {
			Some(ref find) => find.replace_first(content, &self.replace),
			None => Cow::Borrowed(content),
		}
	}
}
