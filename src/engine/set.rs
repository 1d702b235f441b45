use crate::config::Extensions;
use crate::document::DocumentSources;
use crate::engine::file_map::ModificationFileMap;
use crate::error::Result;
use crate::rules::{Modification, compile_documents};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info};

/// Ordered collection of modifications compiled from every known document.
#[derive(Debug, Clone, Default)]
pub struct ModificationSet {
	modifications: Vec<Modification>,
	extensions: Extensions,
}

impl ModificationSet {
	/// Build a set from already compiled modifications, in discovery order.
	pub fn new(modifications: Vec<Modification>, extensions: Extensions) -> Self {
		ModificationSet {
			modifications,
			extensions,
		}
	}

	/// Discover, parse and compile every document of `sources`.
	pub fn load(sources: &DocumentSources) -> Result<Self> {
		let documents = sources.list_documents()?;
		let modifications = compile_documents(&documents)?;

		info!(
			documents = documents.len(),
			modifications = modifications.len(),
			"loaded override documents"
		);

		Ok(Self::new(modifications, sources.extensions().clone()))
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Modification> {
		self.modifications.iter()
	}

	pub fn len(&self) -> usize {
		self.modifications.len()
	}

	pub fn is_empty(&self) -> bool {
		self.modifications.is_empty()
	}

	pub fn extensions(&self) -> &Extensions {
		&self.extensions
	}

	/// Modifications compiled from the document at `path`.
	pub fn by_document<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Modification> {
		self.modifications
			.iter()
			.filter(move |m| m.own_document_id() == path)
	}

	/// Run one apply pass over `content`.
	///
	/// Every modification is folded over the output of the previous one, in
	/// discovery order, replacing at most one match each. Inert rules and
	/// rules whose filter rejects `identity` are skipped, and override
	/// documents are never transformed. Every filter match is recorded in
	/// `files` under the modification's owner.
	pub fn apply(&self, content: &str, identity: &str, files: &mut ModificationFileMap) -> String {
		if self.extensions.is_override_identity(identity) {
			return content.to_string();
		}

		let mut output = Cow::Borrowed(content);
		for modification in &self.modifications {
			if modification.find().is_none() || !modification.applies_to(identity) {
				continue;
			}

			files.record(modification.owner_filename(), identity);

			let next = match modification.apply(&output) {
				Cow::Owned(next) => next,
				Cow::Borrowed(_) => continue,
			};
			debug!(
				file = identity,
				document = %modification.own_document_id().display(),
				"applied modification"
			);
			output = Cow::Owned(next);
		}

		output.into_owned()
	}
}

impl<'a> IntoIterator for &'a ModificationSet {
	type Item = &'a Modification;
	type IntoIter = std::slice::Iter<'a, Modification>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
