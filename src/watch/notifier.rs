use crate::document::DocumentSources;
use crate::engine::{ModificationFileMap, ModificationSet};
use crate::error::{CompmodError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A lifecycle event for an override document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
	Added(PathBuf),
	Removed(PathBuf),
	Edited(PathBuf),
}

impl DocumentEvent {
	pub fn path(&self) -> &Path {
		match self {
			DocumentEvent::Added(path)
			| DocumentEvent::Removed(path)
			| DocumentEvent::Edited(path) => path,
		}
	}
}

/// Keeps the modification set and the matched-file bookkeeping current as
/// override documents come and go.
///
/// Every event rebuilds the set from the sources. If the rebuild fails the
/// previous set stays in effect and the error is returned.
#[derive(Debug)]
pub struct ChangeNotifier {
	sources: DocumentSources,
	modifications: ModificationSet,
	files: ModificationFileMap,
}

impl ChangeNotifier {
	/// Load the initial set from `sources`.
	pub fn new(sources: DocumentSources) -> Result<Self> {
		let modifications = ModificationSet::load(&sources)?;
		Ok(ChangeNotifier {
			sources,
			modifications,
			files: ModificationFileMap::new(),
		})
	}

	pub fn sources(&self) -> &DocumentSources {
		&self.sources
	}

	pub fn modifications(&self) -> &ModificationSet {
		&self.modifications
	}

	pub fn files(&self) -> &ModificationFileMap {
		&self.files
	}

	/// Run the apply engine over `content` and record the matches.
	pub fn transform(&mut self, content: &str, identity: &str) -> String {
		self.modifications.apply(content, identity, &mut self.files)
	}

	/// Intercept a read: fetch fresh content with `read` and transform it.
	pub fn read_with<F>(&mut self, identity: &str, read: F) -> Result<String>
	where
		F: FnOnce() -> std::io::Result<String>,
	{
		let content = read().map_err(|source| CompmodError::FileReadError {
			path: PathBuf::from(identity),
			source,
		})?;
		Ok(self.transform(&content, identity))
	}

	/// Read a candidate file from disk and transform it.
	pub fn read(&mut self, path: &Path) -> Result<String> {
		let identity = path.to_string_lossy().into_owned();
		self.read_with(&identity, || std::fs::read_to_string(path))
	}

	/// Handle a document event and return the candidate files that must be
	/// treated as changed, without duplicates.
	///
	/// `watched` lists every file the host currently watches; it is only
	/// consulted when an edited document's matched files are unknown.
	pub fn handle<I, P>(&mut self, event: &DocumentEvent, watched: I) -> Result<Vec<String>>
	where
		I: IntoIterator<Item = P>,
		P: AsRef<Path>,
	{
		match event {
			DocumentEvent::Added(path) => self.document_added(path),
			DocumentEvent::Removed(path) => self.document_removed(path),
			DocumentEvent::Edited(path) => self.document_edited(path, watched),
		}
	}

	fn recompute(&mut self) -> Result<()> {
		self.modifications = ModificationSet::load(&self.sources)?;
		Ok(())
	}

	fn document_added(&mut self, path: &Path) -> Result<Vec<String>> {
		info!(path = %path.display(), "override document added");
		self.recompute()?;
		Ok(Vec::new())
	}

	fn document_removed(&mut self, path: &Path) -> Result<Vec<String>> {
		let Some(owner) = self
			.modifications
			.by_document(path)
			.next()
			.map(|m| m.owner_filename().to_string())
		else {
			debug!(path = %path.display(), "removed document had no modifications");
			return Ok(Vec::new());
		};

		info!(path = %path.display(), target = %owner, "override document removed");
		self.recompute()?;

		let changed: Vec<String> = self
			.files
			.remove(&owner)
			.map(|files| files.into_iter().collect())
			.unwrap_or_default();
		Ok(changed)
	}

	fn document_edited<I, P>(&mut self, path: &Path, watched: I) -> Result<Vec<String>>
	where
		I: IntoIterator<Item = P>,
		P: AsRef<Path>,
	{
		let previous_owners: BTreeSet<String> = self
			.modifications
			.by_document(path)
			.map(|m| m.owner_filename().to_string())
			.collect();

		self.recompute()?;

		let mut changed = BTreeSet::new();
		let current = self.modifications.by_document(path).next();
		let current_owner = current.map(|m| m.owner_filename());

		// The document stopped targeting these files.
		for owner in &previous_owners {
			if Some(owner.as_str()) != current_owner
				&& let Some(files) = self.files.remove(owner)
			{
				changed.extend(files);
			}
		}

		let Some(modification) = current else {
			return Ok(changed.into_iter().collect());
		};
		let owner = modification.owner_filename();
		info!(path = %path.display(), target = %owner, "override document edited");

		match self.files.get(owner) {
			Some(files) => changed.extend(files.iter().cloned()),
			None => {
				// Target changed or never applied: find the files by filter.
				for file in watched {
					let identity = file.as_ref().to_string_lossy();
					if self.modifications.extensions().is_override_identity(&identity)
						|| !modification.applies_to(&identity)
					{
						continue;
					}
					self.files.record(owner, &identity);
					changed.insert(identity.into_owned());
				}
			}
		}

		Ok(changed.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Extensions;
	use pretty_assertions::assert_eq;
	use std::fs;
	use tempfile::TempDir;

	struct Fixture {
		_temp: TempDir,
		docs: PathBuf,
		src: PathBuf,
	}

	impl Fixture {
		fn new() -> Self {
			let temp = tempfile::tempdir().unwrap();
			let root = crate::document::scan::absolute_path(temp.path());
			let docs = root.join("overrides");
			let src = root.join("src");
			fs::create_dir_all(&docs).unwrap();
			fs::create_dir_all(&src).unwrap();
			Fixture {
				_temp: temp,
				docs,
				src,
			}
		}

		fn document(&self, name: &str, content: &str) -> PathBuf {
			let path = self.docs.join(name);
			fs::write(&path, content).unwrap();
			path
		}

		fn source(&self, name: &str, content: &str) -> PathBuf {
			let path = self.src.join(name);
			fs::write(&path, content).unwrap();
			path
		}

		fn notifier(&self) -> ChangeNotifier {
			let sources =
				DocumentSources::new(vec![self.docs.clone()], vec![], &[], Extensions::default())
					.unwrap();
			ChangeNotifier::new(sources).unwrap()
		}
	}

	fn identity(path: &Path) -> String {
		path.to_string_lossy().into_owned()
	}

	#[test]
	fn test_read_applies_fresh_content() {
		let fixture = Fixture::new();
		fixture.document("Foo.vuem", "<script>ADDED</script>");
		let source = fixture.source("Foo.vue", "<script>one</script>");
		let mut notifier = fixture.notifier();

		assert_eq!(
			notifier.read(&source).unwrap(),
			"<script>oneADDED\n</script>"
		);

		fs::write(&source, "<script>two</script>").unwrap();
		assert_eq!(
			notifier.read(&source).unwrap(),
			"<script>twoADDED\n</script>"
		);
		assert!(notifier.files().contains("Foo.vue", &identity(&source)));
	}

	#[test]
	fn test_read_missing_file() {
		let fixture = Fixture::new();
		let mut notifier = fixture.notifier();
		let result = notifier.read(&fixture.src.join("Missing.vue"));
		assert!(matches!(result, Err(CompmodError::FileReadError { .. })));
	}

	#[test]
	fn test_added_document_recomputes() {
		let fixture = Fixture::new();
		let mut notifier = fixture.notifier();
		assert!(notifier.modifications().is_empty());

		let path = fixture.document("Foo.vuem", "<style>x</style>");
		let changed = notifier
			.handle(&DocumentEvent::Added(path), Vec::<PathBuf>::new())
			.unwrap();

		assert!(changed.is_empty());
		assert_eq!(notifier.modifications().len(), 1);
		assert_eq!(
			notifier.transform("<style></style>", "/any/Foo.vue"),
			"<style>x\n</style>"
		);
	}

	#[test]
	fn test_removed_document_emits_each_file_once() {
		let fixture = Fixture::new();
		let doc = fixture.document("Foo.vuem", "<script>a</script><style>b</style>");
		let mut notifier = fixture.notifier();

		notifier.transform("<script></script><style></style>", "/x/Foo.vue");
		notifier.transform("<script></script>", "/y/Foo.vue");
		notifier.transform("<script></script>", "/x/Foo.vue");

		fs::remove_file(&doc).unwrap();
		let changed = notifier
			.handle(&DocumentEvent::Removed(doc), Vec::<PathBuf>::new())
			.unwrap();

		assert_eq!(changed, vec!["/x/Foo.vue", "/y/Foo.vue"]);
		assert!(notifier.files().get("Foo.vue").is_none());
		assert!(notifier.modifications().is_empty());
		assert_eq!(notifier.transform("<script></script>", "/x/Foo.vue"), "<script></script>");
	}

	#[test]
	fn test_removed_unknown_document_is_noop() {
		let fixture = Fixture::new();
		fixture.document("Foo.vuem", "<script>a</script>");
		let mut notifier = fixture.notifier();
		notifier.transform("<script></script>", "/x/Foo.vue");

		let changed = notifier
			.handle(
				&DocumentEvent::Removed(fixture.docs.join("Other.vuem")),
				Vec::<PathBuf>::new(),
			)
			.unwrap();

		assert!(changed.is_empty());
		assert!(notifier.files().contains("Foo.vue", "/x/Foo.vue"));
	}

	#[test]
	fn test_edited_document_uses_known_files() {
		let fixture = Fixture::new();
		let doc = fixture.document("Foo.vuem", "<script>a</script>");
		let mut notifier = fixture.notifier();
		notifier.transform("<script></script>", "/x/Foo.vue");

		fs::write(&doc, "<script>b</script>").unwrap();
		let changed = notifier
			.handle(&DocumentEvent::Edited(doc), vec![PathBuf::from("/ignored/Foo.vue")])
			.unwrap();

		assert_eq!(changed, vec!["/x/Foo.vue"]);
		assert_eq!(
			notifier.transform("<script></script>", "/x/Foo.vue"),
			"<script>b\n</script>"
		);
	}

	#[test]
	fn test_edited_document_scans_watched_files_when_unknown() {
		let fixture = Fixture::new();
		let doc = fixture.document("Foo.vuem", "<script>a</script>");
		let bar = fixture.source("Bar.vue", "<script></script>");
		let other = fixture.source("Other.vue", "<script></script>");
		let mut notifier = fixture.notifier();
		notifier.transform("<script></script>", &identity(&fixture.src.join("Foo.vue")));

		fs::write(&doc, "<file>Bar.vue</file><script>a</script>").unwrap();
		let watched = vec![bar.clone(), other, doc.clone()];
		let changed = notifier
			.handle(&DocumentEvent::Edited(doc), &watched)
			.unwrap();

		// Files of the old target are refreshed too, and its entry is dropped.
		assert_eq!(
			changed,
			vec![identity(&bar), identity(&fixture.src.join("Foo.vue"))]
		);
		assert!(notifier.files().get("Foo.vue").is_none());
		assert!(notifier.files().contains("Bar.vue", &identity(&bar)));
	}

	#[test]
	fn test_edited_document_without_sections() {
		let fixture = Fixture::new();
		let doc = fixture.document("Foo.vuem", "<script>a</script>");
		let mut notifier = fixture.notifier();
		notifier.transform("<script></script>", "/x/Foo.vue");

		fs::write(&doc, "nothing left").unwrap();
		let changed = notifier
			.handle(&DocumentEvent::Edited(doc), Vec::<PathBuf>::new())
			.unwrap();

		assert_eq!(changed, vec!["/x/Foo.vue"]);
		assert!(notifier.files().is_empty());
	}

	#[test]
	fn test_failed_recompute_keeps_previous_set() {
		let fixture = Fixture::new();
		let doc = fixture.document("Foo.vuem", "<script>a</script>");
		let mut notifier = fixture.notifier();

		fs::write(&doc, r#"<script find="(">a</script>"#).unwrap();
		let result = notifier.handle(&DocumentEvent::Edited(doc), Vec::<PathBuf>::new());

		assert!(matches!(result, Err(CompmodError::InvalidRegex { .. })));
		assert_eq!(notifier.modifications().len(), 1);
	}

	#[test]
	fn test_event_path() {
		let event = DocumentEvent::Edited(PathBuf::from("/o/Foo.vuem"));
		assert_eq!(event.path(), Path::new("/o/Foo.vuem"));
	}
}
