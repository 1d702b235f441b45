//! Filesystem watch loop driving a [`ChangeNotifier`].

use crate::document::scan::absolute_path;
use crate::error::Result;
use crate::watch::notifier::{ChangeNotifier, DocumentEvent};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A watch session: the notifier plus the set of candidate files the host
/// currently knows about.
pub struct WatchSession {
	notifier: ChangeNotifier,
	roots: Vec<PathBuf>,
	watched: BTreeSet<PathBuf>,
}

impl WatchSession {
	/// Create a session, collecting the initial candidate files under `roots`.
	pub fn new(notifier: ChangeNotifier, roots: &[PathBuf]) -> Self {
		let roots: Vec<PathBuf> = roots.iter().map(|root| absolute_path(root)).collect();
		let mut watched = BTreeSet::new();

		for root in &roots {
			for entry in WalkDir::new(root) {
				match entry {
					Ok(entry) if entry.file_type().is_file() => {
						watched.insert(entry.into_path());
					}
					Ok(_) => {}
					Err(e) => warn!(
						root = %root.display(),
						error = %e,
						"failed to scan watch root entry, skipping"
					),
				}
			}
		}

		debug!(files = watched.len(), "collected watched files");
		WatchSession {
			notifier,
			roots,
			watched,
		}
	}

	pub fn notifier(&self) -> &ChangeNotifier {
		&self.notifier
	}

	/// Candidate files currently known to the session.
	pub fn watched(&self) -> &BTreeSet<PathBuf> {
		&self.watched
	}

	/// Translate a filesystem event into document events (for override
	/// documents) and watched-file bookkeeping (for everything else).
	/// Returns the candidate files reported as changed.
	pub fn handle_fs_event(&mut self, event: &Event) -> Vec<String> {
		let mut changed = Vec::new();

		for path in &event.paths {
			if self.notifier.sources().extensions().is_override_document(path) {
				let Some(document_event) = classify(&event.kind, path) else {
					continue;
				};
				// Atomic saves replace a known document through a create or rename.
				let document_event = match document_event {
					DocumentEvent::Added(path) if self.is_known_document(&path) => {
						DocumentEvent::Edited(path)
					}
					other => other,
				};
				match self.notifier.handle(&document_event, &self.watched) {
					Ok(files) => {
						for file in files {
							if !changed.contains(&file) {
								changed.push(file);
							}
						}
					}
					Err(e) => {
						warn!(
							path = %path.display(),
							error = %e,
							"failed to reload override documents, keeping previous version"
						);
					}
				}
			} else if self.is_under_root(path) {
				self.track(&event.kind, path);
			}
		}

		changed
	}

	fn is_known_document(&self, path: &Path) -> bool {
		self.notifier.modifications().by_document(path).next().is_some()
	}

	fn is_under_root(&self, path: &Path) -> bool {
		self.roots.iter().any(|root| path.starts_with(root))
	}

	fn track(&mut self, kind: &EventKind, path: &Path) {
		match kind {
			EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)) if path.is_file() => {
				self.watched.insert(path.to_path_buf());
			}
			EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) if !path.exists() => {
				self.watched.remove(path);
			}
			_ => {}
		}
	}

	/// Directories that must be watched: document directories, the parents
	/// of explicit documents and the candidate roots.
	fn watch_targets(&self) -> Vec<(PathBuf, RecursiveMode)> {
		let sources = self.notifier.sources();
		let mut targets: Vec<(PathBuf, RecursiveMode)> = Vec::new();
		let mut push = |path: PathBuf, mode: RecursiveMode| {
			if path.is_dir() && !targets.iter().any(|(p, _)| *p == path) {
				targets.push((path, mode));
			}
		};

		for dir in sources.dirs() {
			push(dir.clone(), RecursiveMode::Recursive);
		}
		for file in sources.files() {
			if let Some(parent) = file.parent() {
				push(parent.to_path_buf(), RecursiveMode::NonRecursive);
			}
		}
		for root in &self.roots {
			push(root.clone(), RecursiveMode::Recursive);
		}
		targets
	}

	/// Watch the filesystem until the watcher shuts down, calling `on_change`
	/// for every candidate file reported as changed.
	///
	/// Events are delivered over a channel and handled one at a time on the
	/// calling thread.
	pub fn run<F>(mut self, mut on_change: F) -> Result<()>
	where
		F: FnMut(&str),
	{
		let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
		let mut watcher = notify::recommended_watcher(tx)?;

		for (path, mode) in self.watch_targets() {
			watcher.watch(&path, mode)?;
			info!(path = %path.display(), "watching for changes");
		}

		for result in rx {
			match result {
				Ok(event) => {
					for file in self.handle_fs_event(&event) {
						on_change(&file);
					}
				}
				Err(e) => warn!(error = %e, "filesystem watcher error"),
			}
		}

		Ok(())
	}
}

/// Map a filesystem event on an override document to a document event.
pub fn classify(kind: &EventKind, path: &Path) -> Option<DocumentEvent> {
	let path = path.to_path_buf();
	match kind {
		EventKind::Create(_) => Some(DocumentEvent::Added(path)),
		EventKind::Remove(_) => Some(DocumentEvent::Removed(path)),
		EventKind::Modify(ModifyKind::Name(_)) => {
			if path.exists() {
				Some(DocumentEvent::Added(path))
			} else {
				Some(DocumentEvent::Removed(path))
			}
		}
		EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
			Some(DocumentEvent::Edited(path))
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Extensions;
	use crate::document::DocumentSources;
	use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};
	use std::fs;

	fn session(root: &Path) -> WatchSession {
		let sources = DocumentSources::new(
			vec![root.join("overrides")],
			vec![],
			&[],
			Extensions::default(),
		)
		.unwrap();
		WatchSession::new(ChangeNotifier::new(sources).unwrap(), &[root.join("src")])
	}

	fn setup() -> (tempfile::TempDir, PathBuf) {
		let temp = tempfile::tempdir().unwrap();
		let root = absolute_path(temp.path());
		fs::create_dir_all(root.join("overrides")).unwrap();
		fs::create_dir_all(root.join("src/nested")).unwrap();
		fs::write(root.join("src/nested/Foo.vue"), "<script></script>").unwrap();
		(temp, root)
	}

	#[test]
	fn test_classify_events() {
		let path = Path::new("/o/Foo.vuem");

		assert_eq!(
			classify(&EventKind::Create(CreateKind::File), path),
			Some(DocumentEvent::Added(path.to_path_buf()))
		);
		assert_eq!(
			classify(&EventKind::Remove(RemoveKind::File), path),
			Some(DocumentEvent::Removed(path.to_path_buf()))
		);
		assert_eq!(
			classify(
				&EventKind::Modify(ModifyKind::Data(DataChange::Content)),
				path
			),
			Some(DocumentEvent::Edited(path.to_path_buf()))
		);
		assert_eq!(
			classify(
				&EventKind::Modify(ModifyKind::Name(RenameMode::From)),
				path
			),
			Some(DocumentEvent::Removed(path.to_path_buf()))
		);
		assert_eq!(classify(&EventKind::Access(notify::event::AccessKind::Any), path), None);
	}

	#[test]
	fn test_initial_watched_files() {
		let (_temp, root) = setup();
		let session = session(&root);

		assert_eq!(
			session.watched().iter().cloned().collect::<Vec<_>>(),
			vec![root.join("src/nested/Foo.vue")]
		);
	}

	#[test]
	fn test_candidate_files_tracked() {
		let (_temp, root) = setup();
		let mut session = session(&root);

		let created = root.join("src/Bar.vue");
		fs::write(&created, "").unwrap();
		session.handle_fs_event(
			&Event::new(EventKind::Create(CreateKind::File)).add_path(created.clone()),
		);
		assert!(session.watched().contains(&created));

		fs::remove_file(&created).unwrap();
		session.handle_fs_event(
			&Event::new(EventKind::Remove(RemoveKind::File)).add_path(created.clone()),
		);
		assert!(!session.watched().contains(&created));
	}

	#[test]
	fn test_document_edit_reports_watched_candidates() {
		let (_temp, root) = setup();
		let mut session = session(&root);

		let document = root.join("overrides/Foo.vuem");
		fs::write(&document, "<script>x</script>").unwrap();
		let changed = session.handle_fs_event(
			&Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
				.add_path(document.clone()),
		);

		let foo = root.join("src/nested/Foo.vue").to_string_lossy().into_owned();
		assert_eq!(changed, vec![foo.clone()]);
		assert!(session.notifier().files().contains("Foo.vue", &foo));

		fs::remove_file(&document).unwrap();
		let changed = session
			.handle_fs_event(&Event::new(EventKind::Remove(RemoveKind::File)).add_path(document));
		assert_eq!(changed, vec![foo]);
		assert!(session.notifier().files().is_empty());
	}

	#[test]
	fn test_replacing_known_document_reports_edit() {
		let (_temp, root) = setup();
		let document = root.join("overrides/Foo.vuem");
		fs::write(&document, "<script>x</script>").unwrap();
		let mut session = session(&root);

		let foo = root.join("src/nested/Foo.vue");
		session.notifier.read(&foo).unwrap();
		let foo = foo.to_string_lossy().into_owned();

		fs::write(&document, "<script>y</script>").unwrap();
		let changed = session.handle_fs_event(
			&Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
				.add_path(document.clone()),
		);
		assert_eq!(changed, vec![foo.clone()]);

		fs::write(&document, "<script>z</script>").unwrap();
		let changed = session.handle_fs_event(
			&Event::new(EventKind::Create(CreateKind::File)).add_path(document),
		);
		assert_eq!(changed, vec![foo]);
	}

	#[test]
	fn test_new_document_is_added_silently() {
		let (_temp, root) = setup();
		let mut session = session(&root);

		let document = root.join("overrides/Foo.vuem");
		fs::write(&document, "<script>x</script>").unwrap();
		let changed = session.handle_fs_event(
			&Event::new(EventKind::Create(CreateKind::File)).add_path(document),
		);

		assert!(changed.is_empty());
		assert_eq!(session.notifier().modifications().len(), 1);
	}

	#[cfg(unix)]
	#[test]
	fn test_unreadable_root_entries_are_skipped() {
		use std::os::unix::fs::PermissionsExt;

		let (_temp, root) = setup();
		let locked = root.join("src/locked");
		fs::create_dir_all(&locked).unwrap();
		fs::write(locked.join("Hidden.vue"), "").unwrap();
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

		let session = session(&root);
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

		assert!(session.watched().contains(&root.join("src/nested/Foo.vue")));
	}

	#[test]
	fn test_broken_document_keeps_previous_set() {
		let (_temp, root) = setup();
		let document = root.join("overrides/Foo.vuem");
		fs::write(&document, "<script>x</script>").unwrap();
		let mut session = session(&root);

		fs::write(&document, r#"<script find="[">x</script>"#).unwrap();
		let changed = session.handle_fs_event(
			&Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
				.add_path(document),
		);

		assert!(changed.is_empty());
		assert_eq!(session.notifier().modifications().len(), 1);
	}

	#[test]
	fn test_watch_targets() {
		let (_temp, root) = setup();
		let session = session(&root);
		let targets: Vec<_> = session.watch_targets().into_iter().map(|(p, _)| p).collect();

		assert_eq!(targets, vec![root.join("overrides"), root.join("src")]);
	}
}
