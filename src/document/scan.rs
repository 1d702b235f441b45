use crate::config::{ExcludePattern, Extensions, MergedConfig};
use crate::document::OverrideDocument;
use crate::error::{CompmodError, Result};
use crate::pattern::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Where override documents come from.
///
/// Exclude patterns are compiled on construction, so an invalid pattern is
/// reported before any directory is scanned.
#[derive(Debug, Clone)]
pub struct DocumentSources {
	dirs: Vec<PathBuf>,
	files: Vec<PathBuf>,
	exclude: Vec<Pattern>,
	extensions: Extensions,
}

impl DocumentSources {
	/// Build sources from explicit lists.
	pub fn new(
		dirs: Vec<PathBuf>,
		files: Vec<PathBuf>,
		exclude: &[ExcludePattern],
		extensions: Extensions,
	) -> Result<Self> {
		let exclude = exclude
			.iter()
			.map(|pattern| Pattern::new(&pattern.to_regex_source()))
			.collect::<Result<Vec<_>>>()?;

		Ok(DocumentSources {
			dirs: dirs.iter().map(|dir| absolute_path(dir)).collect(),
			files: files.iter().map(|file| absolute_path(file)).collect(),
			exclude,
			extensions,
		})
	}

	/// Build sources from a merged configuration.
	pub fn from_config(config: &MergedConfig) -> Result<Self> {
		let exclude: Vec<_> = config.exclude.iter().map(|e| e.pattern.clone()).collect();
		Self::new(
			config.dirs.clone(),
			config.files.clone(),
			&exclude,
			config.extensions.clone(),
		)
	}

	pub fn dirs(&self) -> &[PathBuf] {
		&self.dirs
	}

	pub fn files(&self) -> &[PathBuf] {
		&self.files
	}

	pub fn extensions(&self) -> &Extensions {
		&self.extensions
	}

	/// Whether `text` matches any exclude pattern.
	pub fn is_excluded(&self, text: &str) -> bool {
		self.exclude.iter().any(|pattern| pattern.is_match(text))
	}

	/// Discover and parse every override document, in discovery order.
	///
	/// Directories are walked recursively in file-name order and their
	/// documents are excluded by target filename. Explicit files follow and
	/// are excluded by their own path. Missing directories are skipped; an
	/// unreadable document fails the whole listing.
	pub fn list_documents(&self) -> Result<Vec<OverrideDocument>> {
		let mut documents = Vec::new();

		for dir in &self.dirs {
			if !dir.is_dir() {
				warn!(path = %dir.display(), "override directory not found, skipping");
				continue;
			}

			for entry in WalkDir::new(dir).sort_by_file_name() {
				let entry = entry.map_err(|source| CompmodError::ScanError {
					path: dir.clone(),
					source,
				})?;

				if !entry.file_type().is_file() || !self.extensions.is_override_document(entry.path())
				{
					continue;
				}

				let document = OverrideDocument::load(entry.path(), &self.extensions)?;
				if self.is_excluded(document.target().filename()) {
					debug!(path = %entry.path().display(), "excluded override document");
					continue;
				}
				documents.push(document);
			}
		}

		for file in &self.files {
			if self.is_excluded(&file.to_string_lossy()) {
				debug!(path = %file.display(), "excluded override document");
				continue;
			}
			documents.push(OverrideDocument::load(file, &self.extensions)?);
		}

		Ok(documents)
	}
}

/// Make a path absolute, resolving symlinks when the path exists so it
/// compares equal to paths reported by the file watcher.
pub fn absolute_path(path: &Path) -> PathBuf {
	std::fs::canonicalize(path)
		.or_else(|_| std::path::absolute(path))
		.unwrap_or_else(|_| path.to_path_buf())
}
