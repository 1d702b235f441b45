use crate::config::Extensions;
use crate::error::{CompmodError, Result};
use crate::pattern::Pattern;
use std::borrow::Cow;
use std::path::Path;

/// An explicit `<file>` directive found in an override document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDirective {
	/// Trimmed text content of the element.
	pub filename: String,

	/// Whether the element carried a `regex` attribute.
	pub is_regex: bool,
}

/// The source file an override document targets, with the filter used to
/// recognise it among candidate files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
	filename: String,
	is_regex: bool,
	filter: Pattern,
}

impl Target {
	/// Resolve the target from an optional directive, falling back to the
	/// document's own file name.
	pub fn resolve(
		directive: Option<FileDirective>,
		document_path: &Path,
		extensions: &Extensions,
	) -> Result<Self> {
		match directive {
			Some(FileDirective {
				filename,
				is_regex: true,
			}) => Target::regex(&filename),
			Some(FileDirective {
				filename,
				is_regex: false,
			}) => Target::literal(&filename),
			None => Target::literal(&default_target_filename(document_path, extensions)?),
		}
	}

	/// A literal target; matches candidate paths ending in this filename.
	pub fn literal(filename: &str) -> Result<Self> {
		Ok(Target {
			filename: filename.to_string(),
			is_regex: false,
			filter: Pattern::new(&literal_filter_source(filename))?,
		})
	}

	/// A regex target, compiled verbatim.
	pub fn regex(source: &str) -> Result<Self> {
		Ok(Target {
			filename: source.to_string(),
			is_regex: true,
			filter: Pattern::new(source)?,
		})
	}

	/// The target filename (or regex source). Used as the grouping key for
	/// the modifications of this document.
	pub fn filename(&self) -> &str {
		&self.filename
	}

	pub fn is_regex(&self) -> bool {
		self.is_regex
	}

	pub fn filter(&self) -> &Pattern {
		&self.filter
	}
}

/// Default target for a document: its own file name with the override
/// extension swapped for the target extension.
pub fn default_target_filename(document_path: &Path, extensions: &Extensions) -> Result<String> {
	let name = document_path
		.file_name()
		.ok_or_else(|| CompmodError::MissingFileName {
			path: document_path.to_path_buf(),
		})?
		.to_string_lossy();

	let suffix = format!(".{}", extensions.override_ext);
	Ok(match name.strip_suffix(suffix.as_str()) {
		Some(stem) if !stem.is_empty() => format!("{}.{}", stem, extensions.target),
		_ => name.to_string(),
	})
}

/// Build the filter source for a literal target.
///
/// Separators are normalized and the literal is escaped into capture group 1.
/// The group must start at a path segment boundary and end the identity (or
/// be followed by a `?query` suffix), so `Foo.vue` never matches `NotFoo.vue`.
pub fn literal_filter_source(filename: &str) -> String {
	let normalized = normalize_separators(filename.trim());
	format!(r"(?:^|/)({})(?:$|\?)", regex::escape(&normalized))
}

/// Collapse every run of backslashes into a single `/`.
pub fn normalize_separators(path: &str) -> Cow<'_, str> {
	if !path.contains('\\') {
		return Cow::Borrowed(path);
	}

	let mut normalized = String::with_capacity(path.len());
	let mut in_run = false;
	for c in path.chars() {
		if c == '\\' {
			if !in_run {
				normalized.push('/');
			}
			in_run = true;
		} else {
			normalized.push(c);
			in_run = false;
		}
	}
	Cow::Owned(normalized)
}
