use crate::error::{CompmodError, Result};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A compiled regex treated as an immutable value keyed by its source.
///
/// Two patterns are equal when their sources are equal, so compiled rule
/// lists can be compared structurally.
#[derive(Debug, Clone)]
pub struct Pattern {
	regex: Regex,
}

impl Pattern {
	/// Compile a pattern from its source.
	pub fn new(source: &str) -> Result<Self> {
		compile_regex(source).map(|regex| Pattern { regex })
	}

	/// The source this pattern was compiled from.
	pub fn as_str(&self) -> &str {
		self.regex.as_str()
	}

	/// Check whether the pattern matches anywhere in `haystack`.
	pub fn is_match(&self, haystack: &str) -> bool {
		self.regex.is_match(haystack)
	}

	/// Number of capture groups, not counting the implicit whole-match group.
	pub fn group_count(&self) -> usize {
		self.regex.captures_len() - 1
	}

	pub fn has_named_groups(&self) -> bool {
		self.regex.capture_names().flatten().next().is_some()
	}

	/// Replace the first match in `haystack`, expanding `${n}` references in
	/// `replacement`. Returns the input borrowed when nothing matched.
	pub fn replace_first<'h>(&self, haystack: &'h str, replacement: &str) -> Cow<'h, str> {
		self.regex.replace(haystack, replacement)
	}
}

impl PartialEq for Pattern {
	fn eq(&self, other: &Self) -> bool {
		self.as_str() == other.as_str()
	}
}

impl Eq for Pattern {}

impl Hash for Pattern {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.as_str().hash(state);
	}
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Compile a regex pattern string.
fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| CompmodError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}
