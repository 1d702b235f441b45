use crate::document::markup::Attributes;
use crate::document::target::Target;
use crate::error::Result;
use crate::pattern::Pattern;
use crate::rules::modification::Modification;
use crate::rules::replacement::{CaptureGroups, expand_template};
use std::fmt;
use std::path::Path;

/// Replacement used when a section sets neither `replace`, `before` nor
/// `after`: the body goes right before the matched text.
pub const DEFAULT_REPLACE: &str = "$S\n$1";

/// The kinds of section an override document may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
	Template,
	Script,
	Style,
}

impl SectionKind {
	/// All kinds, in the order their sections are compiled.
	pub const ALL: [SectionKind; 3] = [SectionKind::Template, SectionKind::Script, SectionKind::Style];

	/// Tag name of this section in an override document.
	pub fn tag_name(&self) -> &'static str {
		match self {
			SectionKind::Template => "template",
			SectionKind::Script => "script",
			SectionKind::Style => "style",
		}
	}

	/// Structural find pattern: the closing tag of the same block in the
	/// target source.
	pub fn default_find(&self) -> &'static str {
		match self {
			SectionKind::Template => "(</template[^>]*>)",
			SectionKind::Script => "(</script[^>]*>)",
			SectionKind::Style => "(</style[^>]*>)",
		}
	}
}

impl fmt::Display for SectionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag_name())
	}
}

/// Configuration carried by a section's attributes.
///
/// Empty attribute values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionConfig {
	/// Regex locating the text to replace.
	pub find: Option<String>,

	/// Replacement template (see [`expand_template`]).
	pub replace: Option<String>,

	/// Insert the body right before the first match of this regex.
	pub before: Option<String>,

	/// Insert the body right after the first match of this regex.
	pub after: Option<String>,

	/// Trim surrounding whitespace from the body.
	pub trim: bool,
}

impl SectionConfig {
	/// Read the configuration from a section's attributes.
	pub fn from_attributes(attributes: &Attributes) -> Self {
		let non_empty = |name: &str| {
			attributes
				.get(name)
				.filter(|value| !value.is_empty())
				.map(str::to_string)
		};

		SectionConfig {
			find: non_empty("find"),
			replace: non_empty("replace"),
			before: non_empty("before"),
			after: non_empty("after"),
			trim: attributes.has("trim"),
		}
	}

	/// Resolve the find source and replacement template.
	///
	/// Precedence: `after`, then `before`, then explicit `find`/`replace`,
	/// then the structural default.
	pub fn resolve(&self, default_find: &str) -> (String, String) {
		if let Some(ref after) = self.after {
			return (format!("({})", after), "$1$S".to_string());
		}

		if let Some(ref before) = self.before {
			return (format!("({})", before), "$S$1".to_string());
		}

		let find = self.find.as_deref().unwrap_or(default_find).to_string();
		let replace = self.replace.as_deref().unwrap_or(DEFAULT_REPLACE).to_string();
		(find, replace)
	}
}

/// A template/script/style block of an override document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
	pub kind: SectionKind,
	pub config: SectionConfig,

	/// Raw inner text of the block.
	pub body: String,
}

impl Section {
	/// The body as inserted into the replacement.
	pub fn body_text(&self) -> &str {
		if self.config.trim {
			self.body.trim()
		} else {
			&self.body
		}
	}

	/// Compile this section into a modification of `target`.
	pub fn compile(&self, target: &Target, document: &Path) -> Result<Modification> {
		let (find, template) = self.config.resolve(self.kind.default_find());
		let find = if find.is_empty() {
			None
		} else {
			Some(Pattern::new(&find)?)
		};
		let groups = find.as_ref().map(CaptureGroups::of).unwrap_or_default();
		let replace = expand_template(&template, self.body_text(), groups);

		Ok(Modification::new(
			target.filename().to_string(),
			target.filter().clone(),
			find,
			replace,
			document.to_path_buf(),
		))
	}
}
