use crate::error::CompmodError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration from a `.compmod.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// If true, stop the directory cascade at this file.
	#[serde(default)]
	pub root: bool,

	/// Directories scanned recursively for override documents.
	#[serde(default)]
	pub dirs: Vec<PathBuf>,

	/// Individual override documents outside the scanned directories.
	#[serde(default)]
	pub files: Vec<PathBuf>,

	/// Target filenames (or explicit files) that must not be loaded.
	#[serde(default)]
	pub exclude: Vec<ExcludePattern>,

	/// Directories whose files are candidates for the watch loop.
	#[serde(default)]
	pub watch_roots: Vec<PathBuf>,

	/// Override/target extension pair. Inherited from less specific
	/// configs when absent.
	#[serde(default)]
	pub extensions: Option<Extensions>,
}

/// An exclude entry: either a literal substring or a regex.
///
/// ```toml
/// exclude = ["Legacy.vue", { regex = "^Admin" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExcludePattern {
	Literal(String),
	Regex { regex: String },
}

impl ExcludePattern {
	/// Regex source for this pattern; literals are escaped.
	pub fn to_regex_source(&self) -> String {
		match self {
			ExcludePattern::Literal(text) => regex::escape(text),
			ExcludePattern::Regex { regex } => regex.clone(),
		}
	}
}

impl std::fmt::Display for ExcludePattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ExcludePattern::Literal(text) => write!(f, "{}", text),
			ExcludePattern::Regex { regex } => write!(f, "/{}/", regex),
		}
	}
}

/// File extensions (without the leading dot) of override documents and the
/// sources they target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Extensions {
	#[serde(rename = "override", default = "default_override_extension")]
	pub override_ext: String,

	#[serde(default = "default_target_extension")]
	pub target: String,
}

fn default_override_extension() -> String {
	"vuem".to_string()
}

fn default_target_extension() -> String {
	"vue".to_string()
}

impl Default for Extensions {
	fn default() -> Self {
		Extensions {
			override_ext: default_override_extension(),
			target: default_target_extension(),
		}
	}
}

impl Extensions {
	/// Check that both extensions are bare, non-empty names.
	pub fn validate(&self, path: &Path) -> Result<(), CompmodError> {
		for extension in [&self.override_ext, &self.target] {
			let invalid = extension.is_empty()
				|| extension.contains(['.', '/', '\\'])
				|| extension.chars().any(char::is_whitespace);
			if invalid {
				return Err(CompmodError::InvalidExtension {
					path: path.to_path_buf(),
					extension: extension.clone(),
				});
			}
		}
		Ok(())
	}

	/// Whether `path` names an override document.
	pub fn is_override_document(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|e| e.to_str())
			.is_some_and(|e| e == self.override_ext)
	}

	/// Whether a candidate identity (path, possibly with a `?query` suffix)
	/// names an override document.
	pub fn is_override_identity(&self, identity: &str) -> bool {
		let path = identity.split('?').next().unwrap_or(identity);
		path.strip_suffix(self.override_ext.as_str())
			.is_some_and(|rest| rest.ends_with('.'))
	}
}

impl Config {
	/// Validate this config.
	pub fn validate(&self, path: &Path) -> Result<(), CompmodError> {
		if let Some(ref extensions) = self.extensions {
			extensions.validate(path)?;
		}
		Ok(())
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

impl LoadedConfig {
	/// Resolve a path from this config against the config's directory.
	pub fn resolve(&self, path: &Path) -> PathBuf {
		if path.is_absolute() {
			return path.to_path_buf();
		}
		match self.path.parent() {
			Some(dir) => dir.join(path),
			None => path.to_path_buf(),
		}
	}
}

/// Merged configuration from every config file in the cascade.
///
/// All paths are absolute or relative to the process working directory.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// Scanned directories, in cascade order.
	pub dirs: Vec<PathBuf>,

	/// Explicit documents, in cascade order.
	pub files: Vec<PathBuf>,

	/// Exclude patterns with the config file that declared them.
	pub exclude: Vec<ExcludeWithSource>,

	/// Candidate roots for the watch loop.
	pub watch_roots: Vec<PathBuf>,

	/// Effective extensions.
	pub extensions: Extensions,
}

/// An exclude pattern with its source config path.
#[derive(Debug, Clone)]
pub struct ExcludeWithSource {
	/// The pattern itself.
	pub pattern: ExcludePattern,

	/// The config file this pattern came from.
	pub source: PathBuf,
}
