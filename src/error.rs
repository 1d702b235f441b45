use std::path::PathBuf;

/// Library-level structured errors for compmod.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum CompmodError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid extension in {path}: {extension:?}")]
	InvalidExtension { path: PathBuf, extension: String },

	#[error("Invalid regex pattern: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to read override document: {path}")]
	DocumentReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Malformed override document {path}: {reason}")]
	MalformedDocument { path: PathBuf, reason: String },

	#[error("Override document path has no file name: {path}")]
	MissingFileName { path: PathBuf },

	#[error("Failed to scan directory: {path}")]
	ScanError {
		path: PathBuf,
		#[source]
		source: walkdir::Error,
	},

	#[error("Failed to read file: {path}")]
	FileReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("File watcher failed")]
	WatchError(#[from] notify::Error),
}

/// Result type alias using CompmodError.
pub type Result<T> = std::result::Result<T, CompmodError>;
