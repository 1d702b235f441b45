use crate::config::types::Config;
use crate::error::{CompmodError, Result};
use std::path::Path;

/// Template written by `compmod --init`.
pub const INIT_TEMPLATE: &str = r#"# compmod configuration
#
# Override documents (*.vuem) describe find/replace rules for the
# template, script and style blocks of the component they target.

# Stop looking for .compmod.toml files in parent directories.
root = true

# Directories scanned recursively for override documents.
dirs = ["overrides"]

# Individual override documents.
files = []

# Target filenames to skip, as literals or { regex = "..." }.
exclude = []

# Candidate files known to `compmod watch`.
watch-roots = ["src"]

[extensions]
override = "vuem"
target = "vue"
"#;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	let content = std::fs::read_to_string(path).map_err(|source| CompmodError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	let config: Config =
		toml::from_str(content).map_err(|source| CompmodError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	config.validate(path)?;

	Ok(config)
}
