use crate::config::parser::parse_config_file;
use crate::config::types::{ExcludeWithSource, LoadedConfig, MergedConfig};
use crate::error::Result;
use std::path::Path;

/// Name of the config file looked up in every directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".compmod.toml";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.compmod.toml`
/// 2. If found and `root = true`, stop
/// 3. Otherwise, continue up the directory tree
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			let config = parse_config_file(&config_path)?;
			let is_root = config.root;

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		// Move to parent directory
		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	Ok(configs)
}

/// Merge multiple configs into a single effective config.
///
/// Lists are concatenated in cascade order with relative paths resolved
/// against the declaring file. Extensions come from the most specific config
/// that sets them.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();
	let mut extensions = None;

	for loaded in configs {
		merged
			.dirs
			.extend(loaded.config.dirs.iter().map(|p| loaded.resolve(p)));
		merged
			.files
			.extend(loaded.config.files.iter().map(|p| loaded.resolve(p)));
		merged
			.watch_roots
			.extend(loaded.config.watch_roots.iter().map(|p| loaded.resolve(p)));

		for pattern in &loaded.config.exclude {
			merged.exclude.push(ExcludeWithSource {
				pattern: pattern.clone(),
				source: loaded.path.clone(),
			});
		}

		if extensions.is_none() {
			extensions = loaded.config.extensions.clone();
		}
	}

	merged.extensions = extensions.unwrap_or_default();
	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Load a single explicit config file, bypassing discovery.
pub fn load_config_file(path: &Path) -> Result<MergedConfig> {
	let config = parse_config_file(path)?;
	Ok(merge_configs(&[LoadedConfig {
		config,
		path: path.to_path_buf(),
	}]))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::{Config, ExcludePattern, Extensions};
	use std::fs;
	use std::path::PathBuf;

	#[test]
	fn test_discover_stops_at_root() {
		let temp = tempfile::tempdir().unwrap();
		let outer = temp.path();
		let inner = outer.join("app");
		let deepest = inner.join("src");
		fs::create_dir_all(&deepest).unwrap();

		fs::write(outer.join(CONFIG_FILE_NAME), "dirs = [\"outer\"]\n").unwrap();
		fs::write(
			inner.join(CONFIG_FILE_NAME),
			"root = true\ndirs = [\"overrides\"]\n",
		)
		.unwrap();

		let configs = discover_configs(&deepest).unwrap();
		assert_eq!(configs.len(), 1);
		assert_eq!(configs[0].path, inner.join(CONFIG_FILE_NAME));
	}

	#[test]
	fn test_discover_collects_cascade() {
		let temp = tempfile::tempdir().unwrap();
		let outer = temp.path();
		let inner = outer.join("app");
		fs::create_dir_all(&inner).unwrap();

		fs::write(
			outer.join(CONFIG_FILE_NAME),
			"root = true\ndirs = [\"shared\"]\n",
		)
		.unwrap();
		fs::write(inner.join(CONFIG_FILE_NAME), "dirs = [\"local\"]\n").unwrap();

		let merged = load_merged_config(&inner).unwrap();
		assert_eq!(merged.dirs, vec![inner.join("local"), outer.join("shared")]);
	}

	#[test]
	fn test_merge_resolves_paths_and_extensions() {
		let configs = vec![
			LoadedConfig {
				config: Config {
					files: vec![PathBuf::from("a/One.vuem"), PathBuf::from("/abs/Two.vuem")],
					exclude: vec![ExcludePattern::Literal("Skip.vue".to_string())],
					..Default::default()
				},
				path: PathBuf::from("/project/app/.compmod.toml"),
			},
			LoadedConfig {
				config: Config {
					watch_roots: vec![PathBuf::from("src")],
					extensions: Some(Extensions {
						override_ext: "cmod".to_string(),
						target: "cmp".to_string(),
					}),
					..Default::default()
				},
				path: PathBuf::from("/project/.compmod.toml"),
			},
		];

		let merged = merge_configs(&configs);
		assert_eq!(
			merged.files,
			vec![
				PathBuf::from("/project/app/a/One.vuem"),
				PathBuf::from("/abs/Two.vuem")
			]
		);
		assert_eq!(merged.watch_roots, vec![PathBuf::from("/project/src")]);
		assert_eq!(merged.exclude.len(), 1);
		assert_eq!(
			merged.exclude[0].source,
			PathBuf::from("/project/app/.compmod.toml")
		);
		assert_eq!(merged.extensions.override_ext, "cmod");
	}

	#[test]
	fn test_merge_defaults_extensions() {
		let merged = merge_configs(&[]);
		assert_eq!(merged.extensions, Extensions::default());
	}
}
