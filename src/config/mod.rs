//! Configuration loading and parsing for compmod.
//!
//! This module handles:
//! - TOML config file parsing
//! - Directory cascade discovery
//! - Config merging

pub mod cascade;
pub mod parser;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, discover_configs, load_config_file, load_merged_config, merge_configs,
};
pub use parser::{INIT_TEMPLATE, parse_config_file, parse_config_str};
pub use types::{
	Config, ExcludePattern, ExcludeWithSource, Extensions, LoadedConfig, MergedConfig,
};
