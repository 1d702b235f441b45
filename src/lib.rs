//! Compmod - override component blocks with find/replace modification documents.
//!
//! This library provides the core functionality for compmod, including:
//! - Configuration file parsing and cascade discovery
//! - Override document parsing and target resolution
//! - Rule compilation and the apply engine
//! - Change notification for watch sessions
//!
//! # Example
//!
//! ```no_run
//! use compmod::config::load_merged_config;
//! use compmod::document::DocumentSources;
//! use compmod::watch::ChangeNotifier;
//! use std::path::Path;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let config = load_merged_config(&cwd).unwrap();
//! let sources = DocumentSources::from_config(&config).unwrap();
//! let mut notifier = ChangeNotifier::new(sources).unwrap();
//!
//! let output = notifier.read(Path::new("src/components/Button.vue")).unwrap();
//! println!("{}", output);
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod rules;
pub mod watch;

pub use error::{CompmodError, Result};
