//! Override documents for compmod.
//!
//! This module handles:
//! - Scanning the document markup for `file` and section elements
//! - Resolving the target filename and its filter
//! - Discovering documents on disk

pub mod markup;
pub mod scan;
pub mod target;

pub use scan::DocumentSources;
pub use target::{FileDirective, Target};

use crate::config::Extensions;
use crate::error::{CompmodError, Result};
use crate::rules::{Modification, Section, SectionConfig, SectionKind, compile_document};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Element names recognised at the top level of a document.
const DOCUMENT_ELEMENTS: &[&str] = &["file", "template", "script", "style"];

/// A parsed override document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideDocument {
	filepath: PathBuf,
	target: Target,
	sections: Vec<Section>,
}

impl OverrideDocument {
	/// Read and parse a document from disk.
	pub fn load(path: &Path, extensions: &Extensions) -> Result<Self> {
		let source =
			std::fs::read_to_string(path).map_err(|source| CompmodError::DocumentReadError {
				path: path.to_path_buf(),
				source,
			})?;

		Self::parse(path, &source, extensions)
	}

	/// Parse a document from a string (useful for testing).
	pub fn parse(
		filepath: impl Into<PathBuf>,
		source: &str,
		extensions: &Extensions,
	) -> Result<Self> {
		let filepath = filepath.into();
		let elements = markup::parse_elements(source, DOCUMENT_ELEMENTS);

		let directive = match elements.iter().find(|e| e.name == "file") {
			Some(file) if !file.closed => {
				return Err(CompmodError::MalformedDocument {
					path: filepath,
					reason: "unterminated <file> element".to_string(),
				});
			}
			Some(file) => {
				let filename = file.body.trim();
				(!filename.is_empty()).then(|| FileDirective {
					filename: filename.to_string(),
					is_regex: file.attributes.has("regex"),
				})
			}
			None => None,
		};

		let target = Target::resolve(directive, &filepath, extensions)?;

		let mut sections = Vec::new();
		for kind in SectionKind::ALL {
			for element in elements.iter().filter(|e| e.name == kind.tag_name()) {
				if !element.closed {
					warn!(
						path = %filepath.display(),
						section = %kind,
						"ignoring unterminated section"
					);
					continue;
				}
				sections.push(Section {
					kind,
					config: SectionConfig::from_attributes(&element.attributes),
					body: element.body.clone(),
				});
			}
		}

		Ok(OverrideDocument {
			filepath,
			target,
			sections,
		})
	}

	/// Origin of the document; doubles as its identity.
	pub fn filepath(&self) -> &Path {
		&self.filepath
	}

	pub fn target(&self) -> &Target {
		&self.target
	}

	/// Sections grouped by kind (templates, then scripts, then styles), each
	/// group in document order.
	pub fn sections(&self) -> &[Section] {
		&self.sections
	}

	/// Compile this document into modifications.
	pub fn compile(&self) -> Result<Vec<Modification>> {
		compile_document(self)
	}
}
