//! Rule compilation for compmod.
//!
//! This module handles:
//! - Section configuration and its precedence rules
//! - Replacement template expansion
//! - Compiling override documents into modifications

pub mod compiler;
pub mod modification;
pub mod replacement;
pub mod section;

pub use compiler::{compile_document, compile_documents};
pub use modification::Modification;
pub use replacement::{CaptureGroups, expand_template};
pub use section::{DEFAULT_REPLACE, Section, SectionConfig, SectionKind};
