//! The apply engine for compmod.
//!
//! This module handles:
//! - Holding the ordered set of compiled modifications
//! - Folding modifications over candidate file contents
//! - Tracking which files each document has affected

pub mod file_map;
pub mod set;

pub use file_map::ModificationFileMap;
pub use set::ModificationSet;
