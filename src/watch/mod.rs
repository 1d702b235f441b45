//! Change notification for compmod.
//!
//! This module handles:
//! - Recomputing the modification set on document add/remove/edit
//! - Reporting which candidate files must be treated as changed
//! - Driving the notifier from filesystem watcher events

pub mod host;
pub mod notifier;

pub use host::{WatchSession, classify};
pub use notifier::{ChangeNotifier, DocumentEvent};
