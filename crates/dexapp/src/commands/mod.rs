//! # Command Layer
//!
//! Each command is a plain function over the stores that returns a [`CmdResult`].
//! Commands carry the behavior the CLI exposes; the stores themselves stay small.
//!
//! Commands do not:
//! - write to stdout or stderr
//! - parse arguments
//! - pick exit codes
//!
//! ## Structured Returns
//!
//! [`CmdResult`] carries:
//! - `messages`: leveled status lines (info, success, warning, error)
//! - `favorites`: entries to list
//! - `preferences`: a resolved preference record and the overrides behind it
//! - `query`: a canonical query string and its decoded state
//! - `export`: an export document
//! - `usage`: slot sizes
//!
//! The UI layer decides how to render it.
//!
//! ## Command Modules
//!
//! - [`favorites`]: add, remove, toggle, list, clear
//! - [`preferences`]: show, set, reset, export, import, usage, view mode
//! - [`query`]: decode, set, reset

use serde::Serialize;

use crate::model::{FavoriteEntry, PreferencePatch, UiPreferences, ViewMode};
use crate::preferences::StorageUsage;
use crate::query::FilterSortState;

pub mod favorites;
pub mod preferences;
pub mod query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Preferences as a view sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferencesView {
    /// `None` for the global record.
    pub view: Option<String>,
    pub effective: UiPreferences,
    pub overrides: PreferencePatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryView {
    pub query_string: String,
    pub state: FilterSortState,
}

#[derive(Debug, Default, Serialize)]
pub struct CmdResult {
    pub messages: Vec<CmdMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorites: Vec<FavoriteEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<StorageUsage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    /// Report a change that only lives in memory because storage refused it.
    pub fn note_unsaved(&mut self, persisted: bool) {
        if !persisted {
            self.add_message(CmdMessage::error(
                "Storage refused the change; it is not saved and will be lost on exit",
            ));
        }
    }

    pub fn with_favorites(mut self, favorites: Vec<FavoriteEntry>) -> Self {
        self.favorites = favorites;
        self
    }

    pub fn with_preferences(mut self, preferences: PreferencesView) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_query(mut self, query: QueryView) -> Self {
        self.query = Some(query);
        self
    }
}
