//! # Layered Preferences
//!
//! Two cells make up the preference store:
//!
//! ```text
//! <prefix>globalPreferences   UiPreferences                 (one complete record)
//! <prefix>pagePreferences     { viewKey: PreferencePatch }  (sparse overrides)
//! ```
//!
//! ## Resolution
//!
//! `effective(view)` is computed on every read and never stored:
//!
//! 1. Start from the global record.
//! 2. For each field the view's override record sets, take the override.
//!
//! See [`UiPreferences::overlay`].
//!
//! ## Writes
//!
//! - **Per view** (`apply_globally = false`): the value goes into the view's
//!   override record, creating it if needed.
//! - **Globally** (`apply_globally = true`): the value goes into the global record
//!   *and* the view's override for that field is dropped, so the global write is
//!   what the view shows.
//!
//! An override record that loses its last field is removed from the map. The map
//! never holds empty records written by this module.
//!
//! ## Export / Import
//!
//! Exports are `{ version, global, pages, exportedAt }` JSON documents. Import is
//! version-gated and all-or-nothing: both halves are fully validated before either
//! cell is touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::warn;

use crate::cell::PersistedCell;
use crate::codec::{DisplayCodec, JsonCodec, Validate};
use crate::error::{DexError, Result, ValidationError};
use crate::model::{
    PageOverrides, PreferenceField, PreferencePatch, PreferenceValue, UiPreferences, ViewMode,
};
use crate::store::StorageBackend;

pub const GLOBAL_PREFERENCES_KEY: &str = "globalPreferences";
pub const PAGE_PREFERENCES_KEY: &str = "pagePreferences";
pub const VIEW_MODE_KEY: &str = "viewMode_";
pub const EXPORT_VERSION: &str = "1.0";

impl Validate for UiPreferences {}

impl Validate for PageOverrides {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesExport {
    pub version: String,
    pub global: UiPreferences,
    pub pages: PageOverrides,
    pub exported_at: DateTime<Utc>,
}

/// Bytes used by each preference slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub global: usize,
    pub pages: usize,
    pub total: usize,
}

pub struct Preferences<B: StorageBackend> {
    global: PersistedCell<UiPreferences, B>,
    pages: PersistedCell<PageOverrides, B>,
}

impl<B: StorageBackend> Preferences<B> {
    pub fn open(backend: Rc<B>, key_prefix: &str) -> Self {
        let global = PersistedCell::open(
            Rc::clone(&backend),
            format!("{}{}", key_prefix, GLOBAL_PREFERENCES_KEY),
            UiPreferences::default(),
            JsonCodec::new(),
        );
        let pages = PersistedCell::open(
            backend,
            format!("{}{}", key_prefix, PAGE_PREFERENCES_KEY),
            PageOverrides::new(),
            JsonCodec::new(),
        );
        Self { global, pages }
    }

    pub fn global(&self) -> &UiPreferences {
        self.global.get()
    }

    pub fn pages(&self) -> &PageOverrides {
        self.pages.get()
    }

    /// The override record for `view`, empty if it has none.
    pub fn page_overrides(&self, view: &str) -> PreferencePatch {
        self.pages().get(view).copied().unwrap_or_default()
    }

    pub fn effective(&self, view: &str) -> UiPreferences {
        self.global().overlay(&self.page_overrides(view))
    }

    pub fn update_preference(&mut self, value: PreferenceValue) {
        self.global.update(|prev| {
            let mut next = *prev;
            next.set(value);
            next
        });
    }

    pub fn update_preferences(&mut self, patch: &PreferencePatch) {
        self.global.update(|prev| {
            let mut next = *prev;
            next.apply(patch);
            next
        });
    }

    pub fn reset_global(&mut self) {
        self.global.reset();
    }

    pub fn set_page_preference(&mut self, view: &str, value: PreferenceValue, apply_globally: bool) {
        if apply_globally {
            self.update_preference(value);
            self.edit_existing_page(view, |patch| {
                patch.remove(value.field());
            });
        } else {
            self.pages.update(|prev| {
                let mut next = prev.clone();
                next.entry(view.to_string()).or_default().set(value);
                next
            });
        }
    }

    /// Drop one field from the view's overrides. Returns whether it was set.
    pub fn reset_page_preference(&mut self, view: &str, field: PreferenceField) -> bool {
        let mut removed = false;
        self.edit_existing_page(view, |patch| removed = patch.remove(field));
        removed
    }

    /// Drop the view's whole override record. Returns whether it had one.
    pub fn reset_all_for_view(&mut self, view: &str) -> bool {
        if !self.pages().contains_key(view) {
            return false;
        }
        self.pages.update(|prev| {
            let mut next = prev.clone();
            next.remove(view);
            next
        });
        true
    }

    /// Reset the global record and every override.
    pub fn reset_all(&mut self) {
        self.global.reset();
        self.pages.reset();
    }

    pub fn export(&self) -> PreferencesExport {
        PreferencesExport {
            version: EXPORT_VERSION.to_string(),
            global: *self.global(),
            pages: self.pages().clone(),
            exported_at: Utc::now(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Replace both records from an export document.
    ///
    /// Nothing is modified unless the whole document is acceptable.
    pub fn import(&mut self, raw: &str) -> Result<()> {
        let (global, pages) = match parse_import(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "rejected preferences import");
                return Err(e);
            }
        };
        self.global.set(global);
        self.pages.set(pages);
        Ok(())
    }

    pub fn storage_usage(&self) -> StorageUsage {
        let global = self.global.persisted_len();
        let pages = self.pages.persisted_len();
        StorageUsage {
            global,
            pages,
            total: global + pages,
        }
    }

    /// Pick up changes made in other contexts to either record.
    pub fn sync(&mut self) -> usize {
        self.global.sync() + self.pages.sync()
    }

    /// Whether the last change to either record reached storage.
    pub fn is_persisted(&self) -> bool {
        self.global.is_persisted() && self.pages.is_persisted()
    }

    pub fn global_cell_mut(&mut self) -> &mut PersistedCell<UiPreferences, B> {
        &mut self.global
    }

    pub fn pages_cell_mut(&mut self) -> &mut PersistedCell<PageOverrides, B> {
        &mut self.pages
    }

    /// Edit the view's record if it exists, pruning it if the edit empties it.
    fn edit_existing_page(&mut self, view: &str, edit: impl FnOnce(&mut PreferencePatch)) {
        if !self.pages().contains_key(view) {
            return;
        }
        self.pages.update(|prev| {
            let mut next = prev.clone();
            if let Some(patch) = next.get_mut(view) {
                edit(patch);
                if patch.is_empty() {
                    next.remove(view);
                }
            }
            next
        });
    }
}

fn parse_import(raw: &str) -> Result<(UiPreferences, PageOverrides)> {
    let doc: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| DexError::Import(format!("not a JSON document: {}", e)))?;
    let Some(doc) = doc.as_object() else {
        return Err(DexError::Import("expected a JSON object".to_string()));
    };

    match doc.get("version").and_then(|v| v.as_str()) {
        Some(EXPORT_VERSION) => {}
        Some(other) => {
            return Err(DexError::Import(format!(
                "unsupported export version {} (expected {})",
                other, EXPORT_VERSION
            )))
        }
        None => return Err(DexError::Import("missing export version".to_string())),
    }

    let global: UiPreferences = object_field(doc, "global")?;
    global.validate().map_err(|e| e.within("global"))?;

    let mut pages: PageOverrides = object_field(doc, "pages")?;
    pages.validate().map_err(|e| e.within("pages"))?;
    pages.retain(|_, patch| !patch.is_empty());

    Ok((global, pages))
}

fn object_field<T: serde::de::DeserializeOwned>(
    doc: &serde_json::Map<String, serde_json::Value>,
    name: &str,
) -> Result<T> {
    let value = doc
        .get(name)
        .ok_or_else(|| ValidationError::new(name, "missing"))?;
    if !value.is_object() {
        return Err(ValidationError::new(name, "expected an object").into());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| ValidationError::new(name, e.to_string()).into())
}

/// The standalone per-list view-mode slot, `<prefix>viewMode_<list>`, holding a
/// bare `grid` or `list`.
pub fn open_view_mode<B: StorageBackend>(
    backend: Rc<B>,
    key_prefix: &str,
    list: &str,
) -> PersistedCell<ViewMode, B, DisplayCodec<ViewMode>> {
    PersistedCell::open(
        backend,
        format!("{}{}{}", key_prefix, VIEW_MODE_KEY, list),
        ViewMode::Grid,
        DisplayCodec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemsPerPage, SortOrder, Theme};
    use crate::store::MemBackend;

    fn open(backend: &Rc<MemBackend>) -> Preferences<MemBackend> {
        Preferences::open(Rc::clone(backend), "test_")
    }

    const LIST: PreferenceValue = PreferenceValue::ViewMode(ViewMode::List);

    #[test]
    fn test_page_override_shadows_global_then_prunes() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        assert_eq!(prefs.global().view_mode, ViewMode::Grid);

        prefs.set_page_preference("home", LIST, false);
        assert_eq!(prefs.effective("home").view_mode, ViewMode::List);
        assert_eq!(prefs.effective("types").view_mode, ViewMode::Grid);

        assert!(prefs.reset_page_preference("home", PreferenceField::ViewMode));
        assert_eq!(prefs.effective("home").view_mode, ViewMode::Grid);
        assert!(!prefs.pages().contains_key("home"));
    }

    #[test]
    fn test_global_write_clears_stale_override() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        prefs.set_page_preference("home", LIST, false);
        prefs.set_page_preference("home", PreferenceValue::CompactMode(true), false);

        prefs.set_page_preference("home", PreferenceValue::ViewMode(ViewMode::Grid), true);

        assert_eq!(prefs.global().view_mode, ViewMode::Grid);
        assert_eq!(prefs.effective("home").view_mode, ViewMode::Grid);
        let remaining = prefs.page_overrides("home");
        assert_eq!(remaining.view_mode, None);
        assert_eq!(remaining.compact_mode, Some(true));
    }

    #[test]
    fn test_global_write_removes_record_it_empties() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        prefs.set_page_preference("home", LIST, false);

        prefs.set_page_preference("home", LIST, true);
        assert_eq!(prefs.global().view_mode, ViewMode::List);
        assert!(prefs.pages().is_empty());
    }

    #[test]
    fn test_global_write_without_record_leaves_pages_alone() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        prefs.set_page_preference("home", PreferenceValue::Theme(Theme::Dark), true);

        assert_eq!(prefs.global().theme, Theme::Dark);
        assert!(prefs.pages().is_empty());
        assert_eq!(backend.read_slot("test_pagePreferences").unwrap(), None);
    }

    #[test]
    fn test_reset_all_for_view() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        prefs.set_page_preference("home", LIST, false);
        prefs.set_page_preference("types", LIST, false);

        assert!(prefs.reset_all_for_view("home"));
        assert!(!prefs.reset_all_for_view("home"));
        assert_eq!(prefs.pages().len(), 1);
    }

    #[test]
    fn test_reset_page_preference_on_unknown_view() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        assert!(!prefs.reset_page_preference("nowhere", PreferenceField::Theme));
        assert!(prefs.pages().is_empty());
    }

    #[test]
    fn test_update_preferences_applies_patch_globally() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        let patch = PreferencePatch::default()
            .with(PreferenceValue::SortOrder(SortOrder::NameDesc))
            .with(PreferenceValue::ItemsPerPage(ItemsPerPage::Hundred));

        prefs.update_preferences(&patch);
        assert_eq!(prefs.global().sort_order, SortOrder::NameDesc);
        assert_eq!(prefs.global().items_per_page, ItemsPerPage::Hundred);

        prefs.reset_global();
        assert_eq!(*prefs.global(), UiPreferences::default());
    }

    #[test]
    fn test_export_then_import_into_fresh_origin() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        prefs.update_preference(PreferenceValue::Theme(Theme::Dark));
        prefs.set_page_preference("abilities", LIST, false);
        let exported = prefs.export_json().unwrap();

        let other = Rc::new(MemBackend::new());
        let mut restored = open(&other);
        restored.import(&exported).unwrap();

        assert_eq!(restored.global().theme, Theme::Dark);
        assert_eq!(restored.effective("abilities").view_mode, ViewMode::List);
        assert_eq!(open(&other).global().theme, Theme::Dark);
    }

    #[test]
    fn test_import_rejects_wrong_version() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        let doc = r#"{"version":"2.0","global":{},"pages":{}}"#;

        let err = prefs.import(doc).unwrap_err();
        assert!(matches!(err, DexError::Import(_)));
    }

    #[test]
    fn test_import_with_bad_pages_changes_nothing() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        prefs.set_page_preference("home", LIST, false);
        let before_global = *prefs.global();
        let before_pages = prefs.pages().clone();

        let doc = r#"{"version":"1.0","global":{"theme":"dark"},"pages":[1,2]}"#;
        assert!(prefs.import(doc).is_err());

        let doc = r#"{"version":"1.0","global":{"theme":"dark"},"pages":{"home":{"itemsPerPage":3}}}"#;
        let err = prefs.import(doc).unwrap_err();
        assert!(matches!(err, DexError::Validation(ref v) if v.path == "pages"));

        assert_eq!(*prefs.global(), before_global);
        assert_eq!(*prefs.pages(), before_pages);
        assert_eq!(open(&backend).global().theme, before_global.theme);
    }

    #[test]
    fn test_import_with_bad_global_changes_nothing() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        let doc = r#"{"version":"1.0","global":{"viewMode":"mosaic"},"pages":{}}"#;
        assert!(prefs.import(doc).is_err());
        assert_eq!(*prefs.global(), UiPreferences::default());
    }

    #[test]
    fn test_import_drops_empty_records() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        let doc = r#"{"version":"1.0","global":{},"pages":{"home":{},"types":{"theme":"light"}}}"#;
        prefs.import(doc).unwrap();
        assert_eq!(prefs.pages().keys().collect::<Vec<_>>(), vec!["types"]);
    }

    #[test]
    fn test_storage_usage_sums_both_slots() {
        let backend = Rc::new(MemBackend::new());
        let mut prefs = open(&backend);
        assert_eq!(prefs.storage_usage(), StorageUsage::default());

        prefs.update_preference(PreferenceValue::CompactMode(true));
        prefs.set_page_preference("home", LIST, false);

        let usage = prefs.storage_usage();
        assert_eq!(usage.pages, r#"{"home":{"viewMode":"list"}}"#.len());
        assert!(usage.global > 0);
        assert_eq!(usage.total, usage.global + usage.pages);
    }

    #[test]
    fn test_view_mode_slot_holds_bare_token() {
        let backend = Rc::new(MemBackend::new());
        let mut cell = open_view_mode(Rc::clone(&backend), "test_", "types");
        assert_eq!(*cell.get(), ViewMode::Grid);

        cell.set(ViewMode::List);
        assert_eq!(
            backend.read_slot("test_viewMode_types").unwrap(),
            Some("list".to_string())
        );

        backend.seed_slot("test_viewMode_types", "carousel");
        let reopened = open_view_mode(Rc::clone(&backend), "test_", "types");
        assert_eq!(*reopened.get(), ViewMode::Grid);
    }
}
