use std::rc::Rc;

use crate::commands::{CmdMessage, CmdResult, PreferencesView};
use crate::error::Result;
use crate::model::{PreferenceField, PreferenceValue, UiPreferences, ViewMode};
use crate::preferences::{open_view_mode, Preferences};
use crate::store::StorageBackend;

fn view_of<B: StorageBackend>(prefs: &Preferences<B>, view: Option<&str>) -> PreferencesView {
    match view {
        Some(view) => PreferencesView {
            view: Some(view.to_string()),
            effective: prefs.effective(view),
            overrides: prefs.page_overrides(view),
        },
        None => PreferencesView {
            view: None,
            effective: *prefs.global(),
            overrides: Default::default(),
        },
    }
}

fn scope_label(view: Option<&str>) -> String {
    match view {
        Some(view) => format!("view `{}`", view),
        None => "global preferences".to_string(),
    }
}

pub fn show<B: StorageBackend>(prefs: &Preferences<B>, view: Option<&str>) -> Result<CmdResult> {
    Ok(CmdResult::default().with_preferences(view_of(prefs, view)))
}

/// Set `field` from a raw string.
///
/// Without a view the global record is written. With a view the value becomes an
/// override, unless `globally` is set, in which case it is written globally and the
/// view's override for that field is dropped.
pub fn set<B: StorageBackend>(
    prefs: &mut Preferences<B>,
    view: Option<&str>,
    field: PreferenceField,
    raw: &str,
    globally: bool,
) -> Result<CmdResult> {
    let value = PreferenceValue::parse(field, raw).map_err(|e| e.within(field.as_str()))?;
    match view {
        Some(view) => prefs.set_page_preference(view, value, globally),
        None => prefs.update_preference(value),
    }

    let mut result = CmdResult::default();
    let target = if globally { None } else { view };
    result.add_message(CmdMessage::success(format!(
        "Set {} = {} for {}",
        field,
        value,
        scope_label(target)
    )));
    result.note_unsaved(prefs.is_persisted());
    Ok(result.with_preferences(view_of(prefs, view)))
}

/// Drop one field back to what's underneath it.
///
/// On a view the override is removed so the global value shows through. Globally the
/// field returns to its baseline.
pub fn reset<B: StorageBackend>(
    prefs: &mut Preferences<B>,
    view: Option<&str>,
    field: PreferenceField,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    match view {
        Some(view) => {
            if prefs.reset_page_preference(view, field) {
                result.add_message(CmdMessage::success(format!(
                    "Removed {} override from view `{}`",
                    field, view
                )));
            } else {
                result.add_message(CmdMessage::info(format!(
                    "View `{}` has no {} override",
                    view, field
                )));
            }
        }
        None => {
            let baseline = UiPreferences::default().get(field);
            prefs.update_preference(baseline);
            result.add_message(CmdMessage::success(format!(
                "Reset {} to {}",
                field, baseline
            )));
        }
    }
    result.note_unsaved(prefs.is_persisted());
    Ok(result.with_preferences(view_of(prefs, view)))
}

pub fn reset_view<B: StorageBackend>(prefs: &mut Preferences<B>, view: &str) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if prefs.reset_all_for_view(view) {
        result.add_message(CmdMessage::success(format!(
            "Removed all overrides from view `{}`",
            view
        )));
    } else {
        result.add_message(CmdMessage::info(format!("View `{}` has no overrides", view)));
    }
    result.note_unsaved(prefs.is_persisted());
    Ok(result.with_preferences(view_of(prefs, Some(view))))
}

pub fn reset_all<B: StorageBackend>(prefs: &mut Preferences<B>) -> Result<CmdResult> {
    let views = prefs.pages().len();
    prefs.reset_all();

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Reset global preferences and {} view override{}",
        views,
        if views == 1 { "" } else { "s" }
    )));
    result.note_unsaved(prefs.is_persisted());
    Ok(result.with_preferences(view_of(prefs, None)))
}

pub fn export<B: StorageBackend>(prefs: &Preferences<B>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    result.export = Some(prefs.export_json()?);
    Ok(result)
}

pub fn import<B: StorageBackend>(prefs: &mut Preferences<B>, raw: &str) -> Result<CmdResult> {
    prefs.import(raw)?;

    let mut result = CmdResult::default();
    let views = prefs.pages().len();
    result.add_message(CmdMessage::success(format!(
        "Imported global preferences and {} view override{}",
        views,
        if views == 1 { "" } else { "s" }
    )));
    result.note_unsaved(prefs.is_persisted());
    Ok(result.with_preferences(view_of(prefs, None)))
}

pub fn usage<B: StorageBackend>(prefs: &Preferences<B>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    result.usage = Some(prefs.storage_usage());
    Ok(result)
}

/// Read, or with `mode` write, the standalone view-mode slot of `list`.
pub fn view_mode<B: StorageBackend>(
    backend: Rc<B>,
    key_prefix: &str,
    list: &str,
    mode: Option<ViewMode>,
) -> Result<CmdResult> {
    let mut cell = open_view_mode(backend, key_prefix, list);
    let mut result = CmdResult::default();
    if let Some(mode) = mode {
        cell.set(mode);
        result.add_message(CmdMessage::success(format!(
            "List `{}` now shows as {}",
            list, mode
        )));
        result.note_unsaved(cell.is_persisted());
    }
    result.view_mode = Some(*cell.get());
    Ok(result)
}
