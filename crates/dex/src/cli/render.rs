//! Text and JSON output for a [`CmdResult`].
//!
//! Text rendering is split into pure `render_*` functions returning strings, so
//! layout is tested without a terminal. Styling goes through `console`, which
//! drops escape codes when stdout is not a terminal.

use chrono::{DateTime, Utc};
use console::Style;
use dexapp::commands::{CmdMessage, CmdResult, MessageLevel, PreferencesView, QueryView};
use dexapp::error::Result;
use dexapp::model::{FavoriteEntry, PreferenceField};
use dexapp::preferences::StorageUsage;
use dexapp::query;
use dexapp::transforms::format_name;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::setup::OutputMode;

const NAME_WIDTH: usize = 20;
const LABEL_WIDTH: usize = 20;

pub fn print_result(result: &CmdResult, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputMode::Text => print!("{}", render_text(result, Utc::now())),
    }
    Ok(())
}

pub fn render_text(result: &CmdResult, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    if !result.favorites.is_empty() {
        out.push_str(&render_favorites(&result.favorites, now));
    }
    if let Some(view) = &result.preferences {
        out.push_str(&render_preferences(view));
    }
    if let Some(mode) = result.view_mode {
        out.push_str(&format!("{}\n", mode));
    }
    if let Some(view) = &result.query {
        out.push_str(&render_query(view));
    }
    if let Some(doc) = &result.export {
        out.push_str(doc);
        out.push('\n');
    }
    if let Some(usage) = &result.usage {
        out.push_str(&render_usage(usage));
    }
    for message in &result.messages {
        out.push_str(&render_message(message));
        out.push('\n');
    }
    out
}

fn render_message(message: &CmdMessage) -> String {
    let style = match message.level {
        MessageLevel::Info => Style::new().dim(),
        MessageLevel::Success => Style::new().green(),
        MessageLevel::Warning => Style::new().yellow(),
        MessageLevel::Error => Style::new().red(),
    };
    style.apply_to(&message.content).to_string()
}

fn render_favorites(entries: &[FavoriteEntry], now: DateTime<Utc>) -> String {
    let formatter = timeago::Formatter::new();
    let dim = Style::new().dim();
    entries
        .iter()
        .map(|fav| {
            let ago = formatter.convert((now - fav.added_at).to_std().unwrap_or_default());
            format!(
                "{:>5}  {}  {}\n",
                format!("#{}", fav.id),
                pad_to_width(&format_name(&fav.name), NAME_WIDTH),
                dim.apply_to(ago)
            )
        })
        .collect()
}

fn render_preferences(view: &PreferencesView) -> String {
    let header = match &view.view {
        Some(name) => format!("Preferences for `{}`", name),
        None => "Global preferences".to_string(),
    };
    let marker = Style::new().cyan();

    let mut out = format!("{}\n", Style::new().bold().apply_to(header));
    for field in PreferenceField::ALL {
        let overridden = view.overrides.get(*field).is_some();
        out.push_str(&format!(
            "  {}{}{}\n",
            pad_to_width(field.as_str(), LABEL_WIDTH),
            view.effective.get(*field),
            if overridden {
                marker.apply_to("  (view)").to_string()
            } else {
                String::new()
            }
        ));
    }
    out
}

fn render_query(view: &QueryView) -> String {
    let state = &view.state;
    let link = if view.query_string.is_empty() {
        "(no params)".to_string()
    } else {
        format!("?{}", view.query_string)
    };

    let rows = [
        (query::SEARCH_PARAM, state.search_query.clone()),
        (query::SORT_PARAM, state.sort_by.to_string()),
        (query::GENERATION_PARAM, state.generation_filter.to_string()),
        (query::TYPE_PARAM, state.type_filter.to_string()),
        (query::CATEGORY_PARAM, state.category_filter.to_string()),
        (query::STATUS_PARAM, state.status_filter.to_string()),
        (query::PAGE_PARAM, state.current_page.to_string()),
        (query::LIMIT_PARAM, state.items_per_page.to_string()),
    ];

    let mut out = format!("{}\n", Style::new().bold().apply_to(link));
    for (name, value) in rows {
        out.push_str(&format!("  {}{}\n", pad_to_width(name, 12), value));
    }
    out
}

fn render_usage(usage: &StorageUsage) -> String {
    [
        ("global", usage.global),
        ("pages", usage.pages),
        ("total", usage.total),
    ]
    .iter()
    .map(|(label, bytes)| format!("{:<8}{:>8} B\n", label, bytes))
    .collect()
}

/// Pad (or cut, ending in `…`) to exactly `width` terminal columns.
fn pad_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return format!("{}{}", text, " ".repeat(width - text.width()));
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}
