//! # Domain Model
//!
//! The persisted value types: [`FavoriteEntry`], [`UiPreferences`] and its partial
//! form [`PreferencePatch`], plus the small closed vocabularies they are built from.
//!
//! ## Wire Names
//!
//! Every enum here has exactly one string spelling, shared by storage, the URL,
//! exports and the CLI. The [`str_enum!`] macro generates `as_str`, `Display`,
//! `FromStr` and the serde conversions from a single table so the spellings
//! cannot drift apart.
//!
//! ## Preferences as a Two-Level Store
//!
//! Preferences are addressed by [`PreferenceField`] and carried as a tagged
//! [`PreferenceValue`]. A [`PreferencePatch`] is a sparse record of values; the
//! effective preferences for a view are computed by [`UiPreferences::overlay`],
//! which walks [`PreferenceField::ALL`] and takes the patch value when present,
//! the global value otherwise. Override shadows global, field by field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Declares a closed string enum with one canonical spelling per variant.
macro_rules! str_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ValidationError::whole(format!(
                        "unknown {} `{}` (expected one of: {})",
                        $what,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use str_enum;

str_enum! {
    /// How a list of catalog entries is laid out.
    ViewMode, "view mode" {
        Grid => "grid",
        List => "list",
    }
}

str_enum! {
    /// Sort orders a user can save as a preference.
    SortOrder, "sort order" {
        NameAsc => "name-asc",
        NameDesc => "name-desc",
        PokedexAsc => "pokedex-asc",
        PokedexDesc => "pokedex-desc",
        DateAdded => "date-added",
        Popularity => "popularity",
    }
}

str_enum! {
    Theme, "theme" {
        Light => "light",
        Dark => "dark",
        System => "system",
    }
}

str_enum! {
    /// Names of the fields of [`UiPreferences`], spelled as they are persisted.
    PreferenceField, "preference" {
        ViewMode => "viewMode",
        SortOrder => "sortOrder",
        ItemsPerPage => "itemsPerPage",
        Theme => "theme",
        CompactMode => "compactMode",
        ShowTypeColors => "showTypeColors",
        AutoPlayAnimations => "autoPlayAnimations",
    }
}

/// Page sizes offered by list views. Persisted as a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum ItemsPerPage {
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl ItemsPerPage {
    pub const ALL: &'static [ItemsPerPage] = &[
        ItemsPerPage::Ten,
        ItemsPerPage::TwentyFive,
        ItemsPerPage::Fifty,
        ItemsPerPage::Hundred,
    ];

    pub fn get(&self) -> u32 {
        match self {
            ItemsPerPage::Ten => 10,
            ItemsPerPage::TwentyFive => 25,
            ItemsPerPage::Fifty => 50,
            ItemsPerPage::Hundred => 100,
        }
    }
}

impl Default for ItemsPerPage {
    fn default() -> Self {
        Self::TwentyFive
    }
}

impl From<ItemsPerPage> for u32 {
    fn from(value: ItemsPerPage) -> u32 {
        value.get()
    }
}

impl TryFrom<u32> for ItemsPerPage {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ItemsPerPage::ALL
            .iter()
            .copied()
            .find(|size| size.get() == value)
            .ok_or_else(|| {
                ValidationError::whole(format!(
                    "unsupported page size {} (expected 10, 25, 50 or 100)",
                    value
                ))
            })
    }
}

impl FromStr for ItemsPerPage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::whole(format!("`{}` is not a page size", s)))?;
        n.try_into()
    }
}

impl fmt::Display for ItemsPerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// A catalog entry the user wants to favorite. Only what the list views carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokemonRef {
    pub id: u32,
    pub name: String,
    pub url: String,
}

impl PokemonRef {
    pub fn new(id: u32, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One favorited entry. Never updated in place: removed and re-added instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: u32,
    pub name: String,
    pub url: String,
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    pub fn new(pokemon: &PokemonRef, added_at: DateTime<Utc>) -> Self {
        Self {
            id: pokemon.id,
            name: pokemon.name.clone(),
            url: pokemon.url.clone(),
            added_at,
        }
    }
}

/// A single preference, tagged with the field it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceValue {
    ViewMode(ViewMode),
    SortOrder(SortOrder),
    ItemsPerPage(ItemsPerPage),
    Theme(Theme),
    CompactMode(bool),
    ShowTypeColors(bool),
    AutoPlayAnimations(bool),
}

impl PreferenceValue {
    pub fn field(&self) -> PreferenceField {
        match self {
            PreferenceValue::ViewMode(_) => PreferenceField::ViewMode,
            PreferenceValue::SortOrder(_) => PreferenceField::SortOrder,
            PreferenceValue::ItemsPerPage(_) => PreferenceField::ItemsPerPage,
            PreferenceValue::Theme(_) => PreferenceField::Theme,
            PreferenceValue::CompactMode(_) => PreferenceField::CompactMode,
            PreferenceValue::ShowTypeColors(_) => PreferenceField::ShowTypeColors,
            PreferenceValue::AutoPlayAnimations(_) => PreferenceField::AutoPlayAnimations,
        }
    }

    /// Parse a user-supplied string as a value for `field`.
    pub fn parse(field: PreferenceField, raw: &str) -> Result<Self, ValidationError> {
        let value = match field {
            PreferenceField::ViewMode => PreferenceValue::ViewMode(raw.parse()?),
            PreferenceField::SortOrder => PreferenceValue::SortOrder(raw.parse()?),
            PreferenceField::ItemsPerPage => PreferenceValue::ItemsPerPage(raw.parse()?),
            PreferenceField::Theme => PreferenceValue::Theme(raw.parse()?),
            PreferenceField::CompactMode => PreferenceValue::CompactMode(parse_bool(raw)?),
            PreferenceField::ShowTypeColors => PreferenceValue::ShowTypeColors(parse_bool(raw)?),
            PreferenceField::AutoPlayAnimations => {
                PreferenceValue::AutoPlayAnimations(parse_bool(raw)?)
            }
        };
        Ok(value)
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::ViewMode(v) => write!(f, "{}", v),
            PreferenceValue::SortOrder(v) => write!(f, "{}", v),
            PreferenceValue::ItemsPerPage(v) => write!(f, "{}", v),
            PreferenceValue::Theme(v) => write!(f, "{}", v),
            PreferenceValue::CompactMode(v)
            | PreferenceValue::ShowTypeColors(v)
            | PreferenceValue::AutoPlayAnimations(v) => write!(f, "{}", v),
        }
    }
}

fn parse_bool(raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(ValidationError::whole(format!(
            "`{}` is not a boolean",
            other
        ))),
    }
}

/// The complete, global preference record.
///
/// Fields missing from a persisted record are completed from the baseline
/// (`#[serde(default)]`), so older or hand-edited payloads still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiPreferences {
    pub view_mode: ViewMode,
    pub sort_order: SortOrder,
    pub items_per_page: ItemsPerPage,
    pub theme: Theme,
    pub compact_mode: bool,
    pub show_type_colors: bool,
    pub auto_play_animations: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Grid,
            sort_order: SortOrder::PokedexAsc,
            items_per_page: ItemsPerPage::TwentyFive,
            theme: Theme::System,
            compact_mode: false,
            show_type_colors: true,
            auto_play_animations: true,
        }
    }
}

impl UiPreferences {
    pub fn get(&self, field: PreferenceField) -> PreferenceValue {
        match field {
            PreferenceField::ViewMode => PreferenceValue::ViewMode(self.view_mode),
            PreferenceField::SortOrder => PreferenceValue::SortOrder(self.sort_order),
            PreferenceField::ItemsPerPage => PreferenceValue::ItemsPerPage(self.items_per_page),
            PreferenceField::Theme => PreferenceValue::Theme(self.theme),
            PreferenceField::CompactMode => PreferenceValue::CompactMode(self.compact_mode),
            PreferenceField::ShowTypeColors => {
                PreferenceValue::ShowTypeColors(self.show_type_colors)
            }
            PreferenceField::AutoPlayAnimations => {
                PreferenceValue::AutoPlayAnimations(self.auto_play_animations)
            }
        }
    }

    pub fn set(&mut self, value: PreferenceValue) {
        match value {
            PreferenceValue::ViewMode(v) => self.view_mode = v,
            PreferenceValue::SortOrder(v) => self.sort_order = v,
            PreferenceValue::ItemsPerPage(v) => self.items_per_page = v,
            PreferenceValue::Theme(v) => self.theme = v,
            PreferenceValue::CompactMode(v) => self.compact_mode = v,
            PreferenceValue::ShowTypeColors(v) => self.show_type_colors = v,
            PreferenceValue::AutoPlayAnimations(v) => self.auto_play_animations = v,
        }
    }

    /// Write every value present in `patch` over this record.
    pub fn apply(&mut self, patch: &PreferencePatch) {
        for value in patch.values() {
            self.set(value);
        }
    }

    /// Effective preferences: `patch` shadows `self` field by field.
    pub fn overlay(&self, patch: &PreferencePatch) -> UiPreferences {
        let mut effective = UiPreferences::default();
        for field in PreferenceField::ALL {
            let value = patch.get(*field).unwrap_or_else(|| self.get(*field));
            effective.set(value);
        }
        effective
    }
}

/// A sparse preference record: only the fields a view overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_per_page: Option<ItemsPerPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_type_colors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_play_animations: Option<bool>,
}

impl PreferencePatch {
    pub fn get(&self, field: PreferenceField) -> Option<PreferenceValue> {
        match field {
            PreferenceField::ViewMode => self.view_mode.map(PreferenceValue::ViewMode),
            PreferenceField::SortOrder => self.sort_order.map(PreferenceValue::SortOrder),
            PreferenceField::ItemsPerPage => {
                self.items_per_page.map(PreferenceValue::ItemsPerPage)
            }
            PreferenceField::Theme => self.theme.map(PreferenceValue::Theme),
            PreferenceField::CompactMode => self.compact_mode.map(PreferenceValue::CompactMode),
            PreferenceField::ShowTypeColors => {
                self.show_type_colors.map(PreferenceValue::ShowTypeColors)
            }
            PreferenceField::AutoPlayAnimations => self
                .auto_play_animations
                .map(PreferenceValue::AutoPlayAnimations),
        }
    }

    pub fn set(&mut self, value: PreferenceValue) {
        match value {
            PreferenceValue::ViewMode(v) => self.view_mode = Some(v),
            PreferenceValue::SortOrder(v) => self.sort_order = Some(v),
            PreferenceValue::ItemsPerPage(v) => self.items_per_page = Some(v),
            PreferenceValue::Theme(v) => self.theme = Some(v),
            PreferenceValue::CompactMode(v) => self.compact_mode = Some(v),
            PreferenceValue::ShowTypeColors(v) => self.show_type_colors = Some(v),
            PreferenceValue::AutoPlayAnimations(v) => self.auto_play_animations = Some(v),
        }
    }

    pub fn with(mut self, value: PreferenceValue) -> Self {
        self.set(value);
        self
    }

    /// Clear `field`. Returns whether it was set.
    pub fn remove(&mut self, field: PreferenceField) -> bool {
        let was_set = self.get(field).is_some();
        match field {
            PreferenceField::ViewMode => self.view_mode = None,
            PreferenceField::SortOrder => self.sort_order = None,
            PreferenceField::ItemsPerPage => self.items_per_page = None,
            PreferenceField::Theme => self.theme = None,
            PreferenceField::CompactMode => self.compact_mode = None,
            PreferenceField::ShowTypeColors => self.show_type_colors = None,
            PreferenceField::AutoPlayAnimations => self.auto_play_animations = None,
        }
        was_set
    }

    /// Values present in this patch, in field order.
    pub fn values(&self) -> impl Iterator<Item = PreferenceValue> + '_ {
        PreferenceField::ALL
            .iter()
            .filter_map(move |field| self.get(*field))
    }

    pub fn len(&self) -> usize {
        self.values().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-view override records, keyed by an opaque view identifier.
pub type PageOverrides = BTreeMap<String, PreferencePatch>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_spellings_round_trip_through_from_str() {
        for order in SortOrder::ALL {
            assert_eq!(order.as_str().parse::<SortOrder>().unwrap(), *order);
        }
        assert_eq!("viewMode".parse::<PreferenceField>().unwrap(), PreferenceField::ViewMode);
    }

    #[test]
    fn test_unknown_spelling_lists_the_choices() {
        let err = "tiles".parse::<ViewMode>().unwrap_err();
        assert!(err.reason.contains("tiles"));
        assert!(err.reason.contains("grid, list"));
    }

    #[test]
    fn test_items_per_page_only_accepts_offered_sizes() {
        assert_eq!(ItemsPerPage::try_from(50).unwrap(), ItemsPerPage::Fifty);
        assert!(ItemsPerPage::try_from(30).is_err());
        assert!("abc".parse::<ItemsPerPage>().is_err());
        assert_eq!(serde_json::to_string(&ItemsPerPage::Hundred).unwrap(), "100");
    }

    #[test]
    fn test_preferences_serialize_camel_case() {
        let json = serde_json::to_value(UiPreferences::default()).unwrap();
        assert_eq!(json["viewMode"], "grid");
        assert_eq!(json["sortOrder"], "pokedex-asc");
        assert_eq!(json["itemsPerPage"], 25);
        assert_eq!(json["showTypeColors"], true);
    }

    #[test]
    fn test_partial_preferences_complete_from_baseline() {
        let prefs: UiPreferences = serde_json::from_str(r#"{"viewMode":"list"}"#).unwrap();
        assert_eq!(prefs.view_mode, ViewMode::List);
        assert_eq!(prefs.items_per_page, ItemsPerPage::TwentyFive);
    }

    #[test]
    fn test_invalid_preference_value_is_rejected() {
        let result: Result<UiPreferences, _> = serde_json::from_str(r#"{"itemsPerPage":7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_overlay_prefers_patch_values() {
        let global = UiPreferences::default();
        let patch = PreferencePatch::default()
            .with(PreferenceValue::ViewMode(ViewMode::List))
            .with(PreferenceValue::CompactMode(true));

        let effective = global.overlay(&patch);
        assert_eq!(effective.view_mode, ViewMode::List);
        assert!(effective.compact_mode);
        assert_eq!(effective.sort_order, global.sort_order);
    }

    #[test]
    fn test_patch_remove_reports_presence() {
        let mut patch = PreferencePatch::default().with(PreferenceValue::Theme(Theme::Dark));
        assert_eq!(patch.len(), 1);
        assert!(patch.remove(PreferenceField::Theme));
        assert!(!patch.remove(PreferenceField::Theme));
        assert!(patch.is_empty());
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = PreferencePatch::default().with(PreferenceValue::ViewMode(ViewMode::List));
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"viewMode":"list"}"#);
    }

    #[test]
    fn test_preference_value_parse() {
        assert_eq!(
            PreferenceValue::parse(PreferenceField::CompactMode, "yes").unwrap(),
            PreferenceValue::CompactMode(true)
        );
        assert_eq!(
            PreferenceValue::parse(PreferenceField::ItemsPerPage, "100").unwrap(),
            PreferenceValue::ItemsPerPage(ItemsPerPage::Hundred)
        );
        assert!(PreferenceValue::parse(PreferenceField::Theme, "sepia").is_err());
    }

    #[test]
    fn test_favorite_entry_uses_camel_case_timestamp() {
        let entry = FavoriteEntry::new(
            &PokemonRef::new(25, "pikachu", "https://pokeapi.co/api/v2/pokemon/25/"),
            "2024-03-01T10:00:00Z".parse().unwrap(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["addedAt"], "2024-03-01T10:00:00Z");
        assert_eq!(json["id"], 25);
    }
}
