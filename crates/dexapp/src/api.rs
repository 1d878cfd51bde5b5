//! # API Facade
//!
//! A **thin facade** over the command layer and the single entry point for UIs.
//!
//! The facade:
//! - owns the stores for one backend context (one "tab")
//! - dispatches to `commands/*.rs`
//! - returns `Result<CmdResult>`
//!
//! Business logic lives in the commands and stores, not here.
//!
//! ## Generic Over StorageBackend
//!
//! - Production: `DexApi<FsBackend>`
//! - Testing: `DexApi<MemBackend>`
//!
//! ## Cross-Context Changes
//!
//! Two `DexApi`s built over contexts of the same origin see each other's writes
//! only after [`DexApi::sync`], which drains every cell's change feed.

use std::rc::Rc;

use crate::commands::{self, CmdResult};
use crate::config::DexConfig;
use crate::error::Result;
use crate::favorites::{FavoriteSort, Favorites};
use crate::model::{PokemonRef, PreferenceField, ViewMode};
use crate::preferences::Preferences;
use crate::query::QueryDefaults;
use crate::store::StorageBackend;

pub use crate::commands::favorites::FavoriteFilter;

pub struct DexApi<B: StorageBackend> {
    backend: Rc<B>,
    config: DexConfig,
    favorites: Favorites<B>,
    preferences: Preferences<B>,
}

impl<B: StorageBackend> DexApi<B> {
    pub fn new(backend: Rc<B>, config: DexConfig) -> Self {
        let favorites = Favorites::open(Rc::clone(&backend), &config.key_prefix);
        let preferences = Preferences::open(Rc::clone(&backend), &config.key_prefix);
        Self {
            backend,
            config,
            favorites,
            preferences,
        }
    }

    pub fn config(&self) -> &DexConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn favorites(&self) -> &Favorites<B> {
        &self.favorites
    }

    pub fn preferences(&self) -> &Preferences<B> {
        &self.preferences
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        self.config.query_defaults()
    }

    /// Apply changes other contexts made. Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        self.favorites.sync() + self.preferences.sync()
    }

    pub fn add_favorite(&mut self, id: u32, name: &str, url: Option<&str>) -> Result<CmdResult> {
        let pokemon = commands::favorites::pokemon_ref(id, name, url)?;
        commands::favorites::add(&mut self.favorites, &pokemon)
    }

    pub fn add_favorite_ref(&mut self, pokemon: &PokemonRef) -> Result<CmdResult> {
        commands::favorites::add(&mut self.favorites, pokemon)
    }

    pub fn remove_favorites(&mut self, ids: &[u32]) -> Result<CmdResult> {
        commands::favorites::remove(&mut self.favorites, ids)
    }

    pub fn toggle_favorite(&mut self, id: u32, name: &str, url: Option<&str>) -> Result<CmdResult> {
        let pokemon = commands::favorites::pokemon_ref(id, name, url)?;
        commands::favorites::toggle(&mut self.favorites, &pokemon)
    }

    pub fn list_favorites(&self, sort: FavoriteSort, filter: &FavoriteFilter) -> Result<CmdResult> {
        commands::favorites::list(&self.favorites, sort, filter)
    }

    pub fn clear_favorites(&mut self) -> Result<CmdResult> {
        commands::favorites::clear(&mut self.favorites)
    }

    pub fn show_preferences(&self, view: Option<&str>) -> Result<CmdResult> {
        commands::preferences::show(&self.preferences, view)
    }

    pub fn set_preference(
        &mut self,
        view: Option<&str>,
        field: PreferenceField,
        raw: &str,
        globally: bool,
    ) -> Result<CmdResult> {
        commands::preferences::set(&mut self.preferences, view, field, raw, globally)
    }

    pub fn reset_preference(&mut self, view: Option<&str>, field: PreferenceField) -> Result<CmdResult> {
        commands::preferences::reset(&mut self.preferences, view, field)
    }

    pub fn reset_view_preferences(&mut self, view: &str) -> Result<CmdResult> {
        commands::preferences::reset_view(&mut self.preferences, view)
    }

    pub fn reset_all_preferences(&mut self) -> Result<CmdResult> {
        commands::preferences::reset_all(&mut self.preferences)
    }

    pub fn export_preferences(&self) -> Result<CmdResult> {
        commands::preferences::export(&self.preferences)
    }

    pub fn import_preferences(&mut self, raw: &str) -> Result<CmdResult> {
        commands::preferences::import(&mut self.preferences, raw)
    }

    pub fn storage_usage(&self) -> Result<CmdResult> {
        commands::preferences::usage(&self.preferences)
    }

    pub fn view_mode(&self, list: &str, mode: Option<ViewMode>) -> Result<CmdResult> {
        commands::preferences::view_mode(Rc::clone(&self.backend), &self.config.key_prefix, list, mode)
    }

    pub fn decode_query(&self, query: &str) -> Result<CmdResult> {
        commands::query::decode(query, self.query_defaults())
    }

    pub fn set_query<S: AsRef<str>>(&self, query: &str, assignments: &[S]) -> Result<CmdResult> {
        commands::query::set(query, assignments, self.query_defaults())
    }

    pub fn reset_query(&self, query: &str) -> Result<CmdResult> {
        commands::query::reset(query, self.query_defaults())
    }
}
