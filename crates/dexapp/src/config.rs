//! # Configuration
//!
//! Dex configuration is managed by [`clapfig`], which handles layered loading
//! from a TOML file, environment variables, and compiled defaults.
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `DEX__KEY_PREFIX`, `DEX__DEFAULT_SORT`, etc.
//! 2. **Data directory**: `<data dir>/dex.toml`.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `key_prefix` | `pokemonApp_` | Prefix of every storage slot key |
//! | `default_sort` | `pokedex-asc` | Sort a list view starts in |
//! | `default_items_per_page` | `25` | Page size a list view starts with |
//! | `storage_quota` | `5242880` | Byte budget for all slots together |

use confique::Config;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::ItemsPerPage;
use crate::query::{QueryDefaults, SortOption};

pub const DEFAULT_KEY_PREFIX: &str = "pokemonApp_";
pub const DEFAULT_STORAGE_QUOTA: usize = 5 * 1024 * 1024;

/// Configuration for dex, stored in `dex.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DexConfig {
    /// Prefix of every storage slot key.
    #[config(default = "pokemonApp_")]
    pub key_prefix: String,

    /// Sort order list views start in (e.g. "pokedex-asc", "name-asc").
    #[config(default = "pokedex-asc")]
    pub default_sort: String,

    /// Page size list views start with: 10, 25, 50 or 100.
    #[config(default = 25)]
    pub default_items_per_page: u32,

    /// Byte budget shared by all slots (key and value bytes).
    #[config(default = 5242880)]
    pub storage_quota: usize,
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            default_sort: SortOption::PokedexAsc.to_string(),
            default_items_per_page: ItemsPerPage::TwentyFive.get(),
            storage_quota: DEFAULT_STORAGE_QUOTA,
        }
    }
}

impl DexConfig {
    /// The configured default sort, or `pokedex-asc` if it isn't one.
    pub fn default_sort(&self) -> SortOption {
        self.default_sort.parse().unwrap_or_else(|e| {
            warn!(value = %self.default_sort, error = %e, "invalid default_sort in config");
            SortOption::PokedexAsc
        })
    }

    /// The configured default page size, or 25 if it isn't an offered size.
    pub fn default_items_per_page(&self) -> ItemsPerPage {
        ItemsPerPage::try_from(self.default_items_per_page).unwrap_or_else(|e| {
            warn!(value = self.default_items_per_page, error = %e, "invalid default_items_per_page in config");
            ItemsPerPage::TwentyFive
        })
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            sort_by: self.default_sort(),
            items_per_page: self.default_items_per_page(),
        }
    }
}
