//! # Favorites
//!
//! A user-curated, deduplicated collection of [`FavoriteEntry`] backed by a single
//! [`PersistedCell`]. Entries are only ever appended (`add`) or dropped
//! (`remove`, `clear`); an entry is never edited in place.
//!
//! The stored order is insertion order. [`Favorites::sorted`] derives other
//! orderings without touching it.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::rc::Rc;

use crate::cell::PersistedCell;
use crate::codec::{JsonCodec, Validate};
use crate::error::ValidationError;
use crate::model::{FavoriteEntry, PokemonRef};
use crate::store::StorageBackend;

pub const FAVORITES_KEY: &str = "favorites";

/// At most one entry per id.
impl Validate for Vec<FavoriteEntry> {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for (index, entry) in self.iter().enumerate() {
            if !seen.insert(entry.id) {
                return Err(ValidationError::new(
                    format!("[{}].id", index),
                    format!("duplicate favorite id {}", entry.id),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoriteSort {
    /// Most recently added first.
    #[default]
    Recent,
    Name,
    Id,
}

impl std::str::FromStr for FavoriteSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(FavoriteSort::Recent),
            "name" => Ok(FavoriteSort::Name),
            "id" => Ok(FavoriteSort::Id),
            other => Err(ValidationError::whole(format!(
                "unknown favorites order `{}` (expected recent, name or id)",
                other
            ))),
        }
    }
}

pub struct Favorites<B: StorageBackend> {
    cell: PersistedCell<Vec<FavoriteEntry>, B>,
}

impl<B: StorageBackend> Favorites<B> {
    /// Open the collection stored under `<prefix>favorites`.
    pub fn open(backend: Rc<B>, key_prefix: &str) -> Self {
        let cell = PersistedCell::open(
            backend,
            format!("{}{}", key_prefix, FAVORITES_KEY),
            Vec::new(),
            JsonCodec::new(),
        );
        Self { cell }
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        self.cell.get()
    }

    pub fn count(&self) -> usize {
        self.entries().len()
    }

    pub fn has(&self, id: u32) -> bool {
        self.entries().iter().any(|fav| fav.id == id)
    }

    /// Add `pokemon` stamped with the current time. Returns false if it was
    /// already a favorite.
    pub fn add(&mut self, pokemon: &PokemonRef) -> bool {
        self.add_at(pokemon, Utc::now())
    }

    /// Add with an explicit timestamp.
    pub fn add_at(&mut self, pokemon: &PokemonRef, added_at: DateTime<Utc>) -> bool {
        if self.has(pokemon.id) {
            return false;
        }
        self.cell.update(|prev| {
            let mut next = prev.clone();
            next.push(FavoriteEntry::new(pokemon, added_at));
            next
        });
        true
    }

    /// Returns false if `id` was not a favorite.
    pub fn remove(&mut self, id: u32) -> bool {
        if !self.has(id) {
            return false;
        }
        self.cell
            .update(|prev| prev.iter().filter(|fav| fav.id != id).cloned().collect());
        true
    }

    /// Remove if present, add otherwise. Returns whether it is now a favorite.
    pub fn toggle(&mut self, pokemon: &PokemonRef) -> bool {
        if self.has(pokemon.id) {
            self.remove(pokemon.id);
            false
        } else {
            self.add(pokemon)
        }
    }

    /// A sorted copy of the entries; the stored order is unchanged.
    pub fn sorted(&self, by: FavoriteSort) -> Vec<FavoriteEntry> {
        let mut sorted = self.entries().to_vec();
        match by {
            FavoriteSort::Recent => sorted.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
            FavoriteSort::Name => sorted.sort_by(|a, b| a.name.cmp(&b.name)),
            FavoriteSort::Id => sorted.sort_by_key(|fav| fav.id),
        }
        sorted
    }

    pub fn clear(&mut self) {
        self.cell.reset();
    }

    /// Pick up changes made in other contexts. See [`PersistedCell::sync`].
    pub fn sync(&mut self) -> usize {
        self.cell.sync()
    }

    /// Whether the last change reached storage.
    pub fn is_persisted(&self) -> bool {
        self.cell.is_persisted()
    }

    pub fn cell(&self) -> &PersistedCell<Vec<FavoriteEntry>, B> {
        &self.cell
    }

    pub fn cell_mut(&mut self) -> &mut PersistedCell<Vec<FavoriteEntry>, B> {
        &mut self.cell
    }
}
