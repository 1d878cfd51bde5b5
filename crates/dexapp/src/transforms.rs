//! Pure list transforms used by the list views: search, generation filter, sort.
//!
//! All of them take the list by value and hand back a list; none touch storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::model::{str_enum, FavoriteEntry, PokemonRef};
use crate::query::{GenerationFilter, SortOption};

/// Anything with a display name the transforms can search and sort on.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for PokemonRef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for FavoriteEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

str_enum! {
    /// A contiguous block of national dex numbers.
    Generation, "generation" {
        Gen1 => "gen1",
        Gen2 => "gen2",
        Gen3 => "gen3",
        Gen4 => "gen4",
        Gen5 => "gen5",
        Gen6 => "gen6",
        Gen7 => "gen7",
        Gen8 => "gen8",
        Gen9 => "gen9",
    }
}

/// Last dex number of generations 1 through 8. Generation 9 is open-ended.
const LAST_IDS: [u32; 8] = [151, 251, 386, 493, 649, 721, 809, 905];

impl Generation {
    pub fn number(&self) -> u8 {
        Generation::ALL
            .iter()
            .position(|g| g == self)
            .map_or(0, |index| index as u8 + 1)
    }

    /// The generation `id` belongs to. Ids at or below 151 (0 included) are gen 1.
    pub fn of(id: u32) -> Generation {
        let index = LAST_IDS
            .iter()
            .position(|last| id <= *last)
            .unwrap_or(LAST_IDS.len());
        Generation::ALL[index]
    }

    pub fn id_range(&self) -> RangeInclusive<u32> {
        let index = usize::from(self.number() - 1);
        let first = if index == 0 { 0 } else { LAST_IDS[index - 1] + 1 };
        let last = LAST_IDS.get(index).copied().unwrap_or(u32::MAX);
        first..=last
    }

    pub fn contains(&self, id: u32) -> bool {
        self.id_range().contains(&id)
    }
}

/// Case-insensitive substring match on the name. A blank query keeps everything.
pub fn filter_by_search<T: Named>(items: Vec<T>, query: &str) -> Vec<T> {
    if query.trim().is_empty() {
        return items;
    }
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.name().to_lowercase().contains(&needle))
        .collect()
}

pub fn filter_by_generation<T>(
    items: Vec<T>,
    filter: GenerationFilter,
    id_of: impl Fn(&T) -> u32,
) -> Vec<T> {
    match filter {
        GenerationFilter::All => items,
        GenerationFilter::Only(generation) => items
            .into_iter()
            .filter(|item| generation.contains(id_of(item)))
            .collect(),
    }
}

/// Stable sort by `by`.
///
/// Items carry no timestamps, popularity, type or category data, so those
/// orders use stand-ins: `date-added` is dex order, `popularity` reverse dex
/// order, `type` and `category` sort by name.
pub fn sort_items<T: Named>(
    mut items: Vec<T>,
    by: SortOption,
    id_of: impl Fn(&T) -> u32,
) -> Vec<T> {
    match by {
        SortOption::NameAsc | SortOption::Type | SortOption::Category => {
            items.sort_by(|a, b| a.name().cmp(b.name()))
        }
        SortOption::NameDesc => items.sort_by(|a, b| b.name().cmp(a.name())),
        SortOption::PokedexAsc | SortOption::DateAdded => items.sort_by_key(|item| id_of(item)),
        SortOption::PokedexDesc | SortOption::Popularity => {
            items.sort_by(|a, b| id_of(b).cmp(&id_of(a)))
        }
    }
    items
}

/// The numeric id in a resource URL ending in `/<digits>/`, or 0.
///
/// `https://pokeapi.co/api/v2/pokemon/25/` → 25
pub fn extract_id_from_url(url: &str) -> u32 {
    let Some(rest) = url.strip_suffix('/') else {
        return 0;
    };
    let Some((_, segment)) = rest.rsplit_once('/') else {
        return 0;
    };
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    segment.parse().unwrap_or(0)
}

/// Upper-case the first letter: `"pikachu"` → `"Pikachu"`.
pub fn format_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    impl Named for Item {
        fn name(&self) -> &str {
            self.name
        }
    }

    fn item(id: u32, name: &'static str) -> Item {
        Item { id, name }
    }

    fn ids(items: &[Item]) -> Vec<u32> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let items = vec![item(25, "pikachu"), item(26, "raichu"), item(1, "bulbasaur")];
        assert_eq!(ids(&filter_by_search(items.clone(), "CHU")), vec![25, 26]);
        assert_eq!(filter_by_search(items.clone(), "   "), items);
        assert_eq!(filter_by_search(items.clone(), ""), items);
        assert!(filter_by_search(items, "mew").is_empty());
    }

    #[test]
    fn test_generation_boundaries() {
        let gen1 = GenerationFilter::Only(Generation::Gen1);
        let gen9 = GenerationFilter::Only(Generation::Gen9);

        let kept = filter_by_generation(vec![item(151, "mew"), item(152, "chikorita")], gen1, |i| i.id);
        assert_eq!(ids(&kept), vec![151]);

        let kept = filter_by_generation(vec![item(905, "enamorus"), item(906, "sprigatito")], gen9, |i| i.id);
        assert_eq!(ids(&kept), vec![906]);
    }

    #[test]
    fn test_generation_all_passes_through() {
        let items = vec![item(1, "a"), item(1000, "b")];
        assert_eq!(filter_by_generation(items.clone(), GenerationFilter::All, |i| i.id), items);
    }

    #[test]
    fn test_generation_of_every_edge() {
        let edges = [
            (0, 1),
            (151, 1),
            (152, 2),
            (251, 2),
            (252, 3),
            (386, 3),
            (387, 4),
            (493, 4),
            (494, 5),
            (649, 5),
            (650, 6),
            (721, 6),
            (722, 7),
            (809, 7),
            (810, 8),
            (905, 8),
            (906, 9),
            (1025, 9),
        ];
        for (id, number) in edges {
            assert_eq!(Generation::of(id).number(), number, "id {}", id);
        }
        assert_eq!(Generation::Gen2.id_range(), 152..=251);
        assert!(Generation::Gen9.contains(u32::MAX));
    }

    #[test]
    fn test_sort_by_name_and_dex_number() {
        let items = vec![item(4, "charmander"), item(1, "bulbasaur"), item(7, "squirtle")];

        let sorted = sort_items(items.clone(), SortOption::NameDesc, |i| i.id);
        assert_eq!(ids(&sorted), vec![7, 4, 1]);

        let sorted = sort_items(items.clone(), SortOption::PokedexAsc, |i| i.id);
        assert_eq!(ids(&sorted), vec![1, 4, 7]);

        let sorted = sort_items(items, SortOption::PokedexDesc, |i| i.id);
        assert_eq!(ids(&sorted), vec![7, 4, 1]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let items = vec![item(3, "eevee"), item(1, "abra"), item(2, "eevee")];
        let sorted = sort_items(items, SortOption::NameAsc, |i| i.id);
        assert_eq!(ids(&sorted), vec![1, 3, 2]);
    }

    #[test]
    fn test_stand_in_orders() {
        let items = vec![item(9, "c"), item(2, "a"), item(5, "b")];
        let sorted = |by| ids(&sort_items(items.clone(), by, |i| i.id));
        assert_eq!(sorted(SortOption::DateAdded), vec![2, 5, 9]);
        assert_eq!(sorted(SortOption::Popularity), vec![9, 5, 2]);
        assert_eq!(sorted(SortOption::Type), vec![2, 5, 9]);
        assert_eq!(sorted(SortOption::Category), vec![2, 5, 9]);
    }

    #[test]
    fn test_stand_in_orders_are_stable() {
        let items = vec![item(7, "eevee"), item(4, "abra"), item(3, "eevee")];
        assert_eq!(ids(&sort_items(items.clone(), SortOption::Category, |i| i.id)), vec![4, 7, 3]);

        let items = vec![item(7, "b"), item(3, "x"), item(7, "a")];
        let by_date = sort_items(items.clone(), SortOption::DateAdded, |i| i.id);
        assert_eq!(by_date, vec![item(3, "x"), item(7, "b"), item(7, "a")]);
        let by_popularity = sort_items(items, SortOption::Popularity, |i| i.id);
        assert_eq!(by_popularity, vec![item(7, "b"), item(7, "a"), item(3, "x")]);
    }

    #[test]
    fn test_extract_id_from_url() {
        assert_eq!(extract_id_from_url("https://pokeapi.co/api/v2/pokemon/25/"), 25);
        assert_eq!(extract_id_from_url("https://pokeapi.co/api/v2/ability/150/"), 150);
        assert_eq!(extract_id_from_url("https://pokeapi.co/api/v2/pokemon/25"), 0);
        assert_eq!(extract_id_from_url("https://pokeapi.co/api/v2/pokemon/pikachu/"), 0);
        assert_eq!(extract_id_from_url("//"), 0);
        assert_eq!(extract_id_from_url(""), 0);
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name("pikachu"), "Pikachu");
        assert_eq!(format_name("mr-mime"), "Mr-mime");
        assert_eq!(format_name(""), "");
    }
}
