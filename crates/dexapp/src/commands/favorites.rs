use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DexError, Result};
use crate::favorites::{FavoriteSort, Favorites};
use crate::model::PokemonRef;
use crate::query::GenerationFilter;
use crate::store::StorageBackend;
use crate::transforms::{extract_id_from_url, filter_by_generation, filter_by_search, format_name};

pub const POKEMON_API_URL: &str = "https://pokeapi.co/api/v2/pokemon/";

/// Narrowing applied to `list`.
#[derive(Debug, Clone, Default)]
pub struct FavoriteFilter {
    pub search: Option<String>,
    pub generation: GenerationFilter,
}

/// Build the entry to favorite. Without a URL the canonical API URL is used;
/// with one, its trailing id must agree with `id`.
pub fn pokemon_ref(id: u32, name: &str, url: Option<&str>) -> Result<PokemonRef> {
    if id == 0 {
        return Err(DexError::Api("dex numbers start at 1".to_string()));
    }
    let url = match url {
        Some(url) => {
            let found = extract_id_from_url(url);
            if found != id {
                return Err(DexError::Api(format!(
                    "url {} points at #{}, not #{}",
                    url, found, id
                )));
            }
            url.to_string()
        }
        None => format!("{}{}/", POKEMON_API_URL, id),
    };
    Ok(PokemonRef::new(id, name.to_lowercase(), url))
}

pub fn add<B: StorageBackend>(favorites: &mut Favorites<B>, pokemon: &PokemonRef) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if favorites.add(pokemon) {
        result.add_message(CmdMessage::success(format!(
            "Added {} (#{}) to favorites",
            format_name(&pokemon.name),
            pokemon.id
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "{} (#{}) is already a favorite",
            format_name(&pokemon.name),
            pokemon.id
        )));
    }
    result.note_unsaved(favorites.is_persisted());
    Ok(result)
}

pub fn remove<B: StorageBackend>(favorites: &mut Favorites<B>, ids: &[u32]) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut saved = true;
    for id in ids {
        let name = favorites
            .entries()
            .iter()
            .find(|fav| fav.id == *id)
            .map(|fav| format_name(&fav.name));
        match name {
            Some(name) => {
                favorites.remove(*id);
                saved &= favorites.is_persisted();
                result.add_message(CmdMessage::success(format!(
                    "Removed {} (#{}) from favorites",
                    name, id
                )));
            }
            None => {
                result.add_message(CmdMessage::warning(format!("#{} is not a favorite", id)));
            }
        }
    }
    result.note_unsaved(saved);
    Ok(result)
}

pub fn toggle<B: StorageBackend>(
    favorites: &mut Favorites<B>,
    pokemon: &PokemonRef,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let name = format_name(&pokemon.name);
    if favorites.toggle(pokemon) {
        result.add_message(CmdMessage::success(format!(
            "Added {} (#{}) to favorites",
            name, pokemon.id
        )));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Removed {} (#{}) from favorites",
            name, pokemon.id
        )));
    }
    result.note_unsaved(favorites.is_persisted());
    Ok(result)
}

pub fn list<B: StorageBackend>(
    favorites: &Favorites<B>,
    sort: FavoriteSort,
    filter: &FavoriteFilter,
) -> Result<CmdResult> {
    let mut listed = favorites.sorted(sort);
    if let Some(search) = &filter.search {
        listed = filter_by_search(listed, search);
    }
    listed = filter_by_generation(listed, filter.generation, |fav| fav.id);

    let mut result = CmdResult::default();
    if favorites.count() == 0 {
        result.add_message(CmdMessage::info("No favorites yet"));
    } else if listed.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "No favorites match ({} in total)",
            favorites.count()
        )));
    }
    Ok(result.with_favorites(listed))
}

pub fn clear<B: StorageBackend>(favorites: &mut Favorites<B>) -> Result<CmdResult> {
    let count = favorites.count();
    favorites.clear();

    let mut result = CmdResult::default();
    if count == 0 {
        result.add_message(CmdMessage::info("No favorites to clear"));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Cleared {} favorite{}",
            count,
            if count == 1 { "" } else { "s" }
        )));
    }
    result.note_unsaved(favorites.is_persisted());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::MemBackend;
    use crate::transforms::Generation;
    use std::rc::Rc;

    fn setup() -> Favorites<MemBackend> {
        Favorites::open(Rc::new(MemBackend::new()), "test_")
    }

    fn poke(id: u32, name: &str) -> PokemonRef {
        pokemon_ref(id, name, None).unwrap()
    }

    #[test]
    fn test_pokemon_ref_builds_api_url() {
        let pikachu = poke(25, "Pikachu");
        assert_eq!(pikachu.name, "pikachu");
        assert_eq!(pikachu.url, "https://pokeapi.co/api/v2/pokemon/25/");
    }

    #[test]
    fn test_pokemon_ref_checks_url_id() {
        let url = "https://pokeapi.co/api/v2/pokemon/26/";
        assert!(pokemon_ref(25, "pikachu", Some(url)).is_err());
        assert_eq!(pokemon_ref(26, "raichu", Some(url)).unwrap().url, url);
        assert!(pokemon_ref(0, "missingno", None).is_err());
    }

    #[test]
    fn test_add_twice_reports_existing() {
        let mut favs = setup();
        let first = add(&mut favs, &poke(25, "pikachu")).unwrap();
        assert_eq!(first.messages[0].level, MessageLevel::Success);
        assert!(first.messages[0].content.contains("Pikachu"));

        let second = add(&mut favs, &poke(25, "pikachu")).unwrap();
        assert_eq!(second.messages[0].level, MessageLevel::Info);
        assert_eq!(favs.count(), 1);
    }

    #[test]
    fn test_remove_reports_each_id() {
        let mut favs = setup();
        add(&mut favs, &poke(1, "bulbasaur")).unwrap();

        let result = remove(&mut favs, &[1, 4]).unwrap();
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert_eq!(result.messages[1].level, MessageLevel::Warning);
        assert_eq!(favs.count(), 0);
    }

    #[test]
    fn test_list_filters_by_search_and_generation() {
        let mut favs = setup();
        add(&mut favs, &poke(25, "pikachu")).unwrap();
        add(&mut favs, &poke(172, "pichu")).unwrap();
        add(&mut favs, &poke(1, "bulbasaur")).unwrap();

        let filter = FavoriteFilter {
            search: Some("CHU".to_string()),
            generation: GenerationFilter::Only(Generation::Gen2),
        };
        let result = list(&favs, FavoriteSort::Id, &filter).unwrap();
        let ids: Vec<u32> = result.favorites.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![172]);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_list_explains_empty_results() {
        let favs = setup();
        let result = list(&favs, FavoriteSort::Recent, &FavoriteFilter::default()).unwrap();
        assert_eq!(result.messages[0].content, "No favorites yet");
    }

    #[test]
    fn test_toggle_then_clear() {
        let mut favs = setup();
        toggle(&mut favs, &poke(7, "squirtle")).unwrap();
        toggle(&mut favs, &poke(4, "charmander")).unwrap();
        toggle(&mut favs, &poke(7, "squirtle")).unwrap();
        assert_eq!(favs.count(), 1);

        let result = clear(&mut favs).unwrap();
        assert_eq!(result.messages[0].content, "Cleared 1 favorite");
        assert_eq!(favs.count(), 0);
    }

    #[test]
    fn test_refused_write_is_reported() {
        let backend = Rc::new(MemBackend::new());
        let mut favs = Favorites::open(Rc::clone(&backend), "test_");
        backend.set_simulate_write_error(true);

        let result = add(&mut favs, &poke(25, "pikachu")).unwrap();
        assert!(favs.has(25));
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert_eq!(result.messages[1].level, MessageLevel::Error);

        backend.set_simulate_write_error(false);
        let result = add(&mut favs, &poke(1, "bulbasaur")).unwrap();
        assert_eq!(result.messages.len(), 1);
    }
}
