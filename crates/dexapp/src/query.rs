//! # URL-Projected Query State
//!
//! The filter/sort/pagination state of a list view lives in the URL query string
//! and nowhere else. This module maps between the two:
//!
//! ```text
//!   ?search=chu&sort=name-asc&page=2   ──decode──►   FilterSortState
//!   QueryParams + FilterSortPatch      ──encode──►   QueryParams'
//! ```
//!
//! | field            | param        | default            |
//! |------------------|--------------|--------------------|
//! | search_query     | `search`     | empty              |
//! | sort_by          | `sort`       | `QueryDefaults`    |
//! | generation_filter| `generation` | `all`              |
//! | type_filter      | `type`       | `all`              |
//! | category_filter  | `category`   | `all`              |
//! | status_filter    | `status`     | `all`              |
//! | current_page     | `page`       | 1                  |
//! | items_per_page   | `limit`      | `QueryDefaults`    |
//!
//! ## Canonical Form
//!
//! `encode` deletes the param of every patched field whose new value equals the
//! default and sets it otherwise, so a URL only ever carries non-default values.
//! Params this module doesn't manage are carried through untouched.
//!
//! ## Page Reset
//!
//! A patch touching any field other than `current_page` also sends the view back
//! to page 1, inside the same `encode`. Changing only the page changes nothing else.
//!
//! ## Decoding
//!
//! Decoding never fails: an absent, empty or unparsable param yields the field's
//! default. `page` below 1 decodes as 1.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::form_urlencoded;

use crate::error::ValidationError;
use crate::model::{str_enum, ItemsPerPage, SortOrder};
use crate::transforms::Generation;

pub const SEARCH_PARAM: &str = "search";
pub const SORT_PARAM: &str = "sort";
pub const GENERATION_PARAM: &str = "generation";
pub const TYPE_PARAM: &str = "type";
pub const CATEGORY_PARAM: &str = "category";
pub const STATUS_PARAM: &str = "status";
pub const PAGE_PARAM: &str = "page";
pub const LIMIT_PARAM: &str = "limit";

/// Every param this module manages, in canonical order.
pub const MANAGED_PARAMS: [&str; 8] = [
    SEARCH_PARAM,
    SORT_PARAM,
    GENERATION_PARAM,
    TYPE_PARAM,
    CATEGORY_PARAM,
    STATUS_PARAM,
    PAGE_PARAM,
    LIMIT_PARAM,
];

str_enum! {
    /// Sort orders a list view can be put in through the URL.
    SortOption, "sort option" {
        NameAsc => "name-asc",
        NameDesc => "name-desc",
        PokedexAsc => "pokedex-asc",
        PokedexDesc => "pokedex-desc",
        DateAdded => "date-added",
        Popularity => "popularity",
        Type => "type",
        Category => "category",
    }
}

impl From<SortOrder> for SortOption {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::NameAsc => SortOption::NameAsc,
            SortOrder::NameDesc => SortOption::NameDesc,
            SortOrder::PokedexAsc => SortOption::PokedexAsc,
            SortOrder::PokedexDesc => SortOption::PokedexDesc,
            SortOrder::DateAdded => SortOption::DateAdded,
            SortOrder::Popularity => SortOption::Popularity,
        }
    }
}

str_enum! {
    CategoryFilter, "category" {
        All => "all",
        Primary => "primary",
        Hidden => "hidden",
    }
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::All
    }
}

str_enum! {
    StatusFilter, "status" {
        All => "all",
        Active => "active",
        Deprecated => "deprecated",
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::All
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GenerationFilter {
    #[default]
    All,
    Only(Generation),
}

impl fmt::Display for GenerationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFilter::All => f.write_str("all"),
            GenerationFilter::Only(generation) => write!(f, "{}", generation),
        }
    }
}

impl FromStr for GenerationFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(GenerationFilter::All);
        }
        s.parse().map(GenerationFilter::Only)
    }
}

impl From<GenerationFilter> for String {
    fn from(value: GenerationFilter) -> String {
        value.to_string()
    }
}

impl TryFrom<String> for GenerationFilter {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// `all`, or one type name. Type names are open-ended so any other string is a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TypeFilter {
    #[default]
    All,
    Named(String),
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => f.write_str("all"),
            TypeFilter::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for TypeFilter {
    fn from(value: &str) -> Self {
        match value {
            "" | "all" => TypeFilter::All,
            name => TypeFilter::Named(name.to_string()),
        }
    }
}

impl From<String> for TypeFilter {
    fn from(value: String) -> Self {
        TypeFilter::from(value.as_str())
    }
}

impl From<TypeFilter> for String {
    fn from(value: TypeFilter) -> String {
        value.to_string()
    }
}

impl FromStr for TypeFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TypeFilter::from(s))
    }
}

/// The decoded filter/sort/pagination state of one list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSortState {
    pub search_query: String,
    pub sort_by: SortOption,
    pub generation_filter: GenerationFilter,
    pub type_filter: TypeFilter,
    pub category_filter: CategoryFilter,
    pub status_filter: StatusFilter,
    pub current_page: u32,
    pub items_per_page: ItemsPerPage,
}

impl Default for FilterSortState {
    fn default() -> Self {
        QueryDefaults::default().state()
    }
}

/// The per-view defaults a URL is canonicalized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    pub sort_by: SortOption,
    pub items_per_page: ItemsPerPage,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            sort_by: SortOption::PokedexAsc,
            items_per_page: ItemsPerPage::TwentyFive,
        }
    }
}

impl QueryDefaults {
    /// The state an empty query string decodes to.
    pub fn state(&self) -> FilterSortState {
        FilterSortState {
            search_query: String::new(),
            sort_by: self.sort_by,
            generation_filter: GenerationFilter::All,
            type_filter: TypeFilter::All,
            category_filter: CategoryFilter::All,
            status_filter: StatusFilter::All,
            current_page: 1,
            items_per_page: self.items_per_page,
        }
    }
}

/// A partial update: only the `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSortPatch {
    pub search_query: Option<String>,
    pub sort_by: Option<SortOption>,
    pub generation_filter: Option<GenerationFilter>,
    pub type_filter: Option<TypeFilter>,
    pub category_filter: Option<CategoryFilter>,
    pub status_filter: Option<StatusFilter>,
    pub current_page: Option<u32>,
    pub items_per_page: Option<ItemsPerPage>,
}

impl FilterSortPatch {
    pub fn is_empty(&self) -> bool {
        *self == FilterSortPatch::default()
    }

    /// Whether the patch changes what is listed, as opposed to which page of it.
    pub fn changes_view(&self) -> bool {
        self.search_query.is_some()
            || self.sort_by.is_some()
            || self.generation_filter.is_some()
            || self.type_filter.is_some()
            || self.category_filter.is_some()
            || self.status_filter.is_some()
            || self.items_per_page.is_some()
    }

    /// Set one field from its URL param name and raw value, strictly.
    pub fn set_param(&mut self, name: &str, raw: &str) -> Result<(), ValidationError> {
        let at = |e: ValidationError| e.within(name);
        match name {
            SEARCH_PARAM => self.search_query = Some(raw.to_string()),
            SORT_PARAM => self.sort_by = Some(raw.parse().map_err(at)?),
            GENERATION_PARAM => self.generation_filter = Some(raw.parse().map_err(at)?),
            TYPE_PARAM => self.type_filter = Some(TypeFilter::from(raw)),
            CATEGORY_PARAM => self.category_filter = Some(raw.parse().map_err(at)?),
            STATUS_PARAM => self.status_filter = Some(raw.parse().map_err(at)?),
            PAGE_PARAM => {
                let page = raw
                    .parse::<u32>()
                    .ok()
                    .filter(|page| *page >= 1)
                    .ok_or_else(|| ValidationError::new(name, "expected a page number from 1"))?;
                self.current_page = Some(page);
            }
            LIMIT_PARAM => self.items_per_page = Some(raw.parse().map_err(at)?),
            other => {
                return Err(ValidationError::whole(format!(
                    "unknown query param `{}` (expected one of: {})",
                    other,
                    MANAGED_PARAMS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

impl From<FilterSortState> for FilterSortPatch {
    fn from(state: FilterSortState) -> Self {
        Self {
            search_query: Some(state.search_query),
            sort_by: Some(state.sort_by),
            generation_filter: Some(state.generation_filter),
            type_filter: Some(state.type_filter),
            category_filter: Some(state.category_filter),
            status_filter: Some(state.status_filter),
            current_page: Some(state.current_page),
            items_per_page: Some(state.items_per_page),
        }
    }
}

/// An ordered query string parameter list with `URLSearchParams` semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2`, with or without a leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// The first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace the first `name` in place and drop any others, or append.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(key, _)| key == name) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut index = 0;
                self.pairs.retain(|(key, _)| {
                    let keep = key != name || index == first;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((name.to_string(), value)),
        }
    }

    pub fn delete(&mut self, name: &str) {
        self.pairs.retain(|(key, _)| key != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Serialize as `application/x-www-form-urlencoded`, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

pub fn decode(params: &QueryParams, defaults: &QueryDefaults) -> FilterSortState {
    FilterSortState {
        search_query: params.get(SEARCH_PARAM).unwrap_or_default().to_string(),
        sort_by: read_param(params, SORT_PARAM, defaults.sort_by),
        generation_filter: read_param(params, GENERATION_PARAM, GenerationFilter::All),
        type_filter: params.get(TYPE_PARAM).map(TypeFilter::from).unwrap_or_default(),
        category_filter: read_param(params, CATEGORY_PARAM, CategoryFilter::All),
        status_filter: read_param(params, STATUS_PARAM, StatusFilter::All),
        current_page: read_param(params, PAGE_PARAM, 1u32).max(1),
        items_per_page: read_param(params, LIMIT_PARAM, defaults.items_per_page),
    }
}

pub fn encode(
    params: &QueryParams,
    patch: &FilterSortPatch,
    defaults: &QueryDefaults,
) -> QueryParams {
    let base = defaults.state();
    let page = if patch.changes_view() {
        Some(1)
    } else {
        patch.current_page.map(|page| page.max(1))
    };

    let mut next = params.clone();
    write_param(&mut next, SEARCH_PARAM, patch.search_query.as_ref(), &base.search_query);
    write_param(&mut next, SORT_PARAM, patch.sort_by.as_ref(), &base.sort_by);
    write_param(
        &mut next,
        GENERATION_PARAM,
        patch.generation_filter.as_ref(),
        &base.generation_filter,
    );
    write_param(&mut next, TYPE_PARAM, patch.type_filter.as_ref(), &base.type_filter);
    write_param(
        &mut next,
        CATEGORY_PARAM,
        patch.category_filter.as_ref(),
        &base.category_filter,
    );
    write_param(&mut next, STATUS_PARAM, patch.status_filter.as_ref(), &base.status_filter);
    write_param(&mut next, PAGE_PARAM, page.as_ref(), &base.current_page);
    write_param(
        &mut next,
        LIMIT_PARAM,
        patch.items_per_page.as_ref(),
        &base.items_per_page,
    );
    next
}

/// Every managed field back to its default: drops all managed params.
pub fn reset_all(params: &QueryParams, defaults: &QueryDefaults) -> QueryParams {
    encode(params, &FilterSortPatch::from(defaults.state()), defaults)
}

fn read_param<T: FromStr>(params: &QueryParams, name: &str, fallback: T) -> T {
    match params.get(name) {
        None | Some("") => fallback,
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                debug!(param = name, value = raw, "unrecognised query value, using default");
                fallback
            }
        },
    }
}

fn write_param<V>(params: &mut QueryParams, name: &str, value: Option<&V>, default: &V)
where
    V: fmt::Display + PartialEq,
{
    let Some(value) = value else {
        return;
    };
    let text = value.to_string();
    if value == default || text.is_empty() {
        params.delete(name);
    } else {
        params.set(name, text);
    }
}

/// The query string of one list view, with a mutator per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    params: QueryParams,
    defaults: QueryDefaults,
}

impl QueryState {
    pub fn new(params: QueryParams, defaults: QueryDefaults) -> Self {
        Self { params, defaults }
    }

    pub fn parse(query: &str, defaults: QueryDefaults) -> Self {
        Self::new(QueryParams::parse(query), defaults)
    }

    pub fn state(&self) -> FilterSortState {
        decode(&self.params, &self.defaults)
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    pub fn apply(&mut self, patch: &FilterSortPatch) {
        self.params = encode(&self.params, patch, &self.defaults);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.apply(&FilterSortPatch {
            search_query: Some(query.into()),
            ..Default::default()
        });
    }

    pub fn set_sort_by(&mut self, sort: SortOption) {
        self.apply(&FilterSortPatch {
            sort_by: Some(sort),
            ..Default::default()
        });
    }

    pub fn set_generation_filter(&mut self, generation: GenerationFilter) {
        self.apply(&FilterSortPatch {
            generation_filter: Some(generation),
            ..Default::default()
        });
    }

    pub fn set_type_filter(&mut self, type_filter: TypeFilter) {
        self.apply(&FilterSortPatch {
            type_filter: Some(type_filter),
            ..Default::default()
        });
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.apply(&FilterSortPatch {
            category_filter: Some(category),
            ..Default::default()
        });
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.apply(&FilterSortPatch {
            status_filter: Some(status),
            ..Default::default()
        });
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.apply(&FilterSortPatch {
            current_page: Some(page),
            ..Default::default()
        });
    }

    pub fn set_items_per_page(&mut self, items: ItemsPerPage) {
        self.apply(&FilterSortPatch {
            items_per_page: Some(items),
            ..Default::default()
        });
    }

    pub fn reset_filters(&mut self) {
        self.params = reset_all(&self.params, &self.defaults);
    }

    pub fn to_query_string(&self) -> String {
        self.params.to_query_string()
    }
}
