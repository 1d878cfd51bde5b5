use crate::commands::{CmdMessage, CmdResult, QueryView};
use crate::error::{Result, ValidationError};
use crate::query::{FilterSortPatch, QueryDefaults, QueryState};

fn view_of(query: &QueryState) -> QueryView {
    QueryView {
        query_string: query.to_query_string(),
        state: query.state(),
    }
}

pub fn decode(query: &str, defaults: QueryDefaults) -> Result<CmdResult> {
    let state = QueryState::parse(query, defaults);
    Ok(CmdResult::default().with_query(view_of(&state)))
}

/// Apply `param=value` assignments to `query` and return the canonical result.
pub fn set<S: AsRef<str>>(
    query: &str,
    assignments: &[S],
    defaults: QueryDefaults,
) -> Result<CmdResult> {
    let mut patch = FilterSortPatch::default();
    for assignment in assignments {
        let assignment = assignment.as_ref();
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            ValidationError::whole(format!("expected param=value, got `{}`", assignment))
        })?;
        patch.set_param(name.trim(), value)?;
    }

    let mut state = QueryState::parse(query, defaults);
    state.apply(&patch);

    let mut result = CmdResult::default();
    if patch.changes_view() && patch.current_page.is_some_and(|page| page != 1) {
        result.add_message(CmdMessage::warning(
            "page was reset to 1 because the listing changed",
        ));
    }
    Ok(result.with_query(view_of(&state)))
}

pub fn reset(query: &str, defaults: QueryDefaults) -> Result<CmdResult> {
    let mut state = QueryState::parse(query, defaults);
    state.reset_filters();
    Ok(CmdResult::default().with_query(view_of(&state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::query::SortOption;

    #[test]
    fn test_decode_reports_state_and_canonical_string() {
        let result = decode("?sort=name-asc&junk=1", QueryDefaults::default()).unwrap();
        let view = result.query.unwrap();
        assert_eq!(view.state.sort_by, SortOption::NameAsc);
        assert_eq!(view.query_string, "sort=name-asc&junk=1");
    }

    #[test]
    fn test_set_applies_assignments_in_one_update() {
        let result = set(
            "page=3",
            &["search=pika", "sort=pokedex-asc", "limit=50"],
            QueryDefaults::default(),
        )
        .unwrap();
        assert_eq!(result.query.unwrap().query_string, "search=pika&limit=50");
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_set_page_alongside_filter_warns() {
        let result = set("", &["type=fire", "page=4"], QueryDefaults::default()).unwrap();
        assert_eq!(result.messages[0].level, MessageLevel::Warning);
        assert_eq!(result.query.unwrap().state.current_page, 1);
    }

    #[test]
    fn test_set_rejects_malformed_assignments() {
        assert!(set("", &["sort"], QueryDefaults::default()).is_err());
        assert!(set("", &["limit=12"], QueryDefaults::default()).is_err());
    }

    #[test]
    fn test_reset_drops_managed_params() {
        let result = reset("search=a&page=2&tab=moves", QueryDefaults::default()).unwrap();
        assert_eq!(result.query.unwrap().query_string, "tab=moves");
    }
}
