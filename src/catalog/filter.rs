use crate::model::{CategoryFilter, Event, Identity};

/// Keeps the events matching the text query, the category and, when
/// `owner_only` is set, owned by `identity`. Input order is preserved.
pub fn filter(
    events: &[Event],
    query: &str,
    category: CategoryFilter,
    owner_only: bool,
    identity: Option<&Identity>,
) -> Vec<Event> {
    let query = query.to_lowercase();

    events
        .iter()
        .filter(|event| matches(event, &query, category, owner_only, identity))
        .cloned()
        .collect()
}

/// `lowercase_query` must already be lowercased
fn matches(
    event: &Event,
    lowercase_query: &str,
    category: CategoryFilter,
    owner_only: bool,
    identity: Option<&Identity>,
) -> bool {
    matches_text(event, lowercase_query)
        && category.matches(event.category)
        && (!owner_only || event.is_owned_by(identity))
}

fn matches_text(event: &Event, lowercase_query: &str) -> bool {
    if lowercase_query.is_empty() {
        return true;
    }

    event.title.to_lowercase().contains(lowercase_query)
        || event
            .venue
            .as_deref()
            .is_some_and(|venue| venue.to_lowercase().contains(lowercase_query))
}
