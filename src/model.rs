use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Below this capacity an available event is shown as having limited tickets
const LIMITED_CAPACITY: u32 = 100;

pub type EventId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub created_at: Option<DateTime<Utc>>,
    pub title: String,
    pub date: Option<NaiveDate>,
    /// As stored remotely, usually `HH:MM` or `HH:MM:SS`
    pub time: Option<String>,
    pub duration: Option<String>,
    pub venue: Option<String>,
    pub price_range: Option<String>,
    pub capacity: Option<u32>,
    pub organizer: Option<String>,
    pub description: Option<String>,
    pub rating: f64,
    pub available: bool,
    pub category: Option<Category>,
    pub image: Option<String>,
    /// Absent on records created before ownership was tracked
    pub owner: Option<Uuid>,
}

impl Event {
    pub fn is_owned_by(&self, identity: Option<&Identity>) -> bool {
        match (identity, self.owner) {
            (Some(identity), Some(owner)) => identity.id == owner,
            _ => false,
        }
    }

    pub fn ticket_status(&self) -> TicketStatus {
        if !self.available {
            return TicketStatus::SoldOut;
        }

        match self.capacity {
            Some(capacity) if capacity > 0 && capacity < LIMITED_CAPACITY => TicketStatus::Limited,
            _ => TicketStatus::Available,
        }
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
    #[default]
    Rock,
    Jazz,
    Indie,
    Pop,
    Electronic,
    Country,
}

/// Category selection used when browsing. `All` is never persisted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Option<Category>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => category == Some(*wanted),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }

        Category::from_str(s.trim()).map(CategoryFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TicketStatus {
    #[strum(to_string = "Tickets Available")]
    Available,
    #[strum(to_string = "Limited Tickets")]
    Limited,
    #[strum(to_string = "Sold Out")]
    SoldOut,
}

/// The signed in principal. Only lives in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

/// Persisted fields sent on insert and update.
///
/// Optional text fields are always serialized so that an update clears them.
/// The ownership and bookkeeping fields are only sent on insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub duration: Option<String>,
    pub venue: Option<String>,
    pub price_range: Option<String>,
    pub capacity: Option<u32>,
    pub organizer: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

impl EventPayload {
    /// Marks the payload as a brand new listing owned by `owner`
    pub fn for_insert(mut self, owner: &Identity) -> Self {
        self.available = Some(true);
        self.rating = Some(0.0);
        self.user_id = Some(owner.id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn event(id: EventId) -> Event {
        Event {
            id,
            created_at: None,
            title: format!("Event {id}"),
            date: None,
            time: None,
            duration: None,
            venue: None,
            price_range: None,
            capacity: None,
            organizer: None,
            description: None,
            rating: 0.0,
            available: true,
            category: None,
            image: None,
            owner: None,
        }
    }

    #[test_log::test]
    fn category_tags_are_lowercase() {
        let tags: Vec<&'static str> = Category::iter().map(|c| c.into()).collect();

        assert_eq!(
            tags,
            vec!["rock", "jazz", "indie", "pop", "electronic", "country"]
        );
    }

    #[test_log::test]
    fn category_filter_parses_all_and_tags() {
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            "Jazz".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::Jazz))
        );
        assert!("polka".parse::<CategoryFilter>().is_err());
    }

    #[test_log::test]
    fn unavailable_event_is_sold_out_regardless_of_capacity() {
        let mut sold_out = event(1);
        sold_out.available = false;
        sold_out.capacity = Some(50);

        assert_eq!(sold_out.ticket_status(), TicketStatus::SoldOut);
        assert_eq!(sold_out.ticket_status().to_string(), "Sold Out");
    }

    #[test_log::test]
    fn small_venue_has_limited_tickets() {
        let mut small = event(1);
        small.capacity = Some(99);

        assert_eq!(small.ticket_status(), TicketStatus::Limited);

        small.capacity = Some(100);
        assert_eq!(small.ticket_status(), TicketStatus::Available);

        small.capacity = Some(0);
        assert_eq!(small.ticket_status(), TicketStatus::Available);
    }

    #[test_log::test]
    fn legacy_record_is_never_owned() {
        let identity = Identity::new(Uuid::new_v4(), "me@example.com");

        assert!(!event(1).is_owned_by(Some(&identity)));
        assert!(!event(1).is_owned_by(None));
    }

    #[test_log::test]
    fn insert_payload_carries_owner_and_defaults() {
        let owner = Identity::new(Uuid::new_v4(), "me@example.com");
        let payload = EventPayload {
            title: "Jazz Night".to_string(),
            date: None,
            time: None,
            duration: None,
            venue: None,
            price_range: None,
            capacity: None,
            organizer: None,
            description: None,
            category: Some(Category::Jazz),
            image: None,
            available: None,
            rating: None,
            user_id: None,
        }
        .for_insert(&owner);

        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["user_id"], owner.id.to_string());
        assert_eq!(json["available"], true);
        assert_eq!(json["category"], "jazz");
        assert!(json["venue"].is_null());
    }
}
