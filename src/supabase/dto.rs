use crate::model::{Category, Event, EventId, Identity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

// Note: most columns are nullable and legacy rows hold blanks, hence the lenient deserializers
#[derive(Debug, Deserialize)]
pub struct EventRow {
    pub id: EventId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub price_range: Option<String>,
    #[serde(default, deserialize_with = "deserialize_capacity")]
    pub capacity: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub organizer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub image: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl EventRow {
    #[tracing::instrument(skip(self), fields(self.id = %self.id))]
    pub fn to_model(self) -> Event {
        let category = self.category.as_deref().and_then(|tag| {
            Category::from_str(tag)
                .inspect_err(|_| warn!("Unknown category '{}' (leaving unset)", tag))
                .ok()
        });

        Event {
            id: self.id,
            created_at: self.created_at,
            title: self.title.unwrap_or_else(|| {
                warn!("Record has no title");
                String::new()
            }),
            date: self.date,
            time: self.time,
            duration: self.duration,
            venue: self.venue,
            price_range: self.price_range,
            capacity: self.capacity,
            organizer: self.organizer,
            description: self.description,
            rating: self.rating.unwrap_or(0.0),
            available: self.available.unwrap_or(false),
            category,
            image: self.image,
            owner: self.user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub email: Option<String>,
}

impl UserResponse {
    pub fn to_identity(&self) -> Identity {
        Identity::new(self.id, self.email.clone().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub user: UserResponse,
}

/// Sign-up answers with a session when email confirmation is off, with the bare user otherwise
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(SessionResponse),
    User(UserResponse),
}

/// The three backend services do not agree on an error shape
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl ErrorResponse {
    pub fn message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(match self.error {
                Some(Value::String(error)) => Some(error),
                _ => None,
            })
            .filter(|message| !message.is_empty())
    }
}

fn deserialize_opt_str<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn deserialize_opt_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) if !s.is_empty() => Ok(NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .inspect_err(|err| warn!("Failed to parse date '{s}'. Err: {err}"))
            .ok()),
        _ => Ok(None),
    }
}

fn deserialize_capacity<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn should_deserialize_full_row() {
        let row = serde_json::from_str::<EventRow>(
            r##"{
                "id": 7,
                "created_at": "2025-01-10T18:22:01.123456+00:00",
                "title": "Jazz Night",
                "date": "2025-03-14",
                "time": "20:30:00",
                "duration": "3 hours",
                "venue": "Blue Note",
                "price_range": "$20 - $45",
                "capacity": 80,
                "organizer": "Blue Note Presents",
                "description": "Late set",
                "rating": 4.5,
                "available": true,
                "category": "jazz",
                "image": "https://cdn.example.com/storage/v1/object/public/event-images/1.png",
                "user_id": "6f1c9a1e-57a4-4b53-9a0f-3f0e9a1d2c11"
            }"##,
        );

        assert!(row.is_ok(), "{:?}", row);

        let event = row.unwrap().to_model();

        assert_eq!(event.id, 7);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(event.capacity, Some(80));
        assert_eq!(event.category, Some(Category::Jazz));
        assert_eq!(
            event.owner,
            Some(Uuid::parse_str("6f1c9a1e-57a4-4b53-9a0f-3f0e9a1d2c11").unwrap())
        );
    }

    #[test_log::test]
    fn should_coerce_legacy_row() {
        let row = serde_json::from_str::<EventRow>(
            r##"{
                "id": 1,
                "title": "Old Show",
                "date": "sometime",
                "venue": "",
                "capacity": -5,
                "rating": null,
                "available": null,
                "category": "polka",
                "image": null,
                "user_id": null
            }"##,
        )
        .unwrap();

        let event = row.to_model();

        assert_eq!(event.date, None);
        assert_eq!(event.venue, None);
        assert_eq!(event.capacity, None);
        assert_eq!(event.rating, 0.0);
        assert!(!event.available);
        assert_eq!(event.category, None);
        assert_eq!(event.owner, None);
    }

    #[test_log::test]
    fn sign_up_with_confirmation_returns_bare_user() {
        let response = serde_json::from_str::<SignUpResponse>(
            r##"{
                "id": "6f1c9a1e-57a4-4b53-9a0f-3f0e9a1d2c11",
                "email": "fan@example.com",
                "confirmation_sent_at": "2025-01-10T18:22:01Z"
            }"##,
        )
        .unwrap();

        assert!(matches!(response, SignUpResponse::User(_)));
    }

    #[test_log::test]
    fn sign_up_without_confirmation_returns_session() {
        let response = serde_json::from_str::<SignUpResponse>(
            r##"{
                "access_token": "token",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "user": {
                    "id": "6f1c9a1e-57a4-4b53-9a0f-3f0e9a1d2c11",
                    "email": "fan@example.com"
                }
            }"##,
        )
        .unwrap();

        match response {
            SignUpResponse::Session(session) => {
                assert_eq!(session.user.to_identity().email, "fan@example.com")
            }
            SignUpResponse::User(_) => panic!("Expected a session"),
        }
    }

    #[test_log::test]
    fn error_message_prefers_first_known_field() {
        let auth = serde_json::from_str::<ErrorResponse>(
            r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#,
        )
        .unwrap();
        let rest = serde_json::from_str::<ErrorResponse>(
            r#"{"code": "42501", "message": "permission denied for table events"}"#,
        )
        .unwrap();

        assert_eq!(auth.message().as_deref(), Some("Invalid login credentials"));
        assert_eq!(
            rest.message().as_deref(),
            Some("permission denied for table events")
        );
    }
}
