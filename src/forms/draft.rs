use crate::error::ValidationError;
use crate::media::preview_data_url;
use crate::model::{Category, Event, EventPayload};
use chrono::NaiveDate;
use tracing::warn;

/// Raw form values for a create or edit, not persisted until submitted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub time: String,
    pub duration: String,
    pub venue: String,
    pub price_range: String,
    pub capacity: String,
    pub organizer: String,
    pub description: String,
    pub category: Category,
    image: Option<StagedImage>,
    preview: Option<String>,
}

/// A file picked locally, uploaded only on submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Draft {
    /// Prefills every field from an existing event; its image becomes the preview
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            date: event
                .date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            time: event.time.clone().unwrap_or_default(),
            duration: event.duration.clone().unwrap_or_default(),
            venue: event.venue.clone().unwrap_or_default(),
            price_range: event.price_range.clone().unwrap_or_default(),
            capacity: event
                .capacity
                .filter(|capacity| *capacity > 0)
                .map(|capacity| capacity.to_string())
                .unwrap_or_default(),
            organizer: event.organizer.clone().unwrap_or_default(),
            description: event.description.clone().unwrap_or_default(),
            category: event.category.unwrap_or_default(),
            image: None,
            preview: event.image.clone(),
        }
    }

    pub fn stage_image(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) {
        let file_name = file_name.into();

        self.preview = Some(preview_data_url(&file_name, &bytes));
        self.image = Some(StagedImage { file_name, bytes });
    }

    pub fn staged_image(&self) -> Option<&StagedImage> {
        self.image.as_ref()
    }

    /// Either a `data:` URL of the staged file or the current remote image
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("Title"));
        }

        Ok(())
    }

    /// Fields as they are persisted. Blank text becomes null, capacity must be a whole number.
    pub fn to_payload(&self, image: Option<String>) -> EventPayload {
        EventPayload {
            title: self.title.trim().to_string(),
            date: parse_date(&self.date),
            time: non_blank(&self.time),
            duration: non_blank(&self.duration),
            venue: non_blank(&self.venue),
            price_range: non_blank(&self.price_range),
            capacity: self.capacity.trim().parse().ok(),
            organizer: non_blank(&self.organizer),
            description: non_blank(&self.description),
            category: Some(self.category),
            image,
            available: None,
            rating: None,
            user_id: None,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();

    (!value.is_empty()).then(|| value.to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if value.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .inspect_err(|err| warn!("Ignoring date '{value}'. Err: {err}"))
        .ok()
}
