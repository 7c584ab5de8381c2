use crate::backend::RemoteCatalog;
use crate::catalog::filter::filter;
use crate::error::BackendError;
use crate::model::{CategoryFilter, Event, EventId, Identity};
use chrono::{DateTime, Utc};
use tracing::{error, info};

const ORDER_BY: &str = "date";

/// Local copy of the remote collection.
///
/// Only [`CatalogStore::refresh`] writes to it, and it swaps the whole list
/// at once after the fetch completed.
#[derive(Debug)]
pub struct CatalogStore {
    collection: String,
    events: Vec<Event>,
    loading: bool,
    last_refreshed: Option<DateTime<Utc>>,
}

impl CatalogStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            events: Vec::new(),
            loading: false,
            last_refreshed: None,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ascending by date
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// Replaces the local collection with a fresh copy. Returns how many events were loaded.
    ///
    /// On failure the previous collection is kept as is.
    #[tracing::instrument(skip(self, backend), fields(collection = %self.collection))]
    pub async fn refresh<B: RemoteCatalog>(&mut self, backend: &B) -> Result<usize, BackendError> {
        self.loading = true;
        let fetched = backend.query(&self.collection, ORDER_BY).await;
        self.loading = false;

        match fetched {
            Ok(events) => {
                info!("Loaded {} events", events.len());

                self.events = events;
                self.last_refreshed = Some(Utc::now());

                Ok(self.events.len())
            }
            Err(err) => {
                error!("Error fetching events: {}", err);

                Err(err)
            }
        }
    }

    pub fn filtered(
        &self,
        query: &str,
        category: CategoryFilter,
        owner_only: bool,
        identity: Option<&Identity>,
    ) -> Vec<Event> {
        filter(&self.events, query, category, owner_only, identity)
    }
}
