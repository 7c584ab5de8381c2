#![allow(dead_code)]

use encore::backend::{RemoteCatalog, SignUpResult};
use encore::config::model::CatalogConfig;
use encore::error::BackendError;
use encore::model::{Category, Event, EventId, EventPayload, Identity};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub const PASSWORD: &str = "hunter22";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query,
    Insert(EventPayload),
    Update(EventId, EventPayload),
    Delete(EventId),
    Upload(String),
    SignUp(String, Value),
    SignIn(String),
    SignOut,
    CurrentIdentity,
}

#[derive(Default)]
pub struct FakeState {
    pub events: Vec<Event>,
    pub next_id: EventId,
    pub calls: Vec<Call>,
    pub accounts: Vec<Identity>,
    pub current: Option<Identity>,
    pub fail_query: bool,
    pub fail_insert: bool,
    pub fail_update: bool,
    pub fail_delete: bool,
    pub fail_upload: bool,
    pub fail_identity: bool,
    pub sign_up_pending: bool,
    pub hang_auth: bool,
    pub hang_upload: bool,
}

/// In-memory backend recording every call
#[derive(Default)]
pub struct FakeCatalog {
    state: Mutex<FakeState>,
}

impl FakeCatalog {
    pub fn with_events(events: Vec<Event>) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state();
            state.next_id = events.iter().map(|e| e.id).max().unwrap_or(0) + 1;
            state.events = events;
        }
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, matcher: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|call| matcher(call)).count()
    }

    pub fn queries(&self) -> usize {
        self.count(|call| matches!(call, Call::Query))
    }

    /// Only local checks happened
    pub fn untouched(&self) -> bool {
        self.state().calls.is_empty()
    }

    pub fn register(&self, email: &str) -> Identity {
        let identity = Identity::new(Uuid::new_v4(), email);
        self.state().accounts.push(identity.clone());
        identity
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

fn unavailable() -> BackendError {
    BackendError::Status {
        status: 503,
        message: "Service unavailable".to_string(),
    }
}

fn to_event(id: EventId, payload: &EventPayload, base: Option<&Event>) -> Event {
    Event {
        id,
        created_at: base.and_then(|e| e.created_at),
        title: payload.title.clone(),
        date: payload.date,
        time: payload.time.clone(),
        duration: payload.duration.clone(),
        venue: payload.venue.clone(),
        price_range: payload.price_range.clone(),
        capacity: payload.capacity,
        organizer: payload.organizer.clone(),
        description: payload.description.clone(),
        rating: payload
            .rating
            .or(base.map(|e| e.rating))
            .unwrap_or_default(),
        available: payload
            .available
            .or(base.map(|e| e.available))
            .unwrap_or_default(),
        category: payload.category,
        image: payload.image.clone(),
        owner: payload.user_id.or(base.and_then(|e| e.owner)),
    }
}

impl RemoteCatalog for FakeCatalog {
    async fn query(&self, _collection: &str, _order_by: &str) -> Result<Vec<Event>, BackendError> {
        self.record(Call::Query);
        let state = self.state();

        if state.fail_query {
            return Err(unavailable());
        }

        let mut events = state.events.clone();
        events.sort_by_key(|event| event.date);

        Ok(events)
    }

    async fn insert(&self, _collection: &str, record: &EventPayload) -> Result<Event, BackendError> {
        self.record(Call::Insert(record.clone()));
        let mut state = self.state();

        if state.fail_insert {
            return Err(unavailable());
        }

        let event = to_event(state.next_id, record, None);
        state.next_id += 1;
        state.events.push(event.clone());

        Ok(event)
    }

    async fn update(
        &self,
        _collection: &str,
        id: EventId,
        patch: &EventPayload,
    ) -> Result<Event, BackendError> {
        self.record(Call::Update(id, patch.clone()));
        let mut state = self.state();

        if state.fail_update {
            return Err(unavailable());
        }

        let existing = state
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or_else(|| BackendError::InvalidResponse("no record returned".to_string()))?;
        *existing = to_event(id, patch, Some(&*existing));

        Ok(existing.clone())
    }

    async fn delete(&self, _collection: &str, id: EventId) -> Result<(), BackendError> {
        self.record(Call::Delete(id));
        let mut state = self.state();

        if state.fail_delete {
            return Err(unavailable());
        }

        state.events.retain(|event| event.id != id);

        Ok(())
    }

    async fn upload_file(
        &self,
        _bucket: &str,
        name: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), BackendError> {
        self.record(Call::Upload(name.to_string()));
        let (hang, fail) = {
            let state = self.state();
            (state.hang_upload, state.fail_upload)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if fail {
            return Err(unavailable());
        }

        Ok(())
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("https://cdn.example.com/{bucket}/{name}")
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: Value,
    ) -> Result<SignUpResult, BackendError> {
        self.record(Call::SignUp(email.to_string(), metadata));

        let identity = self.register(email);
        let mut state = self.state();

        if state.sign_up_pending {
            return Ok(SignUpResult::ConfirmationPending);
        }

        state.current = Some(identity.clone());

        Ok(SignUpResult::SignedIn(identity))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, BackendError> {
        self.record(Call::SignIn(email.to_string()));
        let hang = self.state().hang_auth;

        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.state();
        let identity = state
            .accounts
            .iter()
            .find(|account| account.email == email && password == PASSWORD)
            .cloned()
            .ok_or_else(|| BackendError::Status {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;
        state.current = Some(identity.clone());

        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.record(Call::SignOut);
        self.state().current = None;

        Ok(())
    }

    async fn get_current_identity(&self) -> Result<Option<Identity>, BackendError> {
        self.record(Call::CurrentIdentity);
        let state = self.state();

        if state.fail_identity {
            return Err(unavailable());
        }

        Ok(state.current.clone())
    }
}

pub fn catalog_config() -> CatalogConfig {
    CatalogConfig {
        collection: "events".to_string(),
        bucket: "event-images".to_string(),
    }
}

pub fn event(id: EventId, title: &str, venue: &str, category: Category) -> Event {
    Event {
        id,
        created_at: None,
        title: title.to_string(),
        date: None,
        time: None,
        duration: None,
        venue: Some(venue.to_string()),
        price_range: None,
        capacity: None,
        organizer: None,
        description: None,
        rating: 0.0,
        available: true,
        category: Some(category),
        image: None,
        owner: None,
    }
}

pub fn owned_event(id: EventId, title: &str, owner: &Identity) -> Event {
    Event {
        owner: Some(owner.id),
        ..event(id, title, "Arena", Category::Rock)
    }
}
