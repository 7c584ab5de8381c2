//! Capabilities the catalog needs from the hosted backend.
//!
//! Records cross this boundary already decoded into [`Event`]; loosely typed
//! remote rows are coerced by the implementation and never downstream.

use crate::error::BackendError;
use crate::model::{Event, EventId, EventPayload, Identity};
use serde_json::Value;

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpResult {
    SignedIn(Identity),
    /// The backend requires the email address to be confirmed first
    ConfirmationPending,
}

#[allow(async_fn_in_trait)]
pub trait RemoteCatalog {
    /// Every record of `collection`, ascending by `order_by`
    async fn query(&self, collection: &str, order_by: &str) -> Result<Vec<Event>, BackendError>;

    async fn insert(&self, collection: &str, record: &EventPayload)
        -> Result<Event, BackendError>;

    async fn update(
        &self,
        collection: &str,
        id: EventId,
        patch: &EventPayload,
    ) -> Result<Event, BackendError>;

    async fn delete(&self, collection: &str, id: EventId) -> Result<(), BackendError>;

    async fn upload_file(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), BackendError>;

    fn public_url(&self, bucket: &str, name: &str) -> String;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpResult, BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    async fn get_current_identity(&self) -> Result<Option<Identity>, BackendError>;
}
