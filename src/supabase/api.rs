use super::dto::{ErrorResponse, EventRow, SessionResponse, SignUpResponse, UserResponse};
use crate::backend::{RemoteCatalog, SignUpResult};
use crate::config::model::SupabaseConfig;
use crate::error::BackendError;
use crate::media::content_type_for;
use crate::model::{Event, EventId, EventPayload, Identity};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use serde::de::DeserializeOwned;
use serde_either::SingleOrVec;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

const REST_PATH: &str = "rest/v1";
const STORAGE_PATH: &str = "storage/v1/object";
const AUTH_PATH: &str = "auth/v1";

/// Client for a Supabase project: PostgREST tables, Storage buckets and GoTrue auth.
///
/// Reads are retried on transient failures, mutations never are.
pub struct SupabaseAPI {
    base_url: String,
    anon_key: String,
    read_client: ClientWithMiddleware,
    write_client: ClientWithMiddleware,
    access_token: RwLock<Option<String>>,
}

impl SupabaseAPI {
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let read_client = ClientBuilder::new(http.clone())
            .with(RetryTransientMiddleware::new_with_policy(
                ExponentialBackoff::builder().build_with_max_retries(config.max_retries),
            ))
            .build();
        let write_client = ClientBuilder::new(http).build();

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            read_client,
            write_client,
            access_token: RwLock::new(config.access_token.clone()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, collection: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, collection)
    }

    fn object_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, STORAGE_PATH, bucket, name)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.base_url, AUTH_PATH, endpoint)
    }

    /// Signed in requests carry the user's token so that row level security applies
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.read().await;
        let bearer = token.as_deref().unwrap_or(&self.anon_key);

        request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.authorize(request).await.send().await?;

        into_checked(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.send(request).await?.text().await?;

        serde_json::from_str::<T>(&body).map_err(|e| {
            error!("Response parse failed: {:?}", e);
            BackendError::InvalidResponse(e.to_string())
        })
    }

    async fn store_session(&self, session: &SessionResponse) {
        *self.access_token.write().await = Some(session.access_token.clone());
    }
}

impl RemoteCatalog for SupabaseAPI {
    #[tracing::instrument(skip(self))]
    async fn query(&self, collection: &str, order_by: &str) -> Result<Vec<Event>, BackendError> {
        info!("Getting all events");

        let order = format!("{order_by}.asc");
        let rows: Vec<EventRow> = self
            .send_json(
                self.read_client
                    .get(self.table_url(collection))
                    .query(&[("select", "*"), ("order", order.as_str())]),
            )
            .await?;

        Ok(rows.into_iter().map(EventRow::to_model).collect())
    }

    #[tracing::instrument(skip(self, record), fields(title = %record.title))]
    async fn insert(
        &self,
        collection: &str,
        record: &EventPayload,
    ) -> Result<Event, BackendError> {
        info!("Inserting event");

        let inserted: SingleOrVec<EventRow> = self
            .send_json(
                self.write_client
                    .post(self.table_url(collection))
                    .header("Prefer", "return=representation")
                    .json(&[record]),
            )
            .await?;

        single_row(inserted)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(
        &self,
        collection: &str,
        id: EventId,
        patch: &EventPayload,
    ) -> Result<Event, BackendError> {
        info!("Updating event");

        let updated: SingleOrVec<EventRow> = self
            .send_json(
                self.write_client
                    .patch(self.table_url(collection))
                    .query(&[("id", format!("eq.{id}"))])
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;

        single_row(updated)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, collection: &str, id: EventId) -> Result<(), BackendError> {
        info!("Deleting event");

        self.send(
            self.write_client
                .delete(self.table_url(collection))
                .query(&[("id", format!("eq.{id}"))]),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_file(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), BackendError> {
        info!("Uploading file");

        self.send(
            self.write_client
                .post(self.object_url(bucket, name))
                .header(CONTENT_TYPE, content_type_for(name))
                .body(bytes),
        )
        .await?;

        Ok(())
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/{}/public/{}/{}", self.base_url, STORAGE_PATH, bucket, name)
    }

    #[tracing::instrument(skip(self, password, metadata))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpResult, BackendError> {
        let response: SignUpResponse = self
            .send_json(self.write_client.post(self.auth_url("signup")).json(&json!({
                "email": email,
                "password": password,
                "data": metadata,
            })))
            .await?;

        match response {
            SignUpResponse::Session(session) => {
                self.store_session(&session).await;
                info!("Signed up and signed in");

                Ok(SignUpResult::SignedIn(session.user.to_identity()))
            }
            SignUpResponse::User(user) => {
                info!(user_id = %user.id, "Signed up, waiting for email confirmation");

                Ok(SignUpResult::ConfirmationPending)
            }
        }
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, BackendError> {
        let session: SessionResponse = self
            .send_json(
                self.write_client
                    .post(self.auth_url("token"))
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        self.store_session(&session).await;
        info!("Signed in");

        Ok(session.user.to_identity())
    }

    #[tracing::instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.access_token.read().await.is_none() {
            debug!("No session to sign out from");
            return Ok(());
        }

        let result = self.send(self.write_client.post(self.auth_url("logout"))).await;

        // the token is dropped locally even if the backend could not revoke it
        *self.access_token.write().await = None;

        result.map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    async fn get_current_identity(&self) -> Result<Option<Identity>, BackendError> {
        if self.access_token.read().await.is_none() {
            return Ok(None);
        }

        match self
            .send_json::<UserResponse>(self.read_client.get(self.auth_url("user")))
            .await
        {
            Ok(user) => Ok(Some(user.to_identity())),
            Err(BackendError::Status { status, message })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                warn!("Stored session is no longer valid: {}", message);
                *self.access_token.write().await = None;

                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn single_row(rows: SingleOrVec<EventRow>) -> Result<Event, BackendError> {
    match rows {
        SingleOrVec::Single(row) => Ok(row.to_model()),
        SingleOrVec::Vec(rows) => rows
            .into_iter()
            .next()
            .map(EventRow::to_model)
            .ok_or_else(|| BackendError::InvalidResponse("no record returned".to_string())),
    }
}

async fn into_checked(response: Response) -> Result<Response, BackendError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(ErrorResponse::message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    warn!("Request failed with {}: {}", status, message);

    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for BackendError {
    fn from(err: reqwest_middleware::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}
