use super::draft::Draft;
use super::{upload_staged_image, FormError, Saved};
use crate::backend::RemoteCatalog;
use crate::catalog::store::CatalogStore;
use crate::model::{Event, Identity};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Saved(Saved),
    /// Nobody is signed in; nothing was sent
    SignInRequired,
}

#[derive(Debug)]
pub struct CreateForm {
    bucket: String,
    pub draft: Draft,
    open: bool,
    busy: bool,
    last_error: Option<String>,
}

impl CreateForm {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            draft: Draft::default(),
            open: false,
            busy: false,
            last_error: None,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
        self.last_error = None;
    }

    /// Hides the form, the draft is kept for next time
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// While true the submit control stays disabled
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[tracing::instrument(skip_all, fields(title = %self.draft.title))]
    pub async fn submit<B: RemoteCatalog>(
        &mut self,
        backend: &B,
        identity: Option<&Identity>,
        store: &mut CatalogStore,
    ) -> Result<CreateOutcome, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }

        let Some(identity) = identity else {
            info!("Sign in required to create events");
            return Ok(CreateOutcome::SignInRequired);
        };

        if let Err(err) = self.draft.validate() {
            self.last_error = Some(err.to_string());
            return Err(err.into());
        }

        self.busy = true;
        self.last_error = None;

        let persisted = self.persist(backend, identity, store.collection()).await;
        let result = match persisted {
            Ok(event) => {
                info!(id = event.id, "Event created");

                self.draft = Draft::default();
                self.open = false;

                let refresh_error = store.refresh(backend).await.err();

                Ok(CreateOutcome::Saved(Saved {
                    event,
                    refresh_error,
                }))
            }
            Err(err) => {
                error!("Error creating event: {}", err);
                self.last_error = Some(err.to_string());

                Err(err)
            }
        };

        self.busy = false;
        result
    }

    async fn persist<B: RemoteCatalog>(
        &self,
        backend: &B,
        identity: &Identity,
        collection: &str,
    ) -> Result<Event, FormError> {
        let image = match self.draft.staged_image() {
            Some(staged) => upload_staged_image(backend, &self.bucket, staged).await,
            None => None,
        };

        let payload = self.draft.to_payload(image).for_insert(identity);

        Ok(backend.insert(collection, &payload).await?)
    }
}
