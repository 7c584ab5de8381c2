use super::draft::Draft;
use super::{upload_staged_image, FormError, Saved};
use crate::backend::RemoteCatalog;
use crate::catalog::store::CatalogStore;
use crate::model::{Event, EventId};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq)]
struct EditTarget {
    id: EventId,
    image: Option<String>,
}

/// Edits one existing event.
///
/// Ownership is checked by whoever opens the form; the backend enforces the
/// real rule.
#[derive(Debug)]
pub struct EditForm {
    bucket: String,
    pub draft: Draft,
    target: Option<EditTarget>,
    busy: bool,
    last_error: Option<String>,
}

impl EditForm {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            draft: Draft::default(),
            target: None,
            busy: false,
            last_error: None,
        }
    }

    pub fn open_for(&mut self, event: &Event) {
        self.draft = Draft::from_event(event);
        self.target = Some(EditTarget {
            id: event.id,
            image: event.image.clone(),
        });
        self.last_error = None;
    }

    pub fn close(&mut self) {
        self.target = None;
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target_id(&self) -> Option<EventId> {
        self.target.as_ref().map(|target| target.id)
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[tracing::instrument(skip_all, fields(id = ?self.target_id()))]
    pub async fn submit<B: RemoteCatalog>(
        &mut self,
        backend: &B,
        store: &mut CatalogStore,
    ) -> Result<Saved, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }

        let Some(target) = self.target.clone() else {
            return Err(FormError::NoTarget);
        };

        if let Err(err) = self.draft.validate() {
            self.last_error = Some(err.to_string());
            return Err(err.into());
        }

        self.busy = true;
        self.last_error = None;

        let persisted = self.persist(backend, &target, store.collection()).await;
        let result = match persisted {
            Ok(event) => {
                info!("Event updated");

                self.draft = Draft::default();
                self.target = None;

                let refresh_error = store.refresh(backend).await.err();

                Ok(Saved {
                    event,
                    refresh_error,
                })
            }
            Err(err) => {
                error!("Error updating event: {}", err);
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
        target: &EditTarget,
        collection: &str,
    ) -> Result<Event, FormError> {
        let uploaded = match self.draft.staged_image() {
            Some(staged) => upload_staged_image(backend, &self.bucket, staged).await,
            None => None,
        };
        let image = uploaded.or_else(|| target.image.clone());

        let payload = self.draft.to_payload(image);

        Ok(backend.update(collection, target.id, &payload).await?)
    }
}
