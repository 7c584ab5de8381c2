use crate::backend::RemoteCatalog;
use crate::catalog::store::CatalogStore;
use crate::config::model::CatalogConfig;
use crate::error::BackendError;
use crate::forms::create::{CreateForm, CreateOutcome};
use crate::forms::edit::EditForm;
use crate::forms::{FormError, Saved};
use crate::model::{CategoryFilter, Event, EventId, Identity};
use crate::session::{IdentityResolution, SessionController, SessionError, SignUpForm, SignUpOutcome};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Startup {
    pub identity: IdentityResolution,
    pub loaded: Result<usize, BackendError>,
}

/// The whole browsing screen: catalog, filters, selection, session and forms.
///
/// Failures end up in [`EventBoard::message`] until dismissed.
pub struct EventBoard<B: RemoteCatalog> {
    backend: B,
    store: CatalogStore,
    session: SessionController,
    pub create: CreateForm,
    pub edit: EditForm,
    query: String,
    category: CategoryFilter,
    mine_only: bool,
    selected: Option<EventId>,
    sign_in_prompt: bool,
    deleting: bool,
    message: Option<String>,
}

impl<B: RemoteCatalog> EventBoard<B> {
    pub fn new(backend: B, catalog: &CatalogConfig) -> Self {
        Self {
            backend,
            store: CatalogStore::new(catalog.collection.clone()),
            session: SessionController::default(),
            create: CreateForm::new(catalog.bucket.clone()),
            edit: EditForm::new(catalog.bucket.clone()),
            query: String::new(),
            category: CategoryFilter::All,
            mine_only: false,
            selected: None,
            sign_in_prompt: false,
            deleting: false,
            message: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn dismiss_message(&mut self) {
        self.message = None;
    }

    /// Resolves who is signed in and loads the catalog, both at once
    #[tracing::instrument(skip_all)]
    pub async fn start(&mut self) -> Startup {
        let (identity, loaded) = futures::join!(
            self.session.resolve(&self.backend),
            self.store.refresh(&self.backend)
        );

        if let Err(err) = &loaded {
            self.message = Some(format!("Could not load events: {err}"));
        }

        Startup { identity, loaded }
    }

    pub async fn refresh(&mut self) -> Result<usize, BackendError> {
        let loaded = self.store.refresh(&self.backend).await;

        if let Err(err) = &loaded {
            self.message = Some(format!("Could not load events: {err}"));
        }

        loaded
    }

    // Filters

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
    }

    pub fn mine_only(&self) -> bool {
        self.mine_only
    }

    /// Only signed in users can narrow the list to their own events
    pub fn toggle_mine_only(&mut self) -> bool {
        if self.session.identity().is_none() {
            self.mine_only = false;
            return false;
        }

        self.mine_only = !self.mine_only;
        self.mine_only
    }

    pub fn visible_events(&self) -> Vec<Event> {
        self.store.filtered(
            &self.query,
            self.category,
            self.mine_only,
            self.session.identity(),
        )
    }

    // Selection

    pub fn select(&mut self, id: EventId) -> Option<&Event> {
        self.selected = self.store.get(id).map(|event| event.id);
        self.selected_event()
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.selected.and_then(|id| self.store.get(id))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Whether edit and delete are offered for the selected event
    pub fn can_modify_selected(&self) -> bool {
        self.selected_event()
            .is_some_and(|event| event.is_owned_by(self.session.identity()))
    }

    // Create and edit

    pub fn open_create(&mut self) {
        self.create.open();
    }

    #[tracing::instrument(skip_all)]
    pub async fn submit_create(&mut self) -> Result<CreateOutcome, FormError> {
        let outcome = self
            .create
            .submit(&self.backend, self.session.identity(), &mut self.store)
            .await;

        match &outcome {
            Ok(CreateOutcome::SignInRequired) => {
                self.sign_in_prompt = true;
            }
            Ok(CreateOutcome::Saved(saved)) => self.report_refresh(saved),
            Err(err) => self.message = Some(format!("Could not create event: {err}")),
        }

        outcome
    }

    pub fn open_edit(&mut self) -> Result<(), FormError> {
        let event = self.selected_event().ok_or(FormError::NoTarget)?;

        if !event.is_owned_by(self.session.identity()) {
            return Err(FormError::NotOwner);
        }

        let event = event.clone();
        self.edit.open_for(&event);

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub async fn submit_edit(&mut self) -> Result<Saved, FormError> {
        let outcome = self.edit.submit(&self.backend, &mut self.store).await;

        match &outcome {
            Ok(saved) => {
                self.selected = None;
                self.report_refresh(saved);
            }
            Err(err) => self.message = Some(format!("Could not update event: {err}")),
        }

        outcome
    }

    // Delete

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// Deletes the selected event. The returned error, if any, is from the follow-up refresh.
    #[tracing::instrument(skip_all, fields(id = ?self.selected))]
    pub async fn delete_selected(&mut self) -> Result<Option<BackendError>, FormError> {
        if self.deleting {
            return Err(FormError::Busy);
        }

        let event = self.selected_event().ok_or(FormError::NoTarget)?;

        if !event.is_owned_by(self.session.identity()) {
            warn!("Refusing to delete an event owned by someone else");
            return Err(FormError::NotOwner);
        }

        let id = event.id;

        self.deleting = true;
        let deleted = self.backend.delete(self.store.collection(), id).await;
        self.deleting = false;

        match deleted {
            Ok(()) => {
                info!("Event deleted");
                self.selected = None;

                let refresh_error = self.refresh().await.err();

                Ok(refresh_error)
            }
            Err(err) => {
                error!("Error deleting event: {}", err);
                self.message = Some(format!("Could not delete event: {err}"));

                Err(err.into())
            }
        }
    }

    // Session

    /// Set when an action needed a signed in user
    pub fn sign_in_prompt(&self) -> bool {
        self.sign_in_prompt
    }

    pub fn open_sign_in(&mut self) {
        self.sign_in_prompt = true;
    }

    pub fn close_sign_in(&mut self) {
        self.sign_in_prompt = false;
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let result = self.session.sign_in(&self.backend, email, password).await;

        if result.is_ok() {
            self.sign_in_prompt = false;
        }

        result
    }

    pub async fn sign_up(&mut self, form: &SignUpForm) -> Result<SignUpOutcome, SessionError> {
        let result = self.session.sign_up(&self.backend, form).await;
        self.report_sign_up(&result);

        result
    }

    pub async fn join(
        &mut self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<SignUpOutcome, SessionError> {
        let result = self
            .session
            .join(&self.backend, email, password, confirm_password)
            .await;
        self.report_sign_up(&result);

        result
    }

    pub async fn sign_out(&mut self) {
        self.session.sign_out(&self.backend).await;
        self.mine_only = false;
    }

    fn report_sign_up(&mut self, result: &Result<SignUpOutcome, SessionError>) {
        if let Ok(SignUpOutcome::ConfirmationPending { email }) = result {
            self.message = Some(format!(
                "Check {email} for a confirmation link, then sign in."
            ));
        }
    }

    fn report_refresh(&mut self, saved: &Saved) {
        if let Some(err) = &saved.refresh_error {
            self.message = Some(format!("Saved, but could not reload events: {err}"));
        }
    }
}
