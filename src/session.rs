//! Who is signed in, and the flows that change it.

use crate::backend::{RemoteCatalog, SignUpResult};
use crate::error::{BackendError, ValidationError};
use crate::model::Identity;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated(Identity),
}

/// Outcome of resolving the session at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityResolution {
    Present(Identity),
    Absent,
    Failed(BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(Identity),
    /// The account exists but stays unusable until the emailed link is followed
    ConfirmationPending { email: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("another sign in is already in progress")]
    Busy,

    #[error("already signed in, sign out first")]
    AlreadySignedIn,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] BackendError),
}

#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::MissingField("Username"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("Email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("Password"));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct SessionController {
    state: SessionState,
    last_error: Option<String>,
    pending_confirmation: Option<String>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self {
            state: SessionState::Anonymous,
            last_error: None,
            pending_confirmation: None,
        }
    }
}

impl SessionController {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state == SessionState::Authenticating
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Email of an account created but not yet confirmed
    pub fn pending_confirmation(&self) -> Option<&str> {
        self.pending_confirmation.as_deref()
    }

    #[tracing::instrument(skip_all)]
    pub async fn resolve<B: RemoteCatalog>(&mut self, backend: &B) -> IdentityResolution {
        match backend.get_current_identity().await {
            Ok(Some(identity)) => {
                info!(user_id = %identity.id, "Resumed session");
                self.state = SessionState::Authenticated(identity.clone());

                IdentityResolution::Present(identity)
            }
            Ok(None) => IdentityResolution::Absent,
            Err(err) => {
                warn!("Could not resolve the current user: {}", err);

                IdentityResolution::Failed(err)
            }
        }
    }

    #[tracing::instrument(skip(self, backend, password))]
    pub async fn sign_in<B: RemoteCatalog>(
        &mut self,
        backend: &B,
        email: &str,
        password: &str,
    ) -> Result<Identity, SessionError> {
        let previous = self.begin()?;

        let result = match required(email, "Email").and_then(|_| required(password, "Password")) {
            Ok(()) => backend
                .sign_in_with_password(email.trim(), password)
                .await
                .map_err(SessionError::from),
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(identity) => {
                self.state = SessionState::Authenticated(identity.clone());
                self.pending_confirmation = None;

                Ok(identity)
            }
            Err(err) => Err(self.fail(previous, err)),
        }
    }

    /// Registration with a username, stored as user metadata
    #[tracing::instrument(skip_all, fields(email = %form.email))]
    pub async fn sign_up<B: RemoteCatalog>(
        &mut self,
        backend: &B,
        form: &SignUpForm,
    ) -> Result<SignUpOutcome, SessionError> {
        let previous = self.begin()?;

        if let Err(err) = form.validate() {
            return Err(self.fail(previous, err.into()));
        }

        let result = backend
            .sign_up(
                form.email.trim(),
                &form.password,
                json!({ "username": form.username.trim() }),
            )
            .await;

        self.finish_sign_up(previous, form.email.trim(), result)
    }

    /// Short registration with email and password only
    #[tracing::instrument(skip(self, backend, password, confirm_password))]
    pub async fn join<B: RemoteCatalog>(
        &mut self,
        backend: &B,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<SignUpOutcome, SessionError> {
        let previous = self.begin()?;

        if password != confirm_password {
            return Err(self.fail(previous, ValidationError::PasswordMismatch.into()));
        }

        let result = backend.sign_up(email.trim(), password, json!({})).await;

        self.finish_sign_up(previous, email.trim(), result)
    }

    /// Always ends anonymous, even when the backend could not be told
    #[tracing::instrument(skip_all)]
    pub async fn sign_out<B: RemoteCatalog>(&mut self, backend: &B) {
        if let Err(err) = backend.sign_out().await {
            warn!("Sign out failed remotely, dropping the session anyway: {}", err);
        }

        self.state = SessionState::Anonymous;
        self.last_error = None;
        info!("Signed out");
    }

    /// Moves to `Authenticating`, handing back the state to restore on failure.
    /// Only an anonymous session may start a flow.
    fn begin(&mut self) -> Result<SessionState, SessionError> {
        match self.state {
            SessionState::Anonymous => {}
            SessionState::Authenticating => return Err(SessionError::Busy),
            SessionState::Authenticated(_) => return Err(SessionError::AlreadySignedIn),
        }

        self.last_error = None;

        Ok(std::mem::replace(
            &mut self.state,
            SessionState::Authenticating,
        ))
    }

    fn fail(&mut self, previous: SessionState, err: SessionError) -> SessionError {
        error!("Authentication failed: {}", err);

        self.state = previous;
        self.last_error = Some(err.to_string());

        err
    }

    fn finish_sign_up(
        &mut self,
        previous: SessionState,
        email: &str,
        result: Result<SignUpResult, BackendError>,
    ) -> Result<SignUpOutcome, SessionError> {
        match result {
            Ok(SignUpResult::SignedIn(identity)) => {
                self.state = SessionState::Authenticated(identity.clone());
                self.pending_confirmation = None;

                Ok(SignUpOutcome::SignedIn(identity))
            }
            Ok(SignUpResult::ConfirmationPending) => {
                info!("Account created, confirmation email sent");
                self.state = SessionState::Anonymous;
                self.pending_confirmation = Some(email.to_string());

                Ok(SignUpOutcome::ConfirmationPending {
                    email: email.to_string(),
                })
            }
            Err(err) => Err(self.fail(previous, err.into())),
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }

    Ok(())
}
