//! Create and edit controllers.
//!
//! Both run the same sequence on submit: upload the staged image (best
//! effort), persist the payload, then refresh the catalog once.

pub mod create;
pub mod draft;
pub mod edit;

use crate::backend::RemoteCatalog;
use crate::error::{BackendError, ValidationError};
use crate::media::image_file_name;
use crate::model::Event;
use chrono::Utc;
use draft::StagedImage;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("a submission is already in progress")]
    Busy,

    #[error("no event selected")]
    NoTarget,

    #[error("only the owner can change this event")]
    NotOwner,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] BackendError),
}

/// A mutation that went through. The follow-up refresh may still have failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub event: Event,
    pub refresh_error: Option<BackendError>,
}

/// Uploads the staged file and returns its public URL.
///
/// A failed upload is not fatal: the caller carries on without a new image.
pub(crate) async fn upload_staged_image<B: RemoteCatalog>(
    backend: &B,
    bucket: &str,
    image: &StagedImage,
) -> Option<String> {
    let name = image_file_name(&image.file_name, Utc::now());

    match backend.upload_file(bucket, &name, image.bytes.clone()).await {
        Ok(()) => {
            info!("Uploaded image as '{}'", name);

            Some(backend.public_url(bucket, &name))
        }
        Err(err) => {
            warn!("Error uploading image, saving without it: {}", err);

            None
        }
    }
}
