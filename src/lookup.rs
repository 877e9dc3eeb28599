//! Id-or-name dispatch for single-resource fetches.
//!
//! The `get` subcommands accept both `--id` and `--name`; the id wins when
//! both are present and empty strings count as absent, so values passed
//! through from unset environment variables behave like missing flags.

use thiserror::Error;

use crate::backend::{Backend, Flavor, Image};

/// Errors surfaced while resolving a single resource.
#[derive(Debug, Error)]
pub enum LookupError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when neither an id nor a name was supplied.
    #[error("one of id or name is required")]
    SelectorRequired,
    /// Raised when the backend call fails.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Fetches one flavor, preferring the id selector over the name.
///
/// # Errors
///
/// Returns [`LookupError::SelectorRequired`] when both selectors are absent
/// and propagates backend failures unchanged otherwise.
pub async fn fetch_flavor<B: Backend>(
    backend: &B,
    id: Option<&str>,
    name: Option<&str>,
) -> Result<Flavor, LookupError<B::Error>> {
    if let Some(selector) = non_empty(id) {
        return Ok(backend.flavor_by_id(selector).await?);
    }
    if let Some(selector) = non_empty(name) {
        return Ok(backend.flavor_by_name(selector).await?);
    }
    Err(LookupError::SelectorRequired)
}

/// Fetches one image, preferring the id selector over the name.
///
/// # Errors
///
/// Returns [`LookupError::SelectorRequired`] when both selectors are absent
/// and propagates backend failures unchanged otherwise.
pub async fn fetch_image<B: Backend>(
    backend: &B,
    id: Option<&str>,
    name: Option<&str>,
) -> Result<Image, LookupError<B::Error>> {
    if let Some(selector) = non_empty(id) {
        return Ok(backend.image_by_id(selector).await?);
    }
    if let Some(selector) = non_empty(name) {
        return Ok(backend.image_by_name(selector).await?);
    }
    Err(LookupError::SelectorRequired)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
