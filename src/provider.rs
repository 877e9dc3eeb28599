//! OpenStack backend implementation over an authenticated cloud session.

use log::debug;
use osauth::common::IdOrName;
use thiserror::Error;

use crate::backend::{Backend, BackendFuture, Flavor, FlavorSummary, Image};
use crate::config::Credentials;

const LIST_PAGE_LIMIT: usize = 20;

/// Errors raised by the OpenStack backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OpenStackBackendError {
    /// Raised when the identity service rejects the credentials.
    #[error("failed to establish an authenticated OpenStack client: {message}")]
    Authentication {
        /// Message returned by the identity service.
        message: String,
    },
    /// Raised when no flavor carries the requested name.
    #[error("no flavor named {name} was found")]
    FlavorNotFound {
        /// Name that was searched for.
        name: String,
    },
    /// Raised when no image carries the requested name.
    #[error("no image named {name} was found")]
    ImageNotFound {
        /// Name that was searched for.
        name: String,
    },
    /// Wrapper for provider level failures.
    #[error("provider error: {message}")]
    Provider {
        /// Message returned by the provider SDK.
        message: String,
    },
}

impl From<openstack::Error> for OpenStackBackendError {
    fn from(value: openstack::Error) -> Self {
        Self::Provider {
            message: value.to_string(),
        }
    }
}

/// Backend that performs operations through an authenticated OpenStack cloud.
#[derive(Clone)]
pub struct OpenStackBackend {
    cloud: openstack::Cloud,
}

impl OpenStackBackend {
    /// Authenticates against the identity service and wraps the session.
    ///
    /// The session is scoped to the credential tenant and pinned to the
    /// resolved region before any service call is made.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackBackendError::Authentication`] when password
    /// authentication or endpoint discovery fails.
    pub async fn connect(credentials: &Credentials) -> Result<Self, OpenStackBackendError> {
        let auth = osauth::identity::Password::new(
            credentials.auth_url.as_str(),
            credentials.user.as_str(),
            credentials.password.as_str(),
            credentials.domain.as_str(),
        )
        .map_err(|err| OpenStackBackendError::Authentication {
            message: err.to_string(),
        })?
        .with_project_scope(
            IdOrName::from_name(credentials.tenant.as_str()),
            IdOrName::from_name(credentials.domain.as_str()),
        );

        let session = osauth::Session::new(auth)
            .await
            .map_err(|err| OpenStackBackendError::Authentication {
                message: err.to_string(),
            })?
            .with_region(credentials.region.as_str());
        debug!(
            "authenticated against {} in region {}",
            credentials.auth_url, credentials.region
        );

        Ok(Self {
            cloud: openstack::Cloud::from(session),
        })
    }
}

impl Backend for OpenStackBackend {
    type Error = OpenStackBackendError;

    fn flavor_by_id<'a>(&'a self, id: &'a str) -> BackendFuture<'a, Flavor, Self::Error> {
        Box::pin(async move {
            debug!("fetching flavor {id}");
            let flavor = self.cloud.get_flavor(id).await?;
            Ok(flavor_record(&flavor))
        })
    }

    fn flavor_by_name<'a>(&'a self, name: &'a str) -> BackendFuture<'a, Flavor, Self::Error> {
        Box::pin(async move {
            debug!("resolving flavor named {name}");
            // Nova has no server-side name filter, so the match happens on
            // the listed summaries.
            let summaries = self.cloud.find_flavors().all().await?;
            let matched = summaries
                .into_iter()
                .find(|summary| summary.name() == name)
                .ok_or_else(|| OpenStackBackendError::FlavorNotFound {
                    name: name.to_owned(),
                })?;
            let flavor = self.cloud.get_flavor(matched.id()).await?;
            Ok(flavor_record(&flavor))
        })
    }

    fn flavors(&self) -> BackendFuture<'_, Vec<FlavorSummary>, Self::Error> {
        Box::pin(async move {
            debug!("listing up to {LIST_PAGE_LIMIT} flavors");
            let summaries = self
                .cloud
                .find_flavors()
                .with_limit(LIST_PAGE_LIMIT)
                .all()
                .await?;
            Ok(summaries.iter().map(summary_record).collect())
        })
    }

    fn image_by_id<'a>(&'a self, id: &'a str) -> BackendFuture<'a, Image, Self::Error> {
        Box::pin(async move {
            debug!("fetching image {id}");
            let image = self.cloud.get_image(id).await?;
            Ok(image_record(&image))
        })
    }

    fn image_by_name<'a>(&'a self, name: &'a str) -> BackendFuture<'a, Image, Self::Error> {
        Box::pin(async move {
            debug!("resolving image named {name}");
            let images = self.cloud.find_images().with_name(name).all().await?;
            let image = images
                .into_iter()
                .next()
                .ok_or_else(|| OpenStackBackendError::ImageNotFound {
                    name: name.to_owned(),
                })?;
            Ok(image_record(&image))
        })
    }

    fn images(&self) -> BackendFuture<'_, Vec<Image>, Self::Error> {
        Box::pin(async move {
            debug!("listing up to {LIST_PAGE_LIMIT} images");
            let images = self
                .cloud
                .find_images()
                .with_limit(LIST_PAGE_LIMIT)
                .all()
                .await?;
            Ok(images.iter().map(image_record).collect())
        })
    }
}

fn flavor_record(flavor: &openstack::compute::Flavor) -> Flavor {
    Flavor {
        id: flavor.id().clone(),
        name: flavor.name().clone(),
        vcpus: u64::from(flavor.vcpu_count()),
        ram_mib: flavor.ram_size(),
        disk_gib: flavor.root_size(),
        swap_mib: flavor.swap_size(),
        is_public: flavor.is_public(),
    }
}

fn summary_record(summary: &openstack::compute::FlavorSummary) -> FlavorSummary {
    FlavorSummary {
        id: summary.id().clone(),
        name: summary.name().clone(),
    }
}

fn image_record(image: &openstack::image::Image) -> Image {
    Image {
        id: image.id().clone(),
        name: image.name().clone(),
        status: format!("{:?}", image.status()),
        visibility: format!("{:?}", image.visibility()),
        created_at: image.created_at().to_string(),
        updated_at: image.updated_at().to_string(),
        checksum: image.checksum().clone(),
        size_bytes: image.size(),
        min_disk_gib: u64::from(image.minimum_required_disk()),
        min_ram_mib: u64::from(image.minimum_required_ram()),
    }
}
