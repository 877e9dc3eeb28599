//! Backend abstraction over the OpenStack compute and image services.

use std::future::Future;
use std::pin::Pin;

/// Full detail record for a single compute flavor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Flavor {
    /// Provider specific identifier for the flavor.
    pub id: String,
    /// Human readable flavor name (for example `m1.small`).
    pub name: String,
    /// Number of virtual CPUs.
    pub vcpus: u64,
    /// RAM size in mebibytes.
    pub ram_mib: u64,
    /// Root disk size in gibibytes.
    pub disk_gib: u64,
    /// Swap size in mebibytes; zero when the flavor has no swap.
    pub swap_mib: u64,
    /// Whether the flavor is visible to all tenants.
    pub is_public: bool,
}

/// Identifier and name pair returned by flavor listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlavorSummary {
    /// Provider specific identifier for the flavor.
    pub id: String,
    /// Human readable flavor name.
    pub name: String,
}

/// Record for a single image from the image service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    /// Provider specific identifier for the image.
    pub id: String,
    /// Human readable image name.
    pub name: String,
    /// Lifecycle status reported by the image service (for example `Active`).
    pub status: String,
    /// Visibility of the image (for example `Public`).
    pub visibility: String,
    /// Creation timestamp, already formatted for display.
    pub created_at: String,
    /// Last update timestamp, already formatted for display.
    pub updated_at: String,
    /// Payload checksum when the image service reports one.
    pub checksum: Option<String>,
    /// Payload size in bytes when the image service reports one.
    pub size_bytes: Option<u64>,
    /// Minimum root disk required to boot the image, in gibibytes.
    pub min_disk_gib: u64,
    /// Minimum RAM required to boot the image, in mebibytes.
    pub min_ram_mib: u64,
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by cloud backends.
///
/// The listing operations return a single page; callers wanting more are
/// expected to narrow with the `get` operations instead.
pub trait Backend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches one flavor by its provider identifier.
    fn flavor_by_id<'a>(&'a self, id: &'a str) -> BackendFuture<'a, Flavor, Self::Error>;

    /// Fetches one flavor by exact name.
    fn flavor_by_name<'a>(&'a self, name: &'a str) -> BackendFuture<'a, Flavor, Self::Error>;

    /// Lists one page of flavor summaries visible to the tenant.
    fn flavors(&self) -> BackendFuture<'_, Vec<FlavorSummary>, Self::Error>;

    /// Fetches one image by its provider identifier.
    fn image_by_id<'a>(&'a self, id: &'a str) -> BackendFuture<'a, Image, Self::Error>;

    /// Fetches one image by exact name.
    fn image_by_name<'a>(&'a self, name: &'a str) -> BackendFuture<'a, Image, Self::Error>;

    /// Lists one page of images visible to the tenant.
    fn images(&self) -> BackendFuture<'_, Vec<Image>, Self::Error>;
}
