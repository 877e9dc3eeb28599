//! Core library for the rustack OpenStack command-line client.
//!
//! The crate exposes a backend abstraction over the OpenStack compute and
//! image services, a credential resolver for the `.cloudconfig.yaml` file,
//! and the id-or-name lookup used by the `get` subcommands.

pub mod backend;
pub mod config;
pub mod lookup;
pub mod provider;
pub mod test_support;

pub use backend::{Backend, BackendFuture, Flavor, FlavorSummary, Image};
pub use config::{
    CloudConfigFile, CloudEntry, ConfigError, CredentialSources, Credentials, load_cloud_config,
    resolve_credentials,
};
pub use lookup::{LookupError, fetch_flavor, fetch_image};
pub use provider::{OpenStackBackend, OpenStackBackendError};
