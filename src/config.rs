//! Cloud configuration discovery and credential resolution.
//!
//! Credentials are assembled once per invocation from four sources in
//! priority order: explicit flag, environment variable, named cloud block in
//! the configuration file, hard default (domain and region only). The result
//! is immutable for the rest of the run.

use std::collections::HashMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".cloudconfig.yaml";
const DEFAULT_DOMAIN: &str = "Default";
const DEFAULT_REGION: &str = "RegionOne";

/// A named cloud block from the configuration file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct CloudEntry {
    /// Authentication domain used for this cloud unless a flag overrides it.
    pub domain: Option<String>,
    /// Identity endpoint used to authenticate against this cloud.
    pub authurl: Option<String>,
    /// Region requested for service endpoints.
    pub region: Option<String>,
}

/// Parsed `.cloudconfig.yaml` document.
///
/// Every top-level key other than `clouds` and `authdomains` is read as a
/// named cloud block.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CloudConfigFile {
    /// Cloud names accepted for `--cloud`, quoted in the unknown-cloud error.
    pub clouds: Vec<String>,
    /// Authentication domains accepted when the list is non-empty.
    pub authdomains: Vec<String>,
    /// Named cloud blocks keyed by cloud name.
    #[serde(flatten)]
    pub entries: HashMap<String, CloudEntry>,
}

/// Raw credential inputs gathered from flags and the environment.
///
/// Flag-over-environment precedence is already applied by the CLI layer;
/// empty strings count as absent during resolution.
#[derive(Clone, Debug, Default)]
pub struct CredentialSources {
    /// User id from `--user` or `OS_USERNAME`.
    pub user: Option<String>,
    /// Password from `--password` or `OS_PASSWORD`.
    pub password: Option<String>,
    /// Tenant (project) name from `--tenant` or `OS_PROJECT_NAME`.
    pub tenant: Option<String>,
    /// Authentication domain from `--domain` or `OS_USER_DOMAIN_NAME`.
    pub domain: Option<String>,
    /// Cloud name from `--cloud`.
    pub cloud: Option<String>,
    /// Identity endpoint from `OS_AUTH_URL`.
    pub auth_url: Option<String>,
}

/// Validated credentials ready to open an OpenStack session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
    /// Name of the selected cloud; empty when derived from `OS_AUTH_URL`.
    pub cloud_name: String,
    /// User id presented to the identity service.
    pub user: String,
    /// Password presented to the identity service.
    pub password: String,
    /// Tenant (project) the session is scoped to.
    pub tenant: String,
    /// Authentication domain for the user and project scope.
    pub domain: String,
    /// Identity endpoint used for authentication.
    pub auth_url: String,
    /// Region requested for service endpoints.
    pub region: String,
}

/// Errors raised while loading configuration or resolving credentials.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Raised when no source supplies a user id.
    #[error("no user id was provided; set --user or the OS_USERNAME environment variable")]
    MissingUser,
    /// Raised when no source supplies a password.
    #[error("no password was provided; set --password or the OS_PASSWORD environment variable")]
    MissingPassword,
    /// Raised when no source supplies a tenant name.
    #[error(
        "no tenant name was provided; set --tenant or the OS_PROJECT_NAME environment variable"
    )]
    MissingTenant,
    /// Raised when the requested cloud has no block in the configuration file.
    #[error("unknown cloud name: {name}; valid values are {}", .valid.join(", "))]
    UnknownCloud {
        /// Cloud name that was requested.
        name: String,
        /// Cloud names the configuration file declares valid.
        valid: Vec<String>,
    },
    /// Raised when a supplied domain is outside the configured allow-list.
    #[error("invalid authentication domain: {domain}; valid values are {}", .valid.join(", "))]
    InvalidDomain {
        /// Domain that was requested.
        domain: String,
        /// Domains the configuration file declares valid.
        valid: Vec<String>,
    },
    /// Raised when a cloud block exists but does not name an authurl.
    #[error("cloud {name} does not define an authurl in the configuration file")]
    CloudMissingAuthUrl {
        /// Cloud whose block is incomplete.
        name: String,
    },
    /// Raised when neither a cloud name nor `OS_AUTH_URL` is available.
    #[error(
        "unable to determine cloud configuration from the environment (no OS_AUTH_URL set); set it, or use the --cloud flag"
    )]
    MissingAuthUrl,
    /// Raised when file system operations fail.
    #[error("failed to read {path}: {message}")]
    Io {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when parsing YAML content fails.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path that could not be parsed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

/// Loads the cloud configuration file.
///
/// An explicit path must exist and parse. Otherwise `.cloudconfig.yaml` is
/// searched for in the current directory and then the home directory; when
/// no candidate exists the empty configuration is returned so that purely
/// environment-driven invocations still work.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when an explicit path cannot be read and
/// [`ConfigError::Parse`] when a found file is not valid YAML.
pub fn load_cloud_config(explicit: Option<&Utf8Path>) -> Result<CloudConfigFile, ConfigError> {
    if let Some(path) = explicit {
        let contents = read_config(path)?;
        return parse_config(path, &contents);
    }

    for candidate in search_candidates() {
        if path_exists(&candidate)? {
            info!("using cloud config file: {candidate}");
            let contents = read_config(&candidate)?;
            return parse_config(&candidate, &contents);
        }
    }

    debug!("no cloud config file found; continuing with flags and environment only");
    Ok(CloudConfigFile::default())
}

/// Resolves a complete credential set or fails with the first gap found.
///
/// The cloud basis is settled first, then user, password, and tenant, then
/// the domain and region defaults.
///
/// # Errors
///
/// Returns the [`ConfigError`] variant describing the missing or invalid
/// source.
pub fn resolve_credentials(
    sources: &CredentialSources,
    file: &CloudConfigFile,
) -> Result<Credentials, ConfigError> {
    let CloudBasis {
        name: cloud_name,
        auth_url,
        domain: entry_domain,
        region: entry_region,
    } = resolve_cloud(sources, file)?;

    let user = non_empty(sources.user.as_deref()).ok_or(ConfigError::MissingUser)?;
    let password = non_empty(sources.password.as_deref()).ok_or(ConfigError::MissingPassword)?;
    let tenant = non_empty(sources.tenant.as_deref()).ok_or(ConfigError::MissingTenant)?;

    let explicit_domain = non_empty(sources.domain.as_deref()).or_else(|| entry_domain.as_deref());
    if let Some(candidate) = explicit_domain
        && !file.authdomains.is_empty()
        && !file.authdomains.iter().any(|valid| valid == candidate)
    {
        return Err(ConfigError::InvalidDomain {
            domain: candidate.to_owned(),
            valid: file.authdomains.clone(),
        });
    }
    let domain = explicit_domain.unwrap_or(DEFAULT_DOMAIN).to_owned();
    let region = entry_region.unwrap_or_else(|| String::from(DEFAULT_REGION));

    Ok(Credentials {
        cloud_name,
        user: user.to_owned(),
        password: password.to_owned(),
        tenant: tenant.to_owned(),
        domain,
        auth_url,
        region,
    })
}

#[derive(Clone, Debug)]
struct CloudBasis {
    name: String,
    auth_url: String,
    domain: Option<String>,
    region: Option<String>,
}

fn resolve_cloud(
    sources: &CredentialSources,
    file: &CloudConfigFile,
) -> Result<CloudBasis, ConfigError> {
    if let Some(cloud) = non_empty(sources.cloud.as_deref()) {
        let entry = file
            .entries
            .get(cloud)
            .ok_or_else(|| ConfigError::UnknownCloud {
                name: cloud.to_owned(),
                valid: file.clouds.clone(),
            })?;
        let auth_url =
            non_empty(entry.authurl.as_deref()).ok_or_else(|| ConfigError::CloudMissingAuthUrl {
                name: cloud.to_owned(),
            })?;
        return Ok(CloudBasis {
            name: cloud.to_owned(),
            auth_url: auth_url.to_owned(),
            domain: entry.domain.clone().filter(|v| !v.is_empty()),
            region: entry.region.clone().filter(|v| !v.is_empty()),
        });
    }

    if let Some(auth_url) = non_empty(sources.auth_url.as_deref()) {
        return Ok(CloudBasis {
            name: String::new(),
            auth_url: auth_url.to_owned(),
            domain: None,
            region: None,
        });
    }

    Err(ConfigError::MissingAuthUrl)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn search_candidates() -> Vec<Utf8PathBuf> {
    let mut candidates = vec![Utf8PathBuf::from(CONFIG_FILE_NAME)];
    let Some(home) = std::env::var_os("HOME") else {
        warn!("cannot find home directory");
        return candidates;
    };
    match Utf8PathBuf::from_path_buf(home.into()) {
        Ok(home_dir) => candidates.push(home_dir.join(CONFIG_FILE_NAME)),
        Err(raw) => warn!(
            "home directory {} is not valid UTF-8; skipping it",
            raw.display()
        ),
    }
    candidates
}

fn split_path(path: &Utf8Path) -> Result<(&Utf8Path, &str), ConfigError> {
    let file_name = path.file_name().ok_or_else(|| ConfigError::Io {
        path: path.to_path_buf(),
        message: String::from("configuration file path is missing a filename"),
    })?;
    // parent() of a bare relative filename is Some(""), which cap-std
    // cannot open; treat it as the current directory.
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    Ok((parent, file_name))
}

fn path_exists(path: &Utf8Path) -> Result<bool, ConfigError> {
    let (parent, file_name) = split_path(path)?;
    match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir.try_exists(file_name).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ConfigError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

fn read_config(path: &Utf8Path) -> Result<String, ConfigError> {
    let (parent, file_name) = split_path(path)?;
    let dir =
        Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| ConfigError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        })?;
    dir.read_to_string(file_name).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn parse_config(path: &Utf8Path, contents: &str) -> Result<CloudConfigFile, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(CloudConfigFile::default());
    }

    serde_yaml::from_str(contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvGuard;
    use tempfile::TempDir;

    const SAMPLE_CONFIG: &str = "\
clouds:
  - alice
  - bob
authdomains:
  - Default
  - Special
alice:
  domain: Special
  authurl: https://alice.example.test:5000/v3
  region: eu-west-1
bob:
  authurl: https://bob.example.test:5000/v3
";

    fn temp_config_path(tmp: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().join(name))
            .unwrap_or_else(|err| panic!("temp path should be utf8: {}", err.display()))
    }

    #[test]
    fn parses_named_cloud_blocks() {
        let file = parse_config(Utf8Path::new("test.yaml"), SAMPLE_CONFIG)
            .unwrap_or_else(|err| panic!("parse sample config: {err}"));

        assert_eq!(file.clouds, vec!["alice", "bob"]);
        assert_eq!(file.authdomains, vec!["Default", "Special"]);
        assert_eq!(file.entries.len(), 2);
        let alice = file
            .entries
            .get("alice")
            .unwrap_or_else(|| panic!("alice entry should exist"));
        assert_eq!(alice.domain.as_deref(), Some("Special"));
        assert_eq!(
            alice.authurl.as_deref(),
            Some("https://alice.example.test:5000/v3")
        );
        assert_eq!(alice.region.as_deref(), Some("eu-west-1"));
        let bob = file
            .entries
            .get("bob")
            .unwrap_or_else(|| panic!("bob entry should exist"));
        assert_eq!(bob.domain, None);
        assert_eq!(bob.region, None);
    }

    #[test]
    fn empty_contents_parse_to_the_default_config() {
        let file = parse_config(Utf8Path::new("test.yaml"), "  \n")
            .unwrap_or_else(|err| panic!("parse empty config: {err}"));

        assert!(file.clouds.is_empty());
        assert!(file.authdomains.is_empty());
        assert!(file.entries.is_empty());
    }

    #[test]
    fn malformed_yaml_reports_the_path() {
        let Err(err) = parse_config(Utf8Path::new("broken.yaml"), ": not yaml: [") else {
            panic!("malformed yaml should fail to parse");
        };

        let ConfigError::Parse { ref path, .. } = err else {
            panic!("expected a parse error, got {err}");
        };
        assert_eq!(path, "broken.yaml");
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let path = temp_config_path(&tmp, "absent.yaml");

        let Err(err) = load_cloud_config(Some(&path)) else {
            panic!("absent explicit config should fail");
        };

        let ConfigError::Io {
            path: ref reported, ..
        } = err
        else {
            panic!("expected an io error, got {err}");
        };
        assert_eq!(reported, &path);
    }

    #[test]
    fn explicit_path_is_loaded() {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let path = temp_config_path(&tmp, "config.yaml");
        std::fs::write(path.as_std_path(), SAMPLE_CONFIG)
            .unwrap_or_else(|err| panic!("write config: {err}"));

        let file = load_cloud_config(Some(&path))
            .unwrap_or_else(|err| panic!("load explicit config: {err}"));

        assert!(file.entries.contains_key("alice"));
    }

    #[test]
    fn bare_relative_paths_resolve_against_the_current_directory() {
        let (parent, file_name) = split_path(Utf8Path::new(CONFIG_FILE_NAME))
            .unwrap_or_else(|err| panic!("split path: {err}"));

        assert_eq!(parent, Utf8Path::new("."));
        assert_eq!(file_name, CONFIG_FILE_NAME);
    }

    #[tokio::test]
    async fn discovery_falls_back_to_the_home_directory() {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let home = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|err| panic!("temp path should be utf8: {}", err.display()));
        std::fs::write(home.join(CONFIG_FILE_NAME).as_std_path(), SAMPLE_CONFIG)
            .unwrap_or_else(|err| panic!("write config: {err}"));
        let _guard = EnvGuard::set_vars(&[("HOME", home.as_str())]).await;

        let file =
            load_cloud_config(None).unwrap_or_else(|err| panic!("load discovered config: {err}"));

        assert!(file.entries.contains_key("bob"));
    }
}
