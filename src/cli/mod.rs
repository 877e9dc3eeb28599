//! Command-line interface definitions for the `rustack` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, Subcommand};

/// Top-level CLI for the `rustack` binary.
#[derive(Debug, Parser)]
#[command(
    name = "rustack",
    about = "Demonstrating the OpenStack API using Rust",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// OpenStack cloud config file (default is .cloudconfig.yaml in the
    /// current directory, then $HOME).
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) cloudconfig: Option<String>,
    /// OpenStack user id. If not provided, will be pulled from the
    /// OS_USERNAME env variable.
    #[arg(long, short = 'u', global = true, env = "OS_USERNAME", value_name = "USER")]
    pub(crate) user: Option<String>,
    /// OpenStack password. If not provided, will be pulled from the
    /// OS_PASSWORD env variable.
    #[arg(
        long,
        short = 'p',
        global = true,
        env = "OS_PASSWORD",
        hide_env_values = true,
        value_name = "PASSWORD"
    )]
    pub(crate) password: Option<String>,
    /// OpenStack cloud name (e.g. bob, alice, watchtower). If not provided,
    /// the auth URL will be pulled from the OS_AUTH_URL env variable.
    #[arg(long, short = 'c', global = true, value_name = "CLOUD")]
    pub(crate) cloud: Option<String>,
    /// OpenStack tenant name (project) for which the command will be
    /// executed. If not provided, will be pulled from the OS_PROJECT_NAME
    /// env variable.
    #[arg(long, short = 't', global = true, env = "OS_PROJECT_NAME", value_name = "TENANT")]
    pub(crate) tenant: Option<String>,
    /// OpenStack user domain name. If not provided, will be pulled from the
    /// OS_USER_DOMAIN_NAME env variable.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "OS_USER_DOMAIN_NAME",
        value_name = "DOMAIN"
    )]
    pub(crate) domain: Option<String>,
    /// Display verbose logging.
    #[arg(long, short = 'v', global = true)]
    pub(crate) verbose: bool,
    /// Operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Get an object of type flavor or image.
    #[command(name = "get", about = "Get an object of type flavor or image")]
    Get(GetCommand),
    /// List objects of type flavor or image.
    #[command(name = "list", about = "List objects of type flavor or image")]
    List(ListCommand),
}

/// Arguments for the `rustack get` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct GetCommand {
    /// Resource kind to fetch.
    #[command(subcommand)]
    pub(crate) resource: GetTarget,
}

/// Resource kinds supported by `rustack get`.
#[derive(Debug, Subcommand)]
pub(crate) enum GetTarget {
    /// Fetch a single flavor.
    #[command(name = "flavor", about = "gets a flavor by id or name")]
    Flavor(SelectorArgs),
    /// Fetch a single image.
    #[command(name = "image", about = "gets an image by id or name")]
    Image(SelectorArgs),
}

/// Identifier flags shared by the `get` subcommands.
///
/// When both are supplied the id takes priority; supplying neither is
/// rejected during dispatch rather than by the parser so the error message
/// stays consistent with the other credential failures.
#[derive(Debug, Parser)]
pub(crate) struct SelectorArgs {
    /// The ID of the desired resource.
    #[arg(long, value_name = "ID")]
    pub(crate) id: Option<String>,
    /// The name of the desired resource.
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
}

/// Arguments for the `rustack list` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ListCommand {
    /// Resource kind to list.
    #[command(subcommand)]
    pub(crate) resource: ListTarget,
}

/// Resource kinds supported by `rustack list`.
#[derive(Debug, Subcommand)]
pub(crate) enum ListTarget {
    /// List one page of flavors.
    #[command(
        name = "flavors",
        alias = "flavor",
        about = "lists the flavors that are available within a tenant"
    )]
    Flavors,
    /// List one page of images.
    #[command(
        name = "images",
        alias = "image",
        about = "lists the images that are available within a tenant"
    )]
    Images(ListImagesArgs),
}

/// Arguments for the `rustack list images` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ListImagesArgs {
    /// If set, all fields of the image will be printed.
    #[arg(long, short = 'a')]
    pub(crate) all: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command, GetTarget, ListTarget};

    #[test]
    fn parses_get_flavor_with_selector() {
        let cli = Cli::try_parse_from(["rustack", "get", "flavor", "--id", "42"])
            .unwrap_or_else(|err| panic!("expected parse to succeed: {err}"));
        let Command::Get(get) = cli.command else {
            panic!("expected a get command");
        };
        let GetTarget::Flavor(selector) = get.resource else {
            panic!("expected the flavor target");
        };
        assert_eq!(selector.id.as_deref(), Some("42"));
        assert_eq!(selector.name, None);
    }

    #[test]
    fn accepts_singular_alias_for_list_flavors() {
        let cli = Cli::try_parse_from(["rustack", "list", "flavor"])
            .unwrap_or_else(|err| panic!("expected parse to succeed: {err}"));
        let Command::List(list) = cli.command else {
            panic!("expected a list command");
        };
        assert!(matches!(list.resource, ListTarget::Flavors));
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "rustack", "list", "images", "--all", "-u", "jane", "-c", "alice",
        ])
        .unwrap_or_else(|err| panic!("expected parse to succeed: {err}"));
        assert_eq!(cli.user.as_deref(), Some("jane"));
        assert_eq!(cli.cloud.as_deref(), Some("alice"));
        let Command::List(list) = cli.command else {
            panic!("expected a list command");
        };
        let ListTarget::Images(images) = list.resource else {
            panic!("expected the images target");
        };
        assert!(images.all);
    }

    #[test]
    fn rejects_bare_invocation() {
        assert!(Cli::try_parse_from(["rustack"]).is_err());
    }
}
