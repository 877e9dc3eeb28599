//! Binary entry point for the rustack CLI.

use std::env;
use std::io::{self, Write};
use std::process;

use camino::Utf8Path;
use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::debug;
use thiserror::Error;

use rustack::{
    Backend, ConfigError, CredentialSources, Credentials, Flavor, FlavorSummary, Image,
    LookupError, OpenStackBackend, OpenStackBackendError, fetch_flavor, fetch_image,
    load_cloud_config, resolve_credentials,
};

mod cli;

use cli::{Cli, Command, GetCommand, GetTarget, ListCommand, ListTarget};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("backend error: {0}")]
    Backend(#[from] OpenStackBackendError),
    #[error(transparent)]
    Lookup(#[from] LookupError<OpenStackBackendError>),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let verbose = cli.verbose;
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err, verbose);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    if verbose {
        builder.target(Target::Stdout);
    }
    builder.init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let credentials = resolve_from_cli(&cli)?;
    debug!(
        "collected config: cloud={} user={} tenant={} domain={} authurl={} region={}",
        credentials.cloud_name,
        credentials.user,
        credentials.tenant,
        credentials.domain,
        credentials.auth_url,
        credentials.region
    );

    let backend = OpenStackBackend::connect(&credentials).await?;
    run_command(&backend, cli.command).await
}

fn resolve_from_cli(cli: &Cli) -> Result<Credentials, CliError> {
    let explicit = cli
        .cloudconfig
        .as_deref()
        .filter(|path| !path.is_empty())
        .map(Utf8Path::new);
    let file = load_cloud_config(explicit)?;

    let sources = CredentialSources {
        user: cli.user.clone(),
        password: cli.password.clone(),
        tenant: cli.tenant.clone(),
        domain: cli.domain.clone(),
        cloud: cli.cloud.clone(),
        auth_url: env::var("OS_AUTH_URL").ok(),
    };

    Ok(resolve_credentials(&sources, &file)?)
}

async fn run_command(backend: &OpenStackBackend, command: Command) -> Result<i32, CliError> {
    match command {
        Command::Get(get) => run_get(backend, get).await,
        Command::List(list) => run_list(backend, list).await,
    }
}

async fn run_get(backend: &OpenStackBackend, command: GetCommand) -> Result<i32, CliError> {
    match command.resource {
        GetTarget::Flavor(selector) => {
            let flavor =
                fetch_flavor(backend, selector.id.as_deref(), selector.name.as_deref()).await?;
            print_line(&render_flavor(&flavor));
        }
        GetTarget::Image(selector) => {
            let image =
                fetch_image(backend, selector.id.as_deref(), selector.name.as_deref()).await?;
            print_line(&render_image_full(&image));
        }
    }
    Ok(0)
}

async fn run_list(backend: &OpenStackBackend, command: ListCommand) -> Result<i32, CliError> {
    match command.resource {
        ListTarget::Flavors => {
            for summary in backend.flavors().await? {
                print_line(&render_flavor_summary(&summary));
            }
        }
        ListTarget::Images(args) => {
            for image in backend.images().await? {
                let line = if args.all {
                    render_image_full(&image)
                } else {
                    render_image(&image)
                };
                print_line(&line);
            }
        }
    }
    Ok(0)
}

fn render_flavor(flavor: &Flavor) -> String {
    format!(
        "ID = {}, Name = {}, VCPUs = {}, RAM = {} MiB, DISK = {} GiB, Swap = {} MiB, Public = {}",
        flavor.id,
        flavor.name,
        flavor.vcpus,
        flavor.ram_mib,
        flavor.disk_gib,
        flavor.swap_mib,
        flavor.is_public
    )
}

fn render_flavor_summary(summary: &FlavorSummary) -> String {
    format!("ID = {}, Name = {}", summary.id, summary.name)
}

fn render_image(image: &Image) -> String {
    format!(
        "ID = {}, Name = {}, Status = {}",
        image.id, image.name, image.status
    )
}

fn render_image_full(image: &Image) -> String {
    let size = image
        .size_bytes
        .map_or_else(|| String::from("unknown"), |bytes| bytes.to_string());
    let checksum = image.checksum.as_deref().unwrap_or("unknown");
    format!(
        "ID = {}, Name = {}, Status = {}, Visibility = {}, Size = {}, Checksum = {}, Created = {}, Updated = {}, MinDisk = {} GiB, MinRAM = {} MiB",
        image.id,
        image.name,
        image.status,
        image.visibility,
        size,
        checksum,
        image.created_at,
        image.updated_at,
        image.min_disk_gib,
        image.min_ram_mib
    )
}

fn print_line(line: &str) {
    writeln!(io::stdout(), "{line}").ok();
}

fn report_error(err: &CliError, verbose: bool) {
    // Verbose runs route everything, failures included, to stdout.
    if verbose {
        write_error(io::stdout(), err);
    } else {
        write_error(io::stderr(), err);
    }
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> Image {
        Image {
            id: String::from("8a9aa229"),
            name: String::from("cirros"),
            status: String::from("Active"),
            visibility: String::from("Public"),
            created_at: String::from("2026-01-05 10:00:00 +00:00"),
            updated_at: String::from("2026-01-06 11:30:00 +00:00"),
            checksum: Some(String::from("d41d8cd9")),
            size_bytes: Some(13_267_968),
            min_disk_gib: 1,
            min_ram_mib: 512,
        }
    }

    #[test]
    fn render_flavor_lists_every_field() {
        let flavor = Flavor {
            id: String::from("42"),
            name: String::from("m1.small"),
            vcpus: 2,
            ram_mib: 2048,
            disk_gib: 20,
            swap_mib: 0,
            is_public: true,
        };

        assert_eq!(
            render_flavor(&flavor),
            "ID = 42, Name = m1.small, VCPUs = 2, RAM = 2048 MiB, DISK = 20 GiB, Swap = 0 MiB, Public = true"
        );
    }

    #[test]
    fn render_flavor_summary_is_a_short_line() {
        let summary = FlavorSummary {
            id: String::from("42"),
            name: String::from("m1.small"),
        };

        assert_eq!(render_flavor_summary(&summary), "ID = 42, Name = m1.small");
    }

    #[test]
    fn render_image_full_includes_all_fields() {
        let rendered = render_image_full(&sample_image());

        assert_eq!(
            rendered,
            "ID = 8a9aa229, Name = cirros, Status = Active, Visibility = Public, \
             Size = 13267968, Checksum = d41d8cd9, Created = 2026-01-05 10:00:00 +00:00, \
             Updated = 2026-01-06 11:30:00 +00:00, MinDisk = 1 GiB, MinRAM = 512 MiB"
        );
    }

    #[test]
    fn render_image_full_marks_absent_fields_unknown() {
        let mut image = sample_image();
        image.checksum = None;
        image.size_bytes = None;

        let rendered = render_image_full(&image);

        assert!(rendered.contains("Size = unknown"), "rendered: {rendered}");
        assert!(
            rendered.contains("Checksum = unknown"),
            "rendered: {rendered}"
        );
    }

    #[test]
    fn render_image_is_a_status_line() {
        assert_eq!(
            render_image(&sample_image()),
            "ID = 8a9aa229, Name = cirros, Status = Active"
        );
    }

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        let err = CliError::Lookup(LookupError::SelectorRequired);
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert_eq!(rendered, "one of id or name is required\n");
    }

    #[test]
    fn config_errors_carry_a_prefix() {
        let mut buf = Vec::new();
        let err = CliError::Config(ConfigError::MissingUser);
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            rendered,
            "configuration error: no user id was provided; set --user or the OS_USERNAME environment variable\n"
        );
    }
}
