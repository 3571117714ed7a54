use crate::check;
use crate::codec;
use crate::config::{Settings, Stage};
use crate::error::CommandError;
use crate::model::DensityTable;
use crate::output;
use crate::progress;
use crate::protocol::{self, GenericResult, Request, Status};
use crate::tables;
use crate::transport::DensityBackend;
use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};

const NO_REASON: &str = "no reason given. Consult lambda logs.";

#[derive(Debug, Parser)]
#[command(
    name = "update-densities",
    about = "Manage the published ingredient density dataset.",
    version,
    after_help = r#"Examples:
  update-densities --list
  update-densities --download latest --out densities.csv
  update-densities --check new-densities.csv
  update-densities --update new-densities.csv --stage PROD
  update-densities --rollback 2025-10-01T09:30:00.123Z

Only one of --list, --rollback, --update, --check or --download is honoured.
"#
)]
pub struct Args {
    /// List available revisions of density data for rollback.
    #[arg(long)]
    pub list: bool,

    /// Update the density data with this CSV file.
    #[arg(long, value_name = "PATH")]
    pub update: Option<PathBuf>,

    /// Roll back current published data to this RFC 3339 timestamp. Use --list to find available timestamps.
    #[arg(long, value_name = "TIMESTAMP")]
    pub rollback: Option<String>,

    /// Validate a density CSV file locally without publishing it.
    #[arg(long, value_name = "PATH")]
    pub check: Option<PathBuf>,

    /// Download this version of data to CSV. Either a revision timestamp or 'latest'.
    #[arg(long, value_name = "REVISION", default_value = "latest")]
    pub download: String,

    /// CSV file to write when downloading.
    #[arg(long, value_name = "PATH", default_value = "densities.csv")]
    pub out: PathBuf,

    /// AWS region to target.
    #[arg(long, env = "AWS_REGION", default_value = "eu-west-1")]
    pub region: String,

    /// Whether to target CODE or PROD.
    #[arg(long, env = "DENSITIES_STAGE", default_value = "CODE")]
    pub stage: Stage,

    /// Output the revision listing as JSON.
    #[arg(long)]
    pub json: bool,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Use a local fixture backend instead of AWS (for tests/dev only).
    #[arg(long, value_name = "PATH", hide = true)]
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { json: bool },
    Rollback(String),
    Update(PathBuf),
    Check(PathBuf),
    Download { revision: String, out: PathBuf },
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings::new(self.stage.clone(), self.region.clone())
    }

    /// The single command this invocation asks for. Empty values count as
    /// not given.
    pub fn command(&self) -> Option<Command> {
        if self.list {
            return Some(Command::List { json: self.json });
        }
        if let Some(ts) = self.rollback.as_ref().filter(|s| !s.is_empty()) {
            return Some(Command::Rollback(ts.clone()));
        }
        if let Some(path) = self.update.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            return Some(Command::Update(path.clone()));
        }
        if let Some(path) = self.check.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            return Some(Command::Check(path.clone()));
        }
        if !self.download.is_empty() {
            return Some(Command::Download {
                revision: self.download.clone(),
                out: self.out.clone(),
            });
        }
        None
    }
}

pub fn dispatch(
    args: Args,
    settings: &Settings,
    backend: &dyn DensityBackend,
) -> anyhow::Result<()> {
    let command = args.command().ok_or(CommandError::Usage)?;
    execute(command, settings, backend)
}

pub fn execute(
    command: Command,
    settings: &Settings,
    backend: &dyn DensityBackend,
) -> anyhow::Result<()> {
    match command {
        Command::List { json } => {
            let body = invoke(backend, settings, &Request::list())?;
            let listing = protocol::parse_list_response(&body)
                .map_err(|err| undecodable(&body, err))?;
            ensure_ok(listing.status, listing.detail.clone(), "List")?;
            if json {
                output::print_json(&output::ListingJson::new(&listing, &settings.stage))
            } else {
                print!(
                    "{}",
                    output::render_listing(
                        &listing,
                        &settings.stage,
                        tables::terminal_width(),
                        tables::should_color()
                    )
                );
                Ok(())
            }
        }
        Command::Rollback(ts) => {
            let to_date = OffsetDateTime::parse(ts.trim(), &Rfc3339)
                .map_err(|_| CommandError::InvalidTimestamp(ts.clone()))?;
            let result = generic(backend, settings, &Request::rollback(to_date))?;
            ensure_ok(result.status, result.detail, "Rollback")?;
            info!("Rollback successful. Use --list to see the new state");
            Ok(())
        }
        Command::Update(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Could not load '{}'", path.display()))?;
            let result = generic(backend, settings, &Request::update(content))?;
            ensure_ok(result.status, result.detail, "Publish")?;
            info!("Publish successful. Use --list to see the new state");
            Ok(())
        }
        Command::Check(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Could not load '{}'", path.display()))?;
            let report = check::check_csv(&content)
                .with_context(|| format!("Could not read CSV from '{}'", path.display()))?;
            if report.rows == 0 {
                anyhow::bail!("There was no data to import in '{}'", path.display());
            }
            if !report.is_publishable() {
                anyhow::bail!(
                    "{} rows did not convert in '{}'",
                    report.failures.len(),
                    path.display()
                );
            }
            info!("{} rows in '{}' are ready to publish", report.rows, path.display());
            Ok(())
        }
        Command::Download { revision, out } => download(backend, settings, &revision, &out),
    }
}

fn invoke(
    backend: &dyn DensityBackend,
    settings: &Settings,
    request: &Request,
) -> anyhow::Result<Vec<u8>> {
    let payload = serde_json::to_vec(request)?;
    let function = settings.stage.function_name();
    progress::while_waiting(&format!("Invoking {function} ({})…", request.mode()), || {
        backend.invoke(&function, &payload)
    })
}

fn generic(
    backend: &dyn DensityBackend,
    settings: &Settings,
    request: &Request,
) -> anyhow::Result<GenericResult> {
    let body = invoke(backend, settings, request)?;
    protocol::parse_generic_response(&body).map_err(|err| undecodable(&body, err))
}

fn undecodable(body: &[u8], err: serde_json::Error) -> anyhow::Error {
    error!("Server response was: {}", String::from_utf8_lossy(body));
    anyhow::Error::new(err).context("Could not parse server response")
}

fn ensure_ok(
    status: Status,
    detail: Option<String>,
    action: &'static str,
) -> Result<(), CommandError> {
    match status {
        Status::Ok => Ok(()),
        Status::Error => Err(CommandError::Remote {
            action,
            detail: detail.unwrap_or_else(|| NO_REASON.to_string()),
        }),
    }
}

fn download(
    backend: &dyn DensityBackend,
    settings: &Settings,
    revision: &str,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    let url = settings.stage.document_url(revision);
    let body = progress::while_waiting(&format!("Downloading {url}…"), || backend.fetch(&url))
        .context("Could not download data")?;
    let table: DensityTable =
        serde_json::from_slice(&body).context("Could not download data: not density JSON")?;

    let file = std::fs::File::create(out)
        .with_context(|| format!("Could not open {}", out.display()))?;
    let report = codec::convert(&table, file).context("Could not write data")?;

    if !report.skipped.is_empty() {
        warn!(
            "{} of {} rows were invalid and left out",
            report.skipped.len(),
            table.values.len()
        );
    }
    info!("Data written to {} ({} rows)", out.display(), report.written);
    Ok(())
}
