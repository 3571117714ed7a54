use crate::config::Settings;
use crate::error::CommandError;
use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, error};

fn aws_bin() -> OsString {
    std::env::var_os("UPDATE_DENSITIES_AWS_BIN").unwrap_or_else(|| OsString::from("aws"))
}

/// The two blocking calls a command can make.
pub trait DensityBackend {
    /// Invokes `function` synchronously and returns its response body.
    ///
    /// Anything other than a clean 200 is an error carrying whatever body the
    /// remote side sent back.
    fn invoke(&self, function: &str, payload: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Fetches a published JSON document.
    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

/// Invokes through the AWS CLI (credentials are its concern) and reads the
/// public bucket over HTTPS.
#[derive(Debug)]
pub struct AwsBackend {
    region: String,
    http: reqwest::blocking::Client,
}

/// Metadata `aws lambda invoke` prints on stdout. The response body itself
/// goes to the outfile.
#[derive(Debug, Deserialize)]
struct InvokeMetadata {
    #[serde(rename = "StatusCode")]
    status_code: u16,
    #[serde(rename = "FunctionError", default)]
    function_error: Option<String>,
}

impl AwsBackend {
    pub fn new(region: String) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .context("failed to initialise HTTP client")?;
        Ok(Self { region, http })
    }
}

impl DensityBackend for AwsBackend {
    fn invoke(&self, function: &str, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut payload_file = tempfile::NamedTempFile::new().context("create payload file")?;
        payload_file
            .write_all(payload)
            .and_then(|_| payload_file.flush())
            .context("write payload file")?;
        let response_file = tempfile::NamedTempFile::new().context("create response file")?;

        debug!(function, region = %self.region, bytes = payload.len(), "invoking");
        let out = Command::new(aws_bin())
            .args([
                "lambda",
                "invoke",
                "--function-name",
                function,
                "--region",
                self.region.as_str(),
                "--invocation-type",
                "RequestResponse",
                "--output",
                "json",
                "--payload",
            ])
            .arg(format!("fileb://{}", payload_file.path().display()))
            .arg(response_file.path())
            .stdin(Stdio::null())
            .output()
            .context("failed to spawn aws (is the AWS CLI installed?)")?;

        if !out.status.success() {
            return Err(CommandError::Transport {
                function: function.to_string(),
                reason: format!(
                    "aws exited with {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            }
            .into());
        }

        let body = std::fs::read(response_file.path()).context("read invocation response")?;
        let meta: InvokeMetadata = serde_json::from_slice(&out.stdout).with_context(|| {
            format!(
                "failed to parse aws output: {}",
                String::from_utf8_lossy(&out.stdout).trim()
            )
        })?;

        check_invocation(function, &meta, &body)?;
        Ok(body)
    }

    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        debug!(url, "fetching");
        let response = self
            .http
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        let body = response.bytes().with_context(|| format!("read body of {url}"))?;
        if status != reqwest::StatusCode::OK {
            return Err(anyhow!(
                "could not load json, server said {}",
                status.as_u16()
            ));
        }
        Ok(body.to_vec())
    }
}

fn check_invocation(function: &str, meta: &InvokeMetadata, body: &[u8]) -> Result<(), CommandError> {
    let body_text = String::from_utf8_lossy(body);
    if meta.status_code != 200 {
        error!("Error was: {body_text}");
        return Err(CommandError::Transport {
            function: function.to_string(),
            reason: format!("status {}: {}", meta.status_code, body_text.trim()),
        });
    }
    if let Some(kind) = &meta.function_error {
        error!("Error was: {body_text}");
        return Err(CommandError::Transport {
            function: function.to_string(),
            reason: format!("function error ({kind}): {}", body_text.trim()),
        });
    }
    Ok(())
}

pub fn make_backend(
    fixture: Option<PathBuf>,
    settings: &Settings,
) -> anyhow::Result<Box<dyn DensityBackend>> {
    if let Some(path) =
        fixture.or_else(|| std::env::var_os("UPDATE_DENSITIES_FIXTURE").map(Into::into))
    {
        return Ok(Box::new(crate::fixture::FixtureBackend::from_path(path)?));
    }

    Ok(Box::new(AwsBackend::new(settings.region.clone())?))
}
