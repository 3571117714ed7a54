use crate::error::CommandError;
use crate::protocol::Request;
use crate::transport::DensityBackend;
use anyhow::{Context, anyhow};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Canned reply for one request mode.
#[derive(Debug, Clone, Deserialize)]
struct Invocation {
    #[serde(default = "default_status")]
    status_code: u16,
    /// A JSON string is sent back as raw text, anything else as JSON.
    payload: Value,
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FixtureData {
    #[serde(default)]
    invocations: HashMap<String, Invocation>,
    #[serde(default)]
    documents: HashMap<String, Value>,
}

/// Offline backend: replies to each request mode and serves documents by URL
/// from a JSON file.
#[derive(Debug)]
pub struct FixtureBackend {
    data: FixtureData,
}

impl FixtureBackend {
    pub fn from_path(path: PathBuf) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("read fixture file {}", path.display()))?;
        Self::from_str(&data).with_context(|| format!("parse fixture {}", path.display()))
    }

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let data: FixtureData = serde_json::from_str(s).context("invalid fixture JSON")?;
        Ok(Self { data })
    }
}

fn body_bytes(v: &Value) -> anyhow::Result<Vec<u8>> {
    match v {
        Value::String(raw) => Ok(raw.clone().into_bytes()),
        other => Ok(serde_json::to_vec(other)?),
    }
}

impl DensityBackend for FixtureBackend {
    fn invoke(&self, function: &str, payload: &[u8]) -> anyhow::Result<Vec<u8>> {
        let request: Request =
            serde_json::from_slice(payload).context("fixture received an invalid request")?;
        let reply = self
            .data
            .invocations
            .get(request.mode())
            .ok_or_else(|| anyhow!("fixture has no reply for mode {:?}", request.mode()))?;
        let body = body_bytes(&reply.payload)?;
        if reply.status_code != 200 {
            return Err(CommandError::Transport {
                function: function.to_string(),
                reason: format!(
                    "status {}: {}",
                    reply.status_code,
                    String::from_utf8_lossy(&body)
                ),
            }
            .into());
        }
        Ok(body)
    }

    fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        match self.data.documents.get(url) {
            Some(doc) => body_bytes(doc),
            None => Err(anyhow!("could not load json, server said 404")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
{
  "invocations": {
    "list": {"payload": {"status": "ok", "current": null, "revisions": []}},
    "rollback": {"status_code": 502, "payload": "Bad Gateway"}
  },
  "documents": {
    "https://example.test/densities/latest/densities.json": {"key": ["id"], "values": []}
  }
}
"#;

    #[test]
    fn fixture_replies_per_mode() {
        let backend = FixtureBackend::from_str(FIXTURE).unwrap();
        let body = backend
            .invoke("update-density-data-CODE", br#"{"mode":"list"}"#)
            .unwrap();
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "ok");
    }

    #[test]
    fn fixture_surfaces_non_200_as_transport_error() {
        let backend = FixtureBackend::from_str(FIXTURE).unwrap();
        let err = backend
            .invoke(
                "update-density-data-CODE",
                br#"{"mode":"rollback","toDate":"2025-10-01T00:00:00Z"}"#,
            )
            .unwrap_err();
        assert!(err.to_string().contains("status 502: Bad Gateway"));
    }

    #[test]
    fn fixture_missing_mode_is_an_error() {
        let backend = FixtureBackend::from_str(FIXTURE).unwrap();
        let err = backend
            .invoke(
                "update-density-data-CODE",
                br#"{"mode":"update","csvContent":{"type":"inline","content":"x"}}"#,
            )
            .unwrap_err();
        assert!(err.to_string().contains("no reply for mode \"update\""));
    }

    #[test]
    fn fixture_serves_documents_by_url() {
        let backend = FixtureBackend::from_str(FIXTURE).unwrap();
        assert!(
            backend
                .fetch("https://example.test/densities/latest/densities.json")
                .is_ok()
        );
        let err = backend.fetch("https://example.test/other").unwrap_err();
        assert_eq!(err.to_string(), "could not load json, server said 404");
    }
}
