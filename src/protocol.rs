//! Request and response shapes exchanged with the `update-density-data`
//! function. The discriminant strings are wire constants.

use crate::model::Revision;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Request {
    List,
    Update {
        #[serde(rename = "csvContent")]
        csv_content: ContentDescriptor,
    },
    Rollback {
        #[serde(rename = "toDate", with = "time::serde::rfc3339")]
        to_date: OffsetDateTime,
    },
}

impl Request {
    pub fn list() -> Self {
        Self::List
    }

    /// The timestamp must already be parsed; rejecting bad input is the
    /// caller's job, before anything is sent.
    pub fn rollback(to_date: OffsetDateTime) -> Self {
        Self::Rollback { to_date }
    }

    pub fn update(content: String) -> Self {
        Self::Update {
            csv_content: ContentDescriptor::Inline { content },
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Update { .. } => "update",
            Self::Rollback { .. } => "rollback",
        }
    }
}

/// Where the update CSV comes from. This tool only sends `Inline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentDescriptor {
    S3 { bucket: String, path: String },
    Inline { content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Outcome envelope shared by update and rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericResult {
    pub status: Status,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult {
    pub status: Status,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub current: Option<OffsetDateTime>,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

pub fn parse_generic_response(bytes: &[u8]) -> serde_json::Result<GenericResult> {
    serde_json::from_slice(bytes)
}

pub fn parse_list_response(bytes: &[u8]) -> serde_json::Result<ListResult> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn list_request_is_bare_tag() {
        assert_eq!(serde_json::to_value(Request::list()).unwrap(), json!({"mode": "list"}));
    }

    #[test]
    fn rollback_request_carries_rfc3339_date() {
        let req = Request::rollback(datetime!(2025-10-01 09:30:00.5 UTC));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"mode": "rollback", "toDate": "2025-10-01T09:30:00.5Z"})
        );
    }

    #[test]
    fn update_request_wraps_content_inline() {
        let req = Request::update("1,a,a,0.5\n".into());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "mode": "update",
                "csvContent": {"type": "inline", "content": "1,a,a,0.5\n"}
            })
        );
    }

    #[test]
    fn s3_descriptor_is_representable() {
        let req = Request::Update {
            csv_content: ContentDescriptor::S3 {
                bucket: "static-bucket".into(),
                path: "densities/upload.csv".into(),
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "mode": "update",
                "csvContent": {"type": "s3", "bucket": "static-bucket", "path": "densities/upload.csv"}
            })
        );
        let back: Request = serde_json::from_value(v).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn generic_response_distinguishes_null_and_empty_detail() {
        let r = parse_generic_response(br#"{"status":"error","detail":null}"#).unwrap();
        assert_eq!(r.status, Status::Error);
        assert_eq!(r.detail, None);

        let r = parse_generic_response(br#"{"status":"error","detail":""}"#).unwrap();
        assert_eq!(r.detail.as_deref(), Some(""));

        let r = parse_generic_response(br#"{"status":"ok"}"#).unwrap();
        assert_eq!(r.status, Status::Ok);
        assert_eq!(r.detail, None);
    }

    #[test]
    fn generic_response_rejects_garbage() {
        assert!(parse_generic_response(b"Internal Server Error").is_err());
        assert!(parse_generic_response(br#"{"status":"maybe"}"#).is_err());
    }

    #[test]
    fn list_response_preserves_order_and_precision() {
        let r = parse_list_response(
            br#"{
                "status": "ok",
                "current": "2025-10-02T08:00:00.000Z",
                "revisions": [
                    "2025-10-02T08:00:00.000000002Z",
                    "2025-09-01T12:00:00Z",
                    "2025-10-02T08:00:00.000000001Z"
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(r.current, Some(datetime!(2025-10-02 08:00:00 UTC)));
        let nanos: Vec<u32> = r.revisions.iter().map(|r| r.0.nanosecond()).collect();
        assert_eq!(nanos, vec![2, 0, 1]);
        assert_ne!(r.revisions[0], r.revisions[2]);
    }

    #[test]
    fn list_response_accepts_empty_state() {
        let r = parse_list_response(br#"{"status":"ok","current":null,"revisions":[]}"#).unwrap();
        assert_eq!(r.current, None);
        assert!(r.revisions.is_empty());
    }

    #[test]
    fn list_response_carries_error_detail() {
        let r = parse_list_response(br#"{"status":"error","detail":"Access Denied"}"#).unwrap();
        assert_eq!(r.status, Status::Error);
        assert_eq!(r.detail.as_deref(), Some("Access Denied"));
        assert!(r.revisions.is_empty());
    }
}
