use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Compact wire form of the published dataset.
///
/// `values` stays loosely typed down to the row itself: each row is decoded on
/// its own so one bad row (even a `null`) cannot sink the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityTable {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub prepared_at: Option<OffsetDateTime>,
    pub key: Vec<String>,
    pub values: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityRow {
    pub id: i64,
    pub name: String,
    pub normalised_name: String,
    pub density: f64,
}

/// A published snapshot identifier. Kept at full nanosecond precision since
/// revisions are addressed by their timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(#[serde(with = "time::serde::rfc3339")] pub OffsetDateTime);

impl Revision {
    pub fn to_rfc3339(&self) -> String {
        format_rfc3339(self.0)
    }
}

pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_table_without_prepared_at_parses() {
        let t: DensityTable = serde_json::from_str(
            r#"{"key":["id","name","normalised_name","density"],"values":[[1,"Flour","flour",0.59]]}"#,
        )
        .unwrap();
        assert!(t.prepared_at.is_none());
        assert_eq!(t.key.len(), 4);
        assert_eq!(t.values.len(), 1);
    }

    #[test]
    fn density_table_tolerates_malformed_rows() {
        let t: DensityTable = serde_json::from_str(
            r#"{"key":["id","name","normalised_name","density"],"values":[[1,"Flour","flour",0.59],null,"bad"]}"#,
        )
        .unwrap();
        assert_eq!(t.values.len(), 3);
        assert!(t.values[1].is_null());
    }

    #[test]
    fn revision_keeps_nanoseconds() {
        let r: Revision = serde_json::from_str(r#""2025-10-01T09:30:00.123456789Z""#).unwrap();
        assert_eq!(r.0.nanosecond(), 123_456_789);
        assert_eq!(r.to_rfc3339(), "2025-10-01T09:30:00.123456789Z");
    }
}
