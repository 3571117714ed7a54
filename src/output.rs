use crate::config::Stage;
use crate::model::{Revision, format_rfc3339};
use crate::protocol::ListResult;
use crate::tables::{self, TableRow};
use comfy_table::Cell;
use serde::Serialize;
use std::fmt::Write as _;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

struct RevisionRow {
    revision: String,
    url: String,
}

impl TableRow for RevisionRow {
    const HEADERS: &'static [&'static str] = &["Revision", "URL"];
    fn cells(&self) -> Vec<Cell> {
        vec![Cell::new(&self.revision), Cell::new(&self.url)]
    }
}

/// e.g. `Thursday, 02-Oct-25 08:00:00 UTC`
fn human_date(ts: OffsetDateTime) -> String {
    let fmt = format_description!(
        "[weekday], [day]-[month repr:short]-[year repr:last_two] [hour]:[minute]:[second] UTC"
    );
    let utc = ts.to_offset(UtcOffset::UTC);
    utc.format(&fmt).unwrap_or_else(|_| format_rfc3339(utc))
}

/// Text form of a listing. Revisions stay in the order the server sent them.
pub fn render_listing(
    listing: &ListResult,
    stage: &Stage,
    width: Option<u16>,
    color: bool,
) -> String {
    let mut out = String::new();
    match listing.current {
        Some(current) => {
            let _ = writeln!(
                out,
                "The current version is {} (prepared {})",
                format_rfc3339(current),
                human_date(current)
            );
        }
        None => out.push_str("There is no current version published.\n"),
    }
    let _ = writeln!(out, "{}\n", stage.document_url("latest"));

    if listing.revisions.is_empty() {
        out.push_str("No other versions have been uploaded.\n");
        return out;
    }

    out.push_str("Other versions uploaded are:\n");
    let rows = listing
        .revisions
        .iter()
        .map(|r| {
            let revision = r.to_rfc3339();
            RevisionRow {
                url: stage.document_url(&revision),
                revision,
            }
        })
        .collect();
    out.push_str(&tables::table_string(rows, width, color));
    out.push('\n');
    out
}

#[derive(Debug, Serialize)]
pub struct ListingJson {
    pub current: Option<Revision>,
    pub latest_url: String,
    pub revisions: Vec<RevisionJson>,
}

#[derive(Debug, Serialize)]
pub struct RevisionJson {
    pub revision: Revision,
    pub url: String,
}

impl ListingJson {
    pub fn new(listing: &ListResult, stage: &Stage) -> Self {
        Self {
            current: listing.current.map(Revision),
            latest_url: stage.document_url("latest"),
            revisions: listing
                .revisions
                .iter()
                .map(|r| RevisionJson {
                    revision: *r,
                    url: stage.document_url(&r.to_rfc3339()),
                })
                .collect(),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
