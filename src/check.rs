//! Local pre-flight for an update file: the same row rules the publishing
//! function applies, so a bad upload can be caught before it is sent.

use tracing::{info, warn};

#[derive(Debug, Default, PartialEq)]
pub struct CheckReport {
    pub rows: usize,
    pub header_skipped: bool,
    /// Zero-based record index and reason.
    pub failures: Vec<(usize, String)>,
}

impl CheckReport {
    pub fn is_publishable(&self) -> bool {
        self.rows > 0 && self.failures.is_empty()
    }
}

/// Reads the longest numeric prefix of `s`, the way the publishing function
/// reads a density: `"0.83g"` is 0.83, `"Infinity"` is infinite and anything
/// without a leading number is NaN.
fn leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

/// The id column is never rejected: the publishing function reads whatever
/// integer prefix it can and carries on. Only a short row or a density with
/// no leading number fails.
fn check_record(record: &csv::StringRecord) -> Result<(), String> {
    if record.len() < 4 {
        return Err(format!(
            "row did not have enough entries, expected at least 4, got {}",
            record.len()
        ));
    }
    if record.len() > 5 {
        warn!("got more columns than expected on input data, extras will be ignored");
    }
    if leading_float(&record[3]).is_nan() {
        return Err(format!(
            "row was not in the right format, density {:?} was not a number",
            &record[3]
        ));
    }
    Ok(())
}

/// Validates density CSV text. A failing first record is taken to be a header.
pub fn check_csv(text: &str) -> anyhow::Result<CheckReport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut report = CheckReport::default();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        match check_record(&record) {
            Ok(()) => report.rows += 1,
            Err(_) if idx == 0 => {
                info!("Skipping possible header row {:?}", record.iter().collect::<Vec<_>>());
                report.header_skipped = true;
            }
            Err(reason) => {
                warn!("Could not parse row {idx}: {reason}");
                report.failures.push((idx, reason));
            }
        }
    }
    Ok(report)
}
