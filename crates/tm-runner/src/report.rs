//! Result reporting: console table, JSON summaries and concourse notifications

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use tracing::info;

use tm_common::Error;

use crate::run::{Run, RunList};

/// File name concourse picks notifications up from
pub const NOTIFICATION_FILE: &str = "notify.cfg";

const TABLE_HEADERS: [&str; 4] = ["NAME", "PHASE", "DURATION", "ERROR"];

fn row(run: Option<&Run>) -> Vec<String> {
    let Some(run) = run else {
        return vec!["-".into(), "-".into(), "-".into(), "execution aborted".into()];
    };
    let duration = run
        .testrun
        .status
        .as_ref()
        .and_then(|s| s.duration)
        .map(|d| format!("{}s", d))
        .unwrap_or_else(|| "-".to_string());
    vec![
        run.testrun.name_any(),
        run.testrun.phase().to_string(),
        duration,
        run.error.as_ref().map(ToString::to_string).unwrap_or_default(),
    ]
}

/// Column-aligned table with one row per run slot
pub fn render_table<'a>(runs: impl IntoIterator<Item = Option<&'a Run>>) -> String {
    let rows: Vec<Vec<String>> = runs.into_iter().map(row).collect();

    let mut widths: Vec<usize> = TABLE_HEADERS.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = format_line(TABLE_HEADERS.iter().copied(), &widths);
    for row in &rows {
        out.push('\n');
        out.push_str(&format_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn io_error(path: &Path, e: std::io::Error) -> Error {
    Error::internal_with_context("io", format!("{}: {}", path.display(), e))
}

/// Write every summary of the list as one JSON object per line
///
/// Returns the number of records written.
pub fn write_summaries(path: &Path, runs: &RunList) -> Result<usize, Error> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);

    let summaries = runs.summaries();
    for summary in &summaries {
        serde_json::to_writer(&mut writer, summary)?;
        writer.write_all(b"\n").map_err(|e| io_error(path, e))?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;

    info!(path = %path.display(), records = summaries.len(), "wrote summaries");
    Ok(summaries.len())
}

/// Notification picked up by concourse to send a mail
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NotificationConfig {
    pub email: Email,
}

/// Mail content of a notification
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Email {
    pub subject: String,
    pub recipients: Vec<String>,
    pub mail_body: String,
}

impl NotificationConfig {
    /// Notification listing every unsuccessful run of the list
    pub fn for_failures(runs: &RunList, recipients: &[String]) -> Self {
        let failed: Vec<&Run> = runs.unsuccessful().collect();
        let mut body = format!(
            "{} of {} testruns did not succeed.\n\n",
            failed.len(),
            runs.len()
        );
        for run in &failed {
            body.push_str(&format!("* {} ({})", run.testrun.name_any(), run.testrun.phase()));
            if let Some(err) = &run.error {
                body.push_str(&format!(": {}", err));
            }
            body.push('\n');
        }
        body.push('\n');
        body.push_str(&render_table(runs.iter()));
        body.push('\n');

        Self {
            email: Email {
                subject: format!("Testrunner: {} testruns failed", failed.len()),
                recipients: recipients.to_vec(),
                mail_body: body,
            },
        }
    }
}

/// Write `notify.cfg` into `dir` when any run was unsuccessful
///
/// Returns the written path, `None` if every run succeeded.
pub fn write_notification(
    dir: &Path,
    runs: &RunList,
    recipients: &[String],
) -> Result<Option<PathBuf>, Error> {
    if runs.unsuccessful().next().is_none() && !runs.iter().any(|r| r.is_none()) {
        return Ok(None);
    }
    let config = NotificationConfig::for_failures(runs, recipients);
    let path = dir.join(NOTIFICATION_FILE);
    let raw = serde_yaml::to_string(&config)?;
    std::fs::write(&path, raw).map_err(|e| io_error(&path, e))?;
    info!(path = %path.display(), "wrote notification");
    Ok(Some(path))
}
