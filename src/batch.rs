use std::borrow::Cow;
use std::io::{Read, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use log::{debug, info};

use crate::error::{RepoLensError, Result};
use crate::extraction::Dispatcher;
use crate::models::{AggregateResult, Extraction, RepositoryKey};

const CSV_HEADERS: [&str; 18] = [
    "Owner",
    "Repo",
    "Description",
    "Stars",
    "Forks",
    "OpenIssues",
    "Language",
    "CreatedAt",
    "UpdatedAt",
    "Commits",
    "Milestones",
    "Size",
    "Watchers",
    "HasIssues",
    "HasWiki",
    "DefaultBranch",
    "License",
    "Error",
];

/// Reads repository keys from CSV with an `owner,repo` header. Columns after
/// the first two are ignored.
pub fn read_keys<R: Read>(input: R) -> Result<Vec<RepositoryKey>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?;
    if headers.is_empty() {
        return Err(RepoLensError::Input("CSV input is empty".to_string()));
    }
    if headers.get(0) != Some("owner") || headers.get(1) != Some("repo") {
        return Err(RepoLensError::Input(
            "invalid CSV headers: expected 'owner,repo'".to_string(),
        ));
    }

    let mut keys = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(index as u64 + 2, |p| p.line());

        let (Some(owner), Some(name)) = (record.get(0), record.get(1)) else {
            return Err(RepoLensError::Input(format!(
                "invalid record at line {line}: not enough columns"
            )));
        };
        let key = RepositoryKey::new(owner, name)
            .map_err(|e| RepoLensError::Input(format!("invalid record at line {line}: {e}")))?;
        keys.push(key);
    }

    if keys.is_empty() {
        return Err(RepoLensError::Input(
            "CSV input has no data rows".to_string(),
        ));
    }

    Ok(keys)
}

/// Submits every key from its own concurrent caller and returns the outcomes
/// in input order.
pub async fn extract_all(
    dispatcher: &Dispatcher,
    keys: Vec<RepositoryKey>,
) -> Result<Vec<Extraction>> {
    info!(
        "Submitting {} repositories to {} workers",
        keys.len(),
        dispatcher.worker_count()
    );

    let jobs = keys.into_iter().map(|key| async move {
        let ticket = dispatcher.enqueue(key).await?;
        debug!("{} queued", ticket.key());
        ticket.wait().await
    });

    join_all(jobs).await.into_iter().collect()
}

pub fn write_csv<W: Write>(output: W, outcomes: &[Extraction]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(CSV_HEADERS)?;

    for outcome in outcomes {
        writer.write_record(csv_row(outcome).as_slice())?;
    }

    writer.flush()?;
    Ok(())
}

fn csv_row(outcome: &Extraction) -> Vec<String> {
    let result = match outcome {
        Extraction::Completed(result) => Cow::Borrowed(result),
        Extraction::Rejected { key, reason } => Cow::Owned(AggregateResult::failed(
            key.clone(),
            format!("ineligible: {reason}"),
        )),
        Extraction::CheckFailed { key, error } => {
            Cow::Owned(AggregateResult::failed(key.clone(), error.clone()))
        }
    };

    let attributes = &result.attributes;
    let license = if attributes.license.is_empty() {
        "None".to_string()
    } else {
        attributes.license.clone()
    };

    vec![
        result.key.owner().to_string(),
        result.key.name().to_string(),
        attributes.description.clone(),
        attributes.stars.to_string(),
        attributes.forks.to_string(),
        attributes.open_issues.to_string(),
        attributes.language.clone(),
        rfc3339(&attributes.created_at),
        rfc3339(&attributes.updated_at),
        result.commits.to_string(),
        result.milestones.to_string(),
        attributes.size.to_string(),
        attributes.watchers.to_string(),
        attributes.has_issues.to_string(),
        attributes.has_wiki.to_string(),
        attributes.default_branch.clone(),
        license,
        result.error.clone().unwrap_or_default(),
    ]
}

fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
