use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{RepoLensError, Result};

/// Identifies one target repository. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepositoryKey {
    owner: String,
    #[serde(rename = "repo")]
    name: String,
}

impl RepositoryKey {
    pub fn new(owner: &str, name: &str) -> Result<Self> {
        let owner = owner.trim();
        let name = name.trim();

        if owner.is_empty() {
            return Err(RepoLensError::InvalidKey(
                "owner must not be empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(RepoLensError::InvalidKey(format!(
                "repository name must not be empty (owner '{owner}')"
            )));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryKey {
    type Err = RepoLensError;

    fn from_str(s: &str) -> Result<Self> {
        let (owner, name) = s.split_once('/').ok_or_else(|| {
            RepoLensError::InvalidKey(format!("expected 'owner/name', got '{s}'"))
        })?;
        if name.contains('/') {
            return Err(RepoLensError::InvalidKey(format!(
                "expected 'owner/name', got '{s}'"
            )));
        }
        Self::new(owner, name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepositoryAttributes {
    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub language: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub default_branch: String,
    pub license: String,
    pub has_issues: bool,
    pub has_wiki: bool,
}

/// Public profile of one contributor. A failed lookup keeps the login and
/// records the failure in `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContributorProfile {
    pub login: String,
    pub id: u64,
    pub node_id: String,
    pub avatar_url: String,
    pub html_url: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub site_admin: bool,
    pub name: String,
    pub company: String,
    pub blog: String,
    pub location: String,
    pub email: String,
    pub hireable: bool,
    pub bio: String,
    pub twitter_username: String,
    pub public_repos: u64,
    pub public_gists: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContributorProfile {
    pub fn failed(login: &str, error: String) -> Self {
        Self {
            login: login.to_string(),
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything collected for one repository. `error` holds the first
/// sub-fetch failure; the other fields stay independent of each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    #[serde(flatten)]
    pub key: RepositoryKey,
    #[serde(flatten)]
    pub attributes: RepositoryAttributes,
    pub commits: u64,
    pub milestones: u64,
    pub contributors: Vec<ContributorProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregateResult {
    pub fn new(key: RepositoryKey, attributes: RepositoryAttributes) -> Self {
        Self {
            key,
            attributes,
            commits: 0,
            milestones: 0,
            contributors: Vec::new(),
            error: None,
        }
    }

    pub fn failed(key: RepositoryKey, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(key, RepositoryAttributes::default())
        }
    }

    /// Records `error` unless an earlier failure already holds the slot.
    pub fn record_error(&mut self, error: String) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IneligibilityReason {
    NoClosedMilestones,
    TooFewCommits {
        required: u64,
        found: u64,
    },
    TooFewActiveContributors {
        required: usize,
        days: u32,
        found: usize,
    },
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoClosedMilestones => {
                write!(f, "repository does not have at least 1 closed milestone")
            }
            Self::TooFewCommits { required, found } => write!(
                f,
                "repository has fewer than {required} commits (found {found})"
            ),
            Self::TooFewActiveContributors {
                required,
                days,
                found,
            } => write!(
                f,
                "fewer than {required} active contributors in the last {days} days (found {found})"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EligibilityVerdict {
    Eligible,
    Ineligible(IneligibilityReason),
}

/// What a worker hands back for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Extraction {
    Completed(AggregateResult),
    Rejected {
        #[serde(flatten)]
        key: RepositoryKey,
        reason: String,
    },
    CheckFailed {
        #[serde(flatten)]
        key: RepositoryKey,
        error: String,
    },
}

impl Extraction {
    pub fn key(&self) -> &RepositoryKey {
        match self {
            Self::Completed(result) => &result.key,
            Self::Rejected { key, .. } | Self::CheckFailed { key, .. } => key,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub repositories: Vec<Extraction>,
    pub total_count: usize,
}
