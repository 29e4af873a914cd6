//! Cheap admission checks run before the expensive aggregation.
//!
//! The three checks run concurrently, but errors and rejections are always
//! reported in the fixed order milestones, commits, active authors.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use log::debug;

use super::counter::count_up_to;
use crate::error::{RepoLensError, Result};
use crate::models::{EligibilityVerdict, IneligibilityReason, RepositoryKey};
use crate::providers::{MilestoneState, PageRequest, RepositorySource, Resource};

const ACTIVE_SCAN_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub min_commits: u64,
    pub active_window_days: u32,
    pub min_active_contributors: usize,
    /// Pages of recent commits scanned at most before evaluating what was seen.
    pub active_scan_page_cap: u32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            min_commits: 100,
            active_window_days: 90,
            min_active_contributors: 3,
            active_scan_page_cap: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveAuthors {
    pub distinct: usize,
    pub reached: bool,
}

pub struct EligibilityGate<S: ?Sized> {
    source: Arc<S>,
}

impl<S> EligibilityGate<S>
where
    S: RepositorySource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub async fn check(
        &self,
        key: &RepositoryKey,
        policy: &EligibilityPolicy,
    ) -> Result<EligibilityVerdict> {
        let (milestones, commits, active) = tokio::join!(
            self.has_closed_milestone(key),
            count_up_to(
                &*self.source,
                key,
                Resource::Commits { since: None },
                policy.min_commits,
            ),
            self.active_authors(key, policy),
        );

        let verdict = reduce(policy, milestones, commits, active)?;
        debug!("{key} eligibility: {verdict:?}");
        Ok(verdict)
    }

    async fn has_closed_milestone(&self, key: &RepositoryKey) -> Result<bool> {
        let request = PageRequest::first(
            Resource::Milestones {
                state: MilestoneState::Closed,
            },
            1,
        );
        let page = self.source.list_page(key, &request).await?;

        Ok(!page.items.is_empty()
            || page.has_more()
            || page.last_page.is_some_and(|last| last > 1))
    }

    /// Counts distinct commit authors inside the activity window, keyed by
    /// account login or, for commits without an account, by author email.
    async fn active_authors(
        &self,
        key: &RepositoryKey,
        policy: &EligibilityPolicy,
    ) -> Result<ActiveAuthors> {
        let since = Utc::now() - Duration::days(i64::from(policy.active_window_days));
        let mut request = PageRequest::first(
            Resource::Commits { since: Some(since) },
            ACTIVE_SCAN_PAGE_SIZE,
        );
        let needed = policy.min_active_contributors;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages = 0;

        loop {
            let page = self.source.list_page(key, &request).await?;
            for item in page.items {
                let Some(identity) = item.login.or(item.email) else {
                    continue;
                };
                seen.insert(identity);
                if seen.len() >= needed {
                    return Ok(ActiveAuthors {
                        distinct: seen.len(),
                        reached: true,
                    });
                }
            }

            pages += 1;
            match page.next_page {
                Some(next) if pages < policy.active_scan_page_cap => request = request.at(next),
                Some(_) => {
                    debug!("{key} active author scan stopped after {pages} pages");
                    break;
                }
                None => break,
            }
        }

        Ok(ActiveAuthors {
            distinct: seen.len(),
            reached: seen.len() >= needed,
        })
    }
}

/// Folds the three check outcomes in priority order.
fn reduce(
    policy: &EligibilityPolicy,
    milestones: Result<bool>,
    commits: Result<u64>,
    active: Result<ActiveAuthors>,
) -> Result<EligibilityVerdict> {
    let has_closed = milestones.map_err(|e| RepoLensError::check("milestones", e))?;
    if !has_closed {
        return Ok(EligibilityVerdict::Ineligible(
            IneligibilityReason::NoClosedMilestones,
        ));
    }

    let commit_count = commits.map_err(|e| RepoLensError::check("commits", e))?;
    if commit_count < policy.min_commits {
        return Ok(EligibilityVerdict::Ineligible(
            IneligibilityReason::TooFewCommits {
                required: policy.min_commits,
                found: commit_count,
            },
        ));
    }

    let active = active.map_err(|e| RepoLensError::check("active contributors", e))?;
    if !active.reached {
        return Ok(EligibilityVerdict::Ineligible(
            IneligibilityReason::TooFewActiveContributors {
                required: policy.min_active_contributors,
                days: policy.active_window_days,
                found: active.distinct,
            },
        ));
    }

    Ok(EligibilityVerdict::Eligible)
}
