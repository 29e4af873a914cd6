use std::sync::Arc;

use log::{debug, warn};

use super::contributors::ContributorResolver;
use super::counter::count_items;
use crate::error::Result;
use crate::models::{AggregateResult, RepositoryKey};
use crate::providers::{MilestoneState, RepositorySource, Resource};

/// Fans out the per-repository sub-fetches and merges whatever succeeded.
///
/// Sub-fetch failures never abort the aggregation. The first failure in the
/// fixed order commits, milestones, contributors, contributor details is kept
/// in `AggregateResult::error`; later ones only leave their field at zero.
pub struct Aggregator<S: ?Sized> {
    source: Arc<S>,
    contributors: ContributorResolver<S>,
}

impl<S> Aggregator<S>
where
    S: RepositorySource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self {
            contributors: ContributorResolver::new(Arc::clone(&source)),
            source,
        }
    }

    pub async fn aggregate(&self, key: RepositoryKey) -> AggregateResult {
        let base = self.lookup(key).await;
        if base.error.is_some() {
            return base;
        }
        self.collect(base).await
    }

    /// Fetches the repository attributes. A result that carries an error is
    /// final and must not be passed on to [`Aggregator::collect`].
    pub async fn lookup(&self, key: RepositoryKey) -> AggregateResult {
        match self.source.repository(&key).await {
            Ok(attributes) => AggregateResult::new(key, attributes),
            Err(e) => {
                warn!("{key}: repository lookup failed: {e}");
                AggregateResult::failed(key, format!("Failed to fetch repository: {e}"))
            }
        }
    }

    pub async fn collect(&self, mut result: AggregateResult) -> AggregateResult {
        let key = result.key.clone();

        let (commits, milestones, logins) = tokio::join!(
            count_items(&*self.source, &key, Resource::Commits { since: None }),
            self.count_milestones(&key),
            self.contributors.list_logins(&key),
        );

        match commits {
            Ok(count) => result.commits = count,
            Err(e) => {
                warn!("{key}: commit count failed: {e}");
                result.record_error(format!("Failed to fetch commits: {e}"));
            }
        }

        match milestones {
            Ok(count) => result.milestones = count,
            Err(e) => {
                warn!("{key}: milestone count failed: {e}");
                result.record_error(format!("Failed to fetch milestones: {e}"));
            }
        }

        let logins = match logins {
            Ok(logins) => logins,
            Err(e) => {
                warn!("{key}: contributor listing failed: {e}");
                result.record_error(format!("Failed to fetch contributors: {e}"));
                return result;
            }
        };

        match self.contributors.fetch_profiles(&logins).await.into_result() {
            Ok(profiles) => result.contributors = profiles,
            Err(e) => {
                warn!("{key}: contributor details failed: {e}");
                result.record_error(format!("Failed to fetch contributor details: {e}"));
            }
        }

        debug!(
            "{key}: {} commits, {} milestones, {} contributors",
            result.commits,
            result.milestones,
            result.contributors.len()
        );
        result
    }

    async fn count_milestones(&self, key: &RepositoryKey) -> Result<u64> {
        let (open, closed) = tokio::try_join!(
            count_items(
                &*self.source,
                key,
                Resource::Milestones {
                    state: MilestoneState::Open
                }
            ),
            count_items(
                &*self.source,
                key,
                Resource::Milestones {
                    state: MilestoneState::Closed
                }
            ),
        )?;
        Ok(open + closed)
    }
}
