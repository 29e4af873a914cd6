use std::sync::Arc;

use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::Semaphore;

use crate::error::{RepoLensError, Result};
use crate::models::{ContributorProfile, RepositoryKey};
use crate::providers::{PageRequest, RepositorySource, Resource};

/// Simultaneous profile lookups per repository.
pub const PROFILE_CONCURRENCY: usize = 8;

const ROSTER_PAGE_SIZE: u32 = 100;

/// Profiles in roster order, failed lookups included.
#[derive(Debug, Default)]
pub struct ResolvedProfiles {
    pub profiles: Vec<ContributorProfile>,
}

impl ResolvedProfiles {
    pub fn all_failed(&self) -> bool {
        !self.profiles.is_empty() && self.profiles.iter().all(ContributorProfile::is_error)
    }

    pub fn into_result(self) -> Result<Vec<ContributorProfile>> {
        if self.all_failed() {
            return Err(RepoLensError::AllProfilesFailed(self.profiles.len()));
        }
        Ok(self.profiles)
    }
}

pub struct ContributorResolver<S: ?Sized> {
    source: Arc<S>,
}

impl<S> ContributorResolver<S>
where
    S: RepositorySource + ?Sized,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Follows the roster's next-page links until exhausted. Any page error
    /// aborts the listing.
    pub async fn list_logins(&self, key: &RepositoryKey) -> Result<Vec<String>> {
        let mut request = PageRequest::first(Resource::Contributors, ROSTER_PAGE_SIZE);
        let mut logins = Vec::new();

        loop {
            let page = self.source.list_page(key, &request).await?;
            logins.extend(page.items.into_iter().filter_map(|item| item.login));

            match page.next_page {
                Some(next) => request = request.at(next),
                None => break,
            }
        }

        debug!("{key}: {} contributors listed", logins.len());
        Ok(logins)
    }

    /// Looks up every login, at most `PROFILE_CONCURRENCY` at a time per call.
    /// A failed lookup is recorded on its own entry and does not affect the
    /// others.
    pub async fn fetch_profiles(&self, logins: &[String]) -> ResolvedProfiles {
        let semaphore = Semaphore::new(PROFILE_CONCURRENCY);
        let lookups = logins
            .iter()
            .map(|login| self.fetch_profile(&semaphore, login));
        // join_all yields in input order, so slot i always belongs to logins[i].
        let profiles = join_all(lookups).await;

        let failed = profiles.iter().filter(|p| p.is_error()).count();
        if failed > 0 {
            warn!("{failed} of {} contributor lookups failed", profiles.len());
        }

        ResolvedProfiles { profiles }
    }

    async fn fetch_profile(&self, semaphore: &Semaphore, login: &str) -> ContributorProfile {
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => return ContributorProfile::failed(login, e.to_string()),
        };

        match self.source.user(login).await {
            Ok(profile) => profile,
            Err(e) => {
                debug!("profile lookup for {login} failed: {e}");
                ContributorProfile::failed(login, e.to_string())
            }
        }
    }
}
