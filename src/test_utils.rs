//! In-memory `RepositorySource` that paginates like GitHub and records calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RepoLensError, Result};
use crate::models::{ContributorProfile, RepositoryAttributes, RepositoryKey};
use crate::providers::{
    ListedItem, MilestoneState, Page, PageRequest, RepositorySource, Resource,
};

#[derive(Debug, Clone)]
pub enum Listing {
    Items(Vec<ListedItem>),
    /// Every page is full and advertises a next page.
    Unbounded,
    Fail(String),
}

impl Listing {
    pub fn anonymous(count: usize) -> Self {
        Self::Items(vec![ListedItem::default(); count])
    }

    pub fn logins(logins: &[&str]) -> Self {
        Self::Items(
            logins
                .iter()
                .map(|l| ListedItem {
                    login: Some((*l).to_string()),
                    email: None,
                })
                .collect(),
        )
    }

    fn page(&self, page: u32, per_page: u32) -> Result<Page> {
        match self {
            Self::Fail(message) => Err(RepoLensError::Api(message.clone())),
            Self::Unbounded => Ok(Page {
                items: vec![ListedItem::default(); per_page as usize],
                next_page: Some(page + 1),
                last_page: None,
            }),
            Self::Items(items) => {
                let per_page = per_page.max(1) as usize;
                let pages = items.len().div_ceil(per_page).max(1);
                let start = (page as usize - 1) * per_page;
                let slice = items
                    .iter()
                    .skip(start)
                    .take(per_page)
                    .cloned()
                    .collect();
                let more = (page as usize) < pages;
                #[allow(clippy::cast_possible_truncation)]
                let last = pages as u32;
                Ok(Page {
                    items: slice,
                    next_page: more.then_some(page + 1),
                    last_page: more.then_some(last),
                })
            }
        }
    }
}

pub struct StubSource {
    pub repository: std::result::Result<RepositoryAttributes, String>,
    pub commits: Listing,
    /// Served for commit listings filtered by `since`.
    pub recent_commits: Listing,
    pub open_milestones: Listing,
    pub closed_milestones: Listing,
    pub contributors: Listing,
    /// Logins missing here resolve to an otherwise empty profile.
    pub users: HashMap<String, std::result::Result<ContributorProfile, String>>,
    pub user_delays: HashMap<String, Duration>,
    pub list_delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl StubSource {
    /// A repository that passes the default eligibility policy.
    pub fn healthy() -> Self {
        Self {
            repository: Ok(RepositoryAttributes {
                description: "stub".to_string(),
                stars: 10,
                ..RepositoryAttributes::default()
            }),
            commits: Listing::anonymous(250),
            recent_commits: Listing::logins(&["a", "b", "c"]),
            open_milestones: Listing::anonymous(2),
            closed_milestones: Listing::anonymous(3),
            contributors: Listing::logins(&["x", "y", "z"]),
            users: HashMap::new(),
            user_delays: HashMap::new(),
            list_delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| *c == name).count()
    }

    pub fn calls_with_prefix(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn peak_user_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl RepositorySource for StubSource {
    async fn repository(&self, _key: &RepositoryKey) -> Result<RepositoryAttributes> {
        self.record("repository".to_string());
        self.repository.clone().map_err(RepoLensError::Api)
    }

    async fn list_page(&self, _key: &RepositoryKey, request: &PageRequest) -> Result<Page> {
        let (name, listing) = match request.resource {
            Resource::Commits { since: None } => ("commits", &self.commits),
            Resource::Commits { since: Some(_) } => ("commits:since", &self.recent_commits),
            Resource::Milestones {
                state: MilestoneState::Open,
            } => ("milestones:open", &self.open_milestones),
            Resource::Milestones {
                state: MilestoneState::Closed,
            } => ("milestones:closed", &self.closed_milestones),
            Resource::Contributors => ("contributors", &self.contributors),
        };
        self.record(name.to_string());
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        listing.page(request.page, request.per_page)
    }

    async fn user(&self, login: &str) -> Result<ContributorProfile> {
        self.record(format!("user:{login}"));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = self
            .user_delays
            .get(login)
            .copied()
            .unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.users.get(login) {
            Some(Ok(profile)) => Ok(profile.clone()),
            Some(Err(message)) => Err(RepoLensError::Api(message.clone())),
            None => Ok(ContributorProfile {
                login: login.to_string(),
                ..ContributorProfile::default()
            }),
        }
    }
}

pub fn key(owner: &str, name: &str) -> RepositoryKey {
    RepositoryKey::new(owner, name).expect("valid test key")
}
