pub mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{ContributorProfile, RepositoryAttributes, RepositoryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneState {
    Open,
    Closed,
}

impl MilestoneState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// A paginated collection under a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Commits { since: Option<DateTime<Utc>> },
    Milestones { state: MilestoneState },
    Contributors,
}

impl Resource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Commits { .. } => "commits",
            Self::Milestones { .. } => "milestones",
            Self::Contributors => "contributors",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub resource: Resource,
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn first(resource: Resource, per_page: u32) -> Self {
        Self {
            resource,
            page: 1,
            per_page,
        }
    }

    pub fn at(self, page: u32) -> Self {
        Self { page, ..self }
    }
}

/// Identity fields of a listed item: the author for commits, the account
/// for contributors, nothing for milestones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListedItem {
    pub login: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<ListedItem>,
    pub next_page: Option<u32>,
    pub last_page: Option<u32>,
}

impl Page {
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Remote data source capability. Built once and shared by handle.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn repository(&self, key: &RepositoryKey) -> Result<RepositoryAttributes>;

    async fn list_page(&self, key: &RepositoryKey, request: &PageRequest) -> Result<Page>;

    async fn user(&self, login: &str) -> Result<ContributorProfile>;
}
