use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::IgnoredAny;
use url::Url;

use super::pagination::parse_link_header;
use super::types::{AccountDto, CommitDto, RepositoryDto, UserDto};
use crate::auth::Token;
use crate::error::{RepoLensError, Result};
use crate::models::{ContributorProfile, RepositoryAttributes, RepositoryKey};
use crate::providers::{ListedItem, Page, PageRequest, RepositorySource, Resource};

pub const DEFAULT_API_URL: &str = "https://api.github.com/";

const GITHUB_JSON: &str = "application/vnd.github+json";

pub struct GitHubClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<Token>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("repolens/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| RepoLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(base_url)
            .map_err(|e| RepoLensError::Config(format!("Invalid base URL: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(RepoLensError::Config(format!(
                "Invalid base URL: {base_url} cannot be a base"
            )));
        }

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, GITHUB_JSON);
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Appends percent-encoded path segments to the API base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| RepoLensError::Config(format!("Invalid API URL: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.auth_request(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RepoLensError::Api(format!("{status} - {body}")));
        }

        Ok(response)
    }

    fn repo_url(&self, key: &RepositoryKey, resource: Option<&str>) -> Result<Url> {
        match resource {
            Some(resource) => self.endpoint(&["repos", key.owner(), key.name(), resource]),
            None => self.endpoint(&["repos", key.owner(), key.name()]),
        }
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn repository(&self, key: &RepositoryKey) -> Result<RepositoryAttributes> {
        let url = self.repo_url(key, None)?;
        let response = self.send(self.client.get(url)).await?;
        let repository = response.json::<RepositoryDto>().await?;
        Ok(repository.into())
    }

    async fn list_page(&self, key: &RepositoryKey, request: &PageRequest) -> Result<Page> {
        let url = self.repo_url(key, Some(request.resource.label()))?;

        let mut builder = self
            .client
            .get(url)
            .query(&[("page", request.page), ("per_page", request.per_page)]);
        match request.resource {
            Resource::Commits { since: Some(since) } => {
                builder = builder.query(&[("since", since.to_rfc3339())]);
            }
            Resource::Milestones { state } => {
                builder = builder.query(&[("state", state.as_str())]);
            }
            Resource::Commits { since: None } | Resource::Contributors => {}
        }
        let response = self.send(builder).await?;
        let links = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(parse_link_header)
            .unwrap_or_default();

        let items: Vec<ListedItem> = match request.resource {
            Resource::Commits { .. } => response
                .json::<Vec<CommitDto>>()
                .await?
                .into_iter()
                .map(ListedItem::from)
                .collect(),
            Resource::Contributors => response
                .json::<Vec<AccountDto>>()
                .await?
                .into_iter()
                .map(ListedItem::from)
                .collect(),
            Resource::Milestones { .. } => response
                .json::<Vec<IgnoredAny>>()
                .await?
                .into_iter()
                .map(|_| ListedItem::default())
                .collect(),
        };

        debug!(
            "{key} {} page {}: {} items (next: {:?}, last: {:?})",
            request.resource.label(),
            request.page,
            items.len(),
            links.next,
            links.last
        );

        Ok(Page {
            items,
            next_page: links.next,
            last_page: links.last,
        })
    }

    async fn user(&self, login: &str) -> Result<ContributorProfile> {
        let url = self.endpoint(&["users", login])?;
        let response = self.send(self.client.get(url)).await?;
        let user = response.json::<UserDto>().await?;
        Ok(user.into_profile(login))
    }
}
