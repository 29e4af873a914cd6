use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{ContributorProfile, RepositoryAttributes};
use crate::providers::ListedItem;

// GitHub may omit or null any of these; every field is optional on the wire
// and defaulted on conversion.

#[derive(Debug, Deserialize)]
pub struct LicenseDto {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryDto {
    pub description: Option<String>,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub watchers_count: Option<u64>,
    pub open_issues_count: Option<u64>,
    pub language: Option<String>,
    pub size: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub default_branch: Option<String>,
    pub license: Option<LicenseDto>,
    pub has_issues: Option<bool>,
    pub has_wiki: Option<bool>,
}

impl From<RepositoryDto> for RepositoryAttributes {
    fn from(dto: RepositoryDto) -> Self {
        Self {
            description: dto.description.unwrap_or_default(),
            stars: dto.stargazers_count.unwrap_or_default(),
            forks: dto.forks_count.unwrap_or_default(),
            watchers: dto.watchers_count.unwrap_or_default(),
            open_issues: dto.open_issues_count.unwrap_or_default(),
            language: dto.language.unwrap_or_default(),
            size: dto.size.unwrap_or_default(),
            created_at: dto.created_at.unwrap_or_default(),
            updated_at: dto.updated_at.unwrap_or_default(),
            default_branch: dto.default_branch.unwrap_or_default(),
            license: dto.license.and_then(|l| l.name).unwrap_or_default(),
            has_issues: dto.has_issues.unwrap_or_default(),
            has_wiki: dto.has_wiki.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountDto {
    pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GitAuthorDto {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetailDto {
    pub author: Option<GitAuthorDto>,
}

#[derive(Debug, Deserialize)]
pub struct CommitDto {
    pub author: Option<AccountDto>,
    pub commit: Option<CommitDetailDto>,
}

impl From<CommitDto> for ListedItem {
    fn from(dto: CommitDto) -> Self {
        Self {
            login: dto.author.and_then(|a| a.login).filter(|l| !l.is_empty()),
            email: dto
                .commit
                .and_then(|c| c.author)
                .and_then(|a| a.email)
                .filter(|e| !e.is_empty()),
        }
    }
}

impl From<AccountDto> for ListedItem {
    fn from(dto: AccountDto) -> Self {
        Self {
            login: dto.login.filter(|l| !l.is_empty()),
            email: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub login: Option<String>,
    pub id: Option<u64>,
    pub node_id: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub site_admin: Option<bool>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: Option<bool>,
    pub bio: Option<String>,
    pub twitter_username: Option<String>,
    pub public_repos: Option<u64>,
    pub public_gists: Option<u64>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserDto {
    /// `requested` is used when the response omits the login.
    pub fn into_profile(self, requested: &str) -> ContributorProfile {
        ContributorProfile {
            login: self.login.unwrap_or_else(|| requested.to_string()),
            id: self.id.unwrap_or_default(),
            node_id: self.node_id.unwrap_or_default(),
            avatar_url: self.avatar_url.unwrap_or_default(),
            html_url: self.html_url.unwrap_or_default(),
            account_type: self.account_type.unwrap_or_default(),
            site_admin: self.site_admin.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            blog: self.blog.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            hireable: self.hireable.unwrap_or_default(),
            bio: self.bio.unwrap_or_default(),
            twitter_username: self.twitter_username.unwrap_or_default(),
            public_repos: self.public_repos.unwrap_or_default(),
            public_gists: self.public_gists.unwrap_or_default(),
            followers: self.followers.unwrap_or_default(),
            following: self.following.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_default(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_repository_empty_object_maps_to_defaults() {
        let dto: RepositoryDto = serde_json::from_str("{}").unwrap();

        assert_eq!(RepositoryAttributes::from(dto), RepositoryAttributes::default());
    }

    #[test]
    fn test_repository_nulls_map_to_defaults() {
        let json = r#"{
            "description": null, "stargazers_count": null, "forks_count": null,
            "watchers_count": null, "open_issues_count": null, "language": null,
            "size": null, "created_at": null, "updated_at": null,
            "default_branch": null, "license": null, "has_issues": null,
            "has_wiki": null
        }"#;
        let dto: RepositoryDto = serde_json::from_str(json).unwrap();

        assert_eq!(RepositoryAttributes::from(dto), RepositoryAttributes::default());
    }

    #[test]
    fn test_repository_license_without_name_is_empty() {
        let dto: RepositoryDto = serde_json::from_str(r#"{"license": {"key": "other"}}"#).unwrap();

        assert_eq!(RepositoryAttributes::from(dto).license, "");
    }

    #[test]
    fn test_repository_full_payload_maps_every_field() {
        let json = r#"{
            "description": "Async runtime", "stargazers_count": 25000,
            "forks_count": 2300, "watchers_count": 25000, "open_issues_count": 300,
            "language": "Rust", "size": 41000,
            "created_at": "2016-07-25T18:15:45Z", "updated_at": "2024-05-01T10:00:00Z",
            "default_branch": "master", "license": {"name": "MIT License"},
            "has_issues": true, "has_wiki": false, "unrelated": [1, 2]
        }"#;
        let dto: RepositoryDto = serde_json::from_str(json).unwrap();
        let attrs = RepositoryAttributes::from(dto);

        assert_eq!(attrs.description, "Async runtime");
        assert_eq!(attrs.stars, 25000);
        assert_eq!(attrs.forks, 2300);
        assert_eq!(attrs.watchers, 25000);
        assert_eq!(attrs.open_issues, 300);
        assert_eq!(attrs.language, "Rust");
        assert_eq!(attrs.size, 41000);
        assert_eq!(
            attrs.created_at,
            Utc.with_ymd_and_hms(2016, 7, 25, 18, 15, 45).unwrap()
        );
        assert_eq!(
            attrs.updated_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(attrs.default_branch, "master");
        assert_eq!(attrs.license, "MIT License");
        assert!(attrs.has_issues);
        assert!(!attrs.has_wiki);
    }

    #[test]
    fn test_user_empty_object_keeps_requested_login() {
        let dto: UserDto = serde_json::from_str("{}").unwrap();
        let profile = dto.into_profile("octocat");

        assert_eq!(
            profile,
            ContributorProfile {
                login: "octocat".to_string(),
                ..ContributorProfile::default()
            }
        );
    }

    #[test]
    fn test_user_nulls_map_to_defaults() {
        let json = r#"{
            "login": "octocat", "id": null, "name": null, "company": null,
            "blog": null, "location": null, "email": null, "hireable": null,
            "bio": null, "twitter_username": null, "followers": null,
            "created_at": null
        }"#;
        let dto: UserDto = serde_json::from_str(json).unwrap();
        let profile = dto.into_profile("octocat");

        assert_eq!(profile.id, 0);
        assert_eq!(profile.company, "");
        assert!(!profile.hireable);
        assert_eq!(profile.followers, 0);
        assert_eq!(profile.created_at, DateTime::<Utc>::default());
        assert!(profile.error.is_none());
    }

    #[test]
    fn test_user_full_payload_maps_every_field() {
        let json = r#"{
            "login": "octocat", "id": 583231, "node_id": "MDQ6VXNlcjU4MzIzMQ==",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
            "html_url": "https://github.com/octocat", "type": "User",
            "site_admin": false, "name": "The Octocat", "company": "@github",
            "blog": "https://github.blog", "location": "San Francisco",
            "email": "octo@example.com", "hireable": true, "bio": "mascot",
            "twitter_username": "octo", "public_repos": 8, "public_gists": 8,
            "followers": 9000, "following": 9,
            "created_at": "2011-01-25T18:44:36Z", "updated_at": "2024-01-22T12:13:00Z"
        }"#;
        let dto: UserDto = serde_json::from_str(json).unwrap();
        let profile = dto.into_profile("ignored");

        assert_eq!(profile.login, "octocat");
        assert_eq!(profile.id, 583_231);
        assert_eq!(profile.node_id, "MDQ6VXNlcjU4MzIzMQ==");
        assert_eq!(profile.account_type, "User");
        assert_eq!(profile.name, "The Octocat");
        assert_eq!(profile.company, "@github");
        assert_eq!(profile.blog, "https://github.blog");
        assert_eq!(profile.location, "San Francisco");
        assert_eq!(profile.email, "octo@example.com");
        assert!(profile.hireable);
        assert_eq!(profile.bio, "mascot");
        assert_eq!(profile.twitter_username, "octo");
        assert_eq!(profile.public_repos, 8);
        assert_eq!(profile.public_gists, 8);
        assert_eq!(profile.followers, 9000);
        assert_eq!(profile.following, 9);
        assert_eq!(
            profile.created_at,
            Utc.with_ymd_and_hms(2011, 1, 25, 18, 44, 36).unwrap()
        );
    }

    #[test]
    fn test_commit_identity_prefers_login_and_keeps_email() {
        let json = r#"{"author": {"login": "a"}, "commit": {"author": {"email": "a@x.io"}}}"#;
        let item = ListedItem::from(serde_json::from_str::<CommitDto>(json).unwrap());

        assert_eq!(item.login.as_deref(), Some("a"));
        assert_eq!(item.email.as_deref(), Some("a@x.io"));
    }

    #[test]
    fn test_commit_without_account_has_no_login() {
        let json = r#"{"author": null, "commit": {"author": {"email": "ext@x.io"}}}"#;
        let item = ListedItem::from(serde_json::from_str::<CommitDto>(json).unwrap());

        assert_eq!(item.login, None);
        assert_eq!(item.email.as_deref(), Some("ext@x.io"));
    }

    #[test]
    fn test_commit_empty_login_is_treated_as_absent() {
        let json = r#"{"author": {"login": ""}, "commit": {"author": {"email": ""}}}"#;
        let item = ListedItem::from(serde_json::from_str::<CommitDto>(json).unwrap());

        assert_eq!(item, ListedItem::default());
    }
}
