mod client;
mod pagination;
mod types;

pub use client::{GitHubClient, DEFAULT_API_URL};
