//! # marksync-github
//!
//! The repository-host seam ([`RepositoryHost`]) and its GitHub
//! implementation ([`GithubClient`]): blocking REST + GraphQL calls with a
//! per-request timeout.

pub mod client;
pub mod error;
pub mod host;

pub use client::GithubClient;
pub use error::HostError;
pub use host::{CommitInfo, FileUpdate, RemoteFile, RepositoryHost};
