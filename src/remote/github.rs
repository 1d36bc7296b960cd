//! GitHub tree lister and raw content source
//!
//! Two endpoints on the REST API (repository metadata, recursive git tree)
//! and one on the raw content host. The optional token is forwarded as a
//! bearer credential to all three.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::GithubConfig;
use crate::constants::{fetch, network};
use crate::types::{RepodocError, RepositoryReference, ResolvedRepository, Result, Revision};

/// GitHub API client
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    raw_base: String,
    token: Option<SecretString>,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GithubClient {
    pub fn new(
        api_base: impl Into<String>,
        raw_base: impl Into<String>,
        token: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .user_agent(network::USER_AGENT)
            .build()
            .map_err(|e| RepodocError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            raw_base: raw_base.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.expose_secret().trim().is_empty()),
        })
    }

    /// Build a client from the `[github]` config section
    pub fn from_config(config: &GithubConfig) -> Result<Self> {
        Self::new(
            &config.api_base,
            &config.raw_base,
            config.token.clone().map(SecretString::from),
            config.timeout_secs,
        )
    }

    /// Pin a reference to a concrete revision, looking up the default branch
    /// when none was given
    pub async fn resolve(&self, reference: RepositoryReference) -> Result<ResolvedRepository> {
        let revision = match &reference.revision {
            Revision::Named(name) => name.clone(),
            Revision::Default => {
                self.default_branch(&reference.owner, &reference.repository)
                    .await?
            }
        };

        info!(
            repository = %reference.slug(),
            requested = %reference.revision,
            resolved = %revision,
            "Resolved revision"
        );

        Ok(reference.resolve(revision))
    }

    /// Default branch from repository metadata (`main` when absent)
    pub async fn default_branch(&self, owner: &str, repository: &str) -> Result<String> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, repository);
        let metadata: RepositoryMetadata = self.get_json(&url).await?;

        Ok(metadata
            .default_branch
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| fetch::FALLBACK_BRANCH.to_string()))
    }

    /// All blob paths under the resolved sub-path, in listing order
    pub async fn list_files(&self, repo: &ResolvedRepository) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base,
            repo.owner,
            repo.repository,
            encode_component(&repo.revision)
        );
        let listing: TreeResponse = self.get_json(&url).await?;

        if listing.truncated {
            warn!(
                repository = %repo.slug(),
                "Tree listing was truncated by the remote; some files are missing"
            );
        }

        let entries = listing.tree.len();
        let files: Vec<String> = listing
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob")
            .map(|e| e.path)
            .collect();

        info!(entries, files = files.len(), "Listed repository tree");

        let scope = repo.normalized_sub_path();
        let scope = scope.trim_matches('/');
        if scope.is_empty() {
            return Ok(files);
        }

        let scoped: Vec<String> = files
            .into_iter()
            .filter(|f| in_scope(f, scope))
            .collect();
        info!(sub_path = scope, files = scoped.len(), "Scoped listing");
        Ok(scoped)
    }

    /// Raw bytes of one file at the resolved revision
    pub async fn fetch_raw(&self, repo: &ResolvedRepository, path: &str) -> Result<Vec<u8>> {
        let url = self.raw_url(repo, path)?;

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| RepodocError::fetch(path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepodocError::fetch(path, format!("Raw {}", status.as_u16())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RepodocError::fetch(path, e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Raw content URL with every path segment percent-encoded
    fn raw_url(&self, repo: &ResolvedRepository, path: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.raw_base)
            .map_err(|e| RepodocError::fetch(path, format!("Invalid raw base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RepodocError::fetch(path, "Raw base cannot carry a path"))?
            .pop_if_empty()
            .extend([
                repo.owner.as_str(),
                repo.repository.as_str(),
                repo.revision.as_str(),
            ])
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GitHub API request");

        let response = self
            .authorized(self.client.get(url))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepodocError::Remote {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }
}

fn in_scope(path: &str, scope: &str) -> bool {
    path == scope
        || path
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

// Response types

#[derive(Debug, Deserialize)]
struct RepositoryMetadata {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard, token: Option<&str>) -> GithubClient {
        GithubClient::new(
            server.url(),
            format!("{}/raw", server.url()),
            token.map(|t| SecretString::from(t.to_string())),
            10,
        )
        .unwrap()
    }

    const TREE: &str = r#"{
        "sha": "abc",
        "tree": [
            {"path": "README.md", "type": "blob"},
            {"path": "src", "type": "tree"},
            {"path": "src/main.rs", "type": "blob"},
            {"path": "src/lib.rs", "type": "blob"},
            {"path": "srcgen/out.rs", "type": "blob"}
        ],
        "truncated": false
    }"#;

    #[tokio::test]
    async fn test_resolve_default_branch() {
        let mut server = mockito::Server::new_async().await;
        let _meta = server
            .mock("GET", "/repos/o/r")
            .match_header("authorization", "Bearer ghp_x")
            .with_status(200)
            .with_body(r#"{"default_branch": "trunk"}"#)
            .create_async()
            .await;

        let resolved = client(&server, Some("ghp_x"))
            .resolve(RepositoryReference::new("o", "r"))
            .await
            .unwrap();

        assert_eq!(resolved.revision, "trunk");
    }

    #[tokio::test]
    async fn test_missing_default_branch_falls_back_to_main() {
        let mut server = mockito::Server::new_async().await;
        let _meta = server
            .mock("GET", "/repos/o/r")
            .with_status(200)
            .with_body(r#"{"name": "r"}"#)
            .create_async()
            .await;

        let branch = client(&server, None).default_branch("o", "r").await.unwrap();
        assert_eq!(branch, "main");
    }

    #[tokio::test]
    async fn test_named_revision_skips_metadata() {
        let mut server = mockito::Server::new_async().await;
        let meta = server
            .mock("GET", "/repos/o/r")
            .expect(0)
            .create_async()
            .await;

        let reference = RepositoryReference::new("o", "r").with_revision(Revision::Named("v1".into()));
        let resolved = client(&server, None).resolve(reference).await.unwrap();

        assert_eq!(resolved.revision, "v1");
        meta.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_files_keeps_blobs_in_order() {
        let mut server = mockito::Server::new_async().await;
        let _tree = server
            .mock("GET", "/repos/o/r/git/trees/main")
            .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
            .with_status(200)
            .with_body(TREE)
            .create_async()
            .await;

        let repo = RepositoryReference::new("o", "r").resolve("main");
        let files = client(&server, None).list_files(&repo).await.unwrap();

        assert_eq!(
            files,
            vec!["README.md", "src/main.rs", "src/lib.rs", "srcgen/out.rs"]
        );
    }

    #[tokio::test]
    async fn test_list_files_scopes_sub_path() {
        let mut server = mockito::Server::new_async().await;
        let _tree = server
            .mock("GET", "/repos/o/r/git/trees/main")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(TREE)
            .create_async()
            .await;

        let repo = RepositoryReference::new("o", "r")
            .with_sub_path("src\\")
            .resolve("main");
        let files = client(&server, None).list_files(&repo).await.unwrap();

        assert_eq!(files, vec!["src/main.rs", "src/lib.rs"]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_remote_error() {
        let mut server = mockito::Server::new_async().await;
        let _tree = server
            .mock("GET", "/repos/o/r/git/trees/main")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let repo = RepositoryReference::new("o", "r").resolve("main");
        let err = client(&server, None).list_files(&repo).await.unwrap_err();

        assert!(matches!(err, RepodocError::Remote { status: 404, .. }));
        assert!(!err.is_isolated());
    }

    #[tokio::test]
    async fn test_fetch_raw() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/raw/o/r/v1.2/src/main.rs")
            .with_status(200)
            .with_body("fn main() {}")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/raw/o/r/v1.2/gone.rs")
            .with_status(404)
            .create_async()
            .await;

        let github = client(&server, None);
        let repo = RepositoryReference::new("o", "r").resolve("v1.2");

        let bytes = github.fetch_raw(&repo, "src/main.rs").await.unwrap();
        assert_eq!(bytes, b"fn main() {}");

        let err = github.fetch_raw(&repo, "gone.rs").await.unwrap_err();
        assert!(matches!(&err, RepodocError::Fetch { path, .. } if path == "gone.rs"));
        assert!(err.to_string().contains("Raw 404"));
    }

    #[tokio::test]
    async fn test_fetch_raw_encodes_path_segments() {
        let mut server = mockito::Server::new_async().await;
        let _hash = server
            .mock("GET", "/raw/o/r/main/docs/C%23.md")
            .with_status(200)
            .with_body("# C sharp")
            .create_async()
            .await;
        let _query = server
            .mock("GET", "/raw/o/r/main/what%3F/read%20me.txt")
            .with_status(200)
            .with_body("spaces")
            .create_async()
            .await;
        let _branch = server
            .mock("GET", "/raw/o/r/feature%2Fx/a.rs")
            .with_status(200)
            .with_body("branch")
            .create_async()
            .await;

        let github = client(&server, None);
        let main = RepositoryReference::new("o", "r").resolve("main");

        let bytes = github.fetch_raw(&main, "docs/C#.md").await.unwrap();
        assert_eq!(bytes, b"# C sharp");
        let bytes = github.fetch_raw(&main, "what?/read me.txt").await.unwrap();
        assert_eq!(bytes, b"spaces");

        let feature = RepositoryReference::new("o", "r").resolve("feature/x");
        let bytes = github.fetch_raw(&feature, "a.rs").await.unwrap();
        assert_eq!(bytes, b"branch");
    }

    #[test]
    fn test_in_scope() {
        assert!(in_scope("src/a.rs", "src"));
        assert!(in_scope("src", "src"));
        assert!(!in_scope("srcgen/a.rs", "src"));
        assert!(in_scope("crates/core/lib.rs", "crates/core"));
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("main"), "main");
        assert_eq!(encode_component("feature/x"), "feature%2Fx");
    }
}
