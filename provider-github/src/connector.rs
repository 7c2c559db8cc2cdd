//! GitHub contents API connector
//!
//! Implements `DocumentSource` for a directory of a GitHub repository.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::storage::{DocumentSource, RemoteDocument};
use core_runtime::config::{GitHubSourceConfig, DEFAULT_REQUEST_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{GitHubError, Result};
use crate::types::{ContentEntry, EntryKind, FileContent};

const ACCEPT: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!("folio-content-sync/", env!("CARGO_PKG_VERSION"));

/// GitHub repository document source
///
/// Lists every markdown file below `root_path` (recursively) and fetches
/// their raw text. Document paths are reported relative to `root_path`.
///
/// # Example
///
/// ```ignore
/// use core_runtime::config::GitHubSourceConfig;
/// use provider_github::GitHubDocumentSource;
///
/// let config = GitHubSourceConfig::new("owner", "notes").with_token(token);
/// let source = GitHubDocumentSource::new(http_client, config);
/// let documents = source.list_documents().await?;
/// ```
pub struct GitHubDocumentSource {
    http_client: Arc<dyn HttpClient>,
    config: GitHubSourceConfig,
    retry_policy: RetryPolicy,
    timeout: Duration,
}

impl GitHubDocumentSource {
    pub fn new(http_client: Arc<dyn HttpClient>, config: GitHubSourceConfig) -> Self {
        Self {
            http_client,
            config,
            retry_policy: RetryPolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Per-request timeout passed to the HTTP client
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn contents_url(&self, repo_path: &str) -> String {
        let encoded: Vec<String> = repo_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.owner),
            urlencoding::encode(&self.config.repo),
            encoded.join("/")
        )
    }

    /// Repository path of a document path.
    fn repo_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if self.config.root_path.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.config.root_path, path)
        }
    }

    /// Document path of a repository path.
    fn document_path<'a>(&self, repo_path: &'a str) -> &'a str {
        if self.config.root_path.is_empty() {
            return repo_path;
        }
        repo_path
            .strip_prefix(self.config.root_path.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(repo_path)
    }

    fn request(&self, url: String) -> HttpRequest {
        let request = HttpRequest::get(url)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout);

        match &self.config.token {
            Some(token) => request.token_auth(token.as_str()),
            None => request,
        }
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, url: String, path: &str) -> Result<HttpResponse> {
        let response = self
            .http_client
            .execute_with_retry(self.request(url), self.retry_policy.clone())
            .await?;

        check_status(response, path)
    }

    async fn list_directory(&self, repo_path: &str) -> Result<Vec<ContentEntry>> {
        let response = self.get(self.contents_url(repo_path), repo_path).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            GitHubError::Parse(format!("directory listing for '{}': {}", repo_path, e))
        })
    }

    async fn list(&self) -> Result<Vec<RemoteDocument>> {
        let mut documents = Vec::new();
        let mut pending = vec![self.config.root_path.clone()];

        while let Some(dir) = pending.pop() {
            for entry in self.list_directory(&dir).await? {
                if entry.name.starts_with('.') {
                    continue;
                }
                match entry.kind {
                    EntryKind::Dir => pending.push(entry.path),
                    EntryKind::File => {
                        let document = RemoteDocument::new(self.document_path(&entry.path));
                        if document.is_markdown() {
                            documents.push(document);
                        }
                    }
                    kind => debug!(path = %entry.path, ?kind, "Skipping non-file entry"),
                }
            }
        }

        documents.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(documents)
    }

    async fn fetch(&self, path: &str) -> Result<String> {
        let repo_path = self.repo_path(path);
        let response = self.get(self.contents_url(&repo_path), &repo_path).await?;
        let file: FileContent = serde_json::from_slice(&response.body)
            .map_err(|e| GitHubError::Parse(format!("file '{}': {}", repo_path, e)))?;

        if file.is_inline() {
            return decode_content(&file.path, file.content.as_deref().unwrap_or_default());
        }

        // Files over 1 MB come back without an inline payload.
        let url = file.download_url.ok_or_else(|| GitHubError::Decode {
            path: file.path.clone(),
            message: "no inline content and no download URL".to_string(),
        })?;
        debug!(path = %file.path, "Falling back to raw download");
        let raw = self.get(url, &repo_path).await?;
        String::from_utf8(raw.body.to_vec()).map_err(|e| GitHubError::Decode {
            path: file.path,
            message: e.to_string(),
        })
    }
}

fn header<'a>(response: &'a HttpResponse, name: &str) -> Option<&'a str> {
    response
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn check_status(response: HttpResponse, path: &str) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let status_code = response.status;
    let message = String::from_utf8_lossy(&response.body).trim().to_string();

    Err(match status_code {
        401 => GitHubError::Unauthorized {
            status_code,
            message,
        },
        403 if header(&response, "x-ratelimit-remaining") == Some("0") => GitHubError::RateLimited,
        403 => GitHubError::Unauthorized {
            status_code,
            message,
        },
        404 => GitHubError::NotFound {
            path: path.to_string(),
        },
        _ => GitHubError::Api {
            status_code,
            message,
        },
    })
}

/// Decodes a contents API payload; GitHub wraps the base64 at 60 columns.
fn decode_content(path: &str, content: &str) -> Result<String> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned).map_err(|e| GitHubError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| GitHubError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl DocumentSource for GitHubDocumentSource {
    fn name(&self) -> String {
        format!("github:{}/{}", self.config.owner, self.config.repo)
    }

    #[instrument(skip(self))]
    async fn list_documents(&self) -> bridge_traits::error::Result<Vec<RemoteDocument>> {
        let documents = self.list().await?;
        info!(
            "Listed {} markdown documents from {}",
            documents.len(),
            self.name()
        );
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn fetch_document(&self, path: &str) -> bridge_traits::error::Result<String> {
        Ok(self.fetch(path).await?)
    }
}
