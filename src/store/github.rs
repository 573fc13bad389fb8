//! GitHub contents API store.
//!
//! Each upload is one commit on the configured branch:
//!
//! ```text
//! GET /repos/{owner}/{repo}/contents/{key}?ref={branch}   → existing sha (404 = new file)
//! PUT /repos/{owner}/{repo}/contents/{key}                → {message, content, branch, sha?}
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use super::{RemoteStore, StoreError, check_key};
use crate::config::GithubStoreConfig;
use crate::debug;

const API_VERSION: &str = "2022-11-28";

/// Unreserved characters stay readable in contents URLs.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

pub struct GithubStore {
    client: Client,
    contents_url: String,
    branch: String,
    commit_message: String,
}

impl GithubStore {
    pub fn new(config: &GithubStoreConfig) -> Result<Self> {
        let token = config.resolve_token()?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("GitHub token contains invalid header characters")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("cdnpush/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            contents_url: contents_base(config),
            branch: config.branch.clone(),
            commit_message: config.commit_message.clone(),
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.contents_url, encode_key(key))
    }

    /// Blob sha of an existing file on the branch, `None` when absent.
    fn existing_sha(&self, url: &str) -> Result<Option<String>, StoreError> {
        let response = self
            .client
            .get(url)
            .query(&[("ref", self.branch.as_str())])
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status("GET", url, response)?;
        let entry: ContentsEntry = response.json()?;
        Ok(Some(entry.sha))
    }

    fn put(&self, url: &str, body: &PutContents<'_>) -> Result<(), StoreError> {
        let response = self.client.put(url).json(body).send()?;
        check_status("PUT", url, response)?;
        Ok(())
    }
}

impl RemoteStore for GithubStore {
    fn name(&self) -> &'static str {
        "github"
    }

    /// Every PUT is a commit on the same branch; concurrent commits race
    /// for the branch head and fail with 409.
    fn concurrent_uploads(&self) -> bool {
        false
    }

    fn upload_file(&self, local: &Path, key: &str) -> Result<(), StoreError> {
        check_key(key)?;
        let bytes = fs::read(local).map_err(|source| StoreError::Read {
            path: local.to_path_buf(),
            source,
        })?;

        let url = self.url_for(key);
        let sha = self.existing_sha(&url)?;
        let action = if sha.is_some() { "updating" } else { "creating" };
        debug!("upload"; "{} {} ({} bytes)", action, key, bytes.len());

        let body = PutContents {
            message: self.commit_message.replace("{path}", key),
            content: STANDARD.encode(&bytes),
            branch: &self.branch,
            sha,
        };
        self.put(&url, &body)
    }
}

fn contents_base(config: &GithubStoreConfig) -> String {
    format!(
        "{}/repos/{}/{}/contents",
        config.api_url.trim_end_matches('/'),
        utf8_percent_encode(&config.owner, SEGMENT),
        utf8_percent_encode(&config.repository, SEGMENT),
    )
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn check_status(method: &'static str, url: &str, response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&text)
        .map(|m| m.message)
        .unwrap_or(text);
    Err(StoreError::Status {
        method,
        url: url.to_string(),
        status: status.as_u16(),
        message,
    })
}
