//! Blocking client for the Jira REST search API.
//!
//! Fetches every issue linked to an epic, including the status changelog, and
//! converts them to [`pace_core::issue::Issue`] values.
//!
//! ```rust,ignore
//! use jira_client::{JiraClient, JiraCredentials};
//!
//! let client = JiraClient::new(JiraCredentials::from_env()?)?;
//! let issues = client.issues_in_epic("OBAU-31149")?;
//! ```

pub mod error;
pub mod types;


pub use error::JiraError;
pub use types::{RawIssue, SearchResponse};

use pace_core::issue::Issue;
use reqwest::header::ACCEPT;
use std::time::Duration;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, JiraError>;

pub const SEARCH_PATH: &str = "/rest/api/2/search";
pub const SEARCH_FIELDS: &str = "summary,status,assignee,issuetype";

const DEFAULT_PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JiraCredentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl JiraCredentials {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            email: email.into(),
            api_token: api_token.into(),
        }
    }

    /// Read `JIRA_BASE_URL`, `API_EMAIL` and `API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let var = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(JiraError::MissingSetting(name))
        };
        Ok(Self::new(var("JIRA_BASE_URL")?, var("API_EMAIL")?, var("API_TOKEN")?))
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct JiraClient {
    http: reqwest::blocking::Client,
    credentials: JiraCredentials,
    page_size: usize,
}

impl JiraClient {
    pub fn new(credentials: JiraCredentials) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            credentials,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn epic_jql(epic_key: &str) -> String {
        format!("\"Epic Link\" = \"{epic_key}\"")
    }

    fn search_url(&self) -> String {
        format!(
            "{}{SEARCH_PATH}",
            self.credentials.base_url.trim_end_matches('/')
        )
    }

    /// Fetch one page of search results starting at `start_at`.
    pub fn search_page(&self, jql: &str, start_at: usize) -> Result<SearchResponse> {
        let url = self.search_url();
        let query = [
            ("jql", jql.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
            ("expand", "changelog".to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", self.page_size.to_string()),
        ];
        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.credentials.email, Some(&self.credentials.api_token))
            .header(ACCEPT, "application/json")
            .query(&query)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(JiraError::Status {
                status: status.as_u16(),
                url,
                body,
            });
        }
        Ok(resp.json()?)
    }

    /// Every issue in the epic, following pagination until `total` is reached.
    pub fn issues_in_epic(&self, epic_key: &str) -> Result<Vec<Issue>> {
        let jql = Self::epic_jql(epic_key);
        let mut issues = Vec::new();
        let mut start_at = 0;
        loop {
            let page = self.search_page(&jql, start_at)?;
            tracing::debug!(
                epic = epic_key,
                start_at,
                returned = page.issues.len(),
                total = page.total,
                "fetched search page"
            );
            let next = page.next_start();
            for raw in page.issues {
                issues.push(raw.into_issue()?);
            }
            match next {
                Some(n) => start_at = n,
                None => break,
            }
        }
        tracing::info!(epic = epic_key, issues = issues.len(), "fetched epic issues");
        Ok(issues)
    }
}

/// Convert a saved search response body into issues.
pub fn parse_search_response(json: &str) -> Result<Vec<Issue>> {
    let page: SearchResponse = serde_json::from_str(json)?;
    page.issues.into_iter().map(RawIssue::into_issue).collect()
}
