use crate::error::JiraError;
use chrono::{DateTime, FixedOffset};
use pace_core::issue::{Issue, StatusChange};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Search response
// ---------------------------------------------------------------------------

/// One page of `GET /rest/api/2/search`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub start_at: usize,
    #[serde(default)]
    pub max_results: usize,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

impl SearchResponse {
    /// Offset of the page after this one, or `None` when every issue has
    /// been returned.
    pub fn next_start(&self) -> Option<usize> {
        let next = self.start_at + self.issues.len();
        (!self.issues.is_empty() && next < self.total).then_some(next)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawIssue {
    pub key: String,
    pub fields: RawFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawFields {
    #[serde(default)]
    pub summary: String,
    pub status: Named,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuetype: Option<Named>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<History>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct History {
    pub created: String,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeItem {
    pub field: String,
    #[serde(rename = "fromString", default)]
    pub from: Option<String>,
    #[serde(rename = "toString", default)]
    pub to: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Parse a changelog timestamp such as `2025-08-07T09:12:33.000+0100`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
}

impl RawIssue {
    /// Convert to the tracker-neutral [`Issue`], keeping only status
    /// transitions from the changelog, oldest first.
    pub fn into_issue(self) -> Result<Issue, JiraError> {
        let mut history = Vec::new();
        for entry in self.changelog.unwrap_or_default().histories {
            let at = parse_timestamp(&entry.created).ok_or_else(|| JiraError::Timestamp {
                key: self.key.clone(),
                value: entry.created.clone(),
            })?;
            for item in entry.items {
                if item.field != "status" {
                    continue;
                }
                let Some(to) = item.to else { continue };
                history.push(StatusChange {
                    at,
                    from: item.from,
                    to,
                });
            }
        }
        history.sort_by_key(|c| c.at);

        let mut issue = Issue::new(self.key, self.fields.summary, self.fields.status.name)
            .with_history(history);
        if let Some(user) = self.fields.assignee {
            issue = issue.with_assignee(user.display_name);
        }
        Ok(issue)
    }
}
