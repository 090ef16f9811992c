use thiserror::Error;

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Jira returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Failed to parse search response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid changelog timestamp '{value}' on {key}")]
    Timestamp { key: String, value: String },

    #[error("Missing Jira setting: {0}")]
    MissingSetting(&'static str),
}
