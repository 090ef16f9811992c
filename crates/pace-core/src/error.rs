use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaceError {
    #[error("no project config: create .pace/projects.yaml")]
    NotInitialized,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("cannot allocate {tickets} remaining ticket(s): no developers configured")]
    NoDevelopers { tickets: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl PaceError {
    /// True for errors caused by the project configuration rather than I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PaceError::NotInitialized
                | PaceError::ProjectNotFound(_)
                | PaceError::InvalidDate { .. }
                | PaceError::NoDevelopers { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PaceError>;
