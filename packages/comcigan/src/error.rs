use thiserror::Error;

/// Which of the two mined identifiers was missing from the content page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    ScData,
    ExtractCode,
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::ScData => f.write_str("sc_data"),
            Identifier::ExtractCode => f.write_str("school_ra"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to discover content host: {0}")]
    Discovery(&'static str),

    #[error("Identifier `{0}` not found in page source")]
    IdentifierNotFound(Identifier),

    #[error("No school matched the keyword")]
    NoMatch,

    #[error("{0} schools matched the keyword, use a more specific name")]
    AmbiguousMatch(usize),

    #[error("Timetable response body was empty")]
    EmptyResponse,

    #[error("Failed to decode response as JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("No formatting routine found in the embedded page scripts")]
    FormattingRoutineNotFound,

    #[error("Embedded formatting routine failed: {0}")]
    Evaluation(String),

    #[error("Client is not initialized, call `init` first")]
    NotInitialized,

    #[error("School is not selected, call `select_school` first")]
    SchoolNotSelected,
}
