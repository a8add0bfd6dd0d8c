use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Invalid thread key: {0}")]
    InvalidThreadKey(String),

    #[error("Viewer is not a participant of thread {0}")]
    NotAParticipant(String),

    #[error("Unknown chat type: {0}")]
    UnknownChatType(String),

    #[error("Unknown group role: {0}")]
    UnknownRole(String),

    #[error("Unknown onboarding step: {0}")]
    UnknownStep(String),
}
