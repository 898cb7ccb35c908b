/// Errors for domain schema validation.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("invalid test status: {0}")]
    InvalidStatus(String),

    #[error("invalid attachment kind: {0}")]
    InvalidAttachmentKind(String),
}
