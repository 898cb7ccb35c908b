pub mod case_ids;
pub mod error;
pub mod event;
pub mod sanitize;
pub mod status;

pub use case_ids::extract_case_ids;
pub use error::DomainError;
pub use event::{AttachmentArtifact, AttachmentKind, SuiteInfo, TestError, TestInfo, TestResultData};
pub use sanitize::{error_message_for, strip_ansi};
pub use status::{Outcome, TestStatus};
