// -- Host-facing event payloads --
// Delivered by the execution host on its begin / test-end / end lifecycle.

use std::path::PathBuf;

use crate::error::DomainError;
use crate::status::TestStatus;

/// Description of the whole suite, delivered once at begin.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SuiteInfo {
    pub name: String,
    pub total_tests: usize,
}

/// Identity of one test as the host names it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TestInfo {
    pub title: String,
}

impl TestInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Raw outcome of one test as delivered by the host.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TestResultData {
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error: Option<TestError>,
    #[serde(default)]
    pub attachments: Vec<AttachmentArtifact>,
}

/// Error detail attached to a failed test.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TestError {
    pub message: String,
    pub stack: Option<String>,
}

/// A local artifact produced by the host for one test.
///
/// Consumed at most once by the uploader; an individual failure drops the
/// artifact without retry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AttachmentArtifact {
    /// Declared kind, e.g. `screenshot`, `video`, `trace`.
    pub name: String,
    pub path: PathBuf,
    pub content_type: String,
}

/// Attachment kinds eligible for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Screenshot,
    Video,
    Trace,
}

impl AttachmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::Video => "video",
            Self::Trace => "trace",
        }
    }
}

impl std::str::FromStr for AttachmentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "screenshot" => Ok(Self::Screenshot),
            "video" => Ok(Self::Video),
            "trace" => Ok(Self::Trace),
            other => Err(DomainError::InvalidAttachmentKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn result_round_trip() {
        let result = TestResultData {
            status: TestStatus::Failed,
            duration_ms: 1250,
            error: Some(TestError {
                message: "assertion failed".to_string(),
                stack: Some("at checkout.spec:42".to_string()),
            }),
            attachments: vec![AttachmentArtifact {
                name: "screenshot".to_string(),
                path: PathBuf::from("/tmp/shot.png"),
                content_type: "image/png".to_string(),
            }],
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: TestResultData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, TestStatus::Failed);
        assert_eq!(back.duration_ms, 1250);
        assert_eq!(back.attachments.len(), 1);
        assert_eq!(back.attachments[0].content_type, "image/png");
    }

    #[test]
    fn attachments_default_to_empty() {
        let back: TestResultData =
            serde_json::from_str(r#"{"status":"passed","duration_ms":10,"error":null}"#).unwrap();
        assert!(back.attachments.is_empty());
    }

    #[test]
    fn attachment_kind_parse() {
        assert_eq!(
            AttachmentKind::from_str("screenshot").unwrap(),
            AttachmentKind::Screenshot
        );
        assert!(AttachmentKind::from_str("coredump").is_err());
    }
}
