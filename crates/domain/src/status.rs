use crate::error::DomainError;

/// Verdict delivered by the execution host for one test.
///
/// The host reports statuses as camelCase strings (`"timedOut"`); anything
/// outside this set is rejected rather than mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
    Interrupted,
    Skipped,
}

impl TestStatus {
    /// Fixed mapping onto the remote service's outcome vocabulary.
    pub fn outcome(self) -> Outcome {
        match self {
            Self::Passed => Outcome::Passed,
            Self::Failed | Self::TimedOut | Self::Interrupted => Outcome::Failed,
            Self::Skipped => Outcome::Paused,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timedOut",
            Self::Interrupted => "interrupted",
            Self::Skipped => "skipped",
        }
    }
}

impl std::str::FromStr for TestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "timedOut" => Ok(Self::TimedOut),
            "interrupted" => Ok(Self::Interrupted),
            "skipped" => Ok(Self::Skipped),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome as submitted to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
    Paused,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Paused => "Paused",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn passed_maps_to_passed() {
        assert_eq!(TestStatus::Passed.outcome(), Outcome::Passed);
    }

    #[test]
    fn skipped_maps_to_paused() {
        assert_eq!(TestStatus::Skipped.outcome(), Outcome::Paused);
    }

    #[test]
    fn failure_variants_map_to_failed() {
        for status in [
            TestStatus::Failed,
            TestStatus::TimedOut,
            TestStatus::Interrupted,
        ] {
            assert_eq!(status.outcome(), Outcome::Failed);
        }
    }

    #[test]
    fn parses_host_status_strings() {
        assert_eq!(TestStatus::from_str("passed").unwrap(), TestStatus::Passed);
        assert_eq!(
            TestStatus::from_str("timedOut").unwrap(),
            TestStatus::TimedOut
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = TestStatus::from_str("flaky").unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatus(s) if s == "flaky"));
    }

    #[test]
    fn status_serde_camel_case() {
        let json = serde_json::to_string(&TestStatus::TimedOut).unwrap();
        assert_eq!(json, "\"timedOut\"");
        let back: TestStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TestStatus::TimedOut);
    }

    #[test]
    fn outcome_wire_strings() {
        assert_eq!(Outcome::Passed.as_str(), "Passed");
        assert_eq!(Outcome::Failed.as_str(), "Failed");
        assert_eq!(Outcome::Paused.as_str(), "Paused");
    }
}
