// -- Wire models for the test-management service --
// Field names follow the service's camelCase JSON contract.

/// Reference to another service entity by id, optionally carrying its name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShallowReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ShallowReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Project as returned by the project lookup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProject {
    pub id: String,
    pub name: String,
}

/// Caller-suppliable block merged into run creation.
///
/// Everything a run carries besides its name, automation flag, and plan.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfiguration {
    pub configuration_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            configuration_ids: vec![1],
            comment: None,
        }
    }
}

/// Request body for run creation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCreateModel {
    pub name: String,
    pub automated: bool,
    pub plan: ShallowReference,
    pub configuration_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Request body for run update.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunUpdateModel {
    pub state: String,
}

impl RunUpdateModel {
    pub fn completed() -> Self {
        Self {
            state: "Completed".to_string(),
        }
    }
}

/// Run as returned by creation and update.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Query body for the test-point lookup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsQuery {
    pub points_filter: PointsFilter,
}

impl PointsQuery {
    pub fn for_cases(testcase_ids: Vec<u32>) -> Self {
        Self {
            points_filter: PointsFilter { testcase_ids },
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsFilter {
    pub testcase_ids: Vec<u32>,
}

/// Test point: a case bound to a plan and optionally a configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPoint {
    pub id: u64,
    pub test_case: ShallowReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_plan: Option<ShallowReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ShallowReference>,
}

/// One outcome record as submitted to the service.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub test_case: ShallowReference,
    pub test_point: ShallowReference,
    pub test_case_title: String,
    pub outcome: String,
    pub state: String,
    pub duration_in_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ShallowReference>,
}

/// Entry of a submission response.
///
/// The pinned legacy submission route echoes the server-assigned result id
/// but not which source record it belongs to; multi-record submissions must
/// recover identity through [`RunResultDetails`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedResult {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// Entry of the result query used for post-hoc identity correlation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResultDetails {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case: Option<ShallowReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// Request body for binding an attachment to a published result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRequest {
    pub attachment_type: String,
    pub file_name: String,
    /// Base64-encoded file content.
    pub stream: String,
}

/// Reference to a created attachment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentReference {
    pub id: u64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_create_model_wire_format() {
        let model = RunCreateModel {
            name: "[staging]: nightly".to_string(),
            automated: true,
            plan: ShallowReference::new("12"),
            configuration_ids: vec![3, 7],
            comment: None,
        };
        let json: serde_json::Value = serde_json::to_value(&model).unwrap();
        assert_eq!(json["name"], "[staging]: nightly");
        assert_eq!(json["automated"], true);
        assert_eq!(json["plan"]["id"], "12");
        assert_eq!(json["configurationIds"][1], 7);
        assert!(json.get("comment").is_none());
    }

    #[test]
    fn points_query_wire_format() {
        let query = PointsQuery::for_cases(vec![101, 102]);
        let json: serde_json::Value = serde_json::to_value(&query).unwrap();
        assert_eq!(json["pointsFilter"]["testcaseIds"][0], 101);
    }

    #[test]
    fn case_result_wire_format() {
        let record = CaseResult {
            test_case: ShallowReference::new("101"),
            test_point: ShallowReference::new("9001"),
            test_case_title: "Login [101]".to_string(),
            outcome: "Passed".to_string(),
            state: "Completed".to_string(),
            duration_in_ms: 50,
            error_message: None,
            stack_trace: None,
            configuration: None,
        };
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["testCase"]["id"], "101");
        assert_eq!(json["testPoint"]["id"], "9001");
        assert_eq!(json["testCaseTitle"], "Login [101]");
        assert_eq!(json["durationInMs"], 50);
        assert!(json.get("errorMessage").is_none());
        assert!(json.get("stackTrace").is_none());
    }

    #[test]
    fn test_point_deserializes_without_configuration() {
        let point: TestPoint = serde_json::from_str(
            r#"{"id":9001,"testCase":{"id":"101"},"testPlan":{"id":"12","name":"release"}}"#,
        )
        .unwrap();
        assert_eq!(point.id, 9001);
        assert_eq!(point.test_plan.unwrap().id, "12");
        assert!(point.configuration.is_none());
    }

    #[test]
    fn run_update_completed() {
        let json = serde_json::to_string(&RunUpdateModel::completed()).unwrap();
        assert_eq!(json, r#"{"state":"Completed"}"#);
    }
}
