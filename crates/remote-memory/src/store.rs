use async_trait::async_trait;
use tokio::sync::Mutex;

use casebridge_remote::{
    AttachmentReference, AttachmentRequest, CaseResult, PointsQuery, PublishedResult, RemoteError,
    RunCreateModel, RunResultDetails, RunUpdateModel, ShallowReference, TeamProject,
    TestManagement, TestPoint, TestRun,
};

/// Recorded call, one per backend operation, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetProject(String),
    CreateRun { name: String },
    UpdateRun { run_id: u64, state: String },
    PointsQuery(Vec<u32>),
    AddResults { run_id: u64, count: usize },
    ResultsForRun { run_id: u64 },
    CreateAttachment { result_id: u64, file_name: String },
}

/// Error kind an injected failure resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    Unauthorized,
    Network,
    Api,
}

impl FailKind {
    fn to_error(self) -> RemoteError {
        match self {
            Self::Unauthorized => RemoteError::Unauthorized {
                message: "invalid or expired token".to_string(),
            },
            Self::Network => RemoteError::Network {
                message: "connection refused".to_string(),
            },
            Self::Api => RemoteError::Api {
                status: 500,
                message: "internal server error".to_string(),
            },
        }
    }
}

/// Per-operation failure injection. `None` means the operation succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub get_project: Option<FailKind>,
    pub create_run: Option<FailKind>,
    pub points_query: Option<FailKind>,
    pub add_results: Option<FailKind>,
    pub create_attachment: Option<FailKind>,
}

#[derive(Debug, Clone)]
pub struct StoredRun {
    pub id: u64,
    pub model: RunCreateModel,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct StoredResult {
    pub id: u64,
    pub run_id: u64,
    pub record: CaseResult,
}

#[derive(Debug, Clone)]
pub struct StoredAttachment {
    pub id: u64,
    pub run_id: u64,
    pub result_id: u64,
    pub request: AttachmentRequest,
}

#[derive(Default)]
struct MemoryState {
    projects: Vec<TeamProject>,
    points: Vec<TestPoint>,
    runs: Vec<StoredRun>,
    results: Vec<StoredResult>,
    attachments: Vec<StoredAttachment>,
    calls: Vec<Call>,
    failures: Failures,
}

/// In-memory backend: seeded projects/points, stored runs/results, call
/// recording, and per-operation failure injection.
#[derive(Default)]
pub struct MemoryTestManagement {
    state: Mutex<MemoryState>,
}

/// Build a seedable test point.
pub fn test_point(
    point_id: u64,
    case_id: u32,
    plan_id: u32,
    configuration: Option<(u32, &str)>,
) -> TestPoint {
    TestPoint {
        id: point_id,
        test_case: ShallowReference::new(case_id.to_string()),
        test_plan: Some(ShallowReference::new(plan_id.to_string())),
        configuration: configuration.map(|(id, name)| ShallowReference {
            id: id.to_string(),
            name: Some(name.to_string()),
        }),
    }
}

impl MemoryTestManagement {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_project(&self, name: &str) {
        let mut state = self.state.lock().await;
        let id = format!("prj-{}", state.projects.len() + 1);
        state.projects.push(TeamProject {
            id,
            name: name.to_string(),
        });
    }

    pub async fn seed_point(&self, point: TestPoint) {
        self.state.lock().await.points.push(point);
    }

    pub async fn set_failures(&self, failures: Failures) {
        self.state.lock().await.failures = failures;
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    pub async fn runs(&self) -> Vec<StoredRun> {
        self.state.lock().await.runs.clone()
    }

    pub async fn results(&self) -> Vec<StoredResult> {
        self.state.lock().await.results.clone()
    }

    pub async fn attachments(&self) -> Vec<StoredAttachment> {
        self.state.lock().await.attachments.clone()
    }
}

#[async_trait]
impl TestManagement for MemoryTestManagement {
    async fn get_project(&self, name: &str) -> Result<Option<TeamProject>, RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::GetProject(name.to_string()));
        if let Some(kind) = state.failures.get_project {
            return Err(kind.to_error());
        }
        Ok(state.projects.iter().find(|p| p.name == name).cloned())
    }

    async fn create_run(
        &self,
        _project: &str,
        model: &RunCreateModel,
    ) -> Result<TestRun, RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::CreateRun {
            name: model.name.clone(),
        });
        if let Some(kind) = state.failures.create_run {
            return Err(kind.to_error());
        }
        let id = 1000 + state.runs.len() as u64;
        state.runs.push(StoredRun {
            id,
            model: model.clone(),
            state: "InProgress".to_string(),
        });
        Ok(TestRun {
            id,
            name: Some(model.name.clone()),
            state: Some("InProgress".to_string()),
        })
    }

    async fn update_run(
        &self,
        _project: &str,
        run_id: u64,
        update: &RunUpdateModel,
    ) -> Result<TestRun, RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::UpdateRun {
            run_id,
            state: update.state.clone(),
        });
        let Some(run) = state.runs.iter_mut().find(|r| r.id == run_id) else {
            return Err(RemoteError::NotFound {
                what: format!("run {run_id}"),
            });
        };
        run.state = update.state.clone();
        Ok(TestRun {
            id: run_id,
            name: Some(run.model.name.clone()),
            state: Some(run.state.clone()),
        })
    }

    async fn points_by_query(
        &self,
        _project: &str,
        query: &PointsQuery,
    ) -> Result<Vec<TestPoint>, RemoteError> {
        let mut state = self.state.lock().await;
        let wanted = query.points_filter.testcase_ids.clone();
        state.calls.push(Call::PointsQuery(wanted.clone()));
        if let Some(kind) = state.failures.points_query {
            return Err(kind.to_error());
        }
        Ok(state
            .points
            .iter()
            .filter(|p| {
                p.test_case
                    .id
                    .parse::<u32>()
                    .is_ok_and(|id| wanted.contains(&id))
            })
            .cloned()
            .collect())
    }

    async fn add_results(
        &self,
        _project: &str,
        run_id: u64,
        results: &[CaseResult],
    ) -> Result<Vec<PublishedResult>, RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::AddResults {
            run_id,
            count: results.len(),
        });
        if let Some(kind) = state.failures.add_results {
            return Err(kind.to_error());
        }
        let mut published = Vec::with_capacity(results.len());
        for record in results {
            let id = 100_000 + state.results.len() as u64;
            state.results.push(StoredResult {
                id,
                run_id,
                record: record.clone(),
            });
            published.push(PublishedResult {
                id,
                outcome: Some(record.outcome.clone()),
            });
        }
        Ok(published)
    }

    async fn results_for_run(
        &self,
        _project: &str,
        run_id: u64,
    ) -> Result<Vec<RunResultDetails>, RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::ResultsForRun { run_id });
        Ok(state
            .results
            .iter()
            .filter(|r| r.run_id == run_id)
            .map(|r| RunResultDetails {
                id: r.id,
                test_case: Some(r.record.test_case.clone()),
                test_case_title: Some(r.record.test_case_title.clone()),
                outcome: Some(r.record.outcome.clone()),
            })
            .collect())
    }

    async fn create_attachment(
        &self,
        _project: &str,
        run_id: u64,
        result_id: u64,
        attachment: &AttachmentRequest,
    ) -> Result<AttachmentReference, RemoteError> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::CreateAttachment {
            result_id,
            file_name: attachment.file_name.clone(),
        });
        if let Some(kind) = state.failures.create_attachment {
            return Err(kind.to_error());
        }
        if !state.results.iter().any(|r| r.id == result_id) {
            return Err(RemoteError::NotFound {
                what: format!("result {result_id}"),
            });
        }
        let id = 500_000 + state.attachments.len() as u64;
        state.attachments.push(StoredAttachment {
            id,
            run_id,
            result_id,
            request: attachment.clone(),
        });
        Ok(AttachmentReference {
            id,
            url: format!("memory://attachments/{id}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let api = MemoryTestManagement::new();
        api.seed_project("Web").await;
        api.get_project("Web").await.unwrap();
        api.points_by_query("Web", &PointsQuery::for_cases(vec![1]))
            .await
            .unwrap();
        let calls = api.calls().await;
        assert_eq!(calls[0], Call::GetProject("Web".to_string()));
        assert_eq!(calls[1], Call::PointsQuery(vec![1]));
    }

    #[tokio::test]
    async fn create_and_complete_run() {
        let api = MemoryTestManagement::new();
        let run = api
            .create_run(
                "Web",
                &RunCreateModel {
                    name: "nightly".to_string(),
                    automated: true,
                    plan: ShallowReference::new("12"),
                    configuration_ids: vec![1],
                    comment: None,
                },
            )
            .await
            .unwrap();
        let updated = api
            .update_run("Web", run.id, &RunUpdateModel::completed())
            .await
            .unwrap();
        assert_eq!(updated.state.as_deref(), Some("Completed"));
    }

    #[tokio::test]
    async fn points_filtered_by_case_ids() {
        let api = MemoryTestManagement::new();
        api.seed_point(test_point(9001, 101, 12, None)).await;
        api.seed_point(test_point(9002, 102, 12, Some((3, "chromium"))))
            .await;
        let points = api
            .points_by_query("Web", &PointsQuery::for_cases(vec![102]))
            .await
            .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, 9002);
    }

    #[tokio::test]
    async fn injected_failure_surfaces() {
        let api = MemoryTestManagement::new();
        api.set_failures(Failures {
            create_run: Some(FailKind::Unauthorized),
            ..Failures::default()
        })
        .await;
        let err = api
            .create_run(
                "Web",
                &RunCreateModel {
                    name: "nightly".to_string(),
                    automated: true,
                    plan: ShallowReference::new("12"),
                    configuration_ids: vec![1],
                    comment: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn attachment_requires_existing_result() {
        let api = MemoryTestManagement::new();
        let err = api
            .create_attachment(
                "Web",
                1000,
                42,
                &AttachmentRequest {
                    attachment_type: "GeneralAttachment".to_string(),
                    file_name: "screenshot-ab.png".to_string(),
                    stream: "aGk=".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::NotFound { .. }));
    }
}
