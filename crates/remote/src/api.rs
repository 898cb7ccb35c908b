use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{
    AttachmentReference, AttachmentRequest, CaseResult, PointsQuery, PublishedResult,
    RunCreateModel, RunResultDetails, RunUpdateModel, TeamProject, TestPoint, TestRun,
};

/// Narrow client contract against the remote test-management service.
///
/// Created once, shared across the pipeline. This is deliberately not a
/// general-purpose client: only the operations the publishing pipeline needs
/// are modeled.
#[async_trait]
pub trait TestManagement: Send + Sync {
    /// Look up a project by name. `Ok(None)` means the project does not
    /// exist, which callers treat as expected absence rather than an error.
    async fn get_project(&self, name: &str) -> Result<Option<TeamProject>, RemoteError>;

    async fn create_run(
        &self,
        project: &str,
        model: &RunCreateModel,
    ) -> Result<TestRun, RemoteError>;

    async fn update_run(
        &self,
        project: &str,
        run_id: u64,
        update: &RunUpdateModel,
    ) -> Result<TestRun, RemoteError>;

    /// Query test points by case-id set.
    async fn points_by_query(
        &self,
        project: &str,
        query: &PointsQuery,
    ) -> Result<Vec<TestPoint>, RemoteError>;

    /// Submit outcome records to a run.
    ///
    /// Implementations must route every submission through the pinned legacy
    /// protocol version; the response carries server-assigned result ids but
    /// no source identity.
    async fn add_results(
        &self,
        project: &str,
        run_id: u64,
        results: &[CaseResult],
    ) -> Result<Vec<PublishedResult>, RemoteError>;

    /// Query a run's results, used to correlate published result ids back to
    /// their originating records after a multi-record submission.
    async fn results_for_run(
        &self,
        project: &str,
        run_id: u64,
    ) -> Result<Vec<RunResultDetails>, RemoteError>;

    /// Bind an attachment to a published result.
    async fn create_attachment(
        &self,
        project: &str,
        run_id: u64,
        result_id: u64,
        attachment: &AttachmentRequest,
    ) -> Result<AttachmentReference, RemoteError>;
}
