use async_trait::async_trait;
use serde::Deserialize;

use casebridge_remote::{
    AttachmentReference, AttachmentRequest, CaseResult, PointsQuery, PublishedResult, RemoteError,
    RunCreateModel, RunResultDetails, RunUpdateModel, TeamProject, TestManagement, TestPoint,
    TestRun,
};

use crate::config::HttpClientConfig;
use crate::http::{ATTACHMENTS_API_VERSION, DEFAULT_API_VERSION, HttpBackend, RESULTS_API_VERSION};

/// `TestManagement` backend speaking the service's REST contract.
pub struct HttpTestManagement {
    backend: HttpBackend,
}

/// List envelope used by result collections.
#[derive(Debug, Deserialize)]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

/// Envelope of the point-query response.
#[derive(Debug, Deserialize)]
struct PointsResponse {
    #[serde(default = "Vec::new")]
    points: Vec<TestPoint>,
}

impl HttpTestManagement {
    pub fn new(config: HttpClientConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            backend: HttpBackend::new(&config)?,
        })
    }
}

#[async_trait]
impl TestManagement for HttpTestManagement {
    async fn get_project(&self, name: &str) -> Result<Option<TeamProject>, RemoteError> {
        let url = self
            .backend
            .versioned_url(&format!("_apis/projects/{name}"), DEFAULT_API_VERSION);
        match self.backend.get_json::<TeamProject>(&url).await {
            Ok(project) => Ok(Some(project)),
            Err(RemoteError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_run(
        &self,
        project: &str,
        model: &RunCreateModel,
    ) -> Result<TestRun, RemoteError> {
        let url = self
            .backend
            .versioned_url(&format!("{project}/_apis/test/runs"), DEFAULT_API_VERSION);
        self.backend.post_json(&url, model).await
    }

    async fn update_run(
        &self,
        project: &str,
        run_id: u64,
        update: &RunUpdateModel,
    ) -> Result<TestRun, RemoteError> {
        let url = self.backend.versioned_url(
            &format!("{project}/_apis/test/runs/{run_id}"),
            DEFAULT_API_VERSION,
        );
        self.backend.patch_json(&url, update).await
    }

    async fn points_by_query(
        &self,
        project: &str,
        query: &PointsQuery,
    ) -> Result<Vec<TestPoint>, RemoteError> {
        let url = self
            .backend
            .versioned_url(&format!("{project}/_apis/test/points"), DEFAULT_API_VERSION);
        let response: PointsResponse = self.backend.post_json(&url, query).await?;
        Ok(response.points)
    }

    async fn add_results(
        &self,
        project: &str,
        run_id: u64,
        results: &[CaseResult],
    ) -> Result<Vec<PublishedResult>, RemoteError> {
        // Every submission goes through the pinned legacy version; this is
        // not configurable (see RESULTS_API_VERSION).
        let url = self.backend.versioned_url(
            &format!("{project}/_apis/test/Runs/{run_id}/results"),
            RESULTS_API_VERSION,
        );
        let response: ValueList<PublishedResult> = self.backend.post_json(&url, &results).await?;
        Ok(response.value)
    }

    async fn results_for_run(
        &self,
        project: &str,
        run_id: u64,
    ) -> Result<Vec<RunResultDetails>, RemoteError> {
        let url = self.backend.versioned_url(
            &format!("{project}/_apis/test/Runs/{run_id}/results"),
            DEFAULT_API_VERSION,
        );
        let response: ValueList<RunResultDetails> = self.backend.get_json(&url).await?;
        Ok(response.value)
    }

    async fn create_attachment(
        &self,
        project: &str,
        run_id: u64,
        result_id: u64,
        attachment: &AttachmentRequest,
    ) -> Result<AttachmentReference, RemoteError> {
        let url = self.backend.versioned_url(
            &format!("{project}/_apis/test/Runs/{run_id}/Results/{result_id}/attachments"),
            ATTACHMENTS_API_VERSION,
        );
        self.backend.post_json(&url, attachment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_from_config() {
        let client =
            HttpTestManagement::new(HttpClientConfig::new("https://dev.azure.com/acme", "secret"));
        assert!(client.is_ok());
    }

    #[test]
    fn value_list_tolerates_missing_value() {
        let list: ValueList<PublishedResult> = serde_json::from_str(r#"{"count":0}"#).unwrap();
        assert!(list.value.is_empty());
    }

    #[test]
    fn points_response_tolerates_missing_points() {
        let response: PointsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.points.is_empty());
    }
}
