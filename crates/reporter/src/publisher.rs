use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{info, warn};

use casebridge_domain::{
    AttachmentArtifact, TestError, TestInfo, TestResultData, TestStatus, error_message_for,
    extract_case_ids, strip_ansi,
};
use casebridge_remote::{CaseResult, PublishedResult, RemoteError, ShallowReference};

use crate::attachments;
use crate::gate::{RunHandle, RunState};
use crate::lifecycle;
use crate::pipeline::Shared;
use crate::points::{self, ResolvedPoint};

/// Batched mode flushes this many tests per submission.
pub(crate) const BATCH_CHUNK_SIZE: usize = 50;

#[derive(Debug, thiserror::Error)]
pub(crate) enum PublishError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("submission response contained no results")]
    EmptyResponse,
}

/// A completion captured for end-of-run publishing.
///
/// Case ids are extracted at event time; the host may reuse its test objects
/// before the flush runs.
pub(crate) struct BufferedTest {
    pub title: String,
    pub case_ids: Vec<u32>,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error: Option<TestError>,
    pub attachments: Vec<AttachmentArtifact>,
}

impl BufferedTest {
    pub(crate) fn capture(test: &TestInfo, result: &TestResultData) -> Self {
        Self {
            title: test.title.clone(),
            case_ids: extract_case_ids(&test.title),
            status: result.status,
            duration_ms: result.duration_ms,
            error: result.error.clone(),
            attachments: result.attachments.clone(),
        }
    }
}

/// Immediate mode: publish each of a test's case ids independently and
/// concurrently. One case id's failure never blocks the others.
pub(crate) fn publish_immediate(shared: &Arc<Shared>, test: &TestInfo, result: &TestResultData) {
    let case_ids = extract_case_ids(&test.title);
    if case_ids.is_empty() {
        return;
    }
    for case_id in case_ids {
        let guard = shared.barrier.register();
        let shared = Arc::clone(shared);
        let test = test.clone();
        let result = result.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = publish_case(&shared, &test, &result, case_id).await {
                warn!(case_id, error = %e, "failed to publish test result");
            }
        });
    }
}

async fn publish_case(
    shared: &Arc<Shared>,
    test: &TestInfo,
    result: &TestResultData,
    case_id: u32,
) -> Result<(), PublishError> {
    let RunState::Ready(run) = lifecycle::ensure_run(shared).await else {
        return Ok(());
    };
    if shared.config.logging {
        info!(title = %test.title, case_id, "start publishing");
    }

    let Some(point) = points::resolve_single(shared, &run, case_id).await else {
        return Ok(());
    };
    let record = outcome_record(
        &test.title,
        result.status,
        result.duration_ms,
        result.error.as_ref(),
        case_id,
        &point,
    );
    let published = shared
        .api
        .add_results(&shared.config.project_name, run.run_id, &[record])
        .await?;
    let Some(first) = published.first() else {
        return Err(PublishError::EmptyResponse);
    };

    if shared.config.upload_attachments && !result.attachments.is_empty() {
        attachments::upload(shared, &run, &result.attachments, first.id, &test.title).await;
    }

    shared.published.fetch_add(1, Ordering::Relaxed);
    if shared.config.logging {
        info!(title = %test.title, "result published");
    }
    Ok(())
}

/// Batched mode: create the run (first use) and flush the buffer in strictly
/// sequential chunks.
pub(crate) async fn flush_buffered(shared: &Arc<Shared>, buffered: Vec<BufferedTest>) {
    if buffered.is_empty() {
        return;
    }
    let RunState::Ready(run) = lifecycle::ensure_run(shared).await else {
        return;
    };
    for chunk in buffered.chunks(BATCH_CHUNK_SIZE) {
        let _guard = shared.barrier.register();
        if let Err(e) = flush_chunk(shared, &run, chunk).await {
            warn!(error = %e, "failed to publish result chunk");
        }
    }
}

async fn flush_chunk(
    shared: &Arc<Shared>,
    run: &RunHandle,
    chunk: &[BufferedTest],
) -> Result<(), PublishError> {
    // One point query per chunk, over the deduplicated case-id set.
    let mut seen = HashSet::new();
    let mut case_ids = Vec::new();
    for test in chunk {
        for &case_id in &test.case_ids {
            if seen.insert(case_id) {
                case_ids.push(case_id);
            }
        }
    }
    if case_ids.is_empty() {
        return Ok(());
    }
    let resolved = points::resolve_batch(shared, run, &case_ids).await;

    let mut records = Vec::new();
    for test in chunk {
        for &case_id in &test.case_ids {
            let Some(point) = resolved.get(&case_id) else {
                continue;
            };
            records.push(outcome_record(
                &test.title,
                test.status,
                test.duration_ms,
                test.error.as_ref(),
                case_id,
                point,
            ));
        }
    }
    if records.is_empty() {
        return Ok(());
    }

    let published = shared
        .api
        .add_results(&shared.config.project_name, run.run_id, &records)
        .await?;
    shared.published.fetch_add(records.len(), Ordering::Relaxed);
    if shared.config.logging {
        info!(count = records.len(), "result chunk published");
    }

    if shared.config.upload_attachments {
        upload_for_chunk(shared, run, chunk, &published).await;
    }
    Ok(())
}

/// Recover which test each published record belongs to, then upload.
///
/// Multi-record submission responses carry ids but no source identity, so
/// identity is resolved with a follow-up query before any upload.
async fn upload_for_chunk(
    shared: &Arc<Shared>,
    run: &RunHandle,
    chunk: &[BufferedTest],
    published: &[PublishedResult],
) {
    if chunk.iter().all(|test| test.attachments.is_empty()) {
        return;
    }
    let details = match shared
        .api
        .results_for_run(&shared.config.project_name, run.run_id)
        .await
    {
        Ok(details) => details,
        Err(e) => {
            warn!(error = %e, "result correlation query failed; skipping attachments");
            return;
        }
    };

    let published_ids: HashSet<u64> = published.iter().map(|p| p.id).collect();
    for detail in details.iter().filter(|d| published_ids.contains(&d.id)) {
        let Some(case_id) = detail
            .test_case
            .as_ref()
            .and_then(|c| c.id.parse::<u32>().ok())
        else {
            continue;
        };
        let Some(title) = detail.test_case_title.as_deref() else {
            continue;
        };
        let Some(test) = chunk
            .iter()
            .find(|t| t.title == title && t.case_ids.contains(&case_id))
        else {
            continue;
        };
        if test.attachments.is_empty() {
            continue;
        }
        attachments::upload(shared, run, &test.attachments, detail.id, &test.title).await;
    }
}

fn outcome_record(
    title: &str,
    status: TestStatus,
    duration_ms: u64,
    error: Option<&TestError>,
    case_id: u32,
    point: &ResolvedPoint,
) -> CaseResult {
    CaseResult {
        test_case: ShallowReference::new(case_id.to_string()),
        test_point: ShallowReference::new(point.point_id.to_string()),
        test_case_title: title.to_string(),
        outcome: status.outcome().as_str().to_string(),
        state: "Completed".to_string(),
        duration_in_ms: duration_ms,
        error_message: error.map(|e| error_message_for(title, &e.message)),
        stack_trace: error
            .and_then(|e| e.stack.as_deref())
            .map(strip_ansi),
        configuration: point.configuration.clone(),
    }
}
