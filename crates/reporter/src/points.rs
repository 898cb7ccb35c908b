use std::collections::HashMap;

use tracing::warn;

use casebridge_remote::{PointsQuery, ShallowReference, TestPoint};

use crate::gate::RunHandle;
use crate::pipeline::Shared;

/// A test point resolved for one case id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedPoint {
    pub point_id: u64,
    /// Present only when the point matched one of the run's configurations.
    pub configuration: Option<ShallowReference>,
}

/// Resolve one case id with a fresh query.
pub(crate) async fn resolve_single(
    shared: &Shared,
    run: &RunHandle,
    case_id: u32,
) -> Option<ResolvedPoint> {
    let query = PointsQuery::for_cases(vec![case_id]);
    match shared
        .api
        .points_by_query(&shared.config.project_name, &query)
        .await
    {
        Ok(points) => {
            let resolved = select_point(
                &points,
                shared.config.plan_id,
                &run.configuration_ids,
                case_id,
            );
            if resolved.is_none() {
                warn!(
                    case_id,
                    plan_id = shared.config.plan_id,
                    "no test point found for case; check the configured plan id"
                );
            }
            resolved
        }
        Err(e) => {
            warn!(case_id, error = %e, "test point query failed");
            None
        }
    }
}

/// Resolve a whole chunk's case ids with a single query.
///
/// A partial batch is not a failure; only a batch where nothing resolved
/// warrants a batch-level warning.
pub(crate) async fn resolve_batch(
    shared: &Shared,
    run: &RunHandle,
    case_ids: &[u32],
) -> HashMap<u32, ResolvedPoint> {
    if case_ids.is_empty() {
        return HashMap::new();
    }
    let query = PointsQuery::for_cases(case_ids.to_vec());
    let points = match shared
        .api
        .points_by_query(&shared.config.project_name, &query)
        .await
    {
        Ok(points) => points,
        Err(e) => {
            warn!(error = %e, "test point batch query failed");
            return HashMap::new();
        }
    };

    let mut resolved = HashMap::new();
    for &case_id in case_ids {
        if let Some(point) = select_point(
            &points,
            shared.config.plan_id,
            &run.configuration_ids,
            case_id,
        ) {
            resolved.insert(case_id, point);
        }
    }
    if resolved.is_empty() {
        warn!(
            case_ids = ?case_ids,
            plan_id = shared.config.plan_id,
            "no test points found for any case in batch; check the configured plan id"
        );
    }
    resolved
}

/// Pick the point for a case id among a query's results.
///
/// A point matching both the plan and one of the run's configuration ids
/// wins over a plan-only match, regardless of result order. A case with no
/// plan match is unresolved.
pub(crate) fn select_point(
    points: &[TestPoint],
    plan_id: u32,
    selection: &[u32],
    case_id: u32,
) -> Option<ResolvedPoint> {
    let candidates: Vec<&TestPoint> = points
        .iter()
        .filter(|p| point_case_id(p) == Some(case_id) && point_plan_id(p) == Some(plan_id))
        .collect();

    for point in &candidates {
        if let Some(configuration) = &point.configuration {
            if configuration
                .id
                .parse::<u32>()
                .is_ok_and(|id| selection.contains(&id))
            {
                return Some(ResolvedPoint {
                    point_id: point.id,
                    configuration: Some(configuration.clone()),
                });
            }
        }
    }

    candidates.first().map(|point| ResolvedPoint {
        point_id: point.id,
        configuration: None,
    })
}

fn point_case_id(point: &TestPoint) -> Option<u32> {
    point.test_case.id.parse().ok()
}

fn point_plan_id(point: &TestPoint) -> Option<u32> {
    point.test_plan.as_ref()?.id.parse().ok()
}
