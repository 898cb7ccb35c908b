mod api;
mod error;
mod models;

pub use api::TestManagement;
pub use error::RemoteError;
pub use models::{
    AttachmentReference, AttachmentRequest, CaseResult, PointsFilter, PointsQuery, PublishedResult,
    RunConfiguration, RunCreateModel, RunResultDetails, RunUpdateModel, ShallowReference,
    TeamProject, TestPoint, TestRun,
};
