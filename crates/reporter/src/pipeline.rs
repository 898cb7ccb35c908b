use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use casebridge_domain::SuiteInfo;
use casebridge_remote::TestManagement;

use crate::barrier::CompletionBarrier;
use crate::gate::RunGate;
use crate::options::PipelineConfig;
use crate::state::StateCell;

/// State shared by every pipeline component.
///
/// The client handle is created once and reused for the pipeline's lifetime;
/// the gate, state cell, and barrier are the only coordination points.
pub(crate) struct Shared {
    pub api: Arc<dyn TestManagement>,
    pub config: PipelineConfig,
    pub state: StateCell,
    pub gate: RunGate,
    pub barrier: Arc<CompletionBarrier>,
    pub published: AtomicUsize,
    pub suite: Mutex<SuiteInfo>,
}
