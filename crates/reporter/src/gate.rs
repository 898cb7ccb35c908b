use std::future::Future;

use tokio::sync::OnceCell;

/// The remote run as created for this pipeline: its id plus the
/// configuration selection that was actually sent. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub run_id: u64,
    pub configuration_ids: Vec<u32>,
}

/// Terminal resolution of the run gate.
#[derive(Debug, Clone)]
pub(crate) enum RunState {
    Ready(RunHandle),
    Disabled,
}

/// One-shot broadcast gate for the remote run.
///
/// Creation runs at most once; every concurrent and subsequent awaiter
/// observes the same resolved state, never a re-trigger.
#[derive(Default)]
pub(crate) struct RunGate {
    cell: OnceCell<RunState>,
}

impl RunGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn ensure<F, Fut>(&self, create: F) -> RunState
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RunState>,
    {
        self.cell.get_or_init(create).await.clone()
    }

    /// The resolved state, if creation has already run.
    pub(crate) fn resolved(&self) -> Option<RunState> {
        self.cell.get().cloned()
    }
}
