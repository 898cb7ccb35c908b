use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use casebridge_domain::{SuiteInfo, TestInfo, TestResultData};
use casebridge_remote::{RunUpdateModel, TestManagement};
use casebridge_remote_http::{HttpClientConfig, HttpTestManagement};

use crate::barrier::CompletionBarrier;
use crate::gate::{RunGate, RunState};
use crate::lifecycle;
use crate::options::{PipelineConfig, PublishMode, ReporterOptions};
use crate::pipeline::Shared;
use crate::publisher::{self, BufferedTest};
use crate::state::{PipelineState, StateCell};

/// The publishing pipeline, wired to the host's three lifecycle events.
///
/// Publishing is best-effort: failures are logged and never surface to the
/// host, so its own pass/fail reporting is never perturbed.
pub struct Reporter {
    pipeline: Option<Arc<Shared>>,
    buffer: Mutex<Vec<BufferedTest>>,
}

impl Reporter {
    /// Build a reporter talking to the real service.
    ///
    /// Invalid options disable the pipeline with a warning instead of
    /// failing; a disabled reporter never makes a remote call.
    pub fn new(options: ReporterOptions) -> Self {
        if options.disabled {
            return Self::disabled_reporter();
        }
        let config = match options.validate() {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; reporting is disabled");
                return Self::disabled_reporter();
            }
        };
        let api = HttpTestManagement::new(HttpClientConfig::new(
            config.org_url.clone(),
            config.token.clone(),
        ));
        match api {
            Ok(api) => Self::from_parts(config, Arc::new(api)),
            Err(e) => {
                warn!(error = %e, "failed to construct remote client; reporting is disabled");
                Self::disabled_reporter()
            }
        }
    }

    /// Build a reporter over an explicit backend.
    pub fn with_api(options: ReporterOptions, api: Arc<dyn TestManagement>) -> Self {
        if options.disabled {
            return Self::disabled_reporter();
        }
        match options.validate() {
            Ok(config) => Self::from_parts(config, api),
            Err(e) => {
                warn!("{e}; reporting is disabled");
                Self::disabled_reporter()
            }
        }
    }

    fn from_parts(config: PipelineConfig, api: Arc<dyn TestManagement>) -> Self {
        if config.defaulted_kinds {
            warn!("'attachment_kinds' is not set; defaulting to screenshot only");
        }
        Self {
            pipeline: Some(Arc::new(Shared {
                api,
                config,
                state: StateCell::new(),
                gate: RunGate::new(),
                barrier: Arc::new(CompletionBarrier::new()),
                published: AtomicUsize::new(0),
                suite: Mutex::new(SuiteInfo::default()),
            })),
            buffer: Mutex::new(Vec::new()),
        }
    }

    fn disabled_reporter() -> Self {
        Self {
            pipeline: None,
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// The host calls this once, before any test finishes.
    pub async fn on_begin(&self, suite: SuiteInfo) {
        let Some(shared) = self.active() else {
            return;
        };
        *shared.suite.lock().unwrap() = suite;
        if let PublishMode::Immediate = shared.config.publish_mode {
            lifecycle::ensure_run(shared).await;
        }
    }

    /// The host calls this once per finished test.
    pub async fn on_test_end(&self, test: TestInfo, result: TestResultData) {
        let Some(shared) = self.active() else {
            return;
        };
        if shared.config.logging {
            info!(title = %test.title, status = %result.status, "test finished");
        }
        match shared.config.publish_mode {
            PublishMode::Immediate => publisher::publish_immediate(shared, &test, &result),
            PublishMode::Batched => self
                .buffer
                .lock()
                .unwrap()
                .push(BufferedTest::capture(&test, &result)),
        }
    }

    /// The host calls this once, after the last test.
    ///
    /// Flushes buffered results (batched mode), waits for every in-flight
    /// publish, then marks the run completed. With nothing published and no
    /// run created this is a no-op.
    pub async fn on_end(&self) {
        let Some(shared) = self.active() else {
            return;
        };
        if let PublishMode::Batched = shared.config.publish_mode {
            let buffered = std::mem::take(&mut *self.buffer.lock().unwrap());
            publisher::flush_buffered(shared, buffered).await;
        }
        shared.barrier.drain(shared.config.logging).await;

        let run = match shared.gate.resolved() {
            Some(RunState::Ready(run)) => run,
            _ => {
                if shared.published.load(Ordering::Relaxed) == 0 && shared.config.logging {
                    info!("no test cases were matched; ensure tests are declared correctly");
                }
                return;
            }
        };
        match shared
            .api
            .update_run(
                &shared.config.project_name,
                run.run_id,
                &RunUpdateModel::completed(),
            )
            .await
        {
            Ok(updated) => {
                if shared.config.logging {
                    info!(
                        run_id = run.run_id,
                        state = updated.state.as_deref().unwrap_or("Completed"),
                        "run completed"
                    );
                }
            }
            Err(e) => warn!(error = %e, "error completing run"),
        }
    }

    /// The pipeline writes its progress and warnings to the process's
    /// standard streams; hosts use this to avoid interleaving output.
    pub fn prints_to_stdio(&self) -> bool {
        true
    }

    pub fn state(&self) -> PipelineState {
        match &self.pipeline {
            Some(shared) => shared.state.get(),
            None => PipelineState::Disabled,
        }
    }

    /// Outcome records successfully submitted so far.
    pub fn published_count(&self) -> usize {
        self.pipeline
            .as_ref()
            .map_or(0, |shared| shared.published.load(Ordering::Relaxed))
    }

    fn active(&self) -> Option<&Arc<Shared>> {
        let shared = self.pipeline.as_ref()?;
        match shared.state.get() {
            PipelineState::Active => Some(shared),
            PipelineState::Disabled => None,
        }
    }
}
