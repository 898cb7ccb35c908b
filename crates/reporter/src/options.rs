use std::sync::Arc;

use casebridge_domain::{AttachmentKind, SuiteInfo};
use casebridge_remote::RunConfiguration;

/// Derives the run-creation configuration block from the default blueprint
/// and the suite description delivered at begin.
pub type RunConfigFn = Arc<dyn Fn(&RunConfiguration, &SuiteInfo) -> RunConfiguration + Send + Sync>;

/// When results are transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishMode {
    /// Each test is published as soon as it finishes.
    #[default]
    Immediate,
    /// Completions are buffered and flushed in chunks at end of run.
    Batched,
}

/// Caller-facing configuration surface.
///
/// Missing any of `token`, `plan_id`, `org_url`, `project_name` disables the
/// pipeline with a warning; it never fails hard.
#[derive(Default)]
pub struct ReporterOptions {
    pub token: Option<String>,
    pub plan_id: Option<u32>,
    pub org_url: Option<String>,
    pub project_name: Option<String>,
    pub publish_mode: PublishMode,
    pub logging: bool,
    pub disabled: bool,
    /// Prefixed onto the run title as `[environment]: `.
    pub environment: Option<String>,
    pub run_title: Option<String>,
    pub upload_attachments: bool,
    pub attachment_kinds: Option<Vec<AttachmentKind>>,
    pub run_config: Option<RunConfiguration>,
    pub run_config_fn: Option<RunConfigFn>,
}

/// Validated options the pipeline actually runs on.
pub(crate) struct PipelineConfig {
    pub token: String,
    pub plan_id: u32,
    pub org_url: String,
    pub project_name: String,
    pub publish_mode: PublishMode,
    pub logging: bool,
    pub run_title: String,
    pub upload_attachments: bool,
    pub attachment_kinds: Vec<AttachmentKind>,
    /// Uploads were enabled without an explicit allow-list.
    pub defaulted_kinds: bool,
    pub run_config: Option<RunConfiguration>,
    pub run_config_fn: Option<RunConfigFn>,
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("token", &self.token)
            .field("plan_id", &self.plan_id)
            .field("org_url", &self.org_url)
            .field("project_name", &self.project_name)
            .field("publish_mode", &self.publish_mode)
            .field("logging", &self.logging)
            .field("run_title", &self.run_title)
            .field("upload_attachments", &self.upload_attachments)
            .field("attachment_kinds", &self.attachment_kinds)
            .field("defaulted_kinds", &self.defaulted_kinds)
            .field("run_config", &self.run_config)
            .field("run_config_fn", &self.run_config_fn.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum OptionsError {
    #[error("'{0}' is not set")]
    Missing(&'static str),
}

impl ReporterOptions {
    pub(crate) fn validate(self) -> Result<PipelineConfig, OptionsError> {
        let org_url = self
            .org_url
            .filter(|s| !s.is_empty())
            .ok_or(OptionsError::Missing("org_url"))?;
        let project_name = self
            .project_name
            .filter(|s| !s.is_empty())
            .ok_or(OptionsError::Missing("project_name"))?;
        let plan_id = self
            .plan_id
            .filter(|id| *id > 0)
            .ok_or(OptionsError::Missing("plan_id"))?;
        let token = self
            .token
            .filter(|s| !s.is_empty())
            .ok_or(OptionsError::Missing("token"))?;

        let (attachment_kinds, defaulted_kinds) = if self.upload_attachments {
            match self.attachment_kinds {
                Some(kinds) if !kinds.is_empty() => (kinds, false),
                _ => (vec![AttachmentKind::Screenshot], true),
            }
        } else {
            (Vec::new(), false)
        };

        Ok(PipelineConfig {
            token,
            plan_id,
            org_url,
            project_name,
            publish_mode: self.publish_mode,
            logging: self.logging,
            run_title: compose_run_title(self.environment.as_deref(), self.run_title.as_deref()),
            upload_attachments: self.upload_attachments,
            attachment_kinds,
            defaulted_kinds,
            run_config: self.run_config,
            run_config_fn: self.run_config_fn,
        })
    }
}

fn compose_run_title(environment: Option<&str>, title: Option<&str>) -> String {
    let title = title.unwrap_or("Automated test run");
    match environment {
        Some(env) => format!("[{env}]: {title}"),
        None => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_options() -> ReporterOptions {
        ReporterOptions {
            token: Some("secret".to_string()),
            plan_id: Some(12),
            org_url: Some("https://dev.azure.com/acme".to_string()),
            project_name: Some("Web".to_string()),
            ..ReporterOptions::default()
        }
    }

    #[test]
    fn complete_options_validate() {
        let config = complete_options().validate().unwrap();
        assert_eq!(config.plan_id, 12);
        assert_eq!(config.run_title, "Automated test run");
        assert!(config.attachment_kinds.is_empty());
    }

    #[test]
    fn missing_org_url_is_reported_by_name() {
        let mut options = complete_options();
        options.org_url = None;
        let err = options.validate().unwrap_err();
        assert_eq!(err.to_string(), "'org_url' is not set");
    }

    #[test]
    fn missing_project_name_is_reported_by_name() {
        let mut options = complete_options();
        options.project_name = None;
        let err = options.validate().unwrap_err();
        assert_eq!(err.to_string(), "'project_name' is not set");
    }

    #[test]
    fn missing_plan_id_is_reported_by_name() {
        let mut options = complete_options();
        options.plan_id = None;
        let err = options.validate().unwrap_err();
        assert_eq!(err.to_string(), "'plan_id' is not set");
    }

    #[test]
    fn missing_token_is_reported_by_name() {
        let mut options = complete_options();
        options.token = None;
        let err = options.validate().unwrap_err();
        assert_eq!(err.to_string(), "'token' is not set");
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let mut options = complete_options();
        options.token = Some(String::new());
        assert!(options.validate().is_err());
    }

    #[test]
    fn zero_plan_id_counts_as_missing() {
        let mut options = complete_options();
        options.plan_id = Some(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn environment_prefixes_run_title() {
        let mut options = complete_options();
        options.environment = Some("staging".to_string());
        options.run_title = Some("nightly".to_string());
        let config = options.validate().unwrap();
        assert_eq!(config.run_title, "[staging]: nightly");
    }

    #[test]
    fn uploads_without_allow_list_default_to_screenshot() {
        let mut options = complete_options();
        options.upload_attachments = true;
        let config = options.validate().unwrap();
        assert_eq!(config.attachment_kinds, vec![AttachmentKind::Screenshot]);
        assert!(config.defaulted_kinds);
    }

    #[test]
    fn explicit_allow_list_is_kept() {
        let mut options = complete_options();
        options.upload_attachments = true;
        options.attachment_kinds = Some(vec![AttachmentKind::Video, AttachmentKind::Trace]);
        let config = options.validate().unwrap();
        assert_eq!(
            config.attachment_kinds,
            vec![AttachmentKind::Video, AttachmentKind::Trace]
        );
        assert!(!config.defaulted_kinds);
    }
}
