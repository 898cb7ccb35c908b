use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use tracing::{info, warn};

use casebridge_domain::{AttachmentArtifact, AttachmentKind};
use casebridge_remote::{AttachmentRequest, RemoteError};

use crate::gate::RunHandle;
use crate::pipeline::Shared;

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("attachment {0} does not exist")]
    Missing(PathBuf),

    #[error("failed to read attachment: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Upload a result's qualifying artifacts, returning their remote URLs.
///
/// Artifacts outside the allow-list are skipped; a failed artifact is
/// warned about and dropped without aborting the rest.
pub(crate) async fn upload(
    shared: &Arc<Shared>,
    run: &RunHandle,
    artifacts: &[AttachmentArtifact],
    result_id: u64,
    title: &str,
) -> Vec<String> {
    if shared.config.logging {
        info!(title = %title, result_id, "uploading attachments");
    }
    let mut urls = Vec::new();
    for artifact in artifacts {
        let Ok(kind) = artifact.name.parse::<AttachmentKind>() else {
            continue;
        };
        if !shared.config.attachment_kinds.contains(&kind) {
            continue;
        }
        match upload_one(shared, run, artifact, kind, result_id).await {
            Ok(url) => urls.push(url),
            Err(e) => {
                warn!(path = %artifact.path.display(), error = %e, "failed to upload attachment");
            }
        }
    }
    urls
}

async fn upload_one(
    shared: &Arc<Shared>,
    run: &RunHandle,
    artifact: &AttachmentArtifact,
    kind: AttachmentKind,
    result_id: u64,
) -> Result<String, UploadError> {
    let data = match tokio::fs::read(&artifact.path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::Missing(artifact.path.clone()));
        }
        Err(e) => return Err(UploadError::Io(e)),
    };

    let subtype = artifact.content_type.split('/').nth(1).unwrap_or("bin");
    let request = AttachmentRequest {
        attachment_type: "GeneralAttachment".to_string(),
        file_name: format!("{}-{}.{subtype}", kind.as_str(), random_hex()),
        stream: STANDARD.encode(&data),
    };
    let reference = shared
        .api
        .create_attachment(&shared.config.project_name, run.run_id, result_id, &request)
        .await?;
    Ok(reference.url)
}

fn random_hex() -> String {
    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_hex_is_32_hex_chars() {
        let name = random_hex();
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(random_hex(), name);
    }
}
