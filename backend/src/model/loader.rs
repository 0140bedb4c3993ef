use std::fs;
use std::path::{Path, PathBuf};

use tch::{CModule, Device};

use crate::error::ServiceError;
use crate::model::classifier::Model;

pub const MODEL_FILE: &str = "dr_model.pt";

/// Canonical artifact location, fetched when the local file turns out to be
/// an un-smudged LFS pointer.
const MODEL_URL: &str =
    "https://raw.githubusercontent.com/dr-system/dr-system/main/backend/dr_model.pt";

/// Anything below this is a pointer file or truncated upload, not a network.
const PLACEHOLDER_MAX_BYTES: u64 = 100 * 1024;
/// A real artifact carries the full backbone and sits well above this.
const DOWNLOAD_MIN_BYTES: u64 = 10 * 1024 * 1024;

pub fn default_model_path() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        PathBuf::from(manifest_dir).join(MODEL_FILE)
    } else {
        PathBuf::from(MODEL_FILE)
    }
}

pub fn artifact_is_placeholder(len: u64) -> bool {
    len < PLACEHOLDER_MAX_BYTES
}

/// Attempts to produce a usable model handle. Never fails startup: every
/// problem is logged and collapses to `None`, which switches the service to
/// deterministic fallback responses. Loading happens once; there are no
/// retries after startup.
pub async fn load_trained_model(path: &Path) -> Option<Model> {
    match try_load(path).await {
        Ok(model) => {
            log::info!("Loaded model artifact from {}", path.display());
            Some(model)
        }
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}

async fn try_load(path: &Path) -> Result<Model, ServiceError> {
    let metadata = fs::metadata(path).map_err(|_| {
        ServiceError::ModelLoad(format!("no model artifact at {}", path.display()))
    })?;

    if artifact_is_placeholder(metadata.len()) {
        log::warn!(
            "Model artifact at {} is {} bytes, treating it as a placeholder reference",
            path.display(),
            metadata.len()
        );
        fetch_artifact(path).await?;
    }

    let device = Device::cuda_if_available();
    log::info!("Loading model on {:?}", device);
    let module = CModule::load_on_device(path, device).map_err(|e| {
        ServiceError::ModelLoad(format!("failed to load {}: {e}", path.display()))
    })?;
    Ok(Model::new(module, device))
}

async fn fetch_artifact(path: &Path) -> Result<(), ServiceError> {
    log::info!("Downloading model artifact from {MODEL_URL}");
    let response = reqwest::get(MODEL_URL)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ServiceError::ModelLoad(format!("artifact download failed: {e}")))?;
    let body = response
        .bytes()
        .await
        .map_err(|e| ServiceError::ModelLoad(format!("artifact download failed: {e}")))?;
    fs::write(path, &body).map_err(|e| {
        ServiceError::ModelLoad(format!("could not write {}: {e}", path.display()))
    })?;

    let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if len < DOWNLOAD_MIN_BYTES {
        return Err(ServiceError::ModelLoad(format!(
            "downloaded artifact is only {len} bytes, refusing to use it"
        )));
    }
    log::info!("Download complete, artifact is {len} bytes");
    Ok(())
}
