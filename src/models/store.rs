//! Local model files, fetched once from a configured mirror when missing

use crate::error::PipelineError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Locate `filename` under `model_dir`, downloading it from `base_url` when
/// it is not cached yet
pub fn ensure_model(
    model_dir: &Path,
    filename: &str,
    base_url: Option<&str>,
) -> Result<PathBuf, PipelineError> {
    let model_path = model_dir.join(filename);
    if model_path.exists() {
        tracing::debug!("Using cached model from {:?}", model_path);
        return Ok(model_path);
    }

    let Some(base_url) = base_url else {
        return Err(PipelineError::ModelUnavailable(format!(
            "{} not found in {:?}",
            filename, model_dir
        )));
    };

    std::fs::create_dir_all(model_dir).map_err(|e| {
        PipelineError::ModelUnavailable(format!("Failed to create model directory: {}", e))
    })?;

    let url = model_url(base_url, filename);
    tracing::info!("Downloading {} (this may take a moment)...", url);
    download_file(&url, &model_path)?;
    tracing::info!("Downloaded {} to {:?}", filename, model_path);

    Ok(model_path)
}

fn model_url(base_url: &str, filename: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), filename)
}

/// Download to a sibling temp path and rename, so an interrupted download
/// never leaves a truncated model behind
fn download_file(url: &str, path: &Path) -> Result<(), PipelineError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| PipelineError::ModelUnavailable(format!("Failed to download model: {}", e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        PipelineError::ModelUnavailable(format!("Failed to read response body: {}", e))
    })?;

    write_model(path, &buffer)
}

/// Write through a sibling `.part` file, removed again if anything fails
fn write_model(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let partial = path.with_extension("part");
    let written = File::create(&partial)
        .and_then(|mut file| file.write_all(bytes))
        .and_then(|()| std::fs::rename(&partial, path));

    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(PipelineError::ModelUnavailable(format!(
            "Failed to write model file {:?}: {}",
            path, e
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_without_mirror_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_model(dir.path(), "orientation.rten", None).unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable(_)));
    }

    #[test]
    fn test_cached_model_is_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("layout.rten"), b"weights").unwrap();

        let path = ensure_model(dir.path(), "layout.rten", None).unwrap();
        assert_eq!(path, dir.path().join("layout.rten"));
    }

    #[test]
    fn test_write_model_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.rten");

        write_model(&path, b"weights").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"weights");
        assert!(!dir.path().join("layout.part").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the final rename fail
        let path = dir.path().join("layout.rten");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = write_model(&path, b"weights").unwrap_err();

        assert!(matches!(err, PipelineError::ModelUnavailable(_)));
        assert!(!dir.path().join("layout.part").exists());
    }

    #[test]
    fn test_model_url_joins_without_double_slash() {
        assert_eq!(
            model_url("https://models.example.com/v1/", "layout.rten"),
            "https://models.example.com/v1/layout.rten"
        );
    }
}
