use async_trait::async_trait;
use imo_engine::{EngineError, Retrieved, Retriever};
use std::io::ErrorKind;
use tracing::trace;
use url::Url;

/// Serves `file://` URLs from the local filesystem.
///
/// A missing file answers like a `404`; other schemes fail outright.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRetriever;

#[async_trait]
impl Retriever for FsRetriever {
    async fn retrieve(&self, url: &Url) -> Result<Retrieved, EngineError> {
        if url.scheme() != "file" {
            return Err(EngineError::Retrieval {
                message: format!("unsupported scheme '{}'", url.scheme()).into(),
                context: Some(url.to_string().into()),
            });
        }

        let path = url.to_file_path().map_err(|()| EngineError::Retrieval {
            message: "not a local path".into(),
            context: Some(url.to_string().into()),
        })?;

        trace!(path = %path.display(), "Reading map from disk");
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Retrieved::success(url.clone(), body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Retrieved::status(404)),
            Err(e) => Err(EngineError::Retrieval {
                message: e.to_string().into(),
                context: Some(path.display().to_string().into()),
            }),
        }
    }
}
