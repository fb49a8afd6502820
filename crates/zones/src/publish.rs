//! Publish sink for the assembled scoreboard document.
//!
//! The sink treats the document as an opaque blob; whatever serves the
//! site reads the same object back. A publish failure is fatal for the
//! run so a half-written scoreboard is never reported as success.

use std::sync::Arc;

use bytes::Bytes;
use object_store::{ObjectStore, local::LocalFileSystem, path::Path};

use crate::errors::AppError;
use crate::models::ScoreboardDocument;

#[derive(Clone, Debug)]
pub struct ScoreboardSink {
    store: Arc<dyn ObjectStore>,
    path: Path,
}

impl ScoreboardSink {
    pub fn new_local(base_path: String) -> Self {
        std::fs::create_dir_all(&base_path).ok();
        let store = Arc::new(LocalFileSystem::new_with_prefix(&base_path).unwrap());
        Self {
            store,
            path: Path::from("scores.json"),
        }
    }

    /// For deployments that publish somewhere other than local disk.
    pub fn new_with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            path: Path::from("scores.json"),
        }
    }

    pub async fn publish(&self, document: &ScoreboardDocument) -> Result<(), AppError> {
        let body = serde_json::to_vec_pretty(document)?;

        self.store.put(&self.path, Bytes::from(body).into()).await?;

        Ok(())
    }

    /// The most recently published document, if any run has completed.
    pub async fn latest(&self) -> Result<Option<ScoreboardDocument>, AppError> {
        let result = match self.store.get(&self.path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let bytes = result.bytes().await?;
        let document = serde_json::from_slice(&bytes)?;

        Ok(Some(document))
    }
}
