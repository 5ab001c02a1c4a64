use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Camera, CapturedPhoto, PermissionStatus};
use crate::fs::{FileSystemOperations, StandardFileSystem};
use crate::{FleetError, Result};

/// Capture source backed by image files on disk.
///
/// Stands in for the device camera where there is none (CLI, tests): each
/// capture consumes the next queued file, and an empty queue behaves like the
/// user cancelling the camera.
pub struct FileCamera {
    queue: Mutex<VecDeque<PathBuf>>,
    fs: Arc<dyn FileSystemOperations>,
}

impl FileCamera {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::with_file_system(files, Arc::new(StandardFileSystem))
    }

    pub fn with_file_system<I, P>(files: I, fs: Arc<dyn FileSystemOperations>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            queue: Mutex::new(files.into_iter().map(Into::into).collect()),
            fs,
        }
    }

    pub async fn remaining(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn capture(&self) -> Result<Option<CapturedPhoto>> {
        let Some(next) = self.queue.lock().await.pop_front() else {
            debug!("No queued files left, treating capture as cancelled");
            return Ok(None);
        };
        let path = next.to_string_lossy();
        let bytes = self
            .fs
            .read(&path)
            .await
            .map_err(|e| FleetError::persistence(format!("read {path}"), e))?;
        Ok(Some(CapturedPhoto::now(bytes)))
    }
}

impl std::fmt::Debug for FileCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCamera").finish_non_exhaustive()
    }
}
