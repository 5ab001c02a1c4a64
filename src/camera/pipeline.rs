use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{Camera, CapturePrompt, CapturedPhoto, ImageNormalizer, PermissionStatus};
use crate::cancel::CancelScope;
use crate::fs::FileSystemOperations;
use crate::models::ImageRef;
use crate::{FleetError, Result};

/// Camera capture, normalization and local persistence of photos.
///
/// Constructed once and handed to whatever needs pictures; every collaborator
/// is injected so tests can substitute fakes.
pub struct ImagePipeline {
    camera: Arc<dyn Camera>,
    normalizer: Arc<dyn ImageNormalizer>,
    fs: Arc<dyn FileSystemOperations>,
    directory: PathBuf,
    permission_granted: AtomicBool,
}

impl ImagePipeline {
    pub fn new(
        camera: Arc<dyn Camera>,
        normalizer: Arc<dyn ImageNormalizer>,
        fs: Arc<dyn FileSystemOperations>,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            camera,
            normalizer,
            fs,
            directory: directory.into(),
            permission_granted: AtomicBool::new(false),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn has_permission(&self) -> bool {
        self.permission_granted.load(Ordering::SeqCst)
    }

    /// Must succeed before any capture.
    pub async fn request_permission(&self) -> Result<()> {
        match self.camera.request_permission().await? {
            PermissionStatus::Granted => {
                self.permission_granted.store(true, Ordering::SeqCst);
                debug!("Camera permission granted");
                Ok(())
            }
            PermissionStatus::Denied => {
                self.permission_granted.store(false, Ordering::SeqCst);
                warn!("Camera permission denied");
                Err(FleetError::PermissionDenied)
            }
        }
    }

    /// Take one photo and persist it.
    ///
    /// Returns `Ok(None)` when the user cancelled the camera or when `scope`
    /// was cancelled while the capture was in flight; nothing is written then.
    pub async fn capture_one(&self, scope: &CancelScope) -> Result<Option<ImageRef>> {
        if !self.has_permission() {
            return Err(FleetError::PermissionDenied);
        }

        let Some(photo) = self.camera.capture().await? else {
            debug!("Capture cancelled by user");
            return Ok(None);
        };
        let Some(photo) = scope.admit(photo) else {
            debug!("Scope cancelled during capture, discarding photo");
            return Ok(None);
        };

        let normalized = self.normalize(photo.bytes.clone()).await?;
        if scope.is_cancelled() {
            debug!("Scope cancelled during normalization, discarding photo");
            return Ok(None);
        }

        let reference = self.persist(&photo, &normalized).await?;
        info!(image = %reference, bytes = normalized.len(), "Photo captured");
        Ok(Some(reference))
    }

    /// Keep capturing until the user cancels the camera or declines to continue.
    ///
    /// A failure after at least one photo was stored ends the sequence and
    /// returns what was captured so far, so no stored file goes unreferenced.
    pub async fn capture_multiple(
        &self,
        prompt: &dyn CapturePrompt,
        scope: &CancelScope,
    ) -> Result<Vec<ImageRef>> {
        let mut captured = Vec::new();
        loop {
            match self.capture_one(scope).await {
                Ok(Some(reference)) => captured.push(reference),
                Ok(None) => break,
                Err(e) if captured.is_empty() => return Err(e),
                Err(e) => {
                    warn!(error = %e, captured = captured.len(), "Capture failed, keeping earlier photos");
                    break;
                }
            }
            if !prompt.continue_capturing(captured.len()).await {
                break;
            }
        }
        debug!(count = captured.len(), "Multi-capture finished");
        Ok(captured)
    }

    /// Remove a stored photo. Never fails: errors are logged and reported as `false`.
    ///
    /// Deleting a photo that is already gone counts as success.
    pub async fn delete_image(&self, reference: &ImageRef) -> bool {
        if !self.fs.exists(reference.as_str()) {
            debug!(image = %reference, "Image already absent");
            return true;
        }
        match self.fs.remove_file(reference.as_str()).await {
            Ok(()) => {
                info!(image = %reference, "Image deleted");
                true
            }
            Err(e) => {
                error!(image = %reference, error = %e, "Failed to delete image");
                false
            }
        }
    }

    /// Delete several photos; returns the ones that could not be removed.
    pub async fn delete_images(&self, references: &[ImageRef]) -> Vec<ImageRef> {
        let mut failed = Vec::new();
        for reference in references {
            if !self.delete_image(reference).await {
                failed.push(reference.clone());
            }
        }
        failed
    }

    async fn normalize(&self, raw: Vec<u8>) -> Result<Vec<u8>> {
        let normalizer = Arc::clone(&self.normalizer);
        tokio::task::spawn_blocking(move || normalizer.normalize(&raw))
            .await
            .map_err(|e| FleetError::persistence("normalize image", e))?
    }

    async fn ensure_directory(&self) -> Result<()> {
        let dir = self.directory.to_string_lossy();
        if self.fs.exists(&dir) {
            return Ok(());
        }
        self.fs
            .create_dir_all(&dir)
            .await
            .map_err(|e| FleetError::persistence(format!("create {dir}"), e))?;
        info!(directory = %dir, "Created image directory");
        Ok(())
    }

    async fn persist(&self, photo: &CapturedPhoto, bytes: &[u8]) -> Result<ImageRef> {
        self.ensure_directory().await?;

        let stem = photo.captured_at.timestamp_millis();
        let extension = self.normalizer.extension();
        let mut target = self.directory.join(format!("{stem}.{extension}"));
        let mut suffix = 1;
        while self.fs.exists(&target.to_string_lossy()) {
            target = self.directory.join(format!("{stem}-{suffix}.{extension}"));
            suffix += 1;
        }

        let path = target.to_string_lossy().into_owned();
        self.fs
            .write(&path, bytes)
            .await
            .map_err(|e| FleetError::persistence(format!("write {path}"), e))?;
        Ok(ImageRef::from_path(&target))
    }
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("directory", &self.directory)
            .field("permission_granted", &self.has_permission())
            .finish()
    }
}
