// Image capture: camera access, normalization, local persistence

pub mod file_camera;
pub mod normalizer;
pub mod pipeline;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub use file_camera::FileCamera;
pub use normalizer::JpegNormalizer;
pub use pipeline::ImagePipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Raw photo as delivered by the camera, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl CapturedPhoto {
    pub fn now(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            captured_at: Utc::now(),
        }
    }
}

/// Device camera
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Camera: Send + Sync {
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Take one photo. `Ok(None)` means the user cancelled.
    async fn capture(&self) -> Result<Option<CapturedPhoto>>;
}

/// Resize, compress and re-encode a raw photo into the stored format.
pub trait ImageNormalizer: Send + Sync {
    fn normalize(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// File extension of the normalized output, without the dot
    fn extension(&self) -> &'static str;
}

/// Asked after every shot of a multi-capture whether to take another one.
#[async_trait]
pub trait CapturePrompt: Send + Sync {
    async fn continue_capturing(&self, captured_so_far: usize) -> bool;
}

/// Prompt that always answers the same; `AlwaysContinue(false)` gives single-shot behavior.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysContinue(pub bool);

#[async_trait]
impl CapturePrompt for AlwaysContinue {
    async fn continue_capturing(&self, _captured_so_far: usize) -> bool {
        self.0
    }
}
