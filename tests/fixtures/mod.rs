//! Shared fakes and seeded stores for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use fleet::camera::{Camera, CapturePrompt, CapturedPhoto, ImageNormalizer, PermissionStatus};
use fleet::fs::StandardFileSystem;
use fleet::{ImagePipeline, MemoryStore, RecordService, RentalService, Repository};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One scripted camera outcome
#[derive(Debug, Clone)]
pub enum Shot {
    Photo(Vec<u8>),
    Cancel,
    Fail,
}

/// Camera that replays a fixed script; an exhausted script cancels.
pub struct ScriptedCamera {
    permission: PermissionStatus,
    shots: Mutex<VecDeque<Shot>>,
}

impl ScriptedCamera {
    pub fn new(shots: impl IntoIterator<Item = Shot>) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            shots: Mutex::new(shots.into_iter().collect()),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: PermissionStatus::Denied,
            shots: Mutex::new(VecDeque::new()),
        }
    }

    pub fn photos(count: usize) -> Self {
        Self::new((0..count).map(|i| Shot::Photo(vec![i as u8; 16])))
    }
}

#[async_trait]
impl Camera for ScriptedCamera {
    async fn request_permission(&self) -> fleet::Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn capture(&self) -> fleet::Result<Option<CapturedPhoto>> {
        let next = self.shots.lock().unwrap().pop_front();
        match next {
            Some(Shot::Photo(bytes)) => Ok(Some(CapturedPhoto::now(bytes))),
            Some(Shot::Fail) => Err(fleet::FleetError::Store("camera unavailable".into())),
            Some(Shot::Cancel) | None => Ok(None),
        }
    }
}

/// Prompt answering from a list, then declining.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<bool>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
        }
    }
}

#[async_trait]
impl CapturePrompt for ScriptedPrompt {
    async fn continue_capturing(&self, _captured_so_far: usize) -> bool {
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Normalizer that stores the raw bytes unchanged.
pub struct PassThrough;

impl ImageNormalizer for PassThrough {
    fn normalize(&self, raw: &[u8]) -> fleet::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn extension(&self) -> &'static str {
        "jpg"
    }
}

/// The two-record fleet used throughout the rental tests.
pub fn fleet_data() -> Value {
    json!({
        "motorcycles": {
            "m1": {
                "name": "CG 160",
                "brand": "Honda",
                "year": 2022,
                "type": "street",
                "isAvailable": true
            }
        },
        "clients": {
            "c1": {"name": "Ana", "address": "Rua das Flores, 10", "phone": "+55 (11) 91234-5678"}
        }
    })
}

/// Services over a seeded in-memory store, with images under a temp dir.
pub struct Harness {
    pub dir: TempDir,
    pub store: MemoryStore,
    pub pipeline: Arc<ImagePipeline>,
    pub records: RecordService,
    pub rentals: RentalService,
}

impl Harness {
    pub fn new(data: Value, camera: ScriptedCamera) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::with_data(data);
        let repo = Repository::new(Arc::new(store.clone()));
        let pipeline = Arc::new(ImagePipeline::new(
            Arc::new(camera),
            Arc::new(PassThrough),
            Arc::new(StandardFileSystem),
            dir.path().join("images"),
        ));
        Self {
            records: RecordService::new(repo.clone(), Arc::clone(&pipeline)),
            rentals: RentalService::new(repo),
            store,
            pipeline,
            dir,
        }
    }

    pub fn seeded() -> Self {
        Self::new(fleet_data(), ScriptedCamera::photos(0))
    }

    pub async fn motorcycle(&self, id: &str) -> Value {
        self.store.dump().await["motorcycles"][id].clone()
    }
}

/// Encoded PNG of the given size, for exercising the real normalizer.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
