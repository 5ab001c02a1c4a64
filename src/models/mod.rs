// Record types stored under `motorcycles/{id}` and `clients/{id}`

pub mod client;
pub mod motorcycle;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use client::{Client, ClientDraft};
pub use motorcycle::{Motorcycle, MotorcycleDraft, RentalStatus};

/// Reference to a locally persisted image.
///
/// Stored in records as a plain path string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which picture sequence of a record an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureField {
    /// `pictures` on motorcycles, `picture` on clients
    Primary,
    /// `documentPictures`
    Documents,
}

impl PictureField {
    pub fn wire_name(self, kind: RecordKind) -> &'static str {
        match (self, kind) {
            (PictureField::Primary, RecordKind::Motorcycle) => "pictures",
            (PictureField::Primary, RecordKind::Client) => "picture",
            (PictureField::Documents, _) => "documentPictures",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Motorcycle,
    Client,
}

impl RecordKind {
    /// Root collection path in the data store
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::Motorcycle => "motorcycles",
            RecordKind::Client => "clients",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Motorcycle => "motorcycle",
            RecordKind::Client => "client",
        }
    }

    pub fn path(self, id: &str) -> String {
        format!("{}/{}", self.collection(), id)
    }
}

/// Common surface of stored records
pub trait Record: Sized + Send + 'static {
    const KIND: RecordKind;

    fn from_value(id: &str, value: serde_json::Value) -> crate::Result<Self>;
    fn to_value(&self) -> crate::Result<serde_json::Value>;
    fn id(&self) -> &str;
    fn owned_images(&self) -> Vec<ImageRef>;
}

impl Record for Motorcycle {
    const KIND: RecordKind = RecordKind::Motorcycle;

    fn from_value(id: &str, value: serde_json::Value) -> crate::Result<Self> {
        Motorcycle::from_value(id, value)
    }

    fn to_value(&self) -> crate::Result<serde_json::Value> {
        Motorcycle::to_value(self)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owned_images(&self) -> Vec<ImageRef> {
        Motorcycle::owned_images(self)
    }
}

impl Record for Client {
    const KIND: RecordKind = RecordKind::Client;

    fn from_value(id: &str, value: serde_json::Value) -> crate::Result<Self> {
        Client::from_value(id, value)
    }

    fn to_value(&self) -> crate::Result<serde_json::Value> {
        Client::to_value(self)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owned_images(&self) -> Vec<ImageRef> {
        Client::owned_images(self)
    }
}

/// Identifier for a newly created record: creation time in epoch milliseconds.
pub fn new_record_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

pub(crate) fn require(value: &str, field: &'static str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::FleetError::Validation { field });
    }
    Ok(())
}
