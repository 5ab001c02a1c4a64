// Fleet - motorcycle rental core
// Records, rentals and photo capture over a realtime data store

pub mod camera;
pub mod cancel;
pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod records;
pub mod rentals;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use camera::{Camera, CapturePrompt, FileCamera, ImageNormalizer, ImagePipeline, JpegNormalizer};
pub use cancel::CancelScope;
pub use config::FleetConfig;
pub use error::{FleetError, Result};
pub use models::{Client, ClientDraft, ImageRef, Motorcycle, MotorcycleDraft, PictureField, RecordKind};
pub use records::{DeletionReport, RecordService, Repository};
pub use rentals::{RentalService, RentalWorkflow, Screen};
pub use store::{DataStore, MemoryStore, RealtimeStore};
pub use telemetry::{create_rental_span, generate_correlation_id, init_telemetry};
