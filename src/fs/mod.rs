//! File system operations abstraction for testing
//!
//! This module provides a trait-based abstraction over the handful of file
//! system operations the image pipeline needs, so that it can be mocked in
//! tests using the `mockall` crate.
//!
//! # Examples
//!
//! ```rust,no_run
//! use fleet::fs::{FileSystemOperations, StandardFileSystem};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fs_ops: Arc<dyn FileSystemOperations> = Arc::new(StandardFileSystem);
//!
//!     fs_ops.create_dir_all(".fleet/images").await?;
//!     fs_ops.write(".fleet/images/1700000000000.jpg", b"...").await?;
//!
//!     if fs_ops.exists(".fleet/images/1700000000000.jpg") {
//!         fs_ops.remove_file(".fleet/images/1700000000000.jpg").await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
use anyhow::Result;
use std::path::Path;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Trait for file system operations that can be mocked in tests
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait::async_trait]
pub trait FileSystemOperations: Send + Sync {
    /// Create a directory and all its parent directories
    async fn create_dir_all(&self, path: &str) -> Result<()>;

    /// Write data to a file, creating the file if it doesn't exist
    async fn write(&self, path: &str, contents: &[u8]) -> Result<()>;

    /// Read a whole file
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Remove a file
    ///
    /// # Errors
    /// Fails when the file is missing; callers that want idempotent deletes
    /// check [`FileSystemOperations::exists`] first.
    async fn remove_file(&self, path: &str) -> Result<()>;

    /// Check if a path exists
    fn exists(&self, path: &str) -> bool;
}

/// Standard implementation that uses actual file system operations
pub struct StandardFileSystem;

#[async_trait::async_trait]
impl FileSystemOperations for StandardFileSystem {
    async fn create_dir_all(&self, path: &str) -> Result<()> {
        tokio::fs::create_dir_all(path).await.map_err(Into::into)
    }

    async fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        tokio::fs::write(path, contents).await.map_err(Into::into)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(Into::into)
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(path).await.map_err(Into::into)
    }

    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}
