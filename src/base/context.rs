//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `NetError` variants while keeping
//! the OS-level cause intact.

use crate::base::neterror::NetError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Attach the path being operated on to an IO error.
    ///
    /// The error kind and the original error stay reachable through
    /// [`std::error::Error::source`].
    ///
    /// # Example
    /// ```ignore
    /// use reqkit::base::context::IoResultExt;
    ///
    /// let file = std::fs::File::open(path).file_context(path)?;
    /// // Error: "/tmp/missing.bin: No such file or directory (os error 2)"
    /// ```
    fn file_context(self, path: &Path) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn file_context(self, path: &Path) -> Result<T, NetError> {
        self.map_err(|e| {
            let kind = e.kind();
            NetError::Io(io::Error::new(
                kind,
                PathError {
                    path: path.display().to_string(),
                    source: e,
                },
            ))
        })
    }
}

/// An IO error annotated with the path that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{path}: {source}")]
struct PathError {
    path: String,
    #[source]
    source: io::Error,
}
