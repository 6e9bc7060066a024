//! Where upload bytes come from.
//!
//! A [`FileSource`] is attached to a multipart field and read exactly once
//! while the form is assembled. Each variant knows how to produce a reader
//! and a display filename.

use bytes::Bytes;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Content type used for file parts that do not declare one.
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// A file received earlier, typically from an inbound multipart request, that
/// is being forwarded upstream.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    storage: UploadStorage,
}

#[derive(Debug, Clone)]
enum UploadStorage {
    Memory(Bytes),
    Disk(PathBuf),
}

impl UploadedFile {
    /// An upload held in memory.
    pub fn in_memory<N, B>(file_name: N, data: B) -> Self
    where
        N: Into<String>,
        B: Into<Bytes>,
    {
        Self {
            file_name: file_name.into(),
            content_type: None,
            storage: UploadStorage::Memory(data.into()),
        }
    }

    /// An upload spooled to a temporary file.
    pub fn on_disk<N, P>(file_name: N, path: P) -> Self
    where
        N: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            file_name: file_name.into(),
            content_type: None,
            storage: UploadStorage::Disk(path.into()),
        }
    }

    /// Set the content type declared by the original sender.
    pub fn content_type<S: Into<String>>(mut self, mime: S) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    /// Filename declared by the original sender.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn declared_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Open the upload for reading. The returned reader owns any file handle
    /// it opened and closes it on drop.
    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        match &self.storage {
            UploadStorage::Memory(data) => Ok(Box::new(Cursor::new(data.clone()))),
            UploadStorage::Disk(path) => Ok(Box::new(File::open(path)?)),
        }
    }
}

/// Source of an upload part.
pub enum FileSource {
    /// A filesystem path, opened and closed by the assembler.
    Path(PathBuf),
    /// An already open file. Read from its current position and never closed
    /// by the assembler; the caller keeps its own `Arc`.
    Handle { file: Arc<File>, path: PathBuf },
    /// An arbitrary reader with an explicit filename.
    Reader {
        file_name: String,
        reader: Box<dyn Read + Send>,
    },
    /// A previously-received upload.
    Upload(UploadedFile),
    /// Anything else. Carries the source type name for the error message.
    Unrecognized(&'static str),
}

impl FileSource {
    pub fn path<P: Into<PathBuf>>(path: P) -> Self {
        FileSource::Path(path.into())
    }

    /// Wrap an open file. `path` is only used for the part filename and
    /// error messages.
    pub fn handle<P: Into<PathBuf>>(file: Arc<File>, path: P) -> Self {
        FileSource::Handle {
            file,
            path: path.into(),
        }
    }

    pub fn reader<N, R>(file_name: N, reader: R) -> Self
    where
        N: Into<String>,
        R: Read + Send + 'static,
    {
        FileSource::Reader {
            file_name: file_name.into(),
            reader: Box::new(reader),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FileSource::Path(_) => "path",
            FileSource::Handle { .. } => "handle",
            FileSource::Reader { .. } => "reader",
            FileSource::Upload(_) => "upload",
            FileSource::Unrecognized(name) => name,
        }
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Path(p) => f.debug_tuple("Path").field(p).finish(),
            FileSource::Handle { path, .. } => {
                f.debug_struct("Handle").field("path", path).finish_non_exhaustive()
            }
            FileSource::Reader { file_name, .. } => f
                .debug_struct("Reader")
                .field("file_name", file_name)
                .finish_non_exhaustive(),
            FileSource::Upload(u) => f.debug_tuple("Upload").field(u).finish(),
            FileSource::Unrecognized(name) => f.debug_tuple("Unrecognized").field(name).finish(),
        }
    }
}

impl From<&str> for FileSource {
    fn from(p: &str) -> Self {
        FileSource::Path(PathBuf::from(p))
    }
}

impl From<String> for FileSource {
    fn from(p: String) -> Self {
        FileSource::Path(PathBuf::from(p))
    }
}

impl From<&Path> for FileSource {
    fn from(p: &Path) -> Self {
        FileSource::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for FileSource {
    fn from(p: PathBuf) -> Self {
        FileSource::Path(p)
    }
}

impl From<UploadedFile> for FileSource {
    fn from(u: UploadedFile) -> Self {
        FileSource::Upload(u)
    }
}

macro_rules! unrecognized_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FileSource {
                fn from(_: $ty) -> Self {
                    FileSource::Unrecognized(stringify!($ty))
                }
            }
        )*
    };
}

unrecognized_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char);

/// Final path component, as used for part filenames.
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
