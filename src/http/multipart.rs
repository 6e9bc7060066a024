//! Multipart form data assembly.
//!
//! Encodes a [`FormData`] set into a single RFC 2046 `multipart/form-data`
//! body. Keys are written in sorted order and the entries of one key in
//! insertion order, so two assemblies of the same form differ only in their
//! boundary.
//!
//! # Example
//! ```ignore
//! use reqkit::http::multipart::{assemble, FormData};
//!
//! let mut form = FormData::new();
//! form.add_field("username", "user123");
//! form.add_file("avatar", "/tmp/avatar.png");
//!
//! let multipart = assemble(form)?;
//! ```
//!
//! Assembly reads files with blocking I/O and buffers the whole body.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::filesource::{base_name, FileSource, DEFAULT_FILE_CONTENT_TYPE};
use bytes::Bytes;
use rand::Rng;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

/// One value attached to a form key.
#[derive(Debug)]
pub enum FormEntry {
    Field(String),
    File(FileSource),
}

/// Key-sorted set of form fields and file sources destined for an upload.
#[derive(Debug, Default)]
pub struct FormData {
    entries: BTreeMap<String, Vec<FormEntry>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text value to `key`.
    pub fn add_field<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(key.into(), FormEntry::Field(value.into()))
    }

    /// Append a file source to `key`.
    pub fn add_file<K, S>(&mut self, key: K, source: S) -> &mut Self
    where
        K: Into<String>,
        S: Into<FileSource>,
    {
        self.push(key.into(), FormEntry::File(source.into()))
    }

    fn push(&mut self, key: String, entry: FormEntry) -> &mut Self {
        self.entries.entry(key).or_default().push(entry);
        self
    }

    /// Drop every entry under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Vec<FormEntry>> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, key: &str) -> &[FormEntry] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in the order they will be written.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An encoded multipart body.
#[derive(Debug, Clone)]
pub struct Multipart {
    pub body: Bytes,
    pub content_type: String,
    pub boundary: String,
}

/// Encode `form` into a multipart body.
///
/// Fails with [`NetError::EmptyUploadBody`] before touching the filesystem if
/// the form has no entries. Any later failure discards the partial body.
pub fn assemble(form: FormData) -> Result<Multipart, NetError> {
    if form.is_empty() {
        return Err(NetError::EmptyUploadBody);
    }

    let mut writer = MultipartWriter::new();
    for (key, entries) in form.entries {
        for entry in entries {
            match entry {
                FormEntry::Field(value) => writer.write_field(&key, &value),
                FormEntry::File(source) => write_file_source(&mut writer, &key, source)?,
            }
        }
    }
    Ok(writer.finish())
}

fn write_file_source(
    writer: &mut MultipartWriter,
    key: &str,
    source: FileSource,
) -> Result<(), NetError> {
    match source {
        FileSource::Path(path) => {
            let metadata = fs::metadata(&path).file_context(&path)?;
            if !metadata.is_file() {
                return Err(NetError::NotRegularFile { path });
            }
            // Closed when it goes out of scope, on success or failure.
            let mut file = File::open(&path).file_context(&path)?;
            writer
                .write_file(key, &base_name(&path), DEFAULT_FILE_CONTENT_TYPE, &mut file)
                .file_context(&path)
        }
        FileSource::Handle { file, path } => {
            let metadata = file.metadata().file_context(&path)?;
            if !metadata.is_file() {
                return Err(NetError::NotRegularFile { path });
            }
            let mut reader: &File = &file;
            writer
                .write_file(key, &base_name(&path), DEFAULT_FILE_CONTENT_TYPE, &mut reader)
                .file_context(&path)
        }
        FileSource::Reader {
            file_name,
            mut reader,
        } => {
            let name = base_name(Path::new(&file_name));
            writer.write_file(key, &name, DEFAULT_FILE_CONTENT_TYPE, &mut reader)?;
            Ok(())
        }
        FileSource::Upload(upload) => {
            let mut reader = upload.open()?;
            let name = base_name(Path::new(upload.file_name()));
            let content_type = upload
                .declared_content_type()
                .unwrap_or(DEFAULT_FILE_CONTENT_TYPE);
            writer.write_file(key, &name, content_type, &mut reader)?;
            Ok(())
        }
        FileSource::Unrecognized(type_name) => Err(NetError::InvalidUploadBody { type_name }),
    }
}

/// Appends parts to an in-memory buffer. `finish` consumes the writer, so no
/// part can follow the closing boundary.
struct MultipartWriter {
    boundary: String,
    output: Vec<u8>,
}

impl MultipartWriter {
    fn new() -> Self {
        Self {
            boundary: generate_boundary(),
            output: Vec::new(),
        }
    }

    fn write_field(&mut self, name: &str, value: &str) {
        let header = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(name)
        );
        self.begin_part(&header);
        self.output.extend_from_slice(value.as_bytes());
        self.output.extend_from_slice(b"\r\n");
    }

    fn write_file<R>(
        &mut self,
        name: &str,
        file_name: &str,
        content_type: &str,
        reader: &mut R,
    ) -> io::Result<()>
    where
        R: Read + ?Sized,
    {
        let header = format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}",
            escape_quotes(name),
            escape_quotes(file_name),
            content_type
        );
        self.begin_part(&header);
        io::copy(reader, &mut self.output)?;
        self.output.extend_from_slice(b"\r\n");
        Ok(())
    }

    fn begin_part(&mut self, header: &str) {
        // --boundary\r\n
        self.output.extend_from_slice(b"--");
        self.output.extend_from_slice(self.boundary.as_bytes());
        self.output.extend_from_slice(b"\r\n");

        self.output.extend_from_slice(header.as_bytes());
        self.output.extend_from_slice(b"\r\n\r\n");
    }

    fn finish(mut self) -> Multipart {
        // Final boundary
        self.output.extend_from_slice(b"--");
        self.output.extend_from_slice(self.boundary.as_bytes());
        self.output.extend_from_slice(b"--\r\n");

        Multipart {
            body: Bytes::from(self.output),
            content_type: format!("multipart/form-data; boundary={}", self.boundary),
            boundary: self.boundary,
        }
    }
}

/// Escape quotes and backslashes in a string.
fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains('"') || s.contains('\\') || s.contains('\r') || s.contains('\n') {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// 30 random bytes, hex encoded.
fn generate_boundary() -> String {
    let mut raw = [0u8; 30];
    rand::thread_rng().fill(&mut raw[..]);
    raw.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::filesource::UploadedFile;
    use std::io::{Seek, SeekFrom, Write};
    use std::sync::Arc;

    fn body_str(multipart: &Multipart) -> String {
        String::from_utf8(multipart.body.to_vec()).unwrap()
    }

    #[test]
    fn test_empty_form() {
        let err = assemble(FormData::new()).unwrap_err();
        assert!(matches!(err, NetError::EmptyUploadBody));
    }

    #[test]
    fn test_empty_form_checked_before_files() {
        let mut form = FormData::new();
        form.add_file("gone", "/does/not/exist");
        form.remove("gone");
        assert!(matches!(
            assemble(form).unwrap_err(),
            NetError::EmptyUploadBody
        ));
    }

    #[test]
    fn test_single_field_layout() {
        let mut form = FormData::new();
        form.add_field("name", "value");
        let multipart = assemble(form).unwrap();
        let b = &multipart.boundary;

        let expected = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nvalue\r\n--{b}--\r\n"
        );
        assert_eq!(body_str(&multipart), expected);
        assert_eq!(
            multipart.content_type,
            format!("multipart/form-data; boundary={b}")
        );
    }

    #[test]
    fn test_keys_sorted_values_in_order() {
        let mut form = FormData::new();
        form.add_field("z", "last").add_field("a", "1").add_field("a", "2");
        let body = body_str(&assemble(form).unwrap());

        let a1 = body.find("\r\n\r\n1\r\n").unwrap();
        let a2 = body.find("\r\n\r\n2\r\n").unwrap();
        let z = body.find("\r\n\r\nlast\r\n").unwrap();
        assert!(a1 < a2 && a2 < z);
    }

    #[test]
    fn test_boundary_random() {
        let first = generate_boundary();
        let second = generate_boundary();
        assert_eq!(first.len(), 60);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_path_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(&path, "file data").unwrap();

        let mut form = FormData::new();
        form.add_file("upload", path.as_path());
        let body = body_str(&assemble(form).unwrap());

        assert!(body.contains(
            "Content-Disposition: form-data; name=\"upload\"; filename=\"report.txt\"\r\n\
             Content-Type: application/octet-stream\r\n\r\nfile data\r\n"
        ));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = FormData::new();
        form.add_file("dir", dir.path());

        match assemble(form).unwrap_err() {
            NetError::NotRegularFile { path } => assert_eq!(path, dir.path()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_path_is_io() {
        let mut form = FormData::new();
        form.add_file("f", "/definitely/not/here.bin");
        match assemble(form).unwrap_err() {
            NetError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_handle_reads_from_position_and_stays_open() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"skip:keep").unwrap();
        let mut file = tmp.reopen().unwrap();
        file.seek(SeekFrom::Start(5)).unwrap();
        let file = Arc::new(file);

        let mut form = FormData::new();
        form.add_file(
            "h",
            FileSource::handle(Arc::clone(&file), "/virtual/data.bin"),
        );
        let body = body_str(&assemble(form).unwrap());

        assert!(body.contains("filename=\"data.bin\""));
        assert!(body.contains("\r\n\r\nkeep\r\n"));
        assert!(!body.contains("skip"));
        // Still usable by the caller.
        assert!(file.metadata().unwrap().is_file());
    }

    #[test]
    fn test_reader_uses_base_name() {
        let mut form = FormData::new();
        form.add_file("r", FileSource::reader("nested/dir/notes.txt", &b"memory"[..]));
        let body = body_str(&assemble(form).unwrap());

        assert!(body.contains("filename=\"notes.txt\""));
        assert!(body.contains("\r\n\r\nmemory\r\n"));
    }

    #[test]
    fn test_upload_content_type() {
        let upload = UploadedFile::in_memory("photo.png", &b"png"[..]).content_type("image/png");
        let mut form = FormData::new();
        form.add_file("photo", upload);
        form.add_file("plain", UploadedFile::in_memory("x.bin", &b"x"[..]));
        let body = body_str(&assemble(form).unwrap());

        assert!(body.contains("filename=\"photo.png\"\r\nContent-Type: image/png\r\n"));
        assert!(body.contains("filename=\"x.bin\"\r\nContent-Type: application/octet-stream\r\n"));
    }

    #[test]
    fn test_unrecognized_source() {
        let mut form = FormData::new();
        form.add_file("n", 100);
        assert!(matches!(
            assemble(form).unwrap_err(),
            NetError::InvalidUploadBody { type_name: "i32" }
        ));
    }

    #[test]
    fn test_failed_read_aborts() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "read failed"))
            }
        }

        let mut form = FormData::new();
        form.add_field("a", "ok");
        form.add_file("b", FileSource::reader("f", Failing));
        match assemble(form).unwrap_err() {
            NetError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_quotes("normal"), "normal");
        assert_eq!(escape_quotes("with\"quote"), "with\\\"quote");
        assert_eq!(escape_quotes("with\\slash"), "with\\\\slash");
        assert_eq!(escape_quotes("a\r\nb"), "a\\r\\nb");
    }

    #[test]
    fn test_form_data_ops() {
        let mut form = FormData::new();
        form.add_field("b", "1").add_field("a", "2").add_field("b", "3");
        assert_eq!(form.len(), 2);
        assert_eq!(form.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(form.get("b").len(), 2);

        form.remove("b");
        assert!(!form.contains_key("b"));
        form.clear();
        assert!(form.is_empty());
    }
}
