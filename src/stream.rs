// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/stream.rs - Named-stream sources for Altium container contents.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `stream` Module
 *
 * SchLib and PcbLib files are compound-file containers. This crate does not
 * parse the container itself; it reads named streams through the
 * [StreamSource] trait. Stream paths use `/` between storage and stream
 * names, e.g. `R1/Data` or `Library/Models/Data`.
 *
 * Two sources are provided: [MemoryStreams] for streams already in memory,
 * and [DirectoryStreams] for a container that has been extracted to disk
 * with one directory per storage and one file per stream.
 *
 * ## Usage Example
 *
 * ```
 * use altiumlib::stream::{MemoryStreams, StreamSource};
 *
 * let mut streams = MemoryStreams::new();
 * streams.insert("FileHeader", b"|HEADER=x".to_vec());
 * assert_eq!(streams.read_stream("FileHeader").unwrap(), b"|HEADER=x");
 * assert!(streams.read_stream("Missing").is_err());
 * ```
 */

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use memchr::memmem;

use crate::error::{Error, Result};

/// Default cap on the number of bytes read from one stream.
pub const DEFAULT_MAX_STREAM_BYTES: usize = 1024 * 1024;

/// Read access to the named streams of a container.
pub trait StreamSource {
    /// Returns the contents of the stream at `path`, or
    /// [Error::StreamNotFound] if there is no such stream.
    fn read_stream(&self, path: &str) -> Result<Vec<u8>>;

    /// Lists the names of the top-level storages.
    fn storages(&self) -> Result<Vec<String>>;
}

impl<S: StreamSource + ?Sized> StreamSource for &S {
    fn read_stream(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read_stream(path)
    }

    fn storages(&self) -> Result<Vec<String>> {
        (**self).storages()
    }
}

/// Streams held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStreams {
    streams: BTreeMap<String, Vec<u8>>,
}

impl MemoryStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.streams.insert(path.into(), data.into());
    }
}

impl StreamSource for MemoryStreams {
    fn read_stream(&self, path: &str) -> Result<Vec<u8>> {
        self.streams
            .get(path)
            .cloned()
            .ok_or_else(|| Error::StreamNotFound(path.to_string()))
    }

    fn storages(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .streams
            .keys()
            .filter_map(|path| path.split_once('/').map(|(storage, _)| storage.to_string()))
            .collect();
        names.dedup();
        Ok(names)
    }
}

/// A container extracted to a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryStreams {
    root: PathBuf,
}

impl DirectoryStreams {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::Format(format!(
                "{} is not an extracted library directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StreamSource for DirectoryStreams {
    fn read_stream(&self, path: &str) -> Result<Vec<u8>> {
        let full = path
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part));

        match fs::read(&full) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(Error::StreamNotFound(path.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn storages(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Options that control how a library is opened.
///
/// ```
/// use altiumlib::stream::OpenOptions;
///
/// let options = OpenOptions::new().lazy(false).max_stream_bytes(4096);
/// assert!(!options.is_lazy());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    lazy: bool,
    max_stream_bytes: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            lazy: true,
            max_stream_bytes: DEFAULT_MAX_STREAM_BYTES,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set (the default), item records are decoded on first access
    /// instead of when the library is opened.
    pub fn lazy(mut self, yes: bool) -> Self {
        self.lazy = yes;
        self
    }

    /// Caps the number of bytes kept from any one text stream. Embedded
    /// model bodies are always read in full.
    pub fn max_stream_bytes(mut self, limit: usize) -> Self {
        self.max_stream_bytes = limit;
        self
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn stream_limit(&self) -> usize {
        self.max_stream_bytes
    }
}

/// Reads a stream and truncates it to the configured limit.
pub(crate) fn read_capped<S: StreamSource>(
    source: &S,
    path: &str,
    options: &OpenOptions,
) -> Result<Vec<u8>> {
    let mut data = source.read_stream(path)?;
    if data.len() > options.max_stream_bytes {
        debug!(
            "Stream {} is {} bytes, keeping the first {}",
            path,
            data.len(),
            options.max_stream_bytes
        );
        data.truncate(options.max_stream_bytes);
    }
    Ok(data)
}

/// Like [read_capped], but a missing stream reads as empty.
pub(crate) fn read_optional<S: StreamSource>(
    source: &S,
    path: &str,
    options: &OpenOptions,
) -> Result<Vec<u8>> {
    missing_as_empty(read_capped(source, path, options), path)
}

/// Reads a binary stream in full, ignoring the stream limit. A missing
/// stream reads as empty.
pub(crate) fn read_blob<S: StreamSource>(source: &S, path: &str) -> Result<Vec<u8>> {
    missing_as_empty(source.read_stream(path), path)
}

fn missing_as_empty(result: Result<Vec<u8>>, path: &str) -> Result<Vec<u8>> {
    match result {
        Err(Error::StreamNotFound(_)) => {
            debug!("Optional stream {} not present, reading as empty", path);
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Reads at most `limit` bytes from the start of a stream.
pub(crate) fn read_prefix<S: StreamSource>(source: &S, path: &str, limit: usize) -> Result<Vec<u8>> {
    let mut data = source.read_stream(path)?;
    data.truncate(limit);
    Ok(data)
}

/// Number of `FileHeader` bytes searched for a library signature.
pub const SIGNATURE_WINDOW: usize = 128;

/// Checks whether `signature` appears near the start of the `FileHeader`
/// stream. A missing `FileHeader` never matches.
pub(crate) fn has_signature<S: StreamSource>(source: &S, signature: &str) -> Result<bool> {
    match read_prefix(source, "FileHeader", SIGNATURE_WINDOW) {
        Ok(prefix) => Ok(memmem::find(&prefix, signature.as_bytes()).is_some()),
        Err(Error::StreamNotFound(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storages() {
        let mut streams = MemoryStreams::new();
        streams.insert("FileHeader", b"x".to_vec());
        streams.insert("B/Data", b"x".to_vec());
        streams.insert("A/Data", b"x".to_vec());
        streams.insert("A/Parameters", b"x".to_vec());
        assert_eq!(streams.storages().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_read_optional_and_capped() {
        let mut streams = MemoryStreams::new();
        streams.insert("Big", vec![7u8; 100]);
        let options = OpenOptions::new().max_stream_bytes(10);

        assert_eq!(read_capped(&streams, "Big", &options).unwrap().len(), 10);
        assert!(read_optional(&streams, "Nope", &options).unwrap().is_empty());
        assert!(matches!(
            read_capped(&streams, "Nope", &options),
            Err(Error::StreamNotFound(_))
        ));
        assert_eq!(read_prefix(&streams, "Big", 8).unwrap(), vec![7u8; 8]);

        assert_eq!(read_blob(&streams, "Big").unwrap().len(), 100);
        assert!(read_blob(&streams, "Nope").unwrap().is_empty());
    }

    #[test]
    fn test_has_signature() {
        let mut streams = MemoryStreams::new();
        assert!(!has_signature(&streams, "SIG").unwrap());

        let mut header = vec![b' '; SIGNATURE_WINDOW - 3];
        header.extend_from_slice(b"SIG");
        streams.insert("FileHeader", header.clone());
        assert!(has_signature(&streams, "SIG").unwrap());

        header.insert(0, b' ');
        streams.insert("FileHeader", header);
        assert!(!has_signature(&streams, "SIG").unwrap());
    }

    #[test]
    fn test_directory_streams() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("FileHeader"), b"header").unwrap();
        fs::create_dir(dir.path().join("R1")).unwrap();
        fs::write(dir.path().join("R1").join("Data"), b"data").unwrap();

        let streams = DirectoryStreams::new(dir.path()).unwrap();
        assert_eq!(streams.read_stream("FileHeader").unwrap(), b"header");
        assert_eq!(streams.read_stream("R1/Data").unwrap(), b"data");
        assert!(matches!(
            streams.read_stream("R2/Data"),
            Err(Error::StreamNotFound(_))
        ));
        assert_eq!(streams.storages().unwrap(), vec!["R1"]);
    }

    #[test]
    fn test_directory_streams_requires_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lib.SchLib");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            DirectoryStreams::new(&file),
            Err(Error::Format(_))
        ));
    }
}
